use once_cell::sync::Lazy;
use regex::Regex;

static PLAYER_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(ffrt|ffmpeg|auto)\s+").expect("static regex should compile"));
static HAS_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("static regex should compile"));

/// `ffrt http://x/y` -> `http://x/y`
pub fn strip_player_command(cmd: &str) -> String {
    PLAYER_COMMAND.replace(cmd.trim(), "").trim().to_string()
}

/// portals sometimes hand back protocol relative urls or bare paths
///
/// `//cdn/x.ts` -> `http://cdn/x.ts`, `/x.ts` -> `http://<portal host>/x.ts`, anything absolute
/// is left alone
pub fn normalize_stream_url(stream: &str, portal_host: &str) -> String {
    if HAS_SCHEME.is_match(stream) {
        return stream.to_string();
    }

    if stream.starts_with("//") {
        format!("http:{}", stream)
    } else if stream.starts_with('/') {
        format!("http://{}{}", portal_host, stream)
    } else {
        stream.to_string()
    }
}

/// hostname part of a Host header, ports and ipv6 brackets handled
pub fn host_without_port(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

/// `http://<request host>:<port>`, the port is always ours and never the one the client used
pub fn build_origin(request_host: Option<&str>, port: u16) -> String {
    let host = request_host
        .map(host_without_port)
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost");
    format!("http://{}:{}", host, port)
}

/// points every `http://<anything>:<port>` url line in a saved playlist at the current origin
///
/// a playlist saved while on wifi keeps working when the phone switches to its hotspot. only
/// origins on our own port are touched, and `#` lines are skipped so portal logos and the epg url
/// survive even when the portal shares our port
pub fn rewrite_origin(body: &str, origin: &str, port: u16) -> String {
    let pattern = format!(r"(?i)http://[^:/\n\r]+:{}\b", port);
    let Ok(regex) = Regex::new(&pattern) else {
        return body.to_string();
    };

    body.split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with('#') {
                line.to_string()
            } else {
                regex.replace_all(line, regex::NoExpand(origin)).to_string()
            }
        })
        .collect()
}

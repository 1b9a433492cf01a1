use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

use crate::{
    database::portal::PortalConfig,
    server::{
        dtos::stalker_dto::{Channel, Session},
        services::portal_services::LOCAL_CHANNEL_PREFIX,
        utils::url_utils::strip_player_command,
    },
};

pub const INFO_GROUP: &str = "Portal | Info";
const UNKNOWN: &str = "Unknown";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y, %I:%M %p",
    "%B %d, %Y %I:%M %p",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d.%m.%Y", "%Y/%m/%d"];

/// one entry of the playlist, always rendered as an `#EXTINF` line plus its url
#[derive(Debug, Clone, PartialEq)]
pub enum M3uEntry {
    Info {
        tvg_name: String,
        title: String,
        url: String,
    },
    Channel {
        tvg_id: String,
        tvg_name: String,
        tvg_logo: String,
        group_title: String,
        name: String,
        url: String,
    },
}

impl fmt::Display for M3uEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info {
                tvg_name,
                title,
                url,
            } => write!(
                f,
                "#EXTINF:-1 tvg-name=\"{}\" group-title=\"{}\",{}\n{}",
                tvg_name, INFO_GROUP, title, url
            ),
            Self::Channel {
                tvg_id,
                tvg_name,
                tvg_logo,
                group_title,
                name,
                url,
            } => write!(
                f,
                "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}\n{}",
                tvg_id, tvg_name, tvg_logo, group_title, name, url
            ),
        }
    }
}

/// info entries first, then channels, `to_string()` gives the m3u text
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistDocument {
    pub epg_url: Option<String>,
    pub entries: Vec<M3uEntry>,
}

impl PlaylistDocument {
    pub fn channel_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, M3uEntry::Channel { .. }))
            .count()
    }
}

impl fmt::Display for PlaylistDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.epg_url {
            Some(epg) => write!(f, "#EXTM3U x-tvg-url=\"{}\"", epg)?,
            None => write!(f, "#EXTM3U")?,
        }
        for entry in &self.entries {
            write!(f, "\n{}", entry)?;
        }
        writeln!(f)
    }
}

/// everything about the current request the renderer needs
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub portal: &'a PortalConfig,
    // `http://host:port`
    pub origin: &'a str,
    // "/portal/<folder>" or "" for the root level routes
    pub proxy_path_prefix: &'a str,
    pub user_ip: Option<&'a str>,
    pub info_stream_url: &'a str,
    pub now: DateTime<Utc>,
}

/// proxy prefix for a named portal, the folder is escaped like the ids are
pub fn portal_path_prefix(folder: &str) -> String {
    format!("/portal/{}", urlencoding::encode(folder))
}

/// id the proxy will hand back to create_link
///
/// `ffrt http://localhost/ch/4821` gives `4821`, a cmd without the local prefix is used as is once
/// the player token is gone. only an empty result falls back to the portal's own id and then to
/// `unknown_<position>` so the entry is never dropped
pub fn extract_channel_id(channel: &Channel, position: usize) -> String {
    let command = strip_player_command(&channel.cmd);

    let id = match command.strip_prefix(LOCAL_CHANNEL_PREFIX) {
        Some(id) => id.trim().to_string(),
        None => command,
    };

    if !id.is_empty() {
        return id;
    }

    channel
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("unknown_{}", position))
}

/// "N days left", "Expired", or "Unknown" when the date can't be read. never fails
pub fn days_remaining(expiry: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(expiry) = expiry.and_then(parse_expiry) else {
        return UNKNOWN.to_string();
    };

    let millis = (expiry - now).num_milliseconds() as f64;
    let days = (millis / 86_400_000.0).ceil() as i64;

    if days >= 0 {
        format!("{} days left", days)
    } else {
        "Expired".to_string()
    }
}

/// portals aren't consistent about date formats, anything without a zone is utc
pub fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

fn logo_url(portal: &PortalConfig, logo: &str) -> String {
    let logo = logo.trim();
    if logo.is_empty() {
        String::new()
    } else if logo.starts_with("http://") || logo.starts_with("https://") {
        logo.to_string()
    } else {
        format!(
            "{}/stalker_portal/misc/logos/320/{}",
            portal.base_url(),
            logo.trim_start_matches('/')
        )
    }
}

// attribute values can't carry quotes, names can't carry commas
fn attribute(value: &str) -> String {
    value.replace('"', "'")
}

fn info(tvg_name: &str, title: String, url: &str) -> M3uEntry {
    M3uEntry::Info {
        tvg_name: tvg_name.to_string(),
        title,
        url: url.to_string(),
    }
}

fn info_entries(session: &Session, ctx: &RenderContext<'_>) -> Vec<M3uEntry> {
    let unknown = || UNKNOWN.to_string();
    let url = ctx.info_stream_url;
    let expire = session.account_field("end_date");

    vec![
        info("PortalHost", format!("Portal • {}", ctx.portal.bare_host()), url),
        info(
            "ServerIP",
            format!("Server IP • {}", session.profile_field("ip").unwrap_or_else(unknown)),
            url,
        ),
        info(
            "UserIP",
            format!(
                "User IP • {}",
                ctx.user_ip.filter(|ip| !ip.is_empty()).unwrap_or(UNKNOWN)
            ),
            url,
        ),
        info(
            "Created",
            format!("Created • {}", session.profile_field("created").unwrap_or_else(unknown)),
            url,
        ),
        info(
            "Expire",
            format!("Expire • {}", expire.clone().unwrap_or_else(unknown)),
            url,
        ),
        info("DaysLeft", days_remaining(expire.as_deref(), ctx.now), url),
        info(
            "Tariff",
            format!(
                "Tariff • {}",
                session.account_field("tariff_plan").unwrap_or_else(unknown)
            ),
            url,
        ),
        info(
            "MaxOnline",
            format!("Max Online • {}", session.max_online().unwrap_or_else(unknown)),
            url,
        ),
    ]
}

/// builds the playlist: info block from the session, then one entry per channel pointing back at
/// the proxy
pub fn render_playlist(
    channels: &[Channel],
    session: &Session,
    ctx: &RenderContext<'_>,
) -> PlaylistDocument {
    let mut entries = info_entries(session, ctx);

    entries.extend(channels.iter().enumerate().map(|(position, channel)| {
        let id = extract_channel_id(channel, position);

        M3uEntry::Channel {
            tvg_id: attribute(&channel.xmltv_id),
            tvg_name: attribute(&channel.name.replace(',', " ")),
            tvg_logo: attribute(&logo_url(ctx.portal, &channel.logo)),
            group_title: attribute(&channel.genre_title),
            name: channel.name.clone(),
            url: format!(
                "{}{}/{}.m3u8",
                ctx.origin,
                ctx.proxy_path_prefix,
                urlencoding::encode(&id)
            ),
        }
    }));

    PlaylistDocument {
        epg_url: ctx.portal.epg_url.clone().filter(|e| !e.is_empty()),
        entries,
    }
}

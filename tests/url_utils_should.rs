use stalker_m3u::server::utils::url_utils::{
    build_origin, normalize_stream_url, rewrite_origin, strip_player_command,
};

#[test]
fn test_protocol_relative_urls_get_http() {
    assert_eq!(
        normalize_stream_url("//cdn.example.com/x.ts", "tv.example.com"),
        "http://cdn.example.com/x.ts"
    );
}

#[test]
fn test_bare_paths_get_the_portal_host() {
    assert_eq!(
        normalize_stream_url("/x.ts", "tv.example.com"),
        "http://tv.example.com/x.ts"
    );
}

#[test]
fn test_absolute_urls_are_untouched() {
    let url = "https://cdn.example.com/live/1.m3u8?token=abc";
    assert_eq!(normalize_stream_url(url, "tv.example.com"), url);
}

#[test]
fn test_player_command_is_stripped() {
    assert_eq!(
        strip_player_command("ffrt http://cdn.example.com/1.ts"),
        "http://cdn.example.com/1.ts"
    );
    assert_eq!(
        strip_player_command("FFMPEG  http://cdn.example.com/1.ts "),
        "http://cdn.example.com/1.ts"
    );
    assert_eq!(
        strip_player_command("http://cdn.example.com/1.ts"),
        "http://cdn.example.com/1.ts"
    );
}

#[test]
fn test_origin_uses_request_host_and_our_port() {
    assert_eq!(
        build_origin(Some("192.168.1.2:3000"), 8080),
        "http://192.168.1.2:8080"
    );
    assert_eq!(build_origin(None, 8080), "http://localhost:8080");
}

#[test]
fn test_saved_origins_are_rewritten() {
    let saved = "#EXTM3U\n#EXTINF:-1 tvg-id=\"\" tvg-name=\"News\" tvg-logo=\"http://tv.example.com/logo.png\" group-title=\"News\",News\nhttp://10.0.0.5:8080/portal/p1/99.m3u8\n";

    let rewritten = rewrite_origin(saved, "http://192.168.1.2:8080", 8080);

    assert_eq!(
        rewritten,
        "#EXTM3U\n#EXTINF:-1 tvg-id=\"\" tvg-name=\"News\" tvg-logo=\"http://tv.example.com/logo.png\" group-title=\"News\",News\nhttp://192.168.1.2:8080/portal/p1/99.m3u8\n"
    );
}

#[test]
fn test_other_ports_are_left_alone() {
    let saved = "http://10.0.0.5:9090/portal/p1/99.m3u8\nhttp://10.0.0.5:80801/x";

    assert_eq!(rewrite_origin(saved, "http://192.168.1.2:8080", 8080), saved);
}

#[test]
fn test_logos_on_the_same_port_are_kept() {
    let saved = "#EXTM3U x-tvg-url=\"http://tv.example.com:8080/epg.xml\"\n#EXTINF:-1 tvg-id=\"\" tvg-name=\"News\" tvg-logo=\"http://tv.example.com:8080/stalker_portal/misc/logos/320/a.png\" group-title=\"News\",News\nhttp://192.168.1.2:8080/portal/p1/99.m3u8\n";

    let rewritten = rewrite_origin(saved, "http://10.42.0.1:8080", 8080);

    assert!(rewritten.contains("x-tvg-url=\"http://tv.example.com:8080/epg.xml\""));
    assert!(rewritten.contains("tvg-logo=\"http://tv.example.com:8080/stalker_portal/misc/logos/320/a.png\""));
    assert!(rewritten.ends_with("\nhttp://10.42.0.1:8080/portal/p1/99.m3u8\n"));
}

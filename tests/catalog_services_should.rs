use std::sync::Arc;

use chrono::{TimeZone, Utc};
use stalker_m3u::database::portal::PortalConfig;
use stalker_m3u::server::dtos::stalker_dto::Session;
use stalker_m3u::server::error::Error;
use stalker_m3u::server::services::catalog_services::CatalogService;
use stalker_m3u::server::services::portal_services::{MockPortalClientTrait, PortalAction};
use stalker_m3u::server::utils::playlist_utils::{RenderContext, render_playlist};

fn portal() -> PortalConfig {
    PortalConfig {
        host: "tv.example.com".to_string(),
        mac_address: "00:1A:79:12:34:56".to_string(),
        serial_number: "ABCDEF123456".to_string(),
        device_id: "dev1".to_string(),
        device_id_2: "dev2".to_string(),
        ..PortalConfig::default()
    }
}

#[tokio::test]
async fn test_network_failure_gives_an_empty_catalog() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(|_, request| match &request.action {
        PortalAction::AllChannels => Err(Error::Upstream("connection reset".to_string())),
        PortalAction::Genres => Ok("<html>oops</html>".to_string()),
        other => panic!("unexpected action {:?}", other),
    });
    let portal = portal();

    let channels = CatalogService::new(Arc::new(client))
        .fetch_catalog(&portal, "t1")
        .await;
    assert!(channels.is_empty());

    // still a usable playlist, just the header and the info block
    let ctx = RenderContext {
        portal: &portal,
        origin: "http://localhost:8080",
        proxy_path_prefix: "",
        user_ip: None,
        info_stream_url: "http://info.example.com/intro.m3u8",
        now: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    };
    let playlist = render_playlist(&channels, &Session::default(), &ctx).to_string();
    assert_eq!(playlist.lines().count(), 1 + 8 * 2);
}

#[tokio::test]
async fn test_missing_data_gives_an_empty_catalog() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(|_, request| match &request.action {
        PortalAction::AllChannels => Ok(r#"{"js":{"total_items":0}}"#.to_string()),
        PortalAction::Genres => Ok(r#"{"js":[{"id":"1","title":"News"}]}"#.to_string()),
        other => panic!("unexpected action {:?}", other),
    });

    let channels = CatalogService::new(Arc::new(client))
        .fetch_catalog(&portal(), "t1")
        .await;

    assert!(channels.is_empty());
}

#[tokio::test]
async fn test_channels_are_joined_with_genres() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(|_, request| {
        assert_eq!(request.bearer.as_deref(), Some("t1"));
        let body = match &request.action {
            PortalAction::AllChannels => {
                r#"{"js":{"data":[
                    {"id":"10","name":"News One","cmd":"ffrt http://localhost/ch/4821","tv_genre_id":"1"},
                    {"id":"11","name":"Mystery","cmd":"ffrt http://localhost/ch/4822","tv_genre_id":"42"},
                    "not a record"
                ]}}"#
            }
            PortalAction::Genres => {
                r#"{"js":[{"id":"1","title":"News"},{"id":"1","title":"World News"}]}"#
            }
            other => panic!("unexpected action {:?}", other),
        };
        Ok(body.to_string())
    });

    let channels = CatalogService::new(Arc::new(client))
        .fetch_catalog(&portal(), "t1")
        .await;

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].name, "News One");
    // duplicate genre ids keep the last title
    assert_eq!(channels[0].genre_title, "World News");
    assert_eq!(channels[1].genre_title, "Other");
    assert_eq!(channels[1].genre_id, "42");
}

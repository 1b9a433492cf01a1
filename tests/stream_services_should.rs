use std::sync::{Arc, Mutex};

use stalker_m3u::database::portal::PortalConfig;
use stalker_m3u::server::error::Error;
use stalker_m3u::server::services::portal_services::{MockPortalClientTrait, PortalAction};
use stalker_m3u::server::services::stream_services::{StreamMode, StreamResolver};

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

fn create_link_cmd(action: &PortalAction) -> String {
    match action {
        PortalAction::CreateLink { cmd } => cmd.clone(),
        other => panic!("unexpected action {:?}", other),
    }
}

#[test]
fn test_candidate_order() {
    assert_eq!(
        StreamMode::Default.candidates("4821"),
        vec!["ffrt http://localhost/ch/4821"]
    );
    assert_eq!(
        StreamMode::LowLatency.candidates("4821"),
        vec![
            "auto 4821",
            "ffmpeg http://localhost/ch/4821",
            "ffrt http://localhost/ch/4821",
        ]
    );

    let low_latency = PortalConfig {
        low_latency: true,
        ..portal()
    };
    assert_eq!(StreamMode::for_portal(&low_latency), StreamMode::LowLatency);
    assert_eq!(StreamMode::for_portal(&portal()), StreamMode::Default);
}

#[tokio::test]
async fn test_player_token_is_stripped() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().times(1).returning(|_, request| {
        assert_eq!(create_link_cmd(&request.action), "ffrt http://localhost/ch/4821");
        assert_eq!(request.bearer.as_deref(), Some("t1"));
        Ok(r#"{"js":{"cmd":"ffrt http://cdn.example.net/live/4821.ts?token=abc"}}"#.to_string())
    });

    let stream = StreamResolver::new(Arc::new(client))
        .resolve(&portal(), "t1", "4821", StreamMode::Default)
        .await
        .unwrap();

    assert_eq!(stream, "http://cdn.example.net/live/4821.ts?token=abc");
}

#[tokio::test]
async fn test_relative_stream_urls_are_made_absolute() {
    let mut client = MockPortalClientTrait::new();
    client
        .expect_load()
        .returning(|_, _| Ok(r#"{"js":{"cmd":"/live/4821.ts"}}"#.to_string()));

    let stream = StreamResolver::new(Arc::new(client))
        .resolve(&portal(), "t1", "4821", StreamMode::Default)
        .await
        .unwrap();

    assert_eq!(stream, "http://tv.example.com/live/4821.ts");
}

#[tokio::test]
async fn test_low_latency_falls_through_empty_candidates() {
    let tried = Arc::new(Mutex::new(Vec::new()));
    let seen = tried.clone();

    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(move |_, request| {
        let cmd = create_link_cmd(&request.action);
        seen.lock().unwrap().push(cmd.clone());
        if cmd.starts_with("ffmpeg") {
            Ok(r#"{"js":{"cmd":"ffmpeg http://cdn.example.net/fast/4821"}}"#.to_string())
        } else {
            Ok(r#"{"js":{"cmd":""}}"#.to_string())
        }
    });
    client.expect_warm().returning(|_| ());

    let stream = StreamResolver::new(Arc::new(client))
        .resolve(&portal(), "t1", "4821", StreamMode::LowLatency)
        .await
        .unwrap();

    assert_eq!(stream, "http://cdn.example.net/fast/4821");
    assert_eq!(
        *tried.lock().unwrap(),
        vec!["auto 4821", "ffmpeg http://localhost/ch/4821"]
    );
}

#[tokio::test]
async fn test_no_stream_when_every_candidate_is_empty() {
    let mut client = MockPortalClientTrait::new();
    client
        .expect_load()
        .times(3)
        .returning(|_, _| Ok("not json at all".to_string()));

    let result = StreamResolver::new(Arc::new(client))
        .resolve(&portal(), "t1", "4821", StreamMode::LowLatency)
        .await;

    assert!(matches!(result, Err(Error::NoStreamAvailable)));
}

#[tokio::test]
async fn test_portal_errors_become_no_stream() {
    let mut client = MockPortalClientTrait::new();
    client
        .expect_load()
        .returning(|_, _| Err(Error::Upstream("502".to_string())));

    let result = StreamResolver::new(Arc::new(client))
        .resolve(&portal(), "t1", "4821", StreamMode::Default)
        .await;

    assert!(matches!(result, Err(Error::NoStreamAvailable)));
}

use std::sync::Arc;

use stalker_m3u::database::portal::PortalConfig;
use stalker_m3u::server::error::Error;
use stalker_m3u::server::services::portal_services::{MockPortalClientTrait, PortalAction};
use stalker_m3u::server::services::session_services::{SessionNegotiator, SessionState};

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
async fn test_full_negotiation() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(|_, request| {
        let body = match &request.action {
            PortalAction::Handshake { token } if token.is_empty() => {
                assert!(request.bearer.is_none());
                r#"{"js":{"token":"t0"}}"#
            }
            PortalAction::Handshake { token } => {
                assert_eq!(token, "t0");
                assert_eq!(request.bearer.as_deref(), Some("t0"));
                r#"{"js":{"token":"t1"}}"#
            }
            PortalAction::GetProfile => {
                assert_eq!(request.bearer.as_deref(), Some("t0"));
                r#"{"js":{"ip":"203.0.113.7","created":"2023-05-01"}}"#
            }
            PortalAction::AccountInfo => {
                assert_eq!(request.bearer.as_deref(), Some("t1"));
                r#"{"js":{"end_date":"2099-01-01","tariff_plan":"Full"}}"#
            }
            _ => panic!("unexpected action {:?}", request.action),
        };
        Ok(body.to_string())
    });

    let session = SessionNegotiator::new(Arc::new(client)).negotiate(&portal()).await;

    assert_eq!(session.token, "t1");
    assert_eq!(session.profile_field("ip").as_deref(), Some("203.0.113.7"));
    assert_eq!(session.account_field("tariff_plan").as_deref(), Some("Full"));
}

#[tokio::test]
async fn test_missing_handshake_token_fails_quietly() {
    let mut client = MockPortalClientTrait::new();
    client
        .expect_load()
        .times(1)
        .returning(|_, _| Ok(r#"{"js":{}}"#.to_string()));

    let session = SessionNegotiator::new(Arc::new(client)).negotiate(&portal()).await;

    assert!(!session.is_authenticated());
    assert!(session.profile.is_empty());
}

#[tokio::test]
async fn test_unreachable_portal_fails_quietly() {
    let mut client = MockPortalClientTrait::new();
    client
        .expect_load()
        .returning(|_, _| Err(Error::Upstream("connection refused".to_string())));

    let session = SessionNegotiator::new(Arc::new(client)).negotiate(&portal()).await;

    assert_eq!(session.token, "");
}

#[tokio::test]
async fn test_failed_rehandshake_keeps_profile() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(|_, request| {
        let body = match &request.action {
            PortalAction::Handshake { token } if token.is_empty() => r#"{"js":{"token":"t0"}}"#,
            PortalAction::Handshake { .. } => "<html>503 Service Unavailable</html>",
            PortalAction::GetProfile => r#"{"js":{"ip":"203.0.113.7"}}"#,
            _ => panic!("unexpected action {:?}", request.action),
        };
        Ok(body.to_string())
    });

    let session = SessionNegotiator::new(Arc::new(client)).negotiate(&portal()).await;

    assert!(!session.is_authenticated());
    assert_eq!(session.profile_field("ip").as_deref(), Some("203.0.113.7"));
    assert!(session.account_info.is_empty());
}

#[tokio::test]
async fn test_profile_and_account_info_degrade_to_empty() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(|_, request| match &request.action {
        PortalAction::Handshake { .. } => Ok(r#"{"js":{"token":"t0"}}"#.to_string()),
        // portals send [] instead of {} when there's nothing
        PortalAction::GetProfile => Ok(r#"{"js":[]}"#.to_string()),
        PortalAction::AccountInfo => Err(Error::Upstream("timed out".to_string())),
        _ => panic!("unexpected action {:?}", request.action),
    });

    let session = SessionNegotiator::new(Arc::new(client)).negotiate(&portal()).await;

    assert_eq!(session.token, "t0");
    assert!(session.profile.is_empty());
    assert!(session.account_info.is_empty());
}

#[tokio::test]
async fn test_token_is_salvaged_from_a_dirty_body() {
    let mut client = MockPortalClientTrait::new();
    client.expect_load().returning(|_, request| match &request.action {
        PortalAction::Handshake { .. } => {
            Ok("Warning: something in php\n{\"js\":{\"token\":\"t0\"}}".to_string())
        }
        _ => Ok(r#"{"js":{}}"#.to_string()),
    });

    let session = SessionNegotiator::new(Arc::new(client)).negotiate(&portal()).await;

    assert_eq!(session.token, "t0");
}

#[tokio::test]
async fn test_states_advance_in_order() {
    let mut client = MockPortalClientTrait::new();
    client
        .expect_load()
        .returning(|_, _| Ok(r#"{"js":{"token":"t0"}}"#.to_string()));
    let negotiator = SessionNegotiator::new(Arc::new(client));
    let portal = portal();

    let state = negotiator
        .advance(&portal, SessionState::Unauthenticated)
        .await;
    assert_eq!(
        state,
        SessionState::TokenAcquired {
            token: "t0".to_string()
        }
    );

    let state = negotiator.advance(&portal, state).await;
    assert!(matches!(state, SessionState::ProfileAuthed { .. }));

    let state = negotiator.advance(&portal, state).await;
    assert!(matches!(state, SessionState::Authorized { .. }));

    let state = negotiator.advance(&portal, state).await;
    assert!(state.is_terminal());
    assert!(matches!(state, SessionState::Ready(_)));
}

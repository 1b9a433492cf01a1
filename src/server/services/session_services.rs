use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::{
    database::portal::PortalConfig,
    server::{
        dtos::stalker_dto::{Session, into_mapping},
        services::portal_services::{DynPortalClient, PortalAction, PortalRequest},
        utils::json_utils::{LenientJson, field_string},
    },
};

/// where a negotiation currently is
///
/// handshake -> get_profile -> handshake again -> get_main_info. only the two handshakes can
/// fail the whole thing, profile and account info just come back empty
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    TokenAcquired {
        token: String,
    },
    ProfileAuthed {
        token: String,
        profile: Map<String, Value>,
    },
    Authorized {
        token: String,
        profile: Map<String, Value>,
    },
    Ready(Session),
    Failed {
        stage: &'static str,
        profile: Map<String, Value>,
    },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed { .. })
    }

    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::Ready(session) => Some(session),
            Self::Failed { profile, .. } => Some(Session::failed(profile)),
            _ => None,
        }
    }
}

/// runs the four call token dance against one portal, a fresh session per request
#[derive(Clone)]
pub struct SessionNegotiator {
    client: DynPortalClient,
}

impl SessionNegotiator {
    pub fn new(client: DynPortalClient) -> Self {
        Self { client }
    }

    /// never errors, a failed negotiation is a session with an empty token
    pub async fn negotiate(&self, portal: &PortalConfig) -> Session {
        let mut state = SessionState::Unauthenticated;

        while !state.is_terminal() {
            state = self.advance(portal, state).await;
        }

        match state.into_session() {
            Some(session) => {
                if session.is_authenticated() {
                    info!("session ready for portal {}", portal.bare_host());
                }
                session
            }
            None => Session::default(),
        }
    }

    /// one transition, each step only suspends on its own portal call
    pub async fn advance(&self, portal: &PortalConfig, state: SessionState) -> SessionState {
        match state {
            SessionState::Unauthenticated => match self.handshake(portal, "", None).await {
                Some(token) => SessionState::TokenAcquired { token },
                None => {
                    error!("initial handshake failed for {}", portal.bare_host());
                    SessionState::Failed {
                        stage: "handshake",
                        profile: Map::new(),
                    }
                }
            },
            SessionState::TokenAcquired { token } => {
                let profile = self.profile(portal, &token).await;
                SessionState::ProfileAuthed { token, profile }
            }
            SessionState::ProfileAuthed { token, profile } => {
                match self.handshake(portal, &token, Some(&token)).await {
                    Some(token) => SessionState::Authorized { token, profile },
                    None => {
                        error!("re-handshake failed for {}", portal.bare_host());
                        SessionState::Failed {
                            stage: "re-handshake",
                            profile,
                        }
                    }
                }
            }
            SessionState::Authorized { token, profile } => {
                let account_info = self.account_info(portal, &token).await;
                SessionState::Ready(Session {
                    token,
                    profile,
                    account_info,
                })
            }
            terminal => terminal,
        }
    }

    async fn call(&self, portal: &PortalConfig, request: PortalRequest) -> Option<LenientJson> {
        let action = request.action.name();
        match self.client.load(portal, &request).await {
            Ok(body) => {
                let decoded = LenientJson::decode(&body);
                if let LenientJson::Unparsable(raw) = &decoded {
                    warn!(
                        "{} returned a non json body ({} bytes)",
                        action,
                        raw.len()
                    );
                }
                Some(decoded)
            }
            Err(e) => {
                warn!("{} failed: {}", action, e);
                None
            }
        }
    }

    async fn handshake(
        &self,
        portal: &PortalConfig,
        token: &str,
        bearer: Option<&str>,
    ) -> Option<String> {
        let action = PortalAction::Handshake {
            token: token.to_string(),
        };
        let request = match bearer {
            Some(bearer) => PortalRequest::with_bearer(action, bearer),
            None => PortalRequest::new(action),
        };

        let decoded = self.call(portal, request).await?;
        let token = decoded.js().and_then(|js| field_string(js, "token"));
        debug!("handshake token present: {}", token.is_some());
        token
    }

    async fn profile(&self, portal: &PortalConfig, token: &str) -> Map<String, Value> {
        let request = PortalRequest::with_bearer(PortalAction::GetProfile, token);
        let decoded = self.call(portal, request).await;
        into_mapping(decoded.as_ref().and_then(|d| d.js()))
    }

    async fn account_info(&self, portal: &PortalConfig, token: &str) -> Map<String, Value> {
        let request = PortalRequest::with_bearer(PortalAction::AccountInfo, token);
        let decoded = self.call(portal, request).await;
        into_mapping(decoded.as_ref().and_then(|d| d.js()))
    }
}

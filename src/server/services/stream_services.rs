use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    database::portal::PortalConfig,
    server::{
        error::{AppResult, Error},
        services::portal_services::{
            DynPortalClient, LOCAL_CHANNEL_PREFIX, PortalAction, PortalRequest,
        },
        utils::{
            json_utils::{LenientJson, field_string},
            url_utils::{normalize_stream_url, strip_player_command},
        },
    },
};

/// which create_link commands to try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Default,
    // some portals hand out a faster upstream for `auto`/`ffmpeg`
    LowLatency,
}

impl StreamMode {
    pub fn for_portal(portal: &PortalConfig) -> Self {
        if portal.low_latency {
            Self::LowLatency
        } else {
            Self::Default
        }
    }

    /// commands in the order they're tried, the default one is always last
    pub fn candidates(&self, channel_id: &str) -> Vec<String> {
        let default = format!("ffrt {}{}", LOCAL_CHANNEL_PREFIX, channel_id);
        match self {
            Self::Default => vec![default],
            Self::LowLatency => vec![
                format!("auto {}", channel_id),
                format!("ffmpeg {}{}", LOCAL_CHANNEL_PREFIX, channel_id),
                default,
            ],
        }
    }
}

/// asks the portal to mint a real stream url for a channel
#[derive(Clone)]
pub struct StreamResolver {
    client: DynPortalClient,
}

impl StreamResolver {
    pub fn new(client: DynPortalClient) -> Self {
        Self { client }
    }

    pub async fn resolve(
        &self,
        portal: &PortalConfig,
        token: &str,
        channel_id: &str,
        mode: StreamMode,
    ) -> AppResult<String> {
        for cmd in mode.candidates(channel_id) {
            let Some(stream) = self.create_link(portal, token, &cmd).await else {
                debug!("create_link gave nothing for '{}'", cmd);
                continue;
            };

            let stream = normalize_stream_url(&stream, portal.bare_host());
            info!("resolved channel {} via '{}'", channel_id, cmd);

            if mode == StreamMode::LowLatency {
                // nobody waits on this, it only has to reach the cdn
                let client = self.client.clone();
                let url = stream.clone();
                tokio::spawn(async move {
                    client.warm(&url).await;
                });
            }

            return Ok(stream);
        }

        warn!("no stream available for channel {}", channel_id);
        Err(Error::NoStreamAvailable)
    }

    /// the `js.cmd` of a create_link call with any player token stripped, `None` when empty
    async fn create_link(&self, portal: &PortalConfig, token: &str, cmd: &str) -> Option<String> {
        let request = PortalRequest::with_bearer(
            PortalAction::CreateLink {
                cmd: cmd.to_string(),
            },
            token,
        );

        let body = match self.client.load(portal, &request).await {
            Ok(body) => body,
            Err(e) => {
                warn!("create_link failed for '{}': {}", cmd, e);
                return None;
            }
        };

        let decoded = LenientJson::decode(&body);
        let stream = decoded
            .js()
            .and_then(|js: &Value| field_string(js, "cmd"))
            .map(|cmd| strip_player_command(&cmd))?;

        Some(stream).filter(|s| !s.is_empty())
    }
}

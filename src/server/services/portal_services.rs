// raw load.php plumbing, everything above this only ever sees response bodies
use async_trait::async_trait;
use mockall::automock;
use reqwest::header;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    database::portal::PortalConfig,
    server::error::{AppResult, Error},
};

pub type DynPortalClient = Arc<dyn PortalClientTrait + Send + Sync>;

/// what the real MAG firmware sends, some portals block anything else
pub const STB_USER_AGENT: &str = "Mozilla/5.0 (QtEmbedded; U; Linux; C) AppleWebKit/533.3 (KHTML, like Gecko) MAG200 stbapp ver: 2 rev: 250 Safari/533.3";

/// the prefix of every `cmd` the portal hands out for live channels
pub const LOCAL_CHANNEL_PREFIX: &str = "http://localhost/ch/";

const LOAD_PATH: &str = "/stalker_portal/server/load.php";

/// the load.php actions we use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalAction {
    Handshake { token: String },
    GetProfile,
    AccountInfo,
    Genres,
    AllChannels,
    CreateLink { cmd: String },
}

impl PortalAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Handshake { .. } => "handshake",
            Self::GetProfile => "get_profile",
            Self::AccountInfo => "get_main_info",
            Self::Genres => "get_genres",
            Self::AllChannels => "get_all_channels",
            Self::CreateLink { .. } => "create_link",
        }
    }

    /// query string pairs for this action, get_profile carries the whole device fingerprint
    pub fn query(&self, portal: &PortalConfig) -> Vec<(&'static str, String)> {
        let mut query = match self {
            Self::Handshake { token } => vec![
                ("type", "stb".to_string()),
                ("action", "handshake".to_string()),
                ("token", token.clone()),
            ],
            Self::GetProfile => {
                let identity = portal.hardware_identity();
                let metrics = serde_json::json!({
                    "mac": portal.mac_address,
                    "model": "",
                    "type": "STB",
                    "uid": "",
                    "device": "",
                    "random": "",
                });

                vec![
                    ("type", "stb".to_string()),
                    ("action", "get_profile".to_string()),
                    ("hd", "1".to_string()),
                    ("ver", "ImageDescription: 0.2.18-r14-pub-250;".to_string()),
                    ("num_banks", "2".to_string()),
                    ("sn", portal.serial_number.clone()),
                    ("stb_type", portal.stb_type.clone()),
                    ("client_type", "STB".to_string()),
                    ("image_version", "218".to_string()),
                    ("video_out", "hdmi".to_string()),
                    ("device_id", portal.device_id.clone()),
                    ("device_id2", portal.device_id_2.clone()),
                    ("signature", String::new()),
                    ("auth_second_step", "1".to_string()),
                    ("hw_version", identity.hw_version),
                    ("not_valid_token", "0".to_string()),
                    ("metrics", metrics.to_string()),
                    ("hw_version_2", identity.hw_version_2),
                    ("api_signature", portal.api_signature.clone()),
                    ("prehash", String::new()),
                ]
            }
            Self::AccountInfo => vec![
                ("type", "account_info".to_string()),
                ("action", "get_main_info".to_string()),
            ],
            Self::Genres => vec![
                ("type", "itv".to_string()),
                ("action", "get_genres".to_string()),
            ],
            Self::AllChannels => vec![
                ("type", "itv".to_string()),
                ("action", "get_all_channels".to_string()),
            ],
            Self::CreateLink { cmd } => vec![
                ("type", "itv".to_string()),
                ("action", "create_link".to_string()),
                ("cmd", cmd.clone()),
            ],
        };

        query.push(("JsHttpRequest", "1-xml".to_string()));
        query
    }
}

/// one call to load.php, `bearer` is attached as `Authorization: Bearer` when present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub action: PortalAction,
    pub bearer: Option<String>,
}

impl PortalRequest {
    pub fn new(action: PortalAction) -> Self {
        Self {
            action,
            bearer: None,
        }
    }

    pub fn with_bearer(action: PortalAction, token: &str) -> Self {
        Self {
            action,
            bearer: Some(token.to_string()).filter(|t| !t.is_empty()),
        }
    }
}

#[automock]
#[async_trait]
pub trait PortalClientTrait {
    /// raw body of a load.php call, non-2xx and transport errors come back as `Err`
    async fn load(&self, portal: &PortalConfig, request: &PortalRequest) -> AppResult<String>;

    /// small ranged GET against a resolved stream so a cdn edge has it warm, result ignored
    async fn warm(&self, stream_url: &str);
}

pub struct PortalClient {
    http_client: reqwest::Client,
}

impl PortalClient {
    pub fn new(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(STB_USER_AGENT)
            .timeout(timeout)
            .pool_max_idle_per_host(30)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { http_client }
    }

    pub fn load_url(portal: &PortalConfig) -> String {
        format!("{}{}", portal.base_url(), LOAD_PATH)
    }

    /// headers every portal call carries
    pub fn apply_portal_headers(
        request_builder: reqwest::RequestBuilder,
        portal: &PortalConfig,
        bearer: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let request_builder = request_builder
            .header(
                header::COOKIE,
                format!("mac={}; stb_lang=en; timezone=GMT", portal.mac_address),
            )
            .header(
                header::REFERER,
                format!("{}/stalker_portal/c/", portal.base_url()),
            )
            .header(header::USER_AGENT, STB_USER_AGENT)
            .header(
                "X-User-Agent",
                format!("Model: {}; Link: WiFi", portal.stb_type),
            );

        match bearer {
            Some(token) => request_builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request_builder,
        }
    }
}

#[async_trait]
impl PortalClientTrait for PortalClient {
    async fn load(&self, portal: &PortalConfig, request: &PortalRequest) -> AppResult<String> {
        let action = request.action.name();
        debug!("portal {} -> {}", portal.bare_host(), action);

        let request_builder = self
            .http_client
            .get(Self::load_url(portal))
            .query(&request.action.query(portal));
        let request_builder =
            Self::apply_portal_headers(request_builder, portal, request.bearer.as_deref());

        let response = request_builder.send().await.map_err(|e| {
            warn!("portal {} {} request failed: {}", portal.bare_host(), action, e);
            Error::Upstream(format!("{} request failed: {}", action, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("portal {} {} returned {}", portal.bare_host(), action, status);
            return Err(Error::Upstream(format!("{} returned {}", action, status)));
        }

        response.text().await.map_err(|e| {
            warn!("failed to read {} body: {}", action, e);
            Error::Upstream(format!("failed to read {} body: {}", action, e))
        })
    }

    async fn warm(&self, stream_url: &str) {
        let result = self
            .http_client
            .get(stream_url)
            .header(header::RANGE, "bytes=0-4095")
            .send()
            .await;

        if let Err(e) = result {
            debug!("warm up of {} failed: {}", stream_url, e);
        }
    }
}

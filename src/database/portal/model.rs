use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::server::utils::hardware_utils::HardwareIdentity;

/// everything needed to pretend to be a set top box for one portal
///
/// this is what ends up in `<portals_dir>/<folder>/config.json`. it's never mutated by a request,
/// the derived hardware versions are computed per call unless an override is stored here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PortalConfig {
    #[serde(default)]
    pub display_name: String,
    #[validate(length(min = 1, message = "host is required"))]
    pub host: String,
    #[validate(length(min = 1, message = "mac_address is required"))]
    pub mac_address: String,
    #[validate(length(min = 1, message = "serial_number is required"))]
    pub serial_number: String,
    #[validate(length(min = 1, message = "device_id is required"))]
    pub device_id: String,
    #[validate(length(min = 1, message = "device_id_2 is required"))]
    pub device_id_2: String,
    #[serde(default = "default_stb_type")]
    pub stb_type: String,
    #[serde(default = "default_api_signature")]
    pub api_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epg_url: Option<String>,
    #[serde(default = "default_true")]
    pub adult_filter: bool,
    #[serde(default)]
    pub low_latency: bool,
    // optional overrides, derived from mac/serial when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_version_2: Option<String>,
}

fn default_stb_type() -> String {
    "MAG250".to_string()
}

fn default_api_signature() -> String {
    "263".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            host: String::new(),
            mac_address: String::new(),
            serial_number: String::new(),
            device_id: String::new(),
            device_id_2: String::new(),
            stb_type: default_stb_type(),
            api_signature: default_api_signature(),
            epg_url: None,
            adult_filter: true,
            low_latency: false,
            hw_version: None,
            hw_version_2: None,
        }
    }
}

impl PortalConfig {
    /// `http://host` unless the host was stored with a scheme already
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        }
    }

    /// host without any scheme, used when a stream link comes back as a bare path
    pub fn bare_host(&self) -> &str {
        let host = self.host.trim().trim_end_matches('/');
        host.strip_prefix("http://")
            .or_else(|| host.strip_prefix("https://"))
            .unwrap_or(host)
    }

    /// stored overrides win, anything missing gets derived from mac + serial
    pub fn hardware_identity(&self) -> HardwareIdentity {
        let derived = HardwareIdentity::derive(&self.mac_address, &self.serial_number);

        HardwareIdentity {
            hw_version: self
                .hw_version
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or(derived.hw_version),
            hw_version_2: self
                .hw_version_2
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or(derived.hw_version_2),
        }
    }
}

/// what the portal list endpoint shows for each folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSummary {
    pub folder: String,
    pub display_name: String,
    pub host: String,
    pub active: bool,
    pub has_saved_playlist: bool,
    pub adult_filter: bool,
    pub low_latency: bool,
}

/// written next to a saved playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalMeta {
    pub saved_at: DateTime<Utc>,
    pub host: String,
    pub channel_count: usize,
    pub config: PortalConfig,
}

/// `active_portal.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivePortal {
    pub active: Option<String>,
}

pub type DynPortalRepository = Arc<dyn PortalRepository + Send + Sync>;

#[async_trait::async_trait]
pub trait PortalRepository {
    async fn list(&self) -> Result<Vec<PortalSummary>>;
    async fn get(&self, folder: &str) -> Result<Option<PortalConfig>>;
    async fn create(&self, config: &PortalConfig) -> Result<String>;
    async fn update(&self, folder: &str, config: &PortalConfig) -> Result<bool>;
    async fn delete(&self, folder: &str) -> Result<bool>;
    async fn set_active(&self, folder: Option<&str>) -> Result<()>;
    async fn get_active(&self) -> Result<Option<String>>;
    // saved playlists, last write wins
    async fn save_playlist(&self, folder: &str, playlist: &str, meta: &PortalMeta) -> Result<()>;
    async fn load_saved(&self, folder: &str, file: &str) -> Result<Option<String>>;
    async fn delete_saved(&self, folder: &str) -> Result<bool>;
    async fn load_meta(&self, folder: &str) -> Result<Option<PortalMeta>>;
}

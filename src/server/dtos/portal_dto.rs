use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::portal::PortalConfig;

/// body for creating or editing a portal, only the name is strictly required here, the rest is
/// checked before anything talks to the portal
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PortalRequestDto {
    #[validate(length(min = 1, max = 128, message = "portal name required"))]
    pub display_name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub device_id_2: String,
    pub stb_type: Option<String>,
    pub api_signature: Option<String>,
    pub epg_url: Option<String>,
    pub adult_filter: Option<bool>,
    pub low_latency: Option<bool>,
}

impl PortalRequestDto {
    pub fn into_config(self) -> PortalConfig {
        let defaults = PortalConfig::default();

        PortalConfig {
            display_name: self.display_name.trim().to_string(),
            host: self.host.trim().to_string(),
            mac_address: self.mac_address.trim().to_string(),
            serial_number: self.serial_number.trim().to_string(),
            device_id: self.device_id.trim().to_string(),
            device_id_2: self.device_id_2.trim().to_string(),
            stb_type: non_empty(self.stb_type).unwrap_or(defaults.stb_type),
            api_signature: non_empty(self.api_signature).unwrap_or(defaults.api_signature),
            epg_url: non_empty(self.epg_url),
            adult_filter: self.adult_filter.unwrap_or(defaults.adult_filter),
            low_latency: self.low_latency.unwrap_or(defaults.low_latency),
            hw_version: None,
            hw_version_2: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
pub struct PortalCreatedResponse {
    pub folder: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct PortalSelectedResponse {
    pub ok: bool,
    pub active: String,
}

#[derive(Debug, Serialize)]
pub struct PortalSavedResponse {
    pub folder: String,
    pub channels: usize,
    pub saved_playlist: String,
}

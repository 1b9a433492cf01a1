use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: String,
    pub environment: String,
    pub services: ServiceHealthDetails,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealthDetails {
    pub portal_store: PortalStoreHealth,
}

#[derive(Debug, Serialize)]
pub struct PortalStoreHealth {
    pub status: HealthStatus,
    pub portals: usize,
    pub active_portal: Option<String>,
    // true when the env portal is what /playlist.m3u8 would use
    pub using_env_portal: bool,
}

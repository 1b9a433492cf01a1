use axum::Extension;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::error;

use crate::logger::Logger;
use crate::server::dtos::health_dto::{
    HealthResponse, HealthStatus, PortalStoreHealth, ServiceHealthDetails,
};
use crate::server::services::ProxyServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// health endpoint - only looks at the portal store, portals themselves aren't pinged
pub async fn health_endpoint(
    Extension(services): Extension<ProxyServices>,
) -> (StatusCode, Json<HealthResponse>) {
    let portal_store = check_portal_store(&services).await;

    // no portal at all is still a running server, just not a useful one yet
    let overall_status = match portal_store.status {
        HealthStatus::Unhealthy => HealthStatus::Unhealthy,
        _ if portal_store.active_portal.is_none() && !portal_store.using_env_portal => {
            HealthStatus::Degraded
        }
        status => status,
    };

    let response = HealthResponse {
        status: overall_status,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: Logger::environment_name(services.config.cargo_env).to_string(),
        services: ServiceHealthDetails { portal_store },
    };

    let http_status = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (http_status, Json(response))
}

async fn check_portal_store(services: &ProxyServices) -> PortalStoreHealth {
    let env_portal = services.config.env_portal().is_some();

    let listed = services.portals.list().await;
    let active = services.portals.get_active().await;

    match (listed, active) {
        (Ok(portals), Ok(active_portal)) => PortalStoreHealth {
            status: HealthStatus::Healthy,
            portals: portals.len(),
            using_env_portal: active_portal.is_none() && env_portal,
            active_portal,
        },
        (Err(e), _) | (_, Err(e)) => {
            error!("portal store health check failed: {:#}", e);
            PortalStoreHealth {
                status: HealthStatus::Unhealthy,
                portals: 0,
                active_portal: None,
                using_env_portal: env_portal,
            }
        }
    }
}

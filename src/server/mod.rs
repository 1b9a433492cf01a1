pub mod api;
pub mod dtos;
pub mod error;
pub mod extractors;
pub mod services;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    Extension, Router, ServiceExt,
    extract::Request,
    http::{HeaderValue, Method, StatusCode},
    routing::get,
};
use once_cell::sync::Lazy;
use tower::{Layer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    database::portal::DynPortalRepository,
    server::{
        api::{
            health_controller::health_endpoint, playlist_controller::PlaylistController,
            portal_controller::PortalController, stream_controller::StreamController,
        },
        services::ProxyServices,
        utils::url_utils::build_origin,
    },
};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_uptime_seconds() -> u64 {
    START_TIME.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct ProxyApplicationServer;

impl ProxyApplicationServer {
    /// all routes with services attached, no listener
    pub fn router(services: ProxyServices) -> Router {
        let cors = Self::cors(&services.config.cors_origin);

        Router::new()
            .route("/health", get(health_endpoint))
            .nest("/api/v1/portals", PortalController::app())
            .merge(PlaylistController::app())
            .merge(StreamController::app())
            .fallback(|| async { (StatusCode::NOT_FOUND, "Unknown route") })
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors)
                    .layer(Extension(services)),
            )
    }

    pub async fn serve(config: Arc<AppConfig>, portals: DynPortalRepository) -> anyhow::Result<()> {
        Lazy::force(&START_TIME);

        let services = ProxyServices::new(portals, config.clone());
        let router = Self::router(services);

        // trailing slashes get trimmed before routing so /playlist.m3u8/ still works
        let app = NormalizePathLayer::trim_trailing_slash().layer(router);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("listening on {}", addr);
        info!(
            "playlist: {}/playlist.m3u8",
            build_origin(Some("localhost"), config.port)
        );

        axum::serve(
            listener,
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
        )
        .await
        .context("error while serving")?;

        Ok(())
    }

    fn cors(cors_origin: &str) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);

        if cors_origin.trim() == "*" {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = cors_origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("ignoring invalid cors origin {}", o);
                    None
                }
            })
            .collect();

        layer.allow_origin(origins)
    }
}

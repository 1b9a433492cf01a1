use axum::Extension;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::HOST;
use axum::http::request::Parts;
use std::net::SocketAddr;
use tracing::debug;

use crate::server::error::Error;
use crate::server::services::ProxyServices;
use crate::server::utils::url_utils::{build_origin, host_without_port};

/// where the client reached us from, playlists point back at this origin
pub struct RequestOrigin {
    // `http://<request host>:<our port>`
    pub origin: String,
    pub user_ip: Option<String>,
    pub services: ProxyServices,
}

/// cloudflare, then proxies, then the socket itself
pub fn client_ip(parts: &Parts) -> Option<String> {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    header("cf-connecting-ip")
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|s| s.split(',').next().map(|ip| ip.trim().to_string()))
        })
        .or_else(|| header("x-real-ip"))
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
}

impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(services): Extension<ProxyServices> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|err| Error::InternalServerErrorWithContext(err.to_string()))?;

        let request_host = parts
            .headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string())
            .or_else(|| parts.uri.host().map(|s| s.to_string()));

        let origin = build_origin(request_host.as_deref(), services.config.port);

        // last resort for the info block is whatever host the client used
        let user_ip = client_ip(parts).or_else(|| {
            request_host
                .as_deref()
                .map(|h| host_without_port(h).to_string())
        });

        debug!("request origin {} for client {:?}", origin, user_ip);

        Ok(RequestOrigin {
            origin,
            user_ip,
            services,
        })
    }
}

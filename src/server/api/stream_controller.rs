use axum::{
    Extension, Router,
    extract::Path,
    response::Response,
    routing::get,
};
use tracing::{debug, error};
use validator::Validate;

use crate::{
    database::portal::PortalConfig,
    server::{
        error::{AppResult, Error},
        services::{ProxyServices, stream_services::StreamMode},
        utils::response_utils::found_redirect,
    },
};

pub struct StreamController;

impl StreamController {
    pub fn app() -> Router {
        Router::new()
            // active portal, this is what the env portal playlists point at
            .route("/{file}", get(Self::active_stream))
            .route("/portal/{portal}/{file}", get(Self::portal_stream))
    }

    /// `4821.m3u8` -> `4821`, axum already percent-decoded it
    fn channel_id(file: &str) -> AppResult<&str> {
        file.strip_suffix(".m3u8")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::NotFound("Unknown route".to_string()))
    }

    async fn active_stream(
        Extension(services): Extension<ProxyServices>,
        Path(file): Path<String>,
    ) -> AppResult<Response> {
        let id = Self::channel_id(&file)?;
        let selected = services.selected_portal().await?;
        Self::redirect(&services, &selected.config, id).await
    }

    async fn portal_stream(
        Extension(services): Extension<ProxyServices>,
        Path((portal, file)): Path<(String, String)>,
    ) -> AppResult<Response> {
        let id = Self::channel_id(&file)?;
        let config = services.portal(&portal).await?;
        Self::redirect(&services, &config, id).await
    }

    /// fresh session every time, tokens aren't shared between requests
    async fn redirect(
        services: &ProxyServices,
        portal: &PortalConfig,
        channel_id: &str,
    ) -> AppResult<Response> {
        portal.validate()?;

        let session = services.sessions.negotiate(portal).await;
        if !session.is_authenticated() {
            error!("token failed while resolving channel {}", channel_id);
            return Err(Error::TokenGenerationFailed);
        }

        let stream = services
            .streams
            .resolve(
                portal,
                &session.token,
                channel_id,
                StreamMode::for_portal(portal),
            )
            .await?;

        debug!("redirecting channel {} to {}", channel_id, stream);
        found_redirect(&stream)
    }
}

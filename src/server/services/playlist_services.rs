use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::{
    database::portal::PortalConfig,
    server::{
        error::{AppResult, Error},
        services::{
            catalog_services::{CatalogService, apply_adult_filter},
            session_services::SessionNegotiator,
        },
        utils::playlist_utils::{PlaylistDocument, RenderContext, render_playlist},
    },
};

/// where the rendered urls should point and who asked
#[derive(Debug, Clone)]
pub struct PlaylistTarget {
    pub origin: String,
    pub proxy_path_prefix: String,
    pub user_ip: Option<String>,
}

/// negotiate -> catalog -> filter -> render, one fresh session per call
#[derive(Clone)]
pub struct PlaylistService {
    sessions: SessionNegotiator,
    catalog: CatalogService,
    info_stream_url: String,
}

impl PlaylistService {
    pub fn new(
        sessions: SessionNegotiator,
        catalog: CatalogService,
        info_stream_url: String,
    ) -> Self {
        Self {
            sessions,
            catalog,
            info_stream_url,
        }
    }

    pub async fn build(
        &self,
        portal: &PortalConfig,
        target: &PlaylistTarget,
    ) -> AppResult<PlaylistDocument> {
        portal.validate()?;

        let session = self.sessions.negotiate(portal).await;
        if !session.is_authenticated() {
            return Err(Error::TokenGenerationFailed);
        }

        let channels = self.catalog.fetch_catalog(portal, &session.token).await;
        let total = channels.len();
        let channels = apply_adult_filter(channels, portal.adult_filter);
        if channels.len() != total {
            info!("adult filter removed {} channels", total - channels.len());
        }

        let ctx = RenderContext {
            portal,
            origin: &target.origin,
            proxy_path_prefix: &target.proxy_path_prefix,
            user_ip: target.user_ip.as_deref(),
            info_stream_url: &self.info_stream_url,
            now: Utc::now(),
        };

        Ok(render_playlist(&channels, &session, &ctx))
    }
}

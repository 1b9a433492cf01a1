use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::{
    config::AppConfig,
    database::portal::{DynPortalRepository, PortalConfig},
    server::{
        error::{AppResult, Error},
        utils::playlist_utils::portal_path_prefix,
    },
};

use super::{
    catalog_services::CatalogService,
    playlist_services::PlaylistService,
    portal_services::{DynPortalClient, PortalClient},
    session_services::SessionNegotiator,
    stream_services::StreamResolver,
};

/// the portal the root level routes use, either a stored folder or the env portal
#[derive(Debug, Clone)]
pub struct SelectedPortal {
    pub folder: Option<String>,
    pub config: PortalConfig,
}

impl SelectedPortal {
    /// "/portal/<folder>" for stored portals, "" for the env portal
    pub fn proxy_path_prefix(&self) -> String {
        self.folder
            .as_deref()
            .map(portal_path_prefix)
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct ProxyServices {
    pub portals: DynPortalRepository,
    pub portal_client: DynPortalClient,
    pub sessions: SessionNegotiator,
    pub streams: StreamResolver,
    pub playlists: PlaylistService,
    pub config: Arc<AppConfig>,
}

impl ProxyServices {
    pub fn new(portals: DynPortalRepository, config: Arc<AppConfig>) -> Self {
        let portal_client = Arc::new(PortalClient::new(Duration::from_secs(
            config.request_timeout_secs,
        ))) as DynPortalClient;

        Self::with_client(portals, portal_client, config)
    }

    /// same wiring with any portal client, tests hand in a mock here
    pub fn with_client(
        portals: DynPortalRepository,
        portal_client: DynPortalClient,
        config: Arc<AppConfig>,
    ) -> Self {
        info!("starting proxy services...");

        let sessions = SessionNegotiator::new(portal_client.clone());
        let catalog = CatalogService::new(portal_client.clone());
        let streams = StreamResolver::new(portal_client.clone());
        let playlists =
            PlaylistService::new(sessions.clone(), catalog, config.info_stream_url.clone());

        Self {
            portals,
            portal_client,
            sessions,
            streams,
            playlists,
            config,
        }
    }

    /// active stored portal, falling back to the env portal
    pub async fn selected_portal(&self) -> AppResult<SelectedPortal> {
        if let Some(folder) = self.portals.get_active().await? {
            let config = self.portals.get(&folder).await?.ok_or_else(|| {
                Error::NotFound("Active portal config missing".to_string())
            })?;
            return Ok(SelectedPortal {
                folder: Some(folder),
                config,
            });
        }

        self.config
            .env_portal()
            .map(|config| SelectedPortal {
                folder: None,
                config,
            })
            .ok_or_else(|| Error::BadRequest("No active portal selected".to_string()))
    }

    pub async fn portal(&self, folder: &str) -> AppResult<PortalConfig> {
        self.portals
            .get(folder)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Portal {} not found", folder)))
    }
}

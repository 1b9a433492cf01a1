use serde_json::Value;
use tracing::{info, warn};

use crate::{
    database::portal::PortalConfig,
    server::{
        dtos::stalker_dto::{Channel, GenreMap},
        services::portal_services::{DynPortalClient, PortalAction, PortalRequest},
        utils::json_utils::LenientJson,
    },
};

/// channel + genre lists joined into one flat list, any failure is just an empty list
#[derive(Clone)]
pub struct CatalogService {
    client: DynPortalClient,
}

impl CatalogService {
    pub fn new(client: DynPortalClient) -> Self {
        Self { client }
    }

    pub async fn fetch_catalog(&self, portal: &PortalConfig, token: &str) -> Vec<Channel> {
        // independent of each other so they go out together
        let (records, genres) = futures::future::join(
            self.fetch_channel_records(portal, token),
            self.fetch_genres(portal, token),
        )
        .await;

        let genre_map = GenreMap::from_genres(&genres);
        let channels: Vec<Channel> = records
            .iter()
            .filter(|record| record.is_object())
            .map(|record| Channel::from_record(record, &genre_map))
            .collect();

        info!(
            "catalog for {}: {} channels, {} genres",
            portal.bare_host(),
            channels.len(),
            genre_map.len()
        );
        channels
    }

    /// `{js:{data:[...]}}`
    pub async fn fetch_channel_records(&self, portal: &PortalConfig, token: &str) -> Vec<Value> {
        let request = PortalRequest::with_bearer(PortalAction::AllChannels, token);
        let Some(decoded) = self.call(portal, request).await else {
            return Vec::new();
        };

        decoded
            .js()
            .and_then(|js| js.get("data"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    /// `{js:[{id,title}, ...]}`
    pub async fn fetch_genres(&self, portal: &PortalConfig, token: &str) -> Vec<Value> {
        let request = PortalRequest::with_bearer(PortalAction::Genres, token);
        let Some(decoded) = self.call(portal, request).await else {
            return Vec::new();
        };

        decoded
            .js()
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    async fn call(&self, portal: &PortalConfig, request: PortalRequest) -> Option<LenientJson> {
        let action = request.action.name();
        match self.client.load(portal, &request).await {
            Ok(body) => match LenientJson::decode(&body) {
                LenientJson::Unparsable(_) => {
                    warn!("{} body wasn't json, treating as empty", action);
                    None
                }
                parsed => Some(parsed),
            },
            Err(e) => {
                warn!("{} failed, treating as empty: {}", action, e);
                None
            }
        }
    }
}

/// drops channels whose genre starts with "adult" (any case) when the filter is on
pub fn apply_adult_filter(channels: Vec<Channel>, enabled: bool) -> Vec<Channel> {
    if !enabled {
        return channels;
    }

    channels.into_iter().filter(|c| !c.is_adult()).collect()
}

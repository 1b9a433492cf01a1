use axum::{
    Extension, Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::Utc;
use tracing::info;

use crate::{
    database::portal::PortalMeta,
    server::{
        dtos::portal_dto::PortalSavedResponse,
        error::{AppResult, Error},
        extractors::RequestOrigin,
        services::{ProxyServices, playlist_services::PlaylistTarget},
        utils::{
            playlist_utils::portal_path_prefix,
            response_utils::build_m3u8_response,
            url_utils::rewrite_origin,
        },
    },
};

pub struct PlaylistController;

impl PlaylistController {
    pub fn app() -> Router {
        Router::new()
            .route("/playlist.m3u8", get(Self::active_playlist))
            .route("/portal/{portal}/save", post(Self::save_playlist))
            .route("/portal/{portal}/saved", delete(Self::delete_saved))
            .route("/portal/{portal}/saved/{file}", get(Self::saved_file))
            .route("/portal/{portal}/meta", get(Self::meta))
    }

    /// rendered live for whichever portal is active
    async fn active_playlist(
        RequestOrigin {
            origin,
            user_ip,
            services,
        }: RequestOrigin,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let selected = services.selected_portal().await?;

        let target = PlaylistTarget {
            origin,
            proxy_path_prefix: selected.proxy_path_prefix(),
            user_ip,
        };
        let playlist = services.playlists.build(&selected.config, &target).await?;

        info!(
            "serving playlist for {} with {} channels",
            selected.config.bare_host(),
            playlist.channel_count()
        );
        build_m3u8_response(&playlist.to_string(), &headers)
    }

    /// renders with the current origin and keeps it on disk next to the portal config
    async fn save_playlist(
        RequestOrigin {
            origin,
            user_ip,
            services,
        }: RequestOrigin,
        Path(portal): Path<String>,
    ) -> AppResult<Json<PortalSavedResponse>> {
        let config = services.portal(&portal).await?;

        let target = PlaylistTarget {
            origin: origin.clone(),
            proxy_path_prefix: portal_path_prefix(&portal),
            user_ip,
        };
        let playlist = services.playlists.build(&config, &target).await?;

        let meta = PortalMeta {
            saved_at: Utc::now(),
            host: config.host.clone(),
            channel_count: playlist.channel_count(),
            config,
        };
        services
            .portals
            .save_playlist(&portal, &playlist.to_string(), &meta)
            .await?;

        Ok(Json(PortalSavedResponse {
            saved_playlist: format!("{}{}/saved/playlist.m3u8", origin, portal_path_prefix(&portal)),
            channels: meta.channel_count,
            folder: portal,
        }))
    }

    /// saved playlists get their embedded origins pointed at whoever is asking now
    async fn saved_file(
        RequestOrigin {
            origin, services, ..
        }: RequestOrigin,
        Path((portal, file)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let content = services
            .portals
            .load_saved(&portal, &file)
            .await?
            .ok_or_else(|| Error::NotFound("Not found".to_string()))?;

        if file.ends_with(".json") {
            return Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                content,
            )
                .into_response());
        }

        let content = rewrite_origin(&content, &origin, services.config.port);
        build_m3u8_response(&content, &headers)
    }

    async fn delete_saved(
        Extension(services): Extension<ProxyServices>,
        Path(portal): Path<String>,
    ) -> AppResult<StatusCode> {
        if services.portals.delete_saved(&portal).await? {
            Ok(StatusCode::NO_CONTENT)
        } else {
            Err(Error::NotFound("No saved playlist".to_string()))
        }
    }

    async fn meta(
        Extension(services): Extension<ProxyServices>,
        Path(portal): Path<String>,
    ) -> AppResult<Json<PortalMeta>> {
        services
            .portals
            .load_meta(&portal)
            .await?
            .map(Json)
            .ok_or_else(|| Error::NotFound("Not found".to_string()))
    }
}

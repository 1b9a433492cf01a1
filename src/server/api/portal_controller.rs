// admin side, the html ui lives elsewhere and talks to these
use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    routing::{get, post},
};
use tracing::info;
use validator::Validate;

use crate::{
    database::portal::{PortalConfig, PortalSummary},
    server::{
        dtos::portal_dto::{PortalCreatedResponse, PortalRequestDto, PortalSelectedResponse},
        error::{AppResult, Error},
        extractors::ValidationExtractor,
        services::ProxyServices,
    },
};

pub struct PortalController;

impl PortalController {
    pub fn app() -> Router {
        Router::new()
            .route("/", get(Self::list).post(Self::create))
            .route(
                "/{folder}",
                get(Self::get).put(Self::update).delete(Self::delete),
            )
            .route("/{folder}/select", post(Self::select))
    }

    async fn list(
        Extension(services): Extension<ProxyServices>,
    ) -> AppResult<Json<Vec<PortalSummary>>> {
        Ok(Json(services.portals.list().await?))
    }

    async fn create(
        Extension(services): Extension<ProxyServices>,
        ValidationExtractor(body): ValidationExtractor<PortalRequestDto>,
    ) -> AppResult<(StatusCode, Json<PortalCreatedResponse>)> {
        let config = body.into_config();
        config.validate()?;

        let folder = services.portals.create(&config).await?;
        let active = services.portals.get_active().await?.as_deref() == Some(folder.as_str());

        info!("portal {} created (active: {})", folder, active);
        Ok((
            StatusCode::CREATED,
            Json(PortalCreatedResponse { folder, active }),
        ))
    }

    async fn get(
        Extension(services): Extension<ProxyServices>,
        Path(folder): Path<String>,
    ) -> AppResult<Json<PortalConfig>> {
        Ok(Json(services.portal(&folder).await?))
    }

    async fn update(
        Extension(services): Extension<ProxyServices>,
        Path(folder): Path<String>,
        ValidationExtractor(body): ValidationExtractor<PortalRequestDto>,
    ) -> AppResult<StatusCode> {
        let existing = services.portal(&folder).await?;

        // hardware overrides aren't editable from the form, keep what was there
        let config = PortalConfig {
            hw_version: existing.hw_version,
            hw_version_2: existing.hw_version_2,
            ..body.into_config()
        };
        config.validate()?;

        if services.portals.update(&folder, &config).await? {
            Ok(StatusCode::NO_CONTENT)
        } else {
            Err(Error::NotFound("Portal not found".to_string()))
        }
    }

    async fn delete(
        Extension(services): Extension<ProxyServices>,
        Path(folder): Path<String>,
    ) -> AppResult<StatusCode> {
        if services.portals.delete(&folder).await? {
            Ok(StatusCode::NO_CONTENT)
        } else {
            Err(Error::NotFound("Not found".to_string()))
        }
    }

    async fn select(
        Extension(services): Extension<ProxyServices>,
        Path(folder): Path<String>,
    ) -> AppResult<Json<PortalSelectedResponse>> {
        services.portal(&folder).await?;
        services.portals.set_active(Some(&folder)).await?;

        info!("active portal is now {}", folder);
        Ok(Json(PortalSelectedResponse {
            ok: true,
            active: folder,
        }))
    }
}

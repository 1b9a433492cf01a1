use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::server::error::Error;

/// json body that has already passed its `validator` rules
pub struct ValidationExtractor<T>(pub T);

impl<T, S> FromRequest<S> for ValidationExtractor<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidationExtractor(value))
    }
}

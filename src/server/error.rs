use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

pub type AppResult<T> = Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    // handshake or re-handshake came back without a token
    #[error("Token generation failed")]
    TokenGenerationFailed,

    // none of the create_link commands gave us something to redirect to
    #[error("No stream URL received")]
    NoStreamAvailable,

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("internal server error")]
    InternalServerError,

    #[error("{0}")]
    InternalServerErrorWithContext(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::BadRequest(format!("invalid portal config: {}", errors).replace('\n', ", "))
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::TokenGenerationFailed
            | Self::NoStreamAvailable
            | Self::InternalServerError
            | Self::InternalServerErrorWithContext(_)
            | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // don't leak file paths and the like from anyhow chains
        let body = match &self {
            Self::Anyhow(e) => {
                error!("unhandled error: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, body).into_response()
    }
}

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use flate2::{Compression, write::GzEncoder};
use std::io::Write;
use tracing::{debug, error};

use crate::server::error::{AppResult, Error};

pub const M3U8_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// encodings we're willing to send playlists with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentEncoding {
    Zstd,
    Gzip,
    None,
}

impl ContentEncoding {
    /// players that send `identity` get it raw, otherwise zstd beats gzip
    pub fn from_accept_encoding(accept_encoding: Option<&str>) -> Self {
        match accept_encoding {
            Some(v) if v == "identity" || v.starts_with("identity,") => Self::None,
            Some(v) if v.contains("zstd") => Self::Zstd,
            Some(v) if v.contains("gzip") => Self::Gzip,
            _ => Self::None,
        }
    }

    pub fn as_header_value(&self) -> Option<&'static str> {
        match self {
            Self::Zstd => Some("zstd"),
            Self::Gzip => Some("gzip"),
            Self::None => None,
        }
    }

    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        match self {
            Self::Zstd => zstd::encode_all(data, 3),
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::None => Ok(data.to_vec()),
        }
    }
}

/// playlist body with the mpegurl type, no caching, and compression if the client asked for it
pub fn build_m3u8_response(body: &str, request_headers: &HeaderMap) -> AppResult<Response> {
    let encoding = ContentEncoding::from_accept_encoding(
        request_headers
            .get(header::ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok()),
    );

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(M3U8_CONTENT_TYPE),
    );
    response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let response_body = encoding.compress(body.as_bytes()).map_err(|e| {
        error!("failed to compress playlist with {:?}: {}", encoding, e);
        Error::InternalServerErrorWithContext("Failed to compress response".to_string())
    })?;

    if let Some(value) = encoding.as_header_value() {
        response_headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static(value));
    }
    debug!(
        "playlist {} bytes, sent as {} bytes ({:?})",
        body.len(),
        response_body.len(),
        encoding
    );

    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(response_body.len()));

    Ok((StatusCode::OK, response_headers, response_body).into_response())
}

/// plain 302 to wherever the portal told us the stream lives
pub fn found_redirect(location: &str) -> AppResult<Response> {
    let location = HeaderValue::from_str(location).map_err(|_| {
        error!("stream url isn't a valid header value: {}", location);
        Error::NoStreamAvailable
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

//! Error type for the platform API client

use thiserror::Error;

/// Error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API error (status {status}): {message}")]
    Http {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Build the error for a non-success response.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized
        } else {
            ApiError::Http {
                status,
                message: body,
            }
        }
    }
}

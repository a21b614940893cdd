use thiserror::Error;

/// Every failure the data layer can report.
///
/// Network and decoding failures come from the API client, `Db*` failures from
/// the local cache. The orchestrators multicast these to several consumers, so
/// the type is `Clone` and carries underlying causes as rendered text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Bad request")]
    BadRequest,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access forbidden")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("Request failed with status {0}")]
    Error4xx(u16),

    #[error("Server error")]
    ServerError,

    #[error("Server error with status {0}")]
    Error5xx(u16),

    #[error("Failed to decode response: {0}")]
    DecodingError(String),

    #[error("Network request failed: {0}")]
    TransportFailed(String),

    #[error("Unknown error")]
    Unknown,

    #[error("Failed to read local data: {0}")]
    DbFetchError(String),

    #[error("Failed to save local data: {0}")]
    DbInsertError(String),
}

/// Maximum length for response bodies quoted in log lines
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AppError {
    /// Map a non-2xx HTTP status to its error category.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => AppError::BadRequest,
            401 => AppError::Unauthorized,
            403 => AppError::Forbidden,
            404 => AppError::NotFound,
            402 | 405..=499 => AppError::Error4xx(status),
            500 => AppError::ServerError,
            501..=599 => AppError::Error5xx(status),
            _ => AppError::Unknown,
        }
    }

    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::DecodingError(err.to_string())
        } else if err.is_builder() {
            AppError::BadRequest
        } else if let Some(status) = err.status() {
            AppError::from_status(status.as_u16())
        } else {
            AppError::TransportFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::DecodingError(err.to_string())
    }
}

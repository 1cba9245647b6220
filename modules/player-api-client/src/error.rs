use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected content type: {0}")]
    ContentType(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// True for malformed responses (wrong content type, undecodable body),
    /// false for transport-level failures.
    pub fn is_format(&self) -> bool {
        matches!(self, ApiError::ContentType(_) | ApiError::Parse(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

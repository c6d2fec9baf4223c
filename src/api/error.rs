use thiserror::Error;

/// Failure of a single call against the messaging API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("instance id and API token are required")]
    MissingCredentials,
    #[error("invalid API URL: {0}")]
    InvalidBaseUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ApiError::Status(status.as_u16()),
            None => ApiError::Network(e.to_string()),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Could not connect to api: {0}")]
    Connection(String),

    #[error("Api is unavailable - check that API access is enabled for the store")]
    ApiUnavailable,

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
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

    /// Build the error reported when the initial login is rejected
    pub(crate) fn login_rejected(status: u16, body: &str) -> Self {
        ApiError::Connection(format!(
            "authentication failed with status {}: {}",
            status,
            Self::truncate_body(body)
        ))
    }
}

use thiserror::Error;

/// Shown when a signer rejects without saying why.
pub const DEFAULT_SIGN_ERROR: &str = "An error occurred while signing";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("query parameter is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded query parameter is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON nested {depth} deep, limit is {max}")]
    TooDeep { depth: usize, max: usize },
}

/// Failure reported by the external signer, carried verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SignerError {
    pub message: String,
}

impl SignerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Message for display; falls back to [`DEFAULT_SIGN_ERROR`] when empty.
    pub fn display_message(&self) -> &str {
        if self.message.trim().is_empty() {
            DEFAULT_SIGN_ERROR
        } else {
            &self.message
        }
    }
}

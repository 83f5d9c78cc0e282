//! Error types for the Perks client library.

/// Message displayed when a failed fetch carries no server-provided text.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to load perks";

/// All errors that can occur when using the Perks client or controller.
#[derive(Debug, thiserror::Error)]
pub enum PerksError {
    /// The HTTP request could not be sent or its body could not be read.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the response body, if any.
        message: Option<String>,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured base URL is not a valid absolute URL.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The listing controller task is no longer running.
    #[error("listing controller has shut down")]
    ControllerClosed,
}

impl PerksError {
    /// Returns the message to show the user for a failed fetch.
    ///
    /// Uses the API-provided message when it is present and not blank,
    /// and [`FALLBACK_ERROR_MESSAGE`] otherwise.
    #[inline]
    #[must_use]
    pub fn user_message(&self) -> String {
        match *self {
            Self::Api {
                message: Some(ref message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => FALLBACK_ERROR_MESSAGE.to_owned(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PerksError>;

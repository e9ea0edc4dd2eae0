//! Error types for embrace generation.

use crate::app::Slot;
use std::time::Duration;

/// Message shown for any failure of the generation call itself.
pub const SERVICE_FAILURE_MESSAGE: &str =
    "Failed to generate image. Please check the logs for more details.";

/// Message shown when the service answered without any image.
pub const NO_IMAGE_MESSAGE: &str = "No image was generated. The model may have refused the prompt.";

/// Longest error body kept from a service response.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while generating an embrace.
#[derive(Debug, thiserror::Error)]
pub enum EmbraceError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Generation was triggered before both photos were selected.
    #[error("Please upload both photos before generating.")]
    MissingImages {
        /// Slots that are still empty.
        missing: Vec<Slot>,
    },

    /// Generation was triggered while another attempt is still running.
    #[error("a generation is already in progress")]
    AlreadyInFlight,

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The generation call failed; the cause has already been logged.
    #[error("{}", SERVICE_FAILURE_MESSAGE)]
    Service,

    /// The service answered but produced no image.
    #[error("{}", NO_IMAGE_MESSAGE)]
    NoImage {
        /// Block or finish reason reported by the service, if any.
        reason: Option<String>,
    },

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit or quota exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading a photo or saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmbraceError {
    /// Returns true if the error was raised before any network activity.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::MissingImages { .. } | Self::AlreadyInFlight | Self::InvalidRequest(_)
        )
    }

    /// Returns the message to show the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoImage {
                reason: Some(reason),
            } => format!("{NO_IMAGE_MESSAGE} ({reason})"),
            other => other.to_string(),
        }
    }
}

/// Result type alias for embrace operations.
pub type Result<T> = std::result::Result<T, EmbraceError>;

/// Trims a service error body and masks anything that looks like an API key.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let masked: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let bare = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
            if bare.starts_with("AIza") && bare.len() >= 30 {
                word.replace(bare, "[REDACTED]")
            } else {
                word.to_string()
            }
        })
        .collect();
    let mut joined = masked.join(" ");
    if joined.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !joined.is_char_boundary(cut) {
            cut -= 1;
        }
        joined.truncate(cut);
        joined.push_str("...");
    }
    joined
}

/// Parses a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

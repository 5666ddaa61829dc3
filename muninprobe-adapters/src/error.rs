//! Error types for adapters.

use muninprobe_types::SlotError;
use thiserror::Error;

/// Errors that can occur when polling a source.
///
/// The variants fall into two families. Fetch errors ([`is_fetch`]) mean the
/// source could not be reached; parse errors ([`is_parse`]) mean it answered
/// with something we do not understand. Either way the caller is expected to
/// degrade to an all-unavailable observation rather than abort.
///
/// [`is_fetch`]: AdapterError::is_fetch
/// [`is_parse`]: AdapterError::is_parse
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The source answered with a non-success status.
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A channel row could not be placed into its slot.
    #[error("Channel layout changed: {0}")]
    ChannelIndex(#[from] SlotError),

    /// The requested source is not compiled into this build.
    #[error("Feature not supported: {0}")]
    Unsupported(String),
}

impl AdapterError {
    /// Network unreachable, timeout or non-success status.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            AdapterError::Http(_)
                | AdapterError::Connection(_)
                | AdapterError::Timeout
                | AdapterError::Status(_)
        )
    }

    /// Malformed or unexpectedly shaped payload.
    pub fn is_parse(&self) -> bool {
        matches!(self, AdapterError::Parse(_) | AdapterError::ChannelIndex(_))
    }
}

#[cfg(any(feature = "weather", feature = "modem"))]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            AdapterError::Status(status.as_u16())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Parse(err.to_string())
    }
}

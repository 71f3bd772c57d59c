//! Error types for reader operations.
//!
//! These errors describe failures to *talk* to a reader: a dropped
//! middleware connection, a timeout, a payload that cannot be decoded.
//! Expected negative answers (tag absent, reader unknown) are not errors;
//! they come back as values such as `EditOutcome { success: false, .. }` or
//! `None`.

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while driving a reader.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reader is not reachable, or the simulator task has stopped.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// A middleware did not answer in time.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Middleware answered with a non-success HTTP status.
    #[error("Middleware returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Middleware payload could not be decoded.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Middleware instance is misconfigured (missing or unusable URL).
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Request never completed at the HTTP layer.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl HardwareError {
    /// Reader `device` cannot be reached.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Non-2xx answer; `message` is the response body.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

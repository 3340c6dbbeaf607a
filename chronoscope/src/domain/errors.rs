//! Structured error types for chronoscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValueDecodeError {
    #[error("Unsupported value tracking encoding [{0}]")]
    UnsupportedEncoding(u32),

    #[error("Value sample for series {0:?} carries no payload")]
    MissingPayload(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum ViewportError {
    #[error("Viewport width must be positive and finite, got {0}")]
    InvalidWidth(f32),

    #[error("Viewport height must be non-negative and finite, got {0}")]
    InvalidHeight(f32),
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to parse capture file: {0}")]
    ParseFailed(String),

    #[error("Invalid timer #{index}: {reason}")]
    InvalidTimer { index: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_decode_error_display() {
        let err = ValueDecodeError::UnsupportedEncoding(42);
        assert_eq!(err.to_string(), "Unsupported value tracking encoding [42]");
    }

    #[test]
    fn test_invalid_timer_error() {
        let err = CaptureError::InvalidTimer { index: 3, reason: "end before start".to_string() };
        assert!(err.to_string().contains("#3"));
        assert!(err.to_string().contains("end before start"));
    }
}

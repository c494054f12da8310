//! Error types for log marshaling.

use thiserror::Error;

/// Error returned by marshalers and encoders.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A marshaler refused to encode its value.
    #[error("marshal error: {message}")]
    Marshal {
        /// Error message.
        message: String,
    },

    /// Formatting into the output buffer failed.
    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl EncodeError {
    /// Creates a marshal error with the given message.
    pub fn marshal(message: impl Into<String>) -> Self {
        Self::Marshal {
            message: message.into(),
        }
    }
}

/// Result type alias for marshaling operations.
pub type Result<T> = std::result::Result<T, EncodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshal_error_display() {
        let err = EncodeError::marshal("value is poisoned");
        assert_eq!(err.to_string(), "marshal error: value is poisoned");
    }

    #[test]
    fn test_fmt_error_from() {
        let err: EncodeError = std::fmt::Error.into();
        assert!(err.to_string().starts_with("format error"));
    }
}

//! Error types for code generation.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Source parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] zmlog_schema::ParseError),

    /// Field model error.
    #[error("schema error: {0}")]
    Schema(#[from] zmlog_schema::SchemaError),

    /// A field type with no encoding strategy.
    #[error("unsupported type '{type_name}' for field '{field}' in '{declaration}': {reason}")]
    UnsupportedType {
        /// Declaring type.
        declaration: String,
        /// Field name.
        field: String,
        /// Field type as written.
        type_name: String,
        /// Why the type cannot be encoded.
        reason: String,
    },

    /// Generated output could not be written.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodegenError {
    /// Creates an unsupported type error.
    pub fn unsupported(
        declaration: impl Into<String>,
        field: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            declaration: declaration.into(),
            field: field.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the declaration an error refers to, when known.
    #[must_use]
    pub fn declaration(&self) -> Option<&str> {
        match self {
            Self::UnsupportedType { declaration, .. } => Some(declaration),
            Self::Schema(zmlog_schema::SchemaError::DuplicateKey { declaration, .. })
            | Self::Schema(zmlog_schema::SchemaError::InvalidKey { declaration, .. })
            | Self::Schema(zmlog_schema::SchemaError::InvalidEmbed { declaration, .. }) => {
                Some(declaration)
            }
            _ => None,
        }
    }
}

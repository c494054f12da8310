//! Error types for declaration loading and field modelling.

use thiserror::Error;

/// Error type for declaration loading.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source is not valid Rust.
    #[error("syntax error: {message}")]
    Syntax {
        /// Parser message.
        message: String,
    },

    /// A requested declaration is absent from the source.
    #[error("declaration '{name}' not found")]
    DeclarationNotFound {
        /// Requested type name.
        name: String,
    },

    /// The declaration has a shape that cannot be marshaled.
    #[error("unsupported declaration '{name}': {reason}")]
    UnsupportedDeclaration {
        /// Type name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A `#[zmlog(...)]` annotation is malformed.
    #[error("invalid zmlog attribute on '{target}': {message}")]
    InvalidAttribute {
        /// Declaration or field carrying the attribute.
        target: String,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<syn::Error> for ParseError {
    fn from(err: syn::Error) -> Self {
        Self::Syntax {
            message: err.to_string(),
        }
    }
}

impl ParseError {
    /// Creates an unsupported declaration error.
    pub fn unsupported(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedDeclaration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Error type for field model building.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Two fields resolve to the same output key.
    #[error(
        "duplicate key '{key}' in '{declaration}': fields '{first}' and '{second}' both resolve to it"
    )]
    DuplicateKey {
        /// Declaration name.
        declaration: String,
        /// Colliding key.
        key: String,
        /// Field that claimed the key first.
        first: String,
        /// Field that collided.
        second: String,
    },

    /// An explicit key override is not usable.
    #[error("invalid key '{key}' for field '{field}' in '{declaration}'")]
    InvalidKey {
        /// Declaration name.
        declaration: String,
        /// Field name.
        field: String,
        /// Offending key.
        key: String,
    },

    /// An embedded field does not name a type.
    #[error("embedded field '{field}' in '{declaration}' has unnamed type '{type_name}'")]
    InvalidEmbed {
        /// Declaration name.
        declaration: String,
        /// Field name.
        field: String,
        /// Field type.
        type_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_names_both_fields() {
        let err = SchemaError::DuplicateKey {
            declaration: "ExampleLog".to_string(),
            key: "int_64".to_string(),
            first: "int64".to_string(),
            second: "Int64".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'int64'"));
        assert!(msg.contains("'Int64'"));
        assert!(msg.contains("ExampleLog"));
    }

    #[test]
    fn test_syn_error_becomes_syntax() {
        let err: ParseError = syn::parse_str::<syn::File>("struct {").unwrap_err().into();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }
}

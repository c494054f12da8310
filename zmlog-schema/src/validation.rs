//! Key validation.
//!
//! Keys are checked once, while the field model is built, so a collision
//! is a generation-time error and never reaches a log call.

use crate::error::SchemaError;
use crate::ir::FieldSpec;
use std::collections::HashMap;

/// Checks that every resolved key in a declaration is unique.
///
/// # Errors
/// Returns `SchemaError::DuplicateKey` naming the first two fields that
/// share a key.
pub fn validate_keys(declaration: &str, fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(fields.len());

    for field in fields {
        if let Some(first) = seen.insert(&field.key, &field.name) {
            return Err(SchemaError::DuplicateKey {
                declaration: declaration.to_string(),
                key: field.key.clone(),
                first: first.to_string(),
                second: field.name.clone(),
            });
        }
    }

    Ok(())
}

/// Checks an explicit key override.
///
/// # Errors
/// Returns `SchemaError::InvalidKey` for empty keys, keys with surrounding
/// whitespace and keys containing control characters.
pub fn validate_override(declaration: &str, field: &str, key: &str) -> Result<(), SchemaError> {
    let invalid = key.is_empty() || key.trim() != key || key.chars().any(char::is_control);
    if invalid {
        return Err(SchemaError::InvalidKey {
            declaration: declaration.to_string(),
            field: field.to_string(),
            key: key.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDesc;

    fn spec(name: &str, key: &str) -> FieldSpec {
        FieldSpec {
            key: key.to_string(),
            name: name.to_string(),
            accessor: name.to_string(),
            pointer_depth: 0,
            embedded: false,
            capability: None,
            ty: TypeDesc::named("i64"),
        }
    }

    #[test]
    fn test_unique_keys_pass() {
        let fields = vec![spec("a", "a"), spec("b", "b")];
        assert!(validate_keys("A", &fields).is_ok());
    }

    #[test]
    fn test_collision_names_first_claimant() {
        let fields = vec![spec("a", "x"), spec("b", "y"), spec("c", "x")];
        let err = validate_keys("A", &fields).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateKey { ref first, ref second, .. } if first == "a" && second == "c"
        ));
    }

    #[test]
    fn test_override_rules() {
        assert!(validate_override("A", "f", "my_id").is_ok());
        assert!(validate_override("A", "f", "").is_err());
        assert!(validate_override("A", "f", " id").is_err());
        assert!(validate_override("A", "f", "i\nd").is_err());
    }
}

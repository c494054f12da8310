//! Field model for code generation.
//!
//! This module turns a loaded declaration into the ordered list of
//! [`FieldSpec`]s the generator works from: keys resolved, skipped fields
//! dropped, pointer depth counted. Declaration order is kept as-is.

use crate::error::SchemaError;
use crate::types::{Capability, NilPolicy, RawField, TypeDeclaration, TypeDesc};
use crate::validation::{validate_keys, validate_override};

/// Options for building the field model.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Drop fields that are not `pub`.
    pub exported_only: bool,
}

/// Field model of one declaration.
#[derive(Debug, Clone)]
pub struct DeclarationIr {
    /// Type name.
    pub name: String,
    /// Lifetime parameters.
    pub lifetimes: Vec<String>,
    /// True for sequence newtypes.
    pub is_sequence: bool,
    /// Nil pointer policy requested by the declaration.
    pub nil: Option<NilPolicy>,
    /// Runtime crate path requested by the declaration.
    pub crate_path: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl DeclarationIr {
    /// Builds the field model of a declaration.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateKey` if two fields resolve to the same
    /// key, `SchemaError::InvalidKey` for an empty override and
    /// `SchemaError::InvalidEmbed` for an embedded field without a type name.
    pub fn from_declaration(
        decl: &TypeDeclaration,
        options: &BuildOptions,
    ) -> Result<Self, SchemaError> {
        let mut fields = Vec::with_capacity(decl.fields.len());

        for raw in &decl.fields {
            if raw.skip || (options.exported_only && !raw.exported && !decl.is_sequence) {
                continue;
            }
            fields.push(FieldSpec::from_raw(&decl.name, raw)?);
        }

        validate_keys(&decl.name, &fields)?;

        Ok(Self {
            name: decl.name.clone(),
            lifetimes: decl.lifetimes.clone(),
            is_sequence: decl.is_sequence,
            nil: decl.nil,
            crate_path: decl.crate_path.clone(),
            fields,
        })
    }

    /// Returns the generic parameter list, e.g. `<'a>`.
    #[must_use]
    pub fn generics(&self) -> String {
        if self.lifetimes.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.lifetimes.join(", "))
        }
    }

    /// Returns the type as written in an impl header, e.g. `ExampleLog<'a>`.
    #[must_use]
    pub fn self_type(&self) -> String {
        format!("{}{}", self.name, self.generics())
    }
}

/// A field with its resolved key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Output key.
    pub key: String,
    /// Declared name, for diagnostics.
    pub name: String,
    /// Expression reaching the field from `self`.
    pub accessor: String,
    /// Number of indirection levels in the declared type.
    pub pointer_depth: usize,
    /// True for `#[zmlog(embed)]` fields.
    pub embedded: bool,
    /// Capability asserted for the field's named type.
    pub capability: Option<Capability>,
    /// Declared type.
    pub ty: TypeDesc,
}

impl FieldSpec {
    fn from_raw(declaration: &str, raw: &RawField) -> Result<Self, SchemaError> {
        let key = match &raw.key_override {
            Some(key) => {
                validate_override(declaration, &raw.name, key)?;
                key.clone()
            }
            None if raw.embedded => embedded_key(declaration, raw)?,
            None => to_snake_case(&raw.name),
        };

        Ok(Self {
            key,
            name: raw.name.clone(),
            accessor: raw.accessor.clone(),
            pointer_depth: raw.ty.pointer_depth(),
            embedded: raw.embedded,
            capability: raw.capability,
            ty: raw.ty.clone(),
        })
    }
}

/// Embedded fields are keyed by their type's own name.
fn embedded_key(declaration: &str, raw: &RawField) -> Result<String, SchemaError> {
    raw.ty
        .pointee()
        .ident()
        .map(to_snake_case)
        .ok_or_else(|| SchemaError::InvalidEmbed {
            declaration: declaration.to_string(),
            field: raw.name.clone(),
            type_name: raw.ty.to_string(),
        })
}

/// Converts a CamelCase or snake_case name to snake_case.
///
/// A break is inserted before an uppercase letter that follows a lowercase
/// letter or digit, before the last capital of an acronym run that is
/// followed by a lowercase letter, and before a digit run that follows a
/// letter. Existing `_` and `-` separators are kept as single breaks.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }

        if i > 0 && !result.is_empty() && !result.ends_with('_') {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary = if c.is_uppercase() {
                prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next.is_some_and(char::is_lowercase))
            } else if c.is_ascii_digit() {
                prev.is_alphabetic()
            } else {
                false
            };
            if boundary {
                result.push('_');
            }
        }

        result.extend(c.to_lowercase());
    }

    while result.ends_with('_') {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Target, parse_source};

    fn build(src: &str) -> Result<DeclarationIr, SchemaError> {
        let decl = parse_source(src)
            .expect("Failed to parse")
            .into_selected(&Target::All)
            .expect("Failed to select")
            .remove(0);
        DeclarationIr::from_declaration(&decl, &BuildOptions::default())
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("Int64Ptr"), "int_64_ptr");
        assert_eq!(to_snake_case("UintPtrVal"), "uint_ptr_val");
        assert_eq!(to_snake_case("BaseLog"), "base_log");
        assert_eq!(to_snake_case("BaseArrayLog"), "base_array_log");
        assert_eq!(to_snake_case("Complex128"), "complex_128");
        assert_eq!(to_snake_case("CustomID"), "custom_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("MDEntryPx"), "md_entry_px");
        assert_eq!(to_snake_case("clOrdId"), "cl_ord_id");
    }

    #[test]
    fn test_snake_case_input_is_stable() {
        assert_eq!(to_snake_case("int64_ptr"), "int_64_ptr");
        assert_eq!(to_snake_case("uint_ptr_val"), "uint_ptr_val");
        assert_eq!(to_snake_case("float32"), "float_32");
        assert_eq!(to_snake_case("symbol"), "symbol");
        assert_eq!(to_snake_case("_private__name_"), "private_name");
    }

    #[test]
    fn test_keys_follow_declaration_order() {
        let ir = build(
            r#"
pub struct ExampleLog {
    pub bool_val: bool,
    #[zmlog(embed)]
    pub base: Option<Box<BaseLog>>,
    pub Int64Ptr: Option<i64>,
    #[zmlog(key = "my_id")]
    pub custom_id: String,
}
"#,
        )
        .unwrap();

        let keys: Vec<&str> = ir.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["bool_val", "base_log", "int_64_ptr", "my_id"]);
        assert_eq!(ir.fields[1].pointer_depth, 1);
        assert!(ir.fields[1].embedded);
        assert_eq!(ir.fields[0].pointer_depth, 0);
    }

    #[test]
    fn test_embedded_sequence_key() {
        let ir = build("pub struct A { #[zmlog(embed)] pub items: BaseArrayLog }").unwrap();
        assert_eq!(ir.fields[0].key, "base_array_log");
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = build("pub struct A { pub int64: i64, #[zmlog(key = \"int_64\")] pub other: i64 }")
            .unwrap_err();
        match err {
            SchemaError::DuplicateKey {
                declaration,
                key,
                first,
                second,
            } => {
                assert_eq!(declaration, "A");
                assert_eq!(key, "int_64");
                assert_eq!(first, "int64");
                assert_eq!(second, "other");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_skip_and_exported_only() {
        let src = "pub struct A { pub a: i64, b: i64, #[zmlog(skip)] pub c: i64 }";
        let decl = parse_source(src)
            .unwrap()
            .into_selected(&Target::All)
            .unwrap()
            .remove(0);

        let all = DeclarationIr::from_declaration(&decl, &BuildOptions::default()).unwrap();
        assert_eq!(all.fields.len(), 2);

        let exported =
            DeclarationIr::from_declaration(&decl, &BuildOptions { exported_only: true }).unwrap();
        assert_eq!(exported.fields.len(), 1);
        assert_eq!(exported.fields[0].key, "a");
    }

    #[test]
    fn test_embed_without_type_name() {
        let err = build("pub struct A { #[zmlog(embed)] pub pair: (i64, i64) }").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidEmbed { .. }));
    }

    #[test]
    fn test_self_type_with_lifetimes() {
        let ir = build("pub struct A<'a> { pub name: &'a str }").unwrap();
        assert_eq!(ir.self_type(), "A<'a>");
    }
}

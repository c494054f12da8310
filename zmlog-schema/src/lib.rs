//! # zmlog Schema
//!
//! Declaration loading and field modelling.
//!
//! This crate provides:
//! - Rust source parsing into structural [`TypeDeclaration`]s
//! - Syn-free type descriptors ([`TypeDesc`])
//! - Field model building with resolved keys and pointer depth
//! - Key validation (uniqueness, well-formed overrides)

pub mod error;
pub mod ir;
pub mod parser;
pub mod types;
pub mod validation;

pub use error::{ParseError, SchemaError};
pub use ir::{BuildOptions, DeclarationIr, FieldSpec, to_snake_case};
pub use parser::{SourceFile, Target, parse_source};
pub use types::{Capability, NilPolicy, PointerKind, RawField, TypeDeclaration, TypeDesc, TypePath};

//! # zmlog
//!
//! Type-directed structured-logging marshalers for Rust.
//!
//! zmlog turns plain struct declarations into `ObjectMarshaler` and
//! `ArrayMarshaler` impls that feed a structured-logging sink field by
//! field, with no reflection at log time.
//!
//! ## Features
//!
//! - **Derive macros** - `#[derive(ObjectMarshaler)]` for records,
//!   `#[derive(ArrayMarshaler)]` for sequence newtypes
//! - **File generation** - `<stem>_zmlog.rs` files for `include!`, from a
//!   build script or the `zmlog` CLI
//! - **Stable keys** - snake_case field names, `#[zmlog(key = "...")]`
//!   overrides, type-named keys for embedded fields
//! - **Pointer transparency** - `Option`, `Box`, `&`, `Rc` and `Arc`
//!   fields encode as their pointee
//!
//! ## Quick Start
//!
//! ```ignore
//! use zmlog::prelude::*;
//!
//! #[derive(ObjectMarshaler)]
//! struct Login<'a> {
//!     user_name: &'a str,
//!     attempts: Option<u32>,
//!     #[zmlog(key = "ip")]
//!     remote_addr: String,
//! }
//!
//! let json = to_json(&login)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Encoder and marshaler traits, JSON reference sink
//! - [`schema`] - Rust declaration loading and key derivation
//! - [`codegen`] - Strategy resolution and impl generation

pub mod prelude;

/// Encoder and marshaler traits.
pub mod core {
    pub use zmlog_core::*;
}

/// Declaration loading and field modelling.
#[cfg(feature = "codegen")]
pub mod schema {
    pub use zmlog_schema::*;
}

/// Marshaler code generation.
#[cfg(feature = "codegen")]
pub mod codegen {
    pub use zmlog_codegen::*;
}

pub use zmlog_core::{ArrayMarshaler, EncodeError, ObjectMarshaler};

#[cfg(feature = "derive")]
pub use zmlog_derive::{ArrayMarshaler, ObjectMarshaler};

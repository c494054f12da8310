//! Prelude module for convenient imports.
//!
//! ```ignore
//! use zmlog::prelude::*;
//! ```

pub use zmlog_core::{
    ArrayEncoder, ArrayMarshaler, EncodeError, JsonEncoder, LogTime, ObjectEncoder,
    ObjectMarshaler, array_fn, array_to_json, object_fn, to_json,
};

#[cfg(feature = "derive")]
pub use zmlog_derive::{ArrayMarshaler, ObjectMarshaler};

#[cfg(feature = "codegen")]
pub use zmlog_codegen::{Generator, GeneratorConfig, generate_from_file, generate_from_source};

#[cfg(feature = "codegen")]
pub use zmlog_schema::NilPolicy;

//! # zmlog Core
//!
//! The contract between generated log marshalers and a structured-logging sink.
//!
//! This crate provides:
//! - [`ObjectEncoder`] and [`ArrayEncoder`], the typed emission interfaces a sink implements
//! - [`ObjectMarshaler`] and [`ArrayMarshaler`], the capabilities generated code implements
//! - Closure adapters ([`object_fn`], [`array_fn`]) used for inline maps and sequences
//! - [`LogTime`] for normalizing timestamps to UTC
//! - [`JsonEncoder`], a compact JSON reference sink

pub mod encoder;
pub mod error;
pub mod json;
pub mod marshaler;
pub mod time;

pub use encoder::{ArrayEncoder, ObjectEncoder};
pub use error::{EncodeError, Result};
pub use json::{JsonEncoder, array_to_json, encode_base64, to_json};
pub use marshaler::{ArrayFn, ArrayMarshaler, ObjectFn, ObjectMarshaler, array_fn, object_fn};
pub use time::{LogTime, format_duration, format_time};

pub use chrono;
pub use num_complex;

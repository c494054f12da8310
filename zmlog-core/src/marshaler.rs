//! Marshaler traits implemented by loggable types.
//!
//! Generated code implements [`ObjectMarshaler`] for records and
//! [`ArrayMarshaler`] for sequence newtypes. [`object_fn`] and [`array_fn`]
//! adapt closures, which is how generated code emits inline maps and
//! sequences without naming a helper type per field.

use crate::encoder::{ArrayEncoder, ObjectEncoder};
use crate::error::Result;
use std::rc::Rc;
use std::sync::Arc;

/// A value that encodes itself as a keyed object.
pub trait ObjectMarshaler {
    /// Emits this value's fields into `enc`.
    ///
    /// # Errors
    /// Returns `EncodeError` if the value or a nested value cannot be encoded.
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()>;
}

/// A value that encodes itself as an ordered array.
pub trait ArrayMarshaler {
    /// Emits this value's elements into `enc`, in index order.
    ///
    /// # Errors
    /// Returns `EncodeError` if an element cannot be encoded.
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()>;
}

macro_rules! forward_marshalers {
    ($($wrapper:ty),* $(,)?) => {
        $(
            impl<T: ObjectMarshaler + ?Sized> ObjectMarshaler for $wrapper {
                #[inline]
                fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()> {
                    (**self).marshal_log_object(enc)
                }
            }

            impl<T: ArrayMarshaler + ?Sized> ArrayMarshaler for $wrapper {
                #[inline]
                fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
                    (**self).marshal_log_array(enc)
                }
            }
        )*
    };
}

forward_marshalers!(&T, Box<T>, Rc<T>, Arc<T>);

/// Closure adapter implementing [`ObjectMarshaler`].
pub struct ObjectFn<F>(F);

impl<F> ObjectMarshaler for ObjectFn<F>
where
    F: Fn(&mut dyn ObjectEncoder) -> Result<()>,
{
    #[inline]
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()> {
        (self.0)(enc)
    }
}

/// Closure adapter implementing [`ArrayMarshaler`].
pub struct ArrayFn<F>(F);

impl<F> ArrayMarshaler for ArrayFn<F>
where
    F: Fn(&mut dyn ArrayEncoder) -> Result<()>,
{
    #[inline]
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
        (self.0)(enc)
    }
}

/// Wraps a closure as an [`ObjectMarshaler`].
///
/// # Example
/// ```ignore
/// enc.add_object("map", &object_fn(|obj| {
///     for (k, v) in &self.map {
///         obj.add_bool(k, *v);
///     }
///     Ok(())
/// }))?;
/// ```
#[inline]
pub fn object_fn<F>(f: F) -> ObjectFn<F>
where
    F: Fn(&mut dyn ObjectEncoder) -> Result<()>,
{
    ObjectFn(f)
}

/// Wraps a closure as an [`ArrayMarshaler`].
#[inline]
pub fn array_fn<F>(f: F) -> ArrayFn<F>
where
    F: Fn(&mut dyn ArrayEncoder) -> Result<()>,
{
    ArrayFn(f)
}

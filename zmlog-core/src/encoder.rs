//! Encoder traits implemented by structured-logging sinks.
//!
//! A sink receives typed emission calls instead of pre-serialized text. The
//! [`ObjectEncoder`] builds one keyed record, the [`ArrayEncoder`] one ordered
//! sequence inside a record.

use crate::error::Result;
use crate::marshaler::{ArrayMarshaler, ObjectMarshaler};
use chrono::{DateTime, Utc};
use num_complex::{Complex32, Complex64};
use std::time::Duration;

/// Keyed emission interface for one structured record.
///
/// Narrow integer methods default to the 64-bit method of the same
/// signedness, so a sink only has to implement the wide forms.
///
/// # Example
/// ```ignore
/// // Generated marshaler body
/// enc.add_string("user", &self.user);
/// enc.add_u32("attempts", self.attempts);
/// enc.add_object("base_log", &self.base_log)?;
/// ```
pub trait ObjectEncoder {
    /// Adds a boolean.
    fn add_bool(&mut self, key: &str, value: bool);

    /// Adds a UTF-8 string.
    fn add_string(&mut self, key: &str, value: &str);

    /// Adds a signed 64-bit integer.
    fn add_i64(&mut self, key: &str, value: i64);

    /// Adds an unsigned 64-bit integer.
    fn add_u64(&mut self, key: &str, value: u64);

    /// Adds a 64-bit float.
    fn add_f64(&mut self, key: &str, value: f64);

    /// Adds a 32-bit float, formatted at 32-bit precision.
    fn add_f32(&mut self, key: &str, value: f32);

    /// Adds a complex number with 64-bit parts, as `"<re>+<im>i"` text.
    fn add_complex64(&mut self, key: &str, value: Complex64);

    /// Adds a complex number with 32-bit parts, as `"<re>+<im>i"` text.
    fn add_complex32(&mut self, key: &str, value: Complex32);

    /// Adds a UTC timestamp.
    fn add_time(&mut self, key: &str, value: DateTime<Utc>);

    /// Adds an elapsed duration.
    fn add_duration(&mut self, key: &str, value: Duration);

    /// Adds raw bytes, encoded as base64 text.
    fn add_binary(&mut self, key: &str, value: &[u8]);

    /// Adds an explicit null.
    fn add_null(&mut self, key: &str);

    /// Adds a nested object encoded by its own marshaler.
    ///
    /// # Errors
    /// Propagates the nested marshaler's error.
    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<()>;

    /// Adds a nested array encoded by its own marshaler.
    ///
    /// # Errors
    /// Propagates the nested marshaler's error.
    fn add_array(&mut self, key: &str, value: &dyn ArrayMarshaler) -> Result<()>;

    /// Adds a signed 8-bit integer.
    fn add_i8(&mut self, key: &str, value: i8) {
        self.add_i64(key, i64::from(value));
    }

    /// Adds a signed 16-bit integer.
    fn add_i16(&mut self, key: &str, value: i16) {
        self.add_i64(key, i64::from(value));
    }

    /// Adds a signed 32-bit integer.
    fn add_i32(&mut self, key: &str, value: i32) {
        self.add_i64(key, i64::from(value));
    }

    /// Adds a platform-width signed integer.
    fn add_isize(&mut self, key: &str, value: isize) {
        self.add_i64(key, value as i64);
    }

    /// Adds an unsigned 8-bit integer.
    fn add_u8(&mut self, key: &str, value: u8) {
        self.add_u64(key, u64::from(value));
    }

    /// Adds an unsigned 16-bit integer.
    fn add_u16(&mut self, key: &str, value: u16) {
        self.add_u64(key, u64::from(value));
    }

    /// Adds an unsigned 32-bit integer.
    fn add_u32(&mut self, key: &str, value: u32) {
        self.add_u64(key, u64::from(value));
    }

    /// Adds a platform-width unsigned integer.
    fn add_usize(&mut self, key: &str, value: usize) {
        self.add_u64(key, value as u64);
    }
}

/// Positional emission interface for one ordered sequence.
pub trait ArrayEncoder {
    /// Appends a boolean.
    fn append_bool(&mut self, value: bool);

    /// Appends a UTF-8 string.
    fn append_string(&mut self, value: &str);

    /// Appends a signed 64-bit integer.
    fn append_i64(&mut self, value: i64);

    /// Appends an unsigned 64-bit integer.
    fn append_u64(&mut self, value: u64);

    /// Appends a 64-bit float.
    fn append_f64(&mut self, value: f64);

    /// Appends a 32-bit float.
    fn append_f32(&mut self, value: f32);

    /// Appends a complex number with 64-bit parts.
    fn append_complex64(&mut self, value: Complex64);

    /// Appends a complex number with 32-bit parts.
    fn append_complex32(&mut self, value: Complex32);

    /// Appends a UTC timestamp.
    fn append_time(&mut self, value: DateTime<Utc>);

    /// Appends an elapsed duration.
    fn append_duration(&mut self, value: Duration);

    /// Appends raw bytes, encoded as base64 text.
    fn append_binary(&mut self, value: &[u8]);

    /// Appends an explicit null.
    fn append_null(&mut self);

    /// Appends a nested object.
    ///
    /// # Errors
    /// Propagates the nested marshaler's error.
    fn append_object(&mut self, value: &dyn ObjectMarshaler) -> Result<()>;

    /// Appends a nested array.
    ///
    /// # Errors
    /// Propagates the nested marshaler's error.
    fn append_array(&mut self, value: &dyn ArrayMarshaler) -> Result<()>;

    /// Appends a signed 8-bit integer.
    fn append_i8(&mut self, value: i8) {
        self.append_i64(i64::from(value));
    }

    /// Appends a signed 16-bit integer.
    fn append_i16(&mut self, value: i16) {
        self.append_i64(i64::from(value));
    }

    /// Appends a signed 32-bit integer.
    fn append_i32(&mut self, value: i32) {
        self.append_i64(i64::from(value));
    }

    /// Appends a platform-width signed integer.
    fn append_isize(&mut self, value: isize) {
        self.append_i64(value as i64);
    }

    /// Appends an unsigned 8-bit integer.
    fn append_u8(&mut self, value: u8) {
        self.append_u64(u64::from(value));
    }

    /// Appends an unsigned 16-bit integer.
    fn append_u16(&mut self, value: u16) {
        self.append_u64(u64::from(value));
    }

    /// Appends an unsigned 32-bit integer.
    fn append_u32(&mut self, value: u32) {
        self.append_u64(u64::from(value));
    }

    /// Appends a platform-width unsigned integer.
    fn append_usize(&mut self, value: usize) {
        self.append_u64(value as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records which wide method each call landed on.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl ObjectEncoder for Recorder {
        fn add_bool(&mut self, key: &str, value: bool) {
            self.calls.push(format!("bool {key}={value}"));
        }
        fn add_string(&mut self, key: &str, value: &str) {
            self.calls.push(format!("string {key}={value}"));
        }
        fn add_i64(&mut self, key: &str, value: i64) {
            self.calls.push(format!("i64 {key}={value}"));
        }
        fn add_u64(&mut self, key: &str, value: u64) {
            self.calls.push(format!("u64 {key}={value}"));
        }
        fn add_f64(&mut self, key: &str, value: f64) {
            self.calls.push(format!("f64 {key}={value}"));
        }
        fn add_f32(&mut self, key: &str, value: f32) {
            self.calls.push(format!("f32 {key}={value}"));
        }
        fn add_complex64(&mut self, key: &str, _value: Complex64) {
            self.calls.push(format!("complex64 {key}"));
        }
        fn add_complex32(&mut self, key: &str, _value: Complex32) {
            self.calls.push(format!("complex32 {key}"));
        }
        fn add_time(&mut self, key: &str, _value: DateTime<Utc>) {
            self.calls.push(format!("time {key}"));
        }
        fn add_duration(&mut self, key: &str, _value: Duration) {
            self.calls.push(format!("duration {key}"));
        }
        fn add_binary(&mut self, key: &str, _value: &[u8]) {
            self.calls.push(format!("binary {key}"));
        }
        fn add_null(&mut self, key: &str) {
            self.calls.push(format!("null {key}"));
        }
        fn add_object(&mut self, key: &str, _value: &dyn ObjectMarshaler) -> Result<()> {
            self.calls.push(format!("object {key}"));
            Ok(())
        }
        fn add_array(&mut self, key: &str, _value: &dyn ArrayMarshaler) -> Result<()> {
            self.calls.push(format!("array {key}"));
            Ok(())
        }
    }

    #[test]
    fn test_narrow_integers_widen() {
        let mut rec = Recorder::default();
        rec.add_i8("a", -8);
        rec.add_i16("b", -16);
        rec.add_i32("c", -32);
        rec.add_isize("d", -1);
        rec.add_u8("e", 8);
        rec.add_u16("f", 16);
        rec.add_u32("g", 32);
        rec.add_usize("h", 1);

        assert_eq!(
            rec.calls,
            vec![
                "i64 a=-8", "i64 b=-16", "i64 c=-32", "i64 d=-1", "u64 e=8", "u64 f=16",
                "u64 g=32", "u64 h=1",
            ]
        );
    }
}

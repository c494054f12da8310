//! Compact JSON reference sink.
//!
//! [`JsonEncoder`] implements both encoder traits over a single output
//! buffer, so nested objects and arrays are written in place as the
//! marshalers call back into it.

use crate::encoder::{ArrayEncoder, ObjectEncoder};
use crate::error::Result;
use crate::marshaler::{ArrayMarshaler, ObjectMarshaler};
use crate::time::{format_duration, format_time};
use chrono::{DateTime, Utc};
use num_complex::{Complex32, Complex64};
use serde::Serialize;
use std::time::Duration;

const BASE64_TABLE: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// JSON text encoder.
///
/// # Example
/// ```ignore
/// let mut enc = JsonEncoder::new();
/// enc.add_object("example", &log)?;
/// assert_eq!(enc.finish(), r#"{"example":{"val":1}}"#);
/// ```
#[derive(Debug)]
pub struct JsonEncoder {
    buf: Vec<u8>,
    first: bool,
}

impl JsonEncoder {
    /// Creates an encoder positioned inside an empty top-level object.
    #[must_use]
    pub fn new() -> Self {
        let mut enc = Self {
            buf: Vec::with_capacity(256),
            first: true,
        };
        enc.open(b'{');
        enc
    }

    /// Closes the top-level object and returns the JSON text.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.close(b'}');
        self.into_text()
    }

    fn into_text(self) -> String {
        String::from_utf8(self.buf)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }

    fn open(&mut self, delimiter: u8) {
        self.buf.push(delimiter);
        self.first = true;
    }

    fn close(&mut self, delimiter: u8) {
        self.buf.push(delimiter);
        self.first = false;
    }

    fn separator(&mut self) {
        if !self.first {
            self.buf.push(b',');
        }
        self.first = false;
    }

    fn key(&mut self, key: &str) {
        self.separator();
        self.json(key);
        self.buf.push(b':');
    }

    /// Writes one JSON scalar. Serializing a scalar into a `Vec` cannot fail.
    fn json<T: Serialize + ?Sized>(&mut self, value: &T) {
        let _ = serde_json::to_writer(&mut self.buf, value);
    }

    fn string(&mut self, value: &str) {
        self.json(value);
    }

    fn f64(&mut self, value: f64) {
        if value.is_finite() {
            self.json(&value);
        } else {
            self.json(non_finite(value.is_nan(), value > 0.0));
        }
    }

    fn f32(&mut self, value: f32) {
        if value.is_finite() {
            self.json(&value);
        } else {
            self.json(non_finite(value.is_nan(), value > 0.0));
        }
    }

    fn object(&mut self, value: &dyn ObjectMarshaler) -> Result<()> {
        self.open(b'{');
        value.marshal_log_object(self)?;
        self.close(b'}');
        Ok(())
    }

    fn array(&mut self, value: &dyn ArrayMarshaler) -> Result<()> {
        self.open(b'[');
        value.marshal_log_array(self)?;
        self.close(b']');
        Ok(())
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectEncoder for JsonEncoder {
    fn add_bool(&mut self, key: &str, value: bool) {
        self.key(key);
        self.json(&value);
    }

    fn add_string(&mut self, key: &str, value: &str) {
        self.key(key);
        self.string(value);
    }

    fn add_i64(&mut self, key: &str, value: i64) {
        self.key(key);
        self.json(&value);
    }

    fn add_u64(&mut self, key: &str, value: u64) {
        self.key(key);
        self.json(&value);
    }

    fn add_f64(&mut self, key: &str, value: f64) {
        self.key(key);
        self.f64(value);
    }

    fn add_f32(&mut self, key: &str, value: f32) {
        self.key(key);
        self.f32(value);
    }

    fn add_complex64(&mut self, key: &str, value: Complex64) {
        self.key(key);
        self.string(&format_complex(format_f64(value.re), format_f64(value.im)));
    }

    fn add_complex32(&mut self, key: &str, value: Complex32) {
        self.key(key);
        self.string(&format_complex(format_f32(value.re), format_f32(value.im)));
    }

    fn add_time(&mut self, key: &str, value: DateTime<Utc>) {
        self.key(key);
        self.string(&format_time(&value));
    }

    fn add_duration(&mut self, key: &str, value: Duration) {
        self.key(key);
        self.string(&format_duration(value));
    }

    fn add_binary(&mut self, key: &str, value: &[u8]) {
        self.key(key);
        self.string(&encode_base64(value));
    }

    fn add_null(&mut self, key: &str) {
        self.key(key);
        self.buf.extend_from_slice(b"null");
    }

    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<()> {
        self.key(key);
        self.object(value)
    }

    fn add_array(&mut self, key: &str, value: &dyn ArrayMarshaler) -> Result<()> {
        self.key(key);
        self.array(value)
    }
}

impl ArrayEncoder for JsonEncoder {
    fn append_bool(&mut self, value: bool) {
        self.separator();
        self.json(&value);
    }

    fn append_string(&mut self, value: &str) {
        self.separator();
        self.string(value);
    }

    fn append_i64(&mut self, value: i64) {
        self.separator();
        self.json(&value);
    }

    fn append_u64(&mut self, value: u64) {
        self.separator();
        self.json(&value);
    }

    fn append_f64(&mut self, value: f64) {
        self.separator();
        self.f64(value);
    }

    fn append_f32(&mut self, value: f32) {
        self.separator();
        self.f32(value);
    }

    fn append_complex64(&mut self, value: Complex64) {
        self.separator();
        self.string(&format_complex(format_f64(value.re), format_f64(value.im)));
    }

    fn append_complex32(&mut self, value: Complex32) {
        self.separator();
        self.string(&format_complex(format_f32(value.re), format_f32(value.im)));
    }

    fn append_time(&mut self, value: DateTime<Utc>) {
        self.separator();
        self.string(&format_time(&value));
    }

    fn append_duration(&mut self, value: Duration) {
        self.separator();
        self.string(&format_duration(value));
    }

    fn append_binary(&mut self, value: &[u8]) {
        self.separator();
        self.string(&encode_base64(value));
    }

    fn append_null(&mut self) {
        self.separator();
        self.buf.extend_from_slice(b"null");
    }

    fn append_object(&mut self, value: &dyn ObjectMarshaler) -> Result<()> {
        self.separator();
        self.object(value)
    }

    fn append_array(&mut self, value: &dyn ArrayMarshaler) -> Result<()> {
        self.separator();
        self.array(value)
    }
}

/// Encodes a marshaler as a standalone JSON object.
///
/// # Errors
/// Propagates the marshaler's error.
pub fn to_json(value: &dyn ObjectMarshaler) -> Result<String> {
    let mut enc = JsonEncoder::new();
    value.marshal_log_object(&mut enc)?;
    Ok(enc.finish())
}

/// Encodes a marshaler as a standalone JSON array.
///
/// # Errors
/// Propagates the marshaler's error.
pub fn array_to_json(value: &dyn ArrayMarshaler) -> Result<String> {
    let mut enc = JsonEncoder {
        buf: Vec::with_capacity(64),
        first: true,
    };
    enc.array(value)?;
    Ok(enc.into_text())
}

/// Standard padded base64 encoding.
#[must_use]
pub fn encode_base64(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);

    for chunk in input.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        out.push(BASE64_TABLE[(b0 >> 2) as usize] as char);
        out.push(BASE64_TABLE[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        if chunk.len() > 1 {
            out.push(BASE64_TABLE[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(BASE64_TABLE[(b2 & 0x3f) as usize] as char);
        } else {
            out.push('=');
        }
    }

    out
}

fn non_finite(nan: bool, positive: bool) -> &'static str {
    if nan {
        "NaN"
    } else if positive {
        "+Inf"
    } else {
        "-Inf"
    }
}

fn format_f64(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        non_finite(value.is_nan(), value > 0.0).to_string()
    }
}

fn format_f32(value: f32) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        non_finite(value.is_nan(), value > 0.0).to_string()
    }
}

fn format_complex(re: String, im: String) -> String {
    if im.starts_with(['+', '-']) {
        format!("{re}{im}i")
    } else {
        format!("{re}+{im}i")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshaler::{array_fn, object_fn};
    use chrono::TimeZone;

    #[test]
    fn test_base64() {
        assert_eq!(encode_base64(b"byte"), "Ynl0ZQ==");
        assert_eq!(encode_base64(b"by"), "Ynk=");
        assert_eq!(encode_base64(b"byt"), "Ynl0");
        assert_eq!(encode_base64(b""), "");
    }

    #[test]
    fn test_scalars() {
        let mut enc = JsonEncoder::new();
        enc.add_bool("bool", false);
        enc.add_i64("int", -1);
        enc.add_u8("uint_8", 8);
        enc.add_f64("float_64", 64.64);
        enc.add_f32("float_32", 32.32);
        enc.add_string("string", "te\"st");
        enc.add_null("nothing");

        assert_eq!(
            enc.finish(),
            r#"{"bool":false,"int":-1,"uint_8":8,"float_64":64.64,"float_32":32.32,"string":"te\"st","nothing":null}"#
        );
    }

    #[test]
    fn test_non_finite_floats_are_strings() {
        let mut enc = JsonEncoder::new();
        enc.add_f64("nan", f64::NAN);
        enc.add_f64("pos", f64::INFINITY);
        enc.add_f32("neg", f32::NEG_INFINITY);

        assert_eq!(enc.finish(), r#"{"nan":"NaN","pos":"+Inf","neg":"-Inf"}"#);
    }

    #[test]
    fn test_complex_text() {
        let mut enc = JsonEncoder::new();
        enc.add_complex64("c128", Complex64::new(128.0, 0.0));
        enc.add_complex32("c64", Complex32::new(64.0, 0.0));
        enc.add_complex64("neg", Complex64::new(1.5, -2.0));

        assert_eq!(
            enc.finish(),
            r#"{"c128":"128+0i","c64":"64+0i","neg":"1.5-2i"}"#
        );
    }

    #[test]
    fn test_temporal() {
        let mut enc = JsonEncoder::new();
        enc.add_time("time", Utc.with_ymd_and_hms(2022, 11, 20, 10, 1, 1).unwrap());
        enc.add_duration("duration", Duration::from_secs(1));

        assert_eq!(
            enc.finish(),
            r#"{"time":"2022-11-20T10:01:01.000Z","duration":"1s"}"#
        );
    }

    #[test]
    fn test_nested_object_and_array() {
        let inner = object_fn(|obj| {
            obj.add_i64("Val", 1);
            Ok(())
        });
        let items = array_fn(|arr| {
            for v in [1i64, 2, 3] {
                arr.append_i64(v);
            }
            Ok(())
        });

        let mut enc = JsonEncoder::new();
        enc.add_object("base_log", &inner).unwrap();
        enc.add_array("base_array_log", &items).unwrap();
        enc.add_bool("after", true);

        assert_eq!(
            enc.finish(),
            r#"{"base_log":{"Val":1},"base_array_log":[1,2,3],"after":true}"#
        );
    }

    #[test]
    fn test_nested_arrays() {
        let grid = array_fn(|arr| {
            for row in [[1u8, 2], [3, 4]] {
                arr.append_array(&array_fn(|inner| {
                    for v in row {
                        inner.append_u8(v);
                    }
                    Ok(())
                }))?;
            }
            arr.append_null();
            Ok(())
        });

        assert_eq!(array_to_json(&grid).unwrap(), "[[1,2],[3,4],null]");
    }

    #[test]
    fn test_string_escaping() {
        let mut enc = JsonEncoder::new();
        enc.add_string("k\n", "a\\b\tc\u{1}");
        assert_eq!(enc.finish(), r#"{"k\n":"a\\b\tc\u0001"}"#);
    }

    #[test]
    fn test_numbers_are_json_numbers() {
        let mut enc = JsonEncoder::new();
        enc.add_f64("whole", 2.0);
        enc.add_f32("small", 0.5);
        enc.add_i64("min", i64::MIN);
        enc.add_u64("max", u64::MAX);
        enc.add_string("unicode", "h\u{e9}llo");

        assert_eq!(
            enc.finish(),
            r#"{"whole":2.0,"small":0.5,"min":-9223372036854775808,"max":18446744073709551615,"unicode":"héllo"}"#
        );
    }
}

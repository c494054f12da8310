//! End-to-end encoding of a record covering every supported field kind.

use std::collections::HashMap;
use std::time::Duration;
use zmlog::core::Result;
use zmlog::core::chrono::{DateTime, TimeZone, Utc};
use zmlog::core::num_complex::{Complex32, Complex64};
use zmlog::prelude::*;

struct BaseLog {
    val: i64,
}

impl ObjectMarshaler for BaseLog {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()> {
        enc.add_i64("Val", self.val);
        Ok(())
    }
}

#[derive(ArrayMarshaler)]
struct BaseArrayLog(Vec<i64>);

#[derive(ObjectMarshaler)]
struct ExampleLog {
    #[zmlog(embed)]
    base_log: Option<Box<BaseLog>>,
    #[zmlog(embed, array)]
    base_array_log: BaseArrayLog,
    bool: bool,
    bool_ptr: Option<bool>,
    complex128: Complex64,
    complex128_ptr: Option<Complex64>,
    complex64: Complex32,
    complex64_ptr: Option<Complex32>,
    float64: f64,
    float64_ptr: Option<f64>,
    float32: f32,
    float32_ptr: Option<f32>,
    int: isize,
    int_ptr: Option<isize>,
    int64: i64,
    int64_ptr: Option<i64>,
    int32: i32,
    int32_ptr: Option<i32>,
    int16: i16,
    int16_ptr: Option<i16>,
    int8: i8,
    int8_ptr: Option<i8>,
    string: String,
    string_ptr: Option<String>,
    uint: usize,
    uint_ptr: Option<usize>,
    uint64: u64,
    uint64_ptr: Option<u64>,
    uint32: u32,
    uint32_ptr: Option<u32>,
    uint16: u16,
    uint16_ptr: Option<u16>,
    uint8: u8,
    uint8_ptr: Option<u8>,
    bytes: Vec<u8>,
    uint_ptr_val: usize,
    uint_ptr_val_ptr: Option<usize>,
    time: DateTime<Utc>,
    time_ptr: Option<DateTime<Utc>>,
    duration: Duration,
    duration_ptr: Option<Duration>,
    map: HashMap<String, bool>,
    #[zmlog(key = "my_id")]
    id: String,
}

fn example() -> ExampleLog {
    let time = Utc.with_ymd_and_hms(2022, 11, 20, 10, 1, 1).unwrap();
    ExampleLog {
        base_log: Some(Box::new(BaseLog { val: 1 })),
        base_array_log: BaseArrayLog(vec![1, 2, 3]),
        bool: false,
        bool_ptr: Some(false),
        complex128: Complex64::new(128.0, 0.0),
        complex128_ptr: Some(Complex64::new(128.0, 0.0)),
        complex64: Complex32::new(64.0, 0.0),
        complex64_ptr: Some(Complex32::new(64.0, 0.0)),
        float64: 64.64,
        float64_ptr: Some(64.64),
        float32: 32.32,
        float32_ptr: Some(32.32),
        int: 1,
        int_ptr: Some(1),
        int64: 64,
        int64_ptr: Some(64),
        int32: 32,
        int32_ptr: Some(32),
        int16: 16,
        int16_ptr: Some(16),
        int8: 8,
        int8_ptr: Some(8),
        string: "test".to_string(),
        string_ptr: Some("test".to_string()),
        uint: 1,
        uint_ptr: Some(1),
        uint64: 64,
        uint64_ptr: Some(64),
        uint32: 32,
        uint32_ptr: Some(32),
        uint16: 16,
        uint16_ptr: Some(16),
        uint8: 8,
        uint8_ptr: Some(8),
        bytes: b"byte".to_vec(),
        uint_ptr_val: 1,
        uint_ptr_val_ptr: Some(1),
        time,
        time_ptr: Some(time),
        duration: Duration::from_secs(1),
        duration_ptr: Some(Duration::from_secs(1)),
        map: HashMap::from([("key".to_string(), true)]),
        id: "test".to_string(),
    }
}

const EXPECTED: &str = concat!(
    r#"{"base_log":{"Val":1},"base_array_log":[1,2,3],"bool":false,"bool_ptr":false,"#,
    r#""complex_128":"128+0i","complex_128_ptr":"128+0i","complex_64":"64+0i","complex_64_ptr":"64+0i","#,
    r#""float_64":64.64,"float_64_ptr":64.64,"float_32":32.32,"float_32_ptr":32.32,"#,
    r#""int":1,"int_ptr":1,"int_64":64,"int_64_ptr":64,"int_32":32,"int_32_ptr":32,"#,
    r#""int_16":16,"int_16_ptr":16,"int_8":8,"int_8_ptr":8,"string":"test","string_ptr":"test","#,
    r#""uint":1,"uint_ptr":1,"uint_64":64,"uint_64_ptr":64,"uint_32":32,"uint_32_ptr":32,"#,
    r#""uint_16":16,"uint_16_ptr":16,"uint_8":8,"uint_8_ptr":8,"bytes":"Ynl0ZQ==","#,
    r#""uint_ptr_val":1,"uint_ptr_val_ptr":1,"time":"2022-11-20T10:01:01.000Z","#,
    r#""time_ptr":"2022-11-20T10:01:01.000Z","duration":"1s","duration_ptr":"1s","#,
    r#""map":{"key":true},"my_id":"test"}"#,
);

#[test]
fn test_example_log_json() {
    let json = to_json(&example()).expect("encoding failed");
    assert_eq!(json, EXPECTED);
}

#[test]
fn test_encoding_is_repeatable() {
    let log = example();
    assert_eq!(to_json(&log).unwrap(), to_json(&log).unwrap());
}

#[test]
fn test_absent_pointers_are_omitted() {
    let mut log = example();
    log.bool_ptr = None;
    log.time_ptr = None;
    log.string_ptr = None;
    let json = to_json(&log).unwrap();
    assert!(!json.contains("\"bool_ptr\""));
    assert!(!json.contains("\"time_ptr\""));
    assert!(!json.contains("\"string_ptr\""));
    assert!(json.contains("\"string\":\"test\""));
}

#[test]
fn test_absent_embedded_pointer_is_omitted() {
    let mut log = example();
    log.base_log = None;
    let json = to_json(&log).unwrap();
    assert!(json.starts_with(r#"{"base_array_log":[1,2,3],"bool":false"#));
}

#[test]
fn test_sequence_marshaler() {
    let json = array_to_json(&BaseArrayLog(vec![4, 5])).unwrap();
    assert_eq!(json, "[4,5]");
    assert_eq!(array_to_json(&BaseArrayLog(Vec::new())).unwrap(), "[]");
}

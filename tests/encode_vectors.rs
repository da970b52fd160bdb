use bjdata::{
    encode, EncodeOptions, Endian, ErrorCode, HighPrecision, TypedArray, TypedData, Value, F16,
};

fn enc(v: impl Into<Value>) -> Vec<u8> {
    encode(&v.into(), &EncodeOptions::default()).unwrap()
}

fn enc_with(v: impl Into<Value>, opts: &EncodeOptions) -> Vec<u8> {
    encode(&v.into(), opts).unwrap()
}

fn cat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

#[test]
fn encode_no_data_markers() {
    assert_eq!(enc(Value::Null), b"Z");
    assert_eq!(enc(true), b"T");
    assert_eq!(enc(false), b"F");
}

#[test]
fn encode_int_picks_narrowest_width() {
    assert_eq!(enc(0u8), b"U\x00");
    assert_eq!(enc(255i64), b"U\xff");
    assert_eq!(enc(-128i64), b"i\x80");
    assert_eq!(enc(-1i8), b"i\xff");
    assert_eq!(enc(-32768i64), b"I\x00\x80");
    assert_eq!(enc(456i64), b"u\xc8\x01");
    assert_eq!(enc(32767i16), b"u\xff\x7f");
    assert_eq!(enc(65535i64), b"u\xff\xff");
    assert_eq!(enc(65536i64), b"m\x00\x00\x01\x00");
    assert_eq!(enc(-32769i64), b"l\xff\x7f\xff\xff");
    assert_eq!(enc(i64::MIN), cat(&[b"L", &i64::MIN.to_le_bytes()]));
}

#[test]
fn encode_int64_boundaries() {
    let max = enc(i64::MAX);
    assert_eq!(max.len(), 9);
    assert_eq!(max, cat(&[b"M", &i64::MAX.to_le_bytes()]));

    let past = enc(9_223_372_036_854_775_808u64);
    assert_eq!(past.len(), 9);
    assert_eq!(past, cat(&[b"M", &[0, 0, 0, 0, 0, 0, 0, 0x80]]));
}

#[test]
fn encode_int_outside_64_bits_is_high_precision() {
    let big = u128::from(u64::MAX) + 1;
    assert_eq!(enc(big), cat(&[b"H", b"U\x14", b"18446744073709551616"]));

    let small = i128::from(i64::MIN) - 1;
    assert_eq!(enc(small), cat(&[b"H", b"U\x14", b"-9223372036854775809"]));
}

#[test]
fn encode_big_endian_payloads() {
    let be = EncodeOptions::default().with_endian(Endian::Big);
    assert_eq!(enc_with(456i64, &be), b"u\x01\xc8");
    assert_eq!(enc_with(65536i64, &be), b"m\x00\x01\x00\x00");
    assert_eq!(enc_with(1.5f64, &be), cat(&[b"D", &1.5f64.to_be_bytes()]));
}

#[test]
fn encode_float_defaults_to_float64() {
    assert_eq!(enc(1.5f64), cat(&[b"D", &1.5f64.to_le_bytes()]));
    assert_eq!(enc(1.5f32), cat(&[b"D", &1.5f64.to_le_bytes()]));
}

#[test]
fn encode_float32_only_when_exact() {
    let opts = EncodeOptions::default().with_no_float32(false);
    assert_eq!(enc_with(1.5f64, &opts), cat(&[b"d", &1.5f32.to_le_bytes()]));
    assert_eq!(enc_with(0.1f64, &opts), cat(&[b"D", &0.1f64.to_le_bytes()]));
    assert_eq!(enc_with(1e300f64, &opts), cat(&[b"D", &1e300f64.to_le_bytes()]));
}

#[test]
fn encode_zero_is_always_float32() {
    assert_eq!(enc(0.0f64), b"d\x00\x00\x00\x00");
    assert_eq!(enc(-0.0f64), b"d\x00\x00\x00\x80");
}

#[test]
fn encode_non_finite_floats_as_null() {
    assert_eq!(enc(f64::NAN), b"Z");
    assert_eq!(enc(f64::INFINITY), b"Z");
    assert_eq!(enc(f64::NEG_INFINITY), b"Z");
    assert_eq!(enc(f32::NAN), b"Z");
}

#[test]
fn encode_subnormal_float_as_high_precision() {
    assert_eq!(enc(2.22e-308f64), cat(&[b"H", b"U\x09", b"2.22e-308"]));
    assert_eq!(enc(5e-324f64), cat(&[b"H", b"U\x06", b"5e-324"]));
}

#[test]
fn encode_float16_keeps_bits() {
    assert_eq!(enc(F16::from_bits(0x3c00)), b"h\x00\x3c");
}

#[test]
fn encode_high_precision_literal() {
    let hp: HighPrecision = "-1.5".parse().unwrap();
    assert_eq!(enc(hp), cat(&[b"H", b"U\x04", b"-1.5"]));

    let nan: HighPrecision = "NaN".parse().unwrap();
    assert_eq!(enc(nan), b"Z");
    let inf: HighPrecision = "-Infinity".parse().unwrap();
    assert_eq!(enc(inf), b"Z");
}

#[test]
fn encode_char_and_string() {
    assert_eq!(enc('a'), b"Ca");
    assert_eq!(enc("a"), b"Ca");
    assert_eq!(enc("ab"), b"SU\x02ab");
    assert_eq!(enc(""), b"SU\x00");
    assert_eq!(enc('\u{e9}'), b"SU\x02\xc3\xa9");

    let long = "x".repeat(300);
    assert_eq!(enc(long.as_str()), cat(&[b"Su\x2c\x01", long.as_bytes()]));
}

#[test]
fn encode_byte_buffer_uses_typed_header() {
    assert_eq!(enc(Value::bytes(vec![1, 2, 3])), b"[$U#U\x03\x01\x02\x03");
    assert_eq!(enc(Value::bytes(Vec::new())), b"[$U#U\x00");
}

#[test]
fn encode_typed_array_rank_one() {
    let t = TypedArray::vector(TypedData::Int16(vec![1, -1])).unwrap();
    assert_eq!(enc(t), b"[$I#U\x02\x01\x00\xff\xff");

    let c = TypedArray::vector(TypedData::Char(b"hi".to_vec())).unwrap();
    assert_eq!(enc(c), b"[$C#U\x02hi");
}

#[test]
fn encode_typed_array_with_shape() {
    let t = TypedArray::new(TypedData::Int8(vec![1, 2, 3, 4, 5, 6]), vec![3, 2]).unwrap();
    assert_eq!(
        enc(t.clone()),
        b"[$i#[U\x03U\x02]\x01\x02\x03\x04\x05\x06"
    );

    let counted = EncodeOptions::default().with_container_count(true);
    assert_eq!(
        enc_with(t, &counted),
        b"[$i#[#U\x02U\x03U\x02\x01\x02\x03\x04\x05\x06"
    );
}

#[test]
fn encode_empty_containers() {
    assert_eq!(enc(Value::array([])), b"[]");
    assert_eq!(enc(Value::object::<&str>([])), b"{}");
}

#[test]
fn encode_heterogeneous_array() {
    let v = Value::array([Value::from(1u8), Value::from("a"), Value::Null]);
    assert_eq!(enc(v.clone()), b"[U\x01CaZ]");

    let counted = EncodeOptions::default().with_container_count(true);
    assert_eq!(enc_with(v, &counted), b"[#U\x03U\x01CaZ");
}

#[test]
fn encode_object_preserves_insertion_order() {
    let v = Value::object([("b", Value::from(1u8)), ("a", Value::from(2u8))]);
    assert_eq!(enc(v.clone()), b"{U\x01bU\x01U\x01aU\x02}");

    let sorted = EncodeOptions::default().with_sort_keys(true);
    assert_eq!(enc_with(v.clone(), &sorted), b"{U\x01aU\x02U\x01bU\x01}");

    let counted = EncodeOptions::default().with_container_count(true);
    assert_eq!(enc_with(v, &counted), b"{#U\x02U\x01bU\x01U\x01aU\x02");
}

#[test]
fn encode_extension_without_hook_is_unencodable() {
    struct Opaque;
    let err = encode(&Value::extension(Opaque), &EncodeOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::Unencodable);
    assert!(!err.is_decode());
}

#[test]
fn encode_extension_through_default_hook() {
    struct Point {
        x: i32,
        y: i32,
    }

    let opts = EncodeOptions::default().with_default_hook(|ext| {
        ext.downcast_ref::<Point>().map(|p| {
            Value::object([("x", Value::from(p.x)), ("y", Value::from(p.y))])
        })
    });
    let v = Value::array([Value::extension(Point { x: 1, y: -2 })]);
    assert_eq!(enc_with(v, &opts), b"[{U\x01xU\x01U\x01yi\xfe}]");

    struct Other;
    let err = encode(&Value::extension(Other), &opts).unwrap_err();
    assert_eq!(err.code, ErrorCode::Unencodable);
}

#[test]
fn encode_to_writer_matches_encode() {
    let v = Value::object([
        ("name", Value::from("bjdata")),
        ("dims", Value::bytes(vec![3, 2])),
    ]);
    let mut out = Vec::new();
    bjdata::encode_to(&v, &mut out, &EncodeOptions::default()).unwrap();
    assert_eq!(out, enc(v));
}

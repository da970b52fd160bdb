use bjdata::{
    bjdata_equal, decode, encode, DecodeOptions, EncodeOptions, ErrorCode, ErrorKind, HighPrecision,
    SharedValue, TypedArray, TypedData, Value,
};

fn roundtrip(v: &Value) -> Value {
    let bytes = encode(v, &EncodeOptions::default()).unwrap();
    decode(&bytes, &DecodeOptions::default()).unwrap()
}

#[test]
fn scalar_minimality() {
    let opts = EncodeOptions::default();
    assert_eq!(encode(&Value::from(0u8), &opts).unwrap().len(), 2);
    assert_eq!(encode(&Value::from(255i64), &opts).unwrap().len(), 2);
    assert_eq!(encode(&Value::from(-128i64), &opts).unwrap()[0], b'i');
    assert_eq!(encode(&Value::from(i64::MAX), &opts).unwrap().len(), 9);
    let past = encode(&Value::from(9_223_372_036_854_775_808u64), &opts).unwrap();
    assert_eq!((past[0], past.len()), (b'M', 9));
}

#[test]
fn self_containing_array_is_circular() {
    let node = SharedValue::new(Value::array([]));
    *node.write() = Value::array([Value::from(1u8), Value::Shared(node.clone())]);

    let err = encode(&Value::Shared(node.clone()), &EncodeOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::CircularReference);
    assert_eq!(err.kind, ErrorKind::Encode);

    // Break the cycle so the node is freed.
    *node.write() = Value::Null;
}

#[test]
fn indirect_cycle_is_circular() {
    let a = SharedValue::new(Value::Null);
    let b = SharedValue::new(Value::object([("back", Value::Shared(a.clone()))]));
    *a.write() = Value::array([Value::Shared(b.clone())]);

    let err = encode(&Value::Shared(b.clone()), &EncodeOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::CircularReference);

    *a.write() = Value::Null;
}

#[test]
fn shared_sublist_is_encoded_at_each_occurrence() {
    let sub = Value::shared(Value::array([Value::from(1u8), Value::from(2u8)]));
    let outer = Value::array([sub.clone(), sub]);

    let bytes = encode(&outer, &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, b"[[U\x01U\x02][U\x01U\x02]]");

    let back = decode(&bytes, &DecodeOptions::default()).unwrap();
    let items = back.as_array().unwrap();
    assert_eq!(items[0], items[1]);
    assert!(bjdata_equal(&back, &outer));
}

#[test]
fn encoder_depth_limit() {
    let mut v = Value::Null;
    for _ in 0..300 {
        v = Value::array([v]);
    }
    let err = encode(&v, &EncodeOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ExcessiveNestingDepth);

    let opts = EncodeOptions::default().with_max_depth(400);
    let bytes = encode(&v, &opts).unwrap();
    assert_eq!(bytes.len(), 601);
}

#[test]
fn nested_shared_nodes_count_toward_depth_limit() {
    let mut v = Value::from(1u8);
    for _ in 0..64 {
        v = Value::shared(v);
    }
    let err = encode(&v, &EncodeOptions::default().with_max_depth(16)).unwrap_err();
    assert_eq!(err.code, ErrorCode::ExcessiveNestingDepth);
    assert_eq!(encode(&v, &EncodeOptions::default().with_max_depth(64)).unwrap(), b"U\x01");

    let mut deep = Value::Null;
    for _ in 0..1000 {
        deep = Value::shared(deep);
    }
    let err = encode(&deep, &EncodeOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ExcessiveNestingDepth);
}

#[test]
fn default_hook_cannot_recurse_forever() {
    struct Loop;
    let opts = EncodeOptions::default().with_default_hook(|_| Some(Value::extension(Loop)));
    let err = encode(&Value::extension(Loop), &opts).unwrap_err();
    assert_eq!(err.code, ErrorCode::ExcessiveNestingDepth);
}

#[test]
fn every_one_and_two_byte_input_decodes_or_errors() {
    let opts = DecodeOptions::default();
    for a in 0..=u8::MAX {
        let _ = decode(&[a], &opts);
        for b in 0..=u8::MAX {
            if let Err(err) = decode(&[a, b], &opts) {
                assert_eq!(err.kind, ErrorKind::Decode);
                assert!(err.offset.is_some());
            }
        }
    }
}

#[test]
fn truncated_string_reports_detection_offset() {
    let err = decode(b"SU\x05ab", &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::Truncated);
    assert_eq!(err.offset, Some(5));
}

#[test]
fn byte_buffer_fidelity() {
    let raw: Vec<u8> = (0..=255).collect();
    let bytes = encode(&Value::bytes(raw.clone()), &EncodeOptions::default()).unwrap();
    assert_eq!(&bytes[..7], b"[$U#u\x00\x01");
    assert_eq!(&bytes[7..], raw.as_slice());

    assert_eq!(
        decode(&bytes, &DecodeOptions::default()).unwrap(),
        Value::bytes(raw.clone())
    );

    let opts = DecodeOptions::default().with_no_bytes(true);
    let v = decode(&bytes, &opts).unwrap();
    let t = v.as_typed_array().unwrap();
    assert_eq!(t.data().len(), raw.len());
    assert_eq!(t.data(), &TypedData::UInt8(raw));
}

#[test]
fn matrix_roundtrip_keeps_shape_and_row_major_order() {
    let t = TypedArray::new(TypedData::Int32(vec![1, 2, 3, 4, 5, 6]), vec![3, 2]).unwrap();
    let back = roundtrip(&Value::TypedArray(t));
    let back = back.as_typed_array().unwrap();
    assert_eq!(back.shape(), &[3, 2]);
    assert_eq!(back.data(), &TypedData::Int32(vec![1, 2, 3, 4, 5, 6]));

    let nested = back.to_nested();
    let (data, shape) = back.clone().into_parts();
    assert_eq!(shape, vec![3, 2]);
    assert_eq!(data.element_type(), bjdata::ElementType::Int32);

    let rows: Vec<Vec<i128>> = nested
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row.as_array().unwrap().iter().map(|x| x.as_i128().unwrap()).collect())
        .collect();
    assert_eq!(rows, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
}

#[test]
fn roundtrip_widens_or_narrows_integers_by_value() {
    let v = Value::array([Value::Int64(5), Value::UInt32(70_000), Value::Int16(-3)]);
    let back = roundtrip(&v);
    assert_eq!(
        back,
        Value::array([Value::UInt8(5), Value::UInt32(70_000), Value::Int8(-3)])
    );
    assert!(bjdata_equal(&back, &v));
}

#[test]
fn roundtrip_float32_values() {
    let opts = EncodeOptions::default().with_no_float32(false);
    let bytes = encode(&Value::Float64(0.25), &opts).unwrap();
    let back = decode(&bytes, &DecodeOptions::default()).unwrap();
    assert_eq!(back, Value::Float32(0.25));
    assert!(bjdata_equal(&back, &Value::Float64(0.25)));
}

#[test]
fn roundtrip_high_precision_and_subnormals() {
    let hp = HighPrecision::new("123456789012345678901234567890.5").unwrap();
    assert_eq!(roundtrip(&Value::HighPrecision(hp.clone())), Value::HighPrecision(hp));

    let back = roundtrip(&Value::Float64(5e-324));
    match back {
        Value::HighPrecision(hp) => assert_eq!(hp.as_str().parse::<f64>().unwrap(), 5e-324),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn roundtrip_counted_and_sorted_containers() {
    let v = Value::object([
        ("zeta", Value::array([Value::from("x"), Value::Null, Value::from(true)])),
        ("alpha", Value::object([("k", Value::from(-7i64))])),
        ("mid", Value::bytes(vec![9, 8, 7])),
    ]);
    let opts = EncodeOptions::default()
        .with_container_count(true)
        .with_sort_keys(true);
    let bytes = encode(&v, &opts).unwrap();
    let back = decode(&bytes, &DecodeOptions::default()).unwrap();
    assert!(bjdata_equal(&back, &v));

    let keys: Vec<&str> = back.as_object().unwrap().keys().map(|k| &**k).collect();
    assert_eq!(keys, ["alpha", "mid", "zeta"]);
}

#[test]
fn typed_array_compares_equal_to_its_nested_form() {
    let empty = decode(b"[$i#U\x00", &DecodeOptions::default()).unwrap();
    assert!(empty.as_typed_array().is_some());
    assert!(bjdata_equal(&empty, &Value::array([])));
    assert!(bjdata_equal(&Value::array([]), &empty));

    let t = TypedArray::new(TypedData::Int8(vec![1, 2, 3, 4]), vec![2, 2]).unwrap();
    let nested = Value::array([
        Value::array([Value::from(1u8), Value::from(2u8)]),
        Value::array([Value::from(3u8), Value::from(4u8)]),
    ]);
    assert!(bjdata_equal(&Value::TypedArray(t.clone()), &nested));
    assert!(!bjdata_equal(&Value::TypedArray(t), &Value::array([Value::from(1u8)])));

    let raw = TypedArray::vector(TypedData::UInt8(vec![7, 8])).unwrap();
    assert!(bjdata_equal(&Value::TypedArray(raw.clone()), &Value::bytes(vec![7, 8])));
    assert!(!bjdata_equal(&Value::bytes(vec![7]), &Value::TypedArray(raw)));
}

#[test]
fn typed_array_rejects_bad_shapes() {
    let err = TypedArray::new(TypedData::Int8(vec![1, 2, 3]), vec![2, 2]).unwrap_err();
    assert_eq!((err.kind, err.code), (ErrorKind::Validate, ErrorCode::InvalidShape));

    let err = TypedArray::new(TypedData::Int8(vec![]), vec![]).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidShape);

    let err = TypedArray::vector(TypedData::Char(vec![0xc3, 0xa9])).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidUtf8);
}

#[test]
fn high_precision_literal_grammar() {
    for ok in ["0", "-1.5", "+.5", "1.", "1e10", "1.5E-3", "inf", "-Infinity", "NaN", "sNaN12"] {
        assert!(HighPrecision::new(ok).is_ok(), "{ok}");
    }
    for bad in ["", "-", ".", "1e", "e5", "1.2.3", "abc", "nan-1", "0x10", " 1"] {
        let err = HighPrecision::new(bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDecimalLiteral, "{bad}");
    }
    assert!(HighPrecision::new("1.5").unwrap().is_finite());
    assert!(!HighPrecision::new("-inf").unwrap().is_finite());
}

#[test]
fn error_display_messages() {
    let err = encode(&Value::extension(()), &EncodeOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "bjdata encode failed: cannot encode item");

    let err = decode(b"", &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "bjdata decode failed at 0: empty input");
}

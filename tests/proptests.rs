// Property-based round trips. Sizes and depths stay small to keep CI fast.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;

use bjdata::{
    bjdata_equal, decode, encode, DecodeLimits, DecodeOptions, EncodeOptions, Endian,
    HighPrecision, TypedArray, TypedData, Value, F16,
};

fn arb_key() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('a', 'z'), 0..12)
        .prop_map(|chars| chars.into_iter().collect())
}

fn arb_int() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i8>().prop_map(Value::Int8),
        any::<u8>().prop_map(Value::UInt8),
        any::<i16>().prop_map(Value::Int16),
        any::<u16>().prop_map(Value::UInt16),
        any::<i32>().prop_map(Value::Int32),
        any::<u32>().prop_map(Value::UInt32),
        any::<i64>().prop_map(Value::Int64),
        any::<u64>().prop_map(Value::UInt64),
    ]
}

fn arb_float() -> impl Strategy<Value = Value> {
    use proptest::num::{f32, f64};
    prop_oneof![
        (f64::NORMAL | f64::ZERO).prop_map(Value::Float64),
        (f32::NORMAL | f32::ZERO).prop_map(Value::Float32),
        any::<u16>().prop_map(|bits| Value::Float16(F16::from_bits(bits))),
    ]
}

fn arb_high_precision() -> impl Strategy<Value = HighPrecision> {
    prop_oneof![
        any::<i128>().prop_map(HighPrecision::from_i128),
        ("-?[0-9]{1,30}\\.[0-9]{1,30}([eE][+-]?[0-9]{1,3})?")
            .prop_map(|s| HighPrecision::new(&s).unwrap()),
    ]
}

fn arb_typed_array() -> impl Strategy<Value = TypedArray> {
    let finite32 = any::<f32>().prop_filter("finite", |v| v.is_finite());
    let finite64 = any::<f64>().prop_filter("finite", |v| v.is_finite());
    let shape = prop_oneof![
        (0usize..12).prop_map(|n| vec![n]),
        (1usize..4, 1usize..4).prop_map(|(a, b)| vec![a, b]),
        (1usize..3, 1usize..3, 1usize..3).prop_map(|(a, b, c)| vec![a, b, c]),
    ];
    shape.prop_flat_map(move |shape| {
        let n: usize = shape.iter().product();
        let ints = prop_oneof![
            proptest::collection::vec(any::<i8>(), n).prop_map(TypedData::Int8),
            proptest::collection::vec(any::<u8>(), n).prop_map(TypedData::UInt8),
            proptest::collection::vec(any::<i16>(), n).prop_map(TypedData::Int16),
            proptest::collection::vec(any::<u16>(), n).prop_map(TypedData::UInt16),
            proptest::collection::vec(any::<i32>(), n).prop_map(TypedData::Int32),
            proptest::collection::vec(any::<u32>(), n).prop_map(TypedData::UInt32),
            proptest::collection::vec(any::<i64>(), n).prop_map(TypedData::Int64),
            proptest::collection::vec(any::<u64>(), n).prop_map(TypedData::UInt64),
        ];
        let others = prop_oneof![
            proptest::collection::vec(any::<u16>().prop_map(F16::from_bits), n)
                .prop_map(TypedData::Float16),
            proptest::collection::vec(finite32.clone(), n).prop_map(TypedData::Float32),
            proptest::collection::vec(finite64.clone(), n).prop_map(TypedData::Float64),
            proptest::collection::vec(0x20u8..0x7f, n).prop_map(TypedData::Char),
        ];
        let data = prop_oneof![2 => ints, 1 => others];
        (data, Just(shape))
    })
    .prop_filter_map("valid typed array", |(data, shape)| {
        // A rank-1 UInt8 array is the byte-buffer form and decodes as bytes.
        if matches!(data, TypedData::UInt8(_)) && shape.len() == 1 {
            return None;
        }
        TypedArray::new(data, shape).ok()
    })
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        arb_int(),
        arb_float(),
        arb_high_precision().prop_map(Value::HighPrecision),
        any::<char>().prop_map(Value::Char),
        ".{0,24}".prop_map(Value::String),
        proptest::collection::vec(any::<u8>(), 0..48).prop_map(Value::Bytes),
        arb_typed_array().prop_map(Value::TypedArray),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 128, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            proptest::collection::vec((arb_key(), inner), 0..8).prop_map(Value::object),
        ]
    })
}

fn roundtrip(v: &Value, enc: &EncodeOptions, dec: &DecodeOptions) -> Result<(), TestCaseError> {
    let bytes = encode(v, enc).unwrap();
    let dec = dec.clone().with_limits(DecodeLimits::for_bytes(bytes.len()));
    let decoded = decode(&bytes, &dec).unwrap();
    prop_assert!(bjdata_equal(v, &decoded), "{v:?} != {decoded:?}");

    let again = encode(&decoded, enc).unwrap();
    prop_assert_eq!(bytes, again);
    Ok(())
}

proptest! {
    #[test]
    fn default_roundtrip(v in arb_value()) {
        roundtrip(&v, &EncodeOptions::default(), &DecodeOptions::default())?;
    }

    #[test]
    fn counted_sorted_roundtrip(v in arb_value()) {
        let enc = EncodeOptions::default().with_container_count(true).with_sort_keys(true);
        roundtrip(&v, &enc, &DecodeOptions::default())?;
    }

    #[test]
    fn big_endian_float32_roundtrip(v in arb_value()) {
        let enc = EncodeOptions::default().with_endian(Endian::Big).with_no_float32(false);
        let dec = DecodeOptions::default().with_endian(Endian::Big);
        roundtrip(&v, &enc, &dec)?;
    }

    #[test]
    fn interned_keys_decode_identically(v in arb_value()) {
        let bytes = encode(&v, &EncodeOptions::default()).unwrap();
        let plain = decode(&bytes, &DecodeOptions::default()).unwrap();
        let interned = decode(&bytes, &DecodeOptions::default().with_intern_keys(true)).unwrap();
        prop_assert_eq!(plain, interned);
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let opts = DecodeOptions::default().with_limits(DecodeLimits::for_bytes(data.len()));
        if let Ok(v) = decode(&data, &opts) {
            // Anything the decoder produces must be encodable.
            let enc = EncodeOptions::default().with_no_float32(false);
            prop_assert!(encode(&v, &enc).is_ok());
        }
    }
}

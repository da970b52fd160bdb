#![cfg(feature = "serde")]

use bjdata::{decode, encode, DecodeOptions, EncodeOptions, HighPrecision, SharedValue, TypedArray, TypedData, Value};

#[test]
fn json_to_value_narrows_integers() {
    let v: Value = serde_json::from_str(r#"{"a": 1, "b": -200, "c": 70000, "d": 1.5, "e": null}"#).unwrap();
    assert_eq!(v.get("a"), Some(&Value::UInt8(1)));
    assert_eq!(v.get("b"), Some(&Value::Int16(-200)));
    assert_eq!(v.get("c"), Some(&Value::UInt32(70_000)));
    assert_eq!(v.get("d"), Some(&Value::Float64(1.5)));
    assert_eq!(v.get("e"), Some(&Value::Null));

    let keys: Vec<&str> = v.as_object().unwrap().keys().map(|k| &**k).collect();
    assert_eq!(keys, ["a", "b", "c", "d", "e"]);
}

#[test]
fn json_survives_a_binary_round_trip() {
    let text = r#"{"name":"probe","tags":["x","yz"],"reading":{"t":-40,"ok":true,"v":0.1}}"#;
    let v: Value = serde_json::from_str(text).unwrap();
    let bytes = encode(&v, &EncodeOptions::default()).unwrap();
    let back = decode(&bytes, &DecodeOptions::default()).unwrap();

    let out = serde_json::to_string(&back).unwrap();
    let lhs: serde_json::Value = serde_json::from_str(text).unwrap();
    let rhs: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(lhs, rhs);
}

#[test]
fn non_json_values_have_json_forms() {
    let hp = HighPrecision::new("1e400").unwrap();
    let t = TypedArray::new(TypedData::Int8(vec![1, 2, 3, 4]), vec![2, 2]).unwrap();
    let v = Value::object([
        ("hp", Value::HighPrecision(hp)),
        ("raw", Value::bytes(vec![1u8, 2])),
        ("m", Value::TypedArray(t)),
        ("c", Value::Char('q')),
    ]);
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"hp": "1e400", "raw": [1, 2], "m": [[1, 2], [3, 4]], "c": "q"})
    );
}

#[test]
fn shared_nodes_serialize_in_place() {
    let sub = Value::shared(Value::array([Value::from(1u8)]));
    let v = Value::array([sub.clone(), sub]);
    assert_eq!(serde_json::to_string(&v).unwrap(), "[[1],[1]]");
}

#[test]
fn cycles_and_extensions_fail_to_serialize() {
    let node = SharedValue::new(Value::Null);
    *node.write() = Value::array([Value::Shared(node.clone())]);
    let err = serde_json::to_string(&Value::Shared(node.clone())).unwrap_err();
    assert!(err.to_string().contains("circular reference detected"));
    *node.write() = Value::Null;

    let err = serde_json::to_string(&Value::extension(3.5f32)).unwrap_err();
    assert!(err.to_string().contains("cannot encode item of type f32"));
}

#[test]
fn deep_shared_chains_hit_the_depth_limit() {
    let mut v = Value::Null;
    for _ in 0..1000 {
        v = Value::shared(v);
    }
    let err = serde_json::to_string(&v).unwrap_err();
    assert!(err.to_string().contains("nesting depth limit exceeded"));

    let mut shallow = Value::from(1u8);
    for _ in 0..8 {
        shallow = Value::shared(Value::array([shallow]));
    }
    assert_eq!(serde_json::to_string(&shallow).unwrap(), "[[[[[[[[1]]]]]]]]");
}

#![no_main]

use libfuzzer_sys::fuzz_target;

use bjdata::{decode, encode, DecodeLimits, DecodeOptions, EncodeOptions};

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits {
        max_depth: 64,
        ..DecodeLimits::for_bytes(data.len().min(1 << 20))
    };
    let Ok(v) = decode(data, &DecodeOptions::default().with_limits(limits)) else {
        return;
    };

    // Whatever decodes must re-encode, and a second round trip must be byte-stable.
    let enc = EncodeOptions::default().with_no_float32(false);
    let bytes = encode(&v, &enc).expect("re-encode");
    let dec = DecodeOptions::default().with_limits(DecodeLimits::for_bytes(bytes.len()));
    let back = decode(&bytes, &dec).expect("decode re-encoding");
    assert_eq!(encode(&back, &enc).expect("re-encode twice"), bytes);
});

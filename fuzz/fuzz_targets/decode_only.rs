#![no_main]

use libfuzzer_sys::fuzz_target;

use bjdata::{decode_from_source, DecodeLimits, DecodeOptions, SliceSource};

fn fuzz_options(input_len: usize) -> DecodeOptions {
    let limits = DecodeLimits {
        max_depth: 64,
        ..DecodeLimits::for_bytes(input_len.min(1 << 20))
    };
    DecodeOptions::default().with_limits(limits)
}

fuzz_target!(|data: &[u8]| {
    let opts = fuzz_options(data.len());
    let mut src = SliceSource::new(data);
    // Walk concatenated documents until the input is exhausted or malformed.
    while let Ok(_v) = decode_from_source(&mut src, &opts) {}
    let _ = decode_from_source(&mut src, &opts.with_no_bytes(true).with_intern_keys(true));
});

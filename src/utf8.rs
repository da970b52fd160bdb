/// Take ownership of a text payload, rejecting invalid UTF-8.
///
/// The bytes are validated exactly once. With the `simdutf8` feature the SIMD validator does
/// the check and the validated text is copied into a fresh `String`.
#[cfg(feature = "simdutf8")]
#[inline]
pub fn into_string(bytes: Vec<u8>) -> Result<String, ()> {
    simdutf8::basic::from_utf8(&bytes)
        .map(str::to_owned)
        .map_err(|_| ())
}

/// Take ownership of a text payload, rejecting invalid UTF-8.
///
/// The bytes are validated exactly once and reused as the `String` buffer.
#[cfg(not(feature = "simdutf8"))]
#[inline]
pub fn into_string(bytes: Vec<u8>) -> Result<String, ()> {
    String::from_utf8(bytes).map_err(|_| ())
}

use core::fmt;
use core::str::FromStr;

use crate::{BjdataError, ErrorCode};

/// An IEEE-754 binary16 bit pattern (`h` marker).
///
/// Stored as raw bits so that every payload, including NaN payloads, survives a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct F16(u16);

impl F16 {
    /// Construct from raw IEEE-754 bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Return the raw IEEE-754 bits.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Widen into an `f32`. Exact for every half-precision value.
    #[must_use]
    pub fn to_f32(self) -> f32 {
        let bits = u32::from(self.0);
        let sign = (bits & 0x8000) << 16;
        let exp = (bits >> 10) & 0x1f;
        let mant = bits & 0x03ff;
        match exp {
            0 => {
                // mant * 2^-24; both factors are exact in f32.
                #[allow(clippy::cast_precision_loss)]
                let magnitude = mant as f32 * f32::from_bits(0x3380_0000);
                if sign == 0 {
                    magnitude
                } else {
                    -magnitude
                }
            }
            0x1f => f32::from_bits(sign | 0x7f80_0000 | (mant << 13)),
            _ => f32::from_bits(sign | ((exp + 112) << 23) | (mant << 13)),
        }
    }

    /// Widen into an `f64`.
    #[inline]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }
}

/// An arbitrary-precision decimal number stored as its exact textual literal (`H` marker).
///
/// Accepted literals: `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`, or the
/// case-insensitive special values `inf`, `infinity`, `nan`, `snan` (NaNs may carry a
/// digit payload), optionally signed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HighPrecision(Box<str>);

impl HighPrecision {
    /// Construct from a decimal literal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDecimalLiteral` if `text` is not a decimal literal.
    pub fn new(text: &str) -> Result<Self, BjdataError> {
        if classify(text).is_none() {
            return Err(BjdataError::validate(ErrorCode::InvalidDecimalLiteral));
        }
        Ok(Self(text.into()))
    }

    /// Exact decimal form of an integer.
    #[must_use]
    pub fn from_i128(v: i128) -> Self {
        Self(v.to_string().into_boxed_str())
    }

    /// Exact decimal form of an unsigned integer.
    #[must_use]
    pub fn from_u128(v: u128) -> Self {
        Self(v.to_string().into_boxed_str())
    }

    /// Shortest scientific literal that parses back to exactly `v`.
    ///
    /// Returns `None` for NaN and infinities.
    #[must_use]
    pub fn from_f64(v: f64) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        Some(Self(format!("{v:e}").into_boxed_str()))
    }

    /// The literal as written.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `false` for the `inf`/`nan` family.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        matches!(classify(&self.0), Some(Literal::Finite))
    }
}

impl FromStr for HighPrecision {
    type Err = BjdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for HighPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

enum Literal {
    Finite,
    Special,
}

fn classify(text: &str) -> Option<Literal> {
    let bytes = text.as_bytes();
    let body = match bytes.first() {
        Some(b'+' | b'-') => &bytes[1..],
        _ => bytes,
    };
    if body.is_empty() {
        return None;
    }
    if is_special(body) {
        return Some(Literal::Special);
    }

    let int_digits = leading_digits(body);
    let mut pos = int_digits;
    let mut frac_digits = 0;
    if body.get(pos) == Some(&b'.') {
        pos += 1;
        frac_digits = leading_digits(&body[pos..]);
        pos += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(body.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(body.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_digits = leading_digits(&body[pos..]);
        if exp_digits == 0 {
            return None;
        }
        pos += exp_digits;
    }
    (pos == body.len()).then_some(Literal::Finite)
}

fn is_special(body: &[u8]) -> bool {
    let lower = body.to_ascii_lowercase();
    if lower == b"inf" || lower == b"infinity" {
        return true;
    }
    let payload = lower
        .strip_prefix(b"snan")
        .or_else(|| lower.strip_prefix(b"nan"));
    payload.is_some_and(|digits| digits.iter().all(u8::is_ascii_digit))
}

fn leading_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

use crate::scalar::HighPrecision;

const EXP_MASK: u64 = 0x7ff0_0000_0000_0000;

/// The wire representation chosen for a binary64 value.
#[derive(Debug, Clone, PartialEq)]
pub enum FloatRepr {
    /// NaN and infinities have no BJData float form; they are written as `Z`.
    Null,
    /// `d`
    Float32(f32),
    /// `D`
    Float64(f64),
    /// `H`, for subnormals.
    HighPrecision(HighPrecision),
}

/// Returns true for nonzero binary64 values with a zero exponent field.
#[inline]
pub const fn is_subnormal_bits(bits: u64) -> bool {
    (bits & EXP_MASK) == 0 && (bits << 1) != 0
}

/// Returns the `f32` that widens back to exactly `v`, bit for bit.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn exact_f32(v: f64) -> Option<f32> {
    let narrow = v as f32;
    (f64::from(narrow).to_bits() == v.to_bits()).then_some(narrow)
}

/// Pick the narrowest faithful representation of `v`.
///
/// Zero of either sign is always `d`. Other values use `d` only when `allow_float32` and the
/// value survives the narrowing unchanged.
pub fn select(v: f64, allow_float32: bool) -> FloatRepr {
    if !v.is_finite() {
        return FloatRepr::Null;
    }
    if v == 0.0 || allow_float32 {
        if let Some(narrow) = exact_f32(v) {
            return FloatRepr::Float32(narrow);
        }
    }
    if is_subnormal_bits(v.to_bits()) {
        if let Some(hp) = HighPrecision::from_f64(v) {
            return FloatRepr::HighPrecision(hp);
        }
    }
    FloatRepr::Float64(v)
}

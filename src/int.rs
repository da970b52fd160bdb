use crate::marker::Marker;

/// Fixed-width integer payload chosen for a count, length or integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntRepr {
    /// `i`
    I8(i8),
    /// `U`
    U8(u8),
    /// `I`
    I16(i16),
    /// `u`
    U16(u16),
    /// `l`
    I32(i32),
    /// `m`
    U32(u32),
    /// `L`
    I64(i64),
    /// `M`
    U64(u64),
}

impl IntRepr {
    pub const fn marker(self) -> Marker {
        match self {
            Self::I8(_) => Marker::Int8,
            Self::U8(_) => Marker::UInt8,
            Self::I16(_) => Marker::Int16,
            Self::U16(_) => Marker::UInt16,
            Self::I32(_) => Marker::Int32,
            Self::U32(_) => Marker::UInt32,
            Self::I64(_) => Marker::Int64,
            Self::U64(_) => Marker::UInt64,
        }
    }
}

/// Narrowest unsigned width holding `v`.
pub fn narrow_unsigned(v: u64) -> IntRepr {
    if let Ok(x) = u8::try_from(v) {
        IntRepr::U8(x)
    } else if let Ok(x) = u16::try_from(v) {
        IntRepr::U16(x)
    } else if let Ok(x) = u32::try_from(v) {
        IntRepr::U32(x)
    } else {
        IntRepr::U64(v)
    }
}

/// Narrowest width holding `v`: unsigned when non-negative, signed otherwise.
///
/// Returns `None` outside `i64::MIN..=u64::MAX`.
pub fn narrow(v: i128) -> Option<IntRepr> {
    if v >= 0 {
        return u64::try_from(v).ok().map(narrow_unsigned);
    }
    let v = i64::try_from(v).ok()?;
    Some(if let Ok(x) = i8::try_from(v) {
        IntRepr::I8(x)
    } else if let Ok(x) = i16::try_from(v) {
        IntRepr::I16(x)
    } else if let Ok(x) = i32::try_from(v) {
        IntRepr::I32(x)
    } else {
        IntRepr::I64(v)
    })
}

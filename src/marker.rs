//! The BJData (Draft 2) marker alphabet.
//!
//! Every token in a stream starts with one of these bytes, except object keys, whose
//! length-prefix integer marker is the first byte of the entry.

/// A single-byte BJData marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    /// `Z`
    Null = b'Z',
    /// `N`, filler skipped inside dynamically typed containers.
    NoOp = b'N',
    /// `T`
    True = b'T',
    /// `F`
    False = b'F',
    /// `i`
    Int8 = b'i',
    /// `U`
    UInt8 = b'U',
    /// `I`
    Int16 = b'I',
    /// `u`
    UInt16 = b'u',
    /// `l`
    Int32 = b'l',
    /// `m`
    UInt32 = b'm',
    /// `L`
    Int64 = b'L',
    /// `M`
    UInt64 = b'M',
    /// `h`
    Float16 = b'h',
    /// `d`
    Float32 = b'd',
    /// `D`
    Float64 = b'D',
    /// `H`, length-prefixed decimal literal.
    HighPrecision = b'H',
    /// `C`, one ASCII byte.
    Char = b'C',
    /// `S`, length-prefixed UTF-8.
    String = b'S',
    /// `[`
    ArrayStart = b'[',
    /// `]`
    ArrayEnd = b']',
    /// `{`
    ObjectStart = b'{',
    /// `}`
    ObjectEnd = b'}',
    /// `$`, container element type header.
    ContainerType = b'$',
    /// `#`, container count header.
    ContainerCount = b'#',
}

impl Marker {
    /// Look up the marker for a byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        let m = match b {
            b'Z' => Self::Null,
            b'N' => Self::NoOp,
            b'T' => Self::True,
            b'F' => Self::False,
            b'i' => Self::Int8,
            b'U' => Self::UInt8,
            b'I' => Self::Int16,
            b'u' => Self::UInt16,
            b'l' => Self::Int32,
            b'm' => Self::UInt32,
            b'L' => Self::Int64,
            b'M' => Self::UInt64,
            b'h' => Self::Float16,
            b'd' => Self::Float32,
            b'D' => Self::Float64,
            b'H' => Self::HighPrecision,
            b'C' => Self::Char,
            b'S' => Self::String,
            b'[' => Self::ArrayStart,
            b']' => Self::ArrayEnd,
            b'{' => Self::ObjectStart,
            b'}' => Self::ObjectEnd,
            b'$' => Self::ContainerType,
            b'#' => Self::ContainerCount,
            _ => return None,
        };
        Some(m)
    }

    /// The wire byte.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Payload width in bytes for fixed-width scalars.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 | Self::Char => Some(1),
            Self::Int16 | Self::UInt16 | Self::Float16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Integer markers, the only ones allowed for counts, lengths and object keys.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::UInt8
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    /// Null/True/False: the marker alone is the whole value.
    #[must_use]
    pub const fn is_no_data(self) -> bool {
        matches!(self, Self::Null | Self::True | Self::False)
    }

    /// Markers that may follow a `$` container type header.
    #[must_use]
    pub const fn is_container_type(self) -> bool {
        !matches!(
            self,
            Self::NoOp
                | Self::ArrayEnd
                | Self::ObjectEnd
                | Self::ContainerType
                | Self::ContainerCount
        )
    }
}

/// Element type of a packed typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// `i`
    Int8,
    /// `U`
    UInt8,
    /// `I`
    Int16,
    /// `u`
    UInt16,
    /// `l`
    Int32,
    /// `m`
    UInt32,
    /// `L`
    Int64,
    /// `M`
    UInt64,
    /// `h`
    Float16,
    /// `d`
    Float32,
    /// `D`
    Float64,
    /// `C`
    Char,
}

impl ElementType {
    /// The element type for a fixed-width marker, if it has one.
    #[must_use]
    pub const fn from_marker(marker: Marker) -> Option<Self> {
        let t = match marker {
            Marker::Int8 => Self::Int8,
            Marker::UInt8 => Self::UInt8,
            Marker::Int16 => Self::Int16,
            Marker::UInt16 => Self::UInt16,
            Marker::Int32 => Self::Int32,
            Marker::UInt32 => Self::UInt32,
            Marker::Int64 => Self::Int64,
            Marker::UInt64 => Self::UInt64,
            Marker::Float16 => Self::Float16,
            Marker::Float32 => Self::Float32,
            Marker::Float64 => Self::Float64,
            Marker::Char => Self::Char,
            _ => return None,
        };
        Some(t)
    }

    /// The marker written after `$`.
    #[must_use]
    pub const fn marker(self) -> Marker {
        match self {
            Self::Int8 => Marker::Int8,
            Self::UInt8 => Marker::UInt8,
            Self::Int16 => Marker::Int16,
            Self::UInt16 => Marker::UInt16,
            Self::Int32 => Marker::Int32,
            Self::UInt32 => Marker::UInt32,
            Self::Int64 => Marker::Int64,
            Self::UInt64 => Marker::UInt64,
            Self::Float16 => Marker::Float16,
            Self::Float32 => Marker::Float32,
            Self::Float64 => Marker::Float64,
            Self::Char => Marker::Char,
        }
    }

    /// Bytes per element.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::Char => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }
}

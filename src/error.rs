use core::fmt;
use std::io;

/// The high-level class of an error.
///
/// - **Decode** errors: the byte stream is malformed, truncated, or exceeds limits.
/// - **Encode** errors: a value graph has no BJData representation.
/// - **Validate** errors: a value could not be constructed (bad decimal literal, bad shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Decode failure.
    Decode,
    /// Encode failure.
    Encode,
    /// Value construction failure.
    Validate,
}

/// A structured error code identifying the reason an operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The source was exhausted before the first marker byte.
    EmptyInput,
    /// Unknown marker, or a marker that cannot start a value at this position.
    InvalidMarker,
    /// Not enough bytes for a fixed-width or length-prefixed payload.
    Truncated,
    /// Text payload (string, char, key, decimal) is not valid UTF-8.
    InvalidUtf8,
    /// High-precision payload is not a decimal literal.
    InvalidDecimalLiteral,
    /// A count or length decoded to a negative integer.
    NegativeCountOrLength,
    /// A container type header was not followed by a count header.
    MissingCountForTypedContainer,
    /// Container nesting exceeds the configured maximum depth.
    ExcessiveNestingDepth,
    /// A marker inside a container does not start a valid element.
    InvalidContainerElement,
    /// A dimension array or typed-array shape is malformed.
    InvalidShape,

    /// Arithmetic overflow while computing a length or byte count.
    LengthOverflow,
    /// Container element count exceeds decode limits.
    ContainerLenLimitExceeded,
    /// String, decimal, or packed payload length exceeds decode limits.
    PayloadLenLimitExceeded,
    /// Memory allocation failed while building a value or output buffer.
    AllocationFailed,
    /// The byte source reported an I/O error.
    SourceReadFailure,

    /// The value has no representation and no `default` hook resolved it.
    Unencodable,
    /// A shared container was reached again while it was still being encoded.
    CircularReference,
    /// The byte sink reported an I/O error.
    SinkWriteFailure,
}

/// A BJData error with classification, a stable code and, for decode errors, a byte offset.
///
/// `offset` is the position reported by the source at the moment of failure. It is `None`
/// when the source cannot report positions and for all encode/validate errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BjdataError {
    /// The error kind.
    pub kind: ErrorKind,
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset into the input where the error was detected, if known.
    pub offset: Option<u64>,
    /// The underlying I/O error kind for `SourceReadFailure` / `SinkWriteFailure`.
    pub io_kind: Option<io::ErrorKind>,
}

impl BjdataError {
    /// Construct a decode error at `offset`.
    #[inline]
    #[must_use]
    pub const fn decode(code: ErrorCode, offset: Option<u64>) -> Self {
        Self {
            kind: ErrorKind::Decode,
            code,
            offset,
            io_kind: None,
        }
    }

    /// Construct an encoding error.
    #[inline]
    #[must_use]
    pub const fn encode(code: ErrorCode) -> Self {
        Self {
            kind: ErrorKind::Encode,
            code,
            offset: None,
            io_kind: None,
        }
    }

    /// Construct a value validation error.
    #[inline]
    #[must_use]
    pub const fn validate(code: ErrorCode) -> Self {
        Self {
            kind: ErrorKind::Validate,
            code,
            offset: None,
            io_kind: None,
        }
    }

    /// Construct a decode error from a failed source read.
    #[must_use]
    pub fn source_io(err: &io::Error, offset: Option<u64>) -> Self {
        Self {
            io_kind: Some(err.kind()),
            ..Self::decode(ErrorCode::SourceReadFailure, offset)
        }
    }

    /// Construct an encode error from a failed sink write.
    #[must_use]
    pub fn sink_io(err: &io::Error) -> Self {
        Self {
            io_kind: Some(err.kind()),
            ..Self::encode(ErrorCode::SinkWriteFailure)
        }
    }

    /// Returns true iff this error was raised by the decoder.
    #[inline]
    #[must_use]
    pub const fn is_decode(self) -> bool {
        matches!(self.kind, ErrorKind::Decode)
    }
}

impl fmt::Display for BjdataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.code {
            ErrorCode::EmptyInput => "empty input",
            ErrorCode::InvalidMarker => "invalid marker",
            ErrorCode::Truncated => "insufficient input",
            ErrorCode::InvalidUtf8 => "text must be valid UTF-8",
            ErrorCode::InvalidDecimalLiteral => "invalid high-precision decimal literal",
            ErrorCode::NegativeCountOrLength => "negative count/length unexpected",
            ErrorCode::MissingCountForTypedContainer => "container type without count",
            ErrorCode::ExcessiveNestingDepth => "nesting depth limit exceeded",
            ErrorCode::InvalidContainerElement => "invalid marker within container",
            ErrorCode::InvalidShape => "invalid dimension array or shape",

            ErrorCode::LengthOverflow => "length overflow",
            ErrorCode::ContainerLenLimitExceeded => "container length exceeds decode limits",
            ErrorCode::PayloadLenLimitExceeded => "payload length exceeds decode limits",
            ErrorCode::AllocationFailed => "allocation failed",
            ErrorCode::SourceReadFailure => "source read failed",

            ErrorCode::Unencodable => "cannot encode item",
            ErrorCode::CircularReference => "circular reference detected",
            ErrorCode::SinkWriteFailure => "sink write failed",
        };

        match (self.kind, self.offset) {
            (ErrorKind::Decode, Some(offset)) => {
                write!(f, "bjdata decode failed at {offset}: {msg}")?;
            }
            (ErrorKind::Decode, None) => write!(f, "bjdata decode failed: {msg}")?,
            (ErrorKind::Encode, _) => write!(f, "bjdata encode failed: {msg}")?,
            (ErrorKind::Validate, _) => write!(f, "invalid bjdata value: {msg}")?,
        }
        if let Some(kind) = self.io_kind {
            write!(f, " ({kind})")?;
        }
        Ok(())
    }
}

impl std::error::Error for BjdataError {}

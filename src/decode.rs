use std::collections::HashSet;
use std::io::{self, Read};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::alloc_util::{try_reserve, try_vec_repeat, try_vec_with_capacity};
use crate::marker::{ElementType, Marker};
use crate::options::DecodeOptions;
use crate::scalar::{HighPrecision, F16};
use crate::stream::{ReadSource, SliceSource, Source};
use crate::utf8;
use crate::value::{nest_row_major, Object, TypedArray, TypedData, Value};
use crate::wire::{unpack_all, Packed};
use crate::{BjdataError, ErrorCode};

/// Upper bound on elements preallocated from a declared count; larger containers grow as
/// elements actually arrive.
const PREALLOC_CAP: usize = 4096;

/// Decode exactly one value from the start of `bytes`. Trailing bytes are ignored.
///
/// Error offsets are byte positions in `bytes`.
///
/// # Errors
///
/// Returns a decode error if the input is empty, malformed, truncated, or exceeds limits.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Value, BjdataError> {
    Decoder::new(SliceSource::new(bytes), options.clone()).decode_value()
}

/// Decode exactly one value from a reader.
///
/// Plain readers cannot report their position, so errors carry no offset; wrap the reader in
/// [`ReadSource::with_position`] and use [`decode_from_source`] to get offsets.
///
/// # Errors
///
/// Returns a decode error if the input is malformed, or `SourceReadFailure` if the reader fails.
pub fn decode_from<R: Read>(reader: R, options: &DecodeOptions) -> Result<Value, BjdataError> {
    Decoder::new(ReadSource::new(reader), options.clone()).decode_value()
}

/// Decode exactly one value from `source`, leaving it positioned just past that value.
///
/// Call repeatedly to read a sequence of concatenated documents.
///
/// # Errors
///
/// Returns a decode error if the input is malformed, or `SourceReadFailure` if the source fails.
pub fn decode_from_source<S: Source + ?Sized>(
    source: &mut S,
    options: &DecodeOptions,
) -> Result<Value, BjdataError> {
    Decoder::new(source, options.clone()).decode_value()
}

/// Container prefix: optional `$type`, optional `#count`, and the lookahead byte of an
/// unbounded container.
struct Header {
    elem: Option<Marker>,
    count: Option<usize>,
    shape: Option<Vec<usize>>,
    first: Option<u8>,
}

/// Object entries as they are decoded: a map, or the raw pairs when a pairs hook is installed.
enum Entries {
    Map(Object),
    Pairs(Vec<(Arc<str>, Value)>),
}

impl Entries {
    fn len(&self) -> usize {
        match self {
            Self::Map(map) => map.len(),
            Self::Pairs(pairs) => pairs.len(),
        }
    }

    /// Whether storing `key` grows the entry count.
    fn adds_entry(&self, key: &str) -> bool {
        match self {
            Self::Map(map) => !map.contains_key(key),
            Self::Pairs(_) => true,
        }
    }
}

/// Streaming BJData decoder over a [`Source`].
pub struct Decoder<S> {
    src: S,
    opts: DecodeOptions,
    depth: usize,
    keys: Option<HashSet<Arc<str>>>,
}

impl<S: Source> Decoder<S> {
    /// Create a decoder reading from `src`.
    pub const fn new(src: S, opts: DecodeOptions) -> Self {
        Self {
            src,
            opts,
            depth: 0,
            keys: None,
        }
    }

    /// Borrow the underlying source.
    pub const fn source(&self) -> &S {
        &self.src
    }

    /// Unwrap the underlying source.
    pub fn into_source(self) -> S {
        self.src
    }

    /// Decode one top-level value.
    ///
    /// Interned keys are shared only within a single call.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the input is empty, malformed, truncated, or exceeds limits.
    pub fn decode_value(&mut self) -> Result<Value, BjdataError> {
        self.depth = 0;
        self.keys = self.opts.intern_keys.then(HashSet::new);
        let result = self.decode_top();
        self.keys = None;
        if let Err(err) = &result {
            debug!(code = ?err.code, offset = ?err.offset, "bjdata decode failed");
        }
        result
    }

    fn decode_top(&mut self) -> Result<Value, BjdataError> {
        let Some(b) = self.read_byte()? else {
            return Err(self.err(ErrorCode::EmptyInput));
        };
        let m = value_marker(b).ok_or_else(|| self.err(ErrorCode::InvalidMarker))?;
        self.read_value(m)
    }

    #[inline]
    fn err(&self, code: ErrorCode) -> BjdataError {
        BjdataError::decode(code, self.src.position())
    }

    fn io_err(&self, err: &io::Error) -> BjdataError {
        if err.kind() == io::ErrorKind::OutOfMemory {
            return self.err(ErrorCode::AllocationFailed);
        }
        BjdataError::source_io(err, self.src.position())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, BjdataError> {
        let mut buf = [0u8; 1];
        match self.src.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) => Err(self.io_err(&e)),
        }
    }

    fn next_byte(&mut self) -> Result<u8, BjdataError> {
        self.read_byte()?
            .ok_or_else(|| self.err(ErrorCode::Truncated))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BjdataError> {
        let n = self.src.read(buf).map_err(|e| self.io_err(&e))?;
        if n < buf.len() {
            return Err(self.err(ErrorCode::Truncated));
        }
        Ok(())
    }

    fn read_packed<T: Packed>(&mut self) -> Result<T, BjdataError> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf[..T::WIDTH])?;
        Ok(T::unpack(&buf, self.opts.endian))
    }

    fn read_payload(&mut self, len: usize) -> Result<Vec<u8>, BjdataError> {
        if len > self.opts.limits.max_payload_len {
            return Err(self.err(ErrorCode::PayloadLenLimitExceeded));
        }
        let mut out = Vec::new();
        let got = self
            .src
            .read_bulk(len, &mut out)
            .map_err(|e| self.io_err(&e))?;
        if got < len {
            return Err(self.err(ErrorCode::Truncated));
        }
        Ok(out)
    }

    fn read_int(&mut self, m: Marker) -> Result<i128, BjdataError> {
        let v = match m {
            Marker::Int8 => i128::from(self.read_packed::<i8>()?),
            Marker::UInt8 => i128::from(self.read_packed::<u8>()?),
            Marker::Int16 => i128::from(self.read_packed::<i16>()?),
            Marker::UInt16 => i128::from(self.read_packed::<u16>()?),
            Marker::Int32 => i128::from(self.read_packed::<i32>()?),
            Marker::UInt32 => i128::from(self.read_packed::<u32>()?),
            Marker::Int64 => i128::from(self.read_packed::<i64>()?),
            Marker::UInt64 => i128::from(self.read_packed::<u64>()?),
            _ => return Err(self.err(ErrorCode::InvalidMarker)),
        };
        Ok(v)
    }

    /// A count or length whose integer marker byte has already been read.
    fn read_count_after(&mut self, b: u8) -> Result<usize, BjdataError> {
        let m = Marker::from_byte(b)
            .filter(|m| m.is_integer())
            .ok_or_else(|| self.err(ErrorCode::InvalidMarker))?;
        let v = self.read_int(m)?;
        if v < 0 {
            return Err(self.err(ErrorCode::NegativeCountOrLength));
        }
        usize::try_from(v).map_err(|_| self.err(ErrorCode::LengthOverflow))
    }

    fn read_length(&mut self) -> Result<usize, BjdataError> {
        let b = self.next_byte()?;
        self.read_count_after(b)
    }

    fn read_text(&mut self, len: usize) -> Result<String, BjdataError> {
        let raw = self.read_payload(len)?;
        utf8::into_string(raw).map_err(|()| self.err(ErrorCode::InvalidUtf8))
    }

    fn read_value(&mut self, m: Marker) -> Result<Value, BjdataError> {
        let v = match m {
            Marker::Null => Value::Null,
            Marker::True => Value::Bool(true),
            Marker::False => Value::Bool(false),
            Marker::Int8 => Value::Int8(self.read_packed()?),
            Marker::UInt8 => Value::UInt8(self.read_packed()?),
            Marker::Int16 => Value::Int16(self.read_packed()?),
            Marker::UInt16 => Value::UInt16(self.read_packed()?),
            Marker::Int32 => Value::Int32(self.read_packed()?),
            Marker::UInt32 => Value::UInt32(self.read_packed()?),
            Marker::Int64 => Value::Int64(self.read_packed()?),
            Marker::UInt64 => Value::UInt64(self.read_packed()?),
            Marker::Float16 => Value::Float16(self.read_packed::<F16>()?),
            Marker::Float32 => Value::Float32(self.read_packed()?),
            Marker::Float64 => Value::Float64(self.read_packed()?),
            Marker::HighPrecision => {
                let len = self.read_length()?;
                let text = self.read_text(len)?;
                let hp = HighPrecision::new(&text)
                    .map_err(|_| self.err(ErrorCode::InvalidDecimalLiteral))?;
                Value::HighPrecision(hp)
            }
            Marker::Char => {
                let b = self.next_byte()?;
                if !b.is_ascii() {
                    return Err(self.err(ErrorCode::InvalidUtf8));
                }
                Value::Char(char::from(b))
            }
            Marker::String => {
                let len = self.read_length()?;
                Value::String(self.read_text(len)?)
            }
            Marker::ArrayStart => self.read_array()?,
            Marker::ObjectStart => self.read_object()?,
            Marker::NoOp
            | Marker::ArrayEnd
            | Marker::ObjectEnd
            | Marker::ContainerType
            | Marker::ContainerCount => return Err(self.err(ErrorCode::InvalidMarker)),
        };
        Ok(v)
    }

    fn enter(&mut self) -> Result<(), BjdataError> {
        if self.depth >= self.opts.limits.max_depth {
            return Err(self.err(ErrorCode::ExcessiveNestingDepth));
        }
        self.depth += 1;
        Ok(())
    }

    fn read_array(&mut self) -> Result<Value, BjdataError> {
        self.enter()?;
        let v = self.read_array_body()?;
        self.depth -= 1;
        Ok(v)
    }

    fn read_object(&mut self) -> Result<Value, BjdataError> {
        self.enter()?;
        let v = self.read_object_body()?;
        self.depth -= 1;
        Ok(v)
    }

    fn read_header(&mut self) -> Result<Header, BjdataError> {
        let mut b = self.next_byte()?;
        let mut elem = None;
        if b == Marker::ContainerType.as_byte() {
            let t = self.next_byte()?;
            let m = Marker::from_byte(t)
                .filter(|m| m.is_container_type())
                .ok_or_else(|| self.err(ErrorCode::InvalidMarker))?;
            elem = Some(m);
            b = self.next_byte()?;
            if b != Marker::ContainerCount.as_byte() {
                return Err(self.err(ErrorCode::MissingCountForTypedContainer));
            }
        }
        if b != Marker::ContainerCount.as_byte() {
            return Ok(Header {
                elem,
                count: None,
                shape: None,
                first: Some(b),
            });
        }

        let c = self.next_byte()?;
        let (count, shape) = if c == Marker::ArrayStart.as_byte() {
            let dims = self.read_dims()?;
            let count = dims
                .iter()
                .try_fold(1usize, |acc, &d| acc.checked_mul(d))
                .ok_or_else(|| self.err(ErrorCode::LengthOverflow))?;
            (count, Some(dims))
        } else {
            (self.read_count_after(c)?, None)
        };
        trace!(elem = ?elem, count, shape = ?shape, "container header");
        Ok(Header {
            elem,
            count: Some(count),
            shape,
            first: None,
        })
    }

    /// Dimension vector of a `#[...]` count. The `[` has been consumed.
    fn read_dims(&mut self) -> Result<Vec<usize>, BjdataError> {
        let raw: Vec<i128> = match self.read_array()? {
            Value::Array(items) => items
                .iter()
                .map(Value::as_i128)
                .collect::<Option<_>>()
                .ok_or_else(|| self.err(ErrorCode::InvalidShape))?,
            Value::Bytes(bytes) => bytes.into_iter().map(i128::from).collect(),
            Value::TypedArray(t) if t.rank() == 1 => typed_ints(t.data())
                .ok_or_else(|| self.err(ErrorCode::InvalidShape))?,
            _ => return Err(self.err(ErrorCode::InvalidShape)),
        };
        if raw.is_empty() {
            return Err(self.err(ErrorCode::InvalidShape));
        }
        raw.into_iter()
            .map(|d| {
                if d < 0 {
                    return Err(self.err(ErrorCode::InvalidShape));
                }
                let d = usize::try_from(d).map_err(|_| self.err(ErrorCode::LengthOverflow))?;
                self.check_container_len(d)?;
                Ok(d)
            })
            .collect()
    }

    fn check_container_len(&self, len: usize) -> Result<(), BjdataError> {
        if len > self.opts.limits.max_container_len {
            return Err(self.err(ErrorCode::ContainerLenLimitExceeded));
        }
        Ok(())
    }

    fn element_marker(&self, b: u8) -> Result<Marker, BjdataError> {
        value_marker(b).ok_or_else(|| self.err(ErrorCode::InvalidContainerElement))
    }

    fn read_array_body(&mut self) -> Result<Value, BjdataError> {
        let header = self.read_header()?;
        let Some(count) = header.count else {
            let first = header.first.unwrap_or(Marker::ArrayEnd.as_byte());
            return self.read_unbounded_items(first).map(Value::Array);
        };
        let shape = header.shape;

        let items = match header.elem {
            Some(m) if m.is_no_data() => {
                self.check_container_len(count)?;
                let literal = no_data_value(m);
                try_vec_repeat(count, literal, self.src.position())?
            }
            Some(Marker::UInt8) if !self.opts.no_bytes && shape.is_none() => {
                let bytes = self.read_payload(count)?;
                trace!(len = bytes.len(), "byte buffer");
                return Ok(Value::Bytes(bytes));
            }
            Some(m) => {
                if let Some(t) = ElementType::from_marker(m) {
                    return self.read_packed_array(t, count, shape);
                }
                self.check_container_len(count)?;
                let mut items = try_vec_with_capacity(count.min(PREALLOC_CAP), self.src.position())?;
                for _ in 0..count {
                    let v = self.read_value(m)?;
                    try_reserve(&mut items, 1, self.src.position())?;
                    items.push(v);
                }
                items
            }
            None => {
                self.check_container_len(count)?;
                self.read_counted_items(count)?
            }
        };

        match shape {
            Some(dims) if dims.len() > 1 => {
                // Rows are allocated even when the element count is zero.
                let rows = dims[..dims.len() - 1]
                    .iter()
                    .try_fold(1usize, |acc, &d| acc.checked_mul(d))
                    .ok_or_else(|| self.err(ErrorCode::LengthOverflow))?;
                self.check_container_len(rows)?;
                Ok(nest_row_major(items, &dims))
            }
            _ => Ok(Value::Array(items)),
        }
    }

    fn read_unbounded_items(&mut self, first: u8) -> Result<Vec<Value>, BjdataError> {
        let mut items = Vec::new();
        let mut b = first;
        while b != Marker::ArrayEnd.as_byte() {
            if b != Marker::NoOp.as_byte() {
                let m = self.element_marker(b)?;
                let v = self.read_value(m)?;
                self.check_container_len(items.len() + 1)?;
                try_reserve(&mut items, 1, self.src.position())?;
                items.push(v);
            }
            b = self.next_byte()?;
        }
        Ok(items)
    }

    fn read_counted_items(&mut self, count: usize) -> Result<Vec<Value>, BjdataError> {
        let mut items = try_vec_with_capacity(count.min(PREALLOC_CAP), self.src.position())?;
        while items.len() < count {
            let b = self.next_byte()?;
            if b == Marker::NoOp.as_byte() {
                continue;
            }
            let m = self.element_marker(b)?;
            let v = self.read_value(m)?;
            try_reserve(&mut items, 1, self.src.position())?;
            items.push(v);
        }
        Ok(items)
    }

    fn read_packed_array(
        &mut self,
        t: ElementType,
        count: usize,
        shape: Option<Vec<usize>>,
    ) -> Result<Value, BjdataError> {
        let len = count
            .checked_mul(t.width())
            .ok_or_else(|| self.err(ErrorCode::LengthOverflow))?;
        let raw = self.read_payload(len)?;
        trace!(elem = ?t, count, bytes = len, "packed payload");
        let e = self.opts.endian;
        let data = match t {
            ElementType::Int8 => TypedData::Int8(unpack_all(&raw, e)),
            ElementType::UInt8 => TypedData::UInt8(raw),
            ElementType::Int16 => TypedData::Int16(unpack_all(&raw, e)),
            ElementType::UInt16 => TypedData::UInt16(unpack_all(&raw, e)),
            ElementType::Int32 => TypedData::Int32(unpack_all(&raw, e)),
            ElementType::UInt32 => TypedData::UInt32(unpack_all(&raw, e)),
            ElementType::Int64 => TypedData::Int64(unpack_all(&raw, e)),
            ElementType::UInt64 => TypedData::UInt64(unpack_all(&raw, e)),
            ElementType::Float16 => TypedData::Float16(unpack_all(&raw, e)),
            ElementType::Float32 => TypedData::Float32(unpack_all(&raw, e)),
            ElementType::Float64 => TypedData::Float64(unpack_all(&raw, e)),
            ElementType::Char => {
                if !raw.is_ascii() {
                    return Err(self.err(ErrorCode::InvalidUtf8));
                }
                TypedData::Char(raw)
            }
        };
        let shape = shape.unwrap_or_else(|| vec![count]);
        TypedArray::new(data, shape)
            .map(Value::TypedArray)
            .map_err(|e| self.err(e.code))
    }

    fn read_key(&mut self, b: u8) -> Result<Arc<str>, BjdataError> {
        let len = self.read_count_after(b)?;
        let text = self.read_text(len)?;
        Ok(match self.keys.as_mut() {
            Some(keys) => {
                if let Some(k) = keys.get(text.as_str()) {
                    Arc::clone(k)
                } else {
                    let k: Arc<str> = Arc::from(text);
                    keys.insert(Arc::clone(&k));
                    k
                }
            }
            None => Arc::from(text),
        })
    }

    /// Next key marker byte, skipping `N` filler.
    fn next_key_byte(&mut self) -> Result<u8, BjdataError> {
        loop {
            let b = self.next_byte()?;
            if b != Marker::NoOp.as_byte() {
                return Ok(b);
            }
        }
    }

    fn read_object_body(&mut self) -> Result<Value, BjdataError> {
        let header = self.read_header()?;
        let Some(count) = header.count else {
            let first = header.first.unwrap_or(Marker::ObjectEnd.as_byte());
            let entries = self.read_unbounded_entries(first)?;
            return Ok(self.finish_object(entries));
        };
        self.check_container_len(count)?;

        let mut entries = self.new_entries(count.min(PREALLOC_CAP))?;
        match header.elem {
            Some(m) if m.is_no_data() => {
                let literal = no_data_value(m);
                for _ in 0..count {
                    let b = self.next_byte()?;
                    let key = self.read_key(b)?;
                    self.push_entry(&mut entries, key, literal.clone())?;
                }
            }
            Some(m) => {
                for _ in 0..count {
                    let b = self.next_key_byte()?;
                    let key = self.read_key(b)?;
                    let v = self.read_value(m)?;
                    self.push_entry(&mut entries, key, v)?;
                }
            }
            None => {
                for _ in 0..count {
                    let b = self.next_key_byte()?;
                    let key = self.read_key(b)?;
                    let v = self.read_entry_value()?;
                    self.push_entry(&mut entries, key, v)?;
                }
            }
        }
        Ok(self.finish_object(entries))
    }

    fn read_entry_value(&mut self) -> Result<Value, BjdataError> {
        let b = self.next_byte()?;
        let m = self.element_marker(b)?;
        self.read_value(m)
    }

    fn read_unbounded_entries(&mut self, first: u8) -> Result<Entries, BjdataError> {
        let mut entries = self.new_entries(0)?;
        let mut b = first;
        while b != Marker::ObjectEnd.as_byte() {
            if b != Marker::NoOp.as_byte() {
                let key = self.read_key(b)?;
                let v = self.read_entry_value()?;
                if entries.adds_entry(&key) {
                    self.check_container_len(entries.len() + 1)?;
                }
                self.push_entry(&mut entries, key, v)?;
            }
            b = self.next_byte()?;
        }
        Ok(entries)
    }

    fn new_entries(&self, cap: usize) -> Result<Entries, BjdataError> {
        if self.opts.object_pairs_hook.is_some() {
            let pairs = try_vec_with_capacity(cap, self.src.position())?;
            return Ok(Entries::Pairs(pairs));
        }
        Ok(Entries::Map(Object::with_capacity(cap)))
    }

    fn push_entry(
        &self,
        entries: &mut Entries,
        key: Arc<str>,
        value: Value,
    ) -> Result<(), BjdataError> {
        match entries {
            Entries::Map(map) => {
                map.insert(key, value);
            }
            Entries::Pairs(pairs) => {
                try_reserve(pairs, 1, self.src.position())?;
                pairs.push((key, value));
            }
        }
        Ok(())
    }

    fn finish_object(&self, entries: Entries) -> Value {
        match entries {
            Entries::Map(map) => match &self.opts.object_hook {
                Some(hook) => hook(map),
                None => Value::Object(map),
            },
            Entries::Pairs(pairs) => match &self.opts.object_pairs_hook {
                Some(hook) => hook(pairs),
                None => Value::Object(pairs.into_iter().collect()),
            },
        }
    }
}

/// The marker for `b` if it can start a value.
fn value_marker(b: u8) -> Option<Marker> {
    Marker::from_byte(b).filter(|m| m.is_container_type())
}

const fn no_data_value(m: Marker) -> Value {
    match m {
        Marker::True => Value::Bool(true),
        Marker::False => Value::Bool(false),
        _ => Value::Null,
    }
}

fn typed_ints(data: &TypedData) -> Option<Vec<i128>> {
    fn widen<T: Copy + Into<i128>>(v: &[T]) -> Vec<i128> {
        v.iter().map(|&x| x.into()).collect()
    }
    Some(match data {
        TypedData::Int8(v) => widen(v),
        TypedData::UInt8(v) => widen(v),
        TypedData::Int16(v) => widen(v),
        TypedData::UInt16(v) => widen(v),
        TypedData::Int32(v) => widen(v),
        TypedData::UInt32(v) => widen(v),
        TypedData::Int64(v) => widen(v),
        TypedData::UInt64(v) => widen(v),
        TypedData::Float16(_) | TypedData::Float32(_) | TypedData::Float64(_) | TypedData::Char(_) => {
            return None
        }
    })
}

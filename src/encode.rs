use std::io::Write;

use tracing::{debug, trace};

use crate::alloc_util::try_reserve_out;
use crate::float::{self, FloatRepr};
use crate::int::{self, IntRepr};
use crate::marker::Marker;
use crate::options::EncodeOptions;
use crate::scalar::HighPrecision;
use crate::value::{each_typed, Object, TypedArray, TypedData, Value};
use crate::wire::{pack_all, Endian, Packed};
use crate::{BjdataError, ErrorCode};

trait Sink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BjdataError>;

    fn write_u8(&mut self, byte: u8) -> Result<(), BjdataError> {
        self.write(&[byte])
    }

    /// Write a run of packed elements in one go.
    fn write_packed<T: Packed>(&mut self, items: &[T], endian: Endian) -> Result<(), BjdataError>;
}

struct VecSink {
    buf: Vec<u8>,
}

impl VecSink {
    const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl Sink for VecSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BjdataError> {
        try_reserve_out(&mut self.buf, bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn write_u8(&mut self, byte: u8) -> Result<(), BjdataError> {
        if self.buf.len() == self.buf.capacity() {
            try_reserve_out(&mut self.buf, 1)?;
        }
        self.buf.push(byte);
        Ok(())
    }

    fn write_packed<T: Packed>(&mut self, items: &[T], endian: Endian) -> Result<(), BjdataError> {
        let len = items
            .len()
            .checked_mul(T::WIDTH)
            .ok_or(BjdataError::encode(ErrorCode::LengthOverflow))?;
        try_reserve_out(&mut self.buf, len)?;
        pack_all(items, endian, &mut self.buf);
        Ok(())
    }
}

struct IoSink<W> {
    inner: W,
    scratch: Vec<u8>,
}

impl<W: Write> IoSink<W> {
    const fn new(inner: W) -> Self {
        Self {
            inner,
            scratch: Vec::new(),
        }
    }
}

impl<W: Write> Sink for IoSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BjdataError> {
        self.inner
            .write_all(bytes)
            .map_err(|e| BjdataError::sink_io(&e))
    }

    fn write_packed<T: Packed>(&mut self, items: &[T], endian: Endian) -> Result<(), BjdataError> {
        const CHUNK: usize = 8192;
        for chunk in items.chunks(CHUNK) {
            self.scratch.clear();
            try_reserve_out(&mut self.scratch, chunk.len() * T::WIDTH)?;
            pack_all(chunk, endian, &mut self.scratch);
            self.inner
                .write_all(&self.scratch)
                .map_err(|e| BjdataError::sink_io(&e))?;
        }
        Ok(())
    }
}

/// Encode a value graph into a new buffer.
///
/// # Errors
///
/// Returns an encode error for cycles, excessive nesting, or values with no representation.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, BjdataError> {
    let mut sink = VecSink::new();
    Encoder::new(options).run(value, &mut sink)?;
    Ok(sink.into_vec())
}

/// Encode a value graph into a writer.
///
/// Bytes already written before a failure are not retracted.
///
/// # Errors
///
/// Returns an encode error for cycles, excessive nesting, or values with no representation, and
/// `SinkWriteFailure` if the writer fails.
pub fn encode_to<W: Write>(value: &Value, writer: W, options: &EncodeOptions) -> Result<(), BjdataError> {
    let mut sink = IoSink::new(writer);
    Encoder::new(options).run(value, &mut sink)?;
    sink.inner.flush().map_err(|e| BjdataError::sink_io(&e))
}

/// Per-call encoder state: nesting depth and the shared nodes on the active path.
pub struct Encoder<'o> {
    opts: &'o EncodeOptions,
    depth: usize,
    active: Vec<usize>,
}

impl<'o> Encoder<'o> {
    /// Create an encoder with the given options.
    #[must_use]
    pub const fn new(opts: &'o EncodeOptions) -> Self {
        Self {
            opts,
            depth: 0,
            active: Vec::new(),
        }
    }

    /// Encode one value into a buffer.
    ///
    /// # Errors
    ///
    /// See [`encode`].
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>, BjdataError> {
        let mut sink = VecSink::new();
        self.run(value, &mut sink)?;
        Ok(sink.into_vec())
    }

    fn run<S: Sink>(&mut self, value: &Value, sink: &mut S) -> Result<(), BjdataError> {
        self.depth = 0;
        self.active.clear();
        let result = self.value(value, sink);
        if let Err(err) = &result {
            debug!(code = ?err.code, "bjdata encode failed");
        }
        result
    }

    fn enter(&mut self) -> Result<(), BjdataError> {
        if self.depth >= self.opts.max_depth {
            return Err(BjdataError::encode(ErrorCode::ExcessiveNestingDepth));
        }
        self.depth += 1;
        Ok(())
    }

    fn value<S: Sink>(&mut self, value: &Value, sink: &mut S) -> Result<(), BjdataError> {
        let endian = self.opts.endian;
        match value {
            Value::Null => sink.write_u8(Marker::Null.as_byte()),
            Value::Bool(true) => sink.write_u8(Marker::True.as_byte()),
            Value::Bool(false) => sink.write_u8(Marker::False.as_byte()),
            Value::Int8(v) => self.int(i128::from(*v), sink),
            Value::UInt8(v) => self.int(i128::from(*v), sink),
            Value::Int16(v) => self.int(i128::from(*v), sink),
            Value::UInt16(v) => self.int(i128::from(*v), sink),
            Value::Int32(v) => self.int(i128::from(*v), sink),
            Value::UInt32(v) => self.int(i128::from(*v), sink),
            Value::Int64(v) => self.int(i128::from(*v), sink),
            Value::UInt64(v) => self.int(i128::from(*v), sink),
            Value::Float16(v) => {
                sink.write_u8(Marker::Float16.as_byte())?;
                sink.write_packed(&[*v], endian)
            }
            Value::Float32(v) => self.float(f64::from(*v), sink),
            Value::Float64(v) => self.float(*v, sink),
            Value::HighPrecision(hp) => self.high_precision(hp, sink),
            Value::Char(c) => self.char(*c, sink),
            Value::String(s) => self.string(s, sink),
            Value::Bytes(bytes) => self.bytes(bytes, sink),
            Value::TypedArray(t) => self.typed_array(t, sink),
            Value::Array(items) => {
                self.enter()?;
                self.array(items, sink)?;
                self.depth -= 1;
                Ok(())
            }
            Value::Object(map) => {
                self.enter()?;
                self.object(map, sink)?;
                self.depth -= 1;
                Ok(())
            }
            Value::Shared(node) => {
                let id = node.id();
                if self.active.contains(&id) {
                    return Err(BjdataError::encode(ErrorCode::CircularReference));
                }
                self.enter()?;
                self.active.push(id);
                let inner = node.read();
                self.value(&inner, sink)?;
                drop(inner);
                self.active.pop();
                self.depth -= 1;
                Ok(())
            }
            Value::Extension(ext) => {
                let resolved = self
                    .opts
                    .default_hook
                    .as_ref()
                    .and_then(|hook| hook(ext))
                    .ok_or(BjdataError::encode(ErrorCode::Unencodable))?;
                self.enter()?;
                self.value(&resolved, sink)?;
                self.depth -= 1;
                Ok(())
            }
        }
    }

    fn int<S: Sink>(&self, v: i128, sink: &mut S) -> Result<(), BjdataError> {
        match int::narrow(v) {
            Some(repr) => self.int_repr(repr, sink),
            None => self.high_precision(&HighPrecision::from_i128(v), sink),
        }
    }

    fn int_repr<S: Sink>(&self, repr: IntRepr, sink: &mut S) -> Result<(), BjdataError> {
        let e = self.opts.endian;
        sink.write_u8(repr.marker().as_byte())?;
        match repr {
            IntRepr::I8(x) => sink.write_packed(&[x], e),
            IntRepr::U8(x) => sink.write_packed(&[x], e),
            IntRepr::I16(x) => sink.write_packed(&[x], e),
            IntRepr::U16(x) => sink.write_packed(&[x], e),
            IntRepr::I32(x) => sink.write_packed(&[x], e),
            IntRepr::U32(x) => sink.write_packed(&[x], e),
            IntRepr::I64(x) => sink.write_packed(&[x], e),
            IntRepr::U64(x) => sink.write_packed(&[x], e),
        }
    }

    /// Length prefix, count header, or dimension entry.
    fn length<S: Sink>(&self, len: usize, sink: &mut S) -> Result<(), BjdataError> {
        let len = u64::try_from(len).map_err(|_| BjdataError::encode(ErrorCode::LengthOverflow))?;
        self.int_repr(int::narrow_unsigned(len), sink)
    }

    fn float<S: Sink>(&self, v: f64, sink: &mut S) -> Result<(), BjdataError> {
        let e = self.opts.endian;
        match float::select(v, !self.opts.no_float32) {
            FloatRepr::Null => sink.write_u8(Marker::Null.as_byte()),
            FloatRepr::Float32(x) => {
                sink.write_u8(Marker::Float32.as_byte())?;
                sink.write_packed(&[x], e)
            }
            FloatRepr::Float64(x) => {
                sink.write_u8(Marker::Float64.as_byte())?;
                sink.write_packed(&[x], e)
            }
            FloatRepr::HighPrecision(hp) => self.high_precision(&hp, sink),
        }
    }

    fn high_precision<S: Sink>(&self, hp: &HighPrecision, sink: &mut S) -> Result<(), BjdataError> {
        if !hp.is_finite() {
            return sink.write_u8(Marker::Null.as_byte());
        }
        sink.write_u8(Marker::HighPrecision.as_byte())?;
        self.text(hp.as_str(), sink)
    }

    fn text<S: Sink>(&self, s: &str, sink: &mut S) -> Result<(), BjdataError> {
        self.length(s.len(), sink)?;
        sink.write(s.as_bytes())
    }

    fn char<S: Sink>(&self, c: char, sink: &mut S) -> Result<(), BjdataError> {
        if c.is_ascii() {
            let mut buf = [0u8; 1];
            c.encode_utf8(&mut buf);
            return sink.write(&[Marker::Char.as_byte(), buf[0]]);
        }
        let mut buf = [0u8; 4];
        self.string(c.encode_utf8(&mut buf), sink)
    }

    fn string<S: Sink>(&self, s: &str, sink: &mut S) -> Result<(), BjdataError> {
        if let [b] = s.as_bytes() {
            return sink.write(&[Marker::Char.as_byte(), *b]);
        }
        sink.write_u8(Marker::String.as_byte())?;
        self.text(s, sink)
    }

    fn bytes<S: Sink>(&self, bytes: &[u8], sink: &mut S) -> Result<(), BjdataError> {
        trace!(len = bytes.len(), "byte buffer");
        sink.write(&[
            Marker::ArrayStart.as_byte(),
            Marker::ContainerType.as_byte(),
            Marker::UInt8.as_byte(),
            Marker::ContainerCount.as_byte(),
        ])?;
        self.length(bytes.len(), sink)?;
        sink.write(bytes)
    }

    fn typed_array<S: Sink>(&self, t: &TypedArray, sink: &mut S) -> Result<(), BjdataError> {
        let e = self.opts.endian;
        trace!(elem = ?t.element_type(), shape = ?t.shape(), "packed payload");
        sink.write(&[
            Marker::ArrayStart.as_byte(),
            Marker::ContainerType.as_byte(),
            t.element_type().marker().as_byte(),
            Marker::ContainerCount.as_byte(),
        ])?;
        match t.shape() {
            [len] => self.length(*len, sink)?,
            dims => self.dims(dims, sink)?,
        }
        match t.data() {
            TypedData::Char(v) | TypedData::UInt8(v) => sink.write(v),
            data => each_typed!(data, v => sink.write_packed(v, e)),
        }
    }

    fn dims<S: Sink>(&self, dims: &[usize], sink: &mut S) -> Result<(), BjdataError> {
        sink.write_u8(Marker::ArrayStart.as_byte())?;
        if self.opts.container_count {
            sink.write_u8(Marker::ContainerCount.as_byte())?;
            self.length(dims.len(), sink)?;
        }
        for &d in dims {
            self.length(d, sink)?;
        }
        if !self.opts.container_count {
            sink.write_u8(Marker::ArrayEnd.as_byte())?;
        }
        Ok(())
    }

    fn array<S: Sink>(&mut self, items: &[Value], sink: &mut S) -> Result<(), BjdataError> {
        sink.write_u8(Marker::ArrayStart.as_byte())?;
        if self.opts.container_count {
            sink.write_u8(Marker::ContainerCount.as_byte())?;
            self.length(items.len(), sink)?;
        }
        for item in items {
            self.value(item, sink)?;
        }
        if !self.opts.container_count {
            sink.write_u8(Marker::ArrayEnd.as_byte())?;
        }
        Ok(())
    }

    fn object<S: Sink>(&mut self, map: &Object, sink: &mut S) -> Result<(), BjdataError> {
        sink.write_u8(Marker::ObjectStart.as_byte())?;
        if self.opts.container_count {
            sink.write_u8(Marker::ContainerCount.as_byte())?;
            self.length(map.len(), sink)?;
        }
        if self.opts.sort_keys {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (k, v) in entries {
                self.text(k, sink)?;
                self.value(v, sink)?;
            }
        } else {
            for (k, v) in map {
                self.text(k, sink)?;
                self.value(v, sink)?;
            }
        }
        if !self.opts.container_count {
            sink.write_u8(Marker::ObjectEnd.as_byte())?;
        }
        Ok(())
    }
}

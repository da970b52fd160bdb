use core::any::Any;
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::int::{self, IntRepr};
use crate::marker::ElementType;
use crate::scalar::{HighPrecision, F16};
use crate::{BjdataError, ErrorCode};

/// A BJData object: string keys in insertion order.
///
/// Keys are `Arc<str>` so that a decoder with key interning enabled can share one
/// allocation between repeated keys.
pub type Object = IndexMap<Arc<str>, Value>;

/// A dynamically typed BJData value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `Z`
    Null,
    /// `T` / `F`
    Bool(bool),
    /// `i`
    Int8(i8),
    /// `U`
    UInt8(u8),
    /// `I`
    Int16(i16),
    /// `u`
    UInt16(u16),
    /// `l`
    Int32(i32),
    /// `m`
    UInt32(u32),
    /// `L`
    Int64(i64),
    /// `M`
    UInt64(u64),
    /// `h`
    Float16(F16),
    /// `d`
    Float32(f32),
    /// `D`
    Float64(f64),
    /// `H`
    HighPrecision(HighPrecision),
    /// `C`
    Char(char),
    /// `S`
    String(String),
    /// Opaque bytes, the `[$U#n` byte-buffer form.
    Bytes(Vec<u8>),
    /// Packed homogeneous numbers with a shape.
    TypedArray(TypedArray),
    /// `[ ... ]`
    Array(Vec<Value>),
    /// `{ ... }`
    Object(Object),
    /// A shared, mutable node of a value graph. Never produced by the decoder.
    Shared(SharedValue),
    /// An application value with no BJData representation. Never produced by the decoder.
    Extension(Extension),
}

impl Value {
    /// Construct a byte buffer.
    #[must_use]
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Construct an array.
    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// Construct an object from key/value pairs (later duplicates replace earlier values).
    #[must_use]
    pub fn object<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (Arc::from(k.as_ref()), v))
                .collect(),
        )
    }

    /// Wrap a value in a new shared node.
    #[must_use]
    pub fn shared(value: Self) -> Self {
        Self::Shared(SharedValue::new(value))
    }

    /// Wrap an application value for resolution by the encoder's `default` hook.
    #[must_use]
    pub fn extension<T: Any + Send + Sync>(value: T) -> Self {
        Self::Extension(Extension::new(value))
    }

    /// The narrowest integer variant holding `v`, or a high-precision decimal.
    #[must_use]
    pub fn from_i128(v: i128) -> Self {
        int::narrow(v).map_or_else(
            || Self::HighPrecision(HighPrecision::from_i128(v)),
            Self::from_int_repr,
        )
    }

    /// The narrowest unsigned variant holding `v`, or a high-precision decimal.
    #[must_use]
    pub fn from_u128(v: u128) -> Self {
        u64::try_from(v).map_or_else(
            |_| Self::HighPrecision(HighPrecision::from_u128(v)),
            |u| Self::from_int_repr(int::narrow_unsigned(u)),
        )
    }

    pub(crate) const fn from_int_repr(repr: IntRepr) -> Self {
        match repr {
            IntRepr::I8(x) => Self::Int8(x),
            IntRepr::U8(x) => Self::UInt8(x),
            IntRepr::I16(x) => Self::Int16(x),
            IntRepr::U16(x) => Self::UInt16(x),
            IntRepr::I32(x) => Self::Int32(x),
            IntRepr::U32(x) => Self::UInt32(x),
            IntRepr::I64(x) => Self::Int64(x),
            IntRepr::U64(x) => Self::UInt64(x),
        }
    }

    /// Returns `true` for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer value regardless of width.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::Int8(v) => Some(i128::from(v)),
            Self::UInt8(v) => Some(i128::from(v)),
            Self::Int16(v) => Some(i128::from(v)),
            Self::UInt16(v) => Some(i128::from(v)),
            Self::Int32(v) => Some(i128::from(v)),
            Self::UInt32(v) => Some(i128::from(v)),
            Self::Int64(v) => Some(i128::from(v)),
            Self::UInt64(v) => Some(i128::from(v)),
            _ => None,
        }
    }

    /// Float value regardless of precision.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float16(v) => Some(v.to_f64()),
            Self::Float32(v) => Some(f64::from(v)),
            Self::Float64(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the text of a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the bytes of a byte buffer.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the items of an `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the entries of an `Object`.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow a `TypedArray`.
    #[must_use]
    pub const fn as_typed_array(&self) -> Option<&TypedArray> {
        match self {
            Self::TypedArray(t) => Some(t),
            _ => None,
        }
    }

    /// Look up an object entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_object().and_then(|map| map.get(key))
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    F16 => Float16,
    f32 => Float32,
    f64 => Float64,
    HighPrecision => HighPrecision,
    char => Char,
    String => String,
    TypedArray => TypedArray,
    Vec<Value> => Array,
    Object => Object,
    SharedValue => Shared,
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Self::from_i128(v)
    }
}

impl From<u128> for Value {
    fn from(v: u128) -> Self {
        Self::from_u128(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

/// Element storage of a [`TypedArray`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypedData {
    /// `i`
    Int8(Vec<i8>),
    /// `U`
    UInt8(Vec<u8>),
    /// `I`
    Int16(Vec<i16>),
    /// `u`
    UInt16(Vec<u16>),
    /// `l`
    Int32(Vec<i32>),
    /// `m`
    UInt32(Vec<u32>),
    /// `L`
    Int64(Vec<i64>),
    /// `M`
    UInt64(Vec<u64>),
    /// `h`
    Float16(Vec<F16>),
    /// `d`
    Float32(Vec<f32>),
    /// `D`
    Float64(Vec<f64>),
    /// `C`, one ASCII byte per element.
    Char(Vec<u8>),
}

macro_rules! each_typed {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            TypedData::Int8($v) => $body,
            TypedData::UInt8($v) => $body,
            TypedData::Int16($v) => $body,
            TypedData::UInt16($v) => $body,
            TypedData::Int32($v) => $body,
            TypedData::UInt32($v) => $body,
            TypedData::Int64($v) => $body,
            TypedData::UInt64($v) => $body,
            TypedData::Float16($v) => $body,
            TypedData::Float32($v) => $body,
            TypedData::Float64($v) => $body,
            TypedData::Char($v) => $body,
        }
    };
}

pub(crate) use each_typed;

impl TypedData {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        each_typed!(self, v => v.len())
    }

    /// Returns `true` if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Int8(_) => ElementType::Int8,
            Self::UInt8(_) => ElementType::UInt8,
            Self::Int16(_) => ElementType::Int16,
            Self::UInt16(_) => ElementType::UInt16,
            Self::Int32(_) => ElementType::Int32,
            Self::UInt32(_) => ElementType::UInt32,
            Self::Int64(_) => ElementType::Int64,
            Self::UInt64(_) => ElementType::UInt64,
            Self::Float16(_) => ElementType::Float16,
            Self::Float32(_) => ElementType::Float32,
            Self::Float64(_) => ElementType::Float64,
            Self::Char(_) => ElementType::Char,
        }
    }

    /// Expand every element into a scalar [`Value`].
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            Self::Char(v) => v.iter().map(|&b| Value::Char(char::from(b))).collect(),
            other => each_typed!(other, v => v.iter().map(|&x| Value::from(x)).collect()),
        }
    }
}

/// A packed homogeneous numeric array with a row-major shape.
///
/// Invariants: `shape` is non-empty and its product equals the element count; `Char`
/// elements are ASCII.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray {
    data: TypedData,
    shape: Vec<usize>,
}

impl TypedArray {
    /// Construct a shaped array.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `shape` is empty or does not match the element count, and
    /// `InvalidUtf8` if `Char` data contains non-ASCII bytes.
    pub fn new(data: TypedData, shape: Vec<usize>) -> Result<Self, BjdataError> {
        let product = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| BjdataError::validate(ErrorCode::InvalidShape))?;
        if shape.is_empty() || product != data.len() {
            return Err(BjdataError::validate(ErrorCode::InvalidShape));
        }
        if let TypedData::Char(bytes) = &data {
            if !bytes.is_ascii() {
                return Err(BjdataError::validate(ErrorCode::InvalidUtf8));
            }
        }
        Ok(Self { data, shape })
    }

    /// Construct a rank-1 array.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtf8` if `Char` data contains non-ASCII bytes.
    pub fn vector(data: TypedData) -> Result<Self, BjdataError> {
        let len = data.len();
        Self::new(data, vec![len])
    }

    /// Element storage.
    #[must_use]
    pub const fn data(&self) -> &TypedData {
        &self.data
    }

    /// Dimension sizes, outermost first.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// The element type.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// Split into storage and shape.
    #[must_use]
    pub fn into_parts(self) -> (TypedData, Vec<usize>) {
        (self.data, self.shape)
    }

    /// Expand into nested `Value::Array`s following the shape.
    #[must_use]
    pub fn to_nested(&self) -> Value {
        nest_row_major(self.data.to_values(), &self.shape)
    }
}

/// Group a flat row-major element list into nested arrays of the given shape.
pub(crate) fn nest_row_major(items: Vec<Value>, shape: &[usize]) -> Value {
    match shape.split_first() {
        Some((&outer, inner)) if !inner.is_empty() => {
            let stride: usize = inner.iter().product();
            let mut rest = items.into_iter();
            let rows = (0..outer)
                .map(|_| nest_row_major(rest.by_ref().take(stride).collect(), inner))
                .collect();
            Value::Array(rows)
        }
        _ => Value::Array(items),
    }
}

/// A shared, interior-mutable node of a value graph.
///
/// Clones share the node. The encoder uses the node's identity to tell a DAG (the same node
/// reached along two paths, encoded twice) from a cycle (a node reached again while it is
/// still being encoded, rejected with `CircularReference`).
#[derive(Clone)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    /// Wrap a value in a new node.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Read the node's value.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the node's value.
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedValue({:#x})", self.id())
    }
}

/// An application value carried through a value graph.
#[derive(Clone)]
pub struct Extension {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Extension {
    /// Wrap an application value.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Borrow the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Rust type name of the wrapped value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extension({})", self.type_name)
    }
}

/// Semantic equality under the codec's round-trip rules.
///
/// Unlike `==`, this compares integers by value regardless of width, floats by value
/// regardless of precision, a one-character `String` equal to the matching `Char`, a
/// `TypedArray` equal to its nested-array form (so an empty packed array equals `[]`) and a
/// rank-1 `UInt8` array equal to the same `Bytes`, objects without regard to key order, and
/// looks through shared nodes.
#[must_use]
pub fn bjdata_equal(a: &Value, b: &Value) -> bool {
    if let Value::Shared(x) = a {
        if let Value::Shared(y) = b {
            if x.ptr_eq(y) {
                return true;
            }
        }
        return bjdata_equal(&x.read(), b);
    }
    if let Value::Shared(y) = b {
        return bjdata_equal(a, &y.read());
    }

    if let (Some(x), Some(y)) = (a.as_i128(), b.as_i128()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y || (x.is_nan() && y.is_nan());
    }

    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| bjdata_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(&**k).is_some_and(|w| bjdata_equal(v, w)))
        }
        (Value::Char(c), Value::String(s)) | (Value::String(s), Value::Char(c)) => {
            let mut buf = [0u8; 4];
            s.as_str() == c.encode_utf8(&mut buf)
        }
        (Value::TypedArray(t), other @ Value::Array(_))
        | (other @ Value::Array(_), Value::TypedArray(t)) => bjdata_equal(&t.to_nested(), other),
        (Value::TypedArray(t), Value::Bytes(bytes)) | (Value::Bytes(bytes), Value::TypedArray(t)) => {
            t.rank() == 1 && matches!(t.data(), TypedData::UInt8(v) if v == bytes)
        }
        _ => a == b,
    }
}

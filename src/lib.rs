//! # bjdata
//!
//! A byte-exact encoder and an offset-reporting decoder for **BJData** (Binary JData, Draft 2)
//! and its big-endian ancestor **UBJSON**.
//!
//! ## Design principles
//!
//! - **One value per call.**
//!   [`decode`] reads exactly one top-level value and ignores anything after it; use
//!   [`decode_from_source`] repeatedly to walk a stream of concatenated documents.
//! - **Narrowest faithful encoding.**
//!   [`encode`] picks the smallest integer width that holds each value, float32 only when it is
//!   bit-exact (and enabled), and a high-precision decimal when nothing native fits.
//! - **Attacker-controlled counts are bounded.**
//!   Every declared count and length is checked against [`DecodeLimits`] before it sizes an
//!   allocation, and preallocation is capped regardless.
//!
//! ## Format summary
//!
//! - Every value starts with a one-byte marker (see [`Marker`]). Object keys are the exception:
//!   they are a bare length-prefixed string.
//! - Integer and float payloads are fixed width in the configured [`Endian`]ness (little-endian
//!   for BJData Draft 2, big-endian for UBJSON).
//! - Containers may carry a `$type` and/or `#count` header. A typed container always has a
//!   count, and a count may be a dimension array (`#[3 2]`) describing an N-d [`TypedArray`].
//! - `[$U#n` is a byte buffer and decodes to [`Value::Bytes`] unless
//!   [`DecodeOptions::no_bytes`] is set.
//!
//! ## Value graphs
//!
//! [`Value::Shared`] nodes let callers build DAGs and cycles. The encoder writes a node reached
//! twice as two independent copies and rejects a node that contains itself with
//! [`ErrorCode::CircularReference`]. [`Value::Extension`] carries application values that are
//! resolved through [`EncodeOptions::default_hook`]. Shared nodes count toward the encoder's
//! nesting limit like containers do.
//!
//! On the decode side, [`DecodeOptions::object_hook`] and
//! [`DecodeOptions::object_pairs_hook`] replace each decoded object with a value of the
//! caller's choosing.
//!
//! ## Feature flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`Value`].
//! - `simdutf8`: validates text payloads with the SIMD validator instead of `String::from_utf8`.
//! - `cli`: builds the `bjdata` JSON converter binary.
//!
//! ## Safety
//!
//! This crate forbids `unsafe` code.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod alloc_util;
mod decode;
mod encode;
mod error;
mod float;
mod int;
mod limits;
mod marker;
mod options;
mod scalar;
#[cfg(feature = "serde")]
mod serde_impl;
mod stream;
mod utf8;
mod value;
mod wire;

pub use crate::decode::{decode, decode_from, decode_from_source, Decoder};
pub use crate::encode::{encode, encode_to, Encoder};
pub use crate::error::{BjdataError, ErrorCode, ErrorKind};
pub use crate::limits::{
    DecodeLimits, DEFAULT_MAX_CONTAINER_LEN, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAYLOAD_LEN,
};
pub use crate::marker::{ElementType, Marker};
pub use crate::options::{DecodeOptions, DefaultHook, EncodeOptions, ObjectHook, ObjectPairsHook};
pub use crate::scalar::{HighPrecision, F16};
pub use crate::stream::{ReadSource, SliceSource, Source};
pub use crate::value::{bjdata_equal, Extension, Object, SharedValue, TypedArray, TypedData, Value};
pub use crate::wire::Endian;

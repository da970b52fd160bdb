use core::fmt;
use std::sync::Arc;

use crate::limits::{DecodeLimits, DEFAULT_MAX_DEPTH};
use crate::value::{Extension, Object, Value};
use crate::wire::Endian;

/// Replaces every decoded object with the hook's result.
pub type ObjectHook = Arc<dyn Fn(Object) -> Value + Send + Sync>;

/// Receives every decoded object as its raw key/value pairs, in stream order and with
/// duplicate keys kept, and replaces it with the hook's result.
pub type ObjectPairsHook = Arc<dyn Fn(Vec<(Arc<str>, Value)>) -> Value + Send + Sync>;

/// Decoder configuration.
#[derive(Clone, Default)]
pub struct DecodeOptions {
    /// Decode `[$U#n` as a `TypedArray` of `UInt8` instead of [`Value::Bytes`].
    pub no_bytes: bool,
    /// Share one allocation between identical object keys within a single decode call.
    pub intern_keys: bool,
    /// Payload byte order.
    pub endian: Endian,
    /// Resource limits.
    pub limits: DecodeLimits,
    /// Called with each decoded object, innermost first.
    pub object_hook: Option<ObjectHook>,
    /// Called with each decoded object's pairs instead of building a map. Takes precedence
    /// over [`DecodeOptions::object_hook`].
    pub object_pairs_hook: Option<ObjectPairsHook>,
}

impl DecodeOptions {
    /// Set [`DecodeOptions::no_bytes`].
    #[must_use]
    pub const fn with_no_bytes(mut self, no_bytes: bool) -> Self {
        self.no_bytes = no_bytes;
        self
    }

    /// Set [`DecodeOptions::intern_keys`].
    #[must_use]
    pub const fn with_intern_keys(mut self, intern_keys: bool) -> Self {
        self.intern_keys = intern_keys;
        self
    }

    /// Set [`DecodeOptions::endian`].
    #[must_use]
    pub const fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Set [`DecodeOptions::limits`].
    #[must_use]
    pub const fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Install an object hook.
    #[must_use]
    pub fn with_object_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Object) -> Value + Send + Sync + 'static,
    {
        self.object_hook = Some(Arc::new(hook));
        self
    }

    /// Install an object-pairs hook.
    #[must_use]
    pub fn with_object_pairs_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<(Arc<str>, Value)>) -> Value + Send + Sync + 'static,
    {
        self.object_pairs_hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("no_bytes", &self.no_bytes)
            .field("intern_keys", &self.intern_keys)
            .field("endian", &self.endian)
            .field("limits", &self.limits)
            .field("object_hook", &self.object_hook.is_some())
            .field("object_pairs_hook", &self.object_pairs_hook.is_some())
            .finish()
    }
}

/// Resolves an [`Extension`] into an encodable value, or `None` if it has no representation.
pub type DefaultHook = Arc<dyn Fn(&Extension) -> Option<Value> + Send + Sync>;

/// Encoder configuration.
#[derive(Clone)]
pub struct EncodeOptions {
    /// Emit object entries in ascending key order.
    pub sort_keys: bool,
    /// Emit a `#` count header on every array and object (the terminator is then omitted).
    pub container_count: bool,
    /// Never use float32 for non-zero floats.
    pub no_float32: bool,
    /// Payload byte order.
    pub endian: Endian,
    /// Maximum container nesting depth.
    pub max_depth: usize,
    /// Called for [`Value::Extension`]; its result is encoded in place of the extension.
    pub default_hook: Option<DefaultHook>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            sort_keys: false,
            container_count: false,
            no_float32: true,
            endian: Endian::Little,
            max_depth: DEFAULT_MAX_DEPTH,
            default_hook: None,
        }
    }
}

impl EncodeOptions {
    /// Set [`EncodeOptions::sort_keys`].
    #[must_use]
    pub const fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    /// Set [`EncodeOptions::container_count`].
    #[must_use]
    pub const fn with_container_count(mut self, container_count: bool) -> Self {
        self.container_count = container_count;
        self
    }

    /// Set [`EncodeOptions::no_float32`].
    #[must_use]
    pub const fn with_no_float32(mut self, no_float32: bool) -> Self {
        self.no_float32 = no_float32;
        self
    }

    /// Set [`EncodeOptions::endian`].
    #[must_use]
    pub const fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Set [`EncodeOptions::max_depth`].
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Install a `default` hook.
    #[must_use]
    pub fn with_default_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Extension) -> Option<Value> + Send + Sync + 'static,
    {
        self.default_hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for EncodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeOptions")
            .field("sort_keys", &self.sort_keys)
            .field("container_count", &self.container_count)
            .field("no_float32", &self.no_float32)
            .field("endian", &self.endian)
            .field("max_depth", &self.max_depth)
            .field("default_hook", &self.default_hook.is_some())
            .finish()
    }
}

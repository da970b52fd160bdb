/// Default maximum container nesting depth, shared by the decoder and the encoder.
///
/// Both sides recurse once per nested container, so this also bounds stack usage.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default maximum element count of a single array or object.
pub const DEFAULT_MAX_CONTAINER_LEN: usize = 1 << 24;

/// Default maximum byte length of a single string, decimal, key, or packed payload.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1 << 31;

/// Decode-time resource limits.
///
/// Counts and lengths in a BJData stream are attacker-controlled; these limits are checked
/// before any allocation sized by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum nesting depth (dimension arrays count as one level).
    pub max_depth: usize,
    /// Maximum declared or observed element count of one container.
    pub max_container_len: usize,
    /// Maximum byte length of one length-prefixed or packed payload.
    pub max_payload_len: usize,
}

impl DecodeLimits {
    /// Construct limits derived from a maximum message size.
    ///
    /// No container can hold more elements than the message has bytes, except no-data
    /// containers (`[$Z#...`), which this caps as well.
    #[must_use]
    pub fn for_bytes(max_message_bytes: usize) -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_container_len: max_message_bytes.min(DEFAULT_MAX_CONTAINER_LEN),
            max_payload_len: max_message_bytes,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_container_len: DEFAULT_MAX_CONTAINER_LEN,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

use crate::scalar::F16;

/// Byte order of every integer and float payload in a stream.
///
/// BJData Draft 2 is little-endian; UBJSON and BJData Draft 1 are big-endian. The stream
/// does not record which one was used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Little-endian (BJData Draft 2).
    #[default]
    Little,
    /// Big-endian (UBJSON, BJData Draft 1).
    Big,
}

/// A fixed-width numeric payload.
pub trait Packed: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decode from exactly `WIDTH` bytes.
    fn unpack(bytes: &[u8], endian: Endian) -> Self;

    /// Append the `WIDTH`-byte encoding to `out`.
    fn pack(self, endian: Endian, out: &mut Vec<u8>);
}

macro_rules! impl_packed {
    ($($ty:ty => $n:expr),* $(,)?) => {
        $(
            impl Packed for $ty {
                const WIDTH: usize = $n;

                #[inline]
                fn unpack(bytes: &[u8], endian: Endian) -> Self {
                    let mut raw = [0u8; $n];
                    raw.copy_from_slice(&bytes[..$n]);
                    match endian {
                        Endian::Little => <$ty>::from_le_bytes(raw),
                        Endian::Big => <$ty>::from_be_bytes(raw),
                    }
                }

                #[inline]
                fn pack(self, endian: Endian, out: &mut Vec<u8>) {
                    match endian {
                        Endian::Little => out.extend_from_slice(&self.to_le_bytes()),
                        Endian::Big => out.extend_from_slice(&self.to_be_bytes()),
                    }
                }
            }
        )*
    };
}

impl_packed! {
    i8 => 1,
    u8 => 1,
    i16 => 2,
    u16 => 2,
    i32 => 4,
    u32 => 4,
    i64 => 8,
    u64 => 8,
    f32 => 4,
    f64 => 8,
}

impl Packed for F16 {
    const WIDTH: usize = 2;

    #[inline]
    fn unpack(bytes: &[u8], endian: Endian) -> Self {
        Self::from_bits(u16::unpack(bytes, endian))
    }

    #[inline]
    fn pack(self, endian: Endian, out: &mut Vec<u8>) {
        self.to_bits().pack(endian, out);
    }
}

/// Decode a packed buffer whose length is a multiple of `T::WIDTH`.
pub fn unpack_all<T: Packed>(raw: &[u8], endian: Endian) -> Vec<T> {
    raw.chunks_exact(T::WIDTH)
        .map(|chunk| T::unpack(chunk, endian))
        .collect()
}

/// Encode a slice of elements as one contiguous packed buffer.
///
/// Callers reserve `items.len() * T::WIDTH` bytes up front.
pub fn pack_all<T: Packed>(items: &[T], endian: Endian, out: &mut Vec<u8>) {
    for &item in items {
        item.pack(endian, out);
    }
}

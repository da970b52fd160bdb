use core::alloc::Layout;

use crate::{BjdataError, ErrorCode};

/// Make room for `additional` more elements, reporting failure as a decode error at `offset`.
fn grow<T>(
    v: &mut Vec<T>,
    additional: usize,
    exact: bool,
    offset: Option<u64>,
) -> Result<(), BjdataError> {
    let overflow = || BjdataError::decode(ErrorCode::LengthOverflow, offset);
    let needed = v.len().checked_add(additional).ok_or_else(overflow)?;
    if needed <= v.capacity() {
        return Ok(());
    }
    Layout::array::<T>(needed).map_err(|_| overflow())?;
    let reserved = if exact {
        v.try_reserve_exact(additional)
    } else {
        v.try_reserve(additional)
    };
    reserved.map_err(|_| BjdataError::decode(ErrorCode::AllocationFailed, offset))
}

/// Amortized growth for containers whose size is only known as elements arrive.
#[inline]
pub fn try_reserve<T>(
    v: &mut Vec<T>,
    additional: usize,
    offset: Option<u64>,
) -> Result<(), BjdataError> {
    grow(v, additional, false, offset)
}

#[inline]
pub fn try_vec_with_capacity<T>(cap: usize, offset: Option<u64>) -> Result<Vec<T>, BjdataError> {
    let mut v = Vec::new();
    grow(&mut v, cap, true, offset)?;
    Ok(v)
}

/// `n` copies of a no-data literal.
#[inline]
pub fn try_vec_repeat<T: Clone>(
    n: usize,
    value: T,
    offset: Option<u64>,
) -> Result<Vec<T>, BjdataError> {
    let mut v = try_vec_with_capacity(n, offset)?;
    v.resize(n, value);
    Ok(v)
}

/// Encoder-side reservation: failures are reported without an offset.
#[inline]
pub fn try_reserve_out(out: &mut Vec<u8>, additional: usize) -> Result<(), BjdataError> {
    out.try_reserve(additional)
        .map_err(|_| BjdataError::encode(ErrorCode::AllocationFailed))
}

#![no_std]

pub mod eth;
pub mod ip;
pub mod tcp;

/// Errors returned by the bounds-checked header views in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    OutOfBounds,
}

/// Copies `N` bytes starting at `offset` out of `buf`, failing instead of panicking
/// when the slice is too short.
#[inline]
pub fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], Error> {
    let end = offset.checked_add(N).ok_or(Error::OutOfBounds)?;
    let bytes = buf.get(offset..end).ok_or(Error::OutOfBounds)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

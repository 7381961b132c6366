//! Block alignment and little-endian integer helpers

use crate::error::{BootImgError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Round `len` up to the next multiple of `block`.
///
/// `block` must be a power of two. Zero stays zero.
pub fn align_up(len: usize, block: usize) -> usize {
    debug_assert!(block.is_power_of_two());
    (len + block - 1) & !(block - 1)
}

/// Pad `data` with zero bytes up to a multiple of `block`.
///
/// Data that already ends on a block boundary is returned unchanged, and so
/// is an empty slice: empty regions never produce a padding block.
pub fn align(data: &[u8], block: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(align_up(data.len(), block));
    out.extend_from_slice(data);
    out.resize(align_up(data.len(), block), 0);
    out
}

/// Encode `value` as 4 bytes, least significant first
pub fn write_le32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode the first 4 bytes of `bytes` as a little-endian `u32`
pub fn read_le32(bytes: &[u8]) -> Result<u32> {
    if bytes.len() < 4 {
        return Err(BootImgError::too_short(4, bytes.len()));
    }
    Ok(LittleEndian::read_u32(bytes))
}

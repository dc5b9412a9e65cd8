//! Little-endian primitive reads.
//!
//! Every reader takes the buffer and a mutable offset, advancing the offset
//! past the bytes it consumed.

use crate::error::{DecodeError, DecodeResult};

/// Take `len` bytes starting at `offset`.
pub fn read_bytes<'a>(
    data: &'a [u8],
    offset: &mut usize,
    len: usize,
    context: &'static str,
) -> DecodeResult<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or(DecodeError::UnexpectedEof { context })?;
    let bytes = &data[*offset..end];
    *offset = end;
    Ok(bytes)
}

fn read_array<const N: usize>(
    data: &[u8],
    offset: &mut usize,
    context: &'static str,
) -> DecodeResult<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(read_bytes(data, offset, N, context)?);
    Ok(out)
}

pub fn read_u8(data: &[u8], offset: &mut usize, context: &'static str) -> DecodeResult<u8> {
    Ok(read_array::<1>(data, offset, context)?[0])
}

pub fn read_u16(data: &[u8], offset: &mut usize, context: &'static str) -> DecodeResult<u16> {
    read_array(data, offset, context).map(u16::from_le_bytes)
}

pub fn read_u32(data: &[u8], offset: &mut usize, context: &'static str) -> DecodeResult<u32> {
    read_array(data, offset, context).map(u32::from_le_bytes)
}

pub fn read_f32(data: &[u8], offset: &mut usize, context: &'static str) -> DecodeResult<f32> {
    read_array(data, offset, context).map(f32::from_le_bytes)
}

pub fn read_f64(data: &[u8], offset: &mut usize, context: &'static str) -> DecodeResult<f64> {
    read_array(data, offset, context).map(f64::from_le_bytes)
}

/// Read a `u32` element count and check that `count * element_size` bytes follow.
pub fn read_count(
    data: &[u8],
    offset: &mut usize,
    element_size: usize,
    context: &'static str,
) -> DecodeResult<usize> {
    let count = read_u32(data, offset, context)? as usize;
    let expected = count
        .checked_mul(element_size)
        .ok_or(DecodeError::InvalidFormat {
            context,
            detail: format!("element count {count} overflows"),
        })?;
    let actual = data.len() - *offset;
    if actual < expected {
        return Err(DecodeError::BufferTooSmall { expected, actual });
    }
    Ok(count)
}

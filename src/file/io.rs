//! Low-level byte order and safe reading/writing utilities for metadata encoding.
//!
//! This module provides endian-aware, bounds-checked reading and writing of primitive values
//! from and to byte buffers, together with the ECMA-335 compressed integer encoding used by
//! signatures, coded indices and heap length prefixes.
//!
//! # Key Components
//!
//! - [`crate::file::io::CilIO`] - Trait defining endian-aware conversion for primitive types
//! - [`crate::file::io::read_le_at`] / [`crate::file::io::read_be_at`] - Offset-tracking reads
//! - [`crate::file::io::read_le_at_dyn`] / [`crate::file::io::write_le_at_dyn`] - 2 or 4 byte columns
//! - [`crate::file::io::write_le_at`] - Offset-tracking writes into a fixed buffer
//! - [`crate::file::io::write_compressed_uint`] / [`crate::file::io::write_compressed_int`] - Compressed encodings
//!
//! # Compressed Integers
//!
//! | Value range | Encoded size | Bit pattern of the first byte |
//! |-------------|--------------|-------------------------------|
//! | `0x00..=0x7F` | 1 byte | `0xxxxxxx` |
//! | `0x80..=0x3FFF` | 2 bytes | `10xxxxxx` |
//! | `0x4000..=0x1FFF_FFFF` | 4 bytes | `110xxxxx` |
//!
//! Multi-byte forms are big-endian with the width flag bits masked off.
//!
//! # Examples
//!
//! ```rust
//! use cilgraph::file::io::{read_le_at, write_compressed_uint};
//!
//! let data = [0x01, 0x00, 0x02, 0x00];
//! let mut offset = 0;
//! let first: u16 = read_le_at(&data, &mut offset)?;
//! let second: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!((first, second, offset), (1, 2, 4));
//!
//! let mut buffer = Vec::new();
//! write_compressed_uint(0x3FFF, &mut buffer)?;
//! assert_eq!(buffer, [0xBF, 0xFF]);
//! # Ok::<(), cilgraph::Error>(())
//! ```

use crate::Result;

/// Largest value the compressed unsigned integer encoding can carry.
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;

/// Trait for implementing type-specific safe binary data reading and writing operations.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size
/// byte array required for that particular type (e.g., `[u8; 4]` for `u32`).
pub trait CilIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Read T from a byte buffer in big-endian
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
    /// Write T to a byte buffer in big-endian
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cilio {
    ($($ty:ty => $len:expr),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_cilio!(
    u8 => 1, i8 => 1,
    u16 => 2, i16 => 2,
    u32 => 4, i32 => 4,
    u64 => 8, i64 => 8,
    f32 => 4, f64 => 8,
);

/// Safely reads a value of type `T` in little-endian byte order from a data buffer at a
/// specific offset, advancing the offset past the value.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes remaining.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = take_bytes::<T>(data, offset)?;
    Ok(T::from_le_bytes(bytes))
}

/// Safely reads a value of type `T` in big-endian byte order from a data buffer at a
/// specific offset, advancing the offset past the value.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes remaining.
pub fn read_be_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = take_bytes::<T>(data, offset)?;
    Ok(T::from_be_bytes(bytes))
}

fn take_bytes<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T::Bytes> {
    let type_len = std::mem::size_of::<T>();
    let end = offset
        .checked_add(type_len)
        .ok_or_else(|| out_of_bounds_error!())?;
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;
    Ok(read)
}

/// Reads a 2 or 4 byte little-endian column value, as used for heap and table indices.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes remaining.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    if is_large {
        read_le_at::<u32>(data, offset)
    } else {
        Ok(u32::from(read_le_at::<u16>(data, offset)?))
    }
}

/// Safely writes a value of type `T` in little-endian byte order into a buffer at a
/// specific offset, advancing the offset past the value.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too small.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_le_bytes();
    let bytes = bytes.as_ref();
    let end = offset
        .checked_add(bytes.len())
        .ok_or_else(|| out_of_bounds_error!())?;
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;
    Ok(())
}

/// Writes a 2 or 4 byte little-endian column value.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too small, or
/// [`crate::Error::Malformed`] if a value does not fit the 2 byte form.
pub fn write_le_at_dyn(data: &mut [u8], offset: &mut usize, value: u32, is_large: bool) -> Result<()> {
    if is_large {
        write_le_at(data, offset, value)
    } else {
        let narrow = u16::try_from(value)
            .map_err(|_| malformed_error!("Value {:#x} does not fit a 2 byte column", value))?;
        write_le_at(data, offset, narrow)
    }
}

/// Returns the number of bytes [`write_compressed_uint`] emits for `value`.
#[must_use]
pub fn compressed_uint_size(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        _ => 4,
    }
}

/// Appends `value` in the ECMA-335 compressed unsigned integer encoding.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> Result<()> {
    match value {
        0..=0x7F => buffer.push(value as u8),
        0x80..=0x3FFF => {
            buffer.push(0x80 | (value >> 8) as u8);
            buffer.push(value as u8);
        }
        0x4000..=MAX_COMPRESSED_UINT => {
            buffer.push(0xC0 | (value >> 24) as u8);
            buffer.push((value >> 16) as u8);
            buffer.push((value >> 8) as u8);
            buffer.push(value as u8);
        }
        _ => return Err(malformed_error!("Value {:#x} is too large to compress", value)),
    }
    Ok(())
}

/// Appends `value` in the ECMA-335 compressed signed integer encoding.
///
/// The magnitude is rotated left by one bit with the sign stored in bit 0, then truncated
/// to the 7, 14 or 29 bit payload of the chosen width.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `value` lies outside `-2^28..2^28`.
pub fn write_compressed_int(value: i32, buffer: &mut Vec<u8>) -> Result<()> {
    let (payload, width_bits) = if (-0x40..0x40).contains(&value) {
        (value, 7)
    } else if (-0x2000..0x2000).contains(&value) {
        (value, 14)
    } else if (-0x1000_0000..0x1000_0000).contains(&value) {
        (value, 29)
    } else {
        return Err(malformed_error!("Value {} is too large to compress", value));
    };

    let mask = (1u32 << width_bits) - 1;
    let rotated = (((payload as u32) << 1) | u32::from(payload < 0)) & mask;
    match width_bits {
        7 => buffer.push(rotated as u8),
        14 => {
            buffer.push(0x80 | (rotated >> 8) as u8);
            buffer.push(rotated as u8);
        }
        _ => {
            buffer.push(0xC0 | (rotated >> 24) as u8);
            buffer.push((rotated >> 16) as u8);
            buffer.push((rotated >> 8) as u8);
            buffer.push(rotated as u8);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_le_sequential() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
        let mut offset = 0;

        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 1);
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 2);
        assert_eq!(read_le_at::<u32>(&data, &mut offset).unwrap(), 3);
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_be() {
        let data = [0x00, 0x00, 0x00, 0x01];
        let mut offset = 0;
        assert_eq!(read_be_at::<u32>(&data, &mut offset).unwrap(), 1);
    }

    #[test]
    fn read_out_of_bounds() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 0;
        assert!(matches!(
            read_le_at::<u32>(&data, &mut offset),
            Err(crate::Error::OutOfBounds { .. })
        ));
        assert_eq!(offset, 0);
    }

    #[test]
    fn dyn_columns() {
        let mut data = [0u8; 6];
        let mut offset = 0;
        write_le_at_dyn(&mut data, &mut offset, 1, false).unwrap();
        write_le_at_dyn(&mut data, &mut offset, 0x0102_0304, true).unwrap();
        assert_eq!(data, [0x01, 0x00, 0x04, 0x03, 0x02, 0x01]);

        offset = 0;
        assert_eq!(read_le_at_dyn(&data, &mut offset, false).unwrap(), 1);
        assert_eq!(read_le_at_dyn(&data, &mut offset, true).unwrap(), 0x0102_0304);

        let mut offset = 0;
        assert!(write_le_at_dyn(&mut data, &mut offset, 0x10000, false).is_err());
    }

    #[test]
    fn write_le_floats() {
        let mut data = [0u8; 4];
        let mut offset = 0;
        write_le_at(&mut data, &mut offset, 1.0f32).unwrap();
        assert_eq!(data, [0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn compressed_uint_widths() {
        let cases: [(u32, &[u8]); 6] = [
            (0x03, &[0x03]),
            (0x7F, &[0x7F]),
            (0x80, &[0x80, 0x80]),
            (0x2E57, &[0xAE, 0x57]),
            (0x4000, &[0xC0, 0x00, 0x40, 0x00]),
            (0x1FFF_FFFF, &[0xDF, 0xFF, 0xFF, 0xFF]),
        ];

        for (value, expected) in cases {
            let mut buffer = Vec::new();
            write_compressed_uint(value, &mut buffer).unwrap();
            assert_eq!(buffer, expected, "value {value:#x}");
            assert_eq!(compressed_uint_size(value), expected.len());
        }

        assert!(write_compressed_uint(0x2000_0000, &mut Vec::new()).is_err());
    }

    #[test]
    fn compressed_int_ecma_samples() {
        let cases: [(i32, &[u8]); 8] = [
            (3, &[0x06]),
            (-3, &[0x7B]),
            (64, &[0x80, 0x80]),
            (-64, &[0x01]),
            (8192, &[0xC0, 0x00, 0x40, 0x00]),
            (-8192, &[0x80, 0x01]),
            (268_435_455, &[0xDF, 0xFF, 0xFF, 0xFE]),
            (-268_435_456, &[0xC0, 0x00, 0x00, 0x01]),
        ];

        for (value, expected) in cases {
            let mut buffer = Vec::new();
            write_compressed_int(value, &mut buffer).unwrap();
            assert_eq!(buffer, expected, "value {value}");
        }
    }
}

//! Bounds-checked read cursor shared by every decoder in the crate.
//!
//! Signature blobs, method bodies, heap entries and table rows are all read through
//! [`Parser`]. Reads are checked against the end of the slice; a failed read returns
//! [`crate::Error::OutOfBounds`] and leaves the cursor where it was.
//!
//! Besides fixed-width little/big-endian primitives the cursor understands the ECMA-335
//! compressed integers (1, 2 or 4 bytes, chosen by the high bits of the first byte)
//! and the nullable ser-string used by custom attribute blobs.
//!
//! ```rust
//! use cilgraph::Parser;
//!
//! // compressed 0x3FFF, then a little-endian u16
//! let blob = [0xBF, 0xFF, 0x34, 0x12];
//! let mut parser = Parser::new(&blob);
//!
//! assert_eq!(parser.read_compressed_uint()?, 0x3FFF);
//! assert_eq!(parser.peek_byte()?, 0x34);
//! assert_eq!(parser.read_le::<u16>()?, 0x1234);
//! assert!(!parser.has_more_data());
//! # Ok::<(), cilgraph::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, read_le_at, CilIO},
    Result,
};

/// Read cursor over a borrowed byte slice.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the total length of the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if there is at least one more byte to read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the cursor to an absolute position. Seeking to the end of the data is allowed.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is past the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the step would pass the end of the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self.calc_end_position(step)?;
        self.position = end;
        Ok(())
    }

    /// Returns the current cursor position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the complete underlying data.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the byte under the cursor without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or_else(|| out_of_bounds_error!())
    }

    /// Peek at a little-endian value without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value does not fit the remaining data.
    pub fn peek_le<T: CilIO>(&self) -> Result<T> {
        let mut position = self.position;
        read_le_at::<T>(self.data, &mut position)
    }

    /// Move the cursor forward to the next multiple of `alignment`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the aligned position is past the end of the data.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        if self.position + padding > self.data.len() {
            return Err(out_of_bounds_error!());
        }
        self.position += padding;
        Ok(())
    }

    /// Read a little-endian value and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value does not fit the remaining data.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a big-endian value and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value does not fit the remaining data.
    pub fn read_be<T: CilIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a compressed unsigned integer (ECMA-335 II.23.2).
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the encoding is truncated, or
    /// [`crate::Error::Malformed`] for the reserved `111xxxxx` lead byte.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let start = self.position;
        let result = self.read_compressed_uint_raw().map(|(value, _)| value);
        if result.is_err() {
            self.position = start;
        }
        result
    }

    /// Read a compressed signed integer (ECMA-335 II.23.2).
    ///
    /// The sign lives in bit 0 of the payload; negative values are sign-extended from the
    /// 6, 13 or 28 bit magnitude of the chosen width.
    ///
    /// # Errors
    /// Same conditions as [`Parser::read_compressed_uint`].
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let start = self.position;
        let (raw, width) = match self.read_compressed_uint_raw() {
            Ok(read) => read,
            Err(error) => {
                self.position = start;
                return Err(error);
            }
        };

        #[allow(clippy::cast_possible_wrap)]
        let magnitude = (raw >> 1) as i32;
        if raw & 1 == 0 {
            return Ok(magnitude);
        }

        let bias = match width {
            1 => 0x40,
            2 => 0x2000,
            _ => 0x1000_0000,
        };
        Ok(magnitude - bias)
    }

    fn read_compressed_uint_raw(&mut self) -> Result<(u32, usize)> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok((u32::from(first_byte), 1));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok((value, 2));
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let rest = self.read_bytes(3)?;
            let value = ((u32::from(first_byte) & 0x1F) << 24)
                | (u32::from(rest[0]) << 16)
                | (u32::from(rest[1]) << 8)
                | u32::from(rest[2]);
            return Ok((value, 4));
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a `SerString`: a compressed length followed by UTF-8 bytes, where a single
    /// `0xFF` lead byte encodes a null string.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the string is truncated, or
    /// [`crate::Error::Malformed`] if it is not valid UTF-8.
    pub fn read_ser_string(&mut self) -> Result<Option<String>> {
        if self.peek_byte()? == 0xFF {
            self.position += 1;
            return Ok(None);
        }

        let length = self.read_compressed_uint()? as usize;
        let bytes = self.read_bytes(length)?;
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Some(text.to_string())),
            Err(_) => Err(malformed_error!("SerString is not valid UTF-8")),
        }
    }

    fn calc_end_position(&self, length: usize) -> Result<usize> {
        match self.position.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(end),
            _ => Err(out_of_bounds_error!()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_read_compressed_uint() {
        let test_cases = vec![
            (vec![0x03], 3),                             // 1-byte format
            (vec![0x7F], 0x7F),                          // 1-byte format, max value
            (vec![0x80, 0x80], 0x80),                    // 2-byte format, min value
            (vec![0xBF, 0xFF], 0x3FFF),                  // 2-byte format, max value
            (vec![0xC0, 0x00, 0x00, 0x00], 0x00),        // 4-byte format, min value
            (vec![0xDF, 0xFF, 0xFF, 0xFF], 0x1FFF_FFFF), // 4-byte format, max value
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            let result = parser.read_compressed_uint().unwrap();
            assert_eq!(result, expected);
            assert!(!parser.has_more_data());
        }

        let mut parser = Parser::new(&[]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::OutOfBounds { .. })
        ));

        let mut parser = Parser::new(&[0xE0]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_truncated_compressed_uint_keeps_position() {
        let mut parser = Parser::new(&[0xC0, 0x01]);
        assert!(parser.read_compressed_uint().is_err());
        assert_eq!(parser.pos(), 0);
    }

    #[test]
    fn test_read_compressed_int() {
        let cases: [(&[u8], i32); 8] = [
            (&[0x06], 3),
            (&[0x7B], -3),
            (&[0x80, 0x80], 64),
            (&[0x01], -64),
            (&[0xC0, 0x00, 0x40, 0x00], 8192),
            (&[0x80, 0x01], -8192),
            (&[0xDF, 0xFF, 0xFF, 0xFE], 268_435_455),
            (&[0xC0, 0x00, 0x00, 0x01], -268_435_456),
        ];

        for (input, expected) in cases {
            let mut parser = Parser::new(input);
            assert_eq!(parser.read_compressed_int().unwrap(), expected);
        }
    }

    #[test]
    fn test_ser_string() {
        let mut parser = Parser::new(&[0x03, b'a', b'b', b'c', 0xFF, 0x00]);
        assert_eq!(parser.read_ser_string().unwrap().as_deref(), Some("abc"));
        assert_eq!(parser.read_ser_string().unwrap(), None);
        assert_eq!(parser.read_ser_string().unwrap().as_deref(), Some(""));

        let mut parser = Parser::new(&[0x05, b'a']);
        assert!(parser.read_ser_string().is_err());
    }

    #[test]
    fn test_navigation() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut parser = Parser::new(&data);

        parser.advance_by(1).unwrap();
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 4);
        assert_eq!(parser.peek_byte().unwrap(), 0x05);
        assert_eq!(parser.remaining(), 1);

        parser.seek(5).unwrap();
        assert!(!parser.has_more_data());
        assert!(parser.seek(6).is_err());
        assert!(parser.peek_le::<u16>().is_err());
    }
}

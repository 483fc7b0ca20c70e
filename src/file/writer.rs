//! Growable little-endian byte sink used when re-encoding signatures, method bodies and rows.
//!
//! [`crate::file::writer::BlobWriter`] is the write-side counterpart of [`crate::file::parser::Parser`].
//! It appends primitive values, compressed integers and ser-strings to an owned buffer.
//!
//! ```rust
//! use cilgraph::file::writer::BlobWriter;
//!
//! let mut writer = BlobWriter::new();
//! writer.write_u8(0x07);
//! writer.write_compressed_uint(0x80)?;
//! writer.write_le(0x1234u16);
//! assert_eq!(writer.into_inner(), [0x07, 0x80, 0x80, 0x34, 0x12]);
//! # Ok::<(), cilgraph::Error>(())
//! ```

use crate::{
    file::io::{write_compressed_int, write_compressed_uint, CilIO},
    Result,
};

/// An append-only byte buffer with metadata encoding helpers.
#[derive(Debug, Default, Clone)]
pub struct BlobWriter {
    buffer: Vec<u8>,
}

impl BlobWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        BlobWriter {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Append a value in little-endian byte order.
    pub fn write_le<T: CilIO>(&mut self, value: T) {
        self.buffer.extend_from_slice(value.to_le_bytes().as_ref());
    }

    /// Append a 2 or 4 byte little-endian column value.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value does not fit the narrow form.
    pub fn write_le_dyn(&mut self, value: u32, is_large: bool) -> Result<()> {
        if is_large {
            self.write_le(value);
        } else {
            let narrow = u16::try_from(value)
                .map_err(|_| malformed_error!("Value {:#x} does not fit a 2 byte column", value))?;
            self.write_le(narrow);
        }
        Ok(())
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append a compressed unsigned integer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value is too large to compress.
    pub fn write_compressed_uint(&mut self, value: u32) -> Result<()> {
        write_compressed_uint(value, &mut self.buffer)
    }

    /// Append a compressed signed integer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value is too large to compress.
    pub fn write_compressed_int(&mut self, value: i32) -> Result<()> {
        write_compressed_int(value, &mut self.buffer)
    }

    /// Append a `SerString`. `None` is encoded as the single byte `0xFF`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the string is too long to prefix.
    pub fn write_ser_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => self.buffer.push(0xFF),
            Some(text) => {
                let length = u32::try_from(text.len())
                    .map_err(|_| malformed_error!("SerString of {} bytes is too long", text.len()))?;
                self.write_compressed_uint(length)?;
                self.buffer.extend_from_slice(text.as_bytes());
            }
        }
        Ok(())
    }

    /// Pad with `fill` until the position is a multiple of `alignment`.
    pub fn align(&mut self, alignment: usize, fill: u8) {
        let padding = (alignment - (self.buffer.len() % alignment)) % alignment;
        self.buffer.resize(self.buffer.len() + padding, fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    #[test]
    fn ser_strings_read_back() {
        let mut writer = BlobWriter::new();
        writer.write_ser_string(Some("System.Int32")).unwrap();
        writer.write_ser_string(None).unwrap();

        let data = writer.into_inner();
        let mut parser = Parser::new(&data);
        assert_eq!(
            parser.read_ser_string().unwrap().as_deref(),
            Some("System.Int32")
        );
        assert_eq!(parser.read_ser_string().unwrap(), None);
    }

    #[test]
    fn align_pads() {
        let mut writer = BlobWriter::with_capacity(8);
        writer.write_u8(1);
        writer.align(4, 0);
        assert_eq!(writer.position(), 4);
        writer.align(4, 0);
        assert_eq!(writer.position(), 4);
    }

    #[test]
    fn dyn_columns() {
        let mut writer = BlobWriter::new();
        writer.write_le_dyn(0x1234, false).unwrap();
        writer.write_le_dyn(0x1234, true).unwrap();
        assert!(writer.write_le_dyn(0x1_0000, false).is_err());
        assert_eq!(writer.as_slice(), &[0x34, 0x12, 0x34, 0x12, 0x00, 0x00]);
    }
}

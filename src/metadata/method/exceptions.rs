//! Exception handling clauses of method bodies.
//!
//! Clauses are stored in the extra data sections that follow the code of a fat body, either in
//! the small layout (12 bytes per clause) or the fat layout (24 bytes per clause).

use bitflags::bitflags;

use crate::{
    file::{io::read_le_at, writer::BlobWriter},
    metadata::token::Token,
    Result,
};

/// Size of one clause in a small section.
pub const SMALL_CLAUSE_SIZE: usize = 12;
/// Size of one clause in a fat section.
pub const FAT_CLAUSE_SIZE: usize = 24;

bitflags! {
    /// Kind of an exception handling clause.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExceptionHandlerFlags: u32 {
        /// A typed catch clause; the extra field holds the caught type token.
        const EXCEPTION = 0x0000;
        /// A filter clause; the extra field holds the filter block offset.
        const FILTER = 0x0001;
        /// A finally clause.
        const FINALLY = 0x0002;
        /// A fault clause, a finally that only runs when an exception escapes.
        const FAULT = 0x0004;
    }
}

/// One try region and its handler.
///
/// ```text
/// try     [try_offset, try_offset + try_length)
/// handler [handler_offset, handler_offset + handler_length)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CilExceptionHandler {
    /// Clause kind
    pub flags: ExceptionHandlerFlags,
    /// Start of the protected region
    pub try_offset: u32,
    /// Length of the protected region
    pub try_length: u32,
    /// Start of the handler
    pub handler_offset: u32,
    /// Length of the handler
    pub handler_length: u32,
    /// Caught type token for catch clauses, filter offset for filter clauses, 0 otherwise
    pub class_token_or_filter: u32,
}

impl CilExceptionHandler {
    /// A typed catch clause.
    #[must_use]
    pub fn catch(try_range: (u32, u32), handler_range: (u32, u32), class: Token) -> Self {
        Self::with_flags(ExceptionHandlerFlags::EXCEPTION, try_range, handler_range, class.value())
    }

    /// A finally clause.
    #[must_use]
    pub fn finally(try_range: (u32, u32), handler_range: (u32, u32)) -> Self {
        Self::with_flags(ExceptionHandlerFlags::FINALLY, try_range, handler_range, 0)
    }

    /// A fault clause.
    #[must_use]
    pub fn fault(try_range: (u32, u32), handler_range: (u32, u32)) -> Self {
        Self::with_flags(ExceptionHandlerFlags::FAULT, try_range, handler_range, 0)
    }

    /// A filter clause whose filter block starts at `filter_offset`.
    #[must_use]
    pub fn filter(try_range: (u32, u32), handler_range: (u32, u32), filter_offset: u32) -> Self {
        Self::with_flags(ExceptionHandlerFlags::FILTER, try_range, handler_range, filter_offset)
    }

    fn with_flags(
        flags: ExceptionHandlerFlags,
        (try_offset, try_length): (u32, u32),
        (handler_offset, handler_length): (u32, u32),
        class_token_or_filter: u32,
    ) -> Self {
        CilExceptionHandler {
            flags,
            try_offset,
            try_length,
            handler_offset,
            handler_length,
            class_token_or_filter,
        }
    }

    /// Whether this is a catch clause. `EXCEPTION` is the empty flag set, so `contains` cannot
    /// be used for it.
    #[must_use]
    pub fn is_catch(&self) -> bool {
        self.flags.is_empty()
    }

    /// Caught type, for catch clauses.
    #[must_use]
    pub fn catch_type(&self) -> Option<Token> {
        self.is_catch().then(|| Token::new(self.class_token_or_filter))
    }

    /// Start of the filter block, for filter clauses.
    #[must_use]
    pub fn filter_offset(&self) -> Option<u32> {
        self.flags
            .contains(ExceptionHandlerFlags::FILTER)
            .then_some(self.class_token_or_filter)
    }

    /// Whether the handler starts with the exception object on the stack.
    #[must_use]
    pub fn pushes_exception(&self) -> bool {
        self.is_catch() || self.flags.contains(ExceptionHandlerFlags::FILTER)
    }

    /// End of the protected region.
    #[must_use]
    pub fn try_end(&self) -> u32 {
        self.try_offset.saturating_add(self.try_length)
    }

    /// End of the handler.
    #[must_use]
    pub fn handler_end(&self) -> u32 {
        self.handler_offset.saturating_add(self.handler_length)
    }

    /// Whether the clause can be stored in a small section.
    #[must_use]
    pub fn fits_small(&self) -> bool {
        self.try_offset <= u32::from(u16::MAX)
            && self.try_length <= u32::from(u8::MAX)
            && self.handler_offset <= u32::from(u16::MAX)
            && self.handler_length <= u32::from(u8::MAX)
            && self.flags.bits() <= u32::from(u16::MAX)
    }

    /// Read a clause in the small layout.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the clause is truncated.
    pub fn read_small(data: &[u8], offset: &mut usize) -> Result<Self> {
        Ok(CilExceptionHandler {
            flags: ExceptionHandlerFlags::from_bits_retain(u32::from(read_le_at::<u16>(
                data, offset,
            )?)),
            try_offset: u32::from(read_le_at::<u16>(data, offset)?),
            try_length: u32::from(read_le_at::<u8>(data, offset)?),
            handler_offset: u32::from(read_le_at::<u16>(data, offset)?),
            handler_length: u32::from(read_le_at::<u8>(data, offset)?),
            class_token_or_filter: read_le_at::<u32>(data, offset)?,
        })
    }

    /// Read a clause in the fat layout.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the clause is truncated.
    pub fn read_fat(data: &[u8], offset: &mut usize) -> Result<Self> {
        Ok(CilExceptionHandler {
            flags: ExceptionHandlerFlags::from_bits_retain(read_le_at::<u32>(data, offset)?),
            try_offset: read_le_at::<u32>(data, offset)?,
            try_length: read_le_at::<u32>(data, offset)?,
            handler_offset: read_le_at::<u32>(data, offset)?,
            handler_length: read_le_at::<u32>(data, offset)?,
            class_token_or_filter: read_le_at::<u32>(data, offset)?,
        })
    }

    /// Write the clause in the small layout. Callers check [`CilExceptionHandler::fits_small`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_small(&self, writer: &mut BlobWriter) {
        writer.write_le(self.flags.bits() as u16);
        writer.write_le(self.try_offset as u16);
        writer.write_u8(self.try_length as u8);
        writer.write_le(self.handler_offset as u16);
        writer.write_u8(self.handler_length as u8);
        writer.write_le(self.class_token_or_filter);
    }

    /// Write the clause in the fat layout.
    pub fn write_fat(&self, writer: &mut BlobWriter) {
        writer.write_le(self.flags.bits());
        writer.write_le(self.try_offset);
        writer.write_le(self.try_length);
        writer.write_le(self.handler_offset);
        writer.write_le(self.handler_length);
        writer.write_le(self.class_token_or_filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_clause() {
        #[rustfmt::skip]
        let data = [
            0x02, 0x00,             // finally
            0x08, 0x00, 0x1B,       // try 0x08 + 0x1B
            0x23, 0x00, 0x0A,       // handler 0x23 + 0x0A
            0x00, 0x00, 0x00, 0x00,
        ];
        let mut offset = 0;
        let clause = CilExceptionHandler::read_small(&data, &mut offset).unwrap();
        assert_eq!(offset, SMALL_CLAUSE_SIZE);
        assert_eq!(clause, CilExceptionHandler::finally((0x08, 0x1B), (0x23, 0x0A)));
        assert!(!clause.pushes_exception());
        assert_eq!(clause.try_end(), 0x23);

        let mut writer = BlobWriter::new();
        clause.write_small(&mut writer);
        assert_eq!(writer.as_slice(), &data);
    }

    #[test]
    fn fat_catch_clause() {
        let clause =
            CilExceptionHandler::catch((0, 0x1_0000), (0x1_0000, 3), Token::new(0x0100_001D));
        assert!(!clause.fits_small());
        assert!(clause.is_catch());
        assert!(clause.pushes_exception());
        assert_eq!(clause.catch_type(), Some(Token::new(0x0100_001D)));
        assert_eq!(clause.filter_offset(), None);

        let mut writer = BlobWriter::new();
        clause.write_fat(&mut writer);
        let mut offset = 0;
        let read = CilExceptionHandler::read_fat(writer.as_slice(), &mut offset).unwrap();
        assert_eq!(offset, FAT_CLAUSE_SIZE);
        assert_eq!(read, clause);
    }

    #[test]
    fn truncated() {
        let mut offset = 0;
        assert!(CilExceptionHandler::read_small(&[0x00; 11], &mut offset).is_err());
    }
}

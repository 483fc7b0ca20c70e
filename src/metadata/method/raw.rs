//! Byte-level method body layout: header, code and exception handling sections.

use crate::{
    file::{io::read_le_at, writer::BlobWriter},
    metadata::{
        method::{
            exceptions::{CilExceptionHandler, FAT_CLAUSE_SIZE, SMALL_CLAUSE_SIZE},
            types::{
                MethodBodyFlags, SectionFlags, FAT_HEADER_DWORDS, FAT_HEADER_SIZE,
                TINY_MAX_CODE_SIZE, TINY_MAX_STACK,
            },
        },
        token::Token,
    },
    Result,
};

/// Size of an extra data section header.
const SECTION_HEADER_SIZE: usize = 4;
/// Largest section a small section header can describe.
const SMALL_SECTION_MAX: usize = 0xFF;
/// Largest section a fat section header can describe.
const FAT_SECTION_MAX: usize = 0x00FF_FFFF;

/// A method body as stored in the image, with the code still undecoded.
///
/// Tiny bodies report the implicit max stack of 8, no locals and no handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMethodBody {
    /// Whether the body uses the fat header
    pub is_fat: bool,
    /// Declared max stack
    pub max_stack: u16,
    /// Zero initialize locals
    pub init_locals: bool,
    /// `StandAloneSig` token of the locals signature, null if the body has no locals
    pub local_var_sig_token: Token,
    /// The instruction stream
    pub code: Vec<u8>,
    /// Clauses from every exception handling section, in order
    pub exception_handlers: Vec<CilExceptionHandler>,
}

impl RawMethodBody {
    /// Parse a body starting at the first byte of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header, code or a section is truncated,
    /// [`crate::Error::Malformed`] for an unknown header format or an impossible size field.
    pub fn read(data: &[u8]) -> Result<RawMethodBody> {
        let Some(&first) = data.first() else {
            return Err(malformed_error!("Provided data for body parsing is empty"));
        };

        match MethodBodyFlags::from_bits_truncate(u16::from(first & 0b11)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = usize::from(first >> 2);
                let code = data.get(1..=size_code).ok_or(out_of_bounds_error!())?;

                Ok(RawMethodBody {
                    is_fat: false,
                    max_stack: TINY_MAX_STACK,
                    init_locals: false,
                    local_var_sig_token: Token::new(0),
                    code: code.to_vec(),
                    exception_handlers: Vec::new(),
                })
            }
            MethodBodyFlags::FAT_FORMAT => Self::read_fat(data),
            _ => Err(malformed_error!(
                "Method header is neither fat nor tiny - {:#04x}",
                first
            )),
        }
    }

    fn read_fat(data: &[u8]) -> Result<RawMethodBody> {
        if data.len() < FAT_HEADER_SIZE {
            return Err(out_of_bounds_error!());
        }

        let mut cursor = 0;
        let first_word = read_le_at::<u16>(data, &mut cursor)?;
        let max_stack = read_le_at::<u16>(data, &mut cursor)?;
        let size_code = read_le_at::<u32>(data, &mut cursor)? as usize;
        let local_var_sig_token = Token::new(read_le_at::<u32>(data, &mut cursor)?);

        let size_header = usize::from(first_word >> 12) * 4;
        if size_header < FAT_HEADER_SIZE {
            return Err(malformed_error!(
                "Fat header declares {} bytes, needs at least {}",
                size_header,
                FAT_HEADER_SIZE
            ));
        }
        let flags = MethodBodyFlags::from_bits_truncate(first_word & 0x0FFF);

        let code_end = size_header
            .checked_add(size_code)
            .ok_or(out_of_bounds_error!())?;
        let code = data.get(size_header..code_end).ok_or(out_of_bounds_error!())?;

        let mut exception_handlers = Vec::new();
        if flags.contains(MethodBodyFlags::MORE_SECTS) {
            let mut cursor = align4(code_end);
            loop {
                let section = SectionFlags::from_bits_retain(read_le_at::<u8>(data, &mut cursor)?);
                let section_start = cursor - 1;

                let (section_size, clause_size) = if section.contains(SectionFlags::FAT_FORMAT) {
                    let low = usize::from(read_le_at::<u16>(data, &mut cursor)?);
                    let high = usize::from(read_le_at::<u8>(data, &mut cursor)?);
                    (low | (high << 16), FAT_CLAUSE_SIZE)
                } else {
                    let size = usize::from(read_le_at::<u8>(data, &mut cursor)?);
                    cursor += 2;
                    (size, SMALL_CLAUSE_SIZE)
                };

                if section_size < SECTION_HEADER_SIZE {
                    return Err(malformed_error!(
                        "Method data section at {:#x} declares {} bytes",
                        section_start,
                        section_size
                    ));
                }
                let section_end = section_start + section_size;
                if section_end > data.len() {
                    return Err(out_of_bounds_error!());
                }

                if section.contains(SectionFlags::EHTABLE) {
                    let count = (section_size - SECTION_HEADER_SIZE) / clause_size;
                    for _ in 0..count {
                        exception_handlers.push(if clause_size == FAT_CLAUSE_SIZE {
                            CilExceptionHandler::read_fat(data, &mut cursor)?
                        } else {
                            CilExceptionHandler::read_small(data, &mut cursor)?
                        });
                    }
                }

                if !section.contains(SectionFlags::MORE_SECTS) {
                    break;
                }
                cursor = align4(section_end);
            }
        }

        Ok(RawMethodBody {
            is_fat: true,
            max_stack,
            init_locals: flags.contains(MethodBodyFlags::INIT_LOCALS),
            local_var_sig_token,
            code: code.to_vec(),
            exception_handlers,
        })
    }

    /// Encode the body; a tiny body must have at most 63 code bytes and nothing else.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the tiny header cannot represent the body or the
    /// code or handler table exceeds the fat format limits.
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut writer = BlobWriter::with_capacity(FAT_HEADER_SIZE + self.code.len());

        if !self.is_fat {
            if self.code.len() > TINY_MAX_CODE_SIZE
                || !self.exception_handlers.is_empty()
                || !self.local_var_sig_token.is_null()
                || self.init_locals
            {
                return Err(malformed_error!(
                    "Body with {} code bytes cannot use a tiny header",
                    self.code.len()
                ));
            }
            #[allow(clippy::cast_possible_truncation)]
            writer.write_u8(((self.code.len() as u8) << 2) | 0b10);
            writer.write_bytes(&self.code);
            return Ok(writer.into_inner());
        }

        let size_code = u32::try_from(self.code.len())
            .map_err(|_| malformed_error!("Code of {} bytes is too large", self.code.len()))?;

        let mut flags = MethodBodyFlags::FAT_FORMAT;
        if self.init_locals {
            flags |= MethodBodyFlags::INIT_LOCALS;
        }
        if !self.exception_handlers.is_empty() {
            flags |= MethodBodyFlags::MORE_SECTS;
        }

        writer.write_le(flags.bits() | (FAT_HEADER_DWORDS << 12));
        writer.write_le(self.max_stack);
        writer.write_le(size_code);
        writer.write_le(self.local_var_sig_token.value());
        writer.write_bytes(&self.code);

        if !self.exception_handlers.is_empty() {
            writer.align(4, 0);
            self.write_exception_section(&mut writer)?;
        }

        Ok(writer.into_inner())
    }

    fn write_exception_section(&self, writer: &mut BlobWriter) -> Result<()> {
        let count = self.exception_handlers.len();
        let small_size = SECTION_HEADER_SIZE + count * SMALL_CLAUSE_SIZE;

        let small = small_size <= SMALL_SECTION_MAX
            && self
                .exception_handlers
                .iter()
                .all(CilExceptionHandler::fits_small);

        if small {
            writer.write_u8(SectionFlags::EHTABLE.bits());
            #[allow(clippy::cast_possible_truncation)]
            writer.write_u8(small_size as u8);
            writer.write_le(0u16);
            for handler in &self.exception_handlers {
                handler.write_small(writer);
            }
            return Ok(());
        }

        let fat_size = SECTION_HEADER_SIZE + count * FAT_CLAUSE_SIZE;
        if fat_size > FAT_SECTION_MAX {
            return Err(malformed_error!("{} exception handlers do not fit one section", count));
        }

        writer.write_u8((SectionFlags::EHTABLE | SectionFlags::FAT_FORMAT).bits());
        #[allow(clippy::cast_possible_truncation)]
        {
            writer.write_le(fat_size as u16);
            writer.write_u8((fat_size >> 16) as u8);
        }
        for handler in &self.exception_handlers {
            handler.write_fat(writer);
        }
        Ok(())
    }
}

fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::method::ExceptionHandlerFlags, Error};

    #[test]
    fn tiny() {
        // ldarg.0; ret
        let data = [0x0A, 0x02, 0x2A, 0xFF];
        let body = RawMethodBody::read(&data).unwrap();
        assert!(!body.is_fat);
        assert_eq!(body.max_stack, 8);
        assert_eq!(body.code, [0x02, 0x2A]);
        assert!(body.local_var_sig_token.is_null());
        assert_eq!(body.write().unwrap(), &data[..3]);
    }

    #[test]
    fn tiny_truncated() {
        assert!(matches!(
            RawMethodBody::read(&[0x0E, 0x00]),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(RawMethodBody::read(&[]), Err(Error::Malformed { .. })));
        assert!(matches!(RawMethodBody::read(&[0x01]), Err(Error::Malformed { .. })));
    }

    #[test]
    fn fat_with_small_section() {
        #[rustfmt::skip]
        let data = [
            0x1B, 0x30,             // fat | more sects | init locals, 3 dwords
            0x02, 0x00,             // max stack 2
            0x05, 0x00, 0x00, 0x00, // code size 5
            0x01, 0x00, 0x00, 0x11, // locals 0x11000001
            0x00, 0x00, 0xDE, 0x00, 0x2A, // nop; nop; leave.s +0; ret
            0x00, 0x00, 0x00,       // padding
            0x01, 0x10, 0x00, 0x00, // small EH section, 16 bytes
            0x02, 0x00, 0x00, 0x00, 0x02, 0x02, 0x00, 0x02,
            0x00, 0x00, 0x00, 0x00,
        ];
        let body = RawMethodBody::read(&data).unwrap();
        assert!(body.is_fat);
        assert!(body.init_locals);
        assert_eq!(body.max_stack, 2);
        assert_eq!(body.local_var_sig_token, Token::new(0x1100_0001));
        assert_eq!(body.code.len(), 5);
        assert_eq!(body.exception_handlers.len(), 1);

        let handler = &body.exception_handlers[0];
        assert!(handler.flags.contains(ExceptionHandlerFlags::FINALLY));
        assert_eq!((handler.try_offset, handler.try_length), (0, 2));
        assert_eq!((handler.handler_offset, handler.handler_length), (2, 2));

        assert_eq!(body.write().unwrap(), data);
    }

    #[test]
    fn fat_section_chain() {
        #[rustfmt::skip]
        let data = [
            0x0B, 0x30, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x2A, 0x00, 0x00, 0x00,
            // fat EH section with one clause, more sections follow
            0xC1, 0x1C, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x01,
            // small EH section with one clause
            0x01, 0x10, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let body = RawMethodBody::read(&data).unwrap();
        assert_eq!(body.exception_handlers.len(), 2);
        assert_eq!(body.exception_handlers[0].catch_type(), Some(Token::new(0x0100_0005)));
        assert!(body.exception_handlers[1]
            .flags
            .contains(ExceptionHandlerFlags::FAULT));
    }

    #[test]
    fn fat_truncated() {
        assert!(matches!(
            RawMethodBody::read(&[0x03, 0x30]),
            Err(Error::OutOfBounds { .. })
        ));

        #[rustfmt::skip]
        let code_past_end = [
            0x03, 0x30, 0x08, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A,
        ];
        assert!(matches!(
            RawMethodBody::read(&code_past_end),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn tiny_rejects_fat_content() {
        let body = RawMethodBody {
            is_fat: false,
            max_stack: 8,
            init_locals: false,
            local_var_sig_token: Token::new(0),
            code: vec![0x00; 64],
            exception_handlers: Vec::new(),
        };
        assert!(body.write().is_err());
    }
}

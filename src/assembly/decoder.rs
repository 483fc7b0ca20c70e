//! CIL instruction decoding.
//!
//! Turns the code bytes of a method body into [`CilInstruction`]s. Branch displacements are
//! resolved against the end of their instruction, so every [`CilOperand::Target`] and
//! [`CilOperand::Switch`] entry produced here is an absolute offset into the body.
//!
//! # Examples
//!
//! ```rust
//! use cilgraph::assembly::{decode_stream, CilOperand};
//!
//! // ldc.i4.1; brtrue.s +1; nop; ret
//! let code = [0x17, 0x2D, 0x01, 0x00, 0x2A];
//! let instructions = decode_stream(&code)?;
//! assert_eq!(instructions.len(), 4);
//! assert_eq!(instructions[1].operand, CilOperand::Target(4));
//! assert_eq!(instructions[3].offset, 4);
//! # Ok::<(), cilgraph::Error>(())
//! ```

use crate::{
    assembly::{
        instruction::{CilInstruction, CilOperand},
        opcodes::{self, OperandType},
    },
    file::parser::Parser,
    metadata::token::Token,
    Error, Result,
};

/// Prefix byte of the two-byte opcode space.
pub const TWO_BYTE_PREFIX: u8 = 0xFE;

/// Decode the instruction at the parser's position.
///
/// The offset recorded on the instruction is the parser position before decoding.
///
/// # Errors
/// [`Error::InvalidOpcode`] for a byte sequence outside the opcode table,
/// [`Error::OutOfBounds`] for an operand cut off by the end of the data.
pub fn decode_instruction(parser: &mut Parser) -> Result<CilInstruction> {
    let offset = position(parser)?;

    let first = parser.read_le::<u8>()?;
    let value = if first == TWO_BYTE_PREFIX {
        let second = parser.read_le::<u8>()?;
        u16::from_be_bytes([first, second])
    } else {
        u16::from(first)
    };

    let Some(opcode) = opcodes::lookup(value) else {
        return Err(Error::InvalidOpcode {
            offset,
            opcode: value,
        });
    };

    let operand = match opcode.operand {
        OperandType::None => CilOperand::None,
        OperandType::ShortInt => CilOperand::Int8(parser.read_le::<i8>()?),
        OperandType::UInt8 => CilOperand::UInt8(parser.read_le::<u8>()?),
        OperandType::Int => CilOperand::Int32(parser.read_le::<i32>()?),
        OperandType::Long => CilOperand::Int64(parser.read_le::<i64>()?),
        OperandType::ShortFloat => CilOperand::Float32(parser.read_le::<f32>()?),
        OperandType::Float => CilOperand::Float64(parser.read_le::<f64>()?),
        OperandType::ShortVar => CilOperand::Variable(u16::from(parser.read_le::<u8>()?)),
        OperandType::Var => CilOperand::Variable(parser.read_le::<u16>()?),
        OperandType::Token => CilOperand::Token(Token::new(parser.read_le::<u32>()?)),
        OperandType::ShortBranch => {
            let displacement = i32::from(parser.read_le::<i8>()?);
            CilOperand::Target(resolve_target(offset, position(parser)?, displacement)?)
        }
        OperandType::Branch => {
            let displacement = parser.read_le::<i32>()?;
            CilOperand::Target(resolve_target(offset, position(parser)?, displacement)?)
        }
        OperandType::Switch => {
            let count = parser.read_le::<u32>()? as usize;
            if count.saturating_mul(4) > parser.remaining() {
                return Err(out_of_bounds_error!());
            }

            let mut displacements = Vec::with_capacity(count);
            for _ in 0..count {
                displacements.push(parser.read_le::<i32>()?);
            }

            // Switch displacements are relative to the end of the whole jump table
            let base = position(parser)?;
            let targets = displacements
                .into_iter()
                .map(|displacement| resolve_target(offset, base, displacement))
                .collect::<Result<Vec<u32>>>()?;
            CilOperand::Switch(targets)
        }
    };

    Ok(CilInstruction {
        opcode,
        operand,
        offset,
        call_effect: None,
    })
}

/// Decode a complete instruction stream.
///
/// # Errors
/// See [`decode_instruction`]; the first failing instruction aborts decoding.
pub fn decode_stream(code: &[u8]) -> Result<Vec<CilInstruction>> {
    let mut parser = Parser::new(code);
    // Most instructions are one or two bytes long
    let mut instructions = Vec::with_capacity(code.len() / 2);

    while parser.has_more_data() {
        instructions.push(decode_instruction(&mut parser)?);
    }

    Ok(instructions)
}

fn position(parser: &Parser) -> Result<u32> {
    u32::try_from(parser.pos()).map_err(|_| malformed_error!("Instruction stream exceeds 4 GiB"))
}

fn resolve_target(offset: u32, base: u32, displacement: i32) -> Result<u32> {
    let target = i64::from(base) + i64::from(displacement);
    u32::try_from(target).map_err(|_| {
        malformed_error!(
            "Branch at offset {:#x} resolves to invalid target {}",
            offset,
            target
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::opcodes::*;

    #[test]
    fn one_and_two_byte_opcodes() {
        #[rustfmt::skip]
        let code = [
            0x02,                   // ldarg.0
            0xFE, 0x01,             // ceq
            0xFE, 0x0C, 0x2C, 0x01, // ldloc 300
            0x2A,                   // ret
        ];
        let instructions = decode_stream(&code).unwrap();
        assert_eq!(instructions.len(), 4);
        assert_eq!(instructions[0].opcode, LDARG_0);
        assert_eq!(instructions[1].opcode, CEQ);
        assert_eq!(instructions[1].offset, 1);
        assert_eq!(instructions[2].opcode, LDLOC);
        assert_eq!(instructions[2].operand, CilOperand::Variable(300));
        assert_eq!(instructions[3].offset, 7);
    }

    #[test]
    fn immediates() {
        #[rustfmt::skip]
        let code = [
            0x1F, 0xFB,                                     // ldc.i4.s -5
            0x20, 0x78, 0x56, 0x34, 0x12,                   // ldc.i4 0x12345678
            0x22, 0x00, 0x00, 0xC0, 0x3F,                   // ldc.r4 1.5
            0x72, 0x01, 0x00, 0x00, 0x70,                   // ldstr 0x70000001
        ];
        let instructions = decode_stream(&code).unwrap();
        assert_eq!(instructions[0].operand, CilOperand::Int8(-5));
        assert_eq!(instructions[1].operand, CilOperand::Int32(0x1234_5678));
        assert_eq!(instructions[2].operand, CilOperand::Float32(1.5));
        assert_eq!(
            instructions[3].operand,
            CilOperand::Token(Token::new(0x7000_0001))
        );
    }

    #[test]
    fn backward_branch() {
        // nop; br.s -3 (back to offset 0)
        let code = [0x00, 0x2B, 0xFD];
        let instructions = decode_stream(&code).unwrap();
        assert_eq!(instructions[1].operand, CilOperand::Target(0));
    }

    #[test]
    fn switch_targets_are_relative_to_table_end() {
        #[rustfmt::skip]
        let code = [
            0x45, 0x02, 0x00, 0x00, 0x00, // switch (2 targets)
            0x00, 0x00, 0x00, 0x00,       // +0 -> 13
            0x01, 0x00, 0x00, 0x00,       // +1 -> 14
            0x00,                         // nop
            0x2A,                         // ret
        ];
        let instructions = decode_stream(&code).unwrap();
        assert_eq!(instructions[0].operand, CilOperand::Switch(vec![13, 14]));
        assert_eq!(instructions[0].size(), 13);
        assert_eq!(instructions[2].offset, 14);
    }

    #[test]
    fn invalid_opcodes() {
        assert!(matches!(
            decode_stream(&[0x00, 0x24]),
            Err(Error::InvalidOpcode {
                offset: 1,
                opcode: 0x24
            })
        ));
        assert!(matches!(
            decode_stream(&[0xFE, 0x08]),
            Err(Error::InvalidOpcode {
                offset: 0,
                opcode: 0xFE08
            })
        ));
    }

    #[test]
    fn truncated_operands() {
        assert!(matches!(
            decode_stream(&[0x20, 0x01, 0x02]),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            decode_stream(&[0x45, 0xFF, 0xFF, 0xFF, 0x0F]),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            decode_stream(&[0x2B, 0x80]),
            Err(Error::Malformed { .. })
        ));
    }
}

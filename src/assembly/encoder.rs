//! CIL instruction encoding.
//!
//! The inverse of [`crate::assembly::decoder`]: absolute branch targets are turned back into
//! displacements relative to the end of the encoded instruction. Instructions are written
//! back to back, so the targets must refer to offsets of the layout produced by
//! [`calculate_offsets`].

use crate::{
    assembly::{
        decoder::TWO_BYTE_PREFIX,
        instruction::{CilInstruction, CilOperand},
        opcodes::OperandType,
    },
    file::writer::BlobWriter,
    Error, Result,
};

/// Assign consecutive offsets starting at 0 and return the total code size.
pub fn calculate_offsets(instructions: &mut [CilInstruction]) -> u32 {
    let mut offset = 0u32;
    for instruction in instructions.iter_mut() {
        instruction.offset = offset;
        offset += instruction.size();
    }
    offset
}

/// Append one instruction to `writer`.
///
/// # Errors
/// [`Error::Malformed`] if the operand does not match the opcode's operand kind,
/// [`Error::BranchOutOfRange`] for a short branch whose displacement does not fit in an `i8`.
pub fn encode_instruction(writer: &mut BlobWriter, instruction: &CilInstruction) -> Result<()> {
    let opcode = instruction.opcode;
    if !instruction.operand.fits(opcode.operand) {
        return Err(malformed_error!(
            "Operand {:?} does not fit opcode {}",
            instruction.operand,
            opcode.mnemonic
        ));
    }

    let start = offset_of(writer)?;
    if opcode.is_two_byte() {
        writer.write_u8(TWO_BYTE_PREFIX);
    }
    writer.write_u8((opcode.value & 0xFF) as u8);

    match (&instruction.operand, opcode.operand) {
        (CilOperand::None, _) => {}
        (CilOperand::Int8(value), _) => writer.write_le(*value),
        (CilOperand::UInt8(value), _) => writer.write_u8(*value),
        (CilOperand::Int32(value), _) => writer.write_le(*value),
        (CilOperand::Int64(value), _) => writer.write_le(*value),
        (CilOperand::Float32(value), _) => writer.write_le(*value),
        (CilOperand::Float64(value), _) => writer.write_le(*value),
        (CilOperand::Variable(index), OperandType::ShortVar) => writer.write_u8(*index as u8),
        (CilOperand::Variable(index), _) => writer.write_le(*index),
        (CilOperand::Token(token), _) => writer.write_le(token.value()),
        (CilOperand::Target(target), OperandType::ShortBranch) => {
            let displacement = displacement(offset_of(writer)? + 1, *target);
            let short = i8::try_from(displacement).map_err(|_| Error::BranchOutOfRange {
                offset: start,
                target: *target,
            })?;
            writer.write_le(short);
        }
        (CilOperand::Target(target), _) => {
            let displacement = displacement(offset_of(writer)? + 4, *target);
            let long = i32::try_from(displacement).map_err(|_| Error::BranchOutOfRange {
                offset: start,
                target: *target,
            })?;
            writer.write_le(long);
        }
        (CilOperand::Switch(targets), _) => {
            let count = u32::try_from(targets.len())
                .map_err(|_| malformed_error!("Switch table too large"))?;
            writer.write_le(count);

            let base = offset_of(writer)? + 4 * count;
            for target in targets {
                let long = i32::try_from(displacement(base, *target)).map_err(|_| {
                    Error::BranchOutOfRange {
                        offset: start,
                        target: *target,
                    }
                })?;
                writer.write_le(long);
            }
        }
    }

    Ok(())
}

/// Encode a complete instruction stream.
///
/// # Errors
/// See [`encode_instruction`].
pub fn encode_stream(instructions: &[CilInstruction]) -> Result<Vec<u8>> {
    let capacity: u32 = instructions.iter().map(CilInstruction::size).sum();
    let mut writer = BlobWriter::with_capacity(capacity as usize);
    for instruction in instructions {
        encode_instruction(&mut writer, instruction)?;
    }
    Ok(writer.into_inner())
}

fn offset_of(writer: &BlobWriter) -> Result<u32> {
    u32::try_from(writer.position()).map_err(|_| malformed_error!("Instruction stream exceeds 4 GiB"))
}

fn displacement(next: u32, target: u32) -> i64 {
    i64::from(target) - i64::from(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::{decoder::decode_stream, opcodes::*},
        metadata::token::Token,
    };

    #[test]
    fn matches_decoded_bytes() {
        #[rustfmt::skip]
        let code = [
            0x02,                         // ldarg.0
            0x2C, 0x09,                   // brfalse.s +9
            0xFE, 0x0C, 0x2C, 0x01,       // ldloc 300
            0x28, 0x01, 0x00, 0x00, 0x0A, // call 0x0A000001
            0x2A,                         // ret
        ];
        let instructions = decode_stream(&code).unwrap();
        assert_eq!(encode_stream(&instructions).unwrap(), code);
    }

    #[test]
    fn switch_displacements() {
        let mut instructions = vec![
            CilInstruction::new(SWITCH, CilOperand::Switch(vec![0, 14])),
            CilInstruction::simple(NOP),
            CilInstruction::simple(RET),
        ];
        assert_eq!(calculate_offsets(&mut instructions), 15);

        let bytes = encode_stream(&instructions).unwrap();
        assert_eq!(&bytes[5..9], &(-13i32).to_le_bytes());
        assert_eq!(&bytes[9..13], &1i32.to_le_bytes());
    }

    #[test]
    fn short_branch_out_of_range() {
        let mut instructions = vec![CilInstruction::new(BR_S, CilOperand::Target(200))];
        instructions.extend((0..200).map(|_| CilInstruction::simple(NOP)));
        calculate_offsets(&mut instructions);
        assert!(matches!(
            encode_stream(&instructions),
            Err(Error::BranchOutOfRange {
                offset: 0,
                target: 200
            })
        ));

        instructions[0] = CilInstruction::new(BR, CilOperand::Target(200));
        assert!(encode_stream(&instructions).is_ok());
    }

    #[test]
    fn operand_mismatch() {
        let wrong = CilInstruction::new(CALL, CilOperand::Int32(1));
        assert!(matches!(encode_stream(&[wrong]), Err(Error::Malformed { .. })));

        let right = CilInstruction::new(CALL, CilOperand::Token(Token::new(0x0600_0001)));
        assert_eq!(
            encode_stream(&[right]).unwrap(),
            vec![0x28, 0x01, 0x00, 0x00, 0x06]
        );
    }
}

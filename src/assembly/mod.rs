//! CIL instruction set support.
//!
//! - [`opcodes`] holds the opcode table with operand kinds, flow behaviour and stack effects
//! - [`decode_stream`] and [`decode_instruction`] read instructions from code bytes
//! - [`encode_stream`] and [`encode_instruction`] write them back
//!
//! Branch targets are always absolute body offsets in memory; the codecs translate to and from
//! the relative displacements of the byte stream.

mod decoder;
mod encoder;
mod instruction;
pub mod opcodes;

pub use decoder::{decode_instruction, decode_stream, TWO_BYTE_PREFIX};
pub use encoder::{calculate_offsets, encode_instruction, encode_stream};
pub use instruction::{CilInstruction, CilOperand, StackEffect};
pub use opcodes::{FlowType, OpCode, OperandType, StackBehaviour};

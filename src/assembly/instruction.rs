use std::fmt;

use crate::{
    assembly::opcodes::{FlowType, OpCode, OperandType, StackBehaviour},
    metadata::token::Token,
};

/// Inline operand of an instruction.
///
/// Branch targets are absolute offsets from the start of the method body, not the relative
/// displacements stored in the byte stream.
#[derive(Debug, Clone, PartialEq)]
pub enum CilOperand {
    /// No operand
    None,
    /// 8-bit signed immediate
    Int8(i8),
    /// 8-bit unsigned immediate of the `unaligned.` and `no.` prefixes
    UInt8(u8),
    /// 32-bit signed immediate
    Int32(i32),
    /// 64-bit signed immediate
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// Local variable or argument index
    Variable(u16),
    /// Branch target offset
    Target(u32),
    /// Jump table target offsets
    Switch(Vec<u32>),
    /// Metadata token, or a user-string token for `ldstr`
    Token(Token),
}

impl CilOperand {
    /// Whether this operand can be encoded as `kind`.
    #[must_use]
    pub fn fits(&self, kind: OperandType) -> bool {
        match (self, kind) {
            (CilOperand::None, OperandType::None)
            | (CilOperand::Int8(_), OperandType::ShortInt)
            | (CilOperand::UInt8(_), OperandType::UInt8)
            | (CilOperand::Int32(_), OperandType::Int)
            | (CilOperand::Int64(_), OperandType::Long)
            | (CilOperand::Float32(_), OperandType::ShortFloat)
            | (CilOperand::Float64(_), OperandType::Float)
            | (CilOperand::Target(_), OperandType::ShortBranch | OperandType::Branch)
            | (CilOperand::Switch(_), OperandType::Switch)
            | (CilOperand::Token(_), OperandType::Token) => true,
            (CilOperand::Variable(index), OperandType::ShortVar) => *index <= u16::from(u8::MAX),
            (CilOperand::Variable(_), OperandType::Var) => true,
            _ => false,
        }
    }
}

/// Stack transition of a call site, derived from the callee's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackEffect {
    /// Slots popped
    pub pops: u32,
    /// Slots pushed
    pub pushes: u32,
}

/// One decoded or constructed instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct CilInstruction {
    /// The opcode
    pub opcode: OpCode,
    /// The inline operand
    pub operand: CilOperand,
    /// Byte offset from the start of the method body, valid after offsets were calculated
    pub offset: u32,
    /// Stack transition of `call`, `callvirt`, `calli` and `newobj`, when the callee is known
    pub call_effect: Option<StackEffect>,
}

impl CilInstruction {
    /// An instruction at offset 0; offsets are assigned when the body is laid out.
    #[must_use]
    pub fn new(opcode: OpCode, operand: CilOperand) -> Self {
        CilInstruction {
            opcode,
            operand,
            offset: 0,
            call_effect: None,
        }
    }

    /// An instruction without an operand.
    #[must_use]
    pub fn simple(opcode: OpCode) -> Self {
        Self::new(opcode, CilOperand::None)
    }

    /// Attach the stack transition of a call site.
    #[must_use]
    pub fn with_call_effect(mut self, pops: u32, pushes: u32) -> Self {
        self.call_effect = Some(StackEffect { pops, pushes });
        self
    }

    /// Encoded size: opcode plus operand.
    #[must_use]
    pub fn size(&self) -> u32 {
        let operand = match &self.operand {
            CilOperand::Switch(targets) => 4 + 4 * targets.len() as u32,
            _ => self.opcode.operand.size(),
        };
        self.opcode.size() + operand
    }

    /// Offset of the following instruction.
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        self.offset + self.size()
    }

    /// Branch and switch targets, in operand order.
    #[must_use]
    pub fn branch_targets(&self) -> Vec<u32> {
        match &self.operand {
            CilOperand::Target(target) => vec![*target],
            CilOperand::Switch(targets) => targets.clone(),
            _ => Vec::new(),
        }
    }

    /// Control flow behaviour of the opcode.
    #[must_use]
    pub fn flow(&self) -> FlowType {
        self.opcode.flow
    }

    /// Stack slots popped and pushed.
    ///
    /// Returns `None` for call sites whose stack transition is unknown.
    #[must_use]
    pub fn stack_effect(&self) -> Option<StackEffect> {
        match (self.opcode.pops, self.opcode.pushes) {
            (StackBehaviour::Fixed(pops), StackBehaviour::Fixed(pushes)) => Some(StackEffect {
                pops: u32::from(pops),
                pushes: u32::from(pushes),
            }),
            _ => self.call_effect,
        }
    }

    /// The metadata token operand, if any.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self.operand {
            CilOperand::Token(token) => Some(token),
            _ => None,
        }
    }
}

impl fmt::Display for CilInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.opcode.mnemonic)?;
        match &self.operand {
            CilOperand::None => Ok(()),
            CilOperand::Int8(value) => write!(f, " {value}"),
            CilOperand::UInt8(value) => write!(f, " {value}"),
            CilOperand::Int32(value) => write!(f, " {value}"),
            CilOperand::Int64(value) => write!(f, " {value}"),
            CilOperand::Float32(value) => write!(f, " {value}"),
            CilOperand::Float64(value) => write!(f, " {value}"),
            CilOperand::Variable(index) => write!(f, " V_{index}"),
            CilOperand::Target(target) => write!(f, " IL_{target:04x}"),
            CilOperand::Switch(targets) => {
                let labels: Vec<String> = targets
                    .iter()
                    .map(|target| format!("IL_{target:04x}"))
                    .collect();
                write!(f, " ({})", labels.join(", "))
            }
            CilOperand::Token(token) => write!(f, " {token}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::opcodes::*;

    #[test]
    fn sizes() {
        assert_eq!(CilInstruction::simple(NOP).size(), 1);
        assert_eq!(CilInstruction::new(LDC_I4_S, CilOperand::Int8(5)).size(), 2);
        assert_eq!(CilInstruction::new(LDC_R8, CilOperand::Float64(1.5)).size(), 9);
        assert_eq!(CilInstruction::new(LDLOC, CilOperand::Variable(300)).size(), 4);
        assert_eq!(
            CilInstruction::new(SWITCH, CilOperand::Switch(vec![0, 1, 2])).size(),
            1 + 4 + 12
        );
    }

    #[test]
    fn operand_fit() {
        assert!(CilOperand::Variable(255).fits(OperandType::ShortVar));
        assert!(!CilOperand::Variable(256).fits(OperandType::ShortVar));
        assert!(CilOperand::Target(10).fits(OperandType::ShortBranch));
        assert!(!CilOperand::Int32(1).fits(OperandType::ShortInt));
    }

    #[test]
    fn stack_effects() {
        assert_eq!(
            CilInstruction::simple(ADD).stack_effect(),
            Some(StackEffect { pops: 2, pushes: 1 })
        );
        let call = CilInstruction::new(CALL, CilOperand::Token(Token::new(0x0600_0001)));
        assert_eq!(call.stack_effect(), None);
        assert_eq!(
            call.with_call_effect(2, 1).stack_effect(),
            Some(StackEffect { pops: 2, pushes: 1 })
        );
    }

    #[test]
    fn display() {
        let mut branch = CilInstruction::new(BR_S, CilOperand::Target(0x10));
        branch.offset = 4;
        assert_eq!(branch.to_string(), "IL_0004: br.s IL_0010");
    }
}

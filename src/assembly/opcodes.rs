//! The CIL opcode table.
//!
//! Every opcode of ECMA-335 Partition III is listed with its mnemonic, operand kind, control
//! flow behaviour and stack transition. One byte opcodes have values `0x00..=0xE0`; two byte
//! opcodes carry their `0xFE` prefix in the high byte of [`OpCode::value`].

use std::fmt;

/// Kind of inline operand following an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandType {
    /// No operand
    None,
    /// Signed 8-bit immediate (`ShortInlineI`)
    ShortInt,
    /// Unsigned 8-bit immediate, used by the `unaligned.` and `no.` prefixes
    UInt8,
    /// Signed 32-bit immediate (`InlineI`)
    Int,
    /// Signed 64-bit immediate (`InlineI8`)
    Long,
    /// 32-bit float (`ShortInlineR`)
    ShortFloat,
    /// 64-bit float (`InlineR`)
    Float,
    /// 8-bit local or argument index (`ShortInlineVar`)
    ShortVar,
    /// 16-bit local or argument index (`InlineVar`)
    Var,
    /// 8-bit signed branch displacement (`ShortInlineBrTarget`)
    ShortBranch,
    /// 32-bit signed branch displacement (`InlineBrTarget`)
    Branch,
    /// Jump table (`InlineSwitch`)
    Switch,
    /// Metadata or user-string token
    Token,
}

impl OperandType {
    /// Encoded size of the operand in bytes; `Switch` reports its count field only.
    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            OperandType::None => 0,
            OperandType::ShortInt
            | OperandType::UInt8
            | OperandType::ShortVar
            | OperandType::ShortBranch => 1,
            OperandType::Var => 2,
            OperandType::Int
            | OperandType::ShortFloat
            | OperandType::Branch
            | OperandType::Switch
            | OperandType::Token => 4,
            OperandType::Long | OperandType::Float => 8,
        }
    }
}

/// How control leaves an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    /// Continues with the next instruction
    Next,
    /// Method call, continues with the next instruction
    Call,
    /// Unconditional branch
    Branch,
    /// Conditional branch, falls through when not taken
    CondBranch,
    /// Jump table, falls through when no case matches
    Switch,
    /// `leave`: exits a protected region and empties the evaluation stack
    Leave,
    /// Ends the method or the current handler
    Return,
    /// Raises an exception
    Throw,
    /// Prefix that modifies the following instruction
    Meta,
}

impl FlowType {
    /// Whether the next instruction is a successor of this one.
    #[must_use]
    pub fn falls_through(self) -> bool {
        !matches!(
            self,
            FlowType::Branch | FlowType::Leave | FlowType::Return | FlowType::Throw
        )
    }
}

/// Number of stack slots an opcode pops or pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackBehaviour {
    /// A fixed number of slots
    Fixed(u8),
    /// Depends on the signature of the referenced method
    Variable,
}

/// Static description of one opcode.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpCode {
    /// Opcode value, `0xFExx` for two byte opcodes
    pub value: u16,
    /// Assembler mnemonic
    pub mnemonic: &'static str,
    /// Inline operand kind
    pub operand: OperandType,
    /// Control flow behaviour
    pub flow: FlowType,
    /// Slots popped
    pub pops: StackBehaviour,
    /// Slots pushed
    pub pushes: StackBehaviour,
}

impl OpCode {
    /// Whether this opcode is encoded with the `0xFE` prefix.
    #[must_use]
    pub fn is_two_byte(&self) -> bool {
        self.value > 0xFF
    }

    /// Encoded size of the opcode itself.
    #[must_use]
    pub fn size(&self) -> u32 {
        if self.is_two_byte() {
            2
        } else {
            1
        }
    }
}

impl fmt::Debug for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpCode({:#06x} {})", self.value, self.mnemonic)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic)
    }
}

macro_rules! stack {
    (VAR) => {
        StackBehaviour::Variable
    };
    ($count:literal) => {
        StackBehaviour::Fixed($count)
    };
}

macro_rules! opcodes {
    ($($name:ident = $value:literal, $mnemonic:literal, $operand:ident, $flow:ident, $pops:tt, $pushes:tt;)*) => {
        $(
            #[doc = concat!("`", $mnemonic, "`")]
            pub const $name: OpCode = OpCode {
                value: $value,
                mnemonic: $mnemonic,
                operand: OperandType::$operand,
                flow: FlowType::$flow,
                pops: stack!($pops),
                pushes: stack!($pushes),
            };
        )*

        /// Every opcode, ordered by value.
        pub static OPCODES: &[OpCode] = &[$($name),*];
    };
}

#[rustfmt::skip]
opcodes! {
    NOP = 0x00, "nop", None, Next, 0, 0;
    BREAK = 0x01, "break", None, Next, 0, 0;
    LDARG_0 = 0x02, "ldarg.0", None, Next, 0, 1;
    LDARG_1 = 0x03, "ldarg.1", None, Next, 0, 1;
    LDARG_2 = 0x04, "ldarg.2", None, Next, 0, 1;
    LDARG_3 = 0x05, "ldarg.3", None, Next, 0, 1;
    LDLOC_0 = 0x06, "ldloc.0", None, Next, 0, 1;
    LDLOC_1 = 0x07, "ldloc.1", None, Next, 0, 1;
    LDLOC_2 = 0x08, "ldloc.2", None, Next, 0, 1;
    LDLOC_3 = 0x09, "ldloc.3", None, Next, 0, 1;
    STLOC_0 = 0x0A, "stloc.0", None, Next, 1, 0;
    STLOC_1 = 0x0B, "stloc.1", None, Next, 1, 0;
    STLOC_2 = 0x0C, "stloc.2", None, Next, 1, 0;
    STLOC_3 = 0x0D, "stloc.3", None, Next, 1, 0;
    LDARG_S = 0x0E, "ldarg.s", ShortVar, Next, 0, 1;
    LDARGA_S = 0x0F, "ldarga.s", ShortVar, Next, 0, 1;
    STARG_S = 0x10, "starg.s", ShortVar, Next, 1, 0;
    LDLOC_S = 0x11, "ldloc.s", ShortVar, Next, 0, 1;
    LDLOCA_S = 0x12, "ldloca.s", ShortVar, Next, 0, 1;
    STLOC_S = 0x13, "stloc.s", ShortVar, Next, 1, 0;
    LDNULL = 0x14, "ldnull", None, Next, 0, 1;
    LDC_I4_M1 = 0x15, "ldc.i4.m1", None, Next, 0, 1;
    LDC_I4_0 = 0x16, "ldc.i4.0", None, Next, 0, 1;
    LDC_I4_1 = 0x17, "ldc.i4.1", None, Next, 0, 1;
    LDC_I4_2 = 0x18, "ldc.i4.2", None, Next, 0, 1;
    LDC_I4_3 = 0x19, "ldc.i4.3", None, Next, 0, 1;
    LDC_I4_4 = 0x1A, "ldc.i4.4", None, Next, 0, 1;
    LDC_I4_5 = 0x1B, "ldc.i4.5", None, Next, 0, 1;
    LDC_I4_6 = 0x1C, "ldc.i4.6", None, Next, 0, 1;
    LDC_I4_7 = 0x1D, "ldc.i4.7", None, Next, 0, 1;
    LDC_I4_8 = 0x1E, "ldc.i4.8", None, Next, 0, 1;
    LDC_I4_S = 0x1F, "ldc.i4.s", ShortInt, Next, 0, 1;
    LDC_I4 = 0x20, "ldc.i4", Int, Next, 0, 1;
    LDC_I8 = 0x21, "ldc.i8", Long, Next, 0, 1;
    LDC_R4 = 0x22, "ldc.r4", ShortFloat, Next, 0, 1;
    LDC_R8 = 0x23, "ldc.r8", Float, Next, 0, 1;
    DUP = 0x25, "dup", None, Next, 1, 2;
    POP = 0x26, "pop", None, Next, 1, 0;
    JMP = 0x27, "jmp", Token, Return, 0, 0;
    CALL = 0x28, "call", Token, Call, VAR, VAR;
    CALLI = 0x29, "calli", Token, Call, VAR, VAR;
    RET = 0x2A, "ret", None, Return, 0, 0;
    BR_S = 0x2B, "br.s", ShortBranch, Branch, 0, 0;
    BRFALSE_S = 0x2C, "brfalse.s", ShortBranch, CondBranch, 1, 0;
    BRTRUE_S = 0x2D, "brtrue.s", ShortBranch, CondBranch, 1, 0;
    BEQ_S = 0x2E, "beq.s", ShortBranch, CondBranch, 2, 0;
    BGE_S = 0x2F, "bge.s", ShortBranch, CondBranch, 2, 0;
    BGT_S = 0x30, "bgt.s", ShortBranch, CondBranch, 2, 0;
    BLE_S = 0x31, "ble.s", ShortBranch, CondBranch, 2, 0;
    BLT_S = 0x32, "blt.s", ShortBranch, CondBranch, 2, 0;
    BNE_UN_S = 0x33, "bne.un.s", ShortBranch, CondBranch, 2, 0;
    BGE_UN_S = 0x34, "bge.un.s", ShortBranch, CondBranch, 2, 0;
    BGT_UN_S = 0x35, "bgt.un.s", ShortBranch, CondBranch, 2, 0;
    BLE_UN_S = 0x36, "ble.un.s", ShortBranch, CondBranch, 2, 0;
    BLT_UN_S = 0x37, "blt.un.s", ShortBranch, CondBranch, 2, 0;
    BR = 0x38, "br", Branch, Branch, 0, 0;
    BRFALSE = 0x39, "brfalse", Branch, CondBranch, 1, 0;
    BRTRUE = 0x3A, "brtrue", Branch, CondBranch, 1, 0;
    BEQ = 0x3B, "beq", Branch, CondBranch, 2, 0;
    BGE = 0x3C, "bge", Branch, CondBranch, 2, 0;
    BGT = 0x3D, "bgt", Branch, CondBranch, 2, 0;
    BLE = 0x3E, "ble", Branch, CondBranch, 2, 0;
    BLT = 0x3F, "blt", Branch, CondBranch, 2, 0;
    BNE_UN = 0x40, "bne.un", Branch, CondBranch, 2, 0;
    BGE_UN = 0x41, "bge.un", Branch, CondBranch, 2, 0;
    BGT_UN = 0x42, "bgt.un", Branch, CondBranch, 2, 0;
    BLE_UN = 0x43, "ble.un", Branch, CondBranch, 2, 0;
    BLT_UN = 0x44, "blt.un", Branch, CondBranch, 2, 0;
    SWITCH = 0x45, "switch", Switch, Switch, 1, 0;
    LDIND_I1 = 0x46, "ldind.i1", None, Next, 1, 1;
    LDIND_U1 = 0x47, "ldind.u1", None, Next, 1, 1;
    LDIND_I2 = 0x48, "ldind.i2", None, Next, 1, 1;
    LDIND_U2 = 0x49, "ldind.u2", None, Next, 1, 1;
    LDIND_I4 = 0x4A, "ldind.i4", None, Next, 1, 1;
    LDIND_U4 = 0x4B, "ldind.u4", None, Next, 1, 1;
    LDIND_I8 = 0x4C, "ldind.i8", None, Next, 1, 1;
    LDIND_I = 0x4D, "ldind.i", None, Next, 1, 1;
    LDIND_R4 = 0x4E, "ldind.r4", None, Next, 1, 1;
    LDIND_R8 = 0x4F, "ldind.r8", None, Next, 1, 1;
    LDIND_REF = 0x50, "ldind.ref", None, Next, 1, 1;
    STIND_REF = 0x51, "stind.ref", None, Next, 2, 0;
    STIND_I1 = 0x52, "stind.i1", None, Next, 2, 0;
    STIND_I2 = 0x53, "stind.i2", None, Next, 2, 0;
    STIND_I4 = 0x54, "stind.i4", None, Next, 2, 0;
    STIND_I8 = 0x55, "stind.i8", None, Next, 2, 0;
    STIND_R4 = 0x56, "stind.r4", None, Next, 2, 0;
    STIND_R8 = 0x57, "stind.r8", None, Next, 2, 0;
    ADD = 0x58, "add", None, Next, 2, 1;
    SUB = 0x59, "sub", None, Next, 2, 1;
    MUL = 0x5A, "mul", None, Next, 2, 1;
    DIV = 0x5B, "div", None, Next, 2, 1;
    DIV_UN = 0x5C, "div.un", None, Next, 2, 1;
    REM = 0x5D, "rem", None, Next, 2, 1;
    REM_UN = 0x5E, "rem.un", None, Next, 2, 1;
    AND = 0x5F, "and", None, Next, 2, 1;
    OR = 0x60, "or", None, Next, 2, 1;
    XOR = 0x61, "xor", None, Next, 2, 1;
    SHL = 0x62, "shl", None, Next, 2, 1;
    SHR = 0x63, "shr", None, Next, 2, 1;
    SHR_UN = 0x64, "shr.un", None, Next, 2, 1;
    NEG = 0x65, "neg", None, Next, 1, 1;
    NOT = 0x66, "not", None, Next, 1, 1;
    CONV_I1 = 0x67, "conv.i1", None, Next, 1, 1;
    CONV_I2 = 0x68, "conv.i2", None, Next, 1, 1;
    CONV_I4 = 0x69, "conv.i4", None, Next, 1, 1;
    CONV_I8 = 0x6A, "conv.i8", None, Next, 1, 1;
    CONV_R4 = 0x6B, "conv.r4", None, Next, 1, 1;
    CONV_R8 = 0x6C, "conv.r8", None, Next, 1, 1;
    CONV_U4 = 0x6D, "conv.u4", None, Next, 1, 1;
    CONV_U8 = 0x6E, "conv.u8", None, Next, 1, 1;
    CALLVIRT = 0x6F, "callvirt", Token, Call, VAR, VAR;
    CPOBJ = 0x70, "cpobj", Token, Next, 2, 0;
    LDOBJ = 0x71, "ldobj", Token, Next, 1, 1;
    LDSTR = 0x72, "ldstr", Token, Next, 0, 1;
    NEWOBJ = 0x73, "newobj", Token, Call, VAR, 1;
    CASTCLASS = 0x74, "castclass", Token, Next, 1, 1;
    ISINST = 0x75, "isinst", Token, Next, 1, 1;
    CONV_R_UN = 0x76, "conv.r.un", None, Next, 1, 1;
    UNBOX = 0x79, "unbox", Token, Next, 1, 1;
    THROW = 0x7A, "throw", None, Throw, 1, 0;
    LDFLD = 0x7B, "ldfld", Token, Next, 1, 1;
    LDFLDA = 0x7C, "ldflda", Token, Next, 1, 1;
    STFLD = 0x7D, "stfld", Token, Next, 2, 0;
    LDSFLD = 0x7E, "ldsfld", Token, Next, 0, 1;
    LDSFLDA = 0x7F, "ldsflda", Token, Next, 0, 1;
    STSFLD = 0x80, "stsfld", Token, Next, 1, 0;
    STOBJ = 0x81, "stobj", Token, Next, 2, 0;
    CONV_OVF_I1_UN = 0x82, "conv.ovf.i1.un", None, Next, 1, 1;
    CONV_OVF_I2_UN = 0x83, "conv.ovf.i2.un", None, Next, 1, 1;
    CONV_OVF_I4_UN = 0x84, "conv.ovf.i4.un", None, Next, 1, 1;
    CONV_OVF_I8_UN = 0x85, "conv.ovf.i8.un", None, Next, 1, 1;
    CONV_OVF_U1_UN = 0x86, "conv.ovf.u1.un", None, Next, 1, 1;
    CONV_OVF_U2_UN = 0x87, "conv.ovf.u2.un", None, Next, 1, 1;
    CONV_OVF_U4_UN = 0x88, "conv.ovf.u4.un", None, Next, 1, 1;
    CONV_OVF_U8_UN = 0x89, "conv.ovf.u8.un", None, Next, 1, 1;
    CONV_OVF_I_UN = 0x8A, "conv.ovf.i.un", None, Next, 1, 1;
    CONV_OVF_U_UN = 0x8B, "conv.ovf.u.un", None, Next, 1, 1;
    BOX = 0x8C, "box", Token, Next, 1, 1;
    NEWARR = 0x8D, "newarr", Token, Next, 1, 1;
    LDLEN = 0x8E, "ldlen", None, Next, 1, 1;
    LDELEMA = 0x8F, "ldelema", Token, Next, 2, 1;
    LDELEM_I1 = 0x90, "ldelem.i1", None, Next, 2, 1;
    LDELEM_U1 = 0x91, "ldelem.u1", None, Next, 2, 1;
    LDELEM_I2 = 0x92, "ldelem.i2", None, Next, 2, 1;
    LDELEM_U2 = 0x93, "ldelem.u2", None, Next, 2, 1;
    LDELEM_I4 = 0x94, "ldelem.i4", None, Next, 2, 1;
    LDELEM_U4 = 0x95, "ldelem.u4", None, Next, 2, 1;
    LDELEM_I8 = 0x96, "ldelem.i8", None, Next, 2, 1;
    LDELEM_I = 0x97, "ldelem.i", None, Next, 2, 1;
    LDELEM_R4 = 0x98, "ldelem.r4", None, Next, 2, 1;
    LDELEM_R8 = 0x99, "ldelem.r8", None, Next, 2, 1;
    LDELEM_REF = 0x9A, "ldelem.ref", None, Next, 2, 1;
    STELEM_I = 0x9B, "stelem.i", None, Next, 3, 0;
    STELEM_I1 = 0x9C, "stelem.i1", None, Next, 3, 0;
    STELEM_I2 = 0x9D, "stelem.i2", None, Next, 3, 0;
    STELEM_I4 = 0x9E, "stelem.i4", None, Next, 3, 0;
    STELEM_I8 = 0x9F, "stelem.i8", None, Next, 3, 0;
    STELEM_R4 = 0xA0, "stelem.r4", None, Next, 3, 0;
    STELEM_R8 = 0xA1, "stelem.r8", None, Next, 3, 0;
    STELEM_REF = 0xA2, "stelem.ref", None, Next, 3, 0;
    LDELEM = 0xA3, "ldelem", Token, Next, 2, 1;
    STELEM = 0xA4, "stelem", Token, Next, 3, 0;
    UNBOX_ANY = 0xA5, "unbox.any", Token, Next, 1, 1;
    CONV_OVF_I1 = 0xB3, "conv.ovf.i1", None, Next, 1, 1;
    CONV_OVF_U1 = 0xB4, "conv.ovf.u1", None, Next, 1, 1;
    CONV_OVF_I2 = 0xB5, "conv.ovf.i2", None, Next, 1, 1;
    CONV_OVF_U2 = 0xB6, "conv.ovf.u2", None, Next, 1, 1;
    CONV_OVF_I4 = 0xB7, "conv.ovf.i4", None, Next, 1, 1;
    CONV_OVF_U4 = 0xB8, "conv.ovf.u4", None, Next, 1, 1;
    CONV_OVF_I8 = 0xB9, "conv.ovf.i8", None, Next, 1, 1;
    CONV_OVF_U8 = 0xBA, "conv.ovf.u8", None, Next, 1, 1;
    REFANYVAL = 0xC2, "refanyval", Token, Next, 1, 1;
    CKFINITE = 0xC3, "ckfinite", None, Next, 1, 1;
    MKREFANY = 0xC6, "mkrefany", Token, Next, 1, 1;
    LDTOKEN = 0xD0, "ldtoken", Token, Next, 0, 1;
    CONV_U2 = 0xD1, "conv.u2", None, Next, 1, 1;
    CONV_U1 = 0xD2, "conv.u1", None, Next, 1, 1;
    CONV_I = 0xD3, "conv.i", None, Next, 1, 1;
    CONV_OVF_I = 0xD4, "conv.ovf.i", None, Next, 1, 1;
    CONV_OVF_U = 0xD5, "conv.ovf.u", None, Next, 1, 1;
    ADD_OVF = 0xD6, "add.ovf", None, Next, 2, 1;
    ADD_OVF_UN = 0xD7, "add.ovf.un", None, Next, 2, 1;
    MUL_OVF = 0xD8, "mul.ovf", None, Next, 2, 1;
    MUL_OVF_UN = 0xD9, "mul.ovf.un", None, Next, 2, 1;
    SUB_OVF = 0xDA, "sub.ovf", None, Next, 2, 1;
    SUB_OVF_UN = 0xDB, "sub.ovf.un", None, Next, 2, 1;
    ENDFINALLY = 0xDC, "endfinally", None, Return, 0, 0;
    LEAVE = 0xDD, "leave", Branch, Leave, 0, 0;
    LEAVE_S = 0xDE, "leave.s", ShortBranch, Leave, 0, 0;
    STIND_I = 0xDF, "stind.i", None, Next, 2, 0;
    CONV_U = 0xE0, "conv.u", None, Next, 1, 1;
    ARGLIST = 0xFE00, "arglist", None, Next, 0, 1;
    CEQ = 0xFE01, "ceq", None, Next, 2, 1;
    CGT = 0xFE02, "cgt", None, Next, 2, 1;
    CGT_UN = 0xFE03, "cgt.un", None, Next, 2, 1;
    CLT = 0xFE04, "clt", None, Next, 2, 1;
    CLT_UN = 0xFE05, "clt.un", None, Next, 2, 1;
    LDFTN = 0xFE06, "ldftn", Token, Next, 0, 1;
    LDVIRTFTN = 0xFE07, "ldvirtftn", Token, Next, 1, 1;
    LDARG = 0xFE09, "ldarg", Var, Next, 0, 1;
    LDARGA = 0xFE0A, "ldarga", Var, Next, 0, 1;
    STARG = 0xFE0B, "starg", Var, Next, 1, 0;
    LDLOC = 0xFE0C, "ldloc", Var, Next, 0, 1;
    LDLOCA = 0xFE0D, "ldloca", Var, Next, 0, 1;
    STLOC = 0xFE0E, "stloc", Var, Next, 1, 0;
    LOCALLOC = 0xFE0F, "localloc", None, Next, 1, 1;
    ENDFILTER = 0xFE11, "endfilter", None, Return, 1, 0;
    UNALIGNED = 0xFE12, "unaligned.", UInt8, Meta, 0, 0;
    VOLATILE = 0xFE13, "volatile.", None, Meta, 0, 0;
    TAIL = 0xFE14, "tail.", None, Meta, 0, 0;
    INITOBJ = 0xFE15, "initobj", Token, Next, 1, 0;
    CONSTRAINED = 0xFE16, "constrained.", Token, Meta, 0, 0;
    CPBLK = 0xFE17, "cpblk", None, Next, 3, 0;
    INITBLK = 0xFE18, "initblk", None, Next, 3, 0;
    NO = 0xFE19, "no.", UInt8, Meta, 0, 0;
    RETHROW = 0xFE1A, "rethrow", None, Throw, 0, 0;
    SIZEOF = 0xFE1C, "sizeof", Token, Next, 0, 1;
    REFANYTYPE = 0xFE1D, "refanytype", None, Next, 1, 1;
    READONLY = 0xFE1E, "readonly.", None, Meta, 0, 0;
}

/// The opcode with the given value.
#[must_use]
pub fn lookup(value: u16) -> Option<OpCode> {
    OPCODES
        .binary_search_by_key(&value, |opcode| opcode.value)
        .ok()
        .map(|index| OPCODES[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in OPCODES.windows(2) {
            assert!(pair[0].value < pair[1].value, "{:?} {:?}", pair[0], pair[1]);
        }
        assert_eq!(OPCODES.len(), 219);
    }

    #[test]
    fn lookup_both_opcode_spaces() {
        assert_eq!(lookup(0x2A), Some(RET));
        assert_eq!(lookup(0xFE01), Some(CEQ));
        assert_eq!(lookup(0x24), None);
        assert_eq!(lookup(0xFE08), None);
        assert_eq!(lookup(0xE1), None);
    }

    #[test]
    fn descriptions() {
        assert_eq!(LDC_I4_S.operand, OperandType::ShortInt);
        assert_eq!(LDC_I4_S.mnemonic, "ldc.i4.s");
        assert_eq!(BR_S.flow, FlowType::Branch);
        assert!(!BR_S.flow.falls_through());
        assert!(BRTRUE.flow.falls_through());
        assert_eq!(DUP.pops, StackBehaviour::Fixed(1));
        assert_eq!(DUP.pushes, StackBehaviour::Fixed(2));
        assert_eq!(CALL.pops, StackBehaviour::Variable);
        assert!(LDLOC.is_two_byte());
        assert_eq!(LDLOC.size() + LDLOC.operand.size(), 4);
        assert_eq!(UNALIGNED.to_string(), "unaligned.");
    }
}

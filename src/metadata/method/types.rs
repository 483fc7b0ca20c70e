//! Header and section flags of method bodies (ECMA-335 II.25.4).

use bitflags::bitflags;

/// Largest code size a tiny header can describe.
pub const TINY_MAX_CODE_SIZE: usize = 63;
/// Max stack implied by a tiny header.
pub const TINY_MAX_STACK: u16 = 8;
/// Size of a fat header in bytes.
pub const FAT_HEADER_SIZE: usize = 12;
/// Fat header size in 4-byte units, as stored in the upper nibble of the flags word.
pub const FAT_HEADER_DWORDS: u16 = 3;

bitflags! {
    /// Flags in the low 12 bits of the first header word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodBodyFlags: u16 {
        /// Tiny header
        const TINY_FORMAT = 0x2;
        /// Fat header
        const FAT_FORMAT = 0x3;
        /// Data sections follow the code
        const MORE_SECTS = 0x8;
        /// Zero initialize all locals
        const INIT_LOCALS = 0x10;
    }
}

bitflags! {
    /// Flags of an extra data section header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u8 {
        /// Exception handling table
        const EHTABLE = 0x1;
        /// Reserved, must be clear
        const OPT_ILTABLE = 0x2;
        /// 24-bit section size and fat clauses
        const FAT_FORMAT = 0x40;
        /// Another section follows
        const MORE_SECTS = 0x80;
    }
}

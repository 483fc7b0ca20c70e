use thiserror::Error;

use crate::metadata::{
    generic::GenericParameterKind,
    method::InvalidLabel,
    tables::{CodedIndexType, TableId},
    token::Token,
};

/// Helper macro for generating [`Error::Malformed`] values with source location.
///
/// ```rust, ignore
/// return Err(malformed_error!("Invalid section flags - {:#x}", flags));
/// ```
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Helper macro for generating [`Error::OutOfBounds`] values with source location.
///
/// ```rust, ignore
/// return Err(out_of_bounds_error!());
/// ```
macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Malformed individual values (a broken coded index inside a signature, a token that points past
/// the end of its table) are *not* reported through this type. They degrade to placeholder values
/// such as [`crate::metadata::signatures::TypeSignature::Invalid`] or to a `None` lookup so that
/// one bad reference does not abort loading a whole module. The variants below cover structural
/// failures where no meaningful continuation exists.
///
/// # Error Categories
///
/// ## Binary Decoding Errors
/// - [`Error::Malformed`] - Corrupted or invalid structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the provided data
/// - [`Error::InvalidCodedIndexTag`] - Coded index tag outside of its candidate table list
/// - [`Error::RidOutOfRange`] - Row id beyond the row count of its table
/// - [`Error::InvalidOpcode`] - Unknown opcode in an instruction stream
/// - [`Error::NotImplemented`] - Production that has no representation (function pointers)
/// - [`Error::RecursionLimit`] - Signature nested deeper than the configured limit
///
/// ## Generic Activation Errors
/// - [`Error::MissingGenericProvider`] - No argument provider for the parameter's kind
/// - [`Error::GenericArgumentOutOfRange`] - Parameter index past the provider's argument list
///
/// ## Method Body Errors
/// - [`Error::InvalidLabels`] - Every branch or handler boundary that misses an instruction start
/// - [`Error::StackImbalance`] - Two control-flow paths disagree on the stack depth
/// - [`Error::StackUnderflow`] - An instruction pops more values than the stack holds
/// - [`Error::BranchOutOfRange`] - A short branch whose displacement does not fit in one byte
///
/// # Examples
///
/// ```rust
/// use cilgraph::{Error, metadata::method::RawMethodBody};
///
/// match RawMethodBody::read(&[0x03, 0x30]) {
///     Ok(body) => println!("{} code bytes", body.code.len()),
///     Err(Error::OutOfBounds { .. }) => eprintln!("truncated body"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed body: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The data is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A coded index carried a tag that does not select any candidate table.
    #[error("Invalid tag {tag} for coded index {kind:?}")]
    InvalidCodedIndexTag {
        /// The coded index kind that was decoded
        kind: CodedIndexType,
        /// The offending tag value
        tag: u32,
    },

    /// A row id points past the end of its table.
    ///
    /// Distinct from [`Error::InvalidCodedIndexTag`] so callers can decide whether a
    /// dangling reference is fatal, invalid or simply treated as null.
    #[error("Row {rid} is out of range for table {table:?} with {rows} rows")]
    RidOutOfRange {
        /// The table the row id refers to
        table: TableId,
        /// The offending row id
        rid: u32,
        /// Number of rows the table actually holds
        rows: u32,
    },

    /// Encountered a byte sequence that is not a valid opcode.
    #[error("Invalid opcode {opcode:#06x} at offset {offset:#x}")]
    InvalidOpcode {
        /// Offset of the opcode within the instruction stream
        offset: u32,
        /// The opcode, two-byte opcodes carry their 0xFE prefix in the high byte
        opcode: u16,
    },

    /// The encountered production has no representation in this library.
    #[error("Not implemented - {0}")]
    NotImplemented(&'static str),

    /// Recursion limit reached.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// A generic parameter was activated without an argument provider for its kind.
    #[error("No generic argument provider for {0:?} parameters")]
    MissingGenericProvider(GenericParameterKind),

    /// A generic parameter index exceeds the provider's argument count.
    #[error("Generic {kind:?} parameter {index} is out of range, provider has {count} arguments")]
    GenericArgumentOutOfRange {
        /// Kind of the generic parameter
        kind: GenericParameterKind,
        /// Index of the parameter
        index: u32,
        /// Number of arguments the provider supplies
        count: usize,
    },

    /// One or more branch targets or exception handler boundaries do not start an instruction.
    ///
    /// Every violation found during verification is reported, not just the first.
    #[error("Method body contains {} invalid label(s)", .0.len())]
    InvalidLabels(Vec<InvalidLabel>),

    /// Two control-flow paths reach the same instruction with different stack depths.
    #[error("Stack imbalance at offset {offset:#x}: expected depth {expected}, found {actual}")]
    StackImbalance {
        /// Offset of the instruction where the paths merge
        offset: u32,
        /// Depth recorded by the first path
        expected: u32,
        /// Depth produced by the conflicting path
        actual: u32,
    },

    /// An instruction pops more values than the evaluation stack holds.
    #[error("Stack underflow at offset {offset:#x}")]
    StackUnderflow {
        /// Offset of the offending instruction
        offset: u32,
    },

    /// A short-form branch targets an offset that does not fit a signed byte displacement.
    #[error("Branch at offset {offset:#x} cannot reach target {target:#x} with a short displacement")]
    BranchOutOfRange {
        /// Offset of the branch instruction
        offset: u32,
        /// The target offset
        target: u32,
    },

    /// A token referenced a member of the wrong kind for its position.
    #[error("Unexpected member for token {0}")]
    UnexpectedMember(Token),
}

//! # cilgraph Prelude
//!
//! The types most code working with `cilgraph` needs, for a single glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilgraph operations
pub use crate::Error;

/// The result type used throughout cilgraph
pub use crate::Result;

/// Loader and body build configuration
pub use crate::config::LoaderConfig;

/// Low-level reading and writing
pub use crate::{file::writer::BlobWriter, Parser};

// ================================================================================================
// Tokens, Tables and Heaps
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Table kinds, coded indices and row storage
pub use crate::metadata::tables::{
    CodedIndexType, MetadataTable, MetadataTables, SortedRow, TableId, TableInfo,
    TableRow,
};

/// Metadata heaps
pub use crate::metadata::streams::{Blob, Guid, Heaps, Strings, UserStrings};

// ================================================================================================
// Resolution Graph
// ================================================================================================

/// The graph and its member wrappers
pub use crate::metadata::graph::{
    EventDefinition, ExportedType, FieldDefinition, GenericParameter, InterfaceImplementation,
    LazyField, Member, MemberReference, MethodBodySource, MethodDefinition, MethodImplementation,
    MethodSpecification, ModuleGraph, PropertyDefinition, SecurityDeclaration,
    StandAloneSignature, TypeDefinition, TypeReference, TypeSpecification,
};

// ================================================================================================
// Signatures and Generics
// ================================================================================================

/// Signature trees and their codecs
pub use crate::metadata::signatures::{
    parse_field_signature, parse_local_var_signature, parse_method_signature,
    parse_method_spec_signature, parse_property_signature, parse_type_spec_signature,
    FieldSignature, InvalidCause, LocalVariablesSignature, MethodSignature, MethodSpecSignature,
    PropertySignature, SignatureParser, SignatureWriter, TypeSignature,
};

/// Generic activation
pub use crate::metadata::generic::{
    instantiate, GenericArgumentProvider, GenericContext, GenericParameterKind, Instantiate,
};

// ================================================================================================
// Instructions and Method Bodies
// ================================================================================================

/// CIL instruction decoding and encoding
pub use crate::assembly::{
    decode_instruction, decode_stream, encode_stream, CilInstruction, CilOperand, FlowType,
    OpCode, StackEffect,
};

/// Method bodies
pub use crate::metadata::method::{
    CilExceptionHandler, CilMethodBody, ExceptionHandlerFlags, InvalidLabel, RawMethodBody,
};

// ================================================================================================
// Table Rebuilding
// ================================================================================================

/// Table buffers and token fix-up
pub use crate::builder::{AppendTableBuffer, RemapTokens, SortedTableBuffer, TableBuffer, TokenRemap};

//! Signature blobs: the type grammar and its method, field, property and local variable forms.
//!
//! Signatures describe types in a compact prefix encoding: a single element type byte selects a
//! production, followed by coded indices, compressed integers and nested types. Decoding never
//! aborts on a single bad reference. A type index that does not resolve, a `TypeSpec` in a
//! position that requires a definition or reference, and a `TypeSpec` that contains itself all
//! become [`TypeSignature::Invalid`] nodes carrying an [`InvalidCause`].
//!
//! # Key Components
//!
//! - [`TypeSignature`] - the decoded type tree
//! - [`SignatureParser`] - decoder, optionally backed by a [`TypeResolver`]
//! - [`SignatureWriter`] - encoder, the inverse of the parser
//! - [`AttributeType`] - the reduced grammar of custom attribute arguments
//! - [`TypeName`] - reflection type names used by attribute enum arguments
//!
//! # Examples
//!
//! ```rust
//! use cilgraph::metadata::signatures::{parse_method_signature, encode_method_signature, TypeSignature};
//!
//! // instance int32 (string)
//! let blob = [0x20, 0x01, 0x08, 0x0E];
//! let method = parse_method_signature(&blob)?;
//! assert!(method.has_this);
//! assert_eq!(method.params, vec![TypeSignature::String]);
//! assert_eq!(encode_method_signature(&method)?, blob);
//! # Ok::<(), cilgraph::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures
//! - ECMA-335 6th Edition, Partition II, Section 23.3 - Custom Attributes

mod attribute;
mod parser;
mod typename;
mod types;
mod writer;

pub use attribute::{AttributeType, NamedArgumentHeader};
pub use parser::{SignatureParser, TypeResolver, TypeSpecGuard, MAX_RECURSION_DEPTH};
pub use typename::{
    AssemblyName, TypeName, TypeNameLexer, TypeNameSuffix, TypeNameTerminal, TypeNameToken,
};
pub use types::*;
pub use writer::{
    encode_field_signature, encode_local_var_signature, encode_method_signature,
    encode_method_spec_signature, encode_property_signature, encode_type_signature,
    SignatureWriter,
};

use crate::Result;

/// Parse a `MethodSignature` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_method_signature(data: &[u8]) -> Result<MethodSignature> {
    SignatureParser::new(data).parse_method_signature()
}

/// Parse a `FieldSignature` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_field_signature(data: &[u8]) -> Result<FieldSignature> {
    SignatureParser::new(data).parse_field_signature()
}

/// Parse a `PropertySignature` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_property_signature(data: &[u8]) -> Result<PropertySignature> {
    SignatureParser::new(data).parse_property_signature()
}

/// Parse a `LocalVariablesSignature` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_local_var_signature(data: &[u8]) -> Result<LocalVariablesSignature> {
    SignatureParser::new(data).parse_local_var_signature()
}

/// Parse a `TypeSpec` blob from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_type_spec_signature(data: &[u8]) -> Result<TypeSignature> {
    SignatureParser::new(data).parse_type()
}

/// Parse a `MethodSpecSignature` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_method_spec_signature(data: &[u8]) -> Result<MethodSpecSignature> {
    SignatureParser::new(data).parse_method_spec_signature()
}

// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # cilgraph
//!
//! Codec and lazy object graph for ECMA-335 (.NET) metadata. `cilgraph` turns the raw rows and
//! heaps of a module into identity-unique member objects, parses and writes the signature blob
//! grammar, decodes and re-encodes CIL method bodies and rebuilds metadata tables whose rows
//! must be sorted.
//!
//! The crate works on metadata that was already located by a container parser. Reading PE
//! headers is out of scope.
//!
//! ## Features
//!
//! - **Token codec** - tokens, coded indices and width-dependent row encoding for every table kind
//! - **Resolution graph** - one cached wrapper per token, lazily decoded fields, cache reset
//! - **Signatures** - type, method, field, property, local and method-spec signatures with
//!   explicit placeholders for malformed input
//! - **Generics** - instantiation of signature trees against type and method arguments
//! - **Method bodies** - tiny and fat headers, exception clauses, label verification and max
//!   stack computation
//! - **Table buffers** - append and sort-on-flush buffers with token fix-up
//!
//! ## Quick Start
//!
//! ```rust
//! use cilgraph::prelude::*;
//!
//! // ldc.i4.1 ldc.i4.2 add ret
//! let mut body = CilMethodBody::new();
//! body.instructions = decode_stream(&[0x17, 0x18, 0x58, 0x2A])?;
//!
//! let raw = body.build()?;
//! assert!(!raw.is_fat);
//! assert_eq!(raw.max_stack, 2);
//!
//! let signature = parse_method_signature(&[0x20, 0x01, 0x08, 0x0E])?;
//! assert!(signature.has_this);
//! assert_eq!(signature.params.len(), 1);
//! # Ok::<(), cilgraph::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`metadata`] - Tokens, tables, heaps, signatures, generics, the graph and method bodies
//! - [`assembly`] - CIL opcode table, instruction decoder and encoder
//! - [`builder`] - Table buffers and token remapping
//! - [`config`] - Loader configuration presets
//! - [`file`] - Byte-level reader and writer
//! - [`prelude`] - Commonly used re-exports
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. Invalid signature
//! placeholders, unresolved operands and failed label or stack checks are reported at `warn`
//! level, buffer flushes and cache resets at `debug`, identity-cache misses at `trace`. The
//! library never installs a logger.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Byte-level reader, writer and endian primitives the codecs are built on.
pub mod file;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use cilgraph::prelude::*;
///
/// let token = Token::from_parts(TableId::TypeDef, 2);
/// assert_eq!(token.value(), 0x0200_0002);
/// ```
pub mod prelude;

/// CIL instruction set: opcode table, decoder and encoder.
///
/// # Key Types
///
/// - [`assembly::CilInstruction`] - One instruction with its absolute offset
/// - [`assembly::CilOperand`] - Immediate, local index, branch target or token operand
/// - [`assembly::OpCode`] - Static description of an opcode
///
/// # Examples
///
/// ```rust
/// use cilgraph::{assembly::decode_instruction, Parser};
///
/// let mut parser = Parser::new(&[0x2B, 0x02, 0x00, 0x00, 0x2A]);
/// let branch = decode_instruction(&mut parser)?;
/// assert_eq!(branch.branch_targets(), vec![4]);
/// # Ok::<(), cilgraph::Error>(())
/// ```
pub mod assembly;

/// Table buffers for rebuilding metadata tables and fixing up the tokens they reorder.
pub mod builder;

/// Knobs for reading modules and building method bodies.
pub mod config;

/// ECMA-335 metadata: tokens, tables, heaps, signatures, generics, the graph and method bodies.
pub mod metadata;

/// `cilgraph` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cilgraph` Error type
///
/// # Examples
///
/// ```rust
/// use cilgraph::{metadata::signatures::parse_method_signature, Error};
///
/// match parse_method_signature(&[0x00, 0x05]) {
///     Err(Error::OutOfBounds { .. }) => {}
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;

/// Bounds-checked cursor over a byte slice.
pub use file::parser::Parser;

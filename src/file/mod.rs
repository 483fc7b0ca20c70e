//! Byte-level reading and writing primitives.
//!
//! Container parsing (PE headers, section tables, data directories) is outside the scope of this
//! crate. This module only supplies the byte-addressable reader and writer the metadata codecs
//! are built on.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor over a byte slice
//! - [`crate::file::writer::BlobWriter`] - Growable little-endian byte sink
//! - [`crate::file::io`] - Endian-aware primitives and compressed integer encoding

pub mod io;
pub mod parser;
pub mod writer;

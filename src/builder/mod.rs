//! Table buffers for writing a modified module back to tables.
//!
//! [`AppendTableBuffer`] keeps rows in insertion order. [`SortedTableBuffer`] orders rows by
//! their key column on flush, which invalidates the tokens handed out while adding; the
//! [`TokenRemap`] returned by the flush is applied with [`RemapTokens`] to everything that
//! captured such a token.
//!
//! ```rust
//! use cilgraph::{
//!     builder::{RemapTokens, SortedTableBuffer, TableBuffer},
//!     metadata::tables::{MetadataTables, NestedClassRaw},
//! };
//!
//! let mut buffer = SortedTableBuffer::new();
//! let mut later = buffer.add(NestedClassRaw { nested_class: 3, enclosing_class: 1, ..Default::default() }, 0);
//! let mut earlier = buffer.add(NestedClassRaw { nested_class: 2, enclosing_class: 1, ..Default::default() }, 0);
//!
//! let mut tables = MetadataTables::new();
//! let remap = buffer.flush_to_table(&mut tables);
//! later.remap_tokens(&remap);
//! earlier.remap_tokens(&remap);
//! assert_eq!((earlier.row(), later.row()), (1, 2));
//! ```

mod buffer;
mod remap;

pub use buffer::{AppendTableBuffer, SortedTableBuffer, TableBuffer};
pub use remap::{RemapTokens, TokenRemap};

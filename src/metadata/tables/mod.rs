//! Metadata tables: table kinds, coded indices, column widths and row storage.
//!
//! # Key Components
//!
//! - [`TableId`] - the table kinds and their numbers
//! - [`CodedIndexType`] - candidate table lists and the tag/row id codec for coded indices
//! - [`TableInfo`] - column widths derived from row counts and heap size flags
//! - [`MetadataTable`] - the rows of one table kind, readable and writable in binary form
//! - [`MetadataTables`] - all rows of one module, doubling as the row-count oracle
//!
//! # Examples
//!
//! ```rust
//! use cilgraph::metadata::tables::{MetadataTable, TableId, TableInfo, TypeRefRaw};
//!
//! let data = [0x06, 0x00, 0x10, 0x00, 0x20, 0x00];
//! let sizes = TableInfo::from_counts(&[(TableId::TypeRef, 1)], 0);
//! let table = MetadataTable::<TypeRefRaw>::read(&data, 1, &sizes)?;
//! assert_eq!(table.get(1).map(|row| row.type_name), Some(0x10));
//! # Ok::<(), cilgraph::Error>(())
//! ```

mod codedindex;
mod metadatatables;
mod rows;
mod table;
mod tableid;
mod tableinfo;

pub use codedindex::{CodedIndexType, RowCounts};
pub use metadatatables::MetadataTables;
pub use rows::*;
pub use table::{MetadataTable, RowReadable, RowWritable, SortedRow, TableRow};
pub use tableid::TableId;
pub use tableinfo::{TableInfo, TableInfoRef, HEAP_SIZE_BLOB, HEAP_SIZE_GUID, HEAP_SIZE_STRINGS};

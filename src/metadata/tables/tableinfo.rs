use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::tables::{CodedIndexType, RowCounts, TableId};

/// Column width information for reading and writing rows.
///
/// Row layouts depend on the size of the whole module: a simple table index is 4 bytes wide
/// once the referenced table holds 2^16 rows or more, a coded index once any candidate
/// exceeds the capacity left after the tag bits, and heap indices follow the `HeapSizes` flags
/// of the tables stream header. `TableInfo` captures all of that once so that every
/// [`crate::metadata::tables::RowReadable::row_size`] call is a handful of lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    rows: [u32; TableId::COUNT],
    coded_indexes: [bool; CodedIndexType::COUNT],
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// A reference to [`TableInfo`], shared between all tables of one module.
pub type TableInfoRef = Arc<TableInfo>;

/// `HeapSizes` flag: the strings heap needs 4 byte indices.
pub const HEAP_SIZE_STRINGS: u8 = 0x01;
/// `HeapSizes` flag: the GUID heap needs 4 byte indices.
pub const HEAP_SIZE_GUID: u8 = 0x02;
/// `HeapSizes` flag: the blob heap needs 4 byte indices.
pub const HEAP_SIZE_BLOB: u8 = 0x04;

impl TableInfo {
    /// Build the width information from row counts and the `HeapSizes` flag byte.
    #[must_use]
    pub fn new(counts: &impl RowCounts, heap_sizes: u8) -> Self {
        let mut rows = [0u32; TableId::COUNT];
        for table in TableId::iter() {
            rows[table as usize] = counts.row_count(table);
        }

        let mut info = TableInfo {
            rows,
            coded_indexes: [false; CodedIndexType::COUNT],
            is_large_index_str: heap_sizes & HEAP_SIZE_STRINGS != 0,
            is_large_index_guid: heap_sizes & HEAP_SIZE_GUID != 0,
            is_large_index_blob: heap_sizes & HEAP_SIZE_BLOB != 0,
        };

        let mut coded_indexes = [false; CodedIndexType::COUNT];
        for kind in CodedIndexType::iter() {
            coded_indexes[kind as usize] = kind.is_large(&info);
        }
        info.coded_indexes = coded_indexes;
        info
    }

    /// Build the width information from an explicit list of row counts.
    #[must_use]
    pub fn from_counts(counts: &[(TableId, u32)], heap_sizes: u8) -> Self {
        struct Listed<'a>(&'a [(TableId, u32)]);

        impl RowCounts for Listed<'_> {
            fn row_count(&self, table: TableId) -> u32 {
                self.0
                    .iter()
                    .find(|(candidate, _)| *candidate == table)
                    .map_or(0, |(_, rows)| *rows)
            }
        }

        Self::new(&Listed(counts), heap_sizes)
    }

    /// Whether a simple index into `table` is 4 bytes wide.
    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.rows[table as usize] > u32::from(u16::MAX)
    }

    /// Byte width of a simple index into `table`.
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u8 {
        if self.is_large(table) {
            4
        } else {
            2
        }
    }

    /// Whether a coded index of `kind` is 4 bytes wide.
    #[must_use]
    pub fn is_large_coded(&self, kind: CodedIndexType) -> bool {
        self.coded_indexes[kind as usize]
    }

    /// Byte width of a coded index of `kind`.
    #[must_use]
    pub fn coded_index_bytes(&self, kind: CodedIndexType) -> u8 {
        if self.is_large_coded(kind) {
            4
        } else {
            2
        }
    }

    /// Whether strings heap indices are 4 bytes wide.
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// Whether GUID heap indices are 4 bytes wide.
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// Whether blob heap indices are 4 bytes wide.
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Byte width of a strings heap index.
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    /// Byte width of a GUID heap index.
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    /// Byte width of a blob heap index.
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }
}

impl RowCounts for TableInfo {
    fn row_count(&self, table: TableId) -> u32 {
        self.rows[table as usize]
    }
}

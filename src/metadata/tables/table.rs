//! Row traits and the generic row container for one table kind.
//!
//! Every raw row struct implements [`RowReadable`] and [`RowWritable`] to move between its binary
//! form and its column values, and [`TableRow`] to declare which table it belongs to and where it
//! lives inside [`crate::metadata::tables::MetadataTables`]. Tables whose rows must be ordered by a
//! key column additionally implement [`SortedRow`].

use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::{
        tables::{CodedIndexType, MetadataTables, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// Decoding of one row from its binary representation.
pub trait RowReadable: Sized {
    /// Size of one encoded row in bytes for the given column widths.
    fn row_size(sizes: &TableInfo) -> u32;

    /// Read one row at `offset`, advancing it past the row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for truncated data and
    /// [`crate::Error::InvalidCodedIndexTag`] for coded index columns with a bad tag.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self>;
}

/// Encoding of one row into its binary representation.
pub trait RowWritable {
    /// Append the encoded row to `writer`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a column value does not fit its width or a coded
    /// index column holds a token outside the column's candidate tables.
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()>;
}

/// Binding between a row struct and its table kind.
pub trait TableRow: RowReadable + RowWritable + Clone {
    /// The table this row type belongs to.
    const TABLE: TableId;

    /// 1-based row id of this row.
    fn rid(&self) -> u32;

    /// Assign the row id (and the token derived from it).
    fn set_rid(&mut self, rid: u32);

    /// Token addressing this row.
    fn token(&self) -> Token {
        Token::from_parts(Self::TABLE, self.rid())
    }

    /// The table holding rows of this type.
    fn table(tables: &MetadataTables) -> &MetadataTable<Self>;

    /// The table holding rows of this type, mutably.
    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self>;
}

/// Rows of tables that the format requires to be sorted.
pub trait SortedRow: TableRow {
    /// Key type rows are ordered by.
    type Key: Ord;

    /// The sort key of this row, typically its owner column.
    fn sort_key(&self) -> Self::Key;
}

/// Read a coded index column.
pub(crate) fn read_coded(
    data: &[u8],
    offset: &mut usize,
    sizes: &TableInfo,
    kind: CodedIndexType,
) -> Result<Token> {
    let value = read_le_at_dyn(data, offset, sizes.is_large_coded(kind))?;
    Ok(kind.decode(value)?.unwrap_or_default())
}

/// Write a coded index column.
pub(crate) fn write_coded(
    writer: &mut BlobWriter,
    sizes: &TableInfo,
    kind: CodedIndexType,
    token: Token,
) -> Result<()> {
    writer.write_le_dyn(kind.encode(token)?, sizes.is_large_coded(kind))
}

/// The rows of one table kind, in row id order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable<R> {
    rows: Vec<R>,
}

impl<R> Default for MetadataTable<R> {
    fn default() -> Self {
        MetadataTable { rows: Vec::new() }
    }
}

impl<R: TableRow> MetadataTable<R> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `row_count` consecutive rows from `data`.
    ///
    /// # Errors
    /// Propagates the first row decoding failure.
    pub fn read(data: &[u8], row_count: u32, sizes: &TableInfo) -> Result<Self> {
        let mut offset = 0;
        let mut rows = Vec::with_capacity(row_count as usize);
        for rid in 1..=row_count {
            rows.push(R::row_read(data, &mut offset, rid, sizes)?);
        }
        Ok(MetadataTable { rows })
    }

    /// Encode every row in order.
    ///
    /// # Errors
    /// Propagates the first row encoding failure.
    pub fn write(&self, sizes: &TableInfo) -> Result<Vec<u8>> {
        let mut writer = BlobWriter::with_capacity(self.rows.len() * R::row_size(sizes) as usize);
        for row in &self.rows {
            row.row_write(&mut writer, sizes)?;
        }
        Ok(writer.into_inner())
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by 1-based row id.
    #[must_use]
    pub fn get(&self, rid: u32) -> Option<&R> {
        rid.checked_sub(1).and_then(|index| self.rows.get(index as usize))
    }

    /// Replace the row at `rid`, returning the previous row.
    ///
    /// Member wrappers already cached for this row keep their lazily computed values until
    /// their cache is cleared.
    pub fn replace(&mut self, rid: u32, mut row: R) -> Option<R> {
        let slot = rid
            .checked_sub(1)
            .and_then(|index| self.rows.get_mut(index as usize))?;
        row.set_rid(rid);
        Some(std::mem::replace(slot, row))
    }

    /// Append a row, assigning it the next row id, and return its token.
    pub fn push(&mut self, mut row: R) -> Token {
        let rid = self.row_count() + 1;
        row.set_rid(rid);
        self.rows.push(row);
        Token::from_parts(R::TABLE, rid)
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Iterate over the rows in row id order.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}

impl<'a, R> IntoIterator for &'a MetadataTable<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

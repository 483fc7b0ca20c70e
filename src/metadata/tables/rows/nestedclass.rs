use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::tables::{
        MetadataTable, MetadataTables, RowReadable, RowWritable, SortedRow, TableId, TableInfo,
        TableRow,
    },
    Result,
};

/// The `NestedClass` table (0x29): records that one type is nested inside another.
///
/// Rows are sorted by `nested_class`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NestedClassRaw {
    /// Row id of this row
    pub rid: u32,
    /// `TypeDef` row of the nested type
    pub nested_class: u32,
    /// `TypeDef` row of the enclosing type
    pub enclosing_class: u32,
}

impl RowReadable for NestedClassRaw {
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(sizes.table_index_bytes(TableId::TypeDef)) * 2
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(NestedClassRaw {
            rid,
            nested_class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
            enclosing_class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
        })
    }
}

impl RowWritable for NestedClassRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le_dyn(self.nested_class, sizes.is_large(TableId::TypeDef))?;
        writer.write_le_dyn(self.enclosing_class, sizes.is_large(TableId::TypeDef))
    }
}

impl TableRow for NestedClassRaw {
    const TABLE: TableId = TableId::NestedClass;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.nested_class
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.nested_class
    }
}

impl SortedRow for NestedClassRaw {
    type Key = u32;

    fn sort_key(&self) -> u32 {
        self.nested_class
    }
}

use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::tables::{
        MetadataTable, MetadataTables, RowReadable, RowWritable, TableId, TableInfo, TableRow,
    },
    Result,
};

/// The `PropertyPtr` table (0x16): an indirection used by unoptimized (`#-`) metadata.
///
/// When present, `PropertyMap` property lists index this table, whose rows in turn point
/// at the actual `Property` rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyPtrRaw {
    /// Row id of this row
    pub rid: u32,
    /// `Property` row this entry points at
    pub property: u32,
}

impl RowReadable for PropertyPtrRaw {
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(sizes.table_index_bytes(TableId::Property))
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(PropertyPtrRaw {
            rid,
            property: read_le_at_dyn(data, offset, sizes.is_large(TableId::Property))?,
        })
    }
}

impl RowWritable for PropertyPtrRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le_dyn(self.property, sizes.is_large(TableId::Property))
    }
}

impl TableRow for PropertyPtrRaw {
    const TABLE: TableId = TableId::PropertyPtr;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.property_ptr
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.property_ptr
    }
}

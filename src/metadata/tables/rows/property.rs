use crate::{
    file::{
        io::{read_le_at, read_le_at_dyn},
        writer::BlobWriter,
    },
    metadata::tables::{
        MetadataTable, MetadataTables, RowReadable, RowWritable, TableId, TableInfo, TableRow,
    },
    Result,
};

/// The `Property` table (0x17).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyRaw {
    /// Row id of this row
    pub rid: u32,
    /// `PropertyAttributes` bitmask
    pub flags: u16,
    /// Strings heap index of the property name
    pub name: u32,
    /// Blob heap index of the property signature
    pub signature: u32,
}

impl RowReadable for PropertyRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* flags */     2 +
            /* name */      sizes.str_bytes() +
            /* signature */ sizes.blob_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(PropertyRaw {
            rid,
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for PropertyRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le(self.flags);
        writer.write_le_dyn(self.name, sizes.is_large_str())?;
        writer.write_le_dyn(self.signature, sizes.is_large_blob())
    }
}

impl TableRow for PropertyRaw {
    const TABLE: TableId = TableId::Property;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.property
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.property
    }
}

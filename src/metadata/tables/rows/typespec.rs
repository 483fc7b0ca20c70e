use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::tables::{
        MetadataTable, MetadataTables, RowReadable, RowWritable, TableId, TableInfo, TableRow,
    },
    Result,
};

/// The `TypeSpec` table (0x1B): a type expressed as a signature blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSpecRaw {
    /// Row id of this row
    pub rid: u32,
    /// Blob heap index of the signature
    pub signature: u32,
}

impl RowReadable for TypeSpecRaw {
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(sizes.blob_bytes())
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(TypeSpecRaw {
            rid,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for TypeSpecRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le_dyn(self.signature, sizes.is_large_blob())
    }
}

impl TableRow for TypeSpecRaw {
    const TABLE: TableId = TableId::TypeSpec;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.type_spec
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.type_spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted_long_blob() {
        let data = vec![0x10, 0x00, 0x01, 0x00, 0x20, 0x00, 0x00, 0x00];
        let sizes = TableInfo::from_counts(&[(TableId::TypeSpec, 2)], 0x04);
        let table = MetadataTable::<TypeSpecRaw>::read(&data, 2, &sizes).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1).unwrap().signature, 0x0001_0010);
        assert_eq!(table.get(2).unwrap().signature, 0x20);
        assert_eq!(table.get(2).unwrap().token().value(), 0x1B00_0002);
        assert!(table.get(3).is_none());
        assert!(table.get(0).is_none());
        assert_eq!(table.write(&sizes).unwrap(), data);
    }
}

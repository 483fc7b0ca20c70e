use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::tables::{
        MetadataTable, MetadataTables, RowReadable, RowWritable, TableId, TableInfo, TableRow,
    },
    Result,
};

/// The `StandAloneSig` table (0x11): a standalone signature, used for local variable signatures and `calli` call sites.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StandAloneSigRaw {
    /// Row id of this row
    pub rid: u32,
    /// Blob heap index of the signature
    pub signature: u32,
}

impl RowReadable for StandAloneSigRaw {
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(sizes.blob_bytes())
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(StandAloneSigRaw {
            rid,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for StandAloneSigRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le_dyn(self.signature, sizes.is_large_blob())
    }
}

impl TableRow for StandAloneSigRaw {
    const TABLE: TableId = TableId::StandAloneSig;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.stand_alone_sig
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.stand_alone_sig
    }
}

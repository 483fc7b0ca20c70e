use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::{
        tables::{
            table::{read_coded, write_coded},
            CodedIndexType, MetadataTable, MetadataTables, RowReadable, RowWritable, TableId,
            TableInfo, TableRow,
        },
        token::Token,
    },
    Result,
};

/// The `MethodSpec` table (0x2B): an instantiation of a generic method.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodSpecRaw {
    /// Row id of this row
    pub rid: u32,
    /// `MethodDefOrRef` coded index of the generic method
    pub method: Token,
    /// Blob heap index of the instantiation signature
    pub instantiation: u32,
}

impl RowReadable for MethodSpecRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* method */        sizes.coded_index_bytes(CodedIndexType::MethodDefOrRef) +
            /* instantiation */ sizes.blob_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(MethodSpecRaw {
            rid,
            method: read_coded(data, offset, sizes, CodedIndexType::MethodDefOrRef)?,
            instantiation: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for MethodSpecRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        write_coded(writer, sizes, CodedIndexType::MethodDefOrRef, self.method)?;
        writer.write_le_dyn(self.instantiation, sizes.is_large_blob())
    }
}

impl TableRow for MethodSpecRaw {
    const TABLE: TableId = TableId::MethodSpec;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.method_spec
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.method_spec
    }
}

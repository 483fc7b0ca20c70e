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

/// The `MemberRef` table (0x0A): a reference to a field or method, usually of another module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberRefRaw {
    /// Row id of this row
    pub rid: u32,
    /// `MemberRefParent` coded index of the declaring entity
    pub class: Token,
    /// Strings heap index of the member name
    pub name: u32,
    /// Blob heap index of the field or method signature
    pub signature: u32,
}

impl RowReadable for MemberRefRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* class */     sizes.coded_index_bytes(CodedIndexType::MemberRefParent) +
            /* name */      sizes.str_bytes() +
            /* signature */ sizes.blob_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(MemberRefRaw {
            rid,
            class: read_coded(data, offset, sizes, CodedIndexType::MemberRefParent)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for MemberRefRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        write_coded(writer, sizes, CodedIndexType::MemberRefParent, self.class)?;
        writer.write_le_dyn(self.name, sizes.is_large_str())?;
        writer.write_le_dyn(self.signature, sizes.is_large_blob())
    }
}

impl TableRow for MemberRefRaw {
    const TABLE: TableId = TableId::MemberRef;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.member_ref
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.member_ref
    }
}

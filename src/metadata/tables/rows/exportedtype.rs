use crate::{
    file::{
        io::{read_le_at, read_le_at_dyn},
        writer::BlobWriter,
    },
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

/// The `ExportedType` table (0x27): a type defined in another module of the same assembly, or
/// forwarded to another assembly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportedTypeRaw {
    /// Row id of this row
    pub rid: u32,
    /// `TypeAttributes` bitmask
    pub flags: u32,
    /// `TypeDef` row id in the defining module, a hint only
    pub type_def_id: u32,
    /// Strings heap index of the type name
    pub type_name: u32,
    /// Strings heap index of the namespace
    pub type_namespace: u32,
    /// `Implementation` coded index: the file, assembly or enclosing exported type
    pub implementation: Token,
}

impl RowReadable for ExportedTypeRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* flags */          4 +
            /* type_def_id */    4 +
            /* type_name */      sizes.str_bytes() +
            /* type_namespace */ sizes.str_bytes() +
            /* implementation */ sizes.coded_index_bytes(CodedIndexType::Implementation)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(ExportedTypeRaw {
            rid,
            flags: read_le_at::<u32>(data, offset)?,
            type_def_id: read_le_at::<u32>(data, offset)?,
            type_name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            type_namespace: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            implementation: read_coded(data, offset, sizes, CodedIndexType::Implementation)?,
        })
    }
}

impl RowWritable for ExportedTypeRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le(self.flags);
        writer.write_le(self.type_def_id);
        writer.write_le_dyn(self.type_name, sizes.is_large_str())?;
        writer.write_le_dyn(self.type_namespace, sizes.is_large_str())?;
        write_coded(writer, sizes, CodedIndexType::Implementation, self.implementation)
    }
}

impl TableRow for ExportedTypeRaw {
    const TABLE: TableId = TableId::ExportedType;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.exported_type
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.exported_type
    }
}

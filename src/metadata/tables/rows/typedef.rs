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

/// The `TypeDef` table (0x02): a type defined in this module.
///
/// `field_list` and `method_list` start the contiguous run of fields and methods owned by
/// this type. The run ends where the next row's list starts, or at the end of the table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeDefRaw {
    /// Row id of this row
    pub rid: u32,
    /// `TypeAttributes` bitmask
    pub flags: u32,
    /// Strings heap index of the type name
    pub type_name: u32,
    /// Strings heap index of the namespace
    pub type_namespace: u32,
    /// `TypeDefOrRef` coded index of the base type, null for interfaces and `System.Object`
    pub extends: Token,
    /// First row of this type's fields in the `Field` table
    pub field_list: u32,
    /// First row of this type's methods in the `MethodDef` table
    pub method_list: u32,
}

impl RowReadable for TypeDefRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* flags */          4 +
            /* type_name */      sizes.str_bytes() +
            /* type_namespace */ sizes.str_bytes() +
            /* extends */        sizes.coded_index_bytes(CodedIndexType::TypeDefOrRef) +
            /* field_list */     sizes.table_index_bytes(TableId::Field) +
            /* method_list */    sizes.table_index_bytes(TableId::MethodDef)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(TypeDefRaw {
            rid,
            flags: read_le_at::<u32>(data, offset)?,
            type_name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            type_namespace: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            extends: read_coded(data, offset, sizes, CodedIndexType::TypeDefOrRef)?,
            field_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Field))?,
            method_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::MethodDef))?,
        })
    }
}

impl RowWritable for TypeDefRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le(self.flags);
        writer.write_le_dyn(self.type_name, sizes.is_large_str())?;
        writer.write_le_dyn(self.type_namespace, sizes.is_large_str())?;
        write_coded(writer, sizes, CodedIndexType::TypeDefOrRef, self.extends)?;
        writer.write_le_dyn(self.field_list, sizes.is_large(TableId::Field))?;
        writer.write_le_dyn(self.method_list, sizes.is_large(TableId::MethodDef))
    }
}

impl TableRow for TypeDefRaw {
    const TABLE: TableId = TableId::TypeDef;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.type_def
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.type_def
    }
}

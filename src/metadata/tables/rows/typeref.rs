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

/// The `TypeRef` table (0x01): a reference to a type defined in another scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeRefRaw {
    /// Row id of this row
    pub rid: u32,
    /// `ResolutionScope` coded index: `Module`, `ModuleRef`, `AssemblyRef` or enclosing `TypeRef`
    pub resolution_scope: Token,
    /// Strings heap index of the type name
    pub type_name: u32,
    /// Strings heap index of the namespace
    pub type_namespace: u32,
}

impl RowReadable for TypeRefRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* resolution_scope */ sizes.coded_index_bytes(CodedIndexType::ResolutionScope) +
            /* type_name */        sizes.str_bytes() +
            /* type_namespace */   sizes.str_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(TypeRefRaw {
            rid,
            resolution_scope: read_coded(data, offset, sizes, CodedIndexType::ResolutionScope)?,
            type_name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            type_namespace: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}

impl RowWritable for TypeRefRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        write_coded(writer, sizes, CodedIndexType::ResolutionScope, self.resolution_scope)?;
        writer.write_le_dyn(self.type_name, sizes.is_large_str())?;
        writer.write_le_dyn(self.type_namespace, sizes.is_large_str())
    }
}

impl TableRow for TypeRefRaw {
    const TABLE: TableId = TableId::TypeRef;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.type_ref
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.type_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![
            0x06, 0x00, // resolution_scope: AssemblyRef 1
            0x10, 0x00, // type_name
            0x20, 0x00, // type_namespace
        ];

        let sizes = TableInfo::from_counts(&[(TableId::TypeRef, 1), (TableId::AssemblyRef, 1)], 0);
        let table = MetadataTable::<TypeRefRaw>::read(&data, 1, &sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.token(), Token::new(0x0100_0001));
        assert_eq!(
            row.resolution_scope,
            Token::from_parts(TableId::AssemblyRef, 1)
        );
        assert_eq!(row.type_name, 0x10);
        assert_eq!(row.type_namespace, 0x20);
        assert_eq!(TypeRefRaw::row_size(&sizes), 6);
        assert_eq!(table.write(&sizes).unwrap(), data);
    }
}

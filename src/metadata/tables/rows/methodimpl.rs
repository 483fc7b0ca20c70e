use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::{
        tables::{
            table::{read_coded, write_coded},
            CodedIndexType, MetadataTable, MetadataTables, RowReadable, RowWritable, SortedRow,
            TableId, TableInfo, TableRow,
        },
        token::Token,
    },
    Result,
};

/// The `MethodImpl` table (0x19): an explicit override, binding a method body of a type to
/// the interface or base method it implements.
///
/// Rows are sorted by `class`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodImplRaw {
    /// Row id of this row
    pub rid: u32,
    /// `TypeDef` row of the overriding type
    pub class: u32,
    /// `MethodDefOrRef` coded index of the implementing method
    pub method_body: Token,
    /// `MethodDefOrRef` coded index of the overridden declaration
    pub method_declaration: Token,
}

impl RowReadable for MethodImplRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* class */              sizes.table_index_bytes(TableId::TypeDef) +
            /* method_body */        sizes.coded_index_bytes(CodedIndexType::MethodDefOrRef) +
            /* method_declaration */ sizes.coded_index_bytes(CodedIndexType::MethodDefOrRef)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(MethodImplRaw {
            rid,
            class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
            method_body: read_coded(data, offset, sizes, CodedIndexType::MethodDefOrRef)?,
            method_declaration: read_coded(data, offset, sizes, CodedIndexType::MethodDefOrRef)?,
        })
    }
}

impl RowWritable for MethodImplRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le_dyn(self.class, sizes.is_large(TableId::TypeDef))?;
        write_coded(writer, sizes, CodedIndexType::MethodDefOrRef, self.method_body)?;
        write_coded(writer, sizes, CodedIndexType::MethodDefOrRef, self.method_declaration)
    }
}

impl TableRow for MethodImplRaw {
    const TABLE: TableId = TableId::MethodImpl;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.method_impl
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.method_impl
    }
}

impl SortedRow for MethodImplRaw {
    type Key = u32;

    fn sort_key(&self) -> u32 {
        self.class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![
            0x02, 0x00, // class
            0x06, 0x00, // method_body: MethodDef 3
            0x03, 0x00, // method_declaration: MemberRef 1
        ];

        let sizes = TableInfo::from_counts(&[(TableId::MethodImpl, 1)], 0);
        let table = MetadataTable::<MethodImplRaw>::read(&data, 1, &sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.class, 2);
        assert_eq!(row.method_body, Token::from_parts(TableId::MethodDef, 3));
        assert_eq!(row.method_declaration, Token::from_parts(TableId::MemberRef, 1));
        assert_eq!(table.write(&sizes).unwrap(), data);
    }
}

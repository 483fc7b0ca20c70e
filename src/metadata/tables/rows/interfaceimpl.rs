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

/// The `InterfaceImpl` table (0x09): one interface implemented by one type.
///
/// Rows are sorted by `class` so that all interfaces of a type are contiguous.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceImplRaw {
    /// Row id of this row
    pub rid: u32,
    /// `TypeDef` row of the implementing type
    pub class: u32,
    /// `TypeDefOrRef` coded index of the implemented interface
    pub interface: Token,
}

impl RowReadable for InterfaceImplRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* class */     sizes.table_index_bytes(TableId::TypeDef) +
            /* interface */ sizes.coded_index_bytes(CodedIndexType::TypeDefOrRef)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(InterfaceImplRaw {
            rid,
            class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
            interface: read_coded(data, offset, sizes, CodedIndexType::TypeDefOrRef)?,
        })
    }
}

impl RowWritable for InterfaceImplRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le_dyn(self.class, sizes.is_large(TableId::TypeDef))?;
        write_coded(writer, sizes, CodedIndexType::TypeDefOrRef, self.interface)
    }
}

impl TableRow for InterfaceImplRaw {
    const TABLE: TableId = TableId::InterfaceImpl;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.interface_impl
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.interface_impl
    }
}

impl SortedRow for InterfaceImplRaw {
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
            0x01, 0x01, // class
            0x02, 0x02, // interface
        ];

        let sizes = TableInfo::from_counts(&[(TableId::InterfaceImpl, 1)], 0);
        let table = MetadataTable::<InterfaceImplRaw>::read(&data, 1, &sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.rid, 1);
        assert_eq!(row.token().value(), 0x0900_0001);
        assert_eq!(row.class, 0x0101);
        assert_eq!(row.interface, Token::from_parts(TableId::TypeSpec, 0x80));
        assert_eq!(table.write(&sizes).unwrap(), data);
    }
}

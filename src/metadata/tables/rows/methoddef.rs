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

/// The `MethodDef` table (0x06).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodDefRaw {
    /// Row id of this row
    pub rid: u32,
    /// RVA of the method body, 0 for abstract and extern methods
    pub rva: u32,
    /// `MethodImplAttributes` bitmask
    pub impl_flags: u16,
    /// `MethodAttributes` bitmask
    pub flags: u16,
    /// Strings heap index of the method name
    pub name: u32,
    /// Blob heap index of the method signature
    pub signature: u32,
    /// First row of this method's parameters in the `Param` table
    pub param_list: u32,
}

impl RowReadable for MethodDefRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* rva */        4 +
            /* impl_flags */ 2 +
            /* flags */      2 +
            /* name */       sizes.str_bytes() +
            /* signature */  sizes.blob_bytes() +
            /* param_list */ sizes.table_index_bytes(TableId::Param)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(MethodDefRaw {
            rid,
            rva: read_le_at::<u32>(data, offset)?,
            impl_flags: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            param_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Param))?,
        })
    }
}

impl RowWritable for MethodDefRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le(self.rva);
        writer.write_le(self.impl_flags);
        writer.write_le(self.flags);
        writer.write_le_dyn(self.name, sizes.is_large_str())?;
        writer.write_le_dyn(self.signature, sizes.is_large_blob())?;
        writer.write_le_dyn(self.param_list, sizes.is_large(TableId::Param))
    }
}

impl TableRow for MethodDefRaw {
    const TABLE: TableId = TableId::MethodDef;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.method_def
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.method_def
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![
            0x50, 0x20, 0x00, 0x00, // rva
            0x00, 0x00, // impl_flags
            0x96, 0x00, // flags
            0x0A, 0x00, // name
            0x01, 0x00, // signature
            0x01, 0x00, // param_list
        ];

        let sizes = TableInfo::from_counts(&[(TableId::MethodDef, 1)], 0);
        let table = MetadataTable::<MethodDefRaw>::read(&data, 1, &sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.rva, 0x2050);
        assert_eq!(row.flags, 0x0096);
        assert_eq!(row.name, 0x0A);
        assert_eq!(row.signature, 1);
        assert_eq!(MethodDefRaw::row_size(&sizes), 14);
        assert_eq!(table.write(&sizes).unwrap(), data);
    }
}

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

/// The `Event` table (0x14).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventRaw {
    /// Row id of this row
    pub rid: u32,
    /// `EventAttributes` bitmask
    pub flags: u16,
    /// Strings heap index of the event name
    pub name: u32,
    /// `TypeDefOrRef` coded index of the delegate type
    pub event_type: Token,
}

impl RowReadable for EventRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* flags */      2 +
            /* name */       sizes.str_bytes() +
            /* event_type */ sizes.coded_index_bytes(CodedIndexType::TypeDefOrRef)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(EventRaw {
            rid,
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            event_type: read_coded(data, offset, sizes, CodedIndexType::TypeDefOrRef)?,
        })
    }
}

impl RowWritable for EventRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le(self.flags);
        writer.write_le_dyn(self.name, sizes.is_large_str())?;
        write_coded(writer, sizes, CodedIndexType::TypeDefOrRef, self.event_type)
    }
}

impl TableRow for EventRaw {
    const TABLE: TableId = TableId::Event;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.event
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.event
    }
}

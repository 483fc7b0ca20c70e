use crate::{
    file::{io::read_le_at_dyn, writer::BlobWriter},
    metadata::tables::{
        MetadataTable, MetadataTables, RowReadable, RowWritable, TableId, TableInfo, TableRow,
    },
    Result,
};

/// The `EventMap` table (0x12): links a type to the start of its run of events.
///
/// The run ends where the next row's `event_list` starts, or at the end of the `Event` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventMapRaw {
    /// Row id of this row
    pub rid: u32,
    /// `TypeDef` row of the declaring type
    pub parent: u32,
    /// First row of the type's events in the `Event` table
    pub event_list: u32,
}

impl RowReadable for EventMapRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* parent */     sizes.table_index_bytes(TableId::TypeDef) +
            /* event_list */ sizes.table_index_bytes(TableId::Event)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(EventMapRaw {
            rid,
            parent: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
            event_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Event))?,
        })
    }
}

impl RowWritable for EventMapRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le_dyn(self.parent, sizes.is_large(TableId::TypeDef))?;
        writer.write_le_dyn(self.event_list, sizes.is_large(TableId::Event))
    }
}

impl TableRow for EventMapRaw {
    const TABLE: TableId = TableId::EventMap;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.event_map
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.event_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted_long() {
        let data = vec![
            0x01, 0x00, 0x00, 0x00, // parent
            0x02, 0x00, // event_list
        ];

        let sizes = TableInfo::from_counts(&[(TableId::TypeDef, 0x1_0000), (TableId::Event, 2)], 0);
        let table = MetadataTable::<EventMapRaw>::read(&data, 1, &sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.parent, 1);
        assert_eq!(row.event_list, 2);
        assert_eq!(EventMapRaw::row_size(&sizes), 6);
        assert_eq!(table.write(&sizes).unwrap(), data);
    }
}

use crate::{
    file::{
        io::{read_le_at, read_le_at_dyn},
        writer::BlobWriter,
    },
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

/// The `GenericParam` table (0x2A): one generic parameter of a type or method.
///
/// Rows are sorted by owner, then by parameter number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenericParamRaw {
    /// Row id of this row
    pub rid: u32,
    /// 0-based position of the parameter in its owner's parameter list
    pub number: u16,
    /// `GenericParamAttributes` bitmask
    pub flags: u16,
    /// `TypeOrMethodDef` coded index of the owner
    pub owner: Token,
    /// Strings heap index of the parameter name
    pub name: u32,
}

impl RowReadable for GenericParamRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* number */ 2 +
            /* flags */  2 +
            /* owner */  sizes.coded_index_bytes(CodedIndexType::TypeOrMethodDef) +
            /* name */   sizes.str_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(GenericParamRaw {
            rid,
            number: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            owner: read_coded(data, offset, sizes, CodedIndexType::TypeOrMethodDef)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}

impl RowWritable for GenericParamRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le(self.number);
        writer.write_le(self.flags);
        write_coded(writer, sizes, CodedIndexType::TypeOrMethodDef, self.owner)?;
        writer.write_le_dyn(self.name, sizes.is_large_str())
    }
}

impl TableRow for GenericParamRaw {
    const TABLE: TableId = TableId::GenericParam;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.generic_param
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.generic_param
    }
}

impl SortedRow for GenericParamRaw {
    type Key = (u32, u16);

    /// Owners sort by their coded index value, which orders `TypeDef` and `MethodDef`
    /// rows the way the runtime expects. Owners of any other table sort last.
    fn sort_key(&self) -> (u32, u16) {
        let owner = match CodedIndexType::TypeOrMethodDef.encode(self.owner) {
            Ok(owner) => owner,
            Err(_) => {
                log::warn!(
                    "GenericParam row {}: owner {} is not a TypeDef or MethodDef, sorting it last",
                    self.rid,
                    self.owner
                );
                u32::MAX
            }
        };
        (owner, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![
            0x01, 0x00, // number
            0x00, 0x00, // flags
            0x03, 0x00, // owner: MethodDef 1
            0x07, 0x00, // name
        ];

        let sizes = TableInfo::from_counts(&[(TableId::GenericParam, 1)], 0);
        let table = MetadataTable::<GenericParamRaw>::read(&data, 1, &sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.number, 1);
        assert_eq!(row.owner, Token::from_parts(TableId::MethodDef, 1));
        assert_eq!(row.name, 7);
        assert_eq!(table.write(&sizes).unwrap(), data);
    }

    #[test]
    fn sort_key_orders_by_owner_then_number() {
        let first = GenericParamRaw {
            number: 1,
            owner: Token::from_parts(TableId::TypeDef, 1),
            ..Default::default()
        };
        let second = GenericParamRaw {
            number: 0,
            owner: Token::from_parts(TableId::MethodDef, 1),
            ..Default::default()
        };
        assert!(first.sort_key() < second.sort_key());
    }

    #[test]
    fn foreign_owner_sorts_last() {
        let foreign = GenericParamRaw {
            owner: Token::from_parts(TableId::Field, 1),
            ..Default::default()
        };
        let method = GenericParamRaw {
            number: 9,
            owner: Token::from_parts(TableId::MethodDef, 0x00FF_FFFF),
            ..Default::default()
        };
        assert_eq!(foreign.sort_key(), (u32::MAX, 0));
        assert!(method.sort_key() < foreign.sort_key());
    }
}

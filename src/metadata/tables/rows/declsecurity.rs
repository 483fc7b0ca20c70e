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

/// The `DeclSecurity` table (0x0E): a declarative security permission set attached to a type,
/// method or the assembly.
///
/// Rows are sorted by parent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclSecurityRaw {
    /// Row id of this row
    pub rid: u32,
    /// `SecurityAction` value (demand, assert, link demand, ...)
    pub action: u16,
    /// `HasDeclSecurity` coded index of the protected entity
    pub parent: Token,
    /// Blob heap index of the serialized permission set
    pub permission_set: u32,
}

impl RowReadable for DeclSecurityRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfo) -> u32 {
        u32::from(
            /* action */         2 +
            /* parent */         sizes.coded_index_bytes(CodedIndexType::HasDeclSecurity) +
            /* permission_set */ sizes.blob_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(DeclSecurityRaw {
            rid,
            action: read_le_at::<u16>(data, offset)?,
            parent: read_coded(data, offset, sizes, CodedIndexType::HasDeclSecurity)?,
            permission_set: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for DeclSecurityRaw {
    fn row_write(&self, writer: &mut BlobWriter, sizes: &TableInfo) -> Result<()> {
        writer.write_le(self.action);
        write_coded(writer, sizes, CodedIndexType::HasDeclSecurity, self.parent)?;
        writer.write_le_dyn(self.permission_set, sizes.is_large_blob())
    }
}

impl TableRow for DeclSecurityRaw {
    const TABLE: TableId = TableId::DeclSecurity;

    fn rid(&self) -> u32 {
        self.rid
    }

    fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    fn table(tables: &MetadataTables) -> &MetadataTable<Self> {
        &tables.decl_security
    }

    fn table_mut(tables: &mut MetadataTables) -> &mut MetadataTable<Self> {
        &mut tables.decl_security
    }
}

impl SortedRow for DeclSecurityRaw {
    type Key = u32;

    fn sort_key(&self) -> u32 {
        match CodedIndexType::HasDeclSecurity.encode(self.parent) {
            Ok(parent) => parent,
            Err(_) => {
                log::warn!(
                    "DeclSecurity row {}: parent {} is not a TypeDef, MethodDef or Assembly, sorting it last",
                    self.rid,
                    self.parent
                );
                u32::MAX
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![
            0x02, 0x00, // action: demand
            0x05, 0x00, // parent: MethodDef 1
            0x11, 0x00, // permission_set
        ];

        let sizes = TableInfo::from_counts(&[(TableId::DeclSecurity, 1)], 0);
        let table = MetadataTable::<DeclSecurityRaw>::read(&data, 1, &sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.action, 2);
        assert_eq!(row.parent, Token::from_parts(TableId::MethodDef, 1));
        assert_eq!(row.permission_set, 0x11);
        assert_eq!(table.write(&sizes).unwrap(), data);
    }

    #[test]
    fn sort_key_follows_coded_parent() {
        let on_type = DeclSecurityRaw {
            parent: Token::from_parts(TableId::TypeDef, 2),
            ..Default::default()
        };
        let on_method = DeclSecurityRaw {
            parent: Token::from_parts(TableId::MethodDef, 1),
            ..Default::default()
        };
        let stray = DeclSecurityRaw {
            parent: Token::from_parts(TableId::Field, 1),
            ..Default::default()
        };
        assert!(on_method.sort_key() < on_type.sort_key());
        assert_eq!(stray.sort_key(), u32::MAX);
    }
}

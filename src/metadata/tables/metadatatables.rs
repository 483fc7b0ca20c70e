use strum::EnumCount;

use crate::metadata::{
    tables::{
        CodedIndexType, DeclSecurityRaw, EventMapRaw, EventRaw, ExportedTypeRaw, FieldRaw,
        GenericParamRaw, InterfaceImplRaw, MemberRefRaw, MetadataTable, MethodDefRaw,
        MethodImplRaw, MethodSpecRaw, NestedClassRaw, PropertyPtrRaw, PropertyRaw, RowCounts,
        StandAloneSigRaw, TableId, TableInfo, TableRow, TypeDefRaw, TypeRefRaw, TypeSpecRaw,
    },
    token::Token,
};

/// The row storage of one module.
///
/// Tables this crate models are held as [`MetadataTable`]s. Tables it does not model (for example
/// `AssemblyRef` or `Param`) can still announce their row counts through
/// [`MetadataTables::set_external_count`], so that coded index widths and row id checks stay
/// correct for rows that reference them.
#[derive(Debug, Clone)]
pub struct MetadataTables {
    /// `TypeRef` rows
    pub type_ref: MetadataTable<TypeRefRaw>,
    /// `TypeDef` rows
    pub type_def: MetadataTable<TypeDefRaw>,
    /// `Field` rows
    pub field: MetadataTable<FieldRaw>,
    /// `MethodDef` rows
    pub method_def: MetadataTable<MethodDefRaw>,
    /// `InterfaceImpl` rows
    pub interface_impl: MetadataTable<InterfaceImplRaw>,
    /// `MemberRef` rows
    pub member_ref: MetadataTable<MemberRefRaw>,
    /// `DeclSecurity` rows
    pub decl_security: MetadataTable<DeclSecurityRaw>,
    /// `StandAloneSig` rows
    pub stand_alone_sig: MetadataTable<StandAloneSigRaw>,
    /// `EventMap` rows
    pub event_map: MetadataTable<EventMapRaw>,
    /// `Event` rows
    pub event: MetadataTable<EventRaw>,
    /// `PropertyPtr` rows
    pub property_ptr: MetadataTable<PropertyPtrRaw>,
    /// `Property` rows
    pub property: MetadataTable<PropertyRaw>,
    /// `MethodImpl` rows
    pub method_impl: MetadataTable<MethodImplRaw>,
    /// `TypeSpec` rows
    pub type_spec: MetadataTable<TypeSpecRaw>,
    /// `ExportedType` rows
    pub exported_type: MetadataTable<ExportedTypeRaw>,
    /// `NestedClass` rows
    pub nested_class: MetadataTable<NestedClassRaw>,
    /// `GenericParam` rows
    pub generic_param: MetadataTable<GenericParamRaw>,
    /// `MethodSpec` rows
    pub method_spec: MetadataTable<MethodSpecRaw>,
    external: [u32; TableId::COUNT],
}

impl Default for MetadataTables {
    fn default() -> Self {
        MetadataTables {
            type_ref: MetadataTable::new(),
            type_def: MetadataTable::new(),
            field: MetadataTable::new(),
            method_def: MetadataTable::new(),
            interface_impl: MetadataTable::new(),
            member_ref: MetadataTable::new(),
            decl_security: MetadataTable::new(),
            stand_alone_sig: MetadataTable::new(),
            event_map: MetadataTable::new(),
            event: MetadataTable::new(),
            property_ptr: MetadataTable::new(),
            property: MetadataTable::new(),
            method_impl: MetadataTable::new(),
            type_spec: MetadataTable::new(),
            exported_type: MetadataTable::new(),
            nested_class: MetadataTable::new(),
            generic_param: MetadataTable::new(),
            method_spec: MetadataTable::new(),
            external: [0; TableId::COUNT],
        }
    }
}

impl MetadataTables {
    /// Create an empty set of tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether rows of `table` are stored here.
    #[must_use]
    pub fn is_modelled(table: TableId) -> bool {
        matches!(
            table,
            TableId::TypeRef
                | TableId::TypeDef
                | TableId::Field
                | TableId::MethodDef
                | TableId::InterfaceImpl
                | TableId::MemberRef
                | TableId::DeclSecurity
                | TableId::StandAloneSig
                | TableId::EventMap
                | TableId::Event
                | TableId::PropertyPtr
                | TableId::Property
                | TableId::MethodImpl
                | TableId::TypeSpec
                | TableId::ExportedType
                | TableId::NestedClass
                | TableId::GenericParam
                | TableId::MethodSpec
        )
    }

    /// Announce the row count of a table whose rows are kept elsewhere.
    ///
    /// Counts for modelled tables are always taken from their stored rows; setting one here
    /// has no effect.
    pub fn set_external_count(&mut self, table: TableId, rows: u32) {
        self.external[table as usize] = rows;
    }

    /// The table holding rows of type `R`.
    #[must_use]
    pub fn table<R: TableRow>(&self) -> &MetadataTable<R> {
        R::table(self)
    }

    /// The table holding rows of type `R`, mutably.
    pub fn table_mut<R: TableRow>(&mut self) -> &mut MetadataTable<R> {
        R::table_mut(self)
    }

    /// The row of type `R` at `rid`.
    #[must_use]
    pub fn get<R: TableRow>(&self, rid: u32) -> Option<&R> {
        R::table(self).get(rid)
    }

    /// The row addressed by `token`, if the token names a table of type `R`.
    #[must_use]
    pub fn get_by_token<R: TableRow>(&self, token: Token) -> Option<&R> {
        if !token.is_table(R::TABLE) {
            return None;
        }
        self.get(token.row())
    }

    /// Whether `token` addresses an existing row, checked against the row counts.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        match token.decode() {
            Some((table, rid)) => rid != 0 && rid <= self.row_count(table),
            None => false,
        }
    }

    /// Decode a coded index and reject row ids past the end of their table.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidCodedIndexTag`] or [`crate::Error::RidOutOfRange`].
    pub fn decode_coded(&self, kind: CodedIndexType, value: u32) -> crate::Result<Option<Token>> {
        kind.decode_checked(value, self)
    }

    /// Check every coded index column against the row counts.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] for the first reference past the end of its table.
    pub fn validate_references(&self) -> crate::Result<()> {
        let references = self
            .type_ref
            .iter()
            .map(|row| row.resolution_scope)
            .chain(self.type_def.iter().map(|row| row.extends))
            .chain(self.interface_impl.iter().map(|row| row.interface))
            .chain(self.member_ref.iter().map(|row| row.class))
            .chain(self.decl_security.iter().map(|row| row.parent))
            .chain(
                self.method_impl
                    .iter()
                    .flat_map(|row| [row.method_body, row.method_declaration]),
            )
            .chain(self.exported_type.iter().map(|row| row.implementation))
            .chain(self.event.iter().map(|row| row.event_type))
            .chain(self.generic_param.iter().map(|row| row.owner))
            .chain(self.method_spec.iter().map(|row| row.method));

        for token in references {
            let Some((table, rid)) = token.decode() else {
                continue;
            };
            let rows = self.row_count(table);
            if rid > rows {
                return Err(crate::Error::RidOutOfRange { table, rid, rows });
            }
        }
        Ok(())
    }

    /// Column width information for the current row counts and the given `HeapSizes` flags.
    #[must_use]
    pub fn table_info(&self, heap_sizes: u8) -> TableInfo {
        TableInfo::new(self, heap_sizes)
    }
}

impl RowCounts for MetadataTables {
    fn row_count(&self, table: TableId) -> u32 {
        match table {
            TableId::TypeRef => self.type_ref.row_count(),
            TableId::TypeDef => self.type_def.row_count(),
            TableId::Field => self.field.row_count(),
            TableId::MethodDef => self.method_def.row_count(),
            TableId::InterfaceImpl => self.interface_impl.row_count(),
            TableId::MemberRef => self.member_ref.row_count(),
            TableId::DeclSecurity => self.decl_security.row_count(),
            TableId::StandAloneSig => self.stand_alone_sig.row_count(),
            TableId::EventMap => self.event_map.row_count(),
            TableId::Event => self.event.row_count(),
            TableId::PropertyPtr => self.property_ptr.row_count(),
            TableId::Property => self.property.row_count(),
            TableId::MethodImpl => self.method_impl.row_count(),
            TableId::TypeSpec => self.type_spec.row_count(),
            TableId::ExportedType => self.exported_type.row_count(),
            TableId::NestedClass => self.nested_class.row_count(),
            TableId::GenericParam => self.generic_param.row_count(),
            TableId::MethodSpec => self.method_spec.row_count(),
            other => self.external[other as usize],
        }
    }
}

use strum::{EnumCount, EnumIter};

/// Identifier of one metadata table kind, valued by its ECMA-335 table number.
///
/// The table number is the high byte of every [`crate::metadata::token::Token`] that addresses
/// a row of that table.
///
/// ## Reference
/// * [ECMA-335 Partition II, Section 22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Metadata Tables
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, PartialOrd, Ord)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRVA = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOS = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOS = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Map a table number (the high byte of a token) back to its table kind.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<TableId> {
        use TableId::*;

        const ALL: [TableId; TableId::COUNT] = [
            Module, TypeRef, TypeDef, FieldPtr, Field, MethodPtr, MethodDef, ParamPtr, Param,
            InterfaceImpl, MemberRef, Constant, CustomAttribute, FieldMarshal, DeclSecurity,
            ClassLayout, FieldLayout, StandAloneSig, EventMap, EventPtr, Event, PropertyMap,
            PropertyPtr, Property, MethodSemantics, MethodImpl, ModuleRef, TypeSpec, ImplMap,
            FieldRVA, EncLog, EncMap, Assembly, AssemblyProcessor, AssemblyOS, AssemblyRef,
            AssemblyRefProcessor, AssemblyRefOS, File, ExportedType, ManifestResource,
            NestedClass, GenericParam, MethodSpec, GenericParamConstraint,
        ];

        ALL.get(usize::from(value)).copied()
    }

    /// The table number of this kind.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Tables that the format requires to be sorted by a key column.
    ///
    /// Rows of these tables are reordered when a rebuild flushes them, so row ids handed out
    /// before the flush are provisional.
    #[must_use]
    pub fn is_sorted(self) -> bool {
        matches!(
            self,
            TableId::InterfaceImpl
                | TableId::Constant
                | TableId::CustomAttribute
                | TableId::FieldMarshal
                | TableId::DeclSecurity
                | TableId::ClassLayout
                | TableId::FieldLayout
                | TableId::MethodSemantics
                | TableId::MethodImpl
                | TableId::ImplMap
                | TableId::FieldRVA
                | TableId::NestedClass
                | TableId::GenericParam
                | TableId::GenericParamConstraint
        )
    }
}

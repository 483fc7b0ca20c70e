//! Coded indices: compact references that multiplex several candidate tables.
//!
//! A coded index stores `rid << bits | tag`, where `tag` selects one entry from a fixed,
//! ordered candidate table list and `bits` is the smallest number of bits able to
//! represent every candidate position. Decoding never needs row counts; validating that the
//! row id exists does, and is done separately through a [`RowCounts`] oracle.
//!
//! ```rust
//! use cilgraph::metadata::tables::{CodedIndexType, TableId};
//! use cilgraph::metadata::token::Token;
//!
//! // TypeDefOrRef: 2 tag bits, tag 1 = TypeRef
//! let token = CodedIndexType::TypeDefOrRef.decode(0x0D)?;
//! assert_eq!(token, Some(Token::from_parts(TableId::TypeRef, 3)));
//! assert_eq!(CodedIndexType::TypeDefOrRef.decode(0x01)?, None);
//! # Ok::<(), cilgraph::Error>(())
//! ```

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{tables::TableId, token::Token},
    Error, Result,
};

/// Source of row counts per table kind, consulted when validating row ids.
pub trait RowCounts {
    /// Number of rows currently held by `table`.
    fn row_count(&self, table: TableId) -> u32;
}

/// The coded index kinds defined by ECMA-335 II.24.2.6.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`
    HasConstant,
    /// Anything that can carry a custom attribute
    HasCustomAttribute,
    /// `Field` or `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// Parent of a `MemberRef`
    MemberRefParent,
    /// `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// `Field` or `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// Constructor of a custom attribute
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`
    ResolutionScope,
    /// `TypeDef` or `MethodDef`
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// The ordered candidate tables of this kind. `None` marks a reserved tag value.
    #[must_use]
    pub fn tables(self) -> &'static [Option<TableId>] {
        use TableId::*;

        match self {
            CodedIndexType::TypeDefOrRef => &[Some(TypeDef), Some(TypeRef), Some(TypeSpec)],
            CodedIndexType::HasConstant => &[Some(Field), Some(Param), Some(Property)],
            CodedIndexType::HasCustomAttribute => &[
                Some(MethodDef),
                Some(Field),
                Some(TypeRef),
                Some(TypeDef),
                Some(Param),
                Some(InterfaceImpl),
                Some(MemberRef),
                Some(Module),
                // 'Permission' in the standard; no table backs this slot
                None,
                Some(Property),
                Some(Event),
                Some(StandAloneSig),
                Some(ModuleRef),
                Some(TypeSpec),
                Some(Assembly),
                Some(AssemblyRef),
                Some(File),
                Some(ExportedType),
                Some(ManifestResource),
                Some(GenericParam),
                Some(GenericParamConstraint),
                Some(MethodSpec),
            ],
            CodedIndexType::HasFieldMarshal => &[Some(Field), Some(Param)],
            CodedIndexType::HasDeclSecurity => &[Some(TypeDef), Some(MethodDef), Some(Assembly)],
            CodedIndexType::MemberRefParent => &[
                Some(TypeDef),
                Some(TypeRef),
                Some(ModuleRef),
                Some(MethodDef),
                Some(TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(Event), Some(Property)],
            CodedIndexType::MethodDefOrRef => &[Some(MethodDef), Some(MemberRef)],
            CodedIndexType::MemberForwarded => &[Some(Field), Some(MethodDef)],
            CodedIndexType::Implementation => &[Some(File), Some(AssemblyRef), Some(ExportedType)],
            CodedIndexType::CustomAttributeType => {
                &[None, None, Some(MethodDef), Some(MemberRef), None]
            }
            CodedIndexType::ResolutionScope => {
                &[Some(Module), Some(ModuleRef), Some(AssemblyRef), Some(TypeRef)]
            }
            CodedIndexType::TypeOrMethodDef => &[Some(TypeDef), Some(MethodDef)],
        }
    }

    /// Number of low bits that hold the tag: the ceiling of log2 of the candidate count.
    #[must_use]
    pub fn tag_bits(self) -> u8 {
        let candidates = self.tables().len() as u32;
        (u32::BITS - (candidates - 1).leading_zeros()) as u8
    }

    /// Decode a coded index value into a token.
    ///
    /// Returns `Ok(None)` for a zero row id (a null reference).
    ///
    /// # Errors
    /// Returns [`Error::InvalidCodedIndexTag`] if the tag does not select a candidate table.
    pub fn decode(self, value: u32) -> Result<Option<Token>> {
        let bits = self.tag_bits();
        let tag = value & ((1 << bits) - 1);
        let rid = value >> bits;

        let Some(Some(table)) = self.tables().get(tag as usize) else {
            return Err(Error::InvalidCodedIndexTag { kind: self, tag });
        };

        if rid == 0 {
            return Ok(None);
        }
        Ok(Some(Token::from_parts(*table, rid)))
    }

    /// Decode a coded index value and check the row id against `rows`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCodedIndexTag`] for a bad tag and [`Error::RidOutOfRange`]
    /// for a row id past the end of its table.
    pub fn decode_checked(self, value: u32, rows: &impl RowCounts) -> Result<Option<Token>> {
        let Some(token) = self.decode(value)? else {
            return Ok(None);
        };

        let Some((table, rid)) = token.decode() else {
            return Err(Error::UnexpectedMember(token));
        };

        let count = rows.row_count(table);
        if rid > count {
            return Err(Error::RidOutOfRange {
                table,
                rid,
                rows: count,
            });
        }
        Ok(Some(token))
    }

    /// Encode a token as a coded index of this kind. A null token encodes as 0.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the token's table is not a candidate of this kind.
    pub fn encode(self, token: Token) -> Result<u32> {
        if token.is_null() {
            return Ok(0);
        }

        let tag = self
            .tables()
            .iter()
            .position(|candidate| candidate.is_some_and(|table| token.is_table(table)))
            .ok_or_else(|| malformed_error!("Token {} can not be encoded as {:?}", token, self))?;

        Ok((token.row() << self.tag_bits()) | tag as u32)
    }

    /// Whether a coded index of this kind needs 4 bytes given the row counts of its candidates.
    #[must_use]
    pub fn is_large(self, rows: &impl RowCounts) -> bool {
        let limit = 1u32 << (16 - self.tag_bits());
        self.tables()
            .iter()
            .flatten()
            .any(|table| rows.row_count(*table) >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    struct Counts(u32);

    impl RowCounts for Counts {
        fn row_count(&self, _table: TableId) -> u32 {
            self.0
        }
    }

    #[test]
    fn tag_bits() {
        assert_eq!(CodedIndexType::TypeDefOrRef.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasConstant.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasCustomAttribute.tag_bits(), 5);
        assert_eq!(CodedIndexType::HasFieldMarshal.tag_bits(), 1);
        assert_eq!(CodedIndexType::MemberRefParent.tag_bits(), 3);
        assert_eq!(CodedIndexType::CustomAttributeType.tag_bits(), 3);
        assert_eq!(CodedIndexType::ResolutionScope.tag_bits(), 2);
        assert_eq!(CodedIndexType::TypeOrMethodDef.tag_bits(), 1);
    }

    #[test]
    fn decode_type_def_or_ref() {
        let kind = CodedIndexType::TypeDefOrRef;
        assert_eq!(
            kind.decode(0x08).unwrap(),
            Some(Token::from_parts(TableId::TypeDef, 2))
        );
        assert_eq!(
            kind.decode(0x0E).unwrap(),
            Some(Token::from_parts(TableId::TypeSpec, 3))
        );
        assert_eq!(kind.decode(0x00).unwrap(), None);
        assert!(matches!(
            kind.decode(0x07),
            Err(Error::InvalidCodedIndexTag { tag: 3, .. })
        ));
    }

    #[test]
    fn reserved_tags_fail() {
        let kind = CodedIndexType::CustomAttributeType;
        assert!(kind.decode(0x09).is_err());
        assert_eq!(
            kind.decode(0x0B).unwrap(),
            Some(Token::from_parts(TableId::MemberRef, 1))
        );
    }

    #[test]
    fn permission_slot_is_reserved() {
        let kind = CodedIndexType::HasCustomAttribute;
        assert!(matches!(
            kind.decode((1 << 5) | 8),
            Err(Error::InvalidCodedIndexTag { tag: 8, .. })
        ));
        assert_eq!(
            kind.decode((1 << 5) | 9).unwrap(),
            Some(Token::from_parts(TableId::Property, 1))
        );
        assert!(kind.encode(Token::from_parts(TableId::DeclSecurity, 1)).is_err());
    }

    #[test]
    fn decode_checked_distinguishes_rid_from_tag() {
        let kind = CodedIndexType::MethodDefOrRef;
        assert!(kind.decode_checked(0x06, &Counts(3)).unwrap().is_some());
        assert!(matches!(
            kind.decode_checked(0x08, &Counts(3)),
            Err(Error::RidOutOfRange { rid: 4, rows: 3, .. })
        ));
        assert_eq!(kind.decode_checked(0x01, &Counts(0)).unwrap(), None);
    }

    #[test]
    fn encode_inverts_decode() {
        for kind in CodedIndexType::iter() {
            for (tag, table) in kind.tables().iter().enumerate() {
                let Some(table) = table else { continue };
                let token = Token::from_parts(*table, 7);
                let value = kind.encode(token).unwrap();
                assert_eq!(value & ((1 << kind.tag_bits()) - 1), tag as u32);
                assert_eq!(kind.decode(value).unwrap(), Some(token));
            }
        }

        assert!(CodedIndexType::TypeOrMethodDef
            .encode(Token::from_parts(TableId::Field, 1))
            .is_err());
    }

    #[test]
    fn large_index_threshold() {
        assert!(!CodedIndexType::TypeDefOrRef.is_large(&Counts(0x3FFF)));
        assert!(CodedIndexType::TypeDefOrRef.is_large(&Counts(0x4000)));
        assert!(!CodedIndexType::HasFieldMarshal.is_large(&Counts(0x7FFF)));
    }
}

//! The resolution graph: tokens turned into identity-unique, lazily populated member objects.
//!
//! A [`ModuleGraph`] owns the row tables and heaps of one module. Looking up a token constructs
//! the wrapper for its row on first use and caches it, so that every later lookup of the same
//! token returns the very same `Arc`. Wrappers carry no owning references to other wrappers:
//! related members are stored as tokens and resolved through the graph on demand, which keeps
//! cyclic relations (a method and its declaring type, nested and enclosing types) free of
//! reference cycles.
//!
//! Decoded names, signatures and related member lists are [`LazyField`]s on each wrapper. They
//! are computed from the current rows on first access and dropped by [`ModuleGraph::clear_cache`]
//! or [`ModuleGraph::replace_row`], while the wrapper identity itself is preserved.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cilgraph::metadata::{
//!     graph::{ModuleGraph, TypeDefinition},
//!     streams::Heaps,
//!     tables::{MetadataTables, TypeDefRaw},
//! };
//!
//! let mut heaps = Heaps::new();
//! let mut tables = MetadataTables::new();
//! let token = tables.type_def.push(TypeDefRaw {
//!     type_name: heaps.strings.append("Program")?,
//!     ..Default::default()
//! });
//!
//! let graph = ModuleGraph::new(tables, heaps);
//! let first = graph.get::<TypeDefinition>(token).unwrap();
//! let second = graph.get::<TypeDefinition>(token).unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(&*first.name(&graph)?, "Program");
//! # Ok::<(), cilgraph::Error>(())
//! ```

mod lazy;
mod members;

pub use lazy::LazyField;
pub use members::{
    EventDefinition, ExportedType, FieldDefinition, GenericParameter, InterfaceImplementation,
    MemberRefSignature, MemberReference, MethodDefinition, MethodImplementation,
    MethodSpecification, PropertyDefinition, SecurityDeclaration, StandAloneSignature,
    StandAloneSignatureKind, TypeDefinition, TypeReference, TypeSpecification,
};

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use dashmap::DashMap;

use crate::{
    config::LoaderConfig,
    metadata::{
        signatures::{SignatureParser, TypeResolver},
        streams::Heaps,
        tables::{MetadataTables, RowCounts, TableId, TableRow},
        token::Token,
    },
    Error, Result,
};

/// Source of method body bytes, addressed by the `RVA` column of `MethodDef` rows.
///
/// The returned slice starts at the body header and may extend past the end of the body.
pub trait MethodBodySource: Send + Sync {
    /// The bytes at `rva`, if the image maps it.
    fn method_body(&self, rva: u32) -> Option<&[u8]>;
}

impl MethodBodySource for BTreeMap<u32, Vec<u8>> {
    fn method_body(&self, rva: u32) -> Option<&[u8]> {
        self.get(&rva).map(Vec::as_slice)
    }
}

impl MethodBodySource for HashMap<u32, Vec<u8>> {
    fn method_body(&self, rva: u32) -> Option<&[u8]> {
        self.get(&rva).map(Vec::as_slice)
    }
}

/// A resolved member, one variant per table kind the graph models.
#[derive(Debug, Clone)]
pub enum Member {
    /// `TypeRef` row
    TypeReference(Arc<TypeReference>),
    /// `TypeDef` row
    TypeDefinition(Arc<TypeDefinition>),
    /// `TypeSpec` row
    TypeSpecification(Arc<TypeSpecification>),
    /// `Field` row
    FieldDefinition(Arc<FieldDefinition>),
    /// `MethodDef` row
    MethodDefinition(Arc<MethodDefinition>),
    /// `MemberRef` row
    MemberReference(Arc<MemberReference>),
    /// `StandAloneSig` row
    StandAloneSignature(Arc<StandAloneSignature>),
    /// `Event` row
    EventDefinition(Arc<EventDefinition>),
    /// `Property` row
    PropertyDefinition(Arc<PropertyDefinition>),
    /// `GenericParam` row
    GenericParameter(Arc<GenericParameter>),
    /// `MethodSpec` row
    MethodSpecification(Arc<MethodSpecification>),
    /// `InterfaceImpl` row
    InterfaceImplementation(Arc<InterfaceImplementation>),
    /// `MethodImpl` row
    MethodImplementation(Arc<MethodImplementation>),
    /// `DeclSecurity` row
    SecurityDeclaration(Arc<SecurityDeclaration>),
    /// `ExportedType` row
    ExportedType(Arc<ExportedType>),
}

impl Member {
    fn create(table: TableId, token: Token) -> Option<Member> {
        Some(match table {
            TableId::TypeRef => Member::TypeReference(Arc::new(TypeReference::new(token))),
            TableId::TypeDef => Member::TypeDefinition(Arc::new(TypeDefinition::new(token))),
            TableId::TypeSpec => {
                Member::TypeSpecification(Arc::new(TypeSpecification::new(token)))
            }
            TableId::Field => Member::FieldDefinition(Arc::new(FieldDefinition::new(token))),
            TableId::MethodDef => Member::MethodDefinition(Arc::new(MethodDefinition::new(token))),
            TableId::MemberRef => Member::MemberReference(Arc::new(MemberReference::new(token))),
            TableId::StandAloneSig => {
                Member::StandAloneSignature(Arc::new(StandAloneSignature::new(token)))
            }
            TableId::Event => Member::EventDefinition(Arc::new(EventDefinition::new(token))),
            TableId::Property => {
                Member::PropertyDefinition(Arc::new(PropertyDefinition::new(token)))
            }
            TableId::GenericParam => {
                Member::GenericParameter(Arc::new(GenericParameter::new(token)))
            }
            TableId::MethodSpec => {
                Member::MethodSpecification(Arc::new(MethodSpecification::new(token)))
            }
            TableId::InterfaceImpl => {
                Member::InterfaceImplementation(Arc::new(InterfaceImplementation::new(token)))
            }
            TableId::MethodImpl => {
                Member::MethodImplementation(Arc::new(MethodImplementation::new(token)))
            }
            TableId::DeclSecurity => {
                Member::SecurityDeclaration(Arc::new(SecurityDeclaration::new(token)))
            }
            TableId::ExportedType => Member::ExportedType(Arc::new(ExportedType::new(token))),
            _ => return None,
        })
    }

    /// Token of the wrapped row.
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            Member::TypeReference(member) => member.token,
            Member::TypeDefinition(member) => member.token,
            Member::TypeSpecification(member) => member.token,
            Member::FieldDefinition(member) => member.token,
            Member::MethodDefinition(member) => member.token,
            Member::MemberReference(member) => member.token,
            Member::StandAloneSignature(member) => member.token,
            Member::EventDefinition(member) => member.token,
            Member::PropertyDefinition(member) => member.token,
            Member::GenericParameter(member) => member.token,
            Member::MethodSpecification(member) => member.token,
            Member::InterfaceImplementation(member) => member.token,
            Member::MethodImplementation(member) => member.token,
            Member::SecurityDeclaration(member) => member.token,
            Member::ExportedType(member) => member.token,
        }
    }

    /// Whether both values wrap the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Member) -> bool {
        match (self, other) {
            (Member::TypeReference(a), Member::TypeReference(b)) => Arc::ptr_eq(a, b),
            (Member::TypeDefinition(a), Member::TypeDefinition(b)) => Arc::ptr_eq(a, b),
            (Member::TypeSpecification(a), Member::TypeSpecification(b)) => Arc::ptr_eq(a, b),
            (Member::FieldDefinition(a), Member::FieldDefinition(b)) => Arc::ptr_eq(a, b),
            (Member::MethodDefinition(a), Member::MethodDefinition(b)) => Arc::ptr_eq(a, b),
            (Member::MemberReference(a), Member::MemberReference(b)) => Arc::ptr_eq(a, b),
            (Member::StandAloneSignature(a), Member::StandAloneSignature(b)) => Arc::ptr_eq(a, b),
            (Member::EventDefinition(a), Member::EventDefinition(b)) => Arc::ptr_eq(a, b),
            (Member::PropertyDefinition(a), Member::PropertyDefinition(b)) => Arc::ptr_eq(a, b),
            (Member::GenericParameter(a), Member::GenericParameter(b)) => Arc::ptr_eq(a, b),
            (Member::MethodSpecification(a), Member::MethodSpecification(b)) => Arc::ptr_eq(a, b),
            (Member::InterfaceImplementation(a), Member::InterfaceImplementation(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Member::MethodImplementation(a), Member::MethodImplementation(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Member::SecurityDeclaration(a), Member::SecurityDeclaration(b)) => Arc::ptr_eq(a, b),
            (Member::ExportedType(a), Member::ExportedType(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether this member denotes a type.
    #[must_use]
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Member::TypeReference(_) | Member::TypeDefinition(_) | Member::TypeSpecification(_)
        )
    }

    fn clear_cache(&self) {
        match self {
            Member::TypeReference(member) => member.clear_cache(),
            Member::TypeDefinition(member) => member.clear_cache(),
            Member::TypeSpecification(member) => member.clear_cache(),
            Member::FieldDefinition(member) => member.clear_cache(),
            Member::MethodDefinition(member) => member.clear_cache(),
            Member::MemberReference(member) => member.clear_cache(),
            Member::StandAloneSignature(member) => member.clear_cache(),
            Member::EventDefinition(member) => member.clear_cache(),
            Member::PropertyDefinition(member) => member.clear_cache(),
            Member::GenericParameter(member) => member.clear_cache(),
            Member::MethodSpecification(member) => member.clear_cache(),
            Member::SecurityDeclaration(member) => member.clear_cache(),
            Member::ExportedType(member) => member.clear_cache(),
            Member::InterfaceImplementation(_) | Member::MethodImplementation(_) => {}
        }
    }
}

/// Typed access to one kind of [`Member`].
pub trait GraphMember: Sized {
    /// The table whose rows this wrapper represents.
    const TABLE: TableId;

    /// The wrapper inside `member`, if it is of this kind.
    fn from_member(member: &Member) -> Option<Arc<Self>>;
}

macro_rules! graph_member {
    ($($wrapper:ident => $table:ident),* $(,)?) => {
        $(
            impl GraphMember for $wrapper {
                const TABLE: TableId = TableId::$table;

                fn from_member(member: &Member) -> Option<Arc<Self>> {
                    match member {
                        Member::$wrapper(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

graph_member! {
    TypeReference => TypeRef,
    TypeDefinition => TypeDef,
    TypeSpecification => TypeSpec,
    FieldDefinition => Field,
    MethodDefinition => MethodDef,
    MemberReference => MemberRef,
    StandAloneSignature => StandAloneSig,
    EventDefinition => Event,
    PropertyDefinition => Property,
    GenericParameter => GenericParam,
    MethodSpecification => MethodSpec,
    InterfaceImplementation => InterfaceImpl,
    MethodImplementation => MethodImpl,
    SecurityDeclaration => DeclSecurity,
    ExportedType => ExportedType,
}

/// The object graph of one module.
pub struct ModuleGraph {
    tables: RwLock<MetadataTables>,
    heaps: Heaps,
    cache: DashMap<Token, Member>,
    config: LoaderConfig,
    bodies: Option<Box<dyn MethodBodySource>>,
}

impl ModuleGraph {
    /// Create a graph over `tables` and `heaps` with the default configuration.
    #[must_use]
    pub fn new(tables: MetadataTables, heaps: Heaps) -> Self {
        ModuleGraph {
            tables: RwLock::new(tables),
            heaps,
            cache: DashMap::new(),
            config: LoaderConfig::default(),
            bodies: None,
        }
    }

    /// Create a graph with an explicit configuration.
    ///
    /// # Errors
    /// With [`LoaderConfig::strict_coded_indices`] set, returns [`Error::RidOutOfRange`] for the
    /// first coded index column that points past the end of its table.
    pub fn with_config(tables: MetadataTables, heaps: Heaps, config: LoaderConfig) -> Result<Self> {
        if config.strict_coded_indices {
            tables.validate_references()?;
        }

        Ok(ModuleGraph {
            config,
            ..Self::new(tables, heaps)
        })
    }

    /// Attach the source method bodies are read from.
    #[must_use]
    pub fn with_body_source(mut self, source: impl MethodBodySource + 'static) -> Self {
        self.bodies = Some(Box::new(source));
        self
    }

    /// The configuration this graph was created with.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Shared access to the row tables.
    pub fn tables(&self) -> RwLockReadGuard<'_, MetadataTables> {
        read_lock!(self.tables)
    }

    /// Exclusive access to the row tables, used by table buffers to flush new rows.
    ///
    /// Wrappers created before a change keep their lazily computed values; call
    /// [`ModuleGraph::clear_cache`] afterwards if existing rows were modified.
    pub fn tables_mut(&self) -> RwLockWriteGuard<'_, MetadataTables> {
        write_lock!(self.tables)
    }

    /// The heaps of this module.
    #[must_use]
    pub fn heaps(&self) -> &Heaps {
        &self.heaps
    }

    /// The heaps of this module, mutably.
    pub fn heaps_mut(&mut self) -> &mut Heaps {
        &mut self.heaps
    }

    /// Resolve `token` to its member.
    ///
    /// Returns `None` for a null row id, a row id past the end of its table and tables the graph
    /// does not model. Repeated lookups of one token return the same object.
    pub fn try_lookup(&self, token: Token) -> Option<Member> {
        let (table, rid) = token.decode()?;
        let rows = self.tables().row_count(table);
        if rid == 0 || rid > rows {
            return None;
        }

        if let Some(member) = self.cache.get(&token) {
            return Some(member.clone());
        }

        log::trace!("graph: constructing member for {token}");
        let created = Member::create(table, token)?;
        Some(self.cache.entry(token).or_insert(created).clone())
    }

    /// Resolve `token` to a member of a specific kind.
    pub fn get<T: GraphMember>(&self, token: Token) -> Option<Arc<T>> {
        if !token.is_table(T::TABLE) {
            return None;
        }
        self.try_lookup(token).and_then(|member| T::from_member(&member))
    }

    /// Every member of kind `T`, in row order.
    pub fn members<T: GraphMember>(&self) -> Vec<Arc<T>> {
        let count = self.tables().row_count(T::TABLE);
        (1..=count)
            .filter_map(|rid| self.get::<T>(Token::from_parts(T::TABLE, rid)))
            .collect()
    }

    /// Number of members constructed so far.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Drop every lazily computed value of every cached member. Member identities are kept.
    pub fn clear_cache(&self) {
        log::debug!("graph: clearing lazy values of {} members", self.cache.len());
        for entry in &self.cache {
            entry.value().clear_cache();
        }
    }

    /// Replace the row at `rid` and drop the lazy values of its cached member.
    ///
    /// Returns the previous row, or `None` if `rid` does not exist.
    pub fn replace_row<R: TableRow>(&self, rid: u32, row: R) -> Option<R> {
        let previous = with_write!(self.tables, |tables: &mut MetadataTables| {
            tables.table_mut::<R>().replace(rid, row)
        })?;

        if let Some(member) = self.cache.get(&Token::from_parts(R::TABLE, rid)) {
            log::debug!("graph: row {} replaced, clearing its lazy values", member.token());
            member.clear_cache();
        }
        Some(previous)
    }

    /// A copy of the row at `rid`.
    pub(crate) fn row<R: TableRow>(&self, rid: u32) -> Result<R> {
        let tables = self.tables();
        tables
            .get::<R>(rid)
            .cloned()
            .ok_or_else(|| Error::RidOutOfRange {
                table: R::TABLE,
                rid,
                rows: tables.row_count(R::TABLE),
            })
    }

    /// A string from the strings heap.
    pub(crate) fn string(&self, index: u32) -> Result<Arc<str>> {
        Ok(Arc::from(self.heaps.strings.get(index)?))
    }

    /// A blob that must be present.
    pub(crate) fn blob(&self, index: u32) -> Result<&[u8]> {
        self.heaps
            .blobs
            .get(index)
            .ok_or_else(|| malformed_error!("Missing signature blob at index {}", index))
    }

    /// A signature parser over `data` that resolves through this graph.
    pub(crate) fn signature_parser<'a>(&'a self, data: &'a [u8]) -> SignatureParser<'a> {
        SignatureParser::with_resolver(data, self).with_max_depth(self.config.max_signature_depth)
    }

    /// The bytes of the method body at `rva`.
    pub(crate) fn method_body_bytes(&self, rva: u32) -> Option<&[u8]> {
        self.bodies.as_ref()?.method_body(rva)
    }
}

impl TypeResolver for ModuleGraph {
    fn is_type(&self, token: Token) -> bool {
        (token.is_table(TableId::TypeDef)
            || token.is_table(TableId::TypeRef)
            || token.is_table(TableId::TypeSpec))
            && self.tables().contains(token)
    }

    fn type_spec_blob(&self, token: Token) -> Option<&[u8]> {
        if !token.is_table(TableId::TypeSpec) {
            return None;
        }
        let index = self.tables().type_spec.get(token.row())?.signature;
        self.heaps.blobs.get(index)
    }
}

impl std::fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraph")
            .field("cached", &self.cache.len())
            .field("config", &self.config)
            .field("bodies", &self.bodies.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{MethodDefRaw, TypeDefRaw, TypeRefRaw};

    fn graph() -> ModuleGraph {
        let mut heaps = Heaps::new();
        let mut tables = MetadataTables::new();
        let name = heaps.strings.append("Object").unwrap();
        tables.type_ref.push(TypeRefRaw {
            type_name: name,
            ..Default::default()
        });
        tables.type_def.push(TypeDefRaw {
            method_list: 1,
            field_list: 1,
            ..Default::default()
        });
        tables.method_def.push(MethodDefRaw::default());
        ModuleGraph::new(tables, heaps)
    }

    #[test]
    fn lookups_are_identity_preserving() {
        let graph = graph();
        let token = Token::from_parts(TableId::TypeRef, 1);

        let first = graph.try_lookup(token).unwrap();
        let second = graph.try_lookup(token).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(first.token(), token);
        assert!(first.is_type());
        assert_eq!(graph.cached_count(), 1);
    }

    #[test]
    fn rejects_null_out_of_range_and_unmodelled() {
        let graph = graph();
        assert!(graph.try_lookup(Token::from_parts(TableId::TypeRef, 0)).is_none());
        assert!(graph.try_lookup(Token::from_parts(TableId::TypeRef, 2)).is_none());
        assert!(graph.try_lookup(Token::from_parts(TableId::Param, 1)).is_none());
        assert!(graph.try_lookup(Token::new(0x7000_0001)).is_none());
        assert_eq!(graph.cached_count(), 0);
    }

    #[test]
    fn typed_access() {
        let graph = graph();
        let token = Token::from_parts(TableId::TypeRef, 1);
        assert!(graph.get::<TypeReference>(token).is_some());
        assert!(graph.get::<TypeDefinition>(token).is_none());
        assert_eq!(graph.members::<MethodDefinition>().len(), 1);
    }

    #[test]
    fn replace_row_clears_lazy_values() {
        let mut graph = graph();
        let renamed = graph.heaps_mut().strings.append("String").unwrap();
        let token = Token::from_parts(TableId::TypeRef, 1);
        let type_ref = graph.get::<TypeReference>(token).unwrap();
        assert_eq!(&*type_ref.name(&graph).unwrap(), "Object");

        graph.replace_row(
            1,
            TypeRefRaw {
                type_name: renamed,
                ..Default::default()
            },
        );

        let again = graph.get::<TypeReference>(token).unwrap();
        assert!(Arc::ptr_eq(&type_ref, &again));
        assert_eq!(&*again.name(&graph).unwrap(), "String");
    }

    #[test]
    fn strict_config_validates_coded_indices() {
        let mut tables = MetadataTables::new();
        tables.type_def.push(TypeDefRaw {
            extends: Token::from_parts(TableId::TypeRef, 5),
            ..Default::default()
        });

        assert!(ModuleGraph::with_config(tables.clone(), Heaps::new(), LoaderConfig::default()).is_ok());
        assert!(matches!(
            ModuleGraph::with_config(tables, Heaps::new(), LoaderConfig::strict()),
            Err(Error::RidOutOfRange {
                table: TableId::TypeRef,
                rid: 5,
                ..
            })
        ));
    }
}

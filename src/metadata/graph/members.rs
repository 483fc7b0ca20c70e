use std::sync::Arc;

use crate::{
    metadata::{
        generic::{GenericArgumentProvider, GenericContext, GenericParameterKind, Instantiate},
        graph::{GraphMember, LazyField, Member, ModuleGraph},
        method::CilMethodBody,
        signatures::{
            FieldSignature, LocalVariablesSignature, MethodSignature, MethodSpecSignature,
            PropertySignature, TypeSignature, SIGNATURE_HEADER,
        },
        tables::{
            DeclSecurityRaw, EventMapRaw, EventRaw, ExportedTypeRaw, FieldRaw, GenericParamRaw,
            InterfaceImplRaw, MemberRefRaw, MethodDefRaw, MethodImplRaw, MethodSpecRaw,
            NestedClassRaw, PropertyRaw, RowCounts, StandAloneSigRaw, TableId, TypeDefRaw,
            TypeRefRaw, TypeSpecRaw,
        },
        token::Token,
    },
    Result,
};

/// Index of the run owner for `rid`, given the first row of every run in ascending order.
///
/// Runs end where the next one starts; the last run ends at `end` (exclusive).
fn run_owner(starts: &[u32], rid: u32, end: u32) -> Option<u32> {
    if rid == 0 || rid >= end {
        return None;
    }
    let position = starts.partition_point(|start| *start <= rid);
    if position == 0 {
        return None;
    }
    Some(position as u32)
}

/// The `[start, end)` run of rows owned by entry `index` (0-based) of `starts`.
fn run_range(starts: &[u32], index: usize, end: u32) -> std::ops::Range<u32> {
    let start = starts.get(index).copied().unwrap_or(end).clamp(1, end);
    let stop = starts
        .get(index + 1)
        .copied()
        .unwrap_or(end)
        .clamp(start, end);
    start..stop
}

fn tokens(table: TableId, rids: impl IntoIterator<Item = u32>) -> Arc<[Token]> {
    rids.into_iter()
        .map(|rid| Token::from_parts(table, rid))
        .collect()
}

/// A type imported from another module (`TypeRef`).
#[derive(Debug)]
pub struct TypeReference {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    namespace: LazyField<str>,
}

impl TypeReference {
    pub(crate) fn new(token: Token) -> Self {
        TypeReference {
            token,
            name: LazyField::new(),
            namespace: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<TypeRefRaw> {
        graph.row(self.token.row())
    }

    /// Simple name of the type.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.type_name))
    }

    /// Namespace of the type, empty for the global namespace.
    ///
    /// # Errors
    /// Fails if the row is gone or the namespace index is outside the strings heap.
    pub fn namespace(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.namespace
            .get_or_try_init(|| graph.string(self.row(graph)?.type_namespace))
    }

    /// `Namespace.Name`, or just the name in the global namespace.
    ///
    /// # Errors
    /// See [`TypeReference::name`].
    pub fn full_name(&self, graph: &ModuleGraph) -> Result<String> {
        Ok(full_name(&self.namespace(graph)?, &self.name(graph)?))
    }

    /// Token of the resolution scope: a module, module reference, assembly reference or, for
    /// nested types, the enclosing `TypeRef`.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn resolution_scope(&self, graph: &ModuleGraph) -> Result<Token> {
        Ok(self.row(graph)?.resolution_scope)
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.namespace.clear();
    }
}

fn full_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// A type defined in this module (`TypeDef`).
#[derive(Debug)]
pub struct TypeDefinition {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    namespace: LazyField<str>,
    enclosing_type: LazyField<Option<Token>>,
    nested_types: LazyField<[Token]>,
    fields: LazyField<[Token]>,
    methods: LazyField<[Token]>,
    events: LazyField<[Token]>,
    interfaces: LazyField<[Token]>,
    method_impls: LazyField<[Token]>,
    generic_params: LazyField<[Token]>,
}

impl TypeDefinition {
    pub(crate) fn new(token: Token) -> Self {
        TypeDefinition {
            token,
            name: LazyField::new(),
            namespace: LazyField::new(),
            enclosing_type: LazyField::new(),
            nested_types: LazyField::new(),
            fields: LazyField::new(),
            methods: LazyField::new(),
            events: LazyField::new(),
            interfaces: LazyField::new(),
            method_impls: LazyField::new(),
            generic_params: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<TypeDefRaw> {
        graph.row(self.token.row())
    }

    /// Simple name of the type.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.type_name))
    }

    /// Namespace of the type, empty for nested types and the global namespace.
    ///
    /// # Errors
    /// Fails if the row is gone or the namespace index is outside the strings heap.
    pub fn namespace(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.namespace
            .get_or_try_init(|| graph.string(self.row(graph)?.type_namespace))
    }

    /// `Namespace.Name` for top level types, `Namespace.Outer/Inner` for nested ones.
    ///
    /// # Errors
    /// Fails for unreadable names and for `NestedClass` rows that nest a type in itself.
    pub fn full_name(&self, graph: &ModuleGraph) -> Result<String> {
        let limit = graph.tables().row_count(TableId::TypeDef) as usize;
        let mut names = vec![self.name(graph)?];
        let mut namespace = self.namespace(graph)?;

        let mut current = self.enclosing_type(graph);
        while let Some(enclosing) = current {
            if names.len() > limit {
                return Err(malformed_error!("Cyclic nesting of type {}", self.token));
            }
            names.push(enclosing.name(graph)?);
            namespace = enclosing.namespace(graph)?;
            current = enclosing.enclosing_type(graph);
        }

        let path: Vec<&str> = names.iter().rev().map(|name| &**name).collect();
        Ok(full_name(&namespace, &path.join("/")))
    }

    /// The base type, `None` for interfaces and the root of the hierarchy.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn base_type(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.extends))
    }

    /// The type this one is nested in.
    pub fn enclosing_type(&self, graph: &ModuleGraph) -> Option<Arc<TypeDefinition>> {
        let enclosing = self.enclosing_type.get_or_init(|| {
            let rid = self.token.row();
            let tables = graph.tables();
            let enclosing = tables
                .nested_class
                .iter()
                .find(|row: &&NestedClassRaw| row.nested_class == rid)
                .map(|row| Token::from_parts(TableId::TypeDef, row.enclosing_class));
            Arc::new(enclosing)
        });

        enclosing.and_then(|token| graph.get::<TypeDefinition>(token))
    }

    /// Types nested directly in this one.
    pub fn nested_types(&self, graph: &ModuleGraph) -> Vec<Arc<TypeDefinition>> {
        let nested = self.nested_types.get_or_init(|| {
            let rid = self.token.row();
            let tables = graph.tables();
            tokens(
                TableId::TypeDef,
                tables
                    .nested_class
                    .iter()
                    .filter(|row| row.enclosing_class == rid)
                    .map(|row| row.nested_class),
            )
        });
        resolve_all(graph, &nested)
    }

    /// Tokens of the fields owned by this type.
    pub fn field_tokens(&self, graph: &ModuleGraph) -> Arc<[Token]> {
        self.fields.get_or_init(|| {
            let tables = graph.tables();
            let starts: Vec<u32> = tables.type_def.iter().map(|row| row.field_list).collect();
            let end = tables.row_count(TableId::Field) + 1;
            let index = self.token.row().saturating_sub(1) as usize;
            tokens(TableId::Field, run_range(&starts, index, end))
        })
    }

    /// Fields owned by this type.
    pub fn fields(&self, graph: &ModuleGraph) -> Vec<Arc<FieldDefinition>> {
        resolve_all(graph, &self.field_tokens(graph))
    }

    /// Tokens of the methods owned by this type.
    pub fn method_tokens(&self, graph: &ModuleGraph) -> Arc<[Token]> {
        self.methods.get_or_init(|| {
            let tables = graph.tables();
            let starts: Vec<u32> = tables.type_def.iter().map(|row| row.method_list).collect();
            let end = tables.row_count(TableId::MethodDef) + 1;
            let index = self.token.row().saturating_sub(1) as usize;
            tokens(TableId::MethodDef, run_range(&starts, index, end))
        })
    }

    /// Methods owned by this type.
    pub fn methods(&self, graph: &ModuleGraph) -> Vec<Arc<MethodDefinition>> {
        resolve_all(graph, &self.method_tokens(graph))
    }

    /// Events declared by this type, found through its `EventMap` entry.
    pub fn events(&self, graph: &ModuleGraph) -> Vec<Arc<EventDefinition>> {
        let events = self.events.get_or_init(|| {
            let rid = self.token.row();
            let tables = graph.tables();
            let starts: Vec<u32> = tables.event_map.iter().map(|row| row.event_list).collect();
            let end = tables.row_count(TableId::Event) + 1;
            match tables
                .event_map
                .iter()
                .position(|row: &EventMapRaw| row.parent == rid)
            {
                Some(index) => tokens(TableId::Event, run_range(&starts, index, end)),
                None => Arc::from([]),
            }
        });
        resolve_all(graph, &events)
    }

    /// Interfaces implemented by this type.
    pub fn interfaces(&self, graph: &ModuleGraph) -> Vec<Arc<InterfaceImplementation>> {
        let interfaces = self.interfaces.get_or_init(|| {
            let rid = self.token.row();
            let tables = graph.tables();
            tokens(
                TableId::InterfaceImpl,
                tables
                    .interface_impl
                    .iter()
                    .filter(|row: &&InterfaceImplRaw| row.class == rid)
                    .map(|row| row.rid),
            )
        });
        resolve_all(graph, &interfaces)
    }

    /// Explicit interface method overrides declared by this type.
    pub fn method_impls(&self, graph: &ModuleGraph) -> Vec<Arc<MethodImplementation>> {
        let impls = self.method_impls.get_or_init(|| {
            let rid = self.token.row();
            let tables = graph.tables();
            tokens(
                TableId::MethodImpl,
                tables
                    .method_impl
                    .iter()
                    .filter(|row: &&MethodImplRaw| row.class == rid)
                    .map(|row| row.rid),
            )
        });
        resolve_all(graph, &impls)
    }

    /// Generic parameters of this type, in declaration order.
    pub fn generic_params(&self, graph: &ModuleGraph) -> Vec<Arc<GenericParameter>> {
        let params = self
            .generic_params
            .get_or_init(|| generic_params_of(graph, self.token));
        resolve_all(graph, &params)
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.namespace.clear();
        self.enclosing_type.clear();
        self.nested_types.clear();
        self.fields.clear();
        self.methods.clear();
        self.events.clear();
        self.interfaces.clear();
        self.method_impls.clear();
        self.generic_params.clear();
    }
}

fn resolve_all<T: GraphMember>(graph: &ModuleGraph, tokens: &[Token]) -> Vec<Arc<T>> {
    tokens
        .iter()
        .filter_map(|token| graph.get::<T>(*token))
        .collect()
}

fn generic_params_of(graph: &ModuleGraph, owner: Token) -> Arc<[Token]> {
    let tables = graph.tables();
    let mut params: Vec<&GenericParamRaw> = tables
        .generic_param
        .iter()
        .filter(|row| row.owner == owner)
        .collect();
    params.sort_by_key(|row| row.number);
    tokens(TableId::GenericParam, params.iter().map(|row| row.rid))
}

/// Declaring type of a row in a `TypeDef` owned run.
fn declaring_type_by_list(
    graph: &ModuleGraph,
    rid: u32,
    table: TableId,
    list: impl Fn(&TypeDefRaw) -> u32,
) -> Option<Token> {
    let tables = graph.tables();
    let starts: Vec<u32> = tables.type_def.iter().map(list).collect();
    let end = tables.row_count(table) + 1;
    run_owner(&starts, rid, end).map(|owner| Token::from_parts(TableId::TypeDef, owner))
}

/// A `TypeSpec` row: a type given as a signature blob.
#[derive(Debug)]
pub struct TypeSpecification {
    /// Token of the row
    pub token: Token,
    signature: LazyField<TypeSignature>,
}

impl TypeSpecification {
    pub(crate) fn new(token: Token) -> Self {
        TypeSpecification {
            token,
            signature: LazyField::new(),
        }
    }

    /// The decoded type.
    ///
    /// A specification that refers back to itself decodes to a tree containing a
    /// [`TypeSignature::Invalid`] node with cause `MetadataLoop` at the point of re-entry.
    ///
    /// # Errors
    /// Fails if the row or its blob is missing or the blob is structurally broken.
    pub fn signature(&self, graph: &ModuleGraph) -> Result<Arc<TypeSignature>> {
        self.signature.get_or_try_init(|| {
            let row: TypeSpecRaw = graph.row(self.token.row())?;
            let data = graph.blob(row.signature)?;
            let signature = graph
                .signature_parser(data)
                .with_guard(self.token)
                .parse_type()?;
            Ok(Arc::new(signature))
        })
    }

    pub(crate) fn clear_cache(&self) {
        self.signature.clear();
    }
}

/// A field defined in this module.
#[derive(Debug)]
pub struct FieldDefinition {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    signature: LazyField<FieldSignature>,
    declaring_type: LazyField<Option<Token>>,
}

impl FieldDefinition {
    pub(crate) fn new(token: Token) -> Self {
        FieldDefinition {
            token,
            name: LazyField::new(),
            signature: LazyField::new(),
            declaring_type: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<FieldRaw> {
        graph.row(self.token.row())
    }

    /// Name of the field.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.name))
    }

    /// Decoded field signature.
    ///
    /// # Errors
    /// Fails if the blob is missing or malformed.
    pub fn signature(&self, graph: &ModuleGraph) -> Result<Arc<FieldSignature>> {
        self.signature.get_or_try_init(|| {
            let data = graph.blob(self.row(graph)?.signature)?;
            Ok(Arc::new(graph.signature_parser(data).parse_field_signature()?))
        })
    }

    /// The type owning this field.
    pub fn declaring_type(&self, graph: &ModuleGraph) -> Option<Arc<TypeDefinition>> {
        let owner = self.declaring_type.get_or_init(|| {
            Arc::new(declaring_type_by_list(
                graph,
                self.token.row(),
                TableId::Field,
                |row| row.field_list,
            ))
        });
        owner.and_then(|token| graph.get::<TypeDefinition>(token))
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.signature.clear();
        self.declaring_type.clear();
    }
}

/// A method defined in this module.
#[derive(Debug)]
pub struct MethodDefinition {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    signature: LazyField<MethodSignature>,
    declaring_type: LazyField<Option<Token>>,
    generic_params: LazyField<[Token]>,
    body: LazyField<CilMethodBody>,
}

impl MethodDefinition {
    pub(crate) fn new(token: Token) -> Self {
        MethodDefinition {
            token,
            name: LazyField::new(),
            signature: LazyField::new(),
            declaring_type: LazyField::new(),
            generic_params: LazyField::new(),
            body: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<MethodDefRaw> {
        graph.row(self.token.row())
    }

    /// Name of the method.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.name))
    }

    /// Decoded method signature.
    ///
    /// # Errors
    /// Fails if the blob is missing or malformed.
    pub fn signature(&self, graph: &ModuleGraph) -> Result<Arc<MethodSignature>> {
        self.signature.get_or_try_init(|| {
            let data = graph.blob(self.row(graph)?.signature)?;
            Ok(Arc::new(
                graph.signature_parser(data).parse_method_signature()?,
            ))
        })
    }

    /// The type owning this method.
    pub fn declaring_type(&self, graph: &ModuleGraph) -> Option<Arc<TypeDefinition>> {
        let owner = self.declaring_type.get_or_init(|| {
            Arc::new(declaring_type_by_list(
                graph,
                self.token.row(),
                TableId::MethodDef,
                |row| row.method_list,
            ))
        });
        owner.and_then(|token| graph.get::<TypeDefinition>(token))
    }

    /// Generic parameters of this method, in declaration order.
    pub fn generic_params(&self, graph: &ModuleGraph) -> Vec<Arc<GenericParameter>> {
        let params = self
            .generic_params
            .get_or_init(|| generic_params_of(graph, self.token));
        resolve_all(graph, &params)
    }

    /// The decoded body, `None` for abstract, runtime or extern methods and for graphs without a
    /// body source.
    ///
    /// # Errors
    /// Fails if the body bytes are malformed.
    pub fn body(&self, graph: &ModuleGraph) -> Result<Option<Arc<CilMethodBody>>> {
        if let Some(body) = self.body.get() {
            return Ok(Some(body));
        }

        let rva = self.row(graph)?.rva;
        if rva == 0 {
            return Ok(None);
        }
        let Some(data) = graph.method_body_bytes(rva) else {
            log::warn!("method {}: no body bytes at rva {:#x}", self.token, rva);
            return Ok(None);
        };

        let body = self
            .body
            .get_or_try_init(|| Ok(Arc::new(CilMethodBody::read(data, Some(graph))?)))?;
        Ok(Some(body))
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.signature.clear();
        self.declaring_type.clear();
        self.generic_params.clear();
        self.body.clear();
    }
}

/// Decoded signature of a `MemberRef`, which references either a method or a field.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRefSignature {
    /// Method reference
    Method(MethodSignature),
    /// Field reference
    Field(FieldSignature),
}

/// A reference to a member of another type or module (`MemberRef`).
#[derive(Debug)]
pub struct MemberReference {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    signature: LazyField<MemberRefSignature>,
}

impl MemberReference {
    pub(crate) fn new(token: Token) -> Self {
        MemberReference {
            token,
            name: LazyField::new(),
            signature: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<MemberRefRaw> {
        graph.row(self.token.row())
    }

    /// Name of the referenced member.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.name))
    }

    /// The member's parent: a type, module reference or, for vararg call sites, a method.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn parent(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.class))
    }

    /// Decoded signature, a field signature when the blob starts with `FIELD`.
    ///
    /// # Errors
    /// Fails if the blob is missing or malformed.
    pub fn signature(&self, graph: &ModuleGraph) -> Result<Arc<MemberRefSignature>> {
        self.signature.get_or_try_init(|| {
            let data = graph.blob(self.row(graph)?.signature)?;
            let mut parser = graph.signature_parser(data);
            let signature = if data.first() == Some(&SIGNATURE_HEADER::FIELD) {
                MemberRefSignature::Field(parser.parse_field_signature()?)
            } else {
                MemberRefSignature::Method(parser.parse_method_signature()?)
            };
            Ok(Arc::new(signature))
        })
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.signature.clear();
    }
}

/// Decoded signature of a `StandAloneSig` row.
#[derive(Debug, Clone, PartialEq)]
pub enum StandAloneSignatureKind {
    /// Local variables of a method body
    Locals(LocalVariablesSignature),
    /// Call site signature of `calli`
    Method(MethodSignature),
}

/// A `StandAloneSig` row.
#[derive(Debug)]
pub struct StandAloneSignature {
    /// Token of the row
    pub token: Token,
    signature: LazyField<StandAloneSignatureKind>,
}

impl StandAloneSignature {
    pub(crate) fn new(token: Token) -> Self {
        StandAloneSignature {
            token,
            signature: LazyField::new(),
        }
    }

    /// Decoded signature.
    ///
    /// # Errors
    /// Fails if the row or blob is missing or the blob is malformed.
    pub fn signature(&self, graph: &ModuleGraph) -> Result<Arc<StandAloneSignatureKind>> {
        self.signature.get_or_try_init(|| {
            let row: StandAloneSigRaw = graph.row(self.token.row())?;
            let data = graph.blob(row.signature)?;
            let mut parser = graph.signature_parser(data);
            let signature = if data.first() == Some(&SIGNATURE_HEADER::LOCAL_SIG) {
                StandAloneSignatureKind::Locals(parser.parse_local_var_signature()?)
            } else {
                StandAloneSignatureKind::Method(parser.parse_method_signature()?)
            };
            Ok(Arc::new(signature))
        })
    }

    pub(crate) fn clear_cache(&self) {
        self.signature.clear();
    }
}

/// An event defined in this module.
#[derive(Debug)]
pub struct EventDefinition {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    declaring_type: LazyField<Option<Token>>,
}

impl EventDefinition {
    pub(crate) fn new(token: Token) -> Self {
        EventDefinition {
            token,
            name: LazyField::new(),
            declaring_type: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<EventRaw> {
        graph.row(self.token.row())
    }

    /// Name of the event.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.name))
    }

    /// The delegate type of the event.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn event_type(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.event_type))
    }

    /// The type declaring this event, found through the `EventMap` ranges.
    pub fn declaring_type(&self, graph: &ModuleGraph) -> Option<Arc<TypeDefinition>> {
        let owner = self.declaring_type.get_or_init(|| {
            let tables = graph.tables();
            let starts: Vec<u32> = tables.event_map.iter().map(|row| row.event_list).collect();
            let end = tables.row_count(TableId::Event) + 1;
            let parent = run_owner(&starts, self.token.row(), end)
                .and_then(|index| tables.event_map.get(index))
                .map(|row| Token::from_parts(TableId::TypeDef, row.parent));
            Arc::new(parent)
        });
        owner.and_then(|token| graph.get::<TypeDefinition>(token))
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.declaring_type.clear();
    }
}

/// A property defined in this module.
#[derive(Debug)]
pub struct PropertyDefinition {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    signature: LazyField<PropertySignature>,
}

impl PropertyDefinition {
    pub(crate) fn new(token: Token) -> Self {
        PropertyDefinition {
            token,
            name: LazyField::new(),
            signature: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<PropertyRaw> {
        graph.row(self.token.row())
    }

    /// Name of the property.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.name))
    }

    /// Decoded property signature.
    ///
    /// # Errors
    /// Fails if the blob is missing or malformed.
    pub fn signature(&self, graph: &ModuleGraph) -> Result<Arc<PropertySignature>> {
        self.signature.get_or_try_init(|| {
            let data = graph.blob(self.row(graph)?.signature)?;
            Ok(Arc::new(
                graph.signature_parser(data).parse_property_signature()?,
            ))
        })
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.signature.clear();
    }
}

/// A generic parameter of a type or method.
#[derive(Debug)]
pub struct GenericParameter {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
}

impl GenericParameter {
    pub(crate) fn new(token: Token) -> Self {
        GenericParameter {
            token,
            name: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<GenericParamRaw> {
        graph.row(self.token.row())
    }

    /// Name of the parameter.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.name))
    }

    /// 0-based position in the owner's parameter list.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn number(&self, graph: &ModuleGraph) -> Result<u16> {
        Ok(self.row(graph)?.number)
    }

    /// Whether the owner is a type or a method.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn kind(&self, graph: &ModuleGraph) -> Result<GenericParameterKind> {
        if self.row(graph)?.owner.is_table(TableId::MethodDef) {
            Ok(GenericParameterKind::Method)
        } else {
            Ok(GenericParameterKind::Type)
        }
    }

    /// The owning type or method.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn owner(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.owner))
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
    }
}

/// An instantiation of a generic method (`MethodSpec`).
#[derive(Debug)]
pub struct MethodSpecification {
    /// Token of the row
    pub token: Token,
    instantiation: LazyField<MethodSpecSignature>,
}

impl MethodSpecification {
    pub(crate) fn new(token: Token) -> Self {
        MethodSpecification {
            token,
            instantiation: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<MethodSpecRaw> {
        graph.row(self.token.row())
    }

    /// The generic method being instantiated.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn method(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.method))
    }

    /// The method type arguments.
    ///
    /// # Errors
    /// Fails if the blob is missing or malformed.
    pub fn instantiation(&self, graph: &ModuleGraph) -> Result<Arc<MethodSpecSignature>> {
        self.instantiation.get_or_try_init(|| {
            let data = graph.blob(self.row(graph)?.instantiation)?;
            Ok(Arc::new(
                graph.signature_parser(data).parse_method_spec_signature()?,
            ))
        })
    }

    /// The signature of the instantiated method with its method level parameters replaced.
    ///
    /// `type_arguments` supplies the arguments of the declaring type, if it is generic as well.
    /// Returns `None` if the method does not resolve to a method definition or reference.
    ///
    /// # Errors
    /// Propagates signature decoding and generic activation failures.
    pub fn instantiated_signature(
        &self,
        graph: &ModuleGraph,
        type_arguments: Option<&dyn GenericArgumentProvider>,
    ) -> Result<Option<MethodSignature>> {
        let signature = match self.method(graph)? {
            Some(Member::MethodDefinition(method)) => method.signature(graph)?,
            Some(Member::MemberReference(reference)) => match &*reference.signature(graph)? {
                MemberRefSignature::Method(method) => Arc::new(method.clone()),
                MemberRefSignature::Field(_) => return Ok(None),
            },
            _ => return Ok(None),
        };

        let arguments = self.instantiation(graph)?;
        let mut context = GenericContext::new().with_method_arguments(&*arguments);
        if let Some(type_arguments) = type_arguments {
            context = context.with_type_arguments(type_arguments);
        }
        Ok(Some(signature.instantiate(&context)?))
    }

    pub(crate) fn clear_cache(&self) {
        self.instantiation.clear();
    }
}

/// A type implementing an interface (`InterfaceImpl`).
#[derive(Debug)]
pub struct InterfaceImplementation {
    /// Token of the row
    pub token: Token,
}

impl InterfaceImplementation {
    pub(crate) fn new(token: Token) -> Self {
        InterfaceImplementation { token }
    }

    /// The implementing type.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn class(&self, graph: &ModuleGraph) -> Result<Option<Arc<TypeDefinition>>> {
        let row: InterfaceImplRaw = graph.row(self.token.row())?;
        Ok(graph.get::<TypeDefinition>(Token::from_parts(TableId::TypeDef, row.class)))
    }

    /// The implemented interface.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn interface(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        let row: InterfaceImplRaw = graph.row(self.token.row())?;
        Ok(graph.try_lookup(row.interface))
    }
}

/// An explicit override of an interface or base method (`MethodImpl`).
#[derive(Debug)]
pub struct MethodImplementation {
    /// Token of the row
    pub token: Token,
}

impl MethodImplementation {
    pub(crate) fn new(token: Token) -> Self {
        MethodImplementation { token }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<MethodImplRaw> {
        graph.row(self.token.row())
    }

    /// The type declaring the override.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn class(&self, graph: &ModuleGraph) -> Result<Option<Arc<TypeDefinition>>> {
        let row = self.row(graph)?;
        Ok(graph.get::<TypeDefinition>(Token::from_parts(TableId::TypeDef, row.class)))
    }

    /// The method providing the implementation.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn body(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.method_body))
    }

    /// The overridden method.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn declaration(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.method_declaration))
    }
}

/// A declarative security permission set (`DeclSecurity`).
#[derive(Debug)]
pub struct SecurityDeclaration {
    /// Token of the row
    pub token: Token,
    permission_set: LazyField<[u8]>,
}

impl SecurityDeclaration {
    pub(crate) fn new(token: Token) -> Self {
        SecurityDeclaration {
            token,
            permission_set: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<DeclSecurityRaw> {
        graph.row(self.token.row())
    }

    /// The `SecurityAction` value.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn action(&self, graph: &ModuleGraph) -> Result<u16> {
        Ok(self.row(graph)?.action)
    }

    /// The protected type or method. The assembly is not modelled and yields `None`.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn parent(&self, graph: &ModuleGraph) -> Result<Option<Member>> {
        Ok(graph.try_lookup(self.row(graph)?.parent))
    }

    /// The serialized permission set, undecoded.
    ///
    /// # Errors
    /// Fails if the row is gone or the blob index is outside the blob heap.
    pub fn permission_set(&self, graph: &ModuleGraph) -> Result<Arc<[u8]>> {
        self.permission_set
            .get_or_try_init(|| Ok(Arc::from(graph.blob(self.row(graph)?.permission_set)?)))
    }

    pub(crate) fn clear_cache(&self) {
        self.permission_set.clear();
    }
}

/// A type forwarded to or exported from another module of the assembly (`ExportedType`).
#[derive(Debug)]
pub struct ExportedType {
    /// Token of the row
    pub token: Token,
    name: LazyField<str>,
    namespace: LazyField<str>,
}

impl ExportedType {
    pub(crate) fn new(token: Token) -> Self {
        ExportedType {
            token,
            name: LazyField::new(),
            namespace: LazyField::new(),
        }
    }

    /// The current row.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn row(&self, graph: &ModuleGraph) -> Result<ExportedTypeRaw> {
        graph.row(self.token.row())
    }

    /// Simple name of the type.
    ///
    /// # Errors
    /// Fails if the row is gone or the name index is outside the strings heap.
    pub fn name(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.name
            .get_or_try_init(|| graph.string(self.row(graph)?.type_name))
    }

    /// Namespace of the type, empty for the global namespace.
    ///
    /// # Errors
    /// Fails if the row is gone or the namespace index is outside the strings heap.
    pub fn namespace(&self, graph: &ModuleGraph) -> Result<Arc<str>> {
        self.namespace
            .get_or_try_init(|| graph.string(self.row(graph)?.type_namespace))
    }

    /// `Namespace.Name`, or just the name in the global namespace.
    ///
    /// # Errors
    /// See [`ExportedType::name`].
    pub fn full_name(&self, graph: &ModuleGraph) -> Result<String> {
        Ok(full_name(&self.namespace(graph)?, &self.name(graph)?))
    }

    /// `TypeAttributes` of the exported type.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn flags(&self, graph: &ModuleGraph) -> Result<u32> {
        Ok(self.row(graph)?.flags)
    }

    /// Token of the implementing file, assembly reference or enclosing exported type.
    ///
    /// Only the enclosing exported type resolves to a [`Member`]; files and assembly references
    /// are left to the caller.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn implementation(&self, graph: &ModuleGraph) -> Result<Token> {
        Ok(self.row(graph)?.implementation)
    }

    /// The enclosing exported type of a nested forwarder.
    ///
    /// # Errors
    /// Returns [`crate::Error::RidOutOfRange`] if the row no longer exists.
    pub fn enclosing_type(&self, graph: &ModuleGraph) -> Result<Option<Arc<ExportedType>>> {
        Ok(graph.get::<ExportedType>(self.implementation(graph)?))
    }

    pub(crate) fn clear_cache(&self) {
        self.name.clear();
        self.namespace.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ownership() {
        // type 1 owns 1..3, type 2 owns nothing, type 3 owns 3..6
        let starts = [1, 3, 3];
        assert_eq!(run_owner(&starts, 1, 6), Some(1));
        assert_eq!(run_owner(&starts, 2, 6), Some(1));
        assert_eq!(run_owner(&starts, 3, 6), Some(3));
        assert_eq!(run_owner(&starts, 5, 6), Some(3));
        assert_eq!(run_owner(&starts, 6, 6), None);
        assert_eq!(run_owner(&starts, 0, 6), None);

        assert_eq!(run_range(&starts, 0, 6), 1..3);
        assert_eq!(run_range(&starts, 1, 6), 3..3);
        assert_eq!(run_range(&starts, 2, 6), 3..6);
        assert_eq!(run_range(&starts, 3, 6), 6..6);
    }
}

use std::collections::HashMap;

use crate::{
    assembly::CilOperand,
    metadata::{
        method::CilMethodBody,
        signatures::{
            CustomModifier, LocalVariablesSignature, MethodSignature, SignatureArray,
            SignatureGenericInst, SignatureTypeSpec, TypeSignature,
        },
        tables::{
            DeclSecurityRaw, EventRaw, ExportedTypeRaw, GenericParamRaw, InterfaceImplRaw,
            MemberRefRaw, MetadataTable, MetadataTables, MethodImplRaw, MethodSpecRaw, TableRow,
            TypeDefRaw, TypeRefRaw,
        },
        token::{Token, USER_STRING_TAG},
    },
};

/// Mapping from the tokens a buffer handed out to the tokens rows ended up with.
///
/// Provisional tokens come from [`crate::builder::TableBuffer::add`]. Tokens of the source
/// module are kept apart, since both live in the same token space and can collide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRemap {
    provisional: HashMap<Token, Token>,
    original: HashMap<Token, Token>,
}

impl TokenRemap {
    /// An empty remap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the final token of a provisional one.
    pub fn insert(&mut self, provisional: Token, final_token: Token) {
        self.provisional.insert(provisional, final_token);
    }

    /// Record the final token of a row of the source module.
    pub fn insert_original(&mut self, original: Token, final_token: Token) {
        self.original.insert(original, final_token);
    }

    /// Final token of a provisional token, if it was remapped.
    #[must_use]
    pub fn get(&self, provisional: Token) -> Option<Token> {
        self.provisional.get(&provisional).copied()
    }

    /// The final token for `token`, or `token` itself if it was not remapped.
    #[must_use]
    pub fn resolve(&self, token: Token) -> Token {
        self.get(token).unwrap_or(token)
    }

    /// Final token of a row that had `original` in the source module.
    #[must_use]
    pub fn original(&self, original: Token) -> Option<Token> {
        self.original.get(&original).copied()
    }

    /// Number of provisional tokens whose row moved.
    #[must_use]
    pub fn moved(&self) -> usize {
        self.provisional
            .iter()
            .filter(|(provisional, final_token)| provisional != final_token)
            .count()
    }

    /// Number of recorded provisional tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.provisional.len()
    }

    /// Whether no provisional token was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.provisional.is_empty()
    }

    /// Take over every mapping of `other`, e.g. to fix up after flushing several buffers.
    pub fn merge(&mut self, other: TokenRemap) {
        self.provisional.extend(other.provisional);
        self.original.extend(other.original);
    }
}

/// Rewriting of cached provisional tokens after a sort-on-flush.
pub trait RemapTokens {
    /// Replace every token that `remap` knows with its final token.
    fn remap_tokens(&mut self, remap: &TokenRemap);
}

impl RemapTokens for Token {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        *self = remap.resolve(*self);
    }
}

impl<T: RemapTokens> RemapTokens for Vec<T> {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        for item in self {
            item.remap_tokens(remap);
        }
    }
}

impl<T: RemapTokens> RemapTokens for Box<T> {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        self.as_mut().remap_tokens(remap);
    }
}

impl RemapTokens for TypeSignature {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        match self {
            TypeSignature::ValueType(token) | TypeSignature::Class(token) => {
                token.remap_tokens(remap);
            }
            TypeSignature::Ptr(inner)
            | TypeSignature::ByRef(inner)
            | TypeSignature::SzArray(inner)
            | TypeSignature::Pinned(inner)
            | TypeSignature::Boxed(inner) => inner.remap_tokens(remap),
            TypeSignature::Array(SignatureArray { base, .. }) => base.remap_tokens(remap),
            TypeSignature::GenericInst(SignatureGenericInst {
                definition,
                arguments,
                ..
            }) => {
                definition.remap_tokens(remap);
                arguments.remap_tokens(remap);
            }
            TypeSignature::Modified(CustomModifier { modifier, base, .. }) => {
                modifier.remap_tokens(remap);
                base.remap_tokens(remap);
            }
            TypeSignature::TypeSpec(SignatureTypeSpec { token, signature }) => {
                token.remap_tokens(remap);
                signature.remap_tokens(remap);
            }
            _ => {}
        }
    }
}

impl RemapTokens for MethodSignature {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        self.return_type.remap_tokens(remap);
        self.params.remap_tokens(remap);
        self.varargs.remap_tokens(remap);
    }
}

impl RemapTokens for LocalVariablesSignature {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        self.locals.remap_tokens(remap);
    }
}

impl RemapTokens for CilMethodBody {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        for instruction in &mut self.instructions {
            if let Some(token) = instruction.token() {
                if token.table() != USER_STRING_TAG {
                    instruction.operand = CilOperand::Token(remap.resolve(token));
                }
            }
        }

        for handler in &mut self.exception_handlers {
            if let Some(class) = handler.catch_type() {
                handler.class_token_or_filter = remap.resolve(class).value();
            }
        }

        self.local_var_sig_token.remap_tokens(remap);
        self.locals.remap_tokens(remap);
    }
}

macro_rules! remap_row_columns {
    ($($row:ty => [$($column:ident),+]),+ $(,)?) => {
        $(
            impl RemapTokens for $row {
                fn remap_tokens(&mut self, remap: &TokenRemap) {
                    $(self.$column.remap_tokens(remap);)+
                }
            }
        )+
    };
}

remap_row_columns! {
    TypeRefRaw => [resolution_scope],
    TypeDefRaw => [extends],
    InterfaceImplRaw => [interface],
    MemberRefRaw => [class],
    DeclSecurityRaw => [parent],
    EventRaw => [event_type],
    MethodImplRaw => [method_body, method_declaration],
    ExportedTypeRaw => [implementation],
    GenericParamRaw => [owner],
    MethodSpecRaw => [method],
}

impl<R: TableRow + RemapTokens> RemapTokens for MetadataTable<R> {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        for rid in 1..=self.row_count() {
            if let Some(mut row) = self.get(rid).cloned() {
                row.remap_tokens(remap);
                self.replace(rid, row);
            }
        }
    }
}

impl RemapTokens for MetadataTables {
    fn remap_tokens(&mut self, remap: &TokenRemap) {
        self.type_ref.remap_tokens(remap);
        self.type_def.remap_tokens(remap);
        self.interface_impl.remap_tokens(remap);
        self.member_ref.remap_tokens(remap);
        self.decl_security.remap_tokens(remap);
        self.event.remap_tokens(remap);
        self.method_impl.remap_tokens(remap);
        self.exported_type.remap_tokens(remap);
        self.generic_param.remap_tokens(remap);
        self.method_spec.remap_tokens(remap);
    }
}

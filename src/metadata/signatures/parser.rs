use std::collections::HashSet;

use crate::{
    file::parser::Parser,
    metadata::{
        generic::GenericParameterKind,
        signatures::{
            CustomModifier, FieldSignature, InvalidCause, LocalVariablesSignature,
            MethodSignature, MethodSpecSignature, PropertySignature, SignatureArray,
            SignatureGenericInst, SignatureGenericParam, SignatureTypeSpec, TypeSignature,
            CALLING_CONVENTION, ELEMENT_TYPE, SIGNATURE_HEADER,
        },
        tables::{CodedIndexType, TableId},
        token::Token,
    },
    Error, Result,
};

/// Default nesting limit for signatures.
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Source of the type information a signature needs beyond its own bytes.
///
/// [`crate::metadata::graph::ModuleGraph`] implements this; tests and tools can supply their own.
pub trait TypeResolver {
    /// Whether `token` resolves to an existing `TypeDef`, `TypeRef` or `TypeSpec` member.
    fn is_type(&self, token: Token) -> bool;

    /// The signature blob of a `TypeSpec` row.
    fn type_spec_blob(&self, token: Token) -> Option<&[u8]>;
}

/// Set of `TypeSpec` tokens currently being expanded on the path from the root of a parse.
///
/// A token is entered before its blob is decoded and left once the expansion returns, so the
/// same specification may appear several times side by side but never inside itself.
#[derive(Debug, Clone, Default)]
pub struct TypeSpecGuard {
    active: HashSet<Token>,
}

impl TypeSpecGuard {
    /// An empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `token` as being expanded. Returns false if it already is.
    pub fn enter(&mut self, token: Token) -> bool {
        self.active.insert(token)
    }

    /// Mark the expansion of `token` as finished.
    pub fn leave(&mut self, token: Token) {
        self.active.remove(&token);
    }

    /// Whether `token` is being expanded.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.active.contains(&token)
    }
}

/// Recursive decoder for signature blobs.
///
/// Without a [`TypeResolver`] the parser decodes coded indices structurally: tags are checked,
/// row ids are not, and `TypeSpec` modifiers are kept as plain references. With a resolver, type
/// references are checked for existence and `TypeSpec` modifiers are expanded in place.
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    resolver: Option<&'a dyn TypeResolver>,
    guard: TypeSpecGuard,
    depth: usize,
    max_depth: usize,
}

impl<'a> SignatureParser<'a> {
    /// Create a parser that decodes `data` without resolving references.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            resolver: None,
            guard: TypeSpecGuard::new(),
            depth: 0,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }

    /// Create a parser that checks and expands references through `resolver`.
    #[must_use]
    pub fn with_resolver(data: &'a [u8], resolver: &'a dyn TypeResolver) -> Self {
        SignatureParser {
            resolver: Some(resolver),
            ..Self::new(data)
        }
    }

    /// Limit the nesting depth of decoded types.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Treat `token` as already being expanded, used when decoding the blob of that `TypeSpec`.
    #[must_use]
    pub fn with_guard(mut self, token: Token) -> Self {
        self.guard.enter(token);
        self
    }

    /// Current position in the blob.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.parser.pos()
    }

    /// Decode one type.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] for truncated data outside of coded indices,
    /// [`Error::Malformed`] for unknown element types, [`Error::NotImplemented`] for function
    /// pointers and [`Error::RecursionLimit`] for nesting beyond the configured depth.
    pub fn parse_type(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::RecursionLimit(self.max_depth));
        }

        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeSignature> {
        let offset = self.parser.pos();
        let current_byte = self.parser.read_le::<u8>()?;
        match current_byte {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::SENTINEL => Ok(TypeSignature::Sentinel),
            ELEMENT_TYPE::PTR => Ok(TypeSignature::Ptr(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::SZARRAY => Ok(TypeSignature::SzArray(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::PINNED => Ok(TypeSignature::Pinned(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::BOXED => Ok(TypeSignature::Boxed(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE => Ok(self.parse_type_reference(offset, true)),
            ELEMENT_TYPE::CLASS => Ok(self.parse_type_reference(offset, false)),
            ELEMENT_TYPE::VAR => Ok(TypeSignature::GenericParam(SignatureGenericParam {
                kind: GenericParameterKind::Type,
                index: self.parser.read_compressed_uint()?,
            })),
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParam(SignatureGenericParam {
                kind: GenericParameterKind::Method,
                index: self.parser.read_compressed_uint()?,
            })),
            ELEMENT_TYPE::ARRAY => {
                let base = self.parse_type()?;
                let rank = self.parser.read_compressed_uint()?;

                let num_sizes = self.parser.read_compressed_uint()?;
                let mut sizes = Vec::with_capacity(num_sizes.min(rank) as usize);
                for _ in 0..num_sizes {
                    sizes.push(self.parser.read_compressed_uint()?);
                }

                let num_lo_bounds = self.parser.read_compressed_uint()?;
                let mut lower_bounds = Vec::with_capacity(num_lo_bounds.min(rank) as usize);
                for _ in 0..num_lo_bounds {
                    lower_bounds.push(self.parser.read_compressed_int()?);
                }

                Ok(TypeSignature::Array(SignatureArray {
                    base: Box::new(base),
                    rank,
                    sizes,
                    lower_bounds,
                }))
            }
            ELEMENT_TYPE::GENERICINST => self.parse_generic_instance(offset),
            ELEMENT_TYPE::CMOD_REQD => self.parse_modified(offset, true),
            ELEMENT_TYPE::CMOD_OPT => self.parse_modified(offset, false),
            ELEMENT_TYPE::FNPTR => Err(Error::NotImplemented("function pointer signatures")),
            _ => Err(malformed_error!(
                "Unsupported ELEMENT_TYPE - {:#04x} at offset {}",
                current_byte,
                offset
            )),
        }
    }

    /// Read a `TypeDefOrRef` coded index and check it against the resolver.
    fn read_type_def_or_ref(&mut self) -> std::result::Result<Token, InvalidCause> {
        let value = self
            .parser
            .read_compressed_uint()
            .map_err(|_| InvalidCause::BlobTooShort)?;

        let token = match CodedIndexType::TypeDefOrRef.decode(value) {
            Ok(Some(token)) => token,
            Ok(None) | Err(_) => return Err(InvalidCause::InvalidCodedIndex),
        };

        match self.resolver {
            Some(resolver) if !resolver.is_type(token) => Err(InvalidCause::InvalidCodedIndex),
            _ => Ok(token),
        }
    }

    fn parse_type_reference(&mut self, offset: usize, value_type: bool) -> TypeSignature {
        let token = match self.read_type_def_or_ref() {
            Ok(token) if token.is_table(TableId::TypeSpec) => {
                return invalid(offset, InvalidCause::IllegalTypeSpec)
            }
            Ok(token) => token,
            Err(cause) => return invalid(offset, cause),
        };

        if value_type {
            TypeSignature::ValueType(token)
        } else {
            TypeSignature::Class(token)
        }
    }

    fn parse_generic_instance(&mut self, offset: usize) -> Result<TypeSignature> {
        let kind = self.parser.read_le::<u8>()?;
        if kind != ELEMENT_TYPE::CLASS && kind != ELEMENT_TYPE::VALUETYPE {
            return Err(malformed_error!(
                "GENERICINST - Next byte is not TYPE_CLASS or TYPE_VALUE - {}",
                kind
            ));
        }

        let definition = match self.read_type_def_or_ref() {
            Ok(token) if token.is_table(TableId::TypeSpec) => Err(InvalidCause::IllegalTypeSpec),
            Err(InvalidCause::BlobTooShort) => {
                return Ok(invalid(offset, InvalidCause::BlobTooShort))
            }
            other => other,
        };

        let arg_count = self.parser.read_compressed_uint()?;
        let mut arguments = Vec::with_capacity(arg_count.min(64) as usize);
        for _ in 0..arg_count {
            arguments.push(self.parse_type()?);
        }

        match definition {
            Ok(definition) => Ok(TypeSignature::GenericInst(SignatureGenericInst {
                value_type: kind == ELEMENT_TYPE::VALUETYPE,
                definition,
                arguments,
            })),
            Err(cause) => Ok(invalid(offset, cause)),
        }
    }

    fn parse_modified(&mut self, offset: usize, required: bool) -> Result<TypeSignature> {
        let modifier = match self.read_type_def_or_ref() {
            Ok(token) => self.parse_modifier_type(offset, token)?,
            Err(InvalidCause::BlobTooShort) => {
                return Ok(invalid(offset, InvalidCause::BlobTooShort))
            }
            Err(cause) => invalid(offset, cause),
        };

        Ok(TypeSignature::Modified(CustomModifier {
            required,
            modifier: Box::new(modifier),
            base: Box::new(self.parse_type()?),
        }))
    }

    fn parse_modifier_type(&mut self, offset: usize, token: Token) -> Result<TypeSignature> {
        let Some(resolver) = self.resolver else {
            return Ok(TypeSignature::Class(token));
        };
        if !token.is_table(TableId::TypeSpec) {
            return Ok(TypeSignature::Class(token));
        }

        if !self.guard.enter(token) {
            return Ok(invalid(offset, InvalidCause::MetadataLoop));
        }

        let Some(blob) = resolver.type_spec_blob(token) else {
            self.guard.leave(token);
            return Ok(invalid(offset, InvalidCause::BlobTooShort));
        };

        let mut nested = SignatureParser {
            parser: Parser::new(blob),
            resolver: Some(resolver),
            guard: std::mem::take(&mut self.guard),
            depth: self.depth,
            max_depth: self.max_depth,
        };
        let result = nested.parse_type();

        self.guard = nested.guard;
        self.guard.leave(token);

        Ok(TypeSignature::TypeSpec(SignatureTypeSpec {
            token,
            signature: Box::new(result?),
        }))
    }

    /// Decode a method signature (`MethodDef`, `MemberRef` or `StandAloneSig` for `calli`).
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for a calling convention that is not a method convention,
    /// and propagates [`SignatureParser::parse_type`] failures.
    pub fn parse_method_signature(&mut self) -> Result<MethodSignature> {
        let convention_byte = self.parser.read_le::<u8>()?;
        let calling_convention = convention_byte & CALLING_CONVENTION::KIND_MASK;
        if calling_convention > CALLING_CONVENTION::VARARG {
            return Err(malformed_error!(
                "MethodSignature - invalid calling convention - {:#04x}",
                convention_byte
            ));
        }

        let generic_param_count = if convention_byte & CALLING_CONVENTION::GENERIC != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };
        let param_count = self.parser.read_compressed_uint()?;

        let mut method = MethodSignature {
            calling_convention,
            has_this: convention_byte & CALLING_CONVENTION::HASTHIS != 0,
            explicit_this: convention_byte & CALLING_CONVENTION::EXPLICITTHIS != 0,
            generic_param_count,
            return_type: self.parse_type()?,
            params: Vec::new(),
            varargs: Vec::new(),
        };

        let mut in_varargs = false;
        for _ in 0..param_count {
            if !in_varargs && self.parser.peek_byte()? == ELEMENT_TYPE::SENTINEL {
                self.parser.advance_by(1)?;
                in_varargs = true;
            }

            let param = self.parse_type()?;
            if in_varargs {
                method.varargs.push(param);
            } else {
                method.params.push(param);
            }
        }

        Ok(method)
    }

    /// Decode a field signature.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the blob does not start with the field marker.
    pub fn parse_field_signature(&mut self) -> Result<FieldSignature> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != SIGNATURE_HEADER::FIELD {
            return Err(malformed_error!(
                "SignatureField - invalid start - {}",
                head_byte
            ));
        }

        Ok(FieldSignature {
            field_type: self.parse_type()?,
        })
    }

    /// Decode a property signature.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the blob does not start with the property marker.
    pub fn parse_property_signature(&mut self) -> Result<PropertySignature> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte & CALLING_CONVENTION::KIND_MASK != SIGNATURE_HEADER::PROPERTY {
            return Err(malformed_error!(
                "SignatureProperty - invalid start - {}",
                head_byte
            ));
        }

        let param_count = self.parser.read_compressed_uint()?;
        let property_type = self.parse_type()?;

        let mut params = Vec::with_capacity(param_count.min(64) as usize);
        for _ in 0..param_count {
            params.push(self.parse_type()?);
        }

        Ok(PropertySignature {
            has_this: head_byte & CALLING_CONVENTION::HASTHIS != 0,
            property_type,
            params,
        })
    }

    /// Decode a local variable signature.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the blob does not start with the locals marker.
    pub fn parse_local_var_signature(&mut self) -> Result<LocalVariablesSignature> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != SIGNATURE_HEADER::LOCAL_SIG {
            return Err(malformed_error!(
                "SignatureLocalVar - invalid start - {}",
                head_byte
            ));
        }

        let count = self.parser.read_compressed_uint()?;
        let mut locals = Vec::with_capacity(count.min(256) as usize);
        for _ in 0..count {
            locals.push(self.parse_type()?);
        }

        Ok(LocalVariablesSignature { locals })
    }

    /// Decode a generic method instantiation.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the blob does not start with the instantiation marker.
    pub fn parse_method_spec_signature(&mut self) -> Result<MethodSpecSignature> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != SIGNATURE_HEADER::METHOD_SPEC {
            return Err(malformed_error!(
                "SignatureMethodSpec - invalid start - {}",
                head_byte
            ));
        }

        let count = self.parser.read_compressed_uint()?;
        let mut arguments = Vec::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            arguments.push(self.parse_type()?);
        }

        Ok(MethodSpecSignature { arguments })
    }
}

fn invalid(offset: usize, cause: InvalidCause) -> TypeSignature {
    log::warn!("Invalid signature node at offset {offset}: {cause}");
    TypeSignature::Invalid(cause)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Resolver {
        types: Vec<Token>,
        specs: HashMap<Token, Vec<u8>>,
    }

    impl TypeResolver for Resolver {
        fn is_type(&self, token: Token) -> bool {
            self.types.contains(&token) || self.specs.contains_key(&token)
        }

        fn type_spec_blob(&self, token: Token) -> Option<&[u8]> {
            self.specs.get(&token).map(Vec::as_slice)
        }
    }

    fn type_ref(rid: u32) -> Token {
        Token::from_parts(TableId::TypeRef, rid)
    }

    fn type_spec(rid: u32) -> Token {
        Token::from_parts(TableId::TypeSpec, rid)
    }

    #[test]
    fn primitives_and_wrappers() {
        let mut parser = SignatureParser::new(&[0x0F, 0x10, 0x1D, 0x08]);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Ptr(Box::new(TypeSignature::ByRef(Box::new(
                TypeSignature::SzArray(Box::new(TypeSignature::I4))
            ))))
        );
        assert_eq!(parser.pos(), 4);
    }

    #[test]
    fn class_and_value_type() {
        let mut parser = SignatureParser::new(&[0x12, 0x05, 0x11, 0x08]);
        assert_eq!(parser.parse_type().unwrap(), TypeSignature::Class(type_ref(1)));
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::ValueType(Token::from_parts(TableId::TypeDef, 2))
        );
    }

    #[test]
    fn bad_type_references_degrade() {
        // TypeSpec under CLASS
        let mut parser = SignatureParser::new(&[0x12, 0x06]);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Invalid(InvalidCause::IllegalTypeSpec)
        );

        // Tag 3 is unused
        let mut parser = SignatureParser::new(&[0x11, 0x07]);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Invalid(InvalidCause::InvalidCodedIndex)
        );

        // Truncated coded index
        let mut parser = SignatureParser::new(&[0x12, 0x80]);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Invalid(InvalidCause::BlobTooShort)
        );

        // Row id not known to the resolver
        let resolver = Resolver {
            types: vec![type_ref(1)],
            specs: HashMap::new(),
        };
        let mut parser = SignatureParser::with_resolver(&[0x12, 0x09], &resolver);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Invalid(InvalidCause::InvalidCodedIndex)
        );
    }

    #[test]
    fn array_shape() {
        // int32[0..4, 2..]
        let data = [0x14, 0x08, 0x02, 0x01, 0x05, 0x02, 0x00, 0x04];
        let mut parser = SignatureParser::new(&data);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Array(SignatureArray {
                base: Box::new(TypeSignature::I4),
                rank: 2,
                sizes: vec![5],
                lower_bounds: vec![0, 2],
            })
        );
    }

    #[test]
    fn generic_instance_and_parameters() {
        // List<!0, !!1>
        let data = [0x15, 0x12, 0x05, 0x02, 0x13, 0x00, 0x1E, 0x01];
        let mut parser = SignatureParser::new(&data);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::GenericInst(SignatureGenericInst {
                value_type: false,
                definition: type_ref(1),
                arguments: vec![
                    TypeSignature::GenericParam(SignatureGenericParam {
                        kind: GenericParameterKind::Type,
                        index: 0,
                    }),
                    TypeSignature::GenericParam(SignatureGenericParam {
                        kind: GenericParameterKind::Method,
                        index: 1,
                    }),
                ],
            })
        );

        // Definition through a TypeSpec, arguments are still consumed
        let data = [0x15, 0x11, 0x06, 0x01, 0x08, 0x02];
        let mut parser = SignatureParser::new(&data);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Invalid(InvalidCause::IllegalTypeSpec)
        );
        assert_eq!(parser.parse_type().unwrap(), TypeSignature::Boolean);

        assert!(SignatureParser::new(&[0x15, 0x08]).parse_type().is_err());
    }

    #[test]
    fn modifiers_without_resolver_keep_references() {
        let data = [0x1F, 0x06, 0x08];
        let mut parser = SignatureParser::new(&data);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Modified(CustomModifier {
                required: true,
                modifier: Box::new(TypeSignature::Class(type_spec(1))),
                base: Box::new(TypeSignature::I4),
            })
        );
    }

    #[test]
    fn type_spec_modifiers_expand_and_stop_at_loops() {
        // TypeSpec 1: modopt(TypeSpec 1) int32
        let mut specs = HashMap::new();
        specs.insert(type_spec(1), vec![0x20, 0x06, 0x08]);
        let resolver = Resolver {
            types: vec![],
            specs,
        };

        let data = [0x20, 0x06, 0x0E];
        let mut parser = SignatureParser::with_resolver(&data, &resolver);
        let parsed = parser.parse_type().unwrap();

        let expected_spec = TypeSignature::Modified(CustomModifier {
            required: false,
            modifier: Box::new(TypeSignature::Invalid(InvalidCause::MetadataLoop)),
            base: Box::new(TypeSignature::I4),
        });
        assert_eq!(
            parsed,
            TypeSignature::Modified(CustomModifier {
                required: false,
                modifier: Box::new(TypeSignature::TypeSpec(SignatureTypeSpec {
                    token: type_spec(1),
                    signature: Box::new(expected_spec.clone()),
                })),
                base: Box::new(TypeSignature::String),
            })
        );
        assert_eq!(parsed.invalid_cause(), Some(InvalidCause::MetadataLoop));

        // Decoding the TypeSpec itself, seeded with its own token
        let blob = resolver.type_spec_blob(type_spec(1)).unwrap();
        let mut parser = SignatureParser::with_resolver(blob, &resolver).with_guard(type_spec(1));
        assert_eq!(parser.parse_type().unwrap(), expected_spec);
    }

    #[test]
    fn sibling_expansions_are_not_loops() {
        let mut specs = HashMap::new();
        specs.insert(type_spec(1), vec![0x1D, 0x08]);
        let resolver = Resolver {
            types: vec![],
            specs,
        };

        // modopt(TypeSpec 1) modopt(TypeSpec 1) int32
        let data = [0x20, 0x06, 0x20, 0x06, 0x08];
        let mut parser = SignatureParser::with_resolver(&data, &resolver);
        let parsed = parser.parse_type().unwrap();
        assert_eq!(parsed.invalid_cause(), None);
    }

    #[test]
    fn method_signature_with_varargs() {
        // instance vararg int32 (string, ..., bool)
        let data = [0x25, 0x02, 0x08, 0x0E, 0x41, 0x02];
        let method = SignatureParser::new(&data).parse_method_signature().unwrap();

        assert!(method.has_this);
        assert_eq!(method.calling_convention, CALLING_CONVENTION::VARARG);
        assert_eq!(method.return_type, TypeSignature::I4);
        assert_eq!(method.params, vec![TypeSignature::String]);
        assert_eq!(method.varargs, vec![TypeSignature::Boolean]);
    }

    #[test]
    fn generic_method_signature() {
        // !!0 M<T>(!!0)
        let data = [0x10, 0x01, 0x01, 0x1E, 0x00, 0x1E, 0x00];
        let method = SignatureParser::new(&data).parse_method_signature().unwrap();
        assert_eq!(method.generic_param_count, 1);
        assert_eq!(method.params.len(), 1);
        assert!(method.return_type.has_generic_parameters());
    }

    #[test]
    fn other_signature_kinds() {
        let field = SignatureParser::new(&[0x06, 0x0E])
            .parse_field_signature()
            .unwrap();
        assert_eq!(field.field_type, TypeSignature::String);

        let property = SignatureParser::new(&[0x28, 0x01, 0x08, 0x0E])
            .parse_property_signature()
            .unwrap();
        assert!(property.has_this);
        assert_eq!(property.params, vec![TypeSignature::String]);

        let locals = SignatureParser::new(&[0x07, 0x03, 0x45, 0x10, 0x08, 0x16, 0x1C])
            .parse_local_var_signature()
            .unwrap();
        assert_eq!(
            locals.locals,
            vec![
                TypeSignature::Pinned(Box::new(TypeSignature::ByRef(Box::new(TypeSignature::I4)))),
                TypeSignature::TypedByRef,
                TypeSignature::Object,
            ]
        );

        let spec = SignatureParser::new(&[0x0A, 0x01, 0x0E])
            .parse_method_spec_signature()
            .unwrap();
        assert_eq!(spec.arguments, vec![TypeSignature::String]);

        assert!(SignatureParser::new(&[0x07, 0x00])
            .parse_field_signature()
            .is_err());
    }

    #[test]
    fn unsupported_and_malformed() {
        assert!(matches!(
            SignatureParser::new(&[0x1B, 0x00, 0x00, 0x01]).parse_type(),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(
            SignatureParser::new(&[0x17]).parse_type(),
            Err(Error::Malformed { .. })
        ));
        assert!(SignatureParser::new(&[]).parse_type().is_err());
    }

    #[test]
    fn recursion_limit() {
        let data = vec![0x1D; 100];
        assert!(matches!(
            SignatureParser::new(&data).parse_type(),
            Err(Error::RecursionLimit(MAX_RECURSION_DEPTH))
        ));

        // Wide signatures are not deep
        let mut data = vec![0x00, 0x50, 0x01];
        data.extend(std::iter::repeat(0x08).take(80));
        let method = SignatureParser::new(&data).parse_method_signature().unwrap();
        assert_eq!(method.params.len(), 80);

        let deep = [0x1D, 0x1D, 0x1D, 0x08];
        assert!(SignatureParser::new(&deep)
            .with_max_depth(3)
            .parse_type()
            .is_err());
    }
}

//! Generic parameter substitution over signature trees.
//!
//! A signature that mentions `!n` (type level) or `!!n` (method level) parameters is activated
//! by replacing every parameter with the concrete argument at its position. The arguments come
//! from a [`GenericContext`], which pairs an optional provider for the enclosing type with an
//! optional provider for the enclosing method.
//!
//! Trees without any generic parameter are returned as they are: [`instantiate`] hands back a
//! borrowed [`Cow`] pointing at the input node, so callers can detect the fast path with
//! [`std::ptr::eq`].
//!
//! # Examples
//!
//! ```rust
//! use cilgraph::metadata::generic::{instantiate, GenericContext, GenericParameterKind};
//! use cilgraph::metadata::signatures::{SignatureGenericParam, TypeSignature};
//!
//! let list_of_t = TypeSignature::SzArray(Box::new(TypeSignature::GenericParam(
//!     SignatureGenericParam { kind: GenericParameterKind::Type, index: 0 },
//! )));
//! let arguments = vec![TypeSignature::String];
//! let context = GenericContext::new().with_type_arguments(&arguments);
//!
//! let concrete = instantiate(&list_of_t, &context)?;
//! assert_eq!(*concrete, TypeSignature::SzArray(Box::new(TypeSignature::String)));
//! # Ok::<(), cilgraph::Error>(())
//! ```

use std::borrow::Cow;

use crate::{
    metadata::signatures::{
        CustomModifier, FieldSignature, LocalVariablesSignature, MethodSignature,
        MethodSpecSignature, PropertySignature, SignatureArray, SignatureGenericInst,
        SignatureGenericParam, SignatureTypeSpec, TypeSignature,
    },
    Error, Result,
};

/// Owner kind of a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericParameterKind {
    /// Parameter of the enclosing type, `!n`
    Type,
    /// Parameter of the enclosing method, `!!n`
    Method,
}

/// A source of generic arguments, in parameter order.
pub trait GenericArgumentProvider {
    /// The arguments supplied by this provider.
    fn generic_arguments(&self) -> &[TypeSignature];
}

impl GenericArgumentProvider for Vec<TypeSignature> {
    fn generic_arguments(&self) -> &[TypeSignature] {
        self
    }
}

impl GenericArgumentProvider for SignatureGenericInst {
    fn generic_arguments(&self) -> &[TypeSignature] {
        &self.arguments
    }
}

impl GenericArgumentProvider for MethodSpecSignature {
    fn generic_arguments(&self) -> &[TypeSignature] {
        &self.arguments
    }
}

/// The argument providers in effect for one activation.
#[derive(Clone, Copy, Default)]
pub struct GenericContext<'a> {
    type_provider: Option<&'a dyn GenericArgumentProvider>,
    method_provider: Option<&'a dyn GenericArgumentProvider>,
}

impl<'a> GenericContext<'a> {
    /// A context without any provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `provider` for type level parameters.
    #[must_use]
    pub fn with_type_arguments(mut self, provider: &'a dyn GenericArgumentProvider) -> Self {
        self.type_provider = Some(provider);
        self
    }

    /// Use `provider` for method level parameters.
    #[must_use]
    pub fn with_method_arguments(mut self, provider: &'a dyn GenericArgumentProvider) -> Self {
        self.method_provider = Some(provider);
        self
    }

    /// The provider for `kind`, if one is set.
    #[must_use]
    pub fn provider(&self, kind: GenericParameterKind) -> Option<&'a dyn GenericArgumentProvider> {
        match kind {
            GenericParameterKind::Type => self.type_provider,
            GenericParameterKind::Method => self.method_provider,
        }
    }

    /// The argument bound to `parameter`.
    ///
    /// # Errors
    /// Returns [`Error::MissingGenericProvider`] if no provider is set for the parameter's kind and
    /// [`Error::GenericArgumentOutOfRange`] if the provider has fewer arguments than the index needs.
    pub fn get_argument(&self, parameter: &SignatureGenericParam) -> Result<&'a TypeSignature> {
        let provider = self
            .provider(parameter.kind)
            .ok_or(Error::MissingGenericProvider(parameter.kind))?;

        let arguments = provider.generic_arguments();
        arguments
            .get(parameter.index as usize)
            .ok_or(Error::GenericArgumentOutOfRange {
                kind: parameter.kind,
                index: parameter.index,
                count: arguments.len(),
            })
    }
}

impl std::fmt::Debug for GenericContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericContext")
            .field(
                "type_arguments",
                &self.type_provider.map(GenericArgumentProvider::generic_arguments),
            )
            .field(
                "method_arguments",
                &self.method_provider.map(GenericArgumentProvider::generic_arguments),
            )
            .finish()
    }
}

/// Replace every generic parameter in `signature` with its argument from `context`.
///
/// Subtrees without parameters are shared with the input; a tree without any parameter is
/// returned borrowed. Arguments are inserted as they are and not activated again. Expanded
/// `TypeSpec` nodes keep their token and have their decoded signature activated.
///
/// # Errors
/// Propagates [`GenericContext::get_argument`] failures.
pub fn instantiate<'s>(
    signature: &'s TypeSignature,
    context: &GenericContext<'_>,
) -> Result<Cow<'s, TypeSignature>> {
    if !signature.has_generic_parameters() {
        return Ok(Cow::Borrowed(signature));
    }

    let activated = match signature {
        TypeSignature::GenericParam(parameter) => context.get_argument(parameter)?.clone(),
        TypeSignature::Ptr(inner) => TypeSignature::Ptr(instantiate_boxed(inner, context)?),
        TypeSignature::ByRef(inner) => TypeSignature::ByRef(instantiate_boxed(inner, context)?),
        TypeSignature::SzArray(inner) => {
            TypeSignature::SzArray(instantiate_boxed(inner, context)?)
        }
        TypeSignature::Pinned(inner) => TypeSignature::Pinned(instantiate_boxed(inner, context)?),
        TypeSignature::Boxed(inner) => TypeSignature::Boxed(instantiate_boxed(inner, context)?),
        TypeSignature::Array(array) => TypeSignature::Array(SignatureArray {
            base: instantiate_boxed(&array.base, context)?,
            rank: array.rank,
            sizes: array.sizes.clone(),
            lower_bounds: array.lower_bounds.clone(),
        }),
        TypeSignature::GenericInst(inst) => TypeSignature::GenericInst(SignatureGenericInst {
            value_type: inst.value_type,
            definition: inst.definition,
            arguments: instantiate_all(&inst.arguments, context)?,
        }),
        TypeSignature::Modified(modified) => TypeSignature::Modified(CustomModifier {
            required: modified.required,
            modifier: instantiate_boxed(&modified.modifier, context)?,
            base: instantiate_boxed(&modified.base, context)?,
        }),
        TypeSignature::TypeSpec(spec) => TypeSignature::TypeSpec(SignatureTypeSpec {
            token: spec.token,
            signature: instantiate_boxed(&spec.signature, context)?,
        }),
        other => other.clone(),
    };

    Ok(Cow::Owned(activated))
}

fn instantiate_boxed(
    signature: &TypeSignature,
    context: &GenericContext<'_>,
) -> Result<Box<TypeSignature>> {
    Ok(Box::new(instantiate(signature, context)?.into_owned()))
}

fn instantiate_all(
    signatures: &[TypeSignature],
    context: &GenericContext<'_>,
) -> Result<Vec<TypeSignature>> {
    signatures
        .iter()
        .map(|signature| instantiate(signature, context).map(Cow::into_owned))
        .collect()
}

/// Generic activation of a complete signature.
pub trait Instantiate: Sized {
    /// A copy of `self` with every generic parameter replaced from `context`.
    ///
    /// # Errors
    /// Propagates [`GenericContext::get_argument`] failures.
    fn instantiate(&self, context: &GenericContext<'_>) -> Result<Self>;
}

impl Instantiate for MethodSignature {
    fn instantiate(&self, context: &GenericContext<'_>) -> Result<Self> {
        Ok(MethodSignature {
            calling_convention: self.calling_convention,
            has_this: self.has_this,
            explicit_this: self.explicit_this,
            generic_param_count: self.generic_param_count,
            return_type: instantiate(&self.return_type, context)?.into_owned(),
            params: instantiate_all(&self.params, context)?,
            varargs: instantiate_all(&self.varargs, context)?,
        })
    }
}

impl Instantiate for FieldSignature {
    fn instantiate(&self, context: &GenericContext<'_>) -> Result<Self> {
        Ok(FieldSignature {
            field_type: instantiate(&self.field_type, context)?.into_owned(),
        })
    }
}

impl Instantiate for PropertySignature {
    fn instantiate(&self, context: &GenericContext<'_>) -> Result<Self> {
        Ok(PropertySignature {
            has_this: self.has_this,
            property_type: instantiate(&self.property_type, context)?.into_owned(),
            params: instantiate_all(&self.params, context)?,
        })
    }
}

impl Instantiate for LocalVariablesSignature {
    fn instantiate(&self, context: &GenericContext<'_>) -> Result<Self> {
        Ok(LocalVariablesSignature {
            locals: instantiate_all(&self.locals, context)?,
        })
    }
}

impl Instantiate for MethodSpecSignature {
    fn instantiate(&self, context: &GenericContext<'_>) -> Result<Self> {
        Ok(MethodSpecSignature {
            arguments: instantiate_all(&self.arguments, context)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{tables::TableId, token::Token};

    fn var(index: u32) -> TypeSignature {
        TypeSignature::GenericParam(SignatureGenericParam {
            kind: GenericParameterKind::Type,
            index,
        })
    }

    fn mvar(index: u32) -> TypeSignature {
        TypeSignature::GenericParam(SignatureGenericParam {
            kind: GenericParameterKind::Method,
            index,
        })
    }

    #[test]
    fn closed_tree_is_returned_unchanged() {
        let tree = TypeSignature::GenericInst(SignatureGenericInst {
            value_type: false,
            definition: Token::from_parts(TableId::TypeRef, 4),
            arguments: vec![TypeSignature::I4, TypeSignature::String],
        });

        let result = instantiate(&tree, &GenericContext::new()).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert!(std::ptr::eq(result.as_ref(), &tree));
    }

    #[test]
    fn substitutes_nested_parameters() {
        let tree = TypeSignature::GenericInst(SignatureGenericInst {
            value_type: false,
            definition: Token::from_parts(TableId::TypeRef, 1),
            arguments: vec![
                TypeSignature::Array(SignatureArray {
                    base: Box::new(var(1)),
                    rank: 2,
                    sizes: vec![],
                    lower_bounds: vec![0, 0],
                }),
                TypeSignature::Ptr(Box::new(mvar(0))),
                TypeSignature::Modified(CustomModifier {
                    required: false,
                    modifier: Box::new(TypeSignature::Class(Token::from_parts(TableId::TypeRef, 9))),
                    base: Box::new(var(0)),
                }),
            ],
        });

        let type_arguments = vec![TypeSignature::Boolean, TypeSignature::R8];
        let method_arguments = MethodSpecSignature {
            arguments: vec![TypeSignature::U2],
        };
        let context = GenericContext::new()
            .with_type_arguments(&type_arguments)
            .with_method_arguments(&method_arguments);

        let result = instantiate(&tree, &context).unwrap();
        let TypeSignature::GenericInst(inst) = result.as_ref() else {
            panic!("expected a generic instantiation, got {result:?}");
        };
        assert!(!result.has_generic_parameters());
        assert!(matches!(&inst.arguments[0], TypeSignature::Array(array) if *array.base == TypeSignature::R8 && array.rank == 2));
        assert_eq!(inst.arguments[1], TypeSignature::Ptr(Box::new(TypeSignature::U2)));
        assert!(matches!(&inst.arguments[2], TypeSignature::Modified(modified) if *modified.base == TypeSignature::Boolean));
    }

    #[test]
    fn missing_provider_and_out_of_range() {
        let arguments = vec![TypeSignature::I4];
        let context = GenericContext::new().with_type_arguments(&arguments);

        assert!(matches!(
            instantiate(&mvar(0), &context),
            Err(Error::MissingGenericProvider(GenericParameterKind::Method))
        ));
        assert!(matches!(
            instantiate(&var(1), &context),
            Err(Error::GenericArgumentOutOfRange {
                kind: GenericParameterKind::Type,
                index: 1,
                count: 1
            })
        ));
    }

    #[test]
    fn arguments_are_not_activated_again() {
        let arguments = vec![var(0)];
        let context = GenericContext::new().with_type_arguments(&arguments);
        assert_eq!(*instantiate(&var(0), &context).unwrap(), var(0));
    }

    #[test]
    fn expanded_type_specs_under_modifiers_are_activated() {
        let token = Token::from_parts(TableId::TypeSpec, 1);
        let tree = TypeSignature::Modified(CustomModifier {
            required: true,
            modifier: Box::new(TypeSignature::TypeSpec(SignatureTypeSpec {
                token,
                signature: Box::new(TypeSignature::SzArray(Box::new(var(0)))),
            })),
            base: Box::new(TypeSignature::I4),
        });
        assert!(tree.has_generic_parameters());

        let arguments = vec![TypeSignature::String];
        let context = GenericContext::new().with_type_arguments(&arguments);
        let result = instantiate(&tree, &context).unwrap();

        assert_eq!(
            *result,
            TypeSignature::Modified(CustomModifier {
                required: true,
                modifier: Box::new(TypeSignature::TypeSpec(SignatureTypeSpec {
                    token,
                    signature: Box::new(TypeSignature::SzArray(Box::new(TypeSignature::String))),
                })),
                base: Box::new(TypeSignature::I4),
            })
        );

        assert!(matches!(
            instantiate(&tree, &GenericContext::new()),
            Err(Error::MissingGenericProvider(GenericParameterKind::Type))
        ));
    }

    #[test]
    fn method_signature_activation() {
        let method = MethodSignature {
            has_this: true,
            generic_param_count: 1,
            return_type: mvar(0),
            params: vec![var(0), TypeSignature::I4],
            ..Default::default()
        };

        let inst = SignatureGenericInst {
            value_type: false,
            definition: Token::from_parts(TableId::TypeDef, 2),
            arguments: vec![TypeSignature::String],
        };
        let spec = MethodSpecSignature {
            arguments: vec![TypeSignature::Object],
        };
        let context = GenericContext::new()
            .with_type_arguments(&inst)
            .with_method_arguments(&spec);

        let activated = method.instantiate(&context).unwrap();
        assert!(activated.has_this);
        assert_eq!(activated.generic_param_count, 1);
        assert_eq!(activated.return_type, TypeSignature::Object);
        assert_eq!(activated.params, vec![TypeSignature::String, TypeSignature::I4]);

        let locals = LocalVariablesSignature {
            locals: vec![var(0), TypeSignature::Pinned(Box::new(var(0)))],
        }
        .instantiate(&context)
        .unwrap();
        assert_eq!(
            locals.locals[1],
            TypeSignature::Pinned(Box::new(TypeSignature::String))
        );
    }
}

use strum::Display;

use crate::metadata::{generic::GenericParameterKind, token::Token};

#[allow(non_snake_case, dead_code, missing_docs)]
/// Element type bytes of the signature grammar (ECMA-335 II.23.1.16)
pub mod ELEMENT_TYPE {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    pub const PTR: u8 = 0x0f;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1b;
    pub const OBJECT: u8 = 0x1c;
    pub const SZARRAY: u8 = 0x1d;
    pub const MVAR: u8 = 0x1e;
    pub const CMOD_REQD: u8 = 0x1f;
    pub const CMOD_OPT: u8 = 0x20;
    pub const INTERNAL: u8 = 0x21;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
    // Custom attribute encodings only
    pub const TYPE: u8 = 0x50;
    pub const BOXED: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}

#[allow(non_snake_case, dead_code, missing_docs)]
/// Leading bytes of the non-method signature kinds
pub mod SIGNATURE_HEADER {
    pub const FIELD: u8 = 0x06;
    pub const LOCAL_SIG: u8 = 0x07;
    pub const PROPERTY: u8 = 0x08;
    pub const METHOD_SPEC: u8 = 0x0a;
}

#[allow(non_snake_case, dead_code, missing_docs)]
/// Calling convention byte of method signatures
pub mod CALLING_CONVENTION {
    pub const DEFAULT: u8 = 0x00;
    pub const C: u8 = 0x01;
    pub const STDCALL: u8 = 0x02;
    pub const THISCALL: u8 = 0x03;
    pub const FASTCALL: u8 = 0x04;
    pub const VARARG: u8 = 0x05;
    pub const KIND_MASK: u8 = 0x0f;
    pub const GENERIC: u8 = 0x10;
    pub const HASTHIS: u8 = 0x20;
    pub const EXPLICITTHIS: u8 = 0x40;
}

/// Why a signature node could not be decoded.
///
/// Invalid nodes are ordinary values in the tree; the rest of the signature and the rest of
/// the module stay usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum InvalidCause {
    /// The blob ended while decoding a coded index
    #[strum(to_string = "blob too short")]
    BlobTooShort,
    /// A `TypeSpec` appeared where only `TypeDef` or `TypeRef` is legal
    #[strum(to_string = "illegal type specification")]
    IllegalTypeSpec,
    /// A `TypeSpec` refers back to itself through its own expansion
    #[strum(to_string = "metadata loop")]
    MetadataLoop,
    /// A coded index did not resolve to an existing type
    #[strum(to_string = "invalid coded index")]
    InvalidCodedIndex,
}

/// A node of a decoded type signature.
///
/// The tree is immutable once built. Primitive leaves carry no data, references to other
/// types carry their token, and composite nodes own their children.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSignature {
    /// `void`
    Void,
    /// `bool`
    Boolean,
    /// `char`
    Char,
    /// `sbyte`
    I1,
    /// `byte`
    U1,
    /// `short`
    I2,
    /// `ushort`
    U2,
    /// `int`
    I4,
    /// `uint`
    U4,
    /// `long`
    I8,
    /// `ulong`
    U8,
    /// `float`
    R4,
    /// `double`
    R8,
    /// `string`
    String,
    /// `nint`
    I,
    /// `nuint`
    U,
    /// `object`
    Object,
    /// `TypedReference`
    TypedByRef,
    /// A value type, by `TypeDef` or `TypeRef` token
    ValueType(Token),
    /// A reference type, by `TypeDef` or `TypeRef` token
    Class(Token),
    /// Unmanaged pointer
    Ptr(Box<TypeSignature>),
    /// Managed reference
    ByRef(Box<TypeSignature>),
    /// Single dimension, zero based array
    SzArray(Box<TypeSignature>),
    /// Pinned local
    Pinned(Box<TypeSignature>),
    /// Boxed value
    Boxed(Box<TypeSignature>),
    /// General array with shape
    Array(SignatureArray),
    /// Generic parameter of the enclosing type (`!n`) or method (`!!n`)
    GenericParam(SignatureGenericParam),
    /// Instantiation of a generic type
    GenericInst(SignatureGenericInst),
    /// Type with a required or optional custom modifier
    Modified(CustomModifier),
    /// Expanded `TypeSpec` reference, used where a modifier names a type specification
    TypeSpec(SignatureTypeSpec),
    /// Start of the variable argument part of a call site
    Sentinel,
    /// Placeholder for a node that could not be decoded
    Invalid(InvalidCause),
}

/// Shape of a general array.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureArray {
    /// Element type
    pub base: Box<TypeSignature>,
    /// Number of dimensions
    pub rank: u32,
    /// Sizes of the leading dimensions that declare one
    pub sizes: Vec<u32>,
    /// Lower bounds of the leading dimensions that declare one
    pub lower_bounds: Vec<i32>,
}

/// Reference to a generic parameter by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureGenericParam {
    /// Whether the parameter belongs to the type or the method
    pub kind: GenericParameterKind,
    /// 0-based position in the owner's parameter list
    pub index: u32,
}

/// Instantiation of a generic type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureGenericInst {
    /// Whether the definition is a value type
    pub value_type: bool,
    /// `TypeDef` or `TypeRef` token of the generic definition
    pub definition: Token,
    /// Type arguments, in parameter order
    pub arguments: Vec<TypeSignature>,
}

/// A custom modifier applied to a type.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomModifier {
    /// `modreq` rather than `modopt`
    pub required: bool,
    /// The modifier type: [`TypeSignature::Class`], [`TypeSignature::TypeSpec`] or an invalid node
    pub modifier: Box<TypeSignature>,
    /// The modified type
    pub base: Box<TypeSignature>,
}

/// A `TypeSpec` reference together with its decoded signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureTypeSpec {
    /// Token of the `TypeSpec` row
    pub token: Token,
    /// The decoded specification blob
    pub signature: Box<TypeSignature>,
}

/// Method signature, as stored for `MethodDef`, `MemberRef` and `StandAloneSig` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    /// Calling convention kind, the low nibble of the leading byte
    pub calling_convention: u8,
    /// Instance method with an implicit `this`
    pub has_this: bool,
    /// `this` is passed explicitly as the first parameter
    pub explicit_this: bool,
    /// Number of generic parameters, 0 for non generic methods
    pub generic_param_count: u32,
    /// Return type
    pub return_type: TypeSignature,
    /// Fixed parameters
    pub params: Vec<TypeSignature>,
    /// Variable arguments following the sentinel of a vararg call site
    pub varargs: Vec<TypeSignature>,
}

impl Default for MethodSignature {
    fn default() -> Self {
        MethodSignature {
            calling_convention: CALLING_CONVENTION::DEFAULT,
            has_this: false,
            explicit_this: false,
            generic_param_count: 0,
            return_type: TypeSignature::Void,
            params: Vec::new(),
            varargs: Vec::new(),
        }
    }
}

impl MethodSignature {
    /// Number of stack slots a call consumes, counting `this` and variable arguments.
    #[must_use]
    pub fn stack_pops(&self) -> u32 {
        let this = u32::from(self.has_this && !self.explicit_this);
        (self.params.len() + self.varargs.len()) as u32 + this
    }

    /// Whether a call leaves a value on the stack.
    #[must_use]
    pub fn returns_value(&self) -> bool {
        !matches!(self.return_type, TypeSignature::Void)
    }
}

/// Field signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSignature {
    /// Field type
    pub field_type: TypeSignature,
}

/// Property signature.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySignature {
    /// Instance property
    pub has_this: bool,
    /// Property type
    pub property_type: TypeSignature,
    /// Index parameters
    pub params: Vec<TypeSignature>,
}

/// Local variable signature referenced by fat method bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalVariablesSignature {
    /// Local variable types, in slot order
    pub locals: Vec<TypeSignature>,
}

/// Generic method instantiation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodSpecSignature {
    /// Method type arguments, in parameter order
    pub arguments: Vec<TypeSignature>,
}

impl TypeSignature {
    /// Whether a `!n` or `!!n` parameter occurs anywhere below this node, including inside
    /// expanded `TypeSpec` references.
    #[must_use]
    pub fn has_generic_parameters(&self) -> bool {
        match self {
            TypeSignature::GenericParam(_) => true,
            TypeSignature::Ptr(inner)
            | TypeSignature::ByRef(inner)
            | TypeSignature::SzArray(inner)
            | TypeSignature::Pinned(inner)
            | TypeSignature::Boxed(inner) => inner.has_generic_parameters(),
            TypeSignature::Array(array) => array.base.has_generic_parameters(),
            TypeSignature::GenericInst(inst) => inst
                .arguments
                .iter()
                .any(TypeSignature::has_generic_parameters),
            TypeSignature::Modified(modified) => {
                modified.modifier.has_generic_parameters() || modified.base.has_generic_parameters()
            }
            TypeSignature::TypeSpec(spec) => spec.signature.has_generic_parameters(),
            _ => false,
        }
    }

    /// The first invalid node in this tree, depth first.
    #[must_use]
    pub fn invalid_cause(&self) -> Option<InvalidCause> {
        match self {
            TypeSignature::Invalid(cause) => Some(*cause),
            TypeSignature::Ptr(inner)
            | TypeSignature::ByRef(inner)
            | TypeSignature::SzArray(inner)
            | TypeSignature::Pinned(inner)
            | TypeSignature::Boxed(inner) => inner.invalid_cause(),
            TypeSignature::Array(array) => array.base.invalid_cause(),
            TypeSignature::GenericInst(inst) => {
                inst.arguments.iter().find_map(TypeSignature::invalid_cause)
            }
            TypeSignature::Modified(modified) => modified
                .modifier
                .invalid_cause()
                .or_else(|| modified.base.invalid_cause()),
            TypeSignature::TypeSpec(spec) => spec.signature.invalid_cause(),
            _ => None,
        }
    }

    /// Whether this node is a primitive leaf.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeSignature::Void
                | TypeSignature::Boolean
                | TypeSignature::Char
                | TypeSignature::I1
                | TypeSignature::U1
                | TypeSignature::I2
                | TypeSignature::U2
                | TypeSignature::I4
                | TypeSignature::U4
                | TypeSignature::I8
                | TypeSignature::U8
                | TypeSignature::R4
                | TypeSignature::R8
                | TypeSignature::String
                | TypeSignature::I
                | TypeSignature::U
                | TypeSignature::Object
                | TypeSignature::TypedByRef
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::TableId;

    #[test]
    fn stack_effect_of_calls() {
        let instance = MethodSignature {
            has_this: true,
            return_type: TypeSignature::I4,
            params: vec![TypeSignature::I4, TypeSignature::String],
            ..Default::default()
        };
        assert_eq!(instance.stack_pops(), 3);
        assert!(instance.returns_value());

        let explicit = MethodSignature {
            has_this: true,
            explicit_this: true,
            params: vec![TypeSignature::Object],
            ..Default::default()
        };
        assert_eq!(explicit.stack_pops(), 1);
        assert!(!explicit.returns_value());
    }

    #[test]
    fn finds_nested_invalid_nodes() {
        let tree = TypeSignature::Modified(CustomModifier {
            required: true,
            modifier: Box::new(TypeSignature::TypeSpec(SignatureTypeSpec {
                token: Token::from_parts(TableId::TypeSpec, 1),
                signature: Box::new(TypeSignature::Invalid(InvalidCause::MetadataLoop)),
            })),
            base: Box::new(TypeSignature::I4),
        });

        assert_eq!(tree.invalid_cause(), Some(InvalidCause::MetadataLoop));
        assert!(!tree.has_generic_parameters());
        assert_eq!(InvalidCause::MetadataLoop.to_string(), "metadata loop");
    }
}

use crate::{
    file::writer::BlobWriter,
    metadata::{
        generic::GenericParameterKind,
        signatures::{
            FieldSignature, LocalVariablesSignature, MethodSignature, MethodSpecSignature,
            PropertySignature, TypeSignature, CALLING_CONVENTION, ELEMENT_TYPE, SIGNATURE_HEADER,
        },
        tables::CodedIndexType,
        token::Token,
    },
    Result,
};

/// Encoder for signature blobs, the inverse of [`crate::metadata::signatures::SignatureParser`].
#[derive(Debug, Default)]
pub struct SignatureWriter {
    writer: BlobWriter,
}

impl SignatureWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoded bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    /// Encode one type.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for invalid nodes, for type references that are not
    /// `TypeDefOrRef` tokens and for counts that do not fit a compressed integer.
    pub fn write_type(&mut self, signature: &TypeSignature) -> Result<()> {
        match signature {
            TypeSignature::Void => self.writer.write_u8(ELEMENT_TYPE::VOID),
            TypeSignature::Boolean => self.writer.write_u8(ELEMENT_TYPE::BOOLEAN),
            TypeSignature::Char => self.writer.write_u8(ELEMENT_TYPE::CHAR),
            TypeSignature::I1 => self.writer.write_u8(ELEMENT_TYPE::I1),
            TypeSignature::U1 => self.writer.write_u8(ELEMENT_TYPE::U1),
            TypeSignature::I2 => self.writer.write_u8(ELEMENT_TYPE::I2),
            TypeSignature::U2 => self.writer.write_u8(ELEMENT_TYPE::U2),
            TypeSignature::I4 => self.writer.write_u8(ELEMENT_TYPE::I4),
            TypeSignature::U4 => self.writer.write_u8(ELEMENT_TYPE::U4),
            TypeSignature::I8 => self.writer.write_u8(ELEMENT_TYPE::I8),
            TypeSignature::U8 => self.writer.write_u8(ELEMENT_TYPE::U8),
            TypeSignature::R4 => self.writer.write_u8(ELEMENT_TYPE::R4),
            TypeSignature::R8 => self.writer.write_u8(ELEMENT_TYPE::R8),
            TypeSignature::String => self.writer.write_u8(ELEMENT_TYPE::STRING),
            TypeSignature::I => self.writer.write_u8(ELEMENT_TYPE::I),
            TypeSignature::U => self.writer.write_u8(ELEMENT_TYPE::U),
            TypeSignature::Object => self.writer.write_u8(ELEMENT_TYPE::OBJECT),
            TypeSignature::TypedByRef => self.writer.write_u8(ELEMENT_TYPE::TYPEDBYREF),
            TypeSignature::Sentinel => self.writer.write_u8(ELEMENT_TYPE::SENTINEL),
            TypeSignature::ValueType(token) => {
                self.writer.write_u8(ELEMENT_TYPE::VALUETYPE);
                self.write_type_def_or_ref(*token)?;
            }
            TypeSignature::Class(token) => {
                self.writer.write_u8(ELEMENT_TYPE::CLASS);
                self.write_type_def_or_ref(*token)?;
            }
            TypeSignature::Ptr(inner) => self.write_wrapped(ELEMENT_TYPE::PTR, inner)?,
            TypeSignature::ByRef(inner) => self.write_wrapped(ELEMENT_TYPE::BYREF, inner)?,
            TypeSignature::SzArray(inner) => self.write_wrapped(ELEMENT_TYPE::SZARRAY, inner)?,
            TypeSignature::Pinned(inner) => self.write_wrapped(ELEMENT_TYPE::PINNED, inner)?,
            TypeSignature::Boxed(inner) => self.write_wrapped(ELEMENT_TYPE::BOXED, inner)?,
            TypeSignature::Array(array) => {
                self.writer.write_u8(ELEMENT_TYPE::ARRAY);
                self.write_type(&array.base)?;
                self.writer.write_compressed_uint(array.rank)?;
                self.write_count(array.sizes.len())?;
                for size in &array.sizes {
                    self.writer.write_compressed_uint(*size)?;
                }
                self.write_count(array.lower_bounds.len())?;
                for bound in &array.lower_bounds {
                    self.writer.write_compressed_int(*bound)?;
                }
            }
            TypeSignature::GenericParam(param) => {
                self.writer.write_u8(match param.kind {
                    GenericParameterKind::Type => ELEMENT_TYPE::VAR,
                    GenericParameterKind::Method => ELEMENT_TYPE::MVAR,
                });
                self.writer.write_compressed_uint(param.index)?;
            }
            TypeSignature::GenericInst(inst) => {
                self.writer.write_u8(ELEMENT_TYPE::GENERICINST);
                self.writer.write_u8(if inst.value_type {
                    ELEMENT_TYPE::VALUETYPE
                } else {
                    ELEMENT_TYPE::CLASS
                });
                self.write_type_def_or_ref(inst.definition)?;
                self.write_types(&inst.arguments)?;
            }
            TypeSignature::Modified(modified) => {
                self.writer.write_u8(if modified.required {
                    ELEMENT_TYPE::CMOD_REQD
                } else {
                    ELEMENT_TYPE::CMOD_OPT
                });
                let token = match modified.modifier.as_ref() {
                    TypeSignature::Class(token) | TypeSignature::ValueType(token) => *token,
                    TypeSignature::TypeSpec(spec) => spec.token,
                    other => {
                        return Err(malformed_error!(
                            "Custom modifier must name a type, found {:?}",
                            other
                        ))
                    }
                };
                self.write_type_def_or_ref(token)?;
                self.write_type(&modified.base)?;
            }
            TypeSignature::TypeSpec(spec) => {
                return Err(malformed_error!(
                    "TypeSpec {} can only be encoded as a custom modifier",
                    spec.token
                ))
            }
            TypeSignature::Invalid(cause) => {
                return Err(malformed_error!(
                    "Cannot encode an invalid signature node - {}",
                    cause
                ))
            }
        }

        Ok(())
    }

    fn write_wrapped(&mut self, element: u8, inner: &TypeSignature) -> Result<()> {
        self.writer.write_u8(element);
        self.write_type(inner)
    }

    fn write_type_def_or_ref(&mut self, token: Token) -> Result<()> {
        let value = CodedIndexType::TypeDefOrRef.encode(token)?;
        self.writer.write_compressed_uint(value)
    }

    fn write_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count)
            .map_err(|_| malformed_error!("Signature list of {} entries is too long", count))?;
        self.writer.write_compressed_uint(count)
    }

    fn write_types(&mut self, types: &[TypeSignature]) -> Result<()> {
        self.write_count(types.len())?;
        for signature in types {
            self.write_type(signature)?;
        }
        Ok(())
    }

    /// Encode a method signature. Variable arguments follow a sentinel.
    ///
    /// # Errors
    /// Propagates [`SignatureWriter::write_type`] failures.
    pub fn write_method_signature(&mut self, method: &MethodSignature) -> Result<()> {
        let mut convention = method.calling_convention & CALLING_CONVENTION::KIND_MASK;
        if method.has_this {
            convention |= CALLING_CONVENTION::HASTHIS;
        }
        if method.explicit_this {
            convention |= CALLING_CONVENTION::EXPLICITTHIS;
        }
        if method.generic_param_count > 0 {
            convention |= CALLING_CONVENTION::GENERIC;
        }
        self.writer.write_u8(convention);

        if method.generic_param_count > 0 {
            self.writer.write_compressed_uint(method.generic_param_count)?;
        }
        self.write_count(method.params.len() + method.varargs.len())?;
        self.write_type(&method.return_type)?;

        for param in &method.params {
            self.write_type(param)?;
        }
        if !method.varargs.is_empty() {
            self.writer.write_u8(ELEMENT_TYPE::SENTINEL);
            for param in &method.varargs {
                self.write_type(param)?;
            }
        }
        Ok(())
    }

    /// Encode a field signature.
    ///
    /// # Errors
    /// Propagates [`SignatureWriter::write_type`] failures.
    pub fn write_field_signature(&mut self, field: &FieldSignature) -> Result<()> {
        self.writer.write_u8(SIGNATURE_HEADER::FIELD);
        self.write_type(&field.field_type)
    }

    /// Encode a property signature.
    ///
    /// # Errors
    /// Propagates [`SignatureWriter::write_type`] failures.
    pub fn write_property_signature(&mut self, property: &PropertySignature) -> Result<()> {
        let mut head = SIGNATURE_HEADER::PROPERTY;
        if property.has_this {
            head |= CALLING_CONVENTION::HASTHIS;
        }
        self.writer.write_u8(head);
        self.write_count(property.params.len())?;
        self.write_type(&property.property_type)?;
        for param in &property.params {
            self.write_type(param)?;
        }
        Ok(())
    }

    /// Encode a local variable signature.
    ///
    /// # Errors
    /// Propagates [`SignatureWriter::write_type`] failures.
    pub fn write_local_var_signature(&mut self, locals: &LocalVariablesSignature) -> Result<()> {
        self.writer.write_u8(SIGNATURE_HEADER::LOCAL_SIG);
        self.write_types(&locals.locals)
    }

    /// Encode a generic method instantiation.
    ///
    /// # Errors
    /// Propagates [`SignatureWriter::write_type`] failures.
    pub fn write_method_spec_signature(&mut self, spec: &MethodSpecSignature) -> Result<()> {
        self.writer.write_u8(SIGNATURE_HEADER::METHOD_SPEC);
        self.write_types(&spec.arguments)
    }
}

/// Encode a single type into a fresh blob.
///
/// # Errors
/// See [`SignatureWriter::write_type`].
pub fn encode_type_signature(signature: &TypeSignature) -> Result<Vec<u8>> {
    let mut writer = SignatureWriter::new();
    writer.write_type(signature)?;
    Ok(writer.into_inner())
}

/// Encode a method signature into a fresh blob.
///
/// # Errors
/// See [`SignatureWriter::write_method_signature`].
pub fn encode_method_signature(method: &MethodSignature) -> Result<Vec<u8>> {
    let mut writer = SignatureWriter::new();
    writer.write_method_signature(method)?;
    Ok(writer.into_inner())
}

/// Encode a field signature into a fresh blob.
///
/// # Errors
/// See [`SignatureWriter::write_field_signature`].
pub fn encode_field_signature(field: &FieldSignature) -> Result<Vec<u8>> {
    let mut writer = SignatureWriter::new();
    writer.write_field_signature(field)?;
    Ok(writer.into_inner())
}

/// Encode a property signature into a fresh blob.
///
/// # Errors
/// See [`SignatureWriter::write_property_signature`].
pub fn encode_property_signature(property: &PropertySignature) -> Result<Vec<u8>> {
    let mut writer = SignatureWriter::new();
    writer.write_property_signature(property)?;
    Ok(writer.into_inner())
}

/// Encode a local variable signature into a fresh blob.
///
/// # Errors
/// See [`SignatureWriter::write_local_var_signature`].
pub fn encode_local_var_signature(locals: &LocalVariablesSignature) -> Result<Vec<u8>> {
    let mut writer = SignatureWriter::new();
    writer.write_local_var_signature(locals)?;
    Ok(writer.into_inner())
}

/// Encode a generic method instantiation into a fresh blob.
///
/// # Errors
/// See [`SignatureWriter::write_method_spec_signature`].
pub fn encode_method_spec_signature(spec: &MethodSpecSignature) -> Result<Vec<u8>> {
    let mut writer = SignatureWriter::new();
    writer.write_method_spec_signature(spec)?;
    Ok(writer.into_inner())
}

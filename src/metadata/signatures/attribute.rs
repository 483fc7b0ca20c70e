use crate::{
    file::{parser::Parser, writer::BlobWriter},
    metadata::signatures::{TypeName, ELEMENT_TYPE},
    Result,
};

/// Type of a custom attribute argument (ECMA-335 II.23.3 `FieldOrPropType`).
///
/// This grammar is deliberately separate from [`crate::metadata::signatures::TypeSignature`]:
/// it has no coded indices, and enum types are named by their reflection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
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
    /// `System.Type`, encoded as its name
    Type,
    /// `object`; the value carries its own type tag
    Object,
    /// Single dimension array of a non-array attribute type
    SzArray(Box<AttributeType>),
    /// Enum, by assembly qualified type name
    Enum(TypeName),
}

impl AttributeType {
    /// Decode one attribute type.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for element types outside this grammar, arrays of
    /// arrays or a missing enum name, and [`crate::Error::OutOfBounds`] for truncated data.
    pub fn parse(parser: &mut Parser<'_>) -> Result<AttributeType> {
        Self::parse_element(parser, true)
    }

    fn parse_element(parser: &mut Parser<'_>, allow_array: bool) -> Result<AttributeType> {
        let element = parser.read_le::<u8>()?;
        Ok(match element {
            ELEMENT_TYPE::BOOLEAN => AttributeType::Boolean,
            ELEMENT_TYPE::CHAR => AttributeType::Char,
            ELEMENT_TYPE::I1 => AttributeType::I1,
            ELEMENT_TYPE::U1 => AttributeType::U1,
            ELEMENT_TYPE::I2 => AttributeType::I2,
            ELEMENT_TYPE::U2 => AttributeType::U2,
            ELEMENT_TYPE::I4 => AttributeType::I4,
            ELEMENT_TYPE::U4 => AttributeType::U4,
            ELEMENT_TYPE::I8 => AttributeType::I8,
            ELEMENT_TYPE::U8 => AttributeType::U8,
            ELEMENT_TYPE::R4 => AttributeType::R4,
            ELEMENT_TYPE::R8 => AttributeType::R8,
            ELEMENT_TYPE::STRING => AttributeType::String,
            ELEMENT_TYPE::TYPE => AttributeType::Type,
            ELEMENT_TYPE::BOXED => AttributeType::Object,
            ELEMENT_TYPE::SZARRAY if allow_array => {
                AttributeType::SzArray(Box::new(Self::parse_element(parser, false)?))
            }
            ELEMENT_TYPE::SZARRAY => {
                return Err(malformed_error!("Custom attribute array of arrays"));
            }
            ELEMENT_TYPE::ENUM => {
                let Some(name) = parser.read_ser_string()? else {
                    return Err(malformed_error!("Enum attribute type without a name"));
                };
                AttributeType::Enum(TypeName::parse(&name)?)
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid custom attribute element type - {:#04x}",
                    element
                ))
            }
        })
    }

    /// Encode this attribute type.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an array of arrays or an enum name too long for
    /// a ser-string.
    pub fn write(&self, writer: &mut BlobWriter) -> Result<()> {
        let element = match self {
            AttributeType::Boolean => ELEMENT_TYPE::BOOLEAN,
            AttributeType::Char => ELEMENT_TYPE::CHAR,
            AttributeType::I1 => ELEMENT_TYPE::I1,
            AttributeType::U1 => ELEMENT_TYPE::U1,
            AttributeType::I2 => ELEMENT_TYPE::I2,
            AttributeType::U2 => ELEMENT_TYPE::U2,
            AttributeType::I4 => ELEMENT_TYPE::I4,
            AttributeType::U4 => ELEMENT_TYPE::U4,
            AttributeType::I8 => ELEMENT_TYPE::I8,
            AttributeType::U8 => ELEMENT_TYPE::U8,
            AttributeType::R4 => ELEMENT_TYPE::R4,
            AttributeType::R8 => ELEMENT_TYPE::R8,
            AttributeType::String => ELEMENT_TYPE::STRING,
            AttributeType::Type => ELEMENT_TYPE::TYPE,
            AttributeType::Object => ELEMENT_TYPE::BOXED,
            AttributeType::SzArray(element) => {
                if matches!(**element, AttributeType::SzArray(_)) {
                    return Err(malformed_error!("Custom attribute array of arrays"));
                }
                writer.write_u8(ELEMENT_TYPE::SZARRAY);
                return element.write(writer);
            }
            AttributeType::Enum(name) => {
                writer.write_u8(ELEMENT_TYPE::ENUM);
                return writer.write_ser_string(Some(&name.to_string()));
            }
        };

        writer.write_u8(element);
        Ok(())
    }
}

/// Leading part of a named attribute argument: its kind, type and member name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArgumentHeader {
    /// Names a field rather than a property
    pub is_field: bool,
    /// Type of the argument value
    pub argument_type: AttributeType,
    /// Name of the field or property
    pub name: String,
}

impl NamedArgumentHeader {
    /// Decode a named argument header.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a kind byte other than `FIELD`/`PROPERTY` or a
    /// null name, and propagates [`AttributeType::parse`] failures.
    pub fn parse(parser: &mut Parser<'_>) -> Result<NamedArgumentHeader> {
        let is_field = match parser.read_le::<u8>()? {
            ELEMENT_TYPE::FIELD => true,
            ELEMENT_TYPE::PROPERTY => false,
            other => {
                return Err(malformed_error!(
                    "Invalid named argument kind - {:#04x}",
                    other
                ))
            }
        };

        let argument_type = AttributeType::parse(parser)?;
        let Some(name) = parser.read_ser_string()? else {
            return Err(malformed_error!("Named argument without a name"));
        };

        Ok(NamedArgumentHeader {
            is_field,
            argument_type,
            name,
        })
    }

    /// Encode this header.
    ///
    /// # Errors
    /// Propagates [`AttributeType::write`] failures.
    pub fn write(&self, writer: &mut BlobWriter) -> Result<()> {
        writer.write_u8(if self.is_field {
            ELEMENT_TYPE::FIELD
        } else {
            ELEMENT_TYPE::PROPERTY
        });
        self.argument_type.write(writer)?;
        writer.write_ser_string(Some(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduced_grammar() {
        let data = [0x1D, 0x08, 0x51, 0x50, 0x0E];
        let mut parser = Parser::new(&data);

        assert_eq!(
            AttributeType::parse(&mut parser).unwrap(),
            AttributeType::SzArray(Box::new(AttributeType::I4))
        );
        assert_eq!(AttributeType::parse(&mut parser).unwrap(), AttributeType::Object);
        assert_eq!(AttributeType::parse(&mut parser).unwrap(), AttributeType::Type);
        assert_eq!(AttributeType::parse(&mut parser).unwrap(), AttributeType::String);
    }

    #[test]
    fn rejects_arrays_of_arrays() {
        let data = [0x1D, 0x1D, 0x08];
        assert!(matches!(
            AttributeType::parse(&mut Parser::new(&data)),
            Err(crate::Error::Malformed { .. })
        ));

        // a long run of array tags fails at the second tag instead of recursing
        let data = vec![0x1D; 1 << 20];
        let mut parser = Parser::new(&data);
        assert!(AttributeType::parse(&mut parser).is_err());
        assert_eq!(parser.pos(), 2);

        let nested = AttributeType::SzArray(Box::new(AttributeType::SzArray(Box::new(
            AttributeType::I4,
        ))));
        assert!(nested.write(&mut BlobWriter::new()).is_err());
    }

    #[test]
    fn rejects_full_signature_productions() {
        for element in [0x12u8, 0x11, 0x0F, 0x15, 0x1C, 0x13] {
            let data = [element, 0x05];
            assert!(AttributeType::parse(&mut Parser::new(&data)).is_err());
        }
    }

    #[test]
    fn enum_by_name() {
        let name = "System.AttributeTargets, mscorlib";
        let mut data = vec![0x55, name.len() as u8];
        data.extend_from_slice(name.as_bytes());

        let parsed = AttributeType::parse(&mut Parser::new(&data)).unwrap();
        let AttributeType::Enum(type_name) = &parsed else {
            panic!("expected an enum type, got {parsed:?}");
        };
        assert_eq!(type_name.full_name(), "System.AttributeTargets");

        let mut writer = BlobWriter::new();
        parsed.write(&mut writer).unwrap();
        assert_eq!(writer.into_inner(), data);

        assert!(AttributeType::parse(&mut Parser::new(&[0x55, 0xFF])).is_err());
    }

    #[test]
    fn named_argument_header() {
        let data = [0x54, 0x02, 0x03, b'F', b'o', b'o'];
        let header = NamedArgumentHeader::parse(&mut Parser::new(&data)).unwrap();
        assert!(!header.is_field);
        assert_eq!(header.argument_type, AttributeType::Boolean);
        assert_eq!(header.name, "Foo");

        let mut writer = BlobWriter::new();
        header.write(&mut writer).unwrap();
        assert_eq!(writer.into_inner(), data);
    }
}

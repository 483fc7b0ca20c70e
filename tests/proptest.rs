//! Property-based tests for the blob codecs.
//!
//! These tests generate random values and verify:
//! 1. Compressed integers read back to the value that was written
//! 2. Signature trees parse back to the tree that was written
//! 3. Activation leaves trees without generic parameters untouched
//! 4. Instruction streams decode back to the instructions that were encoded

use cilgraph::{
    assembly::{calculate_offsets, decode_stream, encode_stream, opcodes::*, CilInstruction, CilOperand},
    file::writer::BlobWriter,
    metadata::{
        generic::{instantiate, GenericContext, GenericParameterKind},
        signatures::{
            encode_method_signature, encode_type_signature, parse_method_signature,
            parse_type_spec_signature, CustomModifier, MethodSignature, SignatureArray,
            SignatureGenericInst, SignatureGenericParam, TypeSignature,
        },
        tables::TableId,
        token::Token,
    },
    Parser,
};
use proptest::prelude::*;
use std::borrow::Cow;

// -- Strategies --

/// A `TypeDefOrRef` token that the parser accepts as a class or value type.
fn type_token_strategy() -> impl Strategy<Value = Token> {
    (prop_oneof![Just(TableId::TypeDef), Just(TableId::TypeRef)], 1u32..0x1_0000)
        .prop_map(|(table, rid)| Token::from_parts(table, rid))
}

fn leaf_strategy(with_params: bool) -> BoxedStrategy<TypeSignature> {
    let primitives = prop_oneof![
        Just(TypeSignature::Boolean),
        Just(TypeSignature::Char),
        Just(TypeSignature::I1),
        Just(TypeSignature::U2),
        Just(TypeSignature::I4),
        Just(TypeSignature::U8),
        Just(TypeSignature::R8),
        Just(TypeSignature::String),
        Just(TypeSignature::I),
        Just(TypeSignature::Object),
        Just(TypeSignature::TypedByRef),
    ];
    let references = prop_oneof![
        type_token_strategy().prop_map(TypeSignature::Class),
        type_token_strategy().prop_map(TypeSignature::ValueType),
    ];

    if with_params {
        let params = (any::<bool>(), 0u32..16).prop_map(|(method, index)| {
            TypeSignature::GenericParam(SignatureGenericParam {
                kind: if method {
                    GenericParameterKind::Method
                } else {
                    GenericParameterKind::Type
                },
                index,
            })
        });
        prop_oneof![primitives, references, params].boxed()
    } else {
        prop_oneof![primitives, references].boxed()
    }
}

fn type_strategy(with_params: bool) -> impl Strategy<Value = TypeSignature> {
    leaf_strategy(with_params).prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|t| TypeSignature::SzArray(Box::new(t))),
            inner.clone().prop_map(|t| TypeSignature::Ptr(Box::new(t))),
            inner.clone().prop_map(|t| TypeSignature::ByRef(Box::new(t))),
            (
                inner.clone(),
                1u32..8,
                prop::collection::vec(0u32..1000, 0..3),
                prop::collection::vec(-1000i32..1000, 0..3),
            )
                .prop_map(|(base, rank, sizes, lower_bounds)| {
                    TypeSignature::Array(SignatureArray {
                        base: Box::new(base),
                        rank,
                        sizes,
                        lower_bounds,
                    })
                }),
            (
                any::<bool>(),
                type_token_strategy(),
                prop::collection::vec(inner.clone(), 1..4),
            )
                .prop_map(|(value_type, definition, arguments)| {
                    TypeSignature::GenericInst(SignatureGenericInst {
                        value_type,
                        definition,
                        arguments,
                    })
                }),
            (any::<bool>(), type_token_strategy(), inner).prop_map(
                |(required, modifier, base)| {
                    TypeSignature::Modified(CustomModifier {
                        required,
                        modifier: Box::new(TypeSignature::Class(modifier)),
                        base: Box::new(base),
                    })
                }
            ),
        ]
    })
}

fn method_strategy() -> impl Strategy<Value = MethodSignature> {
    (
        any::<bool>(),
        0u32..4,
        type_strategy(true),
        prop::collection::vec(type_strategy(true), 0..5),
        prop::collection::vec(type_strategy(true), 0..3),
    )
        .prop_map(|(has_this, generic_param_count, return_type, params, varargs)| {
            let vararg = !varargs.is_empty();
            MethodSignature {
                // VARARG is the only convention that may carry a sentinel
                calling_convention: if vararg { 0x05 } else { 0x00 },
                has_this,
                explicit_this: false,
                generic_param_count: if vararg { 0 } else { generic_param_count },
                return_type,
                params,
                varargs,
            }
        })
}

/// One-byte opcodes with a fixed stack effect and no branch operand.
fn straight_instruction_strategy() -> impl Strategy<Value = CilInstruction> {
    prop_oneof![
        Just(CilInstruction::simple(NOP)),
        Just(CilInstruction::simple(LDARG_0)),
        Just(CilInstruction::simple(DUP)),
        Just(CilInstruction::simple(POP)),
        any::<i8>().prop_map(|value| CilInstruction::new(LDC_I4_S, CilOperand::Int8(value))),
        any::<i32>().prop_map(|value| CilInstruction::new(LDC_I4, CilOperand::Int32(value))),
        any::<i64>().prop_map(|value| CilInstruction::new(LDC_I8, CilOperand::Int64(value))),
        (0u16..=255).prop_map(|index| CilInstruction::new(LDLOC_S, CilOperand::Variable(index))),
        any::<u16>().prop_map(|index| CilInstruction::new(STLOC, CilOperand::Variable(index))),
        (1u32..0x100).prop_map(|rid| CilInstruction::new(
            LDFLD,
            CilOperand::Token(Token::from_parts(TableId::Field, rid))
        )),
    ]
}

// -- Properties --

proptest! {
    #[test]
    fn compressed_uint_round_trip(value in 0u32..=0x1FFF_FFFF) {
        let mut writer = BlobWriter::new();
        writer.write_compressed_uint(value).unwrap();
        let bytes = writer.into_inner();

        let expected_len = match value {
            0..=0x7F => 1,
            0x80..=0x3FFF => 2,
            _ => 4,
        };
        prop_assert_eq!(bytes.len(), expected_len);

        let mut parser = Parser::new(&bytes);
        prop_assert_eq!(parser.read_compressed_uint().unwrap(), value);
        prop_assert!(!parser.has_more_data());
    }

    #[test]
    fn compressed_int_round_trip(value in -(1i32 << 28)..(1i32 << 28)) {
        let mut writer = BlobWriter::new();
        writer.write_compressed_int(value).unwrap();
        let bytes = writer.into_inner();

        let mut parser = Parser::new(&bytes);
        prop_assert_eq!(parser.read_compressed_int().unwrap(), value);
    }

    #[test]
    fn type_signature_round_trip(signature in type_strategy(true)) {
        let blob = encode_type_signature(&signature).unwrap();
        let parsed = parse_type_spec_signature(&blob).unwrap();
        prop_assert_eq!(parsed, signature);
    }

    #[test]
    fn method_signature_round_trip(method in method_strategy()) {
        let blob = encode_method_signature(&method).unwrap();
        let parsed = parse_method_signature(&blob).unwrap();
        prop_assert_eq!(parsed, method);
    }

    #[test]
    fn closed_trees_are_not_copied(signature in type_strategy(false)) {
        let arguments = vec![TypeSignature::I4];
        let context = GenericContext::new().with_type_arguments(&arguments);

        let activated = instantiate(&signature, &context).unwrap();
        prop_assert!(matches!(activated, Cow::Borrowed(node) if std::ptr::eq(node, &signature)));
    }

    #[test]
    fn instruction_stream_round_trip(
        mut instructions in prop::collection::vec(straight_instruction_strategy(), 1..64)
    ) {
        instructions.push(CilInstruction::simple(RET));
        let size = calculate_offsets(&mut instructions);

        let code = encode_stream(&instructions).unwrap();
        prop_assert_eq!(code.len(), size as usize);
        prop_assert_eq!(decode_stream(&code).unwrap(), instructions);
    }
}

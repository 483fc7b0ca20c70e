//! Integration tests for method bodies: header selection, exception clauses, label
//! verification, max stack computation and the raw round trip.

use cilgraph::{
    assembly::{opcodes::*, CilInstruction, CilOperand},
    config::LoaderConfig,
    metadata::{
        method::{CilExceptionHandler, CilMethodBody, HandlerBoundary, InvalidLabel, RawMethodBody},
        token::Token,
    },
    Error, Result,
};

fn body_of(instructions: Vec<CilInstruction>) -> CilMethodBody {
    let mut body = CilMethodBody::new();
    body.instructions = instructions;
    body.calculate_offsets();
    body
}

fn target(offset: u32) -> CilOperand {
    CilOperand::Target(offset)
}

/// try { nop; leave } catch (TypeRef 1) { pop; leave } ret
fn try_catch() -> CilMethodBody {
    let mut body = body_of(vec![
        CilInstruction::simple(NOP),
        CilInstruction::new(LEAVE_S, target(6)),
        CilInstruction::simple(POP),
        CilInstruction::new(LEAVE_S, target(6)),
        CilInstruction::simple(RET),
    ]);
    body.exception_handlers.push(CilExceptionHandler::catch(
        (0, 3),
        (3, 3),
        Token::new(0x0100_0001),
    ));
    body
}

#[test]
fn ten_one_byte_instructions_use_a_tiny_header() -> Result<()> {
    let mut instructions = vec![CilInstruction::simple(NOP); 9];
    instructions.push(CilInstruction::simple(RET));
    let mut body = body_of(instructions);

    assert!(!body.is_fat());
    let raw = body.build()?;
    let bytes = raw.write()?;
    assert_eq!(bytes[0], (10 << 2) | 0x02);
    assert_eq!(bytes.len(), 11);
    Ok(())
}

#[test]
fn fat_header_conditions() {
    let mut body = body_of(vec![CilInstruction::simple(RET)]);
    assert!(!body.is_fat());

    body.max_stack = 9;
    assert!(body.is_fat());
    body.max_stack = 8;

    body.locals.push(cilgraph::metadata::signatures::TypeSignature::I4);
    assert!(body.is_fat());
    body.locals.clear();

    // a locals token whose signature was never resolved leaves the body tiny
    body.local_var_sig_token = Token::new(0x1100_0001);
    assert!(!body.is_fat());
    body.local_var_sig_token = Token::default();

    let mut long = vec![CilInstruction::simple(NOP); 63];
    long.push(CilInstruction::simple(RET));
    let long = body_of(long);
    assert_eq!(long.code_size(), 64);
    assert!(long.is_fat());

    assert!(try_catch().is_fat());
}

#[test]
fn diverging_depths_at_a_merge_point_are_rejected() {
    // ldc.i4.1 ldc.i4.2 ldc.i4.0 brtrue.s L ldc.i4.3 L: pop pop ret
    let mut body = body_of(vec![
        CilInstruction::simple(LDC_I4_1),
        CilInstruction::simple(LDC_I4_2),
        CilInstruction::simple(LDC_I4_0),
        CilInstruction::new(BRTRUE_S, target(6)),
        CilInstruction::simple(LDC_I4_3),
        CilInstruction::simple(POP),
        CilInstruction::simple(POP),
        CilInstruction::simple(RET),
    ]);

    match body.compute_max_stack() {
        Err(Error::StackImbalance { offset, .. }) => assert_eq!(offset, 6),
        other => panic!("unexpected result {other:?}"),
    }
    assert!(body.build().is_err());
}

#[test]
fn handler_entry_carries_the_exception_object() -> Result<()> {
    let mut body = try_catch();
    assert_eq!(body.compute_max_stack()?, 1);
    Ok(())
}

#[test]
fn fat_body_round_trip() -> Result<()> {
    let mut body = try_catch();
    body.local_var_sig_token = Token::new(0x1100_0002);
    body.init_locals = true;

    let raw = body.build()?;
    assert!(raw.is_fat);
    assert_eq!(raw.max_stack, 1);
    let bytes = raw.write()?;

    let decoded = CilMethodBody::read(&bytes, None)?;
    assert_eq!(decoded.instructions, body.instructions);
    assert_eq!(decoded.exception_handlers, body.exception_handlers);
    assert_eq!(decoded.local_var_sig_token, Token::new(0x1100_0002));
    assert_eq!(decoded.max_stack, 1);
    assert!(decoded.init_locals);
    assert!(!decoded.compute_max_stack);
    Ok(())
}

#[test]
fn declared_max_stack_survives_a_round_trip() -> Result<()> {
    let mut body = body_of(vec![
        CilInstruction::simple(LDARG_0),
        CilInstruction::simple(RET),
    ]);
    body.compute_max_stack = false;
    body.max_stack = 16;

    let bytes = body.build()?.write()?;
    let decoded = CilMethodBody::read(&bytes, None)?;
    assert_eq!(decoded.max_stack, 16);

    let mut decoded = decoded;
    assert_eq!(decoded.build()?.write()?, bytes);
    Ok(())
}

#[test]
fn tiny_body_bytes_are_reproduced() -> Result<()> {
    // ldarg.0 ldarg.1 add ret
    let bytes = [0x12, 0x02, 0x03, 0x58, 0x2A];
    let mut body = CilMethodBody::read(&bytes, None)?;
    assert_eq!(body.max_stack, 8);
    assert_eq!(body.build()?.write()?, bytes);
    Ok(())
}

#[test]
fn switch_round_trip() -> Result<()> {
    // ldarg.0 switch (IL_000f, IL_0010) ret ret ret
    let mut body = body_of(vec![
        CilInstruction::simple(LDARG_0),
        CilInstruction::new(SWITCH, CilOperand::Switch(vec![15, 16])),
        CilInstruction::simple(RET),
        CilInstruction::simple(RET),
        CilInstruction::simple(RET),
    ]);
    assert_eq!(body.code_size(), 17);

    let bytes = body.build()?.write()?;
    let decoded = CilMethodBody::read(&bytes, None)?;
    assert_eq!(decoded.instructions, body.instructions);
    assert_eq!(decoded.instructions[1].branch_targets(), vec![15, 16]);
    Ok(())
}

#[test]
fn every_invalid_label_is_reported() {
    let mut body = try_catch();
    body.instructions[1].operand = target(2);
    body.exception_handlers[0].handler_offset = 5;

    match body.build() {
        Err(Error::InvalidLabels(labels)) => {
            assert!(labels.contains(&InvalidLabel::Branch { offset: 1, target: 2 }));
            assert!(labels.contains(&InvalidLabel::Handler {
                index: 0,
                boundary: HandlerBoundary::HandlerStart,
                target: 5,
            }));
            assert!(labels.contains(&InvalidLabel::Handler {
                index: 0,
                boundary: HandlerBoundary::HandlerEnd,
                target: 8,
            }));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn minimal_config_skips_build_checks() -> Result<()> {
    let mut body = CilMethodBody::with_config(&LoaderConfig::minimal());
    body.instructions = vec![
        CilInstruction::new(BR_S, target(1)),
        CilInstruction::simple(RET),
    ];
    body.max_stack = 3;

    // the branch lands inside itself, nothing checks it
    let raw = body.build()?;
    assert_eq!(raw.max_stack, 3);
    assert_eq!(raw.code, [0x2B, 0xFF, 0x2A]);
    Ok(())
}

#[test]
fn short_branch_out_of_range_fails_to_build() {
    let mut instructions = vec![CilInstruction::new(BR_S, target(0))];
    instructions.extend(vec![CilInstruction::simple(NOP); 200]);
    instructions.push(CilInstruction::simple(RET));
    let mut body = body_of(instructions);
    body.instructions[0].operand = target(202);

    assert!(matches!(
        body.build(),
        Err(Error::BranchOutOfRange { offset: 0, target: 202 })
    ));
}

#[test]
fn raw_reader_rejects_truncated_sections() {
    let mut body = try_catch();
    let bytes = body.build().unwrap().write().unwrap();

    let truncated = &bytes[..bytes.len() - 4];
    assert!(RawMethodBody::read(truncated).is_err());
}

//! Benchmarks for method body reading, disassembly, max stack computation and encoding.

extern crate cilgraph;

use cilgraph::{
    assembly::{decode_stream, encode_stream, opcodes::*, CilInstruction, CilOperand},
    metadata::method::{CilMethodBody, RawMethodBody},
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// Fat body, one local, counting loop from 0 to 100.
const COUNTING_LOOP: [u8; 26] = [
    0x13, 0x30, 0x02, 0x00, // fat, init locals, max stack 2
    0x0E, 0x00, 0x00, 0x00, // code size
    0x01, 0x00, 0x00, 0x11, // locals 0x11000001
    0x16, // ldc.i4.0
    0x0A, // stloc.0
    0x2B, 0x04, // br.s IL_0008
    0x06, // ldloc.0
    0x17, // ldc.i4.1
    0x58, // add
    0x0A, // stloc.0
    0x06, // IL_0008: ldloc.0
    0x1F, 0x64, // ldc.i4.s 100
    0x32, 0xF7, // blt.s IL_0004
    0x2A, // ret
];

/// `count` increments of the first argument, each followed by a conditional skip.
fn generated_body(count: usize) -> Vec<CilInstruction> {
    let mut instructions = Vec::with_capacity(count * 6 + 1);
    for _ in 0..count {
        instructions.push(CilInstruction::simple(LDARG_0));
        instructions.push(CilInstruction::simple(LDC_I4_1));
        instructions.push(CilInstruction::simple(ADD));
        instructions.push(CilInstruction::new(STARG_S, CilOperand::Variable(0)));
        instructions.push(CilInstruction::simple(LDARG_0));
        instructions.push(CilInstruction::new(BRFALSE_S, CilOperand::Target(0)));
    }
    instructions.push(CilInstruction::simple(RET));

    let mut body = CilMethodBody::new();
    body.instructions = instructions;
    let size = body.calculate_offsets();
    for instruction in &mut body.instructions {
        if instruction.opcode == BRFALSE_S {
            instruction.operand = CilOperand::Target(instruction.next_offset().min(size - 1));
        }
    }
    body.instructions
}

fn bench_read_raw(c: &mut Criterion) {
    c.bench_function("body_read_raw", |b| {
        b.iter(|| {
            let raw = RawMethodBody::read(black_box(&COUNTING_LOOP)).unwrap();
            black_box(raw)
        });
    });
}

fn bench_read_decoded(c: &mut Criterion) {
    c.bench_function("body_read_decoded", |b| {
        b.iter(|| {
            let body = CilMethodBody::read(black_box(&COUNTING_LOOP), None).unwrap();
            black_box(body)
        });
    });
}

fn bench_disassemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("body_disassemble");
    for count in [16, 256, 4096] {
        let code = encode_stream(&generated_body(count)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(count), &code, |b, code| {
            b.iter(|| {
                let instructions = decode_stream(black_box(code)).unwrap();
                black_box(instructions)
            });
        });
    }
    group.finish();
}

fn bench_compute_max_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("body_max_stack");
    for count in [16, 256, 4096] {
        let mut body = CilMethodBody::new();
        body.instructions = generated_body(count);
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| black_box(body.compute_max_stack().unwrap()));
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut body = CilMethodBody::new();
    body.instructions = generated_body(256);

    c.bench_function("body_build", |b| {
        b.iter(|| {
            let raw = body.build().unwrap();
            black_box(raw.write().unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_read_raw,
    bench_read_decoded,
    bench_disassemble,
    bench_compute_max_stack,
    bench_build,
);
criterion_main!(benches);

// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Directed programs through the public API: assemble, execute, write
//! the trace out and read it back.

use rvoracle_core::asm::ProgramBuilder;
use rvoracle_core::isa::DecodePolicy;
use rvoracle_core::sim::{run_image, SimOptions, StopReason};
use rvoracle_core::trace::{parse_trace, write_trace};
use rvoracle_core::OracleError;

#[test]
fn test_countdown_program_trace_round_trip() {
    // Sum 5..1 into x2, then jump over a poison word to the epilogue.
    let mut b = ProgramBuilder::new();
    b.addi(1, 0, 5);
    b.label("loop").unwrap();
    b.add(2, 2, 1);
    b.addi(1, 1, -1);
    b.bne(1, 0, "loop");
    b.jal(0, "done");
    b.data_word(0xFFFFFFFF);
    b.label("done").unwrap();
    b.addi(31, 2, 0);
    let image = b.finalize().unwrap();

    let result = run_image(&image, &SimOptions::default()).unwrap();
    assert_eq!(result.stop, StopReason::PcOutOfImage);
    assert_eq!(result.steps, 18);
    assert_eq!(result.regs[2], 15);
    assert_eq!(result.regs[31], 15);

    let mut out = Vec::new();
    write_trace(&mut out, &result.trace).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("# Golden Commit Trace"));

    let parsed = parse_trace(&text);
    assert_eq!(parsed, result.trace);
}

#[test]
fn test_store_load_program_commits() {
    // Assemble a word in memory byte by byte, then load it back whole.
    let mut b = ProgramBuilder::new();
    b.li(1, 0x600);
    b.addi(2, 0, 0x12);
    b.sb(2, 1, 3);
    b.addi(2, 0, 0x34);
    b.sb(2, 1, 2);
    b.addi(2, 0, 0x56);
    b.sb(2, 1, 1);
    b.addi(2, 0, 0x78);
    b.sb(2, 1, 0);
    b.lw(3, 1, 0);
    b.lh(4, 1, 2);
    let image = b.finalize().unwrap();

    let result = run_image(&image, &SimOptions::default()).unwrap();
    assert_eq!(result.stop, StopReason::PcOutOfImage);
    assert_eq!(result.trace.len(), 11);
    assert_eq!(result.regs[3], 0x12345678);
    assert_eq!(result.regs[4], 0x1234);

    let last = result.trace.last().unwrap();
    assert_eq!((last.rd, last.rd_data), (4, 0x1234));
}

#[test]
fn test_function_call_and_return() {
    // Call a doubling routine through x1 and return with jalr.
    let mut b = ProgramBuilder::new();
    b.addi(10, 0, 21); // pc 0
    b.jal(1, "double"); // pc 4
    b.addi(31, 10, 0); // pc 8
    b.jal(0, "exit"); // pc 12
    b.label("double").unwrap();
    b.add(10, 10, 10); // pc 16
    b.jalr(0, 1, 0); // pc 20
    b.label("exit").unwrap(); // pc 24, one past the image
    let image = b.finalize().unwrap();

    let result = run_image(&image, &SimOptions::default()).unwrap();
    assert_eq!(result.stop, StopReason::PcOutOfImage);
    let pcs: Vec<u32> = result.trace.iter().map(|e| e.pc).collect();
    assert_eq!(pcs, vec![0, 4, 16, 20, 8, 12]);
    assert_eq!(result.regs[1], 8);
    assert_eq!(result.regs[10], 42);
    assert_eq!(result.regs[31], 42);
}

#[test]
fn test_strict_decode_rejects_embedded_data() {
    let mut b = ProgramBuilder::new();
    b.addi(1, 0, 7);
    b.beq(0, 0, "end");
    b.data_word(0xFFFFFFFF);
    b.label("end").unwrap();
    b.nop();
    let image = b.finalize().unwrap();

    // Lenient execution never reaches the poison word.
    let result = run_image(&image, &SimOptions::default()).unwrap();
    assert_eq!(result.steps, 3);

    // Strict decode refuses the image up front.
    let opts = SimOptions {
        decode_policy: DecodePolicy::Strict,
        ..SimOptions::default()
    };
    let err = run_image(&image, &opts).unwrap_err();
    match err {
        OracleError::IllegalInstruction { pc, word } => {
            assert_eq!(pc, 8);
            assert_eq!(word, 0xFFFFFFFF);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Field-level check of the RTL decoder against the golden decoder.
//!
//! The front-end testbench prints one `PC=.. op=.. rs1=.. rs2=.. rd=..
//! imm=..` line per decoded micro-op. For every such line this checker
//! fetches the raw word from the program image, decodes it with the
//! golden table and compares the fields the RTL claims it extracted.
//!
//! Comparison rules:
//!
//! * `op` and `imm` are always compared; `imm` as a raw u32 so that
//!   sign-extended values line up without further convention.
//! * `rs1`, `rs2` and `rd` are compared only when the operation
//!   actually uses them. Hardware is free to leave don't-care fields
//!   at whatever the bit slice happens to contain.
//! * A field logged as the literal `x` marks the whole line unparsed.
//!
//! Shift-immediates compare the full 12-bit I-field (funct7 folded in
//! above the shamt), which is what a direct bit-slice decoder latches.

use std::fmt::Write as _;

use rvoracle_core::image::ProgramImage;
use rvoracle_core::isa::{codec, decode, Op};
use serde::Serialize;

/// Decoder fields as printed by the RTL, all widened to u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoggedFields {
    pub op: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub rd: u32,
    pub imm: u32,
}

/// Golden-decoder view of the same word. Unused register fields are
/// zero, matching the decode conventions of the rest of the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpectedFields {
    pub op: Op,
    /// The RTL's numeric encoding for this operation.
    pub number: u32,
    pub rs1: u32,
    pub rs2: u32,
    pub rd: u32,
    pub imm: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecodeMismatch {
    pub lineno: usize,
    pub pc: u32,
    pub word: u32,
    pub rtl: LoggedFields,
    pub expected: ExpectedFields,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DecodeCheckReport {
    /// Lines that were fully compared, including mismatching ones.
    pub checked: usize,
    /// Lines starting with `PC=` that had missing or unparsable fields.
    pub skipped_parse: usize,
    /// Lines whose PC falls outside the program image.
    pub skipped_not_in_image: usize,
    pub mismatches: Vec<DecodeMismatch>,
}

impl DecodeCheckReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for m in &self.mismatches {
            let _ = writeln!(out, "Mismatch @ PC {:08x} ins={:08x}", m.pc, m.word);
            let _ = writeln!(
                out,
                "  RTL: op={} rs1={} rs2={} rd={} imm={:#010x}",
                m.rtl.op, m.rtl.rs1, m.rtl.rs2, m.rtl.rd, m.rtl.imm
            );
            let _ = writeln!(
                out,
                "  REF: {:?} op={} rs1={} rs2={} rd={} imm={:#010x}",
                m.expected.op,
                m.expected.number,
                m.expected.rs1,
                m.expected.rs2,
                m.expected.rd,
                m.expected.imm
            );
        }
        if self.passed() {
            let _ = writeln!(
                out,
                "PASS ({} checked). skipped_parse={} skipped_not_in_image={}",
                self.checked, self.skipped_parse, self.skipped_not_in_image
            );
        } else {
            let _ = writeln!(
                out,
                "FAIL: {} mismatches out of {} checked. skipped_parse={} skipped_not_in_image={}",
                self.mismatches.len(),
                self.checked,
                self.skipped_parse,
                self.skipped_not_in_image
            );
        }
        out
    }
}

/// Checks every `PC=` line of a decode log against the golden decoder.
/// Words that decode to nothing checkable (the all-zero nop, data
/// padding) are passed over without touching any counter.
pub fn check_fetch_log(image: &ProgramImage, log: &str) -> DecodeCheckReport {
    let mut report = DecodeCheckReport::default();
    for (idx, raw) in log.lines().enumerate() {
        let line = raw.trim();
        if !line.starts_with("PC=") {
            continue;
        }
        let parsed = match parse_fields(line) {
            Some(p) => p,
            None => {
                report.skipped_parse += 1;
                continue;
            }
        };
        let word = match image.word_at(parsed.pc) {
            Some(w) => w,
            None => {
                report.skipped_not_in_image += 1;
                continue;
            }
        };
        let inst = match decode(word, parsed.pc) {
            Ok((inst, _)) => inst,
            Err(_) => continue,
        };
        let number = match rtl_op_number(inst.op) {
            Some(n) => n,
            None => continue,
        };

        let expected = ExpectedFields {
            op: inst.op,
            number,
            rs1: inst.rs1 as u32,
            rs2: inst.rs2 as u32,
            rd: inst.rd as u32,
            imm: expected_imm(inst.op, word),
        };
        let f = parsed.fields;
        let mut ok = f.op == number && f.imm == expected.imm;
        if inst.op.uses_rs1() && f.rs1 != expected.rs1 {
            ok = false;
        }
        if inst.op.uses_rs2() && f.rs2 != expected.rs2 {
            ok = false;
        }
        if inst.op.writes_rd() && f.rd != expected.rd {
            ok = false;
        }
        if !ok {
            tracing::warn!(
                "decode mismatch at pc={:#010x} (log line {})",
                parsed.pc,
                idx + 1
            );
            report.mismatches.push(DecodeMismatch {
                lineno: idx + 1,
                pc: parsed.pc,
                word,
                rtl: f,
                expected,
            });
        }
        report.checked += 1;
    }
    report
}

/// Operation numbering used by the RTL decoder's op enum. `Nop` and
/// `Data` have no RTL counterpart and are not checked.
fn rtl_op_number(op: Op) -> Option<u32> {
    let n = match op {
        Op::Add => 3,
        Op::Sub => 4,
        Op::And => 5,
        Op::Or => 6,
        Op::Xor => 7,
        Op::Sll => 8,
        Op::Srl => 9,
        Op::Sra => 10,
        Op::Slt => 11,
        Op::Sltu => 12,
        Op::Addi => 13,
        Op::Andi => 14,
        Op::Ori => 15,
        Op::Xori => 16,
        Op::Slli => 17,
        Op::Srli => 18,
        Op::Srai => 19,
        Op::Slti => 20,
        Op::Sltiu => 21,
        Op::Lui => 22,
        Op::Auipc => 23,
        Op::Beq => 24,
        Op::Bne => 25,
        Op::Blt => 26,
        Op::Bge => 27,
        Op::Bltu => 28,
        Op::Bgeu => 29,
        Op::Jal => 30,
        Op::Jalr => 31,
        Op::Lb => 32,
        Op::Lh => 33,
        Op::Lw => 34,
        Op::Lbu => 35,
        Op::Lhu => 36,
        Op::Sb => 37,
        Op::Sh => 38,
        Op::Sw => 39,
        Op::Nop | Op::Data => return None,
    };
    Some(n)
}

/// Immediate the RTL decoder is expected to latch for `word`, as a raw
/// u32. Recomputed from the word rather than taken from the decoded
/// instruction, since the executor-facing conventions (masked shamt,
/// unshifted upper immediate, eager branch targets) differ from what a
/// bit-slice decoder produces.
fn expected_imm(op: Op, word: u32) -> u32 {
    match op {
        Op::Lui | Op::Auipc => codec::imm_u(word),
        Op::Jal => codec::imm_j(word) as u32,
        Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => codec::imm_b(word) as u32,
        Op::Sb | Op::Sh | Op::Sw => codec::imm_s(word) as u32,
        Op::Jalr
        | Op::Lb
        | Op::Lh
        | Op::Lw
        | Op::Lbu
        | Op::Lhu
        | Op::Addi
        | Op::Slti
        | Op::Sltiu
        | Op::Xori
        | Op::Ori
        | Op::Andi
        | Op::Slli
        | Op::Srli
        | Op::Srai => codec::imm_i(word) as u32,
        _ => 0,
    }
}

struct ParsedLine {
    pc: u32,
    fields: LoggedFields,
}

fn parse_fields(line: &str) -> Option<ParsedLine> {
    let mut pc = None;
    let mut op = None;
    let mut rs1 = None;
    let mut rs2 = None;
    let mut rd = None;
    let mut imm = None;
    for tok in line.split_whitespace() {
        if let Some((k, v)) = tok.split_once('=') {
            match k {
                "PC" => pc = parse_hex_field(v),
                "op" => op = parse_dec_field(v),
                "rs1" => rs1 = parse_dec_field(v),
                "rs2" => rs2 = parse_dec_field(v),
                "rd" => rd = parse_dec_field(v),
                "imm" => imm = parse_hex_field(v),
                _ => {}
            }
        }
    }
    Some(ParsedLine {
        pc: pc?,
        fields: LoggedFields {
            op: op?,
            rs1: rs1?,
            rs2: rs2?,
            rd: rd?,
            imm: imm?,
        },
    })
}

/// Hex field with optional `0x` prefix. The literal `x` means the RTL
/// printed a don't-care.
fn parse_hex_field(v: &str) -> Option<u32> {
    let v = v.trim();
    if v.eq_ignore_ascii_case("x") {
        return None;
    }
    let v = v
        .strip_prefix("0x")
        .or_else(|| v.strip_prefix("0X"))
        .unwrap_or(v);
    u32::from_str_radix(v, 16).ok()
}

/// Decimal field, tolerating a register-style `x5` spelling.
fn parse_dec_field(v: &str) -> Option<u32> {
    let v = v.trim();
    if v.eq_ignore_ascii_case("x") {
        return None;
    }
    let digits = match v.strip_prefix('x').or_else(|| v.strip_prefix('X')) {
        Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => rest,
        _ => v,
    };
    digits.parse::<u32>().ok()
}

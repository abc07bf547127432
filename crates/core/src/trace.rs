// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The golden commit-trace text format.
//!
//! One line per committed instruction, fixed columns, `#` comments.
//! The parser accepts exactly what the writer emits plus arbitrary
//! interleaved comment lines, and silently ignores anything else so
//! hand-annotated traces stay loadable.

use std::io::{self, Write};

/// One architecturally committed instruction.
///
/// `rd` is zero for instructions that do not write a register, and
/// `rd_data` is the value of `rd` after the write (zero when `rd` is
/// x0). `cycle` is just the commit index; a real pipeline retires on
/// different cycles but in this order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommitEntry {
    pub cycle: u64,
    pub pc: u32,
    pub inst: u32,
    pub rd: u8,
    pub rd_data: u32,
    pub asm: String,
}

pub fn write_trace<W: Write>(mut out: W, entries: &[CommitEntry]) -> io::Result<()> {
    writeln!(out, "# Golden Commit Trace")?;
    writeln!(out, "# cycle  pc        inst       rd  data       asm")?;
    writeln!(out, "# {}", "-".repeat(60))?;
    for e in entries {
        writeln!(
            out,
            "{:6}  {:08x}  {:08x}  x{:02}  {:08x}  {}",
            e.cycle, e.pc, e.inst, e.rd, e.rd_data, e.asm
        )?;
    }
    Ok(())
}

/// Parse a golden trace back into entries. Blank lines, `#` comments
/// and lines that do not match the row shape are skipped.
pub fn parse_trace(text: &str) -> Vec<CommitEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(entry) = parse_row(line) {
            entries.push(entry);
        }
    }
    entries
}

fn parse_row(line: &str) -> Option<CommitEntry> {
    let mut tokens = line.split_whitespace();
    let cycle = tokens.next()?.parse::<u64>().ok()?;
    let pc = parse_hex8(tokens.next()?)?;
    let inst = parse_hex8(tokens.next()?)?;
    let rd = tokens.next()?.strip_prefix('x')?.parse::<u8>().ok()?;
    let rd_data = parse_hex8(tokens.next()?)?;
    let asm = tokens.collect::<Vec<_>>().join(" ");
    Some(CommitEntry {
        cycle,
        pc,
        inst,
        rd,
        rd_data,
        asm,
    })
}

fn parse_hex8(token: &str) -> Option<u32> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(token, 16).ok()
}

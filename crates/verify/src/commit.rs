// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Parser for JSONL commit logs emitted by the RTL testbench.
//!
//! Each line is one JSON object describing a retired micro-op. Lines
//! that fail to parse are counted rather than aborting the run, so a
//! truncated or partially corrupted log still yields a comparable
//! prefix. Events are filtered down to valid architectural commits
//! before comparison:
//!
//! * a `type` field, when present, must equal `"commit"`,
//! * a `valid` field, when present, must be truthy (`0`, `"0"`,
//!   `false` and `null` all mean invalid).
//!
//! Numeric fields arrive either as JSON numbers or as strings. `pc`
//! and `data` strings are interpreted as hex first (with or without a
//! `0x` prefix) and as decimal only as a fallback, since testbenches
//! overwhelmingly print those in hex.

use serde::Serialize;
use serde_json::{Map, Value};

/// One retired micro-op recovered from the RTL commit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RtlCommit {
    /// 1-based line number in the source log, for diagnostics.
    pub lineno: usize,
    /// Testbench cycle counter, if the log carries one. Display only.
    pub cycle: Option<u64>,
    pub pc: u32,
    /// Destination register, collapsed to 0 when the micro-op does not
    /// write one. This matches the golden trace convention, so the
    /// tuple (pc, rd, data) is directly comparable.
    pub rd: u8,
    pub data: u32,
    /// Control-flow metadata some testbenches attach to commits.
    pub is_branch: bool,
    pub mispredict: bool,
}

/// A parsed commit log: the accepted commits in file order, plus a
/// count of lines that could not be interpreted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommitLog {
    pub commits: Vec<RtlCommit>,
    pub bad_lines: usize,
}

enum LineOutcome {
    Commit(RtlCommit),
    Skip,
    Bad,
}

/// Parses a whole JSONL commit log. Never fails: unusable lines are
/// tallied in [`CommitLog::bad_lines`] and skipped.
pub fn parse_commit_jsonl(text: &str) -> CommitLog {
    let mut commits = Vec::new();
    let mut bad_lines = 0;
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(idx + 1, line) {
            LineOutcome::Commit(c) => commits.push(c),
            LineOutcome::Skip => {}
            LineOutcome::Bad => {
                bad_lines += 1;
                tracing::debug!("skipping unusable commit log line {}", idx + 1);
            }
        }
    }
    CommitLog { commits, bad_lines }
}

fn parse_line(lineno: usize, line: &str) -> LineOutcome {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(_) => return LineOutcome::Bad,
    };
    let rec = match value.as_object() {
        Some(m) => m,
        None => return LineOutcome::Bad,
    };

    if let Some(ty) = rec.get("type") {
        if ty.as_str() != Some("commit") {
            return LineOutcome::Skip;
        }
    }
    if !flag(rec.get("valid"), true) {
        return LineOutcome::Skip;
    }

    let pc = match field_u32(rec, "pc") {
        Some(v) => v,
        None => return LineOutcome::Bad,
    };
    let data = match field_u32(rec, "data") {
        Some(v) => v,
        None => return LineOutcome::Bad,
    };
    let rd = if flag(rec.get("uses_rd"), false) {
        let n = match rec.get("rd_arch") {
            None => 0,
            Some(v) => match num_dec(v) {
                Some(n) => n,
                None => return LineOutcome::Bad,
            },
        };
        match u8::try_from(n) {
            Ok(r) => r,
            Err(_) => return LineOutcome::Bad,
        }
    } else {
        0
    };

    LineOutcome::Commit(RtlCommit {
        lineno,
        cycle: rec.get("cycle").and_then(num_dec),
        pc,
        rd,
        data,
        is_branch: flag(rec.get("is_branch"), false),
        mispredict: flag(rec.get("mispredict"), false),
    })
}

/// Reads `key` as a u32, defaulting to 0 when the field is absent.
/// Returns `None` only for a present-but-unusable value.
fn field_u32(rec: &Map<String, Value>, key: &str) -> Option<u32> {
    match rec.get(key) {
        None => Some(0),
        Some(v) => num_u32(v),
    }
}

/// Hex-first numeric conversion for pc/data style fields.
fn num_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|x| u32::try_from(x).ok()),
        Value::String(s) => {
            let t = s.trim();
            match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => u32::from_str_radix(t, 16)
                    .ok()
                    .or_else(|| t.parse::<u32>().ok()),
            }
        }
        _ => None,
    }
}

/// Plain decimal conversion for counters and register indices.
fn num_dec(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Truthiness for flag fields. Absent means `default`; an explicit
/// `null`, `0`, `"0"`, `""` or `false` means false.
fn flag(v: Option<&Value>, default: bool) -> bool {
    match v {
        None => default,
        Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|x| x != 0.0).unwrap_or(true),
        Some(Value::String(s)) => {
            let t = s.trim();
            !t.is_empty() && t != "0"
        }
        Some(_) => true,
    }
}

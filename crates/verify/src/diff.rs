// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! In-order comparison of an RTL commit stream against a golden trace.
//!
//! The streams are compared index by index on the tuple
//! `(pc, rd, data)`. Cycle counters are deliberately excluded: an
//! out-of-order core retires on its own schedule, and only the
//! architectural order and effects have to agree. The first divergence
//! decides the verdict; everything after it is noise once the streams
//! have split.

use std::fmt::Write as _;

use rvoracle_core::trace::CommitEntry;
use serde::Serialize;

use crate::commit::{CommitLog, RtlCommit};

/// Context rows shown on each side of a divergence.
pub const DEFAULT_RADIUS: usize = 6;

/// Outcome of a commit-stream comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Streams agree entry for entry and have the same length.
    Match,
    /// First index where the tuples disagree. Also covers an RTL
    /// stream that keeps committing past the end of the golden trace.
    Mismatch { index: usize },
    /// RTL stream stopped while golden commits remained; `index` is
    /// the first golden entry with no RTL counterpart.
    EndedEarly { index: usize },
}

/// One aligned row of divergence context, indexed by golden position.
#[derive(Debug, Clone, Serialize)]
pub struct ContextRow {
    pub index: usize,
    pub golden: CommitEntry,
    pub rtl: Option<RtlCommit>,
}

/// Full comparison result, renderable as text or serialized to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub verdict: Verdict,
    pub golden_len: usize,
    pub rtl_len: usize,
    pub bad_lines: usize,
    /// Golden entry at the divergence point, when one exists.
    pub golden_at: Option<CommitEntry>,
    /// RTL entry at the divergence point, or the last one seen when
    /// the stream ended early.
    pub rtl_at: Option<RtlCommit>,
    pub context: Vec<ContextRow>,
}

impl DiffReport {
    pub fn passed(&self) -> bool {
        matches!(self.verdict, Verdict::Match)
    }

    /// Human-readable report, one screen of context around the
    /// divergence point.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Gold commits: {}", self.golden_len);
        let _ = writeln!(
            out,
            "Sim commits: {} (bad json lines skipped={})",
            self.rtl_len, self.bad_lines
        );
        let highlight = match self.verdict {
            Verdict::Match => None,
            Verdict::Mismatch { index } | Verdict::EndedEarly { index } => Some(index),
        };
        match self.verdict {
            Verdict::Match => {
                let _ = writeln!(out, "PASS: commit streams match");
            }
            Verdict::Mismatch { index } => {
                let _ = writeln!(out, "FAIL: first mismatch at commit index {index}");
                match &self.golden_at {
                    Some(g) => {
                        let _ = writeln!(
                            out,
                            "  GOLD: pc={:08x} rd=x{:02} data={:08x}  {}",
                            g.pc, g.rd, g.rd_data, g.asm
                        );
                    }
                    None => {
                        let _ = writeln!(out, "  GOLD: <no entry>");
                    }
                }
                match &self.rtl_at {
                    Some(r) => {
                        let _ = writeln!(
                            out,
                            "  RTL:  pc={:08x} rd=x{:02} data={:08x}  (line {})",
                            r.pc, r.rd, r.data, r.lineno
                        );
                    }
                    None => {
                        let _ = writeln!(out, "  RTL:  <no entry>");
                    }
                }
            }
            Verdict::EndedEarly { .. } => {
                let _ = writeln!(
                    out,
                    "FAIL: RTL commit stream ended early ({} of {} commits)",
                    self.rtl_len, self.golden_len
                );
                if let Some(g) = &self.golden_at {
                    let _ = writeln!(
                        out,
                        "  next GOLD: pc={:08x} rd=x{:02} data={:08x}  {}",
                        g.pc, g.rd, g.rd_data, g.asm
                    );
                }
                if let Some(r) = &self.rtl_at {
                    let _ = writeln!(
                        out,
                        "  last RTL:  pc={:08x} rd=x{:02} data={:08x}  (line {})",
                        r.pc, r.rd, r.data, r.lineno
                    );
                }
            }
        }
        if !self.context.is_empty() {
            let _ = writeln!(out, "Context:");
            for row in &self.context {
                let marker = if Some(row.index) == highlight { '>' } else { ' ' };
                let g = &row.golden;
                let rtl_side = match &row.rtl {
                    Some(r) => format!("{:08x} x{:02} {:08x}", r.pc, r.rd, r.data),
                    None => String::from("<no entry>"),
                };
                let _ = writeln!(
                    out,
                    "{} {:5}  GOLD {:08x} x{:02} {:08x}   RTL {}   {}",
                    marker, row.index, g.pc, g.rd, g.rd_data, rtl_side, g.asm
                );
            }
        }
        out
    }
}

/// Compares a golden commit trace against a parsed RTL commit log.
pub fn diff_commits(golden: &[CommitEntry], rtl: &CommitLog, radius: usize) -> DiffReport {
    let sims = &rtl.commits;
    let (verdict, center, golden_at, rtl_at) = match first_divergence(golden, sims) {
        None => {
            return DiffReport {
                verdict: Verdict::Match,
                golden_len: golden.len(),
                rtl_len: sims.len(),
                bad_lines: rtl.bad_lines,
                golden_at: None,
                rtl_at: None,
                context: Vec::new(),
            };
        }
        Some(i) => {
            let n = golden.len().min(sims.len());
            if i == n && sims.len() < golden.len() {
                (
                    Verdict::EndedEarly { index: i },
                    i.saturating_sub(1),
                    Some(golden[i].clone()),
                    sims.last().cloned(),
                )
            } else {
                (
                    Verdict::Mismatch { index: i },
                    i,
                    golden.get(i).cloned(),
                    sims.get(i).cloned(),
                )
            }
        }
    };

    let lo = center.saturating_sub(radius);
    let hi = golden.len().min(center + radius + 1);
    let mut context = Vec::with_capacity(hi.saturating_sub(lo));
    for index in lo..hi {
        context.push(ContextRow {
            index,
            golden: golden[index].clone(),
            rtl: sims.get(index).cloned(),
        });
    }

    DiffReport {
        verdict,
        golden_len: golden.len(),
        rtl_len: sims.len(),
        bad_lines: rtl.bad_lines,
        golden_at,
        rtl_at,
        context,
    }
}

/// First index where the streams disagree on `(pc, rd, data)`, or the
/// shorter length when one stream is a strict prefix of the other.
fn first_divergence(golden: &[CommitEntry], rtl: &[RtlCommit]) -> Option<usize> {
    let n = golden.len().min(rtl.len());
    for i in 0..n {
        let g = &golden[i];
        let r = &rtl[i];
        if (g.pc, g.rd, g.rd_data) != (r.pc, r.rd, r.data) {
            return Some(i);
        }
    }
    if golden.len() != rtl.len() {
        Some(n)
    } else {
        None
    }
}

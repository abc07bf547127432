// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Redirect-latency check for the front end.
//!
//! When the back end resolves a mispredicted branch it announces
//! `REDIRECT to=XXXXXXXX`, and the fetch stage must start delivering
//! micro-ops from that address within a bounded number of subsequently
//! decoded micro-ops (stale wrong-path uops that were already in
//! flight). A redirect announced while an earlier one is still pending
//! means the log itself violates the protocol, which aborts the check
//! rather than scoring it.

use serde::Serialize;

use crate::{VerifyError, VerifyResult};

/// Wrong-path micro-ops tolerated between a redirect and the first
/// fetch from its target.
pub const DEFAULT_MAX_LAT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedirectViolation {
    /// More than `max_lat` micro-ops decoded after the redirect without
    /// the target PC appearing.
    WindowExceeded {
        target: u32,
        announced_line: usize,
        line: usize,
    },
    /// The log ended while a redirect was still waiting for its target.
    PendingAtEof { target: u32, announced_line: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct RedirectReport {
    pub max_lat: u32,
    /// Redirect events seen, resolved or not.
    pub redirects: usize,
    /// Decoded micro-ops scanned (every line carrying a PC token).
    pub uops_scanned: usize,
    pub violation: Option<RedirectViolation>,
}

impl RedirectReport {
    pub fn passed(&self) -> bool {
        self.violation.is_none()
    }

    pub fn render(&self) -> String {
        match &self.violation {
            None => format!(
                "PASS: redirect behavior OK ({} redirect events checked, {} decoded uops scanned)",
                self.redirects, self.uops_scanned
            ),
            Some(RedirectViolation::WindowExceeded { target, line, .. }) => format!(
                "FAIL: did not observe redirected PC={:08x} within {} decoded uops (line {})",
                target, self.max_lat, line
            ),
            Some(RedirectViolation::PendingAtEof { target, .. }) => format!(
                "FAIL: log ended while redirect to PC={:08x} still pending",
                target
            ),
        }
    }
}

struct Pending {
    target: u32,
    budget: i64,
    announced_line: usize,
}

/// Scans a decode log for redirect events and checks each one is
/// honored within `max_lat` micro-ops. Stops at the first violation.
pub fn check_redirect_log(text: &str, max_lat: u32) -> VerifyResult<RedirectReport> {
    let mut report = RedirectReport {
        max_lat,
        redirects: 0,
        uops_scanned: 0,
        violation: None,
    };
    let mut pending: Option<Pending> = None;

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();

        if let Some(target) = parse_redirect(line) {
            if let Some(p) = &pending {
                return Err(VerifyError::NestedRedirect {
                    line: lineno,
                    pending: p.target,
                });
            }
            pending = Some(Pending {
                target,
                budget: max_lat as i64,
                announced_line: lineno,
            });
            report.redirects += 1;
            continue;
        }

        let pc = match find_pc_token(line) {
            Some(pc) => pc,
            None => continue,
        };
        report.uops_scanned += 1;

        if let Some(mut p) = pending.take() {
            if pc != p.target {
                p.budget -= 1;
                if p.budget < 0 {
                    tracing::warn!(
                        "redirect to {:#010x} (line {}) not honored by line {}",
                        p.target,
                        p.announced_line,
                        lineno
                    );
                    report.violation = Some(RedirectViolation::WindowExceeded {
                        target: p.target,
                        announced_line: p.announced_line,
                        line: lineno,
                    });
                    return Ok(report);
                }
                pending = Some(p);
            }
        }
    }

    if let Some(p) = pending {
        report.violation = Some(RedirectViolation::PendingAtEof {
            target: p.target,
            announced_line: p.announced_line,
        });
    }
    Ok(report)
}

/// Extracts the PC from a line containing a `PC=XXXXXXXX` token with
/// exactly eight hex digits, delimited on both sides by non-word
/// characters. Later candidates are tried if an earlier one is
/// malformed.
fn find_pc_token(line: &str) -> Option<u32> {
    let bytes = line.as_bytes();
    for (pos, _) in line.match_indices("PC=") {
        if pos > 0 {
            let prev = bytes[pos - 1];
            if prev.is_ascii_alphanumeric() || prev == b'_' {
                continue;
            }
        }
        let rest = &line[pos + 3..];
        if rest.len() < 8 {
            continue;
        }
        let (digits, tail) = rest.split_at(8);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            continue;
        }
        if let Some(&next) = tail.as_bytes().first() {
            if next.is_ascii_alphanumeric() || next == b'_' {
                continue;
            }
        }
        return u32::from_str_radix(digits, 16).ok();
    }
    None
}

/// Matches a whole (trimmed) line of the form `REDIRECT to=XXXXXXXX`.
fn parse_redirect(line: &str) -> Option<u32> {
    let after = line.strip_prefix("REDIRECT")?;
    if !after.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let hex = after.trim_start().strip_prefix("to=")?;
    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_honored_within_window() {
        let log = "\
PC=00000000 op=13
PC=00000004 op=13
REDIRECT to=00000040
PC=00000008 op=13
PC=00000040 op=13
PC=00000044 op=13
";
        let report = check_redirect_log(log, DEFAULT_MAX_LAT).unwrap();
        assert!(report.passed());
        assert_eq!(report.redirects, 1);
        assert_eq!(report.uops_scanned, 5);
        assert!(report.render().contains("PASS"));
    }

    #[test]
    fn test_match_on_last_allowed_uop_passes() {
        // Three wrong-path uops drain the budget to exactly zero; the
        // fourth fetch hits the target and still counts as on time.
        let log = "\
REDIRECT to=00000040
PC=00000008 op=13
PC=0000000c op=13
PC=00000010 op=13
PC=00000040 op=13
";
        let report = check_redirect_log(log, 3).unwrap();
        assert!(report.passed(), "{}", report.render());
    }

    #[test]
    fn test_window_exceeded_fails() {
        let log = "\
REDIRECT to=00000040
PC=00000008 op=13
PC=0000000c op=13
PC=00000010 op=13
PC=00000014 op=13
PC=00000040 op=13
";
        let report = check_redirect_log(log, 3).unwrap();
        assert_eq!(
            report.violation,
            Some(RedirectViolation::WindowExceeded {
                target: 0x40,
                announced_line: 1,
                line: 5,
            })
        );
        assert!(report.render().contains("within 3 decoded uops"));
    }

    #[test]
    fn test_pending_at_eof_fails() {
        let log = "\
PC=00000000 op=13
REDIRECT to=00000040
PC=00000008 op=13
";
        let report = check_redirect_log(log, 3).unwrap();
        assert_eq!(
            report.violation,
            Some(RedirectViolation::PendingAtEof {
                target: 0x40,
                announced_line: 2,
            })
        );
        assert!(report.render().contains("still pending"));
    }

    #[test]
    fn test_nested_redirect_is_protocol_error() {
        let log = "\
REDIRECT to=00000040
PC=00000008 op=13
REDIRECT to=00000080
";
        let err = check_redirect_log(log, 3).unwrap_err();
        match err {
            VerifyError::NestedRedirect { line, pending } => {
                assert_eq!(line, 3);
                assert_eq!(pending, 0x40);
            }
        }
    }

    #[test]
    fn test_lines_without_pc_do_not_consume_budget() {
        let log = "\
REDIRECT to=00000040
cycle 100 flush front end
cycle 101 refill
cycle 102 refill
cycle 103 refill
PC=00000040 op=13
";
        let report = check_redirect_log(log, 0).unwrap();
        assert!(report.passed(), "{}", report.render());
        assert_eq!(report.uops_scanned, 1);
    }

    #[test]
    fn test_pc_token_extraction() {
        // Embedded in a longer line.
        assert_eq!(
            find_pc_token("uop  PC=00000040 op=13 rd=1"),
            Some(0x40)
        );
        // Lowercase hex.
        assert_eq!(find_pc_token("PC=deadbeef"), Some(0xDEAD_BEEF));
        // Joined to a preceding word character: not a token.
        assert_eq!(find_pc_token("GPC=00000040"), None);
        // Too few digits, or a ninth word character after them.
        assert_eq!(find_pc_token("PC=0000040"), None);
        assert_eq!(find_pc_token("PC=000000400"), None);
        assert_eq!(find_pc_token("PC=00000040Z"), None);
        // Trailing punctuation is a valid delimiter.
        assert_eq!(find_pc_token("PC=00000040,"), Some(0x40));
    }

    #[test]
    fn test_redirect_line_shape() {
        assert_eq!(parse_redirect("REDIRECT to=00000040"), Some(0x40));
        assert_eq!(parse_redirect("REDIRECT   to=00000040"), Some(0x40));
        assert_eq!(parse_redirect("REDIRECTto=00000040"), None);
        assert_eq!(parse_redirect("REDIRECT to=0000004"), None);
        assert_eq!(parse_redirect("REDIRECT to=00000040 extra"), None);
    }

    #[test]
    fn test_multiple_redirects_counted() {
        let log = "\
REDIRECT to=00000040
PC=00000040 op=13
REDIRECT to=00000080
PC=00000080 op=13
";
        let report = check_redirect_log(log, 3).unwrap();
        assert!(report.passed());
        assert_eq!(report.redirects, 2);
    }
}

// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Validators that compare hardware logs against the golden model.
//!
//! Three independent checks live here, one per log family the RTL
//! testbench emits:
//!
//! * [`diff`] lines up a JSONL commit log against a golden commit trace
//!   and reports the first divergence with surrounding context.
//! * [`decode_log`] re-decodes every fetched instruction from the program
//!   image and checks the decoder fields the RTL claims it extracted.
//! * [`redirect`] checks that every front-end redirect is honored within
//!   a bounded number of subsequently decoded micro-ops.
//!
//! All checkers are pure functions over in-memory text. File handling,
//! exit codes and report serialization belong to the caller.

pub mod commit;
pub mod decode_log;
pub mod diff;
pub mod redirect;

use thiserror::Error;

/// Errors that abort a verification run outright, as opposed to a
/// verdict of "the hardware diverged". A malformed protocol in the log
/// itself (for example a redirect announced on top of a pending one)
/// is not a mismatch the comparator can score, so it surfaces here.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// A redirect was announced while an earlier one was still pending.
    #[error("redirect at line {line} while redirect to {pending:#010x} is still pending")]
    NestedRedirect { line: usize, pending: u32 },
}

pub type VerifyResult<T> = Result<T, VerifyError>;

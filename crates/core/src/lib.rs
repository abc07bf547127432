// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod asm;
pub mod image;
pub mod isa;
pub mod mem;
pub mod sim;
pub mod trace;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Malformed image line {line}: {token:?}")]
    MalformedImage { line: usize, token: String },
    #[error("Illegal instruction {word:#010x} at {pc:#010x}")]
    IllegalInstruction { pc: u32, word: u32 },
    #[error("Executed data word {word:#010x} at {pc:#010x}")]
    ExecutedData { pc: u32, word: u32 },
    #[error("Unresolved branch/jump target at {pc:#010x}")]
    UnresolvedTarget { pc: u32 },
    #[error("Data memory limit exceeded at {addr:#010x}: {touched} bytes touched, limit is {limit}")]
    MemoryLimit {
        addr: u32,
        touched: usize,
        limit: usize,
    },
    #[error("Duplicate label {0:?}")]
    DuplicateLabel(String),
    #[error("Undefined label {0:?}")]
    UndefinedLabel(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

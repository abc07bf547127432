// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Sparse byte-addressed data memory.
//!
//! Test programs scatter stores across the full 32-bit address space,
//! so memory is a map of touched bytes rather than a flat array.
//! Reads of untouched bytes return zero and never allocate; only
//! stores count against the touched-byte limit.

use std::collections::HashMap;

use crate::{OracleError, OracleResult};

/// Default cap on distinct touched bytes. Generous for test programs,
/// small enough to stop a runaway store loop from eating the host.
pub const DEFAULT_MEM_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SparseMemory {
    bytes: HashMap<u32, u8>,
    limit: usize,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MEM_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            bytes: HashMap::new(),
            limit,
        }
    }

    pub fn read_u8(&self, addr: u32) -> u8 {
        self.bytes.get(&addr).copied().unwrap_or(0)
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> OracleResult<()> {
        if !self.bytes.contains_key(&addr) && self.bytes.len() >= self.limit {
            return Err(OracleError::MemoryLimit {
                addr,
                touched: self.bytes.len(),
                limit: self.limit,
            });
        }
        self.bytes.insert(addr, value);
        Ok(())
    }

    /// Little-endian read of `size` bytes (1, 2 or 4). Addresses wrap
    /// at the 32-bit boundary; alignment is not required.
    pub fn read(&self, addr: u32, size: u32) -> u32 {
        let mut value = 0u32;
        for i in 0..size {
            value |= (self.read_u8(addr.wrapping_add(i)) as u32) << (8 * i);
        }
        value
    }

    /// Little-endian write of the low `size` bytes of `value`.
    pub fn write(&mut self, addr: u32, size: u32, value: u32) -> OracleResult<()> {
        for i in 0..size {
            self.write_u8(addr.wrapping_add(i), (value >> (8 * i)) as u8)?;
        }
        Ok(())
    }

    pub fn touched_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl Default for SparseMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_reads_are_zero() {
        let mem = SparseMemory::new();
        assert_eq!(mem.read_u8(0), 0);
        assert_eq!(mem.read(0xFFFF0000, 4), 0);
        assert_eq!(mem.touched_bytes(), 0);
    }

    #[test]
    fn test_little_endian_word_round_trip() {
        let mut mem = SparseMemory::new();
        mem.write(0x100, 4, 0xDEADBEEF).unwrap();
        assert_eq!(mem.read(0x100, 4), 0xDEADBEEF);
        assert_eq!(mem.read_u8(0x100), 0xEF);
        assert_eq!(mem.read_u8(0x101), 0xBE);
        assert_eq!(mem.read_u8(0x102), 0xAD);
        assert_eq!(mem.read_u8(0x103), 0xDE);
        assert_eq!(mem.touched_bytes(), 4);
    }

    #[test]
    fn test_unaligned_halfword_access() {
        let mut mem = SparseMemory::new();
        mem.write(0x101, 2, 0xABCD).unwrap();
        assert_eq!(mem.read(0x101, 2), 0xABCD);
        // Bytes land at 0x101/0x102, so a word read at 0x100 sees them
        // shifted up one byte.
        assert_eq!(mem.read(0x100, 4), 0x00ABCD00);
    }

    #[test]
    fn test_address_wraparound() {
        let mut mem = SparseMemory::new();
        mem.write(0xFFFFFFFF, 2, 0x1234).unwrap();
        assert_eq!(mem.read_u8(0xFFFFFFFF), 0x34);
        assert_eq!(mem.read_u8(0x00000000), 0x12);
    }

    #[test]
    fn test_touched_byte_limit() {
        let mut mem = SparseMemory::with_limit(2);
        mem.write_u8(0, 1).unwrap();
        mem.write_u8(1, 2).unwrap();
        // Rewriting an existing byte is fine at the limit.
        mem.write_u8(0, 3).unwrap();
        let err = mem.write_u8(2, 4).unwrap_err();
        match err {
            OracleError::MemoryLimit {
                addr,
                touched,
                limit,
            } => {
                assert_eq!(addr, 2);
                assert_eq!(touched, 2);
                assert_eq!(limit, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

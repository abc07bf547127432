// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bit-level encode/decode for the six RV32I instruction formats.
//!
//! Encoders take already-validated field values and pack them; the
//! `imm_*` extractors are their exact inverses over the legal ranges
//! (I/S: -2048..=2047, B: even offsets in -4096..=4094, U: any 20-bit
//! upper immediate, J: even offsets in -1048576..=1048574).

/// Sign-extend the low `bits` bits of `value`.
pub fn sext(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

pub fn encode_r(opcode: u32, funct3: u32, funct7: u32, rd: u8, rs1: u8, rs2: u8) -> u32 {
    (funct7 << 25)
        | (((rs2 as u32) & 0x1F) << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | (funct3 << 12)
        | (((rd as u32) & 0x1F) << 7)
        | opcode
}

pub fn encode_i(opcode: u32, funct3: u32, rd: u8, rs1: u8, imm: i32) -> u32 {
    let imm = (imm as u32) & 0xFFF;
    (imm << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | (funct3 << 12)
        | (((rd as u32) & 0x1F) << 7)
        | opcode
}

pub fn encode_s(opcode: u32, funct3: u32, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = (imm as u32) & 0xFFF;
    ((imm >> 5) << 25)
        | (((rs2 as u32) & 0x1F) << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | (funct3 << 12)
        | ((imm & 0x1F) << 7)
        | opcode
}

/// B-format immediate is a 13-bit signed byte offset with bit 0 zero,
/// scattered as imm[12|10:5] / imm[4:1|11].
pub fn encode_b(opcode: u32, funct3: u32, rs1: u8, rs2: u8, offset: i32) -> u32 {
    let imm = (offset as u32) & 0x1FFE;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3F) << 25)
        | (((rs2 as u32) & 0x1F) << 20)
        | (((rs1 as u32) & 0x1F) << 15)
        | (funct3 << 12)
        | (((imm >> 1) & 0xF) << 8)
        | (((imm >> 11) & 0x1) << 7)
        | opcode
}

pub fn encode_u(opcode: u32, rd: u8, imm20: u32) -> u32 {
    ((imm20 & 0xFFFFF) << 12) | (((rd as u32) & 0x1F) << 7) | opcode
}

/// J-format immediate is a 21-bit signed byte offset with bit 0 zero,
/// scattered as imm[20|10:1|11|19:12].
pub fn encode_j(opcode: u32, rd: u8, offset: i32) -> u32 {
    let imm = (offset as u32) & 0x1FFFFE;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3FF) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xFF) << 12)
        | (((rd as u32) & 0x1F) << 7)
        | opcode
}

pub fn imm_i(word: u32) -> i32 {
    sext(word >> 20, 12)
}

pub fn imm_s(word: u32) -> i32 {
    sext(((word >> 25) << 5) | ((word >> 7) & 0x1F), 12)
}

pub fn imm_b(word: u32) -> i32 {
    let imm = (((word >> 31) & 0x1) << 12)
        | (((word >> 7) & 0x1) << 11)
        | (((word >> 25) & 0x3F) << 5)
        | (((word >> 8) & 0xF) << 1);
    sext(imm, 13)
}

/// Returns the already-shifted upper immediate, i.e. `word & 0xFFFFF000`.
pub fn imm_u(word: u32) -> u32 {
    word & 0xFFFFF000
}

pub fn imm_j(word: u32) -> i32 {
    let imm = (((word >> 31) & 0x1) << 20)
        | (((word >> 12) & 0xFF) << 12)
        | (((word >> 20) & 0x1) << 11)
        | (((word >> 21) & 0x3FF) << 1);
    sext(imm, 21)
}

/// Re-encode a branch word with a new byte offset, keeping opcode,
/// funct3 and both source registers.
pub fn patch_b_offset(word: u32, offset: i32) -> u32 {
    let opcode = word & 0x7F;
    let funct3 = (word >> 12) & 0x7;
    let rs1 = ((word >> 15) & 0x1F) as u8;
    let rs2 = ((word >> 20) & 0x1F) as u8;
    encode_b(opcode, funct3, rs1, rs2, offset)
}

/// Re-encode a JAL word with a new byte offset, keeping opcode and rd.
pub fn patch_j_offset(word: u32, offset: i32) -> u32 {
    let opcode = word & 0x7F;
    let rd = ((word >> 7) & 0x1F) as u8;
    encode_j(opcode, rd, offset)
}

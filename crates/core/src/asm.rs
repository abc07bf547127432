// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Minimal in-crate assembler for building directed test programs.
//!
//! Emits raw words through the codec; branches and JAL may name labels
//! that are only defined later, and `finalize` patches the queued
//! placeholder encodings once every label PC is known.

use std::collections::HashMap;

use crate::image::ProgramImage;
use crate::isa::codec;
use crate::{OracleError, OracleResult};

enum FixupKind {
    Branch,
    Jal,
}

struct Fixup {
    index: usize,
    kind: FixupKind,
    label: String,
}

#[derive(Default)]
pub struct ProgramBuilder {
    words: Vec<u32>,
    labels: HashMap<String, u32>,
    fixups: Vec<Fixup>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// PC of the next emitted instruction.
    pub fn pc(&self) -> u32 {
        (self.words.len() as u32) * 4
    }

    pub fn label(&mut self, name: &str) -> OracleResult<()> {
        if self.labels.contains_key(name) {
            return Err(OracleError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), self.pc());
        Ok(())
    }

    fn push(&mut self, word: u32) {
        self.words.push(word);
    }

    // U-type
    pub fn lui(&mut self, rd: u8, imm20: u32) {
        self.push(codec::encode_u(0x37, rd, imm20));
    }

    pub fn auipc(&mut self, rd: u8, imm20: u32) {
        self.push(codec::encode_u(0x17, rd, imm20));
    }

    // I-type ALU
    pub fn addi(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x13, 0x0, rd, rs1, imm));
    }

    pub fn slti(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x13, 0x2, rd, rs1, imm));
    }

    pub fn sltiu(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x13, 0x3, rd, rs1, imm));
    }

    pub fn xori(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x13, 0x4, rd, rs1, imm));
    }

    pub fn ori(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x13, 0x6, rd, rs1, imm));
    }

    pub fn andi(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x13, 0x7, rd, rs1, imm));
    }

    pub fn slli(&mut self, rd: u8, rs1: u8, sh: u8) {
        self.push(codec::encode_i(0x13, 0x1, rd, rs1, (sh & 0x1F) as i32));
    }

    pub fn srli(&mut self, rd: u8, rs1: u8, sh: u8) {
        self.push(codec::encode_i(0x13, 0x5, rd, rs1, (sh & 0x1F) as i32));
    }

    pub fn srai(&mut self, rd: u8, rs1: u8, sh: u8) {
        self.push(codec::encode_i(
            0x13,
            0x5,
            rd,
            rs1,
            (0x20 << 5) | ((sh & 0x1F) as i32),
        ));
    }

    // R-type
    pub fn add(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x0, 0x00, rd, rs1, rs2));
    }

    pub fn sub(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x0, 0x20, rd, rs1, rs2));
    }

    pub fn sll(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x1, 0x00, rd, rs1, rs2));
    }

    pub fn slt(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x2, 0x00, rd, rs1, rs2));
    }

    pub fn sltu(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x3, 0x00, rd, rs1, rs2));
    }

    pub fn xor(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x4, 0x00, rd, rs1, rs2));
    }

    pub fn srl(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x5, 0x00, rd, rs1, rs2));
    }

    pub fn sra(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x5, 0x20, rd, rs1, rs2));
    }

    pub fn or(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x6, 0x00, rd, rs1, rs2));
    }

    pub fn and(&mut self, rd: u8, rs1: u8, rs2: u8) {
        self.push(codec::encode_r(0x33, 0x7, 0x00, rd, rs1, rs2));
    }

    // Loads
    pub fn lb(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x03, 0x0, rd, rs1, imm));
    }

    pub fn lh(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x03, 0x1, rd, rs1, imm));
    }

    pub fn lw(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x03, 0x2, rd, rs1, imm));
    }

    pub fn lbu(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x03, 0x4, rd, rs1, imm));
    }

    pub fn lhu(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x03, 0x5, rd, rs1, imm));
    }

    // Stores
    pub fn sb(&mut self, rs2: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_s(0x23, 0x0, rs1, rs2, imm));
    }

    pub fn sh(&mut self, rs2: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_s(0x23, 0x1, rs1, rs2, imm));
    }

    pub fn sw(&mut self, rs2: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_s(0x23, 0x2, rs1, rs2, imm));
    }

    // Control flow
    pub fn jalr(&mut self, rd: u8, rs1: u8, imm: i32) {
        self.push(codec::encode_i(0x67, 0x0, rd, rs1, imm));
    }

    pub fn jal(&mut self, rd: u8, label: &str) {
        self.fixups.push(Fixup {
            index: self.words.len(),
            kind: FixupKind::Jal,
            label: label.to_string(),
        });
        self.push(codec::encode_j(0x6F, rd, 0));
    }

    fn branch(&mut self, funct3: u32, rs1: u8, rs2: u8, label: &str) {
        self.fixups.push(Fixup {
            index: self.words.len(),
            kind: FixupKind::Branch,
            label: label.to_string(),
        });
        self.push(codec::encode_b(0x63, funct3, rs1, rs2, 0));
    }

    pub fn beq(&mut self, rs1: u8, rs2: u8, label: &str) {
        self.branch(0x0, rs1, rs2, label);
    }

    pub fn bne(&mut self, rs1: u8, rs2: u8, label: &str) {
        self.branch(0x1, rs1, rs2, label);
    }

    pub fn blt(&mut self, rs1: u8, rs2: u8, label: &str) {
        self.branch(0x4, rs1, rs2, label);
    }

    pub fn bge(&mut self, rs1: u8, rs2: u8, label: &str) {
        self.branch(0x5, rs1, rs2, label);
    }

    pub fn bltu(&mut self, rs1: u8, rs2: u8, label: &str) {
        self.branch(0x6, rs1, rs2, label);
    }

    pub fn bgeu(&mut self, rs1: u8, rs2: u8, label: &str) {
        self.branch(0x7, rs1, rs2, label);
    }

    /// Canonical nop, `addi x0, x0, 0`.
    pub fn nop(&mut self) {
        self.addi(0, 0, 0);
    }

    /// Embed a raw data word at the current position.
    pub fn data_word(&mut self, raw: u32) {
        self.push(raw);
    }

    /// Load a full 32-bit constant with LUI+ADDI. ADDI sign-extends
    /// its 12-bit immediate, so when bit 11 of the low part is set the
    /// upper part is bumped by one to compensate.
    pub fn li(&mut self, rd: u8, value: u32) {
        let mut upper = (value >> 12) & 0xFFFFF;
        let lower = value & 0xFFF;
        if lower & 0x800 != 0 {
            upper = (upper + 1) & 0xFFFFF;
        }
        if upper != 0 {
            self.lui(rd, upper);
            if lower != 0 {
                self.addi(rd, rd, codec::sext(lower, 12));
            }
        } else {
            self.addi(rd, 0, codec::sext(lower, 12));
        }
    }

    /// Resolve all queued label fixups and hand back the image.
    pub fn finalize(mut self) -> OracleResult<ProgramImage> {
        for fixup in &self.fixups {
            let target = *self
                .labels
                .get(&fixup.label)
                .ok_or_else(|| OracleError::UndefinedLabel(fixup.label.clone()))?;
            let pc = (fixup.index as u32) * 4;
            let offset = target.wrapping_sub(pc) as i32;
            let word = self.words[fixup.index];
            self.words[fixup.index] = match fixup.kind {
                FixupKind::Branch => codec::patch_b_offset(word, offset),
                FixupKind::Jal => codec::patch_j_offset(word, offset),
            };
        }
        Ok(ProgramImage::from_words(self.words))
    }
}

// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The golden decoder: raw words to operation tags, register fields,
//! immediates and disassembly text. Every consumer of instruction
//! semantics (executor, decode checker, trace tooling) goes through
//! this table so they cannot drift apart.

use crate::image::ProgramImage;
use crate::isa::{codec, Op};
use crate::{OracleError, OracleResult};

/// Decoded instruction fields.
///
/// Field conventions follow the commit-trace contract rather than the
/// raw bit layout: unused register fields are zero (e.g. `rd` of a
/// branch or store), `imm` holds the 20-bit upper-immediate value for
/// LUI/AUIPC, the 5-bit shift amount for immediate shifts, and the
/// sign-extended immediate otherwise. Branches and JAL resolve
/// `target_pc` eagerly from the decode-time PC; JALR leaves it `None`
/// because its target depends on a register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInst {
    pub op: Op,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i32,
    pub target_pc: Option<u32>,
}

fn make(op: Op, rd: u8, rs1: u8, rs2: u8, imm: i32, target_pc: Option<u32>) -> DecodedInst {
    DecodedInst {
        op,
        rd,
        rs1,
        rs2,
        imm,
        target_pc,
    }
}

/// Decode one word fetched from `pc`. The all-zero word is a `Nop`;
/// anything that is not valid RV32I is an `IllegalInstruction` error.
pub fn decode(word: u32, pc: u32) -> OracleResult<(DecodedInst, String)> {
    if word == 0 {
        return Ok((make(Op::Nop, 0, 0, 0, 0, None), "nop".to_string()));
    }

    let opcode = word & 0x7F;
    let rd = ((word >> 7) & 0x1F) as u8;
    let funct3 = (word >> 12) & 0x7;
    let rs1 = ((word >> 15) & 0x1F) as u8;
    let rs2 = ((word >> 20) & 0x1F) as u8;
    let funct7 = (word >> 25) & 0x7F;

    match opcode {
        0x37 => {
            // LUI
            let imm = (codec::imm_u(word) >> 12) as i32;
            Ok((
                make(Op::Lui, rd, 0, 0, imm, None),
                format!("lui x{}, 0x{:x}", rd, imm),
            ))
        }
        0x17 => {
            // AUIPC
            let imm = (codec::imm_u(word) >> 12) as i32;
            Ok((
                make(Op::Auipc, rd, 0, 0, imm, None),
                format!("auipc x{}, 0x{:x}", rd, imm),
            ))
        }
        0x6F => {
            // JAL
            let off = codec::imm_j(word);
            let target = pc.wrapping_add(off as u32);
            Ok((
                make(Op::Jal, rd, 0, 0, 0, Some(target)),
                format!("jal x{}, {:+}", rd, off),
            ))
        }
        0x67 if funct3 == 0x0 => {
            // JALR
            let imm = codec::imm_i(word);
            Ok((
                make(Op::Jalr, rd, rs1, 0, imm, None),
                format!("jalr x{}, {}(x{})", rd, imm, rs1),
            ))
        }
        0x63 => {
            let off = codec::imm_b(word);
            let target = pc.wrapping_add(off as u32);
            let (op, name) = match funct3 {
                0x0 => (Op::Beq, "beq"),
                0x1 => (Op::Bne, "bne"),
                0x4 => (Op::Blt, "blt"),
                0x5 => (Op::Bge, "bge"),
                0x6 => (Op::Bltu, "bltu"),
                0x7 => (Op::Bgeu, "bgeu"),
                _ => return Err(OracleError::IllegalInstruction { pc, word }),
            };
            Ok((
                make(op, 0, rs1, rs2, 0, Some(target)),
                format!("{} x{}, x{}, {:+}", name, rs1, rs2, off),
            ))
        }
        0x03 => {
            let imm = codec::imm_i(word);
            let (op, name) = match funct3 {
                0x0 => (Op::Lb, "lb"),
                0x1 => (Op::Lh, "lh"),
                0x2 => (Op::Lw, "lw"),
                0x4 => (Op::Lbu, "lbu"),
                0x5 => (Op::Lhu, "lhu"),
                _ => return Err(OracleError::IllegalInstruction { pc, word }),
            };
            Ok((
                make(op, rd, rs1, 0, imm, None),
                format!("{} x{}, {}(x{})", name, rd, imm, rs1),
            ))
        }
        0x23 => {
            let imm = codec::imm_s(word);
            let (op, name) = match funct3 {
                0x0 => (Op::Sb, "sb"),
                0x1 => (Op::Sh, "sh"),
                0x2 => (Op::Sw, "sw"),
                _ => return Err(OracleError::IllegalInstruction { pc, word }),
            };
            Ok((
                make(op, 0, rs1, rs2, imm, None),
                format!("{} x{}, {}(x{})", name, rs2, imm, rs1),
            ))
        }
        0x13 => {
            match funct3 {
                0x1 | 0x5 => {
                    // Immediate shifts: shamt lives in the rs2 field and
                    // funct7 discriminates SRLI from SRAI.
                    let sh = ((word >> 20) & 0x1F) as i32;
                    let (op, name) = match (funct3, funct7) {
                        (0x1, 0x00) => (Op::Slli, "slli"),
                        (0x5, 0x00) => (Op::Srli, "srli"),
                        (0x5, 0x20) => (Op::Srai, "srai"),
                        _ => return Err(OracleError::IllegalInstruction { pc, word }),
                    };
                    Ok((
                        make(op, rd, rs1, 0, sh, None),
                        format!("{} x{}, x{}, {}", name, rd, rs1, sh),
                    ))
                }
                _ => {
                    let imm = codec::imm_i(word);
                    let (op, name) = match funct3 {
                        0x0 => (Op::Addi, "addi"),
                        0x2 => (Op::Slti, "slti"),
                        0x3 => (Op::Sltiu, "sltiu"),
                        0x4 => (Op::Xori, "xori"),
                        0x6 => (Op::Ori, "ori"),
                        0x7 => (Op::Andi, "andi"),
                        _ => return Err(OracleError::IllegalInstruction { pc, word }),
                    };
                    Ok((
                        make(op, rd, rs1, 0, imm, None),
                        format!("{} x{}, x{}, {}", name, rd, rs1, imm),
                    ))
                }
            }
        }
        0x33 => {
            let (op, name) = match (funct3, funct7) {
                (0x0, 0x00) => (Op::Add, "add"),
                (0x0, 0x20) => (Op::Sub, "sub"),
                (0x1, 0x00) => (Op::Sll, "sll"),
                (0x2, 0x00) => (Op::Slt, "slt"),
                (0x3, 0x00) => (Op::Sltu, "sltu"),
                (0x4, 0x00) => (Op::Xor, "xor"),
                (0x5, 0x00) => (Op::Srl, "srl"),
                (0x5, 0x20) => (Op::Sra, "sra"),
                (0x6, 0x00) => (Op::Or, "or"),
                (0x7, 0x00) => (Op::And, "and"),
                _ => return Err(OracleError::IllegalInstruction { pc, word }),
            };
            Ok((
                make(op, rd, rs1, rs2, 0, None),
                format!("{} x{}, x{}, x{}", name, rd, rs1, rs2),
            ))
        }
        _ => Err(OracleError::IllegalInstruction { pc, word }),
    }
}

/// How to treat words that fail to decode when preparing a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Undecodable words become `Op::Data` slots; only executing one
    /// is an error. This is what raw hex dumps need, since they mix
    /// code and data freely.
    #[default]
    Lenient,
    /// Any undecodable word fails the whole program up front.
    Strict,
}

/// One image word with its decode, indexed by `pc / 4`.
#[derive(Debug, Clone)]
pub struct Slot {
    pub word: u32,
    pub inst: DecodedInst,
    pub asm: String,
}

/// A fully pre-decoded program, the executor's input.
#[derive(Debug, Clone, Default)]
pub struct DecodedProgram {
    slots: Vec<Slot>,
}

impl DecodedProgram {
    pub fn from_image(image: &ProgramImage, policy: DecodePolicy) -> OracleResult<Self> {
        let mut slots = Vec::with_capacity(image.len());
        for (i, &word) in image.words().iter().enumerate() {
            let pc = (i as u32) * 4;
            let slot = match decode(word, pc) {
                Ok((inst, asm)) => Slot { word, inst, asm },
                Err(err) => match policy {
                    DecodePolicy::Lenient => Slot {
                        word,
                        inst: make(Op::Data, 0, 0, 0, 0, None),
                        asm: format!(".word 0x{:08x}", word),
                    },
                    DecodePolicy::Strict => return Err(err),
                },
            };
            slots.push(slot);
        }
        Ok(Self { slots })
    }

    /// Slot holding `pc`, or `None` when `pc` is unaligned or outside
    /// the image. Programs are based at zero.
    pub fn slot_at(&self, pc: u32) -> Option<&Slot> {
        if pc % 4 != 0 {
            return None;
        }
        self.slots.get((pc / 4) as usize)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod codec;
pub mod decode;

pub use decode::{decode, DecodePolicy, DecodedInst, DecodedProgram, Slot};

/// Operation tags for the RV32I base set, plus two pseudo-tags: `Nop`
/// for the all-zero word and `Data` for image words that decode to
/// nothing but are still addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Op {
    Lui,
    Auipc,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Nop,
    Data,
}

impl Op {
    /// True for ops whose first source operand is a register read.
    pub fn uses_rs1(self) -> bool {
        !matches!(self, Op::Lui | Op::Auipc | Op::Jal | Op::Nop | Op::Data)
    }

    /// True for ops whose second source operand is a register read.
    pub fn uses_rs2(self) -> bool {
        matches!(
            self,
            Op::Add
                | Op::Sub
                | Op::Sll
                | Op::Slt
                | Op::Sltu
                | Op::Xor
                | Op::Srl
                | Op::Sra
                | Op::Or
                | Op::And
                | Op::Sb
                | Op::Sh
                | Op::Sw
                | Op::Beq
                | Op::Bne
                | Op::Blt
                | Op::Bge
                | Op::Bltu
                | Op::Bgeu
        )
    }

    /// True for ops that architecturally write a destination register.
    /// Branches and stores never do; `rd` is forced to zero for them.
    pub fn writes_rd(self) -> bool {
        !matches!(
            self,
            Op::Beq
                | Op::Bne
                | Op::Blt
                | Op::Bge
                | Op::Bltu
                | Op::Bgeu
                | Op::Sb
                | Op::Sh
                | Op::Sw
                | Op::Nop
                | Op::Data
        )
    }

    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu
        )
    }
}

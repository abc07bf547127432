// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! In-order reference executor.
//!
//! Runs a pre-decoded program one instruction at a time and records a
//! commit entry per retired instruction. The commit order defines the
//! golden trace an out-of-order implementation must match at its
//! retirement stage.

use crate::image::ProgramImage;
use crate::isa::codec;
use crate::isa::decode::{DecodePolicy, DecodedInst, DecodedProgram, Slot};
use crate::isa::Op;
use crate::mem::{SparseMemory, DEFAULT_MEM_LIMIT};
use crate::trace::CommitEntry;
use crate::{OracleError, OracleResult};

/// Library default step budget. The trace generator CLI raises this
/// for long-running directed tests.
pub const DEFAULT_MAX_STEPS: u64 = 200_000;

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub max_steps: u64,
    pub decode_policy: DecodePolicy,
    pub mem_limit: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            decode_policy: DecodePolicy::default(),
            mem_limit: DEFAULT_MEM_LIMIT,
        }
    }
}

/// Why a run stopped. Neither reason is an error: walking off the end
/// of the image is how test programs normally terminate, and hitting
/// the step budget yields a usable (if truncated) trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    PcOutOfImage,
    StepBudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub trace: Vec<CommitEntry>,
    pub regs: [u32; 32],
    pub stop: StopReason,
    pub steps: u64,
}

struct CoreState {
    regs: [u32; 32],
    mem: SparseMemory,
    pc: u32,
}

pub struct Engine {
    program: DecodedProgram,
    state: CoreState,
    cycle: u64,
}

impl Engine {
    pub fn new(program: DecodedProgram) -> Self {
        Self::with_memory(program, SparseMemory::new())
    }

    pub fn with_memory(program: DecodedProgram, mem: SparseMemory) -> Self {
        Self {
            program,
            state: CoreState {
                regs: [0; 32],
                mem,
                pc: 0,
            },
            cycle: 0,
        }
    }

    pub fn run(mut self, max_steps: u64) -> OracleResult<RunResult> {
        let mut trace = Vec::new();
        let stop = loop {
            if self.cycle >= max_steps {
                tracing::warn!(
                    "step budget exhausted after {} commits at pc={:#010x}",
                    self.cycle,
                    self.state.pc
                );
                break StopReason::StepBudgetExhausted;
            }
            let slot = match self.program.slot_at(self.state.pc) {
                Some(slot) => slot,
                None => break StopReason::PcOutOfImage,
            };
            let pc = self.state.pc;
            let (rd, rd_data) = self.state.execute(slot)?;
            tracing::debug!("commit {:6} pc={:08x} {}", self.cycle, pc, slot.asm);
            trace.push(CommitEntry {
                cycle: self.cycle,
                pc,
                inst: slot.word,
                rd,
                rd_data,
                asm: slot.asm.clone(),
            });
            self.cycle += 1;
        };
        Ok(RunResult {
            trace,
            regs: self.state.regs,
            stop,
            steps: self.cycle,
        })
    }
}

impl CoreState {
    fn reg(&self, n: u8) -> u32 {
        self.regs[n as usize]
    }

    // x0 is hardwired to zero; writes to it vanish.
    fn write_reg(&mut self, rd: u8, value: u32) {
        if rd != 0 {
            self.regs[rd as usize] = value;
        }
    }

    fn branch_target(&self, inst: &DecodedInst) -> OracleResult<u32> {
        inst.target_pc
            .ok_or(OracleError::UnresolvedTarget { pc: self.pc })
    }

    /// Execute one instruction, returning `(rd, rd_data)` for the
    /// commit entry. `rd_data` is read back after the write so the x0
    /// clamp is already applied.
    fn execute(&mut self, slot: &Slot) -> OracleResult<(u8, u32)> {
        let inst = &slot.inst;
        let mut next_pc = self.pc.wrapping_add(4);

        match inst.op {
            Op::Lui => {
                self.write_reg(inst.rd, ((inst.imm as u32) & 0xFFFFF) << 12);
            }
            Op::Auipc => {
                let value = self.pc.wrapping_add(((inst.imm as u32) & 0xFFFFF) << 12);
                self.write_reg(inst.rd, value);
            }
            Op::Jal => {
                let target = self.branch_target(inst)?;
                self.write_reg(inst.rd, self.pc.wrapping_add(4));
                next_pc = target;
            }
            Op::Jalr => {
                // Target is computed before the link write so that
                // rd == rs1 behaves; bit 0 is always cleared.
                let target = self.reg(inst.rs1).wrapping_add(inst.imm as u32) & !1;
                self.write_reg(inst.rd, self.pc.wrapping_add(4));
                next_pc = target;
            }
            Op::Beq => {
                if self.reg(inst.rs1) == self.reg(inst.rs2) {
                    next_pc = self.branch_target(inst)?;
                }
            }
            Op::Bne => {
                if self.reg(inst.rs1) != self.reg(inst.rs2) {
                    next_pc = self.branch_target(inst)?;
                }
            }
            Op::Blt => {
                if (self.reg(inst.rs1) as i32) < (self.reg(inst.rs2) as i32) {
                    next_pc = self.branch_target(inst)?;
                }
            }
            Op::Bge => {
                if (self.reg(inst.rs1) as i32) >= (self.reg(inst.rs2) as i32) {
                    next_pc = self.branch_target(inst)?;
                }
            }
            Op::Bltu => {
                if self.reg(inst.rs1) < self.reg(inst.rs2) {
                    next_pc = self.branch_target(inst)?;
                }
            }
            Op::Bgeu => {
                if self.reg(inst.rs1) >= self.reg(inst.rs2) {
                    next_pc = self.branch_target(inst)?;
                }
            }
            Op::Lb => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                let value = self.mem.read(addr, 1);
                self.write_reg(inst.rd, codec::sext(value, 8) as u32);
            }
            Op::Lh => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                let value = self.mem.read(addr, 2);
                self.write_reg(inst.rd, codec::sext(value, 16) as u32);
            }
            Op::Lw => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                let value = self.mem.read(addr, 4);
                self.write_reg(inst.rd, value);
            }
            Op::Lbu => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                let value = self.mem.read(addr, 1);
                self.write_reg(inst.rd, value);
            }
            Op::Lhu => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                let value = self.mem.read(addr, 2);
                self.write_reg(inst.rd, value);
            }
            Op::Sb => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                self.mem.write(addr, 1, self.reg(inst.rs2))?;
            }
            Op::Sh => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                self.mem.write(addr, 2, self.reg(inst.rs2))?;
            }
            Op::Sw => {
                let addr = self.reg(inst.rs1).wrapping_add(inst.imm as u32);
                self.mem.write(addr, 4, self.reg(inst.rs2))?;
            }
            Op::Addi => {
                self.write_reg(inst.rd, self.reg(inst.rs1).wrapping_add(inst.imm as u32));
            }
            Op::Slti => {
                let value = ((self.reg(inst.rs1) as i32) < inst.imm) as u32;
                self.write_reg(inst.rd, value);
            }
            Op::Sltiu => {
                let value = (self.reg(inst.rs1) < inst.imm as u32) as u32;
                self.write_reg(inst.rd, value);
            }
            Op::Xori => {
                self.write_reg(inst.rd, self.reg(inst.rs1) ^ inst.imm as u32);
            }
            Op::Ori => {
                self.write_reg(inst.rd, self.reg(inst.rs1) | inst.imm as u32);
            }
            Op::Andi => {
                self.write_reg(inst.rd, self.reg(inst.rs1) & inst.imm as u32);
            }
            Op::Slli => {
                let sh = (inst.imm as u32) & 0x1F;
                self.write_reg(inst.rd, self.reg(inst.rs1) << sh);
            }
            Op::Srli => {
                let sh = (inst.imm as u32) & 0x1F;
                self.write_reg(inst.rd, self.reg(inst.rs1) >> sh);
            }
            Op::Srai => {
                let sh = (inst.imm as u32) & 0x1F;
                self.write_reg(inst.rd, ((self.reg(inst.rs1) as i32) >> sh) as u32);
            }
            Op::Add => {
                let value = self.reg(inst.rs1).wrapping_add(self.reg(inst.rs2));
                self.write_reg(inst.rd, value);
            }
            Op::Sub => {
                let value = self.reg(inst.rs1).wrapping_sub(self.reg(inst.rs2));
                self.write_reg(inst.rd, value);
            }
            Op::Sll => {
                let sh = self.reg(inst.rs2) & 0x1F;
                self.write_reg(inst.rd, self.reg(inst.rs1) << sh);
            }
            Op::Slt => {
                let value = ((self.reg(inst.rs1) as i32) < (self.reg(inst.rs2) as i32)) as u32;
                self.write_reg(inst.rd, value);
            }
            Op::Sltu => {
                let value = (self.reg(inst.rs1) < self.reg(inst.rs2)) as u32;
                self.write_reg(inst.rd, value);
            }
            Op::Xor => {
                self.write_reg(inst.rd, self.reg(inst.rs1) ^ self.reg(inst.rs2));
            }
            Op::Srl => {
                let sh = self.reg(inst.rs2) & 0x1F;
                self.write_reg(inst.rd, self.reg(inst.rs1) >> sh);
            }
            Op::Sra => {
                let sh = self.reg(inst.rs2) & 0x1F;
                self.write_reg(inst.rd, ((self.reg(inst.rs1) as i32) >> sh) as u32);
            }
            Op::Or => {
                self.write_reg(inst.rd, self.reg(inst.rs1) | self.reg(inst.rs2));
            }
            Op::And => {
                self.write_reg(inst.rd, self.reg(inst.rs1) & self.reg(inst.rs2));
            }
            Op::Nop => {}
            Op::Data => {
                return Err(OracleError::ExecutedData {
                    pc: self.pc,
                    word: slot.word,
                });
            }
        }

        let rd = inst.rd;
        let rd_data = if rd != 0 { self.regs[rd as usize] } else { 0 };
        self.pc = next_pc;
        Ok((rd, rd_data))
    }
}

/// Decode and run an image in one go.
pub fn run_image(image: &ProgramImage, opts: &SimOptions) -> OracleResult<RunResult> {
    let program = DecodedProgram::from_image(image, opts.decode_policy)?;
    let engine = Engine::with_memory(program, SparseMemory::with_limit(opts.mem_limit));
    engine.run(opts.max_steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::ProgramBuilder;

    fn run_words(words: Vec<u32>) -> RunResult {
        let image = ProgramImage::from_words(words);
        run_image(&image, &SimOptions::default()).unwrap()
    }

    fn run_built(builder: ProgramBuilder) -> RunResult {
        let image = builder.finalize().unwrap();
        run_image(&image, &SimOptions::default()).unwrap()
    }

    #[test]
    fn test_three_instruction_add_program() {
        // ADDI x1, x0, 5 / ADDI x2, x0, 7 / ADD x3, x1, x2
        let result = run_words(vec![0x00500093, 0x00700113, 0x002081B3]);
        assert_eq!(result.stop, StopReason::PcOutOfImage);
        assert_eq!(result.steps, 3);

        let rd_seq: Vec<(u8, u32)> = result.trace.iter().map(|e| (e.rd, e.rd_data)).collect();
        assert_eq!(rd_seq, vec![(1, 5), (2, 7), (3, 12)]);

        let pcs: Vec<u32> = result.trace.iter().map(|e| e.pc).collect();
        assert_eq!(pcs, vec![0, 4, 8]);
        let cycles: Vec<u64> = result.trace.iter().map(|e| e.cycle).collect();
        assert_eq!(cycles, vec![0, 1, 2]);

        assert_eq!(result.regs[3], 12);
        assert!(result.regs[4..].iter().all(|&r| r == 0));
        assert_eq!(result.trace[2].asm, "add x3, x1, x2");
    }

    #[test]
    fn test_x0_stays_zero() {
        let mut b = ProgramBuilder::new();
        b.addi(0, 0, 99);
        b.addi(1, 0, 1);
        let result = run_built(b);
        assert_eq!(result.trace[0].rd, 0);
        assert_eq!(result.trace[0].rd_data, 0);
        assert_eq!(result.regs[0], 0);
        assert_eq!(result.regs[1], 1);
    }

    #[test]
    fn test_byte_store_load_sign_extension() {
        // SB of 0x80, then LB (sign-extends) and LBU (zero-extends).
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 0x80);
        b.addi(2, 0, 0x100);
        b.sb(1, 2, 0);
        b.lb(3, 2, 0);
        b.lbu(4, 2, 0);
        let result = run_built(b);
        assert_eq!(result.regs[3], 0xFFFFFF80);
        assert_eq!(result.regs[4], 0x00000080);
        // Store commits carry rd=0, data=0.
        assert_eq!(result.trace[2].rd, 0);
        assert_eq!(result.trace[2].rd_data, 0);
    }

    #[test]
    fn test_word_store_load_identity_unaligned() {
        let mut b = ProgramBuilder::new();
        b.li(1, 0xDEADBEEF);
        b.addi(2, 0, 0x101);
        b.sw(1, 2, 0);
        b.lw(3, 2, 0);
        b.lhu(4, 2, 0);
        let result = run_built(b);
        assert_eq!(result.regs[3], 0xDEADBEEF);
        assert_eq!(result.regs[4], 0x0000BEEF);
    }

    #[test]
    fn test_branch_taken_and_not_taken() {
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 1);
        b.beq(1, 1, "skip");
        b.addi(2, 0, 99);
        b.label("skip").unwrap();
        b.addi(3, 0, 3);
        let result = run_built(b);
        let pcs: Vec<u32> = result.trace.iter().map(|e| e.pc).collect();
        assert_eq!(pcs, vec![0, 4, 12]);
        assert_eq!(result.regs[2], 0);
        assert_eq!(result.regs[3], 3);
    }

    #[test]
    fn test_backward_branch_loop() {
        // x1 counts 3..1, x2 accumulates: 3 + 2 + 1 = 6.
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 3);
        b.label("loop").unwrap();
        b.add(2, 2, 1);
        b.addi(1, 1, -1);
        b.bne(1, 0, "loop");
        let result = run_built(b);
        assert_eq!(result.regs[2], 6);
        assert_eq!(result.stop, StopReason::PcOutOfImage);
        assert_eq!(result.steps, 10);
    }

    #[test]
    fn test_jalr_clears_bit_zero_and_links() {
        // x1 = 13 (odd), so the jump lands on 12 and x2 links to 8.
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 13);
        b.jalr(2, 1, 0);
        b.addi(3, 0, 99); // skipped
        b.nop(); // pc 12, landing pad
        let result = run_built(b);
        let pcs: Vec<u32> = result.trace.iter().map(|e| e.pc).collect();
        assert_eq!(pcs, vec![0, 4, 12]);
        assert_eq!(result.regs[2], 8);
        assert_eq!(result.regs[3], 0);
    }

    #[test]
    fn test_jalr_target_before_link_write() {
        // rd == rs1: target must come from the pre-link value.
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 12);
        b.jalr(1, 1, 0);
        b.addi(3, 0, 99); // skipped
        b.nop(); // pc 12
        let result = run_built(b);
        let pcs: Vec<u32> = result.trace.iter().map(|e| e.pc).collect();
        assert_eq!(pcs, vec![0, 4, 12]);
        assert_eq!(result.regs[1], 8);
    }

    #[test]
    fn test_jal_links_and_jumps() {
        let mut b = ProgramBuilder::new();
        b.jal(1, "over");
        b.addi(2, 0, 99); // skipped
        b.label("over").unwrap();
        b.addi(3, 0, 1);
        let result = run_built(b);
        assert_eq!(result.regs[1], 4);
        assert_eq!(result.regs[2], 0);
        assert_eq!(result.regs[3], 1);
    }

    #[test]
    fn test_step_budget_exhaustion_is_not_fatal() {
        let mut b = ProgramBuilder::new();
        b.label("spin").unwrap();
        b.jal(0, "spin");
        let image = b.finalize().unwrap();
        let opts = SimOptions {
            max_steps: 10,
            ..SimOptions::default()
        };
        let result = run_image(&image, &opts).unwrap();
        assert_eq!(result.stop, StopReason::StepBudgetExhausted);
        assert_eq!(result.trace.len(), 10);
        assert_eq!(result.steps, 10);
    }

    #[test]
    fn test_executing_data_word_is_fatal() {
        let image = ProgramImage::from_words(vec![0xFFFFFFFF]);
        let err = run_image(&image, &SimOptions::default()).unwrap_err();
        match err {
            OracleError::ExecutedData { pc, word } => {
                assert_eq!(pc, 0);
                assert_eq!(word, 0xFFFFFFFF);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_logical_immediates_sign_extend() {
        // xori/ori/andi take the sign-extended 12-bit immediate, so a
        // negative immediate flips/sets/keeps the upper bits too.
        let mut b = ProgramBuilder::new();
        b.xori(1, 0, -1);
        b.ori(2, 0, -2048);
        b.addi(3, 0, 0x5A5);
        b.andi(4, 3, -1);
        let result = run_built(b);
        assert_eq!(result.regs[1], 0xFFFFFFFF);
        assert_eq!(result.regs[2], 0xFFFFF800);
        assert_eq!(result.regs[4], 0x5A5);
    }

    #[test]
    fn test_signed_vs_unsigned_compares() {
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, -1);
        b.addi(2, 0, 1);
        b.slt(3, 1, 2);
        b.sltu(4, 1, 2);
        b.slti(5, 1, 0);
        b.sltiu(6, 1, -1);
        let result = run_built(b);
        assert_eq!(result.regs[3], 1); // -1 < 1 signed
        assert_eq!(result.regs[4], 0); // 0xFFFFFFFF < 1 unsigned is false
        assert_eq!(result.regs[5], 1); // -1 < 0 signed
        assert_eq!(result.regs[6], 0); // 0xFFFFFFFF < 0xFFFFFFFF is false
    }

    #[test]
    fn test_register_shift_amounts_are_masked() {
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 33);
        b.addi(2, 0, 1);
        b.sll(3, 2, 1); // 1 << (33 & 31) = 2
        b.lui(4, 0x80000);
        b.sra(5, 4, 2); // arithmetic shift of 0x80000000 by 1
        b.srl(6, 4, 2); // logical shift by 1
        let result = run_built(b);
        assert_eq!(result.regs[3], 2);
        assert_eq!(result.regs[5], 0xC0000000);
        assert_eq!(result.regs[6], 0x40000000);
    }

    #[test]
    fn test_lui_auipc() {
        let mut b = ProgramBuilder::new();
        b.lui(1, 0xFFFFF);
        b.auipc(2, 0x1); // pc = 4
        let result = run_built(b);
        assert_eq!(result.regs[1], 0xFFFFF000);
        assert_eq!(result.regs[2], 0x1004);
    }

    #[test]
    fn test_sub_wraps() {
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 0);
        b.addi(2, 0, 1);
        b.sub(3, 1, 2);
        let result = run_built(b);
        assert_eq!(result.regs[3], 0xFFFFFFFF);
    }

    #[test]
    fn test_memory_limit_aborts_run() {
        let mut b = ProgramBuilder::new();
        b.addi(1, 0, 0x77);
        b.sw(1, 0, 0x100);
        let image = b.finalize().unwrap();
        let opts = SimOptions {
            mem_limit: 2,
            ..SimOptions::default()
        };
        let err = run_image(&image, &opts).unwrap_err();
        assert!(matches!(err, OracleError::MemoryLimit { .. }));
    }

    #[test]
    fn test_halfword_sign_extension() {
        let mut b = ProgramBuilder::new();
        b.li(1, 0x8001);
        b.addi(2, 0, 0x200);
        b.sh(1, 2, 0);
        b.lh(3, 2, 0);
        b.lhu(4, 2, 0);
        let result = run_built(b);
        assert_eq!(result.regs[3], 0xFFFF8001);
        assert_eq!(result.regs[4], 0x00008001);
    }
}

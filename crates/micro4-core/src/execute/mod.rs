//! Instruction execution pipeline and the [`Cpu`] session object.
//!
//! A step runs in two phases. [`execute_instruction`] computes every effect
//! of the decoded instruction into an [`ExecuteState`] without touching the
//! core, then [`commit_execution`] applies them. A fault raised before commit
//! leaves registers and memory exactly as they were.

mod helpers;

pub use helpers::{alu, checked_address, fall_through_pc, AluOp};

use crate::decoder::{DecodedInstruction, Decoder};
use crate::encoding::Opcode;
use crate::fault::FaultCode;
use crate::memory::Memory;
use crate::state::{Registers, RunState};
use crate::timing::instruction_cycles;
use crate::{CpuConfig, CpuSnapshot, StepOutcome};

const LOG_TARGET: &str = "micro4::execute";

/// Pending side effects of one instruction, applied by [`commit_execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Instruction register value.
    pub ir: u8,
    /// New memory address register value.
    pub mar: Option<u8>,
    /// New memory data register value.
    pub mdr: Option<u8>,
    /// New accumulator value (the zero flag follows it).
    pub acc: Option<u8>,
    /// Pending memory write as `(address, value)`.
    pub memory_write: Option<(u8, u8)>,
    /// Program counter after commit.
    pub next_pc: u8,
    /// Whether the core halts after commit.
    pub halt: bool,
    /// Cycle cost of the instruction.
    pub cycles: u32,
}

/// Computes the effects of `instr`, fetched at `pc`, without mutating state.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfBounds`] when a data address or jump
/// target names no memory cell.
pub fn execute_instruction(
    instr: &DecodedInstruction,
    regs: &Registers,
    memory: &Memory,
    pc: u8,
) -> Result<ExecuteState, FaultCode> {
    let cells = memory.len();
    let mut exec = ExecuteState {
        ir: instr.instruction_byte(),
        next_pc: fall_through_pc(pc, instr.len(), cells),
        cycles: instruction_cycles(instr.opcode),
        ..ExecuteState::default()
    };
    let address = instr
        .address
        .map(|address| checked_address(address, cells, pc))
        .transpose()?;

    match (instr.opcode, address) {
        (Opcode::Hlt, _) => exec.halt = true,
        (Opcode::Ldi, _) => exec.acc = Some(instr.operand),
        (Opcode::Lda, Some(addr)) => {
            let value = read_cell(memory, addr, pc)?;
            exec.mar = Some(addr);
            exec.mdr = Some(value);
            exec.acc = Some(value);
        }
        (Opcode::Sta, Some(addr)) => {
            exec.mar = Some(addr);
            exec.mdr = Some(regs.acc());
            exec.memory_write = Some((addr, regs.acc()));
        }
        (Opcode::Add, Some(addr)) => {
            let value = read_cell(memory, addr, pc)?;
            exec.mar = Some(addr);
            exec.mdr = Some(value);
            exec.acc = Some(alu(AluOp::Add, regs.acc(), value));
        }
        (Opcode::Sub, Some(addr)) => {
            let value = read_cell(memory, addr, pc)?;
            exec.mar = Some(addr);
            exec.mdr = Some(value);
            exec.acc = Some(alu(AluOp::Sub, regs.acc(), value));
        }
        (Opcode::Jmp, Some(addr)) => exec.next_pc = addr,
        (Opcode::Jz, Some(addr)) => {
            if regs.zero() {
                exec.next_pc = addr;
            }
        }
        // The decoder always attaches an address to address-form opcodes.
        (Opcode::Lda | Opcode::Sta | Opcode::Add | Opcode::Sub | Opcode::Jmp | Opcode::Jz, None) => {
            return Err(FaultCode::PcOutOfBounds { pc });
        }
    }

    Ok(exec)
}

fn read_cell(memory: &Memory, address: u8, pc: u8) -> Result<u8, FaultCode> {
    memory
        .read(usize::from(address))
        .ok_or(FaultCode::AddressOutOfBounds { address, pc })
}

/// Applies the pending effects of a successfully executed instruction.
pub fn commit_execution(regs: &mut Registers, memory: &mut Memory, exec: &ExecuteState) {
    regs.set_ir(exec.ir);
    if let Some(mar) = exec.mar {
        regs.set_mar(mar);
    }
    if let Some(mdr) = exec.mdr {
        regs.set_mdr(mdr);
    }
    if let Some(acc) = exec.acc {
        regs.set_acc(acc);
    }
    if let Some((addr, value)) = exec.memory_write {
        memory.write(usize::from(addr), value);
    }
    regs.set_pc(exec.next_pc);
}

/// One Micro4 execution session: registers, memory, run state and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    config: CpuConfig,
    regs: Registers,
    memory: Memory,
    run_state: RunState,
    cycle_count: u64,
    instruction_count: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}

impl Cpu {
    /// Creates a zeroed core.
    #[must_use]
    pub fn new(config: CpuConfig) -> Self {
        let memory = Memory::new(config.memory_cells);
        Self {
            config,
            regs: Registers::default(),
            memory,
            run_state: RunState::Ready,
            cycle_count: 0,
            instruction_count: 0,
        }
    }

    /// Returns the configuration this core was built with.
    #[must_use]
    pub const fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Initializes the core; equivalent to [`Cpu::reset`].
    pub fn init(&mut self) {
        self.reset();
    }

    /// Zeroes registers, flags, counters and memory and clears halt/error.
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.memory.clear();
        self.run_state = RunState::Ready;
        self.cycle_count = 0;
        self.instruction_count = 0;
    }

    /// Copies program nibbles into memory starting at `start`.
    ///
    /// Each word is masked to 4 bits; words past the end of memory are
    /// dropped. The program counter is not touched. Returns the number of
    /// cells written.
    pub fn load_program(&mut self, words: &[u8], start: u8) -> usize {
        let written = self.memory.load(words, usize::from(start));
        tracing::debug!(
            target: LOG_TARGET,
            start,
            requested = words.len(),
            written,
            "program loaded"
        );
        written
    }

    /// Executes one instruction and returns the cycles it consumed.
    ///
    /// Returns 0 when the core is already halted or errored, and when the
    /// instruction faults.
    pub fn step(&mut self) -> u32 {
        self.step_outcome().cycles()
    }

    /// Executes one instruction and reports what happened.
    pub fn step_outcome(&mut self) -> StepOutcome {
        if self.run_state.is_halted() {
            return StepOutcome::Idle;
        }

        let pc = self.regs.pc();
        let result: Result<DecodedInstruction, FaultCode> = Decoder::decode(&self.memory, pc).into();
        let exec = result.and_then(|instr| execute_instruction(&instr, &self.regs, &self.memory, pc));

        match exec {
            Ok(exec) => {
                commit_execution(&mut self.regs, &mut self.memory, &exec);
                self.cycle_count += u64::from(exec.cycles);
                self.instruction_count += 1;
                if exec.halt {
                    self.run_state = RunState::Halted;
                    tracing::debug!(target: LOG_TARGET, pc, "halted");
                    StepOutcome::Halted {
                        cycles: exec.cycles,
                    }
                } else {
                    StepOutcome::Retired {
                        cycles: exec.cycles,
                    }
                }
            }
            Err(cause) => {
                self.run_state = RunState::Errored(cause);
                tracing::warn!(target: LOG_TARGET, %cause, "fault latched");
                StepOutcome::Fault { cause }
            }
        }
    }

    /// Runs until halted, errored, or `max_cycles` is reached (0 = unbounded).
    ///
    /// Returns the total cycles executed by this call. The cycle limit is
    /// checked between instructions, so the last instruction may cross it.
    pub fn run(&mut self, max_cycles: u64) -> u64 {
        let mut total = 0u64;
        while !self.run_state.is_halted() && (max_cycles == 0 || total < max_cycles) {
            let cycles = self.step();
            if cycles == 0 {
                break;
            }
            total += u64::from(cycles);
        }
        total
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u8 {
        self.regs.pc()
    }

    /// Accumulator.
    #[must_use]
    pub const fn accumulator(&self) -> u8 {
        self.regs.acc()
    }

    /// Zero flag.
    #[must_use]
    pub const fn zero_flag(&self) -> bool {
        self.regs.zero()
    }

    /// Instruction register.
    #[must_use]
    pub const fn ir(&self) -> u8 {
        self.regs.ir()
    }

    /// Memory address register.
    #[must_use]
    pub const fn mar(&self) -> u8 {
        self.regs.mar()
    }

    /// Memory data register.
    #[must_use]
    pub const fn mdr(&self) -> u8 {
        self.regs.mdr()
    }

    /// Copy of the register file.
    #[must_use]
    pub const fn registers(&self) -> Registers {
        self.regs
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// True after `HLT` or any fault.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.run_state.is_halted()
    }

    /// True after a fault.
    #[must_use]
    pub const fn is_errored(&self) -> bool {
        self.run_state.is_errored()
    }

    /// Latched fault, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<FaultCode> {
        self.run_state.latched_fault()
    }

    /// Message of the latched fault, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.fault().map(|cause| cause.to_string())
    }

    /// Cycles consumed since the last reset.
    #[must_use]
    pub const fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Instructions retired since the last reset.
    #[must_use]
    pub const fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Reads one memory cell.
    #[must_use]
    pub fn read_memory(&self, addr: u8) -> Option<u8> {
        self.memory.read(usize::from(addr))
    }

    /// Number of memory cells.
    #[must_use]
    pub fn memory_cells(&self) -> usize {
        self.memory.len()
    }

    /// Bulk copy-out of memory.
    #[must_use]
    pub fn memory(&self) -> Vec<u8> {
        self.memory.to_vec()
    }

    /// Fully independent copy of the host-visible state.
    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.regs.pc(),
            accumulator: self.regs.acc(),
            zero_flag: self.regs.zero(),
            ir: self.regs.ir(),
            mar: self.regs.mar(),
            mdr: self.regs.mdr(),
            halted: self.is_halted(),
            errored: self.is_errored(),
            error_message: self.error_message(),
            cycle_count: self.cycle_count,
            instruction_count: self.instruction_count,
            memory: self.memory.to_vec(),
        }
    }
}

//! # Groudon
//!
//! A high performance Cairo virtual machine implementation
//!
//! # Documentation
//!
//! - [The Cairo Whitepaper](https://www.cairo-lang.org/cairo-whitepaper/).
//!
//! # Field
//!
//! Technically, the Cairo language allows any prime field to be used as the
//! underlying field for the virtual machine. In practice the only field this
//! crate is meant to be used with is the Starknet field element
//! [`Felt`](groudon_felt::Felt), and the field is therefore not configurable.
//!
//! # Components
//!
//! The [`CairoVM`] is composed of three main components:
//!
//! - [`Cpu`]: the register file of the machine, responsible for holding
//!   `pc`/`ap`/`fp` and resolving operand addresses.
//!
//! - [`SegmentManager`]: the segmented, write-once memory of the machine,
//!   together with the bookkeeping needed to flatten it at the end of a run.
//!
//! - The step engine in this module, which drives the fetch-decode-execute
//!   cycle one atomic step at a time.
//!
//! The [`runner`] module ties everything together: it loads a compiled
//! [`Program`](program::Program), lays out the initial segments, runs the
//! machine to completion and relocates the results.

#![warn(missing_docs, missing_debug_implementations)]

use bitflags::bitflags;
use num_traits::ToPrimitive;

use crate::builtin::{Builtin, BuiltinRunner};
use crate::cpu::Cpu;
use crate::error::Error;
use crate::instr::{ApUpdate, FpUpdate, Instruction, Opcode, PcUpdate, ResLogic};
use crate::memory::{Memory, Pointer, Value};
use crate::segments::SegmentManager;
use crate::trace::TraceEntry;

pub mod builtin;
pub mod cpu;
pub mod error;
pub mod instr;
pub mod memory;
pub mod program;
pub mod runner;
pub mod segments;
pub mod trace;

/// Contains the full state of a Cairo virtual machine.
///
/// This includes memory, registers, builtins and the execution trace. It can
/// be used to execute a Cairo program step by step and gather the artifacts
/// needed downstream for proof generation.
#[derive(Debug)]
pub struct CairoVM {
    /// The segmented memory of the machine, behind its manager.
    pub(crate) segments: SegmentManager,
    /// The register file.
    pub(crate) cpu: Cpu,
    /// The builtins registered with the machine, each owning one segment.
    builtins: Vec<BuiltinRunner>,
    /// The register snapshots taken before each step, when tracing is on.
    trace: Option<Vec<TraceEntry>>,
    /// The number of steps executed so far.
    current_step: usize,
}

impl CairoVM {
    /// Creates an empty virtual machine with no allocated segments.
    ///
    /// When `trace_enabled` is set, every step appends its pre-step registers
    /// to the trace.
    pub fn new(trace_enabled: bool) -> CairoVM {
        CairoVM {
            segments: SegmentManager::new(),
            cpu: Cpu::new(Pointer::new(0, 0), 0, 0),
            builtins: Vec::new(),
            trace: trace_enabled.then(Vec::new),
            current_step: 0,
        }
    }

    /// Returns the current state of the [`Cpu`].
    #[inline]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Returns the current state of the [`Memory`].
    #[inline]
    pub fn memory(&self) -> &Memory {
        &self.segments.memory
    }

    /// Returns the segment manager of the machine.
    #[inline]
    pub fn segments(&self) -> &SegmentManager {
        &self.segments
    }

    /// The register snapshots gathered so far, if tracing is enabled.
    pub fn trace(&self) -> Option<&[TraceEntry]> {
        self.trace.as_deref()
    }

    /// The number of steps executed so far.
    #[inline]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// The builtins registered with the machine.
    pub fn builtin_runners(&self) -> &[BuiltinRunner] {
        &self.builtins
    }

    /// Allocates a fresh segment for `builtin` and registers it, returning
    /// the base address of the new segment.
    pub fn add_builtin(&mut self, builtin: Box<dyn Builtin>) -> Pointer {
        let base = self.segments.add();
        self.builtins.push(BuiltinRunner::new(base, builtin));
        base
    }

    /// Advances the virtual machine by a single step.
    ///
    /// A step is atomic from the caller's point of view: it fetches and
    /// decodes the instruction under `pc`, resolves and possibly deduces the
    /// three operands, writes any deduced value back to memory, checks the
    /// opcode contract, updates the registers, and finally appends a trace
    /// entry with the registers the step started from.
    ///
    /// Deduced values commit through the write-once path before the opcode
    /// contract is checked, so they stay observable even when the check
    /// fails the step.
    pub fn step(&mut self) -> Result<(), Error> {
        let entry = TraceEntry {
            pc: self.cpu.pc,
            ap: self.cpu.ap,
            fp: self.cpu.fp,
        };

        let encoded = self.fetch_instruction()?;
        let instruction = Instruction::decode(encoded)?;

        let (operands, addresses, deduced) = self.compute_operands(&instruction)?;
        self.insert_deduced_operands(&operands, &addresses, deduced)?;
        self.opcode_assertions(&instruction, &operands)?;

        // Every cell the instruction touched counts as read by it.
        self.segments.memory.mark_accessed(entry.pc);
        self.segments.memory.mark_accessed(addresses.dst);
        self.segments.memory.mark_accessed(addresses.op0);
        self.segments.memory.mark_accessed(addresses.op1);

        self.update_registers(&instruction, &operands)?;

        tracing::trace!(pc = %entry.pc, ap = entry.ap, fp = entry.fp, "executed step");

        if let Some(trace) = self.trace.as_mut() {
            trace.push(entry);
        }
        self.current_step += 1;

        Ok(())
    }

    /// Reads the instruction word under the program counter.
    fn fetch_instruction(&self) -> Result<u64, Error> {
        let pc = self.cpu.pc;
        let value = self
            .memory()
            .get(pc)
            .ok_or(Error::InstructionFetchingFailed(pc))?;
        match value {
            Value::Scalar(felt) => felt.to_u64().ok_or(Error::InstructionEncodingError(pc)),
            Value::Pointer(_) => Err(Error::InstructionEncodingError(pc)),
        }
    }

    /// Resolves the three operand addresses and fills in every operand that
    /// can be read or deduced.
    fn compute_operands(
        &mut self,
        instruction: &Instruction,
    ) -> Result<(Operands, OperandAddresses, OperandFlags), Error> {
        let dst_addr = self.cpu.compute_dst_addr(instruction)?;
        let mut dst = self.memory().get(dst_addr);

        let op0_addr = self.cpu.compute_op0_addr(instruction)?;
        let mut op0 = self.memory().get(op0_addr);

        let mut deduced = OperandFlags::empty();

        if op0.is_none() {
            if let Some(value) = self.deduce_memory_cell(op0_addr) {
                op0 = Some(value);
                deduced.insert(OperandFlags::OP0_DEDUCED);
            }
        }

        let op1_addr = self.cpu.compute_op1_addr(instruction, op0.as_ref())?;
        let mut op1 = self.memory().get(op1_addr);

        if op1.is_none() {
            if let Some(value) = self.deduce_memory_cell(op1_addr) {
                op1 = Some(value);
                deduced.insert(OperandFlags::OP1_DEDUCED);
            }
        }

        let mut res = None;

        if op0.is_none() {
            let (value, deduced_res) = deduce_op0(instruction, &self.cpu, dst, op1)?;
            if let Some(value) = value {
                op0 = Some(value);
                deduced.insert(OperandFlags::OP0_DEDUCED);
            }
            res = deduced_res;
        }

        if op1.is_none() {
            let (value, deduced_res) = deduce_op1(instruction, dst, op0)?;
            if let Some(value) = value {
                op1 = Some(value);
                deduced.insert(OperandFlags::OP1_DEDUCED);
            }
            if res.is_none() {
                res = deduced_res;
            }
        }

        if res.is_none() {
            res = compute_res(instruction, op0, op1)?;
        }

        if dst.is_none() {
            if let Some(value) = deduce_dst(instruction, res, &self.cpu)? {
                dst = Some(value);
                deduced.insert(OperandFlags::DST_DEDUCED);
            }
        }

        Ok((
            Operands { dst, op0, op1, res },
            OperandAddresses {
                dst: dst_addr,
                op0: op0_addr,
                op1: op1_addr,
            },
            deduced,
        ))
    }

    /// Asks the builtin owning `addr`'s segment, if any, to deduce the value
    /// of the empty cell there.
    fn deduce_memory_cell(&self, addr: Pointer) -> Option<Value> {
        if addr.is_temporary() {
            return None;
        }
        let runner = self.builtins.iter().find(|runner| runner.owns(addr))?;
        runner.deduce(addr, self.memory())
    }

    /// Enforces the opcode contract over the resolved operands.
    fn opcode_assertions(
        &self,
        instruction: &Instruction,
        operands: &Operands,
    ) -> Result<(), Error> {
        match instruction.opcode {
            Opcode::AssertEq => match (operands.dst, operands.res) {
                (Some(dst), Some(res)) if dst == res => Ok(()),
                (Some(dst), res) => Err(Error::DiffAssertValues { dst, res }),
                (None, _) => Err(Error::NoDst),
            },
            Opcode::Call => {
                let return_pc = Value::Pointer(self.cpu.pc.add_uint(instruction.size())?);
                if operands.op0 != Some(return_pc) {
                    return Err(Error::CallDidNotReturnFP {
                        op0: operands.op0,
                        expected: return_pc,
                    });
                }
                let fp = Value::Pointer(self.cpu.get_fp());
                if operands.dst != Some(fp) {
                    return Err(Error::CallDidNotSaveFP {
                        dst: operands.dst,
                        expected: fp,
                    });
                }
                Ok(())
            }
            Opcode::Ret | Opcode::NOp => Ok(()),
        }
    }

    /// Writes every deduced operand back to memory, through the write-once
    /// path.
    fn insert_deduced_operands(
        &mut self,
        operands: &Operands,
        addresses: &OperandAddresses,
        deduced: OperandFlags,
    ) -> Result<(), Error> {
        if deduced.contains(OperandFlags::OP0_DEDUCED) {
            if let Some(op0) = operands.op0 {
                self.segments.memory.insert(addresses.op0, op0)?;
            }
        }
        if deduced.contains(OperandFlags::OP1_DEDUCED) {
            if let Some(op1) = operands.op1 {
                self.segments.memory.insert(addresses.op1, op1)?;
            }
        }
        if deduced.contains(OperandFlags::DST_DEDUCED) {
            if let Some(dst) = operands.dst {
                self.segments.memory.insert(addresses.dst, dst)?;
            }
        }
        Ok(())
    }

    /// Computes and commits the next register values.
    ///
    /// All three updates are computed from the registers the step started
    /// with and committed together.
    fn update_registers(
        &mut self,
        instruction: &Instruction,
        operands: &Operands,
    ) -> Result<(), Error> {
        let new_pc = match instruction.pc_update {
            PcUpdate::Regular => self.cpu.pc.add_uint(instruction.size())?,
            PcUpdate::Jump => match operands.res {
                Some(Value::Pointer(target)) => target,
                Some(Value::Scalar(_)) => return Err(Error::JumpNotRelocatable),
                None => return Err(Error::UnconstrainedResJump),
            },
            PcUpdate::JumpRel => match operands.res {
                Some(Value::Scalar(offset)) => self.cpu.pc.add_felt(&offset)?,
                Some(Value::Pointer(_)) => return Err(Error::PureValue),
                None => return Err(Error::UnconstrainedResJump),
            },
            PcUpdate::Jnz => {
                let dst = operands.dst.ok_or(Error::NoDst)?;
                if dst.is_zero() {
                    self.cpu.pc.add_uint(instruction.size())?
                } else {
                    let offset = operands
                        .op1
                        .ok_or(Error::UnconstrainedResJump)?
                        .into_felt()?;
                    self.cpu.pc.add_felt(&offset)?
                }
            }
        };

        let new_ap = match instruction.ap_update {
            ApUpdate::Regular => self.cpu.ap,
            ApUpdate::Add => {
                let step = operands
                    .res
                    .ok_or(Error::UnconstrainedResAdd)?
                    .into_felt()?;
                self.cpu.get_ap().add_felt(&step)?.offset
            }
            ApUpdate::Add1 => self.cpu.get_ap().add_uint(1)?.offset,
            ApUpdate::Add2 => self.cpu.get_ap().add_uint(2)?.offset,
        };

        let new_fp = match instruction.fp_update {
            FpUpdate::Regular => self.cpu.fp,
            // Computed from the pre-step ap, not the updated one.
            FpUpdate::ApPlus2 => self.cpu.get_ap().add_uint(2)?.offset,
            FpUpdate::Dst => match operands.dst {
                Some(Value::Pointer(target)) => target.offset,
                Some(Value::Scalar(felt)) => return Err(Error::FpUpdateInt(felt)),
                None => return Err(Error::NoDst),
            },
        };

        self.cpu.pc = new_pc;
        self.cpu.ap = new_ap;
        self.cpu.fp = new_fp;

        Ok(())
    }
}

bitflags! {
    /// Tracks which operands of the current step were deduced rather than
    /// read from memory, and therefore need to be written back.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct OperandFlags: u8 {
        /// The destination was deduced from the result or the opcode.
        const DST_DEDUCED = 1 << 0;
        /// The first operand was deduced from the other operands or a
        /// builtin.
        const OP0_DEDUCED = 1 << 1;
        /// The second operand was deduced from the other operands or a
        /// builtin.
        const OP1_DEDUCED = 1 << 2;
    }
}

/// The resolved operands of one instruction. Each may be absent when its
/// memory cell is empty and no deduction rule applies.
#[derive(Debug, Clone, Copy)]
struct Operands {
    dst: Option<Value>,
    op0: Option<Value>,
    op1: Option<Value>,
    res: Option<Value>,
}

/// The memory addresses the three operands were resolved to.
#[derive(Debug, Clone, Copy)]
struct OperandAddresses {
    dst: Pointer,
    op0: Pointer,
    op1: Pointer,
}

/// Attempts to deduce `op0` from the opcode and the other operands.
///
/// Returns the deduced value and, when the deduction pins it down as a side
/// effect, the result of the instruction.
fn deduce_op0(
    instruction: &Instruction,
    cpu: &Cpu,
    dst: Option<Value>,
    op1: Option<Value>,
) -> Result<(Option<Value>, Option<Value>), Error> {
    match instruction.opcode {
        Opcode::Call => {
            // A call stores the return address in op0.
            let return_pc = cpu.pc.add_uint(instruction.size())?;
            Ok((Some(Value::Pointer(return_pc)), None))
        }
        Opcode::AssertEq => match (instruction.res_logic, dst, op1) {
            (ResLogic::Add, Some(dst), Some(op1)) => {
                //     dst = op0 + op1
                // =>  op0 = dst - op1
                Ok((Some(dst.sub(&op1)?), Some(dst)))
            }
            (ResLogic::Mul, Some(Value::Scalar(dst)), Some(Value::Scalar(op1)))
                if !op1.is_zero() =>
            {
                //     dst = op0 * op1
                // =>  op0 = dst / op1
                let op0 = dst.div(&op1).map_err(|_| Error::DivisionByZero)?;
                Ok((Some(Value::Scalar(op0)), Some(Value::Scalar(dst))))
            }
            _ => Ok((None, None)),
        },
        _ => Ok((None, None)),
    }
}

/// Attempts to deduce `op1` from the opcode and the other operands.
fn deduce_op1(
    instruction: &Instruction,
    dst: Option<Value>,
    op0: Option<Value>,
) -> Result<(Option<Value>, Option<Value>), Error> {
    if instruction.opcode != Opcode::AssertEq {
        return Ok((None, None));
    }
    match (instruction.res_logic, dst, op0) {
        (ResLogic::Op1, Some(dst), _) => {
            //    dst = op1
            Ok((Some(dst), Some(dst)))
        }
        (ResLogic::Add, Some(dst), Some(op0)) => {
            //     dst = op0 + op1
            // =>  op1 = dst - op0
            Ok((Some(dst.sub(&op0)?), Some(dst)))
        }
        (ResLogic::Mul, Some(Value::Scalar(dst)), Some(Value::Scalar(op0))) if !op0.is_zero() => {
            //     dst = op0 * op1
            // =>  op1 = dst / op0
            let op1 = dst.div(&op0).map_err(|_| Error::DivisionByZero)?;
            Ok((Some(Value::Scalar(op1)), Some(Value::Scalar(dst))))
        }
        _ => Ok((None, None)),
    }
}

/// Computes the result of the instruction from its operands, when possible.
fn compute_res(
    instruction: &Instruction,
    op0: Option<Value>,
    op1: Option<Value>,
) -> Result<Option<Value>, Error> {
    match instruction.res_logic {
        ResLogic::Op1 => Ok(op1),
        ResLogic::Add => match (op0, op1) {
            (Some(op0), Some(op1)) => Ok(Some(op0.add(&op1)?)),
            _ => Ok(None),
        },
        ResLogic::Mul => match (op0, op1) {
            (Some(op0), Some(op1)) => Ok(Some(op0.mul(&op1)?)),
            _ => Ok(None),
        },
        ResLogic::Unconstrained => Ok(None),
    }
}

/// Attempts to deduce the destination operand from the opcode.
fn deduce_dst(
    instruction: &Instruction,
    res: Option<Value>,
    cpu: &Cpu,
) -> Result<Option<Value>, Error> {
    match instruction.opcode {
        // An equality assertion pins dst to the result.
        Opcode::AssertEq => Ok(Some(res.ok_or(Error::NoDst)?)),
        // A call saves the current frame pointer in dst.
        Opcode::Call => Ok(Some(Value::Pointer(cpu.get_fp()))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use groudon_felt::Felt;

    use super::*;

    /// A machine with a program segment (0) and an execution segment (1).
    fn vm() -> CairoVM {
        let mut vm = CairoVM::new(true);
        vm.segments.add();
        vm.segments.add();
        vm
    }

    fn set_registers(vm: &mut CairoVM, pc: (isize, usize), ap: usize, fp: usize) {
        vm.cpu = Cpu::new(Pointer::new(pc.0, pc.1), ap, fp);
    }

    #[test]
    fn step_assert_eq_with_immediate() {
        // [ap] = 5; ap++
        let mut vm = vm();
        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::from(0x480680017fff8000u64))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(5u64))
            .unwrap();
        set_registers(&mut vm, (0, 0), 2, 2);

        vm.step().unwrap();

        assert_eq!(vm.cpu().pc, Pointer::new(0, 2));
        assert_eq!(vm.cpu().ap, 3);
        assert_eq!(vm.cpu().fp, 2);
        // The deduced destination was written back.
        assert_eq!(vm.memory().get(Pointer::new(1, 2)), Some(Value::from(5u64)));
        assert_eq!(vm.current_step(), 1);
        // The instruction word, the immediate and the destination cell were
        // all touched by the step.
        assert!(vm.memory().cell(Pointer::new(0, 0)).unwrap().is_accessed());
        assert!(vm.memory().cell(Pointer::new(0, 1)).unwrap().is_accessed());
        assert!(vm.memory().cell(Pointer::new(1, 2)).unwrap().is_accessed());
    }

    #[test]
    fn step_call_deduces_op0_and_dst() {
        // call rel 3
        let mut vm = vm();
        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::from(0x1104800180018000u64))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(3u64))
            .unwrap();
        set_registers(&mut vm, (0, 0), 2, 2);

        vm.step().unwrap();

        // The return address and the saved frame pointer were deduced and
        // written to the two cells the call allocates.
        assert_eq!(
            vm.memory().get(Pointer::new(1, 2)),
            Some(Value::Pointer(Pointer::new(1, 2)))
        );
        assert_eq!(
            vm.memory().get(Pointer::new(1, 3)),
            Some(Value::Pointer(Pointer::new(0, 2)))
        );
        assert_eq!(vm.cpu().pc, Pointer::new(0, 3));
        assert_eq!(vm.cpu().ap, 4);
        assert_eq!(vm.cpu().fp, 4);
    }

    #[test]
    fn step_ret_restores_the_frame() {
        let mut vm = vm();
        vm.segments
            .memory
            .insert(Pointer::new(0, 2), Value::from(0x208b7fff7fff7ffeu64))
            .unwrap();
        // The frame: [fp - 2] = saved fp, [fp - 1] = return address.
        vm.segments
            .memory
            .insert(Pointer::new(1, 0), Value::Pointer(Pointer::new(2, 0)))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(1, 1), Value::Pointer(Pointer::new(3, 0)))
            .unwrap();
        set_registers(&mut vm, (0, 2), 3, 2);

        vm.step().unwrap();

        assert_eq!(vm.cpu().pc, Pointer::new(3, 0));
        assert_eq!(vm.cpu().ap, 3);
        assert_eq!(vm.cpu().fp, 0);
    }

    #[test]
    fn step_jnz_taken_and_not_taken() {
        // jmp rel 4 if [ap - 1] != 0
        let word = Value::from(0x020680017fff7fffu64);

        let mut not_taken = vm();
        not_taken
            .segments
            .memory
            .insert(Pointer::new(0, 0), word)
            .unwrap();
        not_taken
            .segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(4u64))
            .unwrap();
        not_taken
            .segments
            .memory
            .insert(Pointer::new(1, 0), Value::from(0u64))
            .unwrap();
        set_registers(&mut not_taken, (0, 0), 1, 1);
        not_taken.step().unwrap();
        assert_eq!(not_taken.cpu().pc, Pointer::new(0, 2));

        let mut taken = vm();
        taken.segments.memory.insert(Pointer::new(0, 0), word).unwrap();
        taken
            .segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(4u64))
            .unwrap();
        taken
            .segments
            .memory
            .insert(Pointer::new(1, 0), Value::from(3u64))
            .unwrap();
        set_registers(&mut taken, (0, 0), 1, 1);
        taken.step().unwrap();
        assert_eq!(taken.cpu().pc, Pointer::new(0, 4));
    }

    #[test]
    fn step_assert_eq_mismatch() {
        let mut vm = vm();
        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::from(0x480680017fff8000u64))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(5u64))
            .unwrap();
        // The destination is already frozen to a different value.
        vm.segments
            .memory
            .insert(Pointer::new(1, 2), Value::from(6u64))
            .unwrap();
        set_registers(&mut vm, (0, 0), 2, 2);

        assert_matches!(
            vm.step(),
            Err(Error::DiffAssertValues { dst, res: Some(res) })
                if dst == Value::from(6u64) && res == Value::from(5u64)
        );
        // Nothing was committed.
        assert_eq!(vm.cpu().pc, Pointer::new(0, 0));
        assert_eq!(vm.current_step(), 0);
    }

    #[test]
    fn step_call_with_clobbered_return_cell() {
        let mut vm = vm();
        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::from(0x1104800180018000u64))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(3u64))
            .unwrap();
        // [ap + 1] must receive the return address, but it already holds
        // something else.
        vm.segments
            .memory
            .insert(Pointer::new(1, 3), Value::from(99u64))
            .unwrap();
        set_registers(&mut vm, (0, 0), 2, 2);

        assert_matches!(
            vm.step(),
            Err(Error::CallDidNotReturnFP { op0: Some(op0), .. })
                if op0 == Value::from(99u64)
        );
        // The deduced saved-fp was already committed when the opcode check
        // failed the step.
        assert_eq!(
            vm.memory().get(Pointer::new(1, 2)),
            Some(Value::Pointer(Pointer::new(1, 2)))
        );
    }

    struct EchoBuiltin;

    impl Builtin for EchoBuiltin {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn deduce(&self, addr: Pointer, _memory: &Memory) -> Option<Value> {
            Some(Value::from(addr.offset as u64 * 2))
        }
    }

    #[test]
    fn step_deduces_builtin_cells() {
        // [ap] = [[fp - 1]], where [fp - 1] points into the builtin segment.
        let mut vm = vm();
        let builtin_base = vm.add_builtin(Box::new(EchoBuiltin));
        assert_eq!(builtin_base, Pointer::new(2, 0));

        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::from(0x4002_8000_7FFF_8000u64))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(1, 1), Value::Pointer(Pointer::new(2, 5)))
            .unwrap();
        set_registers(&mut vm, (0, 0), 2, 2);

        vm.step().unwrap();

        // The builtin deduced cell (2, 5) = 10, which became op1, res and
        // finally the written destination.
        assert_eq!(vm.memory().get(Pointer::new(2, 5)), Some(Value::from(10u64)));
        assert_eq!(vm.memory().get(Pointer::new(1, 2)), Some(Value::from(10u64)));
    }

    #[test]
    fn fetch_failures() {
        let mut vm = vm();
        set_registers(&mut vm, (0, 0), 0, 0);
        assert_matches!(vm.step(), Err(Error::InstructionFetchingFailed(_)));

        // A value above 2^64 cannot encode an instruction.
        let mut vm = self::vm();
        vm.segments
            .memory
            .insert(
                Pointer::new(0, 0),
                Value::Scalar(Felt::from(1u128 << 64)),
            )
            .unwrap();
        set_registers(&mut vm, (0, 0), 0, 0);
        assert_matches!(vm.step(), Err(Error::InstructionEncodingError(_)));

        // Neither can an address.
        let mut vm = self::vm();
        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::Pointer(Pointer::new(1, 0)))
            .unwrap();
        set_registers(&mut vm, (0, 0), 0, 0);
        assert_matches!(vm.step(), Err(Error::InstructionEncodingError(_)));
    }

    #[test]
    fn trace_records_pre_step_registers() {
        let mut vm = vm();
        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::from(0x480680017fff8000u64))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(5u64))
            .unwrap();
        set_registers(&mut vm, (0, 0), 2, 2);

        vm.step().unwrap();

        assert_eq!(
            vm.trace(),
            Some(
                &[TraceEntry {
                    pc: Pointer::new(0, 0),
                    ap: 2,
                    fp: 2,
                }][..]
            )
        );
    }

    #[test]
    fn tracing_can_be_disabled() {
        let mut vm = CairoVM::new(false);
        vm.segments.add();
        vm.segments.add();
        vm.segments
            .memory
            .insert(Pointer::new(0, 0), Value::from(0x480680017fff8000u64))
            .unwrap();
        vm.segments
            .memory
            .insert(Pointer::new(0, 1), Value::from(5u64))
            .unwrap();
        set_registers(&mut vm, (0, 0), 2, 2);

        vm.step().unwrap();
        assert_eq!(vm.trace(), None);
    }
}

//! Defines the [`Cpu`] type, responsible for holding the registers of the
//! virtual machine and resolving operand addresses.

use crate::error::Error;
use crate::instr::{Instruction, Op1Src, Register};
use crate::memory::{Pointer, Value};

/// The segment that holds the execution stack. `ap` and `fp` always live
/// there once the runner has laid out its segments.
const EXECUTION_SEGMENT: isize = 1;

/// The register file of the Cairo virtual machine.
///
/// # Invariants
///
/// The **Program Counter** always points into the program segment (absolute
/// jumps may move it across segments, but it must reference a cell holding an
/// instruction).
///
/// The **Allocation Pointer** and **Frame Pointer** always reside in the
/// execution segment, so only their offsets are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    /// The Program Counter, pointing to the next instruction to fetch.
    pub pc: Pointer,
    /// The Allocation Pointer, as an offset into the execution segment. It is
    /// bumped by most instructions that write to working memory.
    pub ap: usize,
    /// The Frame Pointer, as an offset into the execution segment. It points
    /// to the base of the current call frame.
    pub fp: usize,
}

impl Cpu {
    /// Creates a new register file.
    pub const fn new(pc: Pointer, ap: usize, fp: usize) -> Self {
        Self { pc, ap, fp }
    }

    /// The allocation pointer as a full address.
    #[inline]
    pub const fn get_ap(&self) -> Pointer {
        Pointer::new(EXECUTION_SEGMENT, self.ap)
    }

    /// The frame pointer as a full address.
    #[inline]
    pub const fn get_fp(&self) -> Pointer {
        Pointer::new(EXECUTION_SEGMENT, self.fp)
    }

    /// The address of the destination operand: `dst_reg + off0`.
    pub fn compute_dst_addr(&self, instruction: &Instruction) -> Result<Pointer, Error> {
        let base = match instruction.dst_reg {
            Register::AP => self.get_ap(),
            Register::FP => self.get_fp(),
        };
        base.add_int(instruction.off0 as isize)
    }

    /// The address of the first operand: `op0_reg + off1`.
    pub fn compute_op0_addr(&self, instruction: &Instruction) -> Result<Pointer, Error> {
        let base = match instruction.op0_reg {
            Register::AP => self.get_ap(),
            Register::FP => self.get_fp(),
        };
        base.add_int(instruction.off1 as isize)
    }

    /// The address of the second operand: `op1_src + off2`.
    ///
    /// In immediate mode the base is the program counter and `off2` must be
    /// exactly 1 so the operand is the cell right after the instruction. In
    /// `Op0` mode the base is the *value* of the first operand, which must
    /// therefore be a known address.
    pub fn compute_op1_addr(
        &self,
        instruction: &Instruction,
        op0: Option<&Value>,
    ) -> Result<Pointer, Error> {
        let base = match instruction.op1_src {
            Op1Src::FP => self.get_fp(),
            Op1Src::AP => self.get_ap(),
            Op1Src::Imm => {
                if instruction.off2 == 1 {
                    self.pc
                } else {
                    return Err(Error::ImmShouldBe1);
                }
            }
            Op1Src::Op0 => match op0 {
                Some(Value::Pointer(pointer)) => *pointer,
                Some(Value::Scalar(felt)) => return Err(Error::ExpectedRelocatable(*felt)),
                None => return Err(Error::UnknownOp0),
            },
        };
        base.add_int(instruction.off2 as isize)
    }
}

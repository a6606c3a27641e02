//! Defines the [`Error`] type of the crate.

use groudon_felt::Felt;

use crate::memory::{Pointer, Value};

/// An error that might occur when executing a Cairo program.
///
/// The taxonomy is deliberately flat: every failure of the fetch loop, the
/// decoder, the memory or the register file surfaces as one of these
/// variants, and callers are expected to match on the specific kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    // Decoding.
    /// Bit 63 of an encoded instruction must always be zero.
    #[error("instruction {0:#018x} has its high bit set")]
    NonZeroHighBit(u64),
    /// The op1 source field of an instruction holds an undefined value.
    #[error("invalid op1 register flag: {0}")]
    InvalidOp1Reg(u64),
    /// The result logic field of an instruction holds an undefined value.
    #[error("invalid result logic flag: {0}")]
    InvalidResLogic(u64),
    /// The pc update field of an instruction holds an undefined value.
    #[error("invalid pc update flag: {0}")]
    InvalidPcUpdate(u64),
    /// The ap update field of an instruction holds an undefined value.
    #[error("invalid ap update flag: {0}")]
    InvalidApUpdate(u64),
    /// The opcode field of an instruction holds an undefined value.
    #[error("invalid opcode flag: {0}")]
    InvalidOpcode(u64),

    // Fetching.
    /// The program counter points to a memory cell that was never written.
    #[error("failed to fetch an instruction: memory at {0} is empty")]
    InstructionFetchingFailed(Pointer),
    /// The cell under the program counter does not hold a 64-bit scalar.
    #[error("the value at {0} does not fit in a 64-bit instruction word")]
    InstructionEncodingError(Pointer),

    // Addressing.
    /// Offset arithmetic on an address left the valid range.
    #[error("offset arithmetic on address {0} went out of range")]
    OffsetExceeded(Pointer),
    /// Two addresses from different segments cannot be subtracted.
    #[error("cannot subtract {1} from {0}: the segments differ")]
    InvalidSub(Pointer, Pointer),
    /// In immediate mode, the op1 offset must be exactly 1.
    #[error("in immediate mode, off2 should be 1")]
    ImmShouldBe1,
    /// The op1 address is a double dereference, but op0 is not known.
    #[error("op0 must be known in double dereference")]
    UnknownOp0,

    // Typing.
    /// An integer value was expected, but the cell holds an address.
    #[error("expected an integer value, got address {0}")]
    ExpectedInteger(Pointer),
    /// An address was expected, but the cell holds an integer.
    #[error("expected a relocatable value, got integer {0}")]
    ExpectedRelocatable(Felt),
    /// The operation is only defined over plain field values.
    #[error("operation is only defined over field values, got an address")]
    PureValue,
    /// Two addresses cannot be added together.
    #[error("cannot add two relocatable values")]
    RelocatableAdd,

    // Memory.
    /// A second write to a cell tried to change its value.
    #[error("memory at {addr} is already set to {current}; cannot write {attempted}")]
    InconsistentMemory {
        /// The address of the cell.
        addr: Pointer,
        /// The value the cell was first asserted to.
        current: Value,
        /// The conflicting value of the rejected write.
        attempted: Value,
    },
    /// The address references a segment that was never allocated.
    #[error("segment {segment} has not been allocated")]
    UnallocatedSegment {
        /// The index of the missing segment.
        segment: isize,
    },

    // Deduction and opcode assertions.
    /// The destination operand could neither be read nor deduced.
    #[error("couldn't compute or deduce the destination operand")]
    NoDst,
    /// An `AssertEq` instruction found differing values.
    #[error("assertion failed: {dst} != {res:?}")]
    DiffAssertValues {
        /// The destination operand.
        dst: Value,
        /// The computed result, if any.
        res: Option<Value>,
    },
    /// A `Call` instruction did not save the frame pointer to dst.
    #[error("call must save the frame pointer to dst: expected {expected}, got {dst:?}")]
    CallDidNotSaveFP {
        /// The destination operand found in memory.
        dst: Option<Value>,
        /// The current frame pointer.
        expected: Value,
    },
    /// A `Call` instruction did not store the return address to op0.
    #[error("call must write the return address to op0: expected {expected}, got {op0:?}")]
    CallDidNotReturnFP {
        /// The op0 operand found in memory.
        op0: Option<Value>,
        /// The expected return address.
        expected: Value,
    },

    // Register updates.
    /// An absolute jump requires a relocatable result.
    #[error("jump destination is not relocatable")]
    JumpNotRelocatable,
    /// The result is unconstrained, so the program counter cannot be updated.
    #[error("res is unconstrained; cannot update the program counter")]
    UnconstrainedResJump,
    /// The result is unconstrained, so it cannot be added to ap.
    #[error("res is unconstrained; cannot apply ap += res")]
    UnconstrainedResAdd,
    /// The frame pointer can only be set to a relocatable destination.
    #[error("cannot set the frame pointer to integer value {0}")]
    FpUpdateInt(Felt),

    // Field arithmetic.
    /// Attempted to divide by zero.
    #[error("division by zero")]
    DivisionByZero,

    // Runner.
    /// A step was requested after the program already reached its end.
    #[error("execution reached the end of the program")]
    EndOfProgram,
    /// The run consumed its entire step budget.
    #[error("exceeded the maximum number of steps ({0})")]
    MaxStepsExceeded(usize),
}

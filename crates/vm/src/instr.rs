//! Defines the [`Instruction`] type, responsible for decoding a single 64-bit
//! Cairo bytecode word into its flags and offsets.
//!
//! # Encoding
//!
//! An encoded instruction packs three 16-bit offsets, biased by `2^15`, into
//! its low 48 bits, and fifteen flag bits into bits 48 to 62. Bit 63 must
//! always be zero:
//!
//! ```text
//! bit 63 62..60  59..58  57..55  54..53  52..50  49     48
//!     0  opcode  ap_upd  pc_upd  res_lg  op1_src op0reg dst_reg
//! bits 47..32  off2
//! bits 31..16  off1
//! bits 15..0   off0
//! ```

use crate::error::Error;

/// A register an operand offset can be relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// The **Allocation Pointer**.
    AP,
    /// The **Frame Pointer**.
    FP,
}

/// The source of the second operand of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op1Src {
    /// The address computed for the first operand, dereferenced.
    Op0,
    /// The cell right after the instruction: an immediate value.
    Imm,
    /// The **Frame Pointer**.
    FP,
    /// The **Allocation Pointer**.
    AP,
}

/// How the result of an instruction is computed from its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResLogic {
    /// The result is the second operand.
    Op1,
    /// The result is `op0 + op1`.
    Add,
    /// The result is `op0 * op1`.
    Mul,
    /// The result is left unconstrained (conditional jumps).
    Unconstrained,
}

/// How the **Program Counter** is updated after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcUpdate {
    /// Advance by the size of the instruction.
    Regular,
    /// Jump to the result of the instruction.
    Jump,
    /// Add the result of the instruction to the program counter.
    JumpRel,
    /// Advance normally when dst is zero, jump by op1 otherwise.
    Jnz,
}

/// How the **Allocation Pointer** is updated after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApUpdate {
    /// The allocation pointer is left unchanged.
    Regular,
    /// The result of the instruction is added to the allocation pointer.
    Add,
    /// The allocation pointer is incremented by one.
    Add1,
    /// The allocation pointer is incremented by two (calls).
    Add2,
}

/// How the **Frame Pointer** is updated after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FpUpdate {
    /// The frame pointer is left unchanged.
    Regular,
    /// The frame pointer becomes `ap + 2` (calls).
    ApPlus2,
    /// The frame pointer becomes the destination operand (returns).
    Dst,
}

/// The opcode of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// The instruction carries no opcode-specific assertion.
    NOp,
    /// The instruction calls into a subroutine.
    Call,
    /// The instruction returns from a subroutine.
    Ret,
    /// The instruction asserts a memory cell to a specific value.
    AssertEq,
}

// Positions of the flag groups within the high 16 bits of a word.
const DST_REG_BIT: u16 = 1 << 0;
const OP0_REG_BIT: u16 = 1 << 1;
const OP1_SRC_OFF: u16 = 2;
const RES_LOGIC_OFF: u16 = 5;
const PC_UPDATE_OFF: u16 = 7;
const AP_UPDATE_OFF: u16 = 10;
const OPCODE_OFF: u16 = 12;

/// A single decoded Cairo instruction.
///
/// Decoding is the only way to build one, so a value of this type always
/// represents a well-formed instruction; it is immutable from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The offset applied to the destination operand, in `[-2^15, 2^15)`.
    pub off0: i16,
    /// The offset applied to the first operand.
    pub off1: i16,
    /// The offset applied to the second operand.
    pub off2: i16,
    /// The register the destination operand is relative to.
    pub dst_reg: Register,
    /// The register the first operand is relative to.
    pub op0_reg: Register,
    /// Where the second operand is read from.
    pub op1_src: Op1Src,
    /// How the result is computed.
    pub res_logic: ResLogic,
    /// How the program counter is updated.
    pub pc_update: PcUpdate,
    /// How the allocation pointer is updated.
    pub ap_update: ApUpdate,
    /// How the frame pointer is updated. Fully determined by the opcode.
    pub fp_update: FpUpdate,
    /// The opcode of the instruction.
    pub opcode: Opcode,
}

impl Instruction {
    /// Decodes a 64-bit instruction word.
    ///
    /// Fails when bit 63 is set or when any flag group holds a value outside
    /// its accepted set.
    pub fn decode(encoded: u64) -> Result<Instruction, Error> {
        if encoded & (1 << 63) != 0 {
            return Err(Error::NonZeroHighBit(encoded));
        }

        let off0 = decode_offset(encoded & 0xffff);
        let off1 = decode_offset((encoded >> 16) & 0xffff);
        let off2 = decode_offset((encoded >> 32) & 0xffff);
        let flags = (encoded >> 48) as u16;

        let dst_reg = if flags & DST_REG_BIT != 0 {
            Register::FP
        } else {
            Register::AP
        };
        let op0_reg = if flags & OP0_REG_BIT != 0 {
            Register::FP
        } else {
            Register::AP
        };

        let op1_src = match (flags >> OP1_SRC_OFF) & 0x7 {
            0 => Op1Src::Op0,
            1 => Op1Src::Imm,
            2 => Op1Src::FP,
            4 => Op1Src::AP,
            value => return Err(Error::InvalidOp1Reg(value as u64)),
        };

        let pc_update = match (flags >> PC_UPDATE_OFF) & 0x7 {
            0 => PcUpdate::Regular,
            1 => PcUpdate::Jump,
            2 => PcUpdate::JumpRel,
            4 => PcUpdate::Jnz,
            value => return Err(Error::InvalidPcUpdate(value as u64)),
        };

        // A conditional jump leaves its result unconstrained.
        let res_logic = match ((flags >> RES_LOGIC_OFF) & 0x3, pc_update) {
            (0, PcUpdate::Jnz) => ResLogic::Unconstrained,
            (0, _) => ResLogic::Op1,
            (1, _) => ResLogic::Add,
            (2, _) => ResLogic::Mul,
            (value, _) => return Err(Error::InvalidResLogic(value as u64)),
        };

        let opcode = match (flags >> OPCODE_OFF) & 0x7 {
            0 => Opcode::NOp,
            1 => Opcode::Call,
            2 => Opcode::Ret,
            4 => Opcode::AssertEq,
            value => return Err(Error::InvalidOpcode(value as u64)),
        };

        // A call bumps ap by two to make room for the saved fp and return
        // address.
        let ap_update = match ((flags >> AP_UPDATE_OFF) & 0x3, opcode) {
            (0, Opcode::Call) => ApUpdate::Add2,
            (0, _) => ApUpdate::Regular,
            (1, _) => ApUpdate::Add,
            (2, _) => ApUpdate::Add1,
            (value, _) => return Err(Error::InvalidApUpdate(value as u64)),
        };

        let fp_update = match opcode {
            Opcode::Call => FpUpdate::ApPlus2,
            Opcode::Ret => FpUpdate::Dst,
            _ => FpUpdate::Regular,
        };

        Ok(Instruction {
            off0,
            off1,
            off2,
            dst_reg,
            op0_reg,
            op1_src,
            res_logic,
            pc_update,
            ap_update,
            fp_update,
            opcode,
        })
    }

    /// Re-encodes the instruction into its 64-bit word.
    ///
    /// This is the inverse of [`Instruction::decode`]: for every word that
    /// decodes successfully, encoding the result reproduces the word.
    pub fn encode(&self) -> u64 {
        let mut flags = 0u16;
        if self.dst_reg == Register::FP {
            flags |= DST_REG_BIT;
        }
        if self.op0_reg == Register::FP {
            flags |= OP0_REG_BIT;
        }
        flags |= match self.op1_src {
            Op1Src::Op0 => 0,
            Op1Src::Imm => 1,
            Op1Src::FP => 2,
            Op1Src::AP => 4,
        } << OP1_SRC_OFF;
        flags |= match self.res_logic {
            // Unconstrained only arises from a zero flag group under Jnz.
            ResLogic::Op1 | ResLogic::Unconstrained => 0,
            ResLogic::Add => 1,
            ResLogic::Mul => 2,
        } << RES_LOGIC_OFF;
        flags |= match self.pc_update {
            PcUpdate::Regular => 0,
            PcUpdate::Jump => 1,
            PcUpdate::JumpRel => 2,
            PcUpdate::Jnz => 4,
        } << PC_UPDATE_OFF;
        flags |= match self.ap_update {
            // Add2 only arises from a zero flag group under Call.
            ApUpdate::Regular | ApUpdate::Add2 => 0,
            ApUpdate::Add => 1,
            ApUpdate::Add1 => 2,
        } << AP_UPDATE_OFF;
        flags |= match self.opcode {
            Opcode::NOp => 0,
            Opcode::Call => 1,
            Opcode::Ret => 2,
            Opcode::AssertEq => 4,
        } << OPCODE_OFF;

        (flags as u64) << 48
            | encode_offset(self.off2) << 32
            | encode_offset(self.off1) << 16
            | encode_offset(self.off0)
    }

    /// The size of the instruction in memory cells: two when an immediate
    /// value follows the word, one otherwise.
    #[inline]
    pub const fn size(&self) -> usize {
        match self.op1_src {
            Op1Src::Imm => 2,
            _ => 1,
        }
    }
}

#[inline]
fn decode_offset(raw: u64) -> i16 {
    (raw as i32 - 0x8000) as i16
}

#[inline]
fn encode_offset(off: i16) -> u64 {
    (off as i32 + 0x8000) as u64
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    #[test]
    fn decode_call_add_jmp_add_imm_fp_fp() {
        let instruction = Instruction::decode(0x14A7_8000_8000_8000).unwrap();
        assert_eq!(
            instruction,
            Instruction {
                off0: 0,
                off1: 0,
                off2: 0,
                dst_reg: Register::FP,
                op0_reg: Register::FP,
                op1_src: Op1Src::Imm,
                res_logic: ResLogic::Add,
                pc_update: PcUpdate::Jump,
                ap_update: ApUpdate::Add,
                fp_update: FpUpdate::ApPlus2,
                opcode: Opcode::Call,
            }
        );
    }

    #[test]
    fn decode_ret_add1_jmp_rel_mul_fp_ap_ap() {
        let instruction = Instruction::decode(0x2948_8000_8000_8000).unwrap();
        assert_eq!(
            instruction,
            Instruction {
                off0: 0,
                off1: 0,
                off2: 0,
                dst_reg: Register::AP,
                op0_reg: Register::AP,
                op1_src: Op1Src::FP,
                res_logic: ResLogic::Mul,
                pc_update: PcUpdate::JumpRel,
                ap_update: ApUpdate::Add1,
                fp_update: FpUpdate::Dst,
                opcode: Opcode::Ret,
            }
        );
    }

    #[test]
    fn decode_biased_offsets() {
        let instruction = Instruction::decode(0x0000_8001_8000_7FFF).unwrap();
        assert_eq!(instruction.off0, -1);
        assert_eq!(instruction.off1, 0);
        assert_eq!(instruction.off2, 1);
        assert_eq!(instruction.dst_reg, Register::AP);
        assert_eq!(instruction.op0_reg, Register::AP);
        assert_eq!(instruction.op1_src, Op1Src::Op0);
        assert_eq!(instruction.res_logic, ResLogic::Op1);
        assert_eq!(instruction.pc_update, PcUpdate::Regular);
        assert_eq!(instruction.ap_update, ApUpdate::Regular);
        assert_eq!(instruction.fp_update, FpUpdate::Regular);
        assert_eq!(instruction.opcode, Opcode::NOp);
    }

    #[test]
    fn decode_offset_extremes() {
        let instruction = Instruction::decode(0x0000_FFFF_0000_0000).unwrap();
        assert_eq!(instruction.off0, i16::MIN);
        assert_eq!(instruction.off1, i16::MIN);
        assert_eq!(instruction.off2, i16::MAX);
    }

    #[test]
    fn decode_rejects_the_high_bit() {
        assert_matches!(
            Instruction::decode(0x94A7_8000_8000_8000),
            Err(Error::NonZeroHighBit(0x94A7_8000_8000_8000))
        );
    }

    #[test]
    fn decode_jnz_reinterprets_res_logic() {
        // jmp rel [pc + 1] if [ap - 1] != 0
        let instruction = Instruction::decode(0x0206_8001_7FFF_7FFF).unwrap();
        assert_eq!(instruction.pc_update, PcUpdate::Jnz);
        assert_eq!(instruction.res_logic, ResLogic::Unconstrained);
        assert_eq!(instruction.op1_src, Op1Src::Imm);
        assert_eq!(instruction.op0_reg, Register::FP);
        assert_eq!(instruction.off2, 1);
    }

    #[test]
    fn decode_call_forces_add2() {
        // call rel <imm>
        let instruction = Instruction::decode(0x1104_8001_8001_8000).unwrap();
        assert_eq!(instruction.opcode, Opcode::Call);
        assert_eq!(instruction.ap_update, ApUpdate::Add2);
        assert_eq!(instruction.fp_update, FpUpdate::ApPlus2);
        assert_eq!(instruction.size(), 2);
    }

    #[rstest]
    #[case::op1_src(0x0018_8000_8000_8000, Error::InvalidOp1Reg(6))]
    #[case::op1_src_alt(0x001C_8000_8000_8000, Error::InvalidOp1Reg(7))]
    #[case::res_logic(0x0060_8000_8000_8000, Error::InvalidResLogic(3))]
    #[case::pc_update(0x0180_8000_8000_8000, Error::InvalidPcUpdate(3))]
    #[case::pc_update_alt(0x0280_8000_8000_8000, Error::InvalidPcUpdate(5))]
    #[case::ap_update(0x0C00_8000_8000_8000, Error::InvalidApUpdate(3))]
    #[case::opcode(0x3000_8000_8000_8000, Error::InvalidOpcode(3))]
    #[case::opcode_alt(0x5000_8000_8000_8000, Error::InvalidOpcode(5))]
    fn decode_rejects_invalid_flag_groups(#[case] encoded: u64, #[case] expected: Error) {
        assert_eq!(Instruction::decode(encoded).unwrap_err(), expected);
    }

    #[rstest]
    #[case(0x14A7_8000_8000_8000)]
    #[case(0x2948_8000_8000_8000)]
    #[case(0x0000_8001_8000_7FFF)]
    #[case(0x0206_8001_7FFF_7FFF)]
    #[case(0x1104_8001_8001_8000)]
    #[case(0x4806_8001_7FFF_8000)]
    #[case(0x208B_7FFF_7FFF_7FFE)]
    fn decode_encode_round_trip(#[case] encoded: u64) {
        let instruction = Instruction::decode(encoded).unwrap();
        assert_eq!(instruction.encode(), encoded);
    }

    #[test]
    fn instruction_size_follows_op1_src() {
        let ret = Instruction::decode(0x208B_7FFF_7FFF_7FFE).unwrap();
        assert_eq!(ret.size(), 1);
        let assert_imm = Instruction::decode(0x4806_8001_7FFF_8000).unwrap();
        assert_eq!(assert_imm.size(), 2);
    }

    #[test]
    fn decoded_offsets_stay_in_range() {
        for encoded in [
            0x0000_0000_0000_0000u64,
            0x0000_FFFF_FFFF_FFFF,
            0x0000_8000_8000_8000,
        ] {
            let instruction = Instruction::decode(encoded).unwrap();
            for off in [instruction.off0, instruction.off1, instruction.off2] {
                assert!((-(1 << 15)..(1 << 15)).contains(&(off as i32)));
            }
        }
    }
}

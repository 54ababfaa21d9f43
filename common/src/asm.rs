
use std::fmt;

use derive_more::{IsVariant, Unwrap};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;

// All instructions are one word; the opcode is the top nibble.
pub const OPCODE_SHIFT: u16 = 12;

// Register fields sit at fixed positions in every encoding that has them.
pub const DR_SHIFT: u16 = 9;
pub const SR_SHIFT: u16 = 6;

fn field_mask(bits: u32) -> u16 {
    (1u16 << bits) - 1
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Reg {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

pub const NUM_REGS: usize = 8;

impl Reg {
    pub const NUM_BITS: u16 = 3;
    pub const MASK: u16 = (1u16 << Self::NUM_BITS) - 1;

    // R7 doubles as the subroutine linkage register.
    pub const LINK: Reg = Reg::R7;
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum ArithOpcode {
    Add = 0x1,
    And = 0x5,
}

impl fmt::Display for ArithOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

/// Second operand of ADD/AND: bit 5 selects a register or a five-bit
/// immediate. The immediate is held sign-extended to a full word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum Src2 {
    Reg(Reg),
    Imm(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithIns {
    pub op: ArithOpcode,
    pub dr: Reg,
    pub sr1: Reg,
    pub src2: Src2,
}

impl ArithIns {
    pub const IMM_FLAG: u16 = 1 << 5;
    pub const IMM_BITS: u32 = 5;

    pub fn encode(&self) -> u16 {
        let bin = (self.op.to_u16().unwrap() << OPCODE_SHIFT)
            | (self.dr.to_u16().unwrap() << DR_SHIFT)
            | (self.sr1.to_u16().unwrap() << SR_SHIFT);
        match self.src2 {
            Src2::Reg(sr2) => bin | sr2.to_u16().unwrap(),
            Src2::Imm(imm) => bin | Self::IMM_FLAG | (imm & field_mask(Self::IMM_BITS)),
        }
    }
}

impl fmt::Display for ArithIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}, {}", self.op, self.dr, self.sr1)?;
        match self.src2 {
            Src2::Reg(sr2) => write!(f, ", {sr2}"),
            Src2::Imm(imm) => write!(f, ", #{}", imm as i16),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotIns {
    pub dr: Reg,
    pub sr: Reg,
}

impl NotIns {
    pub const OPCODE: u16 = 0x9;
    // The low six bits are all ones in the fixed encoding.
    const LOW_BITS: u16 = 0x3f;

    pub fn encode(&self) -> u16 {
        (Self::OPCODE << OPCODE_SHIFT)
            | (self.dr.to_u16().unwrap() << DR_SHIFT)
            | (self.sr.to_u16().unwrap() << SR_SHIFT)
            | Self::LOW_BITS
    }
}

impl fmt::Display for NotIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "not\t{}, {}", self.dr, self.sr)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Branch on any of the requested condition flags. An empty mask is the
/// architecture's NOP: it can never be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchIns {
    pub n: bool,
    pub z: bool,
    pub p: bool,
    pub offset: u16,
}

impl BranchIns {
    pub const OPCODE: u16 = 0x0;
    pub const N_SHIFT: u16 = 11;
    pub const Z_SHIFT: u16 = 10;
    pub const P_SHIFT: u16 = 9;
    pub const OFFSET_BITS: u32 = 9;

    pub fn encode(&self) -> u16 {
        (Self::OPCODE << OPCODE_SHIFT)
            | ((self.n as u16) << Self::N_SHIFT)
            | ((self.z as u16) << Self::Z_SHIFT)
            | ((self.p as u16) << Self::P_SHIFT)
            | (self.offset & field_mask(Self::OFFSET_BITS))
    }

    fn mnemonic(&self) -> String {
        let mut name = String::from("br");
        if self.n {
            name.push('n');
        }
        if self.z {
            name.push('z');
        }
        if self.p {
            name.push('p');
        }
        name
    }
}

impl fmt::Display for BranchIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t#{}", self.mnemonic(), self.offset as i16)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JmpIns {
    pub base: Reg,
}

impl JmpIns {
    pub const OPCODE: u16 = 0xc;

    pub fn encode(&self) -> u16 {
        (Self::OPCODE << OPCODE_SHIFT) | (self.base.to_u16().unwrap() << SR_SHIFT)
    }
}

impl fmt::Display for JmpIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.base == Reg::LINK {
            write!(f, "ret")
        } else {
            write!(f, "jmp\t{}", self.base)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Call target: bit 11 selects a PC-relative offset (JSR) or a base register
/// (JSRR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum JsrTarget {
    Rel(u16),
    Reg(Reg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsrIns {
    pub target: JsrTarget,
}

impl JsrIns {
    pub const OPCODE: u16 = 0x4;
    pub const LONG_FLAG: u16 = 1 << 11;
    pub const OFFSET_BITS: u32 = 11;

    pub fn encode(&self) -> u16 {
        let bin = Self::OPCODE << OPCODE_SHIFT;
        match self.target {
            JsrTarget::Rel(offset) => {
                bin | Self::LONG_FLAG | (offset & field_mask(Self::OFFSET_BITS))
            }
            JsrTarget::Reg(base) => bin | (base.to_u16().unwrap() << SR_SHIFT),
        }
    }
}

impl fmt::Display for JsrIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.target {
            JsrTarget::Rel(offset) => write!(f, "jsr\t#{}", offset as i16),
            JsrTarget::Reg(base) => write!(f, "jsrr\t{base}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum LoadOpcode {
    Ld = 0x2,
    Ldi = 0xa,
    Lea = 0xe,
}

impl fmt::Display for LoadOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

/// The PC-relative load family: direct (LD), indirect (LDI), and address
/// computation without a memory touch (LEA).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadIns {
    pub op: LoadOpcode,
    pub dr: Reg,
    pub offset: u16,
}

impl LoadIns {
    pub const OFFSET_BITS: u32 = 9;

    pub fn encode(&self) -> u16 {
        (self.op.to_u16().unwrap() << OPCODE_SHIFT)
            | (self.dr.to_u16().unwrap() << DR_SHIFT)
            | (self.offset & field_mask(Self::OFFSET_BITS))
    }
}

impl fmt::Display for LoadIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}, #{}", self.op, self.dr, self.offset as i16)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LdrIns {
    pub dr: Reg,
    pub base: Reg,
    pub offset: u16,
}

impl LdrIns {
    pub const OPCODE: u16 = 0x6;
    pub const OFFSET_BITS: u32 = 6;

    pub fn encode(&self) -> u16 {
        (Self::OPCODE << OPCODE_SHIFT)
            | (self.dr.to_u16().unwrap() << DR_SHIFT)
            | (self.base.to_u16().unwrap() << SR_SHIFT)
            | (self.offset & field_mask(Self::OFFSET_BITS))
    }
}

impl fmt::Display for LdrIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ldr\t{}, {}, #{}", self.dr, self.base, self.offset as i16)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum StoreOpcode {
    St = 0x3,
    Sti = 0xb,
}

impl fmt::Display for StoreOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreIns {
    pub op: StoreOpcode,
    pub sr: Reg,
    pub offset: u16,
}

impl StoreIns {
    pub const OFFSET_BITS: u32 = 9;

    pub fn encode(&self) -> u16 {
        (self.op.to_u16().unwrap() << OPCODE_SHIFT)
            | (self.sr.to_u16().unwrap() << DR_SHIFT)
            | (self.offset & field_mask(Self::OFFSET_BITS))
    }
}

impl fmt::Display for StoreIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}, #{}", self.op, self.sr, self.offset as i16)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrIns {
    pub sr: Reg,
    pub base: Reg,
    pub offset: u16,
}

impl StrIns {
    pub const OPCODE: u16 = 0x7;
    pub const OFFSET_BITS: u32 = 6;

    pub fn encode(&self) -> u16 {
        (Self::OPCODE << OPCODE_SHIFT)
            | (self.sr.to_u16().unwrap() << DR_SHIFT)
            | (self.base.to_u16().unwrap() << SR_SHIFT)
            | (self.offset & field_mask(Self::OFFSET_BITS))
    }
}

impl fmt::Display for StrIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "str\t{}, {}, #{}", self.sr, self.base, self.offset as i16)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum TrapVector {
    Getc = 0x20,
    Out = 0x21,
    Puts = 0x22,
    In = 0x23,
    Putsp = 0x24,
    Halt = 0x25,
}

impl fmt::Display for TrapVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapIns {
    pub vector: u16,
}

impl TrapIns {
    pub const OPCODE: u16 = 0xf;
    pub const VECTOR_MASK: u16 = 0xff;

    pub fn new(vector: TrapVector) -> TrapIns {
        TrapIns {
            vector: vector.to_u16().unwrap(),
        }
    }

    pub fn encode(&self) -> u16 {
        (Self::OPCODE << OPCODE_SHIFT) | (self.vector & Self::VECTOR_MASK)
    }
}

impl fmt::Display for TrapIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use num_traits::FromPrimitive;
        match TrapVector::from_u16(self.vector) {
            Some(vector) => write!(f, "{vector}"),
            None => write!(f, "trap\tx{:02x}", self.vector),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

// Neither opcode has defined behavior in this machine.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum ReservedOpcode {
    Rti = 0x8,
    Res = 0xd,
}

impl fmt::Display for ReservedOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Unwrap)]
pub enum Ins {
    Arith(ArithIns),
    Not(NotIns),
    Branch(BranchIns),
    Jmp(JmpIns),
    Jsr(JsrIns),
    Load(LoadIns),
    Ldr(LdrIns),
    Store(StoreIns),
    Str(StrIns),
    Trap(TrapIns),
    Reserved(ReservedOpcode),
}

impl Ins {
    pub fn encode(&self) -> u16 {
        match self {
            Ins::Arith(ins) => ins.encode(),
            Ins::Not(ins) => ins.encode(),
            Ins::Branch(ins) => ins.encode(),
            Ins::Jmp(ins) => ins.encode(),
            Ins::Jsr(ins) => ins.encode(),
            Ins::Load(ins) => ins.encode(),
            Ins::Ldr(ins) => ins.encode(),
            Ins::Store(ins) => ins.encode(),
            Ins::Str(ins) => ins.encode(),
            Ins::Trap(ins) => ins.encode(),
            Ins::Reserved(op) => op.to_u16().unwrap() << OPCODE_SHIFT,
        }
    }

    pub fn display_with_pc(&self, pc: u16) -> DisplayWithPc<'_> {
        DisplayWithPc { ins: self, pc }
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ins::Arith(ins) => fmt::Display::fmt(ins, f),
            Ins::Not(ins) => fmt::Display::fmt(ins, f),
            Ins::Branch(ins) => fmt::Display::fmt(ins, f),
            Ins::Jmp(ins) => fmt::Display::fmt(ins, f),
            Ins::Jsr(ins) => fmt::Display::fmt(ins, f),
            Ins::Load(ins) => fmt::Display::fmt(ins, f),
            Ins::Ldr(ins) => fmt::Display::fmt(ins, f),
            Ins::Store(ins) => fmt::Display::fmt(ins, f),
            Ins::Str(ins) => fmt::Display::fmt(ins, f),
            Ins::Trap(ins) => fmt::Display::fmt(ins, f),
            Ins::Reserved(op) => fmt::Display::fmt(op, f),
        }
    }
}

/// Like `Display`, but PC-relative operands are resolved against the address
/// of the instruction, which reads better in an execution trace.
pub struct DisplayWithPc<'a> {
    ins: &'a Ins,
    pc: u16,
}

impl fmt::Display for DisplayWithPc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Targets are relative to the incremented PC.
        let pc = self.pc.wrapping_add(1);
        match self.ins {
            Ins::Branch(ins) => {
                write!(f, "{}\tx{:04x}", ins.mnemonic(), pc.wrapping_add(ins.offset))
            }
            Ins::Jsr(JsrIns {
                target: JsrTarget::Rel(offset),
            }) => write!(f, "jsr\tx{:04x}", pc.wrapping_add(*offset)),
            Ins::Load(ins) => {
                write!(f, "{}\t{}, x{:04x}", ins.op, ins.dr, pc.wrapping_add(ins.offset))
            }
            Ins::Store(ins) => {
                write!(f, "{}\t{}, x{:04x}", ins.op, ins.sr, pc.wrapping_add(ins.offset))
            }
            ins => fmt::Display::fmt(ins, f),
        }
    }
}

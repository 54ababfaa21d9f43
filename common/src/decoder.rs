
use num_traits::FromPrimitive;

use super::asm::*;

/// Widen the low `bits` bits of `val` to 16 bits, replicating the sign bit.
/// Every immediate and offset field goes through this before any address or
/// arithmetic use.
pub fn sign_extend(val: u16, bits: u32) -> u16 {
    assert!((1..=u16::BITS).contains(&bits));
    if bits == u16::BITS {
        return val;
    }

    let val = val & ((1 << bits) - 1);
    if (val >> (bits - 1)) & 1 == 1 {
        val | (u16::MAX << bits)
    } else {
        val
    }
}

fn opcode(word: u16) -> u16 {
    word >> OPCODE_SHIFT
}

fn reg(word: u16, shift: u16) -> Reg {
    Reg::from_u16((word >> shift) & Reg::MASK).unwrap()
}

fn decode_arith_ins(word: u16) -> Option<Ins> {
    let op = ArithOpcode::from_u16(opcode(word))?;

    let src2 = if word & ArithIns::IMM_FLAG != 0 {
        Src2::Imm(sign_extend(word, ArithIns::IMM_BITS))
    } else {
        Src2::Reg(reg(word, 0))
    };

    Some(Ins::Arith(ArithIns {
        op,
        dr: reg(word, DR_SHIFT),
        sr1: reg(word, SR_SHIFT),
        src2,
    }))
}

fn decode_not_ins(word: u16) -> Option<Ins> {
    if opcode(word) != NotIns::OPCODE {
        return None;
    }
    Some(Ins::Not(NotIns {
        dr: reg(word, DR_SHIFT),
        sr: reg(word, SR_SHIFT),
    }))
}

fn decode_branch_ins(word: u16) -> Option<Ins> {
    if opcode(word) != BranchIns::OPCODE {
        return None;
    }
    Some(Ins::Branch(BranchIns {
        n: word & (1 << BranchIns::N_SHIFT) != 0,
        z: word & (1 << BranchIns::Z_SHIFT) != 0,
        p: word & (1 << BranchIns::P_SHIFT) != 0,
        offset: sign_extend(word, BranchIns::OFFSET_BITS),
    }))
}

fn decode_jmp_ins(word: u16) -> Option<Ins> {
    if opcode(word) != JmpIns::OPCODE {
        return None;
    }
    Some(Ins::Jmp(JmpIns {
        base: reg(word, SR_SHIFT),
    }))
}

fn decode_jsr_ins(word: u16) -> Option<Ins> {
    if opcode(word) != JsrIns::OPCODE {
        return None;
    }
    let target = if word & JsrIns::LONG_FLAG != 0 {
        JsrTarget::Rel(sign_extend(word, JsrIns::OFFSET_BITS))
    } else {
        JsrTarget::Reg(reg(word, SR_SHIFT))
    };
    Some(Ins::Jsr(JsrIns { target }))
}

fn decode_load_ins(word: u16) -> Option<Ins> {
    let op = LoadOpcode::from_u16(opcode(word))?;
    Some(Ins::Load(LoadIns {
        op,
        dr: reg(word, DR_SHIFT),
        offset: sign_extend(word, LoadIns::OFFSET_BITS),
    }))
}

fn decode_ldr_ins(word: u16) -> Option<Ins> {
    if opcode(word) != LdrIns::OPCODE {
        return None;
    }
    Some(Ins::Ldr(LdrIns {
        dr: reg(word, DR_SHIFT),
        base: reg(word, SR_SHIFT),
        offset: sign_extend(word, LdrIns::OFFSET_BITS),
    }))
}

fn decode_store_ins(word: u16) -> Option<Ins> {
    let op = StoreOpcode::from_u16(opcode(word))?;
    Some(Ins::Store(StoreIns {
        op,
        sr: reg(word, DR_SHIFT),
        offset: sign_extend(word, StoreIns::OFFSET_BITS),
    }))
}

fn decode_str_ins(word: u16) -> Option<Ins> {
    if opcode(word) != StrIns::OPCODE {
        return None;
    }
    Some(Ins::Str(StrIns {
        sr: reg(word, DR_SHIFT),
        base: reg(word, SR_SHIFT),
        offset: sign_extend(word, StrIns::OFFSET_BITS),
    }))
}

fn decode_trap_ins(word: u16) -> Option<Ins> {
    if opcode(word) != TrapIns::OPCODE {
        return None;
    }
    Some(Ins::Trap(TrapIns {
        vector: word & TrapIns::VECTOR_MASK,
    }))
}

fn decode_reserved_ins(word: u16) -> Option<Ins> {
    ReservedOpcode::from_u16(opcode(word)).map(Ins::Reserved)
}

type Decoder = fn(u16) -> Option<Ins>;

const DECODERS: &[Decoder] = &[
    decode_arith_ins,
    decode_not_ins,
    decode_branch_ins,
    decode_jmp_ins,
    decode_jsr_ins,
    decode_load_ins,
    decode_ldr_ins,
    decode_store_ins,
    decode_str_ins,
    decode_trap_ins,
    decode_reserved_ins,
];

/// Total: the families cover all sixteen values of the 4-bit tag, so the
/// fall-through can only mean the decoder itself is broken.
pub fn decode(word: u16) -> Ins {
    for decoder in DECODERS {
        if let Some(ins) = decoder(word) {
            return ins;
        }
    }

    panic!("Invalid instruction {word:#06x}");
}

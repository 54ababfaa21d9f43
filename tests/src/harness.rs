use std::sync::Arc;

use common::asm::*;
use common::constants::PC_START;
use common::misc::WriteU16Be;
use emu_lib::Emulator;
use emu_lib::io::pipe::PipeConsole;

pub fn pipe_emulator() -> (Emulator, Arc<PipeConsole>) {
    let console = Arc::new(PipeConsole::default());
    (Emulator::with_console(console.clone()), console)
}

/// Load `words` at the entry address and run to a halt.
pub fn run_words(words: &[u16]) -> Emulator {
    let (mut emu, _console) = pipe_emulator();
    emu.load_words(words, PC_START);
    emu.run().unwrap();
    emu
}

/// Serialize an image the way it lives on disk: big-endian origin word, then
/// big-endian payload words.
pub fn image_bytes(origin: u16, words: &[u16]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 * (words.len() + 1));
    buf.write_u16_be(origin).unwrap();
    for word in words {
        buf.write_u16_be(*word).unwrap();
    }
    buf
}

pub fn output_string(console: &PipeConsole) -> String {
    let mut buf = console.take_output();
    buf.make_contiguous();
    String::from_utf8_lossy(buf.as_slices().0).into_owned()
}

////////////////////////////////////////////////////////////////////////////////
// Word builders, one per mnemonic. Offsets and immediates are taken signed
// and masked down by encode().

pub fn add_reg(dr: Reg, sr1: Reg, sr2: Reg) -> u16 {
    ArithIns {
        op: ArithOpcode::Add,
        dr,
        sr1,
        src2: Src2::Reg(sr2),
    }
    .encode()
}

pub fn add_imm(dr: Reg, sr1: Reg, imm: i16) -> u16 {
    ArithIns {
        op: ArithOpcode::Add,
        dr,
        sr1,
        src2: Src2::Imm(imm as u16),
    }
    .encode()
}

pub fn and_reg(dr: Reg, sr1: Reg, sr2: Reg) -> u16 {
    ArithIns {
        op: ArithOpcode::And,
        dr,
        sr1,
        src2: Src2::Reg(sr2),
    }
    .encode()
}

pub fn and_imm(dr: Reg, sr1: Reg, imm: i16) -> u16 {
    ArithIns {
        op: ArithOpcode::And,
        dr,
        sr1,
        src2: Src2::Imm(imm as u16),
    }
    .encode()
}

pub fn not(dr: Reg, sr: Reg) -> u16 {
    NotIns { dr, sr }.encode()
}

pub fn br(n: bool, z: bool, p: bool, offset: i16) -> u16 {
    BranchIns {
        n,
        z,
        p,
        offset: offset as u16,
    }
    .encode()
}

pub fn jmp(base: Reg) -> u16 {
    JmpIns { base }.encode()
}

pub fn jsr(offset: i16) -> u16 {
    JsrIns {
        target: JsrTarget::Rel(offset as u16),
    }
    .encode()
}

pub fn jsrr(base: Reg) -> u16 {
    JsrIns {
        target: JsrTarget::Reg(base),
    }
    .encode()
}

pub fn ld(dr: Reg, offset: i16) -> u16 {
    LoadIns {
        op: LoadOpcode::Ld,
        dr,
        offset: offset as u16,
    }
    .encode()
}

pub fn ldi(dr: Reg, offset: i16) -> u16 {
    LoadIns {
        op: LoadOpcode::Ldi,
        dr,
        offset: offset as u16,
    }
    .encode()
}

pub fn lea(dr: Reg, offset: i16) -> u16 {
    LoadIns {
        op: LoadOpcode::Lea,
        dr,
        offset: offset as u16,
    }
    .encode()
}

pub fn ldr(dr: Reg, base: Reg, offset: i16) -> u16 {
    LdrIns {
        dr,
        base,
        offset: offset as u16,
    }
    .encode()
}

pub fn st(sr: Reg, offset: i16) -> u16 {
    StoreIns {
        op: StoreOpcode::St,
        sr,
        offset: offset as u16,
    }
    .encode()
}

pub fn sti(sr: Reg, offset: i16) -> u16 {
    StoreIns {
        op: StoreOpcode::Sti,
        sr,
        offset: offset as u16,
    }
    .encode()
}

pub fn str(sr: Reg, base: Reg, offset: i16) -> u16 {
    StrIns {
        sr,
        base,
        offset: offset as u16,
    }
    .encode()
}

pub fn trap(vector: TrapVector) -> u16 {
    TrapIns::new(vector).encode()
}

pub fn halt() -> u16 {
    trap(TrapVector::Halt)
}

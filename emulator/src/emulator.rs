
use common::asm::*;
use common::constants::{KBDR, KBSR, KBSR_READY, MEM_WORDS};
use common::decoder::decode;
use common::misc::ToU16P;

use crate::emulator_state::{Cond, EmulatorState};
use crate::image::Image;
use crate::io::Console;
use crate::io::stdio::StdConsole;

use std::io;
use std::sync::Arc;

use delegate::delegate;
use log::debug;
use num_traits::FromPrimitive;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecRet {
    Ok,
    Halt,
}

/// Fatal execution failures. The guest has no fault model of its own, so none
/// of these are recoverable; they end the run.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("reserved opcode {op} executed at {pc:#06x}")]
    Reserved { op: ReservedOpcode, pc: u16 },

    #[error("unknown trap vector {vector:#04x} at {pc:#06x}")]
    UnknownTrap { vector: u16, pc: u16 },

    #[error("console i/o failed: {0}")]
    Io(#[from] io::Error),
}

pub struct Emulator {
    state: EmulatorState,
    console: Arc<dyn Console>,
}

impl Emulator {
    pub fn new() -> Emulator {
        Self::with_console(Arc::new(StdConsole::default()))
    }

    pub fn with_console(console: Arc<dyn Console>) -> Emulator {
        Emulator {
            state: EmulatorState::new(),
            console,
        }
    }

    // Run until a halt.
    pub fn run(&mut self) -> Result<(), ExecError> {
        while self.step()? != ExecRet::Halt {}
        Ok(())
    }

    /// Fetch, decode, and execute a single instruction.
    pub fn step(&mut self) -> Result<ExecRet, ExecError> {
        self.state.inc_ins();

        let pc = self.state.pc();
        let raw = self.mem_read(pc)?;
        let ins = decode(raw);
        debug!("PC {:#06x}: {}", pc, ins.display_with_pc(pc));
        self.state.set_pc(pc.wrapping_add(1));

        self.exec(&ins)
    }

    /// Copy a parsed image into memory, truncating at the top of the address
    /// space.
    pub fn load_image(&mut self, image: &Image) {
        let room = MEM_WORDS - image.origin as usize;
        let words = &image.words[..image.words.len().min(room)];
        self.load_words(words, image.origin);
    }

    pub fn load_words(&mut self, words: &[u16], origin: u16) {
        for (i, word) in words.iter().enumerate() {
            self.state.mem_write(origin.wrapping_add(i.to_u16p()), *word);
        }
    }

    delegate! {
        to self.state {
            pub fn reg_read(&self, reg: Reg) -> u16;
            pub fn reg_write(&mut self, reg: Reg, val: u16);
            pub fn pc(&self) -> u16;
            pub fn set_pc(&mut self, pc: u16);
            pub fn cond(&self) -> Cond;
            pub fn num_ins(&self) -> usize;
        }
    }

    pub fn state(&self) -> &EmulatorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EmulatorState {
        &mut self.state
    }

    ///////////////////////////////////////////////////////////////////////////

    /// Word Store read with the keyboard device folded in: touching KBSR
    /// polls the console and refreshes KBSR/KBDR before the read resolves.
    pub fn mem_read(&mut self, addr: u16) -> io::Result<u16> {
        if addr == KBSR {
            if self.console.key_available()? {
                let key = self.console.read_byte()?;
                self.state.mem_write(KBSR, KBSR_READY);
                self.state.mem_write(KBDR, key as u16);
            } else {
                self.state.mem_write(KBSR, 0);
            }
        }
        Ok(self.state.mem_read(addr))
    }

    // Writes have no device side, including to KBSR/KBDR.
    pub fn mem_write(&mut self, addr: u16, val: u16) {
        self.state.mem_write(addr, val);
    }

    ///////////////////////////////////////////////////////////////////////////
    // Execute
    ///////////////////////////////////////////////////////////////////////////

    // Address of the instruction being executed; the PC is already past it.
    fn ins_pc(&self) -> u16 {
        self.state.pc().wrapping_sub(1)
    }

    fn exec(&mut self, ins: &Ins) -> Result<ExecRet, ExecError> {
        match ins {
            Ins::Arith(ins) => self.exec_arith_ins(ins),
            Ins::Not(ins) => self.exec_not_ins(ins),
            Ins::Branch(ins) => self.exec_branch_ins(ins),
            Ins::Jmp(ins) => self.exec_jmp_ins(ins),
            Ins::Jsr(ins) => self.exec_jsr_ins(ins),
            Ins::Load(ins) => self.exec_load_ins(ins)?,
            Ins::Ldr(ins) => self.exec_ldr_ins(ins)?,
            Ins::Store(ins) => self.exec_store_ins(ins)?,
            Ins::Str(ins) => self.exec_str_ins(ins),
            Ins::Trap(ins) => return self.exec_trap_ins(ins),
            Ins::Reserved(op) => {
                return Err(ExecError::Reserved {
                    op: *op,
                    pc: self.ins_pc(),
                });
            }
        }

        Ok(ExecRet::Ok)
    }

    fn exec_arith_ins(&mut self, ins: &ArithIns) {
        let lhs = self.state.reg_read(ins.sr1);
        let rhs = match ins.src2 {
            Src2::Reg(sr2) => self.state.reg_read(sr2),
            Src2::Imm(imm) => imm,
        };
        let res = match ins.op {
            ArithOpcode::Add => lhs.wrapping_add(rhs),
            ArithOpcode::And => lhs & rhs,
        };
        self.state.reg_write(ins.dr, res);
        self.state.set_cond_from(res);
    }

    fn exec_not_ins(&mut self, ins: &NotIns) {
        let res = !self.state.reg_read(ins.sr);
        self.state.reg_write(ins.dr, res);
        self.state.set_cond_from(res);
    }

    fn exec_branch_ins(&mut self, ins: &BranchIns) {
        let taken = match self.state.cond() {
            Cond::Negative => ins.n,
            Cond::Zero => ins.z,
            Cond::Positive => ins.p,
        };
        if taken {
            let pc = self.state.pc().wrapping_add(ins.offset);
            self.state.set_pc(pc);
        }
    }

    fn exec_jmp_ins(&mut self, ins: &JmpIns) {
        self.state.set_pc(self.state.reg_read(ins.base));
    }

    fn exec_jsr_ins(&mut self, ins: &JsrIns) {
        // The link is written before the target is read, so a base of R7
        // transfers to the return address itself.
        let ret = self.state.pc();
        self.state.reg_write(Reg::LINK, ret);
        let target = match ins.target {
            JsrTarget::Rel(offset) => ret.wrapping_add(offset),
            JsrTarget::Reg(base) => self.state.reg_read(base),
        };
        self.state.set_pc(target);
    }

    fn exec_load_ins(&mut self, ins: &LoadIns) -> io::Result<()> {
        let addr = self.state.pc().wrapping_add(ins.offset);
        let val = match ins.op {
            LoadOpcode::Ld => self.mem_read(addr)?,
            LoadOpcode::Ldi => {
                let ptr = self.mem_read(addr)?;
                self.mem_read(ptr)?
            }
            LoadOpcode::Lea => addr,
        };
        self.state.reg_write(ins.dr, val);
        self.state.set_cond_from(val);
        Ok(())
    }

    fn exec_ldr_ins(&mut self, ins: &LdrIns) -> io::Result<()> {
        let addr = self.state.reg_read(ins.base).wrapping_add(ins.offset);
        let val = self.mem_read(addr)?;
        self.state.reg_write(ins.dr, val);
        self.state.set_cond_from(val);
        Ok(())
    }

    fn exec_store_ins(&mut self, ins: &StoreIns) -> io::Result<()> {
        let addr = self.state.pc().wrapping_add(ins.offset);
        let addr = match ins.op {
            StoreOpcode::St => addr,
            StoreOpcode::Sti => self.mem_read(addr)?,
        };
        let val = self.state.reg_read(ins.sr);
        self.mem_write(addr, val);
        Ok(())
    }

    fn exec_str_ins(&mut self, ins: &StrIns) {
        let addr = self.state.reg_read(ins.base).wrapping_add(ins.offset);
        let val = self.state.reg_read(ins.sr);
        self.mem_write(addr, val);
    }

    ///////////////////////////////////////////////////////////////////////////
    // Trap routines
    ///////////////////////////////////////////////////////////////////////////

    fn console_write(&self, bytes: &[u8]) -> io::Result<()> {
        for byte in bytes {
            self.console.write_byte(*byte)?;
        }
        self.console.flush()
    }

    fn exec_trap_ins(&mut self, ins: &TrapIns) -> Result<ExecRet, ExecError> {
        let Some(vector) = TrapVector::from_u16(ins.vector) else {
            return Err(ExecError::UnknownTrap {
                vector: ins.vector,
                pc: self.ins_pc(),
            });
        };

        // None of the routines touch the condition codes.
        match vector {
            TrapVector::Getc => {
                let key = self.console.read_byte()?;
                self.state.reg_write(Reg::R0, key as u16);
            }
            TrapVector::Out => {
                let val = self.state.reg_read(Reg::R0) as u8;
                self.console_write(&[val])?;
            }
            TrapVector::Puts => self.trap_puts()?,
            TrapVector::In => {
                self.console_write(b"Enter a character: ")?;
                let key = self.console.read_byte()?;
                self.console_write(&[key])?;
                self.state.reg_write(Reg::R0, key as u16);
            }
            TrapVector::Putsp => self.trap_putsp()?,
            TrapVector::Halt => {
                self.console_write(b"HALT\n")?;
                return Ok(ExecRet::Halt);
            }
        }

        Ok(ExecRet::Ok)
    }

    // R0 points at one character per word; a zero word ends the string.
    fn trap_puts(&mut self) -> io::Result<()> {
        let mut addr = self.state.reg_read(Reg::R0);
        loop {
            let word = self.mem_read(addr)?;
            if word == 0 {
                break;
            }
            self.console.write_byte(word as u8)?;
            addr = addr.wrapping_add(1);
        }
        self.console.flush()
    }

    // Packed variant: two characters per word, low byte first; a zero high
    // byte ends its word early, a zero word ends the string.
    fn trap_putsp(&mut self) -> io::Result<()> {
        let mut addr = self.state.reg_read(Reg::R0);
        loop {
            let word = self.mem_read(addr)?;
            if word == 0 {
                break;
            }
            self.console.write_byte(word as u8)?;
            let high = (word >> u8::BITS) as u8;
            if high != 0 {
                self.console.write_byte(high)?;
            }
            addr = addr.wrapping_add(1);
        }
        self.console.flush()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

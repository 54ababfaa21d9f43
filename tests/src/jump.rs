use common::asm::Reg::*;
use common::constants::PC_START;

use crate::harness::*;

#[test]
fn jmp_goes_through_the_base_register() {
    let emu = run_words(&[
        lea(R2, 2),         // r2 = 0x3003
        jmp(R2),
        add_imm(R0, R0, 1), // skipped
        halt(),
    ]);
    assert_eq!(emu.reg_read(R0), 0);
    assert_eq!(emu.pc(), PC_START + 4);
}

#[test]
fn jmp_r7_returns() {
    // ret is just jmp through the link register
    let emu = run_words(&[
        jsr(2),             // r7 = 0x3001
        halt(),
        add_imm(R0, R0, 0), // skipped
        jmp(R7),
    ]);
    assert_eq!(emu.pc(), PC_START + 2);
}

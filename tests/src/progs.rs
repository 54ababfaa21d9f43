use common::asm::Reg::*;
use common::asm::TrapVector;
use common::constants::PC_START;
use emu_lib::Cond;

use crate::harness::*;

// Clear r0, then increment it until r0 - 10 stops being negative.
#[test]
fn count_to_ten() {
    let emu = run_words(&[
        and_imm(R0, R0, 0),
        add_imm(R0, R0, 1),
        add_imm(R1, R0, -10),
        br(true, false, false, -3),
        halt(),
    ]);

    assert_eq!(emu.reg_read(R0), 10);
    assert_eq!(emu.reg_read(R1), 0);
    assert_eq!(emu.cond(), Cond::Zero);
    // the clear, ten turns of the three-instruction loop, and the halt
    assert_eq!(emu.num_ins(), 32);
}

#[test]
fn multiply_by_repeated_addition() {
    // r2 = 6 * 7; no multiply instruction on this machine
    let emu = run_words(&[
        and_imm(R2, R2, 0),
        add_imm(R3, R3, 6),
        add_imm(R2, R2, 7),
        add_imm(R3, R3, -1),
        br(false, false, true, -3),
        halt(),
    ]);
    assert_eq!(emu.reg_read(R2), 42);
    assert_eq!(emu.reg_read(R3), 0);
}

// GETC/OUT echo loop terminated by a newline.
#[test]
fn echo_until_newline() {
    let (mut emu, console) = pipe_emulator();
    console.write_input(b"hey\n");
    emu.load_words(
        &[
            trap(TrapVector::Getc),
            add_imm(R1, R0, -10), // '\n'
            br(false, true, false, 2),
            trap(TrapVector::Out),
            br(true, true, true, -5),
            halt(),
        ],
        PC_START,
    );
    emu.run().unwrap();
    assert_eq!(output_string(&console), "heyHALT\n");
}

// A subroutine that strlen's a word string, called twice.
#[test]
fn strlen_subroutine() {
    let emu = run_words(&[
        lea(R1, 12),                // 0x300d: "ab"
        jsr(4),                     // strlen -> r2
        add_imm(R4, R2, 0),         // save the first length
        lea(R1, 12),                // 0x3010: "wxyz"
        jsr(1),                     // strlen again
        halt(),
        // strlen: r2 = length of the zero-terminated string at r1
        and_imm(R2, R2, 0),         // 0x3006
        ldr(R3, R1, 0),
        br(false, true, false, 3),  // zero word: done
        add_imm(R1, R1, 1),
        add_imm(R2, R2, 1),
        br(true, true, true, -5),   // keep scanning
        jmp(R7),
        // data
        u16::from(b'a'),            // 0x300d
        u16::from(b'b'),
        0,
        u16::from(b'w'),            // 0x3010
        u16::from(b'x'),
        u16::from(b'y'),
        u16::from(b'z'),
        0,
    ]);

    assert_eq!(emu.reg_read(R4), 2);
    assert_eq!(emu.reg_read(R2), 4);
}

use common::asm::Reg::*;
use emu_lib::Cond;

use crate::harness::*;

#[test]
fn add_register_mode() {
    let emu = run_words(&[
        add_imm(R1, R1, 5),
        add_imm(R2, R2, 9),
        add_reg(R0, R1, R2),
        halt(),
    ]);
    assert_eq!(emu.reg_read(R0), 14);
    assert_eq!(emu.cond(), Cond::Positive);
}

#[test]
fn add_immediate_mode() {
    let emu = run_words(&[add_imm(R0, R0, 15), add_imm(R0, R0, -16), halt()]);
    assert_eq!(emu.reg_read(R0), 0xffff);
    assert_eq!(emu.cond(), Cond::Negative);
}

#[test]
fn add_wraps_modulo_2_16() {
    // r1 = 0xffff, then one more wraps to zero
    let emu = run_words(&[not(R1, R0), add_imm(R2, R1, 1), halt()]);
    assert_eq!(emu.reg_read(R2), 0);
    assert_eq!(emu.cond(), Cond::Zero);
}

#[test]
fn and_register_mode() {
    let emu = run_words(&[
        add_imm(R1, R1, 12),
        add_imm(R2, R2, 10),
        and_reg(R0, R1, R2),
        halt(),
    ]);
    assert_eq!(emu.reg_read(R0), 8);
}

#[test]
fn and_immediate_mode() {
    let emu = run_words(&[add_imm(R1, R1, 12), and_imm(R0, R1, 10), halt()]);
    assert_eq!(emu.reg_read(R0), 8);
}

#[test]
fn and_with_minus_one_is_identity() {
    // the sign-extended #-1 immediate is all ones
    let emu = run_words(&[add_imm(R1, R1, 13), and_imm(R0, R1, -1), halt()]);
    assert_eq!(emu.reg_read(R0), 13);
}

#[test]
fn not_complements() {
    let emu = run_words(&[add_imm(R1, R1, 5), not(R0, R1), halt()]);
    assert_eq!(emu.reg_read(R0), !5u16);
    assert_eq!(emu.cond(), Cond::Negative);

    let emu = run_words(&[not(R0, R1), not(R2, R0), halt()]);
    assert_eq!(emu.reg_read(R2), 0);
    assert_eq!(emu.cond(), Cond::Zero);
}

// The mode bit only changes where the second operand comes from; equal
// operand values must behave identically.
#[test]
fn immediate_matches_register_mode() {
    for val in [-16i16, -10, -1, 0, 7, 15] {
        let via_imm = run_words(&[add_imm(R1, R1, 3), add_imm(R0, R1, val), halt()]);
        let via_reg = run_words(&[
            add_imm(R1, R1, 3),
            add_imm(R2, R2, val),
            add_reg(R0, R1, R2),
            halt(),
        ]);
        assert_eq!(via_imm.reg_read(R0), via_reg.reg_read(R0), "add {val}");
        assert_eq!(via_imm.cond(), via_reg.cond(), "add flags {val}");

        let via_imm = run_words(&[add_imm(R1, R1, 13), and_imm(R0, R1, val), halt()]);
        let via_reg = run_words(&[
            add_imm(R1, R1, 13),
            add_imm(R2, R2, val),
            and_reg(R0, R1, R2),
            halt(),
        ]);
        assert_eq!(via_imm.reg_read(R0), via_reg.reg_read(R0), "and {val}");
        assert_eq!(via_imm.cond(), via_reg.cond(), "and flags {val}");
    }
}

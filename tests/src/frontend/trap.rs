//! Window management and trap-delivery tests.

use std::cell::Cell;
use std::rc::Rc;

use dbt_frontend::sparc::cc::CcOp;
use dbt_frontend::sparc::cpu::{CpuDef, SparcCpu, NO_EXCEPTION};
use dbt_frontend::sparc::trap::{
    deliver, helper_check_align, helper_rett, DeliverOutcome, Trap,
    TT_DIV_ZERO, TT_ILL_INSN, TT_TRAP, TT_UNALIGNED,
};

fn cpu() -> Box<SparcCpu> {
    SparcCpu::new(&CpuDef::default())
}

// ── Windows ───────────────────────────────────────────────────

#[test]
fn test_save_restore_round_trip() {
    let mut env = cpu();
    env.wim = 0;
    env.set_cwp(3);
    for r in 8..32 {
        env.set_gpr(r, (r as u64) * 0x101);
    }
    let cwp_before = env.cwp;
    env.save_window().unwrap();
    assert_eq!(env.cwp, 2);
    env.restore_window().unwrap();
    assert_eq!(env.cwp, cwp_before);
    for r in 8..32 {
        assert_eq!(env.gpr(r), (r as u64) * 0x101, "register {r}");
    }
}

#[test]
fn test_save_overlap_shares_outs_and_ins() {
    // The caller's outs are the callee's ins.
    let mut env = cpu();
    env.wim = 0;
    env.set_cwp(3);
    env.set_gpr(8, 0xdead); // %o0
    env.save_window().unwrap();
    assert_eq!(env.gpr(24), 0xdead); // %i0
}

#[test]
fn test_window_wraparound_aliases_through_shadow() {
    let mut env = cpu();
    env.wim = 0;
    env.set_cwp(0);
    env.set_gpr(8, 42);
    env.save_window().unwrap(); // wraps to nwindows-1
    assert_eq!(env.cwp, env.nwindows - 1);
    assert_eq!(env.gpr(24), 42);
    env.set_gpr(24, 99);
    env.restore_window().unwrap(); // wraps back to 0
    assert_eq!(env.cwp, 0);
    assert_eq!(env.gpr(8), 99);
}

#[test]
fn test_save_into_invalid_window_overflows() {
    let mut env = cpu();
    env.set_cwp(0);
    env.wim = 1 << (env.nwindows - 1);
    let err = env.save_window().unwrap_err();
    assert_eq!(err, Trap::WindowOverflow);
    assert_eq!(env.cwp, 0, "failed save must not rotate");
}

#[test]
fn test_restore_from_invalid_window_underflows() {
    let mut env = cpu();
    env.wim = 0;
    env.set_cwp(2);
    env.wim = 1 << 3;
    let err = env.restore_window().unwrap_err();
    assert_eq!(err, Trap::WindowUnderflow);
    assert_eq!(env.cwp, 2);
}

#[test]
fn test_regwptr_tracks_cwp() {
    let mut env = cpu();
    env.wim = 0;
    env.set_cwp(4);
    let base = env.winregs.as_ptr() as u64;
    assert_eq!(env.regwptr, base + 4 * 16 * 8);
}

// ── PSR image ─────────────────────────────────────────────────

#[test]
fn test_psr_round_trip() {
    let mut env = cpu();
    env.wim = 0;
    env.psr_et = 1;
    env.psr_pil = 0xa;
    env.icc = 0b1010;
    env.set_cwp(3);
    let img = env.get_psr();
    let mut other = cpu();
    other.put_psr(img).unwrap();
    assert_eq!(other.cwp, 3);
    assert_eq!(other.psr_pil, 0xa);
    assert_eq!(other.icc, 0b1010);
    assert_eq!(other.psr_et, 1);
    assert_eq!(other.cc_op, CcOp::Flags as u64);
}

#[test]
fn test_put_psr_rejects_invalid_cwp() {
    let mut env = cpu();
    let err = env.put_psr(31).unwrap_err();
    assert_eq!(err, Trap::IllegalInsn);
}

// ── Delivery ──────────────────────────────────────────────────

#[test]
fn test_deliver_vectors_through_trap_base() {
    let mut env = cpu();
    env.wim = 0;
    env.psr_et = 1;
    env.psr_s = 0;
    env.set_cwp(3);
    env.tbr = 0xff00_0000;
    env.pc = 0x2000;
    env.npc = 0x2004;
    env.exception_index = TT_DIV_ZERO as i32;

    let out = deliver(&mut env, TT_DIV_ZERO);
    assert_eq!(out, DeliverOutcome::Delivered);
    assert_eq!(env.cwp, 2);
    assert_eq!(env.gpr(17), 0x2000, "old PC in %l1");
    assert_eq!(env.gpr(18), 0x2004, "old NPC in %l2");
    assert_eq!(env.psr_ps, 0);
    assert_eq!(env.psr_s, 1);
    assert_eq!(env.psr_et, 0);
    assert_eq!(env.pc, 0xff00_0000 | ((TT_DIV_ZERO as u64) << 4));
    assert_eq!(env.npc, env.pc + 4);
    assert_eq!(env.exception_index, NO_EXCEPTION);
}

#[test]
fn test_deliver_materializes_flags_first() {
    let mut env = cpu();
    env.wim = 0;
    env.psr_et = 1;
    env.cc_op = CcOp::Sub as u64;
    env.cc_src = 3;
    env.cc_src2 = 5;
    env.cc_dst = 3u64.wrapping_sub(5);
    deliver(&mut env, TT_ILL_INSN);
    assert_eq!(env.cc_op, CcOp::Flags as u64);
    assert_ne!(env.icc, 0);
}

#[test]
fn test_deliver_with_traps_disabled() {
    let mut env = cpu();
    env.psr_et = 0;
    assert_eq!(deliver(&mut env, TT_TRAP), DeliverOutcome::Shutdown);
    assert_eq!(deliver(&mut env, TT_ILL_INSN), DeliverOutcome::ErrorState);
}

#[test]
fn test_interrupt_delivery_acknowledges() {
    let level = Rc::new(Cell::new(0u32));
    let seen = level.clone();
    let mut env = cpu();
    env.wim = 0;
    env.psr_et = 1;
    env.intack = Some(Box::new(move |l| seen.set(l)));
    deliver(&mut env, 0x1b);
    assert_eq!(level.get(), 0xb);
}

#[test]
fn test_non_interrupt_delivery_skips_ack() {
    let fired = Rc::new(Cell::new(false));
    let seen = fired.clone();
    let mut env = cpu();
    env.wim = 0;
    env.psr_et = 1;
    env.intack = Some(Box::new(move |_| seen.set(true)));
    deliver(&mut env, TT_ILL_INSN);
    assert!(!fired.get());
}

// ── Runtime helpers ───────────────────────────────────────────

#[test]
fn test_check_align_latches_unaligned() {
    let mut env = cpu();
    helper_check_align(&mut *env, 0x1001, 3);
    assert_eq!(env.exception_index, TT_UNALIGNED as i32);
    let mut env = cpu();
    helper_check_align(&mut *env, 0x1000, 3);
    assert_eq!(env.exception_index, NO_EXCEPTION);
}

#[test]
fn test_rett_restores_privilege_and_enables_traps() {
    let mut env = cpu();
    env.wim = 0;
    env.set_cwp(2);
    env.psr_et = 0;
    env.psr_s = 1;
    env.psr_ps = 0;
    helper_rett(&mut *env);
    assert_eq!(env.exception_index, NO_EXCEPTION);
    assert_eq!(env.cwp, 3);
    assert_eq!(env.psr_s, 0);
    assert_eq!(env.psr_et, 1);
}

#[test]
fn test_rett_with_traps_enabled_is_illegal() {
    let mut env = cpu();
    env.wim = 0;
    env.psr_et = 1;
    helper_rett(&mut *env);
    assert_eq!(env.exception_index, TT_ILL_INSN as i32);
}

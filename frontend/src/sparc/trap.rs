//! Trap numbering and trap/interrupt delivery.
//!
//! Every fault funnels through `deliver`: decode-time faults are
//! latched by the trap-raising IR the translator emits, runtime faults
//! by the helpers below. The execution engine (out of tree) observes
//! the latched index after a helper returns, abandons the block and
//! calls `deliver`.

use thiserror::Error;
use tracing::trace;

use super::cc::materialize_flags;
use super::cpu::{SparcCpu, NO_EXCEPTION, TBR_BASE_MASK, TBR_TT_SHIFT};

pub const TT_TFAULT: u32 = 0x01;
pub const TT_ILL_INSN: u32 = 0x02;
pub const TT_PRIV_INSN: u32 = 0x03;
pub const TT_NFPU_INSN: u32 = 0x04;
pub const TT_WIN_OVF: u32 = 0x05;
pub const TT_WIN_UNF: u32 = 0x06;
pub const TT_UNALIGNED: u32 = 0x07;
pub const TT_FP_EXCP: u32 = 0x08;
pub const TT_DFAULT: u32 = 0x09;
pub const TT_TOVF: u32 = 0x0a;
/// Interrupt-class traps: TT_EXTINT + level, level in 1..=15.
pub const TT_EXTINT: u32 = 0x10;
pub const TT_DIV_ZERO: u32 = 0x2a;
/// Software traps: TT_TRAP + (operand & 0x7f).
pub const TT_TRAP: u32 = 0x80;

/// Architectural trap kinds raised by this frontend.
///
/// Decode returns `Err(Trap)` and the driver emits the trap-raising
/// IR; runtime helpers latch `Trap::tt()` into the exception index.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    #[error("illegal instruction")]
    IllegalInsn,
    #[error("privileged instruction")]
    PrivilegedInsn,
    #[error("floating-point unit disabled")]
    FpuDisabled,
    #[error("window overflow")]
    WindowOverflow,
    #[error("window underflow")]
    WindowUnderflow,
    #[error("memory address not aligned")]
    Unaligned,
    #[error("floating-point exception")]
    FpException,
    #[error("tag overflow")]
    TagOverflow,
    #[error("division by zero")]
    DivisionByZero,
}

impl Trap {
    pub const fn tt(self) -> u32 {
        match self {
            Trap::IllegalInsn => TT_ILL_INSN,
            Trap::PrivilegedInsn => TT_PRIV_INSN,
            Trap::FpuDisabled => TT_NFPU_INSN,
            Trap::WindowOverflow => TT_WIN_OVF,
            Trap::WindowUnderflow => TT_WIN_UNF,
            Trap::Unaligned => TT_UNALIGNED,
            Trap::FpException => TT_FP_EXCP,
            Trap::TagOverflow => TT_TOVF,
            Trap::DivisionByZero => TT_DIV_ZERO,
        }
    }
}

/// Result of a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverOutcome {
    /// Control vectored to the trap table.
    Delivered,
    /// `ta 0` with traps disabled — orderly shutdown request.
    Shutdown,
    /// Any other trap with traps disabled — unrecoverable error
    /// state; the caller owns process termination.
    ErrorState,
}

/// Deliver trap `tt` to the CPU.
///
/// Rotates the window down, saves PC/NPC into locals l1/l2 of the new
/// window, stacks the privilege flag, disables traps and vectors
/// through the trap base register. Interrupt-class traps additionally
/// fire the interrupt-acknowledge callback.
pub fn deliver(env: &mut SparcCpu, tt: u32) -> DeliverOutcome {
    if env.psr_et == 0 {
        return if tt == TT_TRAP {
            DeliverOutcome::Shutdown
        } else {
            DeliverOutcome::ErrorState
        };
    }

    trace!(tt, pc = env.pc, "delivering trap");

    // Trap handlers observe architectural flags, not a stale tag.
    materialize_flags(env);

    env.cwp_dec();
    let (pc, npc) = (env.pc, env.npc);
    env.set_gpr(17, pc); // %l1
    env.set_gpr(18, npc); // %l2

    env.psr_ps = env.psr_s;
    env.psr_s = 1;
    env.psr_et = 0;

    env.tbr = (env.tbr & TBR_BASE_MASK) | ((tt as u64) << TBR_TT_SHIFT);
    env.pc = env.tbr;
    env.npc = env.tbr + 4;
    env.exception_index = NO_EXCEPTION;

    if (TT_EXTINT + 1..TT_EXTINT + 16).contains(&tt) {
        let level = tt - TT_EXTINT;
        if let Some(ack) = env.intack.as_mut() {
            ack(level);
        }
    }

    DeliverOutcome::Delivered
}

// -- Generated-code entry points --------------------------------

fn latch(env: &mut SparcCpu, trap: Trap) {
    env.exception_index = trap.tt() as i32;
}

#[no_mangle]
pub extern "C" fn helper_raise_exception(env: *mut SparcCpu, tt: u64) {
    let env = unsafe { &mut *env };
    env.exception_index = tt as i32;
}

/// Runtime alignment check emitted alongside every multi-byte access.
#[no_mangle]
pub extern "C" fn helper_check_align(
    env: *mut SparcCpu,
    addr: u64,
    mask: u64,
) {
    let env = unsafe { &mut *env };
    if addr & mask != 0 {
        latch(env, Trap::Unaligned);
    }
}

#[no_mangle]
pub extern "C" fn helper_save(env: *mut SparcCpu) {
    let env = unsafe { &mut *env };
    if let Err(t) = env.save_window() {
        latch(env, t);
    }
}

#[no_mangle]
pub extern "C" fn helper_restore(env: *mut SparcCpu) {
    let env = unsafe { &mut *env };
    if let Err(t) = env.restore_window() {
        latch(env, t);
    }
}

fn do_rett(env: &mut SparcCpu) -> Result<(), Trap> {
    // rett with traps already enabled is malformed supervisor code.
    if env.psr_et != 0 {
        return Err(Trap::IllegalInsn);
    }
    env.restore_window()?;
    env.psr_s = env.psr_ps;
    env.psr_et = 1;
    Ok(())
}

#[no_mangle]
pub extern "C" fn helper_rett(env: *mut SparcCpu) {
    let env = unsafe { &mut *env };
    if let Err(t) = do_rett(env) {
        latch(env, t);
    }
}

#[no_mangle]
pub extern "C" fn helper_rdpsr(env: *mut SparcCpu) -> u64 {
    let env = unsafe { &mut *env };
    materialize_flags(env);
    env.get_psr()
}

#[no_mangle]
pub extern "C" fn helper_wrpsr(env: *mut SparcCpu, val: u64) {
    let env = unsafe { &mut *env };
    if let Err(t) = env.put_psr(val) {
        latch(env, t);
    }
}

//! Integer runtime helpers — operations too stateful to inline:
//! Y-register divides (trap on zero divisor, clamp on overflow) and
//! the trapping tagged arithmetic forms.

use super::cc::CcOp;
use super::cpu::SparcCpu;
use super::trap::Trap;

fn record_div_cc(env: &mut SparcCpu, src1: u64, quotient: u64, clamped: bool) {
    env.cc_src = src1;
    env.cc_src2 = clamped as u64;
    env.cc_dst = quotient;
    env.cc_op = CcOp::Div as u64;
}

fn do_udiv(env: &SparcCpu, a: u64, b: u64) -> Result<(u64, bool), Trap> {
    let dividend = (env.y << 32) | (a & 0xffff_ffff);
    let divisor = b & 0xffff_ffff;
    if divisor == 0 {
        return Err(Trap::DivisionByZero);
    }
    let q = dividend / divisor;
    if q > 0xffff_ffff {
        Ok((0xffff_ffff, true))
    } else {
        Ok((q, false))
    }
}

fn do_sdiv(env: &SparcCpu, a: u64, b: u64) -> Result<(u64, bool), Trap> {
    let dividend = ((env.y << 32) | (a & 0xffff_ffff)) as i64;
    let divisor = b as u32 as i32 as i64;
    if divisor == 0 {
        return Err(Trap::DivisionByZero);
    }
    // i64::MIN / -1 cannot occur: the dividend is Y:rs1low, but the
    // quotient of that corner still exceeds i32 and clamps below.
    let q = dividend.wrapping_div(divisor);
    if q > i32::MAX as i64 {
        Ok((i32::MAX as u64, true))
    } else if q < i32::MIN as i64 {
        Ok((i32::MIN as i64 as u64, true))
    } else {
        Ok((q as u64, false))
    }
}

fn latch(env: &mut SparcCpu, t: Trap) {
    env.exception_index = t.tt() as i32;
}

#[no_mangle]
pub extern "C" fn helper_udiv(env: *mut SparcCpu, a: u64, b: u64) -> u64 {
    let env = unsafe { &mut *env };
    match do_udiv(env, a, b) {
        Ok((q, _)) => q,
        Err(t) => {
            latch(env, t);
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn helper_udiv_cc(env: *mut SparcCpu, a: u64, b: u64) -> u64 {
    let env = unsafe { &mut *env };
    match do_udiv(env, a, b) {
        Ok((q, clamped)) => {
            record_div_cc(env, a, q, clamped);
            q
        }
        Err(t) => {
            latch(env, t);
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn helper_sdiv(env: *mut SparcCpu, a: u64, b: u64) -> u64 {
    let env = unsafe { &mut *env };
    match do_sdiv(env, a, b) {
        Ok((q, _)) => q,
        Err(t) => {
            latch(env, t);
            0
        }
    }
}

#[no_mangle]
pub extern "C" fn helper_sdiv_cc(env: *mut SparcCpu, a: u64, b: u64) -> u64 {
    let env = unsafe { &mut *env };
    match do_sdiv(env, a, b) {
        Ok((q, clamped)) => {
            record_div_cc(env, a, q, clamped);
            q
        }
        Err(t) => {
            latch(env, t);
            0
        }
    }
}

fn tag_overflows(a: u64, b: u64, dst: u64, sub: bool) -> bool {
    if (a | b) & 0x3 != 0 {
        return true;
    }
    let (a32, b32, d32) = (a as u32, b as u32, dst as u32);
    let v = if sub {
        (a32 ^ b32) & (a32 ^ d32)
    } else {
        !(a32 ^ b32) & (a32 ^ d32)
    };
    v >> 31 != 0
}

fn record_tagged_cc(env: &mut SparcCpu, op: CcOp, a: u64, b: u64, dst: u64) {
    env.cc_src = a;
    env.cc_src2 = b;
    env.cc_dst = dst;
    env.cc_op = op as u64;
}

/// Tagged add, trapping variant: tag overflow raises instead of
/// setting V. When no trap fires the recorded operands make the lazy
/// engine rederive V=0, matching the architectural promise.
#[no_mangle]
pub extern "C" fn helper_taddcctv(
    env: *mut SparcCpu,
    a: u64,
    b: u64,
) -> u64 {
    let env = unsafe { &mut *env };
    let dst = a.wrapping_add(b);
    if tag_overflows(a, b, dst, false) {
        latch(env, Trap::TagOverflow);
        return a;
    }
    record_tagged_cc(env, CcOp::TAdd, a, b, dst);
    dst
}

#[no_mangle]
pub extern "C" fn helper_tsubcctv(
    env: *mut SparcCpu,
    a: u64,
    b: u64,
) -> u64 {
    let env = unsafe { &mut *env };
    let dst = a.wrapping_sub(b);
    if tag_overflows(a, b, dst, true) {
        latch(env, Trap::TagOverflow);
        return a;
    }
    record_tagged_cc(env, CcOp::TSub, a, b, dst);
    dst
}

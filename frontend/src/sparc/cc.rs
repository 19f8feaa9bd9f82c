//! Lazy condition codes.
//!
//! Flag-setting instructions record only their kind and operands
//! (`cc_op`, `cc_src`, `cc_src2`, `cc_dst`); the NZVC nibbles are
//! derived on demand by `materialize_flags`. Both condition registers
//! are computed from the same recorded operands: `icc` with 32-bit
//! tests over the low words, `xcc` with 64-bit tests over the full
//! registers.

use bitflags::bitflags;

use super::cpu::SparcCpu;

bitflags! {
    /// One materialized condition-code nibble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CcFlags: u32 {
        const C = 1 << 0;
        const V = 1 << 1;
        const Z = 1 << 2;
        const N = 1 << 3;
    }
}

/// Kind of the operation that last produced the condition codes.
///
/// `Flags` is the terminal/idle state: the materialized nibbles are
/// authoritative and materialization is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CcOp {
    Flags = 0,
    Logic,
    Add,
    AddX,
    Sub,
    SubX,
    TAdd,
    TSub,
    Div,
}

impl CcOp {
    pub fn from_u64(v: u64) -> CcOp {
        match v {
            0 => CcOp::Flags,
            1 => CcOp::Logic,
            2 => CcOp::Add,
            3 => CcOp::AddX,
            4 => CcOp::Sub,
            5 => CcOp::SubX,
            6 => CcOp::TAdd,
            7 => CcOp::TSub,
            8 => CcOp::Div,
            _ => unreachable!("corrupt cc_op value {v}"),
        }
    }
}

// -- 32-bit flag formulas ---------------------------------------

fn nz_icc(dst: u64) -> CcFlags {
    let d = dst as u32;
    let mut f = CcFlags::empty();
    if d == 0 {
        f |= CcFlags::Z;
    }
    if d >> 31 != 0 {
        f |= CcFlags::N;
    }
    f
}

fn c_add_icc(dst: u64, src1: u64) -> CcFlags {
    if (dst as u32) < (src1 as u32) {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn c_addx_icc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    let (d, a, b) = (dst as u32, src1 as u32, src2 as u32);
    if ((a & b) | (!d & (a | b))) >> 31 != 0 {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn v_add_icc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    let (d, a, b) = (dst as u32, src1 as u32, src2 as u32);
    if (!(a ^ b) & (a ^ d)) >> 31 != 0 {
        CcFlags::V
    } else {
        CcFlags::empty()
    }
}

fn c_sub_icc(src1: u64, src2: u64) -> CcFlags {
    if (src1 as u32) < (src2 as u32) {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn c_subx_icc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    let (d, a, b) = (dst as u32, src1 as u32, src2 as u32);
    if ((!a & b) | (d & (!a | b))) >> 31 != 0 {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn v_sub_icc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    let (d, a, b) = (dst as u32, src1 as u32, src2 as u32);
    if ((a ^ b) & (a ^ d)) >> 31 != 0 {
        CcFlags::V
    } else {
        CcFlags::empty()
    }
}

fn v_tag(src1: u64, src2: u64) -> CcFlags {
    if (src1 | src2) & 0x3 != 0 {
        CcFlags::V
    } else {
        CcFlags::empty()
    }
}

// -- 64-bit flag formulas ---------------------------------------

fn nz_xcc(dst: u64) -> CcFlags {
    let mut f = CcFlags::empty();
    if dst == 0 {
        f |= CcFlags::Z;
    }
    if dst >> 63 != 0 {
        f |= CcFlags::N;
    }
    f
}

fn c_add_xcc(dst: u64, src1: u64) -> CcFlags {
    if dst < src1 {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn c_addx_xcc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    if ((src1 & src2) | (!dst & (src1 | src2))) >> 63 != 0 {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn v_add_xcc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    if (!(src1 ^ src2) & (src1 ^ dst)) >> 63 != 0 {
        CcFlags::V
    } else {
        CcFlags::empty()
    }
}

fn c_sub_xcc(src1: u64, src2: u64) -> CcFlags {
    if src1 < src2 {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn c_subx_xcc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    if ((!src1 & src2) | (dst & (!src1 | src2))) >> 63 != 0 {
        CcFlags::C
    } else {
        CcFlags::empty()
    }
}

fn v_sub_xcc(dst: u64, src1: u64, src2: u64) -> CcFlags {
    if ((src1 ^ src2) & (src1 ^ dst)) >> 63 != 0 {
        CcFlags::V
    } else {
        CcFlags::empty()
    }
}

// -- Full-flags table -------------------------------------------

/// Derive both condition nibbles from a recorded operation.
pub fn compute_all(
    op: CcOp,
    dst: u64,
    src1: u64,
    src2: u64,
) -> (CcFlags, CcFlags) {
    match op {
        CcOp::Flags => unreachable!("flags already materialized"),
        CcOp::Logic => (nz_icc(dst), nz_xcc(dst)),
        CcOp::Add => (
            nz_icc(dst) | c_add_icc(dst, src1) | v_add_icc(dst, src1, src2),
            nz_xcc(dst) | c_add_xcc(dst, src1) | v_add_xcc(dst, src1, src2),
        ),
        CcOp::AddX => (
            nz_icc(dst)
                | c_addx_icc(dst, src1, src2)
                | v_add_icc(dst, src1, src2),
            nz_xcc(dst)
                | c_addx_xcc(dst, src1, src2)
                | v_add_xcc(dst, src1, src2),
        ),
        CcOp::Sub => (
            nz_icc(dst) | c_sub_icc(src1, src2) | v_sub_icc(dst, src1, src2),
            nz_xcc(dst) | c_sub_xcc(src1, src2) | v_sub_xcc(dst, src1, src2),
        ),
        CcOp::SubX => (
            nz_icc(dst)
                | c_subx_icc(dst, src1, src2)
                | v_sub_icc(dst, src1, src2),
            nz_xcc(dst)
                | c_subx_xcc(dst, src1, src2)
                | v_sub_xcc(dst, src1, src2),
        ),
        CcOp::TAdd => (
            nz_icc(dst)
                | c_add_icc(dst, src1)
                | v_add_icc(dst, src1, src2)
                | v_tag(src1, src2),
            nz_xcc(dst)
                | c_add_xcc(dst, src1)
                | v_add_xcc(dst, src1, src2)
                | v_tag(src1, src2),
        ),
        CcOp::TSub => (
            nz_icc(dst)
                | c_sub_icc(src1, src2)
                | v_sub_icc(dst, src1, src2)
                | v_tag(src1, src2),
            nz_xcc(dst)
                | c_sub_xcc(src1, src2)
                | v_sub_xcc(dst, src1, src2)
                | v_tag(src1, src2),
        ),
        // Zero/negative from the quotient; overflow iff the recorded
        // second source (the clamp indicator) is nonzero; carry never.
        CcOp::Div => {
            let v = if src2 != 0 {
                CcFlags::V
            } else {
                CcFlags::empty()
            };
            (nz_icc(dst) | v, nz_xcc(dst) | v)
        }
    }
}

// -- Carry-only table -------------------------------------------

/// Derive just the 32-bit carry bit — the cheap path for
/// add-with-carry chains that never need N/Z/V.
pub fn compute_carry_icc(
    op: CcOp,
    dst: u64,
    src1: u64,
    src2: u64,
    icc: CcFlags,
) -> u64 {
    let c = match op {
        CcOp::Flags => icc & CcFlags::C,
        CcOp::Logic | CcOp::Div => CcFlags::empty(),
        CcOp::Add | CcOp::TAdd => c_add_icc(dst, src1),
        CcOp::AddX => c_addx_icc(dst, src1, src2),
        CcOp::Sub | CcOp::TSub => c_sub_icc(src1, src2),
        CcOp::SubX => c_subx_icc(dst, src1, src2),
    };
    c.contains(CcFlags::C) as u64
}

// -- State-level entry points -----------------------------------

/// Materialize both condition registers from the recorded operation
/// and park the engine in the terminal `Flags` state. A no-op when
/// already materialized.
pub fn materialize_flags(env: &mut SparcCpu) {
    let op = CcOp::from_u64(env.cc_op);
    if op == CcOp::Flags {
        return;
    }
    let (icc, xcc) = compute_all(op, env.cc_dst, env.cc_src, env.cc_src2);
    env.icc = icc.bits() as u64;
    env.xcc = xcc.bits() as u64;
    env.cc_op = CcOp::Flags as u64;
}

/// Materialize only the 32-bit carry bit; leaves the engine state
/// untouched.
pub fn carry_icc(env: &SparcCpu) -> u64 {
    compute_carry_icc(
        CcOp::from_u64(env.cc_op),
        env.cc_dst,
        env.cc_src,
        env.cc_src2,
        CcFlags::from_bits_truncate(env.icc as u32),
    )
}

// -- Generated-code entry points --------------------------------

#[no_mangle]
pub extern "C" fn helper_compute_flags(env: *mut SparcCpu) {
    let env = unsafe { &mut *env };
    materialize_flags(env);
}

#[no_mangle]
pub extern "C" fn helper_compute_carry(env: *mut SparcCpu) -> u64 {
    let env = unsafe { &mut *env };
    carry_icc(env)
}

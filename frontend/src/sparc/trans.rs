//! SPARC instruction translation — IR generation.
//!
//! One handler per decode-table entry. Repetitive shapes are factored
//! into `do_arith`, `do_shift`, `do_load`, `do_store`, `do_branch`,
//! etc., each parameterised by a `BinOp` function pointer or a memory
//! flavor. Handlers return `Err(Trap)` for decode faults; only the
//! driver turns that into trap-raising IR.

use dbt_core::{Context, MemOp, TempIdx, Type};

use super::cc::CcOp;
use super::cpu::fpr_offset;
use super::insn::Insn;
use super::trap::Trap;
use super::{
    cc, fpu, helper, trap, Npc, SparcDisasContext, MO_SB, MO_TESL, MO_TESW,
    MO_TEUL, MO_TEUQ, MO_TEUW, MO_UB,
};
use crate::DisasJumpType;

/// Binary IR operation: `fn(ir, ty, dst, lhs, rhs) -> dst`.
type BinOp = fn(&mut Context, Type, TempIdx, TempIdx, TempIdx) -> TempIdx;

// ── Shared shapes ──────────────────────────────────────────────

/// Decode the two ALU source operands: rs1 and either rs2 or the
/// sign-extended immediate.
fn alu_operands(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> (TempIdx, TempIdx) {
    let s1 = dc.load_gpr(ir, i.rs1());
    let s2 = if i.imm_p() {
        ir.new_const(Type::I64, i.simm13() as u64)
    } else {
        dc.load_gpr(ir, i.rs2())
    };
    (s1, s2)
}

/// ALU op: `rd = op(rs1, operand2)`, optionally recording the
/// condition-code kind.
fn do_arith(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    op: BinOp,
    cc: Option<CcOp>,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    let d = ir.new_temp(Type::I64);
    op(ir, Type::I64, d, s1, s2);
    dc.store_gpr(ir, i.rd(), d);
    if let Some(kind) = cc {
        dc.gen_cc_record(ir, kind, d, s1, s2);
    }
    Ok(())
}

/// Extended-precision add/sub: fold in the carry bit via the
/// narrow carry-only materialization.
fn do_arith_carry(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    op: BinOp,
    cc: Option<CcOp>,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    let carry =
        dc.call_helper(ir, cc::helper_compute_carry as usize, &[dc.env]);
    let t = ir.new_temp(Type::I64);
    op(ir, Type::I64, t, s1, s2);
    let d = ir.new_temp(Type::I64);
    op(ir, Type::I64, d, t, carry);
    dc.store_gpr(ir, i.rd(), d);
    if let Some(kind) = cc {
        dc.gen_cc_record(ir, kind, d, s1, s2);
    }
    Ok(())
}

/// 32×32→64 multiply; Y receives the high word.
fn do_mul(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    signed: bool,
    cc: bool,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    let a32 = ir.new_temp(Type::I32);
    ir.gen_extrl_i64_i32(a32, s1);
    let a = ir.new_temp(Type::I64);
    let b32 = ir.new_temp(Type::I32);
    ir.gen_extrl_i64_i32(b32, s2);
    let b = ir.new_temp(Type::I64);
    if signed {
        ir.gen_ext_i32_i64(a, a32);
        ir.gen_ext_i32_i64(b, b32);
    } else {
        ir.gen_ext_u32_i64(a, a32);
        ir.gen_ext_u32_i64(b, b32);
    }
    let prod = ir.new_temp(Type::I64);
    ir.gen_mul(Type::I64, prod, a, b);
    dc.store_gpr(ir, i.rd(), prod);
    let c32 = ir.new_const(Type::I64, 32);
    let hi = ir.new_temp(Type::I64);
    ir.gen_shr(Type::I64, hi, prod, c32);
    ir.gen_mov(Type::I64, dc.y_t, hi);
    if cc {
        dc.gen_cc_record(ir, CcOp::Logic, prod, a, b);
    }
    Ok(())
}

/// Y:rs1 / operand2 through the divide helper (traps on zero divisor,
/// clamps on overflow; the cc form records the Div kind itself).
fn do_div(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    func: usize,
    cc: bool,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    let res = dc.call_helper(ir, func, &[dc.env, s1, s2]);
    dc.store_gpr(ir, i.rd(), res);
    if cc {
        dc.cc_op = Some(CcOp::Div);
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum ShiftKind {
    Sll,
    Srl,
    Sra,
}

/// Shifts: the extended-width bit widens the count to 6 bits and the
/// operation to the full register; otherwise the low word is shifted
/// and the sign/zero extension of the op re-applied.
fn do_shift(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    kind: ShiftKind,
) -> Result<(), Trap> {
    let s1 = dc.load_gpr(ir, i.rs1());
    let x = i.shift_x();
    let cnt = if i.imm_p() {
        ir.new_const(Type::I64, i.shcnt() as u64)
    } else {
        let r = dc.load_gpr(ir, i.rs2());
        let m = ir.new_const(Type::I64, if x { 63 } else { 31 });
        let t = ir.new_temp(Type::I64);
        ir.gen_and(Type::I64, t, r, m);
        t
    };
    let d = ir.new_temp(Type::I64);
    match (kind, x) {
        (ShiftKind::Sll, _) => {
            ir.gen_shl(Type::I64, d, s1, cnt);
        }
        (ShiftKind::Srl, true) => {
            ir.gen_shr(Type::I64, d, s1, cnt);
        }
        (ShiftKind::Srl, false) => {
            let t32 = ir.new_temp(Type::I32);
            ir.gen_extrl_i64_i32(t32, s1);
            let z = ir.new_temp(Type::I64);
            ir.gen_ext_u32_i64(z, t32);
            ir.gen_shr(Type::I64, d, z, cnt);
        }
        (ShiftKind::Sra, true) => {
            ir.gen_sar(Type::I64, d, s1, cnt);
        }
        (ShiftKind::Sra, false) => {
            let t32 = ir.new_temp(Type::I32);
            ir.gen_extrl_i64_i32(t32, s1);
            let s = ir.new_temp(Type::I64);
            ir.gen_ext_i32_i64(s, t32);
            ir.gen_sar(Type::I64, d, s, cnt);
        }
    }
    dc.store_gpr(ir, i.rd(), d);
    Ok(())
}

/// Effective address: rs1 + (rs2 | simm13).
fn address(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> TempIdx {
    let (s1, s2) = alu_operands(dc, ir, i);
    let a = ir.new_temp(Type::I64);
    ir.gen_add(Type::I64, a, s1, s2);
    a
}

fn do_load(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    memop: MemOp,
) -> Result<(), Trap> {
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, memop);
    let d = ir.new_temp(Type::I64);
    ir.gen_qemu_ld(Type::I64, d, addr, memop, dc.mem_idx);
    dc.store_gpr(ir, i.rd(), d);
    Ok(())
}

fn do_store(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    memop: MemOp,
) -> Result<(), Trap> {
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, memop);
    let v = dc.load_gpr(ir, i.rd());
    ir.gen_qemu_st(Type::I64, v, addr, memop, dc.mem_idx);
    Ok(())
}

/// ASI selector for the alternate-space forms: immediate field, or
/// the %asi register when the immediate-mode bit is set.
fn asi_operand(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> TempIdx {
    if i.imm_p() {
        dc.asi_t
    } else {
        ir.new_const(Type::I64, i.asi() as u64)
    }
}

fn do_load_asi(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    memop: MemOp,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let addr = address(dc, ir, i);
    let asi = asi_operand(dc, ir, i);
    dc.gen_check_align(ir, addr, memop);
    let d = ir.new_temp(Type::I64);
    ir.gen_qemu_ld_asi(Type::I64, d, addr, asi, memop);
    dc.store_gpr(ir, i.rd(), d);
    Ok(())
}

fn do_store_asi(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    memop: MemOp,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let addr = address(dc, ir, i);
    let asi = asi_operand(dc, ir, i);
    dc.gen_check_align(ir, addr, memop);
    let v = dc.load_gpr(ir, i.rd());
    ir.gen_qemu_st_asi(Type::I64, v, addr, asi, memop);
    Ok(())
}

/// Split a 64-bit loaded value into the even/odd destination pair,
/// most-significant word first.
fn store_pair(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    rd: u32,
    val: TempIdx,
) {
    let c32 = ir.new_const(Type::I64, 32);
    let hi = ir.new_temp(Type::I64);
    ir.gen_shr(Type::I64, hi, val, c32);
    dc.store_gpr(ir, rd, hi);
    let t32 = ir.new_temp(Type::I32);
    ir.gen_extrl_i64_i32(t32, val);
    let lo = ir.new_temp(Type::I64);
    ir.gen_ext_u32_i64(lo, t32);
    dc.store_gpr(ir, rd | 1, lo);
}

/// Gather the even/odd source pair into one 64-bit value.
fn load_pair(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    rd: u32,
) -> TempIdx {
    let hi = dc.load_gpr(ir, rd);
    let lo = dc.load_gpr(ir, rd | 1);
    let c32 = ir.new_const(Type::I64, 32);
    let ha = ir.new_temp(Type::I64);
    ir.gen_shl(Type::I64, ha, hi, c32);
    let t32 = ir.new_temp(Type::I32);
    ir.gen_extrl_i64_i32(t32, lo);
    let lz = ir.new_temp(Type::I64);
    ir.gen_ext_u32_i64(lz, t32);
    let v = ir.new_temp(Type::I64);
    ir.gen_or(Type::I64, v, ha, lz);
    v
}

// ── Branches ───────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum BranchOn {
    Icc,
    Xcc,
    Fcc,
}

fn do_branch(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    target: u64,
    on: BranchOn,
) -> Result<(), Trap> {
    let cond = i.cond();
    let annul = i.annul();
    dc.jmp_done = true;

    match cond {
        // Unconditional taken — no runtime test.
        8 => {
            if annul {
                // Delay slot annulled: translation continues at the
                // target within the same block.
                dc.pc = target;
                dc.npc = Npc::Static(target + 4);
            } else {
                match dc.npc {
                    Npc::Static(n) => {
                        dc.pc = n;
                        dc.npc = Npc::Static(target);
                    }
                    Npc::Dynamic => {
                        ir.gen_mov(Type::I64, dc.pc_t, dc.npc_t);
                        let t = ir.new_const(Type::I64, target);
                        ir.gen_mov(Type::I64, dc.npc_t, t);
                        ir.gen_exit_tb(0);
                        dc.base.is_jmp = DisasJumpType::NoReturn;
                    }
                    Npc::Pending { .. } => unreachable!("pending NPC"),
                }
            }
        }
        // Unconditional not taken.
        0 => {
            if annul {
                match dc.npc {
                    Npc::Static(n) => {
                        dc.pc = n + 4;
                        dc.npc = Npc::Static(n + 8);
                    }
                    Npc::Dynamic => {
                        let c4 = ir.new_const(Type::I64, 4);
                        let c8 = ir.new_const(Type::I64, 8);
                        let t1 = ir.new_temp(Type::I64);
                        ir.gen_add(Type::I64, t1, dc.npc_t, c4);
                        let t2 = ir.new_temp(Type::I64);
                        ir.gen_add(Type::I64, t2, dc.npc_t, c8);
                        ir.gen_mov(Type::I64, dc.pc_t, t1);
                        ir.gen_mov(Type::I64, dc.npc_t, t2);
                        ir.gen_exit_tb(0);
                        dc.base.is_jmp = DisasJumpType::NoReturn;
                    }
                    Npc::Pending { .. } => unreachable!("pending NPC"),
                }
            } else {
                // Plain fall-through; the delay slot runs normally.
                dc.jmp_done = false;
            }
        }
        c => {
            let cmp = match on {
                BranchOn::Icc => dc.gen_compare(ir, c, false),
                BranchOn::Xcc => dc.gen_compare(ir, c, true),
                BranchOn::Fcc => dc.gen_fcompare(ir, c),
            };
            if annul {
                // The delay slot belongs to the taken path only:
                // close the block with a two-exit compare.
                let l = ir.new_label();
                ir.gen_brcond(
                    Type::I64,
                    cmp.a,
                    cmp.b,
                    cmp.cond.invert(),
                    l,
                );
                match dc.npc {
                    Npc::Static(n) => {
                        dc.gen_exit_pair(ir, 0, n, target);
                        ir.gen_set_label(l);
                        dc.gen_exit_pair(ir, 1, n + 4, n + 8);
                    }
                    Npc::Dynamic => {
                        ir.gen_mov(Type::I64, dc.pc_t, dc.npc_t);
                        let t = ir.new_const(Type::I64, target);
                        ir.gen_mov(Type::I64, dc.npc_t, t);
                        ir.gen_exit_tb(0);
                        ir.gen_set_label(l);
                        let c4 = ir.new_const(Type::I64, 4);
                        let c8 = ir.new_const(Type::I64, 8);
                        let t1 = ir.new_temp(Type::I64);
                        ir.gen_add(Type::I64, t1, dc.npc_t, c4);
                        let t2 = ir.new_temp(Type::I64);
                        ir.gen_add(Type::I64, t2, dc.npc_t, c8);
                        ir.gen_mov(Type::I64, dc.pc_t, t1);
                        ir.gen_mov(Type::I64, dc.npc_t, t2);
                        ir.gen_exit_tb(0);
                    }
                    Npc::Pending { .. } => unreachable!("pending NPC"),
                }
                dc.base.is_jmp = DisasJumpType::NoReturn;
            } else {
                match dc.npc {
                    Npc::Static(n) => {
                        // The only producer of the two-alternatives
                        // NPC state.
                        dc.pc = n;
                        dc.npc = Npc::Pending {
                            cmp,
                            taken: target,
                            fallthru: n + 4,
                        };
                    }
                    Npc::Dynamic => {
                        let c4 = ir.new_const(Type::I64, 4);
                        let t_fall = ir.new_temp(Type::I64);
                        ir.gen_add(Type::I64, t_fall, dc.npc_t, c4);
                        ir.gen_mov(Type::I64, dc.pc_t, dc.npc_t);
                        let tgt = ir.new_const(Type::I64, target);
                        ir.gen_movcond(
                            Type::I64, dc.npc_t, cmp.a, cmp.b, tgt, t_fall,
                            cmp.cond,
                        );
                        ir.gen_exit_tb(0);
                        dc.base.is_jmp = DisasJumpType::NoReturn;
                    }
                    Npc::Pending { .. } => unreachable!("pending NPC"),
                }
            }
        }
    }
    dc.base.pc_next = dc.pc;
    Ok(())
}

pub(crate) fn trans_bicc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let target = dc.pc.wrapping_add(i.disp22() as u64);
    do_branch(dc, ir, i, target, BranchOn::Icc)
}

pub(crate) fn trans_bpcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    // cc0 must be zero; the other combinations are reserved.
    if i.0 & (1 << 20) != 0 {
        return Err(Trap::IllegalInsn);
    }
    let target = dc.pc.wrapping_add(i.disp19() as u64);
    let on = if i.bpcc_xcc() {
        BranchOn::Xcc
    } else {
        BranchOn::Icc
    };
    do_branch(dc, ir, i, target, on)
}

pub(crate) fn trans_fbfcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let target = dc.pc.wrapping_add(i.disp22() as u64);
    do_branch(dc, ir, i, target, BranchOn::Fcc)
}

pub(crate) fn trans_sethi(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let c = ir.new_const(Type::I64, i.imm22());
    dc.store_gpr(ir, i.rd(), c);
    Ok(())
}

pub(crate) fn trans_call(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let target = dc.pc.wrapping_add(i.disp30() as u64);
    let link = ir.new_const(Type::I64, dc.pc);
    dc.store_gpr(ir, 15, link); // %o7
    dc.jmp_done = true;
    match dc.npc {
        Npc::Static(n) => {
            dc.pc = n;
            dc.npc = Npc::Static(target);
        }
        Npc::Dynamic => {
            ir.gen_mov(Type::I64, dc.pc_t, dc.npc_t);
            let t = ir.new_const(Type::I64, target);
            ir.gen_mov(Type::I64, dc.npc_t, t);
            ir.gen_exit_tb(0);
            dc.base.is_jmp = DisasJumpType::NoReturn;
        }
        Npc::Pending { .. } => unreachable!("pending NPC"),
    }
    dc.base.pc_next = dc.pc;
    Ok(())
}

// ── ALU ────────────────────────────────────────────────────────

pub(crate) fn trans_add(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_add, None)
}

pub(crate) fn trans_and(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_and, None)
}

pub(crate) fn trans_or(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_or, None)
}

pub(crate) fn trans_xor(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_xor, None)
}

pub(crate) fn trans_sub(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_sub, None)
}

pub(crate) fn trans_andn(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_andc, None)
}

pub(crate) fn trans_orn(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_orc, None)
}

pub(crate) fn trans_xnor(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_eqv, None)
}

pub(crate) fn trans_addx(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith_carry(dc, ir, i, Context::gen_add, None)
}

pub(crate) fn trans_subx(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith_carry(dc, ir, i, Context::gen_sub, None)
}

pub(crate) fn trans_umul(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_mul(dc, ir, i, false, false)
}

pub(crate) fn trans_smul(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_mul(dc, ir, i, true, false)
}

pub(crate) fn trans_udiv(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_div(dc, ir, i, helper::helper_udiv as usize, false)
}

pub(crate) fn trans_sdiv(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_div(dc, ir, i, helper::helper_sdiv as usize, false)
}

pub(crate) fn trans_addcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_add, Some(CcOp::Add))
}

pub(crate) fn trans_andcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_and, Some(CcOp::Logic))
}

pub(crate) fn trans_orcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_or, Some(CcOp::Logic))
}

pub(crate) fn trans_xorcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_xor, Some(CcOp::Logic))
}

pub(crate) fn trans_subcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_sub, Some(CcOp::Sub))
}

pub(crate) fn trans_andncc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_andc, Some(CcOp::Logic))
}

pub(crate) fn trans_orncc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_orc, Some(CcOp::Logic))
}

pub(crate) fn trans_xnorcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_eqv, Some(CcOp::Logic))
}

pub(crate) fn trans_addxcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith_carry(dc, ir, i, Context::gen_add, Some(CcOp::AddX))
}

pub(crate) fn trans_umulcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_mul(dc, ir, i, false, true)
}

pub(crate) fn trans_smulcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_mul(dc, ir, i, true, true)
}

pub(crate) fn trans_subxcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith_carry(dc, ir, i, Context::gen_sub, Some(CcOp::SubX))
}

pub(crate) fn trans_udivcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_div(dc, ir, i, helper::helper_udiv_cc as usize, true)
}

pub(crate) fn trans_sdivcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_div(dc, ir, i, helper::helper_sdiv_cc as usize, true)
}

// ── Tagged arithmetic / multiply step ──────────────────────────

pub(crate) fn trans_taddcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_add, Some(CcOp::TAdd))
}

pub(crate) fn trans_tsubcc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_arith(dc, ir, i, Context::gen_sub, Some(CcOp::TSub))
}

pub(crate) fn trans_taddcctv(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    let res = dc.call_helper(
        ir,
        helper::helper_taddcctv as usize,
        &[dc.env, s1, s2],
    );
    dc.store_gpr(ir, i.rd(), res);
    dc.cc_op = Some(CcOp::TAdd);
    Ok(())
}

pub(crate) fn trans_tsubcctv(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    let res = dc.call_helper(
        ir,
        helper::helper_tsubcctv as usize,
        &[dc.env, s1, s2],
    );
    dc.store_gpr(ir, i.rd(), res);
    dc.cc_op = Some(CcOp::TSub);
    Ok(())
}

/// Multiply step. Reads the materialized N⊕V, shifts the partial
/// product through Y and records a plain add for the flags.
pub(crate) fn trans_mulscc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    dc.materialize_cc(ir);

    // v1 = (N ^ V) << 31 | (rs1.low32 >> 1)
    let c3 = ir.new_const(Type::I64, 3);
    let c1 = ir.new_const(Type::I64, 1);
    let c31 = ir.new_const(Type::I64, 31);
    let tn = ir.new_temp(Type::I64);
    ir.gen_shr(Type::I64, tn, dc.icc_t, c3);
    let tv = ir.new_temp(Type::I64);
    ir.gen_shr(Type::I64, tv, dc.icc_t, c1);
    let nv = ir.new_temp(Type::I64);
    ir.gen_xor(Type::I64, nv, tn, tv);
    let nv1 = ir.new_temp(Type::I64);
    ir.gen_and(Type::I64, nv1, nv, c1);
    let hi = ir.new_temp(Type::I64);
    ir.gen_shl(Type::I64, hi, nv1, c31);
    let lo = ir.new_temp(Type::I64);
    ir.gen_extract(Type::I64, lo, s1, 1, 31);
    let v1 = ir.new_temp(Type::I64);
    ir.gen_or(Type::I64, v1, hi, lo);

    // v2 = Y.bit0 ? operand2 : 0
    let zero = ir.new_const(Type::I64, 0);
    let ybit = ir.new_temp(Type::I64);
    ir.gen_and(Type::I64, ybit, dc.y_t, c1);
    let s2m = ir.new_temp(Type::I64);
    let m32 = ir.new_const(Type::I64, 0xffff_ffff);
    ir.gen_and(Type::I64, s2m, s2, m32);
    let v2 = ir.new_temp(Type::I64);
    ir.gen_movcond(
        Type::I64,
        v2,
        ybit,
        zero,
        s2m,
        zero,
        dbt_core::Cond::Ne,
    );

    // rd = (v1 + v2) truncated to the word
    let sum = ir.new_temp(Type::I64);
    ir.gen_add(Type::I64, sum, v1, v2);
    let sum32 = ir.new_temp(Type::I32);
    ir.gen_extrl_i64_i32(sum32, sum);
    let d = ir.new_temp(Type::I64);
    ir.gen_ext_u32_i64(d, sum32);
    dc.store_gpr(ir, i.rd(), d);

    // Y = (Y >> 1) | (rs1 << 31)
    let ysh = ir.new_temp(Type::I64);
    ir.gen_extract(Type::I64, ysh, dc.y_t, 1, 31);
    let ynew = ir.new_temp(Type::I64);
    ir.gen_deposit(Type::I64, ynew, ysh, s1, 31, 1);
    ir.gen_mov(Type::I64, dc.y_t, ynew);

    dc.gen_cc_record(ir, CcOp::Add, d, v1, v2);
    Ok(())
}

// ── Shifts ─────────────────────────────────────────────────────

pub(crate) fn trans_sll(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_shift(dc, ir, i, ShiftKind::Sll)
}

pub(crate) fn trans_srl(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_shift(dc, ir, i, ShiftKind::Srl)
}

pub(crate) fn trans_sra(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_shift(dc, ir, i, ShiftKind::Sra)
}

// ── State registers ────────────────────────────────────────────

pub(crate) fn trans_rdasr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    match i.rs1() {
        0 => {
            dc.store_gpr(ir, i.rd(), dc.y_t);
            Ok(())
        }
        3 => {
            dc.store_gpr(ir, i.rd(), dc.asi_t);
            Ok(())
        }
        15 if i.rd() == 0 => {
            // stbar
            ir.gen_mb(0);
            Ok(())
        }
        _ => Err(Trap::IllegalInsn),
    }
}

pub(crate) fn trans_rdpsr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    dc.materialize_cc(ir);
    let psr = dc.call_helper(ir, trap::helper_rdpsr as usize, &[dc.env]);
    dc.store_gpr(ir, i.rd(), psr);
    Ok(())
}

pub(crate) fn trans_rdwim(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let t = ir.new_temp(Type::I64);
    ir.gen_ld32u(t, dc.env, super::cpu::WIM_OFFSET);
    dc.store_gpr(ir, i.rd(), t);
    Ok(())
}

pub(crate) fn trans_rdtbr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let t = ir.new_temp(Type::I64);
    ir.gen_ld(Type::I64, t, dc.env, super::cpu::TBR_OFFSET);
    dc.store_gpr(ir, i.rd(), t);
    Ok(())
}

/// Write-state source: rs1 ^ operand2.
fn wr_source(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> TempIdx {
    let (s1, s2) = alu_operands(dc, ir, i);
    let t = ir.new_temp(Type::I64);
    ir.gen_xor(Type::I64, t, s1, s2);
    t
}

pub(crate) fn trans_wrasr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    match i.rd() {
        0 => {
            let t = wr_source(dc, ir, i);
            ir.gen_mov(Type::I64, dc.y_t, t);
            Ok(())
        }
        3 => {
            let t = wr_source(dc, ir, i);
            let m = ir.new_const(Type::I64, 0xff);
            let v = ir.new_temp(Type::I64);
            ir.gen_and(Type::I64, v, t, m);
            ir.gen_mov(Type::I64, dc.asi_t, v);
            Ok(())
        }
        _ => Err(Trap::IllegalInsn),
    }
}

pub(crate) fn trans_wrpsr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let t = wr_source(dc, ir, i);
    dc.call_helper(ir, trap::helper_wrpsr as usize, &[dc.env, t]);
    // The icc nibble was replaced wholesale, and the privilege bits
    // the block was translated under may be stale: stop here.
    dc.cc_op = Some(CcOp::Flags);
    dc.base.is_jmp = DisasJumpType::TooMany;
    Ok(())
}

pub(crate) fn trans_wrwim(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let t = wr_source(dc, ir, i);
    let m = ir.new_const(Type::I64, (1u64 << dc.nwindows) - 1);
    let v = ir.new_temp(Type::I64);
    ir.gen_and(Type::I64, v, t, m);
    ir.gen_st32(v, dc.env, super::cpu::WIM_OFFSET);
    Ok(())
}

pub(crate) fn trans_wrtbr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let t = wr_source(dc, ir, i);
    let base_m = ir.new_const(Type::I64, super::cpu::TBR_BASE_MASK);
    let nb = ir.new_temp(Type::I64);
    ir.gen_and(Type::I64, nb, t, base_m);
    let old = ir.new_temp(Type::I64);
    ir.gen_ld(Type::I64, old, dc.env, super::cpu::TBR_OFFSET);
    let tt_m = ir.new_const(Type::I64, super::cpu::TBR_TT_MASK);
    let ot = ir.new_temp(Type::I64);
    ir.gen_and(Type::I64, ot, old, tt_m);
    let v = ir.new_temp(Type::I64);
    ir.gen_or(Type::I64, v, nb, ot);
    ir.gen_st(Type::I64, v, dc.env, super::cpu::TBR_OFFSET);
    Ok(())
}

// ── FPU ────────────────────────────────────────────────────────

/// FP register-to-register move family: pure bit manipulation,
/// inlined rather than called out.
fn fpr_mov(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    sign_op: Option<BinOp>,
) {
    let t = ir.new_temp(Type::I64);
    ir.gen_ld32u(t, dc.env, fpr_offset(i.rs2() as usize));
    let v = match sign_op {
        None => t,
        Some(op) => {
            let m = ir.new_const(Type::I64, 0x8000_0000);
            let d = ir.new_temp(Type::I64);
            op(ir, Type::I64, d, t, m);
            d
        }
    };
    ir.gen_st32(v, dc.env, fpr_offset(i.rd() as usize));
}

/// Two-source FP arithmetic helper call; register numbers travel as
/// constants, the helper owns the register file access.
fn fpop_call2(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    func: usize,
) {
    let rd = ir.new_const(Type::I64, i.rd() as u64);
    let rs1 = ir.new_const(Type::I64, i.rs1() as u64);
    let rs2 = ir.new_const(Type::I64, i.rs2() as u64);
    dc.call_helper(ir, func, &[dc.env, rd, rs1, rs2]);
}

/// Single-source FP helper call (sqrt, conversions).
fn fpop_call1(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
    func: usize,
) {
    let rd = ir.new_const(Type::I64, i.rd() as u64);
    let rs2 = ir.new_const(Type::I64, i.rs2() as u64);
    dc.call_helper(ir, func, &[dc.env, rd, rs2]);
}

pub(crate) fn trans_fpop1(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    match i.opf() {
        0x01 => fpr_mov(dc, ir, i, None),                     // fmovs
        0x05 => fpr_mov(dc, ir, i, Some(Context::gen_xor)),   // fnegs
        0x09 => fpr_mov(dc, ir, i, Some(Context::gen_andc)),  // fabss
        0x29 => fpop_call1(dc, ir, i, fpu::helper_fsqrts as usize),
        0x2a => fpop_call1(dc, ir, i, fpu::helper_fsqrtd as usize),
        0x41 => fpop_call2(dc, ir, i, fpu::helper_fadds as usize),
        0x42 => fpop_call2(dc, ir, i, fpu::helper_faddd as usize),
        0x45 => fpop_call2(dc, ir, i, fpu::helper_fsubs as usize),
        0x46 => fpop_call2(dc, ir, i, fpu::helper_fsubd as usize),
        0x49 => fpop_call2(dc, ir, i, fpu::helper_fmuls as usize),
        0x4a => fpop_call2(dc, ir, i, fpu::helper_fmuld as usize),
        0x4d => fpop_call2(dc, ir, i, fpu::helper_fdivs as usize),
        0x4e => fpop_call2(dc, ir, i, fpu::helper_fdivd as usize),
        0x69 => fpop_call2(dc, ir, i, fpu::helper_fsmuld as usize),
        0xc4 => fpop_call1(dc, ir, i, fpu::helper_fitos as usize),
        0xc6 => fpop_call1(dc, ir, i, fpu::helper_fdtos as usize),
        0xc8 => fpop_call1(dc, ir, i, fpu::helper_fitod as usize),
        0xc9 => fpop_call1(dc, ir, i, fpu::helper_fstod as usize),
        0xd1 => fpop_call1(dc, ir, i, fpu::helper_fstoi as usize),
        0xd2 => fpop_call1(dc, ir, i, fpu::helper_fdtoi as usize),
        _ => return Err(Trap::IllegalInsn),
    }
    Ok(())
}

pub(crate) fn trans_fpop2(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let func = match i.opf() {
        0x51 => fpu::helper_fcmps as usize,
        0x52 => fpu::helper_fcmpd as usize,
        0x55 => fpu::helper_fcmpes as usize,
        0x56 => fpu::helper_fcmped as usize,
        _ => return Err(Trap::IllegalInsn),
    };
    let rs1 = ir.new_const(Type::I64, i.rs1() as u64);
    let rs2 = ir.new_const(Type::I64, i.rs2() as u64);
    dc.call_helper(ir, func, &[dc.env, rs1, rs2]);
    Ok(())
}

// ── Control transfer / windows ─────────────────────────────────

/// Delayed transfer to a runtime target: PC steps into the delay
/// slot, the architectural NPC takes the target.
fn delayed_dynamic_jump(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    target: TempIdx,
) {
    dc.jmp_done = true;
    match dc.npc {
        Npc::Static(n) => {
            ir.gen_mov(Type::I64, dc.npc_t, target);
            dc.pc = n;
            dc.npc = Npc::Dynamic;
        }
        Npc::Dynamic => {
            ir.gen_mov(Type::I64, dc.pc_t, dc.npc_t);
            ir.gen_mov(Type::I64, dc.npc_t, target);
            ir.gen_exit_tb(0);
            dc.base.is_jmp = DisasJumpType::NoReturn;
        }
        Npc::Pending { .. } => unreachable!("pending NPC"),
    }
    dc.base.pc_next = dc.pc;
}

pub(crate) fn trans_jmpl(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let target = address(dc, ir, i);
    let c3 = ir.new_const(Type::I64, 3);
    dc.call_helper(
        ir,
        trap::helper_check_align as usize,
        &[dc.env, target, c3],
    );
    let link = ir.new_const(Type::I64, dc.pc);
    dc.store_gpr(ir, i.rd(), link);
    delayed_dynamic_jump(dc, ir, target);
    Ok(())
}

pub(crate) fn trans_rett(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let target = address(dc, ir, i);
    let c3 = ir.new_const(Type::I64, 3);
    dc.call_helper(
        ir,
        trap::helper_check_align as usize,
        &[dc.env, target, c3],
    );
    dc.call_helper(ir, trap::helper_rett as usize, &[dc.env]);
    delayed_dynamic_jump(dc, ir, target);
    Ok(())
}

pub(crate) fn trans_ticc(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let cond = i.cond();
    if cond == 0 {
        return Ok(());
    }

    let gen_raise = |dc: &mut SparcDisasContext, ir: &mut Context| {
        let (s1, s2) = alu_operands(dc, ir, i);
        let sum = ir.new_temp(Type::I64);
        ir.gen_add(Type::I64, sum, s1, s2);
        let m = ir.new_const(Type::I64, 0x7f);
        let n = ir.new_temp(Type::I64);
        ir.gen_and(Type::I64, n, sum, m);
        let base = ir.new_const(Type::I64, trap::TT_TRAP as u64);
        let tt = ir.new_temp(Type::I64);
        ir.gen_or(Type::I64, tt, n, base);
        dc.save_state(ir);
        dc.call_helper(
            ir,
            trap::helper_raise_exception as usize,
            &[dc.env, tt],
        );
        ir.gen_exit_tb(0);
    };

    if cond == 8 {
        gen_raise(dc, ir);
        dc.jmp_done = true;
        dc.base.is_jmp = DisasJumpType::NoReturn;
        return Ok(());
    }

    let cmp = dc.gen_compare(ir, cond, false);
    let l = ir.new_label();
    ir.gen_brcond(Type::I64, cmp.a, cmp.b, cmp.cond.invert(), l);
    gen_raise(dc, ir);
    ir.gen_set_label(l);
    Ok(())
}

pub(crate) fn trans_iflush(
    _dc: &mut SparcDisasContext,
    _ir: &mut Context,
    _i: Insn,
) -> Result<(), Trap> {
    Ok(())
}

pub(crate) fn trans_save(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    // The sum reads the old window; the destination lands in the new
    // one once the helper has rotated it.
    let (s1, s2) = alu_operands(dc, ir, i);
    let sum = ir.new_temp(Type::I64);
    ir.gen_add(Type::I64, sum, s1, s2);
    dc.call_helper(ir, trap::helper_save as usize, &[dc.env]);
    dc.store_gpr(ir, i.rd(), sum);
    Ok(())
}

pub(crate) fn trans_restore(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let (s1, s2) = alu_operands(dc, ir, i);
    let sum = ir.new_temp(Type::I64);
    ir.gen_add(Type::I64, sum, s1, s2);
    dc.call_helper(ir, trap::helper_restore as usize, &[dc.env]);
    dc.store_gpr(ir, i.rd(), sum);
    Ok(())
}

// ── Memory: implicit address space ─────────────────────────────

pub(crate) fn trans_ld(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load(dc, ir, i, MO_TEUL)
}

pub(crate) fn trans_ldub(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load(dc, ir, i, MO_UB)
}

pub(crate) fn trans_lduh(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load(dc, ir, i, MO_TEUW)
}

pub(crate) fn trans_ldd(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if i.rd() & 1 != 0 {
        return Err(Trap::IllegalInsn);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUQ);
    let t = ir.new_temp(Type::I64);
    ir.gen_qemu_ld(Type::I64, t, addr, MO_TEUQ, dc.mem_idx);
    store_pair(dc, ir, i.rd(), t);
    Ok(())
}

pub(crate) fn trans_st(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store(dc, ir, i, MO_TEUL)
}

pub(crate) fn trans_stb(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store(dc, ir, i, MO_UB)
}

pub(crate) fn trans_sth(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store(dc, ir, i, MO_TEUW)
}

pub(crate) fn trans_std(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if i.rd() & 1 != 0 {
        return Err(Trap::IllegalInsn);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUQ);
    let v = load_pair(dc, ir, i.rd());
    ir.gen_qemu_st(Type::I64, v, addr, MO_TEUQ, dc.mem_idx);
    Ok(())
}

pub(crate) fn trans_ldsw(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load(dc, ir, i, MO_TESL)
}

pub(crate) fn trans_ldsb(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load(dc, ir, i, MO_SB)
}

pub(crate) fn trans_ldsh(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load(dc, ir, i, MO_TESW)
}

pub(crate) fn trans_ldx(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load(dc, ir, i, MO_TEUQ)
}

pub(crate) fn trans_stx(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store(dc, ir, i, MO_TEUQ)
}

pub(crate) fn trans_ldstub(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let addr = address(dc, ir, i);
    let d = ir.new_temp(Type::I64);
    ir.gen_qemu_ld(Type::I64, d, addr, MO_UB, dc.mem_idx);
    let ff = ir.new_const(Type::I64, 0xff);
    ir.gen_qemu_st(Type::I64, ff, addr, MO_UB, dc.mem_idx);
    dc.store_gpr(ir, i.rd(), d);
    Ok(())
}

pub(crate) fn trans_swap(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUL);
    let d = ir.new_temp(Type::I64);
    ir.gen_qemu_ld(Type::I64, d, addr, MO_TEUL, dc.mem_idx);
    let v = dc.load_gpr(ir, i.rd());
    ir.gen_qemu_st(Type::I64, v, addr, MO_TEUL, dc.mem_idx);
    dc.store_gpr(ir, i.rd(), d);
    Ok(())
}

// ── Memory: explicit address-space identifier ──────────────────

pub(crate) fn trans_lda(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load_asi(dc, ir, i, MO_TEUL)
}

pub(crate) fn trans_lduba(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load_asi(dc, ir, i, MO_UB)
}

pub(crate) fn trans_lduha(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load_asi(dc, ir, i, MO_TEUW)
}

pub(crate) fn trans_ldda(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    if i.rd() & 1 != 0 {
        return Err(Trap::IllegalInsn);
    }
    let addr = address(dc, ir, i);
    let asi = asi_operand(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUQ);
    let t = ir.new_temp(Type::I64);
    ir.gen_qemu_ld_asi(Type::I64, t, addr, asi, MO_TEUQ);
    store_pair(dc, ir, i.rd(), t);
    Ok(())
}

pub(crate) fn trans_sta(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store_asi(dc, ir, i, MO_TEUL)
}

pub(crate) fn trans_stba(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store_asi(dc, ir, i, MO_UB)
}

pub(crate) fn trans_stha(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store_asi(dc, ir, i, MO_TEUW)
}

pub(crate) fn trans_stda(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    if i.rd() & 1 != 0 {
        return Err(Trap::IllegalInsn);
    }
    let addr = address(dc, ir, i);
    let asi = asi_operand(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUQ);
    let v = load_pair(dc, ir, i.rd());
    ir.gen_qemu_st_asi(Type::I64, v, addr, asi, MO_TEUQ);
    Ok(())
}

pub(crate) fn trans_ldswa(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load_asi(dc, ir, i, MO_TESL)
}

pub(crate) fn trans_ldsba(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load_asi(dc, ir, i, MO_SB)
}

pub(crate) fn trans_ldsha(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load_asi(dc, ir, i, MO_TESW)
}

pub(crate) fn trans_ldxa(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_load_asi(dc, ir, i, MO_TEUQ)
}

pub(crate) fn trans_stxa(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    do_store_asi(dc, ir, i, MO_TEUQ)
}

pub(crate) fn trans_ldstuba(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let addr = address(dc, ir, i);
    let asi = asi_operand(dc, ir, i);
    let d = ir.new_temp(Type::I64);
    ir.gen_qemu_ld_asi(Type::I64, d, addr, asi, MO_UB);
    let ff = ir.new_const(Type::I64, 0xff);
    ir.gen_qemu_st_asi(Type::I64, ff, addr, asi, MO_UB);
    dc.store_gpr(ir, i.rd(), d);
    Ok(())
}

pub(crate) fn trans_swapa(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.supervisor {
        return Err(Trap::PrivilegedInsn);
    }
    let addr = address(dc, ir, i);
    let asi = asi_operand(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUL);
    let d = ir.new_temp(Type::I64);
    ir.gen_qemu_ld_asi(Type::I64, d, addr, asi, MO_TEUL);
    let v = dc.load_gpr(ir, i.rd());
    ir.gen_qemu_st_asi(Type::I64, v, addr, asi, MO_TEUL);
    dc.store_gpr(ir, i.rd(), d);
    Ok(())
}

// ── Memory: FP register file ───────────────────────────────────

pub(crate) fn trans_ldf(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUL);
    let t = ir.new_temp(Type::I64);
    ir.gen_qemu_ld(Type::I64, t, addr, MO_TEUL, dc.mem_idx);
    ir.gen_st32(t, dc.env, fpr_offset(i.rd() as usize));
    Ok(())
}

pub(crate) fn trans_ldfsr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUL);
    let t = ir.new_temp(Type::I64);
    ir.gen_qemu_ld(Type::I64, t, addr, MO_TEUL, dc.mem_idx);
    dc.call_helper(ir, fpu::helper_ldfsr as usize, &[dc.env, t]);
    Ok(())
}

pub(crate) fn trans_lddf(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUQ);
    let t = ir.new_temp(Type::I64);
    ir.gen_qemu_ld(Type::I64, t, addr, MO_TEUQ, dc.mem_idx);
    let rd = (i.rd() & !1) as usize;
    let c32 = ir.new_const(Type::I64, 32);
    let hi = ir.new_temp(Type::I64);
    ir.gen_shr(Type::I64, hi, t, c32);
    ir.gen_st32(hi, dc.env, fpr_offset(rd));
    ir.gen_st32(t, dc.env, fpr_offset(rd + 1));
    Ok(())
}

pub(crate) fn trans_stf(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUL);
    let t = ir.new_temp(Type::I64);
    ir.gen_ld32u(t, dc.env, fpr_offset(i.rd() as usize));
    ir.gen_qemu_st(Type::I64, t, addr, MO_TEUL, dc.mem_idx);
    Ok(())
}

pub(crate) fn trans_stfsr(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUL);
    ir.gen_qemu_st(Type::I64, dc.fsr_t, addr, MO_TEUL, dc.mem_idx);
    Ok(())
}

pub(crate) fn trans_stdf(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    if !dc.fpu_enabled {
        return Err(Trap::FpuDisabled);
    }
    let addr = address(dc, ir, i);
    dc.gen_check_align(ir, addr, MO_TEUQ);
    let rd = (i.rd() & !1) as usize;
    let hi = ir.new_temp(Type::I64);
    ir.gen_ld32u(hi, dc.env, fpr_offset(rd));
    let lo = ir.new_temp(Type::I64);
    ir.gen_ld32u(lo, dc.env, fpr_offset(rd + 1));
    let c32 = ir.new_const(Type::I64, 32);
    let ha = ir.new_temp(Type::I64);
    ir.gen_shl(Type::I64, ha, hi, c32);
    let v = ir.new_temp(Type::I64);
    ir.gen_or(Type::I64, v, ha, lo);
    ir.gen_qemu_st(Type::I64, v, addr, MO_TEUQ, dc.mem_idx);
    Ok(())
}

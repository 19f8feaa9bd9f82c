//! IR emission methods on `Context`.
//!
//! Constant args are encoded as `TempIdx(raw_value as u32)` — they are
//! positionally distinguished from temp operands by the opcode's OpDef,
//! never by value.

use crate::context::Context;
use crate::op::Op;
use crate::opcode::Opcode;
use crate::temp::TempIdx;
use crate::types::{Cond, MemOp, Type};

fn carg(val: u32) -> TempIdx {
    TempIdx(val)
}

impl Context {
    // -- Internal helpers --

    fn emit_binary(
        &mut self,
        opc: Opcode,
        ty: Type,
        dst: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(idx, opc, ty, &[dst, a, b]);
        self.emit_op(op);
        dst
    }

    fn emit_unary(
        &mut self,
        opc: Opcode,
        ty: Type,
        dst: TempIdx,
        src: TempIdx,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(idx, opc, ty, &[dst, src]);
        self.emit_op(op);
        dst
    }

    // -- Binary ALU (1 oarg, 2 iargs) --

    pub fn gen_add(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Add, ty, d, a, b)
    }

    pub fn gen_sub(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Sub, ty, d, a, b)
    }

    pub fn gen_mul(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Mul, ty, d, a, b)
    }

    pub fn gen_and(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::And, ty, d, a, b)
    }

    pub fn gen_or(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Or, ty, d, a, b)
    }

    pub fn gen_xor(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Xor, ty, d, a, b)
    }

    pub fn gen_andc(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::AndC, ty, d, a, b)
    }

    pub fn gen_orc(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::OrC, ty, d, a, b)
    }

    pub fn gen_eqv(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Eqv, ty, d, a, b)
    }

    pub fn gen_shl(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Shl, ty, d, a, b)
    }

    pub fn gen_shr(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Shr, ty, d, a, b)
    }

    pub fn gen_sar(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
    ) -> TempIdx {
        self.emit_binary(Opcode::Sar, ty, d, a, b)
    }

    // -- Unary (1 oarg, 1 iarg) --

    pub fn gen_neg(&mut self, ty: Type, d: TempIdx, s: TempIdx) -> TempIdx {
        self.emit_unary(Opcode::Neg, ty, d, s)
    }

    pub fn gen_not(&mut self, ty: Type, d: TempIdx, s: TempIdx) -> TempIdx {
        self.emit_unary(Opcode::Not, ty, d, s)
    }

    pub fn gen_mov(&mut self, ty: Type, d: TempIdx, s: TempIdx) -> TempIdx {
        self.emit_unary(Opcode::Mov, ty, d, s)
    }

    // -- Bit field --

    pub fn gen_extract(
        &mut self,
        ty: Type,
        d: TempIdx,
        src: TempIdx,
        ofs: u32,
        len: u32,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::Extract,
            ty,
            &[d, src, carg(ofs), carg(len)],
        );
        self.emit_op(op);
        d
    }

    pub fn gen_sextract(
        &mut self,
        ty: Type,
        d: TempIdx,
        src: TempIdx,
        ofs: u32,
        len: u32,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::SExtract,
            ty,
            &[d, src, carg(ofs), carg(len)],
        );
        self.emit_op(op);
        d
    }

    pub fn gen_deposit(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
        ofs: u32,
        len: u32,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::Deposit,
            ty,
            &[d, a, b, carg(ofs), carg(len)],
        );
        self.emit_op(op);
        d
    }

    // -- Type conversion (1 oarg, 1 iarg) --

    /// Sign-extend i32 → i64.
    pub fn gen_ext_i32_i64(&mut self, d: TempIdx, s: TempIdx) -> TempIdx {
        self.emit_unary(Opcode::ExtI32I64, Type::I64, d, s)
    }

    /// Zero-extend i32 → i64.
    pub fn gen_ext_u32_i64(&mut self, d: TempIdx, s: TempIdx) -> TempIdx {
        self.emit_unary(Opcode::ExtUI32I64, Type::I64, d, s)
    }

    /// Truncate i64 → i32 (low 32 bits).
    pub fn gen_extrl_i64_i32(&mut self, d: TempIdx, s: TempIdx) -> TempIdx {
        self.emit_unary(Opcode::ExtrlI64I32, Type::I32, d, s)
    }

    /// Extract i64 → i32 (high 32 bits).
    pub fn gen_extrh_i64_i32(&mut self, d: TempIdx, s: TempIdx) -> TempIdx {
        self.emit_unary(Opcode::ExtrhI64I32, Type::I32, d, s)
    }

    // -- SetCond / MovCond --

    pub fn gen_setcond(
        &mut self,
        ty: Type,
        d: TempIdx,
        a: TempIdx,
        b: TempIdx,
        cond: Cond,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::SetCond,
            ty,
            &[d, a, b, carg(cond as u32)],
        );
        self.emit_op(op);
        d
    }

    /// `d = (c1 cond c2) ? v1 : v2`
    pub fn gen_movcond(
        &mut self,
        ty: Type,
        d: TempIdx,
        c1: TempIdx,
        c2: TempIdx,
        v1: TempIdx,
        v2: TempIdx,
        cond: Cond,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::MovCond,
            ty,
            &[d, c1, c2, v1, v2, carg(cond as u32)],
        );
        self.emit_op(op);
        d
    }

    // -- Host Ld/St (for CPU state access) --

    /// Load: dst = *(base + offset)
    pub fn gen_ld(
        &mut self,
        ty: Type,
        dst: TempIdx,
        base: TempIdx,
        offset: i64,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::Ld,
            ty,
            &[dst, base, carg(offset as u32)],
        );
        self.emit_op(op);
        dst
    }

    /// Store: *(base + offset) = val
    pub fn gen_st(
        &mut self,
        ty: Type,
        val: TempIdx,
        base: TempIdx,
        offset: i64,
    ) {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::St,
            ty,
            &[val, base, carg(offset as u32)],
        );
        self.emit_op(op);
    }

    pub fn gen_ld32u(
        &mut self,
        dst: TempIdx,
        base: TempIdx,
        offset: i64,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::Ld32U,
            Type::I64,
            &[dst, base, carg(offset as u32)],
        );
        self.emit_op(op);
        dst
    }

    pub fn gen_ld32s(
        &mut self,
        dst: TempIdx,
        base: TempIdx,
        offset: i64,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::Ld32S,
            Type::I64,
            &[dst, base, carg(offset as u32)],
        );
        self.emit_op(op);
        dst
    }

    pub fn gen_st32(&mut self, val: TempIdx, base: TempIdx, offset: i64) {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::St32,
            Type::I64,
            &[val, base, carg(offset as u32)],
        );
        self.emit_op(op);
    }

    // -- Branches / labels --

    pub fn gen_br(&mut self, label_id: u32) {
        self.label_mut(label_id).refs += 1;
        let idx = self.next_op_idx();
        let op =
            Op::with_args(idx, Opcode::Br, Type::I64, &[carg(label_id)]);
        self.emit_op(op);
    }

    pub fn gen_brcond(
        &mut self,
        ty: Type,
        a: TempIdx,
        b: TempIdx,
        cond: Cond,
        label_id: u32,
    ) {
        self.label_mut(label_id).refs += 1;
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::BrCond,
            ty,
            &[a, b, carg(cond as u32), carg(label_id)],
        );
        self.emit_op(op);
    }

    pub fn gen_set_label(&mut self, label_id: u32) {
        self.label_mut(label_id).present = true;
        let idx = self.next_op_idx();
        let op =
            Op::with_args(idx, Opcode::SetLabel, Type::I64, &[carg(label_id)]);
        self.emit_op(op);
    }

    // -- Block exit --

    /// GotoTb: patchable direct jump; `tb_idx` selects the chain slot.
    pub fn gen_goto_tb(&mut self, tb_idx: u32) {
        let idx = self.next_op_idx();
        let op =
            Op::with_args(idx, Opcode::GotoTb, Type::I64, &[carg(tb_idx)]);
        self.emit_op(op);
    }

    /// ExitTb: leave generated code; `val` carries the chain slot (or 0
    /// for an unchained exit).
    pub fn gen_exit_tb(&mut self, val: u64) {
        let idx = self.next_op_idx();
        let op =
            Op::with_args(idx, Opcode::ExitTb, Type::I64, &[carg(val as u32)]);
        self.emit_op(op);
    }

    // -- Boundary --

    /// InsnStart: 2 cargs (pc_lo, pc_hi)
    pub fn gen_insn_start(&mut self, pc: u64) {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::InsnStart,
            Type::I64,
            &[carg(pc as u32), carg((pc >> 32) as u32)],
        );
        self.emit_op(op);
    }

    /// Mb: memory barrier.
    pub fn gen_mb(&mut self, bar_type: u32) {
        let idx = self.next_op_idx();
        let op = Op::with_args(idx, Opcode::Mb, Type::I64, &[carg(bar_type)]);
        self.emit_op(op);
    }

    // -- Call --

    /// Call helper: dst = helper(args[0..6]).
    ///
    /// Unused argument slots are padded with a zero constant; helpers
    /// with no meaningful result still name a dst temp, which the
    /// caller simply never reads.
    pub fn gen_call(
        &mut self,
        dst: TempIdx,
        helper: u64,
        args: &[TempIdx],
    ) -> TempIdx {
        debug_assert!(args.len() <= 6);
        let mut full_args = Vec::with_capacity(1 + 6 + 2);
        full_args.push(dst);
        let zero = self.new_const(Type::I64, 0);
        for i in 0..6 {
            let arg = args.get(i).copied().unwrap_or(zero);
            full_args.push(arg);
        }
        full_args.push(carg(helper as u32));
        full_args.push(carg((helper >> 32) as u32));
        let idx = self.next_op_idx();
        let op = Op::with_args(idx, Opcode::Call, Type::I64, &full_args);
        self.emit_op(op);
        dst
    }

    // -- Guest memory access --

    /// Load through the default address space for `mem_idx`.
    pub fn gen_qemu_ld(
        &mut self,
        ty: Type,
        dst: TempIdx,
        addr: TempIdx,
        memop: MemOp,
        mem_idx: u32,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::QemuLd,
            ty,
            &[dst, addr, carg(memop.bits() as u32), carg(mem_idx)],
        );
        self.emit_op(op);
        dst
    }

    /// Store through the default address space for `mem_idx`.
    pub fn gen_qemu_st(
        &mut self,
        ty: Type,
        val: TempIdx,
        addr: TempIdx,
        memop: MemOp,
        mem_idx: u32,
    ) {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::QemuSt,
            ty,
            &[val, addr, carg(memop.bits() as u32), carg(mem_idx)],
        );
        self.emit_op(op);
    }

    /// Load through an explicit address-space identifier. `asi` is a
    /// runtime value (a constant temp when the ASI comes from an
    /// immediate field).
    pub fn gen_qemu_ld_asi(
        &mut self,
        ty: Type,
        dst: TempIdx,
        addr: TempIdx,
        asi: TempIdx,
        memop: MemOp,
    ) -> TempIdx {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::QemuLdAsi,
            ty,
            &[dst, addr, asi, carg(memop.bits() as u32)],
        );
        self.emit_op(op);
        dst
    }

    /// Store through an explicit address-space identifier.
    pub fn gen_qemu_st_asi(
        &mut self,
        ty: Type,
        val: TempIdx,
        addr: TempIdx,
        asi: TempIdx,
        memop: MemOp,
    ) {
        let idx = self.next_op_idx();
        let op = Op::with_args(
            idx,
            Opcode::QemuStAsi,
            ty,
            &[val, addr, asi, carg(memop.bits() as u32)],
        );
        self.emit_op(op);
    }
}

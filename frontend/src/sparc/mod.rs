//! SPARC frontend — instruction decoding and IR generation.
//!
//! Decoding is table-driven: the two format-3 classes dispatch through
//! per-op3 tables of handler functions built once at startup. Handlers
//! return `Err(Trap)` for decode faults (unknown pattern, privilege,
//! FPU disabled) and the driver emits the trap-raising IR.

pub mod cc;
pub mod cpu;
pub mod fpu;
pub mod helper;
pub mod insn;
pub mod trans;
pub mod trap;

use std::sync::OnceLock;

use dbt_core::{Cond, Context, MemOp, TempIdx, Type};
use tracing::debug;

use crate::{DisasContextBase, DisasJumpType, TranslatorOps};
use cc::CcOp;
use cpu::{
    greg_offset, SparcCpu, ASI_OFFSET, CC_DST_OFFSET, CC_OP_OFFSET,
    CC_SRC2_OFFSET, CC_SRC_OFFSET, FSR_OFFSET, ICC_OFFSET, NPC_OFFSET,
    PC_OFFSET, REGWPTR_OFFSET, XCC_OFFSET, Y_OFFSET,
};
use insn::Insn;
use trap::{helper_raise_exception, Trap};

/// Guest page granularity for block bounding and exit chaining.
pub const TARGET_PAGE_BITS: u64 = 12;

// -- Guest memory operation flavors ------------------------------
// The guest is big-endian; swap on little-endian hosts.

const MO_SWAP: u16 = if cfg!(target_endian = "little") {
    MemOp::BSWAP
} else {
    0
};

pub const MO_UB: MemOp = MemOp(MemOp::SIZE_8);
pub const MO_SB: MemOp = MemOp(MemOp::SIZE_8 | MemOp::SIGN);
pub const MO_TEUW: MemOp = MemOp(MemOp::SIZE_16 | MO_SWAP);
pub const MO_TESW: MemOp = MemOp(MemOp::SIZE_16 | MemOp::SIGN | MO_SWAP);
pub const MO_TEUL: MemOp = MemOp(MemOp::SIZE_32 | MO_SWAP);
pub const MO_TESL: MemOp = MemOp(MemOp::SIZE_32 | MemOp::SIGN | MO_SWAP);
pub const MO_TEUQ: MemOp = MemOp(MemOp::SIZE_64 | MO_SWAP);

// ---------------------------------------------------------------
// NPC tracking
// ---------------------------------------------------------------

/// A deferred comparison: branch taken iff `a cond b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisasCompare {
    pub a: TempIdx,
    pub b: TempIdx,
    pub cond: Cond,
}

/// Translation-time state of the next program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Npc {
    /// Statically known.
    Static(u64),
    /// Held in the architectural NPC register only.
    Dynamic,
    /// One of two statically known targets, pending a condition.
    /// Collapses to `Dynamic` (via a conditional move into the NPC
    /// register) before the next instruction is translated.
    Pending {
        cmp: DisasCompare,
        taken: u64,
        fallthru: u64,
    },
}

// ---------------------------------------------------------------
// Disassembly context
// ---------------------------------------------------------------

/// SPARC disassembly context (extends `DisasContextBase`).
pub struct SparcDisasContext {
    /// Generic base fields (pc bookkeeping, counters).
    pub base: DisasContextBase,

    // IR temps bound to CPU state fields.
    pub env: TempIdx,
    pub gregs: [TempIdx; 8],
    pub regwptr: TempIdx,
    pub pc_t: TempIdx,
    pub npc_t: TempIdx,
    pub y_t: TempIdx,
    pub asi_t: TempIdx,
    pub cc_op_t: TempIdx,
    pub cc_src_t: TempIdx,
    pub cc_src2_t: TempIdx,
    pub cc_dst_t: TempIdx,
    pub icc_t: TempIdx,
    pub xcc_t: TempIdx,
    pub fsr_t: TempIdx,

    /// Address of the instruction currently being translated.
    pub pc: u64,
    /// Next-PC state machine.
    pub npc: Npc,
    /// Translation-time mirror of the condition-code tag; `None` when
    /// inherited from a previous block (forces materialization).
    pub cc_op: Option<CcOp>,
    /// Block translated in supervisor mode (fixed per block).
    pub supervisor: bool,
    /// FPU enabled for this block (fixed per block).
    pub fpu_enabled: bool,
    /// Memory index for implicit accesses.
    pub mem_idx: u32,
    /// Window count of the variant being translated.
    pub nwindows: u32,
    /// Raw instruction word being decoded.
    pub opcode: u32,
    /// Set by handlers that manage PC/NPC themselves.
    jmp_done: bool,
    /// Pointer to guest code bytes for fetching.
    pub guest_base: *const u8,
}

impl SparcDisasContext {
    /// Create a context for translating a block starting at `pc`/`npc`
    /// under the given translation-time flags.
    pub fn new(
        pc: u64,
        npc: u64,
        guest_base: *const u8,
        supervisor: bool,
        fpu_enabled: bool,
        nwindows: u32,
    ) -> Self {
        Self {
            base: DisasContextBase {
                pc_first: pc,
                pc_next: pc,
                is_jmp: DisasJumpType::Next,
                num_insns: 0,
                max_insns: 512,
            },
            env: TempIdx(0),
            gregs: [TempIdx(0); 8],
            regwptr: TempIdx(0),
            pc_t: TempIdx(0),
            npc_t: TempIdx(0),
            y_t: TempIdx(0),
            asi_t: TempIdx(0),
            cc_op_t: TempIdx(0),
            cc_src_t: TempIdx(0),
            cc_src2_t: TempIdx(0),
            cc_dst_t: TempIdx(0),
            icc_t: TempIdx(0),
            xcc_t: TempIdx(0),
            fsr_t: TempIdx(0),
            pc,
            npc: Npc::Static(npc),
            cc_op: None,
            supervisor,
            fpu_enabled,
            mem_idx: if supervisor {
                cpu::MMU_KERNEL_IDX
            } else {
                cpu::MMU_USER_IDX
            },
            nwindows,
            opcode: 0,
            jmp_done: false,
            guest_base,
        }
    }

    /// Create a context for the CPU's current state.
    pub fn for_cpu(env: &SparcCpu, guest_base: *const u8) -> Self {
        Self::new(
            env.pc,
            env.npc,
            guest_base,
            env.psr_s != 0,
            env.psr_ef != 0,
            env.nwindows,
        )
    }

    /// Fetch the 32-bit big-endian instruction at the current PC.
    ///
    /// # Safety
    /// `guest_base + pc` must be a valid, readable 4-byte host
    /// address.
    unsafe fn fetch_insn32(&self) -> u32 {
        let ptr = self.guest_base.add(self.pc as usize) as *const [u8; 4];
        u32::from_be_bytes(ptr.read_unaligned())
    }

    // -- GPR access ----------------------------------------

    /// Read GPR `reg`; g0 yields a constant zero, window registers go
    /// through the current-window pointer.
    pub(crate) fn load_gpr(&self, ir: &mut Context, reg: u32) -> TempIdx {
        if reg == 0 {
            ir.new_const(Type::I64, 0)
        } else if reg < 8 {
            self.gregs[reg as usize]
        } else {
            let t = ir.new_temp(Type::I64);
            ir.gen_ld(Type::I64, t, self.regwptr, ((reg - 8) * 8) as i64);
            t
        }
    }

    /// Write `val` into GPR `reg`; writes to g0 are discarded.
    pub(crate) fn store_gpr(
        &self,
        ir: &mut Context,
        reg: u32,
        val: TempIdx,
    ) {
        if reg == 0 {
            return;
        }
        if reg < 8 {
            ir.gen_mov(Type::I64, self.gregs[reg as usize], val);
        } else {
            ir.gen_st(Type::I64, val, self.regwptr, ((reg - 8) * 8) as i64);
        }
    }

    // -- Helper calls --------------------------------------

    /// Emit an out-of-line helper call; returns the result temp.
    pub(crate) fn call_helper(
        &self,
        ir: &mut Context,
        func: usize,
        args: &[TempIdx],
    ) -> TempIdx {
        let dst = ir.new_temp(Type::I64);
        ir.gen_call(dst, func as u64, args);
        dst
    }

    /// Runtime alignment check emitted alongside a sized access.
    pub(crate) fn gen_check_align(
        &self,
        ir: &mut Context,
        addr: TempIdx,
        memop: MemOp,
    ) {
        let bytes = memop.size_bytes() as u64;
        if bytes == 1 {
            return;
        }
        let mask = ir.new_const(Type::I64, bytes - 1);
        self.call_helper(
            ir,
            trap::helper_check_align as usize,
            &[self.env, addr, mask],
        );
    }

    // -- Condition codes -----------------------------------

    /// Record a flag-producing operation for the lazy engine.
    pub(crate) fn gen_cc_record(
        &mut self,
        ir: &mut Context,
        op: CcOp,
        dst: TempIdx,
        src1: TempIdx,
        src2: TempIdx,
    ) {
        ir.gen_mov(Type::I64, self.cc_src_t, src1);
        ir.gen_mov(Type::I64, self.cc_src2_t, src2);
        ir.gen_mov(Type::I64, self.cc_dst_t, dst);
        let tag = ir.new_const(Type::I64, op as u64);
        ir.gen_mov(Type::I64, self.cc_op_t, tag);
        self.cc_op = Some(op);
    }

    /// Ensure the condition registers are materialized before code
    /// that reads them runs. Statically elided when the tag is known
    /// to be in the terminal state.
    pub(crate) fn materialize_cc(&mut self, ir: &mut Context) {
        if self.cc_op == Some(CcOp::Flags) {
            return;
        }
        self.call_helper(ir, cc::helper_compute_flags as usize, &[self.env]);
        self.cc_op = Some(CcOp::Flags);
    }

    /// Build the runtime test for an integer branch condition over
    /// `icc` or `xcc`. Always/never are the caller's business.
    pub(crate) fn gen_compare(
        &mut self,
        ir: &mut Context,
        cond: u32,
        xcc: bool,
    ) -> DisasCompare {
        use cc::CcFlags;

        debug_assert!(cond & 7 != 0, "always/never reach gen_compare");
        self.materialize_cc(ir);
        let f = if xcc { self.xcc_t } else { self.icc_t };
        let negate = cond & 8 != 0;

        let (a, b, base) = match cond & 7 {
            // e: Z
            1 => (
                f,
                ir.new_const(Type::I64, CcFlags::Z.bits() as u64),
                Cond::TstNe,
            ),
            // le: Z | (N ^ V)
            2 => {
                let c3 = ir.new_const(Type::I64, 3);
                let c2 = ir.new_const(Type::I64, 2);
                let c1 = ir.new_const(Type::I64, 1);
                let tn = ir.new_temp(Type::I64);
                ir.gen_shr(Type::I64, tn, f, c3);
                let tv = ir.new_temp(Type::I64);
                ir.gen_shr(Type::I64, tv, f, c1);
                let tx = ir.new_temp(Type::I64);
                ir.gen_xor(Type::I64, tx, tn, tv);
                let tz = ir.new_temp(Type::I64);
                ir.gen_shr(Type::I64, tz, f, c2);
                let to = ir.new_temp(Type::I64);
                ir.gen_or(Type::I64, to, tx, tz);
                (to, c1, Cond::TstNe)
            }
            // l: N ^ V
            3 => {
                let c3 = ir.new_const(Type::I64, 3);
                let c1 = ir.new_const(Type::I64, 1);
                let tn = ir.new_temp(Type::I64);
                ir.gen_shr(Type::I64, tn, f, c3);
                let tv = ir.new_temp(Type::I64);
                ir.gen_shr(Type::I64, tv, f, c1);
                let tx = ir.new_temp(Type::I64);
                ir.gen_xor(Type::I64, tx, tn, tv);
                (tx, c1, Cond::TstNe)
            }
            // leu: C | Z
            4 => (
                f,
                ir.new_const(
                    Type::I64,
                    (CcFlags::C | CcFlags::Z).bits() as u64,
                ),
                Cond::TstNe,
            ),
            // cs: C
            5 => (
                f,
                ir.new_const(Type::I64, CcFlags::C.bits() as u64),
                Cond::TstNe,
            ),
            // neg: N
            6 => (
                f,
                ir.new_const(Type::I64, CcFlags::N.bits() as u64),
                Cond::TstNe,
            ),
            // vs: V
            _ => (
                f,
                ir.new_const(Type::I64, CcFlags::V.bits() as u64),
                Cond::TstNe,
            ),
        };

        DisasCompare {
            a,
            b,
            cond: if negate { base.invert() } else { base },
        }
    }

    /// Relation sets selected by each FP branch condition, one bit per
    /// fcc value (bit0 = E, bit1 = L, bit2 = G, bit3 = U).
    const FCC_MASKS: [u32; 16] = [
        0b0000, // fbn
        0b1110, // fbne
        0b0110, // fblg
        0b1010, // fbul
        0b0010, // fbl
        0b1100, // fbug
        0b0100, // fbg
        0b1000, // fbu
        0b1111, // fba
        0b0001, // fbe
        0b1001, // fbue
        0b0101, // fbge
        0b1101, // fbuge
        0b0011, // fble
        0b1011, // fbule
        0b0111, // fbo
    ];

    /// Build the runtime test for an FP branch condition: shift a one
    /// to the current fcc relation and test it against the condition's
    /// relation set.
    pub(crate) fn gen_fcompare(
        &mut self,
        ir: &mut Context,
        cond: u32,
    ) -> DisasCompare {
        let fcc = ir.new_temp(Type::I64);
        ir.gen_extract(
            Type::I64,
            fcc,
            self.fsr_t,
            fpu::FSR_FCC_SHIFT as u32,
            2,
        );
        let one = ir.new_const(Type::I64, 1);
        let sel = ir.new_temp(Type::I64);
        ir.gen_shl(Type::I64, sel, one, fcc);
        let mask = ir
            .new_const(Type::I64, Self::FCC_MASKS[cond as usize & 0xf] as u64);
        DisasCompare {
            a: sel,
            b: mask,
            cond: Cond::TstNe,
        }
    }

    // -- PC/NPC machinery ----------------------------------

    /// Collapse a two-alternatives NPC into the architectural NPC
    /// register via a conditional move. Must run before the next
    /// instruction is translated.
    pub(crate) fn flush_pending_npc(&mut self, ir: &mut Context) {
        if let Npc::Pending {
            cmp,
            taken,
            fallthru,
        } = self.npc
        {
            let vt = ir.new_const(Type::I64, taken);
            let vf = ir.new_const(Type::I64, fallthru);
            ir.gen_movcond(
                Type::I64, self.npc_t, cmp.a, cmp.b, vt, vf, cmp.cond,
            );
            self.npc = Npc::Dynamic;
        }
    }

    /// Default sequential advance; ends the block once the PC becomes
    /// runtime-only.
    fn advance_pc(&mut self, ir: &mut Context) {
        match self.npc {
            Npc::Static(n) => {
                self.pc = n;
                self.npc = Npc::Static(n + 4);
            }
            Npc::Dynamic => {
                ir.gen_mov(Type::I64, self.pc_t, self.npc_t);
                let four = ir.new_const(Type::I64, 4);
                let t = ir.new_temp(Type::I64);
                ir.gen_add(Type::I64, t, self.npc_t, four);
                ir.gen_mov(Type::I64, self.npc_t, t);
                ir.gen_exit_tb(0);
                self.base.is_jmp = DisasJumpType::NoReturn;
            }
            Npc::Pending { .. } => {
                unreachable!("pending NPC survived into advance")
            }
        }
        self.base.pc_next = self.pc;
    }

    /// Write the architectural PC/NPC for a trap raised at the current
    /// instruction.
    pub(crate) fn save_state(&mut self, ir: &mut Context) {
        self.flush_pending_npc(ir);
        let pc = ir.new_const(Type::I64, self.pc);
        ir.gen_mov(Type::I64, self.pc_t, pc);
        if let Npc::Static(n) = self.npc {
            let npc = ir.new_const(Type::I64, n);
            ir.gen_mov(Type::I64, self.npc_t, npc);
        }
    }

    /// Emit the trap-raising IR for a decode fault and close the
    /// block. Nothing of the faulting instruction is left dangling:
    /// control leaves through the exception path unconditionally.
    pub(crate) fn gen_trap(&mut self, ir: &mut Context, tt: u32) {
        self.save_state(ir);
        let tt_c = ir.new_const(Type::I64, tt as u64);
        self.call_helper(
            ir,
            helper_raise_exception as usize,
            &[self.env, tt_c],
        );
        ir.gen_exit_tb(0);
        self.base.is_jmp = DisasJumpType::NoReturn;
    }

    /// Emit a static block exit, chained when the target shares the
    /// block's page (codegen hint only).
    pub(crate) fn gen_exit_pair(
        &mut self,
        ir: &mut Context,
        slot: u32,
        pc: u64,
        npc: u64,
    ) {
        let chain =
            (pc ^ self.base.pc_first) >> TARGET_PAGE_BITS == 0;
        if chain {
            ir.gen_goto_tb(slot);
        }
        let pc_c = ir.new_const(Type::I64, pc);
        ir.gen_mov(Type::I64, self.pc_t, pc_c);
        let npc_c = ir.new_const(Type::I64, npc);
        ir.gen_mov(Type::I64, self.npc_t, npc_c);
        ir.gen_exit_tb(if chain { slot as u64 } else { 0 });
    }
}

// ---------------------------------------------------------------
// Decode tables
// ---------------------------------------------------------------

pub(crate) type TransFn =
    fn(&mut SparcDisasContext, &mut Context, Insn) -> Result<(), Trap>;

/// Per-class handler tables, indexed by op3. Built once at startup.
pub struct DecodeTables {
    pub(crate) arith: [Option<TransFn>; 64],
    pub(crate) mem: [Option<TransFn>; 64],
}

impl DecodeTables {
    fn new() -> Self {
        use trans::*;
        let mut arith: [Option<TransFn>; 64] = [None; 64];
        let mut mem: [Option<TransFn>; 64] = [None; 64];

        // Arithmetic / logical
        arith[0x00] = Some(trans_add as TransFn);
        arith[0x01] = Some(trans_and);
        arith[0x02] = Some(trans_or);
        arith[0x03] = Some(trans_xor);
        arith[0x04] = Some(trans_sub);
        arith[0x05] = Some(trans_andn);
        arith[0x06] = Some(trans_orn);
        arith[0x07] = Some(trans_xnor);
        arith[0x08] = Some(trans_addx);
        arith[0x0a] = Some(trans_umul);
        arith[0x0b] = Some(trans_smul);
        arith[0x0c] = Some(trans_subx);
        arith[0x0e] = Some(trans_udiv);
        arith[0x0f] = Some(trans_sdiv);
        arith[0x10] = Some(trans_addcc);
        arith[0x11] = Some(trans_andcc);
        arith[0x12] = Some(trans_orcc);
        arith[0x13] = Some(trans_xorcc);
        arith[0x14] = Some(trans_subcc);
        arith[0x15] = Some(trans_andncc);
        arith[0x16] = Some(trans_orncc);
        arith[0x17] = Some(trans_xnorcc);
        arith[0x18] = Some(trans_addxcc);
        arith[0x1a] = Some(trans_umulcc);
        arith[0x1b] = Some(trans_smulcc);
        arith[0x1c] = Some(trans_subxcc);
        arith[0x1e] = Some(trans_udivcc);
        arith[0x1f] = Some(trans_sdivcc);

        // Tagged arithmetic and multiply step
        arith[0x20] = Some(trans_taddcc);
        arith[0x21] = Some(trans_tsubcc);
        arith[0x22] = Some(trans_taddcctv);
        arith[0x23] = Some(trans_tsubcctv);
        arith[0x24] = Some(trans_mulscc);

        // Shifts
        arith[0x25] = Some(trans_sll);
        arith[0x26] = Some(trans_srl);
        arith[0x27] = Some(trans_sra);

        // State register reads/writes
        arith[0x28] = Some(trans_rdasr);
        arith[0x29] = Some(trans_rdpsr);
        arith[0x2a] = Some(trans_rdwim);
        arith[0x2b] = Some(trans_rdtbr);
        arith[0x30] = Some(trans_wrasr);
        arith[0x31] = Some(trans_wrpsr);
        arith[0x32] = Some(trans_wrwim);
        arith[0x33] = Some(trans_wrtbr);

        // FPU
        arith[0x34] = Some(trans_fpop1);
        arith[0x35] = Some(trans_fpop2);

        // Control transfer / windows
        arith[0x38] = Some(trans_jmpl);
        arith[0x39] = Some(trans_rett);
        arith[0x3a] = Some(trans_ticc);
        arith[0x3b] = Some(trans_iflush);
        arith[0x3c] = Some(trans_save);
        arith[0x3d] = Some(trans_restore);

        // Memory, implicit address space
        mem[0x00] = Some(trans_ld as TransFn);
        mem[0x01] = Some(trans_ldub);
        mem[0x02] = Some(trans_lduh);
        mem[0x03] = Some(trans_ldd);
        mem[0x04] = Some(trans_st);
        mem[0x05] = Some(trans_stb);
        mem[0x06] = Some(trans_sth);
        mem[0x07] = Some(trans_std);
        mem[0x08] = Some(trans_ldsw);
        mem[0x09] = Some(trans_ldsb);
        mem[0x0a] = Some(trans_ldsh);
        mem[0x0b] = Some(trans_ldx);
        mem[0x0d] = Some(trans_ldstub);
        mem[0x0e] = Some(trans_stx);
        mem[0x0f] = Some(trans_swap);

        // Memory, explicit address-space identifier
        mem[0x10] = Some(trans_lda);
        mem[0x11] = Some(trans_lduba);
        mem[0x12] = Some(trans_lduha);
        mem[0x13] = Some(trans_ldda);
        mem[0x14] = Some(trans_sta);
        mem[0x15] = Some(trans_stba);
        mem[0x16] = Some(trans_stha);
        mem[0x17] = Some(trans_stda);
        mem[0x18] = Some(trans_ldswa);
        mem[0x19] = Some(trans_ldsba);
        mem[0x1a] = Some(trans_ldsha);
        mem[0x1b] = Some(trans_ldxa);
        mem[0x1d] = Some(trans_ldstuba);
        mem[0x1e] = Some(trans_stxa);
        mem[0x1f] = Some(trans_swapa);

        // Memory, FP register file
        mem[0x20] = Some(trans_ldf);
        mem[0x21] = Some(trans_ldfsr);
        mem[0x23] = Some(trans_lddf);
        mem[0x24] = Some(trans_stf);
        mem[0x25] = Some(trans_stfsr);
        mem[0x27] = Some(trans_stdf);

        Self { arith, mem }
    }

    pub fn get() -> &'static DecodeTables {
        static TABLES: OnceLock<DecodeTables> = OnceLock::new();
        TABLES.get_or_init(DecodeTables::new)
    }
}

fn dispatch(
    dc: &mut SparcDisasContext,
    ir: &mut Context,
    i: Insn,
) -> Result<(), Trap> {
    let tables = DecodeTables::get();
    match i.op() {
        0 => match i.op2() {
            0 => Err(Trap::IllegalInsn), // unimp
            1 => trans::trans_bpcc(dc, ir, i),
            2 => trans::trans_bicc(dc, ir, i),
            4 => trans::trans_sethi(dc, ir, i),
            6 => trans::trans_fbfcc(dc, ir, i),
            _ => Err(Trap::IllegalInsn),
        },
        1 => trans::trans_call(dc, ir, i),
        2 => match tables.arith[i.op3() as usize] {
            Some(f) => f(dc, ir, i),
            None => Err(Trap::IllegalInsn),
        },
        _ => match tables.mem[i.op3() as usize] {
            Some(f) => f(dc, ir, i),
            None => Err(Trap::IllegalInsn),
        },
    }
}

// ---------------------------------------------------------------
// TranslatorOps implementation
// ---------------------------------------------------------------

/// Marker type for the SPARC translator.
pub struct SparcTranslator;

impl TranslatorOps for SparcTranslator {
    type DisasContext = SparcDisasContext;

    fn init_disas_context(ctx: &mut SparcDisasContext, ir: &mut Context) {
        // The env pointer lives in a backend-reserved host register.
        ctx.env = ir.new_fixed(Type::I64, 5, "env");

        static GREG_NAMES: [&str; 8] =
            ["g0", "g1", "g2", "g3", "g4", "g5", "g6", "g7"];
        for i in 1..8 {
            ctx.gregs[i] = ir.new_global(
                Type::I64,
                ctx.env,
                greg_offset(i),
                GREG_NAMES[i],
            );
        }
        ctx.regwptr =
            ir.new_global(Type::I64, ctx.env, REGWPTR_OFFSET, "regwptr");
        ctx.pc_t = ir.new_global(Type::I64, ctx.env, PC_OFFSET, "pc");
        ctx.npc_t = ir.new_global(Type::I64, ctx.env, NPC_OFFSET, "npc");
        ctx.y_t = ir.new_global(Type::I64, ctx.env, Y_OFFSET, "y");
        ctx.asi_t = ir.new_global(Type::I64, ctx.env, ASI_OFFSET, "asi");
        ctx.cc_op_t =
            ir.new_global(Type::I64, ctx.env, CC_OP_OFFSET, "cc_op");
        ctx.cc_src_t =
            ir.new_global(Type::I64, ctx.env, CC_SRC_OFFSET, "cc_src");
        ctx.cc_src2_t =
            ir.new_global(Type::I64, ctx.env, CC_SRC2_OFFSET, "cc_src2");
        ctx.cc_dst_t =
            ir.new_global(Type::I64, ctx.env, CC_DST_OFFSET, "cc_dst");
        ctx.icc_t = ir.new_global(Type::I64, ctx.env, ICC_OFFSET, "icc");
        ctx.xcc_t = ir.new_global(Type::I64, ctx.env, XCC_OFFSET, "xcc");
        ctx.fsr_t = ir.new_global(Type::I64, ctx.env, FSR_OFFSET, "fsr");
    }

    fn tb_start(_ctx: &mut SparcDisasContext, _ir: &mut Context) {}

    fn insn_start(ctx: &mut SparcDisasContext, ir: &mut Context) {
        ir.gen_insn_start(ctx.pc);
        ctx.base.num_insns += 1;
    }

    fn translate_insn(ctx: &mut SparcDisasContext, ir: &mut Context) {
        // A two-alternatives NPC never survives into the next
        // instruction.
        ctx.flush_pending_npc(ir);

        let word = unsafe { ctx.fetch_insn32() };
        ctx.opcode = word;
        ctx.jmp_done = false;

        match dispatch(ctx, ir, Insn(word)) {
            Ok(()) => {
                if !ctx.jmp_done {
                    ctx.advance_pc(ir);
                } else {
                    ctx.base.pc_next = ctx.pc;
                }
                // Bound blocks at page boundaries.
                if ctx.base.is_jmp == DisasJumpType::Next
                    && (ctx.pc ^ ctx.base.pc_first) >> TARGET_PAGE_BITS != 0
                {
                    ctx.base.is_jmp = DisasJumpType::TooMany;
                }
            }
            Err(trap) => {
                debug!(pc = ctx.pc, word, %trap, "decode fault");
                ctx.gen_trap(ir, trap.tt());
            }
        }
    }

    fn tb_stop(ctx: &mut SparcDisasContext, ir: &mut Context) {
        match ctx.base.is_jmp {
            DisasJumpType::NoReturn => {}
            DisasJumpType::Next | DisasJumpType::TooMany => {
                ctx.flush_pending_npc(ir);
                match ctx.npc {
                    Npc::Static(n) => {
                        let pc = ctx.pc;
                        ctx.gen_exit_pair(ir, 0, pc, n);
                    }
                    Npc::Dynamic => {
                        let pc = ir.new_const(Type::I64, ctx.pc);
                        ir.gen_mov(Type::I64, ctx.pc_t, pc);
                        ir.gen_exit_tb(0);
                    }
                    Npc::Pending { .. } => unreachable!("pending NPC flushed"),
                }
            }
        }
    }

    fn base(ctx: &SparcDisasContext) -> &DisasContextBase {
        &ctx.base
    }

    fn base_mut(ctx: &mut SparcDisasContext) -> &mut DisasContextBase {
        &mut ctx.base
    }
}

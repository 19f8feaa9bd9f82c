/// IR opcodes — unified (type-polymorphic for integer ops).
///
/// Integer ops (marked with `INT`) work on both I32 and I64; the actual
/// type is carried in `Op::op_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // -- Data movement --
    Mov = 0,
    SetCond,
    MovCond,

    // -- Arithmetic --
    Add,
    Sub,
    Mul,
    Neg,

    // -- Logic --
    And,
    Or,
    Xor,
    Not,
    AndC, // a & ~b
    OrC,  // a | ~b
    Eqv,  // ~(a ^ b)

    // -- Shift --
    Shl,
    Shr,
    Sar,

    // -- Bit field --
    Extract,  // unsigned bit-field extract
    SExtract, // signed bit-field extract
    Deposit,  // bit-field deposit

    // -- Type conversion --
    ExtI32I64,   // sign-extend i32 -> i64
    ExtUI32I64,  // zero-extend i32 -> i64
    ExtrlI64I32, // truncate i64 -> i32 (low)
    ExtrhI64I32, // extract i64 -> i32 (high)

    // -- Host memory load/store (direct, for CPU state fields) --
    Ld32U,
    Ld32S,
    Ld, // native-width load
    St32,
    St, // native-width store

    // -- Guest memory access --
    QemuLd,
    QemuSt,
    QemuLdAsi, // load through an explicit address-space identifier
    QemuStAsi, // store through an explicit address-space identifier

    // -- Control flow --
    Br,       // unconditional branch to label
    BrCond,   // conditional branch
    SetLabel, // define label position
    GotoTb,   // direct jump to another block (patchable)
    ExitTb,   // return from block to execution loop
    Mb,       // memory barrier

    // -- Call --
    Call,

    // -- Misc --
    InsnStart, // marks guest instruction boundary

    // Sentinel — must be last
    Count,
}

/// Flags describing properties of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpFlags(u16);

impl OpFlags {
    pub const NONE: OpFlags = OpFlags(0);
    /// Exits the translation block.
    pub const BB_EXIT: OpFlags = OpFlags(0x01);
    /// Ends a basic block (next op starts a new BB).
    pub const BB_END: OpFlags = OpFlags(0x02);
    /// Clobbers caller-saved registers (like a function call).
    pub const CALL_CLOBBER: OpFlags = OpFlags(0x04);
    /// Has side effects — cannot be eliminated by DCE.
    pub const SIDE_EFFECTS: OpFlags = OpFlags(0x08);
    /// Operands may be I32 or I64 (type-polymorphic).
    pub const INT: OpFlags = OpFlags(0x10);
    /// Conditional branch (may or may not be taken).
    pub const COND_BRANCH: OpFlags = OpFlags(0x20);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: OpFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Static definition of an opcode — argument counts and flags.
#[derive(Debug, Clone, Copy)]
pub struct OpDef {
    pub name: &'static str,
    pub nb_oargs: u8,
    pub nb_iargs: u8,
    pub nb_cargs: u8,
    pub flags: OpFlags,
}

impl OpDef {
    pub const fn nb_args(&self) -> u8 {
        self.nb_oargs + self.nb_iargs + self.nb_cargs
    }
}

// Helper to combine flags in const context.
const fn f(a: OpFlags, b: OpFlags) -> OpFlags {
    OpFlags(a.0 | b.0)
}

const INT: OpFlags = OpFlags::INT;
const SE: OpFlags = OpFlags::SIDE_EFFECTS;
const CC: OpFlags = OpFlags::CALL_CLOBBER;
const BE: OpFlags = OpFlags::BB_END;
const BX: OpFlags = OpFlags::BB_EXIT;
const CB: OpFlags = OpFlags::COND_BRANCH;

const fn def(
    name: &'static str,
    nb_oargs: u8,
    nb_iargs: u8,
    nb_cargs: u8,
    flags: OpFlags,
) -> OpDef {
    OpDef {
        name,
        nb_oargs,
        nb_iargs,
        nb_cargs,
        flags,
    }
}

/// Opcode definitions, indexed by `Opcode as usize`.
///
/// Order must match the `Opcode` enum exactly.
pub static OPCODE_DEFS: [OpDef; Opcode::Count as usize] = [
    def("mov", 1, 1, 0, INT),
    def("setcond", 1, 2, 1, INT),
    def("movcond", 1, 4, 1, INT),
    def("add", 1, 2, 0, INT),
    def("sub", 1, 2, 0, INT),
    def("mul", 1, 2, 0, INT),
    def("neg", 1, 1, 0, INT),
    def("and", 1, 2, 0, INT),
    def("or", 1, 2, 0, INT),
    def("xor", 1, 2, 0, INT),
    def("not", 1, 1, 0, INT),
    def("andc", 1, 2, 0, INT),
    def("orc", 1, 2, 0, INT),
    def("eqv", 1, 2, 0, INT),
    def("shl", 1, 2, 0, INT),
    def("shr", 1, 2, 0, INT),
    def("sar", 1, 2, 0, INT),
    def("extract", 1, 1, 2, INT),
    def("sextract", 1, 1, 2, INT),
    def("deposit", 1, 2, 2, INT),
    def("ext_i32_i64", 1, 1, 0, OpFlags::NONE),
    def("extu_i32_i64", 1, 1, 0, OpFlags::NONE),
    def("extrl_i64_i32", 1, 1, 0, OpFlags::NONE),
    def("extrh_i64_i32", 1, 1, 0, OpFlags::NONE),
    def("ld32u", 1, 1, 1, INT),
    def("ld32s", 1, 1, 1, INT),
    def("ld", 1, 1, 1, INT),
    def("st32", 0, 2, 1, f(INT, SE)),
    def("st", 0, 2, 1, f(INT, SE)),
    def("qemu_ld", 1, 1, 2, f(INT, SE)),
    def("qemu_st", 0, 2, 2, f(INT, SE)),
    def("qemu_ld_asi", 1, 2, 1, f(INT, SE)),
    def("qemu_st_asi", 0, 3, 1, f(INT, SE)),
    def("br", 0, 0, 1, f(BE, SE)),
    def("brcond", 0, 2, 2, f(INT, f(BE, f(SE, CB)))),
    def("set_label", 0, 0, 1, f(BE, SE)),
    def("goto_tb", 0, 0, 1, f(BX, SE)),
    def("exit_tb", 0, 0, 1, f(BX, f(BE, SE))),
    def("mb", 0, 0, 1, SE),
    def("call", 1, 6, 2, f(CC, SE)),
    def("insn_start", 0, 0, 2, SE),
];

impl Opcode {
    pub fn def(self) -> &'static OpDef {
        &OPCODE_DEFS[self as usize]
    }

    /// Whether this op takes its operand width from `Op::op_type`.
    pub fn is_int_polymorphic(self) -> bool {
        self.def().flags.contains(OpFlags::INT)
    }

    /// Whether this op terminates the current basic block.
    pub fn is_bb_end(self) -> bool {
        self.def().flags.contains(OpFlags::BB_END)
    }
}

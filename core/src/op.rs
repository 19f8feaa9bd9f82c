use crate::opcode::Opcode;
use crate::temp::TempIdx;
use crate::types::Type;

/// Maximum number of arguments per IR operation.
pub const MAX_OP_ARGS: usize = 10;

/// Index into the Context's op list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpIdx(pub u32);

/// A single IR operation.
///
/// Each op has an opcode, a type (for polymorphic ops) and up to
/// MAX_OP_ARGS arguments. Arguments are temp indices for value operands
/// and raw encoded immediates (condition codes, label ids, offsets,
/// helper addresses) for constant operands; the split between the two
/// is given by the opcode's `OpDef`.
#[derive(Debug, Clone)]
pub struct Op {
    pub idx: OpIdx,
    pub opc: Opcode,
    /// Operand type for type-polymorphic ops (I32 or I64).
    pub op_type: Type,
    /// Arguments: temp indices, label ids, or encoded immediates.
    pub args: [TempIdx; MAX_OP_ARGS],
    pub nargs: u8,
}

impl Op {
    pub fn new(idx: OpIdx, opc: Opcode, op_type: Type) -> Self {
        Self {
            idx,
            opc,
            op_type,
            args: [TempIdx(0); MAX_OP_ARGS],
            nargs: 0,
        }
    }

    pub fn with_args(
        idx: OpIdx,
        opc: Opcode,
        op_type: Type,
        args: &[TempIdx],
    ) -> Self {
        debug_assert!(args.len() <= MAX_OP_ARGS);
        debug_assert_eq!(args.len(), opc.def().nb_args() as usize);
        let mut op = Self::new(idx, opc, op_type);
        op.args[..args.len()].copy_from_slice(args);
        op.nargs = args.len() as u8;
        op
    }

    pub fn args(&self) -> &[TempIdx] {
        &self.args[..self.nargs as usize]
    }

    /// Output arguments (written temps).
    pub fn oargs(&self) -> &[TempIdx] {
        let n = self.opc.def().nb_oargs as usize;
        &self.args[..n]
    }

    /// Input arguments (read temps).
    pub fn iargs(&self) -> &[TempIdx] {
        let d = self.opc.def();
        let o = d.nb_oargs as usize;
        &self.args[o..o + d.nb_iargs as usize]
    }

    /// Constant arguments (encoded immediates).
    pub fn cargs(&self) -> &[TempIdx] {
        let d = self.opc.def();
        let o = (d.nb_oargs + d.nb_iargs) as usize;
        &self.args[o..o + d.nb_cargs as usize]
    }
}

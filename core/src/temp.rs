use crate::types::Type;

/// Lifetime/scope of an IR temporary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TempKind {
    /// Live within the current translation block only.
    Ebb,
    /// Persists across blocks — backed by a CPU state field.
    Global,
    /// Pinned to a specific host register by the backend ABI.
    Fixed,
    /// Compile-time constant.
    Const,
}

/// Index into the Context's temp pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempIdx(pub u32);

/// An IR temporary variable.
///
/// Globals carry the env-relative location of their backing CPU state
/// field; constants carry their value; block-local temps carry neither.
#[derive(Debug, Clone)]
pub struct Temp {
    pub idx: TempIdx,
    pub ty: Type,
    pub kind: TempKind,

    /// For `Const` temps, the immediate value.
    pub val: u64,
    /// For `Fixed` temps, the host register number.
    pub reg: Option<u8>,
    /// For `Global` temps, the base temp (env pointer) index.
    pub mem_base: Option<TempIdx>,
    /// For `Global` temps, the byte offset from mem_base.
    pub mem_offset: i64,

    /// Debug name (e.g. "pc", "npc", "g1").
    pub name: Option<&'static str>,
}

impl Temp {
    pub fn new_ebb(idx: TempIdx, ty: Type) -> Self {
        Self {
            idx,
            ty,
            kind: TempKind::Ebb,
            val: 0,
            reg: None,
            mem_base: None,
            mem_offset: 0,
            name: None,
        }
    }

    pub fn new_const(idx: TempIdx, ty: Type, val: u64) -> Self {
        Self {
            idx,
            ty,
            kind: TempKind::Const,
            val,
            reg: None,
            mem_base: None,
            mem_offset: 0,
            name: None,
        }
    }

    pub fn new_global(
        idx: TempIdx,
        ty: Type,
        base: TempIdx,
        offset: i64,
        name: &'static str,
    ) -> Self {
        Self {
            idx,
            ty,
            kind: TempKind::Global,
            val: 0,
            reg: None,
            mem_base: Some(base),
            mem_offset: offset,
            name: Some(name),
        }
    }

    pub fn new_fixed(
        idx: TempIdx,
        ty: Type,
        reg: u8,
        name: &'static str,
    ) -> Self {
        Self {
            idx,
            ty,
            kind: TempKind::Fixed,
            val: 0,
            reg: Some(reg),
            mem_base: None,
            mem_offset: 0,
            name: Some(name),
        }
    }

    pub fn is_const(&self) -> bool {
        self.kind == TempKind::Const
    }

    pub fn is_global(&self) -> bool {
        self.kind == TempKind::Global
    }
}

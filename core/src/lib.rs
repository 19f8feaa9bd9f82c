pub mod context;
pub mod dump;
pub mod ir_builder;
pub mod label;
pub mod op;
pub mod opcode;
pub mod temp;
pub mod types;

pub use context::Context;
pub use label::Label;
pub use op::{Op, OpIdx, MAX_OP_ARGS};
pub use opcode::{OpDef, OpFlags, Opcode, OPCODE_DEFS};
pub use temp::{Temp, TempIdx, TempKind};
pub use types::{Cond, MemOp, Type};

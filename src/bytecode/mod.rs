//! Instruction model for the miniature stack VM.
//!
//! Sub-modules:
//! - [`opcode`] — the operand-carrying [`Opcode`] enum and binary operators.
//! - [`value`]  — runtime [`Value`]s usable as constants and operands.
//! - [`unit`]   — [`CodeUnit`], the packed executable form of a function.
//! - [`seq`]    — [`InstrSeq`], the symbolic instruction sequence a unit
//!   decodes into and re-encodes from.

pub mod opcode;
pub mod seq;
pub mod unit;
pub mod value;

// Top-level re-exports — public API is unchanged.
pub use opcode::{BinOp, Instr, Opcode};
pub use seq::{DisasmRow, InstrSeq};
pub use unit::{CodeUnit, DecodeError, EncodeError};
pub use value::{HookFn, NativeFn, OpFault, Value};

use thiserror::Error;

use crate::bytecode::{DecodeError, EncodeError};
use crate::vm::RuntimeError;

/// Top-level error type for the debugger library.
///
/// Each sub-system keeps its own focused error enum; this type is the union
/// surfaced by the public operations (`inject`, `Vm::call_function`, ...).
#[derive(Debug, Error)]
pub enum DebuggerError {
    /// The injection target line matched no instruction in the sequence.
    #[error("line {line} not found in instruction sequence")]
    LineNotFound { line: u32 },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, DebuggerError>;

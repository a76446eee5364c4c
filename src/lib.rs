//! minidbg — bytecode injection and trace-driven debugging for a miniature
//! stack VM.
//!
//! Two independent instrumentation mechanisms over the same instruction
//! model:
//!
//! - [`injector`] — statically splice a call to an observer hook into a
//!   compiled function, immediately before a chosen source line.
//! - [`tracer`]   — intercept call/line/return events through a process-wide
//!   trace callback that can inspect and mutate the live call stack and
//!   drive an interactive prompt.
//!
//! Sub-modules:
//! - [`bytecode`] — instruction model: opcodes, values, packed code units,
//!   decode/encode.
//! - [`injector`] — the `inject` splice operation.
//! - [`vm`]       — frames, call stack, and the straight-line interpreter
//!   that delivers trace events and invokes hooks.
//! - [`tracer`]   — trace-slot lifecycle and the interactive callback.
//! - [`repl`]     — stack rendering, console abstraction, command evaluator.
//! - [`samples`]  — hand-assembled demo code units shared by the CLI and
//!   the tests.

pub mod bytecode;
pub mod cli;
pub mod error;
pub mod injector;
pub mod repl;
pub mod samples;
pub mod tracer;
pub mod vm;

// Top-level re-exports.
pub use error::{DebuggerError, Result};

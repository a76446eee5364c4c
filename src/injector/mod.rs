//! Static injection: splice a hook call into a compiled unit at a source
//! line.
//!
//! The transformation is explicit and versioned — `inject` returns a new
//! [`CodeUnit`] and never mutates the input; swapping the patched unit in
//! (atomically, before any further invocation) is the caller's job.

use tracing::info;

use crate::bytecode::{CodeUnit, HookFn, Instr, InstrSeq, Opcode, Value};
use crate::{DebuggerError, Result};

/// Length of the instrumentation block, in instructions.
pub const BLOCK_LEN: usize = 3;

/// The fixed instrumentation template: load the hook as a constant, invoke
/// it with zero arguments, discard its result.
///
/// Every instruction carries the target line's tag so the patched unit's
/// line metadata stays monotonic.
pub fn instrumentation_block(hook: HookFn, line: u32) -> [Instr; BLOCK_LEN] {
    [
        Instr::new(Opcode::LoadConst(Value::Hook(hook)), line),
        Instr::new(Opcode::CallFunction(0), line),
        Instr::new(Opcode::Pop, line),
    ]
}

/// Rewrite `unit` so that `hook()` runs immediately before the first
/// instruction tagged with `line`, its result discarded.
///
/// The hook fires on every execution reaching that point. When several
/// instructions share the line tag the first one wins. Fails with
/// [`DebuggerError::LineNotFound`] when no instruction matches, leaving the
/// input untouched.
///
/// Not idempotent: injecting twice at the same line stacks two blocks and
/// the hook fires twice per pass.
#[tracing::instrument(skip(unit, hook), fields(function = unit.name()))]
pub fn inject(unit: &CodeUnit, hook: HookFn, line: u32) -> Result<CodeUnit> {
    let mut seq = InstrSeq::from_unit(unit)?;
    let index = seq
        .first_at_line(line)
        .ok_or(DebuggerError::LineNotFound { line })?;

    info!(index, "splicing instrumentation block");
    seq.insert_before(index, instrumentation_block(hook, line));
    Ok(seq.to_unit()?)
}

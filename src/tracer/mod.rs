//! Dynamic tracing: the process-wide trace slot and the interactive
//! callback.
//!
//! Exactly one callback is active at a time; installing a new one replaces
//! the old, and it stays active until uninstalled or the process exits. The
//! slot is thread-local — the registration primitive this models is
//! per-thread, and the whole design is single-threaded (a concurrent VM
//! would never observe another thread's callback).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::info;

use crate::repl::{self, Console};
use crate::vm::CallStack;

/// An execution event delivered to the trace callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// A new frame was entered.
    Call,
    /// An armed frame reached a new source line.
    Line,
    /// An armed frame is about to return.
    Return,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceEvent::Call => "call",
            TraceEvent::Line => "line",
            TraceEvent::Return => "return",
        };
        write!(f, "{}", s)
    }
}

/// The callback's continuation decision.
///
/// `Continue` after a call event arms the frame for line events; after a
/// line event it keeps the frame armed. `Detach` stops fine-grained tracing
/// of that frame — new frames still get call events while the slot is
/// occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDecision {
    Continue,
    Detach,
}

/// The handler invoked by the VM on instrumented events.
///
/// Errors from operator commands must be contained by the handler (the
/// interactive loop does this); a panic escaping `on_event` aborts the host
/// program's execution. That asymmetry is deliberate: instrumentation bugs
/// should be loud, operator mistakes should not crash the session.
pub trait TraceCallback {
    fn on_event(&self, stack: &mut CallStack, event: TraceEvent) -> TraceDecision;
}

thread_local! {
    static SLOT: RefCell<Option<Rc<dyn TraceCallback>>> = RefCell::new(None);
}

/// Install a callback, replacing any previous one.
pub fn install(callback: Rc<dyn TraceCallback>) {
    info!("installing trace callback");
    SLOT.with(|slot| *slot.borrow_mut() = Some(callback));
}

/// Clear the slot. Returns whether a callback was installed.
pub fn uninstall() -> bool {
    let was = SLOT.with(|slot| slot.borrow_mut().take()).is_some();
    if was {
        info!("uninstalled trace callback");
    }
    was
}

pub fn is_installed() -> bool {
    SLOT.with(|slot| slot.borrow().is_some())
}

/// Clone the active callback out of the slot, leaving it installed.
///
/// The clone lets a running callback reinstall or uninstall without holding
/// a borrow of the slot.
pub(crate) fn active() -> Option<Rc<dyn TraceCallback>> {
    SLOT.with(|slot| slot.borrow().clone())
}

/// The interactive debugger callback: on every event it announces the
/// event, renders the call stack, and hands the operator a prompt bound to
/// the live context. Always continues at full granularity, so every line of
/// every traced frame stops at the prompt until the operator enters an
/// empty line.
pub struct Mdb {
    console: RefCell<Box<dyn Console>>,
}

impl Mdb {
    pub fn new(console: Box<dyn Console>) -> Self {
        Self {
            console: RefCell::new(console),
        }
    }
}

impl TraceCallback for Mdb {
    fn on_event(&self, stack: &mut CallStack, event: TraceEvent) -> TraceDecision {
        let mut console = self.console.borrow_mut();
        let console = console.as_mut();
        console.write_line(&format!("[mdb] {} event. Current call stack:", event));
        repl::render_stack(stack, console);
        repl::run(stack, console);
        TraceDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;
    impl TraceCallback for Nop {
        fn on_event(&self, _: &mut CallStack, _: TraceEvent) -> TraceDecision {
            TraceDecision::Continue
        }
    }

    #[test]
    fn slot_lifecycle() {
        assert!(!is_installed());
        assert!(!uninstall());

        install(Rc::new(Nop));
        assert!(is_installed());
        assert!(active().is_some());

        // Installing again replaces, it does not stack.
        install(Rc::new(Nop));
        assert!(uninstall());
        assert!(!is_installed());
        assert!(active().is_none());
    }
}

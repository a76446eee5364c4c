//! The execution engine: a single-threaded, straight-line stack VM.
//!
//! The VM's instrumentation surface is the interesting part — it delivers
//! call/line/return events to the installed trace callback (see
//! [`crate::tracer`]) and invokes [`Value::Hook`] constants spliced in by
//! the injector with a read view of the live call stack.
//!
//! Sub-modules:
//! - [`frame`] — [`Frame`] and [`CallStack`].

pub mod frame;

pub use frame::{CallStack, Frame};

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::bytecode::{self, CodeUnit, DecodeError, InstrSeq, OpFault, Opcode, Value};
use crate::tracer::{self, TraceDecision, TraceEvent};

/// Shared, capturable destination for `print` output.
pub type OutputSink = Rc<RefCell<dyn Write>>;

/// A fault raised while executing a code unit.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("operand stack underflow in {function}")]
    StackUnderflow { function: String },

    #[error("name '{name}' is not defined")]
    UnknownName { name: String },

    #[error("{type_name} value is not callable")]
    NotCallable { type_name: &'static str },

    #[error("{function}() takes {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{function} fell off the end of its code without returning")]
    NoReturn { function: String },

    #[error(transparent)]
    Op(#[from] OpFault),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("output error: {0}")]
    Io(#[from] io::Error),
}

/// The miniature VM: a call stack, a global namespace, and an output sink.
pub struct Vm {
    stack: CallStack,
    out: OutputSink,
}

impl Vm {
    /// A VM printing to stdout, with the `print` builtin pre-bound.
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// A VM writing `print` output to the given sink (tests capture it).
    pub fn with_output(out: OutputSink) -> Self {
        let mut stack = CallStack::new();
        let sink = out.clone();
        let print: bytecode::NativeFn = Rc::new(move |args: &[Value]| {
            let rendered = args
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(sink.borrow_mut(), "{}", rendered)?;
            Ok(Value::Unit)
        });
        stack
            .globals_mut()
            .insert("print".to_string(), Value::Native { name: "print", f: print });
        Self { stack, out }
    }

    /// Bind a global name (demo programs register their functions here).
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.stack.globals_mut().insert(name.to_string(), value);
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn output(&self) -> OutputSink {
        self.out.clone()
    }

    /// Call a code unit with the given arguments and run it to completion.
    ///
    /// Delivers a call event to the installed trace callback on entry, line
    /// events while the frame is armed, and a return event when the frame
    /// exits.
    pub fn call_function(
        &mut self,
        unit: &Rc<CodeUnit>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if args.len() != unit.params().len() {
            return Err(RuntimeError::Arity {
                function: unit.name().to_string(),
                expected: unit.params().len(),
                got: args.len(),
            });
        }
        let seq = InstrSeq::from_unit(unit)?;
        debug!(function = unit.name(), instrs = seq.len(), "entering frame");

        let mut frame = Frame::new(unit.clone(), seq.instrs().to_vec());
        for (param, arg) in unit.params().iter().zip(args) {
            frame.locals_mut().insert(param.clone(), arg);
        }
        self.stack.push(frame);

        // Entry-class event; `Continue` arms the new frame for line events.
        if let Some(TraceDecision::Continue) = self.fire(TraceEvent::Call) {
            if let Some(f) = self.stack.current_mut() {
                f.arm();
            }
        }

        let result = self.run_top_frame();
        self.stack.pop();
        result
    }

    fn run_top_frame(&mut self) -> Result<Value, RuntimeError> {
        loop {
            let (op, line) = {
                let frame = self.top();
                match frame.fetch() {
                    Some(instr) => (instr.op.clone(), instr.line),
                    None => {
                        return Err(RuntimeError::NoReturn {
                            function: frame.function_name().to_string(),
                        })
                    }
                }
            };

            let wants_line_event = {
                let frame = self.top();
                frame.is_armed() && frame.last_traced_line() != Some(line)
            };
            {
                let frame = self.top_mut();
                frame.set_current_line(line);
                if wants_line_event {
                    frame.set_last_traced_line(line);
                }
            }
            if wants_line_event {
                if let Some(TraceDecision::Detach) = self.fire(TraceEvent::Line) {
                    self.top_mut().disarm();
                }
            }

            self.top_mut().advance();

            match op {
                Opcode::LoadConst(v) => self.top_mut().push_operand(v),
                Opcode::LoadName(name) => {
                    let value = self
                        .stack
                        .lookup(&name)
                        .ok_or(RuntimeError::UnknownName { name })?;
                    self.top_mut().push_operand(value);
                }
                Opcode::StoreName(name) => {
                    let value = self.pop_operand()?;
                    self.top_mut().locals_mut().insert(name, value);
                }
                Opcode::BinaryOp(binop) => {
                    let rhs = self.pop_operand()?;
                    let lhs = self.pop_operand()?;
                    let result = bytecode::value::apply_binop(binop, &lhs, &rhs)?;
                    self.top_mut().push_operand(result);
                }
                Opcode::Pop => {
                    self.pop_operand()?;
                }
                Opcode::CallFunction(argc) => {
                    let mut args = Vec::with_capacity(argc as usize);
                    for _ in 0..argc {
                        args.push(self.pop_operand()?);
                    }
                    args.reverse();
                    let callee = self.pop_operand()?;
                    let result = self.call_value(callee, args)?;
                    self.top_mut().push_operand(result);
                }
                Opcode::Return => {
                    let value = self.pop_operand()?;
                    if self.top().is_armed() {
                        // Observed only; the frame is exiting either way.
                        self.fire(TraceEvent::Return);
                    }
                    debug!(function = self.top().function_name(), "leaving frame");
                    return Ok(value);
                }
            }
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(unit) => self.call_function(&unit, args),
            Value::Native { f, .. } => f(&args),
            Value::Hook(hook) => {
                if !args.is_empty() {
                    return Err(RuntimeError::Arity {
                        function: "<hook>".to_string(),
                        expected: 0,
                        got: args.len(),
                    });
                }
                hook(&self.stack);
                Ok(Value::Unit)
            }
            other => Err(RuntimeError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    fn fire(&mut self, event: TraceEvent) -> Option<TraceDecision> {
        // Clone the callback out of the slot so it may reinstall or
        // uninstall reentrantly while it runs.
        let callback = tracer::active()?;
        Some(callback.on_event(&mut self.stack, event))
    }

    fn pop_operand(&mut self) -> Result<Value, RuntimeError> {
        let frame = self.top_mut();
        match frame.pop_operand() {
            Some(value) => Ok(value),
            None => Err(RuntimeError::StackUnderflow {
                function: frame.function_name().to_string(),
            }),
        }
    }

    // A live frame is an internal invariant of the run loop; both helpers
    // are only reachable between push and pop of the same frame.
    fn top(&self) -> &Frame {
        self.stack.current().expect("active frame")
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.stack.current_mut().expect("active frame")
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

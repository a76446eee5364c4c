use std::collections::HashMap;
use std::rc::Rc;

use crate::bytecode::{CodeUnit, Instr, Value};

/// One in-progress call: the live binding environment and position of a
/// single function activation.
#[derive(Debug)]
pub struct Frame {
    unit: Rc<CodeUnit>,
    code: Vec<Instr>,
    pc: usize,
    operands: Vec<Value>,
    locals: HashMap<String, Value>,
    current_line: u32,
    // Line-event arming, set by the tracer's entry decision.
    armed: bool,
    last_traced_line: Option<u32>,
}

impl Frame {
    pub(crate) fn new(unit: Rc<CodeUnit>, code: Vec<Instr>) -> Self {
        // Entry-class events report the function's first line.
        let current_line = code.first().map(|i| i.line).unwrap_or(0);
        Self {
            unit,
            code,
            pc: 0,
            operands: Vec::new(),
            locals: HashMap::new(),
            current_line,
            armed: false,
            last_traced_line: None,
        }
    }

    pub fn function_name(&self) -> &str {
        self.unit.name()
    }

    pub fn unit(&self) -> &Rc<CodeUnit> {
        &self.unit
    }

    /// Source line of the instruction currently executing (0 before the
    /// first instruction is fetched).
    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    pub fn locals(&self) -> &HashMap<String, Value> {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.locals
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    pub(crate) fn fetch(&self) -> Option<&Instr> {
        self.code.get(self.pc)
    }

    pub(crate) fn advance(&mut self) {
        self.pc += 1;
    }

    pub(crate) fn set_current_line(&mut self, line: u32) {
        self.current_line = line;
    }

    pub(crate) fn last_traced_line(&self) -> Option<u32> {
        self.last_traced_line
    }

    pub(crate) fn set_last_traced_line(&mut self, line: u32) {
        self.last_traced_line = Some(line);
    }

    pub(crate) fn push_operand(&mut self, value: Value) {
        self.operands.push(value);
    }

    pub(crate) fn pop_operand(&mut self) -> Option<Value> {
        self.operands.pop()
    }
}

/// The chain of in-progress calls, outermost caller first, plus the shared
/// global namespace.
///
/// Owned by the execution engine; instrumentation code reads it, and the
/// interactive evaluator mutates bindings in place through it.
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
    globals: HashMap<String, Value>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// All live frames, outermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The innermost (currently executing) frame.
    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn globals(&self) -> &HashMap<String, Value> {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.globals
    }

    /// Resolve a name: current frame's locals first, then globals.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(frame) = self.current() {
            if let Some(v) = frame.locals().get(name) {
                return Some(v.clone());
            }
        }
        self.globals.get(name).cloned()
    }

    /// Bind a name, with the mutation visible immediately in the live
    /// context: an existing local is updated in place; otherwise an existing
    /// global is; otherwise a new local is created.
    pub fn assign(&mut self, name: &str, value: Value) {
        let local = self
            .current()
            .map(|f| f.locals().contains_key(name))
            .unwrap_or(false);
        if !local && self.globals.contains_key(name) {
            self.globals.insert(name.to_string(), value);
            return;
        }
        match self.current_mut() {
            Some(frame) => {
                frame.locals_mut().insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }
}

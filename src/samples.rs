//! Hand-assembled demo code units, shared by the CLI commands and the
//! integration tests.

use std::rc::Rc;

use crate::bytecode::{BinOp, CodeUnit, Instr, InstrSeq, Opcode, Value};
use crate::Result;

/// `foo(a)` — a 3-line body:
///
/// ```text
/// 1  print("hello world", a)
/// 2  b = a + a
/// 3  return b
/// ```
pub fn foo() -> Result<Rc<CodeUnit>> {
    let mut seq = InstrSeq::new("foo", &["a"]);
    seq.push(Instr::new(Opcode::LoadName("print".into()), 1))
        .push(Instr::new(Opcode::LoadConst(Value::Str("hello world".into())), 1))
        .push(Instr::new(Opcode::LoadName("a".into()), 1))
        .push(Instr::new(Opcode::CallFunction(2), 1))
        .push(Instr::new(Opcode::Pop, 1))
        .push(Instr::new(Opcode::LoadName("a".into()), 2))
        .push(Instr::new(Opcode::LoadName("a".into()), 2))
        .push(Instr::new(Opcode::BinaryOp(BinOp::Add), 2))
        .push(Instr::new(Opcode::StoreName("b".into()), 2))
        .push(Instr::new(Opcode::LoadName("b".into()), 3))
        .push(Instr::new(Opcode::Return, 3));
    Ok(seq.to_unit()?.into_rc())
}

/// The trace-demo driver, `main()` — expects `foo` bound as a global:
///
/// ```text
/// 1  a = 42
/// 2  foo(a << 1)
/// 3  return
/// ```
pub fn trace_driver() -> Result<Rc<CodeUnit>> {
    let mut seq = InstrSeq::new("main", &[]);
    seq.push(Instr::new(Opcode::LoadConst(Value::Int(42)), 1))
        .push(Instr::new(Opcode::StoreName("a".into()), 1))
        .push(Instr::new(Opcode::LoadName("foo".into()), 2))
        .push(Instr::new(Opcode::LoadName("a".into()), 2))
        .push(Instr::new(Opcode::LoadConst(Value::Int(1)), 2))
        .push(Instr::new(Opcode::BinaryOp(BinOp::Shl), 2))
        .push(Instr::new(Opcode::CallFunction(1), 2))
        .push(Instr::new(Opcode::Pop, 2))
        .push(Instr::new(Opcode::LoadConst(Value::Unit), 3))
        .push(Instr::new(Opcode::Return, 3));
    Ok(seq.to_unit()?.into_rc())
}

/// Look a sample up by name (the CLI's `disasm --sample`).
pub fn by_name(name: &str) -> Option<Result<Rc<CodeUnit>>> {
    match name {
        "foo" => Some(foo()),
        "main" => Some(trace_driver()),
        _ => None,
    }
}

/// Names accepted by [`by_name`].
pub const SAMPLE_NAMES: &[&str] = &["foo", "main"];

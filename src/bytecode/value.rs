use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use super::opcode::BinOp;
use crate::vm::CallStack;

/// A host-provided builtin invoked with already-evaluated arguments.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, crate::vm::RuntimeError>>;

/// A zero-VM-argument observer hook.
///
/// The hook receives read access to the live call stack of the program that
/// reached it; it has no visibility into the surrounding scope unless it
/// looks at that stack.
pub type HookFn = Rc<dyn Fn(&CallStack)>;

/// A runtime value, usable both on the operand stack and in a
/// [`CodeUnit`](super::CodeUnit) constant table.
#[derive(Clone)]
pub enum Value {
    Unit,
    Int(i64),
    Bool(bool),
    Str(String),
    Function(Rc<super::CodeUnit>),
    Native { name: &'static str, f: NativeFn },
    Hook(HookFn),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Function(_) => "function",
            Value::Native { .. } => "builtin",
            Value::Hook(_) => "hook",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Function(u) => write!(f, "<function {}>", u.name()),
            Value::Native { name, .. } => write!(f, "<builtin {}>", name),
            Value::Hook(_) => write!(f, "<hook>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Function(u) => write!(f, "<function {}>", u.name()),
            Value::Native { name, .. } => write!(f, "<builtin {}>", name),
            Value::Hook(_) => write!(f, "<hook>"),
            other => write!(f, "{}", other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            // Reference identity for callables.
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native { f: a, .. }, Value::Native { f: b, .. }) => Rc::ptr_eq(a, b),
            (Value::Hook(a), Value::Hook(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A fault raised by applying a binary operator to unsupported operands.
///
/// Shared between the VM's `BINARY_OP` instruction and the interactive
/// command evaluator, which implement the same operator semantics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpFault {
    #[error("unsupported operand types for {op}: {lhs} and {rhs}")]
    TypeMismatch {
        op: BinOp,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {op}")]
    Overflow { op: BinOp },
}

/// Apply a binary operator to two values.
///
/// Integer arithmetic is checked; strings support concatenation and
/// lexicographic comparison; equality is defined for every scalar type.
pub fn apply_binop(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, OpFault> {
    use Value::*;

    let mismatch = || OpFault::TypeMismatch {
        op,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    };

    match (lhs, rhs) {
        (Int(a), Int(b)) => apply_int(op, *a, *b),
        (Str(a), Str(b)) => match op {
            BinOp::Add => Ok(Str(format!("{}{}", a, b))),
            BinOp::Eq => Ok(Bool(a == b)),
            BinOp::Ne => Ok(Bool(a != b)),
            BinOp::Lt => Ok(Bool(a < b)),
            BinOp::Le => Ok(Bool(a <= b)),
            BinOp::Gt => Ok(Bool(a > b)),
            BinOp::Ge => Ok(Bool(a >= b)),
            _ => Err(mismatch()),
        },
        (Bool(a), Bool(b)) => match op {
            BinOp::Eq => Ok(Bool(a == b)),
            BinOp::Ne => Ok(Bool(a != b)),
            _ => Err(mismatch()),
        },
        (Unit, Unit) => match op {
            BinOp::Eq => Ok(Bool(true)),
            BinOp::Ne => Ok(Bool(false)),
            _ => Err(mismatch()),
        },
        _ => Err(mismatch()),
    }
}

fn apply_int(op: BinOp, a: i64, b: i64) -> Result<Value, OpFault> {
    use Value::{Bool, Int};

    let overflow = || OpFault::Overflow { op };

    Ok(match op {
        BinOp::Add => Int(a.checked_add(b).ok_or_else(overflow)?),
        BinOp::Sub => Int(a.checked_sub(b).ok_or_else(overflow)?),
        BinOp::Mul => Int(a.checked_mul(b).ok_or_else(overflow)?),
        BinOp::Div => {
            if b == 0 {
                return Err(OpFault::DivisionByZero);
            }
            Int(a.checked_div(b).ok_or_else(overflow)?)
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(OpFault::DivisionByZero);
            }
            Int(a.checked_rem(b).ok_or_else(overflow)?)
        }
        BinOp::Shl => {
            let shift = u32::try_from(b).map_err(|_| overflow())?;
            Int(a.checked_shl(shift).ok_or_else(overflow)?)
        }
        BinOp::Shr => {
            let shift = u32::try_from(b).map_err(|_| overflow())?;
            Int(a.checked_shr(shift).ok_or_else(overflow)?)
        }
        BinOp::Eq => Bool(a == b),
        BinOp::Ne => Bool(a != b),
        BinOp::Lt => Bool(a < b),
        BinOp::Le => Bool(a <= b),
        BinOp::Gt => Bool(a > b),
        BinOp::Ge => Bool(a >= b),
    })
}

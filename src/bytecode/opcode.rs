use std::fmt;

use super::value::Value;

/// A binary operator, shared by the `BINARY_OP` instruction and the
/// interactive command evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Stable wire code used in the packed code stream.
    pub fn code(self) -> u16 {
        match self {
            BinOp::Add => 0,
            BinOp::Sub => 1,
            BinOp::Mul => 2,
            BinOp::Div => 3,
            BinOp::Mod => 4,
            BinOp::Shl => 5,
            BinOp::Shr => 6,
            BinOp::Eq => 7,
            BinOp::Ne => 8,
            BinOp::Lt => 9,
            BinOp::Le => 10,
            BinOp::Gt => 11,
            BinOp::Ge => 12,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => BinOp::Add,
            1 => BinOp::Sub,
            2 => BinOp::Mul,
            3 => BinOp::Div,
            4 => BinOp::Mod,
            5 => BinOp::Shl,
            6 => BinOp::Shr,
            7 => BinOp::Eq,
            8 => BinOp::Ne,
            9 => BinOp::Lt,
            10 => BinOp::Le,
            11 => BinOp::Gt,
            12 => BinOp::Ge,
            _ => return None,
        })
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// One atomic operation of the VM, with its operand attached symbolically.
///
/// The opcode set is deliberately straight-line: there are no jumps, so a
/// contiguous insertion can never invalidate a branch target.
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    /// Push a constant onto the operand stack.
    LoadConst(Value),
    /// Push the value bound to a name (locals first, then globals).
    LoadName(String),
    /// Pop the top of stack into a local binding.
    StoreName(String),
    /// Pop `argc` arguments and a callee; push the call's result.
    CallFunction(u8),
    /// Pop two operands, push the operator's result.
    BinaryOp(BinOp),
    /// Pop and discard the top of stack.
    Pop,
    /// Pop the top of stack and return it to the caller.
    Return,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::LoadConst(_) => "LOAD_CONST",
            Opcode::LoadName(_) => "LOAD_NAME",
            Opcode::StoreName(_) => "STORE_NAME",
            Opcode::CallFunction(_) => "CALL_FUNCTION",
            Opcode::BinaryOp(_) => "BINARY_OP",
            Opcode::Pop => "POP_TOP",
            Opcode::Return => "RETURN_VALUE",
        }
    }

    /// Human-readable operand, empty for operand-less opcodes.
    pub fn operand_repr(&self) -> String {
        match self {
            Opcode::LoadConst(v) => format!("{:?}", v),
            Opcode::LoadName(n) | Opcode::StoreName(n) => n.clone(),
            Opcode::CallFunction(argc) => argc.to_string(),
            Opcode::BinaryOp(op) => op.to_string(),
            Opcode::Pop | Opcode::Return => String::new(),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operand = self.operand_repr();
        if operand.is_empty() {
            write!(f, "{}", self.mnemonic())
        } else {
            write!(f, "{} {}", self.mnemonic(), operand)
        }
    }
}

/// One instruction: an opcode plus the 1-based source line it came from.
///
/// Immutable once constructed; sequences of instructions are the mutable
/// container (see [`InstrSeq`](super::InstrSeq)).
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub op: Opcode,
    pub line: u32,
}

impl Instr {
    pub fn new(op: Opcode, line: u32) -> Self {
        Self { op, line }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<4} {}", self.line, self.op)
    }
}

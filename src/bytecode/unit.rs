//! The packed executable form of a function.
//!
//! A [`CodeUnit`] stores its body as a flat byte stream of fixed-width
//! records, `[opcode u8][operand u16 LE][line u32 LE]`, plus side tables for
//! constants and names. Decoding recovers the symbolic instruction list;
//! encoding rebuilds the tables and the stream.

use std::rc::Rc;

use thiserror::Error;

use super::opcode::{BinOp, Instr, Opcode};
use super::value::Value;

const OP_LOAD_CONST: u8 = 0x01;
const OP_LOAD_NAME: u8 = 0x02;
const OP_STORE_NAME: u8 = 0x03;
const OP_CALL_FUNCTION: u8 = 0x04;
const OP_BINARY_OP: u8 = 0x05;
const OP_POP_TOP: u8 = 0x06;
const OP_RETURN_VALUE: u8 = 0x07;

/// Bytes per packed instruction record.
const RECORD_LEN: usize = 7;

/// The compiled form of a unit could not be parsed back into instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("code stream truncated at byte {at}")]
    Truncated { at: usize },

    #[error("unknown opcode byte {byte:#04x} at instruction {index}")]
    UnknownOpcode { byte: u8, index: usize },

    #[error("constant index {operand} out of range at instruction {index}")]
    ConstIndex { operand: u16, index: usize },

    #[error("name index {operand} out of range at instruction {index}")]
    NameIndex { operand: u16, index: usize },

    #[error("unknown binary operator code {operand} at instruction {index}")]
    BinOpCode { operand: u16, index: usize },

    #[error("unexpected operand {operand} for operand-less opcode at instruction {index}")]
    StrayOperand { operand: u16, index: usize },

    #[error("call argument count {operand} exceeds the 255-argument limit at instruction {index}")]
    ArgCount { operand: u16, index: usize },
}

/// Instruction metadata was inconsistent and could not be reassembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("instruction {index} has line tag 0 (lines are 1-based)")]
    LineZero { index: usize },

    #[error("constant table overflow (more than {} entries)", u16::MAX)]
    ConstOverflow,

    #[error("name table overflow (more than {} entries)", u16::MAX)]
    NameOverflow,
}

/// A compiled, callable function body.
///
/// Decomposable into an [`InstrSeq`](super::InstrSeq) and reconstructible
/// from one with the same calling convention and name-binding shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeUnit {
    name: String,
    params: Vec<String>,
    consts: Vec<Value>,
    names: Vec<String>,
    code: Vec<u8>,
}

impl CodeUnit {
    /// Assemble a unit from symbolic instructions.
    pub fn from_instrs(
        name: impl Into<String>,
        params: Vec<String>,
        instrs: &[Instr],
    ) -> Result<Self, EncodeError> {
        let mut consts: Vec<Value> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut code = Vec::with_capacity(instrs.len() * RECORD_LEN);

        for (index, instr) in instrs.iter().enumerate() {
            if instr.line == 0 {
                return Err(EncodeError::LineZero { index });
            }
            let (byte, operand) = match &instr.op {
                Opcode::LoadConst(v) => {
                    if consts.len() >= u16::MAX as usize {
                        return Err(EncodeError::ConstOverflow);
                    }
                    consts.push(v.clone());
                    (OP_LOAD_CONST, (consts.len() - 1) as u16)
                }
                Opcode::LoadName(n) => (OP_LOAD_NAME, intern(&mut names, n)?),
                Opcode::StoreName(n) => (OP_STORE_NAME, intern(&mut names, n)?),
                Opcode::CallFunction(argc) => (OP_CALL_FUNCTION, *argc as u16),
                Opcode::BinaryOp(op) => (OP_BINARY_OP, op.code()),
                Opcode::Pop => (OP_POP_TOP, 0),
                Opcode::Return => (OP_RETURN_VALUE, 0),
            };
            code.push(byte);
            code.extend_from_slice(&operand.to_le_bytes());
            code.extend_from_slice(&instr.line.to_le_bytes());
        }

        Ok(Self {
            name: name.into(),
            params,
            consts,
            names,
            code,
        })
    }

    /// Decode the packed stream back into symbolic instructions.
    pub fn decode_instrs(&self) -> Result<Vec<Instr>, DecodeError> {
        let mut instrs = Vec::with_capacity(self.code.len() / RECORD_LEN);

        let mut at = 0;
        let mut index = 0;
        while at < self.code.len() {
            let record = self
                .code
                .get(at..at + RECORD_LEN)
                .ok_or(DecodeError::Truncated { at })?;
            let byte = record[0];
            let operand = u16::from_le_bytes([record[1], record[2]]);
            let line = u32::from_le_bytes([record[3], record[4], record[5], record[6]]);

            let op = match byte {
                OP_LOAD_CONST => {
                    let value = self
                        .consts
                        .get(operand as usize)
                        .ok_or(DecodeError::ConstIndex { operand, index })?;
                    Opcode::LoadConst(value.clone())
                }
                OP_LOAD_NAME | OP_STORE_NAME => {
                    let name = self
                        .names
                        .get(operand as usize)
                        .ok_or(DecodeError::NameIndex { operand, index })?
                        .clone();
                    if byte == OP_LOAD_NAME {
                        Opcode::LoadName(name)
                    } else {
                        Opcode::StoreName(name)
                    }
                }
                OP_CALL_FUNCTION => {
                    let argc = u8::try_from(operand)
                        .map_err(|_| DecodeError::ArgCount { operand, index })?;
                    Opcode::CallFunction(argc)
                }
                OP_BINARY_OP => Opcode::BinaryOp(
                    BinOp::from_code(operand).ok_or(DecodeError::BinOpCode { operand, index })?,
                ),
                OP_POP_TOP | OP_RETURN_VALUE => {
                    if operand != 0 {
                        return Err(DecodeError::StrayOperand { operand, index });
                    }
                    if byte == OP_POP_TOP {
                        Opcode::Pop
                    } else {
                        Opcode::Return
                    }
                }
                byte => return Err(DecodeError::UnknownOpcode { byte, index }),
            };

            instrs.push(Instr::new(op, line));
            at += RECORD_LEN;
            index += 1;
        }

        Ok(instrs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Number of packed instructions.
    pub fn len(&self) -> usize {
        self.code.len() / RECORD_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Convenience wrapper for the common `Rc<CodeUnit>` handle.
    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }
}

fn intern(names: &mut Vec<String>, name: &str) -> Result<u16, EncodeError> {
    if let Some(pos) = names.iter().position(|n| n == name) {
        return Ok(pos as u16);
    }
    if names.len() >= u16::MAX as usize {
        return Err(EncodeError::NameOverflow);
    }
    names.push(name.to_string());
    Ok((names.len() - 1) as u16)
}

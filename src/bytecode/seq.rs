//! The symbolic instruction sequence a [`CodeUnit`] decodes into.
//!
//! This is the form the injector patches: ordered, line-tagged instructions
//! with positional insertion. Converting back with [`InstrSeq::to_unit`]
//! yields a unit semantically equivalent to the source except for whatever
//! contiguous block was inserted.

use serde::Serialize;

use super::opcode::Instr;
use super::unit::{CodeUnit, DecodeError, EncodeError};

/// An ordered instruction sequence derived from (or destined for) a
/// [`CodeUnit`], carrying the unit's calling convention along.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrSeq {
    name: String,
    params: Vec<String>,
    instrs: Vec<Instr>,
}

/// One row of a disassembly listing, JSON-serializable for tooling.
#[derive(Debug, Clone, Serialize)]
pub struct DisasmRow {
    pub index: usize,
    pub line: u32,
    pub opcode: &'static str,
    pub operand: String,
}

impl InstrSeq {
    /// Start an empty sequence for hand-assembly.
    pub fn new(name: impl Into<String>, params: &[&str]) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            instrs: Vec::new(),
        }
    }

    /// Decompile a unit into its ordered instruction sequence.
    pub fn from_unit(unit: &CodeUnit) -> Result<Self, DecodeError> {
        Ok(Self {
            name: unit.name().to_string(),
            params: unit.params().to_vec(),
            instrs: unit.decode_instrs()?,
        })
    }

    /// Recompile into an executable unit with the same calling convention
    /// and name-binding shape as the unit this sequence was derived from.
    pub fn to_unit(&self) -> Result<CodeUnit, EncodeError> {
        CodeUnit::from_instrs(self.name.clone(), self.params.clone(), &self.instrs)
    }

    /// Insert a contiguous block so that its first instruction lands at
    /// `index`. `index == len()` appends.
    ///
    /// Out-of-bounds indices are a caller bug and panic; the injector only
    /// produces indices it found by scanning this sequence.
    pub fn insert_before(&mut self, index: usize, block: impl IntoIterator<Item = Instr>) {
        assert!(index <= self.instrs.len(), "insertion index out of bounds");
        self.instrs.splice(index..index, block);
    }

    pub fn push(&mut self, instr: Instr) -> &mut Self {
        self.instrs.push(instr);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Index of the first instruction tagged with `line`, if any.
    ///
    /// First match is the specified tie-break when one source line maps to
    /// several instructions.
    pub fn first_at_line(&self, line: u32) -> Option<usize> {
        self.instrs.iter().position(|i| i.line == line)
    }

    /// Produce a disassembly listing of this sequence.
    pub fn disassemble(&self) -> Vec<DisasmRow> {
        self.instrs
            .iter()
            .enumerate()
            .map(|(index, instr)| DisasmRow {
                index,
                line: instr.line,
                opcode: instr.op.mnemonic(),
                operand: instr.op.operand_repr(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Opcode, Value};

    fn seq() -> InstrSeq {
        let mut s = InstrSeq::new("f", &["a"]);
        s.push(Instr::new(Opcode::LoadName("a".into()), 1))
            .push(Instr::new(Opcode::Pop, 1))
            .push(Instr::new(Opcode::LoadConst(Value::Unit), 2))
            .push(Instr::new(Opcode::Return, 2));
        s
    }

    #[test]
    fn first_at_line_picks_first_match() {
        let s = seq();
        assert_eq!(s.first_at_line(1), Some(0));
        assert_eq!(s.first_at_line(2), Some(2));
        assert_eq!(s.first_at_line(3), None);
    }

    #[test]
    fn insert_before_splices_contiguously() {
        let mut s = seq();
        let block = vec![
            Instr::new(Opcode::LoadConst(Value::Int(7)), 2),
            Instr::new(Opcode::Pop, 2),
        ];
        s.insert_before(2, block.clone());
        assert_eq!(s.len(), 6);
        assert_eq!(&s.instrs()[2..4], block.as_slice());
        // Originals keep their relative order around the block.
        assert_eq!(s.instrs()[0], Instr::new(Opcode::LoadName("a".into()), 1));
        assert_eq!(s.instrs()[5], Instr::new(Opcode::Return, 2));
    }

    #[test]
    fn roundtrip_through_unit() {
        let s = seq();
        let unit = s.to_unit().unwrap();
        assert_eq!(InstrSeq::from_unit(&unit).unwrap(), s);
        assert_eq!(unit.params(), ["a".to_string()]);
    }
}

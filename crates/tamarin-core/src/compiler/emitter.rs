//! Symbolic instruction buffer.
//!
//! The code generator appends symbolic instructions here; the assembler
//! resolves label references into absolute offsets and packs the byte
//! stream. Number and string immediates are encoded at emission time so the
//! assembler only has to deal with layout.

use super::opcode::Opcode;
use crate::{Error, Result};

/// A symbolic instruction, pre-assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// A label definition (occupies no bytes)
    Label(String),
    /// A 4-byte placeholder resolved to the named label's offset
    Reference(String),
    /// An opcode, with an optional listing comment
    Op(Opcode, Option<String>),
    /// Raw immediate bytes following an opcode
    Data(Vec<u8>),
    /// A listing-only comment (occupies no bytes)
    Comment(String),
}

impl Instruction {
    /// The number of bytes this instruction occupies in the assembled stream.
    pub fn byte_len(&self) -> usize {
        match self {
            Instruction::Label(_) | Instruction::Comment(_) => 0,
            Instruction::Reference(_) => 4,
            Instruction::Op(_, _) => 1,
            Instruction::Data(bytes) => bytes.len(),
        }
    }
}

/// Append-only buffer of symbolic instructions.
#[derive(Debug, Default)]
pub struct Emitter {
    instructions: Vec<Instruction>,
}

impl Emitter {
    /// Creates an empty emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// The emitted instructions.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Consumes the emitter, yielding its instructions.
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    /// Defines a label at the current position.
    pub fn write_label(&mut self, name: impl Into<String>) {
        self.instructions.push(Instruction::Label(name.into()));
    }

    /// Emits an ADDR opcode followed by a reference to be resolved at
    /// assembly.
    pub fn write_reference(&mut self, name: impl Into<String>) {
        self.instructions.push(Instruction::Op(Opcode::Addr, None));
        self.instructions.push(Instruction::Reference(name.into()));
    }

    /// Emits a bare opcode.
    pub fn write_op(&mut self, op: Opcode) {
        self.instructions.push(Instruction::Op(op, None));
    }

    /// Emits an opcode with a listing comment.
    pub fn write_op_with(&mut self, op: Opcode, comment: impl Into<String>) {
        self.instructions
            .push(Instruction::Op(op, Some(comment.into())));
    }

    /// Emits a NUM opcode followed by the 8-byte big-endian IEEE-754
    /// encoding of `n`.
    pub fn write_number(&mut self, n: f64) {
        self.write_op_with(Opcode::Num, format!("{}", n));
        self.instructions
            .push(Instruction::Data(n.to_bits().to_be_bytes().to_vec()));
    }

    /// Emits a STR opcode followed by the big-endian UTF-16 code units of
    /// `s` and a 0x0000 terminator. Strings may not contain U+0000.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let mut bytes = Vec::with_capacity(s.len() * 2 + 2);
        for unit in s.encode_utf16() {
            if unit == 0 {
                return Err(Error::Syntax(
                    "string literals may not contain U+0000".to_string(),
                ));
            }
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        self.write_op_with(Opcode::Str, format!("{:?}", s));
        self.instructions.push(Instruction::Data(bytes));
        Ok(())
    }

    /// Emits a listing-only comment.
    pub fn write_comment(&mut self, text: impl Into<String>) {
        self.instructions.push(Instruction::Comment(text.into()));
    }

    /// Renders the pre-assembly listing, one instruction per line.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for inst in &self.instructions {
            match inst {
                Instruction::Label(name) => out.push_str(&format!("{}:\n", name)),
                Instruction::Reference(name) => out.push_str(&format!("    -> {}\n", name)),
                Instruction::Op(op, Some(comment)) => {
                    out.push_str(&format!("    {:<8}; {}\n", op.mnemonic(), comment))
                }
                Instruction::Op(op, None) => out.push_str(&format!("    {}\n", op.mnemonic())),
                Instruction::Data(bytes) => {
                    out.push_str(&format!("    .data {} bytes\n", bytes.len()))
                }
                Instruction::Comment(text) => out.push_str(&format!("; {}\n", text)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_number_encoding() {
        let mut emitter = Emitter::new();
        emitter.write_number(1.0);
        let insts = emitter.instructions();
        assert_eq!(insts.len(), 2);
        assert!(matches!(insts[0], Instruction::Op(Opcode::Num, _)));
        match &insts[1] {
            Instruction::Data(bytes) => {
                assert_eq!(bytes.as_slice(), &1.0f64.to_bits().to_be_bytes());
            }
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn test_write_string_encoding() {
        let mut emitter = Emitter::new();
        emitter.write_string("ab").unwrap();
        match &emitter.instructions()[1] {
            Instruction::Data(bytes) => {
                assert_eq!(bytes.as_slice(), &[0x00, 0x61, 0x00, 0x62, 0x00, 0x00]);
            }
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn test_write_string_rejects_nul() {
        let mut emitter = Emitter::new();
        assert!(emitter.write_string("a\0b").is_err());
    }

    #[test]
    fn test_reference_emits_addr_opcode() {
        let mut emitter = Emitter::new();
        emitter.write_reference(".end_1");
        let insts = emitter.instructions();
        assert!(matches!(insts[0], Instruction::Op(Opcode::Addr, _)));
        assert!(matches!(insts[1], Instruction::Reference(_)));
    }

    #[test]
    fn test_byte_lengths() {
        assert_eq!(Instruction::Label("x".into()).byte_len(), 0);
        assert_eq!(Instruction::Comment("c".into()).byte_len(), 0);
        assert_eq!(Instruction::Reference("x".into()).byte_len(), 4);
        assert_eq!(Instruction::Op(Opcode::Nop, None).byte_len(), 1);
        assert_eq!(Instruction::Data(vec![0; 8]).byte_len(), 8);
    }
}

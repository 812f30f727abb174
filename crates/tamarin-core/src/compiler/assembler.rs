//! The link pass: symbolic instructions to packed bytes.
//!
//! Two passes over the instruction buffer. The first computes the byte
//! offset of every label; the second emits bytes, substituting each
//! reference with the 4-byte big-endian offset of its label.

use rustc_hash::FxHashMap;

use super::emitter::Instruction;
use crate::{Error, Result};

/// Resolves labels and packs the instruction buffer into a byte stream.
/// Returns the bytes together with the resolved label table.
pub fn assemble(instructions: &[Instruction]) -> Result<(Vec<u8>, FxHashMap<String, u32>)> {
    let mut labels: FxHashMap<String, u32> = FxHashMap::default();

    let mut offset: usize = 0;
    for inst in instructions {
        if let Instruction::Label(name) = inst {
            if labels.insert(name.clone(), offset as u32).is_some() {
                return Err(Error::Bytecode(format!("duplicate label {}", name)));
            }
        }
        offset += inst.byte_len();
    }
    if offset > u32::MAX as usize {
        return Err(Error::Bytecode("program exceeds addressable size".to_string()));
    }

    let mut bytes = Vec::with_capacity(offset);
    for inst in instructions {
        match inst {
            Instruction::Label(_) | Instruction::Comment(_) => {}
            Instruction::Reference(name) => {
                let target = labels.get(name).ok_or_else(|| {
                    Error::Bytecode(format!("reference to undefined label {}", name))
                })?;
                bytes.extend_from_slice(&target.to_be_bytes());
            }
            Instruction::Op(op, _) => bytes.push(*op as u8),
            Instruction::Data(data) => bytes.extend_from_slice(data),
        }
    }

    Ok((bytes, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::emitter::Emitter;
    use crate::compiler::opcode::Opcode;

    #[test]
    fn test_assemble_resolves_forward_reference() {
        let mut emitter = Emitter::new();
        emitter.write_reference(".end");
        emitter.write_op(Opcode::Jump);
        emitter.write_op(Opcode::Nop);
        emitter.write_label(".end");
        emitter.write_op(Opcode::Ret);

        let (bytes, labels) = assemble(emitter.instructions()).unwrap();
        // ADDR(1) + reference(4) + JUMP(1) + NOP(1) = 7
        assert_eq!(labels[".end"], 7);
        assert_eq!(bytes[0], Opcode::Addr as u8);
        assert_eq!(&bytes[1..5], &7u32.to_be_bytes());
        assert_eq!(bytes[7], Opcode::Ret as u8);
    }

    #[test]
    fn test_assemble_backward_reference() {
        let mut emitter = Emitter::new();
        emitter.write_label(".top");
        emitter.write_op(Opcode::Nop);
        emitter.write_reference(".top");
        emitter.write_op(Opcode::Jump);

        let (bytes, labels) = assemble(emitter.instructions()).unwrap();
        assert_eq!(labels[".top"], 0);
        assert_eq!(&bytes[2..6], &0u32.to_be_bytes());
    }

    #[test]
    fn test_labels_and_comments_are_free() {
        let mut emitter = Emitter::new();
        emitter.write_comment("prologue");
        emitter.write_label(".a");
        emitter.write_label(".b");
        emitter.write_op(Opcode::Ret);

        let (bytes, labels) = assemble(emitter.instructions()).unwrap();
        assert_eq!(bytes.len(), 1);
        assert_eq!(labels[".a"], 0);
        assert_eq!(labels[".b"], 0);
    }

    #[test]
    fn test_undefined_label_errors() {
        let mut emitter = Emitter::new();
        emitter.write_reference(".nowhere");
        assert!(assemble(emitter.instructions()).is_err());
    }

    #[test]
    fn test_duplicate_label_errors() {
        let mut emitter = Emitter::new();
        emitter.write_label(".x");
        emitter.write_op(Opcode::Nop);
        emitter.write_label(".x");
        assert!(assemble(emitter.instructions()).is_err());
    }
}

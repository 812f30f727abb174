//! Bytecode disassembler.
//!
//! Renders an assembled byte stream as a listing, one opcode per line with
//! its byte offset and decoded immediate. Used by the CLI `disasm`
//! subcommand and by tests when a compilation needs eyeballing.

use super::opcode::Opcode;
use crate::{Error, Result};

/// Disassembles a full byte stream into a listing.
pub fn disassemble(code: &[u8]) -> Result<String> {
    let mut out = String::new();
    let mut pc = 0usize;
    while pc < code.len() {
        let (line, next) = disassemble_one(code, pc)?;
        out.push_str(&line);
        out.push('\n');
        pc = next;
    }
    Ok(out)
}

/// Disassembles the instruction at `pc`, returning its rendering and the
/// offset of the next instruction.
pub fn disassemble_one(code: &[u8], pc: usize) -> Result<(String, usize)> {
    let op = Opcode::try_from(code[pc])?;
    let mut next = pc + 1;

    let line = match op {
        Opcode::Num => {
            let bytes: [u8; 8] = code
                .get(next..next + 8)
                .ok_or_else(|| truncated(pc))?
                .try_into()
                .unwrap();
            next += 8;
            format!("{:06} {:<8}{}", pc, op.mnemonic(), f64::from_bits(u64::from_be_bytes(bytes)))
        }
        Opcode::Addr => {
            let bytes: [u8; 4] = code
                .get(next..next + 4)
                .ok_or_else(|| truncated(pc))?
                .try_into()
                .unwrap();
            next += 4;
            format!("{:06} {:<8}{:#010x}", pc, op.mnemonic(), u32::from_be_bytes(bytes))
        }
        Opcode::Str => {
            let mut units = Vec::new();
            loop {
                let pair = code.get(next..next + 2).ok_or_else(|| truncated(pc))?;
                next += 2;
                let unit = u16::from_be_bytes([pair[0], pair[1]]);
                if unit == 0 {
                    break;
                }
                units.push(unit);
            }
            let text = String::from_utf16_lossy(&units);
            format!("{:06} {:<8}{:?}", pc, op.mnemonic(), text)
        }
        _ => format!("{:06} {}", pc, op.mnemonic()),
    };

    Ok((line, next))
}

fn truncated(pc: usize) -> Error {
    Error::Bytecode(format!("truncated immediate at offset {}", pc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::emitter::Emitter;
    use crate::compiler::assembler::assemble;

    #[test]
    fn test_disassemble_immediates() {
        let mut emitter = Emitter::new();
        emitter.write_number(3.5);
        emitter.write_string("hi").unwrap();
        emitter.write_op(Opcode::Add);
        emitter.write_op(Opcode::Ret);
        let (bytes, _) = assemble(emitter.instructions()).unwrap();

        let listing = disassemble(&bytes).unwrap();
        assert!(listing.contains("NUM"));
        assert!(listing.contains("3.5"));
        assert!(listing.contains("\"hi\""));
        assert!(listing.contains("ADD"));
        assert!(listing.contains("RET"));
    }

    #[test]
    fn test_disassemble_truncated_number() {
        let bytes = vec![Opcode::Num as u8, 0x00, 0x01];
        assert!(disassemble(&bytes).is_err());
    }

    #[test]
    fn test_disassemble_unknown_opcode() {
        assert!(disassemble(&[0xEE]).is_err());
    }
}

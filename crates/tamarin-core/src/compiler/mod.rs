//! The compiler: AST in, assembled bytecode out.
//!
//! Compilation runs in three stages. A pre-pass ([`hoist`]) splits the
//! program into code blocks and gathers hoisted declarations; the code
//! generator ([`codegen`]) lowers each block into symbolic instructions;
//! the [`assembler`] resolves labels and packs the final byte stream.

pub mod assembler;
pub mod codegen;
pub mod disasm;
pub mod emitter;
pub mod hoist;
pub mod opcode;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::Program;
use crate::Result;

pub use emitter::{Emitter, Instruction};
pub use opcode::Opcode;

/// Monotonic id generator for minting collision-free label names within a
/// single compilation.
#[derive(Debug)]
pub struct UniqueId {
    next: u64,
}

impl UniqueId {
    /// Creates a generator starting at 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the current counter as lowercase hex and increments it.
    pub fn get(&mut self) -> String {
        let id = format!("{:x}", self.next);
        self.next += 1;
        id
    }

    /// Resets the counter to 1.
    pub fn clear(&mut self) {
        self.next = 1;
    }
}

impl Default for UniqueId {
    fn default() -> Self {
        Self::new()
    }
}

/// An assembled program: the shared code buffer, the entry address of the
/// script root, and the resolved label table (kept for tooling).
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    /// The assembled byte stream, shared read-only with every closure.
    pub code: Arc<[u8]>,
    /// Absolute offset of the script-root label.
    pub entry: u32,
    /// Every label resolved during assembly.
    pub labels: FxHashMap<String, u32>,
}

/// Compiles a parsed program into bytecode.
pub fn compile(program: &Program) -> Result<CompiledProgram> {
    let mut uid = UniqueId::new();
    let table = hoist::discover_blocks(program, &mut uid)?;
    let root_label = table.root().label.clone();

    let emitter = codegen::CodeGen::new(&table, uid).generate()?;
    let (bytes, labels) = assembler::assemble(emitter.instructions())?;
    let entry = labels[&root_label];

    debug!(
        blocks = table.blocks.len(),
        bytes = bytes.len(),
        entry,
        "compiled program"
    );

    Ok(CompiledProgram {
        code: Arc::from(bytes),
        entry,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_sequence() {
        let mut uid = UniqueId::new();
        assert_eq!(uid.get(), "1");
        assert_eq!(uid.get(), "2");
        for _ in 0..13 {
            uid.get();
        }
        assert_eq!(uid.get(), "10"); // hex
    }

    #[test]
    fn test_unique_id_clear() {
        let mut uid = UniqueId::new();
        uid.get();
        uid.get();
        uid.clear();
        assert_eq!(uid.get(), "1");
    }
}

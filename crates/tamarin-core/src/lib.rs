// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # tamarin-core
//!
//! A bytecode compiler and stack virtual machine for an ES3-style
//! scripting subset, implemented in Rust.
//!
//! ## Overview
//!
//! This crate provides a small but complete execution pipeline:
//! - Lexer and recursive-descent parser for the supported subset
//! - A two-pass compiler: declaration hoisting and block discovery, then
//!   lowering to a label-addressed instruction stream, assembled into a
//!   flat big-endian byte sequence
//! - A stack VM with chained lexical scopes, first-class closures, and an
//!   embedder-supplied ambient environment
//!
//! ## Quick Start
//!
//! ```rust
//! use tamarin_core::{Engine, Value};
//!
//! let mut engine = Engine::new();
//! let result = engine.eval("var x = 1; x + 2;").unwrap();
//! assert_eq!(result, Value::Number(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod vm;

use std::path::Path;

use thiserror::Error as ThisError;

pub use compiler::CompiledProgram;
pub use runtime::{NativeFn, Value};
pub use vm::Vm;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during compilation or execution.
///
/// Every error is fatal to the current run; the guest language has no
/// error handling of its own.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// Lex or parse error
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Statement form outside the supported subset
    #[error("unsupported syntax: {0}")]
    Unsupported(String),

    /// Unresolved variable reference in a non-global scope
    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    /// Type error during execution
    #[error("TypeError: {0}")]
    Type(String),

    /// Byte not in the opcode table
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    /// Truncated immediate, bad label, or corrupted operand stack
    #[error("malformed bytecode: {0}")]
    Bytecode(String),

    /// I/O error
    #[error("IOError: {0}")]
    Io(String),
}

/// The engine: a persistent VM plus the compile pipeline.
///
/// State survives across [`Engine::eval`] calls, so globals defined by one
/// script are visible to the next and closures stay callable (each keeps
/// its own code buffer alive).
pub struct Engine {
    vm: Vm,
}

impl Engine {
    /// Creates an engine with the default ambient environment installed.
    pub fn new() -> Self {
        let mut vm = Vm::new();
        builtins::install(vm.globals_mut());
        Self { vm }
    }

    /// Compiles source text into bytecode without executing it.
    pub fn compile(source: &str) -> Result<CompiledProgram> {
        let program = parser::Parser::new(source)?.parse_program()?;
        compiler::compile(&program)
    }

    /// Compiles and runs source text, returning the script's completion
    /// value.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let program = Self::compile(source)?;
        self.vm.run(&program)
    }

    /// Evaluates a script file.
    pub fn eval_file(&mut self, path: &Path) -> Result<Value> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::Io(e.to_string()))?;
        self.eval(&source)
    }

    /// Binds a value in the ambient global environment.
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.vm.globals_mut().insert(name.to_string(), value);
    }

    /// Registers a host function in the ambient global environment.
    pub fn register_native(&mut self, name: &str, arity: i32, func: NativeFn) {
        use std::sync::Arc;
        self.vm.globals_mut().insert(
            name.to_string(),
            Value::Function(Arc::new(runtime::Callable::Native {
                name: name.to_string(),
                arity,
                func,
            })),
        );
    }

    /// The underlying VM, for embedders that need heap or scope access.
    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_eval_expression() {
        let mut engine = Engine::new();
        assert_eq!(engine.eval("1 + 2;").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_engine_state_persists_across_evals() {
        let mut engine = Engine::new();
        engine.eval("var counter = 10;").unwrap();
        assert_eq!(engine.eval("counter + 1;").unwrap(), Value::Number(11.0));
    }

    #[test]
    fn test_engine_set_global() {
        let mut engine = Engine::new();
        engine.set_global("answer", Value::Number(42.0));
        assert_eq!(engine.eval("answer;").unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_engine_register_native() {
        fn double(args: &[Value]) -> Result<Value> {
            Ok(Value::Number(args[0].to_number() * 2.0))
        }
        let mut engine = Engine::new();
        engine.register_native("double", 1, double);
        assert_eq!(engine.eval("double(21);").unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_compile_produces_bytecode() {
        let program = Engine::compile("var x = 1;").unwrap();
        assert!(!program.code.is_empty());
        assert!(program.labels.values().any(|offset| *offset == program.entry));
    }

    #[test]
    fn test_unsupported_syntax_is_reported() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.eval("try { f(); } catch (e) {}"),
            Err(Error::Unsupported(_))
        ));
    }
}

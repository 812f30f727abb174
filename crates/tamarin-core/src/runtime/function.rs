//! Function values: bytecode closures and host functions.

use std::sync::Arc;

use super::scope::ScopeId;
use super::value::Value;
use crate::Result;

/// A bytecode closure: an entry address into the shared code buffer plus
/// the scope captured at creation.
#[derive(Debug, Clone)]
pub struct Closure {
    /// Display name; named function expressions bind it for self-reference.
    pub name: Option<String>,
    /// Declared parameter count. Exposed for introspection; the VM does not
    /// enforce it.
    pub arity: u32,
    /// Absolute entry offset into `code`.
    pub entry: u32,
    /// The scope of the frame that executed FUNC (lexical capture).
    pub scope: ScopeId,
    /// The shared code buffer this closure runs in.
    pub code: Arc<[u8]>,
}

/// A host function provided by the embedder.
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// A callable value: a guest closure or a host function.
pub enum Callable {
    /// A bytecode closure
    Closure(Closure),
    /// A host function
    Native {
        /// The function name
        name: String,
        /// The arity (-1 for variadic)
        arity: i32,
        /// The host function pointer
        func: NativeFn,
    },
}

impl Callable {
    /// The display name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Callable::Closure(closure) => closure.name.as_deref(),
            Callable::Native { name, .. } => Some(name),
        }
    }

    /// The declared parameter count.
    pub fn arity(&self) -> f64 {
        match self {
            Callable::Closure(closure) => closure.arity as f64,
            Callable::Native { arity, .. } => *arity as f64,
        }
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Closure(closure) => write!(f, "Closure({:?} @{})", closure.name, closure.entry),
            Callable::Native { name, .. } => write!(f, "Native({})", name),
        }
    }
}

//! Lexical scopes for variable binding.
//!
//! Scopes form parent-linked chains. They are arena-allocated and addressed
//! by [`ScopeId`] so closures can hold on to their defining scope without
//! creating reference cycles; the arena is freed with the VM. The global
//! scope's ambient fallback lives in the interpreter, which owns the
//! embedder-supplied environment.

use rustc_hash::FxHashMap;

use super::value::Value;

/// An index into the scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// One scope record: bindings plus an optional parent link.
#[derive(Debug, Default)]
struct Scope {
    bindings: FxHashMap<String, Value>,
    parent: Option<ScopeId>,
    global: bool,
}

/// Arena of scope records.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the global scope.
    pub fn push_global(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            global: true,
            ..Scope::default()
        });
        id
    }

    /// Allocates a child scope.
    pub fn push_child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        id
    }

    /// Declares a name in `scope` with value undefined. Redeclaration keeps
    /// the existing binding.
    pub fn declare(&mut self, scope: ScopeId, name: &str) {
        self.scopes[scope.0]
            .bindings
            .entry(name.to_string())
            .or_insert(Value::Undefined);
    }

    /// Binds `name` directly in `scope`, replacing any existing binding.
    pub fn define(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes[scope.0].bindings.insert(name.to_string(), value);
    }

    /// Walks the chain from `scope`, returning the nearest binding.
    pub fn load(&self, scope: ScopeId, name: &str) -> Option<Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let record = &self.scopes[id.0];
            if let Some(value) = record.bindings.get(name) {
                return Some(value.clone());
            }
            current = record.parent;
        }
        None
    }

    /// Walks the chain from `scope`, assigning the nearest binding. Returns
    /// false if no binding exists anywhere on the chain.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let record = &mut self.scopes[id.0];
            if let Some(slot) = record.bindings.get_mut(name) {
                *slot = value;
                return true;
            }
            current = record.parent;
        }
        false
    }

    /// Whether the chain starting at `scope` is rooted at the global scope.
    pub fn rooted_at_global(&self, scope: ScopeId) -> bool {
        let mut current = scope;
        loop {
            let record = &self.scopes[current.0];
            match record.parent {
                Some(parent) => current = parent,
                None => return record.global,
            }
        }
    }
}

//! Runtime data model: values, heap objects, scopes, and functions.

pub mod function;
pub mod object;
pub mod scope;
pub mod value;

pub use function::{Callable, Closure, NativeFn};
pub use object::RuntimeObject;
pub use scope::{ScopeArena, ScopeId};
pub use value::Value;

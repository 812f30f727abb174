//! Heap object representation.
//!
//! A single `RuntimeObject` shape backs both object literals and arrays:
//! arrays keep a dense element vector with a tracked length, and both keep
//! a property list that preserves insertion order for enumeration.

use std::sync::Arc;

use super::function::Callable;
use super::value::Value;

/// A heap-allocated object or array.
#[derive(Debug, Clone, Default)]
pub struct RuntimeObject {
    /// Named properties, in insertion order.
    properties: Vec<(String, Value)>,
    /// Dense elements (arrays only).
    elements: Vec<Value>,
    /// Whether this object is an array.
    pub is_array: bool,
    /// The constructor that produced this object via `new`, if any.
    pub created_by: Option<Arc<Callable>>,
}

impl RuntimeObject {
    /// Creates an empty object.
    pub fn new_object() -> Self {
        Self::default()
    }

    /// Creates an array from the given elements.
    pub fn new_array(elements: Vec<Value>) -> Self {
        Self {
            elements,
            is_array: true,
            ..Self::default()
        }
    }

    /// The array elements.
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Array length.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True for an empty array.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Gets a property or element by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        if self.is_array {
            if key == "length" {
                return Some(Value::Number(self.elements.len() as f64));
            }
            if let Some(index) = array_index(key) {
                return Some(self.elements.get(index).cloned().unwrap_or(Value::Undefined));
            }
        }
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    }

    /// Sets a property or element by key.
    pub fn set(&mut self, key: &str, value: Value) {
        if self.is_array {
            if key == "length" {
                let new_len = value.to_number();
                if new_len >= 0.0 && new_len == new_len.trunc() {
                    self.elements.resize(new_len as usize, Value::Undefined);
                }
                return;
            }
            if let Some(index) = array_index(key) {
                if index >= self.elements.len() {
                    self.elements.resize(index + 1, Value::Undefined);
                }
                self.elements[index] = value;
                return;
            }
        }
        match self.properties.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key.to_string(), value)),
        }
    }

    /// Tests property existence (the `in` operator).
    pub fn has(&self, key: &str) -> bool {
        if self.is_array {
            if key == "length" {
                return true;
            }
            if let Some(index) = array_index(key) {
                return index < self.elements.len();
            }
        }
        self.properties.iter().any(|(name, _)| name == key)
    }

    /// Deletes a property or element, returning whether anything changed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.is_array {
            if let Some(index) = array_index(key) {
                if index < self.elements.len() {
                    // Deleting leaves a hole; the length is unchanged.
                    self.elements[index] = Value::Undefined;
                    return true;
                }
                return false;
            }
        }
        let before = self.properties.len();
        self.properties.retain(|(name, _)| name != key);
        self.properties.len() != before
    }

    /// Enumerable keys, insertion-ordered (indices first for arrays).
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = if self.is_array {
            (0..self.elements.len()).map(|i| i.to_string()).collect()
        } else {
            Vec::new()
        };
        keys.extend(self.properties.iter().map(|(name, _)| name.clone()));
        keys
    }
}

/// Parses a canonical array index ("0", "1", ...). Rejects leading zeros
/// so "01" stays a plain property key.
fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse::<usize>().ok()
}

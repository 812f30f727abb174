//! The bytecode interpreter.
//!
//! A frame is a program counter and operand stack over the shared code
//! buffer; function calls spawn a child frame recursively, so guest
//! recursion rides on host recursion. The VM itself owns everything
//! frames share: the scope arena, the object heap, and the ambient
//! (embedder-supplied) global environment.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::trace;

use super::comparison::{abstract_equals, relational, strict_equals};
use crate::compiler::{CompiledProgram, Opcode};
use crate::runtime::value::number_to_string;
use crate::runtime::{Callable, Closure, RuntimeObject, ScopeArena, ScopeId, Value};
use crate::{Error, Result};

/// The virtual machine. State persists across runs, so successive
/// evaluations against one VM share globals, heap objects, and closures.
pub struct Vm {
    scopes: ScopeArena,
    heap: Vec<RuntimeObject>,
    globals: FxHashMap<String, Value>,
    global_scope: ScopeId,
}

impl Vm {
    /// Creates a VM with an empty ambient environment.
    pub fn new() -> Self {
        let mut scopes = ScopeArena::new();
        let global_scope = scopes.push_global();
        Self {
            scopes,
            heap: Vec::with_capacity(64),
            globals: FxHashMap::default(),
            global_scope,
        }
    }

    /// The ambient global environment.
    pub fn globals(&self) -> &FxHashMap<String, Value> {
        &self.globals
    }

    /// Mutable access to the ambient global environment.
    pub fn globals_mut(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.globals
    }

    /// Allocates a heap object, returning its handle.
    pub fn alloc(&mut self, object: RuntimeObject) -> usize {
        let handle = self.heap.len();
        self.heap.push(object);
        handle
    }

    /// Reads a heap object.
    pub fn object(&self, handle: usize) -> &RuntimeObject {
        &self.heap[handle]
    }

    /// Runs a compiled program from its script-root entry in the global
    /// scope, returning the script's completion value.
    pub fn run(&mut self, program: &CompiledProgram) -> Result<Value> {
        self.run_frame(
            &program.code,
            program.entry as usize,
            self.global_scope,
            Vec::new(),
        )
    }

    // ========================================================================
    // Frame execution
    // ========================================================================

    fn run_frame(
        &mut self,
        code: &Arc<[u8]>,
        entry: usize,
        scope: ScopeId,
        stack: Vec<Value>,
    ) -> Result<Value> {
        let mut pc = entry;
        let mut stack = stack;

        loop {
            let byte = *code
                .get(pc)
                .ok_or_else(|| Error::Bytecode(format!("program counter {} out of bounds", pc)))?;
            pc += 1;

            match Opcode::try_from(byte)? {
                Opcode::Nop => {}

                // Literals and immediates
                Opcode::Undef => stack.push(Value::Undefined),
                Opcode::Null => stack.push(Value::Null),
                Opcode::True => stack.push(Value::Boolean(true)),
                Opcode::False => stack.push(Value::Boolean(false)),
                Opcode::Obj => {
                    let handle = self.alloc(RuntimeObject::new_object());
                    stack.push(Value::Object(handle));
                }
                Opcode::Arr => {
                    let handle = self.alloc(RuntimeObject::new_array(Vec::new()));
                    stack.push(Value::Object(handle));
                }
                Opcode::Num => {
                    let n = read_f64(code, &mut pc)?;
                    stack.push(Value::Number(n));
                }
                Opcode::Addr => {
                    let address = read_u32(code, &mut pc)?;
                    stack.push(Value::Number(address as f64));
                }
                Opcode::Str => {
                    let s = read_string(code, &mut pc)?;
                    stack.push(Value::String(s));
                }

                // Stack shuffling
                Opcode::Pop => {
                    pop(&mut stack)?;
                }
                Opcode::Top => {
                    let top = stack
                        .last()
                        .cloned()
                        .ok_or_else(|| underflow("TOP"))?;
                    stack.push(top);
                }
                Opcode::Top2 => {
                    if stack.len() < 2 {
                        return Err(underflow("TOP2"));
                    }
                    let a = stack[stack.len() - 2].clone();
                    let b = stack[stack.len() - 1].clone();
                    stack.push(a);
                    stack.push(b);
                }

                // Variables
                Opcode::Var => {
                    let name = pop_name(&mut stack, "VAR")?;
                    self.scopes.declare(scope, &name);
                }
                Opcode::Load => {
                    let name = pop_name(&mut stack, "LOAD")?;
                    let value = self.load_variable(scope, &name)?;
                    stack.push(value);
                }
                Opcode::Out => {
                    let name = pop_name(&mut stack, "OUT")?;
                    let value = pop(&mut stack)?;
                    self.assign_variable(scope, &name, value.clone())?;
                    stack.push(value);
                }

                // Control flow
                Opcode::Jump => {
                    pc = jump_target(pop(&mut stack)?)?;
                }
                Opcode::JumpIf => {
                    let target = jump_target(pop(&mut stack)?)?;
                    let test = pop(&mut stack)?;
                    if test.to_boolean() {
                        pc = target;
                    }
                }
                Opcode::JumpNot => {
                    let target = jump_target(pop(&mut stack)?)?;
                    let test = pop(&mut stack)?;
                    if !test.to_boolean() {
                        pc = target;
                    }
                }

                // Functions
                Opcode::Func => {
                    let entry = jump_target(pop(&mut stack)?)? as u32;
                    let arity = pop(&mut stack)?.to_number() as u32;
                    let name = match pop(&mut stack)? {
                        Value::String(s) => Some(s),
                        Value::Null => None,
                        other => {
                            return Err(Error::Bytecode(format!(
                                "FUNC expects a string or null name, found {}",
                                other.type_of()
                            )))
                        }
                    };
                    let closure = Closure {
                        name,
                        arity,
                        entry,
                        scope,
                        code: code.clone(),
                    };
                    stack.push(Value::Function(Arc::new(Callable::Closure(closure))));
                }
                Opcode::Call => {
                    let arguments = pop(&mut stack)?;
                    let function = pop(&mut stack)?;
                    let receiver = pop(&mut stack)?;
                    let result = self.invoke(function, receiver, arguments)?;
                    stack.push(result);
                }
                Opcode::New => {
                    let arguments = pop(&mut stack)?;
                    let function = pop(&mut stack)?;
                    let result = self.construct(function, arguments)?;
                    stack.push(result);
                }
                Opcode::Ret => {
                    return pop(&mut stack);
                }

                // Properties
                Opcode::Get => {
                    let key = pop(&mut stack)?;
                    let object = pop(&mut stack)?;
                    let value = self.get_property(&object, &key)?;
                    stack.push(value);
                }
                Opcode::Set => {
                    let value = pop(&mut stack)?;
                    let key = pop(&mut stack)?;
                    let object = pop(&mut stack)?;
                    self.set_property(&object, &key, value.clone())?;
                    stack.push(value);
                }
                Opcode::In => {
                    // Left-to-right evaluation order: key below object.
                    let object = pop(&mut stack)?;
                    let key = pop(&mut stack)?;
                    let found = match object {
                        Value::Object(handle) => self.heap[handle].has(&property_key(&key)),
                        other => {
                            return Err(Error::Type(format!(
                                "cannot use 'in' on {}",
                                other.type_of()
                            )))
                        }
                    };
                    stack.push(Value::Boolean(found));
                }
                Opcode::Delete => {
                    let key = pop(&mut stack)?;
                    let object = pop(&mut stack)?;
                    let deleted = match object {
                        Value::Object(handle) => self.heap[handle].delete(&property_key(&key)),
                        Value::Undefined | Value::Null => {
                            return Err(Error::Type(format!(
                                "cannot delete property of {}",
                                object.type_of()
                            )))
                        }
                        _ => true,
                    };
                    stack.push(Value::Boolean(deleted));
                }

                // Equality and ordering
                Opcode::Eq => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(abstract_equals(&l, &r)))
                })?,
                Opcode::Neq => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(!abstract_equals(&l, &r)))
                })?,
                Opcode::Seq => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(strict_equals(&l, &r)))
                })?,
                Opcode::Sneq => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(!strict_equals(&l, &r)))
                })?,
                Opcode::Lt => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(relational(&l, &r, |a, b| a < b, |a, b| a < b)))
                })?,
                Opcode::Lte => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(relational(&l, &r, |a, b| a <= b, |a, b| a <= b)))
                })?,
                Opcode::Gt => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(relational(&l, &r, |a, b| a > b, |a, b| a > b)))
                })?,
                Opcode::Gte => binary(&mut stack, |l, r| {
                    Ok(Value::Boolean(relational(&l, &r, |a, b| a >= b, |a, b| a >= b)))
                })?,

                // Arithmetic
                Opcode::Add => binary(&mut stack, |l, r| {
                    if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                        let mut s = l.to_display_string();
                        s.push_str(&r.to_display_string());
                        Ok(Value::String(s))
                    } else {
                        Ok(Value::Number(l.to_number() + r.to_number()))
                    }
                })?,
                Opcode::Sub => numeric(&mut stack, |a, b| a - b)?,
                Opcode::Mul => numeric(&mut stack, |a, b| a * b)?,
                Opcode::Div => numeric(&mut stack, |a, b| a / b)?,
                Opcode::Mod => numeric(&mut stack, |a, b| a % b)?,
                Opcode::Exp => numeric(&mut stack, |a, b| a.powf(b))?,

                // Bitwise
                Opcode::BNot => {
                    let v = pop(&mut stack)?;
                    stack.push(Value::Number(!to_int32(v.to_number()) as f64));
                }
                Opcode::BOr => integer(&mut stack, |a, b| a | b)?,
                Opcode::BXor => integer(&mut stack, |a, b| a ^ b)?,
                Opcode::BAnd => integer(&mut stack, |a, b| a & b)?,
                Opcode::LShift => integer(&mut stack, |a, b| a << (b & 31))?,
                Opcode::RShift => integer(&mut stack, |a, b| a >> (b & 31))?,
                Opcode::URShift => binary(&mut stack, |l, r| {
                    let a = to_uint32(l.to_number());
                    let shift = to_uint32(r.to_number()) & 31;
                    Ok(Value::Number((a >> shift) as f64))
                })?,

                // Logical
                Opcode::Or => binary(&mut stack, |l, r| {
                    Ok(if l.to_boolean() { l } else { r })
                })?,
                Opcode::And => binary(&mut stack, |l, r| {
                    Ok(if l.to_boolean() { r } else { l })
                })?,
                Opcode::Not => {
                    let v = pop(&mut stack)?;
                    stack.push(Value::Boolean(!v.to_boolean()));
                }

                Opcode::InstanceOf => {
                    let constructor = pop(&mut stack)?;
                    let instance = pop(&mut stack)?;
                    let result = self.instance_of(&instance, &constructor)?;
                    stack.push(Value::Boolean(result));
                }
                Opcode::TypeOf => {
                    let v = pop(&mut stack)?;
                    stack.push(Value::String(v.type_of().to_string()));
                }
            }
        }
    }

    // ========================================================================
    // Variables
    // ========================================================================

    fn load_variable(&self, scope: ScopeId, name: &str) -> Result<Value> {
        if let Some(value) = self.scopes.load(scope, name) {
            return Ok(value);
        }
        if self.scopes.rooted_at_global(scope) {
            // The global scope falls back to the ambient environment; a
            // total miss reads as undefined.
            return Ok(self.globals.get(name).cloned().unwrap_or(Value::Undefined));
        }
        Err(Error::Reference(name.to_string()))
    }

    fn assign_variable(&mut self, scope: ScopeId, name: &str, value: Value) -> Result<()> {
        if self.scopes.assign(scope, name, value.clone()) {
            return Ok(());
        }
        if self.scopes.rooted_at_global(scope) {
            // Assignment without a binding creates an ambient global.
            self.globals.insert(name.to_string(), value);
            return Ok(());
        }
        Err(Error::Reference(name.to_string()))
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Invokes a function value with an explicit receiver and an arguments
    /// array, returning its result.
    pub fn invoke(&mut self, function: Value, receiver: Value, arguments: Value) -> Result<Value> {
        let callable = match &function {
            Value::Function(callable) => callable.clone(),
            other => {
                return Err(Error::Type(format!(
                    "{} is not a function",
                    other.to_display_string()
                )))
            }
        };

        match callable.as_ref() {
            Callable::Closure(closure) => {
                trace!(
                    name = closure.name.as_deref().unwrap_or("<anonymous>"),
                    entry = closure.entry,
                    "invoking closure"
                );
                let child = self.scopes.push_child(closure.scope);
                self.scopes.define(child, "this", receiver);
                if let Some(name) = &closure.name {
                    // Named function expressions see themselves under their
                    // own name, without leaking it into the caller's scope.
                    self.scopes.define(child, name, function.clone());
                }
                let code = closure.code.clone();
                let entry = closure.entry as usize;
                self.run_frame(&code, entry, child, vec![arguments])
            }
            Callable::Native { func, .. } => {
                let argument_values = self.argument_slice(&arguments)?;
                func(&argument_values)
            }
        }
    }

    fn construct(&mut self, function: Value, arguments: Value) -> Result<Value> {
        let callable = match &function {
            Value::Function(callable) => callable.clone(),
            other => {
                return Err(Error::Type(format!(
                    "{} is not a constructor",
                    other.to_display_string()
                )))
            }
        };

        // A fresh object becomes `this`; a non-object return value is
        // discarded in its favor.
        let mut fresh = RuntimeObject::new_object();
        fresh.created_by = Some(callable);
        let instance = self.alloc(fresh);
        let result = self.invoke(function, Value::Object(instance), arguments)?;
        Ok(match result {
            Value::Object(_) => result,
            _ => Value::Object(instance),
        })
    }

    fn instance_of(&self, instance: &Value, constructor: &Value) -> Result<bool> {
        let callable = match constructor {
            Value::Function(callable) => callable,
            other => {
                return Err(Error::Type(format!(
                    "right-hand side of 'instanceof' is {}, not a function",
                    other.type_of()
                )))
            }
        };
        Ok(match instance {
            Value::Object(handle) => match &self.heap[*handle].created_by {
                Some(creator) => Arc::ptr_eq(creator, callable),
                None => false,
            },
            _ => false,
        })
    }

    fn argument_slice(&self, arguments: &Value) -> Result<Vec<Value>> {
        match arguments {
            Value::Object(handle) => Ok(self.heap[*handle].elements().to_vec()),
            other => Err(Error::Bytecode(format!(
                "CALL expects an arguments array, found {}",
                other.type_of()
            ))),
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    fn get_property(&self, object: &Value, key: &Value) -> Result<Value> {
        let key = property_key(key);
        match object {
            Value::Object(handle) => {
                Ok(self.heap[*handle].get(&key).unwrap_or(Value::Undefined))
            }
            Value::String(s) => Ok(string_property(s, &key)),
            Value::Function(callable) => Ok(match key.as_str() {
                "length" => Value::Number(callable.arity()),
                "name" => Value::String(callable.name().unwrap_or("").to_string()),
                _ => Value::Undefined,
            }),
            Value::Undefined | Value::Null => Err(Error::Type(format!(
                "cannot read property '{}' of {}",
                key,
                object.type_of()
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    fn set_property(&mut self, object: &Value, key: &Value, value: Value) -> Result<()> {
        match object {
            Value::Object(handle) => {
                let key = property_key(key);
                self.heap[*handle].set(&key, value);
                Ok(())
            }
            other => Err(Error::Type(format!(
                "cannot set property on {}",
                other.type_of()
            ))),
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Immediate decoding
// ============================================================================

fn read_f64(code: &[u8], pc: &mut usize) -> Result<f64> {
    let bytes: [u8; 8] = code
        .get(*pc..*pc + 8)
        .ok_or_else(|| Error::Bytecode(format!("truncated number immediate at {}", pc)))?
        .try_into()
        .unwrap();
    *pc += 8;
    Ok(f64::from_bits(u64::from_be_bytes(bytes)))
}

fn read_u32(code: &[u8], pc: &mut usize) -> Result<u32> {
    let bytes: [u8; 4] = code
        .get(*pc..*pc + 4)
        .ok_or_else(|| Error::Bytecode(format!("truncated address immediate at {}", pc)))?
        .try_into()
        .unwrap();
    *pc += 4;
    Ok(u32::from_be_bytes(bytes))
}

fn read_string(code: &[u8], pc: &mut usize) -> Result<String> {
    let mut units = Vec::new();
    loop {
        let pair = code
            .get(*pc..*pc + 2)
            .ok_or_else(|| Error::Bytecode(format!("unterminated string immediate at {}", pc)))?;
        *pc += 2;
        let unit = u16::from_be_bytes([pair[0], pair[1]]);
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    String::from_utf16(&units)
        .map_err(|_| Error::Bytecode("invalid UTF-16 in string immediate".to_string()))
}

// ============================================================================
// Stack helpers
// ============================================================================

fn pop(stack: &mut Vec<Value>) -> Result<Value> {
    stack.pop().ok_or_else(|| underflow("POP"))
}

fn pop_name(stack: &mut Vec<Value>, op: &str) -> Result<String> {
    match pop(stack)? {
        Value::String(s) => Ok(s),
        other => Err(Error::Bytecode(format!(
            "{} expects a string name, found {}",
            op,
            other.type_of()
        ))),
    }
}

fn underflow(op: &str) -> Error {
    Error::Bytecode(format!("operand stack underflow in {}", op))
}

fn jump_target(value: Value) -> Result<usize> {
    match value {
        Value::Number(n) if n >= 0.0 && n == n.trunc() => Ok(n as usize),
        other => Err(Error::Bytecode(format!(
            "invalid jump target {}",
            other.to_display_string()
        ))),
    }
}

fn binary(stack: &mut Vec<Value>, f: impl FnOnce(Value, Value) -> Result<Value>) -> Result<()> {
    let right = pop(stack)?;
    let left = pop(stack)?;
    let result = f(left, right)?;
    stack.push(result);
    Ok(())
}

fn numeric(stack: &mut Vec<Value>, f: fn(f64, f64) -> f64) -> Result<()> {
    binary(stack, |l, r| Ok(Value::Number(f(l.to_number(), r.to_number()))))
}

fn integer(stack: &mut Vec<Value>, f: fn(i32, i32) -> i32) -> Result<()> {
    binary(stack, |l, r| {
        Ok(Value::Number(f(
            to_int32(l.to_number()),
            to_int32(r.to_number()),
        ) as f64))
    })
}

// ============================================================================
// Coercions
// ============================================================================

/// ToUint32: truncate toward zero, then reduce modulo 2^32.
fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32
}

/// ToInt32: ToUint32 reinterpreted as signed.
fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

fn property_key(key: &Value) -> String {
    match key {
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => s.clone(),
        other => other.to_display_string(),
    }
}

fn string_property(s: &str, key: &str) -> Value {
    if key == "length" {
        return Value::Number(s.encode_utf16().count() as f64);
    }
    if let Ok(index) = key.parse::<usize>() {
        return match s.encode_utf16().nth(index) {
            Some(unit) => Value::String(String::from_utf16_lossy(&[unit])),
            None => Value::Undefined,
        };
    }
    Value::Undefined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int32_wrapping() {
        assert_eq!(to_int32(0.0), 0);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_int32(4294967296.0), 0);
        assert_eq!(to_int32(2147483648.0), -2147483648);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_int32(f64::INFINITY), 0);
    }

    #[test]
    fn test_to_uint32() {
        assert_eq!(to_uint32(-1.0), 4294967295);
        assert_eq!(to_uint32(3.7), 3);
        assert_eq!(to_uint32(-3.7), 4294967293);
    }

    #[test]
    fn test_read_string_round_trip() {
        let bytes = [0x00, 0x68, 0x00, 0x69, 0x00, 0x00, 0xFF];
        let mut pc = 0;
        assert_eq!(read_string(&bytes, &mut pc).unwrap(), "hi");
        assert_eq!(pc, 6);
    }

    #[test]
    fn test_read_string_missing_terminator() {
        let bytes = [0x00, 0x68];
        let mut pc = 0;
        assert!(read_string(&bytes, &mut pc).is_err());
    }

    #[test]
    fn test_string_property() {
        assert_eq!(string_property("hello", "length"), Value::Number(5.0));
        assert_eq!(string_property("hello", "1"), Value::String("e".to_string()));
        assert_eq!(string_property("hello", "9"), Value::Undefined);
        assert_eq!(string_property("hello", "x"), Value::Undefined);
    }

    #[test]
    fn test_jump_target_validation() {
        assert_eq!(jump_target(Value::Number(8.0)).unwrap(), 8);
        assert!(jump_target(Value::Number(-1.0)).is_err());
        assert!(jump_target(Value::Number(1.5)).is_err());
        assert!(jump_target(Value::Null).is_err());
    }
}

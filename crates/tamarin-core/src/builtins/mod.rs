//! The default ambient environment.
//!
//! These are the host bindings a fresh [`crate::Engine`] installs into the
//! global environment. Everything is a flat binding; there is no prototype
//! machinery behind them. Embedders can add their own natives through
//! [`crate::Engine::register_native`].

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::runtime::{Callable, NativeFn, Value};
use crate::Result;

/// Installs the default bindings into an ambient environment.
pub fn install(globals: &mut FxHashMap<String, Value>) {
    globals.insert("NaN".to_string(), Value::Number(f64::NAN));
    globals.insert("Infinity".to_string(), Value::Number(f64::INFINITY));
    globals.insert("undefined".to_string(), Value::Undefined);

    native(globals, "print", -1, native_print);
    native(globals, "parseInt", 2, native_parse_int);
    native(globals, "parseFloat", 1, native_parse_float);
    native(globals, "isNaN", 1, native_is_nan);
    native(globals, "isFinite", 1, native_is_finite);
    native(globals, "String", 1, native_string);
    native(globals, "Number", 1, native_number);
    native(globals, "Boolean", 1, native_boolean);

    native(globals, "Math_abs", 1, |args| Ok(num(args, 0).abs().into_value()));
    native(globals, "Math_floor", 1, |args| Ok(num(args, 0).floor().into_value()));
    native(globals, "Math_ceil", 1, |args| Ok(num(args, 0).ceil().into_value()));
    native(globals, "Math_round", 1, |args| {
        // Halves round toward positive infinity.
        Ok((num(args, 0) + 0.5).floor().into_value())
    });
    native(globals, "Math_sqrt", 1, |args| Ok(num(args, 0).sqrt().into_value()));
    native(globals, "Math_pow", 2, |args| {
        Ok(num(args, 0).powf(num(args, 1)).into_value())
    });
    native(globals, "Math_max", -1, native_max);
    native(globals, "Math_min", -1, native_min);
}

fn native(globals: &mut FxHashMap<String, Value>, name: &str, arity: i32, func: NativeFn) {
    globals.insert(
        name.to_string(),
        Value::Function(Arc::new(Callable::Native {
            name: name.to_string(),
            arity,
            func,
        })),
    );
}

trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

fn num(args: &[Value], index: usize) -> f64 {
    args.get(index).map(Value::to_number).unwrap_or(f64::NAN)
}

fn native_print(args: &[Value]) -> Result<Value> {
    let line: Vec<String> = args.iter().map(Value::to_display_string).collect();
    println!("{}", line.join(" "));
    Ok(Value::Undefined)
}

fn native_parse_int(args: &[Value]) -> Result<Value> {
    let text = args
        .first()
        .map(Value::to_display_string)
        .unwrap_or_default();
    let mut t = text.trim();

    let mut sign = 1.0;
    if let Some(rest) = t.strip_prefix('-') {
        sign = -1.0;
        t = rest;
    } else if let Some(rest) = t.strip_prefix('+') {
        t = rest;
    }

    let mut radix = match args.get(1) {
        Some(Value::Undefined) | None => 0,
        Some(v) => v.to_number() as u32,
    };
    if radix == 16 || (radix == 0 && (t.starts_with("0x") || t.starts_with("0X"))) {
        t = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }

    let digits: String = t
        .chars()
        .take_while(|c| c.to_digit(radix).is_some())
        .collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
        value = value * radix as f64 + c.to_digit(radix).unwrap() as f64;
    }
    Ok(Value::Number(sign * value))
}

fn native_parse_float(args: &[Value]) -> Result<Value> {
    let text = args
        .first()
        .map(Value::to_display_string)
        .unwrap_or_default();
    let t = text.trim();
    // Longest numeric prefix.
    let mut end = 0;
    for i in (0..=t.len()).rev() {
        if t.is_char_boundary(i) && t[..i].parse::<f64>().is_ok() {
            end = i;
            break;
        }
    }
    if end == 0 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(t[..end].parse::<f64>().unwrap()))
}

fn native_is_nan(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(num(args, 0).is_nan()))
}

fn native_is_finite(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(num(args, 0).is_finite()))
}

fn native_string(args: &[Value]) -> Result<Value> {
    Ok(Value::String(
        args.first().map(Value::to_display_string).unwrap_or_default(),
    ))
}

fn native_number(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(
        args.first().map(Value::to_number).unwrap_or(0.0),
    ))
}

fn native_boolean(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(
        args.first().map(Value::to_boolean).unwrap_or(false),
    ))
}

fn native_max(args: &[Value]) -> Result<Value> {
    let mut best = f64::NEG_INFINITY;
    for arg in args {
        let n = arg.to_number();
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        best = best.max(n);
    }
    Ok(Value::Number(best))
}

fn native_min(args: &[Value]) -> Result<Value> {
    let mut best = f64::INFINITY;
    for arg in args {
        let n = arg.to_number();
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        best = best.min(n);
    }
    Ok(Value::Number(best))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_populates_globals() {
        let mut globals = FxHashMap::default();
        install(&mut globals);
        assert!(globals.contains_key("parseInt"));
        assert!(globals.contains_key("Math_floor"));
        assert!(matches!(globals["NaN"], Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_parse_int() {
        let n = |s: &str| {
            native_parse_int(&[Value::String(s.to_string())])
                .unwrap()
                .to_number()
        };
        assert_eq!(n("42"), 42.0);
        assert_eq!(n("  -7  "), -7.0);
        assert_eq!(n("12px"), 12.0);
        assert_eq!(n("0x10"), 16.0);
        assert!(n("px").is_nan());

        let hex = native_parse_int(&[
            Value::String("ff".to_string()),
            Value::Number(16.0),
        ])
        .unwrap();
        assert_eq!(hex.to_number(), 255.0);
    }

    #[test]
    fn test_parse_float() {
        let n = |s: &str| {
            native_parse_float(&[Value::String(s.to_string())])
                .unwrap()
                .to_number()
        };
        assert_eq!(n("3.14"), 3.14);
        assert_eq!(n("2.5rem"), 2.5);
        assert!(n("rem").is_nan());
    }

    #[test]
    fn test_max_min() {
        let args = [Value::Number(1.0), Value::Number(3.0), Value::Number(2.0)];
        assert_eq!(native_max(&args).unwrap().to_number(), 3.0);
        assert_eq!(native_min(&args).unwrap().to_number(), 1.0);
        assert_eq!(native_max(&[]).unwrap().to_number(), f64::NEG_INFINITY);
    }
}

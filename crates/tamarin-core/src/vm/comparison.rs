//! Equality and relational comparison.
//!
//! Coercing equality follows the abstract equality algorithm of the ES3
//! lineage: same-type comparisons are strict, `null == undefined`,
//! number/string pairs compare numerically, and booleans coerce to
//! numbers. Objects compare by heap handle (reference identity).

use crate::runtime::Value;

/// Strict equality (`===`): no coercion, NaN unequal to itself, objects by
/// reference.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    a == b
}

/// Coercing equality (`==`).
pub fn abstract_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        // Same-type comparisons fall through to strict equality.
        (Value::Undefined, Value::Undefined)
        | (Value::Null, Value::Null)
        | (Value::Boolean(_), Value::Boolean(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_))
        | (Value::Object(_), Value::Object(_))
        | (Value::Function(_), Value::Function(_)) => strict_equals(a, b),

        // null == undefined
        (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => true,

        // Number/string pairs compare numerically.
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            let parsed = Value::String(s.clone()).to_number();
            if n.is_nan() || parsed.is_nan() {
                false
            } else {
                *n == parsed
            }
        }

        // Booleans coerce to numbers and the comparison restarts.
        (Value::Boolean(flag), other) | (other, Value::Boolean(flag)) => {
            let n = if *flag { 1.0 } else { 0.0 };
            abstract_equals(&Value::Number(n), other)
        }

        // Object-to-primitive conversion is not modelled; such pairs
        // compare unequal.
        _ => false,
    }
}

/// Relational comparison (`<`, `<=`, `>`, `>=`). Two strings compare
/// lexicographically by code unit; any other pair compares numerically,
/// with NaN making every relation false.
pub fn relational(
    a: &Value,
    b: &Value,
    numeric: fn(f64, f64) -> bool,
    lexical: fn(&str, &str) -> bool,
) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => lexical(x, y),
        _ => numeric(a.to_number(), b.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_equals_undefined_loosely() {
        assert!(abstract_equals(&Value::Null, &Value::Undefined));
        assert!(!strict_equals(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_number_string_coercion() {
        assert!(abstract_equals(
            &Value::Number(5.0),
            &Value::String("5".to_string())
        ));
        assert!(!abstract_equals(
            &Value::Number(5.0),
            &Value::String("5x".to_string())
        ));
    }

    #[test]
    fn test_boolean_coerces_to_number() {
        assert!(abstract_equals(
            &Value::Boolean(true),
            &Value::String("1".to_string())
        ));
        assert!(abstract_equals(&Value::Boolean(false), &Value::Number(0.0)));
    }

    #[test]
    fn test_nan_comparisons() {
        let nan = Value::Number(f64::NAN);
        assert!(!abstract_equals(&nan, &nan));
        assert!(!strict_equals(&nan, &nan));
        assert!(!relational(&nan, &Value::Number(1.0), |a, b| a < b, |a, b| a < b));
    }

    #[test]
    fn test_objects_compare_by_handle() {
        assert!(abstract_equals(&Value::Object(2), &Value::Object(2)));
        assert!(!abstract_equals(&Value::Object(2), &Value::Object(3)));
    }

    #[test]
    fn test_string_relational_is_lexical() {
        let a = Value::String("apple".to_string());
        let b = Value::String("banana".to_string());
        assert!(relational(&a, &b, |x, y| x < y, |x, y| x < y));
        // Mixed pairs go numeric: "10" < 9 is false.
        assert!(!relational(
            &Value::String("10".to_string()),
            &Value::Number(9.0),
            |x, y| x < y,
            |x, y| x < y
        ));
    }
}

//! End-to-end tests over the full compile+execute pipeline.

use tamarin_core::{Engine, Error, Value};

fn eval(source: &str) -> Value {
    Engine::new()
        .eval(source)
        .unwrap_or_else(|e| panic!("eval failed for {:?}: {}", source, e))
}

fn eval_number(source: &str) -> f64 {
    match eval(source) {
        Value::Number(n) => n,
        other => panic!("expected number from {:?}, got {:?}", source, other),
    }
}

fn eval_string(source: &str) -> String {
    match eval(source) {
        Value::String(s) => s,
        other => panic!("expected string from {:?}, got {:?}", source, other),
    }
}

fn eval_bool(source: &str) -> bool {
    match eval(source) {
        Value::Boolean(b) => b,
        other => panic!("expected boolean from {:?}, got {:?}", source, other),
    }
}

// ============================================================================
// Completion value and script shape
// ============================================================================

#[test]
fn test_final_expression_is_result() {
    assert_eq!(eval_number("var x = 1; x + 2;"), 3.0);
}

#[test]
fn test_script_without_trailing_expression_is_undefined() {
    assert!(eval("var x = 1;").is_undefined());
    assert!(eval("").is_undefined());
}

#[test]
fn test_top_level_return() {
    assert_eq!(eval_number("var x = 1; return 99; 5;"), 99.0);
}

// ============================================================================
// Arithmetic, strings, coercion
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval_number("5 + 3;"), 8.0);
    assert_eq!(eval_number("10 - 4;"), 6.0);
    assert_eq!(eval_number("6 * 7;"), 42.0);
    assert_eq!(eval_number("10 / 4;"), 2.5);
    assert_eq!(eval_number("17 % 5;"), 2.0);
    assert_eq!(eval_number("-7 % 3;"), -1.0);
    assert_eq!(eval_number("2 ** 10;"), 1024.0);
}

#[test]
fn test_string_concatenation_coerces_numbers() {
    assert_eq!(eval_string("'a' + 1;"), "a1");
    assert_eq!(eval_string("1 + 'a';"), "1a");
    assert_eq!(eval_string("'' + 1.5;"), "1.5");
    assert_eq!(eval_string("'' + true;"), "true");
    assert_eq!(eval_string("'' + null;"), "null");
}

#[test]
fn test_numeric_coercion_of_strings() {
    assert_eq!(eval_number("'6' * '7';"), 42.0);
    assert_eq!(eval_number("'10' - 1;"), 9.0);
    assert!(eval_number("'x' - 1;").is_nan());
}

#[test]
fn test_unary_operators() {
    assert_eq!(eval_number("-5;"), -5.0);
    assert_eq!(eval_number("+5;"), 5.0);
    assert_eq!(eval_bool("!0;"), true);
    assert_eq!(eval_bool("!'x';"), false);
    assert_eq!(eval_number("~5;"), -6.0);
    assert!(eval("void 42;").is_undefined());
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(eval_number("5 & 3;"), 1.0);
    assert_eq!(eval_number("5 | 3;"), 7.0);
    assert_eq!(eval_number("5 ^ 3;"), 6.0);
    assert_eq!(eval_number("4 << 1;"), 8.0);
    assert_eq!(eval_number("-8 >> 1;"), -4.0);
    assert_eq!(eval_number("-1 >>> 28;"), 15.0);
}

// ============================================================================
// Equality and comparison
// ============================================================================

#[test]
fn test_equality() {
    assert!(eval_bool("1 == '1';"));
    assert!(!eval_bool("1 === '1';"));
    assert!(eval_bool("null == undefined;"));
    assert!(!eval_bool("null === undefined;"));
    assert!(eval_bool("NaN !== NaN;"));
    assert!(eval_bool("1 !== 2;"));
    assert!(!eval_bool("NaN == NaN;"));
}

#[test]
fn test_relational() {
    assert!(eval_bool("1 < 2;"));
    assert!(eval_bool("2 >= 2;"));
    assert!(eval_bool("'apple' < 'banana';"));
    assert!(eval_bool("'10' < 9;") == false);
}

#[test]
fn test_typeof() {
    assert_eq!(eval_string("typeof 42;"), "number");
    assert_eq!(eval_string("typeof 'x';"), "string");
    assert_eq!(eval_string("typeof true;"), "boolean");
    assert_eq!(eval_string("typeof undefined;"), "undefined");
    assert_eq!(eval_string("typeof null;"), "object");
    assert_eq!(eval_string("typeof {};"), "object");
    assert_eq!(eval_string("typeof function () {};"), "function");
}

#[test]
fn test_typeof_undeclared_is_undefined() {
    assert_eq!(eval_string("typeof never_declared_anywhere;"), "undefined");
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_else() {
    assert_eq!(eval_number("var x; if (true) { x = 1; } else { x = 2; } x;"), 1.0);
    assert_eq!(eval_number("var x; if (0) { x = 1; } else { x = 2; } x;"), 2.0);
}

#[test]
fn test_while_loop() {
    assert_eq!(
        eval_number("var sum = 0; var i = 1; while (i <= 5) { sum += i; i++; } sum;"),
        15.0
    );
}

#[test]
fn test_for_loop_accumulates_string() {
    assert_eq!(
        eval_string("var s = ''; for (var i = 0; i < 3; i++) s += i; s;"),
        "012"
    );
}

#[test]
fn test_for_loop_initially_false_test_skips_body() {
    assert_eq!(eval_number("var n = 0; for (var i = 5; i < 5; i++) n++; n;"), 0.0);
}

#[test]
fn test_do_while_runs_at_least_once() {
    assert_eq!(eval_number("var n = 0; do { n++; } while (false); n;"), 1.0);
}

#[test]
fn test_break_and_continue() {
    assert_eq!(
        eval_string(
            "var s = '';
             for (var i = 0; i < 5; i++) {
                 if (i === 2) continue;
                 if (i === 4) break;
                 s += i;
             }
             s;"
        ),
        "013"
    );
}

#[test]
fn test_nested_loop_break_targets_innermost() {
    assert_eq!(
        eval_number(
            "var n = 0;
             for (var i = 0; i < 3; i++) {
                 while (true) { break; }
                 n++;
             }
             n;"
        ),
        3.0
    );
}

#[test]
fn test_ternary() {
    assert_eq!(eval_string("true ? 'yes' : 'no';"), "yes");
    assert_eq!(eval_string("'' ? 'yes' : 'no';"), "no");
}

#[test]
fn test_switch_matches_strictly() {
    assert_eq!(
        eval_string(
            "var r = '';
             switch ('1') { case 1: r = 'number'; break; case '1': r = 'string'; break; }
             r;"
        ),
        "string"
    );
}

#[test]
fn test_switch_fall_through() {
    assert_eq!(
        eval_string(
            "var s = '';
             switch (2) {
                 case 1: s += 'a'; break;
                 case 2: s += 'b';
                 case 3: s += 'c';
                 default: s += 'd';
             }
             s;"
        ),
        "bcd"
    );
}

#[test]
fn test_switch_default_when_nothing_matches() {
    assert_eq!(
        eval_string("var s = ''; switch (9) { case 1: s = 'a'; break; default: s = 'dflt'; } s;"),
        "dflt"
    );
}

#[test]
fn test_switch_without_match_or_default() {
    assert_eq!(eval_number("var x = 1; switch (9) { case 1: x = 2; } x;"), 1.0);
}

// ============================================================================
// Short-circuit evaluation
// ============================================================================

#[test]
fn test_and_short_circuits() {
    assert_eq!(
        eval_bool(
            "var called = false;
             function touch() { called = true; return true; }
             false && touch();
             called;"
        ),
        false
    );
}

#[test]
fn test_or_short_circuits() {
    assert_eq!(
        eval_bool(
            "var called = false;
             function touch() { called = true; return false; }
             true || touch();
             called;"
        ),
        false
    );
}

#[test]
fn test_logical_operators_preserve_values() {
    assert_eq!(eval_number("0 || 42;"), 42.0);
    assert_eq!(eval_string("'a' || 'b';"), "a");
    assert_eq!(eval_number("1 && 2;"), 2.0);
    assert_eq!(eval_number("0 && 2;"), 0.0);
}

// ============================================================================
// Variables, hoisting, scope
// ============================================================================

#[test]
fn test_hoisting_binds_before_initialization() {
    assert_eq!(eval_string("var t = typeof x; var x = 1; t;"), "undefined");
}

#[test]
fn test_hoisting_inside_function() {
    assert_eq!(
        eval_string(
            "function probe() { var t = typeof local; var local = 1; return t; }
             probe();"
        ),
        "undefined"
    );
}

#[test]
fn test_var_is_function_scoped_not_block_scoped() {
    assert_eq!(eval_number("if (true) { var x = 7; } x;"), 7.0);
}

#[test]
fn test_assignment_without_declaration_creates_global() {
    assert_eq!(eval_number("function f() { leak = 5; } f(); leak;"), 5.0);
}

#[test]
fn test_multiple_declarators() {
    assert_eq!(eval_number("var a = 1, b = 2, c; c = a + b; c;"), 3.0);
}

#[test]
fn test_compound_assignment_non_commutative() {
    assert_eq!(eval_number("var x = 10; x -= 4; x;"), 6.0);
    assert_eq!(eval_number("var x = 12; x /= 4; x;"), 3.0);
    assert_eq!(eval_number("var x = 17; x %= 5; x;"), 2.0);
    assert_eq!(eval_number("var x = 1; x <<= 4; x;"), 16.0);
}

#[test]
fn test_update_expressions() {
    assert_eq!(eval_number("var x = 5; var y = x++; y * 10 + x;"), 56.0);
    assert_eq!(eval_number("var x = 5; var y = ++x; y * 10 + x;"), 66.0);
    assert_eq!(eval_number("var x = 5; var y = x--; y * 10 + x;"), 54.0);
    assert_eq!(eval_number("var o = {n: 1}; o.n++; o.n;"), 2.0);
    assert_eq!(eval_number("var a = [1]; a[0]++ + a[0];"), 3.0);
}

#[test]
fn test_sequence_expression_yields_last() {
    assert_eq!(eval_number("var x = (1, 2, 3); x;"), 3.0);
}

// ============================================================================
// Functions and closures
// ============================================================================

#[test]
fn test_function_call_with_arguments() {
    assert_eq!(eval_number("function add(a, b) { return a + b; } add(2, 3);"), 5.0);
}

#[test]
fn test_missing_arguments_are_undefined() {
    assert_eq!(eval_string("function f(a, b) { return typeof b; } f(1);"), "undefined");
}

#[test]
fn test_extra_arguments_are_ignored() {
    assert_eq!(eval_number("function f(a) { return a; } f(1, 2, 3);"), 1.0);
}

#[test]
fn test_function_without_return_yields_undefined() {
    assert!(eval("function f() { var x = 1; } f();").is_undefined());
}

#[test]
fn test_recursion_through_declared_name() {
    assert_eq!(
        eval_number("function fact(n) { return n < 2 ? 1 : n * fact(n - 1); } fact(5);"),
        120.0
    );
}

#[test]
fn test_named_function_expression_self_reference() {
    assert_eq!(
        eval_number("var f = function g(n) { return n < 1 ? 0 : n + g(n - 1); }; f(4);"),
        10.0
    );
}

#[test]
fn test_named_function_expression_name_not_visible_outside() {
    assert_eq!(eval_string("var f = function g() { return 1; }; typeof g;"), "undefined");
}

#[test]
fn test_closure_outlives_creating_frame() {
    assert_eq!(
        eval_number(
            "function counter() {
                 var n = 0;
                 return function () { n += 1; return n; };
             }
             var tick = counter();
             tick(); tick(); tick();"
        ),
        3.0
    );
}

#[test]
fn test_two_closures_share_one_binding() {
    assert_eq!(
        eval_number(
            "var bump, read;
             function make() {
                 var n = 0;
                 bump = function () { n += 1; };
                 read = function () { return n; };
             }
             make();
             bump(); bump();
             read();"
        ),
        2.0
    );
}

#[test]
fn test_iife_captures_loop_variable() {
    assert_eq!(
        eval_number(
            "var a = [];
             for (var i = 0; i < 3; i++)
                 a[i] = (function (j) { return function () { return j; }; })(i);
             a[0]() + a[1]() + a[2]();"
        ),
        3.0
    );
}

#[test]
fn test_function_arity_introspection() {
    assert_eq!(eval_number("function f(a, b, c) {} f.length;"), 3.0);
    assert_eq!(eval_number("var f = function (a, b) {}; f.length;"), 2.0);
    // Only named function expressions carry a display name.
    assert_eq!(eval_string("var f = function g() {}; f.name;"), "g");
}

#[test]
fn test_functions_are_first_class() {
    assert_eq!(
        eval_number(
            "function apply(f, x) { return f(x); }
             apply(function (n) { return n * 2; }, 21);"
        ),
        42.0
    );
}

// ============================================================================
// Objects, arrays, properties
// ============================================================================

#[test]
fn test_object_literal_and_member_access() {
    assert_eq!(eval_number("var o = {a: 1, b: 2}; o.a + o.b;"), 3.0);
    assert_eq!(eval_number("var o = {'with space': 5}; o['with space'];"), 5.0);
}

#[test]
fn test_compound_member_assignment() {
    assert_eq!(eval_number("var o = {a: 1}; o.a += 10; o.a;"), 11.0);
}

#[test]
fn test_numeric_keys_canonicalize() {
    assert_eq!(eval_string("var o = {}; o[1] = 'one'; o['1'];"), "one");
}

#[test]
fn test_nested_objects() {
    assert_eq!(eval_number("var o = {inner: {deep: 9}}; o.inner.deep;"), 9.0);
}

#[test]
fn test_array_literal_indexing_and_length() {
    assert_eq!(eval_number("[1, 2, 3].length;"), 3.0);
    assert_eq!(eval_number("[1, 2, 3][0];"), 1.0);
    assert_eq!(eval_number("var a = []; a[2] = 1; a.length;"), 3.0);
}

#[test]
fn test_arrays_are_references() {
    assert_eq!(
        eval_number("function push9(a) { a[0] = 9; } var xs = [1]; push9(xs); xs[0];"),
        9.0
    );
}

#[test]
fn test_delete_and_in() {
    assert!(eval_bool("var o = {a: 1}; 'a' in o;"));
    assert!(!eval_bool("var o = {a: 1}; 'b' in o;"));
    assert!(!eval_bool("var o = {a: 1}; delete o.a; 'a' in o;"));
    assert!(eval_bool("var a = [1, 2]; 0 in a;"));
    assert!(!eval_bool("var a = [1, 2]; 5 in a;"));
}

#[test]
fn test_string_properties() {
    assert_eq!(eval_number("'hello'.length;"), 5.0);
    assert_eq!(eval_string("'hello'[1];"), "e");
    assert_eq!(eval_number("var s = 'abc'; s.length + 'xy'.length;"), 5.0);
}

#[test]
fn test_this_in_method_call() {
    assert_eq!(
        eval_number("var o = {v: 7, get: function () { return this.v; }}; o.get();"),
        7.0
    );
}

#[test]
fn test_this_is_null_in_plain_call() {
    assert!(eval_bool("function f() { return this === null; } f();"));
}

// ============================================================================
// Constructors
// ============================================================================

#[test]
fn test_new_binds_fresh_object_as_this() {
    assert_eq!(
        eval_number(
            "function Point(x, y) { this.x = x; this.y = y; }
             var p = new Point(1, 2);
             p.x + p.y;"
        ),
        3.0
    );
}

#[test]
fn test_instanceof_direct_instance() {
    assert!(eval_bool(
        "function Point() {} var p = new Point(); p instanceof Point;"
    ));
    assert!(!eval_bool(
        "function A() {} function B() {} new A() instanceof B;"
    ));
}

#[test]
fn test_constructor_returning_object_wins() {
    assert_eq!(eval_number("function F() { return {tag: 9}; } new F().tag;"), 9.0);
}

#[test]
fn test_constructor_returning_primitive_is_ignored() {
    assert_eq!(
        eval_number("function F() { this.tag = 4; return 123; } new F().tag;"),
        4.0
    );
}

// ============================================================================
// Builtins (ambient environment)
// ============================================================================

#[test]
fn test_builtin_parse_and_classify() {
    assert_eq!(eval_number("parseInt('42');"), 42.0);
    assert_eq!(eval_number("parseInt('ff', 16);"), 255.0);
    assert_eq!(eval_number("parseFloat('3.5em');"), 3.5);
    assert!(eval_bool("isNaN(NaN);"));
    assert!(!eval_bool("isNaN(42);"));
    assert!(eval_bool("isFinite(1);"));
    assert!(!eval_bool("isFinite(Infinity);"));
}

#[test]
fn test_builtin_conversions() {
    assert_eq!(eval_string("String(12);"), "12");
    assert_eq!(eval_number("Number('12');"), 12.0);
    assert!(eval_bool("Boolean('x');"));
}

#[test]
fn test_builtin_math() {
    assert_eq!(eval_number("Math_abs(-5);"), 5.0);
    assert_eq!(eval_number("Math_floor(3.7);"), 3.0);
    assert_eq!(eval_number("Math_ceil(3.2);"), 4.0);
    assert_eq!(eval_number("Math_pow(2, 3);"), 8.0);
    assert_eq!(eval_number("Math_max(1, 9, 4);"), 9.0);
    assert_eq!(eval_number("Math_min(1, 9, 4);"), 1.0);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unsupported_syntax() {
    for source in [
        "throw 1;",
        "try { f(); } finally {}",
        "for (var k in o) {}",
        "loop: while (1) break;",
    ] {
        let err = Engine::new().eval(source).unwrap_err();
        assert!(
            matches!(err, Error::Unsupported(_)),
            "{:?} should be unsupported, got {:?}",
            source,
            err
        );
    }
}

#[test]
fn test_calling_non_function_is_type_error() {
    assert!(matches!(
        Engine::new().eval("var x = 1; x();"),
        Err(Error::Type(_))
    ));
}

#[test]
fn test_property_of_nullish_is_type_error() {
    assert!(matches!(
        Engine::new().eval("var o; o.a;"),
        Err(Error::Type(_))
    ));
    assert!(matches!(
        Engine::new().eval("null.a;"),
        Err(Error::Type(_))
    ));
}

#[test]
fn test_parse_error_is_syntax_error() {
    assert!(matches!(
        Engine::new().eval("var = ;"),
        Err(Error::Syntax(_))
    ));
}

// ============================================================================
// Bytecode surface
// ============================================================================

#[test]
fn test_compiled_program_is_relocatable_into_a_vm() {
    use tamarin_core::Vm;

    let program = Engine::compile("var x = 20; x * 2 + 2;").unwrap();
    let mut vm = Vm::new();
    assert_eq!(vm.run(&program).unwrap(), Value::Number(42.0));
}

#[test]
fn test_compiled_program_disassembles() {
    let program = Engine::compile("1 + 2;").unwrap();
    let listing = tamarin_core::compiler::disasm::disassemble(&program.code).unwrap();
    assert!(listing.contains("ADD"));
    assert!(listing.contains("RET"));
}

#[test]
fn test_deep_recursion_within_reason() {
    assert_eq!(
        eval_number("function sum(n) { return n === 0 ? 0 : n + sum(n - 1); } sum(200);"),
        20100.0
    );
}

//! End-to-end evaluation suite: source in, value out.

use marmoset_rt::values::Value;
use marmoset_rt::{eval_program, Environment};

fn run(source: &str) -> Value {
    let program = marmoset_compiler::parse_program(source)
        .unwrap_or_else(|errors| panic!("{:?}: parse errors: {:?}", source, errors));
    let env = Environment::new_root();
    eval_program(&program, &env)
}

fn assert_int(source: &str, expected: i64) {
    assert_eq!(run(source), Value::Int(expected), "source: {:?}", source);
}

fn assert_bool(source: &str, expected: bool) {
    assert_eq!(run(source), Value::Bool(expected), "source: {:?}", source);
}

fn assert_string(source: &str, expected: &str) {
    assert_eq!(
        run(source),
        Value::String(expected.to_string()),
        "source: {:?}",
        source
    );
}

fn assert_error_contains(source: &str, needle: &str) {
    let out = run(source);
    let Value::Error(err) = out else {
        panic!("{:?}: expected error, got {:?}", source, out);
    };
    assert!(
        err.message.contains(needle),
        "{:?}: error {:?} does not mention {:?}",
        source,
        err.message,
        needle
    );
}

#[test]
fn integer_expressions() {
    assert_int("5", 5);
    assert_int("let x = 5; let y = 10; x + y;", 15);
    assert_int("2 * (3 + 4)", 14);
    assert_int("7 / 2", 3);
    assert_int("7 % 3", 1);
    assert_int("2 ** 8", 256);
    assert_int("-5 + 10", 5);
    assert_int("0x10 + 0b100", 20);
}

#[test]
fn float_expressions() {
    assert_eq!(run("2.5 + 1"), Value::Float(3.5));
    assert_eq!(run("1 / 2.0"), Value::Float(0.5));
    assert_eq!(run("2 ** 0.5"), Value::Float(2f64.powf(0.5)));
    assert_bool("1.5 < 2", true);
}

#[test]
fn division_by_zero_is_an_error() {
    assert_error_contains("1 / 0", "division by zero");
    assert_error_contains("1 % 0", "division by zero");
}

#[test]
fn boolean_and_comparison() {
    assert_bool("true", true);
    assert_bool("1 < 2", true);
    assert_bool("1 >= 2", false);
    assert_bool("1 == 1", true);
    assert_bool("1 != 1", false);
    assert_bool("!0", true);
    assert_bool("!1", false);
    assert_bool("!\"\"", true);
}

#[test]
fn logical_operators_short_circuit() {
    assert_bool("1 && 2", true);
    assert_bool("0 || \"\"", false);
    // `false && expr` must not evaluate expr
    assert_int(
        "let x = 0; let f = fn() { x = 1; return true; }; false && f(); x;",
        0,
    );
    assert_int(
        "let x = 0; let f = fn() { x = 1; return true; }; true || f(); x;",
        0,
    );
    // and the right side runs when it has to
    assert_int(
        "let x = 0; let f = fn() { x = 1; return true; }; true && f(); x;",
        1,
    );
}

#[test]
fn string_operations() {
    assert_string("\"foo\" + \"bar\"", "foobar");
    assert_string("\"ab\" * 3", "ababab");
    assert_bool("\"abc\" == \"abc\"", true);
    assert_bool("\"abc\" != \"abd\"", false);
    assert_error_contains("\"abc\" - \"c\"", "unknown operator: string - string");
}

#[test]
fn regexp_matching() {
    assert_bool("let x = \"Steve\"; x ~= /steve/i;", true);
    assert_bool("let x = \"Steve\"; x ~= /steve/;", false);
    assert_bool("let x = \"Steve\"; x !~ /steve/;", true);
    assert_bool("\"hello world\" ~= \"w.rld\"", true);
}

#[test]
fn ranges() {
    assert_eq!(
        run("1 .. 4"),
        Value::new_array(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Int(4)
        ])
    );
    assert_eq!(
        run("3 .. 1"),
        Value::new_array(vec![Value::Int(3), Value::Int(2), Value::Int(1)])
    );
}

#[test]
fn if_and_ternary() {
    assert_int("if (true) { 10 }", 10);
    assert_int("if (false) { 10 } else { 20 }", 20);
    assert_eq!(run("if (false) { 10 }"), Value::Null);
    assert_int("let x = 5; x > 0 ? x : -x;", 5);
    assert_int("let x = -5; x > 0 ? x : -x;", 5);
}

#[test]
fn let_const_and_assignment() {
    assert_int("let a = 5; a = 6; a;", 6);
    assert_int("let a = 5; a += 3; a;", 8);
    assert_int("let a = 5; a -= 3; a;", 2);
    assert_int("let a = 5; a *= 3; a;", 15);
    assert_int("let a = 6; a /= 3; a;", 2);
    assert_string("let s = \"a\"; s += \"b\"; s;", "ab");
    assert_error_contains("const x = 1; x = 2;", "assignment to constant: x");
    assert_error_contains("const x = 1; let x = 2;", "assignment to constant: x");
    assert_error_contains("y = 5;", "identifier not found: y");
    assert_error_contains("foobar;", "identifier not found: foobar");
}

#[test]
fn postfix_updates_and_yields_the_new_value() {
    assert_int("let a = 5; a++;", 6);
    assert_int("let a = 5; a++; a;", 6);
    assert_int("let a = 5; a--; a;", 4);
    assert_eq!(run("let f = 1.5; f++; f;"), Value::Float(2.5));
    assert_error_contains("let s = \"x\"; s++;", "unknown operator: string++");
}

#[test]
fn for_loops() {
    assert_int("let i = 0; for (i < 5) { i = i + 1; } i;", 5);
    assert_int(
        "let f = fn() { let i = 0; for (true) { i = i + 1; if (i == 3) { return i; } } }; f();",
        3,
    );
}

#[test]
fn foreach_over_arrays() {
    assert_string(
        "let out = \"\"; foreach i, v in [10, 20, 30] { out = out + string(i) + \":\" + string(v) + \"\\n\"; } out;",
        "0:10\n1:20\n2:30\n",
    );
    assert_int("let sum = 0; foreach v in [1, 2, 3] { sum += v; } sum;", 6);
}

#[test]
fn foreach_over_strings_and_hashes_and_ranges() {
    assert_string(
        "let out = \"\"; foreach c in \"abc\" { out = c + out; } out;",
        "cba",
    );
    assert_int(
        "let h = {\"a\": 1, \"b\": 2}; let total = 0; foreach k, v in h { total += v; } total;",
        3,
    );
    assert_int("let sum = 0; foreach v in 1 .. 4 { sum += v; } sum;", 10);
    assert_error_contains("foreach v in 42 { v }", "integer object is not iterable");
}

#[test]
fn loop_bodies_get_a_fresh_scope_each_iteration() {
    // a const declared in the body must not collide with the previous
    // iteration's binding
    assert_int(
        "let total = 0; foreach v in [1, 2, 3] { const sq = v * v; total += sq; } total;",
        14,
    );
    assert_int(
        "let i = 0; for (i < 3) { const step = 1; i += step; } i;",
        3,
    );
    // and body-local bindings do not leak into the enclosing scope
    assert_error_contains(
        "let i = 0; for (i < 1) { let tmp = 9; i = 1; } tmp;",
        "identifier not found: tmp",
    );
}

#[test]
fn foreach_variables_stay_scoped() {
    assert_error_contains(
        "foreach v in [1] { v } v;",
        "identifier not found: v",
    );
}

#[test]
fn functions_and_closures() {
    assert_int("let add = fn(a, b) { return a + b; }; add(3, 4);", 7);
    assert_int("let add = fn(a, b) { a + b }; add(3, 4);", 7);
    assert_int("fn(x) { x * 2 }(21);", 42);
    assert_int(
        "let counter = fn() { let n = 0; return fn() { n = n + 1; return n; }; }; \
         let c = counter(); c(); c();",
        2,
    );
    assert_int(
        "let adder = fn(x) { return fn(y) { return x + y; }; }; let add2 = adder(2); add2(5);",
        7,
    );
}

#[test]
fn default_arguments() {
    assert_int("let add = fn(a, b = 10) { return a + b; }; add(3);", 13);
    assert_int("let add = fn(a, b = 10) { return a + b; }; add(3, 4);", 7);
    // defaults can see earlier parameters
    assert_int("let f = fn(a, b = a * 2) { return a + b; }; f(3);", 9);
}

#[test]
fn arity_errors() {
    assert_error_contains(
        "let f = fn(a, b) { a }; f(1);",
        "wrong number of arguments. got=1, want=2",
    );
    assert_error_contains(
        "let f = fn(a) { a }; f(1, 2);",
        "wrong number of arguments. got=2, want=1",
    );
    assert_error_contains("len(1, 2)", "wrong number of arguments. got=2, want=1");
}

#[test]
fn function_definitions() {
    assert_int("function double(x) { return x * 2; } double(4);", 8);
    assert_int(
        "function fact(n) { if (n < 2) { return 1; } return n * fact(n - 1); } fact(5);",
        120,
    );
}

#[test]
fn returns_surface_at_the_nearest_call() {
    assert_int("return 5; 9;", 5);
    assert_int("let f = fn() { if (true) { return 10; } return 1; }; f();", 10);
    assert_int(
        "let f = fn() { foreach v in [1, 2, 3] { if (v == 2) { return v; } } return 0; }; f();",
        2,
    );
}

#[test]
fn arrays_and_indexing() {
    assert_int("[1, 2, 3][0]", 1);
    assert_int("let a = [1, 2, 3]; a[1] + a[2];", 5);
    assert_eq!(run("[1, 2, 3][5]"), Value::Null);
    assert_eq!(run("[1, 2, 3][-1]"), Value::Null);
    assert_string("\"abc\"[1]", "b");
    assert_eq!(run("\"abc\"[9]"), Value::Null);
    assert_eq!(
        run("[1, 2] + [3]"),
        Value::new_array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
    assert_error_contains("[1] == [1]", "unknown operator: array == array");
    assert_error_contains("5[0]", "index operator not supported: integer");
}

#[test]
fn hashes() {
    assert_int("let h = {\"a\": 1}; h[\"a\"] + 1;", 2);
    assert_int("let h = {1: 10, true: 20}; h[1] + h[true];", 30);
    assert_eq!(run("let h = {\"a\": 1}; h[\"b\"];"), Value::Null);
    assert_error_contains("{[1]: 2}", "unusable as hash key: array");
    assert_error_contains("let h = {}; h[[1]];", "unusable as hash key: array");
    // later duplicate keys overwrite
    assert_int("let h = {\"a\": 1, \"a\": 2}; h[\"a\"];", 2);
}

#[test]
fn hash_builtins_copy() {
    assert_int(
        "let h = {\"a\": 1}; let g = delete(h, \"a\"); h[\"a\"];",
        1,
    );
    assert_eq!(run("let h = {\"a\": 1}; delete(h, \"a\")[\"a\"];"), Value::Null);
    assert_int("let h = set({}, \"k\", 9); h[\"k\"];", 9);
    assert_string("let h = {\"a\": 1}; h.keys()[0];", "a");
}

#[test]
fn switch_expressions() {
    let source = |x: i64| {
        format!(
            "let x = {}; switch (x) {{ case 1, 2 {{ \"low\" }} default {{ \"hi\" }} }}",
            x
        )
    };
    assert_eq!(run(&source(2)), Value::String("low".to_string()));
    assert_eq!(run(&source(9)), Value::String("hi".to_string()));
    assert_eq!(
        run("switch (3) { case 1 { \"one\" } }"),
        Value::Null
    );
    assert_string(
        "let f = fn(x) { switch (x) { case \"a\" { return 1; } } return 0; }; \
         switch (f(\"a\")) { case 1 { \"matched\" } default { \"no\" } }",
        "matched",
    );
}

#[test]
fn method_calls_dispatch_by_kind() {
    assert_int("let s = \"Hello\"; s.len();", 5);
    assert_string("\"abc\".toupper()", "ABC");
    assert_string("\"AbC\".tolower()", "abc");
    assert_string("\"  x \".trim()", "x");
    assert_int("[1, 2, 3].len()", 3);
    assert_int("[1, 2, 3].first()", 1);
    assert_string("[1, 2, 3].join(\"-\")", "1-2-3");
    assert_string("65.chr()", "A");
    assert_error_contains("\"x\".nope()", "failed to invoke method: nope");
}

#[test]
fn user_defined_kind_methods() {
    assert_string(
        "function string.shout(s) { return s + \"!\"; } \"hi\".shout();",
        "hi!",
    );
}

#[test]
fn methods_reflection() {
    assert_string("3.methods().join(\",\")", "chr,methods");
    let listing = run("function string.shout(s) { return s; } \"x\".methods().join(\",\")");
    let Value::String(names) = listing else {
        panic!("expected string, got {:?}", listing);
    };
    assert!(names.contains("shout"), "got: {}", names);
    assert!(names.contains("toupper"), "got: {}", names);
    assert!(names.contains("methods"), "got: {}", names);
    let hash_methods = run("{}.methods().join(\",\")");
    assert_eq!(hash_methods, Value::String("keys,methods".to_string()));
}

#[test]
fn string_interpolate_method() {
    assert_string(
        "\"hello ${who}\".interpolate({\"who\": \"world\"})",
        "hello world",
    );
}

#[test]
fn builtins_through_the_registry() {
    assert_string("type(3)", "integer");
    assert_string("type(3.0)", "float");
    assert_string("type(\"x\")", "string");
    assert_string("type([])", "array");
    assert_int("len(\"hello\")", 5);
    assert_int("len([1, 2])", 2);
    assert_int("push([1], 2)[1]", 2);
    assert_string("string(42)", "42");
    assert_int("int(\"42\")", 42);
    assert_string("sprintf(\"%d-%s\", 3, \"x\")", "3-x");
    assert_bool("string?(\"x\")", true);
    assert_bool("integer?(\"x\")", false);
    assert_bool("number?(1.5)", true);
    assert_eq!(run("puts(\"\")"), Value::Null);
}

#[test]
fn eval_builtin_runs_in_the_caller_environment() {
    assert_int("eval(\"1 + 2\")", 3);
    assert_int("let x = 10; eval(\"x * 2\");", 20);
    assert_error_contains("eval(\"let\")", "eval:");
}

#[test]
fn math_builtins() {
    assert_int("math.abs(-4)", 4);
    assert_eq!(run("math.sqrt(9)"), Value::Float(3.0));
    assert_bool("let r = math.random(); r >= 0 && r < 1;", true);
}

#[test]
fn pragma_builtin() {
    let out = run("pragma(\"suite-mode\"); pragma();");
    let Value::Array(names) = &out else {
        panic!("expected array, got {:?}", out);
    };
    assert!(names.contains(&Value::String("suite-mode".to_string())));
    let out = run("pragma(\"no-suite-mode\"); pragma();");
    let Value::Array(names) = &out else {
        panic!("expected array, got {:?}", out);
    };
    assert!(!names.contains(&Value::String("suite-mode".to_string())));
}

#[test]
fn match_builtin() {
    assert_string(
        "let m = match(\"([a-z]+)@([a-z]+)\", \"user@host\"); m[0] + \":\" + m[1];",
        "user:host",
    );
    assert_eq!(run("match(\"^x\", \"hello\")"), Value::Null);
}

#[test]
fn backtick_commands() {
    assert_string("`echo hello`", "hello\n");
    assert_error_contains("`definitely_not_a_command_xyz`", "failed to run command");
}

#[test]
fn errors_short_circuit_everywhere() {
    assert_error_contains("[1, nope, 2]", "identifier not found: nope");
    assert_error_contains("if (nope) { 1 }", "identifier not found: nope");
    assert_error_contains("puts(nope)", "identifier not found: nope");
    assert_error_contains("len(nope)", "identifier not found: nope");
    assert_error_contains("1 + nope", "identifier not found: nope");
    assert_error_contains("{\"a\": nope}", "identifier not found: nope");
    assert_error_contains("nope[0]", "identifier not found: nope");
    assert_error_contains(
        "let f = fn() { return nope; }; f();",
        "identifier not found: nope",
    );
    // an error inside a loop body stops the loop
    assert_error_contains(
        "let i = 0; for (i < 10) { i = i + 1; nope; }",
        "identifier not found: nope",
    );
}

#[test]
fn errors_carry_their_source_position() {
    let out = run("let x = 1;\nlet y = nope;");
    let Value::Error(err) = out else {
        panic!("expected error");
    };
    assert_eq!(err.span.line, 2);
    assert_eq!(err.span.col, 9);
}

#[test]
fn type_mismatch_reports_both_kinds() {
    assert_error_contains("1 + true", "type mismatch: integer + boolean");
    assert_error_contains("-true", "unknown operator: -boolean");
}

#[test]
fn not_a_function() {
    assert_error_contains("let x = 5; x(1);", "not a function: integer");
}

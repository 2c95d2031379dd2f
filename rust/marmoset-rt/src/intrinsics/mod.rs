//! The built-in function registry.
//!
//! A process-wide table from qualified names (`len`, `os.getenv`,
//! `string.toupper`, ...) to host functions. The core set is installed
//! on first use; embedders add more with `register_builtin` during
//! bootstrap. Method calls reach this table through kind-qualified
//! names: `"abc".toupper()` looks up `string.toupper` with the receiver
//! prepended to the arguments.

mod arrays;
mod fs;
mod math;
mod strings;

pub(crate) use fs::{file_close, file_read, file_readlines, file_write};

use crate::environment::Environment;
use crate::pragmas;
use crate::values::{BuiltinFn, HashPair, Value};
use marmoset_compiler::compiler::tokens::Span;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

static REGISTRY: Lazy<RwLock<HashMap<String, BuiltinFn>>> = Lazy::new(|| {
    let mut table: HashMap<String, BuiltinFn> = HashMap::new();
    register_core(&mut table);
    strings::register(&mut table);
    arrays::register(&mut table);
    math::register(&mut table);
    fs::register(&mut table);
    RwLock::new(table)
});

/// Register a host function. Meant for bootstrap; later calls win over
/// earlier ones.
pub fn register_builtin(name: &str, func: BuiltinFn) {
    REGISTRY.write().unwrap().insert(name.to_string(), func);
}

pub fn lookup(name: &str) -> Option<BuiltinFn> {
    REGISTRY.read().unwrap().get(name).copied()
}

/// Registered names starting with `prefix`; feeds `methods()`.
pub fn names_with_prefix(prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = REGISTRY
        .read()
        .unwrap()
        .keys()
        .filter(|name| name.starts_with(prefix))
        .cloned()
        .collect();
    names.sort();
    names
}

/// Every registered name, sorted. The REPL completer uses this.
pub fn all_names() -> Vec<String> {
    let mut names: Vec<String> = REGISTRY.read().unwrap().keys().cloned().collect();
    names.sort();
    names
}

// ── Shared helpers for built-in implementations ──

pub(crate) fn runtime_error(message: impl Into<String>) -> Value {
    Value::new_error(Span::dummy(), message)
}

pub(crate) fn arity_error(got: usize, want: &str) -> Value {
    runtime_error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

fn register_core(table: &mut HashMap<String, BuiltinFn>) {
    table.insert("args".into(), builtin_args);
    table.insert("delete".into(), builtin_delete);
    table.insert("eval".into(), builtin_eval);
    table.insert("exit".into(), builtin_exit);
    table.insert("int".into(), builtin_int);
    table.insert("keys".into(), builtin_keys);
    table.insert("len".into(), builtin_len);
    table.insert("match".into(), builtin_match);
    table.insert("pragma".into(), builtin_pragma);
    table.insert("printf".into(), builtin_printf);
    table.insert("push".into(), builtin_push);
    table.insert("puts".into(), builtin_puts);
    table.insert("set".into(), builtin_set);
    table.insert("sprintf".into(), builtin_sprintf);
    table.insert("string".into(), builtin_string);
    table.insert("type".into(), builtin_type);
    table.insert("version".into(), builtin_version);

    table.insert("array?".into(), builtin_is_array);
    table.insert("boolean?".into(), builtin_is_boolean);
    table.insert("float?".into(), builtin_is_float);
    table.insert("function?".into(), builtin_is_function);
    table.insert("hash?".into(), builtin_is_hash);
    table.insert("integer?".into(), builtin_is_integer);
    table.insert("null?".into(), builtin_is_null);
    table.insert("number?".into(), builtin_is_number);
    table.insert("string?".into(), builtin_is_string);
}

// ── Core built-ins ──

fn builtin_len(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    match &args[0] {
        Value::String(s) => Value::Int(s.chars().count() as i64),
        Value::Null => Value::Int(0),
        Value::Array(elements) => Value::Int(elements.len() as i64),
        other => runtime_error(format!(
            "argument to `len` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_type(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    Value::String(args[0].type_name().to_string())
}

fn builtin_push(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return arity_error(args.len(), "2");
    }
    match &args[0] {
        Value::Array(elements) => {
            let mut out = elements.as_ref().clone();
            out.push(args[1].clone());
            Value::new_array(out)
        }
        other => runtime_error(format!(
            "argument to `push` must be array, got={}",
            other.type_name()
        )),
    }
}

fn builtin_keys(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    match &args[0] {
        Value::Hash(pairs) => {
            Value::new_array(pairs.values().map(|pair| pair.key.clone()).collect())
        }
        other => runtime_error(format!(
            "argument to `keys` must be hash, got={}",
            other.type_name()
        )),
    }
}

fn builtin_delete(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return arity_error(args.len(), "2");
    }
    let Value::Hash(pairs) = &args[0] else {
        return runtime_error(format!(
            "argument to `delete` must be hash, got={}",
            args[0].type_name()
        ));
    };
    let Some(key) = args[1].hash_key() else {
        return runtime_error(format!(
            "key to `delete` must be hashable, got={}",
            args[1].type_name()
        ));
    };
    let mut out = pairs.as_ref().clone();
    out.remove(&key);
    Value::new_hash(out)
}

fn builtin_set(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 3 {
        return arity_error(args.len(), "3");
    }
    let Value::Hash(pairs) = &args[0] else {
        return runtime_error(format!(
            "argument to `set` must be hash, got={}",
            args[0].type_name()
        ));
    };
    let Some(key) = args[1].hash_key() else {
        return runtime_error(format!(
            "key to `set` must be hashable, got={}",
            args[1].type_name()
        ));
    };
    let mut out = pairs.as_ref().clone();
    out.insert(
        key,
        HashPair {
            key: args[1].clone(),
            value: args[2].clone(),
        },
    );
    Value::new_hash(out)
}

fn builtin_puts(_env: &Environment, args: Vec<Value>) -> Value {
    for arg in &args {
        print!("{}", arg.inspect());
    }
    Value::Null
}

fn builtin_printf(env: &Environment, args: Vec<Value>) -> Value {
    let out = builtin_sprintf(env, args);
    if let Value::String(s) = &out {
        print!("{}", s);
        return Value::Null;
    }
    out
}

fn builtin_sprintf(_env: &Environment, args: Vec<Value>) -> Value {
    if args.is_empty() {
        return arity_error(0, "1+");
    }
    let Value::String(format) = &args[0] else {
        return runtime_error(format!(
            "first argument to `sprintf` must be string, got={}",
            args[0].type_name()
        ));
    };
    Value::String(format_values(format, &args[1..]))
}

/// The `%s`/`%d`/`%f`/`%v`/`%%` subset of printf-style formatting.
fn format_values(format: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut chars = format.chars();
    let mut next_arg = 0;
    let mut take = |out: &mut String, render: fn(&Value) -> String| {
        if next_arg < args.len() {
            out.push_str(&render(&args[next_arg]));
            next_arg += 1;
        } else {
            out.push_str("%!(MISSING)");
        }
    };
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('d') => take(&mut out, |v| match v {
                Value::Int(n) => n.to_string(),
                Value::Float(f) => (*f as i64).to_string(),
                Value::Bool(b) => i64::from(*b).to_string(),
                other => other.inspect(),
            }),
            Some('f') => take(&mut out, |v| match v {
                Value::Float(f) => format!("{:.6}", f),
                Value::Int(n) => format!("{:.6}", *n as f64),
                other => other.inspect(),
            }),
            Some('s') | Some('v') => take(&mut out, |v| v.inspect()),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

fn builtin_eval(env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    match &args[0] {
        Value::String(source) => match marmoset_compiler::parse_program(source) {
            Ok(program) => crate::interpreter::eval_program(&program, env),
            Err(errors) => {
                let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                runtime_error(format!("eval: {}", rendered.join("; ")))
            }
        },
        other => runtime_error(format!(
            "argument to `eval` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_exit(_env: &Environment, args: Vec<Value>) -> Value {
    let code = match args.first() {
        Some(Value::Int(n)) => *n as i32,
        Some(Value::Float(f)) => *f as i32,
        _ => 0,
    };
    std::process::exit(code);
}

fn builtin_int(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    match &args[0] {
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(err) => runtime_error(format!(
                "converting string '{}' to int failed: {}",
                s, err
            )),
        },
        Value::Bool(b) => Value::Int(i64::from(*b)),
        Value::Int(n) => Value::Int(*n),
        Value::Float(f) => Value::Int(*f as i64),
        other => runtime_error(format!(
            "argument to `int` not supported, got={}",
            other.type_name()
        )),
    }
}

fn builtin_string(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    Value::String(args[0].inspect())
}

/// Regular expression match: `match(pattern, subject)`. A hit returns a
/// hash of capture groups keyed by index; a miss returns null.
fn builtin_match(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return arity_error(args.len(), "2");
    }
    let (Value::String(pattern), Value::String(subject)) = (&args[0], &args[1]) else {
        return runtime_error(format!(
            "arguments to `match` must be string, got={} and {}",
            args[0].type_name(),
            args[1].type_name()
        ));
    };
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => return runtime_error(format!("invalid regular expression: {}", err)),
    };
    match re.captures(subject) {
        Some(caps) => {
            let mut pairs = BTreeMap::new();
            for (i, group) in caps.iter().skip(1).enumerate() {
                let key = Value::Int(i as i64);
                let text = group.map(|m| m.as_str()).unwrap_or_default();
                if let Some(hash_key) = key.hash_key() {
                    pairs.insert(
                        hash_key,
                        HashPair {
                            key,
                            value: Value::String(text.to_string()),
                        },
                    );
                }
            }
            Value::new_hash(pairs)
        }
        None => Value::Null,
    }
}

fn builtin_pragma(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() > 1 {
        return arity_error(args.len(), "0|1");
    }
    if let Some(arg) = args.first() {
        match arg {
            Value::String(name) => {
                let name = name.to_lowercase();
                match name.strip_prefix("no-") {
                    Some(cleared) => pragmas::clear(cleared),
                    None => pragmas::set(&name),
                }
            }
            other => {
                return runtime_error(format!(
                    "argument to `pragma` not supported, got={}",
                    other.type_name()
                ))
            }
        }
    }
    Value::new_array(pragmas::active().into_iter().map(Value::String).collect())
}

fn builtin_args(_env: &Environment, _args: Vec<Value>) -> Value {
    Value::new_array(std::env::args().skip(1).map(Value::String).collect())
}

fn builtin_version(_env: &Environment, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return arity_error(args.len(), "0");
    }
    Value::String(env!("CARGO_PKG_VERSION").to_string())
}

// ── Kind tests ──

fn kind_test(args: Vec<Value>, pred: fn(&Value) -> bool) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    Value::Bool(pred(&args[0]))
}

fn builtin_is_string(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::String(_)))
}

fn builtin_is_integer(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::Int(_)))
}

fn builtin_is_float(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::Float(_)))
}

fn builtin_is_number(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::Int(_) | Value::Float(_)))
}

fn builtin_is_array(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::Array(_)))
}

fn builtin_is_hash(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::Hash(_)))
}

fn builtin_is_boolean(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::Bool(_)))
}

fn builtin_is_null(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| matches!(v, Value::Null))
}

fn builtin_is_function(_env: &Environment, args: Vec<Value>) -> Value {
    kind_test(args, |v| {
        matches!(v, Value::Function(_) | Value::Builtin(_))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::new_root()
    }

    #[test]
    fn len_counts_code_points() {
        let out = builtin_len(&env(), vec![Value::String("héllo".to_string())]);
        assert_eq!(out, Value::Int(5));
        let out = builtin_len(&env(), vec![Value::Int(3)]);
        assert!(out.is_error());
    }

    #[test]
    fn push_returns_a_new_array() {
        let original = Value::new_array(vec![Value::Int(1)]);
        let out = builtin_push(&env(), vec![original.clone(), Value::Int(2)]);
        assert_eq!(out, Value::new_array(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(original, Value::new_array(vec![Value::Int(1)]));
    }

    #[test]
    fn set_and_delete_copy_the_hash() {
        let empty = Value::new_hash(BTreeMap::new());
        let one = builtin_set(
            &env(),
            vec![empty.clone(), Value::String("a".into()), Value::Int(1)],
        );
        assert_eq!(builtin_len(&env(), vec![empty]), Value::Int(0));
        let back = builtin_delete(&env(), vec![one, Value::String("a".into())]);
        assert_eq!(back, Value::new_hash(BTreeMap::new()));
    }

    #[test]
    fn sprintf_subset() {
        let out = builtin_sprintf(
            &env(),
            vec![
                Value::String("%s is %d%% done, pi=%f".into()),
                Value::String("job".into()),
                Value::Int(40),
                Value::Float(3.14),
            ],
        );
        assert_eq!(
            out,
            Value::String("job is 40% done, pi=3.140000".into())
        );
    }

    #[test]
    fn match_returns_groups_or_null() {
        let out = builtin_match(
            &env(),
            vec![
                Value::String("h(.*)o".into()),
                Value::String("hello".into()),
            ],
        );
        let Value::Hash(pairs) = out else {
            panic!("expected hash");
        };
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            pairs.values().next().unwrap().value,
            Value::String("ell".into())
        );

        let miss = builtin_match(
            &env(),
            vec![Value::String("^x".into()), Value::String("hello".into())],
        );
        assert_eq!(miss, Value::Null);
    }

    #[test]
    fn int_conversions() {
        assert_eq!(
            builtin_int(&env(), vec![Value::String("42".into())]),
            Value::Int(42)
        );
        assert_eq!(builtin_int(&env(), vec![Value::Bool(true)]), Value::Int(1));
        assert_eq!(builtin_int(&env(), vec![Value::Float(3.9)]), Value::Int(3));
        assert!(builtin_int(&env(), vec![Value::String("nope".into())]).is_error());
    }

    #[test]
    fn kind_tests() {
        assert_eq!(
            builtin_is_string(&env(), vec![Value::String("x".into())]),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_is_number(&env(), vec![Value::Float(1.0)]),
            Value::Bool(true)
        );
        assert_eq!(
            builtin_is_null(&env(), vec![Value::Int(0)]),
            Value::Bool(false)
        );
    }

    #[test]
    fn registry_lookup_and_prefix_scan() {
        assert!(lookup("len").is_some());
        assert!(lookup("no.such.builtin").is_none());
        let names = names_with_prefix("os.");
        assert!(names.contains(&"os.getenv".to_string()));
    }
}

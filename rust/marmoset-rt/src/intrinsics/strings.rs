//! String methods, dispatched as `string.NAME` with the receiver as the
//! first argument: `"abc".toupper()` and `string.toupper("abc")` are the
//! same call.

use super::{arity_error, runtime_error};
use crate::environment::Environment;
use crate::values::{BuiltinFn, Value};
use std::collections::HashMap;

pub(super) fn register(table: &mut HashMap<String, BuiltinFn>) {
    table.insert("string.interpolate".into(), string_interpolate);
    table.insert("string.len".into(), string_len);
    table.insert("string.reverse".into(), string_reverse);
    table.insert("string.split".into(), string_split);
    table.insert("string.tolower".into(), string_tolower);
    table.insert("string.toupper".into(), string_toupper);
    table.insert("string.trim".into(), string_trim);
}

fn receiver(name: &str, args: &[Value], want: usize) -> Result<String, Value> {
    if args.len() != want {
        return Err(arity_error(args.len(), &want.to_string()));
    }
    match &args[0] {
        Value::String(s) => Ok(s.clone()),
        other => Err(runtime_error(format!(
            "argument to `{}` must be string, got={}",
            name,
            other.type_name()
        ))),
    }
}

fn string_len(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("string.len", &args, 1) {
        Ok(s) => Value::Int(s.chars().count() as i64),
        Err(err) => err,
    }
}

fn string_toupper(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("string.toupper", &args, 1) {
        Ok(s) => Value::String(s.to_uppercase()),
        Err(err) => err,
    }
}

fn string_tolower(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("string.tolower", &args, 1) {
        Ok(s) => Value::String(s.to_lowercase()),
        Err(err) => err,
    }
}

fn string_trim(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("string.trim", &args, 1) {
        Ok(s) => Value::String(s.trim().to_string()),
        Err(err) => err,
    }
}

fn string_reverse(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("string.reverse", &args, 1) {
        Ok(s) => Value::String(s.chars().rev().collect()),
        Err(err) => err,
    }
}

/// `string.split(s, sep)`; with one argument, split on whitespace.
fn string_split(_env: &Environment, args: Vec<Value>) -> Value {
    if args.is_empty() || args.len() > 2 {
        return arity_error(args.len(), "1|2");
    }
    let Value::String(s) = &args[0] else {
        return runtime_error(format!(
            "argument to `string.split` must be string, got={}",
            args[0].type_name()
        ));
    };
    let parts: Vec<Value> = match args.get(1) {
        None => s
            .split_whitespace()
            .map(|p| Value::String(p.to_string()))
            .collect(),
        Some(Value::String(sep)) => s
            .split(sep.as_str())
            .map(|p| Value::String(p.to_string()))
            .collect(),
        Some(other) => {
            return runtime_error(format!(
                "separator to `string.split` must be string, got={}",
                other.type_name()
            ))
        }
    };
    Value::new_array(parts)
}

/// Substitute `${name}` markers from a hash of values.
fn string_interpolate(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 2 {
        return arity_error(args.len(), "2");
    }
    let Value::String(template) = &args[0] else {
        return runtime_error(format!(
            "argument to `string.interpolate` must be string, got={}",
            args[0].type_name()
        ));
    };
    let Value::Hash(pairs) = &args[1] else {
        return runtime_error(format!(
            "second argument to `string.interpolate` must be hash, got={}",
            args[1].type_name()
        ));
    };
    let mut out = template.clone();
    for pair in pairs.values() {
        let marker = format!("${{{}}}", pair.key.inspect());
        out = out.replace(&marker, &pair.value.inspect());
    }
    Value::String(out)
}

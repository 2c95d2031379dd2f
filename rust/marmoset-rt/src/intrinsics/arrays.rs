//! Array methods, dispatched as `array.NAME` with the receiver first.

use super::{arity_error, runtime_error};
use crate::environment::Environment;
use crate::values::{BuiltinFn, Value};
use std::collections::HashMap;
use std::rc::Rc;

pub(super) fn register(table: &mut HashMap<String, BuiltinFn>) {
    table.insert("array.first".into(), array_first);
    table.insert("array.join".into(), array_join);
    table.insert("array.last".into(), array_last);
    table.insert("array.len".into(), array_len);
    table.insert("array.reverse".into(), array_reverse);
}

fn receiver<'a>(name: &str, args: &'a [Value], want: usize) -> Result<&'a Rc<Vec<Value>>, Value> {
    if args.len() != want {
        return Err(arity_error(args.len(), &want.to_string()));
    }
    match &args[0] {
        Value::Array(elements) => Ok(elements),
        other => Err(runtime_error(format!(
            "argument to `{}` must be array, got={}",
            name,
            other.type_name()
        ))),
    }
}

fn array_len(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("array.len", &args, 1) {
        Ok(elements) => Value::Int(elements.len() as i64),
        Err(err) => err,
    }
}

fn array_first(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("array.first", &args, 1) {
        Ok(elements) => elements.first().cloned().unwrap_or(Value::Null),
        Err(err) => err,
    }
}

fn array_last(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("array.last", &args, 1) {
        Ok(elements) => elements.last().cloned().unwrap_or(Value::Null),
        Err(err) => err,
    }
}

fn array_reverse(_env: &Environment, args: Vec<Value>) -> Value {
    match receiver("array.reverse", &args, 1) {
        Ok(elements) => {
            let mut out = elements.as_ref().clone();
            out.reverse();
            Value::new_array(out)
        }
        Err(err) => err,
    }
}

/// `array.join(a, sep)`; with one argument the separator is empty.
fn array_join(_env: &Environment, args: Vec<Value>) -> Value {
    if args.is_empty() || args.len() > 2 {
        return arity_error(args.len(), "1|2");
    }
    let Value::Array(elements) = &args[0] else {
        return runtime_error(format!(
            "argument to `array.join` must be array, got={}",
            args[0].type_name()
        ));
    };
    let sep = match args.get(1) {
        None => String::new(),
        Some(Value::String(sep)) => sep.clone(),
        Some(other) => {
            return runtime_error(format!(
                "separator to `array.join` must be string, got={}",
                other.type_name()
            ))
        }
    };
    let parts: Vec<String> = elements.iter().map(|e| e.inspect()).collect();
    Value::String(parts.join(&sep))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::new_root()
    }

    fn sample() -> Value {
        Value::new_array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    }

    #[test]
    fn first_last_len() {
        assert_eq!(array_first(&env(), vec![sample()]), Value::Int(1));
        assert_eq!(array_last(&env(), vec![sample()]), Value::Int(3));
        assert_eq!(array_len(&env(), vec![sample()]), Value::Int(3));
        assert_eq!(
            array_first(&env(), vec![Value::new_array(vec![])]),
            Value::Null
        );
    }

    #[test]
    fn reverse_copies() {
        let original = sample();
        let reversed = array_reverse(&env(), vec![original.clone()]);
        assert_eq!(
            reversed,
            Value::new_array(vec![Value::Int(3), Value::Int(2), Value::Int(1)])
        );
        assert_eq!(original, sample());
    }

    #[test]
    fn join_with_separator() {
        assert_eq!(
            array_join(&env(), vec![sample(), Value::String("-".into())]),
            Value::String("1-2-3".into())
        );
        assert_eq!(array_join(&env(), vec![sample()]), Value::String("123".into()));
    }
}

//! The `math.` qualified built-ins.

use super::{arity_error, runtime_error};
use crate::environment::Environment;
use crate::values::{BuiltinFn, Value};
use std::collections::HashMap;

pub(super) fn register(table: &mut HashMap<String, BuiltinFn>) {
    table.insert("math.abs".into(), math_abs);
    table.insert("math.random".into(), math_random);
    table.insert("math.sqrt".into(), math_sqrt);
}

fn math_abs(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    match &args[0] {
        Value::Int(n) => Value::Int(n.abs()),
        Value::Float(f) => Value::Float(f.abs()),
        other => runtime_error(format!(
            "argument to `math.abs` must be a number, got={}",
            other.type_name()
        )),
    }
}

/// A float in `[0, 1)`.
fn math_random(_env: &Environment, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return arity_error(args.len(), "0");
    }
    Value::Float(rand::random::<f64>())
}

fn math_sqrt(_env: &Environment, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return arity_error(args.len(), "1");
    }
    match &args[0] {
        Value::Int(n) => Value::Float((*n as f64).sqrt()),
        Value::Float(f) => Value::Float(f.sqrt()),
        other => runtime_error(format!(
            "argument to `math.sqrt` must be a number, got={}",
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::new_root()
    }

    #[test]
    fn abs_and_sqrt() {
        assert_eq!(math_abs(&env(), vec![Value::Int(-4)]), Value::Int(4));
        assert_eq!(math_abs(&env(), vec![Value::Float(-1.5)]), Value::Float(1.5));
        assert_eq!(math_sqrt(&env(), vec![Value::Int(9)]), Value::Float(3.0));
        assert!(math_sqrt(&env(), vec![Value::Null]).is_error());
    }

    #[test]
    fn random_is_in_unit_interval() {
        for _ in 0..16 {
            let Value::Float(f) = math_random(&env(), vec![]) else {
                panic!("expected float");
            };
            assert!((0.0..1.0).contains(&f));
        }
    }
}

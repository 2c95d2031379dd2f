//! Tree-walking evaluator.
//!
//! `eval_program` walks the AST against an environment and produces a
//! `Value`. Two sentinel values drive control flow: `Return` unwinds to
//! the nearest call frame (or the program) and `Error` unwinds all the
//! way out. Any error appearing as an operand, argument, index or
//! condition short-circuits the surrounding evaluation.

use crate::environment::Environment;
use crate::intrinsics;
use crate::values::{FunctionValue, HashPair, Value};
use marmoset_compiler::compiler::ast::*;
use marmoset_compiler::compiler::tokens::{Span, TokenKind};
use regex::Regex;
use std::collections::BTreeMap;
use std::rc::Rc;

pub fn eval_program(program: &Program, env: &Environment) -> Value {
    let mut result = Value::Null;
    for stmt in &program.statements {
        match eval_stmt(stmt, env) {
            Value::Return(inner) => return *inner,
            err @ Value::Error(_) => return err,
            other => result = other,
        }
    }
    result
}

fn eval_stmt(stmt: &Stmt, env: &Environment) -> Value {
    match stmt {
        Stmt::Let(s) => {
            let value = eval_expr(&s.value, env);
            if value.is_error() {
                return value;
            }
            match env.set(&s.name.name, value) {
                Ok(()) => Value::Null,
                Err(err) => Value::new_error(s.token.span, err.to_string()),
            }
        }
        Stmt::Const(s) => {
            let value = eval_expr(&s.value, env);
            if value.is_error() {
                return value;
            }
            match env.set_const(&s.name.name, value) {
                Ok(()) => Value::Null,
                Err(err) => Value::new_error(s.token.span, err.to_string()),
            }
        }
        Stmt::Return(s) => {
            let value = eval_expr(&s.value, env);
            if value.is_error() {
                return value;
            }
            Value::Return(Box::new(value))
        }
        Stmt::Block(block) => eval_block(block, env),
        Stmt::Expression(s) => eval_expr(&s.expr, env),
    }
}

/// Evaluate a block; `Return` and `Error` terminate it immediately and
/// surface to the caller. The block's value is its last statement's.
fn eval_block(block: &BlockStmt, env: &Environment) -> Value {
    let mut result = Value::Null;
    for stmt in &block.statements {
        match eval_stmt(stmt, env) {
            sentinel @ (Value::Return(_) | Value::Error(_)) => return sentinel,
            other => result = other,
        }
    }
    result
}

pub fn eval_expr(expr: &Expr, env: &Environment) -> Value {
    match expr {
        Expr::Ident(e) => eval_identifier(e, env),
        Expr::Int(e) => Value::Int(e.value),
        Expr::Float(e) => Value::Float(e.value),
        Expr::Bool(e) => Value::Bool(e.value),
        Expr::Str(e) => Value::String(e.value.clone()),
        Expr::Regexp(e) => Value::Regexp {
            pattern: e.pattern.clone(),
            flags: e.flags.clone(),
        },
        Expr::Backtick(e) => run_command(&e.command, e.token.span),
        Expr::Prefix(e) => eval_prefix(e, env),
        Expr::Infix(e) => eval_infix(e, env),
        Expr::Postfix(e) => eval_postfix(e, env),
        Expr::If(e) => eval_if(e, env),
        Expr::Ternary(e) => eval_ternary(e, env),
        Expr::For(e) => eval_for(e, env),
        Expr::Foreach(e) => eval_foreach(e, env),
        Expr::FunctionLit(e) => Value::Function(Rc::new(FunctionValue {
            parameters: e.parameters.iter().map(|p| p.name.clone()).collect(),
            defaults: e.defaults.clone(),
            body: e.body.clone(),
            env: env.clone(),
        })),
        Expr::FunctionDefine(e) => eval_function_define(e, env),
        Expr::Call(e) => eval_call(e, env),
        Expr::MethodCall(e) => eval_method_call(e, env),
        Expr::Index(e) => eval_index(e, env),
        Expr::Array(e) => match eval_expressions(&e.elements, env) {
            Ok(elements) => Value::new_array(elements),
            Err(err) => err,
        },
        Expr::Hash(e) => eval_hash_literal(e, env),
        Expr::Switch(e) => eval_switch(e, env),
        Expr::Assign(e) => eval_assign(e, env),
    }
}

fn eval_identifier(e: &IdentExpr, env: &Environment) -> Value {
    if let Some(value) = env.get(&e.name) {
        return value;
    }
    if let Some(func) = intrinsics::lookup(&e.name) {
        return Value::Builtin(func);
    }
    Value::new_error(e.token.span, format!("identifier not found: {}", e.name))
}

fn eval_prefix(e: &PrefixExpr, env: &Environment) -> Value {
    let right = eval_expr(&e.right, env);
    if right.is_error() {
        return right;
    }
    match e.op {
        TokenKind::Bang => Value::Bool(!right.is_truthy()),
        TokenKind::Minus => match right {
            Value::Int(n) => Value::Int(-n),
            Value::Float(f) => Value::Float(-f),
            other => Value::new_error(
                e.token.span,
                format!("unknown operator: -{}", other.type_name()),
            ),
        },
        op => Value::new_error(e.token.span, format!("unknown operator: {}", op)),
    }
}

fn eval_infix(e: &InfixExpr, env: &Environment) -> Value {
    if matches!(e.op, TokenKind::And | TokenKind::Or) {
        return eval_logical(e, env);
    }
    let left = eval_expr(&e.left, env);
    if left.is_error() {
        return left;
    }
    let right = eval_expr(&e.right, env);
    if right.is_error() {
        return right;
    }
    eval_infix_op(e.op, &left, &right, e.token.span)
}

/// `&&` and `||` short-circuit: the right operand is only evaluated
/// when the left one does not already decide the answer.
fn eval_logical(e: &InfixExpr, env: &Environment) -> Value {
    let left = eval_expr(&e.left, env);
    if left.is_error() {
        return left;
    }
    match e.op {
        TokenKind::And if !left.is_truthy() => Value::Bool(false),
        TokenKind::Or if left.is_truthy() => Value::Bool(true),
        _ => {
            let right = eval_expr(&e.right, env);
            if right.is_error() {
                return right;
            }
            Value::Bool(right.is_truthy())
        }
    }
}

pub(crate) fn eval_infix_op(op: TokenKind, left: &Value, right: &Value, span: Span) -> Value {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_integer_infix(op, *a, *b, span),
        (Value::Int(a), Value::Float(b)) => eval_float_infix(op, *a as f64, *b, span),
        (Value::Float(a), Value::Int(b)) => eval_float_infix(op, *a, *b as f64, span),
        (Value::Float(a), Value::Float(b)) => eval_float_infix(op, *a, *b, span),
        (Value::String(a), Value::String(b)) => eval_string_infix(op, a, b, span),
        (Value::String(subject), Value::Regexp { pattern, flags })
            if matches!(op, TokenKind::Contains | TokenKind::NotContains) =>
        {
            let source = if flags.is_empty() {
                pattern.clone()
            } else {
                format!("(?{}){}", flags, pattern)
            };
            eval_regexp_match(op, subject, &source, span)
        }
        (Value::String(s), Value::Int(n)) if op == TokenKind::Star => {
            Value::String(s.repeat((*n).max(0) as usize))
        }
        (Value::Array(a), Value::Array(b)) if op == TokenKind::Plus => {
            let mut out = a.as_ref().clone();
            out.extend(b.iter().cloned());
            Value::new_array(out)
        }
        (Value::Bool(a), Value::Bool(b)) if matches!(op, TokenKind::Eq | TokenKind::NotEq) => {
            Value::Bool(if op == TokenKind::Eq { a == b } else { a != b })
        }
        (Value::Null, Value::Null) if matches!(op, TokenKind::Eq | TokenKind::NotEq) => {
            Value::Bool(op == TokenKind::Eq)
        }
        _ => {
            if left.type_name() != right.type_name() {
                Value::new_error(
                    span,
                    format!(
                        "type mismatch: {} {} {}",
                        left.type_name(),
                        op,
                        right.type_name()
                    ),
                )
            } else {
                Value::new_error(
                    span,
                    format!(
                        "unknown operator: {} {} {}",
                        left.type_name(),
                        op,
                        right.type_name()
                    ),
                )
            }
        }
    }
}

fn eval_integer_infix(op: TokenKind, a: i64, b: i64, span: Span) -> Value {
    match op {
        TokenKind::Plus => Value::Int(a + b),
        TokenKind::Minus => Value::Int(a - b),
        TokenKind::Star => Value::Int(a * b),
        TokenKind::Slash => {
            if b == 0 {
                Value::new_error(span, "division by zero")
            } else {
                Value::Int(a / b)
            }
        }
        TokenKind::Mod => {
            if b == 0 {
                Value::new_error(span, "division by zero")
            } else {
                Value::Int(a % b)
            }
        }
        TokenKind::Pow => {
            if b < 0 {
                return Value::new_error(span, format!("negative exponent: {} ** {}", a, b));
            }
            match u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)) {
                Some(v) => Value::Int(v),
                None => Value::new_error(span, format!("integer overflow: {} ** {}", a, b)),
            }
        }
        TokenKind::DotDot => {
            let range: Vec<Value> = if a <= b {
                (a..=b).map(Value::Int).collect()
            } else {
                (b..=a).rev().map(Value::Int).collect()
            };
            Value::new_array(range)
        }
        TokenKind::Lt => Value::Bool(a < b),
        TokenKind::LtEq => Value::Bool(a <= b),
        TokenKind::Gt => Value::Bool(a > b),
        TokenKind::GtEq => Value::Bool(a >= b),
        TokenKind::Eq => Value::Bool(a == b),
        TokenKind::NotEq => Value::Bool(a != b),
        _ => Value::new_error(span, format!("unknown operator: integer {} integer", op)),
    }
}

fn eval_float_infix(op: TokenKind, a: f64, b: f64, span: Span) -> Value {
    match op {
        TokenKind::Plus => Value::Float(a + b),
        TokenKind::Minus => Value::Float(a - b),
        TokenKind::Star => Value::Float(a * b),
        TokenKind::Slash => Value::Float(a / b),
        TokenKind::Mod => Value::Float(a % b),
        TokenKind::Pow => Value::Float(a.powf(b)),
        TokenKind::Lt => Value::Bool(a < b),
        TokenKind::LtEq => Value::Bool(a <= b),
        TokenKind::Gt => Value::Bool(a > b),
        TokenKind::GtEq => Value::Bool(a >= b),
        TokenKind::Eq => Value::Bool(a == b),
        TokenKind::NotEq => Value::Bool(a != b),
        _ => Value::new_error(span, format!("unknown operator: float {} float", op)),
    }
}

fn eval_string_infix(op: TokenKind, a: &str, b: &str, span: Span) -> Value {
    match op {
        TokenKind::Plus => Value::String(format!("{}{}", a, b)),
        TokenKind::Eq => Value::Bool(a == b),
        TokenKind::NotEq => Value::Bool(a != b),
        TokenKind::Contains | TokenKind::NotContains => eval_regexp_match(op, a, b, span),
        _ => Value::new_error(span, format!("unknown operator: string {} string", op)),
    }
}

fn eval_regexp_match(op: TokenKind, subject: &str, pattern: &str, span: Span) -> Value {
    match Regex::new(pattern) {
        Ok(re) => {
            let hit = re.is_match(subject);
            Value::Bool(if op == TokenKind::Contains { hit } else { !hit })
        }
        Err(err) => Value::new_error(span, format!("invalid regular expression: {}", err)),
    }
}

/// `name++` / `name--`: update the binding by one and yield the new
/// value.
fn eval_postfix(e: &PostfixExpr, env: &Environment) -> Value {
    let span = e.token.span;
    let Some(current) = env.get(&e.target_name) else {
        return Value::new_error(span, format!("identifier not found: {}", e.target_name));
    };
    let delta = if e.op == TokenKind::PlusPlus { 1 } else { -1 };
    let updated = match current {
        Value::Int(n) => Value::Int(n + delta),
        Value::Float(f) => Value::Float(f + delta as f64),
        other => {
            return Value::new_error(
                span,
                format!("unknown operator: {}{}", other.type_name(), e.op),
            )
        }
    };
    match env.assign(&e.target_name, updated.clone()) {
        Ok(()) => updated,
        Err(err) => Value::new_error(span, err.to_string()),
    }
}

fn eval_if(e: &IfExpr, env: &Environment) -> Value {
    let condition = eval_expr(&e.condition, env);
    if condition.is_error() {
        return condition;
    }
    if condition.is_truthy() {
        eval_block(&e.consequence, env)
    } else if let Some(alternative) = &e.alternative {
        eval_block(alternative, env)
    } else {
        Value::Null
    }
}

fn eval_ternary(e: &TernaryExpr, env: &Environment) -> Value {
    let condition = eval_expr(&e.condition, env);
    if condition.is_error() {
        return condition;
    }
    if condition.is_truthy() {
        eval_expr(&e.if_true, env)
    } else {
        eval_expr(&e.if_false, env)
    }
}

fn eval_for(e: &ForExpr, env: &Environment) -> Value {
    loop {
        let condition = eval_expr(&e.condition, env);
        if condition.is_error() {
            return condition;
        }
        if !condition.is_truthy() {
            return Value::Null;
        }
        // A fresh scope per iteration: bindings made by the body (in
        // particular consts) start over each time around, and never
        // leak into the enclosing scope.
        let scope = Environment::new_child(env);
        match eval_block(&e.body, &scope) {
            sentinel @ (Value::Return(_) | Value::Error(_)) => return sentinel,
            _ => {}
        }
    }
}

/// Iteration: arrays yield `(index, element)`, strings
/// `(index, code-point)`, hashes `(key, value)` in key order. The loop
/// variables live in a child scope.
fn eval_foreach(e: &ForeachExpr, env: &Environment) -> Value {
    let iterable = eval_expr(&e.iterable, env);
    if iterable.is_error() {
        return iterable;
    }
    let entries: Vec<(Value, Value)> = match &iterable {
        Value::Array(elements) => elements
            .iter()
            .enumerate()
            .map(|(i, el)| (Value::Int(i as i64), el.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (Value::Int(i as i64), Value::String(c.to_string())))
            .collect(),
        Value::Hash(pairs) => pairs
            .values()
            .map(|pair| (pair.key.clone(), pair.value.clone()))
            .collect(),
        other => {
            return Value::new_error(
                e.token.span,
                format!("{} object is not iterable", other.type_name()),
            )
        }
    };

    for (index, item) in entries {
        // A fresh scope per iteration, so body-local bindings (consts
        // included) do not collide with the previous time around.
        let scope = Environment::new_child(env);
        if let Some(name) = &e.index_name {
            if let Err(err) = scope.set(name, index) {
                return Value::new_error(e.token.span, err.to_string());
            }
        }
        if let Err(err) = scope.set(&e.value_name, item) {
            return Value::new_error(e.token.span, err.to_string());
        }
        match eval_block(&e.body, &scope) {
            sentinel @ (Value::Return(_) | Value::Error(_)) => return sentinel,
            _ => {}
        }
    }
    Value::Null
}

fn eval_function_define(e: &FunctionDefine, env: &Environment) -> Value {
    let func = Value::Function(Rc::new(FunctionValue {
        parameters: e.parameters.iter().map(|p| p.name.clone()).collect(),
        defaults: e.defaults.clone(),
        body: e.body.clone(),
        env: env.clone(),
    }));
    match env.set(&e.name, func.clone()) {
        Ok(()) => func,
        Err(err) => Value::new_error(e.token.span, err.to_string()),
    }
}

fn eval_call(e: &CallExpr, env: &Environment) -> Value {
    let callee = eval_expr(&e.callee, env);
    if callee.is_error() {
        return callee;
    }
    let args = match eval_expressions(&e.arguments, env) {
        Ok(args) => args,
        Err(err) => return err,
    };
    apply_function(callee, args, env, e.token.span)
}

/// Evaluate call arguments left to right, stopping at the first error.
fn eval_expressions(exprs: &[Expr], env: &Environment) -> Result<Vec<Value>, Value> {
    let mut out = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let value = eval_expr(expr, env);
        if value.is_error() {
            return Err(value);
        }
        out.push(value);
    }
    Ok(out)
}

pub(crate) fn apply_function(
    callee: Value,
    args: Vec<Value>,
    env: &Environment,
    span: Span,
) -> Value {
    match callee {
        Value::Builtin(func) => {
            let mut out = func(env, args);
            if let Value::Error(err) = &mut out {
                // Builtins have no node context; point at the call site.
                if err.span == Span::dummy() {
                    err.span = span;
                }
            }
            out
        }
        Value::Function(func) => {
            if args.len() > func.parameters.len() {
                return Value::new_error(
                    span,
                    format!(
                        "wrong number of arguments. got={}, want={}",
                        args.len(),
                        func.parameters.len()
                    ),
                );
            }
            let scope = Environment::new_child(&func.env);
            for (i, param) in func.parameters.iter().enumerate() {
                let bound = if let Some(arg) = args.get(i) {
                    arg.clone()
                } else if let Some(default) = func.defaults.get(param) {
                    // Defaults are evaluated in the callee scope, so
                    // earlier parameters are visible to them.
                    let value = eval_expr(default, &scope);
                    if value.is_error() {
                        return value;
                    }
                    value
                } else {
                    return Value::new_error(
                        span,
                        format!(
                            "wrong number of arguments. got={}, want={}",
                            args.len(),
                            func.parameters.len()
                        ),
                    );
                };
                if let Err(err) = scope.set(param, bound) {
                    return Value::new_error(span, err.to_string());
                }
            }
            match eval_block(&func.body, &scope) {
                Value::Return(inner) => *inner,
                other => other,
            }
        }
        other => Value::new_error(span, format!("not a function: {}", other.type_name())),
    }
}

/// Method dispatch on `receiver.name(args)`:
/// 1. `methods()` reflection,
/// 2. the intrinsic methods of the receiver's kind,
/// 3. a kind-qualified lookup (`string.toupper`) against user bindings
///    and the built-in registry, with the receiver prepended.
fn eval_method_call(e: &MethodCallExpr, env: &Environment) -> Value {
    let receiver = eval_expr(&e.receiver, env);
    if receiver.is_error() {
        return receiver;
    }
    let Expr::Ident(method) = &e.call.callee else {
        return Value::new_error(e.token.span, "method name must be an identifier");
    };
    let args = match eval_expressions(&e.call.arguments, env) {
        Ok(args) => args,
        Err(err) => return err,
    };
    let span = e.token.span;

    if method.name == "methods" && args.is_empty() {
        return methods_list(&receiver, env);
    }

    match (&receiver, method.name.as_str()) {
        (Value::Hash(pairs), "keys") if args.is_empty() => {
            return Value::new_array(pairs.values().map(|pair| pair.key.clone()).collect());
        }
        (Value::Int(n), "chr") if args.is_empty() => {
            let c = u32::try_from(*n)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Value::String(c.to_string());
        }
        (Value::File(handle), "read") if args.is_empty() => {
            return intrinsics::file_read(handle);
        }
        (Value::File(handle), "readlines") if args.is_empty() => {
            return intrinsics::file_readlines(handle);
        }
        (Value::File(handle), "write") if args.len() == 1 => {
            return intrinsics::file_write(handle, &args[0]);
        }
        (Value::File(handle), "close") if args.is_empty() => {
            return intrinsics::file_close(handle);
        }
        _ => {}
    }

    let qualified = format!("{}.{}", receiver.type_name(), method.name);
    let mut full_args = Vec::with_capacity(args.len() + 1);
    full_args.push(receiver.clone());
    full_args.extend(args);

    if let Some(bound) = env.get(&qualified) {
        return apply_function(bound, full_args, env, span);
    }
    if let Some(func) = intrinsics::lookup(&qualified) {
        return apply_function(Value::Builtin(func), full_args, env, span);
    }
    Value::new_error(span, format!("failed to invoke method: {}", method.name))
}

/// Sorted list of methods available on the receiver's kind: the
/// intrinsic ones plus everything registered under `<kind>.`.
fn methods_list(receiver: &Value, env: &Environment) -> Value {
    let statics: &[&str] = match receiver {
        Value::Hash(_) => &["keys", "methods"],
        Value::Int(_) => &["chr", "methods"],
        Value::File(_) => &["close", "methods", "read", "readlines", "write"],
        _ => &["methods"],
    };
    let prefix = format!("{}.", receiver.type_name());
    let mut names: Vec<String> = statics.iter().map(|s| s.to_string()).collect();
    for full in env.names_with_prefix(&prefix) {
        names.push(full[prefix.len()..].to_string());
    }
    names.sort();
    names.dedup();
    Value::new_array(names.into_iter().map(Value::String).collect())
}

fn eval_index(e: &IndexExpr, env: &Environment) -> Value {
    let target = eval_expr(&e.target, env);
    if target.is_error() {
        return target;
    }
    let index = eval_expr(&e.index, env);
    if index.is_error() {
        return index;
    }
    match (&target, &index) {
        (Value::Array(elements), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i).cloned())
            .unwrap_or(Value::Null),
        (Value::String(s), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null),
        (Value::Hash(pairs), key) => match key.hash_key() {
            Some(hash_key) => pairs
                .get(&hash_key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Value::Null),
            None => Value::new_error(
                e.token.span,
                format!("unusable as hash key: {}", key.type_name()),
            ),
        },
        _ => Value::new_error(
            e.token.span,
            format!("index operator not supported: {}", target.type_name()),
        ),
    }
}

/// Hash literals evaluate keys and values in source order; a later
/// duplicate key overwrites the earlier entry.
fn eval_hash_literal(e: &HashLit, env: &Environment) -> Value {
    let mut pairs = BTreeMap::new();
    for (key_expr, value_expr) in &e.pairs {
        let key = eval_expr(key_expr, env);
        if key.is_error() {
            return key;
        }
        let Some(hash_key) = key.hash_key() else {
            return Value::new_error(
                key_expr.token().span,
                format!("unusable as hash key: {}", key.type_name()),
            );
        };
        let value = eval_expr(value_expr, env);
        if value.is_error() {
            return value;
        }
        pairs.insert(hash_key, HashPair { key, value });
    }
    Value::new_hash(pairs)
}

fn eval_switch(e: &SwitchExpr, env: &Environment) -> Value {
    let value = eval_expr(&e.value, env);
    if value.is_error() {
        return value;
    }
    for arm in &e.cases {
        for candidate_expr in &arm.exprs {
            let candidate = eval_expr(candidate_expr, env);
            if candidate.is_error() {
                return candidate;
            }
            if switch_matches(&value, &candidate) {
                return eval_block(&arm.block, env);
            }
        }
    }
    match &e.default {
        Some(block) => eval_block(block, env),
        None => Value::Null,
    }
}

fn switch_matches(value: &Value, candidate: &Value) -> bool {
    match (value, candidate) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        _ => value == candidate,
    }
}

fn eval_assign(e: &AssignExpr, env: &Environment) -> Value {
    let span = e.token.span;
    let name = &e.name.name;
    match e.op {
        TokenKind::Assign => {
            let value = eval_expr(&e.value, env);
            if value.is_error() {
                return value;
            }
            match env.assign(name, value.clone()) {
                Ok(()) => value,
                Err(err) => Value::new_error(span, err.to_string()),
            }
        }
        TokenKind::PlusEq | TokenKind::MinusEq | TokenKind::StarEq | TokenKind::SlashEq => {
            let Some(current) = env.get(name) else {
                return Value::new_error(span, format!("identifier not found: {}", name));
            };
            let rhs = eval_expr(&e.value, env);
            if rhs.is_error() {
                return rhs;
            }
            let base = match e.op {
                TokenKind::PlusEq => TokenKind::Plus,
                TokenKind::MinusEq => TokenKind::Minus,
                TokenKind::StarEq => TokenKind::Star,
                _ => TokenKind::Slash,
            };
            let updated = eval_infix_op(base, &current, &rhs, span);
            if updated.is_error() {
                return updated;
            }
            match env.assign(name, updated.clone()) {
                Ok(()) => updated,
                Err(err) => Value::new_error(span, err.to_string()),
            }
        }
        op => Value::new_error(span, format!("unknown assignment operator: {}", op)),
    }
}

/// Backtick literals run through the host shell-split and command
/// runner, yielding the combined stdout and stderr as a string.
fn run_command(command: &str, span: Span) -> Value {
    let parts = match shell_words::split(command) {
        Ok(parts) => parts,
        Err(err) => {
            return Value::new_error(span, format!("failed to parse command: {}", err))
        }
    };
    let Some((program, rest)) = parts.split_first() else {
        return Value::new_error(span, "empty command");
    };
    match std::process::Command::new(program).args(rest).output() {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            Value::String(text)
        }
        Err(err) => Value::new_error(span, format!("failed to run command `{}`: {}", command, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic() {
        let span = Span::dummy();
        assert_eq!(
            eval_integer_infix(TokenKind::Slash, 7, 2, span),
            Value::Int(3)
        );
        assert_eq!(
            eval_integer_infix(TokenKind::Pow, 2, 10, span),
            Value::Int(1024)
        );
        assert!(eval_integer_infix(TokenKind::Slash, 1, 0, span).is_error());
        assert!(eval_integer_infix(TokenKind::Pow, 2, -1, span).is_error());
    }

    #[test]
    fn ranges_run_both_ways() {
        let span = Span::dummy();
        assert_eq!(
            eval_integer_infix(TokenKind::DotDot, 1, 3, span),
            Value::new_array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            eval_integer_infix(TokenKind::DotDot, 3, 1, span),
            Value::new_array(vec![Value::Int(3), Value::Int(2), Value::Int(1)])
        );
    }

    #[test]
    fn mixed_numerics_promote_to_float() {
        let span = Span::dummy();
        assert_eq!(
            eval_infix_op(TokenKind::Plus, &Value::Int(1), &Value::Float(2.5), span),
            Value::Float(3.5)
        );
    }

    #[test]
    fn type_mismatch_messages() {
        let span = Span::dummy();
        let out = eval_infix_op(
            TokenKind::Plus,
            &Value::Int(1),
            &Value::Bool(true),
            span,
        );
        let Value::Error(err) = out else {
            panic!("expected error");
        };
        assert_eq!(err.message, "type mismatch: integer + boolean");
    }
}

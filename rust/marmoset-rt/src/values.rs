//! Runtime value representation for the Marmoset interpreter.
//!
//! Aggregate values (Array, Hash, Function, File) are wrapped in `Rc`
//! and shared; the mutating built-ins (`push`, `set`, `delete`) return
//! updated copies instead of mutating in place. `Return` and `Error`
//! are sentinels that travel up through blocks and loops until a call
//! frame (or the program) unwraps them.

use crate::environment::Environment;
use marmoset_compiler::compiler::ast::{BlockStmt, Expr};
use marmoset_compiler::compiler::tokens::Span;
use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::BufReader;
use std::rc::Rc;

/// A host-implemented built-in: `(env, args) -> Value`.
pub type BuiltinFn = fn(&Environment, Vec<Value>) -> Value;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Rc<Vec<Value>>),
    Hash(Rc<BTreeMap<HashKey, HashPair>>),
    Regexp { pattern: String, flags: String },
    Function(Rc<FunctionValue>),
    Builtin(BuiltinFn),
    Return(Box<Value>),
    Error(Box<ErrorValue>),
    File(Rc<RefCell<FileHandle>>),
}

/// A hash entry keeps the original key object so `keys()` and iteration
/// can hand it back.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// A user function together with the environment it captured. The
/// environment is shared, not copied, so closures observe later
/// mutations of their captured bindings.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub parameters: Vec<String>,
    pub defaults: BTreeMap<String, Expr>,
    pub body: BlockStmt,
    pub env: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub message: String,
    pub span: Span,
}

#[derive(Debug)]
pub struct FileHandle {
    pub path: String,
    pub mode: String,
    pub backing: Option<FileBacking>,
}

#[derive(Debug)]
pub enum FileBacking {
    Read(BufReader<fs::File>),
    Write(fs::File),
}

/// Content-derived key for hash entries. Only integers, booleans and
/// strings are hashable; equal values of those kinds get equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey {
    pub kind: HashKind,
    pub digest: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKind {
    Bool,
    Int,
    String,
}

impl Value {
    pub fn new_array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(elements))
    }

    pub fn new_hash(pairs: BTreeMap<HashKey, HashPair>) -> Self {
        Value::Hash(Rc::new(pairs))
    }

    pub fn new_error(span: Span, message: impl Into<String>) -> Self {
        Value::Error(Box::new(ErrorValue {
            message: message.into(),
            span,
        }))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Lowercase kind name used in error messages and for method
    /// dispatch (`string.toupper`, `hash.keys`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::Regexp { .. } => "regexp",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Return(_) => "return",
            Value::Error(_) => "error",
            Value::File(_) => "file",
        }
    }

    /// `false`, `null`, `0`, `0.0` and `""` are falsy; everything else
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Bool(b) => Some(HashKey {
                kind: HashKind::Bool,
                digest: u64::from(*b),
            }),
            Value::Int(n) => Some(HashKey {
                kind: HashKind::Int,
                digest: *n as u64,
            }),
            Value::String(s) => {
                let mut hasher = DefaultHasher::new();
                s.hash(&mut hasher);
                Some(HashKey {
                    kind: HashKind::String,
                    digest: hasher.finish(),
                })
            }
            _ => None,
        }
    }

    /// Human-readable rendering: the form the REPL echoes and `puts`
    /// prints. Strings render bare, without quotes.
    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| e.inspect()).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Hash(pairs) => {
                let parts: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Regexp { pattern, flags } => format!("/{}/{}", pattern, flags),
            Value::Function(func) => {
                format!("fn({}) {}", func.parameters.join(", "), func.body)
            }
            Value::Builtin(_) => "builtin function".to_string(),
            Value::Return(inner) => inner.inspect(),
            Value::Error(err) => format!("ERROR: {}", err.message),
            Value::File(handle) => format!("<file:{}>", handle.borrow().path),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (
                Value::Regexp { pattern, flags },
                Value::Regexp {
                    pattern: p2,
                    flags: f2,
                },
            ) => pattern == p2 && flags == f2,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Return(a), Value::Return(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_have_equal_hash_keys() {
        let a = Value::String("hello".to_string());
        let b = Value::String("hello".to_string());
        assert_eq!(a.hash_key(), b.hash_key());
        assert_ne!(
            Value::String("hello".to_string()).hash_key(),
            Value::String("world".to_string()).hash_key()
        );
        assert_eq!(Value::Int(-3).hash_key(), Value::Int(-3).hash_key());
        assert_eq!(Value::Bool(true).hash_key().unwrap().digest, 1);
    }

    #[test]
    fn kinds_do_not_collide() {
        // Int 1 and Bool true share a digest but not a kind.
        let int_key = Value::Int(1).hash_key().unwrap();
        let bool_key = Value::Bool(true).hash_key().unwrap();
        assert_ne!(int_key, bool_key);
    }

    #[test]
    fn only_scalar_kinds_hash() {
        assert!(Value::new_array(vec![]).hash_key().is_none());
        assert!(Value::Null.hash_key().is_none());
        assert!(Value::Float(1.5).hash_key().is_none());
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::String(" ".to_string()).is_truthy());
        assert!(Value::new_array(vec![]).is_truthy());
    }

    #[test]
    fn inspect_forms() {
        assert_eq!(Value::Int(5).inspect(), "5");
        assert_eq!(Value::Float(3.5).inspect(), "3.5");
        assert_eq!(Value::String("hi".to_string()).inspect(), "hi");
        assert_eq!(
            Value::new_array(vec![Value::Int(1), Value::Int(2)]).inspect(),
            "[1, 2]"
        );
        assert_eq!(Value::Null.inspect(), "null");
        assert_eq!(
            Value::Regexp {
                pattern: "a.b".to_string(),
                flags: "i".to_string()
            }
            .inspect(),
            "/a.b/i"
        );
    }
}

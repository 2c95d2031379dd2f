//! Lexical environments: a shared, mutable scope chain.
//!
//! Each scope is an `Rc<RefCell<_>>` so closures share the environment
//! they captured rather than copying it. Cycles (a closure stored in a
//! binding of its own captured scope) are expected and tolerated; their
//! memory is reclaimed when the interpreter exits.

use crate::intrinsics;
use crate::values::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("assignment to constant: {0}")]
    AssignToConst(String),
    #[error("identifier not found: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone)]
pub struct Environment {
    inner: Rc<RefCell<Scope>>,
}

#[derive(Debug)]
struct Scope {
    store: HashMap<String, Binding>,
    parent: Option<Environment>,
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    constant: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new_root()
    }
}

impl Environment {
    pub fn new_root() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Scope {
                store: HashMap::new(),
                parent: None,
            })),
        }
    }

    /// A child scope; lookups fall through to the parent.
    pub fn new_child(parent: &Environment) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Scope {
                store: HashMap::new(),
                parent: Some(parent.clone()),
            })),
        }
    }

    /// Look a name up along the scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.inner.borrow();
        if let Some(binding) = scope.store.get(name) {
            return Some(binding.value.clone());
        }
        scope.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Define (or redefine) a name in this scope. Redefining a `const`
    /// is refused.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EnvError> {
        self.insert(name, value, false)
    }

    /// Define a constant in this scope.
    pub fn set_const(&self, name: &str, value: Value) -> Result<(), EnvError> {
        self.insert(name, value, true)
    }

    fn insert(&self, name: &str, value: Value, constant: bool) -> Result<(), EnvError> {
        let mut scope = self.inner.borrow_mut();
        if let Some(existing) = scope.store.get(name) {
            if existing.constant {
                return Err(EnvError::AssignToConst(name.to_string()));
            }
        }
        scope.store.insert(name.to_string(), Binding { value, constant });
        Ok(())
    }

    /// Update the nearest existing binding. Assignment never creates a
    /// binding; an unknown name is an error.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EnvError> {
        let mut scope = self.inner.borrow_mut();
        if let Some(binding) = scope.store.get_mut(name) {
            if binding.constant {
                return Err(EnvError::AssignToConst(name.to_string()));
            }
            binding.value = value;
            return Ok(());
        }
        match &scope.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(EnvError::Unknown(name.to_string())),
        }
    }

    /// All names starting with `prefix`, across the scope chain and the
    /// built-in registry. Powers the `methods()` reflection call.
    pub fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut names = intrinsics::names_with_prefix(prefix);
        self.collect_names(prefix, &mut names);
        names.sort();
        names.dedup();
        names
    }

    fn collect_names(&self, prefix: &str, out: &mut Vec<String>) {
        let scope = self.inner.borrow();
        for name in scope.store.keys() {
            if name.starts_with(prefix) {
                out.push(name.clone());
            }
        }
        if let Some(parent) = &scope.parent {
            parent.collect_names(prefix, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_bindings() {
        let root = Environment::new_root();
        root.set("x", Value::Int(1)).unwrap();
        let child = Environment::new_child(&root);
        assert_eq!(child.get("x"), Some(Value::Int(1)));
        assert_eq!(child.get("y"), None);
    }

    #[test]
    fn shadowing_does_not_touch_the_parent() {
        let root = Environment::new_root();
        root.set("x", Value::Int(1)).unwrap();
        let child = Environment::new_child(&root);
        child.set("x", Value::Int(2)).unwrap();
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(root.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assign_walks_the_chain() {
        let root = Environment::new_root();
        root.set("x", Value::Int(1)).unwrap();
        let child = Environment::new_child(&root);
        child.assign("x", Value::Int(5)).unwrap();
        assert_eq!(root.get("x"), Some(Value::Int(5)));
    }

    #[test]
    fn assign_to_unknown_name_is_an_error() {
        let root = Environment::new_root();
        assert_eq!(
            root.assign("nope", Value::Int(1)),
            Err(EnvError::Unknown("nope".to_string()))
        );
    }

    #[test]
    fn constants_refuse_updates() {
        let root = Environment::new_root();
        root.set_const("pi", Value::Float(3.14)).unwrap();
        assert_eq!(
            root.set("pi", Value::Int(3)),
            Err(EnvError::AssignToConst("pi".to_string()))
        );
        assert_eq!(
            root.assign("pi", Value::Int(3)),
            Err(EnvError::AssignToConst("pi".to_string()))
        );
        assert_eq!(root.get("pi"), Some(Value::Float(3.14)));
    }

    #[test]
    fn names_with_prefix_merges_registry_and_bindings() {
        let root = Environment::new_root();
        root.set("string.custom", Value::Int(1)).unwrap();
        let names = root.names_with_prefix("string.");
        assert!(names.contains(&"string.custom".to_string()));
        assert!(names.contains(&"string.toupper".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}

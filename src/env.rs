// ABOUTME: Lexical scope frames with parent chains, used by closures and let/lambda

use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Returns a new frame whose parent is `self`, pre-populated with
    /// `bindings`. This is the `extend(bindings) -> new env` operation:
    /// `let` and closure application both build their new frame this way
    /// rather than mutating the caller's frame.
    pub fn extend(self: &Rc<Self>, bindings: Vec<(String, Value)>) -> Rc<Self> {
        let frame = Environment::with_parent(Rc::clone(self));
        for (name, value) in bindings {
            frame.define(name, value);
        }
        frame
    }

    /// Defines a binding in THIS frame only; never walks the parent chain.
    /// Overwrites any existing local binding of the same name.
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a symbol in this frame, then recursively in parents.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }
        None
    }

    /// Recursive lookup that raises `UndefinedSymbol` on miss, carrying the
    /// full invocation expression for diagnostics (§4.4.2).
    pub fn lookup(&self, name: &str, expression: &str) -> Result<Value, EvalError> {
        self.get(name)
            .ok_or_else(|| EvalError::undefined_symbol(name, expression))
    }

    /// Updates an existing binding in whichever frame already holds it.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        if let Some(ref parent) = self.parent {
            return parent.set(name, value);
        }
        Err(EvalError::undefined_symbol(name, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::int(42));
        match env.get("x") {
            Some(Value::Number(n)) => assert_eq!(n.as_i64(), Some(42)),
            _ => panic!("expected Number(42)"),
        }
    }

    #[test]
    fn undefined_symbol_is_none() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn lookup_raises_undefined_symbol() {
        let env = Environment::new();
        let err = env.lookup("missing", "(missing)").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UndefinedSymbol);
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::int(42));
        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::int(100));
        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n.as_i64(), Some(100)),
            _ => panic!("expected Number(100)"),
        }
    }

    #[test]
    fn child_sees_parent_bindings() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::int(42));
        let child = Environment::with_parent(parent);
        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n.as_i64(), Some(42)),
            _ => panic!("expected Number(42)"),
        }
    }

    #[test]
    fn multiple_levels_resolve() {
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::int(1));
        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::int(2));
        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::int(3));

        assert!(matches!(child.get("a"), Some(Value::Number(_))));
        assert!(matches!(child.get("b"), Some(Value::Number(_))));
        assert!(matches!(child.get("c"), Some(Value::Number(_))));
    }

    #[test]
    fn extend_creates_new_frame_without_mutating_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::int(1));
        let child = parent.extend(vec![("y".to_string(), Value::int(2))]);
        assert!(child.get("x").is_some());
        assert!(child.get("y").is_some());
        assert!(parent.get("y").is_none());
    }

    #[test]
    fn set_updates_enclosing_frame() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::int(1));
        let child = Environment::with_parent(parent);
        child.set("x", Value::int(9)).unwrap();
        assert!(matches!(child.get("x"), Some(Value::Number(n)) if n.as_i64() == Some(9)));
    }
}

// ABOUTME: Nested lexical scopes with global declarations and an `ans` slot

use crate::value::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// A scope in the environment chain. Named user functions root their child
/// environment at the global root (MATLAB has no lexical nesting for named
/// functions); anonymous functions root at the environment captured when
/// the `@(...)` literal was evaluated (spec.md §3, Design Notes).
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    /// Names this scope has declared `global`; reads/writes of these
    /// redirect to the root environment instead of this scope's bindings.
    globals: RefCell<HashSet<String>>,
    parent: Option<Rc<Environment>>,
    root: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new_root() -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            globals: RefCell::new(HashSet::new()),
            parent: None,
            root: None,
        })
    }

    /// Child scope rooted at `root` (the engine's global environment),
    /// with `parent` set for ordinary lexical lookup beyond local scope.
    pub fn child_of(parent: Rc<Environment>, root: Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            globals: RefCell::new(HashSet::new()),
            parent: Some(parent),
            root: Some(root),
        })
    }

    fn root_env(&self) -> Option<&Rc<Environment>> {
        self.root.as_ref()
    }

    pub fn declare_global(self: &Rc<Self>, name: &str) {
        self.globals.borrow_mut().insert(name.to_string());
        if let Some(root) = self.root_env() {
            if root.bindings.borrow().get(name).is_none() {
                root.bindings.borrow_mut().insert(name.to_string(), Value::Empty);
            }
        }
    }

    pub fn is_global(&self, name: &str) -> bool {
        self.globals.borrow().contains(name)
    }

    /// Defines/overwrites a binding in this scope, honoring a `global`
    /// declaration by redirecting to the root instead.
    pub fn define(&self, name: &str, value: Value) {
        if self.is_global(name) {
            if let Some(root) = self.root_env() {
                root.bindings.borrow_mut().insert(name.to_string(), value);
                return;
            }
        }
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    /// Looks up a name: local scope, then this scope's global redirect if
    /// declared, then parent chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if self.is_global(name) {
            if let Some(root) = self.root_env() {
                return root.bindings.borrow().get(name).cloned();
            }
        }
        if let Some(v) = self.bindings.borrow().get(name) {
            return Some(v.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.get(name);
        }
        None
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn clear(&self, name: &str) {
        self.bindings.borrow_mut().remove(name);
    }

    pub fn clear_all(&self) {
        self.bindings.borrow_mut().clear();
    }

    pub fn names(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get_local() {
        let root = Environment::new_root();
        root.define("x", Value::scalar(1.0));
        assert_eq!(root.get("x"), Some(Value::scalar(1.0)));
    }

    #[test]
    fn child_falls_back_to_parent() {
        let root = Environment::new_root();
        root.define("x", Value::scalar(1.0));
        let child = Environment::child_of(root.clone(), root.clone());
        assert_eq!(child.get("x"), Some(Value::scalar(1.0)));
        child.define("x", Value::scalar(2.0));
        assert_eq!(child.get("x"), Some(Value::scalar(2.0)));
        assert_eq!(root.get("x"), Some(Value::scalar(1.0)));
    }

    #[test]
    fn global_redirects_to_root() {
        let root = Environment::new_root();
        let child = Environment::child_of(root.clone(), root.clone());
        child.declare_global("g");
        child.define("g", Value::scalar(5.0));
        assert_eq!(root.get("g"), Some(Value::scalar(5.0)));
    }
}

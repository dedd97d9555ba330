use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to one scope of the environment chain.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its bindings plus a link to the enclosing scope.
///
/// Closures keep their defining scope alive through the shared `Rc`, so an
/// environment lives as long as its longest holder.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap `self` into a shareable handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this scope; re‑defining overwrites.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this scope only.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Overwrite an existing binding in this scope only.  Returns `false` if
    /// the name is not bound here.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Walk `distance` parent links up from `env`.
///
/// Returns `None` if the chain is shorter than `distance`, which only happens
/// when the resolver and the runtime disagree about nesting.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let parent: EnvRef = current.borrow().enclosing.clone()?;
        current = parent;
    }

    Some(current)
}

/// Read `name` from the scope exactly `distance` hops above `env`.
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    debug!("get_at distance={} name={}", distance, name);

    ancestor(env, distance)?.borrow().get(name)
}

/// Write `name` in the scope exactly `distance` hops above `env`.
pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
    debug!("assign_at distance={} name={}", distance, name);

    match ancestor(env, distance) {
        Some(scope) => scope.borrow_mut().assign(name, value),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_walks_parent_links() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let block = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        let inner = Environment::with_enclosing(Rc::clone(&block)).into_ref();

        assert_eq!(get_at(&inner, 2, "a"), Some(Value::Number(1.0)));
        assert_eq!(get_at(&inner, 1, "a"), None);
        assert!(ancestor(&inner, 3).is_none());
    }

    #[test]
    fn assign_only_touches_existing_bindings() {
        let globals = Environment::new().into_ref();
        let block = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        block.borrow_mut().define("x", Value::Nil);

        assert!(assign_at(&block, 0, "x", Value::Bool(true)));
        assert!(!assign_at(&block, 1, "x", Value::Bool(true)));
        assert_eq!(block.borrow().get("x"), Some(Value::Bool(true)));
    }
}

use crate::error::{LoxError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures and nested scopes hold these, so a
/// scope lives as long as its longest holder.
pub type EnvRef = Rc<RefCell<Environment>>;

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

    /// Wraps a fresh child scope of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Binds `name` in this scope, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Assignment never creates a binding.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Reads `name` exactly `distance` scopes out.
    ///
    /// A chain shorter than `distance` means the resolver and the runtime
    /// disagree about scope shape, which is an internal error.  A scope that
    /// exists but has no binding yet (a hoisted function reading a local
    /// declared after the call site) is a user‑level undefined variable.
    pub fn get_at(&self, distance: usize, name: &str, line: usize) -> Result<Value> {
        if distance == 0 {
            return self
                .values
                .get(name)
                .cloned()
                .ok_or_else(|| undefined(name, line));
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_at(distance - 1, name, line),
            None => Err(scope_mismatch(name, line)),
        }
    }

    /// Writes `name` exactly `distance` scopes out.  Same failure rules as
    /// [`Environment::get_at`].
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value, line: usize) -> Result<()> {
        if distance == 0 {
            return match self.values.get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(undefined(name, line)),
            };
        }

        match &self.enclosing {
            Some(enclosing) => enclosing
                .borrow_mut()
                .assign_at(distance - 1, name, value, line),
            None => Err(scope_mismatch(name, line)),
        }
    }
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(line, format!("Undefined variable '{}'.", name))
}

fn scope_mismatch(name: &str, line: usize) -> LoxError {
    LoxError::Internal(format!(
        "resolved scope for '{}' on line {} is deeper than the environment chain",
        name, line
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_shadows_outer_binding() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::child_of(&outer);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(inner.borrow().get("a", 1).unwrap(), Value::Number(2.0));
        assert_eq!(outer.borrow().get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn redefining_in_same_scope_is_allowed() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Bool(true));

        assert_eq!(env.get("a", 1).unwrap(), Value::Bool(true));
    }

    #[test]
    fn assign_walks_outward_and_never_creates() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Nil);

        let inner = Environment::child_of(&outer);
        inner.borrow_mut().assign("a", Value::Number(3.0), 1).unwrap();
        assert_eq!(outer.borrow().get("a", 1).unwrap(), Value::Number(3.0));

        let err = inner.borrow_mut().assign("b", Value::Nil, 7).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'b'.\n[line 7]");
        assert!(inner.borrow().get("b", 7).is_err());
    }

    #[test]
    fn get_at_and_assign_at_jump_exact_distance() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("x", Value::from("global"));

        let middle = Environment::child_of(&global);
        middle.borrow_mut().define("x", Value::from("middle"));

        let inner = Environment::child_of(&middle);

        assert_eq!(inner.borrow().get_at(1, "x", 1).unwrap(), Value::from("middle"));
        assert_eq!(inner.borrow().get_at(2, "x", 1).unwrap(), Value::from("global"));

        inner
            .borrow_mut()
            .assign_at(2, "x", Value::from("changed"), 1)
            .unwrap();
        assert_eq!(global.borrow().get("x", 1).unwrap(), Value::from("changed"));
        assert_eq!(middle.borrow().get("x", 1).unwrap(), Value::from("middle"));
    }

    #[test]
    fn distance_past_the_chain_is_internal() {
        let env = Environment::new();
        let err = env.get_at(3, "x", 1).unwrap_err();

        assert!(err.is_fatal());
    }
}

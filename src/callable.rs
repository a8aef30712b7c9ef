//! Callable runtime objects: user functions, host functions and methods
//! bound to a receiver.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::Instance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Completion, Interpreter};
use crate::value::Value;

/// Signature of a host function.  An `Err` becomes a runtime error at the
/// call site.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// Anything that can appear before `(` at runtime, apart from classes.
#[derive(Clone)]
pub enum Callable {
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Bound(Rc<BoundMethod>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::Native(native) => native.arity,
            Callable::Bound(bound) => bound.method.arity(),
        }
    }

    /// Invoke with arguments whose count already matches [`Callable::arity`].
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, line: usize) -> Result<Value> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::Native(native) => native.call(&arguments, line),
            Callable::Bound(bound) => bound.method.call(interpreter, arguments),
        }
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Bound(a), Callable::Bound(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "{}", function),
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Bound(bound) => write!(f, "{}", bound.method),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self)
    }
}

/// A function or method written in Lox, closed over the scope it was
/// declared in.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn name(&self) -> Option<&str> {
        self.declaration.name.as_ref().map(|n| &*n.name)
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling function {}", self);

        let environment = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.name, argument);
        }

        let completion = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return self
                .closure
                .borrow()
                .get_at(0, "this", self.declaration.line);
        }

        match completion {
            Completion::Return(value) => Ok(value),
            Completion::Normal => Ok(Value::Nil),
            Completion::Break => Err(LoxError::Internal(format!(
                "'break' escaped the body of {}",
                self
            ))),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<fn {}>", name),
            None => write!(f, "<fn>"),
        }
    }
}

/// A host function with fixed arity.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl NativeFunction {
    fn call(&self, arguments: &[Value], line: usize) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(arguments).map_err(|message| LoxError::runtime(line, message))
    }
}

/// A method value permanently attached to one receiver.  The receiver
/// lives in the method's closure as `this`.
pub struct BoundMethod {
    pub method: Function,
}

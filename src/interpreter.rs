//! Tree‑walking evaluator.
//!
//! Statements return a [`Completion`] instead of unwinding: `return` and
//! `break` travel up as ordinary values until the function call or loop that
//! consumes them.  Errors travel separately as [`LoxError`].
//!
//! Variable access is driven entirely by the [`Resolution`] slots the
//! resolver filled in; nothing is re‑resolved here.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info, trace};

use crate::ast::{
    BinaryOp, Binding, Expr, FunctionDecl, Identifier, LiteralValue, LogicalOp, Resolution, Stmt,
    UnaryOp,
};
use crate::callable::{BoundMethod, Callable, Function, NativeFunction};
use crate::class::{Class, Instance, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Default limit on nested Lox calls before reporting a stack overflow.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal,
    Return(Value),
    Break,
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    out: Box<dyn Write>,
    depth: usize,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter printing to stdout, with native functions
    /// such as `clock` defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let micros = Utc::now().timestamp_micros();
                    Ok(Value::Number(micros as f64 / 1_000_000.0))
                },
            }))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            out,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn set_max_call_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Interprets a list of resolved top‑level statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Completion::Normal) => {}
                Ok(signal) => {
                    return Err(LoxError::Internal(format!(
                        "{:?} reached the top level on line {}",
                        signal,
                        stmt.line()
                    )));
                }
                Err(e) => {
                    self.reset();
                    return Err(e);
                }
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Back to the global scope after an aborted execution unit.
    fn reset(&mut self) {
        self.environment = Rc::clone(&self.globals);
        self.depth = 0;
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Completion> {
        ensure_sufficient_stack(|| self.execute_inner(stmt))
    }

    fn execute_inner(&mut self, stmt: &Stmt) -> Result<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                trace!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}'", name.name);
                self.environment.borrow_mut().define(&name.name, value);
            }

            Stmt::Block(statements) => {
                let environment = Environment::child_of(&self.environment);
                return self.execute_block(statements, environment);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Completion::Normal => {}
                        Completion::Break => break,
                        ret @ Completion::Return(_) => return Ok(ret),
                    }
                }
            }

            Stmt::Function(decl) => {
                if let Some(name) = &decl.name {
                    debug!("Defining function '{}'", name.name);

                    let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                    self.environment
                        .borrow_mut()
                        .define(&name.name, Value::Callable(Callable::Function(Rc::new(function))));
                }
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                return Ok(Completion::Return(value));
            }

            Stmt::Break { .. } => return Ok(Completion::Break),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.declare_class(name, superclass.as_ref(), methods)?,
        }

        Ok(Completion::Normal)
    }

    /// Runs `statements` in `environment`, restoring the current scope on
    /// every exit path.
    ///
    /// Function declarations directly inside the block are defined before
    /// anything runs, so sibling functions can call each other regardless
    /// of order.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Completion> {
        let previous = mem::replace(&mut self.environment, environment);
        let result = self.run_hoisted(statements);
        self.environment = previous;
        result
    }

    fn run_hoisted(&mut self, statements: &[Stmt]) -> Result<Completion> {
        for stmt in statements {
            if let Stmt::Function(_) = stmt {
                self.execute(stmt)?;
            }
        }

        for stmt in statements {
            if let Stmt::Function(_) = stmt {
                continue;
            }

            match self.execute(stmt)? {
                Completion::Normal => {}
                signal => return Ok(signal),
            }
        }

        Ok(Completion::Normal)
    }

    fn declare_class(
        &mut self,
        name: &Identifier,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.name);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(LoxError::runtime(expr.line(), "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&name.name, Value::Nil);

        let method_env: EnvRef = match &superclass {
            Some(parent) => {
                let env = Environment::child_of(&self.environment);
                env.borrow_mut()
                    .define("super", Value::Class(Rc::clone(parent)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let mut table: HashMap<String, Rc<Function>> = HashMap::new();

        for method in methods {
            let Some(method_name) = &method.name else {
                continue;
            };

            let function = Function::new(
                Rc::clone(method),
                Rc::clone(&method_env),
                &*method_name.name == INITIALIZER,
            );

            table.insert(method_name.name.to_string(), Rc::new(function));
        }

        let class = Class::new(&name.name, superclass, table);

        self.environment
            .borrow_mut()
            .assign(&name.name, Value::Class(Rc::new(class)), name.line)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(Rc::clone(s)),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable { name, resolution } => self.look_up_variable(&name.name, name.line, resolution),

            Expr::Assign {
                name,
                value,
                resolution,
            } => {
                let value = self.evaluate(value)?;
                self.assign_variable(name, value.clone(), resolution)?;
                Ok(value)
            }

            Expr::Unary {
                operator,
                right,
                line,
            } => {
                let right = self.evaluate(right)?;

                match operator {
                    UnaryOp::Not => Ok(Value::Bool(!right.is_truthy())),
                    UnaryOp::Negate => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(*line, "Operand must be a number.")),
                    },
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
                line,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                binary(*operator, left, right, *line)
            }

            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;

                let decided = match operator {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Call {
                callee,
                line,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call(callee, values, *line)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(name.line, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(&name.name, value.clone());

                Ok(value)
            }

            Expr::This { line, resolution } => self.look_up_variable("this", *line, resolution),

            Expr::Super {
                line,
                method,
                resolution,
            } => self.super_method(*line, method, resolution),

            Expr::Lambda(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                Ok(Value::Callable(Callable::Function(Rc::new(function))))
            }
        }
    }

    fn look_up_variable(&self, name: &str, line: usize, resolution: &Resolution) -> Result<Value> {
        match resolution.get() {
            Some(Binding::Local(distance)) => self.environment.borrow().get_at(distance, name, line),
            Some(Binding::Global) => self.globals.borrow().get(name, line),
            None => Err(unresolved(name, line)),
        }
    }

    fn assign_variable(&self, name: &Identifier, value: Value, resolution: &Resolution) -> Result<()> {
        match resolution.get() {
            Some(Binding::Local(distance)) => {
                self.environment
                    .borrow_mut()
                    .assign_at(distance, &name.name, value, name.line)
            }
            Some(Binding::Global) => self.globals.borrow_mut().assign(&name.name, value, name.line),
            None => Err(unresolved(&name.name, name.line)),
        }
    }

    /// `super.method`: the superclass sits at the resolved distance and the
    /// receiver (`this`) one scope closer.
    fn super_method(&self, line: usize, method: &Identifier, resolution: &Resolution) -> Result<Value> {
        let Some(Binding::Local(distance)) = resolution.get() else {
            return Err(unresolved("super", line));
        };

        let Value::Class(superclass) = self.environment.borrow().get_at(distance, "super", line)? else {
            return Err(LoxError::Internal(format!("'super' is not a class on line {}", line)));
        };

        let this_distance = distance
            .checked_sub(1)
            .ok_or_else(|| LoxError::Internal(format!("'super' resolved at distance 0 on line {}", line)))?;

        let Value::Instance(receiver) = self.environment.borrow().get_at(this_distance, "this", line)? else {
            return Err(LoxError::Internal(format!("'this' is not an instance on line {}", line)));
        };

        let Some(found) = superclass.find_method(&method.name) else {
            return Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.name),
            ));
        };

        let bound = BoundMethod {
            method: found.bind(receiver),
        };

        Ok(Value::Callable(Callable::Bound(Rc::new(bound))))
    }

    /// Invokes a callable or instantiates a class.
    pub fn call(&mut self, callee: Value, arguments: Vec<Value>, line: usize) -> Result<Value> {
        let arity = match &callee {
            Value::Callable(callable) => callable.arity(),
            Value::Class(class) => class.arity(),
            other => {
                return Err(LoxError::runtime(
                    line,
                    format!(
                        "{} value is not callable. Can only call functions and classes.",
                        other.type_name()
                    ),
                ));
            }
        };

        if arguments.len() != arity {
            return Err(LoxError::runtime(
                line,
                format!("Expected {} arguments but got {}.", arity, arguments.len()),
            ));
        }

        if self.depth >= self.max_depth {
            return Err(LoxError::StackOverflow { line });
        }

        self.depth += 1;
        trace!("Entering call depth {}", self.depth);

        let result = match &callee {
            Value::Class(class) => Class::instantiate(class, self, arguments),
            Value::Callable(callable) => callable.call(self, arguments, line),
            _ => Ok(Value::Nil),
        };

        self.depth -= 1;
        result
    }
}

fn unresolved(name: &str, line: usize) -> LoxError {
    LoxError::Internal(format!("'{}' on line {} was never resolved", name, line))
}

/// Arithmetic, comparison and equality on already evaluated operands.
fn binary(operator: BinaryOp, left: Value, right: Value, line: usize) -> Result<Value> {
    match operator {
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        BinaryOp::Add => {
            return match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => {
                    let mut joined = String::with_capacity(a.len() + b.len());
                    joined.push_str(&a);
                    joined.push_str(&b);
                    Ok(Value::String(Rc::from(joined)))
                }
                (a, b) => Err(LoxError::runtime(
                    line,
                    format!(
                        "Operands must be two numbers or two strings, got {} and {}.",
                        a.type_name(),
                        b.type_name()
                    ),
                )),
            };
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(LoxError::runtime(line, "Operands must be numbers."));
    };

    Ok(match operator {
        BinaryOp::Subtract => Value::Number(a - b),
        BinaryOp::Multiply => Value::Number(a * b),
        BinaryOp::Divide => {
            if b == 0.0 {
                return Err(LoxError::runtime(line, "Division by zero."));
            }
            Value::Number(a / b)
        }
        BinaryOp::Greater => Value::Bool(a > b),
        BinaryOp::GreaterEqual => Value::Bool(a >= b),
        BinaryOp::Less => Value::Bool(a < b),
        BinaryOp::LessEqual => Value::Bool(a <= b),
        BinaryOp::Add | BinaryOp::Equal | BinaryOp::NotEqual => Value::Nil,
    })
}

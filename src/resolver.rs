//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, self‑read in initializer, misplaced
//!    `return`/`break`/`this`/`super`).
//! 3. Record, in each variable occurrence's [`Resolution`] slot, whether it is
//!    a local (and at what distance) or a global, so the interpreter never
//!    falls back to dynamic lookup that would see a later shadowing local.
//!
//! Errors do not stop the walk; every one found is returned in a single
//! [`LoxError::Compile`] batch.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, trace};

use crate::ast::{Binding, Expr, FunctionDecl, Identifier, Resolution, Stmt};
use crate::class::INITIALIZER;
use crate::error::{LoxError, Result};
use crate::stack::ensure_sufficient_stack;

/// What kind of function body we are in.  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body we are in.  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) straight into the tree.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,

    /// Scope index and name of the `var` whose initializer is being resolved.
    pending_initializer: Option<(usize, Rc<str>)>,

    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
            pending_initializer: None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            info!("Resolve pass found {} error(s)", self.errors.len());
            Err(LoxError::batch(std::mem::take(&mut self.errors)))
        }
    }

    fn error(&mut self, line: usize, lexeme: &str, message: &str) {
        self.errors.push(LoxError::resolve(line, lexeme, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.resolve_stmt_inner(stmt))
    }

    fn resolve_stmt_inner(&mut self, stmt: &Stmt) {
        trace!("Resolving stmt on line {}", stmt.line());

        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_body(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);

                if let Some(expr) = initializer {
                    if !self.scopes.is_empty() && is_bare_reference_to(expr, &name.name) {
                        self.error(
                            name.line,
                            &name.name,
                            "Can't read local variable in its own initializer.",
                        );
                    }

                    let saved = self.pending_initializer.take();
                    if let Some(index) = self.scopes.len().checked_sub(1) {
                        self.pending_initializer = Some((index, Rc::clone(&name.name)));
                    }

                    self.resolve_expr(expr);

                    self.pending_initializer = saved;
                }

                self.define(name);
            }

            Stmt::Function(decl) => {
                // Name is visible inside its own body.
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(name);
                }
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);

                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::Return { line, value } => {
                if self.current_function == FunctionType::None {
                    self.error(*line, "return", "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }

            Stmt::Break { line } => {
                if self.loop_depth == 0 {
                    self.error(*line, "break", "Can't use 'break' outside of a loop.");
                }
            }
        }
    }

    /// Resolves the statements of a block or function body in the current
    /// scope.  Named function declarations are bound first so they can refer
    /// to each other in any order.
    fn resolve_body(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            if let Stmt::Function(decl) = stmt {
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(name);
                }
            }
        }

        for stmt in statements {
            match stmt {
                Stmt::Function(decl) => self.resolve_function(decl, FunctionType::Function),
                other => self.resolve_stmt(other),
            }
        }
    }

    fn resolve_class(&mut self, name: &Identifier, superclass: Option<&Expr>, methods: &[Rc<FunctionDecl>]) {
        debug!("Resolving class '{}'", name.name);

        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(parent) = superclass {
            if let Expr::Variable { name: parent_name, .. } = parent {
                if parent_name.name == name.name {
                    self.error(parent_name.line, &parent_name.name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(parent);

            self.begin_scope();
            self.define_name("super");
        }

        self.begin_scope();
        self.define_name("this");

        for method in methods {
            let kind = match &method.name {
                Some(method_name) if &*method_name.name == INITIALIZER => FunctionType::Initializer,
                _ => FunctionType::Method,
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.resolve_expr_inner(expr))
    }

    fn resolve_expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { name, resolution } => {
                self.resolve_local(&name.name, resolution);
            }

            Expr::Assign {
                name,
                value,
                resolution,
            } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(&name.name, resolution);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { line, resolution } => {
                if self.current_class == ClassType::None {
                    self.error(*line, "this", "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local("this", resolution);
            }

            Expr::Super {
                line, resolution, ..
            } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(*line, "super", "Can't use 'super' outside of a class.");
                        return;
                    }
                    ClassType::Class => {
                        self.error(
                            *line,
                            "super",
                            "Can't use 'super' in a class with no superclass.",
                        );
                        return;
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local("super", resolution);
            }

            Expr::Lambda(decl) => self.resolve_function(decl, FunctionType::Function),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        let enclosing_loops = self.loop_depth;
        let enclosing_pending = self.pending_initializer.take();

        self.current_function = kind;
        self.loop_depth = 0;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_body(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loops;
        self.pending_initializer = enclosing_pending;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Identifier) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&*name.name) {
            self.error(
                name.line,
                &name.name,
                "Already a variable with this name in this scope.",
            );
            return;
        }

        scope.insert(name.name.to_string(), false);
    }

    fn define(&mut self, name: &Identifier) {
        self.define_name(&name.name);
    }

    fn define_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at distance `d`, or as a global if
    /// no tracked scope declares it.
    ///
    /// The binding whose initializer is being resolved is not visible yet;
    /// the lookup continues past it.
    fn resolve_local(&self, name: &str, resolution: &Resolution) {
        let skip = match &self.pending_initializer {
            Some((index, pending)) if &**pending == name => Some(*index),
            _ => None,
        };

        for (index, scope) in self.scopes.iter().enumerate().rev() {
            if Some(index) == skip {
                continue;
            }

            if scope.contains_key(name) {
                let distance = self.scopes.len() - 1 - index;
                trace!("Resolved '{}' at distance {}", name, distance);
                resolution.set(Binding::Local(distance));
                return;
            }
        }

        trace!("Resolved '{}' as global", name);
        resolution.set(Binding::Global);
    }
}

/// `a` or `(a)`, possibly nested in more parentheses.
fn is_bare_reference_to(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Variable { name: var, .. } => &*var.name == name,
        Expr::Grouping(inner) => is_bare_reference_to(inner, name),
        _ => false,
    }
}

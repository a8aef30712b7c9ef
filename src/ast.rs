//! **Abstract syntax tree** produced by the [`Parser`](crate::parser::Parser).
//!
//! The tree owns all of its data so it can outlive the source text and the
//! token buffer (the REPL keeps functions from earlier lines alive).  Function
//! declarations sit behind `Rc` so that every runtime function value created
//! from a declaration shares the one body instead of copying it.
//!
//! Consumers (resolver, interpreter, printer) match exhaustively on [`Expr`]
//! and [`Stmt`]; nodes carry no behaviour beyond reporting their line.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A name as written in the source, with the line it appeared on.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: Rc<str>,
    pub line: usize,
}

impl Identifier {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: Rc::from(name),
            line,
        }
    }
}

/// Where the resolver found a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Number of scopes to walk outward, 0 being the innermost.
    Local(usize),

    /// Not found in any tracked scope; looked up in globals at runtime.
    Global,
}

/// Resolution slot attached to `Variable`, `Assign`, `This` and `Super`
/// nodes.  Written once per resolve pass, read by the interpreter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution(Cell<Option<Binding>>);

impl Resolution {
    pub fn get(&self) -> Option<Binding> {
        self.0.get()
    }

    pub fn set(&self, binding: Binding) {
        self.0.set(Some(binding));
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(Rc<str>),

    /// The boolean constants `true` / `false`.
    Bool(bool),

    /// The `nil` literal.
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

/// Every kind of *expression* in Lox.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal { value: LiteralValue, line: usize },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access.
    Variable {
        name: Identifier,
        resolution: Resolution,
    },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        name: Identifier,
        value: Box<Expr>,
        resolution: Resolution,
    },

    /// Prefix unary operator expression: `!isReady` or `-42`
    Unary {
        operator: UnaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
        line: usize,
    },

    /// Function‑, method‑ or class‑call expression.
    Call {
        callee: Box<Expr>,
        /// Line of the closing `)`, retained for error reporting.
        line: usize,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Identifier },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Identifier,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { line: usize, resolution: Resolution },

    /// `super.method` inside a subclass method.
    Super {
        line: usize,
        method: Identifier,
        resolution: Resolution,
    },

    /// Anonymous function: `fun (a, b) { ... }`.
    Lambda(Rc<FunctionDecl>),
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Logical { line, .. }
            | Expr::Call { line, .. }
            | Expr::This { line, .. }
            | Expr::Super { line, .. } => *line,

            Expr::Grouping(inner) => inner.line(),

            Expr::Variable { name, .. }
            | Expr::Assign { name, .. }
            | Expr::Get { name, .. }
            | Expr::Set { name, .. } => name.line,

            Expr::Lambda(decl) => decl.line,
        }
    }
}

/// A function body shared by the declaring statement and every runtime
/// function value built from it.  Anonymous functions have no name.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<Identifier>,
    pub params: Vec<Identifier>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

/// Complete executable constructs.  A program is a sequence of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Identifier,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop.  `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    /// Named function declaration.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.  Absent value ⇒ `nil`.
    Return { line: usize, value: Option<Expr> },

    /// `break` out of the innermost loop.
    Break { line: usize },

    /// Class declaration with optional superclass (always an `Expr::Variable`).
    Class {
        name: Identifier,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Expression(expr) | Stmt::Print(expr) => expr.line(),
            Stmt::Var { name, .. } | Stmt::Class { name, .. } => name.line,
            Stmt::Block(statements) => statements.first().map_or(0, Stmt::line),
            Stmt::If { condition, .. } | Stmt::While { condition, .. } => condition.line(),
            Stmt::Function(decl) => decl.line,
            Stmt::Return { line, .. } | Stmt::Break { line } => *line,
        }
    }
}

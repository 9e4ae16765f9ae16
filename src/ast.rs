//! Syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes borrow their tokens from the scanner's token buffer, so the whole
//! tree lives for `'a`.  The tree is immutable once built; later passes
//! (resolver, interpreter, printer) are exhaustive `match`es over it.

use std::fmt;

use crate::token::Token;

/// Stable identity of a name-bearing expression node.
///
/// Assigned by the parser to every `Variable`, `Assign` and `This` node and
/// used as the key of the resolver's distance map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Literal(LiteralValue),

    /// `!x` or `-x`
    Unary {
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Arithmetic, comparison, equality and the comma operator.
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// `condition ? then_branch : else_branch`
    Conditional {
        condition: Box<Expr<'a>>,
        then_branch: Box<Expr<'a>>,
        else_branch: Box<Expr<'a>>,
    },

    Grouping(Box<Expr<'a>>),

    Variable {
        id: ExprId,
        name: &'a Token<'a>,
    },

    Assign {
        id: ExprId,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    Call {
        callee: Box<Expr<'a>>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: &'a Token<'a>,
        arguments: Vec<Expr<'a>>,
    },

    /// object.property
    Get {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
    },

    /// object.property = value
    Set {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    This {
        id: ExprId,
        keyword: &'a Token<'a>,
    },
}

/// A named function or method: `name(params) { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl<'a> {
    pub name: &'a Token<'a>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<&'a Token<'a>>,

    pub body: Vec<Stmt<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Expression(Expr<'a>),

    Print(Expr<'a>),

    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    Block(Vec<Stmt<'a>>),

    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },

    /// Kept distinct from `While` so `continue` still runs `increment`.
    For {
        initializer: Option<Box<Stmt<'a>>>,
        condition: Option<Expr<'a>>,
        increment: Option<Expr<'a>>,
        body: Box<Stmt<'a>>,
    },

    Break(&'a Token<'a>),

    Continue(&'a Token<'a>),

    Function(FunctionDecl<'a>),

    Return {
        keyword: &'a Token<'a>,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr<'a>>,
    },

    Class {
        name: &'a Token<'a>,

        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr<'a>>,

        methods: Vec<FunctionDecl<'a>>,
    },
}

//! Static resolver pass for the **Rox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return` / `break` / `continue` / `this`, self-inheritance).
//! 3. Record, for *each* variable occurrence, how many frames separate it from
//!    its declaration.  Occurrences with no entry are globals, looked up by name
//!    at run time.
//!
//! The output depends only on the tree: resolving the same statements twice
//! yields the same [`Locals`].

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::INITIALIZER;
use log::{debug, info};
use std::collections::HashMap;

/// Resolution map: node → number of frames between use and declaration.
pub type Locals = HashMap<ExprId, usize>;

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

/// Innermost construct that decides whether `break` / `continue` are legal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BlockKind {
    Global,
    Function,
    Loop,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances (locals vs. globals).
pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    locals: Locals,
    errors: Vec<LoxError>,
    current_function: FunctionKind,
    current_block: BlockKind,
    current_class: ClassKind,
}

impl<'a> Default for Resolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            locals: HashMap::new(),
            errors: Vec::new(),
            current_function: FunctionKind::None,
            current_block: BlockKind::Global,
            current_class: ClassKind::None,
        }
    }

    /// Walk all top‑level statements.  Every static error is collected; if
    /// there are any, no distance map is produced.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> Result<Locals> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.locals.len());

            Ok(self.locals)
        } else {
            Err(LoxError::from_batch(self.errors))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(function) => {
                // name is visible *inside* its own body
                self.declare(function.name);
                self.define(function.name);
                self.resolve_function(function, FunctionKind::Function);
            }

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
                self.resolve_loop_body(body);
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // one frame for the loop variable, shared by every iteration
                self.begin_scope();
                if let Some(init) = initializer {
                    self.resolve_stmt(init);
                }
                if let Some(cond) = condition {
                    self.resolve_expr(cond);
                }
                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }
                self.resolve_loop_body(body);
                self.end_scope();
            }

            Stmt::Break(keyword) => {
                if self.current_block != BlockKind::Loop {
                    self.error(keyword, "Can't use 'break' outside of a loop.");
                }
            }

            Stmt::Continue(keyword) => {
                if self.current_block != BlockKind::Loop {
                    self.error(keyword, "Can't use 'continue' outside of a loop.");
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionKind::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_loop_body(&mut self, body: &Stmt<'a>) {
        let enclosing = self.current_block;
        self.current_block = BlockKind::Loop;

        self.resolve_stmt(body);

        self.current_block = enclosing;
    }

    fn resolve_class(
        &mut self,
        name: &Token<'a>,
        superclass: Option<&Expr<'a>>,
        methods: &[FunctionDecl<'a>],
    ) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing_class = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = superclass
            {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }
            self.resolve_expr(superclass);
        }

        // synthetic frame holding the receiver
        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("this", true);
        }

        for method in methods {
            let kind = if method.name.lexeme == INITIALIZER {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        self.define(name);

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
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

            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, function: &FunctionDecl<'a>, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        let enclosing_block = self.current_block;
        self.current_function = kind;
        self.current_block = BlockKind::Function;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_block = enclosing_block;
        self.current_function = enclosing_function;
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

    /// Only a second declaration in the *same* frame is an error; shadowing an
    /// outer frame is fine.  Globals are never checked.
    fn declare(&mut self, name: &Token<'a>) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.insert(name.lexeme, false).is_some() {
            self.error(name, "Already a variable with this name in this scope.");
        }
    }

    fn define(&mut self, name: &Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, true);
        }
    }

    fn error(&mut self, token: &Token<'_>, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at distance `d`, or leave it out of
    /// the map if no enclosing scope declares it (a global).
    fn resolve_local(&mut self, id: ExprId, name: &Token<'a>) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' {} at distance {}", name.lexeme, id, distance);
                self.locals.insert(id, distance);
                return;
            }
        }

        debug!("Resolved '{}' {} as global", name.lexeme, id);
    }
}

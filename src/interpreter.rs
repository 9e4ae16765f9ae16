//! Tree-walking evaluator.
//!
//! Statements produce a [`Flow`] describing how control leaves them; runtime
//! faults travel separately as [`LoxError`].  Each non-normal flow has one
//! interception point: loops absorb `Break` / `Continue`, calls absorb
//! `Return`.  Everything else passes it outward untouched.

use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{Callable, Class, Function, Instance, NativeFunction, Value, INITIALIZER};

/// Deepest chain of nested calls before a program is stopped with a runtime
/// error.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Below this much remaining native stack, a call moves onto a fresh segment.
const RED_ZONE: usize = 128 * 1024;

/// Size of each extra stack segment.
const STACK_SEGMENT: usize = 1024 * 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow<'a> {
    Normal,
    Break,
    Continue,
    Return(Value<'a>),
}

pub struct Interpreter<'a, W: Write = Stdout> {
    globals: EnvRef<'a>,
    environment: EnvRef<'a>,
    locals: Locals,
    out: W,
    call_line: usize,
    call_depth: usize,
}

impl<'a> Interpreter<'a, Stdout> {
    /// An interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<'a> Default for Interpreter<'a, Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, W: Write> Interpreter<'a, W> {
    /// Creates an interpreter writing `print` output to `out`, with native
    /// functions such as `clock` defined in the globals.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef<'a> = Rc::new(std::cell::RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction::new("clock", 0, |_args| {
                let timestamp: f64 = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                    .as_secs_f64();
                Ok(Value::Number(timestamp))
            }))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            call_line: 0,
            call_depth: 0,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Line of the call expression currently being dispatched.
    pub fn current_line(&self) -> usize {
        self.call_line
    }

    /// Adopt a resolution map.  Maps from earlier batches are kept, so a
    /// session can resolve and run one batch at a time.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Adopting {} resolved local(s)", locals.len());

        self.locals.extend(locals);
    }

    /// Runs a resolved program.  A runtime error stops this batch only; the
    /// interpreter stays usable and keeps its globals.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Runs `statements` inside `environment`, restoring the previous
    /// environment on every exit path.
    pub(crate) fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: EnvRef<'a>,
    ) -> Result<Flow<'a>> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;

        result
    }

    fn execute_all(&mut self, statements: &'a [Stmt<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                exit => return Ok(exit),
            }
        }

        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Environment::nested(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                let environment = Environment::nested(&self.environment);
                let previous = std::mem::replace(&mut self.environment, environment);
                let result = self.execute_for(
                    initializer.as_deref(),
                    condition.as_ref(),
                    increment.as_ref(),
                    body,
                );
                self.environment = previous;

                result
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Continue(_) => Ok(Flow::Continue),

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = Function::new(declaration, Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                // placeholder first, so methods can refer to the class by name
                self.environment
                    .borrow_mut()
                    .define(name.lexeme, Value::Nil);

                let superclass = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let at = match expr {
                                Expr::Variable { name, .. } => *name,
                                _ => *name,
                            };
                            return Err(LoxError::runtime(at, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                let methods: HashMap<String, Function<'a>> = methods
                    .iter()
                    .map(|method| {
                        let is_initializer = method.name.lexeme == INITIALIZER;
                        (
                            method.name.lexeme.to_string(),
                            Function::new(method, Rc::clone(&self.environment), is_initializer),
                        )
                    })
                    .collect();

                let class = Class::new(name.lexeme, superclass, methods);
                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;

                Ok(Flow::Normal)
            }
        }
    }

    fn execute_for(
        &mut self,
        initializer: Option<&'a Stmt<'a>>,
        condition: Option<&'a Expr<'a>>,
        increment: Option<&'a Expr<'a>>,
        body: &'a Stmt<'a>,
    ) -> Result<Flow<'a>> {
        if let Some(init) = initializer {
            self.execute(init)?;
        }

        loop {
            if let Some(cond) = condition {
                if !self.evaluate(cond)?.is_truthy() {
                    break;
                }
            }

            match self.execute(body)? {
                Flow::Break => break,
                Flow::Normal | Flow::Continue => {}
                Flow::Return(value) => return Ok(Flow::Return(value)),
            }

            if let Some(inc) = increment {
                self.evaluate(inc)?;
            }
        }

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(
                            &self.environment,
                            distance,
                            name.lexeme,
                            value.clone(),
                        )
                        .ok_or_else(|| unresolved(name, distance))?;
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    values.push(self.evaluate(arg)?);
                }

                match callee {
                    Value::Native(native) => self.invoke(native.as_ref(), paren, values),
                    Value::Function(function) => self.invoke(function.as_ref(), paren, values),
                    Value::Class(class) => self.invoke(&class, paren, values),
                    _ => Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    )),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token<'_>) -> Result<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name.lexeme)
                .ok_or_else(|| unresolved(name, distance)),
            None => self.globals.borrow().get(name),
        }
    }

    /// Arity and depth checks, then dispatch.
    fn invoke<C: Callable<'a>>(
        &mut self,
        callee: &C,
        paren: &Token<'_>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        if arguments.len() != callee.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callee.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_line = paren.line;
        self.call_depth += 1;

        let result = stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || {
            callee.call(self, arguments)
        });

        self.call_depth -= 1;

        result
    }

    fn evaluate_unary(&mut self, op: &Token<'_>, right: &'a Expr<'a>) -> Result<Value<'a>> {
        let right_val = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(op, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &'a Expr<'a>,
        op: &Token<'_>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        debug!("Binary '{}' on {:?} and {:?}", op.lexeme, left_val, right_val);

        match op.token_type {
            TokenType::COMMA => Ok(right_val),

            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    op,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                if b == 0.0 {
                    return Err(LoxError::runtime(op, "Division by zero."));
                }
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(op, "Invalid binary operator.")),
        }
    }
}

fn number_operands(op: &Token<'_>, left: &Value<'_>, right: &Value<'_>) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(op, "Operands must be numbers.")),
    }
}

fn unresolved(name: &Token<'_>, distance: usize) -> LoxError {
    LoxError::runtime(
        name,
        format!(
            "Internal error: '{}' not found {} frame(s) up.",
            name.lexeme, distance
        ),
    )
}

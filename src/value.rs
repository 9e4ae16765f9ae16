//! Runtime object model: dynamic values, closures, classes and instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;

/// Name of the method invoked on construction.
pub const INITIALIZER: &str = "init";

/// Shared, mutable handle to an instance.
pub type InstanceRef<'a> = Rc<RefCell<Instance<'a>>>;

/// Signature of a host-implemented builtin.
pub type NativeFn<'a> = fn(&[Value<'a>]) -> std::result::Result<Value<'a>, String>;

#[derive(Clone)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Native(Rc<NativeFunction<'a>>),
    Function(Rc<Function<'a>>),
    Class(Rc<Class<'a>>),
    Instance(InstanceRef<'a>),
}

impl<'a> Value<'a> {
    /// `nil` and `false` are falsy; everything else, including `0` and `""`, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    write!(f, "{}Infinity", if *n < 0.0 { "-" } else { "" })
                } else if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Native(_) => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}

// Instances and closures can reach themselves, so `Debug` stays shallow.
impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            other => write!(f, "{}", other),
        }
    }
}

/// Capability shared by everything a call expression can invoke.
pub trait Callable<'a> {
    fn arity(&self) -> usize;

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn<'a>,
}

impl<'a> NativeFunction<'a> {
    pub fn new(name: &'static str, arity: usize, func: NativeFn<'a>) -> Self {
        Self { name, arity, func }
    }
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|message| LoxError::Runtime {
            message,
            line: interpreter.current_line(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A closure: a declaration paired with the frame it was declared in.
pub struct Function<'a> {
    declaration: &'a FunctionDecl<'a>,
    closure: EnvRef<'a>,
    is_initializer: bool,
}

impl<'a> Function<'a> {
    pub fn new(declaration: &'a FunctionDecl<'a>, closure: EnvRef<'a>, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    /// A copy of this method whose closure gains a frame binding `this` to
    /// `instance`.  The receiver-less original is left untouched.
    pub fn bind(&self, instance: InstanceRef<'a>) -> Function<'a> {
        let environment = Environment::nested(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function {
            declaration: self.declaration,
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    fn receiver(&self) -> Result<Value<'a>> {
        Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
            LoxError::runtime(
                self.declaration.name,
                format!("Initializer '{}' called without a receiver.", self.name()),
            )
        })
    }
}

impl<'a> Callable<'a> for Function<'a> {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Calling user-defined function '{}'", self.name());

        let declaration: &'a FunctionDecl<'a> = self.declaration;
        let environment = Environment::nested(&self.closure);

        for (param, argument) in declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&declaration.body, environment)?;

        if self.is_initializer {
            return self.receiver();
        }

        match flow {
            Flow::Return(value) => Ok(value),
            // Loop exits never reach a call boundary; the resolver rejects them.
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Nil),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes and instances
// ─────────────────────────────────────────────────────────────────────────────

pub struct Class<'a> {
    pub name: String,
    superclass: Option<Rc<Class<'a>>>,
    methods: HashMap<String, Function<'a>>,
}

impl<'a> Class<'a> {
    pub fn new(
        name: &str,
        superclass: Option<Rc<Class<'a>>>,
        methods: HashMap<String, Function<'a>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            superclass,
            methods,
        }
    }

    pub fn superclass(&self) -> Option<&Rc<Class<'a>>> {
        self.superclass.as_ref()
    }

    /// Own methods first, then the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<&Function<'a>> {
        self.methods.get(name).or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name))
        })
    }
}

// Construction needs a shared handle to the class for the new instance.
impl<'a> Callable<'a> for Rc<Class<'a>> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Constructing instance of '{}'", self.name);

        let instance: InstanceRef<'a> = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct Instance<'a> {
    class: Rc<Class<'a>>,
    fields: HashMap<String, Value<'a>>,
}

impl<'a> Instance<'a> {
    pub fn new(class: Rc<Class<'a>>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Fields shadow methods; a method is returned bound to `instance`.
    pub fn get(instance: &InstanceRef<'a>, name: &Token<'_>) -> Result<Value<'a>> {
        let class = {
            let this = instance.borrow();

            if let Some(value) = this.fields.get(name.lexeme) {
                return Ok(value.clone());
            }

            Rc::clone(&this.class)
        };

        match class.find_method(name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance))))),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Creates the field if it does not exist yet.
    pub fn set(&mut self, name: &Token<'_>, value: Value<'a>) {
        self.fields.insert(name.lexeme.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_drop_the_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn non_finite_numbers() {
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn nil_and_booleans_stringify_literally() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }

    #[test]
    fn nil_equals_only_nil() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(0.0), Value::Nil);
        assert_ne!(Value::String("1".into()), Value::Number(1.0));
    }

    #[test]
    fn method_lookup_walks_superclass_chain() {
        let base = Rc::new(Class::new("Base", None, HashMap::new()));
        let derived = Class::new("Derived", Some(Rc::clone(&base)), HashMap::new());

        assert!(derived.find_method("missing").is_none());
        assert_eq!(derived.superclass().map(|c| c.name.as_str()), Some("Base"));
        assert_eq!(Rc::clone(&base).arity(), 0);
    }

    #[test]
    fn instance_fields_are_created_on_set() {
        let class = Rc::new(Class::new("Point", None, HashMap::new()));
        let instance: InstanceRef = Rc::new(RefCell::new(Instance::new(class)));
        let token = Token::new(crate::token::TokenType::IDENTIFIER, "x", 1);

        assert!(Instance::get(&instance, &token).is_err());

        instance.borrow_mut().set(&token, Value::Number(4.0));

        assert_eq!(Instance::get(&instance, &token).unwrap(), Value::Number(4.0));
        assert_eq!(Value::Instance(instance).to_string(), "Point instance");
    }
}

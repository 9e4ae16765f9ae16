//! Chained scope frames.
//!
//! A frame is shared through [`EnvRef`]: the block or call that created it
//! holds one handle, and every closure declared inside holds another, so a
//! captured frame outlives the block that opened it and a write through any
//! handle is seen by all of them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope frame.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    /// A root frame with no parent (the globals).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A fresh child frame of `enclosing`, already wrapped in a handle.
    pub fn nested(enclosing: &EnvRef<'a>) -> EnvRef<'a> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this frame, overwriting any existing binding here.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame, then each ancestor.
    pub fn get(&self, name: &Token<'_>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Overwrite the nearest existing binding of `name`.  Never declares.
    pub fn assign(&mut self, name: &Token<'_>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Walk exactly `distance` parent links up from `env`.
    pub fn ancestor(env: &EnvRef<'a>, distance: usize) -> Option<EnvRef<'a>> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let parent = frame.borrow().enclosing.clone()?;
            frame = parent;
        }

        Some(frame)
    }

    /// Read `name` from the frame `distance` links above `env`.  `None` means
    /// the resolver and the runtime frame layout disagree.
    pub fn get_at(env: &EnvRef<'a>, distance: usize, name: &str) -> Option<Value<'a>> {
        let frame = Self::ancestor(env, distance)?;
        let value = frame.borrow().values.get(name).cloned();

        debug!("get_at({}, '{}') -> {:?}", distance, name, value);

        value
    }

    /// Overwrite `name` in the frame `distance` links above `env`.  The
    /// binding must already exist there.
    pub fn assign_at(
        env: &EnvRef<'a>,
        distance: usize,
        name: &str,
        value: Value<'a>,
    ) -> Option<()> {
        let frame = Self::ancestor(env, distance)?;
        let mut frame = frame.borrow_mut();
        let slot = frame.values.get_mut(name)?;

        *slot = value;

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token<'_> {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn get_searches_enclosing_frames() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::nested(&globals);

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_does_not_declare() {
        let env: EnvRef = Rc::new(RefCell::new(Environment::new()));

        let err = env
            .borrow_mut()
            .assign(&ident("missing"), Value::Nil)
            .unwrap_err();

        assert!(err.to_string().contains("Undefined variable 'missing'."));
        assert!(env.borrow().get(&ident("missing")).is_err());
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::nested(&outer);

        inner
            .borrow_mut()
            .assign(&ident("x"), Value::Number(2.0))
            .unwrap();

        assert_eq!(outer.borrow().get(&ident("x")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn distance_access_skips_shadowing_frames() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::String("outer".into()));
        let middle = Environment::nested(&outer);
        let inner = Environment::nested(&middle);
        inner
            .borrow_mut()
            .define("x", Value::String("inner".into()));

        assert_eq!(
            Environment::get_at(&inner, 2, "x"),
            Some(Value::String("outer".into()))
        );
        assert_eq!(Environment::get_at(&inner, 1, "x"), None);

        Environment::assign_at(&inner, 2, "x", Value::Bool(true)).unwrap();
        assert_eq!(Environment::get_at(&outer, 0, "x"), Some(Value::Bool(true)));
        assert_eq!(
            Environment::get_at(&inner, 0, "x"),
            Some(Value::String("inner".into()))
        );
    }

    #[test]
    fn ancestor_past_root_is_none() {
        let root: EnvRef = Rc::new(RefCell::new(Environment::new()));

        assert!(Environment::ancestor(&root, 1).is_none());
        assert!(Environment::assign_at(&root, 3, "x", Value::Nil).is_none());
    }

    #[test]
    fn shared_frame_mutation_is_visible_through_every_handle() {
        let frame: EnvRef = Rc::new(RefCell::new(Environment::new()));
        frame.borrow_mut().define("count", Value::Number(0.0));
        let alias = Rc::clone(&frame);

        alias
            .borrow_mut()
            .assign(&ident("count"), Value::Number(5.0))
            .unwrap();

        assert_eq!(
            Environment::get_at(&frame, 0, "count"),
            Some(Value::Number(5.0))
        );
    }
}

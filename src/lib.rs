//! Rox: a tree-walking interpreter for a small dynamically-typed language
//! with closures and single-inheritance classes.
//!
//! Pipeline: [`scanner`] → [`parser`] → [`resolver`] → [`interpreter`].

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

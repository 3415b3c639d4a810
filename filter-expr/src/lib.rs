//! Filter-expression engine.
//!
//! Parses a caller-supplied filter string such as
//! `status.eq.active&(country.in.US,DE|price.gte.100)` into a
//! backend-agnostic [`Predicate`] tree. The pipeline is strictly linear
//! and stateless: raw string -> tokens -> AST -> predicate tree. No
//! component holds state across calls, so compilations may run freely in
//! parallel.
//!
//! ```
//! use filter_expr::{compile_filter, Predicate};
//!
//! let tree = compile_filter("status.eq.active&amount.gte.100").unwrap();
//! match tree {
//!     Predicate::And(children) => assert_eq!(children.len(), 2),
//!     other => panic!("expected a conjunction, got {:?}", other),
//! }
//! ```

mod ast;
mod compile;
mod error;
mod lexer;
mod parser;
mod token;

pub use ast::Ast;
pub use compile::{compile, Comparison, Predicate, PredicateOp};
pub use error::{CompileFault, FilterError, LexError, ParseError};
pub use lexer::tokenize;
pub use parser::parse;
pub use token::{FieldPath, SurfaceOp, Token, Value};

/// Input bounds enforced by [`compile_filter_with`]. The length limit is
/// checked before lexing; the depth limit guards parser recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_input_len: usize,
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_len: 1024,
            max_depth: 32,
        }
    }
}

/// Compiles a filter string with the default [`Limits`].
pub fn compile_filter(input: &str) -> Result<Predicate, FilterError> {
    compile_filter_with(input, &Limits::default())
}

/// Runs the full pipeline: length check, lexer, parser, semantic compiler.
///
/// All-or-nothing: on any error no partial predicate is produced.
pub fn compile_filter_with(input: &str, limits: &Limits) -> Result<Predicate, FilterError> {
    let length = input.chars().count();
    if length > limits.max_input_len {
        return Err(FilterError::TooLong {
            length,
            limit: limits.max_input_len,
        });
    }
    let tokens = lexer::tokenize(input)?;
    let ast = parser::parse(tokens, limits.max_depth)?;
    Ok(compile::compile(ast)?)
}

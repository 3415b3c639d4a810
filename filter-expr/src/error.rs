//! Error taxonomy of the engine.
//!
//! `LexError` and `ParseError` are client input faults; `CompileFault`
//! signals an internal inconsistency and is kept distinct so client-fault
//! monitoring is not polluted by engine bugs.

use thiserror::Error;

use crate::token::SurfaceOp;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated quoted string starting at position {position}")]
    UnterminatedString { position: usize },
    #[error("unexpected character `{found}` at position {position}")]
    UnexpectedCharacter { position: usize, found: char },
    #[error("empty list element at position {position}")]
    EmptyListElement { position: usize },
    #[error("unexpected end of input at position {position}")]
    UnexpectedEnd { position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedString { position }
            | LexError::UnexpectedCharacter { position, .. }
            | LexError::EmptyListElement { position }
            | LexError::UnexpectedEnd { position } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected} at position {position}, found {found}")]
    Unexpected {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("expected {expected}, found end of filter at position {position}")]
    UnexpectedEnd {
        position: usize,
        expected: &'static str,
    },
    #[error("unclosed group opened at position {position}, expected `)`")]
    UnclosedGroup { position: usize },
    #[error("operator `{op}` requires a comma-separated list of values (position {position})")]
    ListRequired { op: SurfaceOp, position: usize },
    #[error("operator `{op}` requires a single value, found a list (position {position})")]
    ScalarRequired { op: SurfaceOp, position: usize },
    #[error("operator `range` requires exactly two values, found {count} (position {position})")]
    RangeBounds { count: usize, position: usize },
    #[error("group nesting exceeds the maximum depth of {max} (position {position})")]
    TooDeep { position: usize, max: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Unexpected { position, .. }
            | ParseError::UnexpectedEnd { position, .. }
            | ParseError::UnclosedGroup { position }
            | ParseError::ListRequired { position, .. }
            | ParseError::ScalarRequired { position, .. }
            | ParseError::RangeBounds { position, .. }
            | ParseError::TooDeep { position, .. } => *position,
        }
    }
}

/// The compiler received an AST shape the parser should never produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileFault {
    #[error("degenerate {kind} node with {count} children")]
    DegenerateNode { kind: &'static str, count: usize },
}

/// Unified pipeline error returned by [`crate::compile_filter`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("filter is {length} characters long, the limit is {limit}")]
    TooLong { length: usize, limit: usize },
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Internal(#[from] CompileFault),
}

impl FilterError {
    /// True for faults in the caller's input; false for engine defects.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, FilterError::Internal(_))
    }

    pub fn stage(&self) -> &'static str {
        match self {
            FilterError::TooLong { .. } => "limit",
            FilterError::Lex(_) => "lex",
            FilterError::Parse(_) => "parse",
            FilterError::Internal(_) => "compile",
        }
    }

    /// Character offset of the fault in the original string, when known.
    pub fn position(&self) -> Option<usize> {
        match self {
            FilterError::TooLong { .. } | FilterError::Internal(_) => None,
            FilterError::Lex(err) => Some(err.position()),
            FilterError::Parse(err) => Some(err.position()),
        }
    }
}

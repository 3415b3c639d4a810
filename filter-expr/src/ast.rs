//! Abstract syntax tree produced by the parser.

use crate::token::{FieldPath, SurfaceOp, Value};

/// One node of the parsed filter expression.
///
/// `Or` and `And` children are ordered and have at least two elements by
/// parser construction; single-child runs collapse to the child.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Or(Vec<Ast>),
    And(Vec<Ast>),
    Comparison {
        field: FieldPath,
        op: SurfaceOp,
        value: Value,
    },
}

//! Semantic compilation: AST to predicate tree.
//!
//! A structural, order-preserving transform. Or/And nodes map one-to-one;
//! comparison leaves go through the operator table, which resolves each
//! surface operator to a canonical operation plus a negate flag. Negation
//! is resolved only at leaves, never by inverting a subtree.

use crate::ast::Ast;
use crate::error::CompileFault;
use crate::token::{FieldPath, SurfaceOp, Value};

/// The reduced, backend-agnostic operation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Equals,
    LessEqual,
    Less,
    GreaterEqual,
    Greater,
    Contains,
    StartsWith,
    EndsWith,
    In,
    IsNull,
}

/// A single compiled comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: FieldPath,
    pub op: PredicateOp,
    pub value: Value,
    /// The leaf's result must be logically inverted to reproduce the
    /// surface operator's meaning (`ne`, `not_in`).
    pub negate: bool,
}

/// The compiled boolean filter handed to the collection layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Or(Vec<Predicate>),
    And(Vec<Predicate>),
    Leaf(Comparison),
}

impl Predicate {
    /// Conjunction combinator; a single child collapses to itself.
    pub fn and(mut children: Vec<Predicate>) -> Predicate {
        if children.len() == 1 {
            children.swap_remove(0)
        } else {
            Predicate::And(children)
        }
    }

    /// Disjunction combinator; a single child collapses to itself.
    pub fn or(mut children: Vec<Predicate>) -> Predicate {
        if children.len() == 1 {
            children.swap_remove(0)
        } else {
            Predicate::Or(children)
        }
    }

    pub fn leaf(field: impl Into<FieldPath>, op: PredicateOp, value: Value) -> Predicate {
        Predicate::Leaf(Comparison {
            field: field.into(),
            op,
            value,
            negate: false,
        })
    }

    pub fn negated_leaf(field: impl Into<FieldPath>, op: PredicateOp, value: Value) -> Predicate {
        Predicate::Leaf(Comparison {
            field: field.into(),
            op,
            value,
            negate: true,
        })
    }
}

pub fn compile(ast: Ast) -> Result<Predicate, CompileFault> {
    match ast {
        Ast::Or(children) => {
            if children.len() < 2 {
                return Err(CompileFault::DegenerateNode {
                    kind: "or",
                    count: children.len(),
                });
            }
            let children = children.into_iter().map(compile).collect::<Result<_, _>>()?;
            Ok(Predicate::Or(children))
        }
        Ast::And(children) => {
            if children.len() < 2 {
                return Err(CompileFault::DegenerateNode {
                    kind: "and",
                    count: children.len(),
                });
            }
            let children = children.into_iter().map(compile).collect::<Result<_, _>>()?;
            Ok(Predicate::And(children))
        }
        Ast::Comparison { field, op, value } => {
            let (op, negate) = lower(op);
            Ok(Predicate::Leaf(Comparison {
                field,
                op,
                value,
                negate,
            }))
        }
    }
}

/// The operator table: surface operator to canonical operation and
/// negate flag. Total over the surface set.
fn lower(op: SurfaceOp) -> (PredicateOp, bool) {
    match op {
        SurfaceOp::Exact | SurfaceOp::Eq => (PredicateOp::Equals, false),
        SurfaceOp::Ne => (PredicateOp::Equals, true),
        SurfaceOp::Lte => (PredicateOp::LessEqual, false),
        SurfaceOp::Lt => (PredicateOp::Less, false),
        SurfaceOp::Gte => (PredicateOp::GreaterEqual, false),
        SurfaceOp::Gt => (PredicateOp::Greater, false),
        SurfaceOp::Contains => (PredicateOp::Contains, false),
        SurfaceOp::StartsWith => (PredicateOp::StartsWith, false),
        SurfaceOp::EndsWith => (PredicateOp::EndsWith, false),
        SurfaceOp::In | SurfaceOp::Range => (PredicateOp::In, false),
        SurfaceOp::NotIn => (PredicateOp::In, true),
        SurfaceOp::IsNull => (PredicateOp::IsNull, false),
    }
}

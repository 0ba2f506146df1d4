//! Query-expression algebra.
//!
//! A small closed set of immutable node kinds, the AND/OR/NOT combinators
//! that merge them, late binding of deferred values, and rendering into the
//! store's CAML query grammar.

mod bind;
mod combine;
mod negate;
mod node;
mod render;
mod visit;

#[cfg(test)]
mod tests;

use crate::binding::BindingError;
use derive_more::Display;
use thiserror::Error as ThisError;

pub use bind::bind;
pub use combine::{combine_and, combine_or};
pub use negate::negate;
pub use node::{
    BinaryComparison, BinaryOp, Collection, CollectionKind, CompositeQuery, FieldRef,
    FieldRefKind, LateBound, Logical, LogicalOp, Node, NodeKind, UnaryComparison, UnaryOp,
};
pub use render::{ViewDocument, render, render_view};
pub use visit::{Rewriter, rewrite};

pub(crate) use combine::join;

///
/// JoinOp
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum JoinOp {
    And,
    Or,
}

impl JoinOp {
    #[must_use]
    pub const fn logical(self) -> LogicalOp {
        match self {
            Self::And => LogicalOp::And,
            Self::Or => LogicalOp::Or,
        }
    }
}

///
/// AlgebraError
///
/// Construction and rendering failures. Invalid joins are always fatal.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AlgebraError {
    #[error("invalid join: {left} {op} {right} is not defined")]
    InvalidJoin {
        op: JoinOp,
        left: NodeKind,
        right: NodeKind,
    },

    #[error("{construct} has no negation in the store grammar")]
    NotNegatable { construct: String },

    #[error("{kind} must be bound before rendering")]
    Unresolved { kind: NodeKind },

    #[error(transparent)]
    Binding(#[from] BindingError),
}

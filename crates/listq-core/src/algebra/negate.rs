use crate::algebra::{
    AlgebraError, JoinOp, join,
    node::{BinaryComparison, LateBound, Logical, LogicalOp, Node, UnaryComparison},
};

///
/// Negate a node via De Morgan rewriting.
///
/// - NOT (a AND b) → NOT a OR NOT b
/// - NOT (a OR b)  → NOT a AND NOT b
/// - NOT (NOT a)   → a
/// - comparisons invert to their semantic opposite
///
/// Operators without an opposite in the store grammar fail.
///
pub fn negate(node: Node) -> Result<Node, AlgebraError> {
    match node {
        Node::Empty(value) => Ok(Node::Empty(!value)),

        Node::Logical(Logical { op, left, right }) => match (op, right) {
            (LogicalOp::Not, _) => Ok(*left),
            (LogicalOp::And, Some(right)) => join(JoinOp::Or, negate(*left)?, negate(*right)?),
            (LogicalOp::Or, Some(right)) => join(JoinOp::And, negate(*left)?, negate(*right)?),
            (LogicalOp::And | LogicalOp::Or, None) => negate(*left),
        },

        Node::Unary(UnaryComparison { op, field }) => Ok(Node::Unary(UnaryComparison {
            op: op.inverse(),
            field,
        })),

        Node::Binary(cmp) => match cmp.op.inverse() {
            Some(op) => Ok(Node::Binary(BinaryComparison { op, ..cmp })),
            None => Err(AlgebraError::NotNegatable {
                construct: format!("BinaryComparison({})", cmp.op),
            }),
        },

        Node::LateBound(late) => Ok(Node::LateBound(match late {
            LateBound::Flag { param, negated } => LateBound::Flag {
                param,
                negated: !negated,
            },
            LateBound::DefaultValue {
                field,
                value,
                negated,
            } => LateBound::DefaultValue {
                field,
                value,
                negated: !negated,
            },
        })),

        Node::Bound { node, bindings } => Ok(Node::bound(negate(*node)?, bindings)),

        other @ (Node::Field(_) | Node::Collection(_) | Node::Query(_)) => {
            Err(AlgebraError::NotNegatable {
                construct: other.kind().to_string(),
            })
        }
    }
}

impl Node {
    pub fn negate(self) -> Result<Self, AlgebraError> {
        negate(self)
    }
}

//! Rank-dispatched AND/OR combinators.
//!
//! The higher-ranked operand decides how the pair merges. Every handler
//! lists the lower kinds explicitly, so an unhandled pair is a compile
//! error rather than a silent fallthrough.

use crate::algebra::{
    AlgebraError, JoinOp,
    node::{Collection, CollectionKind, CompositeQuery, FieldRef, Logical, Node},
};
use crate::binding::Bindings;

/// AND two optional operands; a missing operand is the identity.
pub fn combine_and(left: Option<Node>, right: Option<Node>) -> Result<Option<Node>, AlgebraError> {
    combine_opt(JoinOp::And, left, right)
}

/// OR two optional operands; a missing operand is the identity.
pub fn combine_or(left: Option<Node>, right: Option<Node>) -> Result<Option<Node>, AlgebraError> {
    combine_opt(JoinOp::Or, left, right)
}

fn combine_opt(
    op: JoinOp,
    left: Option<Node>,
    right: Option<Node>,
) -> Result<Option<Node>, AlgebraError> {
    match (left, right) {
        (None, right) => Ok(right),
        (left, None) => Ok(left),
        (Some(left), Some(right)) => join(op, left, right).map(Some),
    }
}

impl Node {
    pub fn and(self, other: Self) -> Result<Self, AlgebraError> {
        join(JoinOp::And, self, other)
    }

    pub fn or(self, other: Self) -> Result<Self, AlgebraError> {
        join(JoinOp::Or, self, other)
    }
}

pub(crate) fn join(op: JoinOp, left: Node, right: Node) -> Result<Node, AlgebraError> {
    if right.kind().rank() > left.kind().rank() {
        dispatch(op, right, left, Side::Right)
    } else {
        dispatch(op, left, right, Side::Left)
    }
}

///
/// Side
/// Position of the higher-ranked operand in the original call.
///

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn order<T>(self, high: T, low: T) -> (T, T) {
        match self {
            Self::Left => (high, low),
            Self::Right => (low, high),
        }
    }
}

fn invalid(op: JoinOp, high: &Node, low: &Node, side: Side) -> AlgebraError {
    let (left, right) = side.order(high.kind(), low.kind());

    AlgebraError::InvalidJoin { op, left, right }
}

fn dispatch(op: JoinOp, high: Node, low: Node, side: Side) -> Result<Node, AlgebraError> {
    match high {
        Node::Bound { node, bindings } => join_bound(op, *node, bindings, low, side),
        Node::Empty(value) => Ok(join_empty(op, value, low)),
        Node::Query(query) => join_query(op, query, low, side),
        Node::Collection(collection) => join_collection(op, collection, low, side),
        filter @ (Node::Unary(_) | Node::Binary(_) | Node::LateBound(_) | Node::Logical(_)) => {
            join_filter(op, filter, low, side)
        }
        Node::Field(field) => join_field(op, field, low, side),
    }
}

// Bindings compose left-to-right; the right-hand map wins on collision.
fn join_bound(
    op: JoinOp,
    inner: Node,
    bindings: Bindings,
    low: Node,
    side: Side,
) -> Result<Node, AlgebraError> {
    let (low, merged) = match low {
        Node::Bound {
            node,
            bindings: low_bindings,
        } => {
            let (left, right) = side.order(&bindings, &low_bindings);
            (*node, left.merged(right))
        }
        other => (other, bindings),
    };

    let (left, right) = side.order(inner, low);
    let joined = join(op, left, right)?;

    Ok(wrap_bound(joined, merged))
}

fn wrap_bound(node: Node, bindings: Bindings) -> Node {
    match node {
        // constants need no values
        Node::Empty(_) => node,
        Node::Bound {
            node,
            bindings: inner,
        } => Node::bound(*node, bindings.merged(&inner)),
        other => Node::bound(other, bindings),
    }
}

fn join_empty(op: JoinOp, value: bool, low: Node) -> Node {
    match (op, value) {
        (JoinOp::And, false) => Node::FALSE,
        (JoinOp::Or, true) => Node::TRUE,
        (JoinOp::And, true) | (JoinOp::Or, false) => low,
    }
}

fn join_query(
    op: JoinOp,
    query: CompositeQuery,
    low: Node,
    side: Side,
) -> Result<Node, AlgebraError> {
    match low {
        Node::Query(other) => {
            if op == JoinOp::Or {
                return Err(invalid(op, &Node::Query(query), &Node::Query(other), side));
            }
            let (left, right) = side.order(query, other);

            Ok(Node::Query(merge_queries(left, right)?))
        }
        Node::Collection(collection) => {
            if op == JoinOp::Or || collection.kind == CollectionKind::Projection {
                return Err(invalid(
                    op,
                    &Node::Query(query),
                    &Node::Collection(collection),
                    side,
                ));
            }

            Ok(Node::Query(attach(query, collection, side)))
        }
        Node::Field(field) => match field.collection_kind() {
            Some(kind @ (CollectionKind::Order | CollectionKind::Group)) if op == JoinOp::And => {
                Ok(Node::Query(attach(
                    query,
                    Collection::of(kind, [field]),
                    side,
                )))
            }
            _ => Err(invalid(op, &Node::Query(query), &Node::Field(field), side)),
        },
        filter @ (Node::Unary(_) | Node::Binary(_) | Node::LateBound(_) | Node::Logical(_)) => {
            let CompositeQuery {
                filter: existing,
                order,
                group,
            } = query;
            let (left, right) = side.order(existing.map(|node| *node), Some(filter));
            let filter = combine_opt(op, left, right)?;

            Ok(Node::Query(CompositeQuery {
                filter: filter.map(Box::new),
                order,
                group,
            }))
        }
        other @ (Node::Empty(_) | Node::Bound { .. }) => {
            Err(invalid(op, &Node::Query(query), &other, side))
        }
    }
}

fn merge_queries(left: CompositeQuery, right: CompositeQuery) -> Result<CompositeQuery, AlgebraError> {
    let filter = combine_and(left.filter.map(|node| *node), right.filter.map(|node| *node))?;

    Ok(CompositeQuery {
        filter: filter.map(Box::new),
        order: merge_collections(left.order, right.order),
        group: merge_collections(left.group, right.group),
    })
}

fn merge_collections(left: Option<Collection>, right: Option<Collection>) -> Option<Collection> {
    match (left, right) {
        (None, right) => right,
        (left, None) => left,
        (Some(mut left), Some(right)) => {
            left.extend(right);
            Some(left)
        }
    }
}

// Caller guarantees an order or group collection.
fn attach(mut query: CompositeQuery, collection: Collection, side: Side) -> CompositeQuery {
    let slot = match collection.kind {
        CollectionKind::Group => &mut query.group,
        CollectionKind::Order | CollectionKind::Projection => &mut query.order,
    };
    let (left, right) = side.order(slot.take(), Some(collection));
    *slot = merge_collections(left, right);

    query
}

fn join_collection(
    op: JoinOp,
    collection: Collection,
    low: Node,
    side: Side,
) -> Result<Node, AlgebraError> {
    if op == JoinOp::Or {
        return Err(invalid(op, &Node::Collection(collection), &low, side));
    }

    match low {
        Node::Collection(other) if other.kind == collection.kind => {
            let (mut left, right) = side.order(collection, other);
            left.extend(right);

            Ok(Node::Collection(left))
        }
        Node::Collection(other) => pair(op, collection, other, side),
        Node::Field(field) => match field.collection_kind() {
            Some(kind) if kind == collection.kind => {
                let (mut left, right) = side.order(collection, Collection::of(kind, [field]));
                left.extend(right);

                Ok(Node::Collection(left))
            }
            Some(kind) => pair(op, collection, Collection::of(kind, [field]), side),
            None => Err(invalid(
                op,
                &Node::Collection(collection),
                &Node::Field(field),
                side,
            )),
        },
        filter @ (Node::Unary(_) | Node::Binary(_) | Node::LateBound(_) | Node::Logical(_)) => {
            if collection.kind == CollectionKind::Projection {
                return Err(invalid(op, &Node::Collection(collection), &filter, side));
            }
            let query = CompositeQuery {
                filter: Some(Box::new(filter)),
                ..CompositeQuery::default()
            };

            Ok(Node::Query(attach(query, collection, side)))
        }
        other @ (Node::Query(_) | Node::Empty(_) | Node::Bound { .. }) => {
            Err(invalid(op, &Node::Collection(collection), &other, side))
        }
    }
}

// Order and group clauses of different kinds promote into a composite query.
fn pair(op: JoinOp, high: Collection, low: Collection, side: Side) -> Result<Node, AlgebraError> {
    match (high.kind, low.kind) {
        (CollectionKind::Order, CollectionKind::Group) => Ok(Node::Query(CompositeQuery {
            filter: None,
            order: Some(high),
            group: Some(low),
        })),
        (CollectionKind::Group, CollectionKind::Order) => Ok(Node::Query(CompositeQuery {
            filter: None,
            order: Some(low),
            group: Some(high),
        })),
        _ => Err(invalid(
            op,
            &Node::Collection(high),
            &Node::Collection(low),
            side,
        )),
    }
}

fn join_filter(op: JoinOp, high: Node, low: Node, side: Side) -> Result<Node, AlgebraError> {
    match low {
        low @ (Node::Unary(_) | Node::Binary(_) | Node::LateBound(_) | Node::Logical(_)) => {
            let (left, right) = side.order(high, low);

            Ok(Node::Logical(Logical {
                op: op.logical(),
                left: Box::new(left),
                right: Some(Box::new(right)),
            }))
        }
        Node::Field(field) => match field.collection_kind() {
            Some(kind @ (CollectionKind::Order | CollectionKind::Group)) if op == JoinOp::And => {
                let query = CompositeQuery {
                    filter: Some(Box::new(high)),
                    ..CompositeQuery::default()
                };

                Ok(Node::Query(attach(query, Collection::of(kind, [field]), side)))
            }
            _ => Err(invalid(op, &high, &Node::Field(field), side)),
        },
        other @ (Node::Collection(_) | Node::Query(_) | Node::Empty(_) | Node::Bound { .. }) => {
            Err(invalid(op, &high, &other, side))
        }
    }
}

fn join_field(op: JoinOp, field: FieldRef, low: Node, side: Side) -> Result<Node, AlgebraError> {
    match low {
        Node::Field(other) if op == JoinOp::And => {
            match (field.collection_kind(), other.collection_kind()) {
                (Some(high_kind), Some(low_kind)) if high_kind == low_kind => {
                    let (left, right) = side.order(field, other);

                    Ok(Node::Collection(Collection::of(high_kind, [left, right])))
                }
                (Some(high_kind), Some(low_kind)) => pair(
                    op,
                    Collection::of(high_kind, [field]),
                    Collection::of(low_kind, [other]),
                    side,
                ),
                _ => Err(invalid(op, &Node::Field(field), &Node::Field(other), side)),
            }
        }
        other @ (Node::Field(_)
        | Node::Unary(_)
        | Node::Binary(_)
        | Node::LateBound(_)
        | Node::Logical(_)
        | Node::Collection(_)
        | Node::Query(_)
        | Node::Empty(_)
        | Node::Bound { .. }) => Err(invalid(op, &Node::Field(field), &other, side)),
    }
}

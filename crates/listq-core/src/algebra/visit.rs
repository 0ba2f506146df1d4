use crate::algebra::{
    AlgebraError, JoinOp, join,
    node::{Collection, CompositeQuery, Logical, LogicalOp, Node},
};

///
/// Rewriter
///
/// Structural visitor used by post-translation filters. Comparisons and
/// collections are offered to the rewriter; logical nodes are rebuilt
/// through the combinators so constants introduced by a rewrite fold away.
///

pub trait Rewriter {
    type Error: From<AlgebraError>;

    /// Return `false` to keep `node` and its subtree unchanged.
    fn enter(&mut self, _node: &Node) -> bool {
        true
    }

    fn comparison(&mut self, node: Node) -> Result<Node, Self::Error> {
        Ok(node)
    }

    /// Return `None` to drop the collection.
    fn collection(&mut self, collection: Collection) -> Result<Option<Collection>, Self::Error> {
        Ok(Some(collection))
    }
}

/// Apply `rewriter` bottom-up over `node`.
pub fn rewrite<R: Rewriter>(node: Node, rewriter: &mut R) -> Result<Node, R::Error> {
    if !rewriter.enter(&node) {
        return Ok(node);
    }

    match node {
        Node::Empty(_) | Node::Field(_) => Ok(node),
        Node::Unary(_) | Node::Binary(_) | Node::LateBound(_) => rewriter.comparison(node),

        Node::Logical(Logical { op, left, right }) => {
            let left = rewrite(*left, rewriter)?;
            let right = right.map(|right| rewrite(*right, rewriter)).transpose()?;

            match (op, right) {
                (LogicalOp::Not, _) => Ok(match left {
                    Node::Empty(value) => Node::Empty(!value),
                    other => Node::not(other),
                }),
                (LogicalOp::And, Some(right)) => Ok(join(JoinOp::And, left, right)?),
                (LogicalOp::Or, Some(right)) => Ok(join(JoinOp::Or, left, right)?),
                (LogicalOp::And | LogicalOp::Or, None) => Ok(left),
            }
        }

        Node::Collection(collection) => Ok(match rewrite_collection(collection, rewriter)? {
            Some(collection) => Node::Collection(collection),
            None => Node::TRUE,
        }),

        Node::Query(query) => {
            let filter = match query.filter.map(|filter| rewrite(*filter, rewriter)).transpose()? {
                Some(Node::Empty(false)) => return Ok(Node::FALSE),
                Some(Node::Empty(true)) | None => None,
                Some(filter) => Some(Box::new(filter)),
            };
            let order = match query.order {
                Some(order) => rewrite_collection(order, rewriter)?,
                None => None,
            };
            let group = match query.group {
                Some(group) => rewrite_collection(group, rewriter)?,
                None => None,
            };

            Ok(Node::Query(CompositeQuery {
                filter,
                order,
                group,
            }))
        }

        Node::Bound { node, bindings } => Ok(match rewrite(*node, rewriter)? {
            Node::Empty(value) => Node::Empty(value),
            other => Node::bound(other, bindings),
        }),
    }
}

fn rewrite_collection<R: Rewriter>(
    collection: Collection,
    rewriter: &mut R,
) -> Result<Option<Collection>, R::Error> {
    Ok(rewriter
        .collection(collection)?
        .filter(|collection| !collection.is_empty()))
}

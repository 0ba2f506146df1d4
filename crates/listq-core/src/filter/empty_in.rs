use crate::{
    algebra::{AlgebraError, BinaryOp, Node, Rewriter, rewrite},
    binding::{BindingError, Bindings},
    filter::{QueryContext, QueryFilter},
};

///
/// EmptyInFilter
/// Collapses `In` comparisons over an empty collection to `Empty(false)`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyInFilter;

impl EmptyInFilter {
    pub const NAME: &'static str = "empty_in";
}

impl QueryFilter for EmptyInFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn should_apply(&self, _context: &QueryContext) -> bool {
        true
    }

    fn rewrite(&self, context: &QueryContext, node: Node) -> Result<Node, AlgebraError> {
        rewrite(
            node,
            &mut EmptyIn {
                bindings: &context.bindings,
            },
        )
    }
}

struct EmptyIn<'a> {
    bindings: &'a Bindings,
}

impl Rewriter for EmptyIn<'_> {
    type Error = AlgebraError;

    fn comparison(&mut self, node: Node) -> Result<Node, Self::Error> {
        let Node::Binary(cmp) = &node else {
            return Ok(node);
        };
        if cmp.op != BinaryOp::In {
            return Ok(node);
        }

        // other binding failures surface when the query is bound
        match cmp.value.bind_collection(self.bindings) {
            Err(BindingError::EmptyCollection { .. }) => Ok(Node::FALSE),
            _ => Ok(node),
        }
    }
}

use crate::{
    CONTENT_TYPE_ID_COLUMN, ID_COLUMN,
    algebra::{AlgebraError, BinaryOp, Collection, LateBound, Node, Rewriter, UnaryOp, rewrite},
    filter::{QueryContext, QueryFilter},
};
use std::collections::BTreeSet;

///
/// AllowListFilter
///
/// Neutralizes clauses over columns the target list does not define. A
/// foreign column reads as empty on every item, so each comparison is
/// replaced by the constant it would evaluate to there; order, group and
/// projection entries are dropped. Built-in columns exist on every list and
/// are never neutralized.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct AllowListFilter;

impl AllowListFilter {
    pub const NAME: &'static str = "allow_list";
}

impl QueryFilter for AllowListFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn should_apply(&self, context: &QueryContext) -> bool {
        context.allowed_columns.is_some()
    }

    fn rewrite(&self, context: &QueryContext, node: Node) -> Result<Node, AlgebraError> {
        let Some(allowed) = &context.allowed_columns else {
            return Ok(node);
        };

        rewrite(node, &mut AllowList { allowed })
    }
}

struct AllowList<'a> {
    allowed: &'a BTreeSet<String>,
}

impl AllowList<'_> {
    fn allows(&self, column: &str) -> bool {
        column == CONTENT_TYPE_ID_COLUMN || column == ID_COLUMN || self.allowed.contains(column)
    }
}

impl Rewriter for AllowList<'_> {
    type Error = AlgebraError;

    fn comparison(&mut self, node: Node) -> Result<Node, Self::Error> {
        let absent = match &node {
            Node::Unary(cmp) if !self.allows(cmp.field.name.key()) => {
                Some(cmp.op == UnaryOp::IsNull)
            }
            Node::Binary(cmp) if !self.allows(cmp.field.name.key()) => {
                Some(matches!(cmp.op, BinaryOp::Neq | BinaryOp::NotIncludes))
            }
            // identity of the enclosing OR, or AND when negated
            Node::LateBound(LateBound::DefaultValue { field, negated, .. })
                if !self.allows(field.name.key()) =>
            {
                Some(*negated)
            }
            _ => None,
        };

        Ok(absent.map_or(node, Node::Empty))
    }

    fn collection(&mut self, mut collection: Collection) -> Result<Option<Collection>, Self::Error> {
        collection.retain(|field| self.allows(field.name.key()));

        Ok(Some(collection))
    }
}

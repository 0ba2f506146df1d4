use crate::{
    algebra::{
        AlgebraError, BinaryOp, FieldRef, Logical, LogicalOp, Node, Rewriter, UnaryOp, rewrite,
    },
    binding::{BindingError, Bindings},
    filter::{QueryContext, QueryFilter},
    value::{Value, ValueType},
};
use std::collections::BTreeMap;

///
/// DeletedTermFilter
///
/// Taxonomy columns keep references to terms that were deleted from the
/// term store. Such items are logically empty, so a null check on the
/// column is widened with an OR over the deleted ids, and a non-null check
/// is narrowed with an AND over their negations.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DeletedTermFilter;

impl DeletedTermFilter {
    pub const NAME: &'static str = "deleted_terms";
}

impl QueryFilter for DeletedTermFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn should_apply(&self, context: &QueryContext) -> bool {
        context.deleted_terms.values().any(|ids| !ids.is_empty())
    }

    fn rewrite(&self, context: &QueryContext, node: Node) -> Result<Node, AlgebraError> {
        rewrite(
            node,
            &mut DeletedTerms {
                deleted: &context.deleted_terms,
                bindings: &context.bindings,
            },
        )
    }
}

struct DeletedTerms<'a> {
    deleted: &'a BTreeMap<String, Vec<i64>>,
    bindings: &'a Bindings,
}

impl DeletedTerms<'_> {
    /// Null check a comparison amounts to, on a column with deleted terms.
    fn null_check<'n>(&self, node: &'n Node) -> Option<(UnaryOp, &'n FieldRef, ValueType, &[i64])> {
        let (op, field) = match node {
            Node::Unary(cmp) => (cmp.op, &cmp.field),
            // equality against a null argument binds to a null check
            Node::Binary(cmp) if matches!(cmp.op, BinaryOp::Eq | BinaryOp::Neq) => {
                match cmp.value.resolve(self.bindings) {
                    Err(BindingError::Null { .. }) => {
                        let op = if cmp.op == BinaryOp::Eq {
                            UnaryOp::IsNull
                        } else {
                            UnaryOp::IsNotNull
                        };
                        (op, &cmp.field)
                    }
                    _ => return None,
                }
            }
            _ => return None,
        };

        let value_type = field.value_type().filter(|value_type| value_type.is_taxonomy())?;
        let ids = self.deleted.get(field.name.key())?;
        if ids.is_empty() {
            return None;
        }

        Some((op, field, value_type, ids.as_slice()))
    }
}

impl Rewriter for DeletedTerms<'_> {
    type Error = AlgebraError;

    // expansions are left alone so the filter can run twice
    fn enter(&mut self, node: &Node) -> bool {
        !is_expansion(node)
    }

    fn comparison(&mut self, node: Node) -> Result<Node, Self::Error> {
        let Some((op, field, value_type, ids)) = self.null_check(&node) else {
            return Ok(node);
        };
        let (widen, id_op) = match op {
            UnaryOp::IsNull => (true, BinaryOp::Eq),
            UnaryOp::IsNotNull => (false, BinaryOp::Neq),
        };
        let reference = FieldRef::lookup_id(field.name.key(), value_type);

        let mut terms: Option<Node> = None;
        for id in ids {
            let clause = Node::binary(id_op, reference.clone(), Value::Int(*id));
            terms = Some(match terms {
                None => clause,
                Some(terms) => combine(widen, terms, clause)?,
            });
        }
        let check = Node::unary(op, field.clone());

        match terms {
            Some(terms) => combine(widen, check, terms),
            None => Ok(check),
        }
    }
}

fn combine(widen: bool, left: Node, right: Node) -> Result<Node, AlgebraError> {
    if widen { left.or(right) } else { left.and(right) }
}

// `IsNull(f) OR (f#id = ..)` or `IsNotNull(f) AND (f#id <> ..)`
fn is_expansion(node: &Node) -> bool {
    let Node::Logical(Logical {
        op,
        left,
        right: Some(right),
    }) = node
    else {
        return false;
    };
    let Node::Unary(check) = left.as_ref() else {
        return false;
    };
    let expected = match (op, check.op) {
        (LogicalOp::Or, UnaryOp::IsNull) => BinaryOp::Eq,
        (LogicalOp::And, UnaryOp::IsNotNull) => BinaryOp::Neq,
        _ => return false,
    };

    let mut first = right.as_ref();
    while let Node::Logical(Logical { left, .. }) = first {
        first = left.as_ref();
    }

    matches!(
        first,
        Node::Binary(cmp)
            if cmp.op == expected
                && cmp.field.is_lookup_id()
                && cmp.field.name.key() == check.field.name.key()
    )
}

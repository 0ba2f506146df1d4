use crate::{
    algebra::{
        AlgebraError, JoinOp, join, negate,
        node::{
            BinaryComparison, BinaryOp, Collection, CompositeQuery, FieldRef, LateBound, Logical,
            LogicalOp, Node, UnaryOp,
        },
    },
    binding::{BindingError, Bindings, FieldName, ValueBinding},
    value::{Value, ValueType},
};

///
/// Resolve every deferred value in `node` against `bindings`.
///
/// The result holds only literal operands and fixed field names, and no
/// late-bound or bound nodes. Null and empty-collection signals become
/// algebra decisions:
/// - `Eq` / `Neq` against null     → `IsNull` / `IsNotNull`
/// - any other comparison          → `Empty(false)`
/// - exclusion (`NotIncludes`)     → `Empty(true)`
///
/// Constants fold through the combinators, so an unsatisfiable branch
/// collapses as far up the tree as the algebra allows.
///
pub fn bind(node: &Node, bindings: &Bindings) -> Result<Node, AlgebraError> {
    match node {
        Node::Empty(value) => Ok(Node::Empty(*value)),
        Node::Field(field) => Ok(Node::Field(bind_field(field, bindings)?)),
        Node::Unary(cmp) => Ok(Node::unary(cmp.op, bind_field(&cmp.field, bindings)?)),
        Node::Binary(cmp) => bind_binary(cmp, bindings),
        Node::LateBound(late) => bind_late(late, bindings),

        Node::Logical(Logical { op, left, right }) => {
            let left = bind(left, bindings)?;
            match (op, right) {
                (LogicalOp::Not, _) => negate(left),
                (LogicalOp::And, Some(right)) => join(JoinOp::And, left, bind(right, bindings)?),
                (LogicalOp::Or, Some(right)) => join(JoinOp::Or, left, bind(right, bindings)?),
                (LogicalOp::And | LogicalOp::Or, None) => Ok(left),
            }
        }

        Node::Collection(collection) => Ok(Node::Collection(bind_collection(collection, bindings)?)),

        Node::Query(query) => {
            let filter = match query.filter() {
                Some(filter) => match bind(filter, bindings)? {
                    Node::Empty(false) => return Ok(Node::FALSE),
                    Node::Empty(true) => None,
                    bound => Some(Box::new(bound)),
                },
                None => None,
            };
            let order = query
                .order
                .as_ref()
                .map(|order| bind_collection(order, bindings))
                .transpose()?;
            let group = query
                .group
                .as_ref()
                .map(|group| bind_collection(group, bindings))
                .transpose()?;

            Ok(Node::Query(CompositeQuery {
                filter,
                order,
                group,
            }))
        }

        // render-time values override the node's own map
        Node::Bound {
            node,
            bindings: attached,
        } => bind(node, &attached.merged(bindings)),
    }
}

fn bind_field(field: &FieldRef, bindings: &Bindings) -> Result<FieldRef, AlgebraError> {
    let name = field.name.resolve(bindings)?;

    Ok(field.clone().with_name(FieldName::Fixed(name)))
}

fn bind_collection(collection: &Collection, bindings: &Bindings) -> Result<Collection, AlgebraError> {
    let fields = collection
        .fields()
        .iter()
        .map(|field| bind_field(field, bindings))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Collection::of(collection.kind, fields))
}

const fn accepts_collection(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::In) || op.is_member_style()
}

fn bind_binary(cmp: &BinaryComparison, bindings: &Bindings) -> Result<Node, AlgebraError> {
    let field = bind_field(&cmp.field, bindings)?;
    let resolved = cmp
        .value
        .resolve(bindings)
        .and_then(|value| without_nulls(value, cmp.value.name()));

    match resolved {
        Ok(Value::List(_)) if !accepts_collection(cmp.op) => Err(BindingError::NotScalar {
            name: cmp.value.name().to_string(),
        }
        .into()),
        Ok(value) => Ok(Node::Binary(BinaryComparison {
            op: cmp.op,
            field,
            value: ValueBinding::Literal(value),
            include_time: cmp.include_time,
        })),
        Err(BindingError::Null { .. }) => Ok(match cmp.op {
            BinaryOp::Eq => Node::unary(UnaryOp::IsNull, field),
            BinaryOp::Neq => Node::unary(UnaryOp::IsNotNull, field),
            op => Node::Empty(op.is_exclusion()),
        }),
        Err(BindingError::EmptyCollection { .. }) => Ok(Node::Empty(cmp.op.is_exclusion())),
        Err(err) => Err(err.into()),
    }
}

fn without_nulls(value: Value, name: &str) -> Result<Value, BindingError> {
    match value {
        Value::List(values) => {
            let values: Vec<Value> = values.into_iter().filter(|value| !value.is_null()).collect();
            if values.is_empty() {
                return Err(BindingError::EmptyCollection {
                    name: name.to_string(),
                });
            }

            Ok(Value::List(values))
        }
        scalar => Ok(scalar),
    }
}

fn bind_late(late: &LateBound, bindings: &Bindings) -> Result<Node, AlgebraError> {
    match late {
        LateBound::Flag { param, negated } => match bindings.value(param) {
            Ok(Value::Bool(value)) => Ok(Node::Empty(*value != *negated)),
            Ok(other) => Err(BindingError::TypeMismatch {
                name: param.clone(),
                expected: "bool",
                found: other.label(),
            }
            .into()),
            // null reads as false
            Err(BindingError::Null { .. }) => Ok(Node::Empty(*negated)),
            Err(err) => Err(err.into()),
        },

        LateBound::DefaultValue {
            field,
            value,
            negated,
        } => {
            let field = bind_field(field, bindings)?;
            let default = field.value_type().and_then(ValueType::default_value);

            match value.resolve(bindings) {
                Ok(bound) if default.as_ref().is_some_and(|default| bound.loosely_eq(default)) => {
                    let op = if *negated {
                        UnaryOp::IsNotNull
                    } else {
                        UnaryOp::IsNull
                    };

                    Ok(Node::unary(op, field))
                }
                // identity of the enclosing OR (or AND, when negated)
                Ok(_) | Err(BindingError::Null { .. } | BindingError::EmptyCollection { .. }) => {
                    Ok(Node::Empty(*negated))
                }
                Err(err) => Err(err.into()),
            }
        }
    }
}

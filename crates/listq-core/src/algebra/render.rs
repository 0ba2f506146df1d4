//! CAML rendering.
//!
//! Rendering binds the tree first and then writes it; it never mutates the
//! input and is a pure function of the tree, the bindings and the layout.

use crate::{
    ID_COLUMN,
    algebra::{
        AlgebraError, bind, negate,
        node::{
            BinaryComparison, BinaryOp, Collection, CollectionKind, CompositeQuery, FieldRef,
            FieldRefKind, Logical, LogicalOp, Node, NodeKind,
        },
    },
    binding::{BindingError, Bindings, FieldName, ValueBinding},
    value::{Value, ValueType},
};

const INDENT: &str = "  ";

///
/// ViewDocument
/// Inputs of a complete `<View>` document handed to the store.
///

#[derive(Clone, Copy, Debug)]
pub struct ViewDocument<'a> {
    pub query: &'a Node,
    pub projection: Option<&'a Collection>,
    pub row_limit: Option<u32>,
}

/// Render a node as CAML after binding it against `bindings`.
pub fn render(node: &Node, bindings: &Bindings, pretty: bool) -> Result<String, AlgebraError> {
    let bound = bind(node, bindings)?;
    let mut writer = CamlWriter::new(pretty);
    writer.node(&bound)?;

    Ok(writer.finish())
}

/// Render a complete `<View>` document.
pub fn render_view(
    view: &ViewDocument<'_>,
    bindings: &Bindings,
    pretty: bool,
) -> Result<String, AlgebraError> {
    let query = bind(view.query, bindings)?;
    let mut writer = CamlWriter::new(pretty);

    writer.open("View", &[]);
    writer.open("Query", &[]);
    match &query {
        Node::Query(query) => writer.query(query)?,
        Node::Empty(true) => {}
        filter if filter.is_filter() || filter.is_false() => {
            writer.open("Where", &[]);
            writer.node(filter)?;
            writer.close("Where");
        }
        other => writer.node(other)?,
    }
    writer.close("Query");

    if let Some(projection) = view.projection {
        writer.collection(projection)?;
    }
    if let Some(limit) = view.row_limit {
        writer.text("RowLimit", &[], &limit.to_string());
    }
    writer.close("View");

    Ok(writer.finish())
}

///
/// CamlWriter
///

struct CamlWriter {
    out: String,
    depth: usize,
    pretty: bool,
}

impl CamlWriter {
    const fn new(pretty: bool) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            pretty,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    fn line(&mut self) {
        if !self.pretty {
            return;
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.line();
        self.out.push('<');
        self.out.push_str(tag);
        for (name, value) in attrs {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            escape_into(&mut self.out, value);
            self.out.push('"');
        }
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.out.push('>');
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line();
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn leaf(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.out.push_str(" />");
    }

    fn text(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        self.start_tag(tag, attrs);
        self.out.push('>');
        escape_into(&mut self.out, text);
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    fn node(&mut self, node: &Node) -> Result<(), AlgebraError> {
        match node {
            Node::Empty(true) => Ok(()),
            Node::Empty(false) => {
                self.unsatisfiable();
                Ok(())
            }
            Node::Field(field) => self.field_ref(field),
            Node::Unary(cmp) => {
                self.open(cmp.op.tag(), &[]);
                self.field_ref(&cmp.field)?;
                self.close(cmp.op.tag());
                Ok(())
            }
            Node::Binary(cmp) => self.binary(cmp),
            Node::Logical(Logical { op, left, right }) => match (op, right) {
                (LogicalOp::Not, _) => self.node(&negate(left.as_ref().clone())?),
                (LogicalOp::And | LogicalOp::Or, Some(right)) => {
                    let tag = if *op == LogicalOp::And { "And" } else { "Or" };
                    self.open(tag, &[]);
                    self.node(left)?;
                    self.node(right)?;
                    self.close(tag);
                    Ok(())
                }
                (LogicalOp::And | LogicalOp::Or, None) => self.node(left),
            },
            Node::Collection(collection) => self.collection(collection),
            Node::Query(query) => self.query(query),
            Node::LateBound(_) | Node::Bound { .. } => {
                Err(AlgebraError::Unresolved { kind: node.kind() })
            }
        }
    }

    fn query(&mut self, query: &CompositeQuery) -> Result<(), AlgebraError> {
        if let Some(filter) = query.filter() {
            self.open("Where", &[]);
            self.node(filter)?;
            self.close("Where");
        }
        if let Some(order) = &query.order {
            self.collection(order)?;
        }
        if let Some(group) = &query.group {
            self.collection(group)?;
        }

        Ok(())
    }

    fn collection(&mut self, collection: &Collection) -> Result<(), AlgebraError> {
        if collection.is_empty() {
            return Ok(());
        }
        let (tag, attrs): (&str, &[(&str, &str)]) = match collection.kind {
            CollectionKind::Order => ("OrderBy", &[]),
            CollectionKind::Group => ("GroupBy", &[("Collapse", "TRUE")]),
            CollectionKind::Projection => ("ViewFields", &[]),
        };

        self.open(tag, attrs);
        for field in collection.fields() {
            self.field_ref(field)?;
        }
        self.close(tag);

        Ok(())
    }

    fn field_ref(&mut self, field: &FieldRef) -> Result<(), AlgebraError> {
        let FieldName::Fixed(name) = &field.name else {
            return Err(AlgebraError::Unresolved {
                kind: NodeKind::FieldReference,
            });
        };
        let name = name.as_str();

        match field.kind {
            FieldRefKind::Filter {
                lookup_id: true, ..
            } => self.leaf("FieldRef", &[("Name", name), ("LookupId", "TRUE")]),
            FieldRefKind::Order { descending } => {
                let ascending = if descending { "FALSE" } else { "TRUE" };
                self.leaf("FieldRef", &[("Name", name), ("Ascending", ascending)]);
            }
            FieldRefKind::Filter { .. } | FieldRefKind::Projection | FieldRefKind::Group => {
                self.leaf("FieldRef", &[("Name", name)]);
            }
        }

        Ok(())
    }

    fn binary(&mut self, cmp: &BinaryComparison) -> Result<(), AlgebraError> {
        let ValueBinding::Literal(value) = &cmp.value else {
            return Err(AlgebraError::Unresolved {
                kind: NodeKind::BinaryComparison,
            });
        };

        match (cmp.op, value) {
            (BinaryOp::In, _) => {
                let values = match value {
                    Value::List(values) => values.as_slice(),
                    scalar => std::slice::from_ref(scalar),
                };
                self.open("In", &[]);
                self.field_ref(&cmp.field)?;
                self.open("Values", &[]);
                for value in values {
                    self.value(cmp, value)?;
                }
                self.close("Values");
                self.close("In");
                Ok(())
            }
            (BinaryOp::Membership, _) => {
                let kind = scalar_text(&cmp.value, value)?;
                self.open("Membership", &[("Type", kind.as_str())]);
                self.field_ref(&cmp.field)?;
                self.close("Membership");
                Ok(())
            }
            (op, Value::List(values)) if op.is_member_style() => match values.as_slice() {
                [single] => self.single(cmp, single),
                values => match expand(cmp, values) {
                    Some(expanded) => self.node(&expanded),
                    None => self.node(&Node::Empty(op.is_exclusion())),
                },
            },
            (_, Value::List(_)) => Err(BindingError::NotScalar {
                name: cmp.value.name().to_string(),
            }
            .into()),
            (_, scalar) => self.single(cmp, scalar),
        }
    }

    fn single(&mut self, cmp: &BinaryComparison, value: &Value) -> Result<(), AlgebraError> {
        self.open(cmp.op.tag(), &[]);
        self.field_ref(&cmp.field)?;
        self.value(cmp, value)?;
        self.close(cmp.op.tag());

        Ok(())
    }

    fn value(&mut self, cmp: &BinaryComparison, value: &Value) -> Result<(), AlgebraError> {
        let text = scalar_text(&cmp.value, value)?;
        let value_type = wire_type(&cmp.field);

        if cmp.include_time && value_type == ValueType::DateTime {
            self.text(
                "Value",
                &[("Type", value_type.token()), ("IncludeTimeValue", "TRUE")],
                &text,
            );
        } else {
            self.text("Value", &[("Type", value_type.token())], &text);
        }

        Ok(())
    }

    // Canonical never-true clause: item ids start at 1.
    fn unsatisfiable(&mut self) {
        self.open("Eq", &[]);
        self.leaf("FieldRef", &[("Name", ID_COLUMN)]);
        self.text("Value", &[("Type", ValueType::Counter.token())], "0");
        self.close("Eq");
    }
}

///
/// Expand a multi-value member-style comparison into singular comparisons,
/// right-nested: OR for positive predicates, AND for exclusions.
///
fn expand(cmp: &BinaryComparison, values: &[Value]) -> Option<Node> {
    let op = if cmp.op.is_exclusion() {
        LogicalOp::And
    } else {
        LogicalOp::Or
    };

    values
        .iter()
        .rev()
        .map(|value| {
            Node::Binary(BinaryComparison {
                value: ValueBinding::Literal(value.clone()),
                ..cmp.clone()
            })
        })
        .reduce(|acc, next| {
            Node::Logical(Logical {
                op,
                left: Box::new(next),
                right: Some(Box::new(acc)),
            })
        })
}

fn scalar_text(binding: &ValueBinding, value: &Value) -> Result<String, AlgebraError> {
    value.to_wire_text().ok_or_else(|| {
        BindingError::NotScalar {
            name: binding.name().to_string(),
        }
        .into()
    })
}

fn wire_type(field: &FieldRef) -> ValueType {
    match field.kind {
        FieldRefKind::Filter {
            lookup_id: true, ..
        } => ValueType::Integer,
        FieldRefKind::Filter { value_type, .. } => value_type,
        FieldRefKind::Projection | FieldRefKind::Order { .. } | FieldRefKind::Group => {
            ValueType::Text
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
}

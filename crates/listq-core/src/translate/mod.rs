//! Lowering of builder expression trees into the algebra.
//!
//! The translator walks a query chain from its entity source outwards,
//! admitting each operator against the shape grammar, and visits every
//! lambda body with a scope stack that accumulates algebra fragments,
//! resolved members and deferred operands.

mod mode;
mod scope;
mod shape;


pub use mode::{ExecutionMode, Paging, RowWindow};
pub use scope::{FieldAccess, Scope, ScopeStack};
pub use shape::QueryShape;

use crate::{
    CONTENT_TYPE_ID_COLUMN,
    algebra::{
        AlgebraError, BinaryComparison, BinaryOp, Collection, CollectionKind, CompositeQuery,
        FieldRef, LateBound, Node, UnaryOp, combine_and, combine_or, negate,
    },
    binding::{Bindings, ValueBinding},
    expr::{
        BinaryOperator, EvalError, Expr, LOOKUP_ID_MEMBER, Lambda, Method, QueryExpr, TerminalOp,
        collect_leaves, compile_invariant,
    },
    model::{EntityModel, MetadataRegistry},
    value::{Value, ValueType},
};
use thiserror::Error as ThisError;

///
/// TranslateError
///
/// Non-recoverable translation failures, each naming the offending construct.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TranslateError {
    #[error("unsupported operation: {construct}")]
    Unsupported { construct: String },

    #[error("{op} cannot follow {after} in a query chain")]
    InvalidSequence { op: String, after: &'static str },

    #[error("member '{member}' is backed by several columns {columns:?} and cannot order or group results")]
    AmbiguousOrderField { member: String, columns: Vec<String> },

    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("entity '{entity}' has no member '{member}'")]
    UnknownMember { entity: String, member: String },

    #[error("member '{member}' has no queryable column")]
    NotQueryable { member: String },

    #[error("comparing member '{left}' with member '{right}' is not supported by the store")]
    FieldComparison { left: String, right: String },

    #[error(transparent)]
    Algebra(#[from] AlgebraError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl TranslateError {
    fn unsupported(construct: impl Into<String>) -> Self {
        Self::Unsupported {
            construct: construct.into(),
        }
    }
}

///
/// TranslatedQuery
///
/// Output of one translation: the composite query (or `Empty(false)` when
/// the query can never match), projection, execution mode and paging.
///

#[derive(Clone, Debug, PartialEq)]
pub struct TranslatedQuery {
    pub entity: String,
    pub query: Node,
    pub projection: Option<Collection>,
    pub mode: ExecutionMode,
    pub paging: Paging,
    /// Content type ids the result is narrowed to, if any.
    pub content_types: Option<Vec<String>>,
}

impl TranslatedQuery {
    #[must_use]
    pub fn filter(&self) -> Option<&Node> {
        match &self.query {
            Node::Query(query) => query.filter(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn order(&self) -> Option<&Collection> {
        match &self.query {
            Node::Query(CompositeQuery { order, .. }) => order.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn group(&self) -> Option<&Collection> {
        match &self.query {
            Node::Query(CompositeQuery { group, .. }) => group.as_ref(),
            _ => None,
        }
    }

    /// True when no item can ever match.
    #[must_use]
    pub const fn is_unsatisfiable(&self) -> bool {
        self.query.is_false()
    }
}

///
/// TranslateOptions
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TranslateOptions {
    /// OR equality with a "stored value is the type default" branch.
    pub default_value_branches: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            default_value_branches: true,
        }
    }
}

///
/// Translator
///
/// Stateless front end over a metadata registry. Each call to `translate`
/// owns its own scope stack, so one translator can serve many queries.
///

#[derive(Clone, Copy)]
pub struct Translator<'r> {
    registry: &'r dyn MetadataRegistry,
    options: TranslateOptions,
}

impl<'r> Translator<'r> {
    #[must_use]
    pub fn new(registry: &'r dyn MetadataRegistry) -> Self {
        Self {
            registry,
            options: TranslateOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: TranslateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn translate(&self, query: &QueryExpr) -> Result<TranslatedQuery, TranslateError> {
        let chain = query.chain();
        let Some(QueryExpr::Source { entity }) = chain.first() else {
            return Err(TranslateError::unsupported("query chain without an entity source"));
        };
        let model = self
            .registry
            .entity(entity)
            .ok_or_else(|| TranslateError::UnknownEntity {
                entity: entity.clone(),
            })?;

        let mut translation = Translation::new(self.registry, self.options, model);
        for step in chain.iter().skip(1) {
            translation.apply(step)?;
        }
        let translated = translation.finish()?;

        tracing::debug!(
            entity = %translated.entity,
            mode = %translated.mode,
            unsatisfiable = translated.is_unsatisfiable(),
            "query translated"
        );

        Ok(translated)
    }
}

///
/// Translation
/// State of one translation run.
///

struct Translation<'a> {
    registry: &'a dyn MetadataRegistry,
    options: TranslateOptions,
    entity: &'a EntityModel,
    scopes: ScopeStack,
    shape: QueryShape,
    filter: Option<Node>,
    order: Option<Collection>,
    group: Option<Collection>,
    projection: Option<Collection>,
    paging: Paging,
    mode: ExecutionMode,
    content_types: Option<Vec<String>>,
}

impl<'a> Translation<'a> {
    fn new(
        registry: &'a dyn MetadataRegistry,
        options: TranslateOptions,
        entity: &'a EntityModel,
    ) -> Self {
        Self {
            registry,
            options,
            entity,
            scopes: ScopeStack::new(),
            shape: QueryShape::NONE,
            filter: None,
            order: None,
            group: None,
            projection: None,
            paging: Paging::default(),
            mode: ExecutionMode::Select,
            content_types: None,
        }
    }

    // ------------------------------------------------------------------
    // Chain operators
    // ------------------------------------------------------------------

    fn apply(&mut self, step: &QueryExpr) -> Result<(), TranslateError> {
        let op = step.operator();

        match step {
            QueryExpr::Source { .. } => Err(TranslateError::unsupported("nested query source")),

            QueryExpr::Filter { predicate, .. } => {
                self.shape.admit(QueryShape::PREDICATE, &op)?;
                let node = self.lambda_predicate(predicate, &op)?;

                self.add_filter(node)
            }

            QueryExpr::OrderBy {
                key,
                descending,
                then_by,
                ..
            } => {
                self.shape.admit(QueryShape::PREDICATE, &op)?;
                self.order_by(key, *descending, *then_by, &op)
            }

            QueryExpr::GroupBy { key, .. } => {
                self.shape.admit(QueryShape::PREDICATE, &op)?;
                self.group_by(key, &op)
            }

            QueryExpr::Skip { count, .. } => {
                self.shape.admit(QueryShape::SKIP, &op)?;
                self.paging.skip = Some(self.count(count, &op)?);
                Ok(())
            }

            QueryExpr::Take { count, .. } => {
                self.shape.admit(QueryShape::TAKE, &op)?;
                self.paging.take = Some(self.count(count, &op)?);
                Ok(())
            }

            QueryExpr::Select { projection, .. } => {
                self.shape.admit(QueryShape::PROJECTION, &op)?;
                self.select(projection, &op)
            }

            QueryExpr::OfType { content_type, .. } => {
                self.narrow(content_type);
                Ok(())
            }

            QueryExpr::Distinct { .. } | QueryExpr::Reverse { .. } => {
                Err(TranslateError::unsupported(op))
            }

            QueryExpr::Terminal {
                op: terminal,
                predicate,
                index,
                ..
            } => {
                self.shape.admit(QueryShape::AGGREGATE, &op)?;
                self.terminal(*terminal, predicate.as_ref(), index.as_ref(), &op)
            }
        }
    }

    fn add_filter(&mut self, node: Node) -> Result<(), TranslateError> {
        self.filter = combine_and(self.filter.take(), Some(node))?;

        Ok(())
    }

    fn order_by(
        &mut self,
        key: &Lambda,
        descending: bool,
        then_by: bool,
        op: &str,
    ) -> Result<(), TranslateError> {
        if then_by && self.order.is_none() {
            return Err(TranslateError::unsupported(format!(
                "{op} without a preceding OrderBy"
            )));
        }
        let column = self.key_column(key, op)?;
        let field = FieldRef::order(column, descending);

        match (&mut self.order, then_by) {
            (Some(order), true) => {
                order.insert(field);
            }
            _ => {
                // a new primary key keeps earlier keys as tie-breakers
                let mut order = Collection::of(CollectionKind::Order, [field]);
                if let Some(previous) = self.order.take() {
                    order.extend(previous);
                }
                self.order = Some(order);
            }
        }

        Ok(())
    }

    fn group_by(&mut self, key: &Lambda, op: &str) -> Result<(), TranslateError> {
        let columns = match &key.body {
            Expr::Record(fields) => fields
                .iter()
                .map(|(_, expr)| self.single_column(expr, op))
                .collect::<Result<Vec<_>, _>>()?,
            expr => vec![self.single_column(expr, op)?],
        };
        let group = Collection::of(CollectionKind::Group, columns.into_iter().map(FieldRef::group));

        match &mut self.group {
            Some(existing) => existing.extend(group),
            None => self.group = Some(group),
        }

        Ok(())
    }

    fn select(&mut self, projection: &Lambda, op: &str) -> Result<(), TranslateError> {
        let members: Vec<&Expr> = match &projection.body {
            Expr::Param(0) => return Ok(()),
            Expr::Record(fields) => fields.iter().map(|(_, expr)| expr).collect(),
            expr => vec![expr],
        };

        let mut collection = Collection::new(CollectionKind::Projection);
        for member in members {
            let field = self.visit(member)?.field.ok_or_else(|| {
                TranslateError::unsupported(format!("{op} of a computed value"))
            })?;
            for column in &field.columns {
                collection.insert(FieldRef::projection(column.column.clone()));
            }
        }
        self.projection = Some(collection);

        Ok(())
    }

    fn count(&mut self, count: &Expr, op: &str) -> Result<ValueBinding, TranslateError> {
        self.visit(count)?
            .operand()
            .ok_or_else(|| TranslateError::unsupported(format!("{op} count read from the row")))
    }

    // Content type ids are hierarchical: a child id starts with its parent's.
    fn narrow(&mut self, content_type: &str) {
        let id = self
            .registry
            .entity(content_type)
            .and_then(|entity| entity.content_type_id.clone())
            .unwrap_or_else(|| content_type.to_string());

        let narrowed = match self.content_types.take() {
            None => vec![id],
            Some(current) => {
                let mut out: Vec<String> = Vec::new();
                for existing in current {
                    let kept = if id.starts_with(existing.as_str()) {
                        id.clone()
                    } else if existing.starts_with(id.as_str()) {
                        existing
                    } else {
                        continue;
                    };
                    if !out.contains(&kept) {
                        out.push(kept);
                    }
                }
                out
            }
        };

        self.content_types = Some(narrowed);
    }

    fn terminal(
        &mut self,
        terminal: TerminalOp,
        predicate: Option<&Lambda>,
        index: Option<&Expr>,
        op: &str,
    ) -> Result<(), TranslateError> {
        let mode = ExecutionMode::from_terminal(terminal)
            .ok_or_else(|| TranslateError::unsupported(op))?;

        if let Some(predicate) = predicate {
            let node = self.lambda_predicate(predicate, op)?;
            // All(p) holds when no row matches !p
            let node = if mode == ExecutionMode::All {
                negate(node)?
            } else {
                node
            };
            self.add_filter(node)?;
        }

        if mode.is_indexed() {
            let index = index
                .ok_or_else(|| TranslateError::unsupported(format!("{op} without an index")))?;
            self.paging.index = Some(self.count(index, op)?);
        }
        self.mode = mode;

        Ok(())
    }

    fn finish(self) -> Result<TranslatedQuery, TranslateError> {
        let mut filter = self.filter;

        if let Some(types) = &self.content_types {
            let narrowing = types
                .iter()
                .map(|id| {
                    Node::binary(
                        BinaryOp::BeginsWith,
                        FieldRef::filter(CONTENT_TYPE_ID_COLUMN, ValueType::ContentTypeId),
                        Value::Text(id.clone()),
                    )
                })
                .try_fold(None, |acc, node| combine_or(acc, Some(node)))?
                .unwrap_or(Node::FALSE);
            filter = combine_and(filter, Some(narrowing))?;
        }

        let parts = [
            filter,
            self.order.map(Node::Collection),
            self.group.map(Node::Collection),
        ];
        let query = match parts
            .into_iter()
            .try_fold(None, |acc, part| combine_and(acc, part))?
        {
            Some(node) => node.into_query(),
            None => Node::Query(CompositeQuery::default()),
        };

        Ok(TranslatedQuery {
            entity: self.entity.name.clone(),
            query,
            projection: self.projection,
            mode: self.mode,
            paging: self.paging,
            content_types: self.content_types,
        })
    }

    // ------------------------------------------------------------------
    // Lambda bodies
    // ------------------------------------------------------------------

    fn lambda_predicate(&mut self, lambda: &Lambda, op: &str) -> Result<Node, TranslateError> {
        if lambda.arity != 1 {
            return Err(TranslateError::unsupported(format!(
                "{op} overload with an element index"
            )));
        }

        self.predicate(&lambda.body)
    }

    fn predicate(&mut self, expr: &Expr) -> Result<Node, TranslateError> {
        let scope = self.visit(expr)?;

        self.scope_predicate(scope)
    }

    fn scope_predicate(&self, scope: Scope) -> Result<Node, TranslateError> {
        if let Some(node) = scope.expression {
            return Ok(node);
        }
        if let Some(field) = scope.field {
            if field.value_type != ValueType::Boolean {
                return Err(TranslateError::unsupported(format!(
                    "non-boolean member '{}' used as a predicate",
                    field.member
                )));
            }
            return self.field_comparison(&field, BinaryOp::Eq, &ValueBinding::Literal(Value::Bool(true)));
        }
        if let Some(param) = scope.parameter {
            // resolved to a constant once the argument is known
            return Ok(Node::LateBound(LateBound::flag(param)));
        }

        match scope.constant {
            Some(Value::Bool(value)) => Ok(Node::Empty(value)),
            _ => Err(TranslateError::unsupported("non-boolean predicate")),
        }
    }

    fn visit(&mut self, expr: &Expr) -> Result<Scope, TranslateError> {
        self.scopes.push();
        let result = self.visit_into(expr);
        let scope = self.scopes.pop();

        result.map(|()| scope)
    }

    fn visit_into(&mut self, expr: &Expr) -> Result<(), TranslateError> {
        let compound = !matches!(
            expr,
            Expr::Constant(_) | Expr::Variable(_) | Expr::Placeholder(_)
        );
        if compound && expr.is_invariant() && !expr.has_arguments() {
            let value = fold(expr)?;
            self.scopes.current().constant = Some(value);
            return Ok(());
        }

        match expr {
            Expr::Param(_) => Err(TranslateError::unsupported(
                "row or element index used as a value",
            )),
            Expr::Constant(value) => {
                self.scopes.current().constant = Some(value.clone());
                Ok(())
            }
            Expr::Variable(name) | Expr::Placeholder(name) => {
                self.scopes.current().parameter = Some(name.clone());
                Ok(())
            }
            Expr::Member { target, name } => {
                let field = self.member(target, name)?;
                self.scopes.current().field = Some(field);
                Ok(())
            }
            Expr::Not(inner) => {
                let node = negate(self.predicate(inner)?)?;
                self.scopes.current().expression = Some(node);
                Ok(())
            }
            Expr::Binary { op, left, right } => {
                let node = if op.is_logical() {
                    let left = self.predicate(left)?;
                    let right = self.predicate(right)?;
                    if *op == BinaryOperator::AndAlso {
                        left.and(right)?
                    } else {
                        left.or(right)?
                    }
                } else if op.is_comparison() {
                    self.compare(*op, left, right)?
                } else {
                    return Err(TranslateError::unsupported(format!(
                        "arithmetic operator {op} over row members"
                    )));
                };
                self.scopes.current().expression = Some(node);
                Ok(())
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let node = self.conditional(test, if_true, if_false)?;
                self.scopes.current().expression = Some(node);
                Ok(())
            }
            Expr::Call {
                method,
                target,
                args,
            } => {
                let node = self.call(*method, target, args)?;
                self.scopes.current().expression = Some(node);
                Ok(())
            }
            Expr::Record(_) => Err(TranslateError::unsupported("record outside a projection")),
        }
    }

    fn member(&mut self, target: &Expr, name: &str) -> Result<FieldAccess, TranslateError> {
        match target {
            Expr::Param(0) => self
                .entity
                .get_field(name)
                .map(FieldAccess::new)
                .ok_or_else(|| TranslateError::UnknownMember {
                    entity: self.entity.name.clone(),
                    member: name.to_string(),
                }),
            Expr::Member { .. } => match self.visit(target)?.field {
                Some(field)
                    if name == LOOKUP_ID_MEMBER
                        && field.value_type.is_reference()
                        && !field.lookup_id =>
                {
                    Ok(field.by_lookup_id())
                }
                Some(field) => Err(TranslateError::unsupported(format!(
                    "member '{name}' of '{}'",
                    field.member
                ))),
                None => Err(TranslateError::unsupported(format!(
                    "member '{name}' of a computed value"
                ))),
            },
            _ => Err(TranslateError::unsupported(format!(
                "member '{name}' of a non-row value"
            ))),
        }
    }

    fn compare(
        &mut self,
        op: BinaryOperator,
        left: &Expr,
        right: &Expr,
    ) -> Result<Node, TranslateError> {
        let mut left = self.visit(left)?;
        let mut right = self.visit(right)?;

        let (field, operand, op) = match (left.field.take(), right.field.take()) {
            (Some(field), None) => (field, right, op),
            (None, Some(field)) => (field, left, mirror_operator(op)),
            (Some(left), Some(right)) => {
                return Err(TranslateError::FieldComparison {
                    left: left.member,
                    right: right.member,
                });
            }
            (None, None) => {
                return Err(TranslateError::unsupported(format!(
                    "comparison {op} without a row member"
                )));
            }
        };
        let value = operand.operand().ok_or_else(|| {
            TranslateError::unsupported(format!("comparison {op} against a computed row value"))
        })?;
        let op = comparison_op(op)
            .ok_or_else(|| TranslateError::unsupported(format!("comparison operator {op}")))?;

        self.field_comparison(&field, op, &value)
    }

    fn call(&mut self, method: Method, target: &Expr, args: &[Expr]) -> Result<Node, TranslateError> {
        let arg = match (method, args) {
            (Method::IsNullOrEmpty, []) => {
                let field = self.target_field(target, method)?;
                return self.null_check(&field, UnaryOp::IsNull);
            }
            (Method::IsNullOrEmpty, _) => None,
            (_, [arg]) => Some(arg),
            _ => None,
        };
        let Some(arg) = arg else {
            return Err(TranslateError::unsupported(format!(
                "{method} with {} arguments",
                args.len()
            )));
        };

        match method {
            Method::Equals => self.compare(BinaryOperator::Eq, target, arg),

            Method::StartsWith => {
                let field = self.target_field(target, method)?;
                let value = self.argument(arg, method)?;
                self.field_comparison(&field, BinaryOp::BeginsWith, &value)
            }

            Method::IsMemberOf => {
                let field = self.target_field(target, method)?;
                let kind = self.argument(arg, method)?;
                self.field_comparison(&field, BinaryOp::Membership, &kind)
            }

            Method::Contains => {
                let mut target = self.visit(target)?;
                let mut item = self.visit(arg)?;

                match (target.field.take(), item.field.take()) {
                    // member contains a value
                    (Some(field), None) => {
                        let value = item.operand().ok_or_else(|| {
                            TranslateError::unsupported("Contains of a computed row value")
                        })?;
                        let op = if field.value_type.is_multi() {
                            BinaryOp::Includes
                        } else {
                            BinaryOp::Contains
                        };
                        self.field_comparison(&field, op, &value)
                    }
                    // value list contains the member
                    (None, Some(field)) => {
                        let values = target.operand().ok_or_else(|| {
                            TranslateError::unsupported("Contains over a computed row value")
                        })?;
                        let op = if field.value_type.is_multi() {
                            BinaryOp::Includes
                        } else {
                            BinaryOp::In
                        };
                        self.field_comparison(&field, op, &values)
                    }
                    (Some(left), Some(right)) => Err(TranslateError::FieldComparison {
                        left: left.member,
                        right: right.member,
                    }),
                    (None, None) => Err(TranslateError::unsupported(
                        "Contains without a row member",
                    )),
                }
            }

            Method::IsNullOrEmpty => Err(TranslateError::unsupported(method.to_string())),
        }
    }

    fn conditional(
        &mut self,
        test: &Expr,
        if_true: &Expr,
        if_false: &Expr,
    ) -> Result<Node, TranslateError> {
        let test = self.predicate(test)?;
        let negated = negate(test.clone())?;
        let when_true = self.branch(if_true)?;
        let when_false = self.branch(if_false)?;

        Ok(test.and(when_true)?.or(negated.and(when_false)?)?)
    }

    // Each branch starts from a clean accumulator in the current frame.
    fn branch(&mut self, expr: &Expr) -> Result<Node, TranslateError> {
        self.scopes.current().reset();
        self.visit_into(expr)?;
        let scope = self.scopes.take_current();

        self.scope_predicate(scope)
    }

    // ------------------------------------------------------------------
    // Field helpers
    // ------------------------------------------------------------------

    fn target_field(&mut self, target: &Expr, method: Method) -> Result<FieldAccess, TranslateError> {
        self.visit(target)?
            .field
            .ok_or_else(|| TranslateError::unsupported(format!("{method} on a non-member value")))
    }

    fn argument(&mut self, arg: &Expr, method: Method) -> Result<ValueBinding, TranslateError> {
        self.visit(arg)?
            .operand()
            .ok_or_else(|| TranslateError::unsupported(format!("{method} argument read from the row")))
    }

    fn key_column(&mut self, key: &Lambda, op: &str) -> Result<String, TranslateError> {
        if key.arity != 1 {
            return Err(TranslateError::unsupported(format!(
                "{op} overload with an element index"
            )));
        }

        self.single_column(&key.body, op)
    }

    // Ordering and grouping need exactly one column.
    fn single_column(&mut self, expr: &Expr, op: &str) -> Result<String, TranslateError> {
        let field = self
            .visit(expr)?
            .field
            .ok_or_else(|| TranslateError::unsupported(format!("{op} key must be a row member")))?;
        let columns: Vec<String> = field
            .queryable_columns()
            .map(|column| column.column.clone())
            .collect();

        match columns.as_slice() {
            [] => Err(TranslateError::NotQueryable {
                member: field.member,
            }),
            [column] => Ok(column.clone()),
            _ => Err(TranslateError::AmbiguousOrderField {
                member: field.member,
                columns,
            }),
        }
    }

    /// Comparison against every queryable column of `field`, OR-ed.
    fn field_comparison(
        &self,
        field: &FieldAccess,
        op: BinaryOp,
        value: &ValueBinding,
    ) -> Result<Node, TranslateError> {
        let mut out = None;

        for column in field.queryable_columns() {
            let cmp = BinaryComparison::new(op, field.filter_ref(column), value.clone())
                .including_time(column.value_type == ValueType::DateTime && !column.date_only);
            let mut node = Node::Binary(cmp);

            // the store keeps type defaults as empty columns
            if self.options.default_value_branches
                && matches!(op, BinaryOp::Eq | BinaryOp::Neq)
                && field.stores_default_as_empty()
                && column.value_type.default_value().is_some()
            {
                let branch = Node::LateBound(LateBound::DefaultValue {
                    field: field.filter_ref(column),
                    value: value.clone(),
                    negated: op == BinaryOp::Neq,
                });
                node = if op == BinaryOp::Eq {
                    node.or(branch)?
                } else {
                    node.and(branch)?
                };
            }

            out = combine_or(out, Some(node))?;
        }

        out.ok_or_else(|| TranslateError::NotQueryable {
            member: field.member.clone(),
        })
    }

    fn null_check(&self, field: &FieldAccess, op: UnaryOp) -> Result<Node, TranslateError> {
        let mut out = None;
        for column in field.queryable_columns() {
            out = combine_or(out, Some(Node::unary(op, field.filter_ref(column))))?;
        }

        out.ok_or_else(|| TranslateError::NotQueryable {
            member: field.member.clone(),
        })
    }
}

// Constant-only sub-expressions fold at translation time.
fn fold(expr: &Expr) -> Result<Value, TranslateError> {
    let evaluator = compile_invariant(expr)?;
    let mut constants = Vec::new();
    collect_leaves(expr, &mut constants);

    Ok(evaluator.evaluate(&constants, &Bindings::new())?)
}

const fn mirror_operator(op: BinaryOperator) -> BinaryOperator {
    match op {
        BinaryOperator::Lt => BinaryOperator::Gt,
        BinaryOperator::Gt => BinaryOperator::Lt,
        BinaryOperator::Le => BinaryOperator::Ge,
        BinaryOperator::Ge => BinaryOperator::Le,
        other => other,
    }
}

const fn comparison_op(op: BinaryOperator) -> Option<BinaryOp> {
    match op {
        BinaryOperator::Eq => Some(BinaryOp::Eq),
        BinaryOperator::Ne => Some(BinaryOp::Neq),
        BinaryOperator::Lt => Some(BinaryOp::Lt),
        BinaryOperator::Le => Some(BinaryOp::Leq),
        BinaryOperator::Gt => Some(BinaryOp::Gt),
        BinaryOperator::Ge => Some(BinaryOp::Geq),
        _ => None,
    }
}

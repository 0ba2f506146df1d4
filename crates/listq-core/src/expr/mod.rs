//! Embedded query-builder expression tree.
//!
//! Callers describe a query as a chain of operators over an entity, each
//! carrying lambdas over the row. Nothing is resolved here; the translator
//! lowers the tree into the algebra and the compile layer erases its
//! invariant parts into placeholders.

mod eval;


use crate::value::Value;
use derive_more::Display;
use std::ops::{Add, Mul, Not, Sub};

pub use eval::{EvalError, Evaluator, collect_leaves, compile_invariant};

///
/// BinaryOperator
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum BinaryOperator {
    Add,
    AndAlso,
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
    Mul,
    Ne,
    OrElse,
    Sub,
}

impl BinaryOperator {
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::AndAlso | Self::OrElse)
    }
}

///
/// Method
/// Host methods the translator understands.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Method {
    Contains,
    Equals,
    IsMemberOf,
    IsNullOrEmpty,
    StartsWith,
}

///
/// Expr
///
/// Scalar expression inside a lambda. `Param(0)` is the row, `Param(1)` the
/// element index of indexed overloads.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Param(u8),
    Member {
        target: Box<Self>,
        name: String,
    },
    Constant(Value),
    /// Caller-supplied argument, resolved from the call-site bindings.
    Variable(String),
    /// Extracted invariant, resolved from the prepared bindings.
    Placeholder(String),
    Not(Box<Self>),
    Binary {
        op: BinaryOperator,
        left: Box<Self>,
        right: Box<Self>,
    },
    Conditional {
        test: Box<Self>,
        if_true: Box<Self>,
        if_false: Box<Self>,
    },
    Call {
        method: Method,
        target: Box<Self>,
        args: Vec<Self>,
    },
    Record(Vec<(String, Self)>),
}

impl Expr {
    /// True when the expression never reads a lambda parameter.
    #[must_use]
    pub fn is_invariant(&self) -> bool {
        match self {
            Self::Param(_) => false,
            Self::Constant(_) | Self::Variable(_) | Self::Placeholder(_) => true,
            Self::Member { target, .. } | Self::Not(target) => target.is_invariant(),
            Self::Binary { left, right, .. } => left.is_invariant() && right.is_invariant(),
            Self::Conditional {
                test,
                if_true,
                if_false,
            } => test.is_invariant() && if_true.is_invariant() && if_false.is_invariant(),
            Self::Call { target, args, .. } => {
                target.is_invariant() && args.iter().all(Self::is_invariant)
            }
            Self::Record(fields) => fields.iter().all(|(_, expr)| expr.is_invariant()),
        }
    }

    /// True when the expression reads a caller argument or placeholder.
    #[must_use]
    pub fn has_arguments(&self) -> bool {
        match self {
            Self::Variable(_) | Self::Placeholder(_) => true,
            Self::Param(_) | Self::Constant(_) => false,
            Self::Member { target, .. } | Self::Not(target) => target.has_arguments(),
            Self::Binary { left, right, .. } => left.has_arguments() || right.has_arguments(),
            Self::Conditional {
                test,
                if_true,
                if_false,
            } => test.has_arguments() || if_true.has_arguments() || if_false.has_arguments(),
            Self::Call { target, args, .. } => {
                target.has_arguments() || args.iter().any(Self::has_arguments)
            }
            Self::Record(fields) => fields.iter().any(|(_, expr)| expr.has_arguments()),
        }
    }

    #[must_use]
    pub fn member(self, name: impl Into<String>) -> Self {
        Self::Member {
            target: Box::new(self),
            name: name.into(),
        }
    }

    /// Lookup id of a reference member.
    #[must_use]
    pub fn id(self) -> Self {
        self.member(LOOKUP_ID_MEMBER)
    }

    fn binary(self, op: BinaryOperator, other: impl Into<Self>) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    fn call(self, method: Method, args: Vec<Self>) -> Self {
        Self::Call {
            method,
            target: Box::new(self),
            args,
        }
    }

    // ------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------

    #[must_use]
    pub fn eq(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::Eq, other)
    }

    #[must_use]
    pub fn ne(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::Ne, other)
    }

    #[must_use]
    pub fn lt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::Lt, other)
    }

    #[must_use]
    pub fn le(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::Le, other)
    }

    #[must_use]
    pub fn gt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::Gt, other)
    }

    #[must_use]
    pub fn ge(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::Ge, other)
    }

    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::AndAlso, other)
    }

    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOperator::OrElse, other)
    }

    // ------------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------------

    #[must_use]
    pub fn starts_with(self, prefix: impl Into<Self>) -> Self {
        self.call(Method::StartsWith, vec![prefix.into()])
    }

    /// Substring test on text, element test on collections.
    #[must_use]
    pub fn contains(self, item: impl Into<Self>) -> Self {
        self.call(Method::Contains, vec![item.into()])
    }

    #[must_use]
    pub fn equals(self, other: impl Into<Self>) -> Self {
        self.call(Method::Equals, vec![other.into()])
    }

    #[must_use]
    pub fn is_null_or_empty(self) -> Self {
        self.call(Method::IsNullOrEmpty, Vec::new())
    }

    /// Membership of a user column in a store-defined group kind.
    #[must_use]
    pub fn is_member_of(self, kind: impl Into<String>) -> Self {
        self.call(Method::IsMemberOf, vec![Self::Constant(Value::Text(kind.into()))])
    }
}

/// Member name that selects the lookup id of a reference member.
pub const LOOKUP_ID_MEMBER: &str = "Id";

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl Add for Expr {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.binary(BinaryOperator::Add, other)
    }
}

impl Sub for Expr {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.binary(BinaryOperator::Sub, other)
    }
}

impl Mul for Expr {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        self.binary(BinaryOperator::Mul, other)
    }
}

macro_rules! expr_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::Constant(value.into())
                }
            }
        )*
    };
}

expr_from_value!(Value, bool, i32, i64, u32, f64, &str, String);

// ----------------------------------------------------------------------
// DSL
// ----------------------------------------------------------------------

/// The row parameter.
#[must_use]
pub const fn row() -> Expr {
    Expr::Param(0)
}

/// The element index of indexed overloads.
#[must_use]
pub const fn index() -> Expr {
    Expr::Param(1)
}

/// Member of the row.
#[must_use]
pub fn field(name: impl Into<String>) -> Expr {
    row().member(name)
}

#[must_use]
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Constant(value.into())
}

/// Named caller argument.
#[must_use]
pub fn arg(name: impl Into<String>) -> Expr {
    Expr::Variable(name.into())
}

#[must_use]
pub fn when(test: Expr, if_true: Expr, if_false: Expr) -> Expr {
    Expr::Conditional {
        test: Box::new(test),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
    }
}

/// Projection onto several named members.
#[must_use]
pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Expr)>) -> Expr {
    Expr::Record(
        fields
            .into_iter()
            .map(|(name, expr)| (name.into(), expr))
            .collect(),
    )
}

///
/// Lambda
///

#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    /// 1 for row lambdas, 2 for indexed overloads.
    pub arity: u8,
    pub body: Expr,
}

impl Lambda {
    #[must_use]
    pub const fn row(body: Expr) -> Self {
        Self { arity: 1, body }
    }

    #[must_use]
    pub const fn indexed(body: Expr) -> Self {
        Self { arity: 2, body }
    }
}

///
/// TerminalOp
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum TerminalOp {
    All,
    Any,
    Count,
    ElementAt,
    ElementAtOrDefault,
    First,
    FirstOrDefault,
    Last,
    Single,
    SingleOrDefault,
}

///
/// QueryExpr
///
/// One operator of a query chain; `source` points back towards the entity.
///

#[derive(Clone, Debug, PartialEq)]
pub enum QueryExpr {
    Source {
        entity: String,
    },
    Filter {
        source: Box<Self>,
        predicate: Lambda,
    },
    OrderBy {
        source: Box<Self>,
        key: Lambda,
        descending: bool,
        then_by: bool,
    },
    GroupBy {
        source: Box<Self>,
        key: Lambda,
    },
    Skip {
        source: Box<Self>,
        count: Expr,
    },
    Take {
        source: Box<Self>,
        count: Expr,
    },
    Select {
        source: Box<Self>,
        projection: Lambda,
    },
    OfType {
        source: Box<Self>,
        content_type: String,
    },
    Distinct {
        source: Box<Self>,
    },
    Reverse {
        source: Box<Self>,
    },
    Terminal {
        source: Box<Self>,
        op: TerminalOp,
        predicate: Option<Lambda>,
        index: Option<Expr>,
    },
}

impl QueryExpr {
    #[must_use]
    pub fn source(&self) -> Option<&Self> {
        match self {
            Self::Source { .. } => None,
            Self::Filter { source, .. }
            | Self::OrderBy { source, .. }
            | Self::GroupBy { source, .. }
            | Self::Skip { source, .. }
            | Self::Take { source, .. }
            | Self::Select { source, .. }
            | Self::OfType { source, .. }
            | Self::Distinct { source }
            | Self::Reverse { source }
            | Self::Terminal { source, .. } => Some(source),
        }
    }

    /// Operators from the entity source to the outermost call.
    #[must_use]
    pub fn chain(&self) -> Vec<&Self> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(source) = current.source() {
            chain.push(source);
            current = source;
        }
        chain.reverse();

        chain
    }

    /// Name of the operator, for diagnostics.
    #[must_use]
    pub fn operator(&self) -> String {
        match self {
            Self::Source { .. } => "Source".to_string(),
            Self::Filter { .. } => "Where".to_string(),
            Self::OrderBy {
                descending,
                then_by,
                ..
            } => match (*then_by, *descending) {
                (false, false) => "OrderBy",
                (false, true) => "OrderByDescending",
                (true, false) => "ThenBy",
                (true, true) => "ThenByDescending",
            }
            .to_string(),
            Self::GroupBy { .. } => "GroupBy".to_string(),
            Self::Skip { .. } => "Skip".to_string(),
            Self::Take { .. } => "Take".to_string(),
            Self::Select { .. } => "Select".to_string(),
            Self::OfType { .. } => "OfType".to_string(),
            Self::Distinct { .. } => "Distinct".to_string(),
            Self::Reverse { .. } => "Reverse".to_string(),
            Self::Terminal { op, .. } => op.to_string(),
        }
    }
}

///
/// Query
///
/// Fluent builder over `QueryExpr`. Terminals consume the builder and
/// return the finished tree.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    expr: QueryExpr,
}

impl Query {
    /// Start a query over the named entity.
    #[must_use]
    pub fn over(entity: impl Into<String>) -> Self {
        Self {
            expr: QueryExpr::Source {
                entity: entity.into(),
            },
        }
    }

    fn then(self, wrap: impl FnOnce(Box<QueryExpr>) -> QueryExpr) -> Self {
        Self {
            expr: wrap(Box::new(self.expr)),
        }
    }

    fn terminal(self, op: TerminalOp, predicate: Option<Expr>, index: Option<Expr>) -> QueryExpr {
        QueryExpr::Terminal {
            source: Box::new(self.expr),
            op,
            predicate: predicate.map(Lambda::row),
            index,
        }
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    #[must_use]
    pub fn filter(self, predicate: Expr) -> Self {
        self.then(|source| QueryExpr::Filter {
            source,
            predicate: Lambda::row(predicate),
        })
    }

    /// Filter overload that also receives the element index.
    #[must_use]
    pub fn filter_indexed(self, predicate: Expr) -> Self {
        self.then(|source| QueryExpr::Filter {
            source,
            predicate: Lambda::indexed(predicate),
        })
    }

    fn order(self, key: Expr, descending: bool, then_by: bool) -> Self {
        self.then(|source| QueryExpr::OrderBy {
            source,
            key: Lambda::row(key),
            descending,
            then_by,
        })
    }

    #[must_use]
    pub fn order_by(self, key: Expr) -> Self {
        self.order(key, false, false)
    }

    #[must_use]
    pub fn order_by_desc(self, key: Expr) -> Self {
        self.order(key, true, false)
    }

    #[must_use]
    pub fn then_by(self, key: Expr) -> Self {
        self.order(key, false, true)
    }

    #[must_use]
    pub fn then_by_desc(self, key: Expr) -> Self {
        self.order(key, true, true)
    }

    #[must_use]
    pub fn group_by(self, key: Expr) -> Self {
        self.then(|source| QueryExpr::GroupBy {
            source,
            key: Lambda::row(key),
        })
    }

    #[must_use]
    pub fn skip(self, count: impl Into<Expr>) -> Self {
        let count = count.into();
        self.then(|source| QueryExpr::Skip { source, count })
    }

    #[must_use]
    pub fn take(self, count: impl Into<Expr>) -> Self {
        let count = count.into();
        self.then(|source| QueryExpr::Take { source, count })
    }

    #[must_use]
    pub fn select(self, projection: Expr) -> Self {
        self.then(|source| QueryExpr::Select {
            source,
            projection: Lambda::row(projection),
        })
    }

    /// Narrow the result to items of one content type.
    #[must_use]
    pub fn of_type(self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.then(|source| QueryExpr::OfType {
            source,
            content_type,
        })
    }

    #[must_use]
    pub fn distinct(self) -> Self {
        self.then(|source| QueryExpr::Distinct { source })
    }

    #[must_use]
    pub fn reverse(self) -> Self {
        self.then(|source| QueryExpr::Reverse { source })
    }

    // ------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------

    #[must_use]
    pub fn first(self, predicate: impl Into<Option<Expr>>) -> QueryExpr {
        self.terminal(TerminalOp::First, predicate.into(), None)
    }

    #[must_use]
    pub fn first_or_default(self, predicate: impl Into<Option<Expr>>) -> QueryExpr {
        self.terminal(TerminalOp::FirstOrDefault, predicate.into(), None)
    }

    #[must_use]
    pub fn single(self, predicate: impl Into<Option<Expr>>) -> QueryExpr {
        self.terminal(TerminalOp::Single, predicate.into(), None)
    }

    #[must_use]
    pub fn single_or_default(self, predicate: impl Into<Option<Expr>>) -> QueryExpr {
        self.terminal(TerminalOp::SingleOrDefault, predicate.into(), None)
    }

    #[must_use]
    pub fn last(self, predicate: impl Into<Option<Expr>>) -> QueryExpr {
        self.terminal(TerminalOp::Last, predicate.into(), None)
    }

    #[must_use]
    pub fn any(self, predicate: impl Into<Option<Expr>>) -> QueryExpr {
        self.terminal(TerminalOp::Any, predicate.into(), None)
    }

    #[must_use]
    pub fn all(self, predicate: Expr) -> QueryExpr {
        self.terminal(TerminalOp::All, Some(predicate), None)
    }

    #[must_use]
    pub fn count(self, predicate: impl Into<Option<Expr>>) -> QueryExpr {
        self.terminal(TerminalOp::Count, predicate.into(), None)
    }

    #[must_use]
    pub fn element_at(self, index: impl Into<Expr>) -> QueryExpr {
        self.terminal(TerminalOp::ElementAt, None, Some(index.into()))
    }

    #[must_use]
    pub fn element_at_or_default(self, index: impl Into<Expr>) -> QueryExpr {
        self.terminal(TerminalOp::ElementAtOrDefault, None, Some(index.into()))
    }

    /// Finish as a plain list query.
    #[must_use]
    pub fn build(self) -> QueryExpr {
        self.expr
    }
}

impl From<Query> for QueryExpr {
    fn from(query: Query) -> Self {
        query.build()
    }
}

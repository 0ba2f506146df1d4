use crate::{
    binding::{Bindings, FieldName, ValueBinding},
    value::ValueType,
};
use derive_more::Display;

///
/// NodeKind
///
/// Discriminant of `Node`. Kinds form a total rank order; the combinators
/// dispatch to the higher-ranked operand.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum NodeKind {
    Empty,
    FieldReference,
    UnaryComparison,
    BinaryComparison,
    LateBound,
    Logical,
    Collection,
    CompositeQuery,
    Bound,
}

impl NodeKind {
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::FieldReference => 1,
            Self::UnaryComparison | Self::BinaryComparison | Self::LateBound => 2,
            Self::Logical => 3,
            Self::Collection => 4,
            Self::CompositeQuery => 5,
            Self::Empty => 6,
            Self::Bound => 7,
        }
    }
}

///
/// FieldRefKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldRefKind {
    Projection,
    Filter {
        value_type: ValueType,
        lookup_id: bool,
    },
    Order {
        descending: bool,
    },
    Group,
}

///
/// CollectionKind
/// Field-reference subkinds that can be gathered into a collection.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum CollectionKind {
    Projection,
    Order,
    Group,
}

///
/// FieldRef
///
/// Reference to one store column. Equality compares the field name only,
/// so collections deduplicate across subkinds and directions.
///

#[derive(Clone, Debug)]
pub struct FieldRef {
    pub kind: FieldRefKind,
    pub name: FieldName,
}

impl FieldRef {
    #[must_use]
    pub fn projection(name: impl Into<String>) -> Self {
        Self {
            kind: FieldRefKind::Projection,
            name: FieldName::fixed(name),
        }
    }

    #[must_use]
    pub fn filter(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            kind: FieldRefKind::Filter {
                value_type,
                lookup_id: false,
            },
            name: FieldName::fixed(name),
        }
    }

    /// Filter reference comparing a reference column by lookup id.
    #[must_use]
    pub fn lookup_id(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            kind: FieldRefKind::Filter {
                value_type,
                lookup_id: true,
            },
            name: FieldName::fixed(name),
        }
    }

    #[must_use]
    pub fn order(name: impl Into<String>, descending: bool) -> Self {
        Self {
            kind: FieldRefKind::Order { descending },
            name: FieldName::fixed(name),
        }
    }

    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: FieldRefKind::Group,
            name: FieldName::fixed(name),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: FieldName) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub const fn collection_kind(&self) -> Option<CollectionKind> {
        match self.kind {
            FieldRefKind::Projection => Some(CollectionKind::Projection),
            FieldRefKind::Order { .. } => Some(CollectionKind::Order),
            FieldRefKind::Group => Some(CollectionKind::Group),
            FieldRefKind::Filter { .. } => None,
        }
    }

    /// Declared value type; only filter references carry one.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        match self.kind {
            FieldRefKind::Filter { value_type, .. } => Some(value_type),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_lookup_id(&self) -> bool {
        matches!(
            self.kind,
            FieldRefKind::Filter {
                lookup_id: true,
                ..
            }
        )
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.name.key() == other.name.key()
    }
}

impl Eq for FieldRef {}

///
/// UnaryOp
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum UnaryOp {
    IsNull,
    IsNotNull,
}

impl UnaryOp {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
        }
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::IsNull => Self::IsNotNull,
            Self::IsNotNull => Self::IsNull,
        }
    }
}

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum BinaryOp {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    BeginsWith,
    Contains,
    In,
    Includes,
    NotIncludes,
    Membership,
}

impl BinaryOp {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Eq => "Eq",
            Self::Neq => "Neq",
            Self::Lt => "Lt",
            Self::Leq => "Leq",
            Self::Gt => "Gt",
            Self::Geq => "Geq",
            Self::BeginsWith => "BeginsWith",
            Self::Contains => "Contains",
            Self::In => "In",
            Self::Includes => "Includes",
            Self::NotIncludes => "NotIncludes",
            Self::Membership => "Membership",
        }
    }

    /// Semantic opposite, when the store grammar has one.
    #[must_use]
    pub const fn inverse(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Neq),
            Self::Neq => Some(Self::Eq),
            Self::Lt => Some(Self::Geq),
            Self::Geq => Some(Self::Lt),
            Self::Gt => Some(Self::Leq),
            Self::Leq => Some(Self::Gt),
            Self::Includes => Some(Self::NotIncludes),
            Self::NotIncludes => Some(Self::Includes),
            Self::BeginsWith | Self::Contains | Self::In | Self::Membership => None,
        }
    }

    /// Operator with operands swapped (`a < b` ⇔ `b > a`).
    #[must_use]
    pub const fn mirror(self) -> Option<Self> {
        match self {
            Self::Eq | Self::Neq => Some(self),
            Self::Lt => Some(Self::Gt),
            Self::Gt => Some(Self::Lt),
            Self::Leq => Some(Self::Geq),
            Self::Geq => Some(Self::Leq),
            _ => None,
        }
    }

    /// Predicates with no native multi-value form in the store grammar.
    #[must_use]
    pub const fn is_member_style(self) -> bool {
        matches!(
            self,
            Self::BeginsWith | Self::Contains | Self::Includes | Self::NotIncludes
        )
    }

    /// Operators that hold for every item when their operand is absent.
    #[must_use]
    pub const fn is_exclusion(self) -> bool {
        matches!(self, Self::NotIncludes)
    }
}

///
/// UnaryComparison
///

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryComparison {
    pub op: UnaryOp,
    pub field: FieldRef,
}

///
/// BinaryComparison
///

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryComparison {
    pub op: BinaryOp,
    pub field: FieldRef,
    pub value: ValueBinding,
    /// Compare date-times including the time component.
    pub include_time: bool,
}

impl BinaryComparison {
    #[must_use]
    pub fn new(op: BinaryOp, field: FieldRef, value: impl Into<ValueBinding>) -> Self {
        Self {
            op,
            field,
            value: value.into(),
            include_time: false,
        }
    }

    #[must_use]
    pub const fn including_time(mut self, include_time: bool) -> Self {
        self.include_time = include_time;
        self
    }
}

///
/// LateBound
///
/// Comparison whose outcome depends on a value only known at bind time.
///

#[derive(Clone, Debug, PartialEq)]
pub enum LateBound {
    /// Boolean parameter; resolves to `Empty(true|false)`.
    Flag { param: String, negated: bool },

    /// "Bound value equals the type default" branch; resolves to a null
    /// check on `field` when it does and to the algebraic identity otherwise.
    DefaultValue {
        field: FieldRef,
        value: ValueBinding,
        negated: bool,
    },
}

impl LateBound {
    #[must_use]
    pub fn flag(param: impl Into<String>) -> Self {
        Self::Flag {
            param: param.into(),
            negated: false,
        }
    }
}

///
/// LogicalOp
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

///
/// Logical
///

#[derive(Clone, Debug, PartialEq)]
pub struct Logical {
    pub op: LogicalOp,
    pub left: Box<Node>,
    /// Absent for `Not`.
    pub right: Option<Box<Node>>,
}

///
/// Collection
///
/// Field references of one subkind. Duplicates collapse by field name and
/// insertion order is kept for stable rendering; equality ignores order.
///

#[derive(Clone, Debug)]
pub struct Collection {
    pub kind: CollectionKind,
    fields: Vec<FieldRef>,
}

impl Collection {
    #[must_use]
    pub const fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn of(kind: CollectionKind, fields: impl IntoIterator<Item = FieldRef>) -> Self {
        let mut out = Self::new(kind);
        for field in fields {
            out.insert(field);
        }
        out
    }

    /// Insert unless a field with the same name is present. Returns whether
    /// the field was added.
    pub fn insert(&mut self, field: FieldRef) -> bool {
        if self.fields.contains(&field) {
            return false;
        }
        self.fields.push(field);
        true
    }

    pub fn extend(&mut self, other: Self) {
        for field in other.fields {
            self.insert(field);
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn retain(&mut self, keep: impl FnMut(&FieldRef) -> bool) {
        self.fields.retain(keep);
    }

    #[must_use]
    pub fn into_fields(self) -> Vec<FieldRef> {
        self.fields
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.fields.len() == other.fields.len()
            && self.fields.iter().all(|field| other.fields.contains(field))
    }
}

///
/// CompositeQuery
/// One complete query: filter, ordering and grouping.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeQuery {
    pub filter: Option<Box<Node>>,
    pub order: Option<Collection>,
    pub group: Option<Collection>,
}

impl CompositeQuery {
    #[must_use]
    pub fn filter(&self) -> Option<&Node> {
        self.filter.as_deref()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.filter.is_none() && self.order.is_none() && self.group.is_none()
    }
}

///
/// Node
///
/// Immutable query-expression node. Combination always produces new nodes.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Absorbing constant: `Empty(false)` under AND, `Empty(true)` under OR.
    Empty(bool),
    Field(FieldRef),
    Unary(UnaryComparison),
    Binary(BinaryComparison),
    LateBound(LateBound),
    Logical(Logical),
    Collection(Collection),
    Query(CompositeQuery),
    Bound { node: Box<Self>, bindings: Bindings },
}

impl Node {
    pub const TRUE: Self = Self::Empty(true);
    pub const FALSE: Self = Self::Empty(false);

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Empty(_) => NodeKind::Empty,
            Self::Field(_) => NodeKind::FieldReference,
            Self::Unary(_) => NodeKind::UnaryComparison,
            Self::Binary(_) => NodeKind::BinaryComparison,
            Self::LateBound(_) => NodeKind::LateBound,
            Self::Logical(_) => NodeKind::Logical,
            Self::Collection(_) => NodeKind::Collection,
            Self::Query(_) => NodeKind::CompositeQuery,
            Self::Bound { .. } => NodeKind::Bound,
        }
    }

    /// Comparison-kind nodes and logical combinations of them.
    #[must_use]
    pub const fn is_filter(&self) -> bool {
        matches!(
            self,
            Self::Unary(_) | Self::Binary(_) | Self::LateBound(_) | Self::Logical(_)
        )
    }

    #[must_use]
    pub const fn is_false(&self) -> bool {
        matches!(self, Self::Empty(false))
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Empty(true))
    }

    #[must_use]
    pub fn binary(op: BinaryOp, field: FieldRef, value: impl Into<ValueBinding>) -> Self {
        Self::Binary(BinaryComparison::new(op, field, value))
    }

    #[must_use]
    pub const fn unary(op: UnaryOp, field: FieldRef) -> Self {
        Self::Unary(UnaryComparison { op, field })
    }

    /// Structural `Not`; renders as the negation of its operand.
    #[must_use]
    pub fn not(node: Self) -> Self {
        Self::Logical(Logical {
            op: LogicalOp::Not,
            left: Box::new(node),
            right: None,
        })
    }

    #[must_use]
    pub fn bound(node: Self, bindings: Bindings) -> Self {
        Self::Bound {
            node: Box::new(node),
            bindings,
        }
    }

    /// Wrap a filter, collection or field reference into a composite query.
    #[must_use]
    pub fn into_query(self) -> Self {
        match self {
            Self::Query(_) | Self::Empty(false) => self,
            Self::Empty(true) => Self::Query(CompositeQuery::default()),
            Self::Field(field) => match field.collection_kind() {
                Some(kind) => Self::Collection(Collection::of(kind, [field])).into_query(),
                None => Self::Field(field),
            },
            Self::Collection(collection) => match collection.kind {
                CollectionKind::Order => Self::Query(CompositeQuery {
                    order: Some(collection),
                    ..CompositeQuery::default()
                }),
                CollectionKind::Group => Self::Query(CompositeQuery {
                    group: Some(collection),
                    ..CompositeQuery::default()
                }),
                CollectionKind::Projection => Self::Collection(collection),
            },
            Self::Bound { node, bindings } => Self::bound(node.into_query(), bindings),
            filter => Self::Query(CompositeQuery {
                filter: Some(Box::new(filter)),
                ..CompositeQuery::default()
            }),
        }
    }
}

use crate::{
    algebra::{FieldRef, Node},
    binding::ValueBinding,
    model::{ColumnModel, FieldModel},
    value::{Value, ValueType},
};

///
/// FieldAccess
///
/// Host member reached by a sub-expression, with the columns backing it.
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldAccess {
    pub member: String,
    pub value_type: ValueType,
    pub nullable: bool,
    pub columns: Vec<ColumnModel>,
    /// Compare the reference by lookup id instead of its display value.
    pub lookup_id: bool,
}

impl FieldAccess {
    #[must_use]
    pub fn new(model: &FieldModel) -> Self {
        Self {
            member: model.member.clone(),
            value_type: model.value_type,
            nullable: model.nullable,
            columns: model.columns.clone(),
            lookup_id: false,
        }
    }

    #[must_use]
    pub fn by_lookup_id(mut self) -> Self {
        self.lookup_id = true;
        self
    }

    pub fn queryable_columns(&self) -> impl Iterator<Item = &ColumnModel> {
        self.columns.iter().filter(|column| column.queryable)
    }

    #[must_use]
    pub fn filter_ref(&self, column: &ColumnModel) -> FieldRef {
        if self.lookup_id {
            FieldRef::lookup_id(column.column.clone(), column.value_type)
        } else {
            FieldRef::filter(column.column.clone(), column.value_type)
        }
    }

    /// Whether equality against the type default must also match empty columns.
    #[must_use]
    pub const fn stores_default_as_empty(&self) -> bool {
        !self.lookup_id && (!self.nullable || self.value_type.is_text())
    }
}

///
/// Scope
///
/// In-progress accumulator for one sub-expression of the tree being
/// translated. A visited sub-expression leaves exactly one of these set.
///

#[derive(Clone, Debug, Default)]
pub struct Scope {
    /// Filter fragment produced by a boolean sub-expression.
    pub expression: Option<Node>,
    /// Direct member access.
    pub field: Option<FieldAccess>,
    /// Caller argument or extracted invariant resolved at bind time.
    pub parameter: Option<String>,
    pub constant: Option<Value>,
}

impl Scope {
    /// Clear the accumulator for branch-local reuse.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.expression.is_none()
            && self.field.is_none()
            && self.parameter.is_none()
            && self.constant.is_none()
    }

    /// Value operand denoted by this scope, if it is not row-dependent.
    #[must_use]
    pub fn operand(&self) -> Option<ValueBinding> {
        match (&self.parameter, &self.constant) {
            (Some(name), _) => Some(ValueBinding::param(name.clone())),
            (None, Some(value)) => Some(ValueBinding::Literal(value.clone())),
            (None, None) => None,
        }
    }
}

///
/// ScopeStack
///
/// One frame per sub-expression currently being visited. The stack is local
/// to a single translation and never shared.
///

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self) {
        self.frames.push(Scope::default());
    }

    pub fn pop(&mut self) -> Scope {
        self.frames.pop().unwrap_or_default()
    }

    /// Innermost frame; an empty stack gets a root frame.
    pub fn current(&mut self) -> &mut Scope {
        if self.frames.is_empty() {
            self.push();
        }
        let last = self.frames.len() - 1;

        &mut self.frames[last]
    }

    /// Move the innermost frame's contents out, leaving it reset.
    pub fn take_current(&mut self) -> Scope {
        std::mem::take(self.current())
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.frames.len()
    }
}

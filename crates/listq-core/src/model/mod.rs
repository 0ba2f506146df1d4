//! Metadata registry boundary.
//!
//! Maps host members to store columns. The translator only reads it.


use crate::value::ValueType;
use std::collections::BTreeMap;

///
/// ColumnModel
/// One physical store column backing a host member.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnModel {
    /// Declared field name.
    pub field: String,
    /// Internal column name used on the wire.
    pub column: String,
    pub value_type: ValueType,
    pub queryable: bool,
    /// Date-only columns compare without the time component.
    pub date_only: bool,
}

impl ColumnModel {
    #[must_use]
    pub fn new(column: impl Into<String>, value_type: ValueType) -> Self {
        let column = column.into();

        Self {
            field: column.clone(),
            column,
            value_type,
            queryable: true,
            date_only: false,
        }
    }

    #[must_use]
    pub fn declared_as(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    #[must_use]
    pub const fn not_queryable(mut self) -> Self {
        self.queryable = false;
        self
    }

    #[must_use]
    pub const fn date_only(mut self) -> Self {
        self.date_only = true;
        self
    }
}

///
/// FieldModel
///
/// Host member and its column associations. A member exposed through
/// several columns (one per content-type variant) has more than one entry.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldModel {
    pub member: String,
    pub value_type: ValueType,
    /// Host type admits null (reference or optional value type).
    pub nullable: bool,
    pub columns: Vec<ColumnModel>,
}

impl FieldModel {
    /// Member backed by a single column of the same name.
    #[must_use]
    pub fn new(member: impl Into<String>, value_type: ValueType) -> Self {
        let member = member.into();
        let column = ColumnModel::new(member.clone(), value_type);

        Self {
            member,
            value_type,
            nullable: false,
            columns: vec![column],
        }
    }

    /// Member with explicit column associations.
    #[must_use]
    pub fn mapped(member: impl Into<String>, value_type: ValueType, columns: Vec<ColumnModel>) -> Self {
        Self {
            member: member.into(),
            value_type,
            nullable: false,
            columns,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Replace the single column's internal name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        for entry in &mut self.columns {
            entry.column.clone_from(&column);
        }
        self
    }

    #[must_use]
    pub fn not_queryable(mut self) -> Self {
        for entry in &mut self.columns {
            entry.queryable = false;
        }
        self
    }

    #[must_use]
    pub fn date_only(mut self) -> Self {
        for entry in &mut self.columns {
            entry.date_only = true;
        }
        self
    }

    #[must_use]
    pub const fn is_multi_column(&self) -> bool {
        self.columns.len() > 1
    }

    /// Whether equality against the type default must also match empty columns.
    #[must_use]
    pub const fn stores_default_as_empty(&self) -> bool {
        !self.nullable || self.value_type.is_text()
    }
}

///
/// EntityModel
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EntityModel {
    pub name: String,
    /// Content type id that narrows queries to this entity, if any.
    pub content_type_id: Option<String>,
    pub fields: Vec<FieldModel>,
}

impl EntityModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type_id: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn content_type(mut self, id: impl Into<String>) -> Self {
        self.content_type_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn get_field(&self, member: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.member == member)
    }
}

///
/// MetadataRegistry
///
/// Read-only lookup consumed by the translator.
///

pub trait MetadataRegistry: Send + Sync {
    fn entity(&self, name: &str) -> Option<&EntityModel>;

    fn member(&self, entity: &str, member: &str) -> Option<&FieldModel> {
        self.entity(entity)?.get_field(member)
    }
}

///
/// ModelRegistry
/// In-memory registry keyed by entity name.
///

#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    entities: BTreeMap<String, EntityModel>,
}

impl ModelRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, entity: EntityModel) -> Self {
        self.register(entity);
        self
    }

    pub fn register(&mut self, entity: EntityModel) {
        self.entities.insert(entity.name.clone(), entity);
    }
}

impl MetadataRegistry for ModelRegistry {
    fn entity(&self, name: &str) -> Option<&EntityModel> {
        self.entities.get(name)
    }
}

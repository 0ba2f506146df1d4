
use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

///
/// CONSTANTS
///

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

///
/// ValueType
///
/// Column type of a store field, as named by the store's query grammar.
/// The token is written verbatim into `<Value Type="..">` attributes.
///

#[remain::sorted]
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum ValueType {
    Boolean,
    Choice,
    ContentTypeId,
    Counter,
    DateTime,
    Guid,
    Integer,
    Lookup,
    LookupMulti,
    MultiChoice,
    Note,
    Number,
    Taxonomy,
    TaxonomyMulti,
    Text,
    Url,
    User,
    UserMulti,
}

impl ValueType {
    /// Wire token used in rendered `Value` elements.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Choice => "Choice",
            Self::ContentTypeId => "ContentTypeId",
            Self::Counter => "Counter",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::Integer => "Integer",
            Self::Lookup => "Lookup",
            Self::LookupMulti => "LookupMulti",
            Self::MultiChoice => "MultiChoice",
            Self::Note => "Note",
            Self::Number => "Number",
            Self::Taxonomy => "TaxonomyFieldType",
            Self::TaxonomyMulti => "TaxonomyFieldTypeMulti",
            Self::Text => "Text",
            Self::Url => "URL",
            Self::User => "User",
            Self::UserMulti => "UserMulti",
        }
    }

    /// True for columns holding several values per item.
    #[must_use]
    pub const fn is_multi(self) -> bool {
        matches!(
            self,
            Self::LookupMulti | Self::MultiChoice | Self::TaxonomyMulti | Self::UserMulti
        )
    }

    /// True for columns whose values are plain text.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Choice | Self::Note | Self::Text | Self::Url)
    }

    /// True for columns backed by a hierarchical taxonomy term store.
    #[must_use]
    pub const fn is_taxonomy(self) -> bool {
        matches!(self, Self::Taxonomy | Self::TaxonomyMulti)
    }

    /// True for reference columns that can be compared by lookup id.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            Self::Lookup
                | Self::LookupMulti
                | Self::Taxonomy
                | Self::TaxonomyMulti
                | Self::User
                | Self::UserMulti
        )
    }

    /// Default host value for this column type, if the type has one.
    ///
    /// The store persists an absent value for these defaults, so equality
    /// against them must also match empty columns.
    #[must_use]
    pub fn default_value(self) -> Option<Value> {
        match self {
            Self::Boolean => Some(Value::Bool(false)),
            Self::Counter | Self::Integer => Some(Value::Int(0)),
            Self::Number => Some(Value::Float(0.0)),
            Self::Choice | Self::Note | Self::Text | Self::Url => {
                Some(Value::Text(String::new()))
            }
            Self::DateTime => NaiveDate::from_ymd_opt(1, 1, 1)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(Value::DateTime),
            Self::Guid => Some(Value::Guid(Uuid::nil())),
            Self::ContentTypeId
            | Self::Lookup
            | Self::LookupMulti
            | Self::MultiChoice
            | Self::Taxonomy
            | Self::TaxonomyMulti
            | Self::User
            | Self::UserMulti => None,
        }
    }
}

///
/// Value
///
/// Host-side scalar or collection value supplied to a query.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    Text(String),
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Short variant label used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Guid(_) => "guid",
            Self::DateTime(_) => "datetime",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    /// Equality that widens integers to floats.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn loosely_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(left), Self::Float(right)) | (Self::Float(right), Self::Int(left)) => {
                (*left as f64 - right).abs() < f64::EPSILON
            }
            _ => self == other,
        }
    }

    /// Textual representation written into the query document.
    ///
    /// Returns `None` for null and list values, which have no scalar form.
    #[must_use]
    pub fn to_wire_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) => None,
            Self::Bool(value) => Some(if *value { "1" } else { "0" }.to_string()),
            Self::Int(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Guid(value) => Some(value.hyphenated().to_string()),
            Self::DateTime(value) => Some(value.format(DATE_TIME_FORMAT).to_string()),
            Self::Text(value) => Some(value.clone()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

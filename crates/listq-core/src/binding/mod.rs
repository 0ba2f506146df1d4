//! Deferred value resolution.
//!
//! Algebra nodes never hold call-site values directly; they hold bindings
//! that are resolved against a `Bindings` map at render time.

#[cfg(test)]
mod tests;

use crate::value::Value;
use derive_more::Deref;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// BindingError
///
/// `Null` and `EmptyCollection` are expected control-flow signals: the
/// algebra and the filters turn them into unsatisfiable branches.
/// The remaining variants are caller errors.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BindingError {
    #[error("binding '{name}' resolved to null")]
    Null { name: String },

    #[error("binding '{name}' resolved to an empty collection")]
    EmptyCollection { name: String },

    #[error("binding '{name}' is a collection where a scalar was expected")]
    NotScalar { name: String },

    #[error("binding '{name}' is a {found} where {expected} was expected")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl BindingError {
    /// True for the signals that callers rewrite into algebra decisions.
    #[must_use]
    pub const fn is_unsatisfiable(&self) -> bool {
        matches!(self, Self::Null { .. } | Self::EmptyCollection { .. })
    }
}

///
/// Bindings
///
/// Name → value association supplied at render time.
/// Iteration order is the key order, which keeps rendering deterministic.
///

#[derive(Clone, Debug, Default, Deref, PartialEq)]
pub struct Bindings(BTreeMap<String, Value>);

impl Bindings {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Compose two maps without mutating either; `overrides` wins on collision.
    #[must_use]
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut out = self.0.clone();
        out.extend(
            overrides
                .0
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        Self(out)
    }

    /// Look up a non-null value; missing names count as null.
    pub fn value(&self, name: &str) -> Result<&Value, BindingError> {
        match self.0.get(name) {
            Some(Value::Null) | None => Err(BindingError::Null {
                name: name.to_string(),
            }),
            Some(value) => Ok(value),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

///
/// ValueBinding
///
/// Deferred comparison operand: either a literal carried by the node or
/// the name of a value supplied at render time.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ValueBinding {
    Literal(Value),
    Param(String),
}

impl ValueBinding {
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Name used in binding diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Literal(_) => "<literal>",
            Self::Param(name) => name,
        }
    }

    /// Resolve to a value, signalling null and empty collections.
    pub fn resolve(&self, bindings: &Bindings) -> Result<Value, BindingError> {
        let value = match self {
            Self::Literal(Value::Null) => {
                return Err(BindingError::Null {
                    name: self.name().to_string(),
                });
            }
            Self::Literal(value) => value.clone(),
            Self::Param(name) => bindings.value(name)?.clone(),
        };

        match &value {
            Value::List(values) if values.is_empty() => Err(BindingError::EmptyCollection {
                name: self.name().to_string(),
            }),
            _ => Ok(value),
        }
    }

    /// Resolve a scalar operand to its textual representation.
    pub fn bind_scalar(&self, bindings: &Bindings) -> Result<String, BindingError> {
        let value = self.resolve(bindings)?;

        value.to_wire_text().ok_or_else(|| BindingError::NotScalar {
            name: self.name().to_string(),
        })
    }

    /// Resolve an operand as a sequence of textual values.
    ///
    /// Scalars yield a single element; null elements inside a collection
    /// are skipped, and a collection with nothing left is empty.
    pub fn bind_collection(&self, bindings: &Bindings) -> Result<Vec<String>, BindingError> {
        let value = self.resolve(bindings)?;
        let texts: Vec<String> = match &value {
            Value::List(values) => values.iter().filter_map(Value::to_wire_text).collect(),
            scalar => scalar.to_wire_text().into_iter().collect(),
        };

        if texts.is_empty() {
            return Err(BindingError::EmptyCollection {
                name: self.name().to_string(),
            });
        }

        Ok(texts)
    }
}

impl From<Value> for ValueBinding {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for ValueBinding {
    fn from(value: &str) -> Self {
        Self::Literal(Value::from(value))
    }
}

///
/// FieldName
///
/// Deferred field identity. Translated queries always carry fixed names;
/// parameterized names let callers reuse one tree across columns.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FieldName {
    Fixed(String),
    Param(String),
}

impl FieldName {
    #[must_use]
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::Fixed(name.into())
    }

    /// Identity key used for equality and diagnostics.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Fixed(name) | Self::Param(name) => name,
        }
    }

    pub fn resolve(&self, bindings: &Bindings) -> Result<String, BindingError> {
        match self {
            Self::Fixed(name) => Ok(name.clone()),
            Self::Param(name) => match bindings.value(name)? {
                Value::Text(column) => Ok(column.clone()),
                other => Err(BindingError::TypeMismatch {
                    name: name.clone(),
                    expected: "text",
                    found: other.label(),
                }),
            },
        }
    }
}

//! Execution-collaborator boundary.
//!
//! The engine never talks to the store itself: it hands a rendered view and
//! a row window to an `Executor` and post-processes the returned rows
//! according to the query's execution mode.

#[cfg(test)]
mod tests;

use crate::translate::{ExecutionMode, RowWindow};
use std::fmt::Display;
use thiserror::Error as ThisError;

///
/// ExecuteError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ExecuteError {
    #[error("sequence contains no elements")]
    NoElements,

    #[error("sequence contains more than one element")]
    MoreThanOneElement,

    #[error("element index {index} is out of range")]
    IndexOutOfRange { index: u32 },

    #[error("execution collaborator failed: {message}")]
    Collaborator { message: String },
}

impl ExecuteError {
    pub fn collaborator(err: impl Display) -> Self {
        Self::Collaborator {
            message: err.to_string(),
        }
    }
}

///
/// ExecutionRequest
///
/// Everything the store needs to run one query.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutionRequest {
    pub entity: String,
    /// Rendered `<View>` document.
    pub view: String,
    pub window: RowWindow,
    /// Projected columns; empty means the store's default field set.
    pub view_fields: Vec<String>,
}

///
/// Executor
///
/// Store-facing collaborator. Implementations own I/O, retries and row
/// materialization.
///

pub trait Executor {
    type Row;
    type Error: Display;

    fn execute(&self, request: &ExecutionRequest) -> Result<Vec<Self::Row>, Self::Error>;
}

///
/// QueryOutput
/// Post-processed result of one query.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryOutput<R> {
    Rows(Vec<R>),
    Row(Option<R>),
    Count(u64),
    Bool(bool),
}

impl<R> QueryOutput<R> {
    #[must_use]
    pub fn into_rows(self) -> Vec<R> {
        match self {
            Self::Rows(rows) => rows,
            Self::Row(row) => row.into_iter().collect(),
            Self::Count(_) | Self::Bool(_) => Vec::new(),
        }
    }
}

/// Shape the rows returned for `mode`.
///
/// `index` is the element index of `ElementAt*` modes, relative to the
/// first returned row.
pub fn finish<R>(
    mode: ExecutionMode,
    rows: Vec<R>,
    index: Option<u32>,
) -> Result<QueryOutput<R>, ExecuteError> {
    let count = rows.len();
    let mut rows = rows.into_iter();

    let output = match mode {
        ExecutionMode::Select => QueryOutput::Rows(rows.collect()),
        ExecutionMode::First => QueryOutput::Row(Some(rows.next().ok_or(ExecuteError::NoElements)?)),
        ExecutionMode::FirstOrDefault => QueryOutput::Row(rows.next()),
        ExecutionMode::Single | ExecutionMode::SingleOrDefault => {
            if count > 1 {
                return Err(ExecuteError::MoreThanOneElement);
            }
            match rows.next() {
                None if mode == ExecutionMode::Single => return Err(ExecuteError::NoElements),
                row => QueryOutput::Row(row),
            }
        }
        ExecutionMode::Count => QueryOutput::Count(u64::try_from(count).unwrap_or(u64::MAX)),
        ExecutionMode::Any => QueryOutput::Bool(count > 0),
        // rows matching the negated predicate disprove All
        ExecutionMode::All => QueryOutput::Bool(count == 0),
        ExecutionMode::ElementAt | ExecutionMode::ElementAtOrDefault => {
            let index = index.unwrap_or(0);
            let row = usize::try_from(index).ok().and_then(|at| rows.nth(at));
            match row {
                None if mode == ExecutionMode::ElementAt => {
                    return Err(ExecuteError::IndexOutOfRange { index });
                }
                row => QueryOutput::Row(row),
            }
        }
    };

    Ok(output)
}

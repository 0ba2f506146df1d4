//! Core runtime for listq: the query-expression algebra, the builder
//! expression tree and its translator, the shape-keyed compiled-query cache,
//! and the post-translation filters that adapt queries to the list store.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod algebra;
pub mod binding;
pub mod compile;
pub mod config;
pub mod engine;
pub mod error;
pub mod execute;
pub mod expr;
pub mod filter;
pub mod model;
pub mod translate;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Internal column name that stores the content type id of every list item.
pub const CONTENT_TYPE_ID_COLUMN: &str = "ContentTypeId";

/// Internal column name of the item identifier.
pub const ID_COLUMN: &str = "ID";

///
/// Prelude
///
/// Prelude contains only query vocabulary.
/// No caches, filters, or executors are re-exported here.
///

pub mod prelude {
    pub use crate::{
        binding::Bindings,
        expr::{Expr, Query, QueryExpr, arg, field, index, lit, record, row, when},
        translate::ExecutionMode,
        value::{Value, ValueType},
    };
}

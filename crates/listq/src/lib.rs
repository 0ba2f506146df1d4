//! ## Crate layout
//! - `core`: the engine: algebra, translator, compiled-query cache, filters
//!   and the execution boundary.
//! - `error`: public error type with a stable kind taxonomy.
//!
//! The `prelude` module carries the query vocabulary plus the engine types
//! most callers need.

pub use listq_core as core;

pub mod error;

pub use error::{Error, ErrorKind};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        binding::Bindings,
        config::EngineConfig,
        engine::Engine,
        execute::{ExecutionRequest, Executor, QueryOutput},
        expr::{Expr, Query, QueryExpr, arg, field, index, lit, record, row, when},
        filter::QueryContext,
        model::{ColumnModel, EntityModel, FieldModel, MetadataRegistry, ModelRegistry},
        translate::ExecutionMode,
        value::{Value, ValueType},
    };
    pub use crate::error::{Error, ErrorKind};
}

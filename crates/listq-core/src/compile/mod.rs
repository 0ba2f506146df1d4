//! Shape-keyed query compilation.
//!
//! A query is erased into a parameter-free shape by lifting every maximal
//! row-invariant sub-expression into a placeholder. The shape is translated
//! once and cached under its fingerprint; each call only evaluates the
//! captured sub-expressions and binds them to the placeholders.

mod cache;
mod extract;
mod fingerprint;
mod prepared;


pub use cache::{CacheStats, QueryCache};
pub use extract::{Capture, ErasedQuery, PLACEHOLDER_PREFIX, extract};
pub use fingerprint::ShapeFingerprint;
pub use prepared::{CompiledQuery, PreparedQuery};

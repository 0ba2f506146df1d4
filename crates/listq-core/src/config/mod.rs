//! Engine configuration.
//!
//! Every section defaults field by field, so a partial document keeps the
//! remaining defaults.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

///
/// EngineConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Indent rendered CAML, one element per line.
    pub pretty: bool,

    /// Emit default-of-type branches for equality against deferred values.
    pub default_value_branches: bool,

    pub cache: CacheConfig,
    pub filters: FilterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            default_value_branches: true,
            cache: CacheConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

///
/// CacheConfig
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

///
/// FilterConfig
/// Per-filter toggles, keyed like the filter names.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    pub allow_list: bool,
    pub empty_in: bool,
    pub deleted_terms: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allow_list: true,
            empty_in: true,
            deleted_terms: true,
        }
    }
}

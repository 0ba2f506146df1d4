use crate::{
    binding::Bindings,
    compile::{CompiledQuery, PreparedQuery, ShapeFingerprint, extract},
    error::QueryError,
    expr::QueryExpr,
    translate::Translator,
};
use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

///
/// QueryCache
///
/// Compiled templates keyed by shape fingerprint. Lookups never hold a
/// lock while compiling; when two callers race on a new shape both compile
/// and the first insert wins.
///

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: DashMap<ShapeFingerprint, Arc<CompiledQuery>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    disabled: bool,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that compiles every query and keeps nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Erase `query`, fetch or compile its template and bind this call.
    pub fn prepare(
        &self,
        translator: &Translator<'_>,
        query: &QueryExpr,
        args: &Bindings,
    ) -> Result<PreparedQuery, QueryError> {
        let erased = extract(query);
        let fingerprint = ShapeFingerprint::of(&erased);

        let compiled = match self.get(&fingerprint) {
            Some(compiled) => {
                tracing::debug!(%fingerprint, "query cache hit");
                compiled
            }
            None => {
                tracing::debug!(%fingerprint, "query cache miss");
                let compiled = Arc::new(CompiledQuery::compile(translator, &erased, fingerprint)?);
                self.insert(fingerprint, compiled)
            }
        };

        let bindings = compiled.bind(&erased.captures, args)?;

        Ok(PreparedQuery::new(compiled, bindings))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.len(),
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    // stats are best-effort; relaxed ordering is enough
    fn get(&self, fingerprint: &ShapeFingerprint) -> Option<Arc<CompiledQuery>> {
        let found = if self.disabled {
            None
        } else {
            self.entries.get(fingerprint).map(|entry| Arc::clone(entry.value()))
        };

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);

        found
    }

    fn insert(&self, fingerprint: ShapeFingerprint, compiled: Arc<CompiledQuery>) -> Arc<CompiledQuery> {
        if self.disabled {
            return compiled;
        }

        Arc::clone(self.entries.entry(fingerprint).or_insert(compiled).value())
    }
}

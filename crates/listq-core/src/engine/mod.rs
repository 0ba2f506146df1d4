//! Engine facade tying translation, caching, filtering and execution
//! together under one configuration.

#[cfg(test)]
mod tests;

use crate::{
    binding::Bindings,
    compile::{CacheStats, PreparedQuery, QueryCache},
    config::EngineConfig,
    error::QueryError,
    execute::{ExecutionRequest, Executor, QueryOutput},
    expr::QueryExpr,
    filter::{FilterPipeline, QueryContext},
    model::MetadataRegistry,
    translate::{TranslateOptions, Translator},
};

///
/// Engine
///
/// Owns the metadata registry, the compiled-query cache and the filter
/// pipeline. Shared by reference across threads; every call is independent.
///

pub struct Engine<R: MetadataRegistry> {
    registry: R,
    config: EngineConfig,
    cache: QueryCache,
    pipeline: FilterPipeline,
}

impl<R: MetadataRegistry> Engine<R> {
    #[must_use]
    pub fn new(registry: R, config: EngineConfig) -> Self {
        let cache = if config.cache.enabled {
            QueryCache::new()
        } else {
            QueryCache::disabled()
        };
        let mut pipeline = FilterPipeline::standard();
        pipeline.apply_config(&config.filters);

        Self {
            registry,
            config,
            cache,
            pipeline,
        }
    }

    /// Replace the filter pipeline. The configured toggles still apply.
    #[must_use]
    pub fn with_pipeline(mut self, mut pipeline: FilterPipeline) -> Self {
        pipeline.apply_config(&self.config.filters);
        self.pipeline = pipeline;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    #[must_use]
    pub const fn pipeline(&self) -> &FilterPipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn translator(&self) -> Translator<'_> {
        Translator::new(&self.registry).with_options(TranslateOptions {
            default_value_branches: self.config.default_value_branches,
        })
    }

    /// Compile `query` (or reuse its cached template) and bind `args`.
    pub fn prepare(&self, query: &QueryExpr, args: &Bindings) -> Result<PreparedQuery, QueryError> {
        let prepared = self.cache.prepare(&self.translator(), query, args);
        if let Err(err) = &prepared {
            tracing::debug!(error = %err.display_with_class(), "query rejected");
        }

        prepared
    }

    /// Request the store would receive; `None` when nothing can match.
    pub fn plan(
        &self,
        query: &QueryExpr,
        args: &Bindings,
        context: &QueryContext,
    ) -> Result<Option<ExecutionRequest>, QueryError> {
        self.prepare(query, args)?
            .plan(&self.pipeline, context, self.config.pretty)
    }

    /// Rendered `<View>` document; `None` when nothing can match.
    pub fn render(
        &self,
        query: &QueryExpr,
        args: &Bindings,
        context: &QueryContext,
    ) -> Result<Option<String>, QueryError> {
        Ok(self.plan(query, args, context)?.map(|request| request.view))
    }

    pub fn execute<E: Executor>(
        &self,
        executor: &E,
        query: &QueryExpr,
        args: &Bindings,
        context: &QueryContext,
    ) -> Result<QueryOutput<E::Row>, QueryError> {
        self.prepare(query, args)?
            .execute(executor, &self.pipeline, context, self.config.pretty)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

use crate::{
    algebra::{Node, ViewDocument, bind, render_view},
    binding::Bindings,
    compile::{Capture, ErasedQuery, ShapeFingerprint},
    error::QueryError,
    execute::{ExecuteError, ExecutionRequest, Executor, QueryOutput, finish},
    expr::{Evaluator, collect_leaves, compile_invariant},
    filter::{FilterPipeline, QueryContext},
    translate::{ExecutionMode, RowWindow, TranslatedQuery, Translator},
};
use std::sync::Arc;

///
/// CompiledQuery
///
/// Cached template for one query shape: the translation of the erased
/// shape, where every captured value is a placeholder parameter, plus one
/// evaluator per capture.
///

#[derive(Debug)]
pub struct CompiledQuery {
    fingerprint: ShapeFingerprint,
    translated: TranslatedQuery,
    evaluators: Vec<(String, Evaluator)>,
}

impl CompiledQuery {
    pub fn compile(
        translator: &Translator<'_>,
        erased: &ErasedQuery,
        fingerprint: ShapeFingerprint,
    ) -> Result<Self, QueryError> {
        let translated = translator.translate(&erased.shape)?;
        let evaluators = erased
            .captures
            .iter()
            .map(|capture| Ok((capture.name.clone(), compile_invariant(&capture.expr)?)))
            .collect::<Result<Vec<_>, QueryError>>()?;

        Ok(Self {
            fingerprint,
            translated,
            evaluators,
        })
    }

    #[must_use]
    pub const fn fingerprint(&self) -> ShapeFingerprint {
        self.fingerprint
    }

    #[must_use]
    pub const fn translated(&self) -> &TranslatedQuery {
        &self.translated
    }

    /// Call-site arguments extended with the value of every placeholder.
    ///
    /// `captures` must come from a query with this template's shape; each
    /// evaluator reads the constants of the capture at its position.
    pub fn bind(&self, captures: &[Capture], args: &Bindings) -> Result<Bindings, QueryError> {
        let mut bindings = args.clone();

        for (position, (name, evaluator)) in self.evaluators.iter().enumerate() {
            let mut constants = Vec::with_capacity(evaluator.slots());
            if let Some(capture) = captures.get(position) {
                collect_leaves(&capture.expr, &mut constants);
            }
            let value = evaluator.evaluate(&constants, args)?;
            bindings.insert(name.clone(), value);
        }

        Ok(bindings)
    }
}

///
/// PreparedQuery
/// A compiled template with this call's bindings.
///

#[derive(Clone, Debug)]
pub struct PreparedQuery {
    compiled: Arc<CompiledQuery>,
    bindings: Bindings,
}

impl PreparedQuery {
    #[must_use]
    pub const fn new(compiled: Arc<CompiledQuery>, bindings: Bindings) -> Self {
        Self { compiled, bindings }
    }

    #[must_use]
    pub const fn compiled(&self) -> &Arc<CompiledQuery> {
        &self.compiled
    }

    #[must_use]
    pub const fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.compiled.translated.entity
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.compiled.translated.mode
    }

    /// True when translation already proved that nothing matches.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.compiled.translated.is_unsatisfiable()
    }

    pub fn window(&self) -> Result<RowWindow, QueryError> {
        let translated = &self.compiled.translated;

        Ok(translated.paging.resolve(translated.mode, &self.bindings)?)
    }

    pub fn index(&self) -> Result<Option<u32>, QueryError> {
        Ok(self.compiled.translated.paging.resolve_index(&self.bindings)?)
    }

    /// The template query paired with this call's bindings.
    #[must_use]
    pub fn to_bound(&self) -> Node {
        Node::bound(self.compiled.translated.query.clone(), self.bindings.clone())
    }

    /// Filter, bind and render the query.
    ///
    /// Returns `None` when the query cannot match any item or asks for no
    /// rows; the store must not be asked in that case.
    pub fn plan(
        &self,
        pipeline: &FilterPipeline,
        context: &QueryContext,
        pretty: bool,
    ) -> Result<Option<ExecutionRequest>, QueryError> {
        let translated = &self.compiled.translated;
        if translated.is_unsatisfiable() {
            return Ok(None);
        }

        let context = QueryContext {
            bindings: context.bindings.merged(&self.bindings),
            ..context.clone()
        };

        let filtered = pipeline.run(&context, translated.query.clone())?;
        let query = bind(&filtered, &context.bindings)?;
        if query.is_false() {
            tracing::debug!(entity = %translated.entity, "query is unsatisfiable after binding");
            return Ok(None);
        }

        let projection = match &translated.projection {
            Some(projection) => pipeline.run_projection(&context, projection.clone())?,
            None => None,
        };
        let window = translated.paging.resolve(translated.mode, &context.bindings)?;
        // the store reads a zero row limit as no limit
        if window.limit == Some(0) {
            tracing::debug!(entity = %translated.entity, "query requests no rows");
            return Ok(None);
        }

        let view = render_view(
            &ViewDocument {
                query: &query,
                projection: projection.as_ref(),
                row_limit: window.limit,
            },
            &context.bindings,
            pretty,
        )?;
        tracing::trace!(entity = %translated.entity, %view, "query rendered");

        let view_fields = projection
            .iter()
            .flat_map(|projection| projection.fields())
            .map(|field| field.name.key().to_string())
            .collect();

        Ok(Some(ExecutionRequest {
            entity: translated.entity.clone(),
            view,
            window,
            view_fields,
        }))
    }

    /// Plan the query, hand it to `executor` and shape the returned rows.
    pub fn execute<E: Executor>(
        &self,
        executor: &E,
        pipeline: &FilterPipeline,
        context: &QueryContext,
        pretty: bool,
    ) -> Result<QueryOutput<E::Row>, QueryError> {
        let mode = self.mode();
        let index = self.index()?;

        let rows = match self.plan(pipeline, context, pretty)? {
            Some(request) => executor
                .execute(&request)
                .map_err(ExecuteError::collaborator)?,
            None => Vec::new(),
        };

        Ok(finish(mode, rows, index)?)
    }
}

//! Post-translation filters.
//!
//! Filters adapt a translated query to the list it runs against. Each one
//! is a structural rewrite over the algebra tree; the pipeline runs them
//! in order and stops as soon as the query becomes unsatisfiable.

mod allow_list;
mod deleted_terms;
mod empty_in;


pub use allow_list::AllowListFilter;
pub use deleted_terms::DeletedTermFilter;
pub use empty_in::EmptyInFilter;

use crate::{
    algebra::{AlgebraError, Collection, Node},
    binding::Bindings,
    config::FilterConfig,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// QueryContext
///
/// Per-call facts the filters decide on.
///

#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    pub entity: String,
    /// Call-site values, placeholders included.
    pub bindings: Bindings,
    /// Columns the target list defines; `None` allows every column.
    pub allowed_columns: Option<BTreeSet<String>>,
    /// Deleted term lookup ids, keyed by taxonomy column.
    pub deleted_terms: BTreeMap<String, Vec<i64>>,
}

impl QueryContext {
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    #[must_use]
    pub fn with_allowed_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_deleted_terms(mut self, column: impl Into<String>, ids: Vec<i64>) -> Self {
        self.deleted_terms.insert(column.into(), ids);
        self
    }
}

///
/// QueryFilter
///

pub trait QueryFilter: Send + Sync {
    /// Stable name used by configuration toggles.
    fn name(&self) -> &'static str;

    fn should_apply(&self, context: &QueryContext) -> bool;

    /// Rewrite `node`; `Empty(false)` marks the whole query unsatisfiable.
    fn rewrite(&self, context: &QueryContext, node: Node) -> Result<Node, AlgebraError>;
}

///
/// FilterPipeline
/// Ordered filters, each independently toggled.
///

pub struct FilterPipeline {
    stages: Vec<Stage>,
}

struct Stage {
    filter: Box<dyn QueryFilter>,
    enabled: bool,
}

impl FilterPipeline {
    /// Pipeline with no filters.
    #[must_use]
    pub const fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Allow-list, empty-`In` and deleted-term filters, in that order.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with(AllowListFilter)
            .with(EmptyInFilter)
            .with(DeletedTermFilter)
    }

    #[must_use]
    pub fn with(mut self, filter: impl QueryFilter + 'static) -> Self {
        self.stages.push(Stage {
            filter: Box::new(filter),
            enabled: true,
        });
        self
    }

    /// Toggle the filter called `name`. Returns whether it exists.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for stage in &mut self.stages {
            if stage.filter.name() == name {
                stage.enabled = enabled;
                found = true;
            }
        }
        found
    }

    pub fn apply_config(&mut self, config: &FilterConfig) {
        self.set_enabled(AllowListFilter::NAME, config.allow_list);
        self.set_enabled(EmptyInFilter::NAME, config.empty_in);
        self.set_enabled(DeletedTermFilter::NAME, config.deleted_terms);
    }

    /// Names of the enabled filters, in run order.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .filter(|stage| stage.enabled)
            .map(|stage| stage.filter.name())
            .collect()
    }

    pub fn run(&self, context: &QueryContext, mut node: Node) -> Result<Node, AlgebraError> {
        for stage in &self.stages {
            if !stage.enabled || !stage.filter.should_apply(context) {
                continue;
            }
            node = stage.filter.rewrite(context, node)?;
            tracing::trace!(filter = stage.filter.name(), entity = %context.entity, "query filter applied");

            if node.is_false() {
                tracing::debug!(
                    filter = stage.filter.name(),
                    entity = %context.entity,
                    "query filter made the query unsatisfiable"
                );
                break;
            }
        }

        Ok(node)
    }

    /// Run the pipeline over a projection. `None` when every column was removed.
    pub fn run_projection(
        &self,
        context: &QueryContext,
        projection: Collection,
    ) -> Result<Option<Collection>, AlgebraError> {
        match self.run(context, Node::Collection(projection))? {
            Node::Collection(collection) => Ok(Some(collection)),
            _ => Ok(None),
        }
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

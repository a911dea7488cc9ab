//! Content queries and the hooks that may rewrite them.
//!
//! Every read against the content repository goes through a [`ContentQuery`].
//! Before execution the query passes through [`QueryHooks`]: first the
//! *refiners*, which typically add constraints, then the *selectors*, which
//! see the fully built query and may substitute it entirely. Hooks run
//! synchronously and in registration order.
//!
//! ```rust
//! use sitemapper_core::query::{ContentQuery, QueryContext, QueryHooks};
//!
//! let hooks = QueryHooks::new().with_refiner(|query: ContentQuery, _ctx: &QueryContext<'_>| {
//!     query.constraint("featured", true)
//! });
//! assert_eq!(hooks.len(), 1);
//! ```

use crate::{ItemId, Site, SiteId, SourcePolicy, SourceRef};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Which sites a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteFilter {
    /// Every site.
    #[default]
    All,
    /// A single site.
    Only(SiteId),
}

impl SiteFilter {
    /// Whether the filter admits `site`.
    #[must_use]
    pub fn matches(self, site: SiteId) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == site,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrder {
    /// Ascending identity, then site. Stable across runs, which keeps windows stable.
    #[default]
    Id,
    /// Most recently updated first.
    UpdatedDesc,
}

/// A repository-specific constraint, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    /// Constraint name, interpreted by the repository.
    pub key: String,
    /// Constraint argument.
    pub value: serde_json::Value,
}

/// A query for the items of one content source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentQuery {
    /// Source whose items are selected.
    pub source: SourceRef,
    /// Site restriction.
    pub site: SiteFilter,
    /// Identity restriction.
    pub ids: Option<Vec<ItemId>>,
    /// Drop link-only placeholder items.
    pub exclude_link_only: bool,
    /// Extra constraints.
    pub constraints: Vec<Constraint>,
    /// Result ordering.
    pub order: QueryOrder,
    /// Number of matching items to skip.
    pub offset: Option<usize>,
    /// Maximum number of items to return.
    pub limit: Option<usize>,
}

impl ContentQuery {
    /// Query every eligible item of `source` on every site.
    #[must_use]
    pub const fn for_source(source: SourceRef) -> Self {
        Self {
            source,
            site: SiteFilter::All,
            ids: None,
            exclude_link_only: true,
            constraints: Vec::new(),
            order: QueryOrder::Id,
            offset: None,
            limit: None,
        }
    }

    /// Restrict to the given sites.
    #[must_use]
    pub const fn site(mut self, site: SiteFilter) -> Self {
        self.site = site;
        self
    }

    /// Restrict to the given identities.
    #[must_use]
    pub fn ids(mut self, ids: Vec<ItemId>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Add a constraint.
    #[must_use]
    pub fn constraint(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.constraints.push(Constraint {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Set the ordering.
    #[must_use]
    pub const fn order_by(mut self, order: QueryOrder) -> Self {
        self.order = order;
        self
    }

    /// Restrict to a window of the ordered results.
    #[must_use]
    pub const fn window(mut self, offset: Option<usize>, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// Why the engine is issuing a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPurpose {
    /// Counting the eligible items of a source for one site.
    Count,
    /// Fetching one chunk window for the site being generated.
    Chunk,
    /// Fetching the other-site instances of a chunk's items.
    Siblings,
    /// Finding the most recently updated item of a source.
    LastModified,
}

/// What a hook knows about the query it is rewriting.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    /// Policy of the source being generated.
    pub policy: &'a SourcePolicy,
    /// Site being generated.
    pub site: &'a Site,
    /// Why the query is issued.
    pub purpose: QueryPurpose,
}

/// Rewrites a query before execution.
pub trait QueryHook: Send + Sync {
    /// Return the query to execute in place of `query`.
    fn apply(&self, query: ContentQuery, ctx: &QueryContext<'_>) -> ContentQuery;
}

impl<F> QueryHook for F
where
    F: Fn(ContentQuery, &QueryContext<'_>) -> ContentQuery + Send + Sync,
{
    fn apply(&self, query: ContentQuery, ctx: &QueryContext<'_>) -> ContentQuery {
        self(query, ctx)
    }
}

/// Ordered query hooks, applied refiners first, then selectors.
#[derive(Clone, Default)]
pub struct QueryHooks {
    refiners: Vec<Arc<dyn QueryHook>>,
    selectors: Vec<Arc<dyn QueryHook>>,
}

impl QueryHooks {
    /// No hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a refiner, run before the selectors.
    #[must_use]
    pub fn with_refiner(mut self, hook: impl QueryHook + 'static) -> Self {
        self.refiners.push(Arc::new(hook));
        self
    }

    /// Append a selector, run last with the fully built query.
    #[must_use]
    pub fn with_selector(mut self, hook: impl QueryHook + 'static) -> Self {
        self.selectors.push(Arc::new(hook));
        self
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refiners.len() + self.selectors.len()
    }

    /// Whether no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every hook over `query`.
    #[must_use]
    pub fn apply(&self, query: ContentQuery, ctx: &QueryContext<'_>) -> ContentQuery {
        self.refiners
            .iter()
            .chain(&self.selectors)
            .fold(query, |query, hook| hook.apply(query, ctx))
    }
}

impl fmt::Debug for QueryHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHooks")
            .field("refiners", &self.refiners.len())
            .field("selectors", &self.selectors.len())
            .finish()
    }
}

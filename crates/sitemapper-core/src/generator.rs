//! Orchestration of a full generation run.
//!
//! For one site, every valid source policy is counted and planned, the
//! planned chunks are resolved and rendered concurrently, each chunk document
//! is stored, and finally the site's index document is written. A failure in
//! one chunk or source is logged and leaves the rest of the run untouched;
//! only a failed index write ends the run with an error. Chunk documents of
//! the site that the new index no longer lists are removed afterwards.

use crate::config::{valid_policies, GeneratorConfig, PolicyStore};
use crate::document::{assemble, assemble_index, IndexEntry};
use crate::linker::alternates_for;
use crate::node::{build_node, NewsHook};
use crate::planner::{plan, ChunkDescriptor};
use crate::query::QueryHooks;
use crate::repository::{ContentRepository, MediaResolver, NoMedia};
use crate::resolver::ContentResolver;
use crate::storage::{chunk_file_name, index_file_name, is_chunk_file_of, DocumentStore};
use crate::{Error, Result, Site, SiteId, SourcePolicy, SourceRef};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Planned documents for one source on one site.
#[derive(Debug, Clone)]
pub struct SourcePlan {
    /// The source.
    pub policy: Arc<SourcePolicy>,
    /// Eligible items on the site.
    pub total: usize,
    /// Planned chunks, in output order.
    pub chunks: Vec<ChunkDescriptor>,
}

/// Outcome of generating one site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Site the report belongs to.
    pub site: Option<SiteId>,
    /// File name of the index document.
    pub index: String,
    /// Chunk documents written, in index order.
    pub documents: Vec<String>,
    /// URL entries written across all chunk documents.
    pub urls: usize,
    /// Items left out because they had no URL or an incomplete news payload.
    pub items_skipped: usize,
    /// Chunks dropped after a resolution, rendering or write failure.
    pub chunks_failed: usize,
    /// Sources dropped because they could not be counted.
    pub sources_failed: usize,
    /// Chunk documents from earlier runs that were removed.
    pub stale_removed: usize,
}

struct ChunkJob {
    chunk: ChunkDescriptor,
    lastmod: Option<DateTime<Utc>>,
}

struct RenderedChunk {
    file_name: String,
    entry: IndexEntry,
    urls: usize,
    skipped: usize,
}

/// Generates sitemap documents for the sites of a content repository.
///
/// Collaborators are injected; nothing is global.
///
/// ```rust,no_run
/// use sitemapper_core::{Config, FileStore, JsonCatalog, SitemapGenerator};
/// use std::sync::Arc;
///
/// # async fn example() -> sitemapper_core::Result<()> {
/// let config = Config::load()?;
/// let catalog = Arc::new(JsonCatalog::load("catalog.json")?);
/// let store = Arc::new(FileStore::new(&config.paths.output)?);
///
/// let generator = SitemapGenerator::new(config.generator, &config, catalog.clone(), store)
///     .with_media(catalog);
/// for report in generator.generate_all(None).await? {
///     println!("{}: {} documents", report.index, report.documents.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct SitemapGenerator {
    config: GeneratorConfig,
    policies: Vec<Arc<SourcePolicy>>,
    repository: Arc<dyn ContentRepository>,
    media: Arc<dyn MediaResolver>,
    hooks: QueryHooks,
    news_hook: Option<Arc<dyn NewsHook>>,
    store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for SitemapGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SitemapGenerator")
            .field("config", &self.config)
            .field("policies", &self.policies.len())
            .field("hooks", &self.hooks)
            .field("news_hook", &self.news_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl SitemapGenerator {
    /// Create a generator. Invalid policies are logged and dropped here.
    #[must_use]
    pub fn new(
        config: GeneratorConfig,
        policies: &dyn PolicyStore,
        repository: Arc<dyn ContentRepository>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            config,
            policies: valid_policies(policies).into_iter().map(Arc::new).collect(),
            repository,
            media: Arc::new(NoMedia),
            hooks: QueryHooks::new(),
            news_hook: None,
            store,
        }
    }

    /// Resolve image fields through `media`.
    #[must_use]
    pub fn with_media(mut self, media: Arc<dyn MediaResolver>) -> Self {
        self.media = media;
        self
    }

    /// Rewrite every content query through `hooks`.
    #[must_use]
    pub fn with_query_hooks(mut self, hooks: QueryHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Adjust news payloads through `hook`.
    #[must_use]
    pub fn with_news_hook(mut self, hook: impl NewsHook + 'static) -> Self {
        self.news_hook = Some(Arc::new(hook));
        self
    }

    /// Source policies that passed validation, in configuration order.
    #[must_use]
    pub fn policies(&self) -> &[Arc<SourcePolicy>] {
        &self.policies
    }

    fn resolver(&self) -> ContentResolver<'_> {
        ContentResolver::new(self.repository.as_ref(), self.media.as_ref(), &self.hooks)
    }

    /// Sites to generate: every publishable site, or only `only`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when `only` names an unknown site and
    /// [`Error::Config`] when it names a site without public URLs.
    pub async fn sites(&self, only: Option<SiteId>) -> Result<Vec<Site>> {
        let sites = self.repository.sites().await?;

        let Some(id) = only else {
            return Ok(sites
                .into_iter()
                .filter(|site| {
                    let publishable = site.is_publishable();
                    if !publishable {
                        debug!(site = %site.id, "site has no public URLs, skipping");
                    }
                    publishable
                })
                .collect());
        };

        let site = sites
            .into_iter()
            .find(|site| site.id == id)
            .ok_or_else(|| Error::NotFound(format!("site {id}")))?;
        if !site.is_publishable() {
            return Err(Error::Config(format!(
                "site {id} has no base URL or does not serve URLs"
            )));
        }
        Ok(vec![site])
    }

    /// Count and plan every source for `site` without writing anything.
    ///
    /// Sources that fail to count are logged and left out.
    #[instrument(skip_all, fields(site = %site.id))]
    pub async fn plan_site(&self, site: &Site) -> Vec<SourcePlan> {
        let resolver = self.resolver();
        let page_size = self.config.page_size();

        stream::iter(self.policies.iter())
            .map(|policy| async move {
                match resolver.count(policy, site).await {
                    Ok(total) => Some(SourcePlan {
                        policy: Arc::clone(policy),
                        total,
                        chunks: plan(policy, total, page_size),
                    }),
                    Err(e) => {
                        warn!(
                            source = %policy.source_ref(),
                            category = e.category(),
                            "failed to count source: {e}"
                        );
                        None
                    },
                }
            })
            .buffered(self.config.concurrency())
            .filter_map(|plan| async move { plan })
            .collect()
            .await
    }

    /// Generate every publishable site, one after another.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal error. Non-fatal site failures are logged.
    pub async fn generate_all(&self, only: Option<SiteId>) -> Result<Vec<GenerationReport>> {
        let mut reports = Vec::new();
        for site in self.sites(only).await? {
            match self.generate(&site).await {
                Ok(report) => reports.push(report),
                Err(e) if e.is_fatal() || only.is_some() => return Err(e),
                Err(e) => warn!(site = %site.id, "site generation failed: {e}"),
            }
        }
        Ok(reports)
    }

    /// Generate and store every document of `site`, then its index.
    ///
    /// # Errors
    ///
    /// Fails when the site cannot be published or the index document cannot
    /// be written. Chunk-level failures are counted in the report instead.
    #[instrument(skip_all, fields(site = %site.id))]
    pub async fn generate(&self, site: &Site) -> Result<GenerationReport> {
        if !site.is_publishable() {
            return Err(Error::Config(format!("site {} has no public URLs", site.id)));
        }

        let mut report = GenerationReport {
            site: Some(site.id),
            index: index_file_name(site.id),
            ..GenerationReport::default()
        };

        let plans = self.plan_site(site).await;
        report.sources_failed = self.policies.len() - plans.len();

        let resolver = self.resolver();
        let jobs: Vec<ChunkJob> = stream::iter(plans)
            .filter(|plan| {
                let empty = plan.chunks.is_empty();
                if empty {
                    debug!(source = %plan.policy.source_ref(), "no eligible items");
                }
                async move { !empty }
            })
            .map(|plan| async move {
                let lastmod = match resolver.last_modified(&plan.policy, site).await {
                    Ok(lastmod) => lastmod,
                    Err(e) => {
                        warn!(source = %plan.policy.source_ref(), "failed to read last modification: {e}");
                        None
                    },
                };
                plan.chunks
                    .into_iter()
                    .map(|chunk| ChunkJob { chunk, lastmod })
                    .collect::<Vec<_>>()
            })
            .buffered(self.config.concurrency())
            .flat_map(stream::iter)
            .collect()
            .await;

        let rendered: Vec<(SourceRef, String, Result<RenderedChunk>)> = stream::iter(jobs)
            .map(|job| async move {
                let source = job.chunk.policy.source_ref();
                let name = job.chunk.base_name.clone();
                (source, name, self.render_chunk(site, job).await)
            })
            .buffered(self.config.concurrency())
            .collect()
            .await;

        let mut entries = Vec::with_capacity(rendered.len());
        for (source, name, outcome) in rendered {
            match outcome {
                Ok(chunk) => {
                    report.urls += chunk.urls;
                    report.items_skipped += chunk.skipped;
                    report.documents.push(chunk.file_name);
                    entries.push(chunk.entry);
                },
                Err(e) => {
                    warn!(%source, chunk = %name, category = e.category(), "chunk skipped: {e}");
                    report.chunks_failed += 1;
                },
            }
        }

        let xml = assemble_index(entries).to_xml()?;
        self.store.save(&report.index, &xml).map_err(|e| match e {
            Error::Storage(_) => e,
            other => Error::Storage(format!("Failed to write {}: {other}", report.index)),
        })?;

        report.stale_removed = self.remove_stale(site.id, &report.documents);

        info!(
            documents = report.documents.len(),
            urls = report.urls,
            skipped = report.items_skipped,
            failed = report.chunks_failed,
            removed = report.stale_removed,
            "wrote {}",
            report.index
        );
        Ok(report)
    }

    /// Remove chunk documents of `site` not listed in `current`.
    fn remove_stale(&self, site: SiteId, current: &[String]) -> usize {
        let names = match self.store.list() {
            Ok(names) => names,
            Err(e) => {
                warn!(%site, "failed to list stored documents: {e}");
                return 0;
            },
        };

        let mut removed = 0;
        for name in names {
            if !is_chunk_file_of(site, &name) || current.contains(&name) {
                continue;
            }
            match self.store.remove(&name) {
                Ok(()) => {
                    debug!(%site, document = %name, "removed stale document");
                    removed += 1;
                },
                Err(e) => warn!(%site, document = %name, "failed to remove stale document: {e}"),
            }
        }
        removed
    }

    async fn render_chunk(&self, site: &Site, job: ChunkJob) -> Result<RenderedChunk> {
        let ChunkJob { chunk, lastmod } = job;
        let location = site.sitemap_url(&chunk.base_name)?;
        let classification = chunk.policy.classification();

        let grouping = self.resolver().resolve(&chunk, site).await?;
        let items = grouping.get(&site.id).map(|items| items.values());

        let mut nodes = Vec::new();
        let mut skipped = 0;
        for entry in items.into_iter().flatten() {
            let alternates = alternates_for(&entry.item, &grouping, site.id);
            match build_node(entry, alternates, classification, self.news_hook.as_deref()) {
                Some(node) => nodes.push(node),
                None => skipped += 1,
            }
        }

        let urls = nodes.len();
        let xml = assemble(nodes, classification).to_xml()?;
        let file_name = chunk_file_name(site.id, &chunk.base_name);
        self.store.save(&file_name, &xml)?;

        Ok(RenderedChunk {
            file_name,
            entry: IndexEntry { location, lastmod },
            urls,
            skipped,
        })
    }
}

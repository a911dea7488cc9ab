//! Resolution of chunk descriptors into annotated, site-grouped content.
//!
//! For one chunk the resolver fetches the window of items for the site being
//! generated, then every other-site instance of those same identities so the
//! linker can emit alternates. Each item is annotated with its policy's
//! priority and change frequency and, when the policy names an image field,
//! the first related media.

use crate::planner::ChunkDescriptor;
use crate::query::{ContentQuery, QueryContext, QueryHooks, QueryOrder, QueryPurpose, SiteFilter};
use crate::repository::{ContentRepository, MediaResolver};
use crate::{AnnotatedItem, ContentItem, ItemAnnotation, ItemId, Result, Site, SiteId, SourcePolicy};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Annotated items keyed by site, then by identity.
pub type SiteGrouping = BTreeMap<SiteId, BTreeMap<ItemId, AnnotatedItem>>;

/// Turns chunk descriptors into annotated items.
#[derive(Clone, Copy)]
pub struct ContentResolver<'a> {
    repository: &'a dyn ContentRepository,
    media: &'a dyn MediaResolver,
    hooks: &'a QueryHooks,
}

impl<'a> ContentResolver<'a> {
    /// Create a resolver over the given collaborators.
    #[must_use]
    pub const fn new(
        repository: &'a dyn ContentRepository,
        media: &'a dyn MediaResolver,
        hooks: &'a QueryHooks,
    ) -> Self {
        Self {
            repository,
            media,
            hooks,
        }
    }

    /// Query for every eligible item of the policy's source, across all sites.
    ///
    /// News sources carry their configured criteria as constraints.
    #[must_use]
    pub fn base_query(policy: &SourcePolicy) -> ContentQuery {
        let query = ContentQuery::for_source(policy.source_ref());
        match &policy.news {
            Some(news) => news
                .criteria
                .iter()
                .fold(query, |query, (key, value)| query.constraint(key.clone(), value.clone())),
            None => query,
        }
    }

    fn prepare(
        &self,
        query: ContentQuery,
        policy: &SourcePolicy,
        site: &Site,
        purpose: QueryPurpose,
    ) -> ContentQuery {
        let ctx = QueryContext {
            policy,
            site,
            purpose,
        };
        self.hooks.apply(query, &ctx)
    }

    /// Number of eligible items of the policy's source on `site`.
    #[instrument(skip_all, fields(source = %policy.handle, site = %site.id))]
    pub async fn count(&self, policy: &SourcePolicy, site: &Site) -> Result<usize> {
        let query = Self::base_query(policy).site(SiteFilter::Only(site.id));
        let query = self.prepare(query, policy, site, QueryPurpose::Count);
        self.repository.count(&query).await
    }

    /// Last-modified time of the most recently updated item of the source on any site.
    #[instrument(skip_all, fields(source = %policy.handle))]
    pub async fn last_modified(
        &self,
        policy: &SourcePolicy,
        site: &Site,
    ) -> Result<Option<DateTime<Utc>>> {
        let query = Self::base_query(policy)
            .order_by(QueryOrder::UpdatedDesc)
            .window(None, Some(1));
        let query = self.prepare(query, policy, site, QueryPurpose::LastModified);

        let items = self.repository.fetch(&query).await?;
        Ok(items.into_iter().map(|item| item.date_updated).max())
    }

    /// Resolve one chunk for `site`.
    ///
    /// The returned grouping always contains an entry for `site`, possibly
    /// empty. Link-only placeholders are dropped even when a hook removed the
    /// exclusion from the query.
    #[instrument(skip_all, fields(chunk = %chunk.base_name, site = %site.id))]
    pub async fn resolve(&self, chunk: &ChunkDescriptor, site: &Site) -> Result<SiteGrouping> {
        let policy = chunk.policy.as_ref();

        let primary = Self::base_query(policy)
            .site(SiteFilter::Only(site.id))
            .window(chunk.offset, chunk.size);
        let primary = self.prepare(primary, policy, site, QueryPurpose::Chunk);
        let items: Vec<ContentItem> = self
            .repository
            .fetch(&primary)
            .await?
            .into_iter()
            .filter(|item| !item.link_only && item.site_id == site.id)
            .collect();

        let mut grouping = SiteGrouping::new();
        grouping.insert(site.id, BTreeMap::new());
        if items.is_empty() {
            debug!("chunk resolved to no items");
            return Ok(grouping);
        }

        let ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();
        let siblings = Self::base_query(policy).site(SiteFilter::All).ids(ids);
        let siblings = self.prepare(siblings, policy, site, QueryPurpose::Siblings);
        let siblings = self
            .repository
            .fetch(&siblings)
            .await?
            .into_iter()
            .filter(|item| !item.link_only && item.site_id != site.id);

        for item in items.into_iter().chain(siblings) {
            let annotated = self.annotate(policy, item).await?;
            grouping
                .entry(annotated.item.site_id)
                .or_default()
                .insert(annotated.item.id, annotated);
        }

        debug!(
            items = grouping.get(&site.id).map_or(0, BTreeMap::len),
            sites = grouping.len(),
            "chunk resolved"
        );
        Ok(grouping)
    }

    async fn annotate(&self, policy: &SourcePolicy, item: ContentItem) -> Result<AnnotatedItem> {
        let image = match policy.image_field.as_deref() {
            Some(field) => self.media.first_media(&item, field).await?,
            None => None,
        };
        Ok(AnnotatedItem {
            annotation: ItemAnnotation::from_policy(policy, image),
            item,
        })
    }
}

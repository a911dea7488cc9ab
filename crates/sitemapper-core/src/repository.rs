//! Collaborator traits the engine reads content through.

use crate::query::ContentQuery;
use crate::{ContentItem, MediaRef, Result, Site};
use async_trait::async_trait;

/// Source of content items.
///
/// Implementations must honor every field of [`ContentQuery`]; the engine
/// relies on `offset`/`limit` being applied after filtering and ordering.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Every site known to the repository.
    async fn sites(&self) -> Result<Vec<Site>>;

    /// Number of items matching `query`, ignoring its window.
    async fn count(&self, query: &ContentQuery) -> Result<usize>;

    /// Items matching `query`, in query order.
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<ContentItem>>;
}

/// Resolves media related to an item through a named field.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// First media related to `item` through `field`, if any.
    async fn first_media(&self, item: &ContentItem, field: &str) -> Result<Option<MediaRef>>;
}

/// Media resolver for repositories without media relations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

#[async_trait]
impl MediaResolver for NoMedia {
    async fn first_media(&self, _item: &ContentItem, _field: &str) -> Result<Option<MediaRef>> {
        Ok(None)
    }
}

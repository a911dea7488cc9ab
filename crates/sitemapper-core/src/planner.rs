//! Pagination planning for sitemap documents.
//!
//! The sitemap protocol caps every document at a fixed number of URLs. The
//! planner turns the number of eligible items in a source into an ordered
//! list of [`ChunkDescriptor`]s, one per output document.
//!
//! ```rust
//! use sitemapper_core::planner::plan;
//! use sitemapper_core::{SourceKind, SourcePolicy};
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//!
//! let policy = Arc::new(SourcePolicy::new(SourceKind::Section, "blog"));
//! let chunks = plan(&policy, 120, NonZeroUsize::new(50));
//!
//! let names: Vec<_> = chunks.iter().map(|c| c.base_name.as_str()).collect();
//! assert_eq!(names, ["blog", "blog_50", "blog_100"]);
//! assert_eq!(chunks[2].size, Some(20));
//! ```

use crate::SourcePolicy;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;

/// One planned sitemap document for a source.
#[derive(Debug, Clone)]
pub struct ChunkDescriptor {
    /// Policy of the source this chunk belongs to.
    pub policy: Arc<SourcePolicy>,
    /// File base name: the source handle, suffixed with `_<offset>` after the first chunk.
    pub base_name: String,
    /// Start index into the source's eligible items; `None` in un-paginated mode.
    pub offset: Option<usize>,
    /// Number of items in this chunk; `None` in un-paginated mode.
    pub size: Option<usize>,
}

impl ChunkDescriptor {
    /// Whether this chunk is a window into a paginated source.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.offset.is_some()
    }

    /// Item range covered by this chunk, if paginated.
    #[must_use]
    pub fn range(&self) -> Option<Range<usize>> {
        match (self.offset, self.size) {
            (Some(offset), Some(size)) => Some(offset..offset + size),
            _ => None,
        }
    }
}

/// Plan the documents for one source.
///
/// Returns no descriptors when the source has no eligible items. Without a
/// per-file limit a single descriptor named after the handle covers the
/// whole source. Otherwise the offsets partition `[0, total)` into
/// `ceil(total / max)` contiguous windows of at most `max` items.
///
/// Names are stable while content only grows; deleting items shifts later
/// windows, which is why every run regenerates everything.
#[must_use]
pub fn plan(
    policy: &Arc<SourcePolicy>,
    total: usize,
    max_entries_per_file: Option<NonZeroUsize>,
) -> Vec<ChunkDescriptor> {
    if total == 0 {
        return Vec::new();
    }

    let Some(max) = max_entries_per_file.map(NonZeroUsize::get) else {
        return vec![ChunkDescriptor {
            policy: Arc::clone(policy),
            base_name: policy.handle.clone(),
            offset: None,
            size: None,
        }];
    };

    (0..total.div_ceil(max))
        .map(|index| {
            let offset = index * max;
            ChunkDescriptor {
                policy: Arc::clone(policy),
                base_name: chunk_name(&policy.handle, offset),
                offset: Some(offset),
                size: Some(max.min(total - offset)),
            }
        })
        .collect()
}

fn chunk_name(handle: &str, offset: usize) -> String {
    if offset == 0 {
        handle.to_string()
    } else {
        format!("{handle}_{offset}")
    }
}

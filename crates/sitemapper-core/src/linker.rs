//! Cross-site alternate links.
//!
//! An item published on several sites is announced once per site; each
//! entry lists the other sites' URLs as `xhtml:link rel="alternate"` with the
//! sibling site's language tag.

use crate::resolver::SiteGrouping;
use crate::{ContentItem, SiteId};
use serde::{Deserialize, Serialize};

/// Another-language version of an item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alternate {
    /// Language tag of the sibling's site.
    pub language: String,
    /// URL of the sibling.
    pub url: String,
}

/// Alternates for `item` from every site other than `current_site`.
///
/// Siblings without a URL are left out. The result is sorted by language
/// then URL so output is reproducible.
#[must_use]
pub fn alternates_for(
    item: &ContentItem,
    grouping: &SiteGrouping,
    current_site: SiteId,
) -> Vec<Alternate> {
    let mut alternates: Vec<Alternate> = grouping
        .iter()
        .filter(|(site_id, _)| **site_id != current_site)
        .filter_map(|(_, items)| items.get(&item.id))
        .filter_map(|sibling| {
            sibling.item.url.as_ref().map(|url| Alternate {
                language: sibling.item.language.clone(),
                url: url.clone(),
            })
        })
        .collect();
    alternates.sort();
    alternates
}

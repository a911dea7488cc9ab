//! # sitemapper-core
//!
//! Core engine for generating paginated, multi-site XML sitemaps from a
//! content repository.
//!
//! Every content source (a section or category) is published under a
//! [`SourcePolicy`]. For each site the engine counts the eligible items of
//! every source, splits them into documents of bounded size, renders each
//! document with cross-site alternate links and the image or news extension,
//! and finally writes a sitemap index referencing the documents.
//!
//! ## Architecture
//!
//! - **Planner** ([`planner`]): item counts to chunk descriptors
//! - **Resolver** ([`resolver`]): chunk descriptors to annotated, site-grouped items
//! - **Linker** ([`linker`]): alternates between per-site instances of an item
//! - **Node builder** ([`node`]): items to standard or news URL nodes
//! - **Documents** ([`document`]): nodes to `urlset` and `sitemapindex` XML
//! - **Generator** ([`generator`]): drives a full run and persists through [`storage`]
//!
//! Content is read through the [`ContentRepository`] and [`MediaResolver`]
//! traits. [`JsonCatalog`] implements both on top of a JSON file.
//!
//! ## Quick Start
//!
//! ```rust
//! use sitemapper_core::planner::plan;
//! use sitemapper_core::storage::chunk_file_name;
//! use sitemapper_core::{SiteId, SourceKind, SourcePolicy};
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//!
//! let blog = Arc::new(SourcePolicy::new(SourceKind::Section, "blog").with_priority(0.8));
//! let files: Vec<_> = plan(&blog, 120, NonZeroUsize::new(50))
//!     .iter()
//!     .map(|chunk| chunk_file_name(SiteId(1), &chunk.base_name))
//!     .collect();
//!
//! assert_eq!(files, ["sitemap_1_blog.xml", "sitemap_1_blog_50.xml", "sitemap_1_blog_100.xml"]);
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Only storage failures are
//! fatal to a run; see [`Error::is_fatal`].

/// JSON file-backed content repository
pub mod catalog;
/// Configuration loading and source policies
pub mod config;
/// Sitemap and index documents
pub mod document;
/// Error types and result aliases
pub mod error;
/// Generation runs
pub mod generator;
/// Cross-site alternate links
pub mod linker;
/// URL nodes and the news hook
pub mod node;
/// Pagination planning
pub mod planner;
/// Content queries and query hooks
pub mod query;
/// Sitemap XML parsing
pub mod reader;
/// Content collaborator traits
pub mod repository;
/// Chunk resolution
pub mod resolver;
/// Document persistence
pub mod storage;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use catalog::JsonCatalog;
pub use config::{Config, GeneratorConfig, PathsConfig, PolicyStore};
pub use document::{IndexDocument, IndexEntry, SitemapDocument};
pub use error::{Error, Result};
pub use generator::{GenerationReport, SitemapGenerator, SourcePlan};
pub use node::{NewsHook, NewsPayload, UrlNode};
pub use query::{ContentQuery, QueryHook, QueryHooks};
pub use repository::{ContentRepository, MediaResolver, NoMedia};
pub use storage::{DocumentStore, FileStore};
pub use types::*;

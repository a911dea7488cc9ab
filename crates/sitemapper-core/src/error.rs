//! Error types and handling for sitemapper-core operations.
//!
//! One error type covers every failure in the generation engine. Errors are
//! categorized so the orchestrator can decide what is isolated to a single
//! chunk or source and what aborts a run.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: file system operations
//! - **XML Errors**: writing or reading sitemap documents
//! - **Content Errors**: content repository or media resolver failures
//! - **Storage Errors**: persisting generated documents
//! - **Configuration Errors**: invalid settings or source policies
//!
//! ```rust
//! use sitemapper_core::Error;
//!
//! let err = Error::Content("query timed out".to_string());
//! assert_eq!(err.category(), "content");
//! assert!(!err.is_fatal());
//! ```

use thiserror::Error;

/// The main error type for sitemapper-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading configuration and catalog files and writing documents.
    /// The underlying `std::io::Error` is preserved.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML could not be written or read.
    #[error("XML error: {0}")]
    Xml(String),

    /// A value could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Invalid TOML syntax in the config file
    /// - Source policy without a handle
    /// - Priority outside `0.0..=1.0`
    #[error("Configuration error: {0}")]
    Config(String),

    /// The content repository or media resolver failed.
    ///
    /// Isolated to the chunk being resolved; the run continues.
    #[error("Content error: {0}")]
    Content(String),

    /// Persisting a generated document failed.
    ///
    /// A failed chunk write drops that chunk from the index. A failed index
    /// write, or an output location that cannot be created, ends the run.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl Error {
    /// Whether the error must end a generation run.
    ///
    /// Only storage unavailability is fatal; everything else is isolated to
    /// a chunk or a source.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for structured logging and for mapping errors to exit codes.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Xml(_) => "xml",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::Content(_) => "content",
            Self::Storage(_) => "storage",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

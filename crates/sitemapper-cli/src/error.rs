//! CLI error handling with semantic exit codes.
//!
//! Errors are categorized so scripts and schedulers can react to the kind of
//! failure without parsing messages.
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Run completed (possibly with skipped chunks) |
//! | 1 | `Internal` | Unexpected error |
//! | 2 | `Usage` | Invalid arguments, configuration or catalog |
//! | 3 | `NotFound` | Catalog, document or site not found |
//! | 7 | `Storage` | Output could not be written |
//!
//! ```bash
//! sitemapper generate --site 4
//! case $? in
//!     0) echo "done" ;;
//!     3) echo "no such site" ;;
//!     7) echo "output unavailable" ;;
//! esac
//! ```

use std::fmt;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    ///
    /// Also covers malformed catalog and sitemap files.
    Usage = 2,

    /// Requested resource not found (exit code 3).
    NotFound = 3,

    /// Generated documents could not be persisted (exit code 7).
    Storage = 7,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::Storage => "storage error",
        }
    }

    /// Category for an engine error.
    #[must_use]
    pub const fn from_core(err: &sitemapper_core::Error) -> Self {
        use sitemapper_core::Error;

        match err {
            Error::NotFound(_) => Self::NotFound,
            Error::Storage(_) => Self::Storage,
            Error::Config(_)
            | Error::Parse(_)
            | Error::Xml(_)
            | Error::InvalidUrl(_)
            | Error::Serialization(_) => Self::Usage,
            Error::Io(_) | Error::Content(_) => Self::Internal,
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that were never categorized.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("not found")
            || msg_lower.contains("no such")
            || msg_lower.contains("does not exist")
        {
            return Self::NotFound;
        }

        if msg_lower.contains("storage")
            || msg_lower.contains("permission denied")
            || msg_lower.contains("read-only")
        {
            return Self::Storage;
        }

        if msg_lower.contains("invalid argument")
            || msg_lower.contains("invalid value")
            || msg_lower.contains("configuration")
            || msg_lower.contains("parse error")
        {
            return Self::Usage;
        }

        Self::Internal
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
///
/// Wraps an `anyhow::Error` so context chains survive.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl From<sitemapper_core::Error> for CliError {
    fn from(err: sitemapper_core::Error) -> Self {
        Self::new(ErrorCategory::from_core(&err), err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// Checks for a [`CliError`], then an engine error, then falls back to
/// inference from the message.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }

    if let Some(core_err) = err.downcast_ref::<sitemapper_core::Error>() {
        return ErrorCategory::from_core(core_err).exit_code();
    }

    ErrorCategory::infer_from_message(&err.to_string()).exit_code()
}

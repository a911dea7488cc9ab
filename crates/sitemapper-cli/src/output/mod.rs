//! Output formatting for command results.

mod format;

pub use format::{OutputFormat, print_json};

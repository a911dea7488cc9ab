#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a `sitemapper` command isolated from the user's configuration.
#[allow(dead_code)]
pub fn sitemapper_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemapper"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("SITEMAPPER_CONFIG");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A temporary project: config file, catalog and output directory.
#[allow(dead_code)]
pub struct Project {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Project {
    /// Two sites, five blog posts on the first, at most two URLs per document.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create project dir");

        let items: Vec<_> = (1..=5)
            .map(|id| {
                json!({
                    "id": id,
                    "site_id": 1,
                    "source": { "kind": "section", "handle": "blog" },
                    "url": format!("https://example.com/blog/{id}"),
                    "title": format!("Post {id}"),
                    "date_updated": format!("2024-03-0{id}T08:00:00Z")
                })
            })
            .collect();
        let catalog = json!({
            "sites": [
                { "id": 1, "handle": "en", "language": "en", "base_url": "https://example.com/" },
                { "id": 2, "handle": "staging", "language": "en", "base_url": null }
            ],
            "items": items
        });
        fs::write(dir.path().join("catalog.json"), catalog.to_string()).unwrap();

        let config = format!(
            r#"[generator]
max_entries_per_file = 2

[paths]
output = "{}"
catalog = "{}"

[[sources]]
kind = "section"
handle = "blog"
priority = 0.8
"#,
            dir.path().join("out").display(),
            dir.path().join("catalog.json").display(),
        );
        fs::write(dir.path().join("config.toml"), config).unwrap();

        Self { dir }
    }

    pub fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `sitemapper` pointed at this project's config file.
    pub fn cmd(&self) -> Command {
        let mut cmd = sitemapper_cmd();
        cmd.env("SITEMAPPER_CONFIG", self.config());
        cmd
    }
}

//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"              # Directory loaded into the pipeline (relative to project root)
//! destination = "build"       # Directory the pipeline writes to (relative to project root)
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Source directory read into the file mapping.
    pub source: PathBuf,

    /// Output directory the file mapping is written to.
    pub destination: PathBuf,

    /// Clean destination directory before writing (CLI only).
    #[serde(skip)]
    pub clean: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            source: "src".into(),
            destination: "build".into(),
            clean: false,
        }
    }
}

impl BuildSectionConfig {
    /// Validate build configuration.
    ///
    /// Expects paths to be normalized against the project root.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.source.is_dir() {
            diag.error_with_hint(
                FieldPath::new("build", "source"),
                format!("source directory '{}' not found", self.source.display()),
                "set `build.source` or pass `--source`",
            );
        }
        // Covers equal paths too. `--clean` would remove the sources.
        if self.source.starts_with(&self.destination) {
            diag.error_with_hint(
                FieldPath::new("build", "destination"),
                format!(
                    "destination '{}' contains the source directory",
                    self.destination.display()
                ),
                "write to a sibling directory such as `build`",
            );
        } else if self.destination.starts_with(&self.source) {
            diag.error_with_hint(
                FieldPath::new("build", "destination"),
                format!(
                    "destination '{}' is inside the source directory",
                    self.destination.display()
                ),
                "output would be read back in on the next build",
            );
        }
    }
}

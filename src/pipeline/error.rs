//! Build error types.

use std::fmt;
use thiserror::Error;

/// Boxed per-file error reported by a plugin.
pub type PluginError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while running a pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A plugin could not prepare its per-build state.
    #[error("plugin `{plugin}` failed to start: {source}")]
    Setup {
        plugin: &'static str,
        #[source]
        source: PluginError,
    },

    /// One or more files failed inside a plugin.
    #[error("{0}")]
    Plugin(PluginFailures),
}

impl BuildError {
    /// Per-file errors when this is a [`BuildError::Plugin`].
    pub fn failures(&self) -> &[PluginError] {
        match self {
            Self::Plugin(failures) => &failures.errors,
            Self::Setup { .. } => &[],
        }
    }
}

/// Every file error collected from a single plugin run.
#[derive(Debug)]
pub struct PluginFailures {
    pub plugin: &'static str,
    pub errors: Vec<PluginError>,
}

impl fmt::Display for PluginFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "file" } else { "files" };
        write!(
            f,
            "plugin `{}` failed on {} {noun}",
            self.plugin,
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

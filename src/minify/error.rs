//! Minification error types.

use crate::config::InvalidTargets;
use thiserror::Error;

/// Errors reported by the clean-css plugin.
#[derive(Debug, Error)]
pub enum MinifyError {
    /// The engine rejected a stylesheet.
    ///
    /// `diagnostics` is never empty.
    #[error("{path}: {}", .diagnostics.join("; "))]
    Minify {
        path: String,
        diagnostics: Vec<String>,
    },

    /// Engine options could not be resolved when the build started.
    #[error(transparent)]
    Targets(#[from] InvalidTargets),
}

impl MinifyError {
    /// Engine diagnostics for a rejected stylesheet.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::Minify { diagnostics, .. } => diagnostics,
            Self::Targets(_) => &[],
        }
    }

    /// Virtual path of the rejected stylesheet.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Minify { path, .. } => Some(path),
            Self::Targets(_) => None,
        }
    }
}

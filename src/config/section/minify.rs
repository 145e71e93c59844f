//! `[minify]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [minify]
//! files = "**/*.css"                  # Glob selecting stylesheets to minify
//! source_map = true                   # Attach source maps (`sourceMap` also accepted)
//! source_map_inline_sources = false   # Embed sources, skip the sibling `.map` file
//!
//! [minify.clean_css]                  # Engine options (`cleanCSS` also accepted)
//! minify = true                       # Compact output and merge rules
//! special_comments = "all"            # all | first | none
//! inline = "none"                     # none | local | all
//! rebase_to = "assets"                # Root for source map paths (default: project root)
//! targets = ["> 0.5%", "not dead"]    # Browserslist queries
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::pipeline::Pattern;
use lightningcss::targets::{Browsers, Targets};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default pattern: stylesheets at any depth.
pub const DEFAULT_PATTERN: &str = "**/*.css";

/// Plugin options, resolved once per build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanCssOptions {
    /// Options forwarded to the minification engine.
    #[serde(alias = "cleanCSS")]
    pub clean_css: EngineOptions,

    /// Glob selecting which files are transformed.
    pub files: String,

    /// Generate source maps.
    #[serde(alias = "sourceMap")]
    pub source_map: bool,

    /// Embed source text in the map instead of writing a sibling `.map` file.
    #[serde(alias = "sourceMapInlineSources")]
    pub source_map_inline_sources: bool,
}

impl Default for CleanCssOptions {
    fn default() -> Self {
        Self {
            clean_css: EngineOptions::default(),
            files: DEFAULT_PATTERN.into(),
            source_map: false,
            source_map_inline_sources: false,
        }
    }
}

impl CleanCssOptions {
    /// Validate minify configuration.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(err) = Pattern::new(&self.files) {
            diag.error_with_hint(
                FieldPath::new("minify", "files"),
                format!("invalid glob `{}`: {}", self.files, err.kind()),
                "use patterns like `**/*.css` or `styles/*.css`",
            );
        }

        if let Err(err) = self.clean_css.resolve_targets() {
            diag.error(FieldPath::new("minify.clean_css", "targets"), err.to_string());
        }

        if self.source_map_inline_sources && !self.source_map {
            diag.warn(
                FieldPath::new("minify", "source_map_inline_sources"),
                "has no effect unless `source_map` is enabled",
            );
        }
    }
}

/// Engine options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Compact output and merge rules.
    pub minify: bool,

    /// Which `/*! ... */` comments to keep.
    #[serde(alias = "specialComments")]
    pub special_comments: SpecialComments,

    /// Which `@import` rules to inline.
    pub inline: InlineImports,

    /// Project root for source map paths.
    #[serde(alias = "rebaseTo")]
    pub rebase_to: Option<PathBuf>,

    /// Browserslist queries used for prefixing and syntax lowering.
    pub targets: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            minify: true,
            special_comments: SpecialComments::All,
            inline: InlineImports::None,
            rebase_to: None,
            targets: Vec::new(),
        }
    }
}

impl EngineOptions {
    /// Resolve browserslist queries into engine targets.
    pub fn resolve_targets(&self) -> Result<Targets, InvalidTargets> {
        if self.targets.is_empty() {
            return Ok(Targets::default());
        }
        let browsers = Browsers::from_browserslist(&self.targets)
            .map_err(|err| InvalidTargets(err.to_string()))?;
        Ok(browsers.map(Targets::from).unwrap_or_default())
    }
}

#[derive(Debug, Error)]
#[error("invalid browser targets: {0}")]
pub struct InvalidTargets(pub String);

/// License comment retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialComments {
    /// Keep every `/*! ... */` comment.
    All,
    /// Keep only the first one.
    First,
    /// Drop them all.
    None,
}

/// `@import` inlining policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineImports {
    /// Leave every `@import` in place.
    None,
    /// Inline imports of files present in the mapping, keep remote ones.
    Local,
    /// Inline everything. Remote imports cannot be fetched and fail.
    All,
}

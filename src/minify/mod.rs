//! Stylesheet minification plugin.
//!
//! Minifies every file matching the configured pattern in place and, when
//! enabled, attaches a source map:
//!
//! - as the record's `source_map` property, always
//! - as a sibling `<path>.map` record, unless inline sources are requested
//!
//! An existing map (the record's property, else a non-empty sibling `.map`
//! record) is treated as the input map and composed into the new one.

mod engine;
mod error;
mod imports;

pub use engine::{Input, Minified, Minifier, SourceMapSettings};
pub use error::MinifyError;
pub use imports::{ImportError, MappedSources};

use std::borrow::Cow;

use crate::config::CleanCssOptions;
use crate::debug;
use crate::pipeline::{BuildContext, Emitted, FileRecord, Files, Pattern, Plugin};

/// Suffix appended to a stylesheet path to name its source map.
pub const MAP_SUFFIX: &str = ".map";

/// The clean-css pipeline plugin.
#[derive(Debug)]
pub struct CleanCss {
    options: CleanCssOptions,
    pattern: Pattern,
}

impl CleanCss {
    /// Create the plugin, compiling the `files` pattern.
    pub fn new(options: CleanCssOptions) -> Result<Self, globset::Error> {
        let pattern = Pattern::new(&options.files)?;
        Ok(Self { options, pattern })
    }

    fn source_map_settings(&self, ctx: &BuildContext) -> Option<SourceMapSettings> {
        self.options.source_map.then(|| SourceMapSettings {
            rebase_to: self
                .options
                .clean_css
                .rebase_to
                .clone()
                .unwrap_or_else(|| ctx.root().to_path_buf()),
            inline_sources: self.options.source_map_inline_sources,
        })
    }
}

impl Plugin for CleanCss {
    type State = Minifier;
    type Error = MinifyError;

    fn name(&self) -> &'static str {
        "clean-css"
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn before(&self, _files: &Files, ctx: &BuildContext) -> Result<Minifier, MinifyError> {
        let minifier = Minifier::new(
            ctx.root(),
            &self.options.clean_css,
            self.source_map_settings(ctx),
        )?;
        debug!("minify"; "minifier ready (source maps: {})", minifier.source_maps().is_some());
        Ok(minifier)
    }

    fn each(
        &self,
        minifier: &Minifier,
        path: &str,
        file: &mut FileRecord,
        files: &Files,
    ) -> Result<Emitted, MinifyError> {
        let map_path = format!("{path}{MAP_SUFFIX}");

        let output = {
            let sibling_map = files
                .get(&map_path)
                .map(FileRecord::text)
                .filter(|map| !map.is_empty());
            let input_map: Option<Cow<'_, str>> = file
                .source_map
                .as_deref()
                .map(String::from_utf8_lossy)
                .or(sibling_map);
            let styles = file.text();

            let input = Input {
                name: path,
                styles: &styles,
                source_map: input_map.as_deref(),
            };
            minifier
                .minify(input, files)
                .map_err(|diagnostics| MinifyError::Minify {
                    path: path.to_string(),
                    diagnostics,
                })?
        };

        debug!("minify"; "{} ({} -> {} bytes)", path, file.contents.len(), output.styles.len());
        file.contents = output.styles.into_bytes();

        let mut emitted = Emitted::new();
        if self.options.source_map
            && let Some(map) = output.source_map
        {
            let map = map.into_bytes();
            if !self.options.source_map_inline_sources {
                let mut sibling = files.get(&map_path).cloned().unwrap_or_default();
                sibling.contents = map.clone();
                emitted.push((map_path, sibling));
            }
            file.source_map = Some(map);
        }

        Ok(emitted)
    }

    fn after(&self, minifier: Minifier) {
        drop(minifier);
        debug!("minify"; "minifier released");
    }
}

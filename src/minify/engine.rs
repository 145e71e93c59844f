//! Minification engine handle.
//!
//! Wraps lightningcss for parsing, minifying and printing, and
//! parcel_sourcemap for generating and composing source maps. A [`Minifier`]
//! only holds resolved configuration; engine state is created per call, so
//! one instance can serve many threads at once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lightningcss::bundler::Bundler;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::{SourceMap, SourceMapError};

use super::imports::MappedSources;
use crate::config::{EngineOptions, InlineImports, InvalidTargets, SpecialComments};
use crate::pipeline::Files;

/// Source map generation settings.
#[derive(Debug, Clone)]
pub struct SourceMapSettings {
    /// Directory source paths in the map are relative to.
    pub rebase_to: PathBuf,
    /// Embed source text in the map.
    pub inline_sources: bool,
}

/// One stylesheet submitted for minification.
#[derive(Debug, Clone, Copy)]
pub struct Input<'a> {
    /// Virtual path, echoed back as the map's source.
    pub name: &'a str,
    pub styles: &'a str,
    /// Map from a previous transform of `styles`.
    pub source_map: Option<&'a str>,
}

/// Engine output.
#[derive(Debug, Clone)]
pub struct Minified {
    pub styles: String,
    /// Source map JSON, present when source maps are enabled.
    pub source_map: Option<String>,
}

/// Per-build minifier configured from engine options.
#[derive(Debug)]
pub struct Minifier {
    root: PathBuf,
    minify: bool,
    special_comments: SpecialComments,
    inline: InlineImports,
    targets: Targets,
    source_maps: Option<SourceMapSettings>,
}

impl Minifier {
    /// Build a minifier for files living under `root`.
    pub fn new(
        root: &Path,
        options: &EngineOptions,
        source_maps: Option<SourceMapSettings>,
    ) -> Result<Self, InvalidTargets> {
        Ok(Self {
            root: root.to_path_buf(),
            minify: options.minify,
            special_comments: options.special_comments,
            inline: options.inline,
            targets: options.resolve_targets()?,
            source_maps,
        })
    }

    pub fn source_maps(&self) -> Option<&SourceMapSettings> {
        self.source_maps.as_ref()
    }

    /// Minify one stylesheet.
    ///
    /// `files` backs `@import` inlining. On failure every engine diagnostic is
    /// returned; the list is never empty.
    pub fn minify(&self, input: Input<'_>, files: &Files) -> Result<Minified, Vec<String>> {
        let mut source_map = self.new_source_map();
        let entry = self.root.join(input.name);

        let stylesheet = match self.inline {
            InlineImports::None => {
                if let Some(map) = source_map.as_mut() {
                    self.register_source(map, &entry, input.styles)?;
                }
                let options = ParserOptions {
                    filename: entry.to_string_lossy().into_owned(),
                    ..ParserOptions::default()
                };
                StyleSheet::parse(input.styles, options).map_err(diagnostic)?
            }
            InlineImports::Local | InlineImports::All => {
                let sources =
                    MappedSources::new(&self.root, input.name, input.styles, files, self.inline);
                let mut bundler =
                    Bundler::new(&sources, source_map.as_mut(), ParserOptions::default());
                let bundled = bundler.bundle(&entry).map_err(diagnostic)?;
                drop(bundler);
                return self.finish(bundled, source_map, input.source_map);
            }
        };

        self.finish(stylesheet, source_map, input.source_map)
    }

    fn new_source_map(&self) -> Option<SourceMap> {
        self.source_maps
            .as_ref()
            .map(|_| SourceMap::new(&self.rebase_root()))
    }

    fn rebase_root(&self) -> String {
        self.source_maps
            .as_ref()
            .map_or(&self.root, |settings| &settings.rebase_to)
            .to_string_lossy()
            .into_owned()
    }

    fn register_source(
        &self,
        map: &mut SourceMap,
        entry: &Path,
        styles: &str,
    ) -> Result<(), Vec<String>> {
        let index = map.add_source(&entry.to_string_lossy());
        if self.source_maps.as_ref().is_some_and(|s| s.inline_sources) {
            map.set_source_content(index as usize, styles)
                .map_err(diagnostic)?;
        }
        Ok(())
    }

    /// Minify, print and compose the source map.
    fn finish(
        &self,
        mut stylesheet: StyleSheet<'_>,
        mut source_map: Option<SourceMap>,
        input_map: Option<&str>,
    ) -> Result<Minified, Vec<String>> {
        match self.special_comments {
            SpecialComments::All => {}
            SpecialComments::First => stylesheet.license_comments.truncate(1),
            SpecialComments::None => stylesheet.license_comments.clear(),
        }

        if self.minify {
            stylesheet
                .minify(MinifyOptions {
                    targets: self.targets,
                    ..MinifyOptions::default()
                })
                .map_err(diagnostic)?;
        }

        let printed = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets: self.targets,
                source_map: source_map.as_mut(),
                ..PrinterOptions::default()
            })
            .map_err(diagnostic)?;

        let source_map = match source_map {
            Some(mut map) => {
                if let Some(input) = input_map {
                    let root = self.rebase_root();
                    let mut original = SourceMap::from_json(&root, input).map_err(diagnostic)?;
                    map.extends(&mut original).map_err(diagnostic)?;
                    map = referenced_sources_only(&map, &root).map_err(diagnostic)?;
                }
                Some(map.to_json(None).map_err(diagnostic)?)
            }
            None => None,
        };

        Ok(Minified {
            styles: printed.code,
            source_map,
        })
    }
}

/// Rebuild `map` keeping only the sources some mapping points at.
///
/// After composition the stylesheet's own entry is usually unreferenced.
fn referenced_sources_only(map: &SourceMap, root: &str) -> Result<SourceMap, SourceMapError> {
    let mut pruned = SourceMap::new(root);
    let mut remapped: BTreeMap<u32, u32> = BTreeMap::new();

    for mapping in map.get_mappings() {
        let original = match mapping.original {
            Some(mut original) => {
                original.source = match remapped.get(&original.source) {
                    Some(&index) => index,
                    None => {
                        let index = pruned.add_source(map.get_source(original.source)?);
                        if let Ok(content) = map.get_source_content(original.source)
                            && !content.is_empty()
                        {
                            pruned.set_source_content(index as usize, content)?;
                        }
                        remapped.insert(original.source, index);
                        index
                    }
                };
                if let Some(name) = original.name {
                    original.name = Some(pruned.add_name(map.get_name(name)?));
                }
                Some(original)
            }
            None => None,
        };
        pruned.add_mapping(mapping.generated_line, mapping.generated_column, original);
    }

    Ok(pruned)
}

fn diagnostic(err: impl std::fmt::Display) -> Vec<String> {
    vec![err.to_string()]
}

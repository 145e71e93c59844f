//! `@import` resolution against the in-memory file mapping.
//!
//! The bundler works on absolute paths under the build root. Reads map them
//! back to virtual paths and serve the mapping's content, so imports see the
//! same files the pipeline does rather than what is on disk.

use lightningcss::bundler::{ResolveResult, SourceProvider};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::config::InlineImports;
use crate::pipeline::Files;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Broken @import declaration of \"{0}\": remote imports cannot be inlined")]
    Remote(String),

    #[error("Ignoring local @import of \"{0}\" as resource is missing")]
    NotFound(String),

    #[error("Ignoring local @import of \"{0}\" as resource is not UTF-8")]
    NotUtf8(String),

    #[error("Ignoring local @import of \"{0}\" as resource is outside the build root")]
    OutsideRoot(String),
}

/// Sources for one bundling call: the entry stylesheet plus the mapping.
pub struct MappedSources<'s> {
    root: &'s Path,
    entry: &'s str,
    entry_styles: &'s str,
    files: &'s Files,
    policy: InlineImports,
}

impl<'s> MappedSources<'s> {
    pub fn new(
        root: &'s Path,
        entry: &'s str,
        entry_styles: &'s str,
        files: &'s Files,
        policy: InlineImports,
    ) -> Self {
        Self {
            root,
            entry,
            entry_styles,
            files,
            policy,
        }
    }

    /// Virtual path of an absolute path under the root.
    fn virtual_key(&self, file: &Path) -> Result<String, ImportError> {
        let outside = || ImportError::OutsideRoot(file.display().to_string());
        let rel = file.strip_prefix(self.root).map_err(|_| outside())?;
        let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        parts.map(|parts| parts.join("/")).ok_or_else(outside)
    }
}

impl SourceProvider for MappedSources<'_> {
    type Error = ImportError;

    fn read<'a>(&'a self, file: &Path) -> Result<&'a str, Self::Error> {
        let key = self.virtual_key(file)?;
        if key == self.entry {
            return Ok(self.entry_styles);
        }
        let record = self
            .files
            .get(&key)
            .ok_or_else(|| ImportError::NotFound(key.clone()))?;
        std::str::from_utf8(&record.contents).map_err(|_| ImportError::NotUtf8(key))
    }

    fn resolve(
        &self,
        specifier: &str,
        originating_file: &Path,
    ) -> Result<ResolveResult, Self::Error> {
        if is_remote(specifier) {
            return match self.policy {
                InlineImports::All => Err(ImportError::Remote(specifier.to_string())),
                InlineImports::Local | InlineImports::None => {
                    Ok(ResolveResult::External(specifier.to_string()))
                }
            };
        }

        let joined = match specifier.strip_prefix('/') {
            Some(from_root) => self.root.join(from_root),
            None => originating_file
                .parent()
                .unwrap_or(self.root)
                .join(specifier),
        };
        Ok(ResolveResult::File(normalize(&joined)))
    }
}

/// Whether an import points outside the build (URL with scheme or protocol-relative).
fn is_remote(specifier: &str) -> bool {
    specifier.starts_with("//") || specifier.contains("://") || specifier.starts_with("data:")
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FileRecord;

    fn files() -> Files {
        let mut files = Files::new();
        files.insert("main.css".into(), FileRecord::new("@import 'parts/a.css';"));
        files.insert("parts/a.css".into(), FileRecord::new("a{color:red}"));
        files.insert("parts/bin.css".into(), FileRecord::new(vec![0xff, 0xfe]));
        files
    }

    fn resolved_path(result: ResolveResult) -> PathBuf {
        match result {
            ResolveResult::File(path) => path,
            ResolveResult::External(url) => panic!("expected file, got external {url}"),
        }
    }

    #[test]
    fn test_read_prefers_entry_styles() {
        let files = files();
        let sources = MappedSources::new(
            Path::new("/site"),
            "main.css",
            "b{}",
            &files,
            InlineImports::Local,
        );
        assert_eq!(sources.read(Path::new("/site/main.css")).unwrap(), "b{}");
        assert_eq!(
            sources.read(Path::new("/site/parts/a.css")).unwrap(),
            "a{color:red}"
        );
    }

    #[test]
    fn test_read_errors() {
        let files = files();
        let sources =
            MappedSources::new(Path::new("/site"), "main.css", "", &files, InlineImports::Local);
        assert!(matches!(
            sources.read(Path::new("/site/missing.css")),
            Err(ImportError::NotFound(key)) if key == "missing.css"
        ));
        assert!(matches!(
            sources.read(Path::new("/site/parts/bin.css")),
            Err(ImportError::NotUtf8(_))
        ));
        assert!(matches!(
            sources.read(Path::new("/elsewhere/a.css")),
            Err(ImportError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_resolve_relative_and_root_imports() {
        let files = files();
        let sources =
            MappedSources::new(Path::new("/site"), "main.css", "", &files, InlineImports::Local);
        let origin = Path::new("/site/parts/a.css");

        let sibling = sources.resolve("./b.css", origin).unwrap();
        assert_eq!(resolved_path(sibling), PathBuf::from("/site/parts/b.css"));

        let parent = sources.resolve("../main.css", origin).unwrap();
        assert_eq!(resolved_path(parent), PathBuf::from("/site/main.css"));

        let rooted = sources.resolve("/parts/a.css", origin).unwrap();
        assert_eq!(resolved_path(rooted), PathBuf::from("/site/parts/a.css"));
    }

    #[test]
    fn test_resolve_remote_by_policy() {
        let files = files();
        let origin = Path::new("/site/main.css");

        let local =
            MappedSources::new(Path::new("/site"), "main.css", "", &files, InlineImports::Local);
        assert!(matches!(
            local.resolve("https://not/found", origin),
            Ok(ResolveResult::External(url)) if url == "https://not/found"
        ));

        let all =
            MappedSources::new(Path::new("/site"), "main.css", "", &files, InlineImports::All);
        let err = all.resolve("https://not/found", origin).unwrap_err();
        assert!(err.to_string().contains("https://not/found"));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://fonts.example.com/a.css"));
        assert!(is_remote("//cdn.example.com/a.css"));
        assert!(!is_remote("parts/a.css"));
        assert!(!is_remote("/parts/a.css"));
    }
}

//! In-memory file pipeline driving plugins through a build.
//!
//! A build owns a [`Files`] mapping from virtual path to [`FileRecord`].
//! Each registered [`Plugin`] runs in three phases:
//!
//! | Phase    | Runs                        | Access                              |
//! |----------|-----------------------------|-------------------------------------|
//! | `before` | once                        | whole mapping (read), build context |
//! | `each`   | per matching path, parallel | own record (write), mapping (read)  |
//! | `after`  | once, after all files       | consumes the per-build state        |
//!
//! `each` works on a private copy of its record. Results are committed back
//! into the mapping only after every file has settled, so parallel work never
//! observes a half-written mapping and a failed file stays untouched.

mod error;
mod pattern;

pub use error::{BuildError, PluginError, PluginFailures};
pub use pattern::Pattern;

use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::debug;

/// Mapping from virtual path (forward slashes, relative) to file record.
pub type Files = BTreeMap<String, FileRecord>;

/// Records a plugin asks to insert next to the file it processed.
pub type Emitted = Vec<(String, FileRecord)>;

/// One pipeline-tracked file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecord {
    /// Raw file content.
    pub contents: Vec<u8>,
    /// Source map attached by an earlier transform.
    pub source_map: Option<Vec<u8>>,
}

impl FileRecord {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            source_map: None,
        }
    }

    /// Content decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}

/// Build-wide information handed to `before`.
#[derive(Debug, Clone)]
pub struct BuildContext {
    root: PathBuf,
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A file transform with a before/each/after lifecycle.
///
/// `State` is created by `before`, shared by reference with every parallel
/// `each` call and handed back to `after`, so nothing outlives a build.
pub trait Plugin: Send + Sync {
    type State: Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Paths this plugin transforms.
    fn pattern(&self) -> &Pattern;

    fn before(&self, files: &Files, ctx: &BuildContext) -> Result<Self::State, Self::Error>;

    /// Transform one matching file.
    ///
    /// Returns extra records to insert into the mapping alongside `file`.
    fn each(
        &self,
        state: &Self::State,
        path: &str,
        file: &mut FileRecord,
        files: &Files,
    ) -> Result<Emitted, Self::Error>;

    fn after(&self, state: Self::State) {
        drop(state);
    }
}

/// Object-safe view of a [`Plugin`].
trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, files: &mut Files, ctx: &BuildContext) -> Result<(), BuildError>;
}

impl<P: Plugin> Stage for P {
    fn name(&self) -> &'static str {
        Plugin::name(self)
    }

    fn run(&self, files: &mut Files, ctx: &BuildContext) -> Result<(), BuildError> {
        let name = Plugin::name(self);
        let state = self.before(files, ctx).map_err(|err| BuildError::Setup {
            plugin: name,
            source: Box::new(err),
        })?;

        let pattern = self.pattern();
        let shared: &Files = files;
        let selected: Vec<&str> = shared
            .keys()
            .map(String::as_str)
            .filter(|path| pattern.matches(path))
            .collect();
        debug!("build"; "{}: {} of {} files match `{}`",
            name, selected.len(), shared.len(), pattern);

        let settled: Vec<(String, Result<(FileRecord, Emitted), P::Error>)> = selected
            .par_iter()
            .map(|&path| {
                let mut file = shared[path].clone();
                let result = self
                    .each(&state, path, &mut file, shared)
                    .map(|emitted| (file, emitted));
                (path.to_string(), result)
            })
            .collect();

        let mut errors: Vec<PluginError> = Vec::new();
        for (path, result) in settled {
            match result {
                Ok((file, emitted)) => {
                    files.insert(path, file);
                    files.extend(emitted);
                }
                Err(err) => errors.push(Box::new(err)),
            }
        }

        self.after(state);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BuildError::Plugin(PluginFailures {
                plugin: name,
                errors,
            }))
        }
    }
}

/// Ordered list of plugins sharing one build context.
pub struct Pipeline {
    ctx: BuildContext,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            ctx: BuildContext::new(root),
            stages: Vec::new(),
        }
    }

    /// Register a plugin. Plugins run in registration order.
    pub fn with<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.stages.push(Box::new(plugin));
        self
    }

    /// Run every plugin over `files`.
    ///
    /// Stops at the first plugin that reports errors; every file error from
    /// that plugin is returned together.
    pub fn run(&self, files: &mut Files) -> Result<(), BuildError> {
        for stage in &self.stages {
            debug!("build"; "running {}", stage.name());
            stage.run(files, &self.ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("{0}: rejected")]
    struct Rejected(String);

    /// Uppercases matching files, emits a `.len` sibling, rejects `bad` files.
    struct Shout {
        pattern: Pattern,
        befores: AtomicUsize,
        afters: AtomicUsize,
    }

    impl Shout {
        fn new(pattern: &str) -> Self {
            Self {
                pattern: Pattern::new(pattern).unwrap(),
                befores: AtomicUsize::new(0),
                afters: AtomicUsize::new(0),
            }
        }
    }

    impl Plugin for &'static Shout {
        type State = usize;
        type Error = Rejected;

        fn name(&self) -> &'static str {
            "shout"
        }

        fn pattern(&self) -> &Pattern {
            &self.pattern
        }

        fn before(&self, files: &Files, _ctx: &BuildContext) -> Result<usize, Rejected> {
            self.befores.fetch_add(1, Ordering::SeqCst);
            Ok(files.len())
        }

        fn each(
            &self,
            _state: &usize,
            path: &str,
            file: &mut FileRecord,
            _files: &Files,
        ) -> Result<Emitted, Rejected> {
            if path.contains("bad") {
                file.contents.clear();
                return Err(Rejected(path.to_string()));
            }
            file.contents = file.text().to_uppercase().into_bytes();
            let len = FileRecord::new(file.contents.len().to_string());
            Ok(vec![(format!("{path}.len"), len)])
        }

        fn after(&self, _state: usize) {
            self.afters.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn leak(plugin: Shout) -> &'static Shout {
        Box::leak(Box::new(plugin))
    }

    fn files(entries: &[(&str, &str)]) -> Files {
        entries
            .iter()
            .map(|(path, content)| (path.to_string(), FileRecord::new(*content)))
            .collect()
    }

    #[test]
    fn test_transforms_only_matching_files() {
        let shout = leak(Shout::new("**/*.txt"));
        let mut files = files(&[("a.txt", "hi"), ("b.md", "hi"), ("sub/c.txt", "yo")]);

        Pipeline::new("/site").with(shout).run(&mut files).unwrap();

        assert_eq!(files["a.txt"].contents, b"HI");
        assert_eq!(files["b.md"].contents, b"hi");
        assert_eq!(files["sub/c.txt"].contents, b"YO");
        assert_eq!(files["a.txt.len"].contents, b"2");
        assert!(!files.contains_key("b.md.len"));
    }

    #[test]
    fn test_lifecycle_runs_once_per_build() {
        let shout = leak(Shout::new("*.txt"));
        let pipeline = Pipeline::new("/site").with(shout);
        let mut files = files(&[("a.txt", "a"), ("b.txt", "b")]);

        pipeline.run(&mut files).unwrap();
        pipeline.run(&mut files).unwrap();

        assert_eq!(shout.befores.load(Ordering::SeqCst), 2);
        assert_eq!(shout.afters.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failures_are_collected_and_leave_files_untouched() {
        let shout = leak(Shout::new("*.txt"));
        let mut files = files(&[("bad1.txt", "x"), ("bad2.txt", "y"), ("good.txt", "z")]);

        let err = Pipeline::new("/site")
            .with(shout)
            .run(&mut files)
            .unwrap_err();

        assert_eq!(err.failures().len(), 2);
        assert_eq!(files["bad1.txt"].contents, b"x");
        assert_eq!(files["bad2.txt"].contents, b"y");
        assert_eq!(files["good.txt"].contents, b"Z");
        assert_eq!(shout.afters.load(Ordering::SeqCst), 1);
    }
}

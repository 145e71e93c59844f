//! `build` command.
//!
//! Phases:
//! - **Read** - Load the source directory into a file mapping
//! - **Minify** - Run the clean-css plugin through the pipeline
//! - **Write** - Write the mapping to the destination directory

use crate::{
    config::Config,
    debug, disk, log,
    minify::CleanCss,
    pipeline::{BuildError, Pipeline},
};
use anyhow::{Context, Result, bail};

/// Build the project described by `config`.
pub fn build(config: &Config) -> Result<()> {
    let source = &config.build.source;
    let destination = &config.build.destination;

    let mut files = disk::read_files(source)
        .with_context(|| format!("Failed to read source directory {}", source.display()))?;
    debug!("build"; "read {} from {}", plural_count(files.len(), "file"), source.display());

    let plugin = CleanCss::new(config.minify.clone()).context("Invalid minify.files pattern")?;
    let pipeline = Pipeline::new(config.get_root()).with(plugin);

    if let Err(err) = pipeline.run(&mut files) {
        report(&err);
        bail!("build failed");
    }

    let written = disk::write_files(&files, destination, config.build.clean)?;
    log!("build"; "wrote {} to {}", plural_count(written, "file"), destination.display());
    Ok(())
}

fn report(err: &BuildError) {
    match err {
        BuildError::Setup { .. } => log!("error"; "{}", err),
        BuildError::Plugin(failures) => {
            for failure in &failures.errors {
                log!("error"; "{}", failure);
            }
            log!("minify"; "{} failed", plural_count(failures.errors.len(), "file"));
        }
    }
}

/// `"1 file"`, `"3 files"`.
fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildSectionConfig;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.set_root(dir.path());
        config.build = BuildSectionConfig {
            source: dir.path().join("src"),
            destination: dir.path().join("build"),
            clean: false,
        };
        config
    }

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "file"), "0 files");
        assert_eq!(plural_count(1, "file"), "1 file");
        assert_eq!(plural_count(2, "file"), "2 files");
    }

    #[test]
    fn test_build_minifies_and_copies() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/deep")).unwrap();
        fs::write(dir.path().join("src/main.css"), "  * { display: none }  ").unwrap();
        fs::write(dir.path().join("src/deep/a.css"), " .a { color: red } ").unwrap();
        fs::write(dir.path().join("src/index.html"), "<p>  hi  </p>").unwrap();

        let mut config = config_for(&dir);
        config.minify.source_map = true;
        build(&config).unwrap();

        let out = dir.path().join("build");
        assert_eq!(fs::read_to_string(out.join("main.css")).unwrap(), "*{display:none}");
        assert_eq!(fs::read_to_string(out.join("deep/a.css")).unwrap(), ".a{color:red}");
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "<p>  hi  </p>");
        assert!(out.join("main.css.map").exists());
        assert!(out.join("deep/a.css.map").exists());
    }

    #[test]
    fn test_build_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/bad.css"), "$$ { color: red }").unwrap();

        let config = config_for(&dir);
        assert!(build(&config).is_err());
        assert!(!dir.path().join("build").exists());
    }
}

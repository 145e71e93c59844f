//! stylemin - minify the stylesheets of a static build.
//!
//! Files are loaded into an in-memory mapping, transformed by a plugin
//! [`pipeline`], and written back out. The [`minify`] plugin rewrites every
//! stylesheet matching its pattern and can attach source maps.

pub mod cli;
pub mod config;
pub mod disk;
pub mod logger;
pub mod minify;
pub mod pipeline;

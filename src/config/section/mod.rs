//! Configuration section definitions.
//!
//! Each module corresponds to a section in `stylemin.toml`:
//!
//! | Module   | TOML Section | Purpose                               |
//! |----------|--------------|---------------------------------------|
//! | `build`  | `[build]`    | Source and destination directories    |
//! | `minify` | `[minify]`   | Stylesheet selection and engine setup |

pub mod build;
pub mod minify;

pub use build::BuildSectionConfig;
pub use minify::{CleanCssOptions, EngineOptions, InlineImports, InvalidTargets, SpecialComments};

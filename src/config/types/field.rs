//! Location of a key inside `stylemin.toml`.

use owo_colors::OwoColorize;
use std::fmt;

/// A TOML table plus the key inside it, e.g. `[minify.clean_css]` / `targets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    table: &'static str,
    key: &'static str,
}

impl FieldPath {
    pub const fn new(table: &'static str, key: &'static str) -> Self {
        Self { table, key }
    }

    pub const fn table(&self) -> &'static str {
        self.table
    }

    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// `minify.clean_css.targets`
    pub fn dotted(&self) -> String {
        format!("{}.{}", self.table, self.key)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            format_args!("[{}] ", self.table).dimmed(),
            self.key.bright_blue()
        )
    }
}

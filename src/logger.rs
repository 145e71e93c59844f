//! Terminal logging with colored module prefixes.
//!
//! `log!("minify"; "...")` always prints; `debug!` prints only under
//! `--verbose`. The `error` and `warning` modules go to stderr, everything
//! else to stdout.

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    io::{Write, stderr, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Print a message under a colored `[module]` prefix.
///
/// ```ignore
/// log!("build"; "wrote {} files", count);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like [`log!`], but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let line = format!("{} {message}", prefix(module));
    if is_diagnostic(module) {
        emit(&mut stderr().lock(), &line);
    } else {
        emit(&mut stdout().lock(), &line);
    }
}

fn emit(out: &mut impl Write, line: &str) {
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{line}").ok();
    out.flush().ok();
}

fn is_diagnostic(module: &str) -> bool {
    module.eq_ignore_ascii_case("error") || module.eq_ignore_ascii_case("warning")
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "build" => tag.bright_blue().bold().to_string(),
        "minify" => tag.bright_green().bold().to_string(),
        "config" => tag.bright_magenta().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

//! Pretty-printing diagnostics to the console

use colored::Colorize;
use std::fmt::Display;

/// Pretty-print an error message to the console, `<file>:<line>: error: <msg>`
pub fn error(file: &str, line: usize, message: impl Display) {
    let title = "error:".red().bold();
    println!("{file}:{line}: {title} {message}");
}

/// Pretty-print a warning message to the console, `<file>:<line>: warning: <msg>`
pub fn warning(file: &str, line: usize, message: impl Display) {
    let title = "warning:".yellow().bold();
    println!("{file}:{line}: {title} {message}");
}

/// Severity of a single recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Accumulates diagnostics for one source file as they're detected.
///
/// Messages are printed immediately at the moment of detection (per the
/// assembler's error model there is no deferred queue); this only tracks
/// whether an error severe enough to block output occurred.
#[derive(Debug, Default)]
pub struct Diagnostics {
    file: String,
    had_error: bool,
    error_count: usize,
}

impl Diagnostics {
    pub fn new(file: impl Into<String>) -> Self {
        Diagnostics { file: file.into(), had_error: false, error_count: 0 }
    }

    pub fn warn(&self, line: usize, message: impl Display) {
        warning(&self.file, line, message);
    }

    pub fn error(&mut self, line: usize, message: impl Display) {
        error(&self.file, line, message);
        self.had_error = true;
        self.error_count += 1;
    }

    pub fn had_errors(&self) -> bool {
        self.had_error
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }
}

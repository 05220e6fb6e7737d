// src/progress/console.rs

//! Stderr spinner adapter used by the CLI binary.

use std::io::Write;

use super::{ProgressAdapter, ProgressContext, Severity};

pub struct ConsoleAdapter;

impl ConsoleAdapter {
    fn paint(line: &str) {
        let mut err = std::io::stderr().lock();
        // \r repaints in place; \x1b[K clears leftovers from longer lines.
        let _ = write!(err, "\r\x1b[K{line}");
        let _ = err.flush();
    }
}

impl ProgressAdapter for ConsoleAdapter {
    fn start(&self, message: &str, _ctx: &ProgressContext) -> Option<String> {
        Self::paint(message);
        None
    }

    fn update(&self, _token: Option<&str>, message: &str, _ctx: &ProgressContext) {
        Self::paint(message);
    }

    fn finish(
        &self,
        _token: Option<&str>,
        message: &str,
        severity: Severity,
        _ctx: &ProgressContext,
    ) {
        let marker = match severity {
            Severity::Info => "✓",
            Severity::Warn => "!",
            Severity::Error => "✗",
        };
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "\r\x1b[K{marker} {message}");
        let _ = err.flush();
    }
}

// src/output.rs

//! Text cleanup applied to captured process output before it reaches the
//! presentation collaborator.

use std::sync::OnceLock;

use regex::Regex;

/// Decode raw captured bytes and normalize line endings.
///
/// Both `\r\n` and bare `\r` (progress-bar style rewrites) become `\n`, so
/// downstream consumers only ever see unix line endings.
pub fn normalize_output(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip ANSI escape sequences (colors, cursor movement) from `text`.
pub fn strip_ansi(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Split normalized output into presentable lines: ANSI escapes stripped,
/// blank lines dropped. Returns an empty vec for output that is all noise.
pub fn presentable_lines(text: &str) -> Vec<String> {
    strip_ansi(text)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect()
}

fn ansi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // CSI sequences (ESC [ ... final byte) plus two-byte ESC sequences.
    RE.get_or_init(|| {
        Regex::new(r"\x1b(?:\[[0-9;?]*[ -/]*[@-~]|[@-Z\\-_])").expect("valid built-in ANSI regex")
    })
}

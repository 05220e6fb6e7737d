// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::progress::SpinnerConfig;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [exec]
/// timeout_ms = 30000
///
/// [spinner]
/// interval_ms = 150
/// frames = ["-", "\\", "|", "/"]
///
/// [terminal.patterns]
/// npm = ["run dev", "start"]
/// cargo = ["watch"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Execution defaults from `[exec]`.
    #[serde(default)]
    pub exec: ExecSection,

    /// Spinner animation settings from `[spinner]`.
    #[serde(default)]
    pub spinner: SpinnerSection,

    /// Terminal-mode settings from `[terminal]`.
    #[serde(default)]
    pub terminal: TerminalSection,
}

/// `[exec]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecSection {
    /// Default timeout for every command, in milliseconds. `0` disables the
    /// timeout entirely.
    #[serde(default)]
    pub timeout_ms: u64,
}

impl Default for ExecSection {
    fn default() -> Self {
        Self { timeout_ms: 0 }
    }
}

/// `[spinner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SpinnerSection {
    /// Tick interval for the animation, in milliseconds.
    #[serde(default = "default_spinner_interval")]
    pub interval_ms: u64,

    /// Animation frames. An empty list disables the animation (start/finish
    /// notifications still fire).
    #[serde(default = "default_spinner_frames")]
    pub frames: Vec<String>,
}

fn default_spinner_interval() -> u64 {
    150
}

fn default_spinner_frames() -> Vec<String> {
    SpinnerConfig::default().frames
}

impl Default for SpinnerSection {
    fn default() -> Self {
        Self {
            interval_ms: default_spinner_interval(),
            frames: default_spinner_frames(),
        }
    }
}

/// `[terminal]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TerminalSection {
    /// Per-executable substring patterns that force terminal mode.
    ///
    /// Keys are executable names; values are substrings matched against the
    /// joined argument string. First match wins. An empty table means
    /// terminal mode is never forced.
    #[serde(default)]
    pub patterns: BTreeMap<String, Vec<String>>,
}

impl ConfigFile {
    /// The spinner settings in the form the progress driver consumes, or
    /// `None` when animation is disabled.
    pub fn spinner_config(&self) -> Option<SpinnerConfig> {
        if self.spinner.frames.is_empty() {
            return None;
        }
        Some(SpinnerConfig {
            interval_ms: self.spinner.interval_ms,
            frames: self.spinner.frames.clone(),
        })
    }
}

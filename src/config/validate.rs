// src/config/validate.rs

use anyhow::{Result, anyhow};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - spinner interval is at least 1ms when frames are configured
/// - spinner frames are non-empty strings
/// - terminal pattern lists are non-empty and contain non-empty substrings
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_spinner(cfg)?;
    validate_terminal_patterns(cfg)?;
    Ok(())
}

fn validate_spinner(cfg: &ConfigFile) -> Result<()> {
    if cfg.spinner.frames.is_empty() {
        // Animation disabled; interval is irrelevant.
        return Ok(());
    }
    if cfg.spinner.interval_ms == 0 {
        return Err(anyhow!("[spinner].interval_ms must be >= 1 (got 0)"));
    }
    if cfg.spinner.frames.iter().any(|f| f.is_empty()) {
        return Err(anyhow!("[spinner].frames must not contain empty strings"));
    }
    Ok(())
}

fn validate_terminal_patterns(cfg: &ConfigFile) -> Result<()> {
    for (executable, patterns) in cfg.terminal.patterns.iter() {
        if executable.is_empty() {
            return Err(anyhow!(
                "[terminal.patterns] contains an empty executable name"
            ));
        }
        if patterns.is_empty() {
            return Err(anyhow!(
                "[terminal.patterns.{}] must list at least one substring",
                executable
            ));
        }
        if patterns.iter().any(|p| p.is_empty()) {
            return Err(anyhow!(
                "[terminal.patterns.{}] contains an empty substring",
                executable
            ));
        }
    }
    Ok(())
}

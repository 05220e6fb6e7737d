// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod host;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod progress;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::engine::{Collaborators, EngineConfig, EngineOptions, spawn_engine};
use crate::host::ConsolePresenter;
use crate::progress::console::ConsoleAdapter;

/// High-level entry point used by `main.rs`: run one command to completion
/// and return its exit code.
///
/// This wires together:
/// - config loading
/// - the coordinator engine with console collaborators
/// - dispatch, wait, shutdown
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = config::load_or_default(&config_path)?;

    if args.show_config {
        print_effective_config(&cfg);
        return Ok(0);
    }

    if args.command.is_empty() {
        bail!("no command given; usage: runlet [OPTIONS] -- <COMMAND>...");
    }

    let mut engine_config = EngineConfig::from_file(&cfg);
    if let Some(ms) = args.timeout_ms {
        engine_config = engine_config.with_timeout((ms > 0).then(|| Duration::from_millis(ms)));
    }

    let collab = Collaborators {
        presenter: Arc::new(ConsolePresenter),
        adapter: Some(Arc::new(ConsoleAdapter)),
        terminal: None,
        env: None,
    };

    let (handle, join) = spawn_engine(engine_config, EngineOptions::default(), collab);

    let dispatched = handle.execute(args.command.clone(), false).await;
    let id = match dispatched {
        Ok(id) => id,
        Err(err) => {
            let _ = handle.shutdown().await;
            let _ = join.await;
            return Err(err.into());
        }
    };

    let entry = handle.wait(id).await?;
    debug!(id, status = ?entry.status, exit_code = ?entry.exit_code, "command settled");

    let _ = handle.shutdown().await;
    let _ = join.await;

    Ok(entry.exit_code.unwrap_or(0))
}

/// Simple `--show-config` output: print the effective settings.
fn print_effective_config(cfg: &ConfigFile) {
    println!("runlet configuration");
    println!("  exec.timeout_ms = {}", cfg.exec.timeout_ms);
    println!("  spinner.interval_ms = {}", cfg.spinner.interval_ms);
    println!("  spinner.frames = {:?}", cfg.spinner.frames);

    if cfg.terminal.patterns.is_empty() {
        println!("  terminal.patterns = (none)");
    } else {
        println!("  terminal.patterns:");
        for (executable, patterns) in cfg.terminal.patterns.iter() {
            println!("    {executable}: {patterns:?}");
        }
    }
}

// src/host.rs

//! Narrow interfaces to the host application.
//!
//! The engine never renders anything itself; buffer output, interactive
//! terminals, and per-executable environments are all delegated through
//! these traits. The console implementations below are what the `runlet`
//! binary plugs in; an embedding host supplies its own.

use std::io::Write;

use tokio::sync::oneshot;

/// Receives the cleaned-up output of a buffer-mode command.
pub trait Presenter: Send + Sync {
    /// `lines` is never empty when this is called; `title` is the joined argv.
    fn present(&self, lines: &[String], title: &str);
}

/// Supplies per-executable environment overrides.
pub trait EnvProvider: Send + Sync {
    /// Extra `(key, value)` pairs for `executable`, or `None` for no overrides.
    fn env_for(&self, executable: &str) -> Option<Vec<(String, String)>>;
}

/// A process the host attached to an interactive terminal surface.
///
/// The engine does not manage the terminal; it only tracks the pid (when the
/// host exposes one) and waits for the exit code.
pub struct TerminalJob {
    pub pid: Option<u32>,
    pub exit_rx: oneshot::Receiver<i32>,
}

/// Spawns commands in terminal mode. The host owns the PTY/surface; the
/// engine applies the usual ledger and progress lifecycle around it.
pub trait TerminalSpawner: Send + Sync {
    fn spawn(&self, argv: &[String], env: &[(String, String)]) -> anyhow::Result<TerminalJob>;
}

/// Presenter used by the CLI binary: prints the title and lines to stdout.
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn present(&self, lines: &[String], title: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "── {title}");
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }
}

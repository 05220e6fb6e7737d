// src/progress/mod.rs

//! Progress notifications for running commands.
//!
//! The engine drives a small per-command state machine
//! ([`driver::ProgressDriver`]) that bridges timer ticks to a pluggable
//! [`ProgressAdapter`]. Hosts implement the adapter to route notifications
//! into whatever UI they have; [`console::ConsoleAdapter`] renders a spinner
//! to stderr for the CLI binary.

pub mod console;
pub mod driver;

pub use driver::{ProgressDriver, SpinnerConfig};

use crate::ledger::CommandId;

/// Severity attached to the final notification of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Per-command context handed to every adapter hook.
///
/// Adapters that have no use for tokens can key their own state off
/// `command_id` instead.
#[derive(Debug, Clone)]
pub struct ProgressContext {
    pub command_id: CommandId,
    /// The command string, used for the final report.
    pub label: String,
}

/// Host-pluggable notification sink.
///
/// The driver calls `start` once, `update` on every spinner tick while the
/// command runs, and `finish` exactly once at the end. The token returned by
/// `start` is threaded through unchanged; the driver never assumes it means
/// anything.
pub trait ProgressAdapter: Send + Sync {
    fn start(&self, message: &str, ctx: &ProgressContext) -> Option<String>;

    fn update(&self, token: Option<&str>, message: &str, ctx: &ProgressContext);

    fn finish(&self, token: Option<&str>, message: &str, severity: Severity, ctx: &ProgressContext);
}

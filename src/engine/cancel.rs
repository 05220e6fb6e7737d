// src/engine/cancel.rs

//! User-initiated cancellation with escalating signals.
//!
//! Cancellation is fire-and-forget: the interrupt is sent, a forceful kill is
//! scheduled for the grace window, and the ledger is marked `Cancelled`
//! immediately without waiting for the process to die. The runner's eventual
//! exit event still flows through the coordinator, but the ledger's
//! terminal-state protection keeps the optimistic status from being reverted.

use tracing::info;

use crate::exec::signal;
use crate::ledger::{CommandId, CommandLedger, CommandPatch, CommandStatus};

/// Result of a cancel request, surfaced to the host.
#[derive(Debug, Clone)]
pub struct CancelReport {
    pub ok: bool,
    /// Id of the command that was cancelled, when one was.
    pub id: Option<CommandId>,
    pub message: String,
}

impl CancelReport {
    fn nothing(detail: &str) -> Self {
        Self {
            ok: false,
            id: None,
            message: format!("nothing to cancel: {detail}"),
        }
    }
}

/// Cancel the command with the given id.
///
/// Fails when the entry does not exist or no longer has a live process
/// handle, which also makes repeated cancels of the same command report
/// "nothing to cancel" instead of signalling twice.
pub fn cancel(ledger: &mut CommandLedger, id: CommandId) -> CancelReport {
    let Some(entry) = ledger.get(id) else {
        return CancelReport::nothing(&format!("no command with id {id}"));
    };
    let Some(pid) = entry.pid else {
        return CancelReport::nothing(&format!("command {id} is not running"));
    };

    info!(id, pid, "cancelling command");
    signal::interrupt(pid);
    signal::escalate_after_grace(pid);

    ledger.track(id, CommandPatch::status(CommandStatus::Cancelled).clear_pid());

    CancelReport {
        ok: true,
        id: Some(id),
        message: format!("cancelled command {id} (pid {pid})"),
    }
}

/// Cancel the most recently dispatched command that still has a live process.
pub fn cancel_latest(ledger: &mut CommandLedger) -> CancelReport {
    let latest = ledger.running().map(|e| e.id).max();
    match latest {
        Some(id) => cancel(ledger, id),
        None => CancelReport::nothing("no running commands"),
    }
}

/// Cancel every command with a live process handle; returns the ids that
/// were affected.
pub fn cancel_all(ledger: &mut CommandLedger) -> Vec<CommandId> {
    let ids: Vec<CommandId> = ledger.running().map(|e| e.id).collect();
    ids.into_iter()
        .filter(|&id| cancel(ledger, id).ok)
        .collect()
}

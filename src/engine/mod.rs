// src/engine/mod.rs

//! Orchestration: the coordinator event loop, the host-facing handle, and
//! the cancellation manager.

pub mod cancel;
pub mod coordinator;
pub mod handle;

pub use cancel::CancelReport;
pub use coordinator::{Collaborators, Coordinator, EngineConfig, EngineEvent, EngineOptions};
pub use handle::EngineHandle;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ledger::CommandLedger;

/// Spawn the coordinator loop on the current tokio runtime.
///
/// Returns the trigger-interface handle plus the loop's join handle, which
/// resolves to the final ledger once the loop stops (shutdown, or idle in
/// `exit_when_idle` mode).
pub fn spawn_engine(
    config: EngineConfig,
    options: EngineOptions,
    collab: Collaborators,
) -> (EngineHandle, JoinHandle<CommandLedger>) {
    let (tx, rx) = mpsc::channel::<EngineEvent>(64);
    let coordinator = Coordinator::new(config, options, collab, rx, tx.clone());
    let handle = EngineHandle::new(tx);
    let join = tokio::spawn(coordinator.run());
    (handle, join)
}

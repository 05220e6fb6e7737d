// src/engine/handle.rs

//! The host-facing trigger interface. All methods send an event into the
//! coordinator loop and await its oneshot reply, so callers never block the
//! loop and never touch engine state directly.

use tokio::sync::{mpsc, oneshot};

use crate::engine::cancel::CancelReport;
use crate::engine::coordinator::EngineEvent;
use crate::errors::{Result, RunletError};
use crate::ledger::{CommandEntry, CommandId};

#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    pub(crate) fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    /// Dispatch a command. Fire-and-forget: the returned id can be used with
    /// `wait`, `cancel`, or `rerun`, but results surface via side effects
    /// (presenter, progress adapter, ledger).
    pub async fn execute(&self, argv: Vec<String>, force_terminal: bool) -> Result<CommandId> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::Execute {
            argv,
            force_terminal,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RunletError::EngineClosed)?
    }

    /// Re-dispatch a previously stored argv as a fresh command. `None` reruns
    /// the most recent command.
    pub async fn rerun(&self, id: Option<CommandId>, force_terminal: bool) -> Result<CommandId> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::Rerun {
            id,
            force_terminal,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RunletError::EngineClosed)?
    }

    /// Cancel one command (`None` targets the most recent running one).
    pub async fn cancel(&self, id: Option<CommandId>) -> Result<CancelReport> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::Cancel { id, reply }).await?;
        rx.await.map_err(|_| RunletError::EngineClosed)
    }

    /// Cancel every running command; returns how many were affected.
    pub async fn cancel_all(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::CancelAll { reply }).await?;
        rx.await.map_err(|_| RunletError::EngineClosed)
    }

    /// Ordered snapshot of the session's command history.
    pub async fn history(&self) -> Result<Vec<CommandEntry>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::History { reply }).await?;
        rx.await.map_err(|_| RunletError::EngineClosed)
    }

    /// Resolve once the command reaches a terminal state (immediately if it
    /// already has).
    pub async fn wait(&self, id: CommandId) -> Result<CommandEntry> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::Wait { id, reply }).await?;
        rx.await.map_err(|_| RunletError::EngineClosed)?
    }

    /// Ask the coordinator loop to stop.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(EngineEvent::Shutdown).await
    }

    async fn send(&self, event: EngineEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| RunletError::EngineClosed)
    }
}

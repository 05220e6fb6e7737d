// src/ledger.rs

//! The command ledger: the single authoritative record of every command the
//! engine has dispatched this session.
//!
//! The ledger is plain owned state. It is only ever mutated from the
//! coordinator's event loop, which serializes the competing completion paths
//! (natural exit, timeout, cancellation) without locking. Races between those
//! paths are arbitrated here: [`CommandLedger::track`] applies partial updates
//! last-writer-wins per field, except that a terminal status is never
//! overwritten once set.

use std::collections::BTreeMap;
use std::time::SystemTime;

/// Unique command identifier, strictly increasing, never reused.
pub type CommandId = u64;

/// How the command's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// Output is captured and handed to the presenter when the command ends.
    Buffer,
    /// The command is attached to a host-provided interactive terminal.
    Terminal,
}

/// Lifecycle state of a command. Starts at `Running` and transitions exactly
/// once to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Running,
    Success,
    Failed,
    Cancelled,
}

impl CommandStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CommandStatus::Running)
    }
}

/// One ledger entry per command invocation.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub id: CommandId,
    /// Executable plus arguments, exactly as dispatched. Never re-parsed.
    pub argv: Vec<String>,
    pub mode: CommandMode,
    pub status: CommandStatus,
    pub exit_code: Option<i32>,
    pub started_at: SystemTime,
    /// OS process id; present only while the command is running.
    pub pid: Option<u32>,
}

impl CommandEntry {
    /// The joined argv, used as a display label and for pattern matching.
    pub fn label(&self) -> String {
        self.argv.join(" ")
    }
}

/// Partial update merged into an existing entry via [`CommandLedger::track`].
///
/// `argv` and `mode` are set once at creation and deliberately absent here.
/// `pid` is doubly optional: `None` leaves the field untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct CommandPatch {
    pub status: Option<CommandStatus>,
    pub exit_code: Option<i32>,
    pub pid: Option<Option<u32>>,
}

impl CommandPatch {
    pub fn status(status: CommandStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn set_pid(mut self, pid: u32) -> Self {
        self.pid = Some(Some(pid));
        self
    }

    pub fn clear_pid(mut self) -> Self {
        self.pid = Some(None);
        self
    }
}

/// In-session command history. Entries are never deleted.
#[derive(Debug, Default)]
pub struct CommandLedger {
    next_id: CommandId,
    entries: BTreeMap<CommandId, CommandEntry>,
}

impl CommandLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next command id without creating an entry.
    pub fn next_id(&mut self) -> CommandId {
        self.next_id += 1;
        self.next_id
    }

    /// Create a new `Running` entry for a freshly dispatched command and
    /// return its id.
    pub fn open(&mut self, argv: Vec<String>, mode: CommandMode) -> CommandId {
        let id = self.next_id();
        self.entries.insert(
            id,
            CommandEntry {
                id,
                argv,
                mode,
                status: CommandStatus::Running,
                exit_code: None,
                started_at: SystemTime::now(),
                pid: None,
            },
        );
        id
    }

    /// Merge a partial update into the entry for `id`.
    ///
    /// Fields present in the patch win over the stored value, with one
    /// exception: once `status` is terminal it is frozen, so a late
    /// completion event cannot revert an optimistic `Cancelled` (and a stray
    /// `Running` can never resurrect a finished command).
    ///
    /// Returns the updated entry, or `None` if the id is unknown.
    pub fn track(&mut self, id: CommandId, patch: CommandPatch) -> Option<&CommandEntry> {
        let entry = self.entries.get_mut(&id)?;

        if let Some(status) = patch.status {
            if !entry.status.is_terminal() {
                entry.status = status;
            }
        }
        if let Some(code) = patch.exit_code {
            entry.exit_code = Some(code);
        }
        if let Some(pid) = patch.pid {
            entry.pid = pid;
        }

        Some(&*entry)
    }

    pub fn get(&self, id: CommandId) -> Option<&CommandEntry> {
        self.entries.get(&id)
    }

    /// Snapshot of every entry in id (dispatch) order.
    pub fn all(&self) -> Vec<CommandEntry> {
        self.entries.values().cloned().collect()
    }

    /// Entries that still have a live process handle.
    pub fn running(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.values().filter(|e| e.pid.is_some())
    }

    /// Whether any command is still in the `Running` state.
    pub fn has_running(&self) -> bool {
        self.entries
            .values()
            .any(|e| e.status == CommandStatus::Running)
    }

    /// Id of the most recently dispatched command, if any.
    pub fn latest_id(&self) -> Option<CommandId> {
        self.entries.keys().next_back().copied()
    }
}

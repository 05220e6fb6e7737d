// src/engine/coordinator.rs

//! The execution coordinator: a single event loop that owns the command
//! ledger and orchestrates every run.
//!
//! All bookkeeping (ledger merges, progress transitions, presentation)
//! happens on this loop, so the competing completion paths of a command
//! (natural exit, timeout, cancellation) are serialized by construction.
//! Processes themselves run in spawned tasks that report back by sending
//! [`EngineEvent::Finished`] into the same channel.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::cancel::{self, CancelReport};
use crate::errors::{Result, RunletError};
use crate::exec::{self, RunOutcome, RunSpec};
use crate::host::{EnvProvider, Presenter, TerminalSpawner};
use crate::ledger::{
    CommandEntry, CommandId, CommandLedger, CommandMode, CommandPatch, CommandStatus,
};
use crate::output::presentable_lines;
use crate::progress::{ProgressAdapter, ProgressContext, ProgressDriver, Severity, SpinnerConfig};

/// Engine-level configuration, derived from [`ConfigFile`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Default per-command timeout; `None` disables it.
    pub timeout: Option<Duration>,
    /// Spinner animation; `None` disables animation (notifications remain).
    pub spinner: Option<SpinnerConfig>,
    /// Per-executable substrings that force terminal mode.
    pub force_terminal: BTreeMap<String, Vec<String>>,
}

impl EngineConfig {
    pub fn from_file(cfg: &ConfigFile) -> Self {
        Self {
            timeout: (cfg.exec.timeout_ms > 0)
                .then(|| Duration::from_millis(cfg.exec.timeout_ms)),
            spinner: cfg.spinner_config(),
            force_terminal: cfg.terminal.patterns.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Options that influence how the coordinator loop behaves.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// If true, the loop exits as soon as a completion leaves no command
    /// running. One-shot CLI mode; embedding hosts keep this `false`.
    pub exit_when_idle: bool,
}

/// The host-supplied collaborators the engine delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub presenter: Arc<dyn Presenter>,
    pub adapter: Option<Arc<dyn ProgressAdapter>>,
    pub terminal: Option<Arc<dyn TerminalSpawner>>,
    pub env: Option<Arc<dyn EnvProvider>>,
}

/// Events consumed by the coordinator loop. Host-facing requests carry a
/// oneshot reply; `Finished` comes from the spawned runner tasks.
#[derive(Debug)]
pub enum EngineEvent {
    Execute {
        argv: Vec<String>,
        force_terminal: bool,
        reply: oneshot::Sender<Result<CommandId>>,
    },
    Rerun {
        id: Option<CommandId>,
        force_terminal: bool,
        reply: oneshot::Sender<Result<CommandId>>,
    },
    Cancel {
        id: Option<CommandId>,
        reply: oneshot::Sender<CancelReport>,
    },
    CancelAll {
        reply: oneshot::Sender<usize>,
    },
    History {
        reply: oneshot::Sender<Vec<CommandEntry>>,
    },
    Wait {
        id: CommandId,
        reply: oneshot::Sender<Result<CommandEntry>>,
    },
    Finished {
        id: CommandId,
        outcome: RunOutcome,
    },
    Shutdown,
}

pub struct Coordinator {
    config: EngineConfig,
    options: EngineOptions,
    collab: Collaborators,
    ledger: CommandLedger,
    drivers: HashMap<CommandId, ProgressDriver>,
    waiters: HashMap<CommandId, Vec<oneshot::Sender<Result<CommandEntry>>>>,

    /// Unified event stream from handles and runner tasks.
    events_rx: mpsc::Receiver<EngineEvent>,

    /// Sender handed to runner tasks for their completion events.
    self_tx: mpsc::Sender<EngineEvent>,

    /// Set by `Shutdown` or by going idle in `exit_when_idle` mode; the run
    /// loop checks it after every event, so completions that happen inside a
    /// dispatch (spawn failures) stop the loop just like asynchronous ones.
    stop: bool,
}

impl Coordinator {
    pub fn new(
        config: EngineConfig,
        options: EngineOptions,
        collab: Collaborators,
        events_rx: mpsc::Receiver<EngineEvent>,
        self_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            config,
            options,
            collab,
            ledger: CommandLedger::new(),
            drivers: HashMap::new(),
            waiters: HashMap::new(),
            events_rx,
            self_tx,
            stop: false,
        }
    }

    /// Main event loop. Returns the final ledger for inspection.
    pub async fn run(mut self) -> CommandLedger {
        info!("runlet coordinator started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "coordinator received event");

            match event {
                EngineEvent::Execute {
                    argv,
                    force_terminal,
                    reply,
                } => {
                    let _ = reply.send(self.handle_execute(argv, force_terminal));
                }
                EngineEvent::Rerun {
                    id,
                    force_terminal,
                    reply,
                } => {
                    let _ = reply.send(self.handle_rerun(id, force_terminal));
                }
                EngineEvent::Cancel { id, reply } => {
                    let report = match id {
                        Some(id) => cancel::cancel(&mut self.ledger, id),
                        None => cancel::cancel_latest(&mut self.ledger),
                    };
                    if let Some(id) = report.id {
                        self.finish_driver_cancelled(id);
                    }
                    let _ = reply.send(report);
                }
                EngineEvent::CancelAll { reply } => {
                    let ids = cancel::cancel_all(&mut self.ledger);
                    for &id in &ids {
                        self.finish_driver_cancelled(id);
                    }
                    let _ = reply.send(ids.len());
                }
                EngineEvent::History { reply } => {
                    let _ = reply.send(self.ledger.all());
                }
                EngineEvent::Wait { id, reply } => {
                    self.handle_wait(id, reply);
                }
                EngineEvent::Finished { id, outcome } => self.handle_finished(id, outcome),
                EngineEvent::Shutdown => {
                    info!("shutdown requested, stopping coordinator");
                    self.stop = true;
                }
            }

            if self.stop {
                break;
            }
        }

        // Stop any spinner still animating and fail pending waiters.
        for (_, mut driver) in self.drivers.drain() {
            driver.finish("engine shutting down", Severity::Warn);
        }
        for (_, waiters) in self.waiters.drain() {
            for waiter in waiters {
                let _ = waiter.send(Err(RunletError::EngineClosed));
            }
        }

        info!("runlet coordinator exiting");
        self.ledger
    }

    /// Validate and dispatch one command. Errors here surface synchronously
    /// to the caller; nothing is recorded in the ledger on failure.
    fn handle_execute(&mut self, argv: Vec<String>, force_terminal: bool) -> Result<CommandId> {
        let Some(program) = argv.first() else {
            return Err(RunletError::EmptyCommand);
        };
        if !executable_resolvable(program) {
            return Err(RunletError::ExecutableNotFound(program.clone()));
        }

        let mode = if force_terminal || self.matches_terminal_pattern(&argv) {
            CommandMode::Terminal
        } else {
            CommandMode::Buffer
        };
        if mode == CommandMode::Terminal && self.collab.terminal.is_none() {
            return Err(RunletError::TerminalUnavailable);
        }

        let env = self
            .collab
            .env
            .as_ref()
            .and_then(|p| p.env_for(program))
            .unwrap_or_default();

        let id = self.ledger.open(argv.clone(), mode);
        let label = argv.join(" ");
        info!(id, cmd = %label, ?mode, "dispatching command");

        let mut driver = ProgressDriver::new(
            self.collab.adapter.clone(),
            self.config.spinner.clone(),
            ProgressContext {
                command_id: id,
                label: label.clone(),
            },
        );
        driver.start(&label);
        self.drivers.insert(id, driver);

        match mode {
            CommandMode::Buffer => self.dispatch_buffer(id, argv, env),
            CommandMode::Terminal => self.dispatch_terminal(id, &argv, &env),
        }

        Ok(id)
    }

    fn dispatch_buffer(&mut self, id: CommandId, argv: Vec<String>, env: Vec<(String, String)>) {
        let spec = RunSpec {
            argv,
            cwd: None,
            env,
            timeout: self.config.timeout,
        };

        match exec::spawn_command(spec) {
            Ok(running) => {
                if let Some(pid) = running.pid() {
                    self.ledger.track(id, CommandPatch::default().set_pid(pid));
                }
                let tx = self.self_tx.clone();
                tokio::spawn(async move {
                    let outcome = running.wait().await;
                    let _ = tx.send(EngineEvent::Finished { id, outcome }).await;
                });
            }
            Err(err) => {
                // Pre-dispatch validation makes this rare (e.g. permission
                // flipped between check and spawn); deliver the sentinel
                // outcome on the spot.
                warn!(id, error = %err, "spawn failed after validation");
                let outcome = RunOutcome::spawn_failure(format!("failed to spawn command: {err}"));
                self.handle_finished(id, outcome);
            }
        }
    }

    fn dispatch_terminal(&mut self, id: CommandId, argv: &[String], env: &[(String, String)]) {
        let Some(spawner) = self.collab.terminal.clone() else {
            // Checked in handle_execute; kept as a guard for direct callers.
            let outcome = RunOutcome::spawn_failure("no terminal spawner configured".to_string());
            self.handle_finished(id, outcome);
            return;
        };

        match spawner.spawn(argv, env) {
            Ok(job) => {
                if let Some(pid) = job.pid {
                    self.ledger.track(id, CommandPatch::default().set_pid(pid));
                }
                let tx = self.self_tx.clone();
                tokio::spawn(async move {
                    // A dropped exit channel means the host tore the terminal
                    // down without reporting; treat as failure.
                    let exit_code = job.exit_rx.await.unwrap_or(-1);
                    let outcome = RunOutcome {
                        exit_code,
                        cancelled: false,
                        timed_out: false,
                        stdout: String::new(),
                        stderr: String::new(),
                    };
                    let _ = tx.send(EngineEvent::Finished { id, outcome }).await;
                });
            }
            Err(err) => {
                warn!(id, error = %err, "terminal spawn failed");
                let outcome =
                    RunOutcome::spawn_failure(format!("failed to spawn terminal job: {err}"));
                self.handle_finished(id, outcome);
            }
        }
    }

    fn handle_rerun(&mut self, id: Option<CommandId>, force_terminal: bool) -> Result<CommandId> {
        let id = match id.or_else(|| self.ledger.latest_id()) {
            Some(id) => id,
            None => return Err(RunletError::NothingToRerun),
        };
        let argv = self
            .ledger
            .get(id)
            .map(|e| e.argv.clone())
            .ok_or(RunletError::UnknownCommand(id))?;

        // A fresh dispatch with a fresh id; the original entry is untouched.
        self.handle_execute(argv, force_terminal)
    }

    fn handle_wait(&mut self, id: CommandId, reply: oneshot::Sender<Result<CommandEntry>>) {
        match self.ledger.get(id) {
            None => {
                let _ = reply.send(Err(RunletError::UnknownCommand(id)));
            }
            Some(entry) if entry.status.is_terminal() => {
                let _ = reply.send(Ok(entry.clone()));
            }
            Some(_) => {
                self.waiters.entry(id).or_default().push(reply);
            }
        }
    }

    /// Stop the progress driver of a command the cancellation manager has
    /// already marked terminal. The runner's eventual exit event finds no
    /// driver left to notify.
    fn finish_driver_cancelled(&mut self, id: CommandId) {
        if let Some(mut driver) = self.drivers.remove(&id) {
            let label = self
                .ledger
                .get(id)
                .map(|e| e.label())
                .unwrap_or_else(|| format!("command {id}"));
            driver.finish(&format!("{label}: cancelled"), Severity::Warn);
        }
    }

    /// Apply a completion: classify, merge, stop progress, present output.
    /// Sets the stop flag when `exit_when_idle` is set and nothing is left
    /// running.
    fn handle_finished(&mut self, id: CommandId, outcome: RunOutcome) {
        let status = if outcome.cancelled {
            CommandStatus::Cancelled
        } else if outcome.exit_code == 0 {
            CommandStatus::Success
        } else {
            CommandStatus::Failed
        };

        let entry = self
            .ledger
            .track(
                id,
                CommandPatch::status(status)
                    .with_exit_code(outcome.exit_code)
                    .clear_pid(),
            )
            .cloned();

        let Some(entry) = entry else {
            warn!(id, "completion event for unknown command");
            return;
        };

        info!(
            id,
            exit_code = outcome.exit_code,
            status = ?entry.status,
            "command finished"
        );

        // The entry's status wins over the outcome's classification: an
        // optimistic cancel recorded earlier must shape the final report.
        let label = entry.label();
        let (message, severity) = match entry.status {
            CommandStatus::Success => (label.clone(), Severity::Info),
            CommandStatus::Cancelled => (format!("{label}: cancelled"), Severity::Warn),
            CommandStatus::Failed | CommandStatus::Running => (
                format!("{label}: failed (exit {})", outcome.exit_code),
                Severity::Error,
            ),
        };
        if let Some(mut driver) = self.drivers.remove(&id) {
            driver.finish(&message, severity);
        }

        if entry.mode == CommandMode::Buffer {
            let mut text = outcome.stdout;
            if !outcome.stderr.is_empty() {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&outcome.stderr);
            }
            let lines = presentable_lines(&text);
            if !lines.is_empty() {
                self.collab.presenter.present(&lines, &label);
            }
        }

        if let Some(waiters) = self.waiters.remove(&id) {
            for waiter in waiters {
                let _ = waiter.send(Ok(entry.clone()));
            }
        }

        if self.options.exit_when_idle && !self.ledger.has_running() {
            info!("no commands running and exit_when_idle=true, stopping");
            self.stop = true;
        }
    }

    fn matches_terminal_pattern(&self, argv: &[String]) -> bool {
        let Some(program) = argv.first() else {
            return false;
        };
        let name = Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());

        let Some(patterns) = self.config.force_terminal.get(&name) else {
            return false;
        };

        let joined = argv[1..].join(" ");
        patterns.iter().any(|p| joined.contains(p.as_str()))
    }
}

/// Check that `program` resolves to an executable file, either as an
/// explicit path or through `PATH`.
pub fn executable_resolvable(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return is_executable_file(path);
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| is_executable_file(&dir.join(program)))
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

// src/exec/runner.rs

//! Single-process runner: spawns one external command with piped stdout and
//! stderr, waits for it (or its timeout) and produces exactly one
//! [`RunOutcome`].
//!
//! The runner never talks to the ledger or the progress driver; the
//! coordinator owns those. It reports back through the outcome value that
//! [`RunningCommand::wait`] resolves to, so completion is single-fire by
//! construction: `wait` consumes the handle, and the timeout/exit race is
//! decided inside one `tokio::select!`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::signal;
use crate::output::normalize_output;

/// Everything needed to spawn one command.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Executable plus arguments. Passed as-is, never through a shell.
    pub argv: Vec<String>,
    /// Working directory; inherits the engine's when `None`.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
    /// Kill the process if it runs longer than this. `None` means no limit.
    pub timeout: Option<Duration>,
}

/// Final result of one command, delivered exactly once.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit_code: i32,
    /// True when the process died from an interrupt signal (user cancel).
    pub cancelled: bool,
    /// True when the runner's timeout escalation ended the process.
    pub timed_out: bool,
    /// Captured stdout, line endings normalized.
    pub stdout: String,
    /// Captured stderr, line endings normalized. Timeout and wait errors
    /// append a descriptive line here.
    pub stderr: String,
}

impl RunOutcome {
    /// Synthesized outcome for a spawn that never produced a process.
    pub fn spawn_failure(message: String) -> Self {
        Self {
            exit_code: signal::EXIT_SPAWN_FAILURE,
            cancelled: false,
            timed_out: false,
            stdout: String::new(),
            stderr: message,
        }
    }
}

/// A spawned, still-running command.
pub struct RunningCommand {
    pid: Option<u32>,
    child: Child,
    timeout: Option<Duration>,
    stdout_task: JoinHandle<Vec<u8>>,
    stderr_task: JoinHandle<Vec<u8>>,
    label: String,
}

/// Spawn `spec.argv[0]` with the remaining argv as arguments.
///
/// Fails synchronously (missing executable, permission denied) without
/// creating a process handle; the caller decides how to surface that.
pub fn spawn_command(spec: RunSpec) -> std::io::Result<RunningCommand> {
    let label = spec.argv.join(" ");
    let (program, args) = spec
        .argv
        .split_first()
        .ok_or_else(|| std::io::Error::other("empty argv"))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn()?;
    let pid = child.id();

    info!(cmd = %label, pid, "spawned command");

    let stdout_task = drain_stream(child.stdout.take(), "stdout");
    let stderr_task = drain_stream(child.stderr.take(), "stderr");

    Ok(RunningCommand {
        pid,
        child,
        timeout: spec.timeout,
        stdout_task,
        stderr_task,
        label,
    })
}

impl RunningCommand {
    /// OS pid of the live process, when the runtime reported one.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the process to exit, enforcing the timeout escalation.
    ///
    /// Consumes the handle; all owned resources (stream readers, the child
    /// itself) are finished before the outcome is produced.
    pub async fn wait(mut self) -> RunOutcome {
        let mut extra_stderr: Option<String> = None;

        let (exit_code, cancelled, timed_out) = match self.await_exit().await {
            Waited::Exited(status) => {
                let (code, cancelled) = classify_exit_status(status);
                debug!(cmd = %self.label, exit_code = code, "command exited");
                (code, cancelled, false)
            }
            Waited::TimedOut => {
                let timeout = self.timeout.unwrap_or_default();
                warn!(cmd = %self.label, ?timeout, "command timed out, escalating");
                self.escalate_and_reap().await;
                extra_stderr = Some(format!(
                    "command timed out after {}ms",
                    timeout.as_millis()
                ));
                (signal::EXIT_TIMEOUT, false, true)
            }
            Waited::WaitError(err) => {
                warn!(cmd = %self.label, error = %err, "failed waiting for command");
                extra_stderr = Some(format!("failed waiting for process: {err}"));
                (-1, false, false)
            }
        };

        let stdout = normalize_output(&self.stdout_task.await.unwrap_or_default());
        let mut stderr = normalize_output(&self.stderr_task.await.unwrap_or_default());

        if let Some(line) = extra_stderr {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&line);
            stderr.push('\n');
        }

        RunOutcome {
            exit_code,
            cancelled,
            timed_out,
            stdout,
            stderr,
        }
    }

    async fn await_exit(&mut self) -> Waited {
        match self.timeout {
            Some(timeout) if !timeout.is_zero() => {
                tokio::select! {
                    status = self.child.wait() => match status {
                        Ok(status) => Waited::Exited(status),
                        Err(err) => Waited::WaitError(err),
                    },
                    _ = tokio::time::sleep(timeout) => Waited::TimedOut,
                }
            }
            _ => match self.child.wait().await {
                Ok(status) => Waited::Exited(status),
                Err(err) => Waited::WaitError(err),
            },
        }
    }

    /// Two-phase shutdown after a timeout: graceful terminate, then a
    /// forceful kill once the grace window elapses. Always reaps the child.
    async fn escalate_and_reap(&mut self) {
        if let Some(pid) = self.pid {
            signal::terminate(pid);
        }

        tokio::select! {
            _ = self.child.wait() => {
                debug!(cmd = %self.label, "command exited within grace window");
            }
            _ = tokio::time::sleep(signal::GRACE) => {
                info!(cmd = %self.label, "grace window elapsed, killing command");
                if let Err(err) = self.child.kill().await {
                    warn!(cmd = %self.label, error = %err, "failed to kill timed-out command");
                }
            }
        }
    }
}

enum Waited {
    Exited(std::process::ExitStatus),
    TimedOut,
    WaitError(std::io::Error),
}

/// Map an exit status to `(exit_code, cancellation-caused)`.
///
/// Signal deaths short-circuit normal exit codes: interrupt reports 130 and
/// flags the outcome as cancellation-caused, terminate 143, kill 137, any
/// other signal 128 + n.
fn classify_exit_status(status: std::process::ExitStatus) -> (i32, bool) {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            let cancelled = 128 + sig == signal::EXIT_INTERRUPTED;
            return (128 + sig, cancelled);
        }
    }
    (status.code().unwrap_or(-1), false)
}

/// Drain one of the child's pipes to completion in a background task.
///
/// A read error is logged and the bytes collected so far are kept, so
/// partial output still reaches the completion path.
fn drain_stream<R>(stream: Option<R>, name: &'static str) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let Some(mut stream) = stream else {
            return buf;
        };
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(err) => {
                    warn!(stream = name, error = %err, "read error on command output");
                    break;
                }
            }
        }
        buf
    })
}

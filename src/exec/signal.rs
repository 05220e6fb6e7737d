// src/exec/signal.rs

//! Low-level signal helpers for the graceful-then-forceful escalation
//! protocol. Unix only; on other platforms the engine falls back to tokio's
//! `Child::kill`, and pid-based cancellation reports itself unsupported.

use std::time::Duration;

/// Grace window between the graceful signal and the forceful kill.
pub const GRACE: Duration = Duration::from_millis(1000);

/// Exit codes derived from fatal signals: 128 + signal number.
pub const EXIT_INTERRUPTED: i32 = 130;
pub const EXIT_TERMINATED: i32 = 143;
pub const EXIT_KILLED: i32 = 137;

/// Sentinel exit code for a command that exceeded its timeout.
pub const EXIT_TIMEOUT: i32 = 124;

/// Sentinel exit code for a command whose executable could not be spawned.
pub const EXIT_SPAWN_FAILURE: i32 = 127;

#[cfg(unix)]
mod imp {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    use tracing::debug;

    fn send(pid: u32, signal: Signal) {
        let target = Pid::from_raw(pid as i32);
        if let Err(err) = kill(target, signal) {
            // ESRCH just means the process already exited.
            debug!(pid, %signal, %err, "signal delivery failed");
        }
    }

    /// Graceful cancellation signal (SIGINT), as if the user hit Ctrl-C.
    pub fn interrupt(pid: u32) {
        send(pid, Signal::SIGINT);
    }

    /// Graceful termination signal (SIGTERM), used for timeouts.
    pub fn terminate(pid: u32) {
        send(pid, Signal::SIGTERM);
    }

    /// Forceful, uncatchable kill (SIGKILL).
    pub fn force_kill(pid: u32) {
        send(pid, Signal::SIGKILL);
    }

    /// Probe whether the process still exists (signal 0).
    pub fn is_alive(pid: u32) -> bool {
        kill(Pid::from_raw(pid as i32), None).is_ok()
    }
}

#[cfg(not(unix))]
mod imp {
    use tracing::warn;

    pub fn interrupt(pid: u32) {
        warn!(pid, "signal-based cancellation is not supported on this platform");
    }

    pub fn terminate(pid: u32) {
        warn!(pid, "signal-based termination is not supported on this platform");
    }

    pub fn force_kill(pid: u32) {
        warn!(pid, "signal-based kill is not supported on this platform");
    }

    pub fn is_alive(_pid: u32) -> bool {
        false
    }
}

pub use imp::{force_kill, interrupt, is_alive, terminate};

/// Spawn a background task that force-kills `pid` after the grace window if
/// it is still alive. Idempotent no-op when the process exits in time.
pub fn escalate_after_grace(pid: u32) {
    tokio::spawn(async move {
        tokio::time::sleep(GRACE).await;
        if is_alive(pid) {
            tracing::info!(pid, "grace window elapsed, sending forceful kill");
            force_kill(pid);
        }
    });
}

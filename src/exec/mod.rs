// src/exec/mod.rs

//! Process execution: spawning, output capture, timeout escalation, and the
//! signal helpers shared with cancellation.

pub mod runner;
pub mod signal;

pub use runner::{RunOutcome, RunSpec, RunningCommand, spawn_command};

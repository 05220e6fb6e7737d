#![cfg(unix)]

use std::time::{Duration, Instant};

use runlet::exec::{RunSpec, signal, spawn_command};

fn spec(argv: &[&str], timeout: Option<Duration>) -> RunSpec {
    RunSpec {
        argv: argv.iter().map(|s| (*s).to_string()).collect(),
        cwd: None,
        env: Vec::new(),
        timeout,
    }
}

#[tokio::test]
async fn successful_command_reports_zero_and_stdout() {
    let running = spawn_command(spec(&["echo", "hello"], None)).unwrap();
    assert!(running.pid().is_some());

    let outcome = running.wait().await;
    assert_eq!(outcome.exit_code, 0);
    assert!(!outcome.cancelled);
    assert!(!outcome.timed_out);
    assert_eq!(outcome.stdout, "hello\n");
    assert!(outcome.stderr.is_empty());
}

#[tokio::test]
async fn failing_command_reports_its_exit_code() {
    let running = spawn_command(spec(&["false"], None)).unwrap();
    let outcome = running.wait().await;
    assert_eq!(outcome.exit_code, 1);
    assert!(!outcome.cancelled);
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn stdout_and_stderr_are_captured_independently() {
    let running =
        spawn_command(spec(&["sh", "-c", "echo out; echo err >&2"], None)).unwrap();
    let outcome = running.wait().await;
    assert_eq!(outcome.stdout, "out\n");
    assert_eq!(outcome.stderr, "err\n");
}

#[tokio::test]
async fn line_endings_are_normalized() {
    let running =
        spawn_command(spec(&["sh", "-c", "printf 'a\\r\\nb\\rc\\n'"], None)).unwrap();
    let outcome = running.wait().await;
    assert_eq!(outcome.stdout, "a\nb\nc\n");
}

#[tokio::test]
async fn missing_executable_fails_synchronously() {
    let err = spawn_command(spec(&["not-a-real-binary-xyz"], None));
    assert!(err.is_err());
}

#[tokio::test]
async fn timeout_escalates_and_reports_sentinel_code() {
    let started = Instant::now();
    let running =
        spawn_command(spec(&["sleep", "5"], Some(Duration::from_millis(100)))).unwrap();
    let outcome = running.wait().await;
    let elapsed = started.elapsed();

    assert_eq!(outcome.exit_code, signal::EXIT_TIMEOUT);
    assert!(outcome.timed_out);
    assert!(!outcome.cancelled);
    assert!(outcome.stderr.contains("timed out after 100ms"));
    // Graceful terminate kills sleep well inside the 1000ms grace window.
    assert!(
        elapsed < Duration::from_secs(3),
        "timeout took {elapsed:?}, expected ~100ms + grace"
    );
}

#[tokio::test]
async fn timeout_still_delivers_partial_output() {
    let running = spawn_command(spec(
        &["sh", "-c", "echo partial; sleep 5"],
        Some(Duration::from_millis(200)),
    ))
    .unwrap();
    let outcome = running.wait().await;
    assert!(outcome.timed_out);
    assert_eq!(outcome.exit_code, signal::EXIT_TIMEOUT);
    assert!(outcome.stdout.contains("partial"));
}

#[tokio::test]
async fn interrupt_signal_maps_to_130_and_cancellation() {
    let running = spawn_command(spec(&["sleep", "5"], None)).unwrap();
    let pid = running.pid().unwrap();

    signal::interrupt(pid);
    let outcome = running.wait().await;

    assert_eq!(outcome.exit_code, signal::EXIT_INTERRUPTED);
    assert!(outcome.cancelled);
}

#[tokio::test]
async fn terminate_signal_maps_to_143_without_cancellation() {
    let running = spawn_command(spec(&["sleep", "5"], None)).unwrap();
    let pid = running.pid().unwrap();

    signal::terminate(pid);
    let outcome = running.wait().await;

    assert_eq!(outcome.exit_code, signal::EXIT_TERMINATED);
    assert!(!outcome.cancelled);
}

#[tokio::test]
async fn kill_signal_maps_to_137() {
    let running = spawn_command(spec(&["sleep", "5"], None)).unwrap();
    let pid = running.pid().unwrap();

    signal::force_kill(pid);
    let outcome = running.wait().await;

    assert_eq!(outcome.exit_code, signal::EXIT_KILLED);
    assert!(!outcome.cancelled);
}

#[tokio::test]
async fn working_directory_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = spec(&["pwd"], None);
    spec.cwd = Some(dir.path().to_path_buf());

    let outcome = spawn_command(spec).unwrap().wait().await;
    assert_eq!(outcome.exit_code, 0);
    let printed = outcome.stdout.trim();
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(
        std::path::Path::new(printed).canonicalize().unwrap(),
        expected
    );
}

#[tokio::test]
async fn env_overrides_reach_the_process() {
    let mut spec = spec(&["sh", "-c", "echo $RUNLET_TEST_VALUE"], None);
    spec.env = vec![("RUNLET_TEST_VALUE".to_string(), "42".to_string())];

    let outcome = spawn_command(spec).unwrap().wait().await;
    assert_eq!(outcome.stdout, "42\n");
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use runlet::progress::{
    ProgressAdapter, ProgressContext, ProgressDriver, Severity, SpinnerConfig,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Start(String),
    Update(Option<String>, String),
    Finish(Option<String>, String, bool),
}

#[derive(Default)]
struct RecordingAdapter {
    token: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingAdapter {
    fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProgressAdapter for RecordingAdapter {
    fn start(&self, message: &str, _ctx: &ProgressContext) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Start(message.to_string()));
        self.token.clone()
    }

    fn update(&self, token: Option<&str>, message: &str, _ctx: &ProgressContext) {
        self.calls.lock().unwrap().push(Call::Update(
            token.map(|t| t.to_string()),
            message.to_string(),
        ));
    }

    fn finish(&self, token: Option<&str>, message: &str, severity: Severity, _ctx: &ProgressContext) {
        self.calls.lock().unwrap().push(Call::Finish(
            token.map(|t| t.to_string()),
            message.to_string(),
            severity == Severity::Error,
        ));
    }
}

fn ctx() -> ProgressContext {
    ProgressContext {
        command_id: 1,
        label: "echo hi".to_string(),
    }
}

fn fast_spinner() -> SpinnerConfig {
    SpinnerConfig {
        interval_ms: 10,
        frames: vec!["a".to_string(), "b".to_string()],
    }
}

#[tokio::test]
async fn start_then_finish_calls_hooks_once_with_token() {
    let adapter = Arc::new(RecordingAdapter::with_token("tok-1"));
    let mut driver = ProgressDriver::new(Some(adapter.clone()), None, ctx());

    driver.start("echo hi");
    driver.finish("echo hi", Severity::Info);
    assert!(driver.is_done());

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], Call::Start("echo hi".to_string()));
    assert_eq!(
        calls[1],
        Call::Finish(Some("tok-1".to_string()), "echo hi".to_string(), false)
    );
}

#[tokio::test]
async fn spinner_ticks_advance_frames_and_stop_on_finish() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut driver = ProgressDriver::new(Some(adapter.clone()), Some(fast_spinner()), ctx());

    driver.start("echo hi");
    tokio::time::sleep(Duration::from_millis(80)).await;
    driver.finish("echo hi", Severity::Info);

    let updates: Vec<Call> = adapter
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Update(..)))
        .collect();
    assert!(!updates.is_empty(), "expected at least one spinner tick");
    if let Call::Update(_, message) = &updates[0] {
        assert!(message.starts_with("a ") || message.starts_with("b "));
        assert!(message.ends_with("echo hi"));
    }

    // No stale ticks after finish.
    let count = adapter.calls().len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(adapter.calls().len(), count);

    // Finish is the last call.
    assert!(matches!(adapter.calls().last(), Some(Call::Finish(..))));
}

#[tokio::test]
async fn finish_is_idempotent() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut driver = ProgressDriver::new(Some(adapter.clone()), None, ctx());

    driver.start("cmd");
    driver.finish("cmd", Severity::Error);
    driver.finish("cmd", Severity::Error);

    let finishes = adapter
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Finish(..)))
        .count();
    assert_eq!(finishes, 1);
}

#[tokio::test]
async fn finish_before_start_is_a_noop() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut driver = ProgressDriver::new(Some(adapter.clone()), None, ctx());

    driver.finish("cmd", Severity::Info);
    assert!(adapter.calls().is_empty());
    assert!(!driver.is_done());
}

#[tokio::test]
async fn double_start_announces_once() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut driver = ProgressDriver::new(Some(adapter.clone()), None, ctx());

    driver.start("cmd");
    driver.start("cmd");

    let starts = adapter
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Start(..)))
        .count();
    assert_eq!(starts, 1);
}

#[tokio::test]
async fn no_adapter_degrades_without_panicking() {
    let mut driver = ProgressDriver::new(None, Some(fast_spinner()), ctx());
    driver.start("cmd");
    tokio::time::sleep(Duration::from_millis(30)).await;
    driver.finish("cmd", Severity::Warn);
    assert!(driver.is_done());
}

#[tokio::test]
async fn empty_frames_disable_animation_but_not_notifications() {
    let adapter = Arc::new(RecordingAdapter::default());
    let spinner = SpinnerConfig {
        interval_ms: 10,
        frames: Vec::new(),
    };
    let mut driver = ProgressDriver::new(Some(adapter.clone()), Some(spinner), ctx());

    driver.start("cmd");
    tokio::time::sleep(Duration::from_millis(50)).await;
    driver.finish("cmd", Severity::Info);

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], Call::Start(..)));
    assert!(matches!(calls[1], Call::Finish(..)));
}

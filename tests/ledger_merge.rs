use proptest::prelude::*;

use runlet::ledger::{CommandLedger, CommandMode, CommandPatch, CommandStatus};

fn open_echo(ledger: &mut CommandLedger) -> u64 {
    ledger.open(vec!["echo".into(), "hi".into()], CommandMode::Buffer)
}

#[test]
fn ids_are_strictly_increasing_and_never_reused() {
    let mut ledger = CommandLedger::new();
    let a = open_echo(&mut ledger);
    let b = open_echo(&mut ledger);
    let c = open_echo(&mut ledger);
    assert!(a < b && b < c);
}

#[test]
fn new_entries_start_running_without_handle() {
    let mut ledger = CommandLedger::new();
    let id = open_echo(&mut ledger);
    let entry = ledger.get(id).unwrap();
    assert_eq!(entry.status, CommandStatus::Running);
    assert_eq!(entry.exit_code, None);
    assert_eq!(entry.pid, None);
    assert_eq!(entry.argv, vec!["echo".to_string(), "hi".to_string()]);
}

#[test]
fn terminal_status_is_frozen_but_exit_code_still_lands() {
    let mut ledger = CommandLedger::new();
    let id = open_echo(&mut ledger);

    // Optimistic cancel first, then the natural-exit completion races in.
    ledger.track(id, CommandPatch::status(CommandStatus::Cancelled).clear_pid());
    ledger.track(
        id,
        CommandPatch::status(CommandStatus::Failed).with_exit_code(130),
    );

    let entry = ledger.get(id).unwrap();
    assert_eq!(entry.status, CommandStatus::Cancelled);
    assert_eq!(entry.exit_code, Some(130));
}

#[test]
fn running_merge_cannot_resurrect_finished_command() {
    let mut ledger = CommandLedger::new();
    let id = open_echo(&mut ledger);

    ledger.track(
        id,
        CommandPatch::status(CommandStatus::Success).with_exit_code(0),
    );
    ledger.track(id, CommandPatch::status(CommandStatus::Running));

    assert_eq!(ledger.get(id).unwrap().status, CommandStatus::Success);
}

#[test]
fn pid_present_exactly_while_running() {
    let mut ledger = CommandLedger::new();
    let id = open_echo(&mut ledger);

    ledger.track(id, CommandPatch::default().set_pid(4242));
    let entry = ledger.get(id).unwrap();
    assert_eq!(entry.status, CommandStatus::Running);
    assert_eq!(entry.pid, Some(4242));
    assert_eq!(ledger.running().count(), 1);

    ledger.track(
        id,
        CommandPatch::status(CommandStatus::Success)
            .with_exit_code(0)
            .clear_pid(),
    );
    let entry = ledger.get(id).unwrap();
    assert_eq!(entry.pid, None);
    assert_eq!(ledger.running().count(), 0);
    assert!(!ledger.has_running());
}

#[test]
fn track_unknown_id_is_a_noop() {
    let mut ledger = CommandLedger::new();
    assert!(ledger
        .track(99, CommandPatch::status(CommandStatus::Success))
        .is_none());
    assert!(ledger.all().is_empty());
}

#[test]
fn all_returns_entries_in_dispatch_order() {
    let mut ledger = CommandLedger::new();
    let a = open_echo(&mut ledger);
    let b = open_echo(&mut ledger);
    let ids: Vec<u64> = ledger.all().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(ledger.latest_id(), Some(b));
}

fn status_strategy() -> impl Strategy<Value = CommandStatus> {
    prop_oneof![
        Just(CommandStatus::Running),
        Just(CommandStatus::Success),
        Just(CommandStatus::Failed),
        Just(CommandStatus::Cancelled),
    ]
}

proptest! {
    /// Whatever order completion paths merge in, the first terminal status
    /// wins and is never overwritten.
    #[test]
    fn terminal_status_never_reverts(statuses in proptest::collection::vec(status_strategy(), 1..20)) {
        let mut ledger = CommandLedger::new();
        let id = ledger.open(vec!["cmd".into()], CommandMode::Buffer);

        let mut first_terminal = None;
        for status in statuses {
            ledger.track(id, CommandPatch::status(status));
            if first_terminal.is_none() && status.is_terminal() {
                first_terminal = Some(status);
            }
        }

        let final_status = ledger.get(id).unwrap().status;
        match first_terminal {
            Some(expected) => prop_assert_eq!(final_status, expected),
            None => prop_assert_eq!(final_status, CommandStatus::Running),
        }
    }
}

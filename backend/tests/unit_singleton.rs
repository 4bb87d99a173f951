mod support;

use cert_agent::infrastructure::singleton::{enforce_singleton, enforce_singleton_within};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use support::FakeProcessTable;

#[test]
fn own_pid_is_never_terminated() {
    let table = FakeProcessTable::with_pids(vec![101, 4242, 202]);

    let report = enforce_singleton(&table, 4242);

    assert_eq!(table.terminated(), vec![101, 202]);
    assert_eq!(report.terminated, vec![101, 202]);
    assert!(report.failures.is_empty());
}

#[test]
fn only_self_matching_means_nothing_to_do() {
    let table = FakeProcessTable::with_pids(vec![7]);

    let report = enforce_singleton(&table, 7);

    assert!(table.terminated().is_empty());
    assert!(report.terminated.is_empty());
}

#[test]
fn signal_failures_are_recorded_and_remaining_pids_still_signalled() {
    let mut table = FakeProcessTable::with_pids(vec![10, 11, 12]);
    table.refuse = vec![11];

    let report = enforce_singleton(&table, 1);

    assert_eq!(report.terminated, vec![10, 12]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, Some(11));
}

#[test]
fn enumeration_failure_is_swallowed() {
    let table = FakeProcessTable::broken("pgrep: not found");

    let report = enforce_singleton(&table, 1);

    assert!(report.terminated.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].1.contains("pgrep"));
}

#[test]
fn waits_until_signalled_instances_have_exited() {
    let table = FakeProcessTable::with_pids(vec![10, 11]);

    let report = enforce_singleton(&table, 1);

    assert_eq!(report.terminated, vec![10, 11]);
    assert!(report.still_running.is_empty());
    // one enumeration to find them, one to see them gone
    assert_eq!(table.list_calls(), 2);
}

#[test]
fn exit_wait_is_bounded_when_an_instance_ignores_the_signal() {
    let mut table = FakeProcessTable::with_pids(vec![10]);
    table.ignore_signals = true;
    let started = Instant::now();

    let report = enforce_singleton_within(&table, 1, Duration::from_millis(250));

    assert!(started.elapsed() >= Duration::from_millis(250));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.terminated, vec![10]);
    assert_eq!(report.still_running, vec![10]);
    assert!(table.list_calls() > 2);
}

//! Integration tests for cycle mutual exclusion.

mod common;

use std::sync::Arc;
use std::time::Duration;

use facemark_capture::SyntheticImageSource;
use facemark_transport::SubmitTask;

#[test]
fn gate_mutual_exclusion_tests_drops_trigger_while_cycle_in_flight() {
    let transport = common::ScriptedTransport::replying_after(
        Duration::from_millis(150),
        200,
        r#"{"message":"Present"}"#,
    );
    let runner = common::runner_with(
        transport.clone(),
        Arc::new(SyntheticImageSource::new()),
        SubmitTask::MarkAttendance,
    );

    assert!(Arc::clone(&runner).spawn_cycle());
    // Give the worker time to reach the slow transport call.
    std::thread::sleep(Duration::from_millis(40));
    assert!(runner.gate().is_busy());
    assert!(!Arc::clone(&runner).spawn_cycle());

    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(runner.sink().snapshot().completed_attempts, 1);
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn gate_mutual_exclusion_tests_admits_next_trigger_after_completion() {
    let transport = common::ScriptedTransport::replying(200, r#"{"message":"Present"}"#);
    let runner = common::runner_with(
        transport,
        Arc::new(SyntheticImageSource::new()),
        SubmitTask::MarkAttendance,
    );

    runner.run_cycle();
    runner.run_cycle();

    assert_eq!(runner.sink().snapshot().completed_attempts, 2);
    assert!(!runner.gate().is_busy());
}

#[test]
fn gate_mutual_exclusion_tests_dropped_trigger_mutates_no_state() {
    let transport = common::ScriptedTransport::replying(200, r#"{"message":"Present"}"#);
    let runner = common::runner_with(
        transport.clone(),
        Arc::new(SyntheticImageSource::new()),
        SubmitTask::MarkAttendance,
    );

    assert!(runner.gate().try_enter());
    assert!(!Arc::clone(&runner).spawn_cycle());

    assert_eq!(runner.sink().snapshot().completed_attempts, 0);
    assert!(runner.sink().snapshot().last_message.is_none());
    assert_eq!(transport.request_count(), 0);
    runner.gate().exit();
}

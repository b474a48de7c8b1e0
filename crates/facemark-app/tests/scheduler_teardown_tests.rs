//! Integration tests for periodic teardown guarantees.

mod common;

use std::sync::Arc;
use std::time::Duration;

use facemark_capture::SyntheticImageSource;
use facemark_core::ScheduleConfig;
use facemark_engine::Scheduler;
use facemark_transport::SubmitTask;

#[test]
fn scheduler_teardown_tests_no_timer_cycles_after_stop_returns() {
    let transport = common::ScriptedTransport::replying(200, r#"{"message":"Present"}"#);
    let runner = common::runner_with(
        transport.clone(),
        Arc::new(SyntheticImageSource::new()),
        SubmitTask::MarkAttendance,
    );

    let config = ScheduleConfig::periodic(50).expect("valid interval");
    let scheduler = Scheduler::new(config, Arc::clone(&runner));

    scheduler.start().expect("start should work");
    std::thread::sleep(Duration::from_millis(180));
    scheduler.stop();

    // Allow any cycle admitted before the stop to finish, then freeze the
    // count and verify no new cycles originate from the timer.
    std::thread::sleep(Duration::from_millis(50));
    let attempts_at_stop = runner.sink().snapshot().completed_attempts;
    assert!(attempts_at_stop >= 2, "ticker should have fired repeatedly");

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(
        runner.sink().snapshot().completed_attempts,
        attempts_at_stop
    );
}

#[test]
fn scheduler_teardown_tests_in_flight_cycle_completes_exactly_once() {
    let transport = common::ScriptedTransport::replying_after(
        Duration::from_millis(200),
        200,
        r#"{"message":"Present"}"#,
    );
    let runner = common::runner_with(
        transport,
        Arc::new(SyntheticImageSource::new()),
        SubmitTask::MarkAttendance,
    );

    let config = ScheduleConfig::periodic(60_000).expect("valid interval");
    let scheduler = Scheduler::new(config, Arc::clone(&runner));

    scheduler.start().expect("start should work");
    std::thread::sleep(Duration::from_millis(50));

    // Stop while the immediate first cycle is still waiting on the network.
    scheduler.stop();
    assert_eq!(runner.sink().snapshot().completed_attempts, 0);

    std::thread::sleep(Duration::from_millis(350));
    let state = runner.sink().snapshot();
    assert_eq!(state.completed_attempts, 1);
    assert_eq!(state.last_message.as_deref(), Some("Present"));
}

#[test]
fn scheduler_teardown_tests_stop_when_stopped_is_a_no_op() {
    let runner = common::runner_with(
        common::ScriptedTransport::replying(200, r#"{"message":"Present"}"#),
        Arc::new(SyntheticImageSource::new()),
        SubmitTask::MarkAttendance,
    );

    let config = ScheduleConfig::periodic(1_000).expect("valid interval");
    let scheduler = Scheduler::new(config, runner);

    scheduler.stop();
    scheduler.start().expect("start should work");
    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());
}

//! Integration tests for environment configuration parsing.

use std::collections::HashMap;
use std::time::Duration;

use facemark_app::{
    AppConfig, AppError, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SERVER_URL,
};
use facemark_core::ScheduleMode;
use facemark_transport::SubmitTask;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn config_parsing_tests_defaults_select_manual_mark_mode() {
    let config = AppConfig::from_lookup(lookup_from(&[])).expect("defaults should parse");

    assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    assert_eq!(config.schedule.mode(), ScheduleMode::Manual);
    assert_eq!(config.task, SubmitTask::MarkAttendance);
    assert_eq!(
        config.http_timeout,
        Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS)
    );
    assert!(config.image_path.is_none());
    assert!(config.run_secs.is_none());
}

#[test]
fn config_parsing_tests_periodic_mode_reads_interval() {
    let config = AppConfig::from_lookup(lookup_from(&[
        ("FACEMARK_MODE", "periodic"),
        ("FACEMARK_INTERVAL_MS", "2500"),
    ]))
    .expect("periodic config should parse");

    assert_eq!(config.schedule.mode(), ScheduleMode::Periodic);
    assert_eq!(config.schedule.interval_ms(), Some(2_500));
}

#[test]
fn config_parsing_tests_rejects_unknown_mode_and_zero_interval() {
    assert!(matches!(
        AppConfig::from_lookup(lookup_from(&[("FACEMARK_MODE", "turbo")])),
        Err(AppError::Config(_))
    ));
    assert!(matches!(
        AppConfig::from_lookup(lookup_from(&[
            ("FACEMARK_MODE", "periodic"),
            ("FACEMARK_INTERVAL_MS", "0"),
        ])),
        Err(AppError::Core(_))
    ));
    assert!(matches!(
        AppConfig::from_lookup(lookup_from(&[("FACEMARK_HTTP_TIMEOUT_MS", "0")])),
        Err(AppError::Config(_))
    ));
}

#[test]
fn config_parsing_tests_register_task_requires_subject_name() {
    assert!(matches!(
        AppConfig::from_lookup(lookup_from(&[("FACEMARK_TASK", "register")])),
        Err(AppError::Config(_))
    ));

    let config = AppConfig::from_lookup(lookup_from(&[
        ("FACEMARK_TASK", "register"),
        ("FACEMARK_SUBJECT_NAME", "Ada Lovelace"),
    ]))
    .expect("register config should parse");
    assert_eq!(
        config.task,
        SubmitTask::RegisterSubject {
            name: "Ada Lovelace".to_string()
        }
    );
}

#[test]
fn config_parsing_tests_face_login_subject_applies_to_mark_mode_only() {
    let marking = AppConfig::from_lookup(lookup_from(&[(
        "FACEMARK_SUBJECT_NAME",
        "Ada Lovelace",
    )]))
    .expect("mark config should parse");
    assert_eq!(marking.face_login_subject(), Some("Ada Lovelace"));

    let registering = AppConfig::from_lookup(lookup_from(&[
        ("FACEMARK_TASK", "register"),
        ("FACEMARK_SUBJECT_NAME", "Ada Lovelace"),
    ]))
    .expect("register config should parse");
    assert_eq!(registering.face_login_subject(), None);
}

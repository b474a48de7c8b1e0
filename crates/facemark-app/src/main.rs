#![warn(missing_docs)]
//! # facemark-app binary
//!
//! Headless entry point for the facemark attendance client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use facemark_app::{AppConfig, AppContext, AppError, app_version, bootstrap, establish_session};
use facemark_core::ScheduleMode;
use facemark_engine::{CycleReport, Scheduler};
use facemark_ui::project_status;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = run() {
        log::error!("app/fatal {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    log::info!(
        "app/start version={} server={} mode={:?}",
        app_version(),
        config.server_url,
        config.schedule.mode()
    );

    let context = bootstrap(config)?;

    if let Some(subject) = context.config.face_login_subject().map(str::to_string) {
        // A failed sign-in leaves the loop running unauthenticated; the
        // attendance endpoint itself does not require a session.
        if let Err(error) = establish_session(&context, &subject) {
            log::warn!("app/face_login_failed subject={subject} {error}");
        }
    }

    match context.config.schedule.mode() {
        ScheduleMode::Manual => run_manual(&context),
        ScheduleMode::Periodic => run_periodic(&context),
    }
}

// One user-triggered cycle, reported on stdout.
fn run_manual(context: &AppContext) -> Result<(), AppError> {
    let report = context.runner.run_cycle();
    if report == CycleReport::Dropped {
        log::warn!("app/manual_cycle_dropped another cycle is in flight");
    }

    let view = project_status(&context.sink.snapshot(), context.runner.gate().is_busy());
    match view.message {
        Some(message) => println!("{message}"),
        None => println!("No attempt completed"),
    }
    Ok(())
}

// Periodic loop: the scheduler ticks in the background while this thread
// mirrors sink updates into the log.
fn run_periodic(context: &AppContext) -> Result<(), AppError> {
    let scheduler = Scheduler::new(context.config.schedule, Arc::clone(&context.runner));
    scheduler.start()?;

    let started = Instant::now();
    let mut last_message: Option<String> = None;
    loop {
        std::thread::sleep(Duration::from_millis(500));

        let view = project_status(&context.sink.snapshot(), context.runner.gate().is_busy());
        if view.message != last_message {
            if let Some(message) = &view.message {
                log::info!(
                    "app/status attempts={} in_flight={} message={message}",
                    view.attempts,
                    view.in_flight
                );
            }
            last_message = view.message;
        }

        if let Some(run_secs) = context.config.run_secs
            && started.elapsed() >= Duration::from_secs(run_secs)
        {
            break;
        }
    }

    scheduler.stop();
    log::info!("app/shutdown attempts={}", context.sink.snapshot().completed_attempts);
    Ok(())
}

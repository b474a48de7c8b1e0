#![warn(missing_docs)]
//! # facemark-engine
//!
//! ## Purpose
//! Coordinates the capture-submit loop: admission control, cycle execution,
//! result recording, and trigger scheduling.
//!
//! ## Responsibilities
//! - Enforce at-most-one in-flight cycle through the [`CaptureGate`].
//! - Run one cycle end to end ([`CycleRunner`]): acquire, submit, record.
//! - Own the shared last-result slot ([`ResultSink`]).
//! - Drive cycles from a manual trigger or a repeating timer
//!   ([`Scheduler`]).
//!
//! ## Data flow
//! Timer tick or manual trigger -> gate admits or drops -> image source ->
//! transport adapter -> classified outcome recorded into the sink.
//!
//! ## Ownership and lifetimes
//! The runner is shared behind `Arc` between the scheduler ticker and
//! manual-trigger callers. Admitted cycles run on detached worker threads;
//! a cycle in flight at shutdown completes on its own and records exactly
//! once.
//!
//! ## Error model
//! Cycle-level failures terminate the cycle and surface through the sink
//! message; none are fatal and none are retried. Scheduler misuse returns
//! [`EngineError`].
//!
//! ## Security and privacy notes
//! Log lines reference captures by content digest, never by image bytes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use facemark_capture::ImageSource;
use facemark_core::{CaptureAttempt, Outcome, ResultState, ScheduleConfig};
use facemark_session::SessionStore;
use facemark_transport::{AttendanceClient, SubmitTask, image_digest};
use thiserror::Error;

/// Mutual-exclusion flag preventing overlapping cycles.
///
/// A trigger arriving while the gate is held is dropped, never queued: a
/// stale capture is worthless once a newer trigger has arrived, so the
/// policy is drop-latest rather than backpressure. The check-and-set is a
/// single atomic operation because triggers arrive from more than one
/// thread.
#[derive(Debug, Default)]
pub struct CaptureGate {
    busy: AtomicBool,
}

impl CaptureGate {
    /// Creates an idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits the caller and marks the gate busy, or refuses with no side
    /// effect when a cycle is already in flight.
    pub fn try_enter(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Releases the gate. Must be called exactly once per successful
    /// [`CaptureGate::try_enter`], on every exit path of the guarded cycle.
    pub fn exit(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Returns `true` while a cycle holds the gate.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

// Releases the gate on every exit path, including unwinding.
struct GateRelease<'a> {
    gate: &'a CaptureGate,
}

impl Drop for GateRelease<'_> {
    fn drop(&mut self) {
        self.gate.exit();
    }
}

/// Shared handle over the last completed result.
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    state: Arc<Mutex<ResultState>>,
}

impl ResultSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed attempt, consuming it.
    ///
    /// # Errors
    /// Returns [`facemark_core::CoreError::UnresolvedAttempt`] when the
    /// attempt outcome is still pending.
    pub fn record(&self, attempt: CaptureAttempt) -> Result<(), facemark_core::CoreError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.apply(attempt)
    }

    /// Returns a clone of the current result state.
    pub fn snapshot(&self) -> ResultState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Gate was busy; the trigger was discarded with no state change.
    Dropped,
    /// Cycle ran to completion with the given outcome.
    Completed(Outcome),
}

/// Runs one capture-submit cycle at a time.
pub struct CycleRunner {
    gate: CaptureGate,
    sink: ResultSink,
    source: Arc<dyn ImageSource>,
    client: AttendanceClient,
    session: SessionStore,
    task: SubmitTask,
}

impl CycleRunner {
    /// Creates a runner with all collaborators injected.
    pub fn new(
        source: Arc<dyn ImageSource>,
        client: AttendanceClient,
        session: SessionStore,
        sink: ResultSink,
        task: SubmitTask,
    ) -> Self {
        Self {
            gate: CaptureGate::new(),
            sink,
            source,
            client,
            session,
            task,
        }
    }

    /// Returns the gate, for in-flight status projection.
    pub fn gate(&self) -> &CaptureGate {
        &self.gate
    }

    /// Returns a handle to the sink this runner records into.
    pub fn sink(&self) -> ResultSink {
        self.sink.clone()
    }

    /// Runs one cycle synchronously on the calling thread.
    ///
    /// Returns [`CycleReport::Dropped`] without side effects when a cycle is
    /// already in flight.
    pub fn run_cycle(&self) -> CycleReport {
        if !self.gate.try_enter() {
            log::debug!("engine/cycle_dropped previous cycle still in flight");
            return CycleReport::Dropped;
        }
        CycleReport::Completed(self.run_admitted())
    }

    /// Attempts one cycle without blocking the caller.
    ///
    /// The gate check happens on the calling thread; admitted work runs on a
    /// detached worker thread and records into the sink when it completes.
    /// Returns `true` when the cycle was admitted.
    pub fn spawn_cycle(self: Arc<Self>) -> bool {
        if !self.gate.try_enter() {
            log::debug!("engine/cycle_dropped previous cycle still in flight");
            return false;
        }

        let runner = Arc::clone(&self);
        let spawned = std::thread::Builder::new()
            .name("facemark-cycle".to_string())
            .spawn(move || {
                runner.run_admitted();
            });

        if let Err(error) = spawned {
            self.gate.exit();
            log::error!("engine/cycle_spawn_failed {error}");
            return false;
        }
        true
    }

    // Body of one admitted cycle. The caller already holds the gate; the
    // drop guard releases it on every exit path.
    fn run_admitted(&self) -> Outcome {
        let _release = GateRelease { gate: &self.gate };

        let started_at_ms = unix_millis();
        let mut attempt = CaptureAttempt::begin(started_at_ms);

        let image = match self.source.acquire(started_at_ms) {
            Ok(image) => image,
            Err(error) => {
                log::error!("engine/capture_failed {error}");
                attempt.resolve(Outcome::TransportError("capture failed".to_string()));
                let outcome = attempt.outcome.clone();
                self.record(attempt);
                return outcome;
            }
        };

        log::info!(
            "engine/image_acquired digest={} bytes={}",
            image_digest(&image),
            image.len()
        );

        let bearer = self.session.bearer();
        let outcome = self.client.submit(&self.task, Some(&image), bearer.as_deref());
        attempt.attach_image(image);
        attempt.resolve(outcome.clone());
        self.record(attempt);
        outcome
    }

    fn record(&self, attempt: CaptureAttempt) {
        // The attempt is resolved on every path above; a failure here would
        // indicate a bug, not a runtime condition.
        if let Err(error) = self.sink.record(attempt) {
            log::error!("engine/record_failed {error}");
        }
    }
}

struct Ticker {
    stop_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

/// Drives cycles from a manual entry point and, in periodic mode, a
/// repeating timer.
pub struct Scheduler {
    config: ScheduleConfig,
    runner: Arc<CycleRunner>,
    ticker: Mutex<Option<Ticker>>,
}

impl Scheduler {
    /// Creates a scheduler for one immutable configuration.
    ///
    /// Changing mode requires tearing this scheduler down and creating a new
    /// one.
    pub fn new(config: ScheduleConfig, runner: Arc<CycleRunner>) -> Self {
        Self {
            config,
            runner,
            ticker: Mutex::new(None),
        }
    }

    /// Returns the configured schedule.
    pub fn config(&self) -> ScheduleConfig {
        self.config
    }

    /// Manual entry point: attempts one cycle now.
    ///
    /// Returns `true` when the cycle was admitted, `false` when it was
    /// dropped because a cycle is still in flight.
    pub fn trigger_now(&self) -> bool {
        Arc::clone(&self.runner).spawn_cycle()
    }

    /// Starts the repeating timer.
    ///
    /// The first tick fires immediately, then every configured interval.
    /// Starting an already-running scheduler is a no-op; exactly one ticker
    /// exists at a time.
    ///
    /// # Errors
    /// Returns [`EngineError::NotPeriodic`] in manual mode and
    /// [`EngineError::Spawn`] when the ticker thread cannot start.
    pub fn start(&self) -> Result<(), EngineError> {
        let Some(interval_ms) = self.config.interval_ms() else {
            return Err(EngineError::NotPeriodic);
        };

        let mut ticker = self
            .ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if ticker.is_some() {
            log::debug!("engine/scheduler_start already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let runner = Arc::clone(&self.runner);
        let interval = Duration::from_millis(interval_ms);

        let join = std::thread::Builder::new()
            .name("facemark-ticker".to_string())
            .spawn(move || {
                Arc::clone(&runner).spawn_cycle();
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            Arc::clone(&runner).spawn_cycle();
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|error| EngineError::Spawn(error.to_string()))?;

        *ticker = Some(Ticker { stop_tx, join });
        log::info!("engine/scheduler_started interval_ms={interval_ms}");
        Ok(())
    }

    /// Stops the repeating timer and waits for it to wind down.
    ///
    /// After this returns, no further cycles originate from the timer. A
    /// cycle already in flight still completes and records into the sink
    /// exactly once; stopping does not cancel it.
    pub fn stop(&self) {
        let taken = self
            .ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(ticker) = taken {
            let _ = ticker.stop_tx.send(());
            let _ = ticker.join.join();
            log::info!("engine/scheduler_stopped ticker joined");
        }
    }

    /// Returns `true` while the periodic ticker is running.
    pub fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .map(|ticker| ticker.is_some())
            .unwrap_or(false)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // A leaked ticker would keep firing against a torn-down context.
        self.stop();
    }
}

/// Returns the current Unix time in milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Engine orchestration errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Timer start requested on a manual-mode scheduler.
    #[error("scheduler is not configured for periodic mode")]
    NotPeriodic,
    /// Worker or ticker thread could not be spawned.
    #[error("thread spawn failure: {0}")]
    Spawn(String),
}

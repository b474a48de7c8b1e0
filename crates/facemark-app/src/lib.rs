#![warn(missing_docs)]
//! # facemark-app
//!
//! ## Purpose
//! Wires capture, transport, session, and engine into one runnable client.
//!
//! ## Responsibilities
//! - Parse and validate environment configuration.
//! - Construct the image source, HTTP transport, client, session store,
//!   result sink, and cycle runner.
//! - Establish an optional face-auth session before the loop starts.
//!
//! ## Data flow
//! Environment -> [`AppConfig`] -> [`bootstrap`] -> [`AppContext`] consumed
//! by the binary's run loop and by the integration test suite.
//!
//! ## Ownership and lifetimes
//! [`AppContext`] owns one instance of every collaborator for the process
//! lifetime; the runner is shared behind `Arc` with the scheduler.
//!
//! ## Error model
//! Configuration and wiring failures are wrapped in [`AppError`] and abort
//! startup; cycle-level failures never surface here (they flow through the
//! result sink).
//!
//! ## Security and privacy notes
//! Configuration values are logged except tokens; captured frames are
//! referenced in logs by digest only.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use facemark_capture::{CaptureError, FileImageSource, ImageSource, SyntheticImageSource};
use facemark_core::{CoreError, ScheduleConfig, ScheduleMode};
use facemark_engine::{CycleRunner, EngineError, ResultSink, unix_millis};
use facemark_session::{SessionError, SessionGrant, SessionStore};
use facemark_transport::{
    ApiError, AttendanceClient, HttpTransport, SubmitTask, TransportError,
};
use facemark_ui::RegistrationError;
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FACEMARK_VERSION");

/// Default recognition service base URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";
/// Default periodic capture interval.
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;
/// Default bounded wait for one HTTP request.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 15_000;

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Recognition service base URL.
    pub server_url: String,
    /// Trigger schedule for the capture loop.
    pub schedule: ScheduleConfig,
    /// Submit operation performed by each cycle.
    pub task: SubmitTask,
    /// Camera spool path; unset selects the synthetic source.
    pub image_path: Option<PathBuf>,
    /// Subject name used for registration and face-auth.
    pub subject_name: Option<String>,
    /// Bounded wait applied to every HTTP request.
    pub http_timeout: Duration,
    /// Optional run duration for periodic mode; unset runs until killed.
    pub run_secs: Option<u64>,
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for unparseable or contradictory values.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an injected lookup, for tests.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for unparseable or contradictory values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let server_url =
            lookup("FACEMARK_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let mode = match normalized(&lookup, "FACEMARK_MODE").as_deref() {
            None | Some("manual") => ScheduleMode::Manual,
            Some("periodic") => ScheduleMode::Periodic,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "FACEMARK_MODE must be 'manual' or 'periodic', got '{other}'"
                )));
            }
        };

        let interval_ms = parse_u64(&lookup, "FACEMARK_INTERVAL_MS", DEFAULT_INTERVAL_MS)?;
        let schedule = match mode {
            ScheduleMode::Manual => ScheduleConfig::manual(),
            ScheduleMode::Periodic => ScheduleConfig::periodic(interval_ms)?,
        };

        let subject_name = lookup("FACEMARK_SUBJECT_NAME")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let task = match normalized(&lookup, "FACEMARK_TASK").as_deref() {
            None | Some("mark") => SubmitTask::MarkAttendance,
            Some("register") => {
                let name = subject_name.clone().ok_or_else(|| {
                    AppError::Config(
                        "FACEMARK_TASK=register requires FACEMARK_SUBJECT_NAME".to_string(),
                    )
                })?;
                facemark_ui::validate_registration(&name)?;
                SubmitTask::RegisterSubject { name }
            }
            Some(other) => {
                return Err(AppError::Config(format!(
                    "FACEMARK_TASK must be 'mark' or 'register', got '{other}'"
                )));
            }
        };

        let timeout_ms = parse_u64(&lookup, "FACEMARK_HTTP_TIMEOUT_MS", DEFAULT_HTTP_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(AppError::Config(
                "FACEMARK_HTTP_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        let run_secs = match lookup("FACEMARK_RUN_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|error| {
                AppError::Config(format!("FACEMARK_RUN_SECS must be an integer: {error}"))
            })?),
            None => None,
        };

        Ok(Self {
            server_url,
            schedule,
            task,
            image_path: lookup("FACEMARK_IMAGE_PATH").map(PathBuf::from),
            subject_name,
            http_timeout: Duration::from_millis(timeout_ms),
            run_secs,
        })
    }

    /// Returns the subject to face-login as before the attendance loop, when
    /// configured.
    pub fn face_login_subject(&self) -> Option<&str> {
        match self.task {
            SubmitTask::MarkAttendance => self.subject_name.as_deref(),
            SubmitTask::RegisterSubject { .. } => None,
        }
    }
}

fn normalized(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).map(|value| value.trim().to_ascii_lowercase())
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64, AppError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|error| AppError::Config(format!("{name} must be an integer: {error}"))),
        None => Ok(default),
    }
}

/// Fully wired application collaborators.
pub struct AppContext {
    /// Validated configuration the context was built from.
    pub config: AppConfig,
    /// Image acquisition source.
    pub source: Arc<dyn ImageSource>,
    /// Recognition service client.
    pub client: AttendanceClient,
    /// Explicit session state shared across collaborators.
    pub session: SessionStore,
    /// Shared last-result slot.
    pub sink: ResultSink,
    /// Cycle runner shared with the scheduler.
    pub runner: Arc<CycleRunner>,
}

/// Builds every collaborator from validated configuration.
///
/// # Errors
/// Returns [`AppError`] when the HTTP transport or client cannot be
/// constructed.
pub fn bootstrap(config: AppConfig) -> Result<AppContext, AppError> {
    let source: Arc<dyn ImageSource> = match &config.image_path {
        Some(path) => Arc::new(FileImageSource::new(path.clone())),
        None => {
            log::warn!("app/synthetic_source FACEMARK_IMAGE_PATH unset; using synthetic frames");
            Arc::new(SyntheticImageSource::new())
        }
    };

    let transport = Arc::new(HttpTransport::with_timeout(config.http_timeout)?);
    let client = AttendanceClient::new(&config.server_url, transport)?;
    let session = SessionStore::new();
    let sink = ResultSink::new();
    let runner = Arc::new(CycleRunner::new(
        Arc::clone(&source),
        client.clone(),
        session.clone(),
        sink.clone(),
        config.task.clone(),
    ));

    Ok(AppContext {
        config,
        source,
        client,
        session,
        sink,
        runner,
    })
}

/// Opens a face-auth session for `subject` and stores the grant.
///
/// # Errors
/// Returns [`AppError`] when acquisition, the face-auth call, or grant
/// validation fails; the caller decides whether that is fatal.
pub fn establish_session(context: &AppContext, subject: &str) -> Result<(), AppError> {
    let image = context.source.acquire(unix_millis())?;
    let response = context.client.face_login(subject, &image)?;
    let grant = SessionGrant::from_face_auth(subject, response)?;
    log::info!("app/face_login subject={subject} message={}", grant.message);
    context.session.sign_in(grant);
    Ok(())
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Environment configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// Core model validation error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Image acquisition error during wiring or face-auth.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Transport construction error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Recognition API error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    /// Session grant validation error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    /// Scheduler misuse or thread spawn error.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// Registration form validation error.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),
}

#![warn(missing_docs)]
//! # facemark-core
//!
//! ## Purpose
//! Defines the pure data model used across the `facemark` workspace.
//!
//! ## Responsibilities
//! - Represent one captured biometric image as an opaque owned handle.
//! - Model a capture-submit cycle as a [`CaptureAttempt`] with a typed
//!   [`Outcome`].
//! - Hold the last completed result in [`ResultState`] for presentation
//!   readers.
//! - Validate scheduling configuration ([`ScheduleConfig`]).
//!
//! ## Data flow
//! An image source emits [`CapturedImage`] values. The cycle orchestrator
//! wraps each one in a [`CaptureAttempt`], resolves the attempt with an
//! [`Outcome`], and folds it into [`ResultState`].
//!
//! ## Ownership and lifetimes
//! Captured images own their byte buffers (`Vec<u8>`); an attempt owns its
//! image exclusively until the attempt is recorded, at which point the image
//! moves into the result state's last-value slot.
//!
//! ## Error model
//! Validation failures (non-JPEG bytes, zero interval, recording an
//! unresolved attempt) return [`CoreError`] variants.
//!
//! ## Security and privacy notes
//! This crate never logs image bytes. Biometric buffers live only in the
//! current attempt and the single last-value slot; nothing is persisted.
//!
//! ## Example
//! ```rust
//! use facemark_core::{CaptureAttempt, CapturedImage, Outcome, ResultState};
//!
//! let image = CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00], 1_000).unwrap();
//! let mut attempt = CaptureAttempt::begin(1_000);
//! attempt.attach_image(image);
//! attempt.resolve(Outcome::Success("Present".to_string()));
//!
//! let mut state = ResultState::new();
//! state.apply(attempt).unwrap();
//! assert_eq!(state.last_message.as_deref(), Some("Present"));
//! ```

use serde::Serialize;
use thiserror::Error;

/// JPEG start-of-image marker required at the head of every capture buffer.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// User-facing message substituted for malformed success responses.
///
/// Decode detail for a parse failure is diagnostic-only and goes to the log,
/// never to the presentation layer.
pub const PARSE_FAILURE_MESSAGE: &str = "Unable to parse server response";

/// Generic rejection message used when the server returns a failure status
/// without a readable body.
pub const GENERIC_REJECTION_MESSAGE: &str = "Upload failed";

/// Opaque handle to one freshly captured JPEG image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Raw JPEG bytes.
    pub bytes: Vec<u8>,
    /// Capture time in Unix epoch milliseconds.
    pub captured_at_ms: u64,
}

impl CapturedImage {
    /// Constructs a validated captured image.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyImage`] for an empty buffer and
    /// [`CoreError::InvalidImageEncoding`] when the buffer does not start
    /// with the JPEG SOI marker.
    pub fn new(bytes: Vec<u8>, captured_at_ms: u64) -> Result<Self, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::EmptyImage);
        }
        if bytes.len() < JPEG_SOI.len() || bytes[..JPEG_SOI.len()] != JPEG_SOI {
            return Err(CoreError::InvalidImageEncoding);
        }

        Ok(Self {
            bytes,
            captured_at_ms,
        })
    }

    /// Returns image size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-length buffer (never true for validated
    /// instances).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Classified result of one capture-submit cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Cycle has started but no result has been classified yet.
    Pending,
    /// Server accepted the submission; payload carries the server message.
    Success(String),
    /// Server returned a failure status with a readable message.
    Rejected(String),
    /// The request never produced a usable response (connection, DNS,
    /// timeout, or an upstream capture failure).
    TransportError(String),
    /// Success status with a body that was expected to be well-formed JSON
    /// and was not.
    ParseError,
}

impl Outcome {
    /// Returns `true` once the cycle can no longer change state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    /// Maps the outcome to the string surfaced to the presentation layer.
    ///
    /// Returns `None` only for [`Outcome::Pending`]. Parse failures map to
    /// the fixed [`PARSE_FAILURE_MESSAGE`]; their decode detail never leaves
    /// the diagnostic log.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Outcome::Pending => None,
            Outcome::Success(message) | Outcome::Rejected(message) => Some(message.clone()),
            Outcome::TransportError(reason) => Some(reason.clone()),
            Outcome::ParseError => Some(PARSE_FAILURE_MESSAGE.to_string()),
        }
    }
}

/// One capture-submit cycle from trigger to recorded outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureAttempt {
    /// Cycle start time in Unix epoch milliseconds.
    pub started_at_ms: u64,
    /// Captured image, owned exclusively by the attempt until recording.
    pub image: Option<CapturedImage>,
    /// Current outcome; `Pending` until classification completes.
    pub outcome: Outcome,
}

impl CaptureAttempt {
    /// Begins a new attempt with a pending outcome and no image.
    pub fn begin(started_at_ms: u64) -> Self {
        Self {
            started_at_ms,
            image: None,
            outcome: Outcome::Pending,
        }
    }

    /// Hands the captured image to the attempt.
    pub fn attach_image(&mut self, image: CapturedImage) {
        self.image = Some(image);
    }

    /// Resolves the attempt with its classified outcome.
    pub fn resolve(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }
}

/// Last-value result state read by the presentation layer.
///
/// Single-writer (the cycle orchestrator), multi-reader. Overwritten on
/// every completed attempt, including failed ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultState {
    /// Message from the most recently completed attempt.
    pub last_message: Option<String>,
    /// Image from the most recently completed attempt that produced one.
    pub last_image: Option<CapturedImage>,
    /// Count of attempts folded into this state.
    pub completed_attempts: u64,
}

impl ResultState {
    /// Creates an empty result state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one completed attempt into the state, consuming it.
    ///
    /// The attempt's image (when present) moves into the last-value slot, so
    /// the attempt's resources are released here.
    ///
    /// # Errors
    /// Returns [`CoreError::UnresolvedAttempt`] when the attempt outcome is
    /// still [`Outcome::Pending`].
    pub fn apply(&mut self, attempt: CaptureAttempt) -> Result<(), CoreError> {
        let Some(message) = attempt.outcome.user_message() else {
            return Err(CoreError::UnresolvedAttempt);
        };

        self.last_message = Some(message);
        if let Some(image) = attempt.image {
            self.last_image = Some(image);
        }
        self.completed_attempts = self.completed_attempts.saturating_add(1);
        Ok(())
    }
}

/// Trigger mode for the capture-submit loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// One capture per explicit user trigger.
    Manual,
    /// Captures at a fixed interval from a repeating timer.
    Periodic,
}

/// Immutable scheduling configuration for one scheduler lifetime.
///
/// Changing mode requires tearing down and recreating the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    mode: ScheduleMode,
    interval_ms: u64,
}

impl ScheduleConfig {
    /// Creates manual-mode configuration.
    pub fn manual() -> Self {
        Self {
            mode: ScheduleMode::Manual,
            interval_ms: 0,
        }
    }

    /// Creates periodic-mode configuration.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInterval`] when `interval_ms == 0`.
    pub fn periodic(interval_ms: u64) -> Result<Self, CoreError> {
        if interval_ms == 0 {
            return Err(CoreError::InvalidInterval);
        }
        Ok(Self {
            mode: ScheduleMode::Periodic,
            interval_ms,
        })
    }

    /// Returns configured trigger mode.
    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// Returns the tick interval for periodic mode.
    pub fn interval_ms(&self) -> Option<u64> {
        match self.mode {
            ScheduleMode::Manual => None,
            ScheduleMode::Periodic => Some(self.interval_ms),
        }
    }
}

/// Error type for core domain validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Capture buffer is empty.
    #[error("captured image buffer is empty")]
    EmptyImage,
    /// Capture buffer is not a JPEG stream.
    #[error("captured image bytes are not JPEG encoded")]
    InvalidImageEncoding,
    /// Periodic interval must be strictly positive.
    #[error("periodic interval must be greater than zero")]
    InvalidInterval,
    /// Attempt must carry a terminal outcome before it can be recorded.
    #[error("attempt outcome is still pending")]
    UnresolvedAttempt,
}

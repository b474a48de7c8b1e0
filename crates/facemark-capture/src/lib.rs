#![warn(missing_docs)]
//! # facemark-capture
//!
//! ## Purpose
//! Provides the image acquisition abstraction for the capture-submit loop.
//!
//! ## Responsibilities
//! - Define a backend-agnostic image source trait.
//! - Expose a file-spool source for kiosk deployments where the camera
//!   daemon writes the latest frame to a fixed path.
//! - Expose a deterministic synthetic source for CI and unit tests.
//!
//! ## Data flow
//! Scheduler trigger -> cycle orchestrator calls [`ImageSource::acquire`] ->
//! validated [`facemark_core::CapturedImage`] enters the submit pipeline.
//!
//! ## Ownership and lifetimes
//! Acquired images are owned values with independent buffers; no borrowed
//! image memory escapes source boundaries.
//!
//! ## Error model
//! Device-layer failures (busy device, missing permission, unreadable spool
//! path) and malformed frames are reported as [`CaptureError`] values. The
//! orchestrator treats every acquisition failure as terminal for the current
//! cycle; there is no in-cycle retry.
//!
//! ## Security and privacy notes
//! Sources hand frames to the caller and keep no copy; the spool file is the
//! camera daemon's responsibility, not this crate's.

use std::path::PathBuf;
use std::sync::Mutex;

use facemark_core::CapturedImage;
use thiserror::Error;

/// Trait implemented by concrete image acquisition providers.
pub trait ImageSource: Send + Sync {
    /// Captures one new image.
    ///
    /// # Errors
    /// Returns [`CaptureError::Unavailable`] when the device cannot produce
    /// a frame (busy, permission denied, spool missing) and
    /// [`CaptureError::InvalidImage`] when the produced bytes are not JPEG.
    fn acquire(&self, captured_at_ms: u64) -> Result<CapturedImage, CaptureError>;
}

/// Image source reading the newest frame from a camera spool path.
///
/// # Notes
/// The path is re-read on every acquire call so the source always observes
/// the most recent frame written by the camera daemon.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    /// Creates a source for the given spool path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the configured spool path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ImageSource for FileImageSource {
    fn acquire(&self, captured_at_ms: u64) -> Result<CapturedImage, CaptureError> {
        let bytes = std::fs::read(&self.path).map_err(|error| {
            CaptureError::Unavailable(format!(
                "cannot read capture spool '{}': {error}",
                self.path.display()
            ))
        })?;

        CapturedImage::new(bytes, captured_at_ms)
            .map_err(|error| CaptureError::InvalidImage(error.to_string()))
    }
}

/// Deterministic synthetic source for test and CI usage.
#[derive(Debug)]
pub struct SyntheticImageSource {
    sequence: Mutex<u64>,
    fail_after: Option<u64>,
}

impl SyntheticImageSource {
    /// Creates a source that always yields a frame.
    pub fn new() -> Self {
        Self {
            sequence: Mutex::new(0),
            fail_after: None,
        }
    }

    /// Creates a source that fails with [`CaptureError::Unavailable`] once
    /// `successes` frames have been produced.
    pub fn failing_after(successes: u64) -> Self {
        Self {
            sequence: Mutex::new(0),
            fail_after: Some(successes),
        }
    }

    /// Returns how many frames this source has produced.
    pub fn produced(&self) -> u64 {
        self.sequence.lock().map(|sequence| *sequence).unwrap_or(0)
    }
}

impl Default for SyntheticImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for SyntheticImageSource {
    fn acquire(&self, captured_at_ms: u64) -> Result<CapturedImage, CaptureError> {
        let mut sequence = self
            .sequence
            .lock()
            .map_err(|_| CaptureError::Unavailable("synthetic sequence lock poisoned".to_string()))?;

        if let Some(limit) = self.fail_after
            && *sequence >= limit
        {
            return Err(CaptureError::Unavailable(
                "synthetic device is scripted to be busy".to_string(),
            ));
        }

        *sequence += 1;
        let marker = (*sequence % 255) as u8;
        // Minimal JPEG-framed buffer: SOI, one marker byte of payload, EOI.
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, marker, 0xFF, 0xD9];

        CapturedImage::new(bytes, captured_at_ms)
            .map_err(|error| CaptureError::InvalidImage(error.to_string()))
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Device cannot produce a frame right now (busy, permission, missing
    /// spool).
    #[error("image source unavailable: {0}")]
    Unavailable(String),
    /// Source produced bytes that are not a valid JPEG stream.
    #[error("image source produced invalid image data: {0}")]
    InvalidImage(String),
}

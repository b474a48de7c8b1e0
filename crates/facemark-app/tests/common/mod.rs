//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use facemark_capture::{CaptureError, ImageSource};
use facemark_core::CapturedImage;
use facemark_engine::{CycleRunner, ResultSink};
use facemark_session::SessionStore;
use facemark_transport::{
    ApiRequest, ApiTransport, AttendanceClient, RawResponse, SubmitTask, TransportError,
};

/// Creates a deterministic JPEG-framed capture fixture.
#[allow(dead_code)]
pub fn fixture_image() -> CapturedImage {
    CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x2A, 0xFF, 0xD9], 1_000)
        .expect("image fixture should be valid")
}

/// Transport double that replies with one canned response, optionally after
/// a delay, and records every request it executes.
pub struct ScriptedTransport {
    status: u16,
    body: String,
    delay: Option<Duration>,
    refuse: bool,
    requests: Mutex<Vec<ApiRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Replies immediately with the given status and body.
    pub fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            delay: None,
            refuse: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Replies with the given status and body after `delay`.
    pub fn replying_after(delay: Duration, status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            delay: Some(delay),
            refuse: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Simulates a connection-level failure on every request.
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            status: 0,
            body: String::new(),
            delay: None,
            refuse: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Returns the requests executed so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .expect("request log lock should work")
            .clone()
    }

    /// Returns how many requests were executed.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .expect("request log lock should work")
            .len()
    }
}

impl ApiTransport for ScriptedTransport {
    fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .expect("request log lock should work")
            .push(request.clone());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.refuse {
            return Err(TransportError::Network("connection refused".to_string()));
        }

        Ok(RawResponse {
            status: self.status,
            body: self.body.clone().into_bytes(),
        })
    }
}

/// Image source that takes a fixed time to produce each frame.
#[allow(dead_code)]
pub struct DelayedSource {
    delay: Duration,
}

#[allow(dead_code)]
impl DelayedSource {
    /// Creates a source with the given acquisition latency.
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

impl ImageSource for DelayedSource {
    fn acquire(&self, captured_at_ms: u64) -> Result<CapturedImage, CaptureError> {
        std::thread::sleep(self.delay);
        CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0xFF, 0xD9], captured_at_ms)
            .map_err(|error| CaptureError::InvalidImage(error.to_string()))
    }
}

/// Wires a cycle runner around the given doubles.
#[allow(dead_code)]
pub fn runner_with(
    transport: Arc<dyn ApiTransport>,
    source: Arc<dyn ImageSource>,
    task: SubmitTask,
) -> Arc<CycleRunner> {
    runner_with_session(transport, source, task, SessionStore::new())
}

/// Wires a cycle runner with an explicit session store.
#[allow(dead_code)]
pub fn runner_with_session(
    transport: Arc<dyn ApiTransport>,
    source: Arc<dyn ImageSource>,
    task: SubmitTask,
    session: SessionStore,
) -> Arc<CycleRunner> {
    let client = AttendanceClient::new("http://attendance.example.test", transport)
        .expect("client fixture should build");

    Arc::new(CycleRunner::new(
        source,
        client,
        session,
        ResultSink::new(),
        task,
    ))
}

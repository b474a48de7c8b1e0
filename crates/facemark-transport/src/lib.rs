#![warn(missing_docs)]
//! # facemark-transport
//!
//! ## Purpose
//! Implements the transport adapter between the capture loop and the remote
//! recognition service.
//!
//! ## Responsibilities
//! - Build multipart submit requests and bearer-authenticated reads.
//! - Execute requests through an injectable transport abstraction.
//! - Classify raw responses into the typed [`facemark_core::Outcome`].
//! - Decode the read-side payloads (attendance feed, courses, categories).
//!
//! ## Data flow
//! Cycle orchestrator hands a captured image to [`AttendanceClient::submit`]
//! -> request built and executed through [`ApiTransport`] -> raw response
//! classified by [`classify_response`] -> outcome returned to the caller.
//! The adapter never touches result state; classification stays separable
//! from state mutation and testable in isolation.
//!
//! ## Ownership and lifetimes
//! Requests own their field and image buffers so transports can execute them
//! without borrowing from the in-flight capture attempt.
//!
//! ## Error model
//! Submit paths fold every failure into the outcome taxonomy (transport
//! failure, rejection, parse failure). Read paths return [`ApiError`] for
//! caller-visible handling. No call is retried; delivery is at-most-once.
//!
//! ## Security and privacy notes
//! Image bytes are never logged; log lines carry a content digest instead.
//! Bearer tokens are attached to requests and never written to the log.

use std::sync::Arc;
use std::time::Duration;

use facemark_core::{CapturedImage, GENERIC_REJECTION_MESSAGE, Outcome};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Submit endpoint for attendance marking.
pub const ATTENDANCE_MARK_PATH: &str = "/api/attendance/mark";
/// Submit endpoint for subject registration.
pub const STUDENTS_CREATE_PATH: &str = "/api/students/create";
/// Submit endpoint for face-based session start.
pub const FACE_AUTH_PATH: &str = "/api/auth/face-auth";
/// Read endpoint for the attendance feed.
pub const ATTENDANCE_LIST_PATH: &str = "/api/attendance/";
/// Read endpoint for courses.
pub const COURSE_LIST_PATH: &str = "/api/course/";
/// Read endpoint for categories.
pub const CATEGORY_LIST_PATH: &str = "/api/category/";

/// MIME type attached to uploaded image parts.
pub const JPEG_MIME: &str = "image/jpeg";

/// Default bounded wait for one HTTP request.
///
/// The remote service documents no timeout contract; an unbounded wait would
/// let a hung connection occupy the capture gate forever, so the transport
/// always carries an explicit bound.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One multipart image part ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    /// File name reported in the multipart disposition.
    pub file_name: String,
    /// Raw JPEG bytes.
    pub bytes: Vec<u8>,
}

/// Fully resolved request handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// Multipart POST carrying text fields and an optional image.
    Submit {
        /// Absolute request URL.
        url: String,
        /// Text fields in declaration order.
        fields: Vec<(String, String)>,
        /// Optional image part under the `image` field name.
        image: Option<ImagePart>,
        /// Optional bearer token.
        bearer: Option<String>,
    },
    /// Plain GET with optional bearer token.
    Fetch {
        /// Absolute request URL.
        url: String,
        /// Optional bearer token.
        bearer: Option<String>,
    },
}

/// Raw transport-level response before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Unparsed response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Returns `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait implemented by concrete request executors.
pub trait ApiTransport: Send + Sync {
    /// Executes one request and returns the raw response.
    ///
    /// # Errors
    /// Returns [`TransportError`] when no usable response was produced
    /// (connection refused, DNS, timeout, request assembly failure).
    fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Submit operation selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTask {
    /// Mark attendance for whoever the captured face resolves to.
    MarkAttendance,
    /// Register a new subject under the given name.
    RegisterSubject {
        /// Subject display name.
        name: String,
    },
}

impl SubmitTask {
    fn path(&self) -> &'static str {
        match self {
            SubmitTask::MarkAttendance => ATTENDANCE_MARK_PATH,
            SubmitTask::RegisterSubject { .. } => STUDENTS_CREATE_PATH,
        }
    }

    fn image_file_name(&self) -> &'static str {
        match self {
            SubmitTask::MarkAttendance => "captured_image.jpg",
            SubmitTask::RegisterSubject { .. } => "student_image.jpg",
        }
    }

    fn fields(&self) -> Vec<(String, String)> {
        match self {
            SubmitTask::MarkAttendance => Vec::new(),
            SubmitTask::RegisterSubject { name } => {
                vec![("name".to_string(), name.clone())]
            }
        }
    }
}

/// Server status payload shared by submit endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusMessage {
    /// Human-readable status line.
    pub message: String,
}

/// Face-auth success payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaceAuthResponse {
    /// Human-readable status line.
    pub message: String,
    /// Session token for bearer-authenticated reads.
    pub token: String,
}

/// One record in the attendance feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttendanceRecord {
    /// Server-assigned record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Recognized subject, absent for orphaned records.
    #[serde(default)]
    pub student: Option<StudentRef>,
    /// Attendance timestamp as reported by the server.
    pub date: String,
}

/// Subject reference embedded in feed records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentRef {
    /// Subject display name.
    pub name: String,
    /// Server-side path of the enrollment image.
    #[serde(rename = "imagePath")]
    pub image_path: String,
}

// The deployed server spells the feed key "attendace"; accept both.
#[derive(Debug, Deserialize)]
struct AttendanceFeed {
    #[serde(alias = "attendace")]
    attendance: Vec<AttendanceRecord>,
}

/// One course entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Course {
    /// Server-assigned course id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Course title.
    pub title: String,
    /// Course description.
    #[serde(default)]
    pub description: String,
    /// Category reference, either populated or by id.
    pub category: CategoryRef,
    /// Creation timestamp as reported by the server.
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

/// Category reference as delivered by the server: populated or id-only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    /// Populated category object.
    Inline(Category),
    /// Bare category id.
    Id(String),
}

impl CategoryRef {
    /// Returns the category id regardless of representation.
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Inline(category) => &category.id,
            CategoryRef::Id(id) => id,
        }
    }
}

/// One category entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    /// Server-assigned category id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Category display name.
    pub name: String,
}

/// Classifies a raw response into the outcome taxonomy.
///
/// Priority order:
/// 1. Failure status with a parseable `{message}` body -> rejection carrying
///    the server message.
/// 2. Failure status with an unparseable body -> generic rejection.
/// 3. Success status with an unparseable body -> parse failure (the body was
///    expected to be well-formed; decode detail is logged, the user-facing
///    message stays generic).
/// 4. Success status with a parseable body -> success carrying the server
///    message.
///
/// Transport-level failures never reach this function; the caller maps them
/// to [`Outcome::TransportError`] before classification.
pub fn classify_response(response: &RawResponse) -> Outcome {
    match serde_json::from_slice::<StatusMessage>(&response.body) {
        Ok(parsed) if response.is_success() => Outcome::Success(parsed.message),
        Ok(parsed) => Outcome::Rejected(parsed.message),
        Err(decode) if response.is_success() => {
            log::warn!(
                "transport/parse_failure status={} decode_error={decode}",
                response.status
            );
            Outcome::ParseError
        }
        Err(_) => Outcome::Rejected(GENERIC_REJECTION_MESSAGE.to_string()),
    }
}

/// Returns the hex sha256 digest of an image for log correlation.
pub fn image_digest(image: &CapturedImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&image.bytes);
    hex::encode(hasher.finalize())
}

/// Client for the remote attendance service.
#[derive(Clone)]
pub struct AttendanceClient {
    base: Url,
    transport: Arc<dyn ApiTransport>,
}

impl AttendanceClient {
    /// Creates a validated client.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidBaseUrl`] when the base URL is not an
    /// absolute http/https URL.
    pub fn new(
        base_url: impl AsRef<str>,
        transport: Arc<dyn ApiTransport>,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.as_ref())
            .map_err(|error| ApiError::InvalidBaseUrl(format!("invalid base url: {error}")))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ApiError::InvalidBaseUrl(
                "base url must use http or https".to_string(),
            ));
        }
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(
                "base url cannot serve as a request base".to_string(),
            ));
        }

        Ok(Self { base, transport })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Submits one capture and classifies the result.
    ///
    /// Never fails at the call boundary: transport-level failures fold into
    /// [`Outcome::TransportError`] so every submission resolves to exactly
    /// one outcome.
    pub fn submit(
        &self,
        task: &SubmitTask,
        image: Option<&CapturedImage>,
        bearer: Option<&str>,
    ) -> Outcome {
        let url = match self.endpoint(task.path()) {
            Ok(url) => url,
            Err(error) => return Outcome::TransportError(error.to_string()),
        };

        let request = ApiRequest::Submit {
            url,
            fields: task.fields(),
            image: image.map(|image| ImagePart {
                file_name: task.image_file_name().to_string(),
                bytes: image.bytes.clone(),
            }),
            bearer: bearer.map(str::to_string),
        };

        match self.transport.execute(&request) {
            Ok(response) => classify_response(&response),
            Err(error) => {
                log::warn!("transport/submit_failed path={} reason={error}", task.path());
                Outcome::TransportError(error.to_string())
            }
        }
    }

    /// Starts a face-based session.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidRequest`] for a blank name,
    /// [`ApiError::Transport`] when no response was produced,
    /// [`ApiError::Rejected`] for failure statuses, [`ApiError::Decode`] for
    /// malformed success bodies, and [`ApiError::InvalidResponse`] when the
    /// body lacks a usable token.
    pub fn face_login(
        &self,
        name: &str,
        image: &CapturedImage,
    ) -> Result<FaceAuthResponse, ApiError> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("name must be non-empty".to_string()));
        }

        let request = ApiRequest::Submit {
            url: self.endpoint(FACE_AUTH_PATH)?,
            fields: vec![("name".to_string(), name.to_string())],
            image: Some(ImagePart {
                file_name: "captured_image.jpg".to_string(),
                bytes: image.bytes.clone(),
            }),
            bearer: None,
        };

        let response = self.transport.execute(&request)?;
        if !response.is_success() {
            return Err(ApiError::Rejected {
                status: response.status,
                message: rejection_message(&response),
            });
        }

        let parsed: FaceAuthResponse = serde_json::from_slice(&response.body)?;
        if parsed.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "face-auth response is missing a session token".to_string(),
            ));
        }
        Ok(parsed)
    }

    /// Fetches the attendance feed.
    ///
    /// # Errors
    /// Returns [`ApiError`] for transport, status, or decode failures.
    pub fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, ApiError> {
        let feed: AttendanceFeed = self.fetch(ATTENDANCE_LIST_PATH, None)?;
        Ok(feed.attendance)
    }

    /// Fetches all courses with a bearer token.
    ///
    /// # Errors
    /// Returns [`ApiError`] for transport, status, or decode failures.
    pub fn list_courses(&self, bearer: &str) -> Result<Vec<Course>, ApiError> {
        self.fetch(COURSE_LIST_PATH, Some(bearer))
    }

    /// Fetches all categories with a bearer token.
    ///
    /// # Errors
    /// Returns [`ApiError`] for transport, status, or decode failures.
    pub fn list_categories(&self, bearer: &str) -> Result<Vec<Category>, ApiError> {
        self.fetch(CATEGORY_LIST_PATH, Some(bearer))
    }

    fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::Fetch {
            url: self.endpoint(path)?,
            bearer: bearer.map(str::to_string),
        };

        let response = self.transport.execute(&request)?;
        if !response.is_success() {
            return Err(ApiError::Rejected {
                status: response.status,
                message: rejection_message(&response),
            });
        }

        Ok(serde_json::from_slice(&response.body)?)
    }

    fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        self.base
            .join(path)
            .map(|url| url.to_string())
            .map_err(|error| ApiError::InvalidBaseUrl(format!("cannot resolve '{path}': {error}")))
    }
}

fn rejection_message(response: &RawResponse) -> String {
    serde_json::from_slice::<StatusMessage>(&response.body)
        .map(|parsed| parsed.message)
        .unwrap_or_else(|_| GENERIC_REJECTION_MESSAGE.to_string())
}

/// Blocking HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport with the default bounded timeout.
    ///
    /// # Errors
    /// Returns [`TransportError::Setup`] when the underlying client cannot
    /// be constructed.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a transport with an explicit request timeout.
    ///
    /// # Errors
    /// Returns [`TransportError::Setup`] when the underlying client cannot
    /// be constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| TransportError::Setup(error.to_string()))?;
        Ok(Self { client })
    }
}

impl ApiTransport for HttpTransport {
    fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        match request {
            ApiRequest::Submit {
                url,
                fields,
                image,
                bearer,
            } => {
                let mut form = reqwest::blocking::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                if let Some(image) = image {
                    let part = reqwest::blocking::multipart::Part::bytes(image.bytes.clone())
                        .file_name(image.file_name.clone())
                        .mime_str(JPEG_MIME)
                        .map_err(|error| TransportError::Request(error.to_string()))?;
                    form = form.part("image", part);
                }

                let mut builder = self.client.post(url.as_str()).multipart(form);
                if let Some(bearer) = bearer {
                    builder = builder.bearer_auth(bearer);
                }

                read_response(builder.send())
            }
            ApiRequest::Fetch { url, bearer } => {
                let mut builder = self.client.get(url.as_str());
                if let Some(bearer) = bearer {
                    builder = builder.bearer_auth(bearer);
                }

                read_response(builder.send())
            }
        }
    }
}

fn read_response(
    sent: Result<reqwest::blocking::Response, reqwest::Error>,
) -> Result<RawResponse, TransportError> {
    let response = sent.map_err(|error| TransportError::Network(error.to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .map_err(|error| TransportError::Network(error.to_string()))?
        .to_vec();

    Ok(RawResponse { status, body })
}

/// Transport-level failures that produced no usable response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client construction failed.
    #[error("transport setup failure: {0}")]
    Setup(String),
    /// Request could not be assembled.
    #[error("request assembly failure: {0}")]
    Request(String),
    /// Connection, DNS, timeout, or body-read failure.
    #[error("network failure: {0}")]
    Network(String),
}

/// Errors surfaced by the typed read and login paths.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configured base URL violates client requirements.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    /// Request inputs violate endpoint requirements.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Transport failure before any response arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Server returned a failure status.
    #[error("server rejected request with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server message or the generic fallback.
        message: String,
    },
    /// Success status with an undecodable body.
    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Decoded payload violates the response contract.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

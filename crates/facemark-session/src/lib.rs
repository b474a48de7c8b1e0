#![warn(missing_docs)]
//! # facemark-session
//!
//! ## Purpose
//! Holds session state for one run of the client as an explicit, injected
//! collaborator.
//!
//! ## Responsibilities
//! - Model the signed-out/signed-in lifecycle of a face-auth session.
//! - Convert face-auth responses into validated session grants.
//! - Expose the bearer token to transport callers without ambient globals.
//!
//! ## Data flow
//! Face-auth response -> [`SessionGrant::from_face_auth`] ->
//! [`SessionStore::sign_in`] -> orchestration and read paths query
//! [`SessionStore::bearer`].
//!
//! ## Ownership and lifetimes
//! [`SessionStore`] is a cheap clone over shared interior state so the
//! orchestrator, scheduler, and presentation wiring can all hold a handle
//! constructed once at startup. Nothing outlives the process; there is no
//! persisted session.
//!
//! ## Error model
//! Grant validation failures return [`SessionError`].
//!
//! ## Security and privacy notes
//! Tokens are held in memory only and are never included in `Debug` output
//! or log lines.

use std::sync::{Arc, Mutex};

use facemark_transport::FaceAuthResponse;
use thiserror::Error;

/// Validated face-auth session grant.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// Subject name the session was opened for.
    pub subject: String,
    /// Server status line from the face-auth response.
    pub message: String,
    token: String,
}

impl SessionGrant {
    /// Builds a grant from a face-auth response.
    ///
    /// # Errors
    /// Returns [`SessionError::BlankSubject`] or [`SessionError::BlankToken`]
    /// when either value is empty after trimming.
    pub fn from_face_auth(
        subject: impl Into<String>,
        response: FaceAuthResponse,
    ) -> Result<Self, SessionError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(SessionError::BlankSubject);
        }
        if response.token.trim().is_empty() {
            return Err(SessionError::BlankToken);
        }

        Ok(Self {
            subject,
            message: response.message,
            token: response.token,
        })
    }

    /// Returns the bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for SessionGrant {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SessionGrant")
            .field("subject", &self.subject)
            .field("message", &self.message)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session is open.
    #[default]
    SignedOut,
    /// A face-auth session is open.
    SignedIn(SessionGrant),
}

/// Shared handle over the session state.
///
/// Replaces the source system's process-wide key-value store: every consumer
/// receives this handle at construction instead of reading ambient state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: Arc<Mutex<SessionState>>,
}

impl SessionStore {
    /// Creates a signed-out store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session from a validated grant.
    pub fn sign_in(&self, grant: SessionGrant) {
        if let Ok(mut state) = self.state.lock() {
            *state = SessionState::SignedIn(grant);
        }
    }

    /// Closes the current session.
    pub fn sign_out(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = SessionState::SignedOut;
        }
    }

    /// Returns `true` when a session is open.
    pub fn is_signed_in(&self) -> bool {
        matches!(self.snapshot(), SessionState::SignedIn(_))
    }

    /// Returns the bearer token for an open session.
    pub fn bearer(&self) -> Option<String> {
        match self.snapshot() {
            SessionState::SignedIn(grant) => Some(grant.token().to_string()),
            SessionState::SignedOut => None,
        }
    }

    /// Returns the subject name for an open session.
    pub fn subject(&self) -> Option<String> {
        match self.snapshot() {
            SessionState::SignedIn(grant) => Some(grant.subject),
            SessionState::SignedOut => None,
        }
    }

    /// Returns a clone of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

/// Errors produced by session grant validation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Subject name is blank.
    #[error("session subject must be non-empty")]
    BlankSubject,
    /// Face-auth token is blank.
    #[error("session token must be non-empty")]
    BlankToken,
}

#[cfg(test)]
mod tests {
    //! Unit tests for grant validation and store lifecycle.

    use super::*;

    fn grant_fixture() -> SessionGrant {
        SessionGrant::from_face_auth(
            "Ada",
            FaceAuthResponse {
                message: "welcome".to_string(),
                token: "token-1".to_string(),
            },
        )
        .expect("grant fixture should validate")
    }

    #[test]
    fn grant_requires_subject_and_token() {
        let missing_token = SessionGrant::from_face_auth(
            "Ada",
            FaceAuthResponse {
                message: "welcome".to_string(),
                token: "  ".to_string(),
            },
        );
        assert!(matches!(missing_token, Err(SessionError::BlankToken)));

        let missing_subject = SessionGrant::from_face_auth(
            " ",
            FaceAuthResponse {
                message: "welcome".to_string(),
                token: "token-1".to_string(),
            },
        );
        assert!(matches!(missing_subject, Err(SessionError::BlankSubject)));
    }

    #[test]
    fn store_round_trips_sign_in_and_out() {
        let store = SessionStore::new();
        assert!(!store.is_signed_in());
        assert!(store.bearer().is_none());

        store.sign_in(grant_fixture());
        assert!(store.is_signed_in());
        assert_eq!(store.bearer().as_deref(), Some("token-1"));
        assert_eq!(store.subject().as_deref(), Some("Ada"));

        store.sign_out();
        assert!(store.bearer().is_none());
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", grant_fixture());
        assert!(!rendered.contains("token-1"));
        assert!(rendered.contains("<redacted>"));
    }
}

#![warn(missing_docs)]
//! # facemark-ui
//!
//! ## Purpose
//! Defines the presentation-facing read models for `facemark`.
//!
//! ## Responsibilities
//! - Project orchestration outputs (latest message, latest image, in-flight
//!   indicator) into a render-ready snapshot.
//! - Validate registration form input before a submit is attempted.
//! - Provide course/category display helpers.
//!
//! ## Data flow
//! Engine state snapshots flow into [`project_status`]; the rendered shell
//! reads the resulting [`StatusView`]. Rendering itself lives outside this
//! workspace.
//!
//! ## Ownership and lifetimes
//! Views own their values so renderers never borrow from live engine state.
//!
//! ## Error model
//! Form validation returns [`RegistrationError`]; projection itself cannot
//! fail.

use facemark_core::ResultState;
use facemark_transport::{Category, Course};
use thiserror::Error;

/// Fallback label for a course whose category cannot be resolved.
pub const UNKNOWN_CATEGORY_LABEL: &str = "Unknown Category";

/// Render-ready snapshot of the capture loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    /// Latest status message, if any attempt has completed.
    pub message: Option<String>,
    /// Whether a capture-submit cycle is currently in flight.
    pub in_flight: bool,
    /// Whether a preview image is available.
    pub has_image: bool,
    /// Number of completed attempts this session.
    pub attempts: u64,
}

/// Projects engine state into a render-ready snapshot.
pub fn project_status(state: &ResultState, in_flight: bool) -> StatusView {
    StatusView {
        message: state.last_message.clone(),
        in_flight,
        has_image: state.last_image.is_some(),
        attempts: state.completed_attempts,
    }
}

/// Validates registration form input.
///
/// The image is optional; the server enrolls the subject without a photo
/// when none is supplied.
///
/// # Errors
/// Returns [`RegistrationError::BlankName`] for a blank name.
pub fn validate_registration(name: &str) -> Result<(), RegistrationError> {
    if name.trim().is_empty() {
        return Err(RegistrationError::BlankName);
    }
    Ok(())
}

/// Toggles a category selection: choosing the active category clears it.
pub fn toggle_category(current: Option<&str>, chosen: &str) -> Option<String> {
    match current {
        Some(active) if active == chosen => None,
        _ => Some(chosen.to_string()),
    }
}

/// Filters courses by the selected category id; no selection means all.
pub fn filter_courses(courses: &[Course], selected: Option<&str>) -> Vec<Course> {
    match selected {
        None => courses.to_vec(),
        Some(category_id) => courses
            .iter()
            .filter(|course| course.category.id() == category_id)
            .cloned()
            .collect(),
    }
}

/// Resolves a course's category display name.
///
/// Falls back to [`UNKNOWN_CATEGORY_LABEL`] for a dangling reference.
pub fn category_label(course: &Course, categories: &[Category]) -> String {
    match &course.category {
        facemark_transport::CategoryRef::Inline(category) => category.name.clone(),
        facemark_transport::CategoryRef::Id(id) => categories
            .iter()
            .find(|category| &category.id == id)
            .map(|category| category.name.clone())
            .unwrap_or_else(|| UNKNOWN_CATEGORY_LABEL.to_string()),
    }
}

/// Registration form validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Name field is blank.
    #[error("Please enter a name")]
    BlankName,
}

//! Submission errors.
//!
//! Every variant's display text is the message published in
//! [`SubmitState::Error`](crate::models::SubmitState::Error), so callers can
//! show it as-is.

use thiserror::Error;

/// Fallback message when a collaborator fails without saying why.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("User not logged in.")]
    NotAuthenticated,

    #[error("Please select an image.")]
    MissingImage,

    /// The local image could not be read (stale or unreadable reference).
    #[error("{0}")]
    ImageRead(String),

    #[error("{0}")]
    Upload(String),

    #[error("{0}")]
    Insert(String),

    /// A submission is already in flight on this controller.
    #[error("A submission is already in progress.")]
    AlreadySubmitting,

    /// The submit future was dropped before the upload and insert finished.
    #[error("Submission cancelled.")]
    Cancelled,
}

impl SubmitError {
    pub(crate) fn image_read(err: &anyhow::Error) -> Self {
        SubmitError::ImageRead(failure_message(err))
    }

    pub(crate) fn upload(err: &anyhow::Error) -> Self {
        SubmitError::Upload(failure_message(err))
    }

    pub(crate) fn insert(err: &anyhow::Error) -> Self {
        SubmitError::Insert(failure_message(err))
    }
}

/// Full context chain of a collaborator error, or [`UNKNOWN_ERROR`] if empty.
fn failure_message(err: &anyhow::Error) -> String {
    let message = format!("{:#}", err);
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

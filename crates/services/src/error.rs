//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::LectureId;

/// Errors reported by a player embed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("player capability is not available yet")]
    Unavailable,
    #[error("player has been disposed")]
    Disposed,
    #[error("player failed to load lecture {lecture}: {reason}")]
    LoadFailed { lecture: LectureId, reason: String },
}

/// Errors emitted by `ProgressTrackingEngine`.
///
/// Only invalid input is reported; sampling and storage faults are absorbed
/// by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("lecture not found in catalog: {0}")]
    NotFound(LectureId),
    #[error(transparent)]
    Player(#[from] PlayerError),
}

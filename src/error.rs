//! Error types for the tracker.

use thiserror::Error;

/// Errors surfaced by [`SortTracker`](crate::SortTracker) and its components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// A detection in the frame failed validation; the frame was not applied.
    #[error("invalid detection at index {index}: {reason}")]
    InvalidDetection { index: usize, reason: String },

    /// Tracker configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cost matrix handed to the solver contains a non-finite entry.
    #[error("non-finite cost at ({row}, {col})")]
    NonFiniteCost { row: usize, col: usize },

    /// The assignment solver failed on a well-formed cost matrix.
    #[error("assignment failed: {0}")]
    Assignment(String),

    /// The innovation covariance of a track could not be inverted.
    #[error("singular innovation covariance for track {track_id}")]
    SingularCovariance { track_id: u64 },

    /// The per-session frame counter is exhausted; call `reset` to continue.
    #[error("frame counter overflow")]
    FrameCountOverflow,
}

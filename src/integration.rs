//! Helpers for the caller side of the tracker.
//!
//! The tracker only consumes per-frame detections. This module provides a
//! builder for detections in the common box layouts and a trait plus pipeline
//! for plugging an external detector in front of [`SortTracker`](crate::SortTracker).

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::DetectionSource;
pub use pipeline::{PipelineError, TrackerPipeline};

//! SORT (Simple Online and Realtime Tracking) for bounding-box detections.
//!
//! Each call to [`SortTracker::update`] takes one frame of detections, predicts
//! every live track with a constant-velocity Kalman filter, associates
//! predictions and detections by IoU with an optimal assignment, and returns the
//! tracks that are established enough to report.
//!
//! ```
//! use sort_rs::{Detection, SortTracker, TrackerConfig};
//!
//! let mut tracker = SortTracker::new(TrackerConfig::default())?;
//! let tracks = tracker.update(&[Detection::new(0.0, 0.0, 10.0, 10.0, 0.9)])?;
//! assert_eq!(tracks[0].track_id, 1);
//! # Ok::<(), sort_rs::TrackerError>(())
//! ```

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::TrackerError;
pub use integration::{DetectionBuilder, DetectionSource, PipelineError, TrackerPipeline};
pub use tracker::*;

mod kalman_filter;
mod matching;
mod rect;
mod sort_tracker;
mod track;
mod track_state;

pub use kalman_filter::{KalmanFilter, Measurement, StateCovariance, StateMean};
pub use matching::{
    AssignmentResult, AssignmentSolver, Detection, LapJvSolver, iou_distance, linear_assignment,
};
pub use rect::{BoxFormat, Rect, iou_batch};
pub use sort_tracker::{SortTracker, TrackedObject, TrackerConfig};
pub use track::Track;
pub use track_state::TrackState;

//! Single object track for multi-object tracking.

use crate::error::TrackerError;
use crate::tracker::kalman_filter::{KalmanFilter, StateCovariance, StateMean};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Single object track.
///
/// Owns its motion estimate; the filter model itself is shared and stateless.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub track_id: u64,
    /// Current lifecycle state
    pub state: TrackState,
    /// Whether the track has been confirmed at least once
    pub is_activated: bool,
    /// Frames since creation
    pub age: u32,
    /// Total number of matches
    pub hits: u32,
    /// Consecutive frames matched, reset by any miss
    pub hit_streak: u32,
    /// Consecutive frames without a match
    pub time_since_update: u32,
    /// Kalman filter state mean (7-dim)
    mean: StateMean,
    /// Kalman filter state covariance (7x7)
    covariance: StateCovariance,
}

impl Track {
    /// Start a new track from an unmatched detection.
    pub fn new(
        track_id: u64,
        detection: &Detection,
        kalman_filter: &KalmanFilter,
        min_hits: u32,
    ) -> Self {
        let (mean, covariance) = kalman_filter.initiate(detection.bbox.to_xysr());
        let is_activated = min_hits == 0;
        let state = if is_activated {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        };

        Self {
            track_id,
            state,
            is_activated,
            age: 0,
            hits: 0,
            hit_streak: 0,
            time_since_update: 0,
            mean,
            covariance,
        }
    }

    /// Current best estimate of the box, without touching the state.
    pub fn bbox(&self) -> Rect {
        Rect::from_xysr(self.mean[0], self.mean[1], self.mean[2], self.mean[3])
    }

    pub fn mean(&self) -> &StateMean {
        &self.mean
    }

    pub fn covariance(&self) -> &StateCovariance {
        &self.covariance
    }

    /// Advance the estimate one frame and return the predicted box.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) -> Rect {
        let (mean, covariance) = kalman_filter.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.age += 1;
        self.bbox()
    }

    /// Correct the estimate with a matched detection.
    pub fn update(
        &mut self,
        detection: &Detection,
        kalman_filter: &KalmanFilter,
        min_hits: u32,
    ) -> Result<(), TrackerError> {
        let (mean, covariance) = kalman_filter
            .update(&self.mean, &self.covariance, detection.bbox.to_xysr())
            .ok_or(TrackerError::SingularCovariance {
                track_id: self.track_id,
            })?;
        self.mean = mean;
        self.covariance = covariance;

        self.hits += 1;
        self.hit_streak += 1;
        self.time_since_update = 0;
        if self.hit_streak >= min_hits {
            self.state = TrackState::Confirmed;
            self.is_activated = true;
        } else {
            self.state = TrackState::Tentative;
        }
        Ok(())
    }

    /// Record a frame without a matching detection.
    pub fn mark_missed(&mut self, max_age: u32) {
        self.hit_streak = 0;
        self.time_since_update += 1;
        self.state = if self.time_since_update > max_age {
            TrackState::Dead
        } else {
            TrackState::Coasting
        };
    }

    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_new_track_has_zero_velocity() {
        let kf = KalmanFilter::default();
        let det = Detection::new(0.0, 0.0, 10.0, 20.0, 0.9);
        let track = Track::new(7, &det, &kf, 3);

        assert_eq!(track.track_id, 7);
        assert_eq!(track.state, TrackState::Tentative);
        assert_eq!(track.mean()[4], 0.0);
        assert_eq!(track.mean()[5], 0.0);
        assert_eq!(track.mean()[6], 0.0);
        assert_eq!(track.bbox().to_tlbr(), [0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_stationary_prediction_keeps_box() {
        let kf = KalmanFilter::default();
        let det = Detection::new(0.0, 0.0, 10.0, 10.0, 0.9);
        let mut track = Track::new(1, &det, &kf, 3);

        let predicted = track.predict(&kf);
        assert_abs_diff_eq!(predicted.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(predicted.width, 10.0, epsilon = 1e-4);
        assert_eq!(track.age, 1);
    }

    #[test]
    fn test_update_promotes_after_min_hits() {
        let kf = KalmanFilter::default();
        let det = Detection::new(0.0, 0.0, 10.0, 10.0, 0.9);
        let mut track = Track::new(1, &det, &kf, 2);

        for _ in 0..2 {
            track.predict(&kf);
            track.update(&det, &kf, 2).unwrap();
        }
        assert_eq!(track.hit_streak, 2);
        assert_eq!(track.hits, 2);
        assert_eq!(track.state, TrackState::Confirmed);
        assert!(track.is_activated);
        assert!(track.covariance()[(0, 0)] < 10.0);
    }

    #[test]
    fn test_mark_missed_coasts_then_dies() {
        let kf = KalmanFilter::default();
        let det = Detection::new(0.0, 0.0, 10.0, 10.0, 0.9);
        let mut track = Track::new(1, &det, &kf, 1);
        track.predict(&kf);
        track.update(&det, &kf, 1).unwrap();

        track.mark_missed(1);
        assert_eq!(track.state, TrackState::Coasting);
        assert_eq!(track.hit_streak, 0);
        assert!(track.is_alive());
        assert!(track.is_activated);

        track.mark_missed(1);
        assert_eq!(track.state, TrackState::Dead);
        assert!(!track.is_alive());
    }
}

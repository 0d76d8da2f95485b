//! Main SORT algorithm implementation.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::TrackerError;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, AssignmentSolver, Detection, LapJvSolver};
use crate::tracker::rect::{BoxFormat, Rect};
use crate::tracker::track::Track;

/// Configuration for the SortTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a track survives unmatched before it is deleted.
    pub max_age: u32,
    /// Consecutive matches required before a track is first reported.
    pub min_hits: u32,
    /// Minimum IoU for a track/detection pair to count as a match.
    pub iou_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 1,
            min_hits: 3,
            iou_threshold: 0.3,
        }
    }
}

impl TrackerConfig {
    /// Reject an `iou_threshold` outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(TrackerError::InvalidConfig(format!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            )));
        }
        Ok(())
    }
}

/// A track reported for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedObject {
    pub track_id: u64,
    /// Smoothed box estimate
    pub bbox: Rect,
}

impl TrackedObject {
    /// Corners of the box: (x_min, y_min, x_max, y_max).
    pub fn tlbr(&self) -> [f32; 4] {
        self.bbox.to_tlbr()
    }
}

/// Multi-object tracker: Kalman prediction, IoU association and track lifecycle.
///
/// Each instance is an independent tracking session. Frames are applied
/// atomically: if [`SortTracker::update`] returns an error the tracker is left
/// exactly as it was before the call.
pub struct SortTracker<S: AssignmentSolver = LapJvSolver> {
    tracks: BTreeMap<u64, Track>,
    frame_count: u32,
    next_id: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
    solver: S,
}

impl SortTracker<LapJvSolver> {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        Self::with_solver(config, LapJvSolver)
    }
}

impl<S: AssignmentSolver> SortTracker<S> {
    pub fn with_solver(config: TrackerConfig, solver: S) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self {
            tracks: BTreeMap::new(),
            frame_count: 0,
            next_id: 1,
            config,
            kalman_filter: KalmanFilter::default(),
            solver,
        })
    }

    /// Replace the motion model, e.g. one built with custom noise levels.
    pub fn with_kalman_filter(mut self, kalman_filter: KalmanFilter) -> Self {
        self.kalman_filter = kalman_filter;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames processed since creation or the last reset.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Number of live tracks, reported or not.
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, track_id: u64) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Live tracks ordered by id.
    pub fn live_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Boxes of live tracks whose hit streak has reached `min_hits`.
    ///
    /// A miss resets the streak, so coasting tracks are left out.
    pub fn tracks(&self, format: BoxFormat) -> Vec<(u64, [f32; 4])> {
        self.tracks
            .values()
            .filter(|t| t.hit_streak >= self.config.min_hits)
            .map(|t| (t.track_id, t.bbox().to_format(format)))
            .collect()
    }

    /// Drop every track and restart id assignment, as a fresh instance would.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.frame_count = 0;
        self.next_id = 1;
    }

    /// Process one frame of detections and return the tracks to report.
    ///
    /// Order within the frame: predict all live tracks, build the cost matrix,
    /// solve the assignment, apply matches and misses, spawn new tracks, prune
    /// dead ones, report.
    pub fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackedObject>, TrackerError> {
        for (index, det) in detections.iter().enumerate() {
            det.validate()
                .map_err(|reason| TrackerError::InvalidDetection {
                    index,
                    reason: reason.to_string(),
                })?;
        }

        let frame_id = self
            .frame_count
            .checked_add(1)
            .ok_or(TrackerError::FrameCountOverflow)?;
        let mut next_id = self.next_id;

        // Step 1: Predict on a working copy so a failed frame leaves no trace
        let mut pool: Vec<Track> = self.tracks.values().cloned().collect();
        let predictions = self.predict_all(&mut pool);

        let mut live = Vec::with_capacity(pool.len());
        let mut pool_rects = Vec::with_capacity(pool.len());
        for (track, rect) in pool.into_iter().zip(predictions) {
            if rect.is_finite() {
                live.push(track);
                pool_rects.push(rect);
            } else {
                warn!(track_id = track.track_id, "dropping track with non-finite prediction");
            }
        }

        // Step 2: Associate detections with predictions
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let dists = matching::iou_distance(&pool_rects, &det_rects);
        let max_cost = 1.0 - self.config.iou_threshold as f64;

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&dists, max_cost, &self.solver)?;

        // Step 3: Apply matches and misses
        for &(itracked, idet) in &matches {
            trace!(
                track_id = live[itracked].track_id,
                detection = idet,
                iou = 1.0 - dists[[itracked, idet]],
                "matched"
            );
            live[itracked].update(&detections[idet], &self.kalman_filter, self.config.min_hits)?;
        }
        for &itracked in &unmatched_tracks {
            live[itracked].mark_missed(self.config.max_age);
        }

        // Step 4: Init new tracks
        for &idet in &unmatched_detections {
            live.push(Track::new(
                next_id,
                &detections[idet],
                &self.kalman_filter,
                self.config.min_hits,
            ));
            next_id += 1;
        }

        // Step 5: Prune and commit
        let before = live.len();
        live.retain(Track::is_alive);
        let removed = before - live.len();

        self.tracks = live.into_iter().map(|t| (t.track_id, t)).collect();
        self.frame_count = frame_id;
        self.next_id = next_id;

        debug!(
            frame = frame_id,
            detections = detections.len(),
            matched = matches.len(),
            spawned = unmatched_detections.len(),
            removed,
            live = self.tracks.len(),
            "frame processed"
        );

        Ok(self.reported())
    }

    fn predict_all(&self, pool: &mut [Track]) -> Vec<Rect> {
        let kalman_filter = &self.kalman_filter;

        #[cfg(feature = "parallel")]
        let predictions = pool
            .par_iter_mut()
            .map(|t| t.predict(kalman_filter))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let predictions = pool.iter_mut().map(|t| t.predict(kalman_filter)).collect();

        predictions
    }

    /// Tracks matched this frame that are established, or any matched track
    /// while the session is still within its first `min_hits` frames.
    fn reported(&self) -> Vec<TrackedObject> {
        let min_hits = self.config.min_hits;
        let warming_up = self.frame_count <= min_hits;
        self.tracks
            .values()
            .filter(|t| t.time_since_update == 0 && (t.hit_streak >= min_hits || warming_up))
            .map(|t| TrackedObject {
                track_id: t.track_id,
                bbox: t.bbox(),
            })
            .collect()
    }
}

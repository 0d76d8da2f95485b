//! TrackerPipeline for combining detection with tracking.

use thiserror::Error;

use crate::error::TrackerError;
use crate::tracker::{SortTracker, TrackedObject, TrackerConfig};

use super::DetectionSource;

/// Failure of one pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
    /// The detector could not produce detections for the frame.
    #[error("detection failed: {0}")]
    Detection(E),
    /// The tracker rejected the frame.
    #[error(transparent)]
    Tracking(#[from] TrackerError),
}

/// A combined tracker that bundles detection inference with SORT.
///
/// This struct provides a convenient way to run end-to-end tracking
/// by combining any `DetectionSource` with the `SortTracker`.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: SortTracker,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self, TrackerError> {
        Ok(Self {
            detector,
            tracker: SortTracker::new(config)?,
        })
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Result<Self, TrackerError> {
        Self::new(detector, TrackerConfig::default())
    }

    /// Process a single frame and return the reported tracks.
    ///
    /// This method runs detection on the input image and then updates
    /// the tracker with the detected objects.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<TrackedObject>, PipelineError<D::Error>> {
        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(PipelineError::Detection)?;
        Ok(self.tracker.update(&detections)?)
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &SortTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut SortTracker {
        &mut self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Detection;

    struct MockDetector {
        detections: Vec<Detection>,
    }

    impl DetectionSource for MockDetector {
        type Error = std::convert::Infallible;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            Ok(self.detections.clone())
        }
    }

    struct FailingDetector;

    impl DetectionSource for FailingDetector {
        type Error = String;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            Err("camera unplugged".to_string())
        }
    }

    #[test]
    fn test_tracker_pipeline() {
        let detector = MockDetector {
            detections: vec![Detection::new(10.0, 20.0, 50.0, 80.0, 0.9)],
        };

        let mut pipeline = TrackerPipeline::with_default_config(detector).unwrap();
        for _ in 0..5 {
            let tracks = pipeline.process_frame(&[], 640, 480).unwrap();
            assert_eq!(tracks.len(), 1);
            assert_eq!(tracks[0].track_id, 1);
        }
        assert_eq!(pipeline.tracker().frame_count(), 5);
    }

    #[test]
    fn test_pipeline_errors() {
        let mut pipeline = TrackerPipeline::with_default_config(FailingDetector).unwrap();
        let err = pipeline.process_frame(&[], 640, 480).unwrap_err();
        assert!(matches!(err, PipelineError::Detection(ref msg) if msg == "camera unplugged"));

        let detector = MockDetector {
            detections: vec![Detection::new(50.0, 20.0, 10.0, 80.0, 0.9)],
        };
        let mut pipeline = TrackerPipeline::with_default_config(detector).unwrap();
        let err = pipeline.process_frame(&[], 640, 480).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Tracking(TrackerError::InvalidDetection { index: 0, .. })
        ));
    }
}

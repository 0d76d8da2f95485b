//! Association between predicted tracks and new detections.

use ndarray::Array2;
use tracing::trace;

use crate::error::TrackerError;
use crate::tracker::rect::{Rect, iou_batch};

/// Cost given to the rows or columns added to square up a rectangular matrix.
const PADDING_COST: f64 = 1e6;

/// Detection input for the tracker.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding box of the detection
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
}

impl Detection {
    /// Create a detection from corner coordinates (x_min, y_min, x_max, y_max).
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self { bbox, score }
    }

    /// Check the geometry before it can reach a motion estimate.
    ///
    /// Zero-sized boxes are accepted; they simply never overlap anything.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.bbox.is_finite() {
            return Err("non-finite coordinate");
        }
        if !self.score.is_finite() {
            return Err("non-finite score");
        }
        if self.bbox.x < 0.0 || self.bbox.y < 0.0 {
            return Err("negative coordinate");
        }
        if self.bbox.width < 0.0 || self.bbox.height < 0.0 {
            return Err("max corner is less than min corner");
        }
        Ok(())
    }
}

impl From<[f32; 5]> for Detection {
    /// `[x_min, y_min, x_max, y_max, score]`
    fn from([x1, y1, x2, y2, score]: [f32; 5]) -> Self {
        Self::new(x1, y1, x2, y2, score)
    }
}

/// Compute the IoU distance (`1 - IoU`) matrix between tracks and detections.
///
/// Entries are always finite and within `[0, 1]`.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f64> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou as f64)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// `(track_index, detection_index)` pairs, ordered by track index
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Optimal one-to-one assignment over a cost matrix.
///
/// Implementations return pairs `(row, col)` with every row and column used at
/// most once, covering `min(rows, cols)` pairs and minimizing the summed cost.
/// The matrix is never empty and all entries are finite when this is called.
pub trait AssignmentSolver {
    fn solve(&self, cost_matrix: &Array2<f64>) -> Result<Vec<(usize, usize)>, TrackerError>;
}

/// Jonker-Volgenant solver backed by the `lapjv` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LapJvSolver;

impl AssignmentSolver for LapJvSolver {
    fn solve(&self, cost_matrix: &Array2<f64>) -> Result<Vec<(usize, usize)>, TrackerError> {
        let (num_rows, num_cols) = cost_matrix.dim();
        let size = num_rows.max(num_cols);
        let mut padded = Array2::<f64>::from_elem((size, size), PADDING_COST);
        padded
            .slice_mut(ndarray::s![..num_rows, ..num_cols])
            .assign(cost_matrix);

        let (row_to_col, _) =
            lapjv::lapjv(&padded).map_err(|e| TrackerError::Assignment(format!("{e:?}")))?;

        Ok(row_to_col
            .into_iter()
            .enumerate()
            .filter(|&(row, col)| row < num_rows && col < num_cols)
            .collect())
    }
}

/// Assign detections to tracks, rejecting pairs whose cost exceeds `max_cost`.
///
/// `solver` runs on the full matrix and its pairs are gated afterwards.
/// Rejected pairs are not revisited.
pub fn linear_assignment<S: AssignmentSolver + ?Sized>(
    cost_matrix: &Array2<f64>,
    max_cost: f64,
    solver: &S,
) -> Result<AssignmentResult, TrackerError> {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        });
    }

    if let Some(((row, col), _)) = cost_matrix.indexed_iter().find(|(_, c)| !c.is_finite()) {
        return Err(TrackerError::NonFiniteCost { row, col });
    }

    let mut pairs = solver.solve(cost_matrix)?;
    pairs.sort_unstable();

    let mut track_matched = vec![false; num_rows];
    let mut det_matched = vec![false; num_cols];
    let mut matches = Vec::with_capacity(pairs.len());

    for (row, col) in pairs {
        let cost = cost_matrix[[row, col]];
        if cost > max_cost {
            trace!(track = row, detection = col, cost, "pair rejected by gate");
            continue;
        }
        if track_matched[row] || det_matched[col] {
            return Err(TrackerError::Assignment(format!(
                "solver reused row {row} or column {col}"
            )));
        }
        track_matched[row] = true;
        det_matched[col] = true;
        matches.push((row, col));
    }

    let unmatched = |mask: &[bool]| {
        mask.iter()
            .enumerate()
            .filter_map(|(i, &m)| (!m).then_some(i))
            .collect::<Vec<_>>()
    };

    Ok(AssignmentResult {
        unmatched_tracks: unmatched(&track_matched),
        unmatched_detections: unmatched(&det_matched),
        matches,
    })
}

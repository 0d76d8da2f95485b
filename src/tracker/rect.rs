use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Layout of the four numbers describing a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoxFormat {
    /// Top-left x, top-left y, width, height
    #[default]
    Tlwh,
    /// Center x, center y, width, height
    Xywh,
    /// Top-left x, top-left y, bottom-right x, bottom-right y
    Tlbr,
}

/// Bounding box representation with format conversion utilities.
///
/// Stored as top-left corner plus size. Besides the [`BoxFormat`] layouts it
/// converts to and from the XYSR form used by the motion model:
/// center x, center y, scale (area, w * h) and aspect ratio (w / h).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from XYWH format (center x, center y, width, height).
    #[inline]
    pub fn from_xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Create a Rect from XYSR form (center x, center y, scale, aspect ratio).
    ///
    /// A non-positive scale or ratio has no real width and yields an empty box
    /// centered on `(cx, cy)`.
    pub fn from_xysr(cx: f64, cy: f64, scale: f64, ratio: f64) -> Self {
        let (width, height) = if scale > 0.0 && ratio > 0.0 {
            let w = (scale * ratio).sqrt();
            (w, scale / w)
        } else {
            (0.0, 0.0)
        };
        Self::from_xywh(cx as f32, cy as f32, width as f32, height as f32)
    }

    /// Build a Rect from four numbers laid out as `format`.
    pub fn from_format(values: [f32; 4], format: BoxFormat) -> Self {
        let [a, b, c, d] = values;
        match format {
            BoxFormat::Tlwh => Self::new(a, b, c, d),
            BoxFormat::Xywh => Self::from_xywh(a, b, c, d),
            BoxFormat::Tlbr => Self::from_tlbr(a, b, c, d),
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Convert to XYWH format: (center_x, center_y, width, height).
    #[inline]
    pub fn to_xywh(&self) -> [f32; 4] {
        let (cx, cy) = self.center();
        [cx, cy, self.width, self.height]
    }

    /// Convert to XYSR form: (center_x, center_y, scale, aspect_ratio).
    ///
    /// A box with zero height has aspect ratio 0.
    pub fn to_xysr(&self) -> [f64; 4] {
        let (cx, cy) = self.center();
        let w = self.width as f64;
        let h = self.height as f64;
        let ratio = if h > 0.0 { w / h } else { 0.0 };
        [cx as f64, cy as f64, w * h, ratio]
    }

    /// Convert to the four numbers of `format`.
    pub fn to_format(&self, format: BoxFormat) -> [f32; 4] {
        match format {
            BoxFormat::Tlwh => self.to_tlwh(),
            BoxFormat::Xywh => self.to_xywh(),
            BoxFormat::Tlbr => self.to_tlbr(),
        }
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when all four components are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.to_tlwh().iter().all(|v| v.is_finite())
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    ///
    /// Returns a value in `[0, 1]`. Degenerate pairs (zero union area or
    /// non-finite geometry) give 0.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_width = (x2 - x1).max(0.0);
        let inter_height = (y2 - y1).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 && inter_area.is_finite() {
            (inter_area / union_area).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`. Either side may be empty.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}

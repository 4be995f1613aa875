use serde::{Deserialize, Serialize};

/// Axis-aligned box in image pixel coordinates, `x1 < x2` and `y1 < y2`.
///
/// Constructors clamp against the image bounds and refuse degenerate
/// boxes, so a `BBox` held by a [`Region`] or a detection is always a
/// valid, non-empty rectangle inside its image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BBox {
    /// Build a box from corner coordinates, clamped to `img_w` x `img_h`.
    ///
    /// Returns `None` when the clamped box has non-positive width or height.
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64, img_w: u32, img_h: u32) -> Option<Self> {
        let x1 = x1.clamp(0, img_w as i64) as u32;
        let y1 = y1.clamp(0, img_h as i64) as u32;
        let x2 = x2.clamp(0, img_w as i64) as u32;
        let y2 = y2.clamp(0, img_h as i64) as u32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self { x1, y1, x2, y2 })
    }

    /// Build a box from a center-based prediction (`cx`, `cy`, `w`, `h`),
    /// the geometry used by the remote inference wire format.
    pub fn from_center(cx: f64, cy: f64, w: f64, h: f64, img_w: u32, img_h: u32) -> Option<Self> {
        let x1 = (cx - w / 2.0).floor() as i64;
        let y1 = (cy - h / 2.0).floor() as i64;
        let x2 = (cx + w / 2.0).ceil() as i64;
        let y2 = (cy + h / 2.0).ceil() as i64;
        Self::new(x1, y1, x2, y2, img_w, img_h)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Aspect ratio width / height.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Intersection-over-union with another box, in `[0, 1]`.
    pub fn iou(&self, other: &BBox) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        if ix2 <= ix1 || iy2 <= iy1 {
            return 0.0;
        }
        let inter = (ix2 - ix1) as f64 * (iy2 - iy1) as f64;
        let union = self.area() as f64 + other.area() as f64 - inter;
        inter / union
    }

    /// True when the box comes within `margin_frac` of any image edge.
    ///
    /// Used to reject border artifacts: a betoneira cut off by the frame
    /// is not a reliable count.
    pub fn touches_border(&self, img_w: u32, img_h: u32, margin_frac: f64) -> bool {
        let mx = (img_w as f64 * margin_frac).round() as u32;
        let my = (img_h as f64 * margin_frac).round() as u32;
        self.x1 < mx || self.y1 < my || self.x2 + mx > img_w || self.y2 + my > img_h
    }
}

/// Origin of a candidate region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectMethod {
    Color,
    Shape,
    Size,
    Remote,
}

impl DetectMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectMethod::Color => "color",
            DetectMethod::Shape => "shape",
            DetectMethod::Size => "size",
            DetectMethod::Remote => "remote",
        }
    }
}

/// A candidate region produced by one detection strategy.
///
/// `area` is the raw contour area in pixels, not the bbox area. The
/// deduplicator orders candidates by this value.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Region {
    pub bbox: BBox,
    pub method: DetectMethod,
    pub area: f64,
    pub confidence: Option<f32>,
}

impl Region {
    pub fn new(bbox: BBox, method: DetectMethod, area: f64) -> Self {
        Self {
            bbox,
            method,
            area,
            confidence: None,
        }
    }
}

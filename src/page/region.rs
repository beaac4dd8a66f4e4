// OCR検出結果: 四角形ジオメトリ + テキスト + 信頼度

/// A point in image pixel space (origin top-left, y pointing down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Quadrilateral detection geometry.
///
/// Corner order: top-left, top-right, bottom-right, bottom-left (clockwise
/// in image space). Axis-aligned boxes are the special case built by
/// [`Quad::from_rect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub points: [Point; 4],
}

impl Quad {
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Axis-aligned box from its top-left corner and size.
    pub fn from_rect(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            points: [
                Point::new(left, top),
                Point::new(left + width, top),
                Point::new(left + width, top + height),
                Point::new(left, top + height),
            ],
        }
    }

    pub fn top_left(&self) -> Point {
        self.points[0]
    }

    pub fn bottom_right(&self) -> Point {
        self.points[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.points[3]
    }

    /// Length of the baseline (bottom-left to bottom-right).
    pub fn baseline_length(&self) -> f64 {
        self.points[3].distance(&self.points[2])
    }

    /// Length of the left edge (top-left to bottom-left).
    pub fn line_height(&self) -> f64 {
        self.points[0].distance(&self.points[3])
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.points.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Multiply every coordinate by `scale`.
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            points: self.points.map(|p| Point::new(p.x * scale, p.y * scale)),
        }
    }

    /// Clamp every corner into `[0, width] x [0, height]`.
    pub fn clamped(&self, width: f64, height: f64) -> Self {
        Self {
            points: self
                .points
                .map(|p| Point::new(p.x.clamp(0.0, width), p.y.clamp(0.0, height))),
        }
    }
}

/// One OCR detection on a specific page image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub quad: Quad,
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
}

impl TextRegion {
    pub fn new(quad: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            quad,
            text: text.into(),
            confidence,
        }
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            quad: self.quad.scaled(scale),
            text: self.text.clone(),
            confidence: self.confidence,
        }
    }

    pub(crate) fn clamped(mut self, width: f64, height: f64) -> Self {
        // NaN survives clamp; leave it for the compositor to reject.
        if self.quad.is_finite() {
            self.quad = self.quad.clamped(width, height);
        }
        self
    }
}

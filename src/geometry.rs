//! Pure geometry helpers shared by the drawing, editing and viewport code.
//!
//! Shapes store their coordinates as flat `[x0, y0, x1, y1, ...]` buffers in
//! model (image) space; the helpers here convert between that layout and
//! [`Point`]s and provide the small amount of math the editors need.

use serde::{Deserialize, Serialize};

/// A 2D point. Used for both model and screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        distance(*self, *other)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)`.
///
/// `frac = 0.5` gives the midpoint of the segment, which is where new polygon
/// vertices are inserted by default.
pub fn interpolate(x0: f32, y0: f32, x1: f32, y1: f32, frac: f32) -> Point {
    Point::new(x0 + (x1 - x0) * frac, y0 + (y1 - y0) * frac)
}

/// Midpoint of the segment between two points.
pub fn midpoint(a: Point, b: Point) -> Point {
    interpolate(a.x, a.y, b.x, b.y, 0.5)
}

/// Euclidean distance between two points.
pub fn distance(p1: Point, p2: Point) -> f32 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    (dx * dx + dy * dy).sqrt()
}

/// Arithmetic mean of two points (the pinch pivot).
pub fn centroid(p1: Point, p2: Point) -> Point {
    Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0)
}

/// Containment test between two circles.
///
/// Returns `true` only when one circle lies fully inside the other
/// (`d < |r0 - r1|`). Disjoint circles (`d > r0 + r1`) and circles whose
/// boundaries properly intersect both return `false`.
///
/// Polygon closing relies on this exact predicate: the first vertex is a small
/// circle and the cursor a larger one, so the loop closes only when the first
/// vertex sits well inside the cursor's radius.
pub fn circles_overlap_or_contained(x0: f32, y0: f32, r0: f32, x1: f32, y1: f32, r1: f32) -> bool {
    let d = distance(Point::new(x0, y0), Point::new(x1, y1));

    if d > r0 + r1 {
        return false;
    }

    d < (r0 - r1).abs()
}

/// Scale factor that fits `content` inside `bounds` while keeping its aspect ratio.
pub fn aspect_fit(content_w: f32, content_h: f32, bound_w: f32, bound_h: f32) -> f32 {
    (bound_w / content_w).min(bound_h / content_h)
}

/// Scale that maps the image's smaller side onto the viewport's smaller side.
///
/// This is the fit the canvas uses when an image is (re)loaded or the window is
/// resized; unlike [`aspect_fit`] it may overflow the longer axis.
pub fn fit_by_smaller_dimension(image_w: f32, image_h: f32, viewport_w: f32, viewport_h: f32) -> f32 {
    viewport_w.min(viewport_h) / image_w.min(image_h)
}

/// Split a flat coordinate buffer into points. A trailing odd value is ignored.
pub fn point_chunks(flat: &[f32]) -> Vec<Point> {
    flat.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect()
}

/// Flatten points back into `[x0, y0, x1, y1, ...]`.
pub fn flatten(points: &[Point]) -> Vec<f32> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Axis-aligned bounds `[min_x, min_y, max_x, max_y]` of a point set.
pub fn bounding_rect(points: &[Point]) -> Option<[f32; 4]> {
    if points.is_empty() {
        return None;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some([min_x, min_y, max_x, max_y])
}

/// Sort the two corners of a rectangle so the first is the top-left.
pub fn normalize_rect(rect: [f32; 4]) -> [f32; 4] {
    [
        rect[0].min(rect[2]),
        rect[1].min(rect[3]),
        rect[0].max(rect[2]),
        rect[1].max(rect[3]),
    ]
}

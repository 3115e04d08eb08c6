//! Shape annotations drawn over an image.
//!
//! Coordinates are stored flat, in model (image) space:
//! - polygons: `[x0, y0, x1, y1, ...]`, one pair per vertex
//! - rectangles: `[x0, y0, x1, y1]`, two opposite corners in any order

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AnnotatorError, Result};
use crate::geometry::{self, Point};

/// Minimum number of vertices for a polygon to enclose an area.
///
/// Not enforced when drawing; exposed for callers that want to validate.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Opaque, stable identifier of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminator for the shape variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Polygon,
    Rectangle,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
        }
    }
}

/// Geometry payload of a shape, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeGeometry {
    /// Closed polygon; the last vertex connects back to the first.
    Polygon { points: Vec<f32> },
    /// Axis-aligned rectangle given by two opposite corners.
    Rectangle { points: [f32; 4] },
}

impl ShapeGeometry {
    /// Build geometry of the given kind from a flat coordinate buffer.
    ///
    /// Polygons accept any even-length buffer (degenerate polygons included);
    /// rectangles need exactly four values.
    pub fn from_flat(kind: ShapeKind, points: &[f32]) -> Result<Self> {
        if points.len() % 2 != 0 {
            return Err(AnnotatorError::invalid_geometry(format!(
                "odd coordinate count {} for {}",
                points.len(),
                kind.name()
            )));
        }

        match kind {
            ShapeKind::Polygon => Ok(ShapeGeometry::Polygon {
                points: points.to_vec(),
            }),
            ShapeKind::Rectangle => {
                let corners: [f32; 4] = points.try_into().map_err(|_| {
                    AnnotatorError::invalid_geometry(format!(
                        "rectangle needs 4 coordinates, got {}",
                        points.len()
                    ))
                })?;
                Ok(ShapeGeometry::Rectangle { points: corners })
            }
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeGeometry::Polygon { .. } => ShapeKind::Polygon,
            ShapeGeometry::Rectangle { .. } => ShapeKind::Rectangle,
        }
    }

    /// The flat coordinate buffer.
    pub fn points(&self) -> &[f32] {
        match self {
            ShapeGeometry::Polygon { points } => points,
            ShapeGeometry::Rectangle { points } => points,
        }
    }

    /// Vertex count (rectangles report their two stored corners).
    pub fn vertex_count(&self) -> usize {
        self.points().len() / 2
    }

    /// Axis-aligned bounds `[min_x, min_y, max_x, max_y]`.
    pub fn bounding_rect(&self) -> Option<[f32; 4]> {
        match self {
            ShapeGeometry::Polygon { points } => {
                geometry::bounding_rect(&geometry::point_chunks(points))
            }
            ShapeGeometry::Rectangle { points } => Some(geometry::normalize_rect(*points)),
        }
    }
}

/// A finished annotation shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier, fixed at creation.
    pub id: ShapeId,
    /// Stroke/fill color, fixed at creation.
    pub color: String,
    /// Optional user label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub geometry: ShapeGeometry,
}

impl Shape {
    /// Create a shape with a fresh id.
    pub fn new(geometry: ShapeGeometry, color: impl Into<String>) -> Self {
        Self {
            id: ShapeId::generate(),
            color: color.into(),
            label: None,
            geometry,
        }
    }

    pub fn polygon(points: Vec<f32>, color: impl Into<String>) -> Self {
        Self::new(ShapeGeometry::Polygon { points }, color)
    }

    pub fn rectangle(points: [f32; 4], color: impl Into<String>) -> Self {
        Self::new(ShapeGeometry::Rectangle { points }, color)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn points(&self) -> &[f32] {
        self.geometry.points()
    }

    /// Replace the coordinate buffer, keeping the shape's kind.
    pub fn set_points(&mut self, points: &[f32]) -> Result<()> {
        self.geometry = ShapeGeometry::from_flat(self.kind(), points)?;
        Ok(())
    }

    /// Where a renderer should draw the label: horizontally centred, at the
    /// vertical middle of the shape's bounds. `None` when unlabeled.
    pub fn label_anchor(&self) -> Option<Point> {
        self.label.as_ref()?;
        let [x0, y0, x1, y1] = self.geometry.bounding_rect()?;
        Some(Point::new((x0 + x1) / 2.0, (y0 + y1) / 2.0))
    }
}

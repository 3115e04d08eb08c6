//! Data models for the annotation canvas.

mod image;
mod shape;
mod tool;

pub use image::{ImageAnnotation, ImageId, NewImage};
pub use shape::{MIN_POLYGON_VERTICES, Shape, ShapeGeometry, ShapeId, ShapeKind};
pub use tool::{ToolMode, ToolState};

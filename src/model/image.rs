//! Per-image annotation records.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shape::{Shape, ShapeId};

/// Opaque, stable identifier of an image record. Ordered lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One loaded image and the shapes drawn on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    pub id: ImageId,
    /// URL, object reference or path of the image. Opaque to the annotation core.
    pub image_data: String,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl ImageAnnotation {
    pub fn new(id: ImageId, image_data: impl Into<String>) -> Self {
        Self {
            id,
            image_data: image_data.into(),
            shapes: Vec::new(),
        }
    }

    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    pub fn shape_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| &s.id == id)
    }
}

/// An image handed to [`AnnotationStore::set_annotation_set`](crate::state::AnnotationStore::set_annotation_set).
///
/// Entries without an id get a generated one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewImage {
    #[serde(default)]
    pub id: Option<ImageId>,
    pub image_data: String,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl NewImage {
    /// An image with no id and no shapes yet.
    pub fn from_source(image_data: impl Into<String>) -> Self {
        Self {
            id: None,
            image_data: image_data.into(),
            shapes: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ImageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Resolve into a record, generating an id when missing.
    pub fn into_annotation(self) -> ImageAnnotation {
        ImageAnnotation {
            id: self.id.unwrap_or_else(ImageId::generate),
            image_data: self.image_data,
            shapes: self.shapes,
        }
    }
}

impl From<ImageAnnotation> for NewImage {
    fn from(image: ImageAnnotation) -> Self {
        Self {
            id: Some(image.id),
            image_data: image.image_data,
            shapes: image.shapes,
        }
    }
}

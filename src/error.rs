//! Error types for annotation operations.

use thiserror::Error;

/// Errors that can occur while mutating the annotation set or talking to collaborators.
#[derive(Error, Debug)]
pub enum AnnotatorError {
    /// I/O error while reading image data or config files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No image with the given id exists in the annotation set
    #[error("Image not found: {id}")]
    ImageNotFound {
        /// The id that was looked up
        id: String,
    },

    /// No shape with the given id exists on the searched image
    #[error("Shape not found: {id}")]
    ShapeNotFound {
        /// The id that was looked up
        id: String,
    },

    /// An operation needed the active image but the set is empty or the index is out of range
    #[error("No current image (index {index}, {len} images loaded)")]
    NoCurrentImage {
        /// The active index at the time of the call
        index: usize,
        /// Number of images in the set
        len: usize,
    },

    /// Point data that cannot form the requested shape
    #[error("Invalid geometry: {message}")]
    InvalidGeometry {
        /// Description of the geometry problem
        message: String,
    },

    /// An upload collaborator rejected a file
    #[error("Upload of '{file}' failed: {message}")]
    Upload {
        /// Name of the file being uploaded
        file: String,
        /// Message reported by the uploader
        message: String,
    },

    /// Image bytes could not be decoded
    #[error("Failed to decode image '{source_ref}': {message}")]
    Decode {
        /// The image reference that failed
        source_ref: String,
        /// Decoder message
        message: String,
    },

    /// Version mismatch between expected and found
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },
}

impl AnnotatorError {
    /// Create an image-not-found error.
    pub fn image_not_found(id: impl Into<String>) -> Self {
        Self::ImageNotFound { id: id.into() }
    }

    /// Create a shape-not-found error.
    pub fn shape_not_found(id: impl Into<String>) -> Self {
        Self::ShapeNotFound { id: id.into() }
    }

    /// Create an invalid geometry error.
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    /// Create an upload error.
    pub fn upload(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(source_ref: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            source_ref: source_ref.into(),
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AnnotatorError>;

//! imgannot - image annotation canvas core
//!
//! Draw polygon and rectangle annotations over a set of images, edit them,
//! and pan/zoom around. Rendering is left to the host: it feeds input events
//! into a [`Session`] and draws whatever the store, viewport and draw preview
//! report.

pub mod color_utils;
pub mod config;
pub mod drawing;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod keybindings;
pub mod model;
pub mod session;
pub mod state;
pub mod upload;
pub mod viewport;

#[cfg(test)]
mod tests;

pub use config::{AnnotatorConfig, LogLevel, Preferences};
pub use drawing::{DrawOutcome, DrawPreview, DrawStateMachine};
pub use editor::{RectCorner, ShapeEditor};
pub use error::{AnnotatorError, Result};
pub use geometry::Point;
pub use keybindings::{Action, KeyBindings, KeyChord, KeyCode};
pub use model::{ImageAnnotation, ImageId, NewImage, Shape, ShapeGeometry, ShapeId, ShapeKind, ToolMode, ToolState};
pub use session::{ClickTarget, DragHandle, InputEvent, Session};
pub use state::{AnnotationStore, ImageCache, ImageStatus};
pub use upload::{UploadFile, Uploader};
pub use viewport::{ScreenSize, ViewportController, WheelMode};

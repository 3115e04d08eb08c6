//! Toolbar tool modes.

use serde::{Deserialize, Serialize};

use super::shape::ShapeKind;

/// Tools the user can pick from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Selection/pointer tool for picking and editing existing shapes
    #[default]
    Pointer,
    /// Polygon drawing tool
    Polygon,
    /// Rectangle drawing tool
    Rectangle,
    /// Image upload view
    Upload,
}

impl ToolMode {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::Pointer => "Select",
            ToolMode::Polygon => "Polygon",
            ToolMode::Rectangle => "Rectangle",
            ToolMode::Upload => "Upload",
        }
    }

    /// Get all available tools in toolbar order.
    pub fn all() -> &'static [ToolMode] {
        &[
            ToolMode::Upload,
            ToolMode::Pointer,
            ToolMode::Polygon,
            ToolMode::Rectangle,
        ]
    }

    /// The kind of shape this tool draws, if it is a drawing tool.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            ToolMode::Polygon => Some(ShapeKind::Polygon),
            ToolMode::Rectangle => Some(ShapeKind::Rectangle),
            ToolMode::Pointer | ToolMode::Upload => None,
        }
    }

    /// Check if this tool draws shapes.
    pub fn is_drawing_tool(&self) -> bool {
        self.shape_kind().is_some()
    }
}

/// Toolbar state shared between the canvas and the surrounding UI.
///
/// Passed explicitly into the draw and edit entry points instead of living in
/// a global store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolState {
    /// Currently selected tool
    pub tool: ToolMode,
    /// Set while a shape is being drawn or edited; the toolbar disables itself
    pub busy: bool,
    /// Whether the thumbnail strip is shown
    pub thumbnails_visible: bool,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: ToolMode::Pointer,
            busy: false,
            thumbnails_visible: true,
        }
    }
}

impl ToolState {
    pub fn new(tool: ToolMode) -> Self {
        Self {
            tool,
            ..Default::default()
        }
    }
}

//! Annotation session: routes input events to the canvas components.
//!
//! A [`Session`] owns the annotation store, the viewport, the drawing state
//! machine, the shape editor, the image cache and the toolbar state. The host
//! (a window, a test, the replay binary) feeds it [`InputEvent`]s with screen
//! coordinates; the session converts them to model coordinates and dispatches
//! to the component that owns the affected state.
//!
//! While the set is empty or the upload tool is active the canvas is hidden,
//! so only key events are handled.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AnnotatorConfig;
use crate::drawing::{DrawOutcome, DrawPreview, DrawStateMachine};
use crate::editor::ShapeEditor;
use crate::error::{AnnotatorError, Result};
use crate::geometry::Point;
use crate::keybindings::{Action, KeyBindings, KeyChord};
use crate::model::{NewImage, ShapeId, ToolMode, ToolState};
use crate::state::{AnnotationStore, ImageCache, ImageStatus};
use crate::upload::{self, UploadFile, Uploader};
use crate::viewport::{ScreenSize, ViewportController, WheelMode};

/// What was under the pointer when a click happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickTarget {
    /// The image itself, outside any shape
    Image,
    /// The body of a shape
    Shape { shape_id: ShapeId },
    /// Midpoint marker `index` of a selected polygon
    Midpoint { shape_id: ShapeId, index: usize },
}

/// Handle grabbed at the start of a drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragHandle {
    /// Polygon vertex
    Vertex { shape_id: ShapeId, index: usize },
    /// Rectangle corner, 0..3 from top-left clockwise
    Corner { shape_id: ShapeId, corner: usize },
}

/// Input delivered by the host. Positions are screen coordinates; `None`
/// means the device did not report one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    PointerMove {
        pointer: Option<Point>,
    },
    Click {
        pointer: Option<Point>,
        target: ClickTarget,
    },
    /// Double-click on a shape with the text entered in the label prompt
    /// (`None` when the prompt was cancelled)
    DoubleClick {
        shape_id: ShapeId,
        label: Option<String>,
    },
    DragStart {
        handle: DragHandle,
    },
    DragMove {
        pointer: Option<Point>,
    },
    DragEnd,
    Wheel {
        pointer: Option<Point>,
        delta_y: f32,
    },
    /// Current touch points
    Touch {
        touches: Vec<Point>,
    },
    TouchEnd,
    Key {
        chord: KeyChord,
    },
    Resize {
        size: ScreenSize,
    },
}

/// The annotation canvas and everything it owns.
#[derive(Debug)]
pub struct Session {
    store: AnnotationStore,
    viewport: ViewportController,
    drawing: DrawStateMachine,
    editor: ShapeEditor,
    cache: ImageCache,
    tool: ToolState,
    keybindings: KeyBindings,
}

impl Session {
    pub fn new(config: &AnnotatorConfig, screen_size: ScreenSize, cache: ImageCache) -> Self {
        let prefs = &config.preferences;
        Self {
            store: AnnotationStore::new(),
            viewport: ViewportController::new(screen_size, prefs),
            drawing: DrawStateMachine::new(prefs),
            editor: ShapeEditor::new(),
            cache,
            tool: ToolState::default(),
            keybindings: config.keybindings.to_keybindings(),
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn editor(&self) -> &ShapeEditor {
        &self.editor
    }

    pub fn drawing(&self) -> &DrawStateMachine {
        &self.drawing
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ImageCache {
        &mut self.cache
    }

    pub fn keybindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.keybindings
    }

    /// The shape being drawn, for rendering.
    pub fn draw_preview(&self) -> Option<DrawPreview<'_>> {
        self.drawing.preview(&self.store)
    }

    // ========================================================================
    // Image set
    // ========================================================================

    /// Replace the set with fresh images for `sources` and focus the first.
    pub fn load_images(&mut self, sources: Vec<String>) {
        let images = sources.into_iter().map(NewImage::from_source).collect();
        self.replace_images(images, Some(0));
    }

    /// Upload `files` and append them to the set.
    ///
    /// The batch stops at the first failed file; nothing is added then.
    pub fn upload(
        &mut self,
        uploader: &mut dyn Uploader,
        target_url: &str,
        files: &[UploadFile],
    ) -> Result<usize> {
        let sources = upload::upload_batch(uploader, target_url, files)?;
        let added = sources.len();

        let mut images: Vec<NewImage> = self
            .store
            .images()
            .iter()
            .cloned()
            .map(NewImage::from)
            .collect();
        images.extend(sources.into_iter().map(NewImage::from_source));
        self.replace_images(images, None);
        Ok(added)
    }

    /// Replace the whole set, preloading every image and refitting.
    pub fn replace_images(&mut self, images: Vec<NewImage>, focus: Option<usize>) {
        self.editor.deselect();
        self.store.set_annotation_set(images, focus, &mut self.cache);
        self.fit_current_image();
    }

    /// Record settled preloads. Refits the viewport when the current image
    /// finished loading. Returns the settled sources.
    pub fn poll_images(&mut self) -> Vec<(String, ImageStatus)> {
        let settled = self.cache.poll();
        let current = self.store.current_image().map(|i| i.image_data.clone());
        if let Some(current) = current {
            if settled.iter().any(|(source, _)| *source == current) {
                self.fit_current_image();
            }
        }
        settled
    }

    /// Block until the current image settles or `timeout` elapses, then refit.
    pub fn wait_for_current_image(&mut self, timeout: Duration) -> Option<ImageStatus> {
        let source = self.store.current_image()?.image_data.clone();
        let status = self.cache.wait_for(&source, timeout);
        self.fit_current_image();
        status
    }

    /// Pixel size of the current image, once loaded.
    pub fn current_image_size(&self) -> Option<(f32, f32)> {
        let image = self.store.current_image()?;
        match self.cache.status(&image.image_data)? {
            ImageStatus::Loaded { width, height } => Some((*width as f32, *height as f32)),
            ImageStatus::Pending | ImageStatus::Failed(_) => None,
        }
    }

    fn fit_current_image(&mut self) {
        if let Some((w, h)) = self.current_image_size() {
            let screen = self.viewport.screen_size();
            self.viewport
                .reset_to_fit_image(w, h, screen.width, screen.height);
        }
    }

    fn canvas_visible(&self) -> bool {
        !self.store.is_empty() && self.tool.tool != ToolMode::Upload
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Handle one input event. Returns whether any state changed.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<bool> {
        if let InputEvent::Key { chord } = event {
            return match self.keybindings.action_for(chord) {
                Some(action) => self.apply_action(action),
                None => Ok(false),
            };
        }
        if let InputEvent::Resize { size } = event {
            let image_size = self.current_image_size();
            self.viewport.resize(size, image_size);
            return Ok(true);
        }
        if !self.canvas_visible() {
            log::debug!("Canvas hidden, ignoring {:?}", event);
            return Ok(false);
        }

        match event {
            InputEvent::PointerMove { pointer } => {
                let model = pointer.map(|p| self.viewport.screen_to_model(p));
                Ok(self.drawing.pointer_move(&mut self.store, model))
            }
            InputEvent::Click { pointer, target } => self.handle_click(pointer, target),
            InputEvent::DoubleClick { shape_id, label } => {
                self.editor
                    .edit_label(&mut self.store, &shape_id, label.as_deref())?;
                Ok(true)
            }
            InputEvent::DragStart { handle } => {
                match handle {
                    DragHandle::Vertex { shape_id, index } => {
                        self.editor.begin_vertex_drag(&self.store, &shape_id, index)?
                    }
                    DragHandle::Corner { shape_id, corner } => {
                        self.editor.begin_corner_drag(&self.store, &shape_id, corner)?
                    }
                }
                Ok(true)
            }
            InputEvent::DragMove { pointer } => {
                let model = pointer.map(|p| self.viewport.screen_to_model(p));
                Ok(self.editor.drag_vertex(model) || self.editor.drag_corner(model))
            }
            InputEvent::DragEnd => {
                let committed = self.editor.end_vertex_drag(&mut self.store)?
                    || self.editor.end_corner_drag(&mut self.store)?;
                Ok(committed)
            }
            InputEvent::Wheel { pointer, delta_y } => Ok(self.viewport.handle_wheel(pointer, delta_y)),
            InputEvent::Touch { touches } => match touches.as_slice() {
                [t1, t2, ..] => Ok(self.viewport.pinch_pan_zoom(*t1, *t2)),
                _ => Ok(false),
            },
            InputEvent::TouchEnd => {
                self.viewport.end_pinch();
                Ok(false)
            }
            InputEvent::Key { .. } | InputEvent::Resize { .. } => Ok(false),
        }
    }

    fn handle_click(&mut self, pointer: Option<Point>, target: ClickTarget) -> Result<bool> {
        if self.drawing.is_drawing() {
            return self.draw_click(pointer);
        }

        match target {
            ClickTarget::Shape { shape_id } => {
                self.editor.select(shape_id);
                Ok(true)
            }
            ClickTarget::Midpoint { shape_id, index } => {
                self.editor
                    .insert_midpoint(&mut self.store, &shape_id, index)?;
                Ok(true)
            }
            ClickTarget::Image => {
                if self.editor.click_empty_canvas(&mut self.tool) {
                    return Ok(true);
                }
                self.draw_click(pointer)
            }
        }
    }

    fn draw_click(&mut self, pointer: Option<Point>) -> Result<bool> {
        let model = pointer.map(|p| self.viewport.screen_to_model(p));
        let scale = self.viewport.scale().x;
        let outcome = self
            .drawing
            .click(&mut self.store, &mut self.tool, model, scale)?;
        if let DrawOutcome::Finished(id) = &outcome {
            log::info!("Finished shape {}", id);
        }
        Ok(outcome != DrawOutcome::Ignored)
    }

    /// Apply a logical action. Returns whether any state changed.
    pub fn apply_action(&mut self, action: Action) -> Result<bool> {
        log::debug!("Action: {}", action.name());
        match action {
            Action::TogglePanAxis => self.viewport.toggle_pan_axis(),
            Action::ZoomMode => self.viewport.set_wheel_mode(WheelMode::Zoom),
            Action::NextImage => {
                self.editor.deselect();
                self.store.next_image();
                self.fit_current_image();
            }
            Action::PrevImage => {
                self.editor.deselect();
                self.store.previous_image();
                self.fit_current_image();
            }
            Action::Cancel => {
                self.editor.cancel_drag();
                return Ok(self.drawing.cancel(&mut self.store, &mut self.tool)
                    == DrawOutcome::Cancelled);
            }
            Action::UndoLastPoint => return Ok(self.drawing.undo_last_point(&mut self.store)),
            Action::SelectTool(tool) => {
                if self.tool.busy {
                    log::debug!("Toolbar busy, ignoring switch to {}", tool.name());
                    return Ok(false);
                }
                self.tool.tool = tool;
            }
            Action::ToggleThumbnails => {
                self.tool.thumbnails_visible = !self.tool.thumbnails_visible;
            }
            Action::DeleteSelected => {
                let Some(shape_id) = self.editor.selected().cloned() else {
                    return Ok(false);
                };
                let image_id = self
                    .store
                    .current_image()
                    .map(|i| i.id.clone())
                    .ok_or(AnnotatorError::NoCurrentImage {
                        index: self.store.current_index(),
                        len: self.store.len(),
                    })?;
                self.store.remove_shape(&image_id, &shape_id)?;
                self.editor.click_empty_canvas(&mut self.tool);
            }
        }
        Ok(true)
    }
}

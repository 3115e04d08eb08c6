//! Shape drawing state machine.
//!
//! Drawing goes `Idle -> Drawing -> Idle`. The points of the shape being drawn
//! live in the store's draw buffer: committed vertices plus a preview point
//! that follows the pointer.
//!
//! - Polygon: every click commits a vertex, until a click lands on the first
//!   vertex, which closes the loop without adding a vertex.
//! - Rectangle: the first click sets one corner, the second sets the opposite
//!   corner and finishes.
//!
//! All points passed in are model coordinates; `scale` is only used to keep
//! the closing hit radius constant on screen.

use crate::color_utils;
use crate::config::Preferences;
use crate::error::{AnnotatorError, Result};
use crate::geometry::{self, Point};
use crate::model::{Shape, ShapeGeometry, ShapeId, ShapeKind, ToolState};
use crate::state::AnnotationStore;

/// Current state of the machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing {
        /// Kind of shape being drawn, fixed when drawing starts
        kind: ShapeKind,
        /// Color the finished shape will get
        color: String,
    },
}

/// What a click or key did to the drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// Nothing happened (no pointer, wrong tool, not drawing)
    Ignored,
    Started,
    PointAdded,
    Finished(ShapeId),
    Cancelled,
}

/// In-progress shape for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPreview<'a> {
    pub kind: ShapeKind,
    pub color: &'a str,
    /// Committed points followed by the preview point
    pub points: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawStateMachine {
    state: DrawState,
    /// Hit radius of the first vertex, screen pixels
    start_point_radius: f32,
    /// Test radius around the cursor, screen pixels
    close_test_radius: f32,
}

impl DrawStateMachine {
    pub fn new(preferences: &Preferences) -> Self {
        Self {
            state: DrawState::Idle,
            start_point_radius: preferences.start_point_radius,
            close_test_radius: preferences.close_test_radius,
        }
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    pub fn pending_color(&self) -> Option<&str> {
        match &self.state {
            DrawState::Drawing { color, .. } => Some(color),
            DrawState::Idle => None,
        }
    }

    /// Move the preview point to the pointer.
    pub fn pointer_move(&self, store: &mut AnnotationStore, pointer: Option<Point>) -> bool {
        match pointer {
            Some(p) if self.is_drawing() => {
                store.set_preview_point(Some(p));
                true
            }
            _ => false,
        }
    }

    /// Handle a click on the canvas.
    ///
    /// Callers deal with shape selection first: drawing never starts while a
    /// shape is selected.
    pub fn click(
        &mut self,
        store: &mut AnnotationStore,
        tool: &mut ToolState,
        pointer: Option<Point>,
        scale: f32,
    ) -> Result<DrawOutcome> {
        let Some(p) = pointer else {
            return Ok(DrawOutcome::Ignored);
        };

        let kind = match self.state {
            DrawState::Idle => return Ok(self.start(store, tool, p)),
            DrawState::Drawing { kind, .. } => kind,
        };

        match kind {
            ShapeKind::Polygon => {
                if self.closes_loop(store, p, scale) {
                    return self.finish_drawing(store, tool).map(DrawOutcome::Finished);
                }
                store.add_points(&[p.x, p.y]);
                store.set_preview_point(Some(p));
                log::debug!(
                    "Polygon vertex at ({:.1}, {:.1}), {} committed",
                    p.x,
                    p.y,
                    store.committed_points().len() / 2
                );
                Ok(DrawOutcome::PointAdded)
            }
            ShapeKind::Rectangle => {
                // Start corner undone: collapse to a zero-area rectangle at the click.
                if store.committed_points().is_empty() {
                    store.add_points(&[p.x, p.y]);
                }
                store.add_points(&[p.x, p.y]);
                self.finish_drawing(store, tool).map(DrawOutcome::Finished)
            }
        }
    }

    fn start(&mut self, store: &mut AnnotationStore, tool: &mut ToolState, p: Point) -> DrawOutcome {
        let Some(kind) = tool.tool.shape_kind() else {
            return DrawOutcome::Ignored;
        };

        let color = color_utils::random_color();
        store.set_current_points(vec![p.x, p.y]);
        store.set_preview_point(Some(p));
        tool.busy = true;
        log::debug!(
            "Started {} at ({:.1}, {:.1}) with color {}",
            kind.name(),
            p.x,
            p.y,
            color
        );
        self.state = DrawState::Drawing { kind, color };
        DrawOutcome::Started
    }

    /// Whether a click at `p` lands on the first committed vertex.
    ///
    /// Uses the containment predicate: the first vertex's hit circle must lie
    /// entirely inside the cursor's test circle.
    fn closes_loop(&self, store: &AnnotationStore, p: Point, scale: f32) -> bool {
        let Some(first) = store.draw_buffer().first_vertex() else {
            return false;
        };
        geometry::circles_overlap_or_contained(
            first.x,
            first.y,
            self.start_point_radius / scale,
            p.x,
            p.y,
            self.close_test_radius / scale,
        )
    }

    /// Commit the committed vertices as a shape on the current image.
    ///
    /// The preview point is dropped. The machine returns to idle and the
    /// buffer is cleared even when the commit fails.
    pub fn finish_drawing(
        &mut self,
        store: &mut AnnotationStore,
        tool: &mut ToolState,
    ) -> Result<ShapeId> {
        let state = std::mem::take(&mut self.state);
        tool.busy = false;

        let DrawState::Drawing { kind, color } = state else {
            return Err(AnnotatorError::invalid_geometry("no shape is being drawn"));
        };

        store.set_preview_point(None);
        let points = store.committed_points().to_vec();
        store.clear_current_points();

        let geometry = ShapeGeometry::from_flat(kind, &points)?;
        match store.add_shape_to_current_image(Shape::new(geometry, color)) {
            Ok(id) => Ok(id),
            Err(e) => {
                log::warn!("Dropping finished {}: {}", kind.name(), e);
                Err(e)
            }
        }
    }

    /// Abort the shape being drawn without committing it.
    pub fn cancel(&mut self, store: &mut AnnotationStore, tool: &mut ToolState) -> DrawOutcome {
        if !self.is_drawing() {
            return DrawOutcome::Ignored;
        }
        self.state = DrawState::Idle;
        store.clear_current_points();
        tool.busy = false;
        log::debug!("Drawing cancelled");
        DrawOutcome::Cancelled
    }

    /// Drop the last committed vertex; the preview keeps following the pointer.
    pub fn undo_last_point(&self, store: &mut AnnotationStore) -> bool {
        if !self.is_drawing() {
            return false;
        }
        store.undo_last_points();
        true
    }

    /// The in-progress shape, if drawing.
    pub fn preview<'a>(&'a self, store: &AnnotationStore) -> Option<DrawPreview<'a>> {
        match &self.state {
            DrawState::Drawing { kind, color } => Some(DrawPreview {
                kind: *kind,
                color,
                points: store.current_points(),
            }),
            DrawState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewImage, ToolMode};

    fn setup(tool: ToolMode) -> (DrawStateMachine, AnnotationStore, ToolState) {
        let mut store = AnnotationStore::new();
        store.set_annotation_set(
            vec![NewImage::from_source("a.png").with_id("a")],
            Some(0),
            &mut Vec::new(),
        );
        (
            DrawStateMachine::new(&Preferences::default()),
            store,
            ToolState::new(tool),
        )
    }

    fn click(
        machine: &mut DrawStateMachine,
        store: &mut AnnotationStore,
        tool: &mut ToolState,
        x: f32,
        y: f32,
    ) -> DrawOutcome {
        machine
            .click(store, tool, Some(Point::new(x, y)), 1.0)
            .expect("click succeeds")
    }

    fn shapes(store: &AnnotationStore) -> &[Shape] {
        store
            .current_image()
            .map(|i| i.shapes.as_slice())
            .unwrap_or_default()
    }

    #[test]
    fn test_polygon_closes_with_exactly_three_vertices() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        assert_eq!(click(&mut m, &mut store, &mut tool, 0.0, 0.0), DrawOutcome::Started);
        assert!(tool.busy);
        assert_eq!(click(&mut m, &mut store, &mut tool, 10.0, 0.0), DrawOutcome::PointAdded);
        assert_eq!(click(&mut m, &mut store, &mut tool, 10.0, 10.0), DrawOutcome::PointAdded);

        m.pointer_move(&mut store, Some(Point::new(0.5, 0.5)));
        let outcome = click(&mut m, &mut store, &mut tool, 0.5, 0.5);
        assert!(matches!(outcome, DrawOutcome::Finished(_)));

        let shapes = shapes(&store);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind(), ShapeKind::Polygon);
        assert_eq!(shapes[0].points(), &[0.0, 0.0, 10.0, 0.0, 10.0, 10.0]);
        assert!(!m.is_drawing());
        assert!(!tool.busy);
        assert!(store.draw_buffer().is_empty());
    }

    #[test]
    fn test_close_radius_scales_with_zoom() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        click(&mut m, &mut store, &mut tool, 0.0, 0.0);
        click(&mut m, &mut store, &mut tool, 10.0, 0.0);

        // 6 model units away: inside the 8px containment band at scale 1,
        // outside it at scale 2 (band shrinks to 4 model units).
        let outcome = m
            .click(&mut store, &mut tool, Some(Point::new(6.0, 0.0)), 2.0)
            .expect("click succeeds");
        assert_eq!(outcome, DrawOutcome::PointAdded);
    }

    #[test]
    fn test_overlapping_but_not_contained_click_does_not_close() {
        // Known oddity: the closing test requires containment, so a click
        // whose test circle only overlaps the start circle keeps drawing.
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        click(&mut m, &mut store, &mut tool, 0.0, 0.0);
        click(&mut m, &mut store, &mut tool, 50.0, 0.0);
        let outcome = click(&mut m, &mut store, &mut tool, 10.0, 0.0);
        assert_eq!(outcome, DrawOutcome::PointAdded);
        assert!(m.is_drawing());
    }

    #[test]
    fn test_rectangle_is_two_clicks() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Rectangle);
        click(&mut m, &mut store, &mut tool, 5.0, 5.0);
        m.pointer_move(&mut store, Some(Point::new(8.0, 9.0)));
        let outcome = click(&mut m, &mut store, &mut tool, 20.0, 30.0);
        assert!(matches!(outcome, DrawOutcome::Finished(_)));

        let shapes = shapes(&store);
        assert_eq!(shapes[0].kind(), ShapeKind::Rectangle);
        assert_eq!(shapes[0].points(), &[5.0, 5.0, 20.0, 30.0]);
    }

    #[test]
    fn test_cancel_discards_points() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        click(&mut m, &mut store, &mut tool, 0.0, 0.0);
        click(&mut m, &mut store, &mut tool, 10.0, 0.0);
        assert_eq!(m.cancel(&mut store, &mut tool), DrawOutcome::Cancelled);
        assert!(!m.is_drawing());
        assert!(!tool.busy);
        assert!(store.draw_buffer().is_empty());
        assert!(shapes(&store).is_empty());
        assert_eq!(m.cancel(&mut store, &mut tool), DrawOutcome::Ignored);
    }

    #[test]
    fn test_undo_then_click_on_empty_buffer() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        click(&mut m, &mut store, &mut tool, 0.0, 0.0);
        assert!(m.undo_last_point(&mut store));
        assert!(store.committed_points().is_empty());

        // No first vertex to close against: the click just commits a point.
        assert_eq!(click(&mut m, &mut store, &mut tool, 0.0, 0.0), DrawOutcome::PointAdded);
        assert_eq!(store.committed_points(), &[0.0, 0.0]);
    }

    #[test]
    fn test_pointer_move_updates_preview_only() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        assert!(!m.pointer_move(&mut store, Some(Point::new(1.0, 1.0))));
        click(&mut m, &mut store, &mut tool, 0.0, 0.0);
        m.pointer_move(&mut store, Some(Point::new(3.0, 4.0)));
        m.pointer_move(&mut store, Some(Point::new(5.0, 6.0)));
        assert_eq!(store.committed_points(), &[0.0, 0.0]);
        assert_eq!(store.current_points(), vec![0.0, 0.0, 5.0, 6.0]);

        let preview = m.preview(&store).expect("drawing");
        assert_eq!(preview.kind, ShapeKind::Polygon);
        assert_eq!(Some(preview.color), m.pending_color());
        assert_eq!(preview.points, vec![0.0, 0.0, 5.0, 6.0]);
    }

    #[test]
    fn test_missing_pointer_is_noop() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        let outcome = m.click(&mut store, &mut tool, None, 1.0).expect("no-op");
        assert_eq!(outcome, DrawOutcome::Ignored);
        assert!(!m.is_drawing());
        assert!(!m.pointer_move(&mut store, None));
    }

    #[test]
    fn test_pointer_tool_does_not_draw() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Pointer);
        assert_eq!(click(&mut m, &mut store, &mut tool, 1.0, 1.0), DrawOutcome::Ignored);
        assert!(!tool.busy);
    }

    #[test]
    fn test_degenerate_polygon_is_accepted() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Polygon);
        click(&mut m, &mut store, &mut tool, 0.0, 0.0);
        click(&mut m, &mut store, &mut tool, 10.0, 0.0);
        let id = m.finish_drawing(&mut store, &mut tool).expect("commit");
        let image = store.current_image().expect("current image");
        assert_eq!(image.shape(&id).map(|s| s.points().len()), Some(4));
    }

    #[test]
    fn test_finish_without_current_image() {
        let (mut m, mut store, mut tool) = setup(ToolMode::Rectangle);
        click(&mut m, &mut store, &mut tool, 0.0, 0.0);
        store.set_current_index(5);
        let result = m.click(&mut store, &mut tool, Some(Point::new(1.0, 1.0)), 1.0);
        assert!(matches!(result, Err(AnnotatorError::NoCurrentImage { .. })));
        assert!(!m.is_drawing());
        assert!(!tool.busy);
    }
}

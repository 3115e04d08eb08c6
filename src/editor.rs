//! Editing of finished shapes: selection, vertex and corner drags, midpoint
//! insertion and labels.
//!
//! Drags work on a live copy of the shape's points so the renderer can follow
//! the pointer; the store only sees the result when the drag ends. Midpoint
//! insertion and label edits are committed immediately.

use crate::error::{AnnotatorError, Result};
use crate::geometry::{self, Point};
use crate::model::{ImageId, ShapeGeometry, ShapeId, ToolState};
use crate::state::AnnotationStore;

/// Rectangle corner handles, in handle index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RectCorner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl RectCorner {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(RectCorner::TopLeft),
            1 => Some(RectCorner::TopRight),
            2 => Some(RectCorner::BottomRight),
            3 => Some(RectCorner::BottomLeft),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        match self {
            RectCorner::TopLeft => RectCorner::BottomRight,
            RectCorner::TopRight => RectCorner::BottomLeft,
            RectCorner::BottomRight => RectCorner::TopLeft,
            RectCorner::BottomLeft => RectCorner::TopRight,
        }
    }
}

/// Active drag.
#[derive(Debug, Clone, PartialEq)]
enum Drag {
    Vertex {
        image_id: ImageId,
        shape_id: ShapeId,
        index: usize,
        points: Vec<f32>,
    },
    Corner {
        image_id: ImageId,
        shape_id: ShapeId,
        /// Corner that stays put, taken from the rectangle before the drag
        anchor: Point,
        points: [f32; 4],
    },
}

impl Drag {
    fn shape_id(&self) -> &ShapeId {
        match self {
            Drag::Vertex { shape_id, .. } | Drag::Corner { shape_id, .. } => shape_id,
        }
    }
}

/// Selection and edit state for shapes on the current image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeEditor {
    selected: Option<ShapeId>,
    drag: Option<Drag>,
}

impl ShapeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select a shape. Any previous selection is replaced.
    pub fn select(&mut self, shape_id: ShapeId) {
        if self.selected.as_ref() != Some(&shape_id) {
            self.drag = None;
        }
        log::debug!("Selected shape {}", shape_id);
        self.selected = Some(shape_id);
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.drag = None;
    }

    pub fn selected(&self) -> Option<&ShapeId> {
        self.selected.as_ref()
    }

    /// Click on the image outside any shape. Deselects and clears the busy
    /// flag; returns whether anything was selected.
    pub fn click_empty_canvas(&mut self, tool: &mut ToolState) -> bool {
        if self.selected.is_none() {
            return false;
        }
        self.deselect();
        tool.busy = false;
        true
    }

    /// Points to render for a shape: the live drag buffer while it is being
    /// dragged, `None` otherwise.
    pub fn live_points(&self, shape_id: &ShapeId) -> Option<&[f32]> {
        match &self.drag {
            Some(Drag::Vertex {
                shape_id: id,
                points,
                ..
            }) if id == shape_id => Some(points),
            Some(Drag::Corner {
                shape_id: id,
                points,
                ..
            }) if id == shape_id => Some(points),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ========================================================================
    // Polygon vertices
    // ========================================================================

    /// Start dragging vertex `index` of a polygon on the current image.
    pub fn begin_vertex_drag(
        &mut self,
        store: &AnnotationStore,
        shape_id: &ShapeId,
        index: usize,
    ) -> Result<()> {
        let (image_id, geometry) = current_shape(store, shape_id)?;
        let ShapeGeometry::Polygon { points } = geometry else {
            return Err(AnnotatorError::invalid_geometry(
                "vertex drag needs a polygon",
            ));
        };
        if index >= points.len() / 2 {
            return Err(AnnotatorError::invalid_geometry(format!(
                "vertex {} out of range for {} vertices",
                index,
                points.len() / 2
            )));
        }

        self.drag = Some(Drag::Vertex {
            image_id,
            shape_id: shape_id.clone(),
            index,
            points,
        });
        Ok(())
    }

    /// Move the dragged vertex to `pointer`. Visual only.
    pub fn drag_vertex(&mut self, pointer: Option<Point>) -> bool {
        let (Some(p), Some(Drag::Vertex { index, points, .. })) = (pointer, self.drag.as_mut())
        else {
            return false;
        };
        points[*index * 2] = p.x;
        points[*index * 2 + 1] = p.y;
        true
    }

    /// Commit the vertex drag. Returns `false` if no vertex drag was active.
    pub fn end_vertex_drag(&mut self, store: &mut AnnotationStore) -> Result<bool> {
        match self.drag.take() {
            Some(Drag::Vertex {
                image_id,
                shape_id,
                points,
                ..
            }) => {
                store.update_shape(&image_id, &shape_id, &points)?;
                Ok(true)
            }
            other => {
                self.drag = other;
                Ok(false)
            }
        }
    }

    /// Midpoint markers of a polygon: marker `j` sits between vertex `j` and
    /// `j + 1`, the last one between the last vertex and vertex 0.
    pub fn midpoints(points: &[f32]) -> Vec<Point> {
        let vertices = geometry::point_chunks(points);
        let n = vertices.len();
        (0..n)
            .map(|j| geometry::midpoint(vertices[j], vertices[(j + 1) % n]))
            .collect()
    }

    /// Insert a vertex at midpoint `after` (between vertex `after` and the next
    /// one, wrapping) and commit it. Returns the new vertex.
    pub fn insert_midpoint(
        &mut self,
        store: &mut AnnotationStore,
        shape_id: &ShapeId,
        after: usize,
    ) -> Result<Point> {
        let (image_id, geometry) = current_shape(store, shape_id)?;
        let ShapeGeometry::Polygon { points } = geometry else {
            return Err(AnnotatorError::invalid_geometry(
                "midpoint insertion needs a polygon",
            ));
        };
        let n = points.len() / 2;
        if after >= n {
            return Err(AnnotatorError::invalid_geometry(format!(
                "edge {} out of range for {} vertices",
                after, n
            )));
        }

        let next = (after + 1) % n;
        let added = geometry::interpolate(
            points[after * 2],
            points[after * 2 + 1],
            points[next * 2],
            points[next * 2 + 1],
            0.5,
        );

        let split = after * 2 + 2;
        let mut new_points = Vec::with_capacity(points.len() + 2);
        new_points.extend_from_slice(&points[..split]);
        new_points.extend_from_slice(&[added.x, added.y]);
        new_points.extend_from_slice(&points[split..]);

        store.update_shape(&image_id, shape_id, &new_points)?;
        log::debug!(
            "Inserted vertex ({:.1}, {:.1}) after {} on shape {}",
            added.x,
            added.y,
            after,
            shape_id
        );
        Ok(added)
    }

    // ========================================================================
    // Rectangle corners
    // ========================================================================

    /// Handle positions of a rectangle in [`RectCorner`] order.
    pub fn corner_handles(points: [f32; 4]) -> [Point; 4] {
        let [x0, y0, x1, y1] = geometry::normalize_rect(points);
        [
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    /// Start dragging corner `corner` (0..3) of a rectangle on the current image.
    pub fn begin_corner_drag(
        &mut self,
        store: &AnnotationStore,
        shape_id: &ShapeId,
        corner: usize,
    ) -> Result<()> {
        let corner = RectCorner::from_index(corner).ok_or_else(|| {
            AnnotatorError::invalid_geometry(format!("no rectangle corner {}", corner))
        })?;
        let (image_id, geometry) = current_shape(store, shape_id)?;
        let ShapeGeometry::Rectangle { points } = geometry else {
            return Err(AnnotatorError::invalid_geometry(
                "corner drag needs a rectangle",
            ));
        };

        let anchor = Self::corner_handles(points)[corner.opposite().index()];
        self.drag = Some(Drag::Corner {
            image_id,
            shape_id: shape_id.clone(),
            anchor,
            points,
        });
        Ok(())
    }

    /// Move the dragged corner to `pointer`, keeping the opposite corner fixed.
    /// Visual only.
    pub fn drag_corner(&mut self, pointer: Option<Point>) -> bool {
        let (Some(p), Some(Drag::Corner { anchor, points, .. })) = (pointer, self.drag.as_mut())
        else {
            return false;
        };
        *points = geometry::normalize_rect([anchor.x, anchor.y, p.x, p.y]);
        true
    }

    /// Commit the corner drag. Returns `false` if no corner drag was active.
    pub fn end_corner_drag(&mut self, store: &mut AnnotationStore) -> Result<bool> {
        match self.drag.take() {
            Some(Drag::Corner {
                image_id,
                shape_id,
                points,
                ..
            }) => {
                store.update_shape(&image_id, &shape_id, &points)?;
                log::debug!("Resized rectangle {}", shape_id);
                Ok(true)
            }
            other => {
                self.drag = other;
                Ok(false)
            }
        }
    }

    /// Abandon any drag without committing it.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            log::debug!("Drag of shape {} abandoned", drag.shape_id());
        }
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Apply label input for a shape on the current image. Empty or cancelled
    /// (`None`) input clears the label.
    pub fn edit_label(
        &self,
        store: &mut AnnotationStore,
        shape_id: &ShapeId,
        input: Option<&str>,
    ) -> Result<()> {
        let label = input.filter(|s| !s.is_empty()).map(str::to_string);
        store.set_label(shape_id, label)
    }
}

/// Id of the current image and a copy of the shape's geometry.
fn current_shape(store: &AnnotationStore, shape_id: &ShapeId) -> Result<(ImageId, ShapeGeometry)> {
    let image = store.current_image().ok_or(AnnotatorError::NoCurrentImage {
        index: store.current_index(),
        len: store.len(),
    })?;
    let shape = image
        .shape(shape_id)
        .ok_or_else(|| AnnotatorError::shape_not_found(shape_id.as_str()))?;
    Ok((image.id.clone(), shape.geometry.clone()))
}

//! Annotation set storage and mutation.
//!
//! The store owns every [`ImageAnnotation`], the index of the image being
//! annotated, and the point buffer of the shape currently being drawn.
//!
//! Images are kept sorted by id. Replacing the whole set re-sorts it; single
//! shape commits and edits never change image ids, so they only touch the
//! affected record (found through an id -> position index) and the order is
//! the same as if the whole set had been re-sorted.

use std::collections::HashMap;

use crate::error::{AnnotatorError, Result};
use crate::geometry::{self, Point};
use crate::model::{ImageAnnotation, ImageId, NewImage, Shape, ShapeId};

/// Receives image references that should be warmed in the background.
pub trait Preloader {
    /// Start loading `source`. Must not block.
    fn preload(&mut self, source: &str);
}

/// Collects requested sources without loading anything.
impl Preloader for Vec<String> {
    fn preload(&mut self, source: &str) {
        self.push(source.to_string());
    }
}

/// Points of the shape being drawn.
///
/// `committed` holds placed vertices; `preview` is the live cursor position
/// that follows the pointer and is replaced on every move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawBuffer {
    committed: Vec<f32>,
    preview: Option<Point>,
}

impl DrawBuffer {
    /// Committed coordinates followed by the preview pair, if any.
    pub fn flat(&self) -> Vec<f32> {
        let mut out = self.committed.clone();
        if let Some(p) = self.preview {
            out.extend_from_slice(&[p.x, p.y]);
        }
        out
    }

    pub fn committed(&self) -> &[f32] {
        &self.committed
    }

    pub fn preview(&self) -> Option<Point> {
        self.preview
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.preview.is_none()
    }

    /// First committed vertex.
    pub fn first_vertex(&self) -> Option<Point> {
        geometry::point_chunks(&self.committed).first().copied()
    }
}

/// Owner of the annotation set.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    /// All images, sorted by id.
    images: Vec<ImageAnnotation>,
    /// Image id -> position in `images`.
    positions: HashMap<ImageId, usize>,
    /// Active image. Not validated by `set_current_index`.
    current_index: usize,
    /// In-progress shape points.
    draw_buffer: DrawBuffer,
    /// Set when shapes or images change, cleared by the renderer.
    dirty: bool,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Default::default()
        }
    }

    /// Check if the store has been modified since last clear_dirty().
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Call after re-rendering the shapes.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // ========================================================================
    // Image set
    // ========================================================================

    /// Replace the annotation set.
    ///
    /// Entries without an id get a generated one, the set is sorted by id, and
    /// every referenced image is handed to `preloader`. The active index
    /// becomes `focus` when given, otherwise the previous index; either way it
    /// is clamped into the new set.
    pub fn set_annotation_set(
        &mut self,
        images: Vec<NewImage>,
        focus: Option<usize>,
        preloader: &mut dyn Preloader,
    ) {
        let mut images: Vec<ImageAnnotation> =
            images.into_iter().map(NewImage::into_annotation).collect();
        images.sort_by(|a, b| a.id.cmp(&b.id));

        for image in &images {
            preloader.preload(&image.image_data);
        }

        self.images = images;
        self.rebuild_positions();

        let wanted = focus.unwrap_or(self.current_index);
        self.current_index = wanted.min(self.images.len().saturating_sub(1));
        self.mark_dirty();

        log::info!(
            "Annotation set replaced: {} images, current index {}",
            self.images.len(),
            self.current_index
        );
    }

    fn rebuild_positions(&mut self) {
        self.positions = self
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| (image.id.clone(), i))
            .collect();
    }

    /// Set the active image index.
    ///
    /// The index is stored as given. An out-of-range index leaves the store
    /// without a current image until a navigation call or set replacement
    /// brings it back into range.
    pub fn set_current_index(&mut self, index: usize) {
        if index >= self.images.len() {
            log::warn!(
                "Current index {} set outside of {} images",
                index,
                self.images.len()
            );
        }
        self.current_index = index;
        self.mark_dirty();
    }

    /// Move to the next image, stopping at the last one.
    pub fn next_image(&mut self) {
        if self.images.is_empty() {
            return;
        }
        let last = self.images.len() - 1;
        self.current_index = (self.current_index + 1).min(last);
        self.mark_dirty();
        log::debug!("Next image: index {}", self.current_index);
    }

    /// Move to the previous image, stopping at the first one.
    pub fn previous_image(&mut self) {
        if self.images.is_empty() {
            return;
        }
        let last = self.images.len() - 1;
        self.current_index = self.current_index.saturating_sub(1).min(last);
        self.mark_dirty();
        log::debug!("Previous image: index {}", self.current_index);
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn images(&self) -> &[ImageAnnotation] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image(&self, id: &ImageId) -> Option<&ImageAnnotation> {
        self.positions.get(id).and_then(|&i| self.images.get(i))
    }

    fn image_mut(&mut self, id: &ImageId) -> Result<&mut ImageAnnotation> {
        let pos = *self
            .positions
            .get(id)
            .ok_or_else(|| AnnotatorError::image_not_found(id.as_str()))?;
        self.images
            .get_mut(pos)
            .ok_or_else(|| AnnotatorError::image_not_found(id.as_str()))
    }

    /// The image being annotated, if the index is in range.
    pub fn current_image(&self) -> Option<&ImageAnnotation> {
        self.images.get(self.current_index)
    }

    fn current_image_mut(&mut self) -> Result<&mut ImageAnnotation> {
        let index = self.current_index;
        let len = self.images.len();
        self.images
            .get_mut(index)
            .ok_or(AnnotatorError::NoCurrentImage { index, len })
    }

    // ========================================================================
    // Shapes
    // ========================================================================

    /// Append a finished shape to the current image.
    pub fn add_shape_to_current_image(&mut self, shape: Shape) -> Result<ShapeId> {
        let image = self.current_image_mut()?;
        let id = shape.id.clone();
        log::info!(
            "Added {} {} to image {} ({} shapes)",
            shape.kind().name(),
            id,
            image.id,
            image.shapes.len() + 1
        );
        image.shapes.push(shape);
        self.mark_dirty();
        Ok(id)
    }

    /// Replace the points of one shape, leaving everything else untouched.
    pub fn update_shape(
        &mut self,
        image_id: &ImageId,
        shape_id: &ShapeId,
        new_points: &[f32],
    ) -> Result<()> {
        let image = self.image_mut(image_id)?;
        let shape = image
            .shape_mut(shape_id)
            .ok_or_else(|| AnnotatorError::shape_not_found(shape_id.as_str()))?;
        shape.set_points(new_points)?;
        log::debug!("Updated points of shape {} on image {}", shape_id, image_id);
        self.mark_dirty();
        Ok(())
    }

    /// Set or clear the label of a shape on the current image.
    pub fn set_label(&mut self, shape_id: &ShapeId, label: Option<String>) -> Result<()> {
        let image = self.current_image_mut()?;
        let shape = image
            .shape_mut(shape_id)
            .ok_or_else(|| AnnotatorError::shape_not_found(shape_id.as_str()))?;
        log::debug!("Label of shape {} set to {:?}", shape_id, label);
        shape.label = label;
        self.mark_dirty();
        Ok(())
    }

    /// Remove a shape and return it.
    pub fn remove_shape(&mut self, image_id: &ImageId, shape_id: &ShapeId) -> Result<Shape> {
        let image = self.image_mut(image_id)?;
        let pos = image
            .shapes
            .iter()
            .position(|s| &s.id == shape_id)
            .ok_or_else(|| AnnotatorError::shape_not_found(shape_id.as_str()))?;
        let removed = image.shapes.remove(pos);
        log::info!("Removed shape {} from image {}", shape_id, image_id);
        self.mark_dirty();
        Ok(removed)
    }

    // ========================================================================
    // In-progress points
    // ========================================================================

    /// Replace the committed points and drop any preview.
    pub fn set_current_points(&mut self, points: Vec<f32>) {
        self.draw_buffer = DrawBuffer {
            committed: points,
            preview: None,
        };
    }

    /// Append committed points.
    pub fn add_points(&mut self, points: &[f32]) {
        self.draw_buffer.committed.extend_from_slice(points);
    }

    /// Drop the last committed vertex. The preview point is kept.
    pub fn undo_last_points(&mut self) {
        let committed = &mut self.draw_buffer.committed;
        let keep = committed.len().saturating_sub(2);
        committed.truncate(keep);
        log::debug!("Undo last point: {} vertices left", committed.len() / 2);
    }

    /// Set or clear the live preview point.
    pub fn set_preview_point(&mut self, point: Option<Point>) {
        self.draw_buffer.preview = point;
    }

    pub fn clear_current_points(&mut self) {
        self.draw_buffer = DrawBuffer::default();
    }

    /// Committed points followed by the preview pair.
    pub fn current_points(&self) -> Vec<f32> {
        self.draw_buffer.flat()
    }

    pub fn committed_points(&self) -> &[f32] {
        self.draw_buffer.committed()
    }

    pub fn draw_buffer(&self) -> &DrawBuffer {
        &self.draw_buffer
    }
}

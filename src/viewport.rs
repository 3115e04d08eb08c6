//! Pan/zoom transform of the annotation stage.
//!
//! Screen coordinates map to model (image) coordinates through
//! `model = (screen - position) / scale`. The controller is the only writer of
//! `scale` and `position`; wheel, pinch and resize input all go through here.

use serde::{Deserialize, Serialize};

use crate::config::Preferences;
use crate::geometry::{self, Point};

/// Distances below this are treated as zero when pinching.
const MIN_PINCH_DISTANCE: f32 = 1e-3;

/// Size of the drawing surface in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl ScreenSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// What the mouse wheel does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WheelMode {
    /// Zoom around the pointer
    #[default]
    Zoom,
    /// Scroll horizontally
    PanX,
    /// Scroll vertically
    PanY,
}

/// Axis for wheel panning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanAxis {
    X,
    Y,
}

/// Two-finger gesture state from the previous touch frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchBaseline {
    center: Point,
    distance: f32,
}

/// Owner of the stage transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    /// Per-axis scale. Kept uniform by every operation here.
    scale: Point,
    /// Stage translation in screen pixels.
    position: Point,
    screen_size: ScreenSize,
    wheel_mode: WheelMode,
    pinch: Option<PinchBaseline>,
    /// Zoom factor per wheel step
    scale_by: f32,
    /// Wheel delta multiplier when panning
    scroll_smoothing: f32,
    /// Screen-space handle radius
    handle_size: f32,
    /// Screen-space stroke width
    stroke_width: f32,
}

impl ViewportController {
    pub fn new(screen_size: ScreenSize, preferences: &Preferences) -> Self {
        Self {
            scale: Point::new(1.0, 1.0),
            position: Point::default(),
            screen_size,
            wheel_mode: WheelMode::Zoom,
            pinch: None,
            scale_by: preferences.scale_by,
            scroll_smoothing: preferences.scroll_smoothing,
            handle_size: preferences.handle_size,
            stroke_width: preferences.stroke_width,
        }
    }

    pub fn scale(&self) -> Point {
        self.scale
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn screen_size(&self) -> ScreenSize {
        self.screen_size
    }

    pub fn wheel_mode(&self) -> WheelMode {
        self.wheel_mode
    }

    pub fn set_wheel_mode(&mut self, mode: WheelMode) {
        log::debug!("Wheel mode: {:?} -> {:?}", self.wheel_mode, mode);
        self.wheel_mode = mode;
    }

    /// Switch the wheel to panning, alternating between the vertical and
    /// horizontal axis. From zoom mode the first toggle pans vertically.
    pub fn toggle_pan_axis(&mut self) {
        let next = match self.wheel_mode {
            WheelMode::Zoom | WheelMode::PanX => WheelMode::PanY,
            WheelMode::PanY => WheelMode::PanX,
        };
        self.set_wheel_mode(next);
    }

    // ========================================================================
    // Wheel
    // ========================================================================

    /// Zoom by `scale_factor` keeping the model point under `pointer` fixed.
    ///
    /// Positive `delta_y` zooms out, anything else zooms in.
    pub fn zoom_at_pointer(&mut self, pointer: Point, delta_y: f32, scale_factor: f32) {
        let model = self.screen_to_model(pointer);

        let new_scale = if delta_y > 0.0 {
            Point::new(self.scale.x / scale_factor, self.scale.y / scale_factor)
        } else {
            Point::new(self.scale.x * scale_factor, self.scale.y * scale_factor)
        };

        self.scale = new_scale;
        self.position = Point::new(
            pointer.x - model.x * new_scale.x,
            pointer.y - model.y * new_scale.y,
        );

        log::debug!(
            "Zoom at ({:.1}, {:.1}): scale={:.4}, position=({:.1}, {:.1})",
            pointer.x,
            pointer.y,
            self.scale.x,
            self.position.x,
            self.position.y
        );
    }

    /// Translate along `axis` by `delta_y * smoothing`.
    pub fn pan_by_wheel(&mut self, delta_y: f32, axis: PanAxis, smoothing: f32) {
        let offset = delta_y * smoothing;
        match axis {
            PanAxis::X => self.position.x += offset,
            PanAxis::Y => self.position.y += offset,
        }
    }

    /// Apply a wheel event according to the current wheel mode.
    ///
    /// Zooming needs the pointer position; without one the event is ignored.
    /// Returns whether the transform changed.
    pub fn handle_wheel(&mut self, pointer: Option<Point>, delta_y: f32) -> bool {
        match self.wheel_mode {
            WheelMode::Zoom => match pointer {
                Some(pointer) => {
                    self.zoom_at_pointer(pointer, delta_y, self.scale_by);
                    true
                }
                None => false,
            },
            WheelMode::PanX => {
                self.pan_by_wheel(delta_y, PanAxis::X, self.scroll_smoothing);
                true
            }
            WheelMode::PanY => {
                self.pan_by_wheel(delta_y, PanAxis::Y, self.scroll_smoothing);
                true
            }
        }
    }

    // ========================================================================
    // Touch
    // ========================================================================

    /// Two-finger pan and zoom.
    ///
    /// The first call of a gesture only records the centroid and finger
    /// distance. Later calls scale by the distance ratio and move the stage so
    /// the model point that was under the previous centroid ends up under the
    /// new one. Returns whether the transform changed.
    pub fn pinch_pan_zoom(&mut self, touch1: Point, touch2: Point) -> bool {
        let center = geometry::centroid(touch1, touch2);
        let distance = geometry::distance(touch1, touch2);

        let Some(baseline) = self.pinch else {
            self.pinch = Some(PinchBaseline { center, distance });
            log::debug!("Pinch started at ({:.1}, {:.1})", center.x, center.y);
            return false;
        };

        if baseline.distance < MIN_PINCH_DISTANCE || distance < MIN_PINCH_DISTANCE {
            // Fingers on top of each other: no usable ratio, just re-seed.
            self.pinch = Some(PinchBaseline { center, distance });
            return false;
        }

        let anchor = self.screen_to_model(baseline.center);
        let ratio = distance / baseline.distance;
        let new_scale = Point::new(self.scale.x * ratio, self.scale.y * ratio);

        self.scale = new_scale;
        self.position = Point::new(
            center.x - anchor.x * new_scale.x,
            center.y - anchor.y * new_scale.y,
        );
        self.pinch = Some(PinchBaseline { center, distance });

        log::debug!(
            "Pinch: scale={:.4}, position=({:.1}, {:.1})",
            self.scale.x,
            self.position.x,
            self.position.y
        );
        true
    }

    /// Forget the pinch baseline. Call when the touch sequence ends.
    pub fn end_pinch(&mut self) {
        self.pinch = None;
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    // ========================================================================
    // Fit and resize
    // ========================================================================

    /// Set a uniform scale mapping the image's smaller side onto the
    /// viewport's smaller side. The position is left as is.
    pub fn reset_to_fit_image(
        &mut self,
        image_width: f32,
        image_height: f32,
        viewport_width: f32,
        viewport_height: f32,
    ) {
        if image_width.min(image_height) <= 0.0 {
            log::warn!(
                "Ignoring fit to degenerate image {}x{}",
                image_width,
                image_height
            );
            return;
        }
        if viewport_width.min(viewport_height) <= 0.0 {
            log::warn!(
                "Ignoring fit to empty viewport {}x{}",
                viewport_width,
                viewport_height
            );
            return;
        }
        let s = geometry::fit_by_smaller_dimension(
            image_width,
            image_height,
            viewport_width,
            viewport_height,
        );
        self.scale = Point::new(s, s);
        log::debug!("Fit image {}x{}: scale={:.4}", image_width, image_height, s);
    }

    /// Update the screen size and refit to the given image, if any.
    pub fn resize(&mut self, screen_size: ScreenSize, image_size: Option<(f32, f32)>) {
        self.screen_size = screen_size;
        if let Some((w, h)) = image_size {
            self.reset_to_fit_image(w, h, screen_size.width, screen_size.height);
        }
    }

    // ========================================================================
    // Coordinates and render sizes
    // ========================================================================

    pub fn screen_to_model(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.position.x) / self.scale.x,
            (screen.y - self.position.y) / self.scale.y,
        )
    }

    pub fn model_to_screen(&self, model: Point) -> Point {
        Point::new(
            model.x * self.scale.x + self.position.x,
            model.y * self.scale.y + self.position.y,
        )
    }

    /// Handle radius in model units, constant on screen.
    pub fn handle_radius(&self) -> f32 {
        self.handle_size / self.scale.x
    }

    /// Stroke width in model units, constant on screen.
    pub fn stroke_width(&self) -> f32 {
        self.stroke_width / self.scale.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn viewport() -> ViewportController {
        ViewportController::new(ScreenSize::new(800.0, 600.0), &Preferences::default())
    }

    #[test]
    fn test_zoom_round_trip() {
        let cases = [
            (1.0, Point::new(0.0, 0.0), Point::new(400.0, 300.0), 1.05),
            (2.5, Point::new(-120.0, 35.0), Point::new(10.0, 590.0), 1.2),
            (0.3, Point::new(50.0, 50.0), Point::new(799.0, 1.0), 2.0),
        ];
        for (s, p, q, f) in cases {
            let mut vp = viewport();
            vp.scale = Point::new(s, s);
            vp.position = p;

            vp.zoom_at_pointer(q, 1.0, f);
            vp.zoom_at_pointer(q, -1.0, f);

            assert!(approx_eq(vp.scale().x, s), "scale {} != {}", vp.scale().x, s);
            assert!(approx_eq(vp.position().x, p.x));
            assert!(approx_eq(vp.position().y, p.y));
        }
    }

    #[test]
    fn test_zoom_keeps_pointer_model_point() {
        let mut vp = viewport();
        vp.position = Point::new(30.0, -10.0);
        let pointer = Point::new(200.0, 150.0);
        let before = vp.screen_to_model(pointer);

        vp.zoom_at_pointer(pointer, -3.0, 1.05);
        assert!(approx_eq(vp.scale().x, 1.05));
        let after = vp.screen_to_model(pointer);
        assert!(approx_eq(before.x, after.x));
        assert!(approx_eq(before.y, after.y));
    }

    #[test]
    fn test_positive_delta_zooms_out() {
        let mut vp = viewport();
        vp.zoom_at_pointer(Point::new(0.0, 0.0), 100.0, 2.0);
        assert!(approx_eq(vp.scale().x, 0.5));
        assert!(approx_eq(vp.scale().y, 0.5));
    }

    #[test]
    fn test_wheel_pan_modes() {
        let mut vp = viewport();
        vp.toggle_pan_axis();
        assert_eq!(vp.wheel_mode(), WheelMode::PanY);
        assert!(vp.handle_wheel(None, 10.0));
        assert!(approx_eq(vp.position().y, 3.0));
        assert!(approx_eq(vp.position().x, 0.0));

        vp.toggle_pan_axis();
        assert_eq!(vp.wheel_mode(), WheelMode::PanX);
        vp.handle_wheel(None, -20.0);
        assert!(approx_eq(vp.position().x, -6.0));

        vp.toggle_pan_axis();
        assert_eq!(vp.wheel_mode(), WheelMode::PanY);
        vp.set_wheel_mode(WheelMode::Zoom);
        assert!(!vp.handle_wheel(None, 1.0));
        assert!(approx_eq(vp.scale().x, 1.0));
    }

    #[test]
    fn test_pinch_first_call_only_seeds() {
        let mut vp = viewport();
        assert!(!vp.pinch_pan_zoom(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        assert_eq!(vp.scale(), Point::new(1.0, 1.0));
        assert_eq!(vp.position(), Point::default());
        assert!(vp.is_pinching());
    }

    #[test]
    fn test_pinch_spread_zooms_around_center() {
        let mut vp = viewport();
        vp.pinch_pan_zoom(Point::new(50.0, 100.0), Point::new(150.0, 100.0));
        let anchor = vp.screen_to_model(Point::new(100.0, 100.0));

        assert!(vp.pinch_pan_zoom(Point::new(0.0, 100.0), Point::new(200.0, 100.0)));
        assert!(approx_eq(vp.scale().x, 2.0));
        let after = vp.model_to_screen(anchor);
        assert!(approx_eq(after.x, 100.0));
        assert!(approx_eq(after.y, 100.0));
    }

    #[test]
    fn test_pinch_pure_pan() {
        let mut vp = viewport();
        vp.pinch_pan_zoom(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        vp.pinch_pan_zoom(Point::new(20.0, 5.0), Point::new(30.0, 5.0));
        assert!(approx_eq(vp.scale().x, 1.0));
        assert!(approx_eq(vp.position().x, 20.0));
        assert!(approx_eq(vp.position().y, 5.0));
    }

    #[test]
    fn test_pinch_baseline_resets() {
        let mut vp = viewport();
        vp.pinch_pan_zoom(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        vp.end_pinch();
        assert!(!vp.is_pinching());
        // A new gesture far away must not jump the stage.
        assert!(!vp.pinch_pan_zoom(Point::new(500.0, 500.0), Point::new(600.0, 500.0)));
        assert_eq!(vp.position(), Point::default());
    }

    #[test]
    fn test_pinch_zero_distance_is_ignored() {
        let mut vp = viewport();
        vp.pinch_pan_zoom(Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        assert!(!vp.pinch_pan_zoom(Point::new(0.0, 0.0), Point::new(10.0, 0.0)));
        assert_eq!(vp.scale(), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_fit_by_smaller_dimension() {
        let mut vp = viewport();
        vp.position = Point::new(7.0, 8.0);
        vp.reset_to_fit_image(1000.0, 300.0, 800.0, 600.0);
        assert!(approx_eq(vp.scale().x, 2.0));
        assert!(approx_eq(vp.scale().y, 2.0));
        assert_eq!(vp.position(), Point::new(7.0, 8.0));

        vp.reset_to_fit_image(0.0, 300.0, 800.0, 600.0);
        assert!(approx_eq(vp.scale().x, 2.0));
    }

    #[test]
    fn test_resize_refits() {
        let mut vp = viewport();
        vp.resize(ScreenSize::new(400.0, 200.0), Some((100.0, 400.0)));
        assert_eq!(vp.screen_size(), ScreenSize::new(400.0, 200.0));
        assert!(approx_eq(vp.scale().x, 2.0));

        vp.resize(ScreenSize::new(1000.0, 1000.0), None);
        assert!(approx_eq(vp.scale().x, 2.0));
    }

    #[test]
    fn test_resize_to_empty_viewport_keeps_scale() {
        let mut vp = viewport();
        vp.resize(ScreenSize::new(800.0, 600.0), Some((300.0, 300.0)));
        vp.resize(ScreenSize::new(0.0, 0.0), Some((300.0, 300.0)));
        assert_eq!(vp.screen_size(), ScreenSize::new(0.0, 0.0));
        assert!(approx_eq(vp.scale().x, 2.0));

        vp.zoom_at_pointer(Point::new(0.0, 0.0), -1.0, 1.05);
        vp.resize(ScreenSize::new(800.0, 600.0), Some((300.0, 300.0)));
        assert!(approx_eq(vp.scale().x, 2.0));
        assert!(vp.position().x.is_finite());
        assert!(vp.position().y.is_finite());
    }

    #[test]
    fn test_coordinate_conversion_and_sizes() {
        let mut vp = viewport();
        vp.scale = Point::new(2.0, 2.0);
        vp.position = Point::new(10.0, 20.0);
        let model = vp.screen_to_model(Point::new(30.0, 40.0));
        assert_eq!(model, Point::new(10.0, 10.0));
        assert_eq!(vp.model_to_screen(model), Point::new(30.0, 40.0));
        assert!(approx_eq(vp.handle_radius(), 2.0));
        assert!(approx_eq(vp.stroke_width(), 1.0));
    }
}

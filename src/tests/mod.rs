//! Scenario tests that drive a full session through input events.

mod navigation_tests;

use std::time::Duration;

use crate::config::AnnotatorConfig;
use crate::error::{AnnotatorError, Result};
use crate::geometry::Point;
use crate::keybindings::{KeyChord, KeyCode};
use crate::model::Shape;
use crate::session::{ClickTarget, InputEvent, Session};
use crate::state::ImageCache;
use crate::viewport::ScreenSize;

/// Fake image sizes keyed by source name.
fn fake_fetcher(source: &str) -> Result<(u32, u32)> {
    match source {
        "wide.png" => Ok((200, 100)),
        "square.png" => Ok((300, 300)),
        "tall.png" => Ok((100, 400)),
        other => Err(AnnotatorError::decode(other, "unknown test image")),
    }
}

/// Session on an 800x600 screen with the given images loaded and the first
/// one fitted.
fn session_with(sources: &[&str]) -> Session {
    let cache = ImageCache::with_fetcher(fake_fetcher).expect("spawn cache");
    let mut session = Session::new(
        &AnnotatorConfig::default(),
        ScreenSize::new(800.0, 600.0),
        cache,
    );
    session.load_images(sources.iter().map(|s| s.to_string()).collect());
    session.wait_for_current_image(Duration::from_secs(5));
    session
}

fn key(session: &mut Session, key: KeyCode) -> bool {
    session
        .handle_event(InputEvent::Key {
            chord: KeyChord::press(key),
        })
        .expect("key handled")
}

fn click_image(session: &mut Session, x: f32, y: f32) -> bool {
    session
        .handle_event(InputEvent::Click {
            pointer: Some(Point::new(x, y)),
            target: ClickTarget::Image,
        })
        .expect("click handled")
}

fn current_shapes(session: &Session) -> Vec<Shape> {
    session
        .store()
        .current_image()
        .map(|i| i.shapes.clone())
        .unwrap_or_default()
}

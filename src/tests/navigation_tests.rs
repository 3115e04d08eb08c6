//! Image navigation, viewport fitting and wheel/touch handling.

use super::*;
use crate::model::{ImageId, NewImage, ShapeId};
use crate::state::ImageStatus;
use crate::viewport::WheelMode;

const EPSILON: f32 = 1e-3;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Three images with fixed ids so the sorted order is known, all preloaded.
fn session_with_three() -> Session {
    let mut session = session_with(&[]);
    session.replace_images(
        vec![
            NewImage::from_source("tall.png").with_id("c"),
            NewImage::from_source("wide.png").with_id("a"),
            NewImage::from_source("square.png").with_id("b"),
        ],
        Some(0),
    );
    for source in ["wide.png", "square.png", "tall.png"] {
        let status = session
            .cache_mut()
            .wait_for(source, Duration::from_secs(5));
        assert!(matches!(status, Some(ImageStatus::Loaded { .. })));
    }
    session.wait_for_current_image(Duration::from_secs(5));
    session
}

fn current_id(session: &Session) -> Option<ImageId> {
    session.store().current_image().map(|i| i.id.clone())
}

#[test]
fn test_images_are_ordered_by_id() {
    let session = session_with_three();
    let ids: Vec<&str> = session
        .store()
        .images()
        .iter()
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(current_id(&session), Some(ImageId::from("a")));
}

#[test]
fn test_navigation_refits_and_clamps() {
    let mut session = session_with_three();
    assert!(approx_eq(session.viewport().scale().x, 6.0));

    key(&mut session, KeyCode::D);
    assert_eq!(current_id(&session), Some(ImageId::from("b")));
    assert!(approx_eq(session.viewport().scale().x, 2.0));

    key(&mut session, KeyCode::Right);
    key(&mut session, KeyCode::D);
    assert_eq!(session.store().current_index(), 2);
    assert_eq!(current_id(&session), Some(ImageId::from("c")));
    assert!(approx_eq(session.viewport().scale().x, 6.0));

    key(&mut session, KeyCode::A);
    assert!(approx_eq(session.viewport().scale().x, 2.0));
    key(&mut session, KeyCode::Left);
    key(&mut session, KeyCode::Left);
    assert_eq!(session.store().current_index(), 0);
}

#[test]
fn test_navigation_drops_selection() {
    let mut session = session_with_three();
    session
        .handle_event(InputEvent::Click {
            pointer: None,
            target: ClickTarget::Shape {
                shape_id: ShapeId::from("s"),
            },
        })
        .expect("select");
    assert!(session.editor().selected().is_some());
    key(&mut session, KeyCode::D);
    assert_eq!(session.editor().selected(), None);
}

#[test]
fn test_failed_image_keeps_viewport() {
    let mut session = session_with(&["wide.png"]);
    session.replace_images(vec![NewImage::from_source("missing.png")], Some(0));
    let status = session.wait_for_current_image(Duration::from_secs(5));
    assert!(matches!(status, Some(ImageStatus::Failed(_))));
    assert_eq!(session.current_image_size(), None);
    assert!(approx_eq(session.viewport().scale().x, 6.0));
}

#[test]
fn test_wheel_zooms_at_pointer() {
    let mut session = session_with(&["wide.png"]);
    let pointer = Point::new(120.0, 60.0);
    let before = session.viewport().screen_to_model(pointer);

    assert!(
        session
            .handle_event(InputEvent::Wheel {
                pointer: Some(pointer),
                delta_y: -100.0,
            })
            .expect("wheel")
    );
    let viewport = session.viewport();
    assert!(approx_eq(viewport.scale().x, 6.0 * 1.05));
    let after = viewport.screen_to_model(pointer);
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
}

#[test]
fn test_ctrl_switches_wheel_to_panning() {
    let mut session = session_with(&["wide.png"]);
    assert_eq!(session.viewport().wheel_mode(), WheelMode::Zoom);

    key(&mut session, KeyCode::Control);
    assert_eq!(session.viewport().wheel_mode(), WheelMode::PanY);
    session
        .handle_event(InputEvent::Wheel {
            pointer: None,
            delta_y: 10.0,
        })
        .expect("wheel");
    assert!(approx_eq(session.viewport().position().y, 3.0));
    assert!(approx_eq(session.viewport().scale().x, 6.0));

    key(&mut session, KeyCode::Control);
    assert_eq!(session.viewport().wheel_mode(), WheelMode::PanX);

    session
        .handle_event(InputEvent::Key {
            chord: KeyChord::release(KeyCode::Control),
        })
        .expect("key");
    assert_eq!(session.viewport().wheel_mode(), WheelMode::Zoom);
}

#[test]
fn test_pinch_through_touch_events() {
    let mut session = session_with(&["wide.png"]);
    let seed = session
        .handle_event(InputEvent::Touch {
            touches: vec![Point::new(100.0, 100.0), Point::new(200.0, 100.0)],
        })
        .expect("touch");
    assert!(!seed);

    let moved = session
        .handle_event(InputEvent::Touch {
            touches: vec![Point::new(50.0, 100.0), Point::new(250.0, 100.0)],
        })
        .expect("touch");
    assert!(moved);
    let viewport = session.viewport();
    assert!(approx_eq(viewport.scale().x, 12.0));
    assert!(approx_eq(viewport.position().x, -150.0));
    assert!(approx_eq(viewport.position().y, -100.0));

    session.handle_event(InputEvent::TouchEnd).expect("touch end");
    assert!(!session.viewport().is_pinching());

    // A single finger does nothing.
    let single = session
        .handle_event(InputEvent::Touch {
            touches: vec![Point::new(10.0, 10.0)],
        })
        .expect("touch");
    assert!(!single);
}

#[test]
fn test_resize_refits_current_image() {
    let mut session = session_with(&["wide.png"]);
    session
        .handle_event(InputEvent::Resize {
            size: ScreenSize::new(400.0, 300.0),
        })
        .expect("resize");
    assert!(approx_eq(session.viewport().scale().x, 3.0));
    assert_eq!(session.viewport().screen_size(), ScreenSize::new(400.0, 300.0));
}

#[test]
fn test_empty_set_hides_canvas_but_keeps_keys() {
    let mut session = session_with(&[]);
    assert!(
        !session
            .handle_event(InputEvent::Wheel {
                pointer: Some(Point::new(1.0, 1.0)),
                delta_y: -1.0,
            })
            .expect("wheel")
    );
    assert!(session.tool().thumbnails_visible);
    assert!(key(&mut session, KeyCode::Key4));
    assert!(!session.tool().thumbnails_visible);
    // Navigation on an empty set is harmless.
    key(&mut session, KeyCode::D);
    assert_eq!(session.store().current_image(), None);
}

#[test]
fn test_events_from_json() {
    let click: InputEvent = serde_json::from_str(
        r#"{"event":"click","pointer":{"x":1.0,"y":2.0},"target":{"kind":"shape","shape_id":"s1"}}"#,
    )
    .expect("valid click");
    assert_eq!(
        click,
        InputEvent::Click {
            pointer: Some(Point::new(1.0, 2.0)),
            target: ClickTarget::Shape {
                shape_id: ShapeId::from("s1"),
            },
        }
    );

    let key_event: InputEvent =
        serde_json::from_str(r#"{"event":"key","chord":{"key":"D"}}"#).expect("valid key");
    assert_eq!(
        key_event,
        InputEvent::Key {
            chord: KeyChord::press(KeyCode::D),
        }
    );

    let end: InputEvent = serde_json::from_str(r#"{"event":"drag_end"}"#).expect("valid end");
    assert_eq!(end, InputEvent::DragEnd);
}

#[test]
fn test_minimized_window_does_not_poison_viewport() {
    let mut session = session_with(&["square.png"]);
    session
        .handle_event(InputEvent::Resize {
            size: ScreenSize::new(0.0, 0.0),
        })
        .expect("resize");
    session
        .handle_event(InputEvent::Wheel {
            pointer: Some(Point::new(0.0, 0.0)),
            delta_y: -1.0,
        })
        .expect("wheel");
    session
        .handle_event(InputEvent::Resize {
            size: ScreenSize::new(800.0, 600.0),
        })
        .expect("resize");

    let viewport = session.viewport();
    assert!(approx_eq(viewport.scale().x, 2.0));
    assert!(viewport.position().x.is_finite());
    assert!(viewport.position().y.is_finite());
}

#[test]
fn test_held_ctrl_toggles_pan_axis_once() {
    let mut session = session_with(&["wide.png"]);
    key(&mut session, KeyCode::Control);
    for _ in 0..3 {
        let changed = session
            .handle_event(InputEvent::Key {
                chord: KeyChord::press(KeyCode::Control).repeated(),
            })
            .expect("key");
        assert!(!changed);
    }
    assert_eq!(session.viewport().wheel_mode(), WheelMode::PanY);
}

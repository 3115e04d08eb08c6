//! Customizable keybindings for the annotation canvas.
//!
//! Raw key chords are mapped to the logical [`Action`]s the session consumes.
//! A chord is a key, whether Ctrl is held, and whether the key went down or up,
//! so holding and releasing Ctrl can drive two different actions.

use serde::{Deserialize, Serialize};

use crate::model::ToolMode;

/// Keys the canvas can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Delete,
    Backspace,
    Enter,
    Space,
    Tab,
    Control,
}

impl KeyCode {
    /// Modifier keys ignore the Ctrl flag when matched.
    pub fn is_modifier(&self) -> bool {
        matches!(self, KeyCode::Control)
    }
}

/// Key went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    #[default]
    Pressed,
    Released,
}

/// A key event as seen by the bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: KeyCode,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub state: KeyState,
    /// Generated by key auto-repeat while the key is held
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeat: bool,
}

impl KeyChord {
    /// Plain key press without modifiers.
    pub fn press(key: KeyCode) -> Self {
        Self {
            key,
            ctrl: false,
            state: KeyState::Pressed,
            repeat: false,
        }
    }

    /// Key press with Ctrl held.
    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            ctrl: true,
            ..Self::press(key)
        }
    }

    pub fn release(key: KeyCode) -> Self {
        Self {
            state: KeyState::Released,
            ..Self::press(key)
        }
    }

    /// The same chord, marked as an auto-repeat.
    pub fn repeated(self) -> Self {
        Self {
            repeat: true,
            ..self
        }
    }

    fn normalized(self) -> Self {
        let chord = Self {
            repeat: false,
            ..self
        };
        if chord.key.is_modifier() {
            Self {
                ctrl: false,
                ..chord
            }
        } else {
            chord
        }
    }
}

/// Logical actions triggered from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Switch the wheel to panning, alternating axes
    TogglePanAxis,
    /// Switch the wheel back to zooming
    ZoomMode,
    NextImage,
    PrevImage,
    /// Abort the shape being drawn
    Cancel,
    /// Drop the last placed vertex of the shape being drawn
    UndoLastPoint,
    SelectTool(ToolMode),
    ToggleThumbnails,
    /// Remove the selected shape
    DeleteSelected,
}

impl Action {
    /// Actions that flip state; a held key must not flip it back and forth.
    pub fn is_toggle(&self) -> bool {
        matches!(self, Action::TogglePanAxis | Action::ToggleThumbnails)
    }

    /// Get the display name for this action.
    pub fn name(&self) -> String {
        match self {
            Action::TogglePanAxis => "Toggle pan axis".to_string(),
            Action::ZoomMode => "Zoom mode".to_string(),
            Action::NextImage => "Next image".to_string(),
            Action::PrevImage => "Previous image".to_string(),
            Action::Cancel => "Cancel drawing".to_string(),
            Action::UndoLastPoint => "Undo last point".to_string(),
            Action::SelectTool(tool) => format!("{} tool", tool.name()),
            Action::ToggleThumbnails => "Toggle thumbnails".to_string(),
            Action::DeleteSelected => "Delete selected shape".to_string(),
        }
    }
}

/// Keybinding table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    bindings: Vec<(KeyChord, Action)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = vec![
            // Toolbar: 0 upload, 1-3 tools, 4 thumbnails
            (KeyChord::press(KeyCode::Key0), Action::SelectTool(ToolMode::Upload)),
            (KeyChord::press(KeyCode::Key1), Action::SelectTool(ToolMode::Pointer)),
            (KeyChord::press(KeyCode::Key2), Action::SelectTool(ToolMode::Polygon)),
            (KeyChord::press(KeyCode::Key3), Action::SelectTool(ToolMode::Rectangle)),
            (KeyChord::press(KeyCode::Key4), Action::ToggleThumbnails),
            // Navigation
            (KeyChord::press(KeyCode::D), Action::NextImage),
            (KeyChord::press(KeyCode::Right), Action::NextImage),
            (KeyChord::press(KeyCode::A), Action::PrevImage),
            (KeyChord::press(KeyCode::Left), Action::PrevImage),
            // Holding Ctrl pans with the wheel, releasing it zooms again
            (KeyChord::press(KeyCode::Control), Action::TogglePanAxis),
            (KeyChord::release(KeyCode::Control), Action::ZoomMode),
            // Drawing
            (KeyChord::press(KeyCode::Escape), Action::Cancel),
            (KeyChord::ctrl(KeyCode::Z), Action::UndoLastPoint),
            (KeyChord::press(KeyCode::Delete), Action::DeleteSelected),
            (KeyChord::press(KeyCode::Backspace), Action::DeleteSelected),
        ];
        Self { bindings }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Get the action bound to a chord, if any. Auto-repeats never fire toggles.
    pub fn action_for(&self, chord: KeyChord) -> Option<Action> {
        let action = self.bound_action(chord)?;
        if chord.repeat && action.is_toggle() {
            return None;
        }
        Some(action)
    }

    fn bound_action(&self, chord: KeyChord) -> Option<Action> {
        let chord = chord.normalized();
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == chord)
            .map(|(_, action)| *action)
    }

    /// All chords bound to an action.
    pub fn keys_for(&self, action: Action) -> Vec<KeyChord> {
        self.bindings
            .iter()
            .filter(|(_, a)| *a == action)
            .map(|(chord, _)| *chord)
            .collect()
    }

    /// Bind a chord, replacing whatever it was bound to.
    pub fn set_binding(&mut self, chord: KeyChord, action: Action) {
        let chord = chord.normalized();
        self.bindings.retain(|(bound, _)| *bound != chord);
        self.bindings.push((chord, action));
    }

    /// Remove a binding. Returns the action it was bound to.
    pub fn clear_binding(&mut self, chord: KeyChord) -> Option<Action> {
        let chord = chord.normalized();
        let pos = self.bindings.iter().position(|(bound, _)| *bound == chord)?;
        Some(self.bindings.remove(pos).1)
    }

    /// Check if a chord is already used by another action.
    /// Returns a description of what it's used for, if anything.
    pub fn key_conflict(&self, chord: KeyChord, exclude: Option<Action>) -> Option<String> {
        self.bound_action(chord)
            .filter(|action| Some(*action) != exclude)
            .map(|action| action.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(KeyChord, Action)> {
        self.bindings.iter()
    }
}

/// Convert a KeyCode to a display string.
pub fn key_to_string(key: KeyCode) -> &'static str {
    match key {
        KeyCode::A => "A",
        KeyCode::B => "B",
        KeyCode::C => "C",
        KeyCode::D => "D",
        KeyCode::E => "E",
        KeyCode::F => "F",
        KeyCode::G => "G",
        KeyCode::H => "H",
        KeyCode::I => "I",
        KeyCode::J => "J",
        KeyCode::K => "K",
        KeyCode::L => "L",
        KeyCode::M => "M",
        KeyCode::N => "N",
        KeyCode::O => "O",
        KeyCode::P => "P",
        KeyCode::Q => "Q",
        KeyCode::R => "R",
        KeyCode::S => "S",
        KeyCode::T => "T",
        KeyCode::U => "U",
        KeyCode::V => "V",
        KeyCode::W => "W",
        KeyCode::X => "X",
        KeyCode::Y => "Y",
        KeyCode::Z => "Z",
        KeyCode::Key0 => "0",
        KeyCode::Key1 => "1",
        KeyCode::Key2 => "2",
        KeyCode::Key3 => "3",
        KeyCode::Key4 => "4",
        KeyCode::Key5 => "5",
        KeyCode::Key6 => "6",
        KeyCode::Key7 => "7",
        KeyCode::Key8 => "8",
        KeyCode::Key9 => "9",
        KeyCode::Left => "Left",
        KeyCode::Right => "Right",
        KeyCode::Up => "Up",
        KeyCode::Down => "Down",
        KeyCode::Escape => "Esc",
        KeyCode::Delete => "Delete",
        KeyCode::Backspace => "Backspace",
        KeyCode::Enter => "Enter",
        KeyCode::Space => "Space",
        KeyCode::Tab => "Tab",
        KeyCode::Control => "Ctrl",
    }
}

/// Display string for a chord, e.g. `Ctrl+Z`.
pub fn chord_to_string(chord: KeyChord) -> String {
    let key = key_to_string(chord.key);
    let mut out = if chord.ctrl && !chord.key.is_modifier() {
        format!("Ctrl+{}", key)
    } else {
        key.to_string()
    };
    if chord.state == KeyState::Released {
        out.push_str(" (release)");
    }
    out
}

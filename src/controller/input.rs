/// Platform-agnostic input handling system
use std::collections::HashMap;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Pointer events, positions in logical pixels from the viewport's top-left
    PointerMoved { x: f32, y: f32 },
    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerUp { button: MouseButton, x: f32, y: f32 },
    Wheel { delta_y: f32 },

    // Window events
    FocusLost,
    Resized { width: f32, height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// Lowercase key identifier -> currently held
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeldKeys {
    keys: HashMap<String, bool>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: &str) {
        self.keys.insert(key.to_lowercase(), true);
    }

    pub fn release(&mut self, key: &str) {
        self.keys.insert(key.to_lowercase(), false);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    pub fn any_held(&self, keys: &[String]) -> bool {
        keys.iter().any(|k| self.is_held(k))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn held_count(&self) -> usize {
        self.keys.values().filter(|held| **held).count()
    }
}

/// Everything the keyboard can do to the selected object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformAction {
    Forward,
    Backward,
    Left,
    Right,
    RotateLeft,
    RotateRight,
    Up,
    Down,
    RollLeft,
    RollRight,
    Grow,
    Shrink,
}

impl TransformAction {
    pub const ALL: [TransformAction; 12] = [
        TransformAction::Forward,
        TransformAction::Backward,
        TransformAction::Left,
        TransformAction::Right,
        TransformAction::RotateLeft,
        TransformAction::RotateRight,
        TransformAction::Up,
        TransformAction::Down,
        TransformAction::RollLeft,
        TransformAction::RollRight,
        TransformAction::Grow,
        TransformAction::Shrink,
    ];
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

/// Key mapping configuration. Each action lists every key that triggers it;
/// the second letter of each group is the same physical key on a Russian
/// ЙЦУКЕН layout.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub rotate_left: Vec<String>,
    pub rotate_right: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub roll_left: Vec<String>,
    pub roll_right: Vec<String>,
    pub grow: Vec<String>,
    pub shrink: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: keys(&["w", "ц"]),
            backward: keys(&["s", "ы"]),
            left: keys(&["a", "ф"]),
            right: keys(&["d", "в"]),
            rotate_left: keys(&["q", "й"]),
            rotate_right: keys(&["e", "у"]),
            up: keys(&["arrowup"]),
            down: keys(&["arrowdown"]),
            roll_left: keys(&["arrowleft"]),
            roll_right: keys(&["arrowright"]),
            grow: keys(&["+", "="]),
            shrink: keys(&["-", "_"]),
        }
    }
}

impl KeyBindings {
    pub fn keys_for(&self, action: TransformAction) -> &[String] {
        match action {
            TransformAction::Forward => &self.forward,
            TransformAction::Backward => &self.backward,
            TransformAction::Left => &self.left,
            TransformAction::Right => &self.right,
            TransformAction::RotateLeft => &self.rotate_left,
            TransformAction::RotateRight => &self.rotate_right,
            TransformAction::Up => &self.up,
            TransformAction::Down => &self.down,
            TransformAction::RollLeft => &self.roll_left,
            TransformAction::RollRight => &self.roll_right,
            TransformAction::Grow => &self.grow,
            TransformAction::Shrink => &self.shrink,
        }
    }

    /// Whether `key` drives any transform; the browser's default action is suppressed for those
    pub fn is_bound(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        TransformAction::ALL
            .iter()
            .any(|a| self.keys_for(*a).iter().any(|k| *k == key))
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn is_active(&self, action: TransformAction, held: &HeldKeys) -> bool {
        held.any_held(self.bindings.keys_for(action))
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent, WheelEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerMoved {
            x: e.offset_x() as f32,
            y: e.offset_y() as f32,
        }
    }

    pub fn mouse_click_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        let button = MouseButton::from_web_button(e.button());
        let (x, y) = (e.offset_x() as f32, e.offset_y() as f32);
        if is_down {
            InputEvent::PointerDown { button, x, y }
        } else {
            InputEvent::PointerUp { button, x, y }
        }
    }

    pub fn mouse_wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::Wheel { delta_y: e.delta_y() as f32 }
    }
}

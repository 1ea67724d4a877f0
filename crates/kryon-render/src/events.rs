// crates/kryon-render/src/events.rs
//
// Raw input events as delivered by a host's input driver, distinct from
// `kryon_core::EventType` (the UI-level event taxonomy a handler property
// is keyed on). The runtime's event queue (§4.7) translates one of these
// into hit-testing plus a `kryon_core::EventType` dispatch.

use glam::Vec2;

#[derive(Debug, Clone)]
pub enum InputEvent {
    MouseMove { position: Vec2 },
    MousePress { position: Vec2, button: MouseButton },
    MouseRelease { position: Vec2, button: MouseButton },
    TextInput { text: String },
    KeyPress { key: KeyCode, modifiers: KeyModifiers },
    KeyRelease { key: KeyCode, modifiers: KeyModifiers },
    WindowFocus { focused: bool },
    Resize { size: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Escape,
    Space,
    Backspace,
    Delete,
    Tab,
    Character(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyModifiers {
    pub fn none() -> Self {
        Self { ctrl: false, shift: false, alt: false, meta: false }
    }
}

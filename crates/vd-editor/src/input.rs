//! Input abstraction layer.
//!
//! Normalizes mouse and trackpad events from the host page into a unified
//! `InputEvent` enum consumed by the viewport controller. Keys go straight
//! to `ShortcutMap`; only their `Modifiers` are shared.
//! Coordinates are canvas-relative pixels.

/// Keyboard modifiers held while the event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    /// Space bar held (temporary hand tool).
    pub space: bool,
}

impl Modifiers {
    /// Ctrl on Windows/Linux, ⌘ on macOS. Turns the wheel into zoom.
    pub fn zoom(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Turns a primary-button drag into a canvas pan.
    pub fn pan(&self) -> bool {
        self.space
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` code.
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// A normalized input event from any pointing device or keyboard.
#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },

    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },

    PointerUp {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },

    /// Wheel or trackpad scroll. `delta_y` is the raw `WheelEvent.deltaY`
    /// (positive = scroll down).
    Wheel {
        x: f64,
        y: f64,
        delta_y: f64,
        modifiers: Modifiers,
    },
}

//! Input abstraction layer.
//!
//! The host (browser canvas, native window) normalizes its pointer, wheel
//! and keyboard callbacks into [`InputEvent`]s. Pointer events carry both
//! coordinate spaces: world positions drive hit testing and editing, screen
//! positions drive panning and zoom.

use kurbo::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// ⌘ on macOS, Ctrl elsewhere. Toggles multi-select membership.
    pub fn additive(self) -> bool {
        self.ctrl || self.meta
    }

    /// Shift at pointer-down starts a rubber-band selection.
    pub fn area_select(self) -> bool {
        self.shift
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        world: Point,
        screen: Point,
        modifiers: Modifiers,
    },
    PointerMove {
        world: Point,
        screen: Point,
        modifiers: Modifiers,
    },
    PointerUp {
        world: Point,
        screen: Point,
        modifiers: Modifiers,
    },
    /// Mouse wheel. Positive `delta_y` zooms out.
    Wheel { screen: Point, delta_y: f64 },
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    Key {
        key: String,
        modifiers: Modifiers,
        /// Focus is inside a text field; editing shortcuts must not fire.
        text_input_focused: bool,
    },
}

impl InputEvent {
    /// Pointer event whose world and screen positions coincide
    /// (identity viewport). Handy for tests and headless drivers.
    pub fn pointer_down(x: f64, y: f64, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            world: Point::new(x, y),
            screen: Point::new(x, y),
            modifiers,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            world: Point::new(x, y),
            screen: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            world: Point::new(x, y),
            screen: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
            text_input_focused: false,
        }
    }

    /// World position if this is a pointer event.
    pub fn world(&self) -> Option<Point> {
        match self {
            Self::PointerDown { world, .. }
            | Self::PointerMove { world, .. }
            | Self::PointerUp { world, .. } => Some(*world),
            _ => None,
        }
    }
}

//! Platform-agnostic input vocabulary.
//!
//! The windowing layer translates its native events into these types before
//! handing them to [`InputController`](crate::controller::InputController).
//! Conversions from `winit` are provided behind the `viewer` feature.

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left) mouse button.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
    /// Any other button (back, forward, vendor buttons).
    Other,
}

/// Whether a mouse button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// The button was pressed.
    Press,
    /// The button was released.
    Release,
}

/// Keyboard event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Initial key press.
    Press,
    /// Auto-repeat while held.
    Repeat,
    /// Key released.
    Release,
}

/// Keys the controller responds to. Everything else maps to [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Top-row digit `1..=9`.
    Digit(u8),
    /// `V`: toggle the auxiliary top-mesh layer.
    V,
    /// `R`: toggle the rendering options panel.
    R,
    /// Space: request a screenshot.
    Space,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Unhandled key.
    Other,
}

impl Key {
    /// Digit key for `n`, or [`Key::Other`] outside `1..=9`.
    pub fn digit(n: u8) -> Self {
        if (1..=9).contains(&n) {
            Key::Digit(n)
        } else {
            Key::Other
        }
    }
}

/// Modifier keys held while an event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Either shift key.
    pub shift: bool,
    /// Either control key.
    pub ctrl: bool,
    /// Either alt / option key.
    pub alt: bool,
    /// Super / command / windows key.
    pub logo: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        logo: false,
    };
    /// Only shift held.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    /// Only control held.
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
    /// Only alt held.
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// True when no modifier at all is held.
    pub fn is_empty(self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.logo)
    }

    /// Combine two modifier sets.
    pub fn union(self, other: Self) -> Self {
        Self {
            shift: self.shift || other.shift,
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            logo: self.logo || other.logo,
        }
    }
}

#[cfg(feature = "viewer")]
mod winit_conv {
    use super::*;
    use winit::event::ElementState;
    use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

    impl From<winit::event::MouseButton> for MouseButton {
        fn from(button: winit::event::MouseButton) -> Self {
            match button {
                winit::event::MouseButton::Left => Self::Left,
                winit::event::MouseButton::Right => Self::Right,
                winit::event::MouseButton::Middle => Self::Middle,
                _ => Self::Other,
            }
        }
    }

    impl From<ElementState> for ButtonAction {
        fn from(state: ElementState) -> Self {
            match state {
                ElementState::Pressed => Self::Press,
                ElementState::Released => Self::Release,
            }
        }
    }

    impl KeyAction {
        /// Build from a winit key event's state and repeat flag.
        pub fn from_winit(state: ElementState, repeat: bool) -> Self {
            match (state, repeat) {
                (ElementState::Released, _) => Self::Release,
                (ElementState::Pressed, true) => Self::Repeat,
                (ElementState::Pressed, false) => Self::Press,
            }
        }
    }

    impl From<ModifiersState> for Modifiers {
        fn from(state: ModifiersState) -> Self {
            Self {
                shift: state.shift_key(),
                ctrl: state.control_key(),
                alt: state.alt_key(),
                logo: state.super_key(),
            }
        }
    }

    impl From<PhysicalKey> for Key {
        fn from(key: PhysicalKey) -> Self {
            let PhysicalKey::Code(code) = key else {
                return Key::Other;
            };
            match code {
                KeyCode::Digit1 => Key::Digit(1),
                KeyCode::Digit2 => Key::Digit(2),
                KeyCode::Digit3 => Key::Digit(3),
                KeyCode::Digit4 => Key::Digit(4),
                KeyCode::Digit5 => Key::Digit(5),
                KeyCode::Digit6 => Key::Digit(6),
                KeyCode::Digit7 => Key::Digit(7),
                KeyCode::Digit8 => Key::Digit(8),
                KeyCode::Digit9 => Key::Digit(9),
                KeyCode::KeyV => Key::V,
                KeyCode::KeyR => Key::R,
                KeyCode::Space => Key::Space,
                KeyCode::ArrowLeft => Key::Left,
                KeyCode::ArrowRight => Key::Right,
                KeyCode::ArrowUp => Key::Up,
                KeyCode::ArrowDown => Key::Down,
                _ => Key::Other,
            }
        }
    }
}

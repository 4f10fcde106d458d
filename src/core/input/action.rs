//=========================================================================
// Action Identifiers
//=========================================================================
//
// Stable names for the physical inputs a binding may claim.
//
// Represents the physical key or pointer primitive, not the character
// produced. `KeyA` is the same key on QWERTY and AZERTY layouts.
//
// Every identifier has a camelCase wire name (`keyA`, `mouseLeft`, ...)
// used by embedding layers that address actions by string.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::str::FromStr;

//=== ActionId ============================================================

/// Physical input a binding may claim.
///
/// Ordering follows declaration order and is used to order the actions
/// of a single binding when they are published for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionId {
    //--- Numeric Keys -----------------------------------------------------

    /// Number row: 0-9
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    //--- Alphabetic Keys --------------------------------------------------

    /// Letter keys: A-Z (physical location, not character)
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Arrow Keys -------------------------------------------------------

    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Special Keys -----------------------------------------------------

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,

    //--- Modifier Keys ----------------------------------------------------

    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,

    //--- Pointer Primitives -----------------------------------------------

    /// Primary button (typically left).
    MouseLeft,

    /// Secondary button (typically right).
    MouseRight,

    /// Middle button (wheel click).
    MouseMiddle,

    /// Wheel scroll in either direction. Press-only.
    MouseWheel,

    /// Fallback for inputs the platform reports but the core does not name.
    Unidentified,
}

impl ActionId {
    /// Every named identifier, in declaration order. Excludes `Unidentified`.
    pub const ALL: [ActionId; 56] = {
        use ActionId::*;
        [
            Digit0, Digit1, Digit2, Digit3, Digit4,
            Digit5, Digit6, Digit7, Digit8, Digit9,
            KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
            KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
            KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
            ArrowDown, ArrowLeft, ArrowRight, ArrowUp,
            Space, Enter, Escape, Tab, Backspace, Delete,
            ShiftLeft, ShiftRight, ControlLeft, ControlRight, AltLeft, AltRight,
            MouseLeft, MouseRight, MouseMiddle, MouseWheel,
        ]
    };

    /// Wire name of this identifier.
    pub const fn name(self) -> &'static str {
        use ActionId::*;
        match self {
            Digit0 => "digit0", Digit1 => "digit1", Digit2 => "digit2",
            Digit3 => "digit3", Digit4 => "digit4", Digit5 => "digit5",
            Digit6 => "digit6", Digit7 => "digit7", Digit8 => "digit8",
            Digit9 => "digit9",

            KeyA => "keyA", KeyB => "keyB", KeyC => "keyC", KeyD => "keyD",
            KeyE => "keyE", KeyF => "keyF", KeyG => "keyG", KeyH => "keyH",
            KeyI => "keyI", KeyJ => "keyJ", KeyK => "keyK", KeyL => "keyL",
            KeyM => "keyM", KeyN => "keyN", KeyO => "keyO", KeyP => "keyP",
            KeyQ => "keyQ", KeyR => "keyR", KeyS => "keyS", KeyT => "keyT",
            KeyU => "keyU", KeyV => "keyV", KeyW => "keyW", KeyX => "keyX",
            KeyY => "keyY", KeyZ => "keyZ",

            ArrowDown => "arrowDown", ArrowLeft => "arrowLeft",
            ArrowRight => "arrowRight", ArrowUp => "arrowUp",

            Space => "space", Enter => "enter", Escape => "escape",
            Tab => "tab", Backspace => "backspace", Delete => "delete",

            ShiftLeft => "shiftLeft", ShiftRight => "shiftRight",
            ControlLeft => "controlLeft", ControlRight => "controlRight",
            AltLeft => "altLeft", AltRight => "altRight",

            MouseLeft => "mouseLeft", MouseRight => "mouseRight",
            MouseMiddle => "mouseMiddle", MouseWheel => "mouseWheel",

            Unidentified => "unidentified",
        }
    }

    /// Resolves a wire name. Unknown names resolve to `Unidentified`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name() == name)
            .unwrap_or(Self::Unidentified)
    }

    /// Returns true for mouse buttons and the wheel.
    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::MouseLeft | Self::MouseRight | Self::MouseMiddle | Self::MouseWheel
        )
    }
}

//--- Trait Implementations -----------------------------------------------

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsing never fails; unknown names become `Unidentified`.
impl FromStr for ActionId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

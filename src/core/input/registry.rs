//=========================================================================
// Action Registry
//=========================================================================
//
// Static lookup from action identifiers to on-screen prompt glyphs.
//
//   ActionId → label ("A", "Space", "Esc", ...)
//   ActionId → glyph (pointer icon | text pill | "?" placeholder)
//
// Pure functions, no state. Unknown identifiers never fail; they render
// as the "?" placeholder.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::{ActionId, BindingKey};

//=== Glyphs ==============================================================

/// Distinguished icons for pointer primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionIcon {
    MouseLeft,
    MouseRight,
    MouseWheel,
}

/// How a prompt for an action is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionGlyph {
    /// Pointer primitive drawn as an icon.
    Icon(ActionIcon),

    /// Key cap with a short text label.
    Pill(&'static str),
}

/// Label used for anything the registry cannot name.
pub const PLACEHOLDER_LABEL: &str = "?";

//=== ActionRegistry ======================================================

/// Maps action identifiers to human-readable labels and glyphs.
pub struct ActionRegistry;

impl ActionRegistry {
    /// Short key-cap label for keyboard keys, `None` for everything else.
    pub fn key_label(id: ActionId) -> Option<&'static str> {
        use ActionId::*;
        let label = match id {
            Digit0 => "0", Digit1 => "1", Digit2 => "2", Digit3 => "3",
            Digit4 => "4", Digit5 => "5", Digit6 => "6", Digit7 => "7",
            Digit8 => "8", Digit9 => "9",

            KeyA => "A", KeyB => "B", KeyC => "C", KeyD => "D", KeyE => "E",
            KeyF => "F", KeyG => "G", KeyH => "H", KeyI => "I", KeyJ => "J",
            KeyK => "K", KeyL => "L", KeyM => "M", KeyN => "N", KeyO => "O",
            KeyP => "P", KeyQ => "Q", KeyR => "R", KeyS => "S", KeyT => "T",
            KeyU => "U", KeyV => "V", KeyW => "W", KeyX => "X", KeyY => "Y",
            KeyZ => "Z",

            ArrowDown => "↓", ArrowLeft => "←", ArrowRight => "→", ArrowUp => "↑",

            Space => "Space", Enter => "Enter", Escape => "Esc", Tab => "Tab",
            Backspace => "Backspace", Delete => "Del",

            ShiftLeft | ShiftRight => "Shift",
            ControlLeft | ControlRight => "Ctrl",
            AltLeft | AltRight => "Alt",

            MouseLeft | MouseRight | MouseMiddle | MouseWheel | Unidentified => return None,
        };
        Some(label)
    }

    /// Human-readable label, `"?"` when unknown.
    pub fn label(id: ActionId) -> &'static str {
        match id {
            ActionId::MouseLeft => "Left Click",
            ActionId::MouseRight => "Right Click",
            ActionId::MouseWheel => "Scroll",
            other => Self::key_label(other).unwrap_or(PLACEHOLDER_LABEL),
        }
    }

    /// Glyph drawn in an on-screen prompt for `id`.
    pub fn glyph(id: ActionId) -> ActionGlyph {
        match id {
            ActionId::ControlLeft => ActionGlyph::Pill("Ctrl"),
            ActionId::MouseLeft => ActionGlyph::Icon(ActionIcon::MouseLeft),
            ActionId::MouseRight => ActionGlyph::Icon(ActionIcon::MouseRight),
            ActionId::MouseWheel => ActionGlyph::Icon(ActionIcon::MouseWheel),
            other => ActionGlyph::Pill(Self::key_label(other).unwrap_or(PLACEHOLDER_LABEL)),
        }
    }

    /// Glyph for an identifier addressed by wire name.
    pub fn glyph_for_name(name: &str) -> ActionGlyph {
        Self::glyph(ActionId::from_name(name))
    }
}

//=== ActionDescriptor ====================================================

/// Display projection of one currently bound action.
///
/// Derived from the binding registry; never stored by bindings themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionDescriptor {
    /// Stable key for list rendering: `"{binding}:{action}"`.
    pub id: String,

    /// The bound action.
    pub kind: ActionId,

    /// What the action does, as supplied by the binding owner.
    pub label: String,
}

impl ActionDescriptor {
    pub(crate) fn new(binding: BindingKey, kind: ActionId, label: impl Into<String>) -> Self {
        Self {
            id: format!("{}:{}", binding.get(), kind.name()),
            kind,
            label: label.into(),
        }
    }

    /// Prompt glyph for this action.
    pub fn glyph(&self) -> ActionGlyph {
        ActionRegistry::glyph(self.kind)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

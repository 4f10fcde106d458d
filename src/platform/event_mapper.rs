//=========================================================================
// Platform Event Mapper
//
// Converts Winit window events into core `InputEvent`s.
//
// Responsibilities:
// - Translate physical keys and mouse buttons into `ActionId`s
// - Drop key repeats, so a held key is one press and one release
// - Report focus loss as a platform pointer-lock revocation
// - Provide the `Unidentified` fallback for unmapped inputs
//
//=========================================================================

use winit::event::{ElementState, KeyEvent, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::core::input::{ActionId, InputEvent};

//=== Key Conversion ======================================================

impl From<WinitKeyCode> for ActionId {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Numeric keys -----------------------------------------------------
            Digit0 => ActionId::Digit0, Digit1 => ActionId::Digit1,
            Digit2 => ActionId::Digit2, Digit3 => ActionId::Digit3,
            Digit4 => ActionId::Digit4, Digit5 => ActionId::Digit5,
            Digit6 => ActionId::Digit6, Digit7 => ActionId::Digit7,
            Digit8 => ActionId::Digit8, Digit9 => ActionId::Digit9,

            //--- Alphabetic keys --------------------------------------------------
            KeyA => ActionId::KeyA, KeyB => ActionId::KeyB, KeyC => ActionId::KeyC,
            KeyD => ActionId::KeyD, KeyE => ActionId::KeyE, KeyF => ActionId::KeyF,
            KeyG => ActionId::KeyG, KeyH => ActionId::KeyH, KeyI => ActionId::KeyI,
            KeyJ => ActionId::KeyJ, KeyK => ActionId::KeyK, KeyL => ActionId::KeyL,
            KeyM => ActionId::KeyM, KeyN => ActionId::KeyN, KeyO => ActionId::KeyO,
            KeyP => ActionId::KeyP, KeyQ => ActionId::KeyQ, KeyR => ActionId::KeyR,
            KeyS => ActionId::KeyS, KeyT => ActionId::KeyT, KeyU => ActionId::KeyU,
            KeyV => ActionId::KeyV, KeyW => ActionId::KeyW, KeyX => ActionId::KeyX,
            KeyY => ActionId::KeyY, KeyZ => ActionId::KeyZ,

            //--- Arrow keys -------------------------------------------------------
            ArrowDown => ActionId::ArrowDown, ArrowLeft => ActionId::ArrowLeft,
            ArrowRight => ActionId::ArrowRight, ArrowUp => ActionId::ArrowUp,

            //--- Special keys -----------------------------------------------------
            Space => ActionId::Space, Enter => ActionId::Enter,
            Escape => ActionId::Escape, Tab => ActionId::Tab,
            Backspace => ActionId::Backspace, Delete => ActionId::Delete,

            //--- Modifiers --------------------------------------------------------
            ShiftLeft => ActionId::ShiftLeft, ShiftRight => ActionId::ShiftRight,
            ControlLeft => ActionId::ControlLeft, ControlRight => ActionId::ControlRight,
            AltLeft => ActionId::AltLeft, AltRight => ActionId::AltRight,

            //--- Fallback ---------------------------------------------------------
            _ => ActionId::Unidentified,
        }
    }
}

//=== Mouse Conversion ====================================================

impl From<WinitMouseButton> for ActionId {
    fn from(button: WinitMouseButton) -> Self {
        match button {
            WinitMouseButton::Left => ActionId::MouseLeft,
            WinitMouseButton::Right => ActionId::MouseRight,
            WinitMouseButton::Middle => ActionId::MouseMiddle,
            _ => ActionId::Unidentified,
        }
    }
}

//=== Full Event Conversion ===============================================
//
// Notes:
// - `KeyboardInput` becomes `Press`/`Release`; repeats are dropped.
// - `MouseInput` becomes `Press`/`Release` of the mouse actions.
// - `MouseWheel` is a single `Press(MouseWheel)` per scroll event.
// - `Focused(false)` becomes `PointerLockChanged(false)`; the OS drops
//   pointer lock with focus.
// - Everything else is not input for the control layer.
//

/// Maps one window event to a core input event, if it is one.
pub fn map_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        //--- Keyboard Input ----------------------------------------------
        WindowEvent::KeyboardInput {
            event: KeyEvent { physical_key, state, repeat, .. },
            ..
        } => {
            if *repeat {
                return None;
            }
            let action = match physical_key {
                PhysicalKey::Code(code) => ActionId::from(*code),
                PhysicalKey::Unidentified(_) => ActionId::Unidentified,
            };
            Some(edge(*state, action))
        }

        //--- Mouse Button Input ------------------------------------------
        WindowEvent::MouseInput { state, button, .. } => Some(edge(*state, ActionId::from(*button))),

        //--- Mouse Wheel -------------------------------------------------
        WindowEvent::MouseWheel { .. } => Some(InputEvent::Press(ActionId::MouseWheel)),

        //--- Focus -------------------------------------------------------
        WindowEvent::Focused(false) => Some(InputEvent::PointerLockChanged(false)),

        _ => None,
    }
}

fn edge(state: ElementState, action: ActionId) -> InputEvent {
    match state {
        ElementState::Pressed => InputEvent::Press(action),
        ElementState::Released => InputEvent::Release(action),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

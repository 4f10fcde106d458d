//=========================================================================
// Input Event Types
//
// Normalized input events entering the control layer.
//
// The platform adapter (Winit) reduces OS input to these three shapes;
// everything else it sees is dropped before reaching the core.
//
// Event Flow:
// ```text
// Platform Layer (Winit)
//         ↓
//    InputEvent (this module)
//         ↓
//    ControlManager::dispatch()
//         ↓
//    highest-priority binding claiming the action
// ```
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::ActionId;

//=== Phase ===============================================================

/// Which edge of a discrete input fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Press,
    Release,
}

//=== InputEvent ==========================================================

/// Raw input event routed by the control manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// A key or button went down (or the wheel scrolled).
    Press(ActionId),

    /// A key or button came up.
    Release(ActionId),

    /// The platform reports the OS-level pointer lock state.
    PointerLockChanged(bool),
}

impl InputEvent {
    /// Returns the action and phase for discrete events.
    pub fn action(&self) -> Option<(ActionId, Phase)> {
        match *self {
            Self::Press(action) => Some((action, Phase::Press)),
            Self::Release(action) => Some((action, Phase::Release)),
            Self::PointerLockChanged(_) => None,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

//=========================================================================
// Control System
//
// Priority-arbitrated input routing for the HUD and world layers.
//
// Responsibilities:
// - Name the physical inputs a consumer may claim (`ActionId`)
// - Route each press/release to exactly one binding
// - Hold the pointer-lock capability as a singleton
// - Describe the currently bound actions for on-screen prompts
//
// Notes:
// Consumers never see each other. They only see whether they won the
// event, via their own handlers.
//
//=========================================================================

//=== Submodules ==========================================================
mod action;
mod binding;
mod event;
mod manager;
mod registry;

//=== Public Exports ======================================================
pub use action::ActionId;
pub use binding::Binding;
pub use event::{InputEvent, Phase};
pub use manager::{BindingKey, ControlManager};
pub use registry::{ActionDescriptor, ActionGlyph, ActionIcon, ActionRegistry, PLACEHOLDER_LABEL};

//=== Priorities ==========================================================

/// Conventional priority layers, lowest first.
///
/// Any `i32` is accepted; these are the bands the built-in consumers use.
pub mod priorities {
    /// Avatar movement and look.
    pub const PLAYER: i32 = 0;

    /// Interactable world entities.
    pub const ENTITY: i32 = 1;

    /// Application-level scripts.
    pub const APP: i32 = 2;

    pub const EDITOR: i32 = 3;

    /// HUD overlays such as the chat composer.
    pub const GUI: i32 = 4;
}

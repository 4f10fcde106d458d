//=========================================================================
// HUD Core
//
// Event and control coordination for the overlay layer of a world client.
//
// Responsibilities:
// - Multicast named events between overlays and the world (`event_bus`)
// - Arbitrate one input stream across prioritized consumers (`input`)
// - Keep the shared, append-only chat log and its overlays (`chat`)
// - Track the latest overlay-relevant state (`hud`)
// - Run cancellable timers on the session thread (`scheduler`)
//
// Notes:
// Everything here is single-threaded. Components are cheap `Rc` handles
// created and torn down by a `Session`; none of them is a global.
//
//=========================================================================

//=== Submodules ==========================================================
pub mod chat;
pub mod diagnostics;
pub mod error;
pub mod event_bus;
pub mod hud;
pub mod input;
pub mod scheduler;

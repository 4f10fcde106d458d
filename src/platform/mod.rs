//=========================================================================
// Platform Adapter
//
// Bridges Winit window events into the HUD control layer.
//
// Architecture:
// ```text
//  Winit Event Loop (embedding application)
//        ↓ WindowEvent
//  map_window_event()
//        ↓ InputEvent
//  Session::dispatch() → ControlManager
// ```
//
// Notes:
// The adapter owns no window and runs no event loop; the embedding
// application does both and forwards each `WindowEvent` here. Applying
// `pointer-lock` to the OS cursor is likewise left to the embedder.
//
//=========================================================================

//=== Submodules ==========================================================

mod event_mapper;

//=== Public Exports ======================================================

pub use event_mapper::map_window_event;

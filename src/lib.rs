//=========================================================================
// World HUD Library Root
//
// Overlay core of a multi-user 3D world client: input arbitration,
// pointer-lock ownership, the shared chat log and the events that tie
// the overlays together.
//
// Typical usage:
// ```
// use world_hud::prelude::*;
//
// let session = Session::new();
// let hud = session.hud_state();
//
// let walk = session.controls().bind(priorities::PLAYER);
// walk.on_press(ActionId::KeyW, || { /* move */ })
//     .label(ActionId::KeyW, "Walk");
//
// assert!(session.dispatch(InputEvent::Press(ActionId::KeyW)));
// assert_eq!(hud.actions()[0].label, "Walk");
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the session components. `platform` adapts Winit window
// events into core input events.
//
pub mod core;
pub mod platform;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
mod session;

//--- Public Exports ------------------------------------------------------
pub use session::{Session, SessionBuilder};

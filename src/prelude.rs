//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use world_hud::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Session
pub use crate::session::{Session, SessionBuilder};

// Events
pub use crate::core::event_bus::{names, EventBus, ListenerGuard, Payload};

// Controls
pub use crate::core::input::{
    priorities, ActionDescriptor, ActionGlyph, ActionId, ActionRegistry, Binding,
    ControlManager, InputEvent,
};

// Chat
pub use crate::core::chat::{
    Author, ChatComposer, ChatLog, ChatMessage, ChatTransport, MessageDraft, MessageFeed,
    Submission,
};

// Overlay state and errors
pub use crate::core::diagnostics::Diagnostic;
pub use crate::core::error::{SchedulerError, TransportError};
pub use crate::core::hud::HudState;

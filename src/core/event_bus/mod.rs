//=========================================================================
// Event Bus
//
// Named-event multicast hub shared by the whole HUD session.
//
// Responsibilities:
// - Deliver each emitted payload to every listener of that name
// - Preserve registration order as delivery order
// - Isolate panicking listeners from the rest of the fan-out
//
// Notes:
// There is no buffering. Events emitted before a listener registers are
// lost, so consumers read present state when they attach.
//
//=========================================================================

//=== Submodules ==========================================================
mod bus;
mod payload;

//=== Public Exports ======================================================
pub use bus::{EventBus, Listener, ListenerGuard, ListenerId};
pub use payload::Payload;

//=== Event Names =========================================================

/// Names of the events the HUD layers depend on.
pub mod names {
    /// The world finished loading. `Flag`.
    pub const READY: &str = "ready";

    /// A context menu opened or closed. Opaque, `Empty` closes.
    pub const CONTEXT: &str = "context";

    /// An entity inspector opened or closed. Opaque, `Empty` closes.
    pub const INSPECT: &str = "inspect";

    /// Code view toggled for the inspected entity. `Flag`.
    pub const CODE: &str = "code";

    /// The local avatar changed. Opaque.
    pub const AVATAR: &str = "avatar";

    /// The network connection was lost. `Flag`.
    pub const DISCONNECT: &str = "disconnect";

    /// The displayable action set changed. `Actions`.
    pub const ACTIONS: &str = "actions";

    /// Pointer capture was taken or given up. `Flag`.
    pub const POINTER_LOCK: &str = "pointer-lock";
}

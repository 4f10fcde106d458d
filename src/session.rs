//=========================================================================
// HUD Session
//
// Owner of one HUD session's shared state.
//
// Architecture:
// ```text
//     SessionBuilder  ──build()──>  Session  ──shutdown()/drop──>  [cleared]
//         │                           │
//         ├─ with_feed_refresh()      ├─ EventBus
//         ├─ with_close_debounce()    ├─ ControlManager
//         └─ with_diagnostics_        ├─ ChatLog
//            capacity()               ├─ Scheduler
//                                     └─ Receiver<Diagnostic>
// ```
//
// One session per world connection. Nothing here is a global: every
// component is reached through the session that created it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::info;
use winit::event::WindowEvent;

//=== Internal Dependencies ===============================================

use crate::core::chat::{ChatComposer, ChatLog, ChatTransport, MessageFeed};
use crate::core::diagnostics::{Diagnostic, Diagnostics};
use crate::core::error::SchedulerError;
use crate::core::event_bus::EventBus;
use crate::core::hud::HudState;
use crate::core::input::{ControlManager, InputEvent};
use crate::core::scheduler::Scheduler;
use crate::platform::map_window_event;

//=== SessionBuilder ======================================================

/// Builder for configuring and constructing a [`Session`].
///
/// # Default Values
///
/// - **Feed refresh**: 30 s (age label recomputation)
/// - **Close debounce**: 10 ms (composer close while pointer-locked)
/// - **Diagnostics capacity**: 64 entries
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use world_hud::SessionBuilder;
///
/// let session = SessionBuilder::new()
///     .with_feed_refresh(Duration::from_secs(15))
///     .with_diagnostics_capacity(16)
///     .build();
///
/// assert!(session.controls().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    feed_refresh: Duration,
    close_debounce: Duration,
    diagnostics_capacity: usize,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            feed_refresh: Duration::from_secs(30),
            close_debounce: Duration::from_millis(10),
            diagnostics_capacity: 64,
        }
    }

    /// Sets how often message feeds recompute their age labels.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn with_feed_refresh(mut self, period: Duration) -> Self {
        assert!(!period.is_zero(), "Feed refresh period must be non-zero");
        self.feed_refresh = period;
        self
    }

    /// Sets the delay before a composer closes while the pointer is locked.
    pub fn with_close_debounce(mut self, delay: Duration) -> Self {
        self.close_debounce = delay;
        self
    }

    /// Sets the bound of the diagnostics channel. Diagnostics reported
    /// while it is full are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_diagnostics_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Diagnostics capacity must be positive");
        self.diagnostics_capacity = capacity;
        self
    }

    pub fn build(self) -> Session {
        info!(
            target: "session",
            "Starting session (feed refresh: {:?}, close debounce: {:?}, diagnostics: {})",
            self.feed_refresh, self.close_debounce, self.diagnostics_capacity
        );

        let (diagnostics, diagnostics_rx) = Diagnostics::channel(self.diagnostics_capacity);
        let bus = EventBus::new(diagnostics.clone());

        Session {
            controls: ControlManager::new(bus.clone(), diagnostics.clone()),
            chat: ChatLog::new(bus.clone(), diagnostics.clone()),
            scheduler: Scheduler::new(diagnostics),
            bus,
            diagnostics_rx,
            feed_refresh: self.feed_refresh,
            close_debounce: self.close_debounce,
            closed: Cell::new(false),
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Session =============================================================

/// One HUD session.
///
/// # Lifecycle
///
/// 1. Build with [`SessionBuilder`]
/// 2. Attach overlays (`hud_state`, `chat_composer`, `message_feed`) and
///    the chat transport
/// 3. Each frame: forward window events, `pump()` timers, drain
///    `diagnostics()`
/// 4. `shutdown()` or drop: listeners, bindings, subscribers and timers
///    are cleared
pub struct Session {
    bus: EventBus,
    controls: ControlManager,
    chat: ChatLog,
    scheduler: Scheduler,
    diagnostics_rx: Receiver<Diagnostic>,
    feed_refresh: Duration,
    close_debounce: Duration,
    closed: Cell<bool>,
}

impl Session {
    /// Session with default settings.
    pub fn new() -> Self {
        SessionBuilder::new().build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    //--- Components -------------------------------------------------------

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn controls(&self) -> &ControlManager {
        &self.controls
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Error channel of the session. Isolated callback failures land here.
    pub fn diagnostics(&self) -> &Receiver<Diagnostic> {
        &self.diagnostics_rx
    }

    /// Takes every diagnostic currently queued.
    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics_rx.try_iter().collect()
    }

    //--- Overlays ---------------------------------------------------------

    pub fn hud_state(&self) -> HudState {
        HudState::attach(&self.bus, &self.controls)
    }

    pub fn chat_composer(&self) -> ChatComposer {
        ChatComposer::new(
            &self.controls,
            &self.bus,
            &self.chat,
            &self.scheduler,
            self.close_debounce,
        )
    }

    pub fn message_feed(&self) -> Result<MessageFeed, SchedulerError> {
        MessageFeed::new(&self.chat, &self.scheduler, self.feed_refresh)
    }

    pub fn set_chat_transport<T: ChatTransport + 'static>(&self, transport: T) {
        self.chat.set_transport(transport);
    }

    //--- Per-Frame --------------------------------------------------------

    pub fn dispatch(&self, event: InputEvent) -> bool {
        self.controls.dispatch(event)
    }

    /// Maps and dispatches a Winit event. Returns `false` for events that
    /// are not input or that no binding claimed.
    pub fn dispatch_window_event(&self, event: &WindowEvent) -> bool {
        map_window_event(event).is_some_and(|input| self.dispatch(input))
    }

    /// Runs due timer callbacks. Returns how many ran.
    pub fn pump(&self) -> usize {
        self.scheduler.pump()
    }

    pub fn pump_timeout(&self, timeout: Duration) -> usize {
        self.scheduler.pump_timeout(timeout)
    }

    //--- Teardown ---------------------------------------------------------

    /// Clears every timer, binding, chat subscriber and bus listener.
    /// Chat history survives. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.closed.replace(true) {
            return;
        }

        info!(target: "session", "Shutting down session");
        self.scheduler.shutdown();
        self.chat.clear_subscribers();
        self.controls.clear();
        self.bus.clear();
        info!(target: "session", "Session shutdown complete");
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.get()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

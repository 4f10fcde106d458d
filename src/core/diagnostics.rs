//=========================================================================
// Diagnostics
//=========================================================================
//
// Error channel between the core and the embedding application.
//
// Architecture:
//   listener / handler / subscriber / timer
//        ↓ panics
//   isolate() ──→ Diagnostic ──→ Sender<Diagnostic> (bounded)
//                                      ↓
//                       embedding application drains Receiver
//
// A panicking callback never aborts the dispatch loop that invoked it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{error, warn};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::input::{ActionId, Phase};

//=== DiagnosticOrigin ====================================================

/// Where an isolated failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticOrigin {
    /// A bus listener registered for `event`.
    Listener { event: String },

    /// A binding's press or release handler.
    ActionHandler { action: ActionId, phase: Phase },

    /// A binding's pointer-capture observer.
    CaptureObserver,

    /// A chat subscriber callback.
    ChatSubscriber,

    /// The chat network collaborator.
    ChatTransport,

    /// A scheduled timer callback.
    Timer,
}

impl DiagnosticOrigin {
    /// Log target of the subsystem the failure came from.
    pub fn target(&self) -> &'static str {
        match self {
            Self::Listener { .. } => "bus",
            Self::ActionHandler { .. } | Self::CaptureObserver => "controls",
            Self::ChatSubscriber | Self::ChatTransport => "chat",
            Self::Timer => "scheduler",
        }
    }
}

impl fmt::Display for DiagnosticOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listener { event } => write!(f, "listener for '{}'", event),
            Self::ActionHandler { action, phase } => {
                write!(f, "{:?} handler for '{}'", phase, action)
            }
            Self::CaptureObserver => f.write_str("pointer capture observer"),
            Self::ChatSubscriber => f.write_str("chat subscriber"),
            Self::ChatTransport => f.write_str("chat transport"),
            Self::Timer => f.write_str("timer callback"),
        }
    }
}

//=== Diagnostic ==========================================================

/// A failure surfaced to the embedding application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{origin}: {message}")]
pub struct Diagnostic {
    pub origin: DiagnosticOrigin,
    pub message: String,
}

impl Diagnostic {
    pub fn new(origin: DiagnosticOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
        }
    }
}

//=== Diagnostics =========================================================

/// Sending half of the error channel, shared by every core component.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    sender: Sender<Diagnostic>,
}

impl Diagnostics {
    /// Creates a bounded error channel.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn channel(capacity: usize) -> (Self, Receiver<Diagnostic>) {
        assert!(capacity > 0, "Diagnostics capacity must be positive");
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }

    /// Logs and forwards a diagnostic. Never blocks.
    pub fn report(&self, diagnostic: Diagnostic) {
        let target = diagnostic.origin.target();
        error!(target: target, "{}", diagnostic);

        match self.sender.try_send(diagnostic) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(target: target, "Diagnostics channel full, dropping: {}", dropped);
            }
            // Nobody is listening; the log line above is all we can do.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Runs `f`, reporting a panic as a diagnostic from `origin`.
    ///
    /// Returns `true` when `f` completed normally.
    pub(crate) fn guard<F: FnOnce()>(&self, origin: DiagnosticOrigin, f: F) -> bool {
        match isolate(f) {
            Ok(()) => true,
            Err(message) => {
                self.report(Diagnostic::new(origin, message));
                false
            }
        }
    }
}

//=== Panic Isolation =====================================================

/// Runs `f`, converting a panic into its message.
pub(crate) fn isolate<F: FnOnce()>(f: F) -> Result<(), String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "callback panicked with a non-string payload".to_string()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

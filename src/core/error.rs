//=========================================================================
// Core Errors
//=========================================================================
//
// Error types returned by fallible core operations.
//
// Isolated callback failures are not errors of the caller; they travel
// as `Diagnostic`s on the session's error channel instead.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== TransportError ======================================================

/// Failure reported by the network collaborator when forwarding a chat
/// message to remote participants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The outbound channel is gone. The session emits `disconnect`.
    #[error("outbound chat channel disconnected")]
    Disconnected,

    /// The collaborator refused this particular message.
    #[error("broadcast rejected: {0}")]
    Rejected(String),
}

//=== SchedulerError ======================================================

/// Failure to arm a timer.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The OS refused to start the timer thread.
    #[error("failed to spawn timer thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A repeating timer needs a non-zero period.
    #[error("repeating timer period must be non-zero")]
    ZeroPeriod,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        assert_eq!(
            TransportError::Disconnected.to_string(),
            "outbound chat channel disconnected"
        );
        assert_eq!(
            TransportError::Rejected("rate limited".into()).to_string(),
            "broadcast rejected: rate limited"
        );
    }

    #[test]
    fn scheduler_error_wraps_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        let err = SchedulerError::from(io);
        assert!(err.to_string().contains("no threads left"));
    }

    #[test]
    fn zero_period_display() {
        assert_eq!(
            SchedulerError::ZeroPeriod.to_string(),
            "repeating timer period must be non-zero"
        );
    }

    #[test]
    fn errors_implement_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<TransportError>();
        assert_error::<SchedulerError>();
    }
}

//! Error types for the core plumbing.

/// Errors raised when handing work to the owning thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The receiving side of the queue has been dropped.
    #[error("Dispatch queue has been closed")]
    QueueClosed,
}

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    #[error("Invalid or disconnected connection ID")]
    InvalidConnection,
    /// The signal has been dropped and is no longer available.
    #[error("Signal has been dropped")]
    SignalDropped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DispatchError::QueueClosed.to_string(),
            "Dispatch queue has been closed"
        );
        assert_eq!(
            SignalError::SignalDropped.to_string(),
            "Signal has been dropped"
        );
    }
}

//! Error types for the structure engine.

use horizon_structure_core::DispatchError;

use crate::change::ChangeKind;

/// Result type alias for structure engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while maintaining the structure tree.
///
/// Entities that cannot be resolved are not errors: they are expected when
/// model updates race change delivery, and are handled as no-ops.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A change record violates its own invariants.
    ///
    /// This indicates a broken change source; the batch is rejected.
    #[error("Malformed {kind} change: {reason}")]
    MalformedChange {
        kind: ChangeKind,
        reason: &'static str,
    },

    /// The tree has not been built yet.
    #[error("Structure tree has not been built; call rebuild() first")]
    NotBuilt,

    /// No filter is registered under the given id.
    #[error("Unknown filter id")]
    UnknownFilter,

    /// Engine configuration could not be parsed.
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A delta could not be handed to the owning thread.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::MalformedChange {
            kind: ChangeKind::JarPresence,
            reason: "neither side is populated",
        };
        assert_eq!(
            err.to_string(),
            "Malformed jar presence change: neither side is populated"
        );
        assert!(Error::NotBuilt.to_string().contains("rebuild()"));
    }

    #[test]
    fn test_dispatch_error_conversion() {
        let err: Error = DispatchError::QueueClosed.into();
        assert!(matches!(err, Error::Dispatch(DispatchError::QueueClosed)));
    }
}

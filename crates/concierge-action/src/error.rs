//! Error types for intent handlers.

use concierge_core::error::ConciergeError;
use concierge_core::types::Intent;

/// Errors raised while handling an interpreted message.
///
/// `Validation` and `Lookup` carry a message meant for the operator and are
/// answered by the handler itself; the registry only ever sees the others.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Lookup failed: {0}")]
    Lookup(String),
    #[error("Intent handler failed: {0}")]
    HandlerFailed(String),
    #[error("Intent handler panicked: {0}")]
    HandlerPanicked(String),
    #[error("Intent handler for {0} finished without responding")]
    NoResponse(Intent),
    #[error("Storage error: {0}")]
    Storage(#[from] ConciergeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        let err = ActionError::Validation("lipsesc datele".to_string());
        assert_eq!(err.to_string(), "Validation failed: lipsesc datele");

        let err = ActionError::NoResponse(Intent::Reservation);
        assert_eq!(
            err.to_string(),
            "Intent handler for reservation finished without responding"
        );
    }

    #[test]
    fn test_action_error_from_concierge_error() {
        let err: ActionError = ConciergeError::Storage("disk full".to_string()).into();
        assert!(matches!(err, ActionError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }
}

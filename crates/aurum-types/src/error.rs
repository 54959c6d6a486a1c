//! Error types for the Aurum settlement engine.
//!
//! All errors use the `AU_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization / argument errors
//! - 2xx: Reserve and balance errors
//! - 3xx: State machine / circuit breaker errors
//! - 4xx: External collaborator errors
//! - 9xx: General / configuration errors

use thiserror::Error;

use crate::{AccountId, Amount};

/// Central error enum for all Aurum operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AurumError {
    // =================================================================
    // Authorization / Argument Errors (1xx)
    // =================================================================
    /// The caller does not hold the capability the operation requires
    /// (a role, or ownership of the record it acts on).
    #[error("AU_ERR_100: Unauthorized: {account} lacks {required}")]
    Unauthorized { account: AccountId, required: String },

    /// Zero, null, or out-of-range input.
    #[error("AU_ERR_101: Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // =================================================================
    // Reserve / Balance Errors (2xx)
    // =================================================================
    /// Reserve capacity or custody liquidity is insufficient.
    #[error("AU_ERR_200: Capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded { requested: Amount, available: Amount },

    /// A counter would be reduced below zero.
    #[error("AU_ERR_201: Underflow: requested {requested}, available {available}")]
    Underflow { requested: Amount, available: Amount },

    /// Account balance or allowance is too low.
    #[error("AU_ERR_202: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The mutation would break a reserve or supply invariant.
    #[error("AU_ERR_203: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    // =================================================================
    // State Errors (3xx)
    // =================================================================
    /// Operation not permitted in the current state (request status,
    /// reentrant call, redundant pause).
    #[error("AU_ERR_300: Invalid state: {reason}")]
    InvalidState { reason: String },

    /// Operation blocked by the circuit breaker.
    #[error("AU_ERR_301: Operation blocked: token is paused")]
    Paused,

    // =================================================================
    // External Collaborator Errors (4xx)
    // =================================================================
    /// A stable-asset transfer did not succeed.
    #[error("AU_ERR_400: External transfer failed: {reason}")]
    ExternalTransferFailed { reason: String },

    // =================================================================
    // General / Configuration (9xx)
    // =================================================================
    /// Configuration error (invalid values, missing fields, etc.).
    #[error("AU_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("AU_ERR_901: Serialization error: {0}")]
    Serialization(String),
}

impl AurumError {
    /// Shorthand for [`AurumError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`AurumError::InvalidState`].
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`AurumError::ExternalTransferFailed`].
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::ExternalTransferFailed {
            reason: reason.into(),
        }
    }

    /// Error for checked arithmetic that overflowed.
    #[must_use]
    pub fn overflow(context: &str) -> Self {
        Self::InvalidArgument {
            reason: format!("arithmetic overflow in {context}"),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, AurumError>;

impl From<serde_json::Error> for AurumError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_display_names_role() {
        let account = AccountId::new();
        let err = AurumError::Unauthorized {
            account,
            required: crate::Role::ReserveAdmin.to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("AU_ERR_100"), "Got: {msg}");
        assert!(msg.contains("RESERVE_ADMIN"));
        assert!(msg.contains(&account.to_string()));
    }

    #[test]
    fn capacity_exceeded_display() {
        let err = AurumError::CapacityExceeded {
            requested: 2000,
            available: 902,
        };
        let msg = format!("{err}");
        assert!(msg.contains("AU_ERR_200"));
        assert!(msg.contains("2000"));
        assert!(msg.contains("902"));
    }

    #[test]
    fn json_error_converts_to_serialization() {
        let err: AurumError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, AurumError::Serialization(_)));
    }

    #[test]
    fn all_errors_have_au_err_prefix() {
        let errors = vec![
            AurumError::invalid_argument("zero amount"),
            AurumError::Underflow {
                requested: 5,
                available: 1,
            },
            AurumError::InsufficientBalance {
                needed: 5,
                available: 1,
            },
            AurumError::InvariantViolation {
                reason: "x".into(),
            },
            AurumError::invalid_state("x"),
            AurumError::Paused,
            AurumError::transfer_failed("x"),
            AurumError::Configuration("x".into()),
            AurumError::overflow("mint"),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("AU_ERR_"),
                "Error missing AU_ERR_ prefix: {msg}"
            );
        }
    }
}

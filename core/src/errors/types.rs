//! Error type definitions for token management and persistence.
//!
//! The token taxonomy is what the service reports to its callers; the store
//! taxonomy is what repositories report to the service. Presentation-layer
//! mapping (HTTP status codes, wire messages) lives outside this crate.

use thiserror::Error;

/// Token-related errors
///
/// Callers branch on these: expiry is a routine, retryable condition, while
/// reuse detection signals a possible replay and kills the token family.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed, unverifiable, or unknown token. Deliberately does not
    /// distinguish "never existed" from "garbage input".
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    /// An already-consumed refresh token was presented again. The token's
    /// family has been revoked as a side effect of detection.
    #[error("Token reuse detected")]
    TokenReuseDetected,

    /// Caller attempted to act on a token owned by a different user.
    #[error("Token ownership mismatch")]
    OwnershipMismatch,

    #[error("Token generation failed")]
    TokenGenerationFailed,

    /// Persistence was unreachable while issuing or rotating; no partial
    /// pair is ever returned.
    #[error("Token store unavailable")]
    StoreUnavailable,
}

/// Store-level errors reported by repository implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No row matches the lookup.
    #[error("Record not found")]
    NotFound,

    /// The conditional "mark used" update matched zero rows: the token was
    /// already consumed (or never existed). The caller uses this signal to
    /// detect replay.
    #[error("Token already consumed")]
    AlreadyConsumed,

    /// Constraint violation or connectivity loss.
    #[error("Persistence failure: {message}")]
    Persistence { message: String },
}

impl StoreError {
    /// Builds a persistence error from any displayable cause.
    pub fn persistence(message: impl ToString) -> Self {
        Self::Persistence {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomainError;

    #[test]
    fn test_token_error_display() {
        assert_eq!(TokenError::TokenReuseDetected.to_string(), "Token reuse detected");
        assert_eq!(TokenError::TokenExpired.to_string(), "Token expired");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: DomainError = StoreError::persistence("connection reset").into();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_token_error_transparent_bridge() {
        let err: DomainError = TokenError::InvalidToken.into();
        assert_eq!(err.to_string(), "Invalid token");
    }
}

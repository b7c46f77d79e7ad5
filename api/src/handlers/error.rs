//! Mapping from domain errors to HTTP responses.
//!
//! Token failures collapse to one generic unauthorized body on the wire so
//! a caller probing tokens learns nothing about which check failed; the
//! distinction survives in internal logs, where replay must be loud and
//! routine expiry must not.

use actix_web::HttpResponse;
use tracing::{debug, error, warn};

use kl_core::errors::{DomainError, TokenError};

use crate::dto::ErrorResponse;

pub fn handle_domain_error(err: DomainError) -> HttpResponse {
    match &err {
        DomainError::Token(token_err) => match token_err {
            TokenError::TokenReuseDetected => {
                warn!("refresh token replay rejected, family revoked");
                unauthorized()
            }
            TokenError::TokenExpired => {
                debug!("expired token rejected");
                unauthorized()
            }
            TokenError::InvalidToken | TokenError::TokenRevoked => {
                debug!(error = %err, "token rejected");
                unauthorized()
            }
            TokenError::OwnershipMismatch => {
                warn!("token revocation rejected: ownership mismatch");
                HttpResponse::Forbidden().json(ErrorResponse::new(
                    "forbidden",
                    "The credential does not belong to the authenticated user",
                ))
            }
            TokenError::StoreUnavailable => {
                error!("token store unavailable");
                HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
                    "service_unavailable",
                    "The service is temporarily unavailable",
                ))
            }
            TokenError::TokenGenerationFailed => internal_error(&err),
        },
        DomainError::Store(_) => {
            error!(error = %err, "persistence failure surfaced to the API");
            HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
                "service_unavailable",
                "The service is temporarily unavailable",
            ))
        }
        DomainError::Configuration { .. } | DomainError::Internal { .. } => internal_error(&err),
    }
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse::new(
        "invalid_token",
        "Invalid or expired credentials",
    ))
}

fn internal_error(err: &DomainError) -> HttpResponse {
    error!(error = %err, "internal error");
    HttpResponse::InternalServerError().json(ErrorResponse::new(
        "internal_error",
        "An internal error occurred",
    ))
}

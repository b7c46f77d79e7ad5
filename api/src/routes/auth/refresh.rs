//! Handler for POST /api/v1/auth/refresh
//!
//! Exchanges a refresh token for a rotated access/refresh pair.
//!
//! # Request Body
//!
//! ```json
//! { "refresh_token": "string" }
//! ```
//!
//! # Responses
//! - 200 OK: `{ "access_token", "refresh_token", "token_type", "expires_in" }`
//! - 401 Unauthorized: invalid, expired, revoked, or replayed token; a
//!   replayed token additionally revokes its whole family server-side, so
//!   the client must fully re-authenticate
//! - 503 Service Unavailable: token store unreachable

use actix_web::{web, HttpResponse};

use kl_core::repositories::{TokenRepository, UserDirectory};

use crate::dto::{RefreshTokenRequest, TokenPairResponse};
use crate::handlers::handle_domain_error;

use super::AppState;

pub async fn refresh_token<R, D>(
    state: web::Data<AppState<R, D>>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse
where
    R: TokenRepository + 'static,
    D: UserDirectory + 'static,
{
    match state.token_service.refresh(&request.refresh_token).await {
        Ok(pair) => HttpResponse::Ok().json(TokenPairResponse::from(pair)),
        Err(err) => handle_domain_error(err),
    }
}

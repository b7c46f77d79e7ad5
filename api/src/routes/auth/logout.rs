//! Handlers for POST /api/v1/auth/logout and /api/v1/auth/logout-all
//!
//! Both run behind the authentication gate. `logout` revokes the family of
//! the presented refresh token after checking it belongs to the caller;
//! `logout-all` revokes every session the caller owns.

use actix_web::{web, HttpResponse};

use kl_core::repositories::{TokenRepository, UserDirectory};

use crate::dto::{LogoutAllResponse, LogoutRequest};
use crate::handlers::handle_domain_error;
use crate::middleware::AuthContext;

use super::AppState;

pub async fn logout<R, D>(
    state: web::Data<AppState<R, D>>,
    ctx: AuthContext,
    request: web::Json<LogoutRequest>,
) -> HttpResponse
where
    R: TokenRepository + 'static,
    D: UserDirectory + 'static,
{
    match state
        .token_service
        .revoke_for_user(ctx.user_id, &request.refresh_token)
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => handle_domain_error(err),
    }
}

pub async fn logout_all<R, D>(state: web::Data<AppState<R, D>>, ctx: AuthContext) -> HttpResponse
where
    R: TokenRepository + 'static,
    D: UserDirectory + 'static,
{
    match state.token_service.revoke_all(ctx.user_id).await {
        Ok(revoked) => HttpResponse::Ok().json(LogoutAllResponse { revoked }),
        Err(err) => handle_domain_error(err),
    }
}

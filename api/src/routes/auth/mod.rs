//! Auth routes: token refresh and logout.
//!
//! `/refresh` is deliberately outside the authentication gate; the refresh
//! secret itself is the credential. Both logout routes sit behind the gate
//! so revocation is always tied to an authenticated identity.

use std::sync::Arc;

use actix_web::web;

use kl_core::repositories::{TokenRepository, UserDirectory};
use kl_core::services::token::TokenService;

use crate::middleware::BearerAuth;

mod logout;
mod refresh;

pub use logout::{logout, logout_all};
pub use refresh::refresh_token;

/// Shared application state handed to the auth handlers.
pub struct AppState<R: TokenRepository, D: UserDirectory> {
    pub token_service: Arc<TokenService<R, D>>,
}

impl<R: TokenRepository, D: UserDirectory> Clone for AppState<R, D> {
    fn clone(&self) -> Self {
        Self {
            token_service: Arc::clone(&self.token_service),
        }
    }
}

/// Registers the auth scope on the application.
pub fn configure<R, D>(cfg: &mut web::ServiceConfig)
where
    R: TokenRepository + 'static,
    D: UserDirectory + 'static,
{
    cfg.service(
        web::scope("/api/v1/auth")
            .route("/refresh", web::post().to(refresh_token::<R, D>))
            .service(
                web::scope("")
                    .wrap(BearerAuth)
                    .route("/logout", web::post().to(logout::<R, D>))
                    .route("/logout-all", web::post().to(logout_all::<R, D>)),
            ),
    );
}

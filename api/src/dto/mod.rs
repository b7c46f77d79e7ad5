//! Request and response data transfer objects.

pub mod auth;
pub mod error;

pub use auth::{LogoutAllResponse, LogoutRequest, RefreshTokenRequest, TokenPairResponse};
pub use error::ErrorResponse;

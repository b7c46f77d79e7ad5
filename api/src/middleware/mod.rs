//! Request middleware.

pub mod auth;

pub use auth::{AccessTokenValidator, AuthContext, BearerAuth};

//! # Keyline API
//!
//! HTTP boundary for the Keyline token service: the bearer-token
//! authentication gate, auth route handlers, and the mapping from domain
//! errors to wire responses.

pub mod config;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

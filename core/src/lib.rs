//! # Keyline Core
//!
//! Core business logic and domain layer for the Keyline backend.
//! This crate contains the token domain entities, the token service with
//! rotation and reuse detection, repository interfaces, and error types.
//! It performs no I/O of its own; persistence is reached only through the
//! repository traits.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;

//! Infrastructure error types.

use thiserror::Error;

/// Errors raised while setting up infrastructure collaborators.
///
/// Per-operation store failures are reported through
/// `kl_core::errors::StoreError`; this type covers construction-time
/// problems such as an unparsable database URL.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

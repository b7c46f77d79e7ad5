//! Database connection management and MySQL repository implementations.

pub mod connection;
pub mod mysql;

pub use connection::{DatabaseConfig, DatabasePool};
pub use mysql::{MySqlTokenRepository, MySqlUserDirectory};

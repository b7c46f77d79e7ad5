//! Environment-backed application configuration.
//!
//! Everything is read once at startup and passed down by value; no
//! component reads ambient state after construction. The signing secret is
//! required: a missing or empty `JWT_SECRET` aborts startup instead of
//! silently signing with an empty key.

use std::env;

use thiserror::Error;
use tracing::warn;

use kl_core::services::token::TokenServiceConfig;
use kl_infra::DatabaseConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub token: TokenServiceConfig,
    /// Seconds between expired-token cleanup sweeps
    pub cleanup_interval_secs: u64,
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source. Split out so
    /// tests can drive it without mutating the process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let access_token_ttl_hours = parse_opt(&lookup, "ACCESS_TOKEN_TTL_HOURS")?;
        if access_token_ttl_hours.is_some() {
            warn!("ACCESS_TOKEN_TTL_HOURS is deprecated; prefer ACCESS_TOKEN_TTL_SECS");
        }

        let token = TokenServiceConfig {
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| TokenServiceConfig::default().issuer),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| TokenServiceConfig::default().audience),
            access_token_ttl_secs: parse_opt(&lookup, "ACCESS_TOKEN_TTL_SECS")?,
            access_token_ttl_hours,
            refresh_token_ttl_days: parse_opt(&lookup, "REFRESH_TOKEN_TTL_DAYS")?
                .unwrap_or(TokenServiceConfig::default().refresh_token_ttl_days),
            jwt_secret,
        };

        Ok(Self {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: parse_opt(&lookup, "SERVER_PORT")?.unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_opt(&lookup, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(10),
                connect_timeout_secs: parse_opt(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS")?.unwrap_or(30),
            },
            token,
            cleanup_interval_secs: parse_opt(&lookup, "TOKEN_CLEANUP_INTERVAL_SECS")?.unwrap_or(3600),
        })
    }
}

fn parse_opt<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(entries: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map = vars(entries);
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_minimal_configuration_applies_defaults() {
        let config = load(&[
            ("JWT_SECRET", "test-secret"),
            ("DATABASE_URL", "mysql://localhost/keyline"),
        ])
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.token.refresh_token_ttl_days, 7);
        assert_eq!(config.token.access_token_ttl_secs, None);
        assert_eq!(config.cleanup_interval_secs, 3600);
    }

    #[test]
    fn test_missing_secret_aborts() {
        let err = load(&[("DATABASE_URL", "mysql://localhost/keyline")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_missing_database_url_aborts() {
        let err = load(&[("JWT_SECRET", "test-secret")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_ttl_knobs_are_forwarded() {
        let config = load(&[
            ("JWT_SECRET", "test-secret"),
            ("DATABASE_URL", "mysql://localhost/keyline"),
            ("ACCESS_TOKEN_TTL_SECS", "600"),
            ("ACCESS_TOKEN_TTL_HOURS", "2"),
            ("REFRESH_TOKEN_TTL_DAYS", "30"),
        ])
        .unwrap();

        assert_eq!(config.token.access_token_ttl_secs, Some(600));
        assert_eq!(config.token.access_token_ttl_hours, Some(2));
        assert_eq!(config.token.refresh_token_ttl_days, 30);
        // Precedence itself is resolved (and tested) in kl_core.
        assert_eq!(config.token.access_token_ttl().num_seconds(), 600);
    }

    #[test]
    fn test_unparsable_number_is_rejected() {
        let err = load(&[
            ("JWT_SECRET", "test-secret"),
            ("DATABASE_URL", "mysql://localhost/keyline"),
            ("SERVER_PORT", "not-a-port"),
        ])
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "SERVER_PORT", .. }));
    }
}

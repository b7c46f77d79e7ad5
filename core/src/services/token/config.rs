//! Configuration for the token service.

use chrono::Duration;

use crate::errors::DomainError;

/// Fallback access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 900;

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Default JWT issuer.
pub const DEFAULT_ISSUER: &str = "keyline";

/// Default JWT audience.
pub const DEFAULT_AUDIENCE: &str = "keyline-api";

/// Configuration for the token service.
///
/// Passed by value into the service constructor; nothing in this crate reads
/// ambient state, so tests can vary secrets and TTLs per case.
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret. Must be non-empty; validated at construction.
    pub jwt_secret: String,
    /// Value for the `iss` claim
    pub issuer: String,
    /// Value for the `aud` claim
    pub audience: String,
    /// Access token lifetime in seconds. Takes precedence over every other
    /// TTL knob when set.
    pub access_token_ttl_secs: Option<i64>,
    /// Deprecated hour-based lifetime, kept for deployments predating
    /// `access_token_ttl_secs`. Consulted only when the seconds knob is
    /// unset.
    pub access_token_ttl_hours: Option<i64>,
    /// Refresh token lifetime in days. Rotation restarts this window for
    /// each successor token.
    pub refresh_token_ttl_days: i64,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            access_token_ttl_secs: None,
            access_token_ttl_hours: None,
            refresh_token_ttl_days: DEFAULT_REFRESH_TOKEN_TTL_DAYS,
        }
    }
}

impl TokenServiceConfig {
    /// Creates a configuration with the given secret and default TTLs.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// An empty or whitespace signing secret is a hard configuration error;
    /// nothing may ever sign with an empty key. Non-positive TTLs are
    /// rejected for the same reason.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(DomainError::Configuration {
                message: "JWT signing secret must not be empty".to_string(),
            });
        }
        if matches!(self.access_token_ttl_secs, Some(secs) if secs <= 0) {
            return Err(DomainError::Configuration {
                message: "access token TTL (seconds) must be positive".to_string(),
            });
        }
        if matches!(self.access_token_ttl_hours, Some(hours) if hours <= 0) {
            return Err(DomainError::Configuration {
                message: "access token TTL (hours) must be positive".to_string(),
            });
        }
        if self.refresh_token_ttl_days <= 0 {
            return Err(DomainError::Configuration {
                message: "refresh token TTL must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Resolves the access token lifetime.
    ///
    /// Precedence: explicit seconds, then the deprecated hour-based field,
    /// then [`DEFAULT_ACCESS_TOKEN_TTL_SECS`].
    pub fn access_token_ttl(&self) -> Duration {
        if let Some(secs) = self.access_token_ttl_secs {
            return Duration::seconds(secs);
        }
        if let Some(hours) = self.access_token_ttl_hours {
            return Duration::hours(hours);
        }
        Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS)
    }

    /// Resolves the refresh token lifetime.
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_seconds_beat_deprecated_hours() {
        let config = TokenServiceConfig {
            access_token_ttl_secs: Some(120),
            access_token_ttl_hours: Some(2),
            ..TokenServiceConfig::default()
        };

        assert_eq!(config.access_token_ttl(), Duration::seconds(120));
    }

    #[test]
    fn test_deprecated_hours_beat_default() {
        let config = TokenServiceConfig {
            access_token_ttl_hours: Some(2),
            ..TokenServiceConfig::default()
        };

        assert_eq!(config.access_token_ttl(), Duration::hours(2));
    }

    #[test]
    fn test_default_ttl_when_nothing_configured() {
        let config = TokenServiceConfig::default();

        assert_eq!(
            config.access_token_ttl(),
            Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS)
        );
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let config = TokenServiceConfig::new("");
        assert!(config.validate().is_err());

        let config = TokenServiceConfig::new("   ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_ttls_are_rejected() {
        let config = TokenServiceConfig {
            access_token_ttl_secs: Some(0),
            ..TokenServiceConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TokenServiceConfig {
            refresh_token_ttl_days: -1,
            ..TokenServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TokenServiceConfig::default().validate().is_ok());
    }
}

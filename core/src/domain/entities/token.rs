//! Token entities: signed access-token claims, the persisted refresh-token
//! record, and the pair handed back to clients.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Subject;

/// Token type label returned with every issued pair.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Claims structure for the JWT access-token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Subject email
    pub email: String,

    /// Subject display name
    pub name: String,

    /// Authorization roles. Empty is valid and means no elevated capabilities.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

impl Claims {
    /// Creates access-token claims for a subject.
    ///
    /// # Arguments
    ///
    /// * `subject` - The authenticated principal the token describes
    /// * `ttl` - Access token lifetime
    /// * `issuer` - Value for the `iss` claim
    /// * `audience` - Value for the `aud` claim
    pub fn new_access_token(subject: &Subject, ttl: Duration, issuer: &str, audience: &str) -> Self {
        let now = Utc::now();
        let expiry = now + ttl;

        Self {
            sub: subject.user_id.to_string(),
            email: subject.email.clone(),
            name: subject.display_name.clone(),
            roles: subject.roles.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        now >= self.exp
    }

    /// Checks if the claims are currently valid (after nbf, before exp)
    pub fn is_valid(&self) -> bool {
        let now = Utc::now().timestamp();
        now >= self.nbf && now < self.exp
    }

    /// Gets the user ID from the claims
    ///
    /// # Returns
    ///
    /// `Ok(Uuid)` if the subject can be parsed as a UUID, `Err` otherwise
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Refresh token record persisted by the store.
///
/// The record holds only the SHA-256 hash of the opaque secret handed to the
/// client; the raw secret is never stored. All rows descended from one
/// issuance share a `token_family`, the unit of revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Unique identifier for the refresh token
    pub id: Uuid,

    /// User ID this token belongs to
    pub user_id: Uuid,

    /// Hashed token value
    pub token_hash: String,

    /// Family shared with every token this one is rotated into
    pub token_family: Uuid,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Set exactly once, when the token is consumed by a rotation
    pub used_at: Option<DateTime<Utc>>,

    /// Set when the token or its family is invalidated; never cleared
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Creates a refresh token starting a new family.
    ///
    /// Id, family, and timestamps are assigned here, at the call site;
    /// the store persists the record exactly as constructed.
    pub fn new(user_id: Uuid, token_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            token_family: Uuid::new_v4(),
            created_at: now,
            expires_at: now + ttl,
            used_at: None,
            revoked_at: None,
        }
    }

    /// Creates the successor record for a rotation, carrying the family
    /// forward. Expiry restarts at `now + ttl`: rotation slides the window
    /// rather than inheriting the consumed token's deadline.
    pub fn for_rotation(user_id: Uuid, token_hash: String, token_family: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            token_family,
            created_at: now,
            expires_at: now + ttl,
            used_at: None,
            revoked_at: None,
        }
    }

    /// Checks if the refresh token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Checks if the token has been consumed by a rotation
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Checks if the token has been revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// A token is usable iff it is not revoked, not consumed, and not expired.
    pub fn is_usable(&self) -> bool {
        !self.is_revoked() && !self.is_used() && !self.is_expired()
    }
}

/// Token pair returned to the client after issuance or rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed JWT access token
    pub access_token: String,

    /// Opaque refresh secret (raw, never the hash)
    pub refresh_token: String,

    /// Fixed token type label ("Bearer")
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Family the refresh token belongs to
    pub token_family: Uuid,
}

impl TokenPair {
    /// Creates a new token pair
    pub fn new(access_token: String, refresh_token: String, expires_in: i64, token_family: Uuid) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
            token_family,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Subject {
        Subject {
            user_id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            display_name: "Dev Example".to_string(),
            roles: vec!["admin".to_string()],
        }
    }

    #[test]
    fn test_access_token_claims() {
        let subject = subject();
        let claims = Claims::new_access_token(&subject, Duration::minutes(15), "keyline", "keyline-api");

        assert_eq!(claims.sub, subject.user_id.to_string());
        assert_eq!(claims.email, "dev@example.com");
        assert_eq!(claims.name, "Dev Example");
        assert_eq!(claims.roles, vec!["admin".to_string()]);
        assert_eq!(claims.iss, "keyline");
        assert_eq!(claims.aud, "keyline-api");
        assert!(claims.is_valid());
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_user_id_parsing() {
        let subject = subject();
        let claims = Claims::new_access_token(&subject, Duration::minutes(15), "keyline", "keyline-api");

        assert_eq!(claims.user_id().unwrap(), subject.user_id);
    }

    #[test]
    fn test_claims_expiration() {
        let mut claims = Claims::new_access_token(&subject(), Duration::minutes(15), "keyline", "keyline-api");
        claims.exp = Utc::now().timestamp() - 1;

        assert!(claims.is_expired());
        assert!(!claims.is_valid());
    }

    #[test]
    fn test_claims_roles_default_to_empty() {
        let json = r#"{
            "sub": "8e4cc0c5-3cbc-4fbb-ac01-3a5f0e7e4fbd",
            "email": "dev@example.com",
            "name": "Dev Example",
            "iat": 0, "exp": 4102444800, "nbf": 0,
            "iss": "keyline", "aud": "keyline-api", "jti": "x"
        }"#;

        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_refresh_token_creation_starts_fresh_family() {
        let user_id = Uuid::new_v4();
        let token = RefreshToken::new(user_id, "hash-a".to_string(), Duration::days(7));
        let other = RefreshToken::new(user_id, "hash-b".to_string(), Duration::days(7));

        assert_eq!(token.user_id, user_id);
        assert_ne!(token.token_family, other.token_family);
        assert!(token.used_at.is_none());
        assert!(token.revoked_at.is_none());
        assert!(token.is_usable());
    }

    #[test]
    fn test_rotation_carries_family_and_slides_expiry() {
        let user_id = Uuid::new_v4();
        let original = RefreshToken::new(user_id, "hash-a".to_string(), Duration::days(7));
        let successor = RefreshToken::for_rotation(
            user_id,
            "hash-b".to_string(),
            original.token_family,
            Duration::days(7),
        );

        assert_eq!(successor.token_family, original.token_family);
        assert_ne!(successor.id, original.id);
        assert!(successor.expires_at >= original.expires_at);
        assert!(successor.is_usable());
    }

    #[test]
    fn test_used_token_is_not_usable() {
        let mut token = RefreshToken::new(Uuid::new_v4(), "hash".to_string(), Duration::days(7));
        token.used_at = Some(Utc::now());

        assert!(token.is_used());
        assert!(!token.is_usable());
        assert!(!token.is_revoked());
    }

    #[test]
    fn test_revoked_token_is_not_usable() {
        let mut token = RefreshToken::new(Uuid::new_v4(), "hash".to_string(), Duration::days(7));
        token.revoked_at = Some(Utc::now());

        assert!(token.is_revoked());
        assert!(!token.is_usable());
    }

    #[test]
    fn test_expired_token_is_not_usable() {
        let mut token = RefreshToken::new(Uuid::new_v4(), "hash".to_string(), Duration::days(7));
        token.expires_at = Utc::now() - Duration::days(1);

        assert!(token.is_expired());
        assert!(!token.is_used());
        assert!(!token.is_usable());
    }

    #[test]
    fn test_token_pair_shape() {
        let family = Uuid::new_v4();
        let pair = TokenPair::new("access".to_string(), "refresh".to_string(), 900, family);

        assert_eq!(pair.token_type, TOKEN_TYPE_BEARER);
        assert_eq!(pair.expires_in, 900);
        assert_eq!(pair.token_family, family);
    }

    #[test]
    fn test_token_pair_serialization() {
        let pair = TokenPair::new("access".to_string(), "refresh".to_string(), 900, Uuid::new_v4());

        let json = serde_json::to_string(&pair).unwrap();
        let deserialized: TokenPair = serde_json::from_str(&json).unwrap();

        assert_eq!(pair, deserialized);
    }
}

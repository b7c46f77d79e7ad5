//! Access token signing and verification.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::entities::token::Claims;
use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;

/// Stateless HS256 signer for access tokens.
///
/// Purely functional given the secret material: signing and verification
/// never block and never consult storage. Construction fails on a
/// misconfigured secret, so an instance can never sign with an empty key.
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    header: Header,
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner")
            .field("validation", &self.validation)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl JwtSigner {
    /// Builds a signer from the service configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(JwtSigner)` - Ready to sign and verify
    /// * `Err(DomainError::Configuration)` - Empty secret or invalid TTLs
    pub fn new(config: &TokenServiceConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            header: Header::new(Algorithm::HS256),
        })
    }

    /// Signs claims into a compact JWT.
    pub fn sign(&self, claims: &Claims) -> Result<String, DomainError> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|_| DomainError::Token(TokenError::TokenGenerationFailed))
    }

    /// Verifies a compact JWT and returns its claims.
    ///
    /// Expiry is the only failure reported as `TokenExpired`; callers treat
    /// it as routine and retryable. Everything else (malformed encoding,
    /// signature mismatch, unexpected algorithm, wrong issuer or audience,
    /// missing subject, malformed role entries) collapses to `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, DomainError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature {
                DomainError::Token(TokenError::TokenExpired)
            } else {
                DomainError::Token(TokenError::InvalidToken)
            }
        })?;

        Ok(token_data.claims)
    }
}

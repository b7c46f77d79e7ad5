//! Bearer-token authentication gate.
//!
//! Verifies the access token on every protected request and injects the
//! authenticated identity into the request extensions. Verification is
//! stateless: the gate delegates to the token service's signer and never
//! touches the store, so this path is free of database contention.
//!
//! A missing header and a malformed header are rejected with distinct
//! messages (both are client-correctable). Verification failures collapse
//! into one generic response so a probing caller cannot tell an expired
//! token from a forged one; the distinction is kept in internal logs.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorInternalServerError, ErrorUnauthorized},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use tracing::{debug, warn};
use uuid::Uuid;

use kl_core::domain::entities::token::Claims;
use kl_core::errors::{DomainError, TokenError};
use kl_core::repositories::{TokenRepository, UserDirectory};
use kl_core::services::token::TokenService;

/// Object-safe access-token verification, so the gate can hold any
/// concrete `TokenService` behind one `Arc<dyn _>`.
pub trait AccessTokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<Claims, DomainError>;
}

impl<R: TokenRepository, D: UserDirectory> AccessTokenValidator for TokenService<R, D> {
    fn validate(&self, token: &str) -> Result<Claims, DomainError> {
        self.validate_access_token(token)
    }
}

/// User authentication context injected into requests
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID extracted from the token claims
    pub user_id: Uuid,
    /// Subject email
    pub email: String,
    /// Subject display name
    pub name: String,
    /// Authorization roles
    pub roles: Vec<String>,
    /// JWT ID for tracking
    pub jti: String,
}

impl AuthContext {
    /// Creates an authentication context from verified claims
    pub fn from_claims(claims: Claims) -> Result<Self, DomainError> {
        let user_id = claims
            .user_id()
            .map_err(|_| DomainError::Token(TokenError::InvalidToken))?;

        Ok(Self {
            user_id,
            email: claims.email,
            name: claims.name,
            roles: claims.roles,
            jti: claims.jti,
        })
    }
}

/// How a request's credential failed before verification was attempted.
enum CredentialError {
    /// No Authorization header supplied
    Missing,
    /// Header present but not a usable bearer credential
    Malformed,
}

/// Bearer authentication middleware factory
pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Bearer authentication middleware service
pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = match extract_bearer_token(&req) {
                Ok(token) => token,
                Err(CredentialError::Missing) => {
                    return Err(ErrorUnauthorized("authorization header missing"));
                }
                Err(CredentialError::Malformed) => {
                    return Err(ErrorUnauthorized("authorization header malformed"));
                }
            };

            let validator = req
                .app_data::<web::Data<Arc<dyn AccessTokenValidator>>>()
                .ok_or_else(|| ErrorInternalServerError("access token validator not configured"))?;

            let claims = match validator.validate(&token) {
                Ok(claims) => claims,
                Err(err) => {
                    match &err {
                        DomainError::Token(TokenError::TokenExpired) => {
                            debug!("rejected expired access token")
                        }
                        _ => warn!(error = %err, "rejected invalid access token"),
                    }
                    // One generic response for every verification failure.
                    return Err(ErrorUnauthorized("invalid or expired token"));
                }
            };

            let context = AuthContext::from_claims(claims)
                .map_err(|_| ErrorUnauthorized("invalid or expired token"))?;
            req.extensions_mut().insert(context);

            service.call(req).await
        })
    }
}

/// Extracts the bearer credential from the Authorization header.
fn extract_bearer_token(req: &ServiceRequest) -> Result<String, CredentialError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(CredentialError::Missing)?;

    let value = header.to_str().map_err(|_| CredentialError::Malformed)?;
    let token = value.strip_prefix("Bearer ").ok_or(CredentialError::Malformed)?;

    if token.trim().is_empty() {
        return Err(CredentialError::Malformed);
    }

    Ok(token.to_string())
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ErrorUnauthorized("authentication required"));

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::{to_bytes, BoxBody};
    use actix_web::dev::Service as _;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};
    use chrono::{Duration, Utc};

    fn claims_for(user_id: Uuid) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user_id.to_string(),
            email: "user@example.com".to_string(),
            name: "User One".to_string(),
            roles: vec!["member".to_string()],
            iat: now.timestamp(),
            exp: (now + Duration::minutes(15)).timestamp(),
            nbf: now.timestamp(),
            iss: "keyline".to_string(),
            aud: "keyline-api".to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Validator stub returning a fixed outcome.
    struct StubValidator {
        result: Result<Claims, TokenError>,
    }

    impl AccessTokenValidator for StubValidator {
        fn validate(&self, _token: &str) -> Result<Claims, DomainError> {
            self.result.clone().map_err(DomainError::Token)
        }
    }

    async fn whoami(ctx: AuthContext) -> HttpResponse {
        HttpResponse::Ok().body(ctx.user_id.to_string())
    }

    fn validator_data(validator: StubValidator) -> web::Data<Arc<dyn AccessTokenValidator>> {
        let validator: Arc<dyn AccessTokenValidator> = Arc::new(validator);
        web::Data::new(validator)
    }

    /// Normalizes a service outcome: rejections leave the gate as service
    /// errors, successes as regular responses.
    async fn status_and_body(
        result: Result<ServiceResponse<BoxBody>, Error>,
    ) -> (StatusCode, String) {
        match result {
            Ok(resp) => {
                let status = resp.status();
                let body = to_bytes(resp.into_body()).await.unwrap();
                (status, String::from_utf8_lossy(&body).to_string())
            }
            Err(err) => {
                let resp = err.error_response();
                let status = resp.status();
                let body = to_bytes(resp.into_body()).await.unwrap();
                (status, String::from_utf8_lossy(&body).to_string())
            }
        }
    }

    #[actix_web::test]
    async fn test_valid_bearer_token_injects_context() {
        let user_id = Uuid::new_v4();
        let app = test::init_service(
            App::new()
                .app_data(validator_data(StubValidator {
                    result: Ok(claims_for(user_id)),
                }))
                .wrap(BearerAuth)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, "Bearer some-access-token"))
            .to_request();
        let (status, body) = status_and_body(app.call(req).await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user_id.to_string());
    }

    #[actix_web::test]
    async fn test_missing_header_is_distinct_from_malformed() {
        let app = test::init_service(
            App::new()
                .app_data(validator_data(StubValidator {
                    result: Ok(claims_for(Uuid::new_v4())),
                }))
                .wrap(BearerAuth)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let (status, body) = status_and_body(app.call(req).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing"));

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, "Token abc"))
            .to_request();
        let (status, body) = status_and_body(app.call(req).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("malformed"));
    }

    #[actix_web::test]
    async fn test_expired_and_invalid_tokens_get_the_same_response() {
        let mut bodies = Vec::new();

        for failure in [TokenError::TokenExpired, TokenError::InvalidToken] {
            let app = test::init_service(
                App::new()
                    .app_data(validator_data(StubValidator {
                        result: Err(failure),
                    }))
                    .wrap(BearerAuth)
                    .route("/whoami", web::get().to(whoami)),
            )
            .await;

            let req = test::TestRequest::get()
                .uri("/whoami")
                .insert_header((AUTHORIZATION, "Bearer whatever"))
                .to_request();
            let (status, body) = status_and_body(app.call(req).await).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            bodies.push(body);
        }

        assert_eq!(bodies[0], bodies[1]);
    }

    #[::core::prelude::v1::test]
    fn test_extract_bearer_token() {
        let req = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer test_token_123"))
            .to_srv_request();
        assert!(matches!(extract_bearer_token(&req), Ok(token) if token == "test_token_123"));

        let req = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "test_token_123"))
            .to_srv_request();
        assert!(matches!(extract_bearer_token(&req), Err(CredentialError::Malformed)));

        let req = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_srv_request();
        assert!(matches!(extract_bearer_token(&req), Err(CredentialError::Malformed)));

        let req = test::TestRequest::default().to_srv_request();
        assert!(matches!(extract_bearer_token(&req), Err(CredentialError::Missing)));
    }
}

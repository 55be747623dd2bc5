//! Bearer access-token verification for protected endpoints.
//!
//! Access tokens are minted elsewhere; this middleware only checks their
//! HS256 signature, expiry and (when configured) issuer and audience, then
//! injects the caller's [`AuthContext`] into the request.

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use ld_shared::config::JwtConfig;
use ld_shared::errors::{error_codes, ErrorResponse};
use serde::{Deserialize, Serialize};
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use uuid::Uuid;

/// Claims this server relies on. Anything else in the token is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject, the user id
    pub sub: String,
    /// Expiry as seconds since the epoch
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Authenticated caller injected into requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
}

/// Verifies access tokens against the configured secret and claims
pub struct AccessTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AccessTokenVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        // Configured claims must be present, not merely correct when present
        let mut required = vec!["exp"];
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match &config.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required[..]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Returns the caller's context, or `None` for any invalid token
    pub fn verify(&self, token: &str) -> Option<AuthContext> {
        let data = match decode::<AccessClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Access token rejected");
                return None;
            }
        };

        match Uuid::parse_str(&data.claims.sub) {
            Ok(user_id) => Some(AuthContext { user_id }),
            Err(_) => {
                tracing::debug!("Access token subject is not a user id");
                None
            }
        }
    }
}

/// JWT authentication middleware factory
#[derive(Clone)]
pub struct JwtAuth {
    verifier: Arc<AccessTokenVerifier>,
}

impl JwtAuth {
    pub fn with_config(config: &JwtConfig) -> Self {
        Self {
            verifier: Arc::new(AccessTokenVerifier::new(config)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            verifier: Arc::clone(&self.verifier),
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    verifier: Arc<AccessTokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Arc::clone(&self.verifier);

        Box::pin(async move {
            let context = extract_bearer_token(&req).and_then(|token| verifier.verify(&token));

            let context = match context {
                Some(context) => context,
                None => {
                    let response = unauthorized("Missing or invalid access token");
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            req.extensions_mut().insert(context);
            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

fn unauthorized(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse::new(error_codes::UNAUTHORIZED, message))
}

/// Extracts Bearer token from Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req.extensions().get::<AuthContext>().cloned().ok_or_else(|| {
            actix_web::error::InternalError::from_response(
                "authentication required",
                unauthorized("Authentication required"),
            )
            .into()
        });

        ready(result)
    }
}

//! Session continuity endpoints
//!
//! - `POST /api/v1/auth/refresh` exchanges a refresh token for its descendant
//! - `POST /api/v1/auth/logout` ends one session or all of the caller's sessions

pub mod logout;
pub mod refresh;

use std::net::IpAddr;
use std::sync::Arc;

use actix_web::{http::header::USER_AGENT, HttpRequest};
use ld_core::domain::entities::RequestMetadata;
use ld_core::repositories::TokenRepository;
use ld_core::services::TokenService;
use ld_shared::config::{Environment, JwtConfig};

/// Shared state handed to every handler
pub struct AppState<T: TokenRepository> {
    pub token_service: Arc<TokenService<T>>,
    pub jwt: JwtConfig,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
}

impl<T: TokenRepository> AppState<T> {
    pub fn new(token_service: Arc<TokenService<T>>, jwt: JwtConfig, environment: Environment) -> Self {
        Self {
            token_service,
            jwt,
            environment,
            allowed_origins: Vec::new(),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }
}

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Collect the diagnostic context of a request.
///
/// The first `X-Forwarded-For` hop wins over the peer address when it is a
/// valid IP address.
pub fn request_metadata(req: &HttpRequest) -> RequestMetadata {
    let forwarded = req
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_string());

    let ip = forwarded.or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()));

    let client_identity = req
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    RequestMetadata::new(ip, client_identity)
}

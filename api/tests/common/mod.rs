//! Helpers shared by the HTTP integration tests

use std::sync::Arc;

use actix_web::web;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use ld_api::middleware::auth::AccessClaims;
use ld_api::routes::auth::AppState;
use ld_core::domain::entities::RequestMetadata;
use ld_core::repositories::InMemoryTokenRepository;
use ld_core::services::{TokenService, TokenServiceConfig};
use ld_shared::config::{Environment, JwtConfig};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub state: web::Data<AppState<InMemoryTokenRepository>>,
    pub token_service: Arc<TokenService<InMemoryTokenRepository>>,
    pub repository: Arc<InMemoryTokenRepository>,
}

pub fn test_context() -> TestContext {
    let repository = Arc::new(InMemoryTokenRepository::new());
    let token_service = Arc::new(
        TokenService::new(Arc::clone(&repository), TokenServiceConfig::default())
            .expect("default config is valid"),
    );
    let state = web::Data::new(AppState::new(
        Arc::clone(&token_service),
        JwtConfig::new(TEST_JWT_SECRET),
        Environment::Development,
    ));

    TestContext {
        state,
        token_service,
        repository,
    }
}

/// Issue a refresh token for `user_id`, returning the plaintext
pub async fn issue_refresh_token(context: &TestContext, user_id: Uuid) -> String {
    context
        .token_service
        .issue(user_id, RequestMetadata::default())
        .await
        .expect("issue succeeds")
        .credential
}

/// Mint an access token the way the authentication service would
pub fn access_token_for(user_id: Uuid) -> String {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::minutes(15)).timestamp(),
        iat: Some(now.timestamp()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("encode access token")
}

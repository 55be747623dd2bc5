use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::dto::auth_dto::{RefreshTokenRequest, RefreshTokenResponse};
use crate::handlers::error_handler::{handle_domain_error, handle_validation_errors};

use ld_core::repositories::TokenRepository;

use super::{request_metadata, AppState};

/// Handler for POST /api/v1/auth/refresh
///
/// Exchanges a refresh token for a new one. The presented token is retired
/// whether or not the client receives the response.
///
/// # Request Body
///
/// ```json
/// {
///     "refresh_token": "string"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "user_id": "6f1c...",
///     "refresh_token": "new_refresh_token_string",
///     "refresh_expires_in": 604800
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Malformed body
/// - 401 Unauthorized: Unknown, expired, revoked or already used refresh token
/// - 503 Service Unavailable: Token store unreachable
pub async fn refresh<T>(
    req: HttpRequest,
    state: web::Data<AppState<T>>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse
where
    T: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_errors(&errors);
    }

    let metadata = request_metadata(&req);
    match state.token_service.rotate(&request.refresh_token, metadata).await {
        Ok(rotated) => {
            let (credential, record) = rotated.issued.into_parts();
            HttpResponse::Ok().json(RefreshTokenResponse {
                user_id: rotated.user_id,
                refresh_token: credential,
                refresh_expires_in: (record.expires_at - record.issued_at).num_seconds(),
            })
        }
        Err(error) => handle_domain_error(&error),
    }
}

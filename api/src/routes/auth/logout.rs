use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::dto::auth_dto::LogoutRequest;
use crate::handlers::error_handler::{handle_domain_error, handle_validation_errors};
use crate::middleware::auth::AuthContext;

use ld_core::domain::entities::RevocationReason;
use ld_core::errors::{DomainError, TokenError};
use ld_core::repositories::TokenRepository;
use ld_shared::errors::{error_codes, ErrorResponse};

use super::{request_metadata, AppState};

/// Handler for POST /api/v1/auth/logout
///
/// Requires a Bearer access token. With a `refresh_token` in the body only
/// that session ends; with an empty body every session of the caller ends.
///
/// # Response
///
/// ## Success (204 No Content)
///
/// ## Errors
/// - 400 Bad Request: Malformed body
/// - 401 Unauthorized: Missing access token, or refresh token not active
/// - 503 Service Unavailable: Token store unreachable
pub async fn logout<T>(
    req: HttpRequest,
    state: web::Data<AppState<T>>,
    auth: AuthContext,
    body: web::Bytes,
) -> HttpResponse
where
    T: TokenRepository + 'static,
{
    let request = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    if let Err(errors) = request.validate() {
        return handle_validation_errors(&errors);
    }

    match request.refresh_token {
        Some(presented) => {
            let metadata = request_metadata(&req);
            match state
                .token_service
                .revoke(&presented, RevocationReason::UserLogout, metadata)
                .await
            {
                Ok(Some(record)) if record.user_id == auth.user_id => HttpResponse::NoContent().finish(),
                Ok(Some(record)) => {
                    // Revoked anyway: whoever holds the credential may end that session
                    tracing::warn!(
                        token_id = %record.id,
                        owner = %record.user_id,
                        caller = %auth.user_id,
                        "Refresh token revoked by a different user"
                    );
                    HttpResponse::NoContent().finish()
                }
                Ok(None) => handle_domain_error(&DomainError::Token(TokenError::InvalidRefreshToken)),
                Err(error) => handle_domain_error(&error),
            }
        }
        None => match state
            .token_service
            .revoke_all_for_user(auth.user_id, RevocationReason::UserLogoutAll)
            .await
        {
            Ok(_) => HttpResponse::NoContent().finish(),
            Err(error) => handle_domain_error(&error),
        },
    }
}

fn parse_body(body: &[u8]) -> Result<LogoutRequest, HttpResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LogoutRequest::default());
    }

    serde_json::from_slice(body).map_err(|_| {
        HttpResponse::BadRequest().json(ErrorResponse::new(
            error_codes::VALIDATION_ERROR,
            "Malformed request body",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_means_logout_everywhere() {
        assert!(parse_body(b"").unwrap().refresh_token.is_none());
        assert!(parse_body(b"  \n").unwrap().refresh_token.is_none());
        assert!(parse_body(b"{}").unwrap().refresh_token.is_none());
    }

    #[test]
    fn test_body_with_token() {
        let request = parse_body(br#"{"refresh_token":"abc"}"#).unwrap();
        assert_eq!(request.refresh_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        assert!(parse_body(b"{not json").is_err());
    }
}

//! Mapping of domain failures onto HTTP responses

use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse};
use ld_core::errors::{DomainError, TokenError};
use ld_shared::errors::{error_codes, ErrorResponse};
use validator::ValidationErrors;

fn respond(status: StatusCode, body: ErrorResponse) -> HttpResponse {
    HttpResponse::build(status).json(body)
}

/// Convert a domain error into its HTTP response.
///
/// Every refresh failure is the same 401 so clients cannot tell an unknown
/// credential from a replayed, revoked or expired one.
pub fn handle_domain_error(error: &DomainError) -> HttpResponse {
    match error {
        DomainError::Token(TokenError::InvalidRefreshToken) => respond(
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new(error_codes::INVALID_REFRESH_TOKEN, "Invalid refresh token"),
        ),
        DomainError::Validation { message } => respond(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone()),
        ),
        DomainError::StorageUnavailable { message } => {
            tracing::error!(error = %message, "Refresh token store unavailable");
            respond(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new(
                    error_codes::STORAGE_UNAVAILABLE,
                    "Service temporarily unavailable, please retry",
                ),
            )
        }
        DomainError::Token(TokenError::DigestCollision) | DomainError::Internal { .. } => {
            tracing::error!(error = %error, "Internal error while handling token request");
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred"),
            )
        }
    }
}

/// 400 response listing the fields that failed validation
pub fn handle_validation_errors(errors: &ValidationErrors) -> HttpResponse {
    let fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    respond(
        StatusCode::BAD_REQUEST,
        ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request")
            .add_detail("fields", fields),
    )
}

/// Turns malformed JSON bodies into the standard 400 envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = respond(
        StatusCode::BAD_REQUEST,
        ErrorResponse::new(error_codes::VALIDATION_ERROR, "Malformed request body"),
    );
    actix_web::error::InternalError::from_response(err, response).into()
}

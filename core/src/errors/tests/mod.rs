use super::*;

#[test]
fn test_invalid_refresh_token_message_is_uniform() {
    let error = DomainError::from(TokenError::InvalidRefreshToken);
    assert_eq!(error.to_string(), "Invalid refresh token");
    assert!(error.is_invalid_refresh_token());
    assert!(!error.is_storage_unavailable());
}

#[test]
fn test_storage_error_helpers() {
    let error = DomainError::storage("connection refused");
    assert!(error.is_storage_unavailable());
    assert_eq!(error.to_string(), "Storage unavailable: connection refused");
}

#[test]
fn test_digest_collision_is_not_invalid_token() {
    let error = DomainError::Token(TokenError::DigestCollision);
    assert!(!error.is_invalid_refresh_token());
    assert_eq!(error.to_string(), "Credential digest collision");
}

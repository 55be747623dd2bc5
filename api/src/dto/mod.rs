pub mod auth_dto;

pub use auth_dto::{LogoutRequest, RefreshTokenRequest, RefreshTokenResponse};
pub use ld_shared::errors::ErrorResponse;

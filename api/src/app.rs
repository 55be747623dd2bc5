//! Application factory
//!
//! Builds the actix-web application around an already constructed
//! [`AppState`]; the binary and the integration tests share it.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, HttpResponse,
};
use tracing_actix_web::TracingLogger;

use crate::handlers::error_handler::json_error_handler;
use crate::middleware::{auth::JwtAuth, cors::create_cors};
use crate::routes::auth::{logout::logout, refresh::refresh, AppState};

use ld_core::repositories::TokenRepository;
use ld_shared::errors::{error_codes, ErrorResponse};

/// Create and configure the application with all dependencies
pub fn create_app<T>(
    app_state: web::Data<AppState<T>>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    T: TokenRepository + 'static,
{
    let cors = create_cors(app_state.environment, &app_state.allowed_origins);
    let jwt_auth = JwtAuth::with_config(&app_state.jwt);

    App::new()
        .app_data(app_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        // Registered last, so outermost
        .wrap(cors)
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1").service(
                web::scope("/auth")
                    .route("/refresh", web::post().to(refresh::<T>))
                    .service(
                        web::resource("/logout")
                            .wrap(jwt_auth)
                            .route(web::post().to(logout::<T>)),
                    ),
            ),
        )
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "loandesk-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}

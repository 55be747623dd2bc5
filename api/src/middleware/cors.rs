//! CORS configuration for cross-origin requests.
//!
//! Development is permissive. Production only admits the origins listed in
//! `ALLOWED_ORIGINS`.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use ld_shared::config::Environment;

const CORS_MAX_AGE: usize = 3600;

/// Creates a CORS middleware instance for `environment`
pub fn create_cors(environment: Environment, allowed_origins: &[String]) -> Cors {
    if environment.is_production() {
        create_production_cors(allowed_origins)
    } else {
        create_development_cors()
    }
}

fn create_development_cors() -> Cors {
    tracing::debug!("Configuring permissive CORS for development");

    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::USER_AGENT,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(CORS_MAX_AGE)
}

fn create_production_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(CORS_MAX_AGE);

    for origin in allowed_origins {
        tracing::info!(origin = %origin, "Adding allowed origin");
        cors = cors.allowed_origin(origin);
    }

    cors
}

//! Integration tests for operational endpoints

mod common;

use actix_web::{http::StatusCode, test};
use ld_api::app::create_app;
use serde_json::Value;

use common::test_context;

#[actix_web::test]
async fn test_health_check() {
    let context = test_context();
    let app = test::init_service(create_app(context.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "loandesk-api");
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn test_unknown_route_is_not_found() {
    let context = test_context();
    let app = test::init_service(create_app(context.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/v1/does-not-exist").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

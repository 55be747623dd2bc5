//! Integration tests for the logout endpoint

mod common;

use actix_web::{http::header, http::StatusCode, test};
use ld_api::app::create_app;
use ld_core::domain::entities::RevocationReason;
use serde_json::json;
use uuid::Uuid;

use common::{access_token_for, issue_refresh_token, test_context};

#[actix_web::test]
async fn test_logout_requires_access_token() {
    let context = test_context();
    let app = test::init_service(create_app(context.state.clone())).await;

    let req = test::TestRequest::post().uri("/api/v1/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_single_session() {
    let context = test_context();
    let user_id = Uuid::new_v4();
    let phone = issue_refresh_token(&context, user_id).await;
    let _laptop = issue_refresh_token(&context, user_id).await;

    let app = test::init_service(create_app(context.state.clone())).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", access_token_for(user_id))))
        .set_json(json!({ "refresh_token": phone }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let records = context.repository.records_for_user(user_id).await;
    let revoked: Vec<_> = records.iter().filter(|r| r.is_revoked()).collect();
    assert_eq!(revoked.len(), 1);
    assert_eq!(revoked[0].revoked_reason, Some(RevocationReason::UserLogout));

    // The same credential cannot be logged out twice
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", access_token_for(user_id))))
        .set_json(json!({ "refresh_token": phone }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_without_body_ends_every_session() {
    let context = test_context();
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    for _ in 0..3 {
        issue_refresh_token(&context, user_id).await;
    }
    let untouched = issue_refresh_token(&context, other_user).await;

    let app = test::init_service(create_app(context.state.clone())).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", access_token_for(user_id))))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let records = context.repository.records_for_user(user_id).await;
    assert!(records
        .iter()
        .all(|r| r.revoked_reason == Some(RevocationReason::UserLogoutAll)));

    let others = context.repository.records_for_user(other_user).await;
    assert!(others.iter().all(|r| r.is_active()));

    // The other user's credential still rotates
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": untouched }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_logout_all_with_no_sessions_succeeds() {
    let context = test_context();
    let app = test::init_service(create_app(context.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", access_token_for(Uuid::new_v4())),
        ))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_revoked_token_cannot_refresh() {
    let context = test_context();
    let user_id = Uuid::new_v4();
    let presented = issue_refresh_token(&context, user_id).await;

    let app = test::init_service(create_app(context.state.clone())).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", access_token_for(user_id))))
        .set_json(json!({ "refresh_token": presented }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": presented }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

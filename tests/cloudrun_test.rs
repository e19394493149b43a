//! actix-webトランスポート経由のテスト
#![cfg(feature = "cloud_run")]

use std::sync::Arc;

use actix_web::{test, App};
use faultbridge::{api, cloudrun, ErrorResponse};

#[actix_web::test]
async fn test_error_body_over_http() {
    let app = Arc::new(api::app().unwrap());
    let service = test::init_service(App::new().configure(cloudrun::configure(app))).await;

    let req = test::TestRequest::get()
        .uri("/api/greetings?m=this-is-a-evil")
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(
        res.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let body: ErrorResponse = test::read_body_json(res).await;
    assert_eq!(body.kind, "ConstraintViolation");
    assert_eq!(body.message, "length of query 'm' must be less than or equal to 10");
}

#[actix_web::test]
async fn test_json_body_and_query_decoding() {
    let app = Arc::new(api::app().unwrap());
    let service = test::init_service(App::new().configure(cloudrun::configure(app))).await;

    let req = test::TestRequest::post()
        .uri("/api/books")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(r#"{"isbn":"9784777519699","price":2750,"priority":1}"#)
        .to_request();
    let body: ErrorResponse = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body.status, 400);
    assert_eq!(body.message, "'title' must not be null");

    let req = test::TestRequest::get()
        .uri("/api/greetings?m=hi%21")
        .to_request();
    let body = test::call_and_read_body(&service, req).await;
    assert_eq!(&body[..], b"\"hi!\"");
}

#[actix_web::test]
async fn test_rejected_request_id_over_http() {
    let app = Arc::new(api::app().unwrap());
    let service = test::init_service(App::new().configure(cloudrun::configure(app))).await;

    let req = test::TestRequest::get()
        .uri("/api/greetings")
        .insert_header(("X-Request-Id", "error"))
        .to_request();
    let body: ErrorResponse = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body.status, 400);
    assert_eq!(body.kind, "IllegalArgument");
    assert_eq!(body.message, "Request ID must be specified");
}

#[actix_web::test]
async fn test_unknown_path_is_not_found() {
    let app = Arc::new(api::app().unwrap());
    let service = test::init_service(App::new().configure(cloudrun::configure(app))).await;

    let req = test::TestRequest::delete().uri("/api/books").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status().as_u16(), 404);
}

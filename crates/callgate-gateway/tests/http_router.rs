#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use callgate_gateway::router::build_router;
use common::{harness, token, TokenClaims, LIVE_SID, SESSION_USER};

async fn post(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("response");
    let status = resp.status();
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

fn call_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/v1/call")
        .header(header::CONTENT_TYPE, "application/json")
}

#[tokio::test]
async fn bearer_over_http() {
    let h = harness();
    let app = build_router(h.state.clone());
    let t = token(TokenClaims {
        role: "admin",
        ..Default::default()
    });
    let body = r#"{"func":"admin_stats"}"#;
    let req = call_request()
        .header(header::AUTHORIZATION, format!("bearer {t}"))
        .body(Body::from(body))
        .unwrap();

    let (status, v) = post(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["users"], 12);
}

#[tokio::test]
async fn cookie_over_http_and_status_stripped() {
    let h = harness();
    let app = build_router(h.state.clone());
    let body = r#"{"func":"whoami"}"#;
    let req = call_request()
        .header(header::COOKIE, format!("theme=dark; sid={LIVE_SID}"))
        .body(Body::from(body))
        .unwrap();
    let (status, v) = post(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["user_id"], SESSION_USER);

    let app = build_router(h.state.clone());
    let body = r#"{"func":"premium"}"#;
    let req = call_request().body(Body::from(body)).unwrap();
    let (status, v) = post(app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(v, json!({"error": "unauthorized", "code": "UNAUTHORIZED"}));
}

#[tokio::test]
async fn root_path_and_non_utf8_body() {
    let h = harness();
    let app = build_router(h.state.clone());
    let req = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from(vec![0xffu8, 0xfe, 0x00]))
        .unwrap();
    let (status, v) = post(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn oversize_body_is_refused() {
    let h = harness();
    let app = build_router(h.state.clone());
    let big = format!(r#"{{"func":"ping","args":{{"message":"{}"}}}}"#, "x".repeat(8192));
    let req = call_request().body(Body::from(big)).unwrap();
    let resp = app.oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn ops_endpoints() {
    let h = harness();

    let body = r#"{"func":"ping"}"#;
    let req = call_request().body(Body::from(body)).unwrap();
    let _ = post(build_router(h.state.clone()), req).await;

    let resp = build_router(h.state.clone())
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&text);
    assert!(text.contains("callgate_calls_total{code=\"OK\"} 1"));

    let resp = build_router(h.state.clone())
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    h.state.metrics().set_draining();
    let resp = build_router(h.state.clone())
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

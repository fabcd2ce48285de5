use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use rusty_rental_ddd::api::handlers::AppState;
use rusty_rental_ddd::api::router::create_router;
use rusty_rental_ddd::api::types::*;
use rusty_rental_ddd::domain::value_objects::ItemId;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

use common::{TestFixture, base_time};

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// E2Eテスト用のアプリケーションセットアップ
///
/// インメモリストアとモックアダプタ、固定時計で実際のAPIルーターを
/// 組み立てる。フィクスチャを返すので、テスト側から物品・利用者の
/// 登録と時計操作ができる。
fn setup_e2e_app() -> (Router, TestFixture) {
    let fx = TestFixture::new();
    let app_state = Arc::new(AppState {
        service_deps: fx.deps.clone(),
    });
    (create_router(app_state), fx)
}

/// 操作ユーザーつきのリクエストを送り、ステータスとボディを返す
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user_id: Option<Uuid>,
    body: Option<serde_json::Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("X-Sharer-User-Id", user_id.to_string());
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// 予約リクエストのJSONボディを組み立てる
fn booking_body(item_id: ItemId, from_days: i64, to_days: i64) -> serde_json::Value {
    json!({
        "item_id": item_id.value(),
        "start": base_time() + Duration::days(from_days),
        "end": base_time() + Duration::days(to_days),
    })
}

// ============================================================================
// E2Eテスト: 正常系フロー
// ============================================================================

#[tokio::test]
async fn test_e2e_full_booking_flow() {
    let (app, fx) = setup_e2e_app();
    let (owner_id, item_id) = fx.register_owner_and_item();
    let booker_id = fx.register_user();

    // Step 1: 予約リクエスト（POST /bookings）
    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(booker_id.value()),
        Some(booking_body(item_id, 1, 3)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let created: BookingResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.item_id, item_id.value());
    assert_eq!(created.booker_id, booker_id.value());
    assert_eq!(created.status, "waiting");

    // Step 2: 予約詳細取得（GET /bookings/:id、所有者視点）
    let (status, body) = send(
        &app,
        "GET",
        &format!("/bookings/{}", created.booking_id),
        Some(owner_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let detail: BookingDetailResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(detail.booking_id, created.booking_id);
    assert_eq!(detail.owner_id, owner_id.value());
    assert_eq!(detail.item_name, "Mock Item");
    assert_eq!(detail.status, "waiting");

    // Step 3: 承認（PATCH /bookings/:id?approved=true）
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/bookings/{}?approved=true", created.booking_id),
        Some(owner_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let approved: BookingResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(approved.status, "approved");

    // Step 4: リクエスト者の一覧（GET /bookings?state=ALL）
    let (status, body) = send(
        &app,
        "GET",
        "/bookings?state=ALL",
        Some(booker_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let bookings: Vec<BookingDetailResponse> = serde_json::from_slice(&body).unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].status, "approved");

    // Step 5: 所有者の一覧（GET /bookings/owner、stateは省略でALL）
    let (status, body) = send(
        &app,
        "GET",
        "/bookings/owner",
        Some(owner_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let bookings: Vec<BookingDetailResponse> = serde_json::from_slice(&body).unwrap();
    assert_eq!(bookings.len(), 1);

    // Step 6: 隣接予約ビュー（GET /items/:id/bookings/adjacent）
    // 承認済み予約は未来にあるのでnext側に現れる
    let (status, body) = send(
        &app,
        "GET",
        &format!("/items/{}/bookings/adjacent", item_id.value()),
        Some(owner_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let adjacent: AdjacentBookingsResponse = serde_json::from_slice(&body).unwrap();
    assert!(adjacent.previous.is_none());
    assert_eq!(adjacent.next.unwrap().booking_id, created.booking_id);
}

#[tokio::test]
async fn test_e2e_health_check() {
    let (app, _fx) = setup_e2e_app();

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK".to_vec());
}

// ============================================================================
// E2Eテスト: 異常系
// ============================================================================

#[tokio::test]
async fn test_e2e_missing_user_header_is_bad_request() {
    let (app, fx) = setup_e2e_app();
    let (_, item_id) = fx.register_owner_and_item();

    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        None,
        Some(booking_body(item_id, 1, 3)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "BAD_REQUEST");
}

#[tokio::test]
async fn test_e2e_unknown_booking_is_not_found() {
    let (app, fx) = setup_e2e_app();
    let user_id = fx.register_user();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/bookings/{}", Uuid::new_v4()),
        Some(user_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "BOOKING_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_invalid_interval_is_bad_request() {
    let (app, fx) = setup_e2e_app();
    let (_, item_id) = fx.register_owner_and_item();
    let booker_id = fx.register_user();

    // end < start
    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(booker_id.value()),
        Some(booking_body(item_id, 3, 1)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "INVALID_INTERVAL");
}

#[tokio::test]
async fn test_e2e_self_booking_is_hidden_as_not_found() {
    let (app, fx) = setup_e2e_app();
    let (owner_id, item_id) = fx.register_owner_and_item();

    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(owner_id.value()),
        Some(booking_body(item_id, 1, 3)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "SELF_BOOKING_FORBIDDEN");
}

#[tokio::test]
async fn test_e2e_unknown_state_filter_is_bad_request() {
    let (app, fx) = setup_e2e_app();
    let booker_id = fx.register_user();

    let (status, body) = send(
        &app,
        "GET",
        "/bookings?state=BOGUS",
        Some(booker_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "UNKNOWN_STATE_FILTER");
}

#[tokio::test]
async fn test_e2e_bad_page_window_is_bad_request() {
    let (app, fx) = setup_e2e_app();
    let booker_id = fx.register_user();

    let (status, body) = send(
        &app,
        "GET",
        "/bookings?from=-1&size=10",
        Some(booker_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "BAD_REQUEST");

    let (status, _) = send(
        &app,
        "GET",
        "/bookings?from=0&size=0",
        Some(booker_id.value()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_e2e_decide_by_non_owner_is_hidden_as_not_found() {
    let (app, fx) = setup_e2e_app();
    let (_, item_id) = fx.register_owner_and_item();
    let booker_id = fx.register_user();
    let stranger_id = fx.register_user();

    let (_, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(booker_id.value()),
        Some(booking_body(item_id, 1, 3)),
    )
    .await;
    let created: BookingResponse = serde_json::from_slice(&body).unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/bookings/{}?approved=true", created.booking_id),
        Some(stranger_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "NOT_ITEM_OWNER");
}

#[tokio::test]
async fn test_e2e_second_decision_is_bad_request() {
    let (app, fx) = setup_e2e_app();
    let (owner_id, item_id) = fx.register_owner_and_item();
    let booker_id = fx.register_user();

    let (_, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(booker_id.value()),
        Some(booking_body(item_id, 1, 3)),
    )
    .await;
    let created: BookingResponse = serde_json::from_slice(&body).unwrap();

    let patch_uri = format!("/bookings/{}?approved=true", created.booking_id);
    let (status, _) = send(&app, "PATCH", &patch_uri, Some(owner_id.value()), None).await;
    assert_eq!(status, StatusCode::OK);

    // 2回目の判断は400
    let (status, body) = send(&app, "PATCH", &patch_uri, Some(owner_id.value()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "ALREADY_DECIDED");
}

#[tokio::test]
async fn test_e2e_conflicting_request_is_bad_request() {
    let (app, fx) = setup_e2e_app();
    let (owner_id, item_id) = fx.register_owner_and_item();
    let booker_a = fx.register_user();
    let booker_b = fx.register_user();

    // booker_aの予約を承認
    let (_, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(booker_a.value()),
        Some(booking_body(item_id, 1, 3)),
    )
    .await;
    let created: BookingResponse = serde_json::from_slice(&body).unwrap();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/bookings/{}?approved=true", created.booking_id),
        Some(owner_id.value()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 重なる期間の新規リクエストは409相当（このAPIでは400）で拒否される
    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(booker_b.value()),
        Some(booking_body(item_id, 2, 4)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "INTERVAL_CONFLICT");
}

#[tokio::test]
async fn test_e2e_adjacent_view_requires_owner() {
    let (app, fx) = setup_e2e_app();
    let (_, item_id) = fx.register_owner_and_item();
    let stranger_id = fx.register_user();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/items/{}/bookings/adjacent", item_id.value()),
        Some(stranger_id.value()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "NOT_ITEM_OWNER");
}

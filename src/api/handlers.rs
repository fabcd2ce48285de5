use crate::application::booking::{
    ActorRole, ServiceDependencies, adjacent_bookings as execute_adjacent_bookings,
    decide_booking as execute_decide_booking, get_booking as execute_get_booking,
    list_bookings as execute_list_bookings, request_booking as execute_request_booking,
};
use crate::domain::commands::DecideBooking;
use crate::domain::value_objects::{BookingId, ItemId, PageWindow, UserId};
use axum::{
    Json,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        AdjacentBookingsResponse, BookingDetailResponse, BookingResponse, CreateBookingRequest,
        DecideBookingQuery, ListBookingsQuery,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Extractors
// ============================================================================

/// 認証済みの操作ユーザーID
///
/// 本体の認証はゲートウェイの責務で、ここにはX-Sharer-User-Id
/// ヘッダとして渡ってくる。ヘッダが無い・UUIDでない場合は400。
#[derive(Debug, Clone, Copy)]
pub struct SharerUserId(pub UserId);

pub const SHARER_USER_HEADER: &str = "X-Sharer-User-Id";

#[axum::async_trait]
impl<S> FromRequestParts<S> for SharerUserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(SHARER_USER_HEADER)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("{} header is required", SHARER_USER_HEADER))
            })?
            .to_str()
            .map_err(|_| {
                ApiError::BadRequest(format!("{} header is not valid", SHARER_USER_HEADER))
            })?;

        let uuid = Uuid::parse_str(value).map_err(|_| {
            ApiError::BadRequest(format!("{} header is not a valid UUID", SHARER_USER_HEADER))
        })?;

        Ok(SharerUserId(UserId::from_uuid(uuid)))
    }
}

/// クエリパラメータからページウィンドウを組み立てる
///
/// 省略時のデフォルトはfrom = 0, size = 10（ゲートウェイの既定値）。
fn page_window(from: Option<i64>, size: Option<i64>) -> Result<PageWindow, ApiError> {
    let from = from.unwrap_or(0);
    let size = size.unwrap_or(10);
    PageWindow::new(from, size).map_err(|_| {
        ApiError::BadRequest(format!("bad page request from = {}, size = {}", from, size))
    })
}

// ============================================================================
// Command handlers (POST / PATCH)
// ============================================================================

/// POST /bookings - 新しい予約リクエストを作成
///
/// 強制されるビジネスルール:
/// - 期間が妥当であること（start < end）
/// - 物品・リクエスト者が存在すること
/// - 物品が貸出可能であること
/// - 自分の物品でないこと
/// - 期間が承認済み予約と重なっていないこと
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    SharerUserId(booker_id): SharerUserId,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let cmd = req.to_command(booker_id);

    let booking = execute_request_booking(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// PATCH /bookings/:id?approved=true|false - 予約を承認または却下
///
/// 強制されるビジネスルール:
/// - 操作者が物品の所有者であること
/// - 予約がWaiting状態であること
/// - 承認時は期間が承認済み予約と重なっていないこと
pub async fn decide_booking(
    State(state): State<Arc<AppState>>,
    SharerUserId(acting_user_id): SharerUserId,
    Path(booking_id): Path<Uuid>,
    Query(query): Query<DecideBookingQuery>,
) -> Result<Json<BookingResponse>, ApiError> {
    let cmd = DecideBooking {
        acting_user_id,
        booking_id: BookingId::from_uuid(booking_id),
        approve: query.approved,
    };

    let booking = execute_decide_booking(&state.service_deps, cmd).await?;

    Ok(Json(BookingResponse::from(booking)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /bookings/:id - 予約詳細をIDで取得
///
/// 予約のリクエスト者か物品の所有者だけが閲覧できる。
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    SharerUserId(acting_user_id): SharerUserId,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = execute_get_booking(
        &state.service_deps,
        acting_user_id,
        BookingId::from_uuid(booking_id),
    )
    .await?;

    Ok(Json(BookingDetailResponse::from(detail)))
}

/// GET /bookings - 操作ユーザーがリクエストした予約の一覧
///
/// クエリパラメータ:
/// - state: 状態フィルタ（ALL / CURRENT / PAST / FUTURE / WAITING / REJECTED、
///   省略時はALL）
/// - from / size: ページウィンドウ（省略時は0 / 10）
pub async fn list_booker_bookings(
    State(state): State<Arc<AppState>>,
    SharerUserId(actor_id): SharerUserId,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingDetailResponse>>, ApiError> {
    let window = page_window(query.from, query.size)?;
    let state_filter = query.state.as_deref().unwrap_or("ALL");

    let details = execute_list_bookings(
        &state.service_deps,
        ActorRole::Booker,
        actor_id,
        state_filter,
        window,
    )
    .await?;

    Ok(Json(
        details.into_iter().map(BookingDetailResponse::from).collect(),
    ))
}

/// GET /bookings/owner - 操作ユーザーが所有する物品への予約の一覧
///
/// パラメータはGET /bookingsと同じ。owner視点のクエリに切り替わる。
pub async fn list_owner_bookings(
    State(state): State<Arc<AppState>>,
    SharerUserId(actor_id): SharerUserId,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingDetailResponse>>, ApiError> {
    let window = page_window(query.from, query.size)?;
    let state_filter = query.state.as_deref().unwrap_or("ALL");

    let details = execute_list_bookings(
        &state.service_deps,
        ActorRole::Owner,
        actor_id,
        state_filter,
        window,
    )
    .await?;

    Ok(Json(
        details.into_iter().map(BookingDetailResponse::from).collect(),
    ))
}

/// GET /items/:id/bookings/adjacent - 物品の直前・直後の承認済み予約
///
/// 物品詳細ビューの「前回の予約」「次回の予約」用。所有者のみ。
pub async fn get_adjacent_bookings(
    State(state): State<Arc<AppState>>,
    SharerUserId(acting_user_id): SharerUserId,
    Path(item_id): Path<Uuid>,
) -> Result<Json<AdjacentBookingsResponse>, ApiError> {
    let adjacent = execute_adjacent_bookings(
        &state.service_deps,
        acting_user_id,
        ItemId::from_uuid(item_id),
    )
    .await?;

    Ok(Json(AdjacentBookingsResponse::from(adjacent)))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::booking::BookingDetail;
use crate::domain::booking::Booking;
use crate::domain::commands::RequestBooking;
use crate::domain::value_objects::{ItemId, UserId};
use crate::ports::booking_store::AdjacentBookings;

/// 予約リクエスト（POST /bookings）
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub item_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CreateBookingRequest {
    /// リクエスト者のIDと組み合わせてコマンドに変換する
    pub fn to_command(&self, booker_id: UserId) -> RequestBooking {
        RequestBooking {
            item_id: ItemId::from_uuid(self.item_id),
            booker_id,
            start: self.start,
            end: self.end,
        }
    }
}

/// 承認・却下のクエリパラメータ（PATCH /bookings/:id）
#[derive(Debug, Deserialize)]
pub struct DecideBookingQuery {
    pub approved: bool,
}

/// 予約一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    /// 状態フィルタ（省略時はALL）
    pub state: Option<String>,
    /// ページオフセット（省略時は0）
    pub from: Option<i64>,
    /// ページサイズ（省略時は10）
    pub size: Option<i64>,
}

/// 予約レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub item_id: Uuid,
    pub booker_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.booking_id.value(),
            item_id: booking.item_id.value(),
            booker_id: booking.booker_id.value(),
            start: booking.period.start(),
            end: booking.period.end(),
            status: booking.status.as_str().to_string(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// 予約詳細レスポンス（GET /bookings/:id と一覧）
///
/// 予約に、ルックアップで解決した物品名・所有者・リクエスト者名を
/// 添えたビュー。
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingDetailResponse {
    pub booking_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub owner_id: Uuid,
    pub booker_id: Uuid,
    pub booker_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDetail> for BookingDetailResponse {
    fn from(detail: BookingDetail) -> Self {
        Self {
            booking_id: detail.booking.booking_id.value(),
            item_id: detail.booking.item_id.value(),
            item_name: detail.item.name,
            owner_id: detail.booking.owner_id.value(),
            booker_id: detail.booking.booker_id.value(),
            booker_name: detail.booker.name,
            start: detail.booking.period.start(),
            end: detail.booking.period.end(),
            status: detail.booking.status.as_str().to_string(),
            created_at: detail.booking.created_at,
            updated_at: detail.booking.updated_at,
        }
    }
}

/// 直前・直後の承認済み予約レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct AdjacentBookingsResponse {
    pub previous: Option<BookingResponse>,
    pub next: Option<BookingResponse>,
}

impl From<AdjacentBookings> for AdjacentBookingsResponse {
    fn from(adjacent: AdjacentBookings) -> Self {
        Self {
            previous: adjacent.previous.map(BookingResponse::from),
            next: adjacent.next.map(BookingResponse::from),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

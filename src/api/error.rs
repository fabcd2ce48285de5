use crate::application::booking::BookingApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへの
/// マッピングを提供する。リクエスト自体の不備（ヘッダ欠落や
/// 不正なページ指定）はBadRequestで表す。
#[derive(Debug)]
pub enum ApiError {
    Application(BookingApplicationError),
    BadRequest(String),
}

impl From<BookingApplicationError> for ApiError {
    fn from(err: BookingApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),

            ApiError::Application(err) => match err {
                // 404 Not Found - リソースが存在しない、または存在を明かさない
                BookingApplicationError::ItemNotFound(_) => {
                    (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND", err.to_string())
                }
                BookingApplicationError::UserNotFound(_) => {
                    (StatusCode::NOT_FOUND, "USER_NOT_FOUND", err.to_string())
                }
                BookingApplicationError::BookingNotFound(_) => {
                    (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND", err.to_string())
                }
                BookingApplicationError::NotItemOwner(_) => {
                    (StatusCode::NOT_FOUND, "NOT_ITEM_OWNER", err.to_string())
                }
                BookingApplicationError::NotAuthorized(_) => {
                    (StatusCode::NOT_FOUND, "NOT_AUTHORIZED", err.to_string())
                }
                BookingApplicationError::SelfBookingForbidden(_) => (
                    StatusCode::NOT_FOUND,
                    "SELF_BOOKING_FORBIDDEN",
                    err.to_string(),
                ),

                // 400 Bad Request - ビジネスルール違反
                BookingApplicationError::InvalidInterval => {
                    (StatusCode::BAD_REQUEST, "INVALID_INTERVAL", err.to_string())
                }
                BookingApplicationError::ItemUnavailable(_) => {
                    (StatusCode::BAD_REQUEST, "ITEM_UNAVAILABLE", err.to_string())
                }
                BookingApplicationError::IntervalConflict => (
                    StatusCode::BAD_REQUEST,
                    "INTERVAL_CONFLICT",
                    err.to_string(),
                ),
                BookingApplicationError::AlreadyDecided(_) => {
                    (StatusCode::BAD_REQUEST, "ALREADY_DECIDED", err.to_string())
                }
                BookingApplicationError::UnknownStateFilter(_) => (
                    StatusCode::BAD_REQUEST,
                    "UNKNOWN_STATE_FILTER",
                    err.to_string(),
                ),

                // 500 Internal Server Error - インフラ障害
                // 詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                BookingApplicationError::StoreError(ref e) => {
                    tracing::error!("Booking store error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORE_ERROR",
                        "Booking store error".to_string(),
                    )
                }
                BookingApplicationError::CatalogError(ref e) => {
                    tracing::error!("Item catalog error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CATALOG_ERROR",
                        "Item catalog error".to_string(),
                    )
                }
                BookingApplicationError::DirectoryError(ref e) => {
                    tracing::error!("User directory error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DIRECTORY_ERROR",
                        "User directory error".to_string(),
                    )
                }
            },
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}

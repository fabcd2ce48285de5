use thiserror::Error;

use crate::domain::value_objects::{BookingId, ItemId, UserId};

/// 予約管理アプリケーション層のエラー
///
/// ビジネスルール違反はすべて呼び出し側で回復可能な条件として
/// そのまま境界層に渡す。コア内部でのリトライは行わない。
/// インフラ系のバリアント（StoreError / CatalogError / DirectoryError）
/// だけは一時的障害の可能性があり、呼び出し側が操作全体を有限回
/// リトライしてよいことを区別して伝える。
#[derive(Debug, Error)]
pub enum BookingApplicationError {
    /// 終了時刻が開始時刻より後でない
    #[error("booking end must be later than start")]
    InvalidInterval,

    /// 物品が存在しない
    #[error("item with id = {0} not found")]
    ItemNotFound(ItemId),

    /// 利用者が存在しない
    #[error("user with id = {0} not found")]
    UserNotFound(UserId),

    /// 物品が貸出不可
    #[error("item with id = {0} is not available for booking")]
    ItemUnavailable(ItemId),

    /// 自分の物品は予約できない
    #[error("user with id = {0} cannot book their own item")]
    SelfBookingForbidden(UserId),

    /// 期間が承認済み予約と重なっている
    #[error("item cannot be booked for these dates")]
    IntervalConflict,

    /// 予約が見つからない
    #[error("booking with id = {0} not found")]
    BookingNotFound(BookingId),

    /// 操作対象の予約の物品所有者でない
    #[error("user with id = {0} does not own this booking")]
    NotItemOwner(UserId),

    /// 予約の当事者（booker/owner）でない
    #[error("user with id = {0} is not a party to this booking")]
    NotAuthorized(UserId),

    /// 既に承認または却下済み
    #[error("booking with id = {0} has already been decided")]
    AlreadyDecided(BookingId),

    /// 未知の状態フィルタ
    #[error("unknown state: {0}")]
    UnknownStateFilter(String),

    /// BookingStoreのエラー（一時的障害の可能性あり・リトライ安全）
    #[error("booking store error")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ItemCatalogのエラー
    #[error("item catalog error")]
    CatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// UserDirectoryのエラー
    #[error("user directory error")]
    DirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookingApplicationError>;

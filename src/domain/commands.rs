use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, ItemId, UserId};

/// コマンド：予約をリクエストする
///
/// start/end は生の時刻のまま運ぶ。`BookingPeriod`への変換（と
/// start < end の検証）はアプリケーション層で行う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBooking {
    pub item_id: ItemId,
    pub booker_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// コマンド：予約を承認または却下する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideBooking {
    pub acting_user_id: UserId,
    pub booking_id: BookingId,
    pub approve: bool,
}

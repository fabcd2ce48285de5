use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BookingId, BookingPeriod, DecideBookingError, ItemId, RequestBookingError, UserId,
};

/// 予約ステータス
///
/// 状態遷移は WAITING → APPROVED または WAITING → REJECTED のみ。
/// APPROVED と REJECTED は終端状態であり、以降の遷移は存在しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    /// 承認待ち
    Waiting,
    /// 承認済み
    Approved,
    /// 却下済み
    Rejected,
}

impl BookingStatus {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Waiting => "waiting",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
        }
    }

    /// 終端状態（承認済みまたは却下済み）か
    pub fn is_decided(&self) -> bool {
        matches!(self, BookingStatus::Approved | BookingStatus::Rejected)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(BookingStatus::Waiting),
            "approved" => Ok(BookingStatus::Approved),
            "rejected" => Ok(BookingStatus::Rejected),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

/// Booking集約 - 1つの物品に対する1回の予約リクエスト
///
/// 物品と利用者はIDのみで参照する（弱い参照）。詳細は外部コンテキストの
/// ルックアップで解決され、ここに正とするコピーは持たない。
/// owner_id は予約作成時に物品カタログから解決した所有者を記録したもの。
/// 物品参照と同様に作成後は不変。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    // 識別子
    pub booking_id: BookingId,

    // 他の集約への参照（IDのみ）
    pub item_id: ItemId,
    pub owner_id: UserId,
    pub booker_id: UserId,

    // 予約管理の責務
    pub period: BookingPeriod,
    pub status: BookingStatus,

    // 監査情報
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 純粋関数：予約をリクエストする
///
/// ビジネスルール：
/// - 自分の物品は予約できない
/// - 初期状態はWaiting
///
/// 期間の妥当性（start < end）は`BookingPeriod`の構築時点で保証済み。
/// 物品・利用者の存在確認や承認済み予約との重なり確認は
/// アプリケーション層の責務。副作用なし。新しいBookingを返す。
pub fn request_booking(
    item_id: ItemId,
    owner_id: UserId,
    booker_id: UserId,
    period: BookingPeriod,
    requested_at: DateTime<Utc>,
) -> Result<Booking, RequestBookingError> {
    // バリデーション：自己予約は不可
    if booker_id == owner_id {
        return Err(RequestBookingError::SelfBooking);
    }

    Ok(Booking {
        booking_id: BookingId::new(),
        item_id,
        owner_id,
        booker_id,
        period,
        status: BookingStatus::Waiting,
        created_at: requested_at,
        updated_at: requested_at,
    })
}

/// 純粋関数：予約を承認または却下する
///
/// ビジネスルール：
/// - Waiting状態からのみ遷移可能
/// - ステータスが変わるのはこの関数だけ
///
/// 副作用なし。新しいBookingを返す。
pub fn decide(
    booking: &Booking,
    approve: bool,
    decided_at: DateTime<Utc>,
) -> Result<Booking, DecideBookingError> {
    // バリデーション：終端状態からの遷移は不可
    if booking.status.is_decided() {
        return Err(DecideBookingError::AlreadyDecided);
    }

    let status = if approve {
        BookingStatus::Approved
    } else {
        BookingStatus::Rejected
    };

    Ok(Booking {
        status,
        updated_at: decided_at,
        ..booking.clone()
    })
}

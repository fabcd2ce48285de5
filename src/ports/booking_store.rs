use crate::domain::booking::Booking;
use crate::domain::value_objects::{BookingId, BookingPeriod, ItemId, PageWindow, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約一覧の状態フィルタ
///
/// 閉じたタグ付きバリアント。未知のタグは境界（パース時）で拒否され、
/// エンジンやストアには決して到達しない。ストアアダプタはこの列挙を
/// クエリ選択表として1つのクエリに写像する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStateFilter {
    /// すべての予約
    All,
    /// 現在進行中（start <= now かつ end >= now）
    Current,
    /// 過去（end < now）
    Past,
    /// 未来（start > now）
    Future,
    /// 承認待ちのみ
    Waiting,
    /// 却下済みのみ
    Rejected,
}

impl BookingStateFilter {
    /// ワイヤ表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStateFilter::All => "ALL",
            BookingStateFilter::Current => "CURRENT",
            BookingStateFilter::Past => "PAST",
            BookingStateFilter::Future => "FUTURE",
            BookingStateFilter::Waiting => "WAITING",
            BookingStateFilter::Rejected => "REJECTED",
        }
    }
}

impl std::str::FromStr for BookingStateFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(BookingStateFilter::All),
            "CURRENT" => Ok(BookingStateFilter::Current),
            "PAST" => Ok(BookingStateFilter::Past),
            "FUTURE" => Ok(BookingStateFilter::Future),
            "WAITING" => Ok(BookingStateFilter::Waiting),
            "REJECTED" => Ok(BookingStateFilter::Rejected),
            _ => Err(format!("Unknown state: {}", s)),
        }
    }
}

/// 基準時刻の前後にある承認済み予約のペア
///
/// previous は end が基準時刻より前で最大のもの、
/// next は start が基準時刻より後で最小のもの。どちらも無い場合がある。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdjacentBookings {
    pub previous: Option<Booking>,
    pub next: Option<Booking>,
}

/// 予約ストアポート
///
/// 永続CRUDと、時間・状態述語で分割されたページングつきクエリ群。
/// `has_approved_overlap` / `find_adjacent` / `find_adjacent_for_items` は
/// 承認済み予約だけを見る区間インデックスで、副作用のない純粋な読み取り。
///
/// 一覧系クエリはすべて start 降順で返す。範囲外のオフセットは
/// エラーではなく空ページを返す。
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// 予約を永続化する
    ///
    /// 作成経路はこれのみで、レコードは常にWaitingで到着する。
    async fn create(&self, booking: Booking) -> Result<Booking>;

    /// IDで予約を取得する
    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>>;

    /// 既存レコードへの変更を永続化する（ステータス遷移に使用）
    async fn save(&self, booking: Booking) -> Result<()>;

    /// 指定期間が物品の承認済み予約と重なるか
    ///
    /// Waiting / Rejected の予約は判定に参加しない。
    async fn has_approved_overlap(&self, item_id: ItemId, period: &BookingPeriod) -> Result<bool>;

    /// 基準時刻の直前・直後の承認済み予約を取得する
    async fn find_adjacent(&self, item_id: ItemId, at: DateTime<Utc>)
        -> Result<AdjacentBookings>;

    /// 複数物品分の直前・直後の承認済み予約を一括取得する
    ///
    /// カタログ一覧の組み立てで物品ごとの個別クエリを避けるために使用される。
    async fn find_adjacent_for_items(
        &self,
        item_ids: &[ItemId],
        at: DateTime<Utc>,
    ) -> Result<HashMap<ItemId, AdjacentBookings>>;

    /// 利用者がリクエストした予約を検索する（booker側）
    async fn find_for_booker(
        &self,
        booker_id: UserId,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
    ) -> Result<Vec<Booking>>;

    /// 利用者が所有する物品への予約を検索する（owner側）
    async fn find_for_owner(
        &self,
        owner_id: UserId,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
    ) -> Result<Vec<Booking>>;

    /// 利用者が物品の利用を完了しているか
    ///
    /// 承認済みかつ end < before の予約が存在すればtrue。
    /// レビュー投稿の資格確認に使用される。
    async fn has_completed_booking(
        &self,
        item_id: ItemId,
        booker_id: UserId,
        before: DateTime<Utc>,
    ) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // TDD: BookingStateFilter のテスト
    #[test]
    fn test_state_filter_round_trip() {
        for filter in [
            BookingStateFilter::All,
            BookingStateFilter::Current,
            BookingStateFilter::Past,
            BookingStateFilter::Future,
            BookingStateFilter::Waiting,
            BookingStateFilter::Rejected,
        ] {
            let parsed: BookingStateFilter = filter.as_str().parse().unwrap();
            assert_eq!(parsed, filter);
        }
    }

    #[test]
    fn test_state_filter_parse_is_case_insensitive() {
        let parsed: BookingStateFilter = "current".parse().unwrap();
        assert_eq!(parsed, BookingStateFilter::Current);
    }

    #[test]
    fn test_state_filter_rejects_unknown() {
        let result = "BOGUS".parse::<BookingStateFilter>();
        assert!(result.is_err());
    }
}

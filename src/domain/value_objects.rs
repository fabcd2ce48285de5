use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 予約ID - 予約管理コンテキストの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 物品ID - 物品カタログコンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 利用者ID - 利用者管理コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 予約期間エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingPeriodError {
    /// 終了時刻が開始時刻より後でない
    EndNotAfterStart,
}

/// 予約期間 `[start, end)`
///
/// 不変条件：start < end
/// 型システムでこの制約を強制し、空または逆転した期間を作成できないようにする。
/// 区間は半開区間として扱う（endちょうどに始まる予約とは重ならない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl BookingPeriod {
    /// 新規作成
    ///
    /// # エラー
    /// `end <= start` の場合は`BookingPeriodError::EndNotAfterStart`を返す
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BookingPeriodError> {
        if end <= start {
            return Err(BookingPeriodError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// 2つの期間が重なるか
    ///
    /// 半開区間 `[s1, e1)` と `[s2, e2)` は `s1 < e2 && s2 < e1` のとき重なる。
    /// 隣接する期間（e1 == s2）は重ならない。
    pub fn overlaps(&self, other: &BookingPeriod) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// ページウィンドウエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageWindowError {
    /// オフセットが負
    NegativeOffset,
    /// リミットが正でない
    NonPositiveLimit,
}

/// ページウィンドウ (offset, limit)
///
/// 不変条件：offset >= 0 かつ limit > 0
/// 範囲外のオフセットはエラーではなく空ページを返す（ストア側の契約）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    offset: i64,
    limit: i64,
}

impl PageWindow {
    pub fn new(offset: i64, limit: i64) -> Result<Self, PageWindowError> {
        if offset < 0 {
            return Err(PageWindowError::NegativeOffset);
        }
        if limit <= 0 {
            return Err(PageWindowError::NonPositiveLimit);
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

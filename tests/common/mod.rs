use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusty_rental_ddd::adapters::mock::{FixedClock, ItemCatalog, UserDirectory};
use rusty_rental_ddd::application::booking::{ItemLockRegistry, ServiceDependencies};
use rusty_rental_ddd::domain::booking::{Booking, BookingStatus};
use rusty_rental_ddd::domain::value_objects::*;
use rusty_rental_ddd::ports::booking_store::{
    self, AdjacentBookings, BookingStateFilter, BookingStore,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// インメモリBookingStore実装（テスト用）
// ============================================================================

/// インメモリBookingStore実装
///
/// ポートの契約（start降順、範囲外オフセットは空ページ、承認済みのみの
/// 区間インデックス）をそのまま満たす参照実装。
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<BookingId, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
        }
    }

    /// 全予約のスナップショットを取得（不変条件の検証用）
    pub fn snapshot(&self) -> Vec<Booking> {
        self.bookings.lock().unwrap().values().cloned().collect()
    }

    fn filtered(
        &self,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
        by_actor: impl Fn(&Booking) -> bool,
    ) -> Vec<Booking> {
        let bookings = self.bookings.lock().unwrap();
        let mut matched: Vec<Booking> = bookings
            .values()
            .filter(|b| by_actor(b))
            .filter(|b| match filter {
                BookingStateFilter::All => true,
                BookingStateFilter::Current => {
                    b.period.start() <= at && b.period.end() >= at
                }
                BookingStateFilter::Past => b.period.end() < at,
                BookingStateFilter::Future => b.period.start() > at,
                BookingStateFilter::Waiting => b.status == BookingStatus::Waiting,
                BookingStateFilter::Rejected => b.status == BookingStatus::Rejected,
            })
            .cloned()
            .collect();

        // start降順
        matched.sort_by(|a, b| b.period.start().cmp(&a.period.start()));

        matched
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.limit() as usize)
            .collect()
    }

    fn adjacent_of(&self, item_id: ItemId, at: DateTime<Utc>) -> AdjacentBookings {
        let bookings = self.bookings.lock().unwrap();
        let approved = bookings
            .values()
            .filter(|b| b.item_id == item_id && b.status == BookingStatus::Approved);

        let previous = approved
            .clone()
            .filter(|b| b.period.end() < at)
            .max_by_key(|b| b.period.end())
            .cloned();
        let next = approved
            .filter(|b| b.period.start() > at)
            .min_by_key(|b| b.period.start())
            .cloned();

        AdjacentBookings { previous, next }
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: Booking) -> booking_store::Result<Booking> {
        let mut bookings = self.bookings.lock().unwrap();
        bookings.insert(booking.booking_id, booking.clone());
        Ok(booking)
    }

    async fn get_by_id(&self, booking_id: BookingId) -> booking_store::Result<Option<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings.get(&booking_id).cloned())
    }

    async fn save(&self, booking: Booking) -> booking_store::Result<()> {
        let mut bookings = self.bookings.lock().unwrap();
        bookings.insert(booking.booking_id, booking);
        Ok(())
    }

    async fn has_approved_overlap(
        &self,
        item_id: ItemId,
        period: &BookingPeriod,
    ) -> booking_store::Result<bool> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings.values().any(|b| {
            b.item_id == item_id
                && b.status == BookingStatus::Approved
                && b.period.overlaps(period)
        }))
    }

    async fn find_adjacent(
        &self,
        item_id: ItemId,
        at: DateTime<Utc>,
    ) -> booking_store::Result<AdjacentBookings> {
        Ok(self.adjacent_of(item_id, at))
    }

    async fn find_adjacent_for_items(
        &self,
        item_ids: &[ItemId],
        at: DateTime<Utc>,
    ) -> booking_store::Result<HashMap<ItemId, AdjacentBookings>> {
        Ok(item_ids
            .iter()
            .map(|id| (*id, self.adjacent_of(*id, at)))
            .collect())
    }

    async fn find_for_booker(
        &self,
        booker_id: UserId,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
    ) -> booking_store::Result<Vec<Booking>> {
        Ok(self.filtered(filter, at, window, |b| b.booker_id == booker_id))
    }

    async fn find_for_owner(
        &self,
        owner_id: UserId,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
    ) -> booking_store::Result<Vec<Booking>> {
        Ok(self.filtered(filter, at, window, |b| b.owner_id == owner_id))
    }

    async fn has_completed_booking(
        &self,
        item_id: ItemId,
        booker_id: UserId,
        before: DateTime<Utc>,
    ) -> booking_store::Result<bool> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings.values().any(|b| {
            b.item_id == item_id
                && b.booker_id == booker_id
                && b.status == BookingStatus::Approved
                && b.period.end() < before
        }))
    }
}

// ============================================================================
// テストフィクスチャ
// ============================================================================

/// テストの基準時刻（決定的な「現在」）
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
}

/// テスト用の依存関係一式
///
/// すべてインメモリ・固定時計で組み立てる。型付きのハンドルを
/// 残しておき、テスト側から状態の準備と検証ができるようにする。
pub struct TestFixture {
    pub deps: ServiceDependencies,
    pub booking_store: Arc<InMemoryBookingStore>,
    pub item_catalog: Arc<ItemCatalog>,
    pub user_directory: Arc<UserDirectory>,
    pub clock: Arc<FixedClock>,
}

impl TestFixture {
    pub fn new() -> Self {
        let booking_store = Arc::new(InMemoryBookingStore::new());
        let item_catalog = Arc::new(ItemCatalog::new());
        let user_directory = Arc::new(UserDirectory::new());
        let clock = Arc::new(FixedClock::new(base_time()));

        let deps = ServiceDependencies {
            booking_store: booking_store.clone(),
            item_catalog: item_catalog.clone(),
            user_directory: user_directory.clone(),
            clock: clock.clone(),
            item_locks: ItemLockRegistry::new(),
        };

        Self {
            deps,
            booking_store,
            item_catalog,
            user_directory,
            clock,
        }
    }

    /// 所有者と貸出可能な物品を登録する
    pub fn register_owner_and_item(&self) -> (UserId, ItemId) {
        let owner_id = UserId::new();
        let item_id = ItemId::new();
        self.user_directory.add_user(owner_id);
        self.item_catalog.add_item(item_id, owner_id);
        (owner_id, item_id)
    }

    /// 利用者を登録する
    pub fn register_user(&self) -> UserId {
        let user_id = UserId::new();
        self.user_directory.add_user(user_id);
        user_id
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

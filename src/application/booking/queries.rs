use crate::domain::booking::Booking;
use crate::domain::value_objects::{ItemId, PageWindow, UserId};
use crate::ports::*;
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};

use super::booking_service::{BookingDetail, ServiceDependencies};
use super::errors::{BookingApplicationError, Result};

/// 一覧クエリの視点
///
/// Booker: 利用者がリクエストした予約
/// Owner: 利用者が所有する物品への予約
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Booker,
    Owner,
}

/// 予約の集合を詳細ビューの集合に変換するヘルパー関数
///
/// 物品と利用者は重複を除いたうえで並行に解決し、
/// 予約1件ごとのルックアップ発行を避ける。
async fn build_booking_details(
    deps: &ServiceDependencies,
    bookings: Vec<Booking>,
) -> Result<Vec<BookingDetail>> {
    let item_ids: Vec<ItemId> = bookings
        .iter()
        .map(|b| b.item_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let booker_ids: Vec<UserId> = bookings
        .iter()
        .map(|b| b.booker_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let items = try_join_all(item_ids.iter().map(|id| deps.item_catalog.resolve(*id)))
        .await
        .map_err(BookingApplicationError::CatalogError)?;
    let bookers = try_join_all(booker_ids.iter().map(|id| deps.user_directory.resolve(*id)))
        .await
        .map_err(BookingApplicationError::DirectoryError)?;

    let mut item_map: HashMap<ItemId, ItemRecord> = HashMap::new();
    for (id, item) in item_ids.iter().zip(items) {
        let item = item.ok_or(BookingApplicationError::ItemNotFound(*id))?;
        item_map.insert(*id, item);
    }

    let mut booker_map: HashMap<UserId, UserSummary> = HashMap::new();
    for (id, booker) in booker_ids.iter().zip(bookers) {
        let booker = booker.ok_or(BookingApplicationError::UserNotFound(*id))?;
        booker_map.insert(*id, booker);
    }

    Ok(bookings
        .into_iter()
        .map(|booking| {
            let item = item_map[&booking.item_id].clone();
            let booker = booker_map[&booking.booker_id].clone();
            BookingDetail {
                booking,
                item,
                booker,
            }
        })
        .collect())
}

/// 状態フィルタつきで予約一覧を取得する
///
/// フィルタのタグ文字列はストアに触れる前にパースし、未知のタグは
/// その場で`UnknownStateFilter`として失敗させる。現在時刻は呼び出し
/// ごとに一度だけ取得し、クエリ全体で同じ瞬間を使う。結果はstart
/// 降順で、指定されたページウィンドウに切り出される。
pub async fn list_bookings(
    deps: &ServiceDependencies,
    role: ActorRole,
    actor_id: UserId,
    state: &str,
    window: PageWindow,
) -> Result<Vec<BookingDetail>> {
    // 1. 状態フィルタの解決（境界で拒否。ストアには到達させない）
    let filter: BookingStateFilter = state
        .parse()
        .map_err(|_| BookingApplicationError::UnknownStateFilter(state.to_string()))?;

    // 2. アクターの存在確認
    let actor_exists = deps
        .user_directory
        .exists(actor_id)
        .await
        .map_err(BookingApplicationError::DirectoryError)?;

    if !actor_exists {
        return Err(BookingApplicationError::UserNotFound(actor_id));
    }

    // 3. 現在時刻のスナップショット（クエリ全体で単一の瞬間）
    let now = deps.clock.now();

    // 4. フィルタと視点を1つのストアクエリに写像
    let bookings = match role {
        ActorRole::Booker => deps
            .booking_store
            .find_for_booker(actor_id, filter, now, window)
            .await
            .map_err(BookingApplicationError::StoreError)?,
        ActorRole::Owner => deps
            .booking_store
            .find_for_owner(actor_id, filter, now, window)
            .await
            .map_err(BookingApplicationError::StoreError)?,
    };

    // 5. 詳細ビューへの変換（一括解決）
    build_booking_details(deps, bookings).await
}

/// 物品の直前・直後の承認済み予約を取得する
///
/// 物品詳細ビューの「前回の予約」「次回の予約」の組み立てに使用される。
/// 所有者だけが自分の物品の予約状況を見られる。
pub async fn adjacent_bookings(
    deps: &ServiceDependencies,
    acting_user_id: UserId,
    item_id: ItemId,
) -> Result<AdjacentBookings> {
    let item = deps
        .item_catalog
        .resolve(item_id)
        .await
        .map_err(BookingApplicationError::CatalogError)?
        .ok_or(BookingApplicationError::ItemNotFound(item_id))?;

    if item.owner_id != acting_user_id {
        return Err(BookingApplicationError::NotItemOwner(acting_user_id));
    }

    let now = deps.clock.now();

    deps.booking_store
        .find_adjacent(item_id, now)
        .await
        .map_err(BookingApplicationError::StoreError)
}

/// 複数物品分の直前・直後の承認済み予約を一括取得する
///
/// カタログ一覧（所有物品の一覧表示）の組み立て用。物品ごとに
/// 個別のクエリを発行しない。認可は一覧を組み立てる側の責務。
pub async fn item_booking_activity(
    deps: &ServiceDependencies,
    item_ids: &[ItemId],
) -> Result<HashMap<ItemId, AdjacentBookings>> {
    let now = deps.clock.now();

    deps.booking_store
        .find_adjacent_for_items(item_ids, now)
        .await
        .map_err(BookingApplicationError::StoreError)
}

/// 利用者が物品の利用を完了しているか確認する
///
/// 承認済みかつ終了済みの予約が1件でもあればtrue。
/// レビューサブシステムが投稿資格の確認に使用する。
pub async fn has_completed_booking(
    deps: &ServiceDependencies,
    item_id: ItemId,
    user_id: UserId,
) -> Result<bool> {
    let now = deps.clock.now();

    deps.booking_store
        .has_completed_booking(item_id, user_id, now)
        .await
        .map_err(BookingApplicationError::StoreError)
}

use crate::domain::{self, commands::*, value_objects::*};
use crate::ports::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::errors::{BookingApplicationError, Result};

/// 物品ごとの排他トークンのレジストリ
///
/// 不変条件「同一物品の承認済み予約は互いに重ならない」は、
/// 重なり確認とそれに続く書き込みが物品単位で直列に実行されて
/// はじめて成立する。ストアはトレイトオブジェクト越しに使われ、
/// その分離レベルをエンジン側から仮定できないため、排他は
/// ここで持つ。確認と書き込みのペアの間だけ保持される。
#[derive(Clone, Default)]
pub struct ItemLockRegistry {
    locks: Arc<Mutex<HashMap<ItemId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ItemLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 物品の排他トークンを獲得する
    pub async fn acquire(&self, item_id: ItemId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks.entry(item_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub booking_store: Arc<dyn BookingStore>,
    pub item_catalog: Arc<dyn ItemCatalog>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub clock: Arc<dyn Clock>,
    pub item_locks: ItemLockRegistry,
}

/// 予約詳細ビュー
///
/// 予約と、ルックアップで解決した物品・リクエスト者を組み合わせた
/// レスポンス専用の派生オブジェクト。独自の不変条件は持たず、
/// 永続化もされない。
#[derive(Debug, Clone)]
pub struct BookingDetail {
    pub booking: domain::booking::Booking,
    pub item: ItemRecord,
    pub booker: UserSummary,
}

/// 予約から詳細ビューを組み立てるヘルパー関数
///
/// 物品・利用者への参照は必ず明示的なルックアップで解決する。
/// 解決に失敗した場合（参照先が消えている場合）はNotFound系の
/// エラーになる。
pub(super) async fn build_booking_detail(
    deps: &ServiceDependencies,
    booking: domain::booking::Booking,
) -> Result<BookingDetail> {
    let item = deps
        .item_catalog
        .resolve(booking.item_id)
        .await
        .map_err(BookingApplicationError::CatalogError)?
        .ok_or(BookingApplicationError::ItemNotFound(booking.item_id))?;

    let booker = deps
        .user_directory
        .resolve(booking.booker_id)
        .await
        .map_err(BookingApplicationError::DirectoryError)?
        .ok_or(BookingApplicationError::UserNotFound(booking.booker_id))?;

    Ok(BookingDetail {
        booking,
        item,
        booker,
    })
}

/// 予約をリクエストする
///
/// ビジネスルール（この順で検査し、最初の違反で失敗する）：
/// 1. 期間が妥当であること（start < end）
/// 2. 物品が存在すること
/// 3. リクエスト者が存在すること
/// 4. 物品が貸出可能であること
/// 5. 自分の物品でないこと
/// 6. 期間が承認済み予約と重なっていないこと
///
/// 重なりは承認済み予約に対してのみ検査する。承認待ち同士の
/// 重なりは許容される（排他的なのは承認だけ）。作成された予約は
/// Waiting状態で永続化され、他の予約には触れない。
pub async fn request_booking(
    deps: &ServiceDependencies,
    cmd: RequestBooking,
) -> Result<domain::booking::Booking> {
    let now = deps.clock.now();

    // 1. 期間の検証
    let period = BookingPeriod::new(cmd.start, cmd.end)
        .map_err(|_| BookingApplicationError::InvalidInterval)?;

    // 2. 物品の解決
    let item = deps
        .item_catalog
        .resolve(cmd.item_id)
        .await
        .map_err(BookingApplicationError::CatalogError)?
        .ok_or(BookingApplicationError::ItemNotFound(cmd.item_id))?;

    // 3. リクエスト者の存在確認
    let booker_exists = deps
        .user_directory
        .exists(cmd.booker_id)
        .await
        .map_err(BookingApplicationError::DirectoryError)?;

    if !booker_exists {
        return Err(BookingApplicationError::UserNotFound(cmd.booker_id));
    }

    // 4. 貸出可否の確認
    if !item.is_available {
        return Err(BookingApplicationError::ItemUnavailable(cmd.item_id));
    }

    // 5. ドメイン層の純粋関数を呼び出し（自己予約の拒否を含む）
    let booking = domain::booking::request_booking(
        cmd.item_id,
        item.owner_id,
        cmd.booker_id,
        period,
        now,
    )
    .map_err(|e| match e {
        domain::errors::RequestBookingError::SelfBooking => {
            BookingApplicationError::SelfBookingForbidden(cmd.booker_id)
        }
    })?;

    // 6. 物品単位の排他区間で重なり確認と永続化を直列化
    let _guard = deps.item_locks.acquire(cmd.item_id).await;

    let conflicting = deps
        .booking_store
        .has_approved_overlap(cmd.item_id, &period)
        .await
        .map_err(BookingApplicationError::StoreError)?;

    if conflicting {
        return Err(BookingApplicationError::IntervalConflict);
    }

    let created = deps
        .booking_store
        .create(booking)
        .await
        .map_err(BookingApplicationError::StoreError)?;

    tracing::info!(
        booking_id = %created.booking_id,
        item_id = %created.item_id,
        booker_id = %created.booker_id,
        "booking requested"
    );

    Ok(created)
}

/// 予約を承認または却下する
///
/// ビジネスルール：
/// - 予約が存在すること
/// - 操作者が物品の所有者であること
/// - 予約がWaiting状態であること（ステータスが変わるのはここだけ）
/// - 承認時：期間が承認済み予約と重なっていないこと
///
/// 最後の重なり再検証が無いと、重なった承認待ち2件を順に承認する
/// ことで不変条件が破れる。確認と保存は物品単位の排他区間で行う。
pub async fn decide_booking(
    deps: &ServiceDependencies,
    cmd: DecideBooking,
) -> Result<domain::booking::Booking> {
    let now = deps.clock.now();

    // 1. 予約の解決
    let booking = deps
        .booking_store
        .get_by_id(cmd.booking_id)
        .await
        .map_err(BookingApplicationError::StoreError)?
        .ok_or(BookingApplicationError::BookingNotFound(cmd.booking_id))?;

    // 2. 所有者の確認
    if booking.owner_id != cmd.acting_user_id {
        return Err(BookingApplicationError::NotItemOwner(cmd.acting_user_id));
    }

    // 3. 排他区間に入ってから最新状態を読み直す
    //    （並行する判断が先に終わっている可能性があるため）
    let _guard = deps.item_locks.acquire(booking.item_id).await;

    let fresh = deps
        .booking_store
        .get_by_id(cmd.booking_id)
        .await
        .map_err(BookingApplicationError::StoreError)?
        .ok_or(BookingApplicationError::BookingNotFound(cmd.booking_id))?;

    // 4. ドメイン層の純粋関数を呼び出し（終端状態の拒否を含む）
    let decided = domain::booking::decide(&fresh, cmd.approve, now).map_err(|e| match e {
        domain::errors::DecideBookingError::AlreadyDecided => {
            BookingApplicationError::AlreadyDecided(cmd.booking_id)
        }
    })?;

    // 5. 承認時は承認済み予約との重なりを再検証
    //    （Waitingの自分自身は判定に参加しない）
    if cmd.approve {
        let conflicting = deps
            .booking_store
            .has_approved_overlap(fresh.item_id, &fresh.period)
            .await
            .map_err(BookingApplicationError::StoreError)?;

        if conflicting {
            return Err(BookingApplicationError::IntervalConflict);
        }
    }

    // 6. 永続化
    deps.booking_store
        .save(decided.clone())
        .await
        .map_err(BookingApplicationError::StoreError)?;

    tracing::info!(
        booking_id = %decided.booking_id,
        status = decided.status.as_str(),
        "booking decided"
    );

    Ok(decided)
}

/// 予約詳細を取得する
///
/// 読み取り専用。操作者は予約のリクエスト者か物品の所有者で
/// なければならない。状態は変化しない。
pub async fn get_booking(
    deps: &ServiceDependencies,
    acting_user_id: UserId,
    booking_id: BookingId,
) -> Result<BookingDetail> {
    let booking = deps
        .booking_store
        .get_by_id(booking_id)
        .await
        .map_err(BookingApplicationError::StoreError)?
        .ok_or(BookingApplicationError::BookingNotFound(booking_id))?;

    if acting_user_id != booking.booker_id && acting_user_id != booking.owner_id {
        return Err(BookingApplicationError::NotAuthorized(acting_user_id));
    }

    build_booking_detail(deps, booking).await
}

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::value_objects::{BookingId, BookingPeriod, ItemId, PageWindow, UserId};
use crate::ports::booking_store::{
    AdjacentBookings, BookingStateFilter, BookingStore as BookingStoreTrait, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// SELECT句の共通カラムリスト
const BOOKING_COLUMNS: &str = "booking_id, item_id, owner_id, booker_id, \
     start_date, end_date, status, created_at, updated_at";

/// PostgreSQLの行データをBookingに変換する
///
/// statusの文字列からの変換と、start/endからの期間の再構築で
/// エラーハンドリングを行う。永続化時に検証済みの値なので、
/// 失敗はデータ破損を意味する。
fn map_row_to_booking(row: &PgRow) -> Result<Booking> {
    let status_str: &str = row.get("status");
    let status = BookingStatus::from_str(status_str).map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    let start: DateTime<Utc> = row.get("start_date");
    let end: DateTime<Utc> = row.get("end_date");
    let period = BookingPeriod::new(start, end).map_err(|e| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("invalid persisted period: {:?}", e),
        )) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Booking {
        booking_id: BookingId::from_uuid(row.get("booking_id")),
        item_id: ItemId::from_uuid(row.get("item_id")),
        owner_id: UserId::from_uuid(row.get("owner_id")),
        booker_id: UserId::from_uuid(row.get("booker_id")),
        period,
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// BookingStoreのPostgreSQL実装
///
/// 予約レコードをbookingsテーブルに現在状態として保持する。
/// owner_idは作成時に物品カタログから解決された値の非正規化コピーで、
/// owner側クエリの選択キーになる（スキーマはmigrations/を参照）。
pub struct BookingStore {
    pool: PgPool,
}

impl BookingStore {
    /// PostgreSQLコネクションプールから新しいBookingStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 状態フィルタとアクター列から一覧クエリを実行する
    ///
    /// 閉じたフィルタ列挙をクエリ選択表として1つのSQLに写像する。
    /// actor_columnは"booker_id"か"owner_id"のどちらかで、呼び出し側の
    /// booker/ownerバリアント選択に対応する。
    async fn fetch_list(
        &self,
        actor_column: &'static str,
        actor_id: Uuid,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
    ) -> Result<Vec<Booking>> {
        let rows = match filter {
            BookingStateFilter::All => {
                let sql = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE {actor_column} = $1 \
                     ORDER BY start_date DESC LIMIT $2 OFFSET $3"
                );
                sqlx::query(&sql)
                    .bind(actor_id)
                    .bind(window.limit())
                    .bind(window.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
            BookingStateFilter::Current => {
                let sql = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE {actor_column} = $1 AND start_date <= $2 AND end_date >= $2 \
                     ORDER BY start_date DESC LIMIT $3 OFFSET $4"
                );
                sqlx::query(&sql)
                    .bind(actor_id)
                    .bind(at)
                    .bind(window.limit())
                    .bind(window.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
            BookingStateFilter::Past => {
                let sql = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE {actor_column} = $1 AND end_date < $2 \
                     ORDER BY start_date DESC LIMIT $3 OFFSET $4"
                );
                sqlx::query(&sql)
                    .bind(actor_id)
                    .bind(at)
                    .bind(window.limit())
                    .bind(window.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
            BookingStateFilter::Future => {
                let sql = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE {actor_column} = $1 AND start_date > $2 \
                     ORDER BY start_date DESC LIMIT $3 OFFSET $4"
                );
                sqlx::query(&sql)
                    .bind(actor_id)
                    .bind(at)
                    .bind(window.limit())
                    .bind(window.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
            BookingStateFilter::Waiting | BookingStateFilter::Rejected => {
                let status = match filter {
                    BookingStateFilter::Waiting => BookingStatus::Waiting,
                    _ => BookingStatus::Rejected,
                };
                let sql = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings \
                     WHERE {actor_column} = $1 AND status = $2 \
                     ORDER BY start_date DESC LIMIT $3 OFFSET $4"
                );
                sqlx::query(&sql)
                    .bind(actor_id)
                    .bind(status.as_str())
                    .bind(window.limit())
                    .bind(window.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(map_row_to_booking).collect()
    }
}

#[async_trait]
impl BookingStoreTrait for BookingStore {
    /// 予約を挿入する
    async fn create(&self, booking: Booking) -> Result<Booking> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                booking_id,
                item_id,
                owner_id,
                booker_id,
                start_date,
                end_date,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(booking.booking_id.value())
        .bind(booking.item_id.value())
        .bind(booking.owner_id.value())
        .bind(booking.booker_id.value())
        .bind(booking.period.start())
        .bind(booking.period.end())
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(booking)
    }

    /// IDで予約を取得
    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1");
        let row = sqlx::query(&sql)
            .bind(booking_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_booking).transpose()
    }

    /// 予約の完全な状態を上書き保存する
    ///
    /// 変更可能なのはstatusとupdated_atだけだが、ポートの契約に従い
    /// レコード全体を反映する。
    async fn save(&self, booking: Booking) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE bookings
            SET item_id = $2,
                owner_id = $3,
                booker_id = $4,
                start_date = $5,
                end_date = $6,
                status = $7,
                created_at = $8,
                updated_at = $9
            WHERE booking_id = $1
            "#,
        )
        .bind(booking.booking_id.value())
        .bind(booking.item_id.value())
        .bind(booking.owner_id.value())
        .bind(booking.booker_id.value())
        .bind(booking.period.start())
        .bind(booking.period.end())
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 承認済み予約との重なり判定
    ///
    /// 半開区間の重なり条件：既存の start < 候補の end かつ
    /// 候補の start < 既存の end。(item_id, status) の部分インデックスを
    /// 使用してパフォーマンスを最適化。
    async fn has_approved_overlap(&self, item_id: ItemId, period: &BookingPeriod) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM bookings
                WHERE item_id = $1
                  AND status = 'approved'
                  AND start_date < $3
                  AND $2 < end_date
            ) AS conflicting
            "#,
        )
        .bind(item_id.value())
        .bind(period.start())
        .bind(period.end())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("conflicting"))
    }

    /// 基準時刻の直前・直後の承認済み予約を取得
    async fn find_adjacent(
        &self,
        item_id: ItemId,
        at: DateTime<Utc>,
    ) -> Result<AdjacentBookings> {
        let previous_sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE item_id = $1 AND status = 'approved' AND end_date < $2 \
             ORDER BY end_date DESC LIMIT 1"
        );
        let previous = sqlx::query(&previous_sql)
            .bind(item_id.value())
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        let next_sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE item_id = $1 AND status = 'approved' AND start_date > $2 \
             ORDER BY start_date ASC LIMIT 1"
        );
        let next = sqlx::query(&next_sql)
            .bind(item_id.value())
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(AdjacentBookings {
            previous: previous.as_ref().map(map_row_to_booking).transpose()?,
            next: next.as_ref().map(map_row_to_booking).transpose()?,
        })
    }

    /// 複数物品分の直前・直後を一括取得
    ///
    /// DISTINCT ONで物品ごとに1行ずつ取り、物品数に比例した
    /// クエリ発行を避ける。
    async fn find_adjacent_for_items(
        &self,
        item_ids: &[ItemId],
        at: DateTime<Utc>,
    ) -> Result<HashMap<ItemId, AdjacentBookings>> {
        let ids: Vec<Uuid> = item_ids.iter().map(|id| id.value()).collect();
        let mut result: HashMap<ItemId, AdjacentBookings> = item_ids
            .iter()
            .map(|id| (*id, AdjacentBookings::default()))
            .collect();

        let previous_sql = format!(
            "SELECT DISTINCT ON (item_id) {BOOKING_COLUMNS} FROM bookings \
             WHERE item_id = ANY($1) AND status = 'approved' AND end_date < $2 \
             ORDER BY item_id, end_date DESC"
        );
        let previous_rows = sqlx::query(&previous_sql)
            .bind(&ids)
            .bind(at)
            .fetch_all(&self.pool)
            .await?;

        for row in &previous_rows {
            let booking = map_row_to_booking(row)?;
            if let Some(entry) = result.get_mut(&booking.item_id) {
                entry.previous = Some(booking);
            }
        }

        let next_sql = format!(
            "SELECT DISTINCT ON (item_id) {BOOKING_COLUMNS} FROM bookings \
             WHERE item_id = ANY($1) AND status = 'approved' AND start_date > $2 \
             ORDER BY item_id, start_date ASC"
        );
        let next_rows = sqlx::query(&next_sql)
            .bind(&ids)
            .bind(at)
            .fetch_all(&self.pool)
            .await?;

        for row in &next_rows {
            let booking = map_row_to_booking(row)?;
            if let Some(entry) = result.get_mut(&booking.item_id) {
                entry.next = Some(booking);
            }
        }

        Ok(result)
    }

    /// 利用者がリクエストした予約を検索
    async fn find_for_booker(
        &self,
        booker_id: UserId,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
    ) -> Result<Vec<Booking>> {
        self.fetch_list("booker_id", booker_id.value(), filter, at, window)
            .await
    }

    /// 利用者が所有する物品への予約を検索
    async fn find_for_owner(
        &self,
        owner_id: UserId,
        filter: BookingStateFilter,
        at: DateTime<Utc>,
        window: PageWindow,
    ) -> Result<Vec<Booking>> {
        self.fetch_list("owner_id", owner_id.value(), filter, at, window)
            .await
    }

    /// 利用完了済み予約の存在確認（レビュー資格）
    async fn has_completed_booking(
        &self,
        item_id: ItemId,
        booker_id: UserId,
        before: DateTime<Utc>,
    ) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM bookings
                WHERE item_id = $1
                  AND booker_id = $2
                  AND status = 'approved'
                  AND end_date < $3
            ) AS completed
            "#,
        )
        .bind(item_id.value())
        .bind(booker_id.value())
        .bind(before)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("completed"))
    }
}

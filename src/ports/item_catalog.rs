use crate::domain::value_objects::{ItemId, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 物品カタログが返す物品レコード
///
/// 予約コンテキストが必要とする属性のみを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub item_id: ItemId,
    pub owner_id: UserId,
    pub is_available: bool,
    pub name: String,
}

/// 物品カタログポート
///
/// 予約コンテキストとカタログコンテキストの境界を維持する。
/// 予約コンテキストはItemIDのみを知り、物品詳細は知らない。
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// 物品IDを所有者と貸出可否に解決する
    ///
    /// 存在しない場合はNoneを返す。
    async fn resolve(&self, item_id: ItemId) -> Result<Option<ItemRecord>>;
}

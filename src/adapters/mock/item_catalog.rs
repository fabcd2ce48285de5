use crate::domain::value_objects::{ItemId, UserId};
use crate::ports::item_catalog::{ItemCatalog as ItemCatalogTrait, ItemRecord, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// ItemCatalogのモック実装
///
/// 物品レコードを保存することで状態を持ったテストをサポート。
/// 所有者と貸出可否を指定して物品を登録可能。
pub struct ItemCatalog {
    items: Mutex<HashMap<ItemId, ItemRecord>>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に貸出可能な物品を登録
    pub fn add_item(&self, item_id: ItemId, owner_id: UserId) {
        self.add_item_with_availability(item_id, owner_id, true);
    }

    /// テスト用に貸出可否を指定して物品を登録
    pub fn add_item_with_availability(&self, item_id: ItemId, owner_id: UserId, available: bool) {
        self.items.lock().unwrap().insert(
            item_id,
            ItemRecord {
                item_id,
                owner_id,
                is_available: available,
                name: "Mock Item".to_string(),
            },
        );
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemCatalogTrait for ItemCatalog {
    /// 登録された物品の中から解決する
    async fn resolve(&self, item_id: ItemId) -> Result<Option<ItemRecord>> {
        Ok(self.items.lock().unwrap().get(&item_id).cloned())
    }
}

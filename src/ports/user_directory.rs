use crate::domain::value_objects::UserId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者ディレクトリが返す利用者サマリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub user_id: UserId,
    pub name: String,
}

/// 利用者ディレクトリポート
///
/// 予約コンテキストと利用者管理コンテキストの境界を維持する。
/// 予約コンテキストはUserIDのみを知り、利用者詳細は知らない。
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 利用者が存在するか確認する
    ///
    /// 予約作成前の利用者バリデーションに使用される。
    async fn exists(&self, user_id: UserId) -> Result<bool>;

    /// 利用者IDをサマリに解決する
    ///
    /// 予約詳細ビューの組み立てに使用される。存在しない場合はNoneを返す。
    async fn resolve(&self, user_id: UserId) -> Result<Option<UserSummary>>;
}

use chrono::{DateTime, Utc};

/// 時計ポート
///
/// ビジネスロジックが壁時計を直接読むことを禁止するための能力。
/// 各操作は呼び出しごとに一度だけ`now()`を取得し、その瞬間を
/// 操作全体で使い回す。途中で再取得すると同一レスポンス内で
/// 現在・過去・未来の分類が食い違うため。
pub trait Clock: Send + Sync {
    /// 現在時刻を取得する
    fn now(&self) -> DateTime<Utc>;
}

/// システム時計（本番用）
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

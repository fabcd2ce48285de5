use crate::ports::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Clockのモック実装
///
/// テストが「現在」を制御できるようにする固定時計。
/// 設定した瞬間を返し続け、`advance`で明示的に進められる。
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// 現在時刻を設定する
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// 現在時刻を進める
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

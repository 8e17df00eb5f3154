//! # Retrieval Configuration DTO
//!
//! 取得ポーリング設定

use std::time::Duration;

/// 最大ポーリング回数
pub const MAX_POLL_ATTEMPTS: u32 = 5;
/// 指数バックオフの基準時間
pub const POLL_BASE_DELAY_MS: u64 = 1000;
/// 指数バックオフの上限
pub const POLL_MAX_DELAY_MS: u64 = 16_000;
/// アップロード完了から最初のポーリングまでの待機時間
pub const POST_UPLOAD_DELAY_MS: u64 = 2500;

/// 取得ポーリング設定
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// アップロード直後に取得する場合の初回待機時間
    pub post_upload_delay: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_POLL_ATTEMPTS,
            base_delay: Duration::from_millis(POLL_BASE_DELAY_MS),
            max_delay: Duration::from_millis(POLL_MAX_DELAY_MS),
            post_upload_delay: Duration::from_millis(POST_UPLOAD_DELAY_MS),
        }
    }
}

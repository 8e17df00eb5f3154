//! # Upload Configuration DTO
//!
//! アップロード設定のData Transfer Object

use std::time::Duration;

/// チャンクサイズ（1.5MB）
pub const CHUNK_SIZE: usize = 1536 * 1024;
/// 1チャンクあたりの最大試行回数
pub const MAX_RETRIES: u32 = 3;
/// 線形バックオフの基準時間
pub const RETRY_DELAY_MS: u64 = 1000;
/// finalize のタイムアウト
pub const FINALIZATION_TIMEOUT_MS: u64 = 30_000;
/// 既定の動画タイトル
pub const DEFAULT_VIDEO_TITLE: &str = "Master Presentation";

/// アップロード設定
///
/// 値はコンパイル時定数が既定。テストでは短い時間・小さいチャンクを指定する
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// 動画タイトル
    pub title: String,
    /// チャンクサイズ（バイト）
    pub chunk_size: usize,
    /// 1チャンクあたりの最大試行回数
    pub max_retries: u32,
    /// 再試行の待機時間の基準（n回目の失敗後は `retry_delay * n`）
    pub retry_delay: Duration,
    /// finalize のタイムアウト
    pub finalization_timeout: Duration,
}

impl UploadConfig {
    /// 新しいアップロード設定を作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use std::time::Duration;
    /// use skelclock::application::dto::upload_config::UploadConfig;
    ///
    /// let config = UploadConfig::new(
    ///     "Lecture 3".to_string(),
    ///     4 * 1024 * 1024,             // 4MBチャンク
    ///     5,                           // 5回まで試行
    ///     Duration::from_millis(500),
    ///     Duration::from_secs(60),
    /// );
    ///
    /// assert_eq!(config.chunk_size, 4 * 1024 * 1024);
    /// assert_eq!(config.max_retries, 5);
    /// ```
    pub fn new(
        title: String,
        chunk_size: usize,
        max_retries: u32,
        retry_delay: Duration,
        finalization_timeout: Duration,
    ) -> Self {
        Self {
            title,
            chunk_size,
            max_retries,
            retry_delay,
            finalization_timeout,
        }
    }

    /// タイトルだけ差し替えた設定を返す
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_VIDEO_TITLE.to_string(),
            CHUNK_SIZE,
            MAX_RETRIES,
            Duration::from_millis(RETRY_DELAY_MS),
            Duration::from_millis(FINALIZATION_TIMEOUT_MS),
        )
    }
}

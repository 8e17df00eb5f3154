//! # Video Backend Trait
//!
//! 動画ストレージバックエンドへのリモート呼び出しを抽象化

use anyhow::Result;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::video::{FinalizeOutcome, VideoId, VideoMetadata};

/// 動画バックエンド
///
/// 各呼び出しは非同期で、バックエンド自身はリトライを保証しない。
/// リトライ方針はユースケース側が持つ
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// 新しいアップロードを開始し、動画IDを発行する
    async fn initialize_upload(&self, title: &str) -> Result<VideoId>;

    /// チャンクを1つ送信する
    ///
    /// # Returns
    ///
    /// 受理された場合 `true`。`false` は拒否（エラーではない）
    async fn upload_chunk(&self, video_id: VideoId, bytes: &[u8]) -> Result<bool>;

    /// アップロードを確定する
    ///
    /// バックエンドが報告した失敗は `FinalizeOutcome::Error` として返る
    async fn finalize_upload(&self, video_id: VideoId) -> Result<FinalizeOutcome>;

    /// メタデータを取得する（存在しなければ `None`）
    async fn get_video_metadata(&self, video_id: VideoId) -> Result<Option<VideoMetadata>>;

    /// 配信URLを取得する
    ///
    /// # Returns
    ///
    /// まだ配信準備ができていなければ `None`（エラーとは区別される）
    async fn get_video_url(&self, video_id: VideoId) -> Result<Option<String>>;

    /// 全動画のメタデータを取得する
    async fn get_all_video_metadata(&self) -> Result<Vec<VideoMetadata>>;

    /// 動画を削除する
    async fn remove_video(&self, video_id: VideoId) -> Result<bool>;

    /// 動画タイトルを更新する
    async fn update_video_metadata(&self, video_id: VideoId, new_title: &str) -> Result<bool>;
}

//! # Manage Videos Use Case
//!
//! アップロード済み動画の一覧・参照・削除・リネーム

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

use crate::domain::entities::video::{Video, VideoId, VideoMetadata};
use crate::domain::repositories::video_backend::VideoBackend;

/// 動画管理ユースケース
pub struct ManageVideosUseCase<B: VideoBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: VideoBackend + ?Sized> ManageVideosUseCase<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// 全動画のメタデータを ID 順で返す
    pub async fn list(&self) -> Result<Vec<VideoMetadata>> {
        let mut videos = self
            .backend
            .get_all_video_metadata()
            .await
            .context("Failed to list videos")?;
        videos.sort_by_key(|m| m.id);
        Ok(videos)
    }

    /// メタデータを取得する
    pub async fn info(&self, video_id: VideoId) -> Result<Option<VideoMetadata>> {
        self.backend
            .get_video_metadata(video_id)
            .await
            .with_context(|| format!("Failed to fetch metadata for video {}", video_id))
    }

    /// 再生可能な動画を取得する
    ///
    /// メタデータが無い、または配信URLがまだ無い場合は `None`
    pub async fn fetch_video(&self, video_id: VideoId) -> Result<Option<Video>> {
        let Some(metadata) = self.info(video_id).await? else {
            return Ok(None);
        };

        let url = self
            .backend
            .get_video_url(video_id)
            .await
            .with_context(|| format!("Failed to fetch URL for video {}", video_id))?;

        Ok(url.map(|content_url| Video {
            title: metadata.title.clone(),
            content_url,
            metadata,
        }))
    }

    /// 動画を削除する
    pub async fn remove(&self, video_id: VideoId) -> Result<bool> {
        let removed = self
            .backend
            .remove_video(video_id)
            .await
            .with_context(|| format!("Failed to remove video {}", video_id))?;
        if removed {
            info!("Removed video {}", video_id);
        }
        Ok(removed)
    }

    /// タイトルを変更する
    ///
    /// 空白のみのタイトルは受け付けない
    pub async fn rename(&self, video_id: VideoId, new_title: &str) -> Result<bool> {
        let title = new_title.trim();
        if title.is_empty() {
            anyhow::bail!("Video title must not be empty");
        }

        let updated = self
            .backend
            .update_video_metadata(video_id, title)
            .await
            .with_context(|| format!("Failed to rename video {}", video_id))?;
        if updated {
            info!("Renamed video {} to '{}'", video_id, title);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    use crate::domain::repositories::video_backend::MockVideoBackend;

    fn metadata(id: u64, title: &str, complete: bool) -> VideoMetadata {
        VideoMetadata {
            id: VideoId(id),
            title: title.to_string(),
            chunk_count: 2,
            is_persistent: true,
            is_complete: complete,
        }
    }

    #[tokio::test]
    async fn test_list_sorted_by_id() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_all_video_metadata().times(1).returning(|| {
            Ok(vec![
                metadata(2, "b", true),
                metadata(0, "a", true),
                metadata(1, "c", false),
            ])
        });

        let use_case = ManageVideosUseCase::new(Arc::new(mock));
        let ids: Vec<u64> = use_case
            .list()
            .await
            .unwrap()
            .iter()
            .map(|m| m.id.0)
            .collect();

        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_fetch_video_with_url() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_metadata()
            .with(eq(VideoId(3)))
            .returning(|_| Ok(Some(metadata(3, "Master Presentation", true))));
        mock.expect_get_video_url()
            .with(eq(VideoId(3)))
            .returning(|_| Ok(Some("https://cdn.example/3.mp4".to_string())));

        let use_case = ManageVideosUseCase::new(Arc::new(mock));
        let video = use_case.fetch_video(VideoId(3)).await.unwrap().unwrap();

        assert_eq!(video.title, "Master Presentation");
        assert_eq!(video.content_url, "https://cdn.example/3.mp4");
        assert!(video.metadata.is_complete);
    }

    #[tokio::test]
    async fn test_fetch_video_missing_metadata_skips_url() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_metadata().returning(|_| Ok(None));
        mock.expect_get_video_url().never();

        let use_case = ManageVideosUseCase::new(Arc::new(mock));
        assert!(use_case.fetch_video(VideoId(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_video_not_ready() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_metadata()
            .returning(|_| Ok(Some(metadata(1, "pending", false))));
        mock.expect_get_video_url().returning(|_| Ok(None));

        let use_case = ManageVideosUseCase::new(Arc::new(mock));
        assert!(use_case.fetch_video(VideoId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rename_trims_title() {
        let mut mock = MockVideoBackend::new();
        mock.expect_update_video_metadata()
            .withf(|id, title| *id == VideoId(1) && title == "Lecture 2")
            .times(1)
            .returning(|_, _| Ok(true));

        let use_case = ManageVideosUseCase::new(Arc::new(mock));
        assert!(use_case.rename(VideoId(1), "  Lecture 2 ").await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_rejects_blank_title() {
        let mut mock = MockVideoBackend::new();
        mock.expect_update_video_metadata().never();

        let use_case = ManageVideosUseCase::new(Arc::new(mock));
        let err = use_case.rename(VideoId(1), "   ").await.unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_remove_error_has_context() {
        let mut mock = MockVideoBackend::new();
        mock.expect_remove_video()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let use_case = ManageVideosUseCase::new(Arc::new(mock));
        let err = use_case.remove(VideoId(5)).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to remove video 5");
        assert_eq!(err.root_cause().to_string(), "connection refused");
    }
}

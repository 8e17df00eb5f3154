//! Workflow Orchestration
//!
//! ワークフローのオーケストレーション

use anyhow::{Context, Result};
use log::{info, warn};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::adapter::config::{BackendKind, Config};
use crate::adapter::http::HttpVideoBackend;
use crate::adapter::repositories::LocalVideoBackend;
use crate::application::dto::retrieval_config::RetrievalConfig;
use crate::application::dto::upload_config::UploadConfig;
use crate::application::use_cases::manage_videos::ManageVideosUseCase;
use crate::application::use_cases::resolve_video::ResolveVideoUseCase;
use crate::application::use_cases::upload_video::UploadVideoUseCase;
use crate::domain::entities::video::{UploadReceipt, VideoId, VideoMetadata};
use crate::domain::errors::UploadError;
use crate::domain::repositories::video_backend::VideoBackend;
use crate::domain::services::file_validation::{
    guess_mime, FileValidationService, VideoFile, MAX_FILE_SIZE,
};

use super::cli::{Args, Command};

/// アップロード結果
#[derive(Debug)]
pub struct UploadSummary {
    pub receipt: UploadReceipt,
    /// 取得できた配信URL（取得しなかった、または取得できなかった場合は `None`）
    pub url: Option<String>,
}

/// 設定からバックエンドを組み立てる
pub fn build_backend(config: &Config) -> Result<Arc<dyn VideoBackend>> {
    config.validate()?;
    match config.backend {
        BackendKind::Http => {
            let base_url = config
                .base_url
                .as_deref()
                .context("base_url is required for the http backend")?;
            Ok(Arc::new(HttpVideoBackend::new(
                base_url,
                config.api_token.as_deref(),
            )?))
        }
        BackendKind::Local => Ok(Arc::new(LocalVideoBackend::new(
            config.expanded_storage_dir(),
        ))),
    }
}

/// Ctrl-C で発火するキャンセルトークン
#[cfg_attr(coverage_nightly, coverage(off))]
fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    (token, handle)
}

fn print_metadata(metadata: &VideoMetadata) {
    println!(
        "  [{}] {} | chunks: {} | complete: {} | persistent: {}",
        metadata.id,
        metadata.title,
        metadata.chunk_count,
        metadata.is_complete,
        metadata.is_persistent
    );
}

/// Video Workflow
pub struct VideoWorkflow {
    config: Config,
    backend: Arc<dyn VideoBackend>,
    upload_config: UploadConfig,
    retrieval_config: RetrievalConfig,
}

impl VideoWorkflow {
    /// Create a new workflow instance with dependency injection
    pub fn new(config: Config) -> Result<Self> {
        let backend = build_backend(&config)?;
        Ok(Self::with_backend(config, backend))
    }

    /// 任意のバックエンドで作成
    pub fn with_backend(config: Config, backend: Arc<dyn VideoBackend>) -> Self {
        let upload_config = UploadConfig::default().with_title(config.video_title.clone());
        Self {
            config,
            backend,
            upload_config,
            retrieval_config: RetrievalConfig::default(),
        }
    }

    pub fn with_upload_config(mut self, upload_config: UploadConfig) -> Self {
        self.upload_config = upload_config;
        self
    }

    pub fn with_retrieval_config(mut self, retrieval_config: RetrievalConfig) -> Self {
        self.retrieval_config = retrieval_config;
        self
    }

    /// Execute the command given on the command line
    pub async fn execute(&self, args: Args) -> Result<()> {
        info!("Using {:?} backend", self.config.backend);

        match args.command {
            Command::Upload {
                file,
                title,
                mime,
                no_resolve,
            } => {
                let (cancel, ctrl_c) = cancel_on_ctrl_c();
                let result = self
                    .upload(
                        &file,
                        title.as_deref(),
                        mime.as_deref(),
                        !no_resolve,
                        &cancel,
                    )
                    .await;
                ctrl_c.abort();
                result.map(|_| ())
            }
            Command::Resolve { id } => {
                let (cancel, ctrl_c) = cancel_on_ctrl_c();
                let result = self.resolve(id, &cancel).await;
                ctrl_c.abort();
                result.map(|_| ())
            }
            Command::List => self.list().await.map(|_| ()),
            Command::Info { id } => self.info(id).await.map(|_| ()),
            Command::Remove { id } => self.remove(id).await.map(|_| ()),
            Command::Rename { id, title } => self.rename(id, &title).await.map(|_| ()),
        }
    }

    /// ファイルを検証してアップロードし、必要なら配信URLを取得する
    ///
    /// URL取得の失敗はアップロード自体の失敗とはしない（警告のみ）
    pub async fn upload(
        &self,
        file: &Path,
        title: Option<&str>,
        mime: Option<&str>,
        resolve: bool,
        cancel: &CancellationToken,
    ) -> Result<UploadSummary> {
        let file_metadata = tokio::fs::metadata(file)
            .await
            .with_context(|| format!("Failed to read file: {}", file.display()))?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime.unwrap_or_else(|| guess_mime(file));

        FileValidationService::validate(
            &VideoFile {
                name: &name,
                mime,
                size: file_metadata.len(),
            },
            MAX_FILE_SIZE,
        )
        .map_err(UploadError::from)?;
        println!("✓ Validated {} ({}, {} bytes)", name, mime, file_metadata.len());

        let payload = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read file: {}", file.display()))?;

        let mut upload_config = self.upload_config.clone();
        if let Some(title) = title {
            upload_config = upload_config.with_title(title);
        }
        println!("✓ Uploading '{}'", upload_config.title);

        let use_case = UploadVideoUseCase::new(self.backend.clone(), upload_config);
        let receipt = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            receipt = use_case.execute_with_progress(&payload, |progress| {
                print!("\r  Progress: {:>5.1}%", progress);
                let _ = std::io::stdout().flush();
            }) => receipt,
        };
        println!();
        if matches!(receipt, Err(UploadError::Cancelled)) {
            println!("⚠ Upload cancelled");
        }
        let receipt = receipt?;

        println!(
            "✓ Uploaded video {} ({} chunks, {} bytes, {:.1}s)",
            receipt.video_id,
            receipt.total_chunks,
            receipt.bytes_total,
            receipt.elapsed.as_secs_f64()
        );
        if receipt.retried_chunks() > 0 {
            println!("  {} chunks needed retries", receipt.retried_chunks());
        }

        if !resolve {
            return Ok(UploadSummary { receipt, url: None });
        }

        let delay = self.retrieval_config.post_upload_delay;
        tokio::select! {
            _ = cancel.cancelled() => {
                println!("⚠ Cancelled before resolving video {}", receipt.video_id);
                return Ok(UploadSummary { receipt, url: None });
            }
            _ = sleep(delay) => {}
        }

        let url = match self.resolve(receipt.video_id, cancel).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Upload succeeded but URL resolution failed: {:#}", e);
                println!("⚠ {}", e);
                None
            }
        };

        Ok(UploadSummary { receipt, url })
    }

    /// 配信URLを取得する
    pub async fn resolve(&self, id: VideoId, cancel: &CancellationToken) -> Result<String> {
        println!("✓ Resolving video {}", id);
        let use_case = ResolveVideoUseCase::new(self.backend.clone(), self.retrieval_config.clone());
        match use_case.execute_with_cancel(id, cancel).await {
            Ok(resolution) => {
                println!(
                    "✓ Video URL (after {} attempts): {}",
                    resolution.attempts, resolution.url
                );
                Ok(resolution.url)
            }
            Err(e) => {
                println!("✗ {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<VideoMetadata>> {
        let videos = ManageVideosUseCase::new(self.backend.clone()).list().await?;
        println!("✓ Found {} videos", videos.len());
        for metadata in &videos {
            print_metadata(metadata);
        }
        Ok(videos)
    }

    pub async fn info(&self, id: VideoId) -> Result<Option<VideoMetadata>> {
        let manage = ManageVideosUseCase::new(self.backend.clone());
        match manage.fetch_video(id).await? {
            Some(video) => {
                print_metadata(&video.metadata);
                println!("  URL: {}", video.content_url);
                Ok(Some(video.metadata))
            }
            None => {
                let metadata = manage.info(id).await?;
                match &metadata {
                    Some(m) => {
                        print_metadata(m);
                        println!("  URL: not available yet");
                    }
                    None => println!("⚠ Video {} not found", id),
                }
                Ok(metadata)
            }
        }
    }

    pub async fn remove(&self, id: VideoId) -> Result<bool> {
        let removed = ManageVideosUseCase::new(self.backend.clone())
            .remove(id)
            .await?;
        if removed {
            println!("✓ Removed video {}", id);
        } else {
            println!("⚠ Video {} not found", id);
        }
        Ok(removed)
    }

    pub async fn rename(&self, id: VideoId, title: &str) -> Result<bool> {
        let updated = ManageVideosUseCase::new(self.backend.clone())
            .rename(id, title)
            .await?;
        if updated {
            println!("✓ Renamed video {} to '{}'", id, title.trim());
        } else {
            println!("⚠ Video {} not found", id);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_backend_http_requires_base_url() {
        let config = Config {
            backend: BackendKind::Http,
            base_url: None,
            ..Config::default()
        };
        assert!(build_backend(&config).is_err());
    }

    #[test]
    fn test_build_backend_http() {
        let config = Config {
            backend: BackendKind::Http,
            base_url: Some("http://127.0.0.1:9".to_string()),
            api_token: Some("token".to_string()),
            ..Config::default()
        };
        assert!(build_backend(&config).is_ok());
    }

    #[test]
    fn test_workflow_uses_configured_title() {
        let config = Config {
            backend: BackendKind::Local,
            video_title: "Lecture 1".to_string(),
            ..Config::default()
        };
        let workflow = VideoWorkflow::with_backend(
            config,
            Arc::new(LocalVideoBackend::new("/nonexistent/skelclock")),
        );
        assert_eq!(workflow.upload_config.title, "Lecture 1");
    }
}

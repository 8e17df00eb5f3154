//! Local Video Backend Implementation
//!
//! VideoBackendのファイルシステム実装
//!
//! ```text
//! <root>/next-id.json
//! <root>/<id>/metadata.json
//! <root>/<id>/chunks/<n>.part
//! <root>/<id>/video.mp4
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

use crate::domain::entities::video::{FinalizeOutcome, VideoId, VideoMetadata};
use crate::domain::repositories::video_backend::VideoBackend;

const NEXT_ID_FILE: &str = "next-id.json";
const METADATA_FILE: &str = "metadata.json";
const CHUNKS_DIR: &str = "chunks";
const VIDEO_FILE: &str = "video.mp4";

/// ID採番の永続化形式
#[derive(Debug, Default, Deserialize, Serialize)]
struct NextId {
    next_id: u64,
}

/// メタデータ（JSON永続化用の内部表現）
#[derive(Debug, Clone, Deserialize, Serialize)]
struct StoredVideo {
    id: VideoId,
    title: String,
    chunk_count: u64,
    is_persistent: bool,
    is_complete: bool,
    created_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
    size_bytes: Option<u64>,
}

impl StoredVideo {
    fn to_domain(&self) -> VideoMetadata {
        VideoMetadata {
            id: self.id,
            title: self.title.clone(),
            chunk_count: self.chunk_count,
            is_persistent: self.is_persistent,
            is_complete: self.is_complete,
        }
    }
}

/// ファイルシステムベースの動画バックエンド
///
/// オフライン実行と統合テスト用。同一プロセス内の操作は1つのロックで直列化する
#[derive(Clone)]
pub struct LocalVideoBackend {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl LocalVideoBackend {
    /// 新しいバックエンドを作成
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn video_dir(root: &Path, id: VideoId) -> PathBuf {
        root.join(id.to_string())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn load_video(root: &Path, id: VideoId) -> Result<Option<StoredVideo>> {
        let path = Self::video_dir(root, id).join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_json(&path).map(Some)
    }

    fn save_video(root: &Path, video: &StoredVideo) -> Result<()> {
        let path = Self::video_dir(root, video.id).join(METADATA_FILE);
        Self::write_json(&path, video)
    }

    fn initialize_sync(root: &Path, title: &str) -> Result<VideoId> {
        let next_id_path = root.join(NEXT_ID_FILE);
        let mut counter: NextId = if next_id_path.exists() {
            Self::read_json(&next_id_path)?
        } else {
            NextId::default()
        };

        let id = VideoId(counter.next_id);
        counter.next_id += 1;
        Self::write_json(&next_id_path, &counter)?;

        fs::create_dir_all(Self::video_dir(root, id).join(CHUNKS_DIR))
            .context("Failed to create chunk directory")?;

        let video = StoredVideo {
            id,
            title: title.to_string(),
            chunk_count: 0,
            is_persistent: false,
            is_complete: false,
            created_at: Utc::now(),
            finalized_at: None,
            size_bytes: None,
        };
        Self::save_video(root, &video)?;

        info!("Initialized local video {} ('{}')", id, title);
        Ok(id)
    }

    fn upload_chunk_sync(root: &Path, id: VideoId, bytes: &[u8]) -> Result<bool> {
        let mut video = Self::load_video(root, id)?
            .with_context(|| format!("Video {} not found", id))?;

        if video.is_complete {
            warn!("Rejected chunk for finalized video {}", id);
            return Ok(false);
        }

        let chunk_path = Self::video_dir(root, id)
            .join(CHUNKS_DIR)
            .join(format!("{}.part", video.chunk_count));
        if let Some(parent) = chunk_path.parent() {
            fs::create_dir_all(parent).context("Failed to create chunk directory")?;
        }
        fs::write(&chunk_path, bytes)
            .with_context(|| format!("Failed to write chunk {}", chunk_path.display()))?;

        video.chunk_count += 1;
        Self::save_video(root, &video)?;

        debug!(
            "Stored chunk {} of video {} ({} bytes)",
            video.chunk_count - 1,
            id,
            bytes.len()
        );
        Ok(true)
    }

    fn finalize_sync(root: &Path, id: VideoId) -> Result<FinalizeOutcome> {
        let Some(mut video) = Self::load_video(root, id)? else {
            return Ok(FinalizeOutcome::Error(format!("Video {} not found", id)));
        };
        if video.is_complete {
            return Ok(FinalizeOutcome::Error(format!(
                "Video {} is already finalized",
                id
            )));
        }
        if video.chunk_count == 0 {
            return Ok(FinalizeOutcome::Error("No chunks uploaded".to_string()));
        }

        let dir = Self::video_dir(root, id);
        let output_path = dir.join(VIDEO_FILE);
        let mut output = fs::File::create(&output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;

        let mut size_bytes = 0u64;
        for n in 0..video.chunk_count {
            let chunk_path = dir.join(CHUNKS_DIR).join(format!("{}.part", n));
            if !chunk_path.exists() {
                return Ok(FinalizeOutcome::Error(format!("Chunk {} missing", n)));
            }
            let bytes = fs::read(&chunk_path)
                .with_context(|| format!("Failed to read {}", chunk_path.display()))?;
            output
                .write_all(&bytes)
                .context("Failed to write assembled video")?;
            size_bytes += bytes.len() as u64;
        }
        output.flush().context("Failed to flush assembled video")?;

        fs::remove_dir_all(dir.join(CHUNKS_DIR)).context("Failed to remove chunk directory")?;

        video.is_complete = true;
        video.is_persistent = true;
        video.finalized_at = Some(Utc::now());
        video.size_bytes = Some(size_bytes);
        Self::save_video(root, &video)?;

        info!(
            "Finalized local video {} ({} chunks, {} bytes)",
            id, video.chunk_count, size_bytes
        );
        Ok(FinalizeOutcome::Success)
    }

    fn video_url_sync(root: &Path, id: VideoId) -> Result<Option<String>> {
        match Self::load_video(root, id)? {
            Some(video) if video.is_complete => {
                let path = Self::video_dir(root, id).join(VIDEO_FILE);
                let absolute = fs::canonicalize(&path)
                    .with_context(|| format!("Failed to resolve {}", path.display()))?;
                Ok(Some(format!("file://{}", absolute.display())))
            }
            _ => Ok(None),
        }
    }

    fn list_sync(root: &Path) -> Result<Vec<VideoMetadata>> {
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut videos = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_name() != METADATA_FILE {
                continue;
            }
            match Self::read_json::<StoredVideo>(entry.path()) {
                Ok(video) => videos.push(video.to_domain()),
                Err(e) => warn!("Skipping unreadable metadata: {:#}", e),
            }
        }
        videos.sort_by_key(|v| v.id);
        Ok(videos)
    }

    fn remove_sync(root: &Path, id: VideoId) -> Result<bool> {
        let dir = Self::video_dir(root, id);
        if !dir.join(METADATA_FILE).exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
        Ok(true)
    }

    fn rename_sync(root: &Path, id: VideoId, new_title: &str) -> Result<bool> {
        let Some(mut video) = Self::load_video(root, id)? else {
            return Ok(false);
        };
        video.title = new_title.to_string();
        Self::save_video(root, &video)?;
        Ok(true)
    }

    /// ロックを取ったうえでブロッキングスレッドで実行する
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
    {
        let root = self.root.clone();
        let lock = self.lock.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = lock
                .lock()
                .map_err(|_| anyhow::anyhow!("Local backend lock poisoned"))?;
            f(&root)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to spawn blocking task: {}", e))?
    }
}

#[async_trait]
impl VideoBackend for LocalVideoBackend {
    async fn initialize_upload(&self, title: &str) -> Result<VideoId> {
        let title = title.to_string();
        self.blocking(move |root| Self::initialize_sync(root, &title))
            .await
    }

    async fn upload_chunk(&self, video_id: VideoId, bytes: &[u8]) -> Result<bool> {
        let bytes = bytes.to_vec();
        self.blocking(move |root| Self::upload_chunk_sync(root, video_id, &bytes))
            .await
    }

    async fn finalize_upload(&self, video_id: VideoId) -> Result<FinalizeOutcome> {
        self.blocking(move |root| Self::finalize_sync(root, video_id))
            .await
    }

    async fn get_video_metadata(&self, video_id: VideoId) -> Result<Option<VideoMetadata>> {
        self.blocking(move |root| {
            Ok(Self::load_video(root, video_id)?.map(|v| v.to_domain()))
        })
        .await
    }

    async fn get_video_url(&self, video_id: VideoId) -> Result<Option<String>> {
        self.blocking(move |root| Self::video_url_sync(root, video_id))
            .await
    }

    async fn get_all_video_metadata(&self) -> Result<Vec<VideoMetadata>> {
        self.blocking(Self::list_sync).await
    }

    async fn remove_video(&self, video_id: VideoId) -> Result<bool> {
        self.blocking(move |root| Self::remove_sync(root, video_id))
            .await
    }

    async fn update_video_metadata(&self, video_id: VideoId, new_title: &str) -> Result<bool> {
        let title = new_title.to_string();
        self.blocking(move |root| Self::rename_sync(root, video_id, &title))
            .await
    }
}

//! # Upload Errors
//!
//! アップロード・取得処理のエラー分類

use std::time::Duration;

/// アップロード前のファイル検証エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file type '{mime}'. Please select a video file.")]
    NotVideo { mime: String },

    #[error("'{name}' is not an MP4 video. Please select an MP4 video file.")]
    NotMp4 { name: String },

    #[error("The selected file is empty. Please select a valid video file.")]
    EmptyFile,

    #[error("File size {size} bytes exceeds {limit_mb}MB limit. Please select a smaller file.")]
    TooLarge { size: u64, limit_mb: u64 },
}

/// アップロード／取得のエラー
///
/// どのエラーもそのままユーザーに表示できるメッセージを持つ
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// セッション開始時にバックエンドへ到達できなかった（リトライなし）
    #[error("Failed to initialize video upload: {0}")]
    Init(String),

    /// チャンクのリトライ上限に達した
    #[error("Failed to upload chunk {} after {attempts} attempts. {message}", .index + 1)]
    ChunkUpload {
        index: usize,
        attempts: u32,
        message: String,
    },

    /// バックエンドが明示的に finalize の失敗を返した
    #[error("Failed to finalize video upload: {0}")]
    Finalize(String),

    /// finalize が制限時間内に完了しなかった
    #[error(
        "Upload finalization timed out after {} seconds. The backend may be experiencing issues. Please try uploading again.",
        .timeout.as_secs()
    )]
    FinalizationTimeout { timeout: Duration },

    /// ポーリング上限までにURLが取得できなかった
    #[error(
        "The video was uploaded but cannot be retrieved after {attempts} attempts.{}",
        last_error_suffix(.last_error)
    )]
    NotAvailable {
        attempts: u32,
        last_error: Option<String>,
    },

    /// 一時的なネットワークエラー（ポーリング層でのみリトライ対象）
    #[error("Network error: {message}")]
    NetworkTransient { message: String },

    /// リトライ対象外のバックエンドエラー
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Payload is empty")]
    EmptyPayload,

    #[error("Chunk size must be at least 1 byte")]
    InvalidChunkSize,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Operation cancelled")]
    Cancelled,
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" Last error: {e}"),
        None => String::new(),
    }
}

impl UploadError {
    /// 種別名（ログ出力用）
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Init(_) => "InitError",
            UploadError::ChunkUpload { .. } => "ChunkUploadError",
            UploadError::Finalize(_) => "FinalizeError",
            UploadError::FinalizationTimeout { .. } => "FinalizationTimeoutError",
            UploadError::NotAvailable { .. } => "NotAvailableError",
            UploadError::NetworkTransient { .. } => "NetworkTransientError",
            UploadError::Backend(_) => "BackendError",
            UploadError::EmptyPayload => "EmptyPayloadError",
            UploadError::InvalidChunkSize => "InvalidChunkSizeError",
            UploadError::Validation(_) => "ValidationError",
            UploadError::Cancelled => "Cancelled",
        }
    }
}

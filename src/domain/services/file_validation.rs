//! # File Validation Service
//!
//! アップロード前の動画ファイル検証（コア処理の前提条件）

use std::path::Path;

use crate::domain::errors::ValidationError;

/// アップロード可能な最大ファイルサイズ（500MB）
pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// 検証対象ファイルの情報
#[derive(Debug, Clone)]
pub struct VideoFile<'a> {
    /// ファイル名
    pub name: &'a str,
    /// MIMEタイプ（例: "video/mp4"）
    pub mime: &'a str,
    /// サイズ（バイト）
    pub size: u64,
}

/// 拡張子からMIMEタイプを推測
///
/// 動画以外は `application/octet-stream` を返す
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ogv") => "video/ogg",
        _ => "application/octet-stream",
    }
}

/// 動画ファイル検証サービス
pub struct FileValidationService;

impl FileValidationService {
    /// アップロード前の検証
    ///
    /// 順に「動画か」「MP4か」「サイズ上限」「空ファイル」をチェックする
    ///
    /// # Errors
    ///
    /// 最初に違反した条件の `ValidationError`
    pub fn validate(file: &VideoFile<'_>, max_size: u64) -> Result<(), ValidationError> {
        if !file.mime.starts_with("video/") {
            return Err(ValidationError::NotVideo {
                mime: file.mime.to_string(),
            });
        }

        if file.mime != "video/mp4" && !file.name.to_lowercase().ends_with(".mp4") {
            return Err(ValidationError::NotMp4 {
                name: file.name.to_string(),
            });
        }

        if file.size > max_size {
            return Err(ValidationError::TooLarge {
                size: file.size,
                limit_mb: max_size / (1024 * 1024),
            });
        }

        if file.size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        Ok(())
    }
}

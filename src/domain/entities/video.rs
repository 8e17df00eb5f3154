//! # Video Entities
//!
//! バックエンドが扱う動画のIDとメタデータ

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// バックエンドが発行する動画ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub u64);

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VideoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(VideoId)
    }
}

/// 動画メタデータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub id: VideoId,
    pub title: String,
    pub chunk_count: u64,
    pub is_persistent: bool,
    pub is_complete: bool,
}

/// 再生可能な動画（メタデータ＋配信URL）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub title: String,
    pub content_url: String,
    pub metadata: VideoMetadata,
}

/// finalize の結果
///
/// バックエンドの `Result` 相当。エラーは例外ではなく値として返る
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Success,
    Error(String),
}

/// アップロード完了時の受領情報
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// 発行された動画ID
    pub video_id: VideoId,
    /// チャンク総数
    pub total_chunks: usize,
    /// 総バイト数
    pub bytes_total: usize,
    /// チャンクごとの試行回数（インデックス順）
    pub chunk_attempts: Vec<u32>,
    /// 開始から finalize 完了までの所要時間
    pub elapsed: Duration,
}

impl UploadReceipt {
    /// 指定チャンクの試行回数
    pub fn attempts_for(&self, index: usize) -> Option<u32> {
        self.chunk_attempts.get(index).copied()
    }

    /// 初回で受理されなかったチャンクの数
    pub fn retried_chunks(&self) -> usize {
        self.chunk_attempts.iter().filter(|&&a| a > 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_parse_and_display() {
        let id: VideoId = " 42 ".parse().unwrap();
        assert_eq!(id, VideoId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<VideoId>().is_err());
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = VideoMetadata {
            id: VideoId(0),
            title: "Master Presentation".to_string(),
            chunk_count: 3,
            is_persistent: true,
            is_complete: false,
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["chunkCount"], 3);
        assert_eq!(json["isPersistent"], true);
        assert_eq!(json["isComplete"], false);
    }

    #[test]
    fn test_receipt_attempt_helpers() {
        let receipt = UploadReceipt {
            video_id: VideoId(1),
            total_chunks: 3,
            bytes_total: 10,
            chunk_attempts: vec![1, 3, 1],
            elapsed: Duration::from_secs(1),
        };

        assert_eq!(receipt.attempts_for(1), Some(3));
        assert_eq!(receipt.attempts_for(5), None);
        assert_eq!(receipt.retried_chunks(), 1);
    }
}

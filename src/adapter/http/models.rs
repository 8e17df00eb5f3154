//! HTTP wire models
//!
//! バックエンドAPIのリクエスト/レスポンス形式

use serde::{Deserialize, Serialize};

use crate::domain::entities::video::{FinalizeOutcome, VideoId};

// POST /videos, PATCH /videos/{id}
#[derive(Debug, Serialize)]
pub struct TitleRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoResponse {
    pub id: VideoId,
}

#[derive(Debug, Deserialize)]
pub struct ChunkResponse {
    pub accepted: bool,
}

/// finalize の結果
///
/// `{"success": null}` または `{"error": "..."}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalizeResponse {
    Success(Option<serde_json::Value>),
    Error(String),
}

impl From<FinalizeResponse> for FinalizeOutcome {
    fn from(response: FinalizeResponse) -> Self {
        match response {
            FinalizeResponse::Success(_) => FinalizeOutcome::Success,
            FinalizeResponse::Error(message) => FinalizeOutcome::Error(message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlResponse {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdatedResponse {
    pub updated: bool,
}

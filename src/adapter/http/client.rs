//! HTTP Video Backend
//!
//! `VideoBackend` のHTTP実装（reqwest + JSON, Bearer 認証）

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::models::{
    ChunkResponse, CreateVideoResponse, FinalizeResponse, RemovedResponse, TitleRequest,
    UpdatedResponse, UrlResponse,
};
use crate::domain::entities::video::{FinalizeOutcome, VideoId, VideoMetadata};
use crate::domain::repositories::video_backend::VideoBackend;

/// 1リクエストあたりのタイムアウト
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP API に接続するバックエンド
pub struct HttpVideoBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpVideoBackend {
    /// 新しいバックエンドを作成
    ///
    /// `api_token` があれば全リクエストに `Authorization: Bearer` を付与する
    pub fn new(base_url: &str, api_token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("API token contains invalid header characters")?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// リクエストを送信する
    ///
    /// 接続失敗やタイムアウトは分類できるようメッセージに `network` / `timeout` を含める
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("request timeout: {}", e)
            } else if e.is_connect() || e.is_request() {
                anyhow::anyhow!("network error: {}", e)
            } else {
                anyhow::Error::new(e).context("HTTP request failed")
            }
        })
    }

    /// 成功ステータスを確認してJSONを取り出す
    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error {}: {}", status.as_u16(), body);
        }
        response
            .json::<T>()
            .await
            .context("Failed to decode response body")
    }

    /// 404 を `None` として扱う
    async fn optional_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::json(response).await.map(Some)
    }
}

#[async_trait]
impl VideoBackend for HttpVideoBackend {
    async fn initialize_upload(&self, title: &str) -> Result<VideoId> {
        let response = self
            .send(
                self.http
                    .post(self.url("/videos"))
                    .json(&TitleRequest { title }),
            )
            .await?;
        let created: CreateVideoResponse = Self::json(response).await?;
        debug!("Created video {}", created.id);
        Ok(created.id)
    }

    async fn upload_chunk(&self, video_id: VideoId, bytes: &[u8]) -> Result<bool> {
        let response = self
            .send(
                self.http
                    .put(self.url(&format!("/videos/{}/chunks", video_id)))
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(bytes.to_vec()),
            )
            .await?;
        let chunk: ChunkResponse = Self::json(response).await?;
        Ok(chunk.accepted)
    }

    async fn finalize_upload(&self, video_id: VideoId) -> Result<FinalizeOutcome> {
        let response = self
            .send(
                self.http
                    .post(self.url(&format!("/videos/{}/finalize", video_id))),
            )
            .await?;
        let outcome: FinalizeResponse = Self::json(response).await?;
        Ok(outcome.into())
    }

    async fn get_video_metadata(&self, video_id: VideoId) -> Result<Option<VideoMetadata>> {
        let response = self
            .send(self.http.get(self.url(&format!("/videos/{}", video_id))))
            .await?;
        Self::optional_json(response).await
    }

    async fn get_video_url(&self, video_id: VideoId) -> Result<Option<String>> {
        let response = self
            .send(self.http.get(self.url(&format!("/videos/{}/url", video_id))))
            .await?;
        let url: Option<UrlResponse> = Self::optional_json(response).await?;
        Ok(url.and_then(|u| u.url))
    }

    async fn get_all_video_metadata(&self) -> Result<Vec<VideoMetadata>> {
        let response = self.send(self.http.get(self.url("/videos"))).await?;
        Self::json(response).await
    }

    async fn remove_video(&self, video_id: VideoId) -> Result<bool> {
        let response = self
            .send(self.http.delete(self.url(&format!("/videos/{}", video_id))))
            .await?;
        let removed: RemovedResponse = Self::json(response).await?;
        Ok(removed.removed)
    }

    async fn update_video_metadata(&self, video_id: VideoId, new_title: &str) -> Result<bool> {
        let response = self
            .send(
                self.http
                    .patch(self.url(&format!("/videos/{}", video_id)))
                    .json(&TitleRequest { title: new_title }),
            )
            .await?;
        let updated: UpdatedResponse = Self::json(response).await?;
        Ok(updated.updated)
    }
}

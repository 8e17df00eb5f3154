//! # Upload Video Use Case
//!
//! チャンク分割アップロードのオーケストレーション
//!
//! 初期化 → チャンク送信（チャンク単位のリトライ）→ finalize（タイムアウト付き）
//! の順に進み、途中の失敗は分類済みの `UploadError` で呼び出しを終了させる

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::time::{sleep, timeout, Instant};

use crate::application::dto::upload_config::UploadConfig;
use crate::domain::entities::chunk::{split, Chunk};
use crate::domain::entities::upload_session::{UploadPhase, UploadSession};
use crate::domain::entities::video::{FinalizeOutcome, UploadReceipt, VideoId};
use crate::domain::errors::UploadError;
use crate::domain::repositories::video_backend::VideoBackend;
use crate::domain::services::retry::{error_chain_to_string, linear_delay};

/// 動画アップロードユースケース
///
/// 呼び出しごとに専用の `UploadSession` を持ち、呼び出し間で状態を共有しない
pub struct UploadVideoUseCase<B: VideoBackend + ?Sized> {
    backend: Arc<B>,
    config: UploadConfig,
}

impl<B: VideoBackend + ?Sized> UploadVideoUseCase<B> {
    /// 新しいユースケースを作成
    ///
    /// # Arguments
    ///
    /// * `backend` - 動画バックエンド
    /// * `config` - アップロード設定
    pub fn new(backend: Arc<B>, config: UploadConfig) -> Self {
        Self { backend, config }
    }

    /// 進捗通知なしでアップロード
    pub async fn execute(&self, payload: &[u8]) -> Result<UploadReceipt, UploadError> {
        self.execute_with_progress(payload, |_| {}).await
    }

    /// ペイロードをアップロードする
    ///
    /// # Arguments
    ///
    /// * `payload` - 動画のバイト列
    /// * `on_progress` - 進捗（0〜100）のコールバック。チャンク送信中は最大95、
    ///   finalize 成功後に100が1回だけ通知される
    ///
    /// # Errors
    ///
    /// `EmptyPayload` / `Init` / `ChunkUpload` / `Finalize` / `FinalizationTimeout`
    pub async fn execute_with_progress<F>(
        &self,
        payload: &[u8],
        mut on_progress: F,
    ) -> Result<UploadReceipt, UploadError>
    where
        F: FnMut(f64) + Send,
    {
        let started = Instant::now();
        let chunks = split(payload, self.config.chunk_size)?;
        let mut session = UploadSession::new(chunks.len(), payload.len());

        info!(
            "[upload {}] Uploading {} chunks ({} bytes total)",
            session.session_id(),
            session.total_chunks(),
            session.bytes_total()
        );

        match self.run(&mut session, &chunks, &mut on_progress).await {
            Ok(video_id) => {
                let elapsed = started.elapsed();
                info!(
                    "[upload {}] Video {} finalized in {:.2}s",
                    session.session_id(),
                    video_id,
                    elapsed.as_secs_f64()
                );
                Ok(UploadReceipt {
                    video_id,
                    total_chunks: session.total_chunks(),
                    bytes_total: session.bytes_total(),
                    chunk_attempts: session.chunk_attempts().to_vec(),
                    elapsed,
                })
            }
            Err(e) => {
                advance(&mut session, UploadPhase::Failed);
                let video = session
                    .video_id()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                error!(
                    "[upload {}] video {}: {} after {}/{} chunks: {}",
                    session.session_id(),
                    video,
                    e.kind(),
                    session.chunks_acknowledged(),
                    session.total_chunks(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn run<F>(
        &self,
        session: &mut UploadSession,
        chunks: &[Chunk<'_>],
        on_progress: &mut F,
    ) -> Result<VideoId, UploadError>
    where
        F: FnMut(f64) + Send,
    {
        advance(session, UploadPhase::Initializing);
        let video_id = self
            .backend
            .initialize_upload(&self.config.title)
            .await
            .map_err(|e| UploadError::Init(error_chain_to_string(&e)))?;
        session.assign_video_id(video_id);
        info!(
            "[upload {}] Video initialized with ID {}",
            session.session_id(),
            video_id
        );

        advance(session, UploadPhase::UploadingChunks);
        for chunk in chunks {
            self.upload_chunk_with_retry(session, video_id, chunk).await?;
            if !session.acknowledge(chunk.index()) {
                error!(
                    "[upload {}] Chunk {} acknowledged out of order ({} already acknowledged)",
                    session.session_id(),
                    chunk.index() + 1,
                    session.chunks_acknowledged()
                );
            }
            let progress = session.progress();
            debug!(
                "[upload {}] Chunk {}/{} uploaded ({:.1}%)",
                session.session_id(),
                chunk.index() + 1,
                session.total_chunks(),
                progress
            );
            on_progress(progress);
        }

        debug_assert!(session.all_acknowledged());
        advance(session, UploadPhase::Finalizing);
        info!(
            "[upload {}] All chunks uploaded, finalizing...",
            session.session_id()
        );
        self.finalize(video_id).await?;

        advance(session, UploadPhase::Completed);
        on_progress(session.progress());

        Ok(video_id)
    }

    /// 1チャンクを最大 `max_retries` 回まで試行する
    async fn upload_chunk_with_retry(
        &self,
        session: &mut UploadSession,
        video_id: VideoId,
        chunk: &Chunk<'_>,
    ) -> Result<(), UploadError> {
        let index = chunk.index();

        loop {
            let Some(attempt) = session.record_attempt(index) else {
                return Err(UploadError::ChunkUpload {
                    index,
                    attempts: 0,
                    message: format!(
                        "Chunk {} is outside the session ({} chunks)",
                        index + 1,
                        session.total_chunks()
                    ),
                });
            };

            let failure = match self.backend.upload_chunk(video_id, chunk.data()).await {
                Ok(true) => return Ok(()),
                Ok(false) => format!("Chunk {} upload rejected by backend", index + 1),
                Err(e) => error_chain_to_string(&e),
            };

            if attempt >= self.config.max_retries {
                return Err(UploadError::ChunkUpload {
                    index,
                    attempts: attempt,
                    message: failure,
                });
            }

            let delay = linear_delay(attempt, self.config.retry_delay);
            warn!(
                "[upload {}] Chunk {}/{} failed (attempt {}), retrying in {}ms: {}",
                session.session_id(),
                index + 1,
                session.total_chunks(),
                attempt,
                delay.as_millis(),
                failure
            );
            sleep(delay).await;
        }
    }

    /// finalize をタイムアウトと競争させる
    ///
    /// finalize が先に完了した時点でタイマーは破棄される
    async fn finalize(&self, video_id: VideoId) -> Result<(), UploadError> {
        let limit = self.config.finalization_timeout;

        match timeout(limit, self.backend.finalize_upload(video_id)).await {
            Err(_) => Err(UploadError::FinalizationTimeout { timeout: limit }),
            Ok(Err(e)) => Err(UploadError::Finalize(error_chain_to_string(&e))),
            Ok(Ok(FinalizeOutcome::Error(message))) => Err(UploadError::Finalize(message)),
            Ok(Ok(FinalizeOutcome::Success)) => Ok(()),
        }
    }
}

fn advance(session: &mut UploadSession, next: UploadPhase) {
    if let Err(e) = session.transition(next) {
        warn!("[upload {}] {}", session.session_id(), e);
    }
}

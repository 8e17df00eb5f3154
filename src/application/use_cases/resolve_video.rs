//! # Resolve Video Use Case
//!
//! finalize 済み動画の配信URLを指数バックオフでポーリングする

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::application::dto::retrieval_config::RetrievalConfig;
use crate::domain::entities::retrieval_state::{PollStep, RetrievalState};
use crate::domain::entities::video::VideoId;
use crate::domain::errors::UploadError;
use crate::domain::repositories::video_backend::VideoBackend;
use crate::domain::services::retry::{error_chain_to_string, is_transient_network_error};

/// 取得結果
#[derive(Debug, Clone)]
pub struct Resolution {
    /// 配信URL
    pub url: String,
    /// URL取得までの試行回数
    pub attempts: u32,
    /// 試行間に待機した時間
    pub delays: Vec<Duration>,
}

/// バックエンドのエラーを分類する
///
/// 一時的なネットワークエラーは `NetworkTransient`、それ以外は `Backend`
pub fn classify_poll_error(e: &anyhow::Error) -> UploadError {
    let message = error_chain_to_string(e);
    if is_transient_network_error(&message) {
        UploadError::NetworkTransient { message }
    } else {
        UploadError::Backend(message)
    }
}

/// 動画URL取得ユースケース
///
/// 試行回数は `execute` の呼び出しごとにリセットされる
pub struct ResolveVideoUseCase<B: VideoBackend + ?Sized> {
    backend: Arc<B>,
    config: RetrievalConfig,
}

impl<B: VideoBackend + ?Sized> ResolveVideoUseCase<B> {
    /// 新しいユースケースを作成
    pub fn new(backend: Arc<B>, config: RetrievalConfig) -> Self {
        Self { backend, config }
    }

    /// 配信URLを取得する
    ///
    /// 待機中の future を破棄すればタイマーも一緒に解放される
    pub async fn execute(&self, video_id: VideoId) -> Result<Resolution, UploadError> {
        self.execute_with_cancel(video_id, &CancellationToken::new())
            .await
    }

    /// キャンセル可能な取得
    ///
    /// # Errors
    ///
    /// * `NotAvailable` - 上限回数まで準備できなかった
    /// * `Backend` - リトライ対象外のエラー
    /// * `Cancelled` - `cancel` が発火した
    pub async fn execute_with_cancel(
        &self,
        video_id: VideoId,
        cancel: &CancellationToken,
    ) -> Result<Resolution, UploadError> {
        let mut state = RetrievalState::new(
            video_id,
            self.config.max_attempts,
            self.config.base_delay,
            self.config.max_delay,
        );

        loop {
            if cancel.is_cancelled() {
                state.cancel();
                return Err(UploadError::Cancelled);
            }

            let attempt = state.begin_attempt();
            info!(
                "[resolve {}] Fetching video URL (attempt {}/{})",
                state.video_id(),
                attempt,
                state.max_attempts()
            );

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    state.cancel();
                    return Err(UploadError::Cancelled);
                }
                response = self.backend.get_video_url(state.video_id()) => response,
            };

            let step = match response {
                Ok(Some(url)) => state.on_resolved(url),
                Ok(None) => state.on_not_ready(),
                Err(e) => match classify_poll_error(&e) {
                    transient @ UploadError::NetworkTransient { .. } => {
                        warn!("[resolve {}] {}", state.video_id(), transient);
                        state.on_transient_error(transient.to_string())
                    }
                    fatal => {
                        state.on_fatal_error(fatal.to_string());
                        return Err(fatal);
                    }
                },
            };

            match step {
                PollStep::Resolved(url) => {
                    info!(
                        "[resolve {}] Video URL available after {} attempts",
                        state.video_id(),
                        state.attempt()
                    );
                    return Ok(Resolution {
                        url,
                        attempts: state.attempt(),
                        delays: state.scheduled_delays().to_vec(),
                    });
                }
                PollStep::Exhausted => {
                    warn!(
                        "[resolve {}] Video not available after {} attempts",
                        state.video_id(),
                        state.attempt()
                    );
                    return Err(UploadError::NotAvailable {
                        attempts: state.attempt(),
                        last_error: state.last_error().map(str::to_string),
                    });
                }
                PollStep::Retry(delay) => {
                    info!(
                        "[resolve {}] Video not available yet, next retry in {}ms",
                        state.video_id(),
                        delay.as_millis()
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            state.cancel();
                            return Err(UploadError::Cancelled);
                        }
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    use crate::domain::repositories::video_backend::MockVideoBackend;

    fn use_case(mock: MockVideoBackend) -> ResolveVideoUseCase<MockVideoBackend> {
        ResolveVideoUseCase::new(Arc::new(mock), RetrievalConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_immediately() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url()
            .times(1)
            .returning(|_| Ok(Some("https://cdn.example/0.mp4".to_string())));

        let resolution = use_case(mock).execute(VideoId(0)).await.unwrap();

        assert_eq!(resolution.url, "https://cdn.example/0.mp4");
        assert_eq!(resolution.attempts, 1);
        assert!(resolution.delays.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_on_fifth_attempt_with_backoff() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url().times(5).returning(move |_| {
            let count = call_count_clone.fetch_add(1, Ordering::SeqCst);
            if count < 4 {
                Ok(None)
            } else {
                Ok(Some("https://cdn.example/0.mp4".to_string()))
            }
        });

        let started = Instant::now();
        let resolution = use_case(mock).execute(VideoId(0)).await.unwrap();

        assert_eq!(resolution.attempts, 5);
        assert_eq!(
            resolution.delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
        assert!(started.elapsed() >= Duration::from_secs(15));
        assert_eq!(call_count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_available_after_exactly_five_attempts() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url().times(5).returning(|_| Ok(None));

        let err = use_case(mock).execute(VideoId(0)).await.unwrap_err();

        match err {
            UploadError::NotAvailable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 5);
                assert!(last_error.is_none());
            }
            other => panic!("expected NotAvailable, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_is_retried() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url().times(2).returning(move |_| {
            if call_count_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow::anyhow!("net::ERR_CONNECTION_RESET"))
            } else {
                Ok(Some("https://cdn.example/0.mp4".to_string()))
            }
        });

        let resolution = use_case(mock).execute(VideoId(0)).await.unwrap();

        assert_eq!(resolution.attempts, 2);
        assert_eq!(resolution.delays, vec![Duration::from_secs(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_transient_errors_exhaust_with_last_error() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url()
            .times(5)
            .returning(|_| Err(anyhow::anyhow!("request timeout")));

        let err = use_case(mock).execute(VideoId(0)).await.unwrap_err();

        match err {
            UploadError::NotAvailable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 5);
                assert_eq!(last_error.as_deref(), Some("Network error: request timeout"));
            }
            other => panic!("expected NotAvailable, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_surfaces_immediately() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("Unauthorized caller")));

        let started = Instant::now();
        let err = use_case(mock).execute(VideoId(0)).await.unwrap_err();

        match err {
            UploadError::Backend(message) => assert_eq!(message, "Unauthorized caller"),
            other => panic!("expected Backend error, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_call_starts_fresh() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url().times(10).returning(|_| Ok(None));

        let uc = use_case(mock);
        for _ in 0..2 {
            let err = uc.execute(VideoId(4)).await.unwrap_err();
            assert!(matches!(err, UploadError::NotAvailable { attempts: 5, .. }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url().times(1).returning(|_| Ok(None));

        let uc = use_case(mock);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = uc.execute_with_cancel(VideoId(0), &cancel).await.unwrap_err();

        assert!(matches!(err, UploadError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    /// URL取得が応答しないバックエンド
    struct HangingBackend;

    #[async_trait::async_trait]
    impl VideoBackend for HangingBackend {
        async fn initialize_upload(&self, _title: &str) -> anyhow::Result<VideoId> {
            anyhow::bail!("unused")
        }

        async fn upload_chunk(&self, _video_id: VideoId, _bytes: &[u8]) -> anyhow::Result<bool> {
            anyhow::bail!("unused")
        }

        async fn finalize_upload(
            &self,
            _video_id: VideoId,
        ) -> anyhow::Result<crate::domain::entities::video::FinalizeOutcome> {
            anyhow::bail!("unused")
        }

        async fn get_video_metadata(
            &self,
            _video_id: VideoId,
        ) -> anyhow::Result<Option<crate::domain::entities::video::VideoMetadata>> {
            anyhow::bail!("unused")
        }

        async fn get_video_url(&self, _video_id: VideoId) -> anyhow::Result<Option<String>> {
            std::future::pending().await
        }

        async fn get_all_video_metadata(
            &self,
        ) -> anyhow::Result<Vec<crate::domain::entities::video::VideoMetadata>> {
            anyhow::bail!("unused")
        }

        async fn remove_video(&self, _video_id: VideoId) -> anyhow::Result<bool> {
            anyhow::bail!("unused")
        }

        async fn update_video_metadata(
            &self,
            _video_id: VideoId,
            _new_title: &str,
        ) -> anyhow::Result<bool> {
            anyhow::bail!("unused")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_in_flight_request() {
        let uc = ResolveVideoUseCase::new(Arc::new(HangingBackend), RetrievalConfig::default());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = uc.execute_with_cancel(VideoId(0), &cancel).await.unwrap_err();

        assert!(matches!(err, UploadError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let mock = MockVideoBackend::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = use_case(mock)
            .execute_with_cancel(VideoId(0), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_future_stops_polling() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let mut mock = MockVideoBackend::new();
        mock.expect_get_video_url().returning(move |_| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });

        let uc = use_case(mock);
        let abandoned =
            tokio::time::timeout(Duration::from_millis(1500), uc.execute(VideoId(0))).await;
        assert!(abandoned.is_err());

        // 1回目（0s）と2回目（1s）のみ
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_classify_poll_error() {
        let transient = classify_poll_error(&anyhow::anyhow!("Failed to fetch"));
        assert!(matches!(transient, UploadError::NetworkTransient { .. }));

        let fatal = classify_poll_error(&anyhow::anyhow!("Video not found"));
        assert!(matches!(fatal, UploadError::Backend(_)));
    }
}

//! # RetrievalState Entity
//!
//! 取得ポーリングの純粋な状態機械。描画やタイマーには依存せず、
//! 次に何をすべきか（待機・完了・断念）だけを返す

use std::time::Duration;

use super::video::VideoId;
use crate::domain::services::retry::exponential_delay;

/// ポーリングの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPhase {
    Requesting,
    Retrying,
    Resolved,
    Exhausted,
    Failed,
    Cancelled,
}

/// 試行結果を受けて状態機械が返す次の動作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// 指定時間待ってから再試行
    Retry(Duration),
    /// URLが取得できた
    Resolved(String),
    /// 試行回数の上限に達した
    Exhausted,
}

/// 取得ポーリングの状態
#[derive(Debug)]
pub struct RetrievalState {
    video_id: VideoId,
    attempt: u32,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    last_error: Option<String>,
    phase: RetrievalPhase,
    scheduled_delays: Vec<Duration>,
}

impl RetrievalState {
    /// 新しい状態を作成
    ///
    /// # Arguments
    ///
    /// * `video_id` - 取得対象の動画ID
    /// * `max_attempts` - 最大試行回数
    /// * `base_delay` - バックオフの基準時間
    /// * `max_delay` - バックオフの上限
    pub fn new(video_id: VideoId, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            video_id,
            attempt: 0,
            max_attempts,
            base_delay,
            max_delay,
            last_error: None,
            phase: RetrievalPhase::Requesting,
            scheduled_delays: Vec::new(),
        }
    }

    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    /// これまでの試行回数
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn phase(&self) -> RetrievalPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// これまでに予定された待機時間
    pub fn scheduled_delays(&self) -> &[Duration] {
        &self.scheduled_delays
    }

    /// 試行を開始し、その試行番号（1始まり）を返す
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.phase = RetrievalPhase::Requesting;
        self.attempt
    }

    /// URLが返ってきた
    pub fn on_resolved(&mut self, url: String) -> PollStep {
        self.last_error = None;
        self.phase = RetrievalPhase::Resolved;
        PollStep::Resolved(url)
    }

    /// まだ準備できていない（エラーではない）
    pub fn on_not_ready(&mut self) -> PollStep {
        self.schedule_next()
    }

    /// 一時的なネットワークエラー
    pub fn on_transient_error(&mut self, message: String) -> PollStep {
        self.last_error = Some(message);
        self.schedule_next()
    }

    /// リトライ対象外のエラー
    pub fn on_fatal_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.phase = RetrievalPhase::Failed;
    }

    /// 呼び出し側による中断
    pub fn cancel(&mut self) {
        if !self.is_terminal() {
            self.phase = RetrievalPhase::Cancelled;
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            RetrievalPhase::Resolved
                | RetrievalPhase::Exhausted
                | RetrievalPhase::Failed
                | RetrievalPhase::Cancelled
        )
    }

    fn schedule_next(&mut self) -> PollStep {
        if self.attempt >= self.max_attempts {
            self.phase = RetrievalPhase::Exhausted;
            return PollStep::Exhausted;
        }

        let delay = exponential_delay(self.attempt.saturating_sub(1), self.base_delay, self.max_delay);
        self.scheduled_delays.push(delay);
        self.phase = RetrievalPhase::Retrying;
        PollStep::Retry(delay)
    }
}

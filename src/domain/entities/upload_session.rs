//! # UploadSession Entity
//!
//! 1回のアップロード呼び出しが占有する一時的なセッション状態

use uuid::Uuid;

use super::video::VideoId;

/// アップロードの進捗のうちチャンク送信に割り当てる上限（残りは finalize 用）
pub const CHUNK_PROGRESS_CEILING: f64 = 95.0;

/// アップロードの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Initializing,
    UploadingChunks,
    Finalizing,
    Completed,
    Failed,
}

impl UploadPhase {
    /// 終端状態かどうか
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadPhase::Completed | UploadPhase::Failed)
    }

    fn can_transition_to(self, next: UploadPhase) -> bool {
        use UploadPhase::*;
        match (self, next) {
            (Idle, Initializing)
            | (Initializing, UploadingChunks)
            | (UploadingChunks, Finalizing)
            | (Finalizing, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// 許可されていない状態遷移
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid upload transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: UploadPhase,
    pub to: UploadPhase,
}

/// アップロードセッション
///
/// 永続化されず、呼び出しが終わると破棄される。
/// `chunks_acknowledged` は単調増加で、全チャンク成功時にのみ `total_chunks` に達する
#[derive(Debug)]
pub struct UploadSession {
    session_id: Uuid,
    video_id: Option<VideoId>,
    total_chunks: usize,
    bytes_total: usize,
    chunks_acknowledged: usize,
    chunk_attempts: Vec<u32>,
    phase: UploadPhase,
}

impl UploadSession {
    /// 新しいセッションを作成
    pub fn new(total_chunks: usize, bytes_total: usize) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            video_id: None,
            total_chunks,
            bytes_total,
            chunks_acknowledged: 0,
            chunk_attempts: vec![0; total_chunks],
            phase: UploadPhase::Idle,
        }
    }

    /// ログ相関用のID
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn video_id(&self) -> Option<VideoId> {
        self.video_id
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    pub fn bytes_total(&self) -> usize {
        self.bytes_total
    }

    pub fn chunks_acknowledged(&self) -> usize {
        self.chunks_acknowledged
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn chunk_attempts(&self) -> &[u32] {
        &self.chunk_attempts
    }

    /// 状態を遷移させる
    pub fn transition(&mut self, next: UploadPhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// バックエンドが発行したIDを記録
    pub fn assign_video_id(&mut self, video_id: VideoId) {
        self.video_id = Some(video_id);
    }

    /// チャンクの試行を1回記録し、累計試行回数を返す
    ///
    /// `index` がセッションの範囲外なら `None`
    pub fn record_attempt(&mut self, index: usize) -> Option<u32> {
        let attempts = self.chunk_attempts.get_mut(index)?;
        *attempts += 1;
        Some(*attempts)
    }

    /// 次のチャンクが受理されたことを記録
    ///
    /// チャンクは順番通りにしか受理されない。`index` が次に期待する
    /// チャンクでなければ何もせず `false` を返す
    pub fn acknowledge(&mut self, index: usize) -> bool {
        if index != self.chunks_acknowledged || index >= self.total_chunks {
            return false;
        }
        self.chunks_acknowledged += 1;
        true
    }

    /// 現在の進捗（0〜100）
    ///
    /// チャンク送信中は最大95、完了時のみ100
    pub fn progress(&self) -> f64 {
        if self.phase == UploadPhase::Completed {
            return 100.0;
        }
        if self.total_chunks == 0 {
            return 0.0;
        }
        (self.chunks_acknowledged as f64 / self.total_chunks as f64) * CHUNK_PROGRESS_CEILING
    }

    /// 全チャンクが受理されたか
    pub fn all_acknowledged(&self) -> bool {
        self.chunks_acknowledged == self.total_chunks
    }
}

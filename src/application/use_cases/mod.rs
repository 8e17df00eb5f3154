//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **UploadVideoUseCase**: チャンク分割アップロードと finalize
//! - **ResolveVideoUseCase**: 配信URLの取得（指数バックオフ）
//! - **ManageVideosUseCase**: 一覧・参照・削除・リネーム

pub mod manage_videos;
pub mod resolve_video;
pub mod upload_video;

//! # Domain Entities
//!
//! エンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **Chunk**: ペイロードのバイト範囲と分割処理
//! - **UploadSession**: 1回のアップロードの状態
//! - **RetrievalState**: 取得ポーリングの状態機械
//! - **Video**: 動画ID・メタデータ

pub mod chunk;
pub mod retrieval_state;
pub mod upload_session;
pub mod video;

//! # Domain Layer
//!
//! このモジュールはアップロードの核心的なルールとエンティティを定義します。
//!
//! ## 特徴
//!
//! - フレームワークに依存しない
//! - バックエンドのプロトコルについて何も知らない
//! - 純粋なビジネスロジック（分割・状態遷移・バックオフ計算）
//!
//! ## 構成要素
//!
//! - **entities**: エンティティとバリューオブジェクト（Chunk, UploadSession, RetrievalStateなど）
//! - **repositories**: バックエンドのtrait（インターフェース定義のみ）
//! - **services**: Domain Service（リトライ方針、ファイル検証）
//! - **errors**: エラー分類

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;

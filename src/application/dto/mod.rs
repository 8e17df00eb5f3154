//! # Data Transfer Objects
//!
//! ユースケースに渡す設定値

pub mod retrieval_config;
pub mod upload_config;

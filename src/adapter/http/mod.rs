//! HTTP Backend
//!
//! リモート動画APIとの通信

pub mod client;
pub mod models;

pub use client::HttpVideoBackend;

//! # Retry Policy
//!
//! バックオフ計算とエラー分類

use std::time::Duration;

/// 線形バックオフ: `base * attempt_number`
///
/// `attempt_number` は失敗した試行の番号（1始まり）
pub fn linear_delay(attempt_number: u32, base: Duration) -> Duration {
    base.saturating_mul(attempt_number)
}

/// 指数バックオフ: `min(base * 2^attempt_index, max)`
///
/// `attempt_index` は失敗した試行のインデックス（0始まり）。
/// 0, 1, 2, 3, 4 に対して 1s, 2s, 4s, 8s, 16s（base=1s, max=16s）
pub fn exponential_delay(attempt_index: u32, base: Duration, max: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
    std::cmp::min(base.saturating_mul(factor), max)
}

/// Convert error chain to string including all causes
pub fn error_chain_to_string(e: &anyhow::Error) -> String {
    let mut messages = Vec::new();
    for cause in e.chain() {
        messages.push(cause.to_string());
    }
    messages.join(" | ")
}

/// Check if an error message looks like a temporary network failure
pub fn is_transient_network_error(error_msg: &str) -> bool {
    error_msg.contains("ERR_CONNECTION_RESET")
        || error_msg.contains("Connection reset")
        || error_msg.contains("connection reset")
        || error_msg.contains("Failed to fetch")
        || error_msg.contains("NetworkError")
        || error_msg.contains("network")
        || error_msg.contains("timeout")
        || error_msg.contains("Timeout")
        || error_msg.contains("timed out")
}

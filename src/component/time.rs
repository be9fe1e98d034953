use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, used to disambiguate result artifact
/// filenames across runs (`<stageName>_result_<timestamp>.<ext>`).
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!("system clock error: {e}");
            0
        })
}

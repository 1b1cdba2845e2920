//! Wall-clock helpers.
//!
//! Every timestamp in Bastion is Unix epoch milliseconds. Components expose
//! `*_at(now_ms)` variants of their time-dependent operations so tests can drive
//! lock windows and session lifetimes without sleeping.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds per second.
pub const MS_PER_SEC: u64 = 1_000;

/// Get current timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0, which makes every window look
/// already started rather than panicking.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// True once `window_ms` has fully elapsed since `started_at_ms`.
pub fn window_elapsed(started_at_ms: u64, window_ms: u64, now_ms: u64) -> bool {
    now_ms.saturating_sub(started_at_ms) >= window_ms
}

//! Exponential backoff arithmetic

use std::time::Duration;

/// Delay before the retry that follows failed attempt `attempt` (0-based):
/// `base * 2^attempt`, saturating at [`Duration::MAX`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    match 1u32.checked_shl(attempt) {
        Some(factor) => base.saturating_mul(factor),
        None if base.is_zero() => Duration::ZERO,
        None => Duration::MAX,
    }
}

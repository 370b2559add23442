//! Exponential backoff with jitter.
//!
//! Backs [`crate::resilience::Delay::exponential`]. Retry number 1 waits
//! `base`, every following retry doubles it up to `cap`, then up to 10%
//! jitter is added on top.

use std::time::Duration;

use rand::Rng;

/// Delay before the `retry`-th retry (1-based). Retry 0 never waits.
pub fn exponential_delay(retry: u32, base: Duration, cap: Duration) -> Duration {
    let Some(doublings) = retry.checked_sub(1) else {
        return Duration::ZERO;
    };

    let factor = 1u32.checked_shl(doublings).unwrap_or(u32::MAX);
    let delay = base.checked_mul(factor).unwrap_or(Duration::MAX).min(cap);

    let jitter = delay / 10;
    if jitter.is_zero() {
        return delay;
    }
    delay + rand::thread_rng().gen_range(Duration::ZERO..jitter)
}

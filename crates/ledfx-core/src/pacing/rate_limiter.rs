//! Lock-free minimum-interval gate for a channel's send path.
//!
//! LED controllers cope badly with bursts: a frame loop that briefly runs fast
//! (or two callers that both decide to send) can flood a small WiFi device.
//! The limiter remembers when the last frame went out and refuses to let
//! another through until `min_interval` has passed.
//!
//! A refused frame is *dropped*, not queued. The next frame supersedes it
//! anyway, so the caller treats a refusal as success.
//!
//! # How the gate works
//!
//! The last-send time is stored in an `AtomicU64` as microseconds since the
//! limiter was created. A caller that sees enough time has passed tries to
//! swap its own timestamp in with a single compare-and-swap. Exactly one
//! racing caller wins the slot; the others observe a changed value and drop
//! their frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::trace;

/// Stored timestamp meaning "nothing has been sent yet".
const NEVER: u64 = u64::MAX;

/// Default minimum gap between frames (~125 Hz).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(8);

#[derive(Debug)]
pub struct RateLimiter {
    epoch: Instant,
    min_interval_us: u64,
    last_send_us: AtomicU64,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            min_interval_us: min_interval.as_micros() as u64,
            last_send_us: AtomicU64::new(NEVER),
        }
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_micros(self.min_interval_us)
    }

    /// Claims the send slot if at least `min_interval` has passed since the
    /// last claimed send.
    ///
    /// Returns `false` when the caller must drop its frame.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(self.epoch.elapsed())
    }

    /// [`try_acquire`](Self::try_acquire) with an explicit time since the
    /// limiter's epoch.
    pub fn try_acquire_at(&self, elapsed: Duration) -> bool {
        let now = elapsed.as_micros() as u64;
        let last = self.last_send_us.load(Ordering::Acquire);
        if last != NEVER && now.saturating_sub(last) < self.min_interval_us {
            trace!(since_last_us = now.saturating_sub(last), "frame dropped: inside minimum interval");
            return false;
        }
        let won = self
            .last_send_us
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !won {
            trace!("frame dropped: lost send slot to a concurrent caller");
        }
        won
    }

    /// Records a send that bypassed the gate (turn-off), so regular frames
    /// keep their spacing after it.
    pub fn mark_sent(&self) {
        self.mark_sent_at(self.epoch.elapsed());
    }

    /// Never moves the stamp backwards: a turn-off thread that read the
    /// clock before a concurrent frame claimed the slot leaves the newer
    /// stamp in place.
    pub fn mark_sent_at(&self, elapsed: Duration) {
        let now = elapsed.as_micros() as u64;
        let _ = self
            .last_send_us
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                (last == NEVER || last < now).then_some(now)
            });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

//! At-least-once delivery by repetition.
//!
//! UDP gives no delivery guarantee and LED controllers send no
//! acknowledgement. For messages that matter, such as "go dark" at shutdown,
//! the sender simply transmits the same thing several times with a short pause
//! so that a single dropped datagram does not leave a panel lit.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::warn;

/// How many times to send, and how long to wait between sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatPolicy {
    pub count: usize,
    pub interval: Duration,
}

impl RepeatPolicy {
    /// Five sends, 50 ms apart.
    pub const TURN_OFF: RepeatPolicy = RepeatPolicy {
        count: 5,
        interval: Duration::from_millis(50),
    };

    pub const fn new(count: usize, interval: Duration) -> Self {
        Self { count, interval }
    }
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self::TURN_OFF
    }
}

/// Calls `send` `policy.count` times, sleeping `policy.interval` between
/// calls (not after the last one).
///
/// `send` receives the zero-based attempt number. A failed attempt is logged
/// and the remaining attempts still run, since one lost datagram is exactly
/// what the repetition is for. An error for which `is_fatal` returns `true`
/// (the link is gone, say) stops the sequence at once.
///
/// Returns the fatal error if one stopped the sequence, otherwise the first
/// error seen, or `Ok(())` if every attempt succeeded.
///
/// This blocks the calling thread; run it off any async executor.
pub fn send_repeated<E, F, P>(policy: RepeatPolicy, mut send: F, is_fatal: P) -> Result<(), E>
where
    E: fmt::Display,
    F: FnMut(usize) -> Result<(), E>,
    P: Fn(&E) -> bool,
{
    let mut first_error = None;
    for attempt in 0..policy.count {
        if let Err(e) = send(attempt) {
            if is_fatal(&e) {
                return Err(e);
            }
            warn!(attempt, of = policy.count, "repeated send failed: {e}");
            first_error.get_or_insert(e);
        }
        if attempt + 1 < policy.count && !policy.interval.is_zero() {
            thread::sleep(policy.interval);
        }
    }
    first_error.map_or(Ok(()), Err)
}

//! Per-channel DDP frame sequence counter.
//!
//! # What the sequence number is for
//!
//! Every DDP fragment carries a one-byte sequence number. All fragments of
//! one frame share it, and it moves on by one for the next frame. A receiver
//! can then tell "this fragment belongs to the frame I am assembling" from
//! "this is a late fragment from the previous frame".
//!
//! The counter is deliberately split into [`current`](FrameSequence::current)
//! and [`advance`](FrameSequence::advance) rather than a single
//! `fetch_add`: the channel stamps every fragment with `current()` and only
//! calls `advance()` once the final fragment has been handed to the socket.
//!
//! # Thread safety
//!
//! The value lives in an `AtomicU8`, so a shutdown turn-off running on another
//! thread can share the channel with the frame loop without a lock.

use std::sync::atomic::{AtomicU8, Ordering};

/// A wrapping `u8` frame counter.
///
/// # Examples
///
/// ```rust
/// use ledfx_core::FrameSequence;
///
/// let seq = FrameSequence::new();
/// assert_eq!(seq.current(), 0);
/// seq.advance();
/// assert_eq!(seq.current(), 1);
/// ```
#[derive(Debug, Default)]
pub struct FrameSequence {
    inner: AtomicU8,
}

impl FrameSequence {
    /// Creates a counter starting at 0.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter starting at `value`.
    pub fn starting_at(value: u8) -> Self {
        Self {
            inner: AtomicU8::new(value),
        }
    }

    /// The sequence number to stamp on the frame currently being sent.
    pub fn current(&self) -> u8 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Moves on to the next frame, wrapping from 255 to 0.
    ///
    /// Returns the value before the increment.
    pub fn advance(&self) -> u8 {
        // fetch_add on atomics wraps on overflow.
        self.inner.fetch_add(1, Ordering::Relaxed)
    }
}

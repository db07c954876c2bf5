//! DDP device channel.
//!
//! Each frame is split into 480-LED fragments that all carry the channel's
//! current sequence number; the final fragment sets the push flag.
//!
//! Stamping, sending every fragment and advancing the sequence happen under
//! one lock, so a turn-off on another thread can never interleave its
//! fragments with a regular frame's. Every attempted frame consumes a number,
//! including one that failed half-way, so a receiver never merges fragments
//! of two different frames.

use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use ledfx_core::protocol::ddp::encode_frame;
use ledfx_core::{send_repeated, FrameSequence, RateLimiter, RepeatPolicy};
use tracing::debug;

use super::{ChannelOptions, UdpLink};
use crate::application::device::{ChannelError, DeviceChannel, DeviceProtocol, SendOutcome};

#[derive(Debug)]
pub struct DdpChannel {
    link: UdpLink,
    led_count: usize,
    sequence: FrameSequence,
    limiter: RateLimiter,
    turn_off_policy: RepeatPolicy,
    /// Held for the whole stamp / send / advance of one frame.
    frame_lock: Mutex<()>,
}

impl DdpChannel {
    /// Opens a socket for the controller at `addr`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a local UDP socket cannot be bound.
    pub fn open(addr: SocketAddr, led_count: usize, options: ChannelOptions) -> std::io::Result<Self> {
        let link = UdpLink::open(addr, "ddp")?;
        debug!(%addr, led_count, "DDP channel ready");
        Ok(Self {
            link,
            led_count,
            sequence: FrameSequence::new(),
            limiter: RateLimiter::new(options.min_send_interval),
            turn_off_policy: options.turn_off,
            frame_lock: Mutex::new(()),
        })
    }

    /// Sequence number the next frame will carry.
    pub fn sequence(&self) -> u8 {
        self.sequence.current()
    }

    pub fn packets_sent(&self) -> u64 {
        self.link.packets_sent()
    }

    /// Encodes and sends one frame, bypassing the rate limiter.
    fn transmit(&self, rgb: &[u8]) -> Result<usize, ChannelError> {
        let rgb = &rgb[..rgb.len().min(self.led_count * 3)];
        let _frame = self.frame_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let packets = encode_frame(rgb, self.sequence.current());
        let sent = packets.iter().try_for_each(|packet| self.link.send(packet));
        self.sequence.advance();
        sent.map(|()| packets.len())
    }
}

impl DeviceChannel for DdpChannel {
    fn address(&self) -> SocketAddr {
        self.link.addr()
    }

    fn protocol(&self) -> DeviceProtocol {
        DeviceProtocol::Ddp
    }

    fn led_count(&self) -> usize {
        self.led_count
    }

    fn send_frame(&self, rgb: &[u8]) -> Result<SendOutcome, ChannelError> {
        self.link.ensure_open()?;
        if !self.limiter.try_acquire() {
            return Ok(SendOutcome::Throttled);
        }
        let packets = self.transmit(rgb)?;
        Ok(SendOutcome::Sent { packets })
    }

    fn turn_off(&self) -> Result<(), ChannelError> {
        self.link.ensure_open()?;
        let black = vec![0u8; self.led_count * 3];
        debug!(addr = %self.link.addr(), "DDP turn-off");
        send_repeated(
            self.turn_off_policy,
            |_| {
                self.limiter.mark_sent();
                self.transmit(&black).map(|_| ())
            },
            ChannelError::is_not_connected,
        )
    }

    fn is_open(&self) -> bool {
        self.link.is_open()
    }

    fn close(&self) {
        self.link.close();
    }
}

impl Drop for DdpChannel {
    fn drop(&mut self) {
        self.link.close();
    }
}

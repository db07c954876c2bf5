//! Art-Net device channel: one OpDmx packet per frame on the panel's universe.

use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use ledfx_core::protocol::artnet::encode_dmx_into;
use ledfx_core::{send_repeated, ColorMapping, RateLimiter, RepeatPolicy};
use tracing::debug;

use super::{ChannelOptions, UdpLink};
use crate::application::device::{ChannelError, DeviceChannel, DeviceProtocol, SendOutcome};

#[derive(Debug)]
pub struct ArtNetChannel {
    link: UdpLink,
    led_count: usize,
    universe: u16,
    mapping: ColorMapping,
    limiter: RateLimiter,
    turn_off_policy: RepeatPolicy,
    /// Packet buffer reused across frames.
    packet: Mutex<Vec<u8>>,
}

impl ArtNetChannel {
    /// Opens a socket for the controller at `addr`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a local UDP socket cannot be bound.
    pub fn open(
        addr: SocketAddr,
        led_count: usize,
        universe: u16,
        mapping: ColorMapping,
        options: ChannelOptions,
    ) -> std::io::Result<Self> {
        let link = UdpLink::open(addr, "artnet")?;
        debug!(
            %addr,
            universe,
            mapping = mapping.description(),
            led_count,
            "Art-Net channel ready"
        );
        Ok(Self {
            link,
            led_count,
            universe,
            mapping,
            limiter: RateLimiter::new(options.min_send_interval),
            turn_off_policy: options.turn_off,
            packet: Mutex::new(Vec::new()),
        })
    }

    pub fn universe(&self) -> u16 {
        self.universe
    }

    pub fn mapping(&self) -> ColorMapping {
        self.mapping
    }

    pub fn packets_sent(&self) -> u64 {
        self.link.packets_sent()
    }

    fn transmit(&self, rgb: &[u8]) -> Result<(), ChannelError> {
        let mut packet = self.packet.lock().unwrap_or_else(PoisonError::into_inner);
        encode_dmx_into(self.universe, self.mapping, rgb, self.led_count, &mut packet);
        self.link.send(&packet)
    }
}

impl DeviceChannel for ArtNetChannel {
    fn address(&self) -> SocketAddr {
        self.link.addr()
    }

    fn protocol(&self) -> DeviceProtocol {
        DeviceProtocol::Artnet
    }

    fn led_count(&self) -> usize {
        self.led_count
    }

    fn send_frame(&self, rgb: &[u8]) -> Result<SendOutcome, ChannelError> {
        self.link.ensure_open()?;
        if !self.limiter.try_acquire() {
            return Ok(SendOutcome::Throttled);
        }
        self.transmit(rgb)?;
        Ok(SendOutcome::Sent { packets: 1 })
    }

    fn turn_off(&self) -> Result<(), ChannelError> {
        self.link.ensure_open()?;
        debug!(addr = %self.link.addr(), universe = self.universe, "Art-Net turn-off");
        send_repeated(
            self.turn_off_policy,
            |_| {
                self.limiter.mark_sent();
                // An empty stream encodes as led_count black pixels.
                self.transmit(&[])
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

impl Drop for ArtNetChannel {
    fn drop(&mut self) {
        self.link.close();
    }
}

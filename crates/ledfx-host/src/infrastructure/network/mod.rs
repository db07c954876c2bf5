//! UDP device channels.
//!
//! # Sub-modules
//!
//! - **`ddp_channel`** – Streams a panel as DDP fragments with a per-channel
//!   frame sequence.
//!
//! - **`artnet_channel`** – Sends a panel as one Art-Net OpDmx packet on its
//!   own universe, re-ordering every pixel through the panel's color mapping.
//!
//! Both channels share [`UdpLink`], which owns the socket, the destination
//! address and the packet counter, and both are built from a [`ChannelSpec`]
//! by [`open_channel`].

pub mod artnet_channel;
pub mod ddp_channel;

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use ledfx_core::pacing::rate_limiter::DEFAULT_MIN_INTERVAL;
use ledfx_core::{ColorMapping, RepeatPolicy};
use tracing::{debug, trace};

use crate::application::device::{ChannelError, DeviceChannel, DeviceProtocol};

pub use artnet_channel::ArtNetChannel;
pub use ddp_channel::DdpChannel;

/// Log a running packet count every this many datagrams (~1 s at 60 fps).
const SEND_LOG_EVERY: u64 = 60;

/// Everything needed to open the channel for one panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub panel_id: String,
    pub protocol: DeviceProtocol,
    pub address: SocketAddr,
    pub led_count: usize,
    /// Art-Net universe. Ignored by DDP.
    pub universe: u16,
    /// Art-Net wire channel order. Ignored by DDP.
    pub color_mapping: ColorMapping,
}

/// Pacing knobs shared by both channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    pub min_send_interval: Duration,
    pub turn_off: RepeatPolicy,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            min_send_interval: DEFAULT_MIN_INTERVAL,
            turn_off: RepeatPolicy::TURN_OFF,
        }
    }
}

/// Opens the channel described by `spec`.
///
/// # Errors
///
/// Returns the OS error if a local UDP socket cannot be bound.
pub fn open_channel(spec: &ChannelSpec, options: ChannelOptions) -> io::Result<Box<dyn DeviceChannel>> {
    Ok(match spec.protocol {
        DeviceProtocol::Ddp => Box::new(DdpChannel::open(spec.address, spec.led_count, options)?),
        DeviceProtocol::Artnet => Box::new(ArtNetChannel::open(
            spec.address,
            spec.led_count,
            spec.universe,
            spec.color_mapping,
            options,
        )?),
    })
}

/// Opens one channel per spec, in order.
///
/// # Errors
///
/// Fails on the first socket that cannot be bound; channels opened before it
/// are dropped (and therefore closed).
pub fn open_channels(
    specs: &[ChannelSpec],
    options: ChannelOptions,
) -> io::Result<Vec<Box<dyn DeviceChannel>>> {
    specs.iter().map(|spec| open_channel(spec, options)).collect()
}

// ── UdpLink ───────────────────────────────────────────────────────────────────

/// A connectionless UDP sender bound to one destination.
///
/// The socket sits behind an `RwLock<Option<_>>`: sends take the read lock
/// and may run concurrently; `close` takes the write lock and empties the
/// slot, after which sends report `NotConnected`.
#[derive(Debug)]
pub struct UdpLink {
    addr: SocketAddr,
    socket: RwLock<Option<UdpSocket>>,
    sent: AtomicU64,
    label: &'static str,
}

impl UdpLink {
    /// Binds an ephemeral local port of the same address family as `addr`.
    ///
    /// The socket is non-blocking: a full send buffer surfaces as a transport
    /// error for that frame rather than stalling the frame loop.
    pub fn open(addr: SocketAddr, label: &'static str) -> io::Result<Self> {
        let local: SocketAddr = match addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;
        debug!(%addr, local = ?socket.local_addr().ok(), "{label} socket opened");
        Ok(Self {
            addr,
            socket: RwLock::new(Some(socket)),
            sent: AtomicU64::new(0),
            label,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_open(&self) -> bool {
        self.socket
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Fails fast with `NotConnected` when the link has been closed.
    pub fn ensure_open(&self) -> Result<(), ChannelError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ChannelError::NotConnected { addr: self.addr })
        }
    }

    /// Sends one datagram.
    pub fn send(&self, datagram: &[u8]) -> Result<(), ChannelError> {
        let guard = self.socket.read().unwrap_or_else(PoisonError::into_inner);
        let socket = guard
            .as_ref()
            .ok_or(ChannelError::NotConnected { addr: self.addr })?;
        socket
            .send_to(datagram, self.addr)
            .map_err(|source| ChannelError::Transport {
                addr: self.addr,
                source,
            })?;

        let count = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(addr = %self.addr, bytes = datagram.len(), "{} datagram sent", self.label);
        if count % SEND_LOG_EVERY == 0 {
            debug!(addr = %self.addr, count, "{} packets sent", self.label);
        }
        Ok(())
    }

    /// Total datagrams sent since the link was opened.
    pub fn packets_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Drops the socket. Idempotent.
    pub fn close(&self) {
        let mut guard = self.socket.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            debug!(addr = %self.addr, sent = self.packets_sent(), "{} socket closed", self.label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> UdpSocket {
        let r = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
        r.set_read_timeout(Some(Duration::from_secs(2))).expect("timeout");
        r
    }

    #[test]
    fn test_link_delivers_datagram_and_counts_it() {
        // Arrange
        let rx = receiver();
        let link = UdpLink::open(rx.local_addr().expect("addr"), "test").expect("open");

        // Act
        link.send(&[1, 2, 3]).expect("send");

        // Assert
        let mut buf = [0u8; 16];
        let (n, _) = rx.recv_from(&mut buf).expect("recv");
        assert_eq!(&buf[..n], &[1, 2, 3]);
        assert_eq!(link.packets_sent(), 1);
    }

    #[test]
    fn test_send_after_close_is_not_connected() {
        // Arrange
        let rx = receiver();
        let addr = rx.local_addr().expect("addr");
        let link = UdpLink::open(addr, "test").expect("open");

        // Act
        link.close();
        link.close();

        // Assert
        assert!(!link.is_open());
        assert!(matches!(
            link.send(&[0]),
            Err(ChannelError::NotConnected { addr: a }) if a == addr
        ));
        assert!(link.ensure_open().is_err());
    }

    #[test]
    fn test_default_options_match_turn_off_policy() {
        let opts = ChannelOptions::default();
        assert_eq!(opts.min_send_interval, Duration::from_millis(8));
        assert_eq!(opts.turn_off.count, 5);
        assert_eq!(opts.turn_off.interval, Duration::from_millis(50));
    }
}

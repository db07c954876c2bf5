//! The per-panel transport contract.
//!
//! A [`DeviceChannel`] takes one panel's serialized pixels (packed canonical
//! RGB, row-major, mirroring already applied) and gets them to the physical
//! controller. How it frames the bytes (DDP fragments, an Art-Net universe)
//! is its own business.
//!
//! Channels are `Send + Sync`: the shutdown turn-off runs on worker threads
//! while the frame loop may still hold a reference.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a channel can report for a single send.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel has been closed (or its socket was never opened).
    ///
    /// This is a programming error on the caller's side, not a network
    /// condition.
    #[error("channel to {addr} is not connected")]
    NotConnected { addr: SocketAddr },

    /// The OS refused or failed the datagram write.
    #[error("transport error sending to {addr}: {source}")]
    Transport {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl ChannelError {
    /// Device address the failed send was aimed at.
    pub fn addr(&self) -> SocketAddr {
        match self {
            ChannelError::NotConnected { addr } | ChannelError::Transport { addr, .. } => *addr,
        }
    }

    /// `true` when the channel itself is gone, as opposed to one datagram
    /// failing. Repeating a send cannot help in that case.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, ChannelError::NotConnected { .. })
    }
}

/// What happened to a frame handed to [`DeviceChannel::send_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The frame went out as `packets` datagrams.
    Sent { packets: usize },
    /// The rate limiter dropped the frame. Not an error.
    Throttled,
}

/// Wire protocol spoken by a panel's controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProtocol {
    #[default]
    Ddp,
    #[serde(alias = "art-net")]
    Artnet,
}

impl DeviceProtocol {
    /// UDP port used when the layout does not name one.
    pub fn default_port(self) -> u16 {
        match self {
            DeviceProtocol::Ddp => ledfx_core::protocol::DEFAULT_DDP_PORT,
            DeviceProtocol::Artnet => ledfx_core::protocol::DEFAULT_ARTNET_PORT,
        }
    }
}

impl fmt::Display for DeviceProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceProtocol::Ddp => f.write_str("ddp"),
            DeviceProtocol::Artnet => f.write_str("artnet"),
        }
    }
}

impl FromStr for DeviceProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ddp" => Ok(DeviceProtocol::Ddp),
            "artnet" | "art-net" => Ok(DeviceProtocol::Artnet),
            other => Err(format!("unknown device protocol '{other}'")),
        }
    }
}

/// Transport to one physical panel.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceChannel: Send + Sync {
    /// Where datagrams are sent.
    fn address(&self) -> SocketAddr;

    fn protocol(&self) -> DeviceProtocol;

    /// Number of LEDs the channel frames per send.
    fn led_count(&self) -> usize;

    /// Sends one frame of packed `[R, G, B, ...]` bytes.
    ///
    /// Returns [`SendOutcome::Throttled`] when the frame arrives inside the
    /// channel's minimum send interval.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotConnected`] if the channel is closed,
    /// [`ChannelError::Transport`] if a datagram write fails. Nothing is
    /// retried.
    fn send_frame(&self, rgb: &[u8]) -> Result<SendOutcome, ChannelError>;

    /// Blanks the panel with repeated all-black frames.
    ///
    /// Blocks for the duration of the repeat sequence and ignores the rate
    /// limiter.
    ///
    /// # Errors
    ///
    /// A transport failure on one repeat does not stop the rest; the first
    /// such failure is returned once the sequence ends.
    /// [`ChannelError::NotConnected`] ends the sequence immediately.
    fn turn_off(&self) -> Result<(), ChannelError>;

    fn is_open(&self) -> bool;

    /// Releases the socket. Later sends fail with `NotConnected`.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_per_protocol() {
        assert_eq!(DeviceProtocol::Ddp.default_port(), 4048);
        assert_eq!(DeviceProtocol::Artnet.default_port(), 5568);
    }

    #[test]
    fn test_protocol_parses_both_spellings() {
        assert_eq!("DDP".parse::<DeviceProtocol>(), Ok(DeviceProtocol::Ddp));
        assert_eq!("art-net".parse::<DeviceProtocol>(), Ok(DeviceProtocol::Artnet));
        assert!("sacn".parse::<DeviceProtocol>().is_err());
    }

    #[test]
    fn test_channel_error_exposes_device_address() {
        // Arrange
        let addr: SocketAddr = "192.168.1.50:4048".parse().expect("addr");
        let err = ChannelError::Transport {
            addr,
            source: io::Error::new(io::ErrorKind::Other, "network unreachable"),
        };

        // Act / Assert
        assert_eq!(err.addr(), addr);
        assert!(err.to_string().contains("192.168.1.50:4048"));
        assert!(!err.is_not_connected());
        assert!(ChannelError::NotConnected { addr }.is_not_connected());
    }
}

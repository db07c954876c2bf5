//! # ledfx-core
//!
//! Shared library for LedFx containing the panel geometry model, per-panel
//! color buffers, and the two binary wire codecs used to drive LED matrix
//! panels over UDP.
//!
//! This crate has zero dependencies on network sockets, rendering loops, or
//! configuration files. Everything here is pure and can be tested without any
//! hardware attached.
//!
//! # Architecture overview
//!
//! LedFx drives one or more square LED matrix panels from a color buffer that
//! is recomputed every animation frame (60–120 Hz). Panels sit somewhere in a
//! shared "window" coordinate space; each panel cell covers `pixel_size ×
//! pixel_size` window pixels.
//!
//! - **`domain`** – The geometry of a layout (where each panel lives, how big
//!   its cells are) and the [`ColorBuffer`] holding one panel's pixels. The
//!   row-major serialization order used by every encoder is defined here.
//!
//! - **`protocol`** – How pixel bytes travel over the network. Two protocols
//!   are supported:
//!   - DDP, a pixel-streaming protocol that carries arbitrary-length streams
//!     split into 480-LED fragments with an explicit byte offset.
//!   - Art-Net OpDmx, a DMX-multiplexing protocol where each panel is
//!     addressed as its own universe and every pixel is re-ordered through a
//!     [`ColorMapping`].
//!
//! - **`pacing`** – The lock-free transport rate limiter and the
//!   "send it several times" helper used for best-effort turn-off over a
//!   lossy link.

pub mod domain;
pub mod pacing;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `ledfx_core::LayoutModel` instead of `ledfx_core::domain::geometry::LayoutModel`.
pub use domain::color::{ColorBuffer, Rgb};
pub use domain::geometry::{LayoutError, LayoutModel, PanelCell, PanelGeometry, PanelRegion};
pub use pacing::rate_limiter::RateLimiter;
pub use pacing::repeat::{send_repeated, RepeatPolicy};
pub use protocol::codec::ProtocolError;
pub use protocol::color_mapping::ColorMapping;
pub use protocol::sequence::FrameSequence;

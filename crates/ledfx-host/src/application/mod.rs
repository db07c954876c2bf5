//! Application layer for the LedFx host.
//!
//! This layer sits between the pure `ledfx_core` model and the OS-facing
//! adapters in `infrastructure`. It depends on the [`device::DeviceChannel`]
//! abstraction rather than on sockets, so the compositor can be exercised
//! with mock channels.
//!
//! # Sub-modules
//!
//! - **`device`** – The per-panel transport contract and its error type.
//!
//! - **`compositor`** – Owns the layout, one color buffer per panel and one
//!   channel per panel. Content writes colors in; `send_to_devices` pushes a
//!   frame out to every panel.
//!
//! - **`content`** – The contract content producers implement, plus the
//!   built-in test patterns used for hardware bring-up.

pub mod compositor;
pub mod content;
pub mod device;

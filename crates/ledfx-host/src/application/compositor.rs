//! Compositor: the LED grid a frame loop paints into.
//!
//! The compositor owns the [`LayoutModel`], one [`ColorBuffer`] per panel and
//! one [`DeviceChannel`] per panel, all indexed by the panel's position in the
//! layout. Content producers write colors through
//! [`set_color`](Compositor::set_color) or
//! [`set_window_color`](Compositor::set_window_color); the frame loop then
//! calls [`send_to_devices`](Compositor::send_to_devices) once per frame.
//!
//! # Failure model
//!
//! Panels are independent. A failure on one panel never prevents the others
//! from being sent, and the aggregate result is the AND of the per-panel
//! outcomes:
//!
//! - A transport failure (`ChannelError::Transport`) is logged with the device
//!   address and turns the frame's result into `Ok(false)`.
//! - A closed channel (`ChannelError::NotConnected`) is a caller bug. Every
//!   panel is still attempted, then the first such error is returned as `Err`.

use std::thread;

use ledfx_core::{ColorBuffer, LayoutModel, PanelCell, PanelGeometry, Rgb};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::application::device::{ChannelError, DeviceChannel, SendOutcome};

/// Errors raised while assembling a [`Compositor`].
#[derive(Debug, Error, PartialEq)]
pub enum CompositorError {
    /// Every panel needs exactly one channel.
    #[error("layout has {panels} panels but {channels} device channels were supplied")]
    ChannelCountMismatch { panels: usize, channels: usize },
}

pub struct Compositor {
    layout: LayoutModel,
    buffers: Vec<ColorBuffer>,
    channels: Vec<Box<dyn DeviceChannel>>,
    /// Reused serialization buffer so a frame does not allocate per panel.
    scratch: Vec<u8>,
}

impl Compositor {
    /// Builds a compositor with all-black buffers.
    ///
    /// `channels[i]` drives `layout.panels()[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`CompositorError::ChannelCountMismatch`] when the channel
    /// count differs from the panel count.
    pub fn new(
        layout: LayoutModel,
        channels: Vec<Box<dyn DeviceChannel>>,
    ) -> Result<Self, CompositorError> {
        if channels.len() != layout.panel_count() {
            return Err(CompositorError::ChannelCountMismatch {
                panels: layout.panel_count(),
                channels: channels.len(),
            });
        }
        let buffers: Vec<ColorBuffer> = layout
            .panels()
            .iter()
            .map(|p| ColorBuffer::new(p.grid_size))
            .collect();
        for (panel, channel) in layout.panels().iter().zip(&channels) {
            if channel.led_count() != panel.led_count() {
                warn!(
                    panel = %panel.id,
                    channel_leds = channel.led_count(),
                    panel_leds = panel.led_count(),
                    "device channel LED count differs from panel geometry"
                );
            }
        }
        let max_bytes = buffers.iter().map(|b| b.led_count() * 3).max().unwrap_or(0);
        info!(
            layout = layout.name(),
            panels = layout.panel_count(),
            "compositor ready"
        );
        Ok(Self {
            layout,
            buffers,
            channels,
            scratch: Vec::with_capacity(max_bytes),
        })
    }

    // ── Geometry queries ──────────────────────────────────────────────────────

    pub fn layout(&self) -> &LayoutModel {
        &self.layout
    }

    pub fn panel_count(&self) -> usize {
        self.layout.panel_count()
    }

    pub fn panel_geometry(&self, index: usize) -> Option<&PanelGeometry> {
        self.layout.panel(index)
    }

    pub fn panel_geometry_by_id(&self, id: &str) -> Option<&PanelGeometry> {
        self.layout.panel_by_id(id)
    }

    pub fn panel_index(&self, id: &str) -> Option<usize> {
        self.layout.panel_index(id)
    }

    /// Maps a window coordinate to a panel cell. First containing panel wins.
    pub fn window_to_panel_cell(&self, window_x: i32, window_y: i32) -> Option<PanelCell> {
        self.layout.locate(window_x, window_y)
    }

    // ── Buffer access ─────────────────────────────────────────────────────────

    /// Sets one cell. Out-of-range panel or cell coordinates are ignored.
    pub fn set_color(&mut self, panel: usize, x: usize, y: usize, color: Rgb) {
        if let Some(buf) = self.buffers.get_mut(panel) {
            buf.set(x, y, color);
        }
    }

    /// Sets the cell under a window coordinate. Points outside every panel
    /// are ignored.
    ///
    /// Returns the cell that was written, if any.
    pub fn set_window_color(&mut self, window_x: i32, window_y: i32, color: Rgb) -> Option<PanelCell> {
        let cell = self.layout.locate(window_x, window_y)?;
        self.set_color(cell.panel, cell.x, cell.y, color);
        Some(cell)
    }

    /// Reads one cell.
    pub fn color(&self, panel: usize, x: usize, y: usize) -> Option<Rgb> {
        self.buffers.get(panel).and_then(|b| b.get(x, y))
    }

    /// Fills one panel. Out-of-range panel indices are ignored.
    pub fn fill_panel(&mut self, panel: usize, color: Rgb) {
        if let Some(buf) = self.buffers.get_mut(panel) {
            buf.fill(color);
        }
    }

    pub fn clear_panel(&mut self, panel: usize) {
        if let Some(buf) = self.buffers.get_mut(panel) {
            buf.clear();
        }
    }

    pub fn clear_all(&mut self) {
        for buf in &mut self.buffers {
            buf.clear();
        }
    }

    /// Serialized bytes for `panel` exactly as they will be handed to its
    /// channel (row-major, mirror applied).
    pub fn panel_bytes(&self, panel: usize) -> Option<Vec<u8>> {
        let geom = self.layout.panel(panel)?;
        self.buffers.get(panel).map(|b| b.to_rgb_bytes(geom.mirror))
    }

    // ── Output ────────────────────────────────────────────────────────────────

    /// Sends the current buffers to every panel.
    ///
    /// Returns `Ok(true)` only if every panel's send succeeded (a throttled
    /// frame counts as success).
    ///
    /// # Errors
    ///
    /// Returns the first [`ChannelError::NotConnected`] after all panels have
    /// been attempted.
    pub fn send_to_devices(&mut self) -> Result<bool, ChannelError> {
        let mut all_ok = true;
        let mut precondition: Option<ChannelError> = None;

        for ((geom, buf), channel) in self
            .layout
            .panels()
            .iter()
            .zip(&self.buffers)
            .zip(&self.channels)
        {
            self.scratch.clear();
            buf.write_rgb(geom.mirror, &mut self.scratch);

            match channel.send_frame(&self.scratch) {
                Ok(SendOutcome::Sent { packets }) => {
                    trace!(panel = %geom.id, packets, "frame sent");
                }
                Ok(SendOutcome::Throttled) => {
                    trace!(panel = %geom.id, "frame throttled");
                }
                Err(e @ ChannelError::Transport { .. }) => {
                    error!(panel = %geom.id, addr = %e.addr(), "failed to send frame: {e}");
                    all_ok = false;
                }
                Err(e @ ChannelError::NotConnected { .. }) => {
                    warn!(panel = %geom.id, addr = %e.addr(), "send on closed channel");
                    all_ok = false;
                    precondition.get_or_insert(e);
                }
            }
        }

        match precondition {
            Some(e) => Err(e),
            None => Ok(all_ok),
        }
    }

    /// Runs every channel's turn-off sequence concurrently, one thread per
    /// panel, and waits for all of them.
    ///
    /// Returns `true` only if every panel was blanked without error.
    pub fn turn_off_all(&self) -> bool {
        info!(panels = self.channels.len(), "turning off all panels");
        let panels = self.layout.panels();
        thread::scope(|s| {
            let handles: Vec<_> = self
                .channels
                .iter()
                .map(|channel| s.spawn(move || channel.turn_off()))
                .collect();

            handles
                .into_iter()
                .zip(panels)
                .map(|(handle, geom)| match handle.join() {
                    Ok(Ok(())) => {
                        debug!(panel = %geom.id, "panel turned off");
                        true
                    }
                    Ok(Err(e)) => {
                        error!(panel = %geom.id, addr = %e.addr(), "turn-off failed: {e}");
                        false
                    }
                    Err(_) => {
                        error!(panel = %geom.id, "turn-off thread panicked");
                        false
                    }
                })
                .fold(true, |acc, ok| acc && ok)
        })
    }

    /// Closes every channel. Further sends fail with `NotConnected`.
    pub fn close(&self) {
        for channel in &self.channels {
            channel.close();
        }
        debug!("all device channels closed");
    }
}

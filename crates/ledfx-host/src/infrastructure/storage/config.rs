//! TOML layout files.
//!
//! A layout file names the window, the output pacing and every physical
//! panel:
//!
//! ```toml
//! [layout]
//! name = "TwoGrids"
//! window_width = 500
//! window_height = 400
//!
//! [output]
//! fps = 60
//! min_send_interval_ms = 8
//!
//! [[panels]]
//! id = "Grid01"
//! device_ip = "192.168.1.100"
//! x = 0
//! y = 0
//!
//! [[panels]]
//! id = "Grid02"
//! device_ip = "192.168.1.101"
//! protocol = "artnet"
//! color_mapping = "GBR"
//! x = 250
//! y = 0
//! mirror = true
//! ```
//!
//! Every field has a default, so the smallest useful file is a single
//! `[[panels]]` entry with a `device_ip`.
//!
//! [`LayoutFile::resolve`] validates the file and turns it into the
//! [`LayoutModel`] plus one [`ChannelSpec`] per panel.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ledfx_core::{ColorMapping, LayoutError, LayoutModel, PanelGeometry, PanelRegion, RepeatPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::device::DeviceProtocol;
use crate::infrastructure::network::{ChannelOptions, ChannelSpec};

/// Error type for layout file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing layout at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse layout TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The layout could not be serialized to TOML.
    #[error("failed to serialize layout: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file declares no panels.
    #[error("layout must declare at least one [[panels]] entry")]
    NoPanels,

    /// A panel's `device_ip` is not an IP address.
    #[error("panel {id}: invalid device_ip '{value}'")]
    InvalidAddress { id: String, value: String },

    /// The output cadence is zero.
    #[error("output.fps must be greater than zero")]
    ZeroFps,

    /// The panel list is structurally invalid (duplicate ids, zero sizes).
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level layout file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutFile {
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub panels: Vec<PanelEntry>,
}

/// Window and naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutSection {
    #[serde(default = "default_layout_name")]
    pub name: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Frame cadence and transport pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Frames rendered per second by the runner.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Minimum gap between two frames on one channel, in milliseconds.
    #[serde(default = "default_min_send_interval_ms")]
    pub min_send_interval_ms: u64,
    /// Black frames sent per panel on shutdown.
    #[serde(default = "default_turn_off_repeats")]
    pub turn_off_repeats: usize,
    /// Gap between the shutdown black frames, in milliseconds.
    #[serde(default = "default_turn_off_interval_ms")]
    pub turn_off_interval_ms: u64,
    /// `tracing` log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// One physical panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelEntry {
    #[serde(default = "default_panel_id")]
    pub id: String,
    #[serde(default = "default_device_ip")]
    pub device_ip: String,
    #[serde(default)]
    pub protocol: DeviceProtocol,
    /// Overrides the protocol's default UDP port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Art-Net universe. Defaults to the panel's position in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<u16>,
    /// Art-Net wire channel order. Defaults to GBR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mapping: Option<ColorMapping>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_panel_extent")]
    pub width: u32,
    #[serde(default = "default_panel_extent")]
    pub height: u32,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default = "default_pixel_size")]
    pub pixel_size: u32,
    /// Reverse each row when serializing.
    #[serde(default)]
    pub mirror: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_layout_name() -> String {
    "Unnamed".to_string()
}
fn default_title() -> String {
    "LedFx".to_string()
}
fn default_window_width() -> u32 {
    500
}
fn default_window_height() -> u32 {
    400
}
fn default_fps() -> u32 {
    60
}
fn default_min_send_interval_ms() -> u64 {
    8
}
fn default_turn_off_repeats() -> usize {
    RepeatPolicy::TURN_OFF.count
}
fn default_turn_off_interval_ms() -> u64 {
    RepeatPolicy::TURN_OFF.interval.as_millis() as u64
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_panel_id() -> String {
    "grid".to_string()
}
fn default_device_ip() -> String {
    "192.168.1.100".to_string()
}
fn default_panel_extent() -> u32 {
    240
}
fn default_grid_size() -> usize {
    16
}
fn default_pixel_size() -> u32 {
    15
}

/// Channel order Art-Net panels use when the file does not name one.
pub const DEFAULT_ARTNET_MAPPING: ColorMapping = ColorMapping::Gbr;

impl Default for LayoutFile {
    /// A single default panel, so a freshly saved file is immediately valid.
    fn default() -> Self {
        Self {
            layout: LayoutSection::default(),
            output: OutputConfig::default(),
            panels: vec![PanelEntry::default()],
        }
    }
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            name: default_layout_name(),
            title: default_title(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            min_send_interval_ms: default_min_send_interval_ms(),
            turn_off_repeats: default_turn_off_repeats(),
            turn_off_interval_ms: default_turn_off_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Default for PanelEntry {
    fn default() -> Self {
        Self {
            id: default_panel_id(),
            device_ip: default_device_ip(),
            protocol: DeviceProtocol::default(),
            port: None,
            universe: None,
            color_mapping: None,
            x: 0,
            y: 0,
            width: default_panel_extent(),
            height: default_panel_extent(),
            grid_size: default_grid_size(),
            pixel_size: default_pixel_size(),
            mirror: false,
        }
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// A validated layout file, ready to open channels and build a compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub layout: LayoutModel,
    /// `channels[i]` drives `layout.panels()[i]`.
    pub channels: Vec<ChannelSpec>,
    pub options: ChannelOptions,
    pub fps: u32,
}

impl OutputConfig {
    pub fn channel_options(&self) -> ChannelOptions {
        ChannelOptions {
            min_send_interval: Duration::from_millis(self.min_send_interval_ms),
            turn_off: RepeatPolicy::new(
                self.turn_off_repeats,
                Duration::from_millis(self.turn_off_interval_ms),
            ),
        }
    }
}

impl PanelEntry {
    fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .device_ip
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress {
                id: self.id.clone(),
                value: self.device_ip.clone(),
            })?;
        Ok(SocketAddr::new(ip, self.port.unwrap_or(self.protocol.default_port())))
    }
}

impl LayoutFile {
    /// Validates the file and builds the layout plus per-panel channel specs.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoPanels`] for an empty panel list.
    /// - [`ConfigError::ZeroFps`] for `output.fps = 0`.
    /// - [`ConfigError::InvalidAddress`] for an unparseable `device_ip`.
    /// - [`ConfigError::Layout`] for duplicate ids or zero grid/pixel sizes.
    pub fn resolve(&self) -> Result<ResolvedLayout, ConfigError> {
        if self.panels.is_empty() {
            return Err(ConfigError::NoPanels);
        }
        if self.output.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }

        let mut geometries = Vec::with_capacity(self.panels.len());
        let mut channels = Vec::with_capacity(self.panels.len());
        for (index, entry) in self.panels.iter().enumerate() {
            let address = entry.socket_addr()?;
            geometries.push(PanelGeometry {
                id: entry.id.clone(),
                address,
                region: PanelRegion::new(entry.x, entry.y, entry.width, entry.height),
                grid_size: entry.grid_size,
                pixel_size: entry.pixel_size,
                mirror: entry.mirror,
            });
            channels.push(ChannelSpec {
                panel_id: entry.id.clone(),
                protocol: entry.protocol,
                address,
                led_count: entry.grid_size * entry.grid_size,
                universe: entry.universe.unwrap_or(index as u16),
                color_mapping: entry.color_mapping.unwrap_or(DEFAULT_ARTNET_MAPPING),
            });
        }

        let layout = LayoutModel::new(
            self.layout.name.clone(),
            self.layout.title.clone(),
            self.layout.window_width,
            self.layout.window_height,
            geometries,
        )?;

        Ok(ResolvedLayout {
            layout,
            channels,
            options: self.output.channel_options(),
            fps: self.output.fps,
        })
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

/// Loads a layout file from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// does not exist) and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<LayoutFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &LayoutFile) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Panel geometry and window-to-cell coordinate mapping.
//!
//! The layout maintains a single 2D coordinate space ("window space") in which
//! every physical panel occupies a rectangle. A panel is a square grid of
//! `grid_size × grid_size` LEDs; each LED ("cell") covers `pixel_size ×
//! pixel_size` window pixels starting at the panel's top-left corner.
//!
//! Panels may overlap. When they do, the panel listed first wins.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur when building a [`LayoutModel`].
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    /// Two panels share the same identifier.
    #[error("duplicate panel id: {0}")]
    DuplicatePanelId(String),

    /// A panel was declared with `grid_size == 0` or `pixel_size == 0`.
    #[error("panel {id}: {field} must be greater than zero")]
    ZeroDimension { id: String, field: &'static str },
}

/// A rectangular region in window space.
///
/// `x` and `y` are the top-left corner; the region is half-open, so a point
/// at `x + width` lies outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PanelRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the rightmost X coordinate (exclusive).
    ///
    /// Widened to `i64`: a region may extend past `i32::MAX`.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Returns `true` if `(wx, wy)` lies inside this region.
    pub fn contains(&self, wx: i32, wy: i32) -> bool {
        let (wx, wy) = (i64::from(wx), i64::from(wy));
        wx >= i64::from(self.x) && wx < self.right() && wy >= i64::from(self.y) && wy < self.bottom()
    }
}

/// One physical LED matrix panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelGeometry {
    /// Identifier, unique within a layout (e.g. `"Grid01"`).
    pub id: String,
    /// Where the panel's controller listens for pixel data.
    pub address: SocketAddr,
    /// Placement in window space.
    pub region: PanelRegion,
    /// Logical resolution: the panel is `grid_size × grid_size` LEDs.
    pub grid_size: usize,
    /// Window pixels per logical cell, along each axis.
    pub pixel_size: u32,
    /// Sample each row right-to-left when serializing.
    pub mirror: bool,
}

impl PanelGeometry {
    /// Total LED count (`grid_size²`).
    pub fn led_count(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Maps a window point to this panel's cell, or `None` if the point is
    /// outside the panel.
    ///
    /// The cell index is `offset / pixel_size` on each axis, clamped to
    /// `[0, grid_size - 1]` so that a region wider than
    /// `grid_size * pixel_size` still resolves to the edge cell.
    pub fn cell_at(&self, wx: i32, wy: i32) -> Option<(usize, usize)> {
        if !self.region.contains(wx, wy) || self.grid_size == 0 || self.pixel_size == 0 {
            return None;
        }
        let max = self.grid_size - 1;
        let cell = |offset: i64| {
            // `contains` guarantees a non-negative offset below 2^32.
            let index = offset.unsigned_abs() / u64::from(self.pixel_size);
            usize::try_from(index).map_or(max, |i| i.min(max))
        };
        Some((
            cell(i64::from(wx) - i64::from(self.region.x)),
            cell(i64::from(wy) - i64::from(self.region.y)),
        ))
    }

    /// Window coordinates of the centre of cell `(cx, cy)`.
    pub fn cell_center(&self, cx: usize, cy: usize) -> (i32, i32) {
        let half = (self.pixel_size / 2) as i32;
        let ps = self.pixel_size as i32;
        (
            self.region.x + cx as i32 * ps + half,
            self.region.y + cy as i32 * ps + half,
        )
    }
}

/// A resolved window coordinate: which panel, and which cell on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelCell {
    /// Index of the panel in [`LayoutModel::panels`].
    pub panel: usize,
    pub x: usize,
    pub y: usize,
}

/// A named arrangement of panels inside a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutModel {
    name: String,
    title: String,
    window_width: u32,
    window_height: u32,
    panels: Vec<PanelGeometry>,
}

impl LayoutModel {
    /// Builds a layout, checking that panel ids are unique and that every
    /// panel has non-zero cell dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DuplicatePanelId`] for the first repeated id, or
    /// [`LayoutError::ZeroDimension`] for a degenerate panel.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        window_width: u32,
        window_height: u32,
        panels: Vec<PanelGeometry>,
    ) -> Result<Self, LayoutError> {
        let mut seen = HashSet::with_capacity(panels.len());
        for panel in &panels {
            if !seen.insert(panel.id.as_str()) {
                return Err(LayoutError::DuplicatePanelId(panel.id.clone()));
            }
            if panel.grid_size == 0 {
                return Err(LayoutError::ZeroDimension {
                    id: panel.id.clone(),
                    field: "grid_size",
                });
            }
            if panel.pixel_size == 0 {
                return Err(LayoutError::ZeroDimension {
                    id: panel.id.clone(),
                    field: "pixel_size",
                });
            }
        }
        Ok(Self {
            name: name.into(),
            title: title.into(),
            window_width,
            window_height,
            panels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Window dimensions as `(width, height)`.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn panels(&self) -> &[PanelGeometry] {
        &self.panels
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn panel(&self, index: usize) -> Option<&PanelGeometry> {
        self.panels.get(index)
    }

    /// Position of the panel with identifier `id`.
    pub fn panel_index(&self, id: &str) -> Option<usize> {
        self.panels.iter().position(|p| p.id == id)
    }

    pub fn panel_by_id(&self, id: &str) -> Option<&PanelGeometry> {
        self.panel_index(id).and_then(|i| self.panels.get(i))
    }

    /// Resolves a window coordinate to a panel cell.
    ///
    /// Panels are scanned in declaration order and the first containing
    /// panel wins. Returns `None` when the point is outside every panel.
    pub fn locate(&self, wx: i32, wy: i32) -> Option<PanelCell> {
        self.panels.iter().enumerate().find_map(|(panel, geom)| {
            geom.cell_at(wx, wy).map(|(x, y)| PanelCell { panel, x, y })
        })
    }
}

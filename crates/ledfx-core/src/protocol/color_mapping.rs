//! Channel-order permutations for LED strips that are not wired R-G-B.
//!
//! Many addressable LED chips expect their three colour bytes in an order
//! other than red, green, blue. A [`ColorMapping`] names the order the device
//! expects on the wire; [`ColorMapping::apply`] turns a canonical pixel into
//! those three wire bytes and [`ColorMapping::unmap`] reverses it.
//!
//! | mapping | wire 0 | wire 1 | wire 2 |
//! |---------|--------|--------|--------|
//! | RGB     | R      | G      | B      |
//! | BGR     | B      | G      | R      |
//! | GRB     | G      | R      | B      |
//! | RBG     | R      | B      | G      |
//! | BRG     | B      | R      | G      |
//! | GBR     | G      | B      | R      |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::color::Rgb;

/// Wire channel order for a panel.
///
/// There is no `Default`: the right order depends on the controller, and the
/// layout file supplies its own fallback for Art-Net panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorMapping {
    Rgb,
    Bgr,
    Grb,
    Rbg,
    Brg,
    Gbr,
}

impl ColorMapping {
    /// Every mapping, in declaration order.
    pub const ALL: [ColorMapping; 6] = [
        ColorMapping::Rgb,
        ColorMapping::Bgr,
        ColorMapping::Grb,
        ColorMapping::Rbg,
        ColorMapping::Brg,
        ColorMapping::Gbr,
    ];

    /// Source channel index (0 = R, 1 = G, 2 = B) feeding each wire position.
    const fn source_indices(self) -> [usize; 3] {
        match self {
            ColorMapping::Rgb => [0, 1, 2],
            ColorMapping::Bgr => [2, 1, 0],
            ColorMapping::Grb => [1, 0, 2],
            ColorMapping::Rbg => [0, 2, 1],
            ColorMapping::Brg => [2, 0, 1],
            ColorMapping::Gbr => [1, 2, 0],
        }
    }

    /// Returns the byte that belongs at `wire_position` for `pixel`.
    ///
    /// A position outside `0..3` falls back to the red channel rather than
    /// failing, so a miscomputed index produces a wrong colour, not a crash.
    pub fn map_channel(self, pixel: Rgb, wire_position: usize) -> u8 {
        self.map_channel_clamped(pixel.channels().map(i32::from), wire_position)
    }

    /// Like [`map_channel`](Self::map_channel) but for wide integer channel
    /// values, which are clamped to `0..=255`.
    pub fn map_channel_clamped(self, channels: [i32; 3], wire_position: usize) -> u8 {
        let source = self.source_indices().get(wire_position).copied().unwrap_or(0);
        channels[source].clamp(0, 255) as u8
    }

    /// Reorders a canonical pixel into wire order.
    pub fn apply(self, pixel: Rgb) -> [u8; 3] {
        [0, 1, 2].map(|position| self.map_channel(pixel, position))
    }

    /// Recovers the canonical pixel from three wire bytes.
    pub fn unmap(self, wire: [u8; 3]) -> Rgb {
        let idx = self.source_indices();
        let mut c = [0u8; 3];
        for (position, &source) in idx.iter().enumerate() {
            c[source] = wire[position];
        }
        Rgb::from(c)
    }

    /// Reorders a packed `[R, G, B, ...]` buffer into `out`.
    ///
    /// A trailing partial triplet is ignored.
    pub fn apply_slice(self, rgb: &[u8], out: &mut Vec<u8>) {
        out.reserve(rgb.len() - rgb.len() % 3);
        for px in rgb.chunks_exact(3) {
            out.extend_from_slice(&self.apply(Rgb::new(px[0], px[1], px[2])));
        }
    }

    /// Human-readable channel order, e.g. `"Green, Blue, Red"`.
    pub fn description(self) -> &'static str {
        match self {
            ColorMapping::Rgb => "Red, Green, Blue",
            ColorMapping::Bgr => "Blue, Green, Red",
            ColorMapping::Grb => "Green, Red, Blue",
            ColorMapping::Rbg => "Red, Blue, Green",
            ColorMapping::Brg => "Blue, Red, Green",
            ColorMapping::Gbr => "Green, Blue, Red",
        }
    }

    /// Upper-case short name, e.g. `"GBR"`.
    pub fn name(self) -> &'static str {
        match self {
            ColorMapping::Rgb => "RGB",
            ColorMapping::Bgr => "BGR",
            ColorMapping::Grb => "GRB",
            ColorMapping::Rbg => "RBG",
            ColorMapping::Brg => "BRG",
            ColorMapping::Gbr => "GBR",
        }
    }
}

impl fmt::Display for ColorMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown mapping name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color mapping '{0}' (expected one of RGB, BGR, GRB, RBG, BRG, GBR)")]
pub struct ParseColorMappingError(pub String);

impl FromStr for ColorMapping {
    type Err = ParseColorMappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorMapping::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseColorMappingError(s.to_string()))
    }
}

//! RGB pixels and per-panel color buffers.
//!
//! A [`ColorBuffer`] is addressed as `[x][y]`: `x` is the logical column,
//! `y` the logical row, with the origin in the top-left corner. Storage is an
//! implementation detail; what matters to the rest of the system is the
//! flattening order produced by [`ColorBuffer::write_rgb`]:
//!
//! ```text
//! index 0          -> (x = 0,     y = 0)      top-left
//! index N-1        -> (x = N-1,   y = 0)      top-right
//! index N*(N-1)    -> (x = 0,     y = N-1)    bottom-left
//! index N*N-1      -> (x = N-1,   y = N-1)    bottom-right
//! ```
//!
//! i.e. `index = y * N + x`. Both wire encoders and every content producer
//! assume this order.

/// A canonical (R, G, B) pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a pixel from arbitrary integers, clamping each channel to `0..=255`.
    ///
    /// Content producers frequently compute colors in wider integer types
    /// (additive blending, sine tables). Out-of-range values saturate rather
    /// than wrap.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        Self {
            r: r.clamp(0, 255) as u8,
            g: g.clamp(0, 255) as u8,
            b: b.clamp(0, 255) as u8,
        }
    }

    /// Returns the channels in canonical order `[R, G, B]`.
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Returns `true` if every channel is zero.
    pub const fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// A square `grid_size × grid_size` buffer of pixels for one panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorBuffer {
    grid_size: usize,
    /// Column-major storage so `cells[x * grid_size + y]` mirrors `[x][y]`.
    cells: Vec<Rgb>,
}

impl ColorBuffer {
    /// Creates an all-black buffer.
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            cells: vec![Rgb::BLACK; grid_size * grid_size],
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Number of LEDs represented by this buffer (`grid_size²`).
    pub fn led_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Sets the pixel at `(x, y)`.
    ///
    /// Returns `false` and leaves the buffer untouched when the coordinates
    /// are out of bounds. A single bad pixel must never abort a frame, so this
    /// is not an error.
    pub fn set(&mut self, x: usize, y: usize, color: Rgb) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = color;
                true
            }
            None => false,
        }
    }

    /// Sets every cell to `color`.
    pub fn fill(&mut self, color: Rgb) {
        self.cells.fill(color);
    }

    /// Sets every cell to black.
    pub fn clear(&mut self) {
        self.fill(Rgb::BLACK);
    }

    /// Appends the buffer to `out` as `[R, G, B, R, G, B, ...]` in row-major
    /// order.
    ///
    /// When `mirror` is set, each row is sampled right-to-left (column
    /// `N - 1 - x` is written at position `x`). This corrects panels whose
    /// wiring is physically reversed without touching the stored buffer.
    pub fn write_rgb(&self, mirror: bool, out: &mut Vec<u8>) {
        let n = self.grid_size;
        out.reserve(self.cells.len() * 3);
        for y in 0..n {
            for x in 0..n {
                let sample_x = if mirror { n - 1 - x } else { x };
                out.extend_from_slice(&self.cells[sample_x * n + y].channels());
            }
        }
    }

    /// Convenience wrapper around [`write_rgb`](Self::write_rgb) returning a
    /// fresh vector.
    pub fn to_rgb_bytes(&self, mirror: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cells.len() * 3);
        self.write_rgb(mirror, &mut out);
        out
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.grid_size && y < self.grid_size {
            Some(x * self.grid_size + y)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_clamped_saturates_out_of_range_channels() {
        let c = Rgb::clamped(300, -20, 128);
        assert_eq!(c, Rgb::new(255, 0, 128));
    }

    #[test]
    fn test_new_buffer_is_all_black() {
        let buf = ColorBuffer::new(4);
        assert_eq!(buf.led_count(), 16);
        assert!(buf.to_rgb_bytes(false).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_out_of_bounds_is_ignored() {
        // Arrange
        let mut buf = ColorBuffer::new(4);

        // Act
        let written = buf.set(4, 0, Rgb::RED);

        // Assert
        assert!(!written);
        assert_eq!(buf, ColorBuffer::new(4));
        assert_eq!(buf.get(0, 4), None);
    }

    #[test]
    fn test_write_rgb_is_row_major() {
        // Arrange – mark (1, 0) and (0, 1) with distinct colors on a 2x2 panel
        let mut buf = ColorBuffer::new(2);
        buf.set(1, 0, Rgb::RED);
        buf.set(0, 1, Rgb::BLUE);

        // Act
        let bytes = buf.to_rgb_bytes(false);

        // Assert – index 1 is (x=1, y=0); index 2 is (x=0, y=1)
        assert_eq!(&bytes[0..3], &[0, 0, 0]);
        assert_eq!(&bytes[3..6], &[255, 0, 0]);
        assert_eq!(&bytes[6..9], &[0, 0, 255]);
        assert_eq!(&bytes[9..12], &[0, 0, 0]);
    }

    #[test]
    fn test_write_rgb_mirror_reverses_each_row() {
        // Arrange
        let mut buf = ColorBuffer::new(3);
        buf.set(0, 0, Rgb::RED);
        buf.set(2, 2, Rgb::GREEN);

        // Act
        let bytes = buf.to_rgb_bytes(true);

        // Assert – (0,0) lands at the end of row 0, (2,2) at the start of row 2
        assert_eq!(&bytes[6..9], &[255, 0, 0]);
        assert_eq!(&bytes[18..21], &[0, 255, 0]);
        // Storage is unchanged by mirroring
        assert_eq!(buf.get(0, 0), Some(Rgb::RED));
    }

    #[test]
    fn test_clear_resets_every_cell() {
        let mut buf = ColorBuffer::new(3);
        buf.fill(Rgb::WHITE);
        buf.clear();
        assert!(buf.to_rgb_bytes(false).iter().all(|&b| b == 0));
    }
}

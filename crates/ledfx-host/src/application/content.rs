//! Content producers: whatever decides the colors for the next frame.
//!
//! A producer is handed the [`Compositor`] and the window size once per frame
//! and paints into it. It does not send; the frame loop calls
//! `send_to_devices` afterwards.
//!
//! The [`TestPattern`] producers here are for hardware bring-up: checking
//! that panels are addressed, oriented and color-mapped correctly before any
//! real animation is pointed at them.

use ledfx_core::Rgb;

use crate::application::compositor::Compositor;

/// Corner marker colors: top-left, top-right, bottom-left, bottom-right.
pub const CORNER_COLORS: [Rgb; 4] = [Rgb::RED, Rgb::GREEN, Rgb::BLUE, Rgb::new(255, 255, 0)];

pub trait FrameProducer: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Paints the next frame into `canvas`.
    fn render(&mut self, canvas: &mut Compositor, width: u32, height: u32);
}

/// Built-in diagnostic patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestPattern {
    /// One distinct color in each corner cell of every panel. Reveals
    /// rotation and mirroring mistakes at a glance.
    Corners,
    /// A single lit column moving left to right across window space, one
    /// window pixel per `step` per frame.
    Sweep { color: Rgb, step: u32, frame: u64 },
    /// Every cell the same color.
    Solid(Rgb),
    /// All black.
    Off,
}

impl TestPattern {
    pub fn sweep(color: Rgb, step: u32) -> Self {
        TestPattern::Sweep {
            color,
            step: step.max(1),
            frame: 0,
        }
    }
}

impl FrameProducer for TestPattern {
    fn name(&self) -> &str {
        match self {
            TestPattern::Corners => "corners",
            TestPattern::Sweep { .. } => "sweep",
            TestPattern::Solid(_) => "solid",
            TestPattern::Off => "off",
        }
    }

    fn render(&mut self, canvas: &mut Compositor, width: u32, _height: u32) {
        canvas.clear_all();
        match self {
            TestPattern::Corners => {
                for panel in 0..canvas.panel_count() {
                    let Some(max) = canvas.panel_geometry(panel).map(|g| g.grid_size - 1) else {
                        continue;
                    };
                    let corners = [(0, 0), (max, 0), (0, max), (max, max)];
                    for ((x, y), color) in corners.into_iter().zip(CORNER_COLORS) {
                        canvas.set_color(panel, x, y, color);
                    }
                }
            }
            TestPattern::Sweep { color, step, frame } => {
                let width = u64::from(width.max(1));
                let column = frame.wrapping_mul(u64::from(*step)) % width;
                *frame = frame.wrapping_add(1);
                // Columns past i32::MAX cannot hold a panel.
                let Ok(wx) = i32::try_from(column) else {
                    return;
                };
                for panel in 0..canvas.panel_count() {
                    let Some((grid, hit)) = canvas
                        .panel_geometry(panel)
                        .map(|g| (g.grid_size, g.cell_at(wx, g.region.y)))
                    else {
                        continue;
                    };
                    if let Some((cx, _)) = hit {
                        for cy in 0..grid {
                            canvas.set_color(panel, cx, cy, *color);
                        }
                    }
                }
            }
            TestPattern::Solid(color) => {
                for panel in 0..canvas.panel_count() {
                    canvas.fill_panel(panel, *color);
                }
            }
            TestPattern::Off => {}
        }
    }
}

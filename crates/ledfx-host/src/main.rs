//! LedFx host: headless frame runner.
//!
//! Loads a TOML layout, opens one UDP channel per panel (DDP or Art-Net),
//! then renders a built-in test pattern at a fixed cadence and pushes every
//! frame to the devices. On Ctrl-C each panel is sent a burst of black frames
//! before the sockets are closed.
//!
//! # Usage
//!
//! ```text
//! ledfx-host [OPTIONS]
//!
//! Options:
//!   --layout <PATH>        Layout file (TOML) [env: LEDFX_LAYOUT]
//!   --fps <N>              Override output.fps [env: LEDFX_FPS]
//!   --pattern <PATTERN>    corners | sweep | solid | off [default: corners]
//!   --color <R,G,B>        Color for sweep and solid [default: 255,255,255]
//!   --write-layout <PATH>  Write the effective layout to PATH and exit
//! ```
//!
//! Without `--layout` a single default panel is driven. The log level comes
//! from `RUST_LOG` when set, otherwise from the layout's `output.log_level`.

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ledfx_core::Rgb;
use ledfx_host::application::compositor::Compositor;
use ledfx_host::application::content::{FrameProducer, TestPattern};
use ledfx_host::infrastructure::network::open_channels;
use ledfx_host::infrastructure::storage::config::{load_config, save_config, LayoutFile};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Upper bound accepted for `--fps`.
const MAX_CLI_FPS: u32 = 1000;

/// Shortest frame period the loop will tick at, whatever the layout says.
const MIN_FRAME_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PatternArg {
    Corners,
    Sweep,
    Solid,
    Off,
}

/// Drives LED panels over DDP and Art-Net from a TOML layout.
#[derive(Debug, Parser)]
#[command(
    name = "ledfx-host",
    about = "Headless LED compositor for DDP and Art-Net panels",
    version
)]
struct Cli {
    /// Layout file. A missing file is an error; omit the flag to run the
    /// built-in single-panel layout.
    #[arg(long, env = "LEDFX_LAYOUT")]
    layout: Option<PathBuf>,

    /// Frames per second. Overrides `output.fps` from the layout.
    #[arg(long, env = "LEDFX_FPS", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_CLI_FPS)))]
    fps: Option<u32>,

    /// Test pattern to render.
    #[arg(long, value_enum, default_value_t = PatternArg::Corners)]
    pattern: PatternArg,

    /// Color used by `sweep` and `solid`, as `R,G,B`.
    #[arg(long, default_value = "255,255,255", value_parser = parse_rgb)]
    color: Rgb,

    /// Sweep speed in window pixels per frame.
    #[arg(long, default_value_t = 4)]
    sweep_step: u32,

    /// Write the effective layout (after `--fps`) to this path and exit.
    #[arg(long)]
    write_layout: Option<PathBuf>,
}

impl Cli {
    /// Loads the layout named by `--layout`, or the default one, and applies
    /// command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout file cannot be read or parsed.
    fn load_layout(&self) -> anyhow::Result<LayoutFile> {
        let mut file = match &self.layout {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load layout from {}", path.display()))?,
            None => LayoutFile::default(),
        };
        if let Some(fps) = self.fps {
            file.output.fps = fps;
        }
        Ok(file)
    }

    fn producer(&self) -> TestPattern {
        match self.pattern {
            PatternArg::Corners => TestPattern::Corners,
            PatternArg::Sweep => TestPattern::sweep(self.color, self.sweep_step),
            PatternArg::Solid => TestPattern::Solid(self.color),
            PatternArg::Off => TestPattern::Off,
        }
    }
}

/// Validates `file` and only then writes it to `path`, so an invalid layout
/// never reaches disk.
fn write_layout(path: &Path, file: &LayoutFile) -> anyhow::Result<()> {
    file.resolve().context("refusing to write an invalid layout")?;
    save_config(path, file)
        .with_context(|| format!("failed to write layout to {}", path.display()))
}

/// Tick period for `fps`, never shorter than [`MIN_FRAME_PERIOD`].
fn frame_period(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1))).max(MIN_FRAME_PERIOD)
}

fn parse_rgb(value: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B but got '{value}'"));
    };
    let channel = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| format!("color channel '{s}' is not in 0..=255"))
    };
    Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = cli.load_layout()?;

    // `RUST_LOG` wins over the layout's level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&file.output.log_level)),
        )
        .init();

    if let Some(path) = &cli.write_layout {
        write_layout(path, &file)?;
        info!(path = %path.display(), "layout written");
        return Ok(());
    }

    let resolved = file.resolve().context("invalid layout")?;
    info!(
        layout = resolved.layout.name(),
        panels = resolved.layout.panel_count(),
        fps = resolved.fps,
        "LedFx host starting"
    );
    for (panel, spec) in resolved.layout.panels().iter().zip(&resolved.channels) {
        info!(
            id = %panel.id,
            protocol = %spec.protocol,
            addr = %spec.address,
            leds = spec.led_count,
            "panel"
        );
    }

    let channels = open_channels(&resolved.channels, resolved.options)
        .context("failed to open device sockets")?;
    let (window_width, window_height) = resolved.layout.window_size();
    let mut compositor =
        Compositor::new(resolved.layout, channels).context("failed to build compositor")?;
    let mut producer = cli.producer();

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── Frame loop ────────────────────────────────────────────────────────────
    let mut ticker = tokio::time::interval(frame_period(resolved.fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(pattern = producer.name(), "running; press Ctrl-C to stop");
    let mut frames: u64 = 0;
    while running.load(Ordering::Relaxed) {
        ticker.tick().await;
        producer.render(&mut compositor, window_width, window_height);
        match compositor.send_to_devices() {
            Ok(true) => {}
            Ok(false) => debug!(frame = frames, "frame partially delivered"),
            Err(e) => warn!(frame = frames, "frame not delivered: {e}"),
        }
        frames = frames.wrapping_add(1);
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    // The black-frame burst sleeps between sends, so keep it off the runtime.
    let all_dark = tokio::task::spawn_blocking(move || {
        let ok = compositor.turn_off_all();
        compositor.close();
        ok
    })
    .await
    .context("turn-off task failed")?;

    if all_dark {
        info!(frames, "LedFx host stopped");
    } else {
        error!(frames, "some panels may still be lit");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

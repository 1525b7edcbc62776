//! softpipe demo: a spinning cube pierced by translucent panels
//!
//! Opens a window by default; `--snapshot` renders headless to a PNG.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod scene;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use macroquad::prelude::Conf;
use softpipe::config::{load_config, save_config, DemoConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "softpipe", version, about)]
struct Cli {
    /// RON config file; defaults are used if it does not exist
    #[arg(long, default_value = "softpipe.ron")]
    config: PathBuf,

    /// Render headless and write the final frame to this PNG
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Frames to simulate before a snapshot
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Write the effective config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

/// Window size in pixels for one axis, saturating instead of overflowing
fn window_extent(pixels: usize, scale: u32) -> i32 {
    let pixels = u32::try_from(pixels).unwrap_or(u32::MAX);
    pixels.saturating_mul(scale).min(i32::MAX as u32) as i32
}

fn window_conf(config: &DemoConfig) -> Conf {
    Conf {
        window_title: format!("softpipe v{}", VERSION),
        window_width: window_extent(config.width, config.window_scale),
        window_height: window_extent(config.height, config.window_scale),
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn run(cli: Cli) -> softpipe::Result<()> {
    let config = load_config(&cli.config)?;

    if let Some(path) = &cli.write_config {
        save_config(&config, path)?;
        tracing::info!(path = %path.display(), "config written");
        return Ok(());
    }

    if let Some(path) = &cli.snapshot {
        return app::snapshot(config, cli.frames, path);
    }

    tracing::info!(width = config.width, height = config.height, "opening window");
    macroquad::Window::from_config(window_conf(&config), app::run(config));
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_extent_scales() {
        assert_eq!(window_extent(320, 3), 960);
    }

    #[test]
    fn test_window_extent_saturates() {
        assert_eq!(window_extent(u16::MAX as usize, u32::MAX), i32::MAX);
        assert_eq!(window_extent(usize::MAX, 2), i32::MAX);
    }
}

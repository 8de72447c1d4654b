//! Fills the holes of a synthetic heatmap and prints per-tile statistics.
//!
//! Usage: `cargo run --example fill_heatmap [config.json]`
//! Set `RUST_LOG=debug` to see the dispatch logs.

use eyre::{Result, WrapErr};
use heatmap_interpolation::color::{pack, MAX_SEED};
use heatmap_interpolation::{HeatmapInterpolator, InterpolatorConfig};
use rand::Rng;
use tracing::info;

const WIDTH: u32 = 256;
const HEIGHT: u32 = 128;

fn synthetic_heatmap(rng: &mut impl Rng) -> Vec<u32> {
    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            // Sparse sensor grid: most cells carry no sample.
            if rng.random_bool(0.7) {
                pixels.push(0);
                continue;
            }
            let t = ((x as f32 / WIDTH as f32) * 0.5 + (y as f32 / HEIGHT as f32) * 0.5).clamp(0.0, 1.0);
            let r = (t * 255.0) as u8;
            pixels.push(pack(r, 0, 255 - r, 255));
        }
    }
    // A block with no samples at all.
    for y in 0..16 {
        for x in 0..16 {
            pixels[(y * WIDTH + x) as usize] = 0;
        }
    }
    pixels
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => InterpolatorConfig::from_path(path)?,
        None => InterpolatorConfig::default().with_debug(true),
    };
    let interp = HeatmapInterpolator::new(config).wrap_err("failed to build interpolator")?;

    let mut rng = rand::rng();
    let pixels = synthetic_heatmap(&mut rng);
    let out = interp
        .interpolate(&pixels, WIDTH, HEIGHT)
        .wrap_err("interpolation failed")?;

    let defaulted = out.pixels.iter().filter(|&&p| p == MAX_SEED).count();
    info!(
        backend = interp.backend_name(),
        tiles = out.tiles,
        missing = out.missing_count,
        defaulted,
        "heatmap filled"
    );

    if let Some(counts) = &out.debug_counts {
        let empty = counts.iter().filter(|&&c| c == interp.tile().area()).count();
        let max = counts.iter().copied().max().unwrap_or(0);
        info!(tiles_without_data = empty, max_missing_per_tile = max, "debug counts");
    }
    Ok(())
}

//! heatmap_interpolation: tiled gap filling for image-based heatmaps.
//!
//! Missing pixels (value `0`) are replaced with the highest-luminance color
//! found in their tile. Tiles are processed independently on a rayon pool,
//! or on the GPU with the `gpu` feature.

pub mod color;
pub mod config;
pub mod data_types;
pub mod error;
pub mod interpolator;
pub mod kernel;
pub mod tiling;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use config::{Backend, InterpolatorConfig};
pub use data_types::{InterpolationOutput, Params, TileSize};
pub use error::InterpolationError;
pub use interpolator::HeatmapInterpolator;
pub use kernel::{CpuKernel, InterpolationKernel};

// Host-side entry point: validates inputs, owns the debug buffer and hands
// the pixel data to the configured kernel backend.

use crate::config::{Backend, InterpolatorConfig};
use crate::data_types::{InterpolationOutput, Params, TileSize};
use crate::error::InterpolationError;
use crate::kernel::{CpuKernel, InterpolationKernel};
use crate::tiling::TileGrid;
use parking_lot::Mutex;
use std::sync::atomic::AtomicU64;
use tracing::{debug, info};

pub struct HeatmapInterpolator {
    config: InterpolatorConfig,
    kernel: Box<dyn InterpolationKernel + Send + Sync>,
    /// One count per tile of the last debug dispatch. Left as-is by
    /// non-debug dispatches.
    debug_buffer: Mutex<Vec<u32>>,
}

impl HeatmapInterpolator {
    pub fn new(config: InterpolatorConfig) -> Result<Self, InterpolationError> {
        config.check()?;
        let tile = config.tile;

        let kernel: Box<dyn InterpolationKernel + Send + Sync> = match config.backend {
            Backend::Cpu => Box::new(build_cpu_kernel(&config)?),
            Backend::Gpu => build_gpu_kernel(tile)?,
        };
        info!(backend = kernel.name(), %tile, debug = config.debug, "heatmap interpolator ready");

        Ok(Self {
            config,
            kernel,
            debug_buffer: Mutex::new(Vec::new()),
        })
    }

    /// Uses an already constructed kernel, e.g. a shared [`crate::gpu::GpuKernel`].
    pub fn with_kernel(
        config: InterpolatorConfig,
        kernel: Box<dyn InterpolationKernel + Send + Sync>,
    ) -> Self {
        let config = InterpolatorConfig {
            tile: kernel.tile(),
            ..config
        };
        Self {
            config,
            kernel,
            debug_buffer: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.kernel.name()
    }

    pub fn tile(&self) -> TileSize {
        self.kernel.tile()
    }

    /// Snapshot of the debug buffer.
    pub fn debug_buffer(&self) -> Vec<u32> {
        self.debug_buffer.lock().clone()
    }

    /// Fills the missing pixels of a row-major `width x height` image.
    pub fn interpolate(
        &self,
        pixels: &[u32],
        width: u32,
        height: u32,
    ) -> Result<InterpolationOutput, InterpolationError> {
        let params = Params::new(width, height).with_debug(self.config.debug);
        check_len(pixels, &params)?;
        if params.pixel_count() == 0 {
            return Ok(InterpolationOutput::empty(width, height));
        }

        let mut result = vec![0u32; pixels.len()];
        let missing_count = self.run(pixels, &params, &mut result)?;
        let tiles = TileGrid::new(width, height, self.tile()).tile_count();

        Ok(InterpolationOutput {
            pixels: result,
            width,
            height,
            missing_count,
            tiles,
            debug_counts: params.debug.then(|| self.debug_buffer()),
        })
    }

    /// Like [`interpolate`](Self::interpolate) but writes the result back
    /// into `pixels`. Returns the number of filled pixels.
    pub fn interpolate_in_place(
        &self,
        pixels: &mut [u32],
        width: u32,
        height: u32,
    ) -> Result<u64, InterpolationError> {
        let params = Params::new(width, height).with_debug(self.config.debug);
        check_len(pixels, &params)?;
        if params.pixel_count() == 0 {
            return Ok(0);
        }

        let mut result = vec![0u32; pixels.len()];
        let missing_count = self.run(pixels, &params, &mut result)?;
        pixels.copy_from_slice(&result);
        Ok(missing_count)
    }

    fn run(&self, src: &[u32], params: &Params, result: &mut [u32]) -> Result<u64, InterpolationError> {
        let grid = TileGrid::new(params.width, params.height, self.tile());
        let missing_total = AtomicU64::new(0);

        debug!(
            backend = self.kernel.name(),
            width = params.width,
            height = params.height,
            tiles = grid.tile_count(),
            "dispatching heatmap interpolation"
        );

        if params.debug {
            let mut debug_buffer = self.debug_buffer.lock();
            debug_buffer.resize(grid.tile_count(), 0);
            self.kernel
                .dispatch(src, params, result, &missing_total, Some(debug_buffer.as_mut_slice()))?;
        } else {
            self.kernel.dispatch(src, params, result, &missing_total, None)?;
        }

        let missing = missing_total.into_inner();
        debug!(missing, "heatmap interpolation done");
        Ok(missing)
    }
}

fn check_len(pixels: &[u32], params: &Params) -> Result<(), InterpolationError> {
    let expected = params.pixel_count();
    if pixels.len() != expected {
        return Err(InterpolationError::BufferSizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

fn build_cpu_kernel(config: &InterpolatorConfig) -> Result<CpuKernel, InterpolationError> {
    let kernel = CpuKernel::new(config.tile)?.with_sub_tile_parallelism(config.sub_tile_parallelism);
    match config.threads {
        Some(threads) => kernel.with_threads(threads),
        None => Ok(kernel),
    }
}

#[cfg(feature = "gpu")]
fn build_gpu_kernel(tile: TileSize) -> Result<Box<dyn InterpolationKernel + Send + Sync>, InterpolationError> {
    let gpu = std::sync::Arc::new(crate::gpu::GpuDevice::new()?);
    Ok(Box::new(crate::gpu::GpuKernel::new(gpu, tile)?))
}

#[cfg(not(feature = "gpu"))]
fn build_gpu_kernel(_tile: TileSize) -> Result<Box<dyn InterpolationKernel + Send + Sync>, InterpolationError> {
    Err(InterpolationError::BackendUnavailable("gpu"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_buffer() {
        let interp = HeatmapInterpolator::new(InterpolatorConfig::default()).unwrap();
        let err = interp.interpolate(&[1, 2, 3], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            InterpolationError::BufferSizeMismatch { expected: 4, actual: 3 }
        ));
    }

    #[test]
    fn test_rejects_zero_tile() {
        let config = InterpolatorConfig::default().with_tile(0, 4);
        assert!(matches!(
            HeatmapInterpolator::new(config),
            Err(InterpolationError::InvalidTileSize { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_rejects_zero_threads() {
        let config = InterpolatorConfig::default().with_threads(0);
        assert!(matches!(
            HeatmapInterpolator::new(config),
            Err(InterpolationError::ThreadPool(_))
        ));
    }

    #[test]
    fn test_debug_buffer_untouched_without_debug() {
        let debug_cfg = InterpolatorConfig::default().with_tile(2, 2).with_debug(true);
        let interp = HeatmapInterpolator::new(debug_cfg).unwrap();
        interp.interpolate(&[0, 5, 0, 0], 2, 2).unwrap();
        assert_eq!(interp.debug_buffer(), vec![3]);

        let quiet = HeatmapInterpolator::with_kernel(
            InterpolatorConfig::default(),
            Box::new(CpuKernel::new(TileSize::new(2, 2)).unwrap()),
        );
        let out = quiet.interpolate(&[0, 5, 0, 0], 2, 2).unwrap();
        assert!(out.debug_counts.is_none());
        assert!(quiet.debug_buffer().is_empty());
    }

    #[test]
    fn test_empty_image() {
        let interp = HeatmapInterpolator::new(InterpolatorConfig::default()).unwrap();
        let out = interp.interpolate(&[], 0, 10).unwrap();
        assert!(out.pixels.is_empty());
        assert_eq!(out.missing_count, 0);
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn test_gpu_backend_requires_feature() {
        let config = InterpolatorConfig::default().with_backend(Backend::Gpu);
        assert!(matches!(
            HeatmapInterpolator::new(config),
            Err(InterpolationError::BackendUnavailable("gpu"))
        ));
    }
}

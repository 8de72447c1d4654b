// Errors raised by the host side of a dispatch. The kernels themselves
// cannot fail once their inputs have been validated.

use std::fmt;

#[cfg(feature = "gpu")]
use crate::gpu::device::GpuError;

#[derive(Debug)]
pub enum InterpolationError {
    /// `pixels.len()` does not equal `width * height`.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// A tile dimension is zero, or the tile area overflows `u32`.
    InvalidTileSize { width: u32, height: u32 },
    /// Tile area exceeds the backend's invocations-per-workgroup limit.
    TileTooLarge { area: u32, max: u32 },
    /// One tile dimension exceeds the backend's per-axis workgroup size.
    TileDimensionTooLarge { axis: char, size: u32, max: u32 },
    /// The dedicated rayon pool could not be built.
    ThreadPool(String),
    /// The requested backend was not compiled in.
    BackendUnavailable(&'static str),
    #[cfg(feature = "gpu")]
    Gpu(GpuError),
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "pixel buffer holds {actual} values but the image needs {expected}"
            ),
            InterpolationError::InvalidTileSize { width, height } => {
                write!(f, "invalid tile size {width}x{height}")
            }
            InterpolationError::TileTooLarge { area, max } => write!(
                f,
                "tile area {area} exceeds the workgroup limit of {max} invocations"
            ),
            InterpolationError::TileDimensionTooLarge { axis, size, max } => write!(
                f,
                "tile {axis} dimension {size} exceeds the workgroup size limit of {max}"
            ),
            InterpolationError::ThreadPool(msg) => write!(f, "thread pool: {msg}"),
            InterpolationError::BackendUnavailable(name) => {
                write!(f, "the {name} backend is not enabled in this build")
            }
            #[cfg(feature = "gpu")]
            InterpolationError::Gpu(e) => write!(f, "gpu: {e}"),
        }
    }
}

impl std::error::Error for InterpolationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "gpu")]
            InterpolationError::Gpu(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "gpu")]
impl From<GpuError> for InterpolationError {
    fn from(e: GpuError) -> Self {
        InterpolationError::Gpu(e)
    }
}

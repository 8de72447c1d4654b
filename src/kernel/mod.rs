pub mod cpu;
pub mod workgroup;

pub use cpu::CpuKernel;
pub use workgroup::WorkgroupState;

use crate::data_types::{Params, TileSize};
use crate::error::InterpolationError;
use std::sync::atomic::AtomicU64;

/// A backend able to run the tiled interpolation pass.
///
/// Callers guarantee that `src` and `result` both hold exactly
/// `params.width * params.height` values and, when `debug` is given, that
/// it holds one entry per tile. Each tile's missing count is added to
/// `missing_total` once.
pub trait InterpolationKernel {
    fn name(&self) -> &'static str;

    fn tile(&self) -> TileSize;

    fn dispatch(
        &self,
        src: &[u32],
        params: &Params,
        result: &mut [u32],
        missing_total: &AtomicU64,
        debug: Option<&mut [u32]>,
    ) -> Result<(), InterpolationError>;
}

//! Thread-pool rendition of the tiled interpolation kernel.
//!
//! The workgroup barrier becomes a join point between two rayon stages:
//!
//! 1. one task per tile runs phase 1 and produces its [`WorkgroupState`];
//! 2. one task per band (a row of tiles) copies the raw source rows into the
//!    result, then writes each tile's fill color over its missing pixels.
//!
//! Bands are disjoint `par_chunks_mut` slices of the result buffer, so no
//! two tasks ever write the same index.

use super::workgroup::WorkgroupState;
use super::InterpolationKernel;
use crate::data_types::{Params, TileSize};
use crate::error::InterpolationError;
use crate::tiling::TileGrid;
use glam::UVec2;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub struct CpuKernel {
    tile: TileSize,
    sub_tile_parallelism: bool,
    pool: Option<rayon::ThreadPool>,
}

impl CpuKernel {
    pub fn new(tile: TileSize) -> Result<Self, InterpolationError> {
        tile.validate()?;
        Ok(Self {
            tile,
            sub_tile_parallelism: false,
            pool: None,
        })
    }

    /// Run phase 1 of each tile across its lanes in parallel as well.
    pub fn with_sub_tile_parallelism(mut self, enabled: bool) -> Self {
        self.sub_tile_parallelism = enabled;
        self
    }

    /// Run on a dedicated pool of `threads` workers instead of the global one.
    pub fn with_threads(mut self, threads: usize) -> Result<Self, InterpolationError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("heatmap-interp-{i}"))
            .build()
            .map_err(|e| InterpolationError::ThreadPool(e.to_string()))?;
        self.pool = Some(pool);
        Ok(self)
    }

    /// Infallible body of [`InterpolationKernel::dispatch`].
    pub fn run(
        &self,
        src: &[u32],
        params: &Params,
        result: &mut [u32],
        missing_total: &AtomicU64,
        debug: Option<&mut [u32]>,
    ) {
        if params.width == 0 || params.height == 0 {
            return;
        }
        debug_assert_eq!(src.len(), params.pixel_count());
        debug_assert_eq!(result.len(), params.pixel_count());

        let grid = TileGrid::new(params.width, params.height, self.tile);
        match &self.pool {
            Some(pool) => pool.install(|| self.run_stages(&grid, src, result, missing_total, debug)),
            None => self.run_stages(&grid, src, result, missing_total, debug),
        }
    }

    fn run_stages(
        &self,
        grid: &TileGrid,
        src: &[u32],
        result: &mut [u32],
        missing_total: &AtomicU64,
        debug: Option<&mut [u32]>,
    ) {
        let states: Vec<WorkgroupState> = (0..grid.tile_count())
            .into_par_iter()
            .map(|i| self.scan_tile(grid, grid.tile_id(i), src))
            .collect();

        // Join point: every phase-1 write is visible from here on.

        let band_len = grid.band_len();
        let tiles_x = grid.dispatch_size().x as usize;
        result
            .par_chunks_mut(band_len)
            .zip(src.par_chunks(band_len))
            .zip(states.par_chunks(tiles_x))
            .enumerate()
            .for_each(|(ty, ((band, src_band), row))| {
                band.copy_from_slice(src_band);
                let band_start = ty * band_len;
                for (tx, state) in row.iter().enumerate() {
                    let id = UVec2::new(tx as u32, ty as u32);
                    fill_tile(grid, id, state, band, band_start);
                    missing_total.fetch_add(state.missing_len() as u64, Ordering::Relaxed);
                }
            });

        if let Some(debug) = debug {
            for (slot, state) in debug.iter_mut().zip(&states) {
                *slot = state.missing_len();
            }
            let degenerate = states.iter().filter(|s| s.is_empty()).count();
            if degenerate > 0 {
                debug!(degenerate, "tiles without data filled with the default color");
            }
        }
    }

    /// Phase 1 for every in-image lane of one tile. Overhanging lanes would
    /// do nothing, so they are never spawned.
    fn scan_tile(&self, grid: &TileGrid, id: UVec2, src: &[u32]) -> WorkgroupState {
        let extent = grid.tile_extent(id);
        let state = WorkgroupState::new(self.tile, extent);
        let observe = |lane: u32| {
            let local = UVec2::new(lane % extent.x, lane / extent.x);
            if let Some(idx) = grid.global_index(id, local) {
                state.observe(local, src[idx]);
            }
        };

        let lanes = 0..extent.x * extent.y;
        if self.sub_tile_parallelism {
            lanes.into_par_iter().for_each(observe);
        } else {
            lanes.for_each(observe);
        }
        state
    }
}

/// Phase 2 for one tile, writing into the band that contains it.
fn fill_tile(grid: &TileGrid, id: UVec2, state: &WorkgroupState, band: &mut [u32], band_start: usize) {
    let n = state.missing_len();
    if n == 0 {
        return;
    }
    let fill = state.local_max();
    // With at most `area` entries, entry i belongs to lane i.
    for lane in 0..n.min(grid.tile.area()) {
        for local in state.claimed_by(lane) {
            if let Some(idx) = grid.global_index(id, local) {
                band[idx - band_start] = fill;
            }
        }
    }
}

impl InterpolationKernel for CpuKernel {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn tile(&self) -> TileSize {
        self.tile
    }

    fn dispatch(
        &self,
        src: &[u32],
        params: &Params,
        result: &mut [u32],
        missing_total: &AtomicU64,
        debug: Option<&mut [u32]>,
    ) -> Result<(), InterpolationError> {
        self.run(src, params, result, missing_total, debug);
        Ok(())
    }
}

//! Per-tile scratch state shared by the lanes of one workgroup.
//!
//! Every field is atomic so that phase 1 can be driven from several threads
//! through `&self`. Only the missing-list length is a true atomic counter.
//! The min/max trackers use plain relaxed load/compare/store, so concurrent
//! lanes may overwrite each other's extreme. The result is a best-effort
//! extreme, not an exact reduction.
//!
//! The missing list holds one slot per in-image pixel of the tile, so an
//! oversized tile on a small image costs only what the image covers.

use crate::color::{is_missing, luminance, MAX_SEED, MIN_SEED};
use crate::data_types::TileSize;
use glam::UVec2;
use std::sync::atomic::{AtomicU32, Ordering};

pub struct WorkgroupState {
    tile: TileSize,
    /// In-image part of the tile, see [`crate::tiling::TileGrid::tile_extent`].
    extent: UVec2,
    /// Tile-local linear positions (`y * extent.x + x`) of missing pixels.
    missing: Box<[AtomicU32]>,
    missing_len: AtomicU32,
    local_min: AtomicU32,
    local_max: AtomicU32,
    // f32 bit patterns
    min_luma: AtomicU32,
    max_luma: AtomicU32,
}

impl WorkgroupState {
    pub fn new(tile: TileSize, extent: UVec2) -> Self {
        debug_assert!(extent.x <= tile.width && extent.y <= tile.height);
        let missing = (0..extent.x * extent.y).map(|_| AtomicU32::new(0)).collect();
        Self {
            tile,
            extent,
            missing,
            missing_len: AtomicU32::new(0),
            local_min: AtomicU32::new(MIN_SEED),
            local_max: AtomicU32::new(MAX_SEED),
            min_luma: AtomicU32::new(f32::INFINITY.to_bits()),
            max_luma: AtomicU32::new(f32::NEG_INFINITY.to_bits()),
        }
    }

    /// Phase 1 for a single in-bounds pixel (`local < extent`).
    #[inline]
    pub fn observe(&self, local: UVec2, pixel: u32) {
        if is_missing(pixel) {
            let slot = self.missing_len.fetch_add(1, Ordering::Relaxed) as usize;
            self.missing[slot].store(local.y * self.extent.x + local.x, Ordering::Relaxed);
            return;
        }

        let luma = luminance(pixel);
        if luma > f32::from_bits(self.max_luma.load(Ordering::Relaxed)) {
            self.max_luma.store(luma.to_bits(), Ordering::Relaxed);
            self.local_max.store(pixel, Ordering::Relaxed);
        }
        if luma < f32::from_bits(self.min_luma.load(Ordering::Relaxed)) {
            self.min_luma.store(luma.to_bits(), Ordering::Relaxed);
            self.local_min.store(pixel, Ordering::Relaxed);
        }
    }

    pub fn missing_len(&self) -> u32 {
        self.missing_len.load(Ordering::Acquire)
    }

    /// Missing entry `i`, as a tile-local coordinate.
    pub fn missing_at(&self, i: u32) -> UVec2 {
        let packed = self.missing[i as usize].load(Ordering::Relaxed);
        UVec2::new(packed % self.extent.x, packed / self.extent.x)
    }

    /// Entries claimed by `lane` in phase 2: `lane, lane + area, ...`.
    pub fn claimed_by(&self, lane: u32) -> impl Iterator<Item = UVec2> + '_ {
        let n = self.missing_len();
        (lane..n)
            .step_by(self.tile.area() as usize)
            .map(move |i| self.missing_at(i))
    }

    pub fn local_min(&self) -> u32 {
        self.local_min.load(Ordering::Relaxed)
    }

    /// Fill color for the missing pixels of this tile.
    pub fn local_max(&self) -> u32 {
        self.local_max.load(Ordering::Relaxed)
    }

    /// True when no non-missing pixel was observed.
    pub fn is_empty(&self) -> bool {
        f32::from_bits(self.max_luma.load(Ordering::Relaxed)) == f32::NEG_INFINITY
    }
}

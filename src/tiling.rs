//! Partitioning of an image into fixed-size tiles.
//!
//! The grid always covers the whole image: the tile count per axis is the
//! ceiling of `image / tile`, so the right-most column and bottom row of
//! tiles may overhang the image. Positions in the overhang are rejected by
//! [`TileGrid::global_index`].

use crate::data_types::TileSize;
use glam::UVec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub tile: TileSize,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, tile: TileSize) -> Self {
        debug_assert!(tile.is_valid(), "tile size {tile} must be validated before tiling");
        Self {
            width,
            height,
            tile,
        }
    }

    /// Number of tiles along each axis.
    pub fn dispatch_size(&self) -> UVec2 {
        UVec2::new(
            self.width.div_ceil(self.tile.width),
            self.height.div_ceil(self.tile.height),
        )
    }

    pub fn tile_count(&self) -> usize {
        let d = self.dispatch_size();
        d.x as usize * d.y as usize
    }

    /// Top-left pixel of a tile.
    pub fn tile_origin(&self, id: UVec2) -> UVec2 {
        id * UVec2::new(self.tile.width, self.tile.height)
    }

    /// Part of a tile that lies inside the image: `min(tile, image - origin)`.
    /// Phase 1 never sees more pixels than this.
    pub fn tile_extent(&self, id: UVec2) -> UVec2 {
        let origin = self.tile_origin(id);
        UVec2::new(
            self.tile.width.min(self.width.saturating_sub(origin.x)),
            self.tile.height.min(self.height.saturating_sub(origin.y)),
        )
    }

    /// Row-major tile index, matching the debug buffer layout.
    pub fn linear_index(&self, id: UVec2) -> usize {
        id.y as usize * self.dispatch_size().x as usize + id.x as usize
    }

    pub fn tile_id(&self, linear: usize) -> UVec2 {
        let tiles_x = self.dispatch_size().x as usize;
        UVec2::new((linear % tiles_x) as u32, (linear / tiles_x) as u32)
    }

    /// Buffer index of a tile-local position, or `None` when it falls
    /// outside the image.
    #[inline(always)]
    pub fn global_index(&self, id: UVec2, local: UVec2) -> Option<usize> {
        let p = self.tile_origin(id) + local;
        if p.x >= self.width || p.y >= self.height {
            return None;
        }
        Some(p.y as usize * self.width as usize + p.x as usize)
    }

    /// Tile-local position of lane `lane` (row-major within the tile).
    #[inline(always)]
    pub fn lane_position(&self, lane: u32) -> UVec2 {
        UVec2::new(lane % self.tile.width, lane / self.tile.width)
    }

    /// Pixels in one full row of tiles. The last band may be shorter.
    pub fn band_len(&self) -> usize {
        self.tile.height as usize * self.width as usize
    }

    /// All tile ids in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = UVec2> {
        let d = self.dispatch_size();
        (0..d.y).flat_map(move |y| (0..d.x).map(move |x| UVec2::new(x, y)))
    }
}

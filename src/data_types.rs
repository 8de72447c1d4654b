// Data structures shared by the kernels and the host-side interpolator

use crate::error::InterpolationError;
use serde::{Deserialize, Serialize};

/// Tile (workgroup) dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Invocations per workgroup (`width * height`).
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Both dimensions are non-zero and the area fits in a `u32`.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.width.checked_mul(self.height).is_some()
    }

    /// Shared tile check of the config, the host and every kernel constructor.
    pub fn validate(&self) -> Result<(), InterpolationError> {
        if !self.is_valid() {
            return Err(InterpolationError::InvalidTileSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
        }
    }
}

impl std::fmt::Display for TileSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Per-dispatch parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    pub width: u32,
    pub height: u32,
    pub debug: bool,
}

impl Params {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Uniform layout of `Params` as seen by the WGSL kernel.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuParams {
    pub width: u32,
    pub height: u32,
    pub debug: u32,
    pub _pad: u32,
}

impl From<&Params> for GpuParams {
    fn from(p: &Params) -> Self {
        Self {
            width: p.width,
            height: p.height,
            debug: p.debug as u32,
            _pad: 0,
        }
    }
}

/// Result of one interpolation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpolationOutput {
    pub pixels: Vec<u32>,
    pub width: u32,
    pub height: u32,
    /// Total number of missing pixels that were filled.
    pub missing_count: u64,
    /// Number of tiles dispatched.
    pub tiles: usize,
    /// Per-tile missing counts, present only for debug dispatches.
    pub debug_counts: Option<Vec<u32>>,
}

impl InterpolationOutput {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            pixels: Vec::new(),
            width,
            height,
            missing_count: 0,
            tiles: 0,
            debug_counts: None,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

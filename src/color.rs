//! Packed 32-bit colors and the luminance used to rank fill candidates.
//!
//! Packing places `{r, g, b, a}` at shifts `{24, 16, 8, 0}`. The luminance
//! reader takes the channels at shifts `{24, 16, 8}` as `{r, b, g}`, so the
//! green and blue weights land on the opposite channels from the packer.
//! Renderers that rely on luminance ordering must pack with this in mind;
//! the mismatch is kept as-is and is not corrected here.

use serde::{Deserialize, Serialize};

/// Sentinel for "no data at this pixel".
pub const MISSING: u32 = 0;

/// Initial `local_min` of a tile (opaque white).
pub const MIN_SEED: u32 = 0xFFFF_FFFF;

/// Initial `local_max` of a tile (opaque black). Used as the fill color
/// when a tile has no data at all.
pub const MAX_SEED: u32 = 0x0000_00FF;

/// Rec. 709 luma weights, applied as `[r, g, b]`.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// An unpacked 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn pack(self) -> u32 {
        pack(self.r, self.g, self.b, self.a)
    }

    /// Inverse of [`Rgba::pack`]. Not the channel view used by [`luminance`].
    pub const fn unpack(packed: u32) -> Self {
        Self {
            r: (packed >> 24) as u8,
            g: (packed >> 16) as u8,
            b: (packed >> 8) as u8,
            a: packed as u8,
        }
    }
}

impl From<Rgba> for u32 {
    fn from(c: Rgba) -> u32 {
        c.pack()
    }
}

#[inline(always)]
pub const fn pack(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32)
}

/// Normalized `[r, g, b]` as read by the luminance path.
///
/// Shift 16 is read as blue and shift 8 as green.
#[inline(always)]
pub fn unpack_rgb(packed: u32) -> [f32; 3] {
    let r = ((packed >> 24) & 0xff) as f32 / 255.0;
    let b = ((packed >> 16) & 0xff) as f32 / 255.0;
    let g = ((packed >> 8) & 0xff) as f32 / 255.0;
    [r, g, b]
}

#[inline(always)]
pub fn luminance(packed: u32) -> f32 {
    let [r, g, b] = unpack_rgb(packed);
    r * LUMA_WEIGHTS[0] + g * LUMA_WEIGHTS[1] + b * LUMA_WEIGHTS[2]
}

#[inline(always)]
pub fn is_missing(packed: u32) -> bool {
    packed == MISSING
}

//! Interpolator configuration, loadable from JSON.
//!
//! ```json
//! { "tile": { "width": 16, "height": 16 }, "debug": true, "backend": "cpu" }
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use crate::data_types::TileSize;
use crate::error::InterpolationError;
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Cpu,
    /// Requires the `gpu` cargo feature.
    Gpu,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolatorConfig {
    pub tile: TileSize,
    /// Record per-tile missing counts.
    pub debug: bool,
    pub backend: Backend,
    /// CPU only: also parallelise phase 1 inside each tile.
    pub sub_tile_parallelism: bool,
    /// CPU only: size of a dedicated worker pool. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        Self {
            tile: TileSize::default(),
            debug: false,
            backend: Backend::Cpu,
            sub_tile_parallelism: false,
            threads: None,
        }
    }
}

impl InterpolatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).wrap_err("failed to parse interpolator config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json_str(&json).wrap_err_with(|| format!("invalid config in {}", path.display()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("failed to serialize interpolator config")
    }

    pub fn validate(&self) -> Result<()> {
        self.check().map_err(|e| eyre!("invalid interpolator config: {e}"))
    }

    /// Typed form of [`validate`](Self::validate), also run by
    /// [`crate::HeatmapInterpolator::new`].
    pub fn check(&self) -> Result<(), InterpolationError> {
        self.tile.validate()?;
        if self.threads == Some(0) {
            return Err(InterpolationError::ThreadPool("threads must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_tile(mut self, width: u32, height: u32) -> Self {
        self.tile = TileSize::new(width, height);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_sub_tile_parallelism(mut self, enabled: bool) -> Self {
        self.sub_tile_parallelism = enabled;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

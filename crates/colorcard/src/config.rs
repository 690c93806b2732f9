//! Pipeline configuration and the error type shared by the facade helpers.

use std::fs;
use std::path::{Path, PathBuf};

use colorcard_core::Quad;
use colorcard_features::{FeatureError, FeatureParams};
use colorcard_grid::{GridConfigError, GridError, GridParams};
use colorcard_regions::RegionError;
use serde::{Deserialize, Serialize};

/// Out-of-range pipeline settings, reported before any image is read.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineConfigError {
    #[error(transparent)]
    Grid(#[from] GridConfigError),
    #[error("target_height must be positive")]
    ZeroTargetHeight,
    #[error("feature eps must be positive and finite, got {0}")]
    FeatureEps(f32),
    #[error("feature clip range [{min}, {max}] is empty or non-positive")]
    FeatureClip { min: f32, max: f32 },
    #[error("force_manual is set but no manual_boxes are configured")]
    ManualBoxesMissing,
    #[error("manual box {index} is degenerate: {quad:?}")]
    DegenerateManualBox { index: usize, quad: Quad },
}

/// Errors produced while processing one image or writing its report.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Fewer than two card regions and no manual fallback.
    #[error("could not locate two card regions")]
    NotFound,
    #[error(transparent)]
    InvalidConfig(#[from] PipelineConfigError),
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[cfg(feature = "image")]
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Recoverable per-image miss; batch drivers skip and log it.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::NotFound)
    }

    /// Bad settings; batch drivers abort the run.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidConfig(_) | PipelineError::Grid(GridError::InvalidConfig(_))
        )
    }
}

fn default_target_height() -> u32 {
    512
}

fn default_edge_threshold() -> u8 {
    50
}

fn default_save_extras() -> bool {
    true
}

/// Settings for one extraction run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub grid: GridParams,
    #[serde(default)]
    pub features: FeatureParams,
    /// Height of the working image used for region detection.
    #[serde(default = "default_target_height")]
    pub target_height: u32,
    /// Gradient threshold on the 0..255 normalized magnitude.
    #[serde(default = "default_edge_threshold")]
    pub edge_threshold: u8,
    /// Base seed; image `i` of a batch samples with `seed + i`.
    #[serde(default)]
    pub seed: u64,
    /// Include the linear-light intermediates in reports.
    #[serde(default = "default_save_extras")]
    pub save_extras: bool,
    /// Skip detection and use `manual_boxes` directly.
    #[serde(default)]
    pub force_manual: bool,
    /// `[reference, sample]` in full-resolution pixels, used when detection
    /// fails or `force_manual` is set.
    #[serde(default)]
    pub manual_boxes: Option<[Quad; 2]>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid: GridParams::default(),
            features: FeatureParams::default(),
            target_height: default_target_height(),
            edge_threshold: default_edge_threshold(),
            seed: 0,
            save_extras: default_save_extras(),
            force_manual: false,
            manual_boxes: None,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config from disk. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Range-check every setting.
    pub fn validate(&self) -> Result<(), PipelineConfigError> {
        self.grid.validate()?;
        if self.target_height == 0 {
            return Err(PipelineConfigError::ZeroTargetHeight);
        }
        let f = &self.features;
        if !(f.eps > 0.0 && f.eps.is_finite()) {
            return Err(PipelineConfigError::FeatureEps(f.eps));
        }
        if !(f.clip_min > 0.0 && f.clip_min <= f.clip_max) {
            return Err(PipelineConfigError::FeatureClip {
                min: f.clip_min,
                max: f.clip_max,
            });
        }
        match &self.manual_boxes {
            None if self.force_manual => return Err(PipelineConfigError::ManualBoxesMissing),
            None => {}
            Some(boxes) => {
                if let Some((index, quad)) = boxes.iter().enumerate().find(|(_, q)| !q.is_valid()) {
                    return Err(PipelineConfigError::DegenerateManualBox { index, quad: *quad });
                }
            }
        }
        Ok(())
    }
}

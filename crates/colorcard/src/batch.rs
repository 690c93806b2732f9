//! Directory scanning, parallel batch extraction and JSON reports.

use std::fs;
use std::path::{Path, PathBuf};

use colorcard_core::{ColorMeanTensor, Quad};
use colorcard_features::{FeatureMode, LinearExtras};
use log::{debug, warn};
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pipeline::{process_image, ImageResult, RegionSource};
use crate::{PipelineConfig, PipelineError};

/// Lower-case extensions picked up by [`find_images`].
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// All image files under `dir`, recursively, in sorted order.
pub fn find_images(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, PipelineError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_image(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Decode `path` into 8-bit RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<image::RgbImage, PipelineError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Outcome for one input file of a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub seed: u64,
    pub outcome: Result<ImageResult, PipelineError>,
}

/// Process `paths` in parallel.
///
/// The configuration is validated once up front; a bad configuration fails
/// the whole batch. Per-image failures are kept in the returned items, in
/// input order. Image `i` samples with seed `cfg.seed + i`.
pub fn process_batch(
    paths: &[PathBuf],
    cfg: &PipelineConfig,
) -> Result<Vec<BatchItem>, PipelineError> {
    cfg.validate()?;
    let items: Vec<BatchItem> = paths
        .par_iter()
        .enumerate()
        .map(|(i, path)| {
            let seed = cfg.seed.wrapping_add(i as u64);
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = load_rgb(path).and_then(|img| process_image(&img, cfg, &mut rng));
            match &outcome {
                Ok(_) => debug!("{}: ok", path.display()),
                Err(e) if e.is_not_found() => warn!("{}: skipped, {e}", path.display()),
                Err(e) => warn!("{}: failed, {e}", path.display()),
            }
            BatchItem {
                path: path.clone(),
                seed,
                outcome,
            }
        })
        .collect();
    Ok(items)
}

/// Output location mirroring `image`'s position under `input_root`:
/// `<output_root>/<relative dir>/<stem><suffix>.<ext>`.
///
/// Images outside `input_root` land directly in `output_root`.
pub fn report_path(
    input_root: &Path,
    output_root: &Path,
    image: &Path,
    suffix: &str,
    ext: &str,
) -> PathBuf {
    let rel_dir = image
        .strip_prefix(input_root)
        .ok()
        .and_then(Path::parent)
        .unwrap_or(Path::new(""));
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_root
        .join(rel_dir)
        .join(format!("{stem}{suffix}.{ext}"))
}

/// Numeric outputs of a successful extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source: RegionSource,
    pub reference_box: Quad,
    pub sample_box: Quad,
    pub feature_mode: FeatureMode,
    pub ref_means: ColorMeanTensor,
    pub sample_means: ColorMeanTensor,
    pub features: Array3<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<LinearExtras>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    Ok(ExtractionReport),
    /// No card pair and no manual fallback.
    Skipped { reason: String },
    Failed { error: String },
}

/// Per-image JSON report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub image: PathBuf,
    pub seed: u64,
    #[serde(flatten)]
    pub outcome: ReportOutcome,
}

impl ImageReport {
    pub fn from_item(item: &BatchItem, save_extras: bool) -> Self {
        let outcome = match &item.outcome {
            Ok(res) => ReportOutcome::Ok(ExtractionReport {
                source: res.source,
                reference_box: res.regions.reference,
                sample_box: res.regions.sample,
                feature_mode: res.features.mode,
                ref_means: res.ref_means.clone(),
                sample_means: res.sample_means.clone(),
                features: res.features.features.clone(),
                extras: save_extras.then(|| res.features.extras.clone()),
            }),
            Err(e) if e.is_not_found() => ReportOutcome::Skipped {
                reason: e.to_string(),
            },
            Err(e) => ReportOutcome::Failed {
                error: e.to_string(),
            },
        };
        Self {
            image: item.path.clone(),
            seed: item.seed,
            outcome,
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write pretty JSON, creating parent directories as needed.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

//! Single-image extraction: regions, two grid samplings, features.

use colorcard_core::{ColorMeanTensor, PixelRect, Quad};
use colorcard_features::{build_features, FeatureSet};
use colorcard_grid::{GridLayout, GridSampler};
use colorcard_regions::RegionPair;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::detect::{detect_regions, rgb_view};
use crate::{PipelineConfig, PipelineConfigError, PipelineError};

const REFERENCE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const SAMPLE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CELL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Where the card boxes came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    Detected,
    Manual,
}

/// Everything extracted from one photo.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageResult {
    pub regions: RegionPair,
    pub source: RegionSource,
    pub ref_layout: GridLayout,
    pub sample_layout: GridLayout,
    pub ref_means: ColorMeanTensor,
    pub sample_means: ColorMeanTensor,
    /// Feature tensor plus linear-light extras.
    pub features: FeatureSet,
}

impl ImageResult {
    /// Draw card outlines, cell outlines and sampled centers onto `canvas`.
    ///
    /// `canvas` should be the image the result was computed from.
    pub fn annotate(&self, canvas: &mut RgbImage) {
        for layout in [&self.ref_layout, &self.sample_layout] {
            for cell in &layout.cells {
                draw_rect(canvas, &cell.cell, CELL_COLOR);
                draw_rect(canvas, &cell.center, CENTER_COLOR);
            }
        }
        draw_quad(canvas, &self.regions.reference, REFERENCE_COLOR);
        draw_quad(canvas, &self.regions.sample, SAMPLE_COLOR);
    }
}

fn draw_quad(canvas: &mut RgbImage, quad: &Quad, color: Rgb<u8>) {
    for k in 0..4 {
        let a = quad.points[k];
        let b = quad.points[(k + 1) % 4];
        draw_line_segment_mut(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            color,
        );
    }
}

fn draw_rect(canvas: &mut RgbImage, rect: &PixelRect, color: Rgb<u8>) {
    if rect.is_empty() {
        return;
    }
    // Outline the last pixel row/column inside the half-open rect.
    let inner = PixelRect::new(rect.x0, rect.y0, rect.x1 - 1, rect.y1 - 1);
    draw_quad(canvas, &Quad::from_rect(inner), color);
}

/// Detected boxes, or the configured manual ones.
fn resolve_regions(
    img: &RgbImage,
    cfg: &PipelineConfig,
) -> Result<(RegionPair, RegionSource), PipelineError> {
    if !cfg.force_manual {
        if let Some(pair) = detect_regions(img, cfg)? {
            return Ok((pair, RegionSource::Detected));
        }
        debug!("automatic detection found fewer than two cards");
    }
    match cfg.manual_boxes {
        Some([reference, sample]) => Ok((RegionPair { reference, sample }, RegionSource::Manual)),
        None => Err(PipelineError::NotFound),
    }
}

/// Run the full extraction on one decoded photo.
///
/// The reference card is sampled before the sample card, both from `rng`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, cfg, rng), fields(width = img.width(), height = img.height()))
)]
pub fn process_image<R: Rng + ?Sized>(
    img: &RgbImage,
    cfg: &PipelineConfig,
    rng: &mut R,
) -> Result<ImageResult, PipelineError> {
    cfg.validate()?;
    let (regions, source) = resolve_regions(img, cfg)?;
    info!(
        "{:?} cards: reference {:?}, sample {:?}",
        source,
        regions.reference.bounding_rect(),
        regions.sample.bounding_rect()
    );

    let sampler = GridSampler::new(cfg.grid.clone()).map_err(PipelineConfigError::from)?;
    let view = rgb_view(img);
    let (ref_means, ref_layout) = sampler.sample_with_layout(&view, &regions.reference, rng)?;
    let (sample_means, sample_layout) = sampler.sample_with_layout(&view, &regions.sample, rng)?;
    let features = build_features(&ref_means, &sample_means, &cfg.features)?;

    Ok(ImageResult {
        regions,
        source,
        ref_layout,
        sample_layout,
        ref_means,
        sample_means,
        features,
    })
}

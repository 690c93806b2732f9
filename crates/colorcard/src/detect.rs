//! Card-pair detection on a downscaled working copy of the photo.

use colorcard_core::{ChannelOrder, GrayImage, GrayImageView, ImageOps, RgbImageView};
use colorcard_regions::{threshold_mask, RegionPair, RegionSelector};
use image::imageops::{self, FilterType};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ImageprocOps, PipelineConfig, PipelineError};

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Borrow an `image::RgbImage` as a core view (RGB order).
pub fn rgb_view(img: &image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        order: ChannelOrder::Rgb,
        data: img.as_raw(),
    }
}

/// Working size for detection: height `target_height`, aspect preserved
/// (width truncated, at least 1).
pub fn working_size(width: u32, height: u32, target_height: u32) -> (u32, u32) {
    let w = (f64::from(target_height) * f64::from(width) / f64::from(height.max(1))) as u32;
    (w.max(1), target_height)
}

/// Normalized gradient magnitude and its thresholded edge mask.
pub fn edge_mask<O: ImageOps>(
    ops: &O,
    gray: &GrayImageView<'_>,
    threshold: u8,
) -> (GrayImage, GrayImage) {
    let gradient = ops.gradient_magnitude(gray);
    let mask = threshold_mask(&gradient.view(), threshold);
    (gradient, mask)
}

/// Find the reference and sample cards in `img`.
///
/// Detection runs on a copy resized to `cfg.target_height`; the returned
/// boxes are mapped back to `img` pixel coordinates. `Ok(None)` means fewer
/// than two usable regions.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, cfg), fields(width = img.width(), height = img.height()))
)]
pub fn detect_regions(
    img: &image::RgbImage,
    cfg: &PipelineConfig,
) -> Result<Option<RegionPair>, PipelineError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || cfg.target_height == 0 {
        return Ok(None);
    }
    let (work_w, work_h) = working_size(width, height, cfg.target_height);
    let resized = imageops::resize(img, work_w, work_h, FilterType::CatmullRom);
    let gray = imageops::grayscale(&resized);

    let selector = RegionSelector::new(ImageprocOps);
    let (_, mask) = edge_mask(selector.ops(), &gray_view(&gray), cfg.edge_threshold);
    let edge_px = mask.data.iter().filter(|&&v| v != 0).count();
    debug!("working image {work_w}x{work_h}, {edge_px} edge pixels");

    let Some(pair) = selector.select(&mask.view())? else {
        return Ok(None);
    };
    let sx = f64::from(width) / f64::from(work_w);
    let sy = f64::from(height) / f64::from(work_h);
    Ok(Some(pair.scaled(sx, sy)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_size_keeps_aspect() {
        assert_eq!(working_size(4000, 3000, 512), (682, 512));
        assert_eq!(working_size(100, 200, 512), (256, 512));
        assert_eq!(working_size(1, 5000, 512), (1, 512));
    }

    #[test]
    fn blank_photos_have_no_regions() {
        let img = image::RgbImage::from_pixel(120, 90, image::Rgb([80, 80, 80]));
        let found = detect_regions(&img, &PipelineConfig::default()).unwrap();
        assert!(found.is_none());
    }
}

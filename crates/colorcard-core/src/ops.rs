//! Low-level image primitives consumed by region selection.
//!
//! Implementations live outside this crate (the `colorcard` facade ships one
//! backed by `imageproc`); tests can supply scripted ones.

use crate::{GrayImage, GrayImageView, Quad};

/// Size of one labeled foreground component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentStats {
    /// Label value used in [`ComponentLabels::labels`]; never 0.
    pub label: u32,
    /// Foreground pixel count.
    pub area: usize,
}

/// Connected-component labeling of a binary mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentLabels {
    pub width: usize,
    pub height: usize,
    /// Row-major label per pixel, 0 = background.
    pub labels: Vec<u32>,
    /// One entry per foreground component, in labeling order.
    pub stats: Vec<ComponentStats>,
}

impl ComponentLabels {
    /// Build labels and per-label areas from a raw label buffer.
    pub fn from_labels(width: usize, height: usize, labels: Vec<u32>) -> Self {
        let max = labels.iter().copied().max().unwrap_or(0) as usize;
        let mut areas = vec![0usize; max + 1];
        for &l in &labels {
            areas[l as usize] += 1;
        }
        let stats = areas
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, &area)| area > 0)
            .map(|(label, &area)| ComponentStats {
                label: label as u32,
                area,
            })
            .collect();
        Self {
            width,
            height,
            labels,
            stats,
        }
    }

    /// Binary mask (255 = member) of a single component.
    pub fn component_mask(&self, label: u32) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self
                .labels
                .iter()
                .map(|&l| if l == label { 255 } else { 0 })
                .collect(),
        }
    }
}

/// External image primitives.
pub trait ImageOps {
    /// Gradient magnitude of a gray image, rescaled so that the maximum maps
    /// to 255.
    fn gradient_magnitude(&self, gray: &GrayImageView<'_>) -> GrayImage;

    /// Label 8-connected foreground (non-zero) regions of `mask`.
    fn label_components(&self, mask: &GrayImageView<'_>) -> ComponentLabels;

    /// Minimum-area enclosing quadrilateral of the foreground of `mask`, or
    /// `None` for an empty mask.
    fn min_area_quad(&self, mask: &GrayImageView<'_>) -> Option<Quad>;
}

//! [`ImageOps`] backed by `imageproc`.

use colorcard_core::{ComponentLabels, GrayImage, GrayImageView, ImageOps, Quad};
use image::Luma;
use imageproc::geometry::min_area_rect;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity};

/// 3×3 Sobel gradients, 8-connected labeling and rotating-calipers
/// minimum-area rectangles.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageprocOps;

fn to_buffer(view: &GrayImageView<'_>) -> Option<image::GrayImage> {
    if !view.is_well_formed() {
        return None;
    }
    image::GrayImage::from_raw(view.width as u32, view.height as u32, view.data.to_vec())
}

impl ImageOps for ImageprocOps {
    fn gradient_magnitude(&self, gray: &GrayImageView<'_>) -> GrayImage {
        let Some(img) = to_buffer(gray) else {
            return GrayImage::zeros(gray.width, gray.height);
        };
        let gx = horizontal_sobel(&img);
        let gy = vertical_sobel(&img);
        let mag: Vec<f32> = gx
            .pixels()
            .zip(gy.pixels())
            .map(|(x, y)| {
                let (x, y) = (f32::from(x[0]), f32::from(y[0]));
                (x * x + y * y).sqrt()
            })
            .collect();

        let max = mag.iter().copied().fold(0.0f32, f32::max);
        let scale = 255.0 / (max + 1e-8);
        GrayImage {
            width: gray.width,
            height: gray.height,
            data: mag.iter().map(|&m| (m * scale) as u8).collect(),
        }
    }

    fn label_components(&self, mask: &GrayImageView<'_>) -> ComponentLabels {
        let Some(img) = to_buffer(mask) else {
            return ComponentLabels::from_labels(mask.width, mask.height, Vec::new());
        };
        let labels = connected_components(&img, Connectivity::Eight, Luma([0u8]));
        ComponentLabels::from_labels(mask.width, mask.height, labels.into_raw())
    }

    fn min_area_quad(&self, mask: &GrayImageView<'_>) -> Option<Quad> {
        if !mask.is_well_formed() || mask.width == 0 {
            return None;
        }
        let w = mask.width;
        let points: Vec<Point<i32>> = mask
            .data
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(i, _)| Point::new((i % w) as i32, (i / w) as i32))
            .collect();
        if points.len() < 3 {
            return None;
        }
        let corners = min_area_rect(&points);
        Some(Quad::from_xy(corners.map(|p| [p.x, p.y])))
    }
}

use colorcard_core::{GrayImage, GrayImageView};

/// Binary mask: 255 where `gradient > threshold`, 0 elsewhere.
pub fn threshold_mask(gradient: &GrayImageView<'_>, threshold: u8) -> GrayImage {
    GrayImage {
        width: gradient.width,
        height: gradient.height,
        data: gradient
            .data
            .iter()
            .map(|&v| if v > threshold { 255 } else { 0 })
            .collect(),
    }
}

use colorcard_core::ColorMeanTensor;
use ndarray::Array3;

/// sRGB decoding of one component in `[0, 1]`.
#[inline]
pub fn srgb_to_linear(x: f32) -> f32 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear-light version of an 8-bit mean-color grid.
pub fn srgb_to_linear_tensor(means: &ColorMeanTensor) -> Array3<f32> {
    means.view().mapv(|v| srgb_to_linear(v / 255.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn endpoints_and_knee() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert_abs_diff_eq!(srgb_to_linear(1.0), 1.0, epsilon = 1e-6);
        // Both branches agree at the knee.
        let below = 0.04045 / 12.92;
        let above = ((0.04045f32 + 0.055) / 1.055).powf(2.4);
        assert_abs_diff_eq!(srgb_to_linear(0.04045), below, epsilon = 1e-7);
        assert_abs_diff_eq!(below, above, epsilon = 1e-5);
    }

    #[test]
    fn mid_gray() {
        // 128/255 decodes to about 21.6% linear light.
        assert_abs_diff_eq!(srgb_to_linear(128.0 / 255.0), 0.21586, epsilon = 1e-4);
    }
}

use colorcard_core::ColorMeanTensor;
use log::debug;
use ndarray::{s, Array3, Axis, Zip};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::srgb::srgb_to_linear_tensor;
use crate::{FeatureMode, UnknownFeatureMode};

/// Errors returned by [`build_features`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error(transparent)]
    UnknownMode(#[from] UnknownFeatureMode),
    #[error("reference grid is {reference:?} but sample grid is {sample:?}")]
    ShapeMismatch {
        reference: (usize, usize),
        sample: (usize, usize),
    },
}

/// Feature construction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    pub mode: FeatureMode,
    /// Per-image, per-channel normalization (`ratio`/`log_ratio` only).
    pub normalize: bool,
    /// Floor for denominators, logarithm arguments and std.
    pub eps: f32,
    pub clip_min: f32,
    pub clip_max: f32,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            mode: FeatureMode::LogRatio,
            normalize: true,
            eps: 1e-6,
            clip_min: 1e-6,
            clip_max: 1e6,
        }
    }
}

impl FeatureParams {
    /// Switch to the mode called `name` (`log_ratio`, `ratio`, `multi`).
    pub fn set_mode(&mut self, name: &str) -> Result<(), FeatureError> {
        self.mode = name.parse()?;
        Ok(())
    }
}

/// Intermediate linear-light tensors, each `(3, rows, cols)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearExtras {
    pub ref_linear: Array3<f32>,
    pub sample_linear: Array3<f32>,
    pub ratio: Array3<f32>,
    pub log_ratio: Array3<f32>,
}

/// Feature tensor plus the intermediates it was built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub mode: FeatureMode,
    /// `(3, rows, cols)` or `(15, rows, cols)` for [`FeatureMode::Multi`].
    pub features: Array3<f32>,
    pub extras: LinearExtras,
}

/// Combine reference and sample mean grids into a feature tensor.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(reference, sample), fields(mode = %params.mode))
)]
pub fn build_features(
    reference: &ColorMeanTensor,
    sample: &ColorMeanTensor,
    params: &FeatureParams,
) -> Result<FeatureSet, FeatureError> {
    let ref_shape = (reference.rows(), reference.cols());
    let sam_shape = (sample.rows(), sample.cols());
    if ref_shape != sam_shape {
        return Err(FeatureError::ShapeMismatch {
            reference: ref_shape,
            sample: sam_shape,
        });
    }

    let eps = params.eps;
    let ref_linear = srgb_to_linear_tensor(reference);
    let sample_linear = srgb_to_linear_tensor(sample);

    let ratio = Zip::from(&sample_linear)
        .and(&ref_linear)
        .map_collect(|&s, &r| (s / r.max(eps)).clamp(params.clip_min, params.clip_max));
    let log_ratio = Zip::from(&sample_linear)
        .and(&ref_linear)
        .map_collect(|&s, &r| s.max(eps).ln() - r.max(eps).ln());

    let features = match params.mode {
        FeatureMode::LogRatio => {
            let mut x = log_ratio.clone();
            if params.normalize {
                zscore_channels(&mut x, eps);
            }
            x
        }
        FeatureMode::Ratio => {
            let mut x = ratio.clone();
            if params.normalize {
                mean_scale_channels(&mut x, eps);
            }
            x
        }
        FeatureMode::Multi => {
            let delta = &sample_linear - &ref_linear;
            let (rows, cols) = ref_shape;
            let mut x = Array3::zeros((15, rows, cols));
            for (k, block) in [&ref_linear, &sample_linear, &ratio, &log_ratio, &delta]
                .into_iter()
                .enumerate()
            {
                x.slice_mut(s![3 * k..3 * k + 3, .., ..]).assign(block);
            }
            x
        }
    };
    debug!(
        "built {} features of shape {:?}",
        params.mode,
        features.shape()
    );

    Ok(FeatureSet {
        mode: params.mode,
        features,
        extras: LinearExtras {
            ref_linear,
            sample_linear,
            ratio,
            log_ratio,
        },
    })
}

/// Population mean and standard deviation of one channel.
fn channel_stats(values: ndarray::ArrayView2<'_, f32>) -> (f32, f32) {
    let n = values.len() as f32;
    let mean = values.sum() / n;
    let var = values.fold(0.0f32, |acc, &v| acc + (v - mean) * (v - mean)) / n;
    (mean, var.sqrt())
}

fn zscore_channels(x: &mut Array3<f32>, eps: f32) {
    for mut channel in x.axis_iter_mut(Axis(0)) {
        let (mean, std) = channel_stats(channel.view());
        channel.mapv_inplace(|v| (v - mean) / (std + eps));
    }
}

fn mean_scale_channels(x: &mut Array3<f32>, eps: f32) {
    for mut channel in x.axis_iter_mut(Axis(0)) {
        let (mean, _) = channel_stats(channel.view());
        channel.mapv_inplace(|v| v / (mean + eps));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn varied(rows: usize, cols: usize, offset: f32) -> ColorMeanTensor {
        ColorMeanTensor::from_array(Array3::from_shape_fn((3, rows, cols), |(c, r, k)| {
            (offset + 17.0 * c as f32 + 9.0 * r as f32 + 5.0 * k as f32).min(255.0)
        }))
        .unwrap()
    }

    fn params(mode: FeatureMode, normalize: bool) -> FeatureParams {
        FeatureParams {
            mode,
            normalize,
            ..FeatureParams::default()
        }
    }

    #[test]
    fn identical_grids_give_unit_ratio_and_zero_log_ratio() {
        for (rows, cols) in [(1, 1), (4, 6), (6, 12)] {
            let grid = varied(rows, cols, 12.0);
            let out = build_features(&grid, &grid, &params(FeatureMode::Ratio, false)).unwrap();
            assert!(out.extras.ratio.iter().all(|&v| (v - 1.0).abs() < 1e-6));
            assert!(out.extras.log_ratio.iter().all(|&v| v.abs() < 1e-6));
            assert_eq!(out.features, out.extras.ratio);
        }
    }

    #[test]
    fn uniform_half_linear_ratio_stays_one_after_scaling() {
        // sRGB code whose linear value is 0.5.
        let code = 255.0 * (1.055 * 0.5f32.powf(1.0 / 2.4) - 0.055);
        let grid = ColorMeanTensor::filled(4, 6, [code; 3]);
        assert!(grid
            .view()
            .iter()
            .all(|&v| (crate::srgb_to_linear(v / 255.0) - 0.5).abs() < 1e-5));

        let raw = build_features(&grid, &grid, &params(FeatureMode::Ratio, false)).unwrap();
        assert!(raw.features.iter().all(|&v| v == 1.0));

        let scaled = build_features(&grid, &grid, &params(FeatureMode::Ratio, true)).unwrap();
        for &v in scaled.features.iter() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn log_ratio_is_zscored_per_channel() {
        let reference = varied(4, 6, 30.0);
        let sample = varied(4, 6, 60.0);
        let out = build_features(&reference, &sample, &params(FeatureMode::LogRatio, true)).unwrap();
        assert_eq!(out.features.shape(), &[3, 4, 6]);
        for channel in out.features.axis_iter(Axis(0)) {
            let (mean, std) = channel_stats(channel);
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-4);
            assert_abs_diff_eq!(std, 1.0, epsilon = 1e-3);
        }

        let raw = build_features(&reference, &sample, &params(FeatureMode::LogRatio, false)).unwrap();
        assert_eq!(raw.features, raw.extras.log_ratio);
        assert!(raw.features.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn multi_stacks_fifteen_unnormalized_channels() {
        let reference = varied(2, 3, 40.0);
        let sample = varied(2, 3, 90.0);
        let out = build_features(&reference, &sample, &params(FeatureMode::Multi, true)).unwrap();
        assert_eq!(out.features.shape(), &[15, 2, 3]);

        let e = &out.extras;
        assert_eq!(out.features.slice(s![0..3, .., ..]), e.ref_linear);
        assert_eq!(out.features.slice(s![3..6, .., ..]), e.sample_linear);
        assert_eq!(out.features.slice(s![6..9, .., ..]), e.ratio);
        assert_eq!(out.features.slice(s![9..12, .., ..]), e.log_ratio);
        let delta = &e.sample_linear - &e.ref_linear;
        assert_eq!(out.features.slice(s![12..15, .., ..]), delta);
    }

    #[test]
    fn black_cells_stay_finite() {
        let black = ColorMeanTensor::zeros(2, 2);
        let white = ColorMeanTensor::filled(2, 2, [255.0; 3]);
        for mode in FeatureMode::ALL {
            for (a, b) in [(&black, &white), (&white, &black), (&black, &black)] {
                let out = build_features(a, b, &params(mode, true)).unwrap();
                assert_eq!(out.features.shape()[0], mode.channels());
                assert!(out.features.iter().all(|v| v.is_finite()), "{mode}");
            }
        }
        let out = build_features(&black, &white, &params(FeatureMode::Ratio, false)).unwrap();
        for &v in out.features.iter() {
            assert_abs_diff_eq!(v, 1e6, epsilon = 1.0);
        }
    }

    #[test]
    fn modes_switch_by_name() {
        let mut p = FeatureParams::default();
        p.set_mode("multi").unwrap();
        assert_eq!(p.mode, FeatureMode::Multi);

        let err = p.set_mode("delta").unwrap_err();
        assert_eq!(err, FeatureError::UnknownMode(UnknownFeatureMode("delta".into())));
        assert_eq!(p.mode, FeatureMode::Multi);
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let err = build_features(&varied(2, 3, 0.0), &varied(3, 2, 0.0), &FeatureParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            FeatureError::ShapeMismatch {
                reference: (2, 3),
                sample: (3, 2)
            }
        );
    }
}

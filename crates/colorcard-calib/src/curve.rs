use log::debug;
use ndarray::{ArrayD, ArrayViewD, Axis};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{CalibrationError, CurveModel};

/// Fixed Newton budget for the quadratic inverse. Convergence is not checked.
pub const NEWTON_ITERATIONS: usize = 5;

/// Smallest slope magnitude used when dividing by `a1` or `f'(t)`.
pub(crate) const SLOPE_EPS: f64 = 1e-6;

/// Floor used for the linear seed of the Newton iteration.
const SEED_SLOPE_MIN: f64 = 1e-4;

/// Response of one channel, `measured = f(target)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ChannelCurve {
    Linear { a1: f64, a0: f64 },
    Poly2 { a2: f64, a1: f64, a0: f64 },
}

impl ChannelCurve {
    pub fn model(&self) -> CurveModel {
        match self {
            ChannelCurve::Linear { .. } => CurveModel::Linear,
            ChannelCurve::Poly2 { .. } => CurveModel::Poly2,
        }
    }

    /// Forward response `f(t)`.
    pub fn evaluate(&self, t: f64) -> f64 {
        match *self {
            ChannelCurve::Linear { a1, a0 } => a1 * t + a0,
            ChannelCurve::Poly2 { a2, a1, a0 } => (a2 * t + a1) * t + a0,
        }
    }

    /// Target level that produces the measured value `v` (unclamped).
    pub fn invert(&self, v: f64) -> f64 {
        match *self {
            ChannelCurve::Linear { a1, a0 } => (v - a0) / floor_magnitude(a1, SLOPE_EPS),
            ChannelCurve::Poly2 { a2, a1, a0 } => invert_quadratic([a2, a1, a0], v),
        }
    }
}

/// Solve `a2·t² + a1·t + a0 = v` for `t` with [`NEWTON_ITERATIONS`] Newton
/// steps seeded from the linear term.
///
/// `coeffs` is `[a2, a1, a0]`. The derivative is kept at least `1e-6` away
/// from zero, so the result is always finite for finite inputs.
pub fn invert_quadratic(coeffs: [f64; 3], v: f64) -> f64 {
    let [a2, a1, a0] = coeffs;
    let mut t = (v - a0) / a1.max(SEED_SLOPE_MIN);
    for _ in 0..NEWTON_ITERATIONS {
        let f = (a2 * t + a1) * t + a0 - v;
        let df = floor_magnitude(2.0 * a2 * t + a1, SLOPE_EPS);
        t -= f / df;
    }
    t
}

/// Push `x` away from zero to at least `min` in magnitude, keeping its sign.
pub(crate) fn floor_magnitude(x: f64, min: f64) -> f64 {
    if x.abs() >= min {
        x
    } else if x < 0.0 {
        -min
    } else {
        min
    }
}

/// Fitted per-channel response curves in R, G, B order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub channels: [ChannelCurve; 3],
}

impl CalibrationCurve {
    pub fn model(&self) -> CurveModel {
        self.channels[0].model()
    }

    /// Correct raw RGB values: invert each channel's response and clamp to
    /// `[0, 255]`.
    ///
    /// `values` may have any shape whose last axis has length 3; the output
    /// has the same shape.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, values), fields(shape = ?values.shape()))
    )]
    pub fn apply(&self, values: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>, CalibrationError> {
        let last = match values.ndim().checked_sub(1) {
            Some(axis) if values.shape()[axis] == 3 => Axis(axis),
            _ => {
                return Err(CalibrationError::ChannelCount {
                    shape: values.shape().to_vec(),
                })
            }
        };

        let mut out = values.to_owned();
        for mut pixel in out.lanes_mut(last) {
            for (v, curve) in pixel.iter_mut().zip(&self.channels) {
                *v = curve.invert(f64::from(*v)).clamp(0.0, 255.0) as f32;
            }
        }
        debug!("applied {} curve to {} values", self.model(), out.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};

    #[test]
    fn newton_converges_on_mild_quadratic() {
        let coeffs = [0.001, 1.0, 5.0];
        let curve = ChannelCurve::Poly2 {
            a2: 0.001,
            a1: 1.0,
            a0: 5.0,
        };
        for k in 0..=255 {
            let v = k as f64;
            let t = invert_quadratic(coeffs, v);
            assert!((curve.evaluate(t) - v).abs() < 1e-2, "v={v} t={t}");
        }
    }

    #[test]
    fn newton_survives_flat_derivative() {
        // f'(t) = 0 at the seed t = 0.
        let t = invert_quadratic([1.0, 0.0, 0.0], 0.0);
        assert!(t.is_finite());
        let t = invert_quadratic([0.0, 0.0, 3.0], 10.0);
        assert!(t.is_finite());
    }

    #[test]
    fn floor_keeps_sign() {
        assert_eq!(floor_magnitude(1e-9, 1e-6), 1e-6);
        assert_eq!(floor_magnitude(-1e-9, 1e-6), -1e-6);
        assert_eq!(floor_magnitude(0.0, 1e-6), 1e-6);
        assert_eq!(floor_magnitude(-2.0, 1e-6), -2.0);
    }

    #[test]
    fn apply_clamps_and_preserves_shape() {
        let curve = CalibrationCurve {
            channels: [
                ChannelCurve::Linear { a1: 1.0, a0: 0.0 },
                ChannelCurve::Linear { a1: 0.5, a0: 0.0 },
                ChannelCurve::Linear { a1: 1.0, a0: 100.0 },
            ],
        };
        let raw = Array3::from_shape_fn((2, 4, 3), |(r, c, _)| (r * 100 + c * 20) as f32);
        let out = curve.apply(raw.view().into_dyn()).unwrap();
        assert_eq!(out.shape(), &[2, 4, 3]);

        assert_abs_diff_eq!(out[[1, 3, 0]], 160.0);
        // 160 / 0.5 = 320 is clamped.
        assert_abs_diff_eq!(out[[1, 3, 1]], 255.0);
        // 20 - 100 < 0 is clamped.
        assert_abs_diff_eq!(out[[0, 1, 2]], 0.0);
        assert!(out.iter().all(|&v| (0.0..=255.0).contains(&v)));
    }

    #[test]
    fn apply_rejects_non_rgb_arrays() {
        let curve = CalibrationCurve {
            channels: [ChannelCurve::Linear { a1: 1.0, a0: 0.0 }; 3],
        };
        let err = curve.apply(array![[1.0f32, 2.0]].view().into_dyn()).unwrap_err();
        assert_eq!(err, CalibrationError::ChannelCount { shape: vec![1, 2] });

        let scalar = ndarray::arr0(1.0f32);
        assert!(curve.apply(scalar.view().into_dyn()).is_err());
    }

    #[test]
    fn curve_json_is_tagged() {
        let curve = ChannelCurve::Poly2 {
            a2: 0.5,
            a1: 1.0,
            a0: 2.0,
        };
        let json = serde_json::to_value(curve).unwrap();
        assert_eq!(json["model"], "poly2");
        assert_eq!(serde_json::from_value::<ChannelCurve>(json).unwrap(), curve);
    }
}

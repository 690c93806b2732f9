use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use ndarray::{ArrayView1, ArrayView2};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::curve::{floor_magnitude, SLOPE_EPS};
use crate::{CalibrationCurve, ChannelCurve, CurveModel, UnknownCurveModel};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error(transparent)]
    UnknownMode(#[from] UnknownCurveModel),
    #[error("{targets} targets but measured means have shape {measured:?} (expected ({targets}, 3))")]
    ShapeMismatch {
        targets: usize,
        measured: (usize, usize),
    },
    #[error("{model} fit needs at least {needed} gray levels, got {got}")]
    TooFewPoints {
        model: CurveModel,
        needed: usize,
        got: usize,
    },
    #[error("expected an array whose last axis has 3 channels, got shape {shape:?}")]
    ChannelCount { shape: Vec<usize> },
    #[error("least-squares solve failed: {0}")]
    Solve(&'static str),
}

/// [`fit`] with the curve model given by name (`"linear"`, `"poly2"`).
pub fn fit_named(
    targets: ArrayView1<'_, f32>,
    measured: ArrayView2<'_, f32>,
    model: &str,
) -> Result<CalibrationCurve, CalibrationError> {
    let model: CurveModel = model.parse()?;
    fit(targets, measured, model)
}

/// Fit one response curve per RGB channel.
///
/// `targets` holds the `S` nominal gray levels and `measured` the `(S, 3)`
/// observed channel means. Coefficients are least-squares estimates
/// (minimum-norm when the gray levels cannot pin the line down); a linear
/// slope whose magnitude falls below `1e-6` is floored to keep the inverse
/// finite.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(targets, measured), fields(points = targets.len(), model = %model))
)]
pub fn fit(
    targets: ArrayView1<'_, f32>,
    measured: ArrayView2<'_, f32>,
    model: CurveModel,
) -> Result<CalibrationCurve, CalibrationError> {
    let n = targets.len();
    if measured.dim() != (n, 3) {
        return Err(CalibrationError::ShapeMismatch {
            targets: n,
            measured: measured.dim(),
        });
    }
    let needed = model.min_points();
    if n < needed {
        return Err(CalibrationError::TooFewPoints { model, needed, got: n });
    }

    // Columns are powers of t, highest first.
    let k = model.coefficients();
    let design =
        DMatrix::<f64>::from_fn(n, k, |i, j| f64::from(targets[i]).powi((k - 1 - j) as i32));
    let svd = design.svd(true, true);

    let mut channels = [ChannelCurve::Linear { a1: 1.0, a0: 0.0 }; 3];
    for (ch, curve) in channels.iter_mut().enumerate() {
        let y = DVector::<f64>::from_iterator(n, measured.column(ch).iter().map(|&v| f64::from(v)));
        let coef = svd.solve(&y, 1e-12).map_err(CalibrationError::Solve)?;
        *curve = match model {
            CurveModel::Linear => {
                let a1 = coef[0];
                if a1.abs() < SLOPE_EPS {
                    warn!("channel {ch}: near-zero slope {a1:e} floored");
                }
                ChannelCurve::Linear {
                    a1: floor_magnitude(a1, SLOPE_EPS),
                    a0: coef[1],
                }
            }
            CurveModel::Poly2 => ChannelCurve::Poly2 {
                a2: coef[0],
                a1: coef[1],
                a0: coef[2],
            },
        };
        debug!("channel {ch}: {curve:?}");
    }

    Ok(CalibrationCurve { channels })
}

//! Gray-step response curves for capture-device characterization.
//!
//! A gray ramp with known target levels is photographed, its per-channel
//! means are measured, and [`fit`] estimates `measured = f(target)` for each
//! RGB channel. [`CalibrationCurve::apply`] then inverts `f` on arbitrary RGB
//! arrays and clamps the result to `[0, 255]`.
//!
//! ```
//! use colorcard_calib::{fit, CurveModel};
//! use ndarray::{array, Array2};
//!
//! let targets = array![0.0f32, 64.0, 128.0, 192.0, 255.0];
//! let measured = Array2::from_shape_fn((5, 3), |(i, _)| 2.0 * targets[i] + 10.0);
//! let curve = fit(targets.view(), measured.view(), CurveModel::Linear).unwrap();
//!
//! let corrected = curve.apply(array![[138.0f32, 138.0, 138.0]].view().into_dyn()).unwrap();
//! assert!((corrected[[0, 0]] - 64.0).abs() < 1e-3);
//! ```

mod curve;
mod fit;
mod model;

pub use curve::{invert_quadratic, CalibrationCurve, ChannelCurve, NEWTON_ITERATIONS};
pub use fit::{fit, fit_named, CalibrationError};
pub use model::{CurveModel, UnknownCurveModel};

//! Feature tensors from a reference grid and a sample grid.
//!
//! Both `(3, rows, cols)` mean-color grids are linearized with the sRGB
//! inverse transfer function, then combined per [`FeatureMode`]:
//!
//! - `ratio`: `sample / ref`, optionally divided by its per-channel mean,
//! - `log_ratio`: `ln(sample) - ln(ref)`, optionally z-scored per channel,
//! - `multi`: 15 channels `[ref, sample, ratio, log_ratio, delta]`, never
//!   normalized.
//!
//! Every denominator and logarithm argument is clamped at `eps`, so the
//! outputs are finite for any input in `[0, 255]`.

mod builder;
mod mode;
mod srgb;

pub use builder::{build_features, FeatureError, FeatureParams, FeatureSet, LinearExtras};
pub use mode::{FeatureMode, UnknownFeatureMode};
pub use srgb::{srgb_to_linear, srgb_to_linear_tensor};

//! Core types shared by the color-card crates.
//!
//! This crate is intentionally small. It defines the borrowed image views the
//! numeric stages read from, the quadrilateral and rectangle types used to
//! describe card regions, the `(3, rows, cols)` mean-color tensor, and the
//! [`ImageOps`] seam behind which low-level image primitives (gradients,
//! connected components, minimum-area rectangles) live. It does *not* depend
//! on any concrete image or vision library.

mod error;
mod geometry;
mod image;
mod logger;
mod ops;
mod tensor;

pub use error::CoreError;
pub use geometry::{PixelRect, Quad};
pub use image::{ChannelOrder, GrayImage, GrayImageView, RgbImageView};
pub use ops::{ComponentLabels, ComponentStats, ImageOps};
pub use tensor::ColorMeanTensor;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};

//! High-level facade for the `colorcard-*` workspace.
//!
//! A photo shows two printed color charts, a *reference* card above a
//! *sample* card. This crate wires the component crates into one pipeline:
//!
//! 1. find both cards on a downscaled edge mask ([`detect::detect_regions`]),
//! 2. sample a robust mean color per grid cell of each card
//!    ([`grid::GridSampler`]),
//! 3. combine the two grids into ratio / log-ratio features
//!    ([`features::build_features`]).
//!
//! Gray-ramp response fitting ([`calib`]) is independent of the per-image
//! flow.
//!
//! ## Quickstart
//!
//! ```no_run
//! use colorcard::{batch, pipeline, PipelineConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = batch::load_rgb("cards.jpg")?;
//! let cfg = PipelineConfig::default();
//! let result = pipeline::process_image(&img, &cfg, &mut StdRng::seed_from_u64(cfg.seed))?;
//! println!("features: {:?}", result.features.features.shape());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `colorcard::core`: image views, quads, mean-color tensors, the `ImageOps` seam.
//! - `colorcard::regions`: picking the reference/sample pair from an edge mask.
//! - `colorcard::grid`: grid layout and robust per-cell sampling.
//! - `colorcard::features`: sRGB linearization and feature tensors.
//! - `colorcard::calib`: per-channel gray response curves.
//! - `colorcard::{detect, pipeline, batch}` (feature `image`): end-to-end helpers
//!   on `image::RgbImage`.

pub use colorcard_calib as calib;
pub use colorcard_core as core;
pub use colorcard_features as features;
pub use colorcard_grid as grid;
pub use colorcard_regions as regions;

mod config;

pub use colorcard_core::{ColorMeanTensor, Quad};
pub use colorcard_features::{FeatureMode, FeatureSet};
pub use colorcard_regions::RegionPair;
pub use config::{PipelineConfig, PipelineConfigError, PipelineError};

#[cfg(feature = "image")]
pub mod batch;
#[cfg(feature = "image")]
pub mod detect;
#[cfg(feature = "image")]
mod ops;
#[cfg(feature = "image")]
pub mod pipeline;

#[cfg(feature = "image")]
pub use ops::ImageprocOps;

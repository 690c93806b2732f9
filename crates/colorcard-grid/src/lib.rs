//! Grid sampling of a color card.
//!
//! A card box is shrunk by independent long/short-side crop ratios, its
//! bounding rectangle is split into `rows × cols` cells, and each cell's
//! central sub-rectangle (a fixed fraction of the cell area) is subsampled
//! into a fixed-size [`SampleSet`]. The cell value is a median/MAD-trimmed
//! mean in canonical RGB order.
//!
//! Geometry ([`GridLayout`]) is computed separately from sampling so that
//! diagnostic drawing can reuse it without touching pixel statistics.
//!
//! ```
//! use colorcard_core::{ChannelOrder, PixelRect, Quad, RgbImageView};
//! use colorcard_grid::{GridParams, GridSampler};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let (w, h) = (120, 80);
//! let pixels = vec![128u8; w * h * 3];
//! let image = RgbImageView::new(w, h, ChannelOrder::Rgb, &pixels).unwrap();
//! let card = Quad::from_rect(PixelRect::new(10, 10, 110, 70));
//!
//! let sampler = GridSampler::new(GridParams { rows: 4, cols: 6, ..GridParams::default() }).unwrap();
//! let means = sampler.sample(&image, &card, &mut StdRng::seed_from_u64(7)).unwrap();
//! assert_eq!((means.rows(), means.cols()), (4, 6));
//! assert_eq!(means.cell(0, 0), [128.0, 128.0, 128.0]);
//! ```

mod layout;
mod params;
mod robust;
mod sampler;

pub use layout::{GridCell, GridLayout};
pub use params::{GridConfigError, GridParams};
pub use robust::{SampleSet, MAD_EPSILON, OUTLIER_MAD_FACTOR};
pub use sampler::{GridError, GridSampler};

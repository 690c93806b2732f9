use colorcard_core::{ColorMeanTensor, PixelRect, Quad, RgbImageView};
use log::debug;
use rand::Rng;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{GridConfigError, GridLayout, GridParams, SampleSet};

/// Errors returned by [`GridSampler`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error(transparent)]
    InvalidConfig(#[from] GridConfigError),
    #[error("cropped card bounds {bounds:?} cannot hold a {rows}x{cols} grid of 1px cells")]
    CellTooSmall {
        bounds: PixelRect,
        rows: usize,
        cols: usize,
    },
    #[error("malformed image buffer ({width}x{height}, {len} bytes)")]
    MalformedImage {
        width: usize,
        height: usize,
        len: usize,
    },
}

/// Computes a robust mean color for every grid cell of a card.
#[derive(Clone, Debug)]
pub struct GridSampler {
    params: GridParams,
}

impl GridSampler {
    /// Validate `params` and build a sampler.
    pub fn new(params: GridParams) -> Result<Self, GridConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Cell geometry for `quad` in a `width × height` image.
    pub fn layout(&self, quad: &Quad, width: usize, height: usize) -> Result<GridLayout, GridError> {
        GridLayout::compute(&self.params, quad, width, height)
    }

    /// Per-cell robust mean colors, shape `(3, rows, cols)`, RGB order.
    ///
    /// All randomness comes from `rng`; the same seed and inputs always give
    /// the same tensor.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image, quad, rng),
            fields(rows = self.params.rows, cols = self.params.cols)
        )
    )]
    pub fn sample<R: Rng + ?Sized>(
        &self,
        image: &RgbImageView<'_>,
        quad: &Quad,
        rng: &mut R,
    ) -> Result<ColorMeanTensor, GridError> {
        let layout = self.layout_checked(image, quad)?;
        Ok(self.sample_layout(image, &layout, rng))
    }

    /// Like [`GridSampler::sample`] but also returns the layout used.
    pub fn sample_with_layout<R: Rng + ?Sized>(
        &self,
        image: &RgbImageView<'_>,
        quad: &Quad,
        rng: &mut R,
    ) -> Result<(ColorMeanTensor, GridLayout), GridError> {
        let layout = self.layout_checked(image, quad)?;
        let means = self.sample_layout(image, &layout, rng);
        Ok((means, layout))
    }

    fn layout_checked(&self, image: &RgbImageView<'_>, quad: &Quad) -> Result<GridLayout, GridError> {
        if !image.is_well_formed() {
            return Err(GridError::MalformedImage {
                width: image.width,
                height: image.height,
                len: image.data.len(),
            });
        }
        let layout = self.layout(quad, image.width, image.height)?;
        debug!(
            "grid {}x{} over {:?}, cell ~{}x{} px",
            layout.rows,
            layout.cols,
            layout.bounds,
            layout.bounds.width() / layout.cols as i32,
            layout.bounds.height() / layout.rows as i32
        );
        Ok(layout)
    }

    fn sample_layout<R: Rng + ?Sized>(
        &self,
        image: &RgbImageView<'_>,
        layout: &GridLayout,
        rng: &mut R,
    ) -> ColorMeanTensor {
        let mut means = ColorMeanTensor::zeros(layout.rows, layout.cols);
        for cell in &layout.cells {
            let set = SampleSet::draw(image, &cell.center, self.params.sample_count, rng);
            means.set_cell(cell.row, cell.col, set.robust_mean());
        }
        means
    }
}

use colorcard_core::{PixelRect, RgbImageView};
use rand::seq::index;
use rand::Rng;

/// Samples further than this many MADs from the median (on any channel)
/// are dropped.
pub const OUTLIER_MAD_FACTOR: f32 = 2.5;

/// Added to every MAD so flat patches keep a non-zero acceptance band.
pub const MAD_EPSILON: f32 = 1e-6;

/// Fixed-size set of RGB samples drawn from one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleSet {
    samples: Vec<[f32; 3]>,
}

impl SampleSet {
    /// Draw exactly `count` pixels (canonical RGB) from `rect`.
    ///
    /// With at least `count` pixels available the draw is uniform without
    /// replacement; otherwise the available pixels are repeated in raster
    /// order. An empty rectangle yields `count` black samples.
    pub fn draw<R: Rng + ?Sized>(
        image: &RgbImageView<'_>,
        rect: &PixelRect,
        count: usize,
        rng: &mut R,
    ) -> Self {
        let rect = rect.clamped(image.width, image.height);
        let available = rect.area();
        if available == 0 {
            return Self {
                samples: vec![[0.0; 3]; count],
            };
        }

        let w = rect.width() as usize;
        let pixel = |k: usize| {
            let x = rect.x0 as usize + k % w;
            let y = rect.y0 as usize + k / w;
            image.rgb(x, y).map(f32::from)
        };

        let samples = if available >= count {
            index::sample(rng, available, count)
                .into_iter()
                .map(pixel)
                .collect()
        } else {
            (0..count).map(|k| pixel(k % available)).collect()
        };
        Self { samples }
    }

    pub fn from_samples(samples: Vec<[f32; 3]>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[[f32; 3]] {
        &self.samples
    }

    pub fn median(&self) -> [f32; 3] {
        std::array::from_fn(|c| median(self.samples.iter().map(|s| s[c]).collect()))
    }

    /// Median absolute deviation per channel around `center`, plus
    /// [`MAD_EPSILON`].
    pub fn mad(&self, center: &[f32; 3]) -> [f32; 3] {
        std::array::from_fn(|c| {
            median(self.samples.iter().map(|s| (s[c] - center[c]).abs()).collect()) + MAD_EPSILON
        })
    }

    /// Drop samples outside `OUTLIER_MAD_FACTOR × MAD` of the median on any
    /// channel, then repeat the survivors back up to the original size.
    ///
    /// If no sample survives on all three channels the set is returned
    /// unchanged.
    pub fn reject_outliers(self) -> Self {
        let target = self.samples.len();
        if target == 0 {
            return self;
        }
        let med = self.median();
        let mad = self.mad(&med);
        let inliers: Vec<[f32; 3]> = self
            .samples
            .iter()
            .copied()
            .filter(|s| (0..3).all(|c| (s[c] - med[c]).abs() <= OUTLIER_MAD_FACTOR * mad[c]))
            .collect();

        if inliers.is_empty() {
            log::debug!("no joint inliers among {target} samples, keeping all");
            return self;
        }
        if inliers.len() < target {
            log::trace!("kept {} of {target} samples", inliers.len());
        }
        let samples = (0..target).map(|k| inliers[k % inliers.len()]).collect();
        Self { samples }
    }

    /// Arithmetic mean per channel (zeros for an empty set).
    pub fn mean(&self) -> [f32; 3] {
        if self.samples.is_empty() {
            return [0.0; 3];
        }
        let mut acc = [0f64; 3];
        for s in &self.samples {
            for c in 0..3 {
                acc[c] += s[c] as f64;
            }
        }
        let n = self.samples.len() as f64;
        acc.map(|v| (v / n) as f32)
    }

    /// Outlier-trimmed mean of the set.
    pub fn robust_mean(self) -> [f32; 3] {
        self.reject_outliers().mean()
    }
}

/// Median with the midpoint convention for even lengths.
fn median(mut values: Vec<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

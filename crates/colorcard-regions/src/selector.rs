use colorcard_core::{ComponentStats, GrayImageView, ImageOps, Quad};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Malformed selector input. "No cards found" is reported as `Ok(None)`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("malformed mask: {width}x{height} needs {expected} bytes, got {got}")]
    MalformedMask {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
}

/// The two selected card regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPair {
    /// Card with the smaller mean y (physically above the other).
    pub reference: Quad,
    pub sample: Quad,
}

impl RegionPair {
    /// Order two boxes by mean y; on equal means the first argument wins.
    pub fn from_unordered(a: Quad, b: Quad) -> Self {
        if b.mean_y() < a.mean_y() {
            Self {
                reference: b,
                sample: a,
            }
        } else {
            Self {
                reference: a,
                sample: b,
            }
        }
    }

    /// Map both boxes with `(sx, sy)` scale factors.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            reference: self.reference.scaled(sx, sy),
            sample: self.sample.scaled(sx, sy),
        }
    }
}

/// Picks the reference and sample cards out of an edge mask.
pub struct RegionSelector<O> {
    ops: O,
}

impl<O: ImageOps> RegionSelector<O> {
    pub fn new(ops: O) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Select `(reference, sample)` from `mask` (non-zero = edge).
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, mask), fields(width = mask.width, height = mask.height))
    )]
    pub fn select(&self, mask: &GrayImageView<'_>) -> Result<Option<RegionPair>, RegionError> {
        if !mask.is_well_formed() {
            return Err(RegionError::MalformedMask {
                width: mask.width,
                height: mask.height,
                expected: mask.width.saturating_mul(mask.height),
                got: mask.data.len(),
            });
        }

        let labels = self.ops.label_components(mask);
        debug!("labeled {} foreground components", labels.stats.len());
        if labels.stats.len() < 2 {
            return Ok(None);
        }

        let top = largest_two(&labels.stats);
        let mut boxes = Vec::with_capacity(2);
        for stats in top {
            let component = labels.component_mask(stats.label);
            match self.ops.min_area_quad(&component.view()) {
                Some(quad) if quad.is_valid() => boxes.push(quad),
                other => {
                    debug!(
                        "component {} (area {}) has no usable quad: {:?}",
                        stats.label, stats.area, other
                    );
                }
            }
        }

        let (a, b) = match boxes.as_slice() {
            [a, b] => (*a, *b),
            _ => return Ok(None),
        };
        let pair = RegionPair::from_unordered(a, b);
        debug!(
            "reference mean y {:.1}, sample mean y {:.1}",
            pair.reference.mean_y(),
            pair.sample.mean_y()
        );
        Ok(Some(pair))
    }
}

/// Two largest components by area; equal areas keep the lower label first.
fn largest_two(stats: &[ComponentStats]) -> [ComponentStats; 2] {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|a, b| b.area.cmp(&a.area).then(a.label.cmp(&b.label)));
    [ranked[0], ranked[1]]
}

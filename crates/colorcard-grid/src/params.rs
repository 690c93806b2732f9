use serde::{Deserialize, Serialize};

/// Out-of-range grid sampling parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GridConfigError {
    #[error("grid dimensions must be positive (rows={rows}, cols={cols})")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("{name} crop ratio must lie in [0, 0.5), got {value}")]
    CropRatio { name: &'static str, value: f32 },
    #[error("center area ratio must lie in (0, 1], got {0}")]
    CenterAreaRatio(f32),
    #[error("sample count must be positive")]
    ZeroSampleCount,
}

/// Grid sampling configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub rows: usize,
    pub cols: usize,
    /// Fraction of the long side trimmed from each end.
    pub crop_long: f32,
    /// Fraction of the short side trimmed from each end.
    pub crop_short: f32,
    /// Area fraction of each cell that is sampled, centered.
    pub center_area_ratio: f32,
    /// Pixels drawn per cell.
    pub sample_count: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 12,
            crop_long: 0.01,
            crop_short: 0.02,
            center_area_ratio: 0.40,
            sample_count: 100,
        }
    }
}

impl GridParams {
    pub fn validate(&self) -> Result<(), GridConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GridConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for (name, value) in [("long", self.crop_long), ("short", self.crop_short)] {
            if !(0.0..0.5).contains(&value) {
                return Err(GridConfigError::CropRatio { name, value });
            }
        }
        if !(self.center_area_ratio > 0.0 && self.center_area_ratio <= 1.0) {
            return Err(GridConfigError::CenterAreaRatio(self.center_area_ratio));
        }
        if self.sample_count == 0 {
            return Err(GridConfigError::ZeroSampleCount);
        }
        Ok(())
    }

    /// Side-length fraction of the sampled center: `sqrt(center_area_ratio)`.
    pub fn center_side_ratio(&self) -> f32 {
        self.center_area_ratio.clamp(0.0, 1.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GridParams::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let base = GridParams::default();
        let cases = [
            GridParams { rows: 0, ..base.clone() },
            GridParams { cols: 0, ..base.clone() },
            GridParams { crop_long: 0.5, ..base.clone() },
            GridParams { crop_short: -0.1, ..base.clone() },
            GridParams { center_area_ratio: 0.0, ..base.clone() },
            GridParams { center_area_ratio: 1.01, ..base.clone() },
            GridParams { center_area_ratio: f32::NAN, ..base.clone() },
            GridParams { sample_count: 0, ..base.clone() },
        ];
        for p in cases {
            assert!(p.validate().is_err(), "{p:?} should be rejected");
        }
        assert!(GridParams { center_area_ratio: 1.0, ..base }.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let p: GridParams = serde_json::from_str(r#"{"rows": 4, "cols": 6}"#).unwrap();
        assert_eq!((p.rows, p.cols), (4, 6));
        assert_eq!(p.sample_count, 100);
    }
}

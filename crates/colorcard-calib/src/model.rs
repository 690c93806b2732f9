use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Response model fitted per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveModel {
    /// `a1·t + a0`
    #[default]
    Linear,
    /// `a2·t² + a1·t + a0`
    Poly2,
}

impl CurveModel {
    pub const ALL: [CurveModel; 2] = [CurveModel::Linear, CurveModel::Poly2];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurveModel::Linear => "linear",
            CurveModel::Poly2 => "poly2",
        }
    }

    /// Number of polynomial coefficients.
    pub fn coefficients(&self) -> usize {
        match self {
            CurveModel::Linear => 2,
            CurveModel::Poly2 => 3,
        }
    }

    /// Fewest gray levels [`fit`](crate::fit) accepts. An underdetermined
    /// linear fit resolves to the minimum-norm line; `poly2` insists on a
    /// determined system.
    pub fn min_points(&self) -> usize {
        match self {
            CurveModel::Linear => 1,
            CurveModel::Poly2 => 3,
        }
    }
}

impl fmt::Display for CurveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown calibration mode {0:?} (expected linear or poly2)")]
pub struct UnknownCurveModel(pub String);

impl FromStr for CurveModel {
    type Err = UnknownCurveModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurveModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownCurveModel(s.to_string()))
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the reference and sample grids are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMode {
    /// `ln(sample) - ln(ref)`, 3 channels.
    #[default]
    LogRatio,
    /// `sample / ref`, 3 channels.
    Ratio,
    /// `[ref, sample, ratio, log_ratio, delta]`, 15 channels.
    Multi,
}

impl FeatureMode {
    pub const ALL: [FeatureMode; 3] = [FeatureMode::LogRatio, FeatureMode::Ratio, FeatureMode::Multi];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureMode::LogRatio => "log_ratio",
            FeatureMode::Ratio => "ratio",
            FeatureMode::Multi => "multi",
        }
    }

    /// Channel count of the feature tensor in this mode.
    pub fn channels(&self) -> usize {
        match self {
            FeatureMode::LogRatio | FeatureMode::Ratio => 3,
            FeatureMode::Multi => 15,
        }
    }
}

impl fmt::Display for FeatureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown feature mode {0:?} (expected one of log_ratio, ratio, multi)")]
pub struct UnknownFeatureMode(pub String);

impl FromStr for FeatureMode {
    type Err = UnknownFeatureMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownFeatureMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        for mode in FeatureMode::ALL {
            assert_eq!(mode.as_str().parse::<FeatureMode>(), Ok(mode));
        }
    }

    #[test]
    fn unknown_names_fail_loudly() {
        let err = "logratio".parse::<FeatureMode>().unwrap_err();
        assert_eq!(err, UnknownFeatureMode("logratio".into()));
        assert!(err.to_string().contains("logratio"));
        assert!(serde_json::from_str::<FeatureMode>("\"delta\"").is_err());
    }

    #[test]
    fn serde_names_match_display() {
        let json = serde_json::to_string(&FeatureMode::LogRatio).unwrap();
        assert_eq!(json, "\"log_ratio\"");
    }
}

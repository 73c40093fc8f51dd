//! Reduction kinds and traversal strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// How multiple values collapse into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Values are accumulated without normalization.
    #[serde(alias = "RAW")]
    Raw,
    #[default]
    #[serde(alias = "SUM")]
    Sum,
    #[serde(alias = "MEAN")]
    Mean,
}

impl Reduction {
    pub fn is_mean(&self) -> bool {
        matches!(self, Reduction::Mean)
    }

    /// Normalize an accumulated total over `count` contributors.
    ///
    /// A mean over zero contributors is NaN.
    pub fn finish(&self, total: f64, count: usize) -> f64 {
        match self {
            Reduction::Mean if count == 0 => f64::NAN,
            Reduction::Mean => total / count as f64,
            Reduction::Raw | Reduction::Sum => total,
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reduction::Raw => "raw",
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
        };
        f.write_str(s)
    }
}

impl FromStr for Reduction {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Reduction::Raw),
            "sum" => Ok(Reduction::Sum),
            "mean" | "avg" => Ok(Reduction::Mean),
            other => Err(MeshError::InvalidParameter {
                param: "reduction".to_string(),
                message: format!("unknown reduction '{}'", other),
            }),
        }
    }
}

/// Access pattern used when reducing over the vertical axis per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    /// One read per cell spanning every height level.
    PerCell,
    /// One read per level spanning every cell.
    #[default]
    PerLevel,
}

impl FromStr for Traversal {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "per-cell" | "cell" => Ok(Traversal::PerCell),
            "per-level" | "level" => Ok(Traversal::PerLevel),
            other => Err(MeshError::InvalidParameter {
                param: "traversal".to_string(),
                message: format!("unknown traversal '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_mean_divides() {
        assert_eq!(Reduction::Mean.finish(7.0, 2), 3.5);
        assert_eq!(Reduction::Sum.finish(7.0, 2), 7.0);
        assert_eq!(Reduction::Raw.finish(7.0, 2), 7.0);
    }

    #[test]
    fn test_finish_mean_empty_is_nan() {
        assert!(Reduction::Mean.finish(0.0, 0).is_nan());
        assert_eq!(Reduction::Sum.finish(0.0, 0), 0.0);
    }

    #[test]
    fn test_parse_reduction() {
        assert_eq!("MEAN".parse::<Reduction>().unwrap(), Reduction::Mean);
        assert_eq!("sum".parse::<Reduction>().unwrap(), Reduction::Sum);
        assert!("median".parse::<Reduction>().is_err());
    }

    #[test]
    fn test_reduction_serde() {
        let r: Reduction = serde_json::from_str("\"MEAN\"").unwrap();
        assert_eq!(r, Reduction::Mean);
        assert_eq!(serde_json::to_string(&Reduction::Raw).unwrap(), "\"raw\"");
    }

    #[test]
    fn test_parse_traversal() {
        assert_eq!("per_cell".parse::<Traversal>().unwrap(), Traversal::PerCell);
        assert_eq!("Per-Level".parse::<Traversal>().unwrap(), Traversal::PerLevel);
        assert_eq!(Traversal::default(), Traversal::PerLevel);
    }
}

//! Request types for the engine operations.
//!
//! Each request names a dataset, and all but [`MeshRequest`] a variable, a
//! domain and a time step. Builder methods fill in the optional parts:
//!
//! ```rust
//! use mesh_aggregator::{LatProfileRequest, TrisAggRequest};
//! use mesh_common::{Domain, Reduction, Traversal};
//!
//! let profile = LatProfileRequest::new("icon_2024.nc", "temp", Domain::Dom01)
//!     .at_time(3)
//!     .at_height(10)
//!     .with_reduction(Reduction::Mean);
//!
//! let tris = TrisAggRequest::new("icon_2024.nc", "temp", Domain::Dom02)
//!     .with_traversal(Traversal::PerCell);
//! ```

use mesh_common::{Domain, Reduction, Traversal};
use serde::{Deserialize, Serialize};

/// Latitude profiles of every height level at one time step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightProfileRequest {
    pub dataset: String,
    pub variable: String,
    pub domain: Domain,
    pub time: usize,
    pub reduction: Reduction,
}

impl HeightProfileRequest {
    pub fn new(dataset: impl Into<String>, variable: impl Into<String>, domain: Domain) -> Self {
        Self {
            dataset: dataset.into(),
            variable: variable.into(),
            domain,
            time: 0,
            reduction: Reduction::default(),
        }
    }

    pub fn at_time(mut self, time: usize) -> Self {
        self.time = time;
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }
}

/// Latitude profile of one `(time, height)` level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatProfileRequest {
    pub dataset: String,
    pub variable: String,
    pub domain: Domain,
    pub time: usize,
    pub height: usize,
    pub reduction: Reduction,
}

impl LatProfileRequest {
    pub fn new(dataset: impl Into<String>, variable: impl Into<String>, domain: Domain) -> Self {
        Self {
            dataset: dataset.into(),
            variable: variable.into(),
            domain,
            time: 0,
            height: 0,
            reduction: Reduction::default(),
        }
    }

    pub fn at_time(mut self, time: usize) -> Self {
        self.time = time;
        self
    }

    pub fn at_height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }
}

/// Triangle geometry of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshRequest {
    pub dataset: String,
    pub domain: Domain,
}

impl MeshRequest {
    pub fn new(dataset: impl Into<String>, domain: Domain) -> Self {
        Self {
            dataset: dataset.into(),
            domain,
        }
    }
}

/// Raw per-cell values of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrisRequest {
    pub dataset: String,
    pub variable: String,
    pub domain: Domain,
    pub time: usize,
    pub height: usize,
}

impl TrisRequest {
    pub fn new(dataset: impl Into<String>, variable: impl Into<String>, domain: Domain) -> Self {
        Self {
            dataset: dataset.into(),
            variable: variable.into(),
            domain,
            time: 0,
            height: 0,
        }
    }

    pub fn at_time(mut self, time: usize) -> Self {
        self.time = time;
        self
    }

    pub fn at_height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }
}

/// Per-cell reduction over every height level, whole or streamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrisAggRequest {
    pub dataset: String,
    pub variable: String,
    pub domain: Domain,
    pub time: usize,
    pub reduction: Reduction,
    /// Overrides the engine's configured traversal.
    pub traversal: Option<Traversal>,
}

impl TrisAggRequest {
    pub fn new(dataset: impl Into<String>, variable: impl Into<String>, domain: Domain) -> Self {
        Self {
            dataset: dataset.into(),
            variable: variable.into(),
            domain,
            time: 0,
            reduction: Reduction::default(),
            traversal: None,
        }
    }

    pub fn at_time(mut self, time: usize) -> Self {
        self.time = time;
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = Some(traversal);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = LatProfileRequest::new("a.nc", "temp", Domain::Dom01);
        assert_eq!(req.time, 0);
        assert_eq!(req.height, 0);
        assert_eq!(req.reduction, Reduction::Sum);

        let req = TrisAggRequest::new("a.nc", "temp", Domain::Dom02);
        assert_eq!(req.traversal, None);
    }

    #[test]
    fn test_builder_chain() {
        let req = TrisAggRequest::new("a.nc", "temp", Domain::Dom02)
            .at_time(4)
            .with_reduction(Reduction::Mean)
            .with_traversal(Traversal::PerCell);
        assert_eq!(req.time, 4);
        assert_eq!(req.reduction, Reduction::Mean);
        assert_eq!(req.traversal, Some(Traversal::PerCell));
    }

    #[test]
    fn test_deserialize_request() {
        let req: HeightProfileRequest = serde_json::from_str(
            r#"{"dataset":"a.nc","variable":"temp","domain":"DOM02","time":1,"reduction":"MEAN"}"#,
        )
        .unwrap();
        assert_eq!(req.domain, Domain::Dom02);
        assert_eq!(req.reduction, Reduction::Mean);
    }
}

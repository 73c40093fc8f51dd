//! Domain registry for the supported ICON grids.
//!
//! Each domain is an unstructured triangular grid with a fixed number of
//! cells. All domains share the same latitude binning (one bin per degree
//! of latitude band).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Number of latitude bins every domain is reduced into.
pub const LAT_BIN_COUNT: usize = 360;

/// Cell count of the global DOM01 grid.
pub const DOM01_CELLS: usize = 327_680;

/// Cell count of the DOM02 grid.
///
/// Assumed equal to DOM01 since both lookup tables are sized from the same
/// cell count; override it in configuration for a differently sized nest.
pub const DOM02_CELLS: usize = DOM01_CELLS;

/// A supported grid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Domain {
    Dom01,
    Dom02,
}

impl Domain {
    /// All known domains, in registry order.
    pub const ALL: [Domain; 2] = [Domain::Dom01, Domain::Dom02];

    /// Upper-case identifier used on the wire (`DOM01`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Dom01 => "DOM01",
            Domain::Dom02 => "DOM02",
        }
    }

    /// Lower-case identifier used for on-disk membership files (`dom01`).
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Domain::Dom01 => "dom01",
            Domain::Dom02 => "dom02",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let digits = normalized.strip_prefix("dom").unwrap_or(&normalized);
        match digits.trim_start_matches('0') {
            "1" => Ok(Domain::Dom01),
            "2" => Ok(Domain::Dom02),
            _ => Err(MeshError::UnknownDomain(s.to_string())),
        }
    }
}

impl TryFrom<String> for Domain {
    type Error = MeshError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.as_str().to_string()
    }
}

/// Static description of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainSpec {
    pub domain: Domain,
    /// Number of triangular cells in the grid.
    pub cell_count: usize,
    /// Number of latitude bins.
    pub lat_bin_count: usize,
}

impl DomainSpec {
    pub fn new(domain: Domain, cell_count: usize) -> Self {
        Self {
            domain,
            cell_count,
            lat_bin_count: LAT_BIN_COUNT,
        }
    }

    /// Length of the reconstructed mesh vertex arrays (three vertices per cell).
    pub fn mesh_len(&self) -> usize {
        3 * self.cell_count
    }
}

/// Registry of all domains served by the process.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRegistry {
    dom01: DomainSpec,
    dom02: DomainSpec,
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self {
            dom01: DomainSpec::new(Domain::Dom01, DOM01_CELLS),
            dom02: DomainSpec::new(Domain::Dom02, DOM02_CELLS),
        }
    }
}

impl DomainRegistry {
    /// Create a registry with explicit cell counts.
    pub fn new(dom01_cells: usize, dom02_cells: usize) -> Self {
        Self {
            dom01: DomainSpec::new(Domain::Dom01, dom01_cells),
            dom02: DomainSpec::new(Domain::Dom02, dom02_cells),
        }
    }

    /// Replace the cell count of one domain.
    pub fn with_cell_count(mut self, domain: Domain, cell_count: usize) -> Self {
        match domain {
            Domain::Dom01 => self.dom01 = DomainSpec::new(domain, cell_count),
            Domain::Dom02 => self.dom02 = DomainSpec::new(domain, cell_count),
        }
        self
    }

    pub fn get(&self, domain: Domain) -> &DomainSpec {
        match domain {
            Domain::Dom01 => &self.dom01,
            Domain::Dom02 => &self.dom02,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainSpec> {
        [&self.dom01, &self.dom02].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse_variants() {
        assert_eq!("DOM01".parse::<Domain>().unwrap(), Domain::Dom01);
        assert_eq!("dom02".parse::<Domain>().unwrap(), Domain::Dom02);
        assert_eq!("1".parse::<Domain>().unwrap(), Domain::Dom01);
        assert_eq!(" 02 ".parse::<Domain>().unwrap(), Domain::Dom02);
        assert!("dom03".parse::<Domain>().is_err());
        assert!("".parse::<Domain>().is_err());
    }

    #[test]
    fn test_default_registry() {
        let registry = DomainRegistry::default();
        assert_eq!(registry.get(Domain::Dom01).cell_count, DOM01_CELLS);
        assert_eq!(registry.get(Domain::Dom02).cell_count, DOM01_CELLS);
        assert_eq!(registry.get(Domain::Dom02).lat_bin_count, LAT_BIN_COUNT);
    }

    #[test]
    fn test_override_cell_count() {
        let registry = DomainRegistry::default().with_cell_count(Domain::Dom02, 8);
        assert_eq!(registry.get(Domain::Dom02).cell_count, 8);
        assert_eq!(registry.get(Domain::Dom02).mesh_len(), 24);
        assert_eq!(registry.get(Domain::Dom01).cell_count, DOM01_CELLS);
    }
}

//! Cell-to-latitude-bin lookup tables.
//!
//! Every domain has a table mapping each cell index to one of the latitude
//! bins, plus the number of cells assigned to each bin. Tables are built once
//! at startup from per-bin membership lists and never mutated afterwards, so
//! request handlers share them through `Arc` without locking.
//!
//! # Membership files
//!
//! [`DirectoryMembership`] reads one text file per bin:
//!
//! ```text
//! <root>/dom01/dom01_lon_0deg.dat
//! <root>/dom01/dom01_lon_1deg.dat
//! ...
//! <root>/dom02/dom02_lon_359deg.dat
//! ```
//!
//! each holding one decimal cell index per line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mesh_common::{Domain, DomainRegistry, DomainSpec};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while building a lookup table.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Membership entries are missing for some bins.
    #[error("latitude membership for {domain} unavailable ({missing_bins} bins missing)")]
    Unavailable { domain: Domain, missing_bins: usize },

    /// Some cells are not listed in any bin.
    #[error("latitude membership for {domain} leaves {unassigned_cells} cells without a bin")]
    Incomplete {
        domain: Domain,
        unassigned_cells: usize,
    },

    /// A membership entry is malformed or inconsistent with the domain.
    #[error("invalid latitude membership for {domain} bin {bin}: {message}")]
    InvalidMembership {
        domain: Domain,
        bin: usize,
        message: String,
    },

    /// Reading a membership entry failed for a reason other than absence.
    #[error("failed to read latitude membership for {domain} bin {bin}: {source}")]
    Io {
        domain: Domain,
        bin: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Provides the cells belonging to each latitude bin.
pub trait MembershipSource: Send + Sync {
    /// Cells of `bin` in `domain`, or `None` when the entry is absent.
    fn bin_members(
        &self,
        domain: Domain,
        bin: usize,
    ) -> std::result::Result<Option<Vec<usize>>, LookupError>;
}

/// Membership read from per-bin text files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryMembership {
    root: PathBuf,
}

impl DirectoryMembership {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the membership file for one bin.
    pub fn bin_path(&self, domain: Domain, bin: usize) -> PathBuf {
        let prefix = domain.file_prefix();
        self.root
            .join(prefix)
            .join(format!("{}_lon_{}deg.dat", prefix, bin))
    }
}

impl MembershipSource for DirectoryMembership {
    fn bin_members(
        &self,
        domain: Domain,
        bin: usize,
    ) -> std::result::Result<Option<Vec<usize>>, LookupError> {
        let path = self.bin_path(domain, bin);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(LookupError::Io { domain, bin, source }),
        };

        let mut cells = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let cell = line
                .parse::<usize>()
                .map_err(|e| LookupError::InvalidMembership {
                    domain,
                    bin,
                    message: format!("line {}: '{}': {}", line_no + 1, line, e),
                })?;
            cells.push(cell);
        }
        Ok(Some(cells))
    }
}

/// Membership held in memory as `(bin, cells)` pairs per domain.
#[derive(Debug, Clone, Default)]
pub struct StaticMembership {
    bins: HashMap<Domain, HashMap<usize, Vec<usize>>>,
}

impl StaticMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(
        mut self,
        domain: Domain,
        pairs: impl IntoIterator<Item = (usize, Vec<usize>)>,
    ) -> Self {
        self.bins.insert(domain, pairs.into_iter().collect());
        self
    }
}

impl MembershipSource for StaticMembership {
    fn bin_members(
        &self,
        domain: Domain,
        bin: usize,
    ) -> std::result::Result<Option<Vec<usize>>, LookupError> {
        Ok(self
            .bins
            .get(&domain)
            .and_then(|bins| bins.get(&bin))
            .cloned())
    }
}

/// What to do when membership data is missing or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// Warn and serve with a partially or fully default table.
    #[default]
    Degrade,
    /// Refuse to start.
    FailFast,
}

/// Completeness of a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupStatus {
    Complete,
    Degraded {
        missing_bins: usize,
        unassigned_cells: usize,
        reason: String,
    },
}

/// Cell-to-bin mapping and per-bin cell counts for one domain.
#[derive(Debug, Clone)]
pub struct LatitudeLookup {
    domain: Domain,
    cell_to_bin: Vec<u16>,
    bin_count: Vec<u32>,
    status: LookupStatus,
}

impl LatitudeLookup {
    /// The default table: every cell in bin 0, every count zero.
    pub fn unassigned(spec: &DomainSpec) -> Self {
        Self {
            domain: spec.domain,
            cell_to_bin: vec![0; spec.cell_count],
            bin_count: vec![0; spec.lat_bin_count],
            status: LookupStatus::Complete,
        }
    }

    /// Build a table from membership pairs, rejecting any inconsistency.
    pub fn from_membership(
        spec: &DomainSpec,
        pairs: impl IntoIterator<Item = (usize, Vec<usize>)>,
    ) -> std::result::Result<Self, LookupError> {
        let mut builder = TableBuilder::new(spec);
        for (bin, cells) in pairs {
            builder.assign(bin, &cells)?;
        }
        let unassigned_cells = builder.unassigned_cells();
        if unassigned_cells > 0 {
            return Err(LookupError::Incomplete {
                domain: spec.domain,
                unassigned_cells,
            });
        }
        Ok(builder.finish(LookupStatus::Complete))
    }

    /// Build a table by querying `source` for every bin of the domain.
    pub fn build(
        spec: &DomainSpec,
        source: &dyn MembershipSource,
        policy: LookupPolicy,
    ) -> std::result::Result<Self, LookupError> {
        let domain = spec.domain;
        let mut builder = TableBuilder::new(spec);
        let mut missing_bins = 0usize;

        for bin in 0..spec.lat_bin_count {
            let assigned = source
                .bin_members(domain, bin)
                .and_then(|members| match members {
                    Some(cells) => builder.assign(bin, &cells).map(|_| true),
                    None => Ok(false),
                });

            match assigned {
                Ok(true) => {}
                Ok(false) => missing_bins += 1,
                Err(e) => match policy {
                    LookupPolicy::FailFast => return Err(e),
                    LookupPolicy::Degrade => {
                        warn!(
                            domain = %domain,
                            error = %e,
                            "Invalid latitude membership, falling back to default table"
                        );
                        let mut lookup = Self::unassigned(spec);
                        lookup.status = LookupStatus::Degraded {
                            missing_bins: spec.lat_bin_count,
                            unassigned_cells: spec.cell_count,
                            reason: e.to_string(),
                        };
                        return Ok(lookup);
                    }
                },
            }
        }

        let unassigned_cells = builder.unassigned_cells();
        if policy == LookupPolicy::FailFast {
            if missing_bins > 0 {
                return Err(LookupError::Unavailable {
                    domain,
                    missing_bins,
                });
            }
            if unassigned_cells > 0 {
                return Err(LookupError::Incomplete {
                    domain,
                    unassigned_cells,
                });
            }
        }

        let status = if missing_bins == 0 && unassigned_cells == 0 {
            LookupStatus::Complete
        } else {
            warn!(
                domain = %domain,
                missing_bins,
                unassigned_cells,
                "Latitude membership incomplete, aggregation for this domain will be degraded"
            );
            let reason = if missing_bins > 0 {
                "membership entries missing".to_string()
            } else {
                format!("{} cells not listed in any bin", unassigned_cells)
            };
            LookupStatus::Degraded {
                missing_bins,
                unassigned_cells,
                reason,
            }
        };
        let lookup = builder.finish(status);

        info!(
            domain = %domain,
            cells = lookup.cell_count(),
            assigned = lookup.assigned_cells(),
            missing_bins,
            "Built latitude lookup"
        );

        Ok(lookup)
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn cell_to_bin(&self) -> &[u16] {
        &self.cell_to_bin
    }

    pub fn bin_count(&self) -> &[u32] {
        &self.bin_count
    }

    pub fn cell_count(&self) -> usize {
        self.cell_to_bin.len()
    }

    pub fn lat_bin_count(&self) -> usize {
        self.bin_count.len()
    }

    /// Number of cells that received an explicit bin assignment.
    pub fn assigned_cells(&self) -> usize {
        self.bin_count.iter().map(|&c| c as usize).sum()
    }

    pub fn status(&self) -> &LookupStatus {
        &self.status
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, LookupStatus::Degraded { .. })
    }
}

struct TableBuilder {
    domain: Domain,
    cell_to_bin: Vec<u16>,
    bin_count: Vec<u32>,
    assigned: Vec<bool>,
}

impl TableBuilder {
    fn new(spec: &DomainSpec) -> Self {
        Self {
            domain: spec.domain,
            cell_to_bin: vec![0; spec.cell_count],
            bin_count: vec![0; spec.lat_bin_count],
            assigned: vec![false; spec.cell_count],
        }
    }

    fn assign(&mut self, bin: usize, cells: &[usize]) -> std::result::Result<(), LookupError> {
        let domain = self.domain;
        let invalid = |message: String| LookupError::InvalidMembership {
            domain,
            bin,
            message,
        };

        if bin >= self.bin_count.len() {
            return Err(invalid(format!(
                "bin index exceeds {} bins",
                self.bin_count.len()
            )));
        }
        let bin_index = u16::try_from(bin).map_err(|e| invalid(e.to_string()))?;

        for &cell in cells {
            if cell >= self.cell_to_bin.len() {
                return Err(invalid(format!(
                    "cell {} exceeds cell count {}",
                    cell,
                    self.cell_to_bin.len()
                )));
            }
            if self.assigned[cell] {
                return Err(invalid(format!("cell {} assigned more than once", cell)));
            }
            self.assigned[cell] = true;
            self.cell_to_bin[cell] = bin_index;
            self.bin_count[bin] += 1;
        }
        Ok(())
    }

    fn unassigned_cells(&self) -> usize {
        self.assigned.iter().filter(|&&a| !a).count()
    }

    fn finish(self, status: LookupStatus) -> LatitudeLookup {
        LatitudeLookup {
            domain: self.domain,
            cell_to_bin: self.cell_to_bin,
            bin_count: self.bin_count,
            status,
        }
    }
}

/// Lookup tables for every domain in the registry.
#[derive(Debug, Clone)]
pub struct LookupTables {
    dom01: Arc<LatitudeLookup>,
    dom02: Arc<LatitudeLookup>,
}

impl LookupTables {
    /// Build the tables for every registered domain.
    pub fn build(
        registry: &DomainRegistry,
        source: &dyn MembershipSource,
        policy: LookupPolicy,
    ) -> std::result::Result<Self, LookupError> {
        let dom01 = LatitudeLookup::build(registry.get(Domain::Dom01), source, policy)?;
        let dom02 = LatitudeLookup::build(registry.get(Domain::Dom02), source, policy)?;
        Ok(Self::new(dom01, dom02))
    }

    pub fn new(dom01: LatitudeLookup, dom02: LatitudeLookup) -> Self {
        Self {
            dom01: Arc::new(dom01),
            dom02: Arc::new(dom02),
        }
    }

    pub fn get(&self, domain: Domain) -> &Arc<LatitudeLookup> {
        match domain {
            Domain::Dom01 => &self.dom01,
            Domain::Dom02 => &self.dom02,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LatitudeLookup>> {
        [&self.dom01, &self.dom02].into_iter()
    }

    pub fn any_degraded(&self) -> bool {
        self.iter().any(|l| l.is_degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{banded_membership, fixtures::two_bin};

    fn two_bin_spec() -> DomainSpec {
        DomainSpec {
            domain: Domain::Dom01,
            cell_count: two_bin::CELL_COUNT,
            lat_bin_count: two_bin::BIN_COUNT,
        }
    }

    #[test]
    fn test_from_membership_assigns_bins() {
        let lookup = LatitudeLookup::from_membership(&two_bin_spec(), two_bin::membership()).unwrap();
        let bins: Vec<usize> = lookup.cell_to_bin().iter().map(|&b| b as usize).collect();
        assert_eq!(bins, two_bin::CELL_TO_BIN.to_vec());
        assert_eq!(lookup.bin_count(), &two_bin::BIN_COUNTS);
        assert!(!lookup.is_degraded());
    }

    #[test]
    fn test_rejects_duplicate_cell() {
        let err = LatitudeLookup::from_membership(
            &two_bin_spec(),
            vec![(0, vec![0, 1]), (1, vec![1, 2])],
        )
        .unwrap_err();
        assert!(matches!(err, LookupError::InvalidMembership { bin: 1, .. }));
    }

    #[test]
    fn test_rejects_out_of_range_cell() {
        let err =
            LatitudeLookup::from_membership(&two_bin_spec(), vec![(0, vec![4])]).unwrap_err();
        assert!(err.to_string().contains("exceeds cell count"));
    }

    #[test]
    fn test_build_complete() {
        let spec = DomainSpec::new(Domain::Dom02, 1000);
        let source = StaticMembership::new().with_domain(Domain::Dom02, banded_membership(1000, 360));
        let lookup = LatitudeLookup::build(&spec, &source, LookupPolicy::FailFast).unwrap();
        assert_eq!(lookup.status(), &LookupStatus::Complete);
        assert_eq!(lookup.assigned_cells(), 1000);
        assert_eq!(lookup.lat_bin_count(), 360);
    }

    #[test]
    fn test_missing_membership_degrades_to_default() {
        let spec = DomainSpec::new(Domain::Dom01, 100);
        let lookup =
            LatitudeLookup::build(&spec, &StaticMembership::new(), LookupPolicy::Degrade).unwrap();
        assert!(lookup.is_degraded());
        assert!(lookup.cell_to_bin().iter().all(|&b| b == 0));
        assert!(lookup.bin_count().iter().all(|&c| c == 0));
        assert_eq!(
            lookup.status(),
            &LookupStatus::Degraded {
                missing_bins: 360,
                unassigned_cells: 100,
                reason: "membership entries missing".to_string()
            }
        );
    }

    #[test]
    fn test_missing_membership_fails_fast() {
        let spec = DomainSpec::new(Domain::Dom01, 100);
        let err = LatitudeLookup::build(&spec, &StaticMembership::new(), LookupPolicy::FailFast)
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::Unavailable {
                missing_bins: 360,
                ..
            }
        ));
    }

    /// Every bin present, but the last 20 cells listed nowhere.
    fn membership_missing_tail_cells() -> StaticMembership {
        let pairs = banded_membership(720, 360).into_iter().map(|(bin, cells)| {
            let kept: Vec<usize> = cells.into_iter().filter(|&c| c < 700).collect();
            (bin, kept)
        });
        StaticMembership::new().with_domain(Domain::Dom01, pairs)
    }

    #[test]
    fn test_unlisted_cells_fail_fast() {
        let spec = DomainSpec::new(Domain::Dom01, 720);
        let err = LatitudeLookup::build(&spec, &membership_missing_tail_cells(), LookupPolicy::FailFast)
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::Incomplete {
                domain: Domain::Dom01,
                unassigned_cells: 20
            }
        ));
    }

    #[test]
    fn test_unlisted_cells_degrade() {
        let spec = DomainSpec::new(Domain::Dom01, 720);
        let lookup =
            LatitudeLookup::build(&spec, &membership_missing_tail_cells(), LookupPolicy::Degrade)
                .unwrap();
        assert!(lookup.is_degraded());
        assert_eq!(lookup.assigned_cells(), 700);
        assert!(matches!(
            lookup.status(),
            LookupStatus::Degraded {
                missing_bins: 0,
                unassigned_cells: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_from_membership_rejects_unlisted_cells() {
        let err = LatitudeLookup::from_membership(&two_bin_spec(), vec![(0, vec![0, 1]), (1, vec![2])])
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::Incomplete {
                unassigned_cells: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_partial_membership_keeps_present_bins() {
        let spec = DomainSpec::new(Domain::Dom01, 10);
        let source =
            StaticMembership::new().with_domain(Domain::Dom01, vec![(5, vec![3, 4]), (7, vec![9])]);
        let lookup = LatitudeLookup::build(&spec, &source, LookupPolicy::Degrade).unwrap();
        assert!(lookup.is_degraded());
        assert_eq!(lookup.cell_to_bin()[3], 5);
        assert_eq!(lookup.cell_to_bin()[9], 7);
        assert_eq!(lookup.bin_count()[5], 2);
        assert_eq!(lookup.assigned_cells(), 3);
    }

    #[test]
    fn test_invalid_membership_degrades_whole_domain() {
        let spec = DomainSpec::new(Domain::Dom01, 10);
        let source = StaticMembership::new()
            .with_domain(Domain::Dom01, vec![(0, vec![1, 2]), (1, vec![2])]);
        let lookup = LatitudeLookup::build(&spec, &source, LookupPolicy::Degrade).unwrap();
        assert!(lookup.is_degraded());
        assert_eq!(lookup.assigned_cells(), 0);
    }

    #[test]
    fn test_directory_membership_reads_files() {
        let dir = test_utils::temp_test_dir_with_prefix("membership_");
        let dom_dir = dir.path().join("dom01");
        std::fs::create_dir_all(&dom_dir).unwrap();
        std::fs::write(dom_dir.join("dom01_lon_0deg.dat"), "0\n1\n\n").unwrap();
        std::fs::write(dom_dir.join("dom01_lon_1deg.dat"), "2\n3\n").unwrap();

        let source = DirectoryMembership::new(dir.path());
        assert_eq!(
            source.bin_members(Domain::Dom01, 0).unwrap(),
            Some(vec![0, 1])
        );
        assert_eq!(source.bin_members(Domain::Dom01, 2).unwrap(), None);
        assert_eq!(source.bin_members(Domain::Dom02, 0).unwrap(), None);

        let lookup = LatitudeLookup::build(&two_bin_spec(), &source, LookupPolicy::FailFast).unwrap();
        assert_eq!(lookup.bin_count(), &two_bin::BIN_COUNTS);
    }

    #[test]
    fn test_directory_membership_rejects_garbage() {
        let dir = test_utils::temp_test_dir_with_prefix("membership_");
        let dom_dir = dir.path().join("dom02");
        std::fs::create_dir_all(&dom_dir).unwrap();
        std::fs::write(dom_dir.join("dom02_lon_0deg.dat"), "12\nabc\n").unwrap();

        let err = DirectoryMembership::new(dir.path())
            .bin_members(Domain::Dom02, 0)
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_tables_report_degradation() {
        let registry = DomainRegistry::new(720, 1440);
        let source = StaticMembership::new().with_domain(Domain::Dom01, banded_membership(720, 360));
        let tables = LookupTables::build(&registry, &source, LookupPolicy::Degrade).unwrap();
        assert!(!tables.get(Domain::Dom01).is_degraded());
        assert!(tables.get(Domain::Dom02).is_degraded());
        assert!(tables.any_degraded());
    }
}

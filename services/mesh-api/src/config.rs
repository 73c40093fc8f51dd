//! Service configuration loading and types.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mesh_aggregator::{EngineConfig, LookupPolicy};
use mesh_common::{Domain, DomainRegistry};
use serde::{Deserialize, Serialize};

/// Settings resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Directory holding the NetCDF datasets.
    pub data_dir: PathBuf,

    /// Root of the per-domain latitude membership files.
    pub membership_dir: PathBuf,

    /// Optional YAML configuration file.
    pub config_path: Option<PathBuf>,

    /// Refuse to start when membership data is missing or invalid.
    pub strict_lookup: bool,

    /// Overrides the configured stream batch size.
    pub batch_size: Option<usize>,
}

impl ServerSettings {
    pub fn lookup_policy(&self) -> LookupPolicy {
        if self.strict_lookup {
            LookupPolicy::FailFast
        } else {
            LookupPolicy::Degrade
        }
    }
}

/// Configuration loaded from a YAML file.
///
/// ```yaml
/// domains:
///   dom01_cells: 327680
///   dom02_cells: 327680
/// engine:
///   stream_batch_size: 5000
///   traversal: per-level
///   mesh_variables:
///     lon: clon_bnds
///     lat: clat_bnds
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub domains: DomainOverrides,
    pub engine: EngineConfig,
}

/// Optional per-domain cell-count overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainOverrides {
    pub dom01_cells: Option<usize>,
    pub dom02_cells: Option<usize>,
}

impl ServiceConfig {
    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        let config: ServiceConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse: {:?}", path))?;

        tracing::info!("Loaded service config from {:?}", path);
        Ok(config)
    }

    /// Domain registry with the configured overrides applied.
    pub fn registry(&self) -> DomainRegistry {
        let mut registry = DomainRegistry::default();
        if let Some(cells) = self.domains.dom01_cells {
            registry = registry.with_cell_count(Domain::Dom01, cells);
        }
        if let Some(cells) = self.domains.dom02_cells {
            registry = registry.with_cell_count(Domain::Dom02, cells);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_common::Traversal;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServiceConfig::load(Path::new("/nonexistent/mesh.yaml")).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.registry(), DomainRegistry::default());
    }

    #[test]
    fn test_load_yaml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.yaml");
        std::fs::write(
            &path,
            "domains:\n  dom02_cells: 2048\nengine:\n  stream_batch_size: 64\n  traversal: per-cell\n",
        )
        .unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.engine.stream_batch_size, 64);
        assert_eq!(config.engine.traversal, Traversal::PerCell);
        assert_eq!(config.engine.mesh_variables.lon, "clon_bnds");

        let registry = config.registry();
        assert_eq!(registry.get(Domain::Dom02).cell_count, 2048);
        assert_eq!(
            registry.get(Domain::Dom01).cell_count,
            DomainRegistry::default().get(Domain::Dom01).cell_count
        );
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.yaml");
        std::fs::write(&path, "engine: [1, 2").unwrap();
        assert!(ServiceConfig::load(&path).is_err());
    }

    #[test]
    fn test_lookup_policy() {
        let mut settings = ServerSettings {
            data_dir: PathBuf::from("/data"),
            membership_dir: PathBuf::from("/membership"),
            config_path: None,
            strict_lookup: false,
            batch_size: None,
        };
        assert_eq!(settings.lookup_policy(), LookupPolicy::Degrade);
        settings.strict_lookup = true;
        assert_eq!(settings.lookup_policy(), LookupPolicy::FailFast);
    }
}

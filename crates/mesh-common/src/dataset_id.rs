//! Dataset identifier validation.
//!
//! Dataset identifiers arrive from clients and are resolved relative to the
//! configured data directory, so they must never escape it.

use std::path::{Component, Path};

use crate::error::{MeshError, MeshResult};

/// Check that a dataset identifier is a plain relative path.
pub fn validate_dataset_id(id: &str) -> MeshResult<&str> {
    if id.trim().is_empty() {
        return Err(MeshError::InvalidDatasetId("empty identifier".to_string()));
    }
    if id.contains('\0') {
        return Err(MeshError::InvalidDatasetId(
            "identifier contains NUL".to_string(),
        ));
    }

    for component in Path::new(id).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(MeshError::InvalidDatasetId(format!(
                    "'{}' escapes the data directory",
                    id
                )))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(MeshError::InvalidDatasetId(format!(
                    "'{}' must be relative",
                    id
                )))
            }
        }
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        assert!(validate_dataset_id("2016033000-ART_DOM01_ML_0002.nc").is_ok());
        assert!(validate_dataset_id("runs/2016/icon.nc").is_ok());
    }

    #[test]
    fn test_rejects_escape() {
        assert!(validate_dataset_id("../secret.nc").is_err());
        assert!(validate_dataset_id("runs/../../x.nc").is_err());
        assert!(validate_dataset_id("/etc/passwd").is_err());
        assert!(validate_dataset_id("  ").is_err());
    }
}

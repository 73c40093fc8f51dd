//! Triangle vertex reconstruction for rendering.

use mesh_common::DomainSpec;
use netcdf_parser::Dataset;
use serde::Serialize;

use crate::config::MeshVariables;
use crate::error::Result;
use crate::slice::{BoundaryVariable, VERTICES_PER_CELL};

/// Triangle vertices of every cell, in degrees.
///
/// Both arrays are `3 * cell_count` long and block ordered: the first vertex
/// of every cell, then the second of every cell, then the third. Downstream
/// renderers rely on this layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshGeometry {
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
}

impl MeshGeometry {
    /// Number of vertices in each array.
    pub fn len(&self) -> usize {
        self.lons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lons.is_empty()
    }

    /// Vertex `vertex` of cell `cell` as `(lon, lat)`.
    pub fn vertex(&self, cell: usize, vertex: usize) -> Option<(f64, f64)> {
        let cell_count = self.len() / VERTICES_PER_CELL;
        if cell >= cell_count || vertex >= VERTICES_PER_CELL {
            return None;
        }
        let index = vertex * cell_count + cell;
        Some((self.lons[index], self.lats[index]))
    }
}

/// Rebuild the mesh of `spec` from the boundary variables of `dataset`.
pub fn reconstruct_mesh(
    dataset: &dyn Dataset,
    spec: &DomainSpec,
    variables: &MeshVariables,
) -> Result<MeshGeometry> {
    let clon = BoundaryVariable::resolve(dataset, &variables.lon, spec)?;
    let clat = BoundaryVariable::resolve(dataset, &variables.lat, spec)?;

    let mut lons = Vec::with_capacity(spec.mesh_len());
    let mut lats = Vec::with_capacity(spec.mesh_len());
    for vertex in 0..VERTICES_PER_CELL {
        lons.extend(clon.read_vertex(vertex)?.into_iter().map(f64::to_degrees));
        lats.extend(clat.read_vertex(vertex)?.into_iter().map(f64::to_degrees));
    }

    Ok(MeshGeometry { lons, lats })
}

//! Checks against a real ICON output file when one is available.
//!
//! Set `TEST_DATA_DIR` to a directory holding `icon_dom01_sample.nc`, a
//! DOM01 file with a `(time, height, ncells)` variable (`temp` unless
//! `ICON_SAMPLE_VARIABLE` says otherwise) and `clon_bnds`/`clat_bnds`.

use std::ops::ControlFlow;
use std::sync::Arc;

use mesh_aggregator::{
    EngineConfig, LookupPolicy, LookupTables, MeshDataService, MeshRequest, StaticMembership,
    TrisAggRequest,
};
use mesh_common::{Domain, DomainRegistry, Reduction, Traversal};
use netcdf_parser::{DatasetSource, NetCdfSource};
use test_utils::{assert_approx_eq, banded_membership, require_test_file};

const SAMPLE: &str = "icon_dom01_sample.nc";

fn sample_variable() -> String {
    std::env::var("ICON_SAMPLE_VARIABLE").unwrap_or_else(|_| "temp".to_string())
}

#[test]
fn test_icon_sample_triangle_aggregates() {
    let path = require_test_file!(SAMPLE);
    let data_dir = path.parent().unwrap().to_path_buf();
    let variable = sample_variable();

    let source = NetCdfSource::new(&data_dir);
    let cells = source.open(SAMPLE).unwrap().variable_shape(&variable).unwrap()[2];

    let registry = DomainRegistry::new(cells, cells * 4);
    let membership =
        StaticMembership::new().with_domain(Domain::Dom01, banded_membership(cells, 360));
    let lookups = LookupTables::build(&registry, &membership, LookupPolicy::Degrade).unwrap();
    let service = MeshDataService::new(
        Arc::new(registry),
        lookups,
        Arc::new(source),
        EngineConfig::default(),
    )
    .unwrap();

    let request =
        TrisAggRequest::new(SAMPLE, &variable, Domain::Dom01).with_reduction(Reduction::Mean);
    let per_level = service
        .tris_agg(&request.clone().with_traversal(Traversal::PerLevel))
        .unwrap();
    let per_cell = service
        .tris_agg(&request.clone().with_traversal(Traversal::PerCell))
        .unwrap();
    assert_eq!(per_level.len(), cells);
    for (a, b) in per_level.iter().zip(&per_cell) {
        assert_approx_eq!(*a, *b, 1e-6 * a.abs().max(1.0));
    }

    let mut streamed = Vec::with_capacity(cells);
    service
        .tris_agg_stream(&request, |batch| {
            assert_eq!(batch.offset, streamed.len());
            streamed.extend(batch.values);
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(streamed, per_level);

    let mesh = service
        .mesh(&MeshRequest::new(SAMPLE, Domain::Dom01))
        .unwrap();
    assert_eq!(mesh.lons.len(), 3 * cells);
    assert!(mesh.lats.iter().all(|lat| (-90.0..=90.0).contains(lat)));
}

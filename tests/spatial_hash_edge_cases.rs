use flock_core::spatial_hash::{Metric, SpatialHash};
use flock_data::DVec2;

const TORUS: Metric = Metric::Toroidal {
    width: 100.0,
    height: 100.0,
};

#[test]
fn test_spatial_hash_huge_coordinates_land_on_border() {
    let sh = SpatialHash::new(5.0, 100.0, 100.0, Metric::Euclidean);
    let last = sh.cols * sh.rows - 1;

    let huge = i32::MAX as f64 * 10.0;
    assert_eq!(sh.get_cell_idx(DVec2::new(huge, huge)), Some(last));
    assert_eq!(sh.get_cell_idx(DVec2::new(-huge, -huge)), Some(0));
}

#[test]
fn test_spatial_hash_nan_safety() {
    let sh = SpatialHash::new(5.0, 100.0, 100.0, Metric::Euclidean);

    assert!(
        sh.get_cell_idx(DVec2::new(f64::NAN, 50.0)).is_none(),
        "Should return None for NaN x coordinate"
    );
    assert!(
        sh.get_cell_idx(DVec2::new(50.0, f64::NAN)).is_none(),
        "Should return None for NaN y coordinate"
    );
    assert!(
        sh.get_cell_idx(DVec2::new(f64::INFINITY, 50.0)).is_none(),
        "Should return None for infinite x coordinate"
    );
}

#[test]
fn test_non_finite_positions_are_not_indexed() {
    let mut sh = SpatialHash::new(10.0, 100.0, 100.0, Metric::Euclidean);
    sh.build_parallel(&[DVec2::new(50.0, 50.0), DVec2::new(f64::NAN, 50.0)]);
    assert_eq!(sh.entity_indices, vec![0]);
    assert_eq!(sh.count_nearby(DVec2::new(50.0, 50.0), 1000.0), 1);
}

#[test]
fn test_spatial_hash_boundary_conditions() {
    let sh = SpatialHash::new(5.0, 100.0, 100.0, Metric::Euclidean);

    assert_eq!(sh.get_cell_idx(DVec2::new(0.0, 0.0)), Some(0));
    assert!(sh.get_cell_idx(DVec2::new(99.99, 99.99)).is_some());
    assert_eq!(
        sh.get_cell_idx(DVec2::new(100.0, 100.0)),
        sh.get_cell_idx(DVec2::new(99.99, 99.99))
    );
}

#[test]
fn test_wrapped_cell_index() {
    let sh = SpatialHash::new(10.0, 100.0, 100.0, TORUS);
    assert_eq!(
        sh.get_cell_idx(DVec2::new(-5.0, 50.0)),
        sh.get_cell_idx(DVec2::new(95.0, 50.0))
    );
    assert_eq!(
        sh.get_cell_idx(DVec2::new(105.0, 50.0)),
        sh.get_cell_idx(DVec2::new(5.0, 50.0))
    );
}

#[test]
fn test_query_callback_rejects_invalid_radii() {
    let mut sh = SpatialHash::new(10.0, 100.0, 100.0, Metric::Euclidean);
    sh.build_parallel(&[DVec2::new(50.0, 50.0)]);
    let center = DVec2::new(50.0, 50.0);

    for radius in [-1.0, f64::NAN, f64::INFINITY] {
        let mut hits = 0;
        sh.query_callback(center, radius, |_| hits += 1);
        assert_eq!(hits, 0, "radius {radius} should visit nothing");
    }
}

#[test]
fn test_query_into_rejects_invalid_centers() {
    let mut sh = SpatialHash::new(10.0, 100.0, 100.0, Metric::Euclidean);
    sh.build_parallel(&[DVec2::new(50.0, 50.0)]);

    let mut result = vec![7];
    sh.query_into(DVec2::new(f64::NAN, 50.0), 10.0, &mut result);
    assert!(result.is_empty(), "stale results must be cleared");
    sh.query_into(DVec2::new(50.0, f64::INFINITY), 10.0, &mut result);
    assert!(result.is_empty());
}

#[test]
fn test_zero_radius_finds_coincident_only() {
    let mut sh = SpatialHash::new(10.0, 100.0, 100.0, Metric::Euclidean);
    sh.build_parallel(&[DVec2::new(20.0, 20.0), DVec2::new(20.0, 20.0), DVec2::new(20.5, 20.0)]);
    let mut result = Vec::new();
    sh.query_into(DVec2::new(20.0, 20.0), 0.0, &mut result);
    assert_eq!(result, vec![0, 1]);
}

#[test]
fn test_radius_larger_than_torus_finds_everyone_once() {
    let mut sh = SpatialHash::new(10.0, 100.0, 100.0, TORUS);
    let positions: Vec<DVec2> = (0..25)
        .map(|i| DVec2::new((i % 5) as f64 * 20.0, (i / 5) as f64 * 20.0))
        .collect();
    sh.build_parallel(&positions);
    let mut result = Vec::new();
    sh.query_into(DVec2::new(50.0, 50.0), 500.0, &mut result);
    assert_eq!(result, (0..25).collect::<Vec<_>>());
}

#[test]
fn test_degenerate_cell_size_falls_back_to_single_cell() {
    for cell in [0.0, -3.0, f64::NAN] {
        let mut sh = SpatialHash::new(cell, 100.0, 100.0, Metric::Euclidean);
        assert_eq!((sh.cols, sh.rows), (1, 1));
        sh.build_parallel(&[DVec2::new(1.0, 1.0), DVec2::new(99.0, 99.0)]);
        assert_eq!(sh.count_nearby(DVec2::new(50.0, 50.0), 100.0), 2);
    }
}

#[test]
fn test_rebuild_replaces_contents() {
    let mut sh = SpatialHash::new(10.0, 100.0, 100.0, Metric::Euclidean);
    sh.build_parallel(&[DVec2::new(10.0, 10.0), DVec2::new(90.0, 90.0)]);
    sh.build_parallel(&[DVec2::new(90.0, 90.0)]);
    assert_eq!(sh.len(), 1);
    assert_eq!(sh.count_nearby(DVec2::new(10.0, 10.0), 5.0), 0);
}

#[test]
fn test_empty_index_queries_are_empty() {
    let sh = SpatialHash::new_empty();
    assert!(sh.is_empty());
    assert_eq!(sh.count_nearby(DVec2::new(50.0, 50.0), 100.0), 0);
}

#[test]
fn test_tiny_cells_keep_grid_bounded() {
    let sh = SpatialHash::new(0.001, 10_000.0, 10_000.0, Metric::Euclidean);
    assert_eq!(sh.cols, 1024);
    assert_eq!(sh.rows, 1024);
    assert_eq!(sh.cell_offsets.len(), 1024 * 1024 + 1);
}

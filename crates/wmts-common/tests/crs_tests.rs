//! Tests for the static per-CRS view table and projection registry.

use wmts_common::crs::{CrsCode, ProjectionRegistry, POLAR_HALF_EXTENT};
use wmts_common::tile::{TileMatrix, TileMatrixSet};
use wmts_common::BoundingBox;

// ============================================================================
// View parameter table
// ============================================================================

#[test]
fn test_view_parameters_epsg4326() {
    let params = CrsCode::Epsg4326.view_parameters();
    assert_eq!(params.max_resolution, 0.5625);
    assert_eq!(params.extent.to_array(), [-180.0, -90.0, 180.0, 90.0]);
}

#[test]
fn test_view_parameters_epsg3857() {
    let params = CrsCode::Epsg3857.view_parameters();
    assert_eq!(params.max_resolution, 156543.03390625);
    assert_eq!(
        params.extent.to_array(),
        [-20037508.34, -20037508.34, 20037508.34, 20037508.34]
    );
}

#[test]
fn test_view_parameters_polar_share_one_row() {
    for code in [CrsCode::Epsg3413, CrsCode::Epsg3031] {
        let params = code.view_parameters();
        assert_eq!(params.max_resolution, 8192.0, "{}", code);
        assert_eq!(
            params.extent.to_array(),
            [-4194304.0, -4194304.0, 4194304.0, 4194304.0],
            "{}",
            code
        );
    }
}

// ============================================================================
// Projection registry
// ============================================================================

#[test]
fn test_registry_has_every_supported_crs() {
    let registry = ProjectionRegistry::with_defaults();
    for code in CrsCode::ALL {
        let def = registry.get(code).expect("registered");
        assert_eq!(def.code, code);
        assert_eq!(def.meters_per_unit, code.meters_per_unit());
    }
}

#[test]
fn test_registry_polar_definitions() {
    let registry = ProjectionRegistry::with_defaults();

    let north = registry.get(CrsCode::Epsg3413).unwrap();
    assert!(north.proj4.contains("+lat_0=90"));
    assert!(north.proj4.contains("+lon_0=-45"));
    assert_eq!(north.extent, BoundingBox::symmetric(POLAR_HALF_EXTENT));

    let south = registry.get(CrsCode::Epsg3031).unwrap();
    assert!(south.proj4.contains("+lat_0=-90"));
    assert_eq!(south.extent, BoundingBox::symmetric(POLAR_HALF_EXTENT));
}

// ============================================================================
// Resolutions against real projections
// ============================================================================

#[test]
fn test_resolution_sequence_preserves_input_order() {
    let scales = [279541132.0143589, 139770566.00717944, 69885283.00358972];
    let set = TileMatrixSet {
        identifier: "EPSG4326_250m".to_string(),
        supported_crs: None,
        tile_matrices: scales
            .iter()
            .enumerate()
            .map(|(i, scale)| TileMatrix {
                identifier: i.to_string(),
                scale_denominator: *scale,
                top_left_corner: (-180.0, 90.0),
                tile_width: 512,
                tile_height: 512,
                matrix_width: 2u32.pow(i as u32 + 1),
                matrix_height: 2u32.pow(i as u32),
            })
            .collect(),
    };

    let mpu = CrsCode::Epsg4326.meters_per_unit();
    let resolutions = set.resolutions(mpu);
    assert_eq!(resolutions.len(), 3);
    for (res, scale) in resolutions.iter().zip(scales) {
        assert_eq!(*res, scale * 0.00028 / mpu);
    }
    // WorldCRS84Quad level 0 is 0.703125 degrees per pixel
    assert!((resolutions[0] - 0.703125).abs() < 1e-6);
}

#[test]
fn test_resolution_order_is_not_sorted() {
    let set = TileMatrixSet {
        identifier: "odd".to_string(),
        supported_crs: None,
        tile_matrices: [10.0, 1000.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, scale)| TileMatrix {
                identifier: i.to_string(),
                scale_denominator: *scale,
                top_left_corner: (0.0, 0.0),
                tile_width: 256,
                tile_height: 256,
                matrix_width: 1,
                matrix_height: 1,
            })
            .collect(),
    };
    let resolutions = set.resolutions(1.0);
    assert!(resolutions[0] < resolutions[1]);
    assert!(resolutions[1] > resolutions[2]);
}

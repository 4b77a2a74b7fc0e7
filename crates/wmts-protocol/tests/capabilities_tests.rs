//! Tests for WMTS capabilities parsing against GIBS-style documents.

use wmts_common::CrsCode;
use wmts_protocol::{Capabilities, CapabilitiesError};

const EPSG4326_XML: &str = include_str!("fixtures/epsg4326_capabilities.xml");
const BARE_IDENTIFIER_XML: &str = include_str!("fixtures/bare_identifier_capabilities.xml");
const EPSG3857_XML: &str = include_str!("fixtures/epsg3857_capabilities.xml");

// ============================================================================
// Layer records
// ============================================================================

#[test]
fn test_layers_in_document_order() {
    let caps = Capabilities::parse(EPSG4326_XML).unwrap();
    let ids: Vec<&str> = caps.layers.iter().map(|l| l.identifier.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "MODIS_Terra_CorrectedReflectance_TrueColor",
            "Coastlines",
            "Orphan_Layer"
        ]
    );
    assert_eq!(
        caps.title.as_deref(),
        Some("NASA Global Imagery Browse Services for EOSDIS")
    );
}

#[test]
fn test_layer_fields() {
    let caps = Capabilities::parse(EPSG4326_XML).unwrap();
    let layer = caps
        .layer("MODIS_Terra_CorrectedReflectance_TrueColor")
        .unwrap();

    assert_eq!(
        layer.title.as_deref(),
        Some("Corrected Reflectance (True Color, MODIS, Terra)")
    );
    assert_eq!(layer.primary_format(), Some("image/jpeg"));
    assert_eq!(layer.primary_tile_matrix_set(), Some("250m"));
    assert_eq!(layer.default_style(), "default");

    let time = layer.time.as_ref().expect("time dimension");
    assert_eq!(time.default.as_deref(), Some("2021-03-05"));
    assert_eq!(time.values, vec!["2000-02-24/2021-03-05/P1D"]);
}

#[test]
fn test_layer_without_time_dimension() {
    let caps = Capabilities::parse(EPSG4326_XML).unwrap();
    assert!(caps.layer("Coastlines").unwrap().time.is_none());
}

// ============================================================================
// Tile matrix sets
// ============================================================================

#[test]
fn test_tile_matrix_sets() {
    let caps = Capabilities::parse(EPSG4326_XML).unwrap();
    assert_eq!(caps.tile_matrix_sets.len(), 2);

    let set = caps.find_tile_matrix_set("250m").unwrap();
    assert_eq!(
        set.supported_crs.as_deref(),
        Some("urn:ogc:def:crs:OGC:1.3:CRS84")
    );
    assert_eq!(set.matrix_ids(), vec!["0", "1", "2"]);

    let first = &set.tile_matrices[0];
    assert_eq!(first.top_left_corner, (-180.0, 90.0));
    assert_eq!(first.tile_width, 512);
    assert_eq!(first.tile_height, 512);
    assert_eq!(first.matrix_width, 2);
    assert_eq!(first.matrix_height, 1);
}

#[test]
fn test_link_names_do_not_create_sets() {
    // <TileMatrixSet> inside <TileMatrixSetLink> is a reference, not a record
    let caps = Capabilities::parse(EPSG4326_XML).unwrap();
    assert!(caps.find_tile_matrix_set("31.25m").is_none());
}

#[test]
fn test_mercator_resolutions_use_meters() {
    let caps = Capabilities::parse(EPSG3857_XML).unwrap();
    let set = caps
        .find_tile_matrix_set("GoogleMapsCompatible_Level6")
        .unwrap();

    let resolutions = set.resolutions(CrsCode::Epsg3857.meters_per_unit());
    assert_eq!(resolutions.len(), 2);
    assert!((resolutions[0] - 156543.03392804097).abs() < 1e-6);
    assert!((resolutions[1] - resolutions[0] / 2.0).abs() < 1e-6);
    assert_eq!(
        caps.layer("oscar").unwrap().primary_format(),
        Some("application/vnd.mapbox-vector-tile")
    );
}

#[test]
fn test_resolutions_for_geographic_projection() {
    let caps = Capabilities::parse(EPSG4326_XML).unwrap();
    let set = caps.find_tile_matrix_set("250m").unwrap();
    let grid = set.tile_grid(CrsCode::Epsg4326.meters_per_unit()).unwrap();

    let expected = [0.5625, 0.28125, 0.140625];
    for (res, want) in grid.resolutions.iter().zip(expected) {
        assert!((res - want).abs() < 1e-9, "{} != {}", res, want);
    }
    assert_eq!(grid.origin, (-180.0, 90.0));
    assert_eq!(grid.tile_size, 512);
}

// ============================================================================
// Identifier tag quirk
// ============================================================================

#[test]
fn test_bare_identifier_tags_parse() {
    let caps = Capabilities::parse(BARE_IDENTIFIER_XML).unwrap();
    assert_eq!(caps.layers.len(), 1);
    assert_eq!(caps.layers[0].identifier, "AMSR2_Sea_Ice_Concentration_12km");

    let set = caps.find_tile_matrix_set("1km").unwrap();
    let grid = set.tile_grid(CrsCode::Epsg3413.meters_per_unit()).unwrap();
    assert!((grid.resolutions[0] - 8192.0).abs() < 1e-6);
    assert!((grid.resolutions[1] - 4096.0).abs() < 1e-6);
    assert_eq!(grid.origin, (-4194304.0, 4194304.0));
}

#[test]
fn test_namespaced_and_bare_forms_agree() {
    let namespaced = BARE_IDENTIFIER_XML
        .replace("<Identifier>", "<ows:Identifier>")
        .replace("</Identifier>", "</ows:Identifier>")
        .replace(
            "version=\"1.0.0\">",
            "xmlns:ows=\"http://www.opengis.net/ows/1.1\" version=\"1.0.0\">",
        );

    let a = Capabilities::parse(BARE_IDENTIFIER_XML).unwrap();
    let b = Capabilities::parse(&namespaced).unwrap();
    assert_eq!(a.layers, b.layers);
    assert_eq!(a.tile_matrix_sets, b.tile_matrix_sets);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_xml() {
    let result = Capabilities::parse("<Capabilities><Contents></Layer></Capabilities>");
    assert!(matches!(result, Err(CapabilitiesError::Xml { .. })));
}

#[test]
fn test_invalid_scale_denominator() {
    let xml = BARE_IDENTIFIER_XML.replace("29257142.85714286", "not-a-number");
    let result = Capabilities::parse(&xml);
    assert!(matches!(
        result,
        Err(CapabilitiesError::InvalidNumber { ref element, .. }) if element == "ScaleDenominator"
    ));
}

#[test]
fn test_missing_top_left_corner() {
    let xml = BARE_IDENTIFIER_XML.replacen("<TopLeftCorner>-4194304 4194304</TopLeftCorner>", "", 1);
    let result = Capabilities::parse(&xml);
    assert!(matches!(
        result,
        Err(CapabilitiesError::MissingElement { ref element, .. }) if element == "TopLeftCorner"
    ));
}

#[test]
fn test_empty_contents() {
    let caps = Capabilities::parse("<Capabilities><Contents/></Capabilities>").unwrap();
    assert!(caps.layers.is_empty());
    assert!(caps.tile_matrix_sets.is_empty());
}

#[test]
fn test_capabilities_serialize() {
    let caps = Capabilities::parse(BARE_IDENTIFIER_XML).unwrap();
    let json = serde_json::to_value(&caps).unwrap();
    assert_eq!(
        json["layers"][0]["identifier"],
        "AMSR2_Sea_Ice_Concentration_12km"
    );
}

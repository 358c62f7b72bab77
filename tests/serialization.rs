//! Serde round trips for configuration, input and reports.

use delaunay_mesh::prelude::*;
use serde_json::json;

#[test]
fn behavior_survives_json() {
    let behavior = BehaviorBuilder::default()
        .quality(true)
        .min_angle(28.5)
        .max_area(0.25)
        .segment_splitting(SegmentSplitting::NoBoundarySplits)
        .steiner_placement(SteinerPlacement::NewLocation)
        .steiner_limit(500)
        .build()
        .unwrap();
    let text = serde_json::to_string(&behavior).unwrap();
    let back: Behavior = serde_json::from_str(&text).unwrap();

    assert!(back.quality);
    assert_eq!(back.min_angle, 28.5);
    assert_eq!(back.max_area, Some(0.25));
    assert_eq!(back.segment_splitting, SegmentSplitting::NoBoundarySplits);
    assert_eq!(back.steiner_placement, SteinerPlacement::NewLocation);
    assert_eq!(back.steiner_limit, Some(500));
    assert!(back.validate().is_ok());
}

#[test]
fn user_test_is_not_serialized() {
    let behavior = BehaviorBuilder::default()
        .user_test(TriangleTest::new(|_, _, _, area| area > 1.0))
        .build()
        .unwrap();
    let value = serde_json::to_value(&behavior).unwrap();
    assert!(value.get("user_test").is_none());

    let back: Behavior = serde_json::from_value(value).unwrap();
    assert!(back.user_test.is_none());
}

#[test]
fn deserialized_behavior_is_checked_by_the_mesh() {
    let mut value = serde_json::to_value(Behavior::default()).unwrap();
    value["min_angle"] = json!(80.0);
    let behavior: Behavior = serde_json::from_value(value).unwrap();
    assert!(matches!(
        Mesh::new(behavior),
        Err(MeshError::Behavior(BehaviorError::MinAngleOutOfRange { .. }))
    ));
}

#[test]
fn input_geometry_survives_json() {
    let input = InputGeometry::from_points([[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]])
        .with_closed_polygon(3)
        .with_holes([Point::new(2.0, 2.0)])
        .with_regions([RegionSeed {
            point: Point::new(1.0, 1.0),
            region: 9,
            area_bound: Some(0.5),
        }]);
    let text = serde_json::to_string(&input).unwrap();
    let back: InputGeometry = serde_json::from_str(&text).unwrap();
    assert_eq!(back, input);
}

#[test]
fn refinement_report_and_statistics_serialize() {
    let input = InputGeometry::from_points([[0.0, 0.0], [3.0, 0.0], [3.0, 1.0], [0.0, 1.0]]).with_closed_polygon(1);
    let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
    mesh.set_behavior(BehaviorBuilder::default().quality(true).build().unwrap())
        .unwrap();
    let report = mesh.refine().unwrap();

    let back: RefinementReport = serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
    assert_eq!(back, report);
    assert!(!report.budget_exhausted);

    let stats = serde_json::to_value(mesh.quality_statistics().unwrap()).unwrap();
    assert_eq!(stats["triangles"], json!(mesh.triangle_count()));
    assert!(stats["min_angle"].as_f64().unwrap() >= 20.0 - 1e-9);
}

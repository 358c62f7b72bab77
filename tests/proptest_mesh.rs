//! Property-based tests for mesh construction, editing and refinement.
//!
//! Each property builds a mesh from random input and checks invariants that
//! must hold after every public operation:
//! - Bond symmetry, orientation and the (constrained) Delaunay property,
//!   via `Mesh::validate`
//! - Euler's formula for point-set triangulations
//! - Triangle count conservation under insertion, undo and deletion
//! - Location idempotence for mesh vertices
//! - The minimum angle bound after refinement
//! - Validity of constrained triangulations with random (crossing) segments

use delaunay_mesh::prelude::*;
use proptest::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

fn coordinate() -> impl Strategy<Value = f64> {
    (0.0..100.0_f64).prop_filter("must be finite", |x| x.is_finite())
}

fn interior_coordinate() -> impl Strategy<Value = f64> {
    1.0..99.0_f64
}

fn point_set() -> impl Strategy<Value = Vec<[f64; 2]>> {
    prop::collection::vec(prop::array::uniform2(coordinate()), 3..60)
}

fn interior_points(max: usize) -> impl Strategy<Value = Vec<[f64; 2]>> {
    prop::collection::vec(prop::array::uniform2(interior_coordinate()), 0..max)
}

/// A 100x100 square with `points` inside it.
fn square_with(points: &[[f64; 2]]) -> Mesh {
    let mut all = vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]];
    all.extend_from_slice(points);
    Mesh::triangulate(&InputGeometry::from_points(all), Behavior::default()).unwrap()
}

fn triangulate_or_skip(points: &[[f64; 2]]) -> Option<Mesh> {
    match Mesh::triangulate(&InputGeometry::from_points(points.to_vec()), Behavior::default()) {
        Ok(mesh) => Some(mesh),
        Err(MeshError::AllCollinear) => None,
        Err(err) => panic!("unexpected construction error: {err}"),
    }
}

// =============================================================================
// CONSTRUCTION PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: a triangulated point set is valid and Delaunay.
    #[test]
    fn prop_point_set_triangulation_is_valid(points in point_set()) {
        let Some(mesh) = triangulate_or_skip(&points) else {
            return Ok(());
        };
        prop_assert_eq!(mesh.validate(), Ok(()));
        prop_assert_eq!(mesh.vertex_count() + mesh.undead_vertex_count(), points.len());
    }

    /// Property: T = 2V - H - 2 for a triangulated point set.
    #[test]
    fn prop_euler_formula(points in point_set()) {
        let Some(mesh) = triangulate_or_skip(&points) else {
            return Ok(());
        };
        prop_assert_eq!(mesh.triangle_count() + mesh.hull_size() + 2, 2 * mesh.vertex_count());
        prop_assert_eq!(mesh.edges().len(), mesh.triangle_count() + mesh.vertex_count() - 1);
    }

    /// Property: locating a mesh vertex returns it as the handle's origin.
    #[test]
    fn prop_locate_vertex_is_idempotent(points in point_set()) {
        let Some(mut mesh) = triangulate_or_skip(&points) else {
            return Ok(());
        };
        let locations: Vec<Point> = mesh.vertices().map(|(_, v)| v.point()).collect();
        for p in locations {
            let (result, handle) = mesh.locate(p);
            prop_assert_eq!(result, LocateResult::OnVertex);
            prop_assert_eq!(mesh.handle_origin(handle), Some(p));
        }
    }
}

// =============================================================================
// EDITING PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: every interior insertion adds exactly two triangles.
    #[test]
    fn prop_insertion_adds_two_triangles(base in interior_points(20), extra in interior_points(20)) {
        let mut mesh = square_with(&base);
        for p in extra {
            let before = mesh.triangle_count();
            let (key, result) = mesh.insert_point(Point::new(p[0], p[1])).unwrap();
            if result.is_inserted() {
                prop_assert!(key.is_some());
                prop_assert_eq!(mesh.triangle_count(), before + 2);
            } else {
                prop_assert_eq!(result, InsertVertexResult::Duplicate);
                prop_assert_eq!(mesh.triangle_count(), before);
            }
        }
        prop_assert_eq!(mesh.validate(), Ok(()));
    }

    /// Property: undoing an insertion restores the previous triangle count.
    #[test]
    fn prop_undo_restores_count(base in interior_points(20), p in prop::array::uniform2(interior_coordinate())) {
        let mut mesh = square_with(&base);
        let before = mesh.triangle_count();
        let vertices = mesh.vertex_count();
        let (key, _) = mesh.insert_point(Point::new(p[0], p[1])).unwrap();
        if let Some(key) = key {
            let removed = mesh.undo_last_insertion().unwrap();
            prop_assert_eq!(removed.point(), Point::new(p[0], p[1]));
            prop_assert!(mesh.vertex(key).is_none());
        }
        prop_assert_eq!(mesh.triangle_count(), before);
        prop_assert_eq!(mesh.vertex_count(), vertices);
        prop_assert_eq!(mesh.validate(), Ok(()));
    }

    /// Property: deleting every inserted point restores the triangle count.
    #[test]
    fn prop_delete_reverses_insertions(base in interior_points(15), extra in interior_points(15)) {
        let mut mesh = square_with(&base);
        let before = mesh.triangle_count();
        let keys: Vec<VertexKey> = extra
            .iter()
            .filter_map(|p| mesh.insert_point(Point::new(p[0], p[1])).unwrap().0)
            .collect();
        for key in keys.into_iter().rev() {
            mesh.delete_vertex(key).unwrap();
            prop_assert_eq!(mesh.validate(), Ok(()));
        }
        prop_assert_eq!(mesh.triangle_count(), before);
    }
}

// =============================================================================
// REFINEMENT PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: refining a rectangle meets the minimum angle bound.
    #[test]
    fn prop_refined_rectangle_meets_angle_bound(
        width in 0.5..10.0_f64,
        height in 0.5..10.0_f64,
        min_angle in 10.0..30.0_f64,
    ) {
        let input = InputGeometry::from_points([[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]])
            .with_closed_polygon(1);
        let behavior = BehaviorBuilder::default()
            .quality(true)
            .min_angle(min_angle)
            .build()
            .unwrap();
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        let stats = mesh.quality_statistics().unwrap();
        prop_assert!(stats.min_angle >= min_angle - 1e-9, "{} < {}", stats.min_angle, min_angle);
        prop_assert_eq!(mesh.validate(), Ok(()));
        prop_assert_eq!(mesh.encroached_count(), 0);
    }
}

// =============================================================================
// SEGMENT PROPERTIES
// =============================================================================

fn grid_points() -> impl Strategy<Value = Vec<[f64; 2]>> {
    prop::collection::vec((0_i32..24, 0_i32..24), 4..30)
        .prop_map(|cells| cells.into_iter().map(|(x, y)| [f64::from(x), f64::from(y)]).collect())
}

/// Grid points with two segments between random vertices.
fn grid_with_segments() -> impl Strategy<Value = (Vec<[f64; 2]>, Vec<[usize; 2]>)> {
    grid_points().prop_flat_map(|points| {
        let n = points.len();
        let segments = prop::collection::vec([0..n, 0..n], 2);
        (Just(points), segments)
    })
}

fn constrained_or_skip(points: &[[f64; 2]], segments: &[[usize; 2]], behavior: Behavior) -> Option<Mesh> {
    let input = InputGeometry::from_points(points.to_vec())
        .with_segments(segments.iter().map(|&[a, b]| InputSegment::new(a, b)));
    match Mesh::triangulate(&input, behavior) {
        Ok(mesh) => Some(mesh),
        Err(MeshError::AllCollinear) => None,
        Err(err) => panic!("unexpected construction error: {err}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    /// Property: random segments, crossing or not, give a valid constrained
    /// triangulation.
    #[test]
    fn prop_random_segments_are_recovered((points, segments) in grid_with_segments()) {
        let behavior = BehaviorBuilder::default().convex(true).build().unwrap();
        let Some(mesh) = constrained_or_skip(&points, &segments, behavior) else {
            return Ok(());
        };
        prop_assert_eq!(mesh.validate(), Ok(()));
        for &[a, b] in &segments {
            let (p, q) = (Point::from(points[a]), Point::from(points[b]));
            if p == q {
                continue;
            }
            // Every endpoint of an input segment carries a subsegment.
            for end in [p, q] {
                prop_assert!(mesh.subsegments().any(|s| s.endpoints.iter().any(|&k| mesh.vertex(k).is_some_and(|v| v.point() == end))));
            }
        }
    }

    /// Property: refining a triangulation with random segments keeps it valid.
    #[test]
    fn prop_random_segments_survive_refinement((points, segments) in grid_with_segments()) {
        let behavior = BehaviorBuilder::default()
            .convex(true)
            .quality(true)
            .steiner_limit(300)
            .build()
            .unwrap();
        let Some(mesh) = constrained_or_skip(&points, &segments, behavior) else {
            return Ok(());
        };
        prop_assert_eq!(mesh.validate(), Ok(()));
        prop_assert!(mesh.steiner_points_inserted() <= 300);
    }
}

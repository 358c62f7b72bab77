//! Property-based tests for the geometric predicates.
//!
//! The adaptive predicates must return the sign of the exact determinant.
//! Inputs are chosen so that an exact reference can be computed with `i128`
//! arithmetic:
//! - Coordinates in `[1, 2]` are multiples of 2⁻⁵², so the orientation
//!   determinant of scaled coordinates fits in 106 bits.
//! - Small integer coordinates keep the in-circle determinant exact.

use delaunay_mesh::geometry::point::Point;
use delaunay_mesh::geometry::predicates::{InCircle, Orientation};
use delaunay_mesh::geometry::robust_predicates::RobustPredicates;
use proptest::prelude::*;
use std::cmp::Ordering;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

const SCALE: f64 = 4_503_599_627_370_496.0; // 2^52

/// Coordinates in `[1, 2)`, all exact multiples of 2⁻⁵².
fn unit_binade() -> impl Strategy<Value = f64> {
    1.0..2.0_f64
}

fn binade_point() -> impl Strategy<Value = Point> {
    (unit_binade(), unit_binade()).prop_map(|(x, y)| Point::new(x, y))
}

fn integer_point() -> impl Strategy<Value = Point> {
    (-1000_i32..1000, -1000_i32..1000).prop_map(|(x, y)| Point::new(f64::from(x), f64::from(y)))
}

#[allow(clippy::cast_possible_truncation)]
fn scaled(v: f64) -> i128 {
    (v * SCALE) as i128
}

fn reference_orientation(a: &Point, b: &Point, c: &Point) -> Ordering {
    let (acx, acy) = (scaled(a.x) - scaled(c.x), scaled(a.y) - scaled(c.y));
    let (bcx, bcy) = (scaled(b.x) - scaled(c.x), scaled(b.y) - scaled(c.y));
    (acx * bcy).cmp(&(acy * bcx))
}

#[allow(clippy::cast_possible_truncation)]
fn reference_incircle(a: &Point, b: &Point, c: &Point, d: &Point) -> Ordering {
    let lift = |p: &Point| {
        let (x, y) = ((p.x - d.x) as i128, (p.y - d.y) as i128);
        (x, y, x * x + y * y)
    };
    let (ax, ay, al) = lift(a);
    let (bx, by, bl) = lift(b);
    let (cx, cy, cl) = lift(c);
    let det = al * (bx * cy - cx * by) + bl * (cx * ay - ax * cy) + cl * (ax * by - bx * ay);
    det.cmp(&0)
}

fn sign(value: f64) -> Ordering {
    value.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

// =============================================================================
// ORIENTATION PROPERTY TESTS
// =============================================================================

proptest! {
    /// Property: the orientation of nearly collinear points matches the exact sign.
    #[test]
    fn prop_orientation_is_exact_near_collinear(a in binade_point(), b in binade_point(), t in 0.0..1.0_f64) {
        let predicates = RobustPredicates::new(true);
        let c = a.lerp(&b, t);
        prop_assume!((1.0..=2.0).contains(&c.x) && (1.0..=2.0).contains(&c.y));
        let det = predicates.orient2d(&a, &b, &c);
        prop_assert_eq!(sign(det), reference_orientation(&a, &b, &c));
    }

    /// Property: swapping two points flips the orientation.
    #[test]
    fn prop_orientation_sign_flip(a in binade_point(), b in binade_point(), c in binade_point()) {
        let predicates = RobustPredicates::new(true);
        let forward = predicates.orientation(&a, &b, &c);
        let swapped = predicates.orientation(&a, &c, &b);
        match forward {
            Orientation::DEGENERATE => prop_assert_eq!(swapped, Orientation::DEGENERATE),
            Orientation::POSITIVE => prop_assert_eq!(swapped, Orientation::NEGATIVE),
            Orientation::NEGATIVE => prop_assert_eq!(swapped, Orientation::POSITIVE),
        }
    }

    /// Property: cyclic rotation preserves the orientation.
    #[test]
    fn prop_orientation_cyclic(a in integer_point(), b in integer_point(), c in integer_point()) {
        let predicates = RobustPredicates::new(true);
        let o = predicates.orientation(&a, &b, &c);
        prop_assert_eq!(o, predicates.orientation(&b, &c, &a));
        prop_assert_eq!(o, predicates.orientation(&c, &a, &b));
    }
}

// =============================================================================
// IN-CIRCLE PROPERTY TESTS
// =============================================================================

proptest! {
    /// Property: the in-circle test matches the exact determinant sign.
    #[test]
    fn prop_incircle_is_exact(
        a in integer_point(),
        b in integer_point(),
        c in integer_point(),
        d in integer_point(),
    ) {
        let predicates = RobustPredicates::new(true);
        let det = predicates.incircle(&a, &b, &c, &d);
        prop_assert_eq!(sign(det), reference_incircle(&a, &b, &c, &d));
    }

    /// Property: for a counterclockwise triangle, each corner is on the circle.
    #[test]
    fn prop_corners_lie_on_their_circle(a in integer_point(), b in integer_point(), c in integer_point()) {
        let predicates = RobustPredicates::new(true);
        prop_assume!(predicates.orientation(&a, &b, &c) == Orientation::POSITIVE);
        for corner in [a, b, c] {
            prop_assert_eq!(predicates.in_circle(&a, &b, &c, &corner), InCircle::BOUNDARY);
        }
    }

    /// Property: the circumcenter of a counterclockwise triangle is
    /// equidistant from its corners.
    #[test]
    fn prop_circumcenter_is_equidistant(a in integer_point(), b in integer_point(), c in integer_point()) {
        let predicates = RobustPredicates::new(true);
        prop_assume!(predicates.orientation(&a, &b, &c) == Orientation::POSITIVE);
        let center = predicates.circumcenter(&a, &b, &c, 0.0).point;
        let (ra, rb, rc) = (center.distance(&a), center.distance(&b), center.distance(&c));
        let tolerance = 1e-6 * ra.max(1.0);
        prop_assert!((ra - rb).abs() <= tolerance, "{} vs {}", ra, rb);
        prop_assert!((ra - rc).abs() <= tolerance, "{} vs {}", ra, rc);
    }
}

// =============================================================================
// FIXED CASES
// =============================================================================

#[test]
fn nearly_collinear_points_get_a_consistent_sign() {
    let predicates = RobustPredicates::new(true);
    let tiny = 1.0 / SCALE;
    let a = Point::new(1.0, 1.0);
    let b = Point::new(1.5, 1.5);
    let above = Point::new(1.75, 1.75 + tiny);
    let below = Point::new(1.75, 1.75 - tiny);
    assert!((above.y - b.y - 0.25).abs() < 1e-12);

    assert_eq!(predicates.orientation(&a, &b, &above), Orientation::POSITIVE);
    assert_eq!(predicates.orientation(&a, &b, &below), Orientation::NEGATIVE);
    assert_eq!(sign(predicates.orient2d(&a, &b, &above)), reference_orientation(&a, &b, &above));
    assert_eq!(sign(predicates.orient2d(&a, &b, &below)), reference_orientation(&a, &b, &below));
    assert_eq!(
        predicates.orientation(&a, &b, &Point::new(1.75, 1.75)),
        Orientation::DEGENERATE
    );
}

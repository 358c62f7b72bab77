//! Geometric quality measures for triangles.
//!
//! These are the shape measures that mesh refinement is judged by: interior
//! angles, area, and the circumradius-to-shortest-edge ratio. They operate on
//! plain coordinates and are independent of the mesh topology.
//!
//! # Quality Metrics
//!
//! - **Minimum angle**: the quantity Ruppert refinement bounds from below.
//!   An equilateral triangle has a minimum angle of 60°.
//! - **Radius–edge ratio**: circumradius divided by the shortest edge. A
//!   minimum angle θ corresponds to a ratio of `1 / (2 sin θ)`; the equilateral
//!   triangle attains the optimum `1/√3`.
//!
//! # References
//!
//! - Shewchuk, J.R. "What Is a Good Linear Element? Interpolation, Conditioning,
//!   Anisotropy, and Quality Measures" (2002)
//! - Ruppert, J. "A Delaunay Refinement Algorithm for Quality 2-Dimensional Mesh
//!   Generation" *Journal of Algorithms* 18.3 (1995): 548-585

use crate::geometry::point::Point;
use thiserror::Error;

/// Errors that can occur during quality metric computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QualityError {
    /// The triangle has zero area (collinear or coincident corners).
    #[error("Degenerate triangle with area ≈ {area:e}")]
    DegenerateTriangle {
        /// Absolute area of the triangle
        area: f64,
    },
}

/// Squared lengths of the edges opposite `a`, `b` and `c`, in that order.
#[must_use]
pub fn edge_lengths_squared(a: &Point, b: &Point, c: &Point) -> [f64; 3] {
    [b.distance_squared(c), c.distance_squared(a), a.distance_squared(b)]
}

/// Signed area of `(a, b, c)`: positive for counterclockwise order.
#[must_use]
pub fn signed_area(a: &Point, b: &Point, c: &Point) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}

/// Interior angles in degrees at `a`, `b` and `c`.
///
/// Each angle is computed with `atan2` of the cross and dot products of its
/// two incident edges, which stays accurate for angles near 0° and 180°.
#[must_use]
pub fn interior_angles(a: &Point, b: &Point, c: &Point) -> [f64; 3] {
    let corner = |p: &Point, q: &Point, r: &Point| {
        let u = *q - *p;
        let v = *r - *p;
        let cross = u.x * v.y - u.y * v.x;
        cross.abs().atan2(u.dot(&v)).to_degrees()
    };
    [corner(a, b, c), corner(b, c, a), corner(c, a, b)]
}

/// Smallest interior angle in degrees.
#[must_use]
pub fn min_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    interior_angles(a, b, c).into_iter().fold(f64::INFINITY, f64::min)
}

/// Largest interior angle in degrees.
#[must_use]
pub fn max_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    interior_angles(a, b, c).into_iter().fold(0.0, f64::max)
}

/// Circumradius divided by the shortest edge length.
///
/// # Errors
///
/// Returns [`QualityError::DegenerateTriangle`] if the corners are collinear.
///
/// # Examples
///
/// ```rust
/// use delaunay_mesh::geometry::point::Point;
/// use delaunay_mesh::geometry::quality::radius_edge_ratio;
///
/// let h = 3.0_f64.sqrt() / 2.0;
/// let ratio = radius_edge_ratio(
///     &Point::new(0.0, 0.0),
///     &Point::new(1.0, 0.0),
///     &Point::new(0.5, h),
/// )
/// .unwrap();
/// assert!((ratio - 1.0 / 3.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn radius_edge_ratio(a: &Point, b: &Point, c: &Point) -> Result<f64, QualityError> {
    let area = signed_area(a, b, c).abs();
    if area == 0.0 {
        return Err(QualityError::DegenerateTriangle { area });
    }
    let [la, lb, lc] = edge_lengths_squared(a, b, c);
    // R = abc / (4 · area)
    let circumradius = (la * lb * lc).sqrt() / (4.0 * area);
    let shortest = la.min(lb).min(lc).sqrt();
    Ok(circumradius / shortest)
}

/// Radius–edge ratio implied by a minimum angle bound (in degrees).
#[must_use]
pub fn radius_edge_bound(min_angle_degrees: f64) -> f64 {
    1.0 / (2.0 * min_angle_degrees.to_radians().sin())
}

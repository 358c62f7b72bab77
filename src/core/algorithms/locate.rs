//! Point location by directed walking.
//!
//! # Algorithm
//!
//! [`Mesh::locate`] picks a starting triangle whose origin is closest to the
//! query point among three candidates: the caller's hint, the most recently
//! visited triangle, and a random sample of live triangles whose size grows
//! with the cube root of the triangle count. It then orients the start so
//! the query point lies to the left of its edge and walks.
//!
//! The walk repeatedly tests the query point against the two edges leaving
//! the current triangle's apex and crosses the one the point lies beyond,
//! choosing by a dot product when both qualify. It stops when the apex
//! coincides with the point, when the point is collinear with an edge of the
//! current triangle, or when both tests pass. It backs up and reports
//! [`LocateResult::Outside`] if it would walk into outer space (or, when
//! requested, through a subsegment).
//!
//! The walk is only guaranteed to find the point in a convex triangulation.
//! After holes and concavities have been carved it may stop at a boundary
//! edge short of the point, so the public entry points confirm an `Outside`
//! answer with a linear scan over the triangles.
//!
//! # References
//!
//! - O. Devillers, S. Pion, and M. Teillaud, "Walking in a Triangulation",
//!   International Journal of Foundations of Computer Science, 2001.
//! - E. P. Mücke, I. Saias, and B. Zhu, "Fast Randomized Point Location
//!   Without Preprocessing in Two- and Three-Dimensional Delaunay
//!   Triangulations", Symposium on Computational Geometry, 1996.

use crate::core::mesh::Mesh;
use crate::core::topology::{Otri, TriangleId};
use crate::geometry::point::Point;

/// Controls the random sample size: the smallest `s` with
/// `SAMPLE_FACTOR · s³ ≥ triangle count`.
const SAMPLE_FACTOR: usize = 11;

/// Result of point location query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocateResult {
    /// Point is strictly inside the returned triangle
    InTriangle,
    /// Point is on the returned handle's edge
    OnEdge,
    /// Point coincides with the returned handle's origin
    OnVertex,
    /// Point is beyond the returned handle's edge, which is a hull edge or
    /// (for walks that stop there) a subsegment
    Outside,
}

impl Mesh {
    /// Locates `point`, starting from the best available triangle.
    ///
    /// Returns the classification and a handle:
    ///
    /// - [`LocateResult::InTriangle`]: a triangle containing the point.
    /// - [`LocateResult::OnEdge`]: a handle whose edge contains the point.
    /// - [`LocateResult::OnVertex`]: a handle whose origin is the point.
    /// - [`LocateResult::Outside`]: the hull edge the walk stopped at, or
    ///   [`Otri::OUTER`] for an empty mesh. The point is outside every
    ///   triangle; in a non-convex mesh this is confirmed by a scan over all
    ///   triangles, which costs linear time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_mesh::prelude::*;
    ///
    /// let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    /// let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
    /// let (result, _) = mesh.locate(Point::new(0.2, 0.2));
    /// assert_eq!(result, LocateResult::InTriangle);
    /// let (result, _) = mesh.locate(Point::new(1.0, 0.0));
    /// assert_eq!(result, LocateResult::OnVertex);
    /// let (result, _) = mesh.locate(Point::new(2.0, 2.0));
    /// assert_eq!(result, LocateResult::Outside);
    /// ```
    pub fn locate(&mut self, point: Point) -> (LocateResult, Otri) {
        let hint = self.hull_handle().unwrap_or(Otri::OUTER);
        self.locate_in_domain(point, hint)
    }

    /// Like [`Mesh::locate_from`], but confirms an `Outside` answer by
    /// scanning every triangle, since the walk can stop at the boundary of
    /// a carved, non-convex mesh while the point lies further on.
    pub(crate) fn locate_in_domain(&mut self, point: Point, hint: Otri) -> (LocateResult, Otri) {
        let walked = self.locate_from(point, hint);
        if walked.0 != LocateResult::Outside {
            return walked;
        }
        match self.scan_locate(point) {
            Some(found) => {
                self.recent = found.1;
                found
            }
            None => walked,
        }
    }

    /// Finds a triangle containing `point` by testing every live triangle.
    fn scan_locate(&self, point: Point) -> Option<(LocateResult, Otri)> {
        self.triangles
            .iter()
            .find_map(|(index, _)| self.classify(point, Otri::new(TriangleId(index), 0)))
    }

    /// Classifies `point` against a single triangle; `None` if it is outside.
    fn classify(&self, point: Point, o: Otri) -> Option<(LocateResult, Otri)> {
        let mut on_edge = None;
        for edge in [o, o.lnext(), o.lprev()] {
            let org = self.point(self.org(edge));
            if org == point {
                return Some((LocateResult::OnVertex, edge));
            }
            let side = self.predicates.orient2d(&org, &self.point(self.dest(edge)), &point);
            if side < 0.0 {
                return None;
            }
            if side == 0.0 {
                on_edge = Some(edge);
            }
        }
        Some(on_edge.map_or((LocateResult::InTriangle, o), |edge| (LocateResult::OnEdge, edge)))
    }

    /// Returns the origin coordinates of a live handle.
    ///
    /// Handles from [`Mesh::locate`] stay valid until the next mutation.
    #[must_use]
    pub fn handle_origin(&self, handle: Otri) -> Option<Point> {
        (!handle.is_outer() && self.is_alive(handle.tri)).then(|| self.point(self.org(handle)))
    }

    /// Locates `point`, using `hint` as one of the candidate starting triangles.
    pub(crate) fn locate_from(&mut self, point: Point, hint: Otri) -> (LocateResult, Otri) {
        let mut search = Otri::OUTER;
        let mut search_dist = f64::INFINITY;
        if !hint.is_outer() && self.is_alive(hint.tri) {
            search = hint;
            search_dist = point.distance_squared(&self.point(self.org(hint)));
        }

        let recent = self.recent;
        if !recent.is_outer() && self.is_alive(recent.tri) {
            let org = self.point(self.org(recent));
            if org == point {
                return (LocateResult::OnVertex, recent);
            }
            let dist = point.distance_squared(&org);
            if dist < search_dist {
                search = recent;
                search_dist = dist;
            }
        }

        while SAMPLE_FACTOR * self.samples * self.samples * self.samples < self.triangles.len() {
            self.samples += 1;
        }
        for index in self.triangles.sample(&mut self.rng, self.samples) {
            let candidate = Otri::new(TriangleId(index), 0);
            let dist = point.distance_squared(&self.point(self.org(candidate)));
            if dist < search_dist {
                search = candidate;
                search_dist = dist;
            }
        }

        if search.is_outer() {
            return (LocateResult::Outside, Otri::OUTER);
        }

        let org = self.point(self.org(search));
        let dest = self.point(self.dest(search));
        if org == point {
            return (LocateResult::OnVertex, search);
        }
        if dest == point {
            return (LocateResult::OnVertex, search.lnext());
        }
        let ahead = self.predicates.orient2d(&org, &dest, &point);
        if ahead < 0.0 {
            // Turn around so the point is to the left of the edge.
            let across = self.sym(search);
            if across.is_outer() {
                return (LocateResult::Outside, search);
            }
            search = across;
        } else if ahead == 0.0
            && ((org.x < point.x) == (point.x < dest.x))
            && ((org.y < point.y) == (point.y < dest.y))
        {
            return (LocateResult::OnEdge, search);
        }
        self.precise_locate(point, search, false)
    }

    /// Walks from `search`, whose edge must have `point` on its left (or on it).
    pub(crate) fn precise_locate(
        &self,
        point: Point,
        mut search: Otri,
        stop_at_subsegment: bool,
    ) -> (LocateResult, Otri) {
        let mut forg = self.point(self.org(search));
        let mut fdest = self.point(self.dest(search));
        let mut fapex = self.point(self.apex(search));
        let step_limit = 4 * self.triangles.len() + 16;

        if forg == point {
            return (LocateResult::OnVertex, search);
        }
        if fdest == point {
            return (LocateResult::OnVertex, search.lnext());
        }
        if self.predicates.orient2d(&forg, &fdest, &point) == 0.0
            && ((forg.x < point.x) == (point.x < fdest.x))
            && ((forg.y < point.y) == (point.y < fdest.y))
        {
            return (LocateResult::OnEdge, search);
        }

        for _ in 0..step_limit {
            if fapex == point {
                return (LocateResult::OnVertex, search.lprev());
            }
            // Is the point beyond the edge opposite the destination?
            let dest_orient = self.predicates.orient2d(&forg, &fapex, &point);
            // Is the point beyond the edge opposite the origin?
            let org_orient = self.predicates.orient2d(&fapex, &fdest, &point);

            let move_left = if dest_orient > 0.0 {
                if org_orient > 0.0 {
                    // Both edges qualify; pick by which side of the line
                    // through the apex perpendicular to org-dest the point is.
                    (fapex.x - point.x) * (fdest.x - forg.x) + (fapex.y - point.y) * (fdest.y - forg.y)
                        > 0.0
                } else {
                    true
                }
            } else if org_orient > 0.0 {
                false
            } else {
                if dest_orient == 0.0 {
                    return (LocateResult::OnEdge, search.lprev());
                }
                if org_orient == 0.0 {
                    return (LocateResult::OnEdge, search.lnext());
                }
                return (LocateResult::InTriangle, search);
            };

            let backtrack = if move_left {
                fdest = fapex;
                search.lprev()
            } else {
                forg = fapex;
                search.lnext()
            };
            search = self.sym(backtrack);

            if stop_at_subsegment && self.check_segments && !self.tspivot(backtrack).is_none() {
                return (LocateResult::Outside, backtrack);
            }
            if search.is_outer() {
                return (LocateResult::Outside, backtrack);
            }
            fapex = self.point(self.apex(search));
        }

        tracing::warn!(
            x = point.x,
            y = point.y,
            steps = step_limit,
            "point location walk did not terminate; reporting outside"
        );
        (LocateResult::Outside, search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behavior::Behavior;
    use crate::core::input::InputGeometry;

    fn grid(n: usize) -> Mesh {
        let mut points = Vec::new();
        for i in 0..n {
            for j in 0..n {
                #[allow(clippy::cast_precision_loss)]
                points.push([i as f64 + 0.01 * j as f64, j as f64 + 0.013 * i as f64]);
            }
        }
        Mesh::triangulate(&InputGeometry::from_points(points), Behavior::default()).unwrap()
    }

    #[test]
    fn locates_interior_points() {
        let mut mesh = grid(6);
        let (result, handle) = mesh.locate(Point::new(2.5, 2.5));
        assert_eq!(result, LocateResult::InTriangle);
        let [a, b, c] = mesh.corner_points(handle);
        let p = Point::new(2.5, 2.5);
        assert!(mesh.predicates.orient2d(&a, &b, &p) > 0.0);
        assert!(mesh.predicates.orient2d(&b, &c, &p) > 0.0);
        assert!(mesh.predicates.orient2d(&c, &a, &p) > 0.0);
    }

    #[test]
    fn locating_a_vertex_returns_it_as_origin() {
        let mut mesh = grid(5);
        let keys: Vec<_> = mesh.vertices.keys().collect();
        for key in keys {
            let p = mesh.point(key);
            let (result, handle) = mesh.locate(p);
            assert_eq!(result, LocateResult::OnVertex);
            assert_eq!(mesh.org(handle), key);
        }
    }

    #[test]
    fn locates_points_on_edges() {
        let input = InputGeometry::from_points([[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]]);
        let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        let (result, handle) = mesh.locate(Point::new(1.0, 0.0));
        assert_eq!(result, LocateResult::OnEdge);
        let o = mesh.point(mesh.org(handle));
        let d = mesh.point(mesh.dest(handle));
        assert_eq!(mesh.predicates.orient2d(&o, &d, &Point::new(1.0, 0.0)), 0.0);
    }

    #[test]
    fn empty_mesh_reports_outside() {
        let mut mesh = Mesh::new(Behavior::default()).unwrap();
        assert_eq!(mesh.locate(Point::new(0.0, 0.0)), (LocateResult::Outside, Otri::OUTER));
    }

    #[test]
    fn points_beyond_the_hull_are_outside() {
        let mut mesh = grid(3);
        let (result, handle) = mesh.locate(Point::new(-5.0, 1.0));
        assert_eq!(result, LocateResult::Outside);
        assert!(mesh.sym(handle).is_outer());
    }
}

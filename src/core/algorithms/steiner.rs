//! Alternatives to the plain circumcenter for fixing a bad triangle.
//!
//! Two strategies are offered, both optional:
//!
//! - **New location.** Candidates are tried on the segment from the
//!   circumcenter to the off-center. For each one the Bowyer–Watson cavity
//!   it would open is predicted, and the candidate is accepted only if every
//!   triangle it would create meets the angle bounds and no subsegment on the
//!   cavity boundary would be encroached. When no candidate qualifies the
//!   caller falls back to the off-center, so the result is never worse than
//!   the default placement.
//! - **Relocation.** A free corner of the bad triangle is moved to the
//!   centroid of its ring of neighbors, provided the centroid lies strictly
//!   inside the ring's kernel and strictly improves the worst angle around
//!   the vertex without falling below the bound.

use crate::core::algorithms::deletion::Fan;
use crate::core::algorithms::locate::LocateResult;
use crate::core::algorithms::refinement::TriangleShape;
use crate::core::collections::{FastHashSet, SmallBuffer};
use crate::core::mesh::{InsertVertexResult, Mesh, MeshError};
use crate::core::topology::{Otri, TriangleId};
use crate::core::vertex::{VertexKey, VertexKind};
use crate::geometry::point::Point;
use num_traits::cast;

/// Positions tried between the off-center (0) and the circumcenter (1).
const CANDIDATE_STEPS: [f64; 5] = [1.0, 0.75, 0.5, 0.25, 0.0];

/// Largest cavity examined for a candidate.
const CAVITY_LIMIT: usize = 64;

impl Mesh {
    /// Looks for a Steiner point for `bad` whose new triangles all satisfy
    /// the angle bounds. Returns the point and a handle of the triangle that
    /// contains it.
    pub(crate) fn new_location(&self, bad: Otri) -> Option<(Point, Otri)> {
        let [org, dest, apex] = self.corner_points(bad);
        let center = self.predicates.circumcenter(&org, &dest, &apex, 0.0).point;
        let off = self
            .predicates
            .circumcenter(&org, &dest, &apex, self.bounds.off_constant)
            .point;

        let mut tried: SmallBuffer<Point, 5> = SmallBuffer::new();
        for t in CANDIDATE_STEPS {
            let candidate = off.lerp(&center, t);
            if !candidate.is_finite() || tried.contains(&candidate) || [org, dest, apex].contains(&candidate) {
                continue;
            }
            tried.push(candidate);
            if let Some(handle) = self.accepts_location(bad, candidate) {
                tracing::trace!(x = candidate.x, y = candidate.y, t, "new location accepted");
                return Some((candidate, handle));
            }
        }
        None
    }

    /// Predicts the insertion of `p` and checks the triangles it would form.
    fn accepts_location(&self, bad: Otri, p: Point) -> Option<Otri> {
        let start = [bad, bad.lnext(), bad.lprev()].into_iter().find(|&o| {
            let [a, b, _] = self.corner_points(o);
            self.predicates.orient2d(&a, &b, &p) >= 0.0
        })?;
        let (location, found) = self.precise_locate(p, start, true);
        match location {
            LocateResult::Outside | LocateResult::OnVertex => return None,
            LocateResult::OnEdge if !self.tspivot(found).is_none() => return None,
            LocateResult::OnEdge | LocateResult::InTriangle => {}
        }

        let mut cavity: Vec<TriangleId> = vec![found.tri];
        let mut members: FastHashSet<TriangleId> = FastHashSet::default();
        members.insert(found.tri);
        if location == LocateResult::OnEdge {
            let across = self.sym(found);
            if !across.is_outer() {
                cavity.push(across.tri);
                members.insert(across.tri);
            }
        }

        let mut index = 0;
        while index < cavity.len() {
            let tri = cavity[index];
            index += 1;
            for orient in 0..3 {
                let edge = Otri::new(tri, orient);
                let neighbor = self.sym(edge);
                let constrained = !self.tspivot(edge).is_none();
                if !neighbor.is_outer() && !constrained {
                    if members.contains(&neighbor.tri) {
                        continue;
                    }
                    let [a, b, c] = self.corner_points(neighbor);
                    if self.predicates.incircle(&a, &b, &c, &p) > 0.0 {
                        if cavity.len() >= CAVITY_LIMIT {
                            return None;
                        }
                        cavity.push(neighbor.tri);
                        members.insert(neighbor.tri);
                        continue;
                    }
                }

                // `edge` bounds the cavity; it becomes a triangle with `p`.
                let [a, b, _] = self.corner_points(edge);
                if self.predicates.orient2d(&a, &b, &p) <= 0.0 {
                    return None;
                }
                if self.is_bad_shape(&TriangleShape::of(&a, &b, &p)) {
                    return None;
                }
                if constrained && self.apex_encroaches(&a, &b, &p) {
                    return None;
                }
            }
        }
        Some(found)
    }

    /// Tries to fix `bad` by moving one of its free corners. Returns `true`
    /// if the mesh was changed.
    pub(crate) fn try_relocate(&mut self, bad: Otri) -> Result<bool, MeshError> {
        for corner in [bad, bad.lnext(), bad.lprev()] {
            let v = self.org(corner);
            if self.kind(v) != VertexKind::Free {
                continue;
            }
            let Some(fan) = self.vertex_fan(corner) else {
                continue;
            };
            let Some(target) = self.relocation_target(v, &fan) else {
                continue;
            };
            self.move_free_vertex(corner, v, &fan, target)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// The centroid of `v`'s ring, if moving `v` there is an improvement.
    fn relocation_target(&self, v: VertexKey, fan: &Fan) -> Option<Point> {
        let here = self.point(v);
        let count: f64 = cast(fan.len())?;
        let (sx, sy) = fan.iter().fold((0.0, 0.0), |(sx, sy), &o| {
            let p = self.point(self.dest(o));
            (sx + p.x, sy + p.y)
        });
        let target = Point::new(sx / count, sy / count);
        if target == here || !target.is_finite() {
            return None;
        }

        let mut old_worst: f64 = 0.0;
        let mut new_worst: f64 = 0.0;
        for &o in fan {
            let d = self.point(self.dest(o));
            let a = self.point(self.apex(o));
            if self.predicates.orient2d(&d, &a, &target) <= 0.0 {
                return None;
            }
            old_worst = old_worst.max(TriangleShape::of(&here, &d, &a).min_angle_cos2);
            let shape = TriangleShape::of(&target, &d, &a);
            if self.is_bad_shape(&shape) {
                return None;
            }
            new_worst = new_worst.max(shape.min_angle_cos2);
            if !self.tspivot(o.lnext()).is_none() && self.apex_encroaches(&d, &a, &target) {
                return None;
            }
        }
        (new_worst < old_worst).then_some(target)
    }

    /// Deletes `v` (the origin of `corner`) and reinserts it at `target`.
    fn move_free_vertex(&mut self, corner: Otri, v: VertexKey, fan: &Fan, target: Point) -> Result<(), MeshError> {
        let ring: FastHashSet<(VertexKey, VertexKey)> = fan
            .iter()
            .map(|&o| (self.dest(o), self.apex(o)))
            .collect();
        if !self.remove_free_vertex(corner)? {
            return Ok(());
        }
        let old = self.point(v);
        self.kill_vertex(v);
        let polygon = self.polygon_triangles(corner.tri, &ring);

        let start = [corner, corner.lnext(), corner.lprev()]
            .into_iter()
            .find(|&o| {
                let [a, b, _] = self.corner_points(o);
                self.predicates.orient2d(&a, &b, &target) >= 0.0
            })
            .unwrap_or(corner);
        let (location, found) = self.precise_locate(target, start, true);
        let inserted = if matches!(location, LocateResult::InTriangle | LocateResult::OnEdge) {
            let attributes = self.attributes_at(found, target);
            let moved = self.make_vertex(target, VertexKind::Free, 0, attributes);
            let mut search = found;
            match self.insert_vertex(moved, &mut search, None, true, true) {
                InsertVertexResult::Successful => true,
                InsertVertexResult::Encroaching => {
                    self.undo_vertex();
                    self.kill_vertex(moved);
                    false
                }
                InsertVertexResult::Violating | InsertVertexResult::Outside | InsertVertexResult::Duplicate => {
                    self.kill_vertex(moved);
                    false
                }
            }
        } else {
            false
        };
        if inserted {
            tracing::trace!(from_x = old.x, from_y = old.y, x = target.x, y = target.y, "relocated free vertex");
        } else {
            tracing::warn!(x = old.x, y = old.y, "relocated free vertex could not be reinserted; it was removed");
        }

        // Triangles of the re-triangulated star that the reinsertion left
        // standing have not been tested yet.
        for tri in polygon {
            if self.is_alive(tri) {
                self.test_triangle(Otri::new(tri, 0));
            }
        }
        Ok(())
    }

    /// Collects the triangles reachable from `seed` without crossing an edge
    /// of `ring`.
    fn polygon_triangles(&self, seed: TriangleId, ring: &FastHashSet<(VertexKey, VertexKey)>) -> Vec<TriangleId> {
        let mut found = vec![seed];
        let mut index = 0;
        while index < found.len() && found.len() <= ring.len() {
            let tri = found[index];
            index += 1;
            for orient in 0..3 {
                let edge = Otri::new(tri, orient);
                let key = (self.org(edge), self.dest(edge));
                if ring.contains(&key) || ring.contains(&(key.1, key.0)) {
                    continue;
                }
                let neighbor = self.sym(edge);
                if !neighbor.is_outer() && !found.contains(&neighbor.tri) {
                    found.push(neighbor.tri);
                }
            }
        }
        found
    }
}

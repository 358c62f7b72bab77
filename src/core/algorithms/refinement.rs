//! Quality refinement (Ruppert's algorithm with Chew-style lenses).
//!
//! # Algorithm
//!
//! Refinement keeps two work queues:
//!
//! - **Encroached subsegments.** A subsegment is encroached when the apex of
//!   a triangle on either side lies inside its diametral lens (or, in
//!   conforming Delaunay mode, its diametral circle). Encroached subsegments
//!   are split, at the midpoint or at a power-of-two distance from an
//!   endpoint shared with another segment. The power-of-two "shells" stop
//!   splits from cascading forever around small input angles.
//! - **Bad triangles.** A triangle is bad when its smallest angle is below
//!   the bound, its largest angle is above the bound, or it violates an area
//!   constraint. Bad triangles are split at their circumcenter (or
//!   off-center). A circumcenter that would encroach a subsegment is
//!   retracted with the flip stack, and the subsegment is split instead.
//!
//! A pass first splits every encroached subsegment, then tallies bad
//! triangles and splits them shortest-edge first until the queue drains or
//! the Steiner budget runs out.
//!
//! Triangles whose shortest edge joins two segment vertices equidistant from
//! the vertex where their segments meet are never split (the
//! Miller–Pav–Walkington exception); splitting them would only produce more
//! of the same near a small input angle.
//!
//! # References
//!
//! - J. Ruppert, "A Delaunay Refinement Algorithm for Quality 2-Dimensional
//!   Mesh Generation", Journal of Algorithms 18(3), 1995.
//! - J. R. Shewchuk, "Delaunay Refinement Algorithms for Triangular Mesh
//!   Generation", Computational Geometry: Theory and Applications 22, 2002.
//! - G. L. Miller, S. E. Pav, and N. J. Walkington, "When and Why Ruppert's
//!   Algorithm Works", 12th International Meshing Roundtable, 2003.

use crate::core::behavior::{SegmentSplitting, SteinerPlacement};
use crate::core::flaws::BadTriangle;
use crate::core::mesh::{InsertVertexResult, Mesh, MeshError};
use crate::core::topology::{Osub, Otri, SubsegId, TriangleId};
use crate::core::vertex::{VertexKind, interpolate_attributes, lerp_attributes};
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};

/// Summary of one [`Mesh::refine`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementReport {
    /// Steiner points inserted by this run.
    pub steiner_points: usize,
    /// Free vertices moved instead of inserting a new point.
    pub relocations: usize,
    /// Encroached subsegments still queued when the run stopped.
    pub encroached_remaining: usize,
    /// Bad-triangle queue entries left when the run stopped.
    pub bad_triangles_remaining: usize,
    /// Whether the Steiner budget reached zero.
    pub budget_exhausted: bool,
}

/// Bookkeeping for a single refinement run.
#[derive(Debug, Default)]
pub(crate) struct RefinementRun {
    pub(crate) relocations_left: usize,
    pub(crate) relocations: usize,
}

/// Shape measures of a triangle, following the corners `(org, dest, apex)`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TriangleShape {
    /// Squared length of the shortest edge.
    pub(crate) min_edge: f64,
    /// Squared cosine of the smallest angle.
    pub(crate) min_angle_cos2: f64,
    /// Cosine of the largest angle.
    pub(crate) max_angle_cos: f64,
    /// Which edge is shortest: 0 for org-dest, 1 for dest-apex, 2 for apex-org.
    pub(crate) shortest: u8,
}

impl TriangleShape {
    pub(crate) fn of(org: &Point, dest: &Point, apex: &Point) -> Self {
        let (dxod, dyod) = (org.x - dest.x, org.y - dest.y);
        let (dxda, dyda) = (dest.x - apex.x, dest.y - apex.y);
        let (dxao, dyao) = (apex.x - org.x, apex.y - org.y);
        let apexlen = dxod * dxod + dyod * dyod;
        let orglen = dxda * dxda + dyda * dyda;
        let destlen = dxao * dxao + dyao * dyao;

        let ratio = |dot: f64, a: f64, b: f64| {
            let denominator = a * b;
            if denominator > 0.0 {
                dot * dot / denominator
            } else {
                1.0
            }
        };
        let (min_edge, min_angle_cos2, shortest) = if apexlen < orglen && apexlen < destlen {
            (apexlen, ratio(dxda * dxao + dyda * dyao, orglen, destlen), 0)
        } else if orglen < destlen {
            (orglen, ratio(dxod * dxao + dyod * dyao, apexlen, destlen), 1)
        } else {
            (destlen, ratio(dxod * dxda + dyod * dyda, apexlen, orglen), 2)
        };

        let cosine = |opposite: f64, a: f64, b: f64| {
            let denominator = 2.0 * (a * b).sqrt();
            if denominator > 0.0 {
                (a + b - opposite) / denominator
            } else {
                -1.0
            }
        };
        let max_angle_cos = if apexlen > orglen && apexlen > destlen {
            cosine(apexlen, orglen, destlen)
        } else if orglen > destlen {
            cosine(orglen, apexlen, destlen)
        } else {
            cosine(destlen, apexlen, orglen)
        };

        Self {
            min_edge,
            min_angle_cos2,
            max_angle_cos,
            shortest,
        }
    }
}

impl Mesh {
    /// Refines the mesh until every triangle meets the configured quality
    /// bounds or the Steiner budget runs out.
    ///
    /// Encroached subsegments are split first, then bad triangles. Running
    /// out of budget while encroached subsegments remain is reported with a
    /// warning and in the returned report; the mesh is still valid.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::PrecisionExhausted`] when a new vertex would
    /// coincide with an existing one, or [`MeshError::Topology`] if a
    /// segment split cannot be inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_mesh::prelude::*;
    ///
    /// let input = InputGeometry::from_points([[0.0, 0.0], [4.0, 0.0], [4.0, 0.3], [0.0, 0.3]])
    ///     .with_closed_polygon(1);
    /// let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
    /// assert_eq!(mesh.triangle_count(), 2);
    ///
    /// mesh.set_behavior(BehaviorBuilder::default().quality(true).build().unwrap()).unwrap();
    /// let report = mesh.refine().unwrap();
    /// assert!(report.steiner_points > 0);
    /// assert!(mesh.quality_statistics().unwrap().min_angle >= 20.0 - 1e-9);
    /// ```
    pub fn refine(&mut self) -> Result<RefinementReport, MeshError> {
        let mut report = RefinementReport::default();
        if self.triangles.is_empty() {
            return Ok(report);
        }
        let span = tracing::debug_span!(
            "refine",
            triangles = self.triangles.len(),
            subsegments = self.subsegs.len(),
            min_angle = self.behavior.min_angle,
        );
        let _guard = span.enter();

        let inserted_before = self.steiner_inserted;
        self.forget_insertion();
        self.queues.clear();
        let mut run = RefinementRun {
            relocations_left: if self.behavior.relocate_free_vertices {
                self.triangles.len()
            } else {
                0
            },
            relocations: 0,
        };

        let outcome = self.enforce_quality(&mut run);
        self.check_quality = false;
        self.forget_insertion();
        outcome?;

        report.steiner_points = self.steiner_inserted - inserted_before;
        report.relocations = run.relocations;
        report.encroached_remaining = self.queues.encroached_len();
        report.bad_triangles_remaining = self.queues.bad_triangle_len();
        report.budget_exhausted = self.budget_exhausted();
        tracing::debug!(
            steiner = report.steiner_points,
            relocations = report.relocations,
            triangles = self.triangles.len(),
            "refinement finished"
        );
        Ok(report)
    }

    /// Splits every queued encroached subsegment (and any subsegments those
    /// splits encroach in turn). Returns the number of vertices inserted.
    ///
    /// Subsegments are queued by [`Mesh::insert_point`] when a point lands on
    /// one, and by [`Mesh::refine`].
    ///
    /// # Errors
    ///
    /// Same as [`Mesh::refine`].
    pub fn split_encroached_segments(&mut self) -> Result<usize, MeshError> {
        let before = self.steiner_inserted;
        let triangle_flaws = self.check_quality;
        let outcome = self.split_encroached(triangle_flaws);
        self.forget_insertion();
        outcome?;
        Ok(self.steiner_inserted - before)
    }

    /// Number of subsegments currently queued as encroached.
    #[must_use]
    pub fn encroached_count(&self) -> usize {
        self.queues.encroached_len()
    }

    fn enforce_quality(&mut self, run: &mut RefinementRun) -> Result<(), MeshError> {
        self.tally_encroached();
        self.split_encroached(false)?;
        tracing::debug!(
            vertices = self.vertices.len(),
            subsegments = self.subsegs.len(),
            "split encroached subsegments"
        );

        if self.behavior.has_triangle_criteria() {
            self.tally_faces();
            self.check_quality = true;
            while !self.budget_exhausted() {
                let Some(bad) = self.queues.pop_bad_triangle() else {
                    break;
                };
                self.split_triangle(bad, run)?;
                if self.queues.has_encroached() {
                    // Try this triangle again once the subsegments are split.
                    self.queues.requeue_bad_triangle(bad);
                    self.split_encroached(true)?;
                }
            }
        }

        if self.queues.has_encroached() && self.budget_exhausted() {
            tracing::warn!(
                remaining = self.queues.encroached_len(),
                "ran out of Steiner points with encroached subsegments left; the mesh may not be conforming Delaunay"
            );
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    /// Checks whether a triangle apex on either side encroaches on
    /// `subseg`, queuing it when splitting is allowed. Returns `true` if it
    /// is encroached.
    pub(crate) fn check_seg_encroach(&mut self, subseg: Osub) -> bool {
        let eorg = self.point(self.sorg(subseg));
        let edest = self.point(self.sdest(subseg));
        let mut encroached = 0;
        let mut sides = 0;

        for (flag, side) in [(1, subseg), (2, subseg.ssym())] {
            let neighbor = self.stpivot(side);
            if neighbor.is_outer() {
                continue;
            }
            sides += 1;
            let eapex = self.point(self.apex(neighbor));
            if self.apex_encroaches(&eorg, &edest, &eapex) {
                encroached |= flag;
            }
        }

        if encroached != 0 {
            let enqueue = match self.behavior.segment_splitting {
                SegmentSplitting::Normal => true,
                SegmentSplitting::NoBoundarySplits => sides == 2,
                SegmentSplitting::NoSplits => false,
            };
            if enqueue {
                // Queue the orientation that has an encroaching apex on its side.
                let queued = if encroached & 1 != 0 { subseg } else { subseg.ssym() };
                let (org, dest) = (self.sorg(queued), self.sdest(queued));
                self.queues.push_encroached(queued, org, dest);
            }
        }
        encroached != 0
    }

    /// Diametral lens (or circle) test of `apex` against the edge `org-dest`.
    pub(crate) fn apex_encroaches(&self, org: &Point, dest: &Point, apex: &Point) -> bool {
        let dot = (org.x - apex.x) * (dest.x - apex.x) + (org.y - apex.y) * (dest.y - apex.y);
        if dot >= 0.0 {
            return false;
        }
        self.behavior.conforming_delaunay
            || dot * dot >= self.bounds.lens_bound() * apex.distance_squared(org) * apex.distance_squared(dest)
    }

    /// Queues `tri` if it fails a quality or area test.
    pub(crate) fn test_triangle(&mut self, tri: Otri) {
        let corners = self.corners(tri);
        let [torg, tdest, tapex] = corners.map(|v| self.point(v));
        let shape = TriangleShape::of(&torg, &tdest, &tapex);

        if self.behavior.has_area_criteria() {
            let area = 0.5 * ((torg.x - tdest.x) * (tdest.y - tapex.y) - (torg.y - tdest.y) * (tdest.x - tapex.x));
            let area_bound = self.tri(tri.tri).area_bound;
            let too_big = self.behavior.max_area.is_some_and(|max| area > max)
                || (self.behavior.variable_area && area_bound > 0.0 && area > area_bound)
                || self
                    .behavior
                    .user_test
                    .as_ref()
                    .is_some_and(|test| test.is_unsuitable(&torg, &tdest, &tapex, area));
            if too_big {
                self.queues.push_bad_triangle(tri, shape.min_edge, corners);
                return;
            }
        }

        if !self.is_bad_shape(&shape) {
            return;
        }

        // The shortest edge, seen from `tri`'s triangle.
        let base = match shape.shortest {
            0 => tri,
            1 => tri.lnext(),
            _ => tri.lprev(),
        };
        if self.is_small_angle_exception(base) {
            return;
        }
        self.queues.push_bad_triangle(tri, shape.min_edge, corners);
    }

    pub(crate) fn is_bad_shape(&self, shape: &TriangleShape) -> bool {
        shape.min_angle_cos2 > self.bounds.good_angle
            || (self.behavior.max_angle != 0.0 && shape.max_angle_cos < self.bounds.max_good_angle)
    }

    /// Whether the edge of `base` joins two segment vertices lying at equal
    /// distance from the vertex where their two segments meet.
    fn is_small_angle_exception(&self, base: Otri) -> bool {
        let base1 = self.org(base);
        let base2 = self.dest(base);
        if self.kind(base1) != VertexKind::Segment || self.kind(base2) != VertexKind::Segment {
            return false;
        }
        if !self.tspivot(base).is_none() {
            return false;
        }
        let Some(first) = self.next_subseg(base, |mesh, o| mesh.oprev(o)) else {
            return false;
        };
        let Some(second) = self.next_subseg(base, |mesh, o| mesh.dnext(o)) else {
            return false;
        };
        let (org1, dest1) = (self.point(self.segorg(first)), self.point(self.segdest(first)));
        let (org2, dest2) = (self.point(self.segorg(second)), self.point(self.segdest(second)));
        let join = if dest1 == org2 {
            dest1
        } else if org1 == dest2 {
            org1
        } else {
            return false;
        };
        let dist1 = self.point(base1).distance_squared(&join);
        let dist2 = self.point(base2).distance_squared(&join);
        dist1 < 1.001 * dist2 && dist1 > 0.999 * dist2
    }

    /// Rotates from `start` with `step` until an edge carrying a subsegment
    /// is found.
    fn next_subseg(&self, start: Otri, step: impl Fn(&Self, Otri) -> Otri) -> Option<Osub> {
        let mut o = start;
        for _ in 0..=self.triangles.len() {
            o = step(self, o);
            if o.is_outer() || o == start {
                return None;
            }
            let s = self.tspivot(o);
            if !s.is_none() {
                return Some(s);
            }
        }
        None
    }

    fn tally_encroached(&mut self) {
        let live = self.subsegs.live_indices();
        for index in live {
            self.check_seg_encroach(Osub::new(SubsegId(index), 0));
        }
    }

    fn tally_faces(&mut self) {
        let live = self.triangles.live_indices();
        for index in live {
            self.test_triangle(Otri::new(TriangleId(index), 0));
        }
        tracing::debug!(bad = self.queues.bad_triangle_len(), "tallied bad triangles");
    }

    // -------------------------------------------------------------------------
    // Splitting
    // -------------------------------------------------------------------------

    /// Splits queued encroached subsegments until the queue drains or the
    /// budget runs out. Entries whose subsegment has since changed are
    /// skipped.
    pub(crate) fn split_encroached(&mut self, triangle_flaws: bool) -> Result<(), MeshError> {
        while !self.budget_exhausted() {
            let Some(entry) = self.queues.pop_encroached() else {
                break;
            };
            let current = entry.subseg;
            if !self.is_subseg_alive(current.seg)
                || self.sorg(current) != entry.org
                || self.sdest(current) != entry.dest
            {
                continue;
            }
            self.split_subsegment(current, triangle_flaws)?;
        }
        Ok(())
    }

    fn split_subsegment(&mut self, mut current: Osub, triangle_flaws: bool) -> Result<(), MeshError> {
        if self.stpivot(current).is_outer() {
            current = current.ssym();
            if self.stpivot(current).is_outer() {
                return Err(MeshError::topology("encroached subsegment has no adjacent triangle"));
            }
        }
        let eorg = self.point(self.sorg(current));
        let edest = self.point(self.sdest(current));

        // Is either endpoint shared with another segment?
        let enctri = self.stpivot(current);
        let mut acute_org = !self.tspivot(enctri.lnext()).is_none();
        let mut acute_dest = !self.tspivot(enctri.lprev()).is_none();
        if !self.behavior.conforming_delaunay && !acute_org && !acute_dest {
            self.clear_diametral_circle(current, false, &eorg, &edest)?;
        }

        let other = self.sym(self.stpivot(current));
        if !other.is_outer() {
            let acute_dest2 = !self.tspivot(other.lnext()).is_none();
            let acute_org2 = !self.tspivot(other.lprev()).is_none();
            acute_dest |= acute_dest2;
            acute_org |= acute_org2;
            if !self.behavior.conforming_delaunay && !acute_org2 && !acute_dest2 {
                self.clear_diametral_circle(current, true, &eorg, &edest)?;
            }
        }

        let split = if acute_org || acute_dest {
            let length = eorg.distance(&edest);
            let mut nearest = 1.0;
            while length > 3.0 * nearest {
                nearest *= 2.0;
            }
            while length < 1.5 * nearest {
                nearest *= 0.5;
            }
            let split = nearest / length;
            if acute_dest { 1.0 - split } else { split }
        } else {
            0.5
        };

        let mut point = Point::new(eorg.x + split * (edest.x - eorg.x), eorg.y + split * (edest.y - eorg.y));
        if self.behavior.exact_arithmetic {
            // One step of iterative refinement toward the segment's line.
            let multiplier = self.predicates.orient2d(&eorg, &edest, &point);
            let divisor = eorg.distance_squared(&edest);
            if multiplier != 0.0 && divisor != 0.0 {
                let multiplier = multiplier / divisor;
                if !multiplier.is_nan() {
                    point.x += multiplier * (edest.y - eorg.y);
                    point.y += multiplier * (eorg.x - edest.x);
                }
            }
        }
        if point == eorg || point == edest {
            return Err(MeshError::PrecisionExhausted {
                operation: "segment split",
                x: point.x,
                y: point.y,
            });
        }

        let attributes = lerp_attributes(
            self.vertices[self.sorg(current)].attributes(),
            self.vertices[self.sdest(current)].attributes(),
            split,
        );
        let marker = self.subseg_marker(current);
        let v = self.make_vertex(point, VertexKind::Segment, marker, attributes);
        let mut enctri = self.stpivot(current);
        let result = self.insert_vertex(v, &mut enctri, Some(&mut current), true, triangle_flaws);
        if !result.is_inserted() {
            self.kill_vertex(v);
            return Err(MeshError::topology(format!(
                "segment split vertex at ({}, {}) was not inserted ({result:?})",
                point.x, point.y
            )));
        }
        self.consume_steiner();
        tracing::trace!(x = point.x, y = point.y, split, "split subsegment");

        self.check_seg_encroach(current);
        let next = self.snext(current);
        self.check_seg_encroach(next);
        Ok(())
    }

    /// Deletes free vertices that are apexes of the triangle on one side of
    /// `current` and lie inside its diametral circle.
    fn clear_diametral_circle(
        &mut self,
        current: Osub,
        far_side: bool,
        eorg: &Point,
        edest: &Point,
    ) -> Result<(), MeshError> {
        loop {
            let near = self.stpivot(current);
            let tri = if far_side { self.sym(near) } else { near };
            if tri.is_outer() {
                return Ok(());
            }
            let apex = self.apex(tri);
            let p = self.point(apex);
            let inside = (eorg.x - p.x) * (edest.x - p.x) + (eorg.y - p.y) * (edest.y - p.y) < 0.0;
            if self.kind(apex) != VertexKind::Free || !inside {
                return Ok(());
            }
            if !self.remove_free_vertex(tri.lprev())? {
                return Ok(());
            }
            self.kill_vertex(apex);
            tracing::trace!(x = p.x, y = p.y, "deleted free vertex inside a diametral circle");
        }
    }

    /// Splits a bad triangle with a new vertex (or a relocated one), unless
    /// it has changed since it was queued.
    fn split_triangle(&mut self, bad: BadTriangle, run: &mut RefinementRun) -> Result<(), MeshError> {
        let mut badotri = bad.triangle;
        if !self.is_alive(badotri.tri) || self.corners(badotri) != [bad.org, bad.dest, bad.apex] {
            return Ok(());
        }

        if run.relocations_left > 0 && self.try_relocate(badotri)? {
            run.relocations_left -= 1;
            run.relocations += 1;
            return Ok(());
        }

        let [borg, bdest, bapex] = self.corner_points(badotri);
        let relocated = if self.behavior.steiner_placement == SteinerPlacement::NewLocation
            && !self.behavior.has_area_criteria()
        {
            self.new_location(badotri)
        } else {
            None
        };
        let (point, mut search) = if let Some(found) = relocated {
            found
        } else {
            let center = self
                .predicates
                .circumcenter(&borg, &bdest, &bapex, self.bounds.off_constant);
            if center.point == borg || center.point == bdest || center.point == bapex {
                return Err(MeshError::PrecisionExhausted {
                    operation: "circumcenter insertion",
                    x: center.point.x,
                    y: center.point.y,
                });
            }
            // Keep the circumcenter to the left of the search edge.
            if center.eta < center.xi {
                badotri = badotri.lprev();
            }
            (center.point, badotri)
        };

        let attributes = {
            let [a, b, c] = bad_corner_attributes(self, bad);
            match triangle_coordinates(&borg, &bdest, &bapex, &point) {
                Some((xi, eta)) if !a.is_empty() => interpolate_attributes(a, b, c, xi, eta),
                _ => a.to_vec(),
            }
        };
        let v = self.make_vertex(point, VertexKind::Free, 0, attributes);
        match self.insert_vertex(v, &mut search, None, true, true) {
            InsertVertexResult::Successful => {
                self.consume_steiner();
                tracing::trace!(x = point.x, y = point.y, "inserted Steiner point");
            }
            InsertVertexResult::Encroaching => {
                self.undo_vertex();
                self.kill_vertex(v);
            }
            InsertVertexResult::Violating | InsertVertexResult::Outside => {
                self.kill_vertex(v);
            }
            InsertVertexResult::Duplicate => {
                self.kill_vertex(v);
                return Err(MeshError::PrecisionExhausted {
                    operation: "circumcenter insertion",
                    x: point.x,
                    y: point.y,
                });
            }
        }
        Ok(())
    }
}

fn bad_corner_attributes(mesh: &Mesh, bad: BadTriangle) -> [&[f64]; 3] {
    [bad.org, bad.dest, bad.apex].map(|v| mesh.vertices[v].attributes())
}

/// Coordinates `(xi, eta)` of `p` along `org → dest` and `org → apex`.
pub(crate) fn triangle_coordinates(org: &Point, dest: &Point, apex: &Point, p: &Point) -> Option<(f64, f64)> {
    let (xdo, ydo) = (dest.x - org.x, dest.y - org.y);
    let (xao, yao) = (apex.x - org.x, apex.y - org.y);
    let denominator = xdo * yao - xao * ydo;
    if denominator == 0.0 {
        return None;
    }
    let (dx, dy) = (p.x - org.x, p.y - org.y);
    Some(((dx * yao - xao * dy) / denominator, (xdo * dy - dx * ydo) / denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behavior::{Behavior, BehaviorBuilder};
    use crate::core::input::{InputGeometry, InputSegment};
    use approx::assert_relative_eq;

    fn quality(min_angle: f64) -> Behavior {
        BehaviorBuilder::default()
            .quality(true)
            .min_angle(min_angle)
            .build()
            .unwrap()
    }

    fn min_angle_degrees(mesh: &Mesh) -> f64 {
        mesh.triangles
            .iter()
            .map(|(index, _)| {
                let [a, b, c] = mesh.corner_points(Otri::new(TriangleId(index), 0));
                crate::geometry::quality::min_angle(&a, &b, &c)
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn shape_measures_of_right_isoceles_triangle() {
        let shape = TriangleShape::of(&Point::new(0.0, 0.0), &Point::new(1.0, 0.0), &Point::new(0.0, 1.0));
        assert_relative_eq!(shape.min_edge, 1.0);
        // Smallest angle is 45°.
        assert_relative_eq!(shape.min_angle_cos2, 0.5, epsilon = 1e-12);
        // Largest angle is 90°.
        assert_relative_eq!(shape.max_angle_cos, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn triangle_coordinates_recover_corners() {
        let (o, d, a) = (Point::new(1.0, 1.0), Point::new(3.0, 1.0), Point::new(1.0, 4.0));
        assert_eq!(triangle_coordinates(&o, &d, &a, &d), Some((1.0, 0.0)));
        assert_eq!(triangle_coordinates(&o, &d, &a, &a), Some((0.0, 1.0)));
        assert_eq!(triangle_coordinates(&o, &o, &a, &a), None);
    }

    #[test]
    fn skinny_rectangle_is_refined_to_the_angle_bound() {
        let input = InputGeometry::from_points([[0.0, 0.0], [5.0, 0.0], [5.0, 0.5], [0.0, 0.5]]).with_closed_polygon(1);
        let mesh = Mesh::triangulate(&input, quality(25.0)).unwrap();
        assert!(mesh.triangle_count() > 2);
        assert!(min_angle_degrees(&mesh) >= 25.0 - 1e-9);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn area_bound_limits_triangle_size() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).with_closed_polygon(1);
        let behavior = BehaviorBuilder::default().quality(true).max_area(0.02).build().unwrap();
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        let stats = mesh.quality_statistics().unwrap();
        assert!(stats.max_area <= 0.02 + 1e-12);
        assert!(mesh.triangle_count() >= 50);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn steiner_budget_stops_refinement() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).with_closed_polygon(1);
        let behavior = BehaviorBuilder::default()
            .quality(true)
            .max_area(0.001)
            .steiner_limit(7)
            .build()
            .unwrap();
        let mut mesh = Mesh::triangulate(&input, behavior).unwrap();
        assert_eq!(mesh.steiner_points_inserted(), 7);
        assert_eq!(mesh.steiner_points_left(), Some(0));
        let report = mesh.refine().unwrap();
        assert_eq!(report.steiner_points, 0);
        assert!(report.budget_exhausted);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn point_on_segment_is_queued_and_split_at_midpoint() {
        let input = InputGeometry::from_points([[-1.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).with_closed_polygon(3);
        let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        let (key, result) = mesh.insert_point(Point::new(0.0, 0.0)).unwrap();
        assert_eq!((key, result), (None, InsertVertexResult::Violating));
        assert_eq!(mesh.encroached_count(), 1);

        assert_eq!(mesh.split_encroached_segments().unwrap(), 1);
        assert_eq!(mesh.encroached_count(), 0);
        let midpoint = mesh
            .vertices
            .values()
            .find(|v| v.kind() == VertexKind::Segment)
            .unwrap();
        assert_eq!(midpoint.point(), Point::new(0.0, 0.0));
        assert_eq!(midpoint.marker(), 3);
        assert_eq!(mesh.subsegment_count(), 4);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn encroached_segment_is_found_by_its_apex() {
        // The apex (0, 0.2) sits deep inside the diametral circle of the base.
        let input = InputGeometry::from_points([[-1.0, 0.0], [1.0, 0.0], [0.0, 0.2]])
            .with_segments([InputSegment::new(0, 1), InputSegment::new(1, 2), InputSegment::new(2, 0)]);
        let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        mesh.tally_encroached();
        assert!(mesh.encroached_count() >= 1);

        let lenient = BehaviorBuilder::default().segment_splitting(SegmentSplitting::NoSplits).build().unwrap();
        mesh.set_behavior(lenient).unwrap();
        mesh.queues.clear();
        mesh.tally_encroached();
        assert_eq!(mesh.encroached_count(), 0);
    }

    #[test]
    fn small_input_angle_terminates() {
        // Two segments meeting at a 5° angle.
        let angle = 5.0_f64.to_radians();
        let input = InputGeometry::from_points([[0.0, 0.0], [4.0, 0.0], [4.0 * angle.cos(), 4.0 * angle.sin()]])
            .with_closed_polygon(1);
        let mesh = Mesh::triangulate(&input, quality(20.0)).unwrap();
        assert!(mesh.triangle_count() > 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn new_location_placement_meets_the_bound() {
        let input = InputGeometry::from_points([[0.0, 0.0], [3.0, 0.0], [3.0, 0.4], [1.2, 1.1], [0.0, 0.6]])
            .with_closed_polygon(1);
        let behavior = BehaviorBuilder::default()
            .quality(true)
            .min_angle(22.0)
            .steiner_placement(SteinerPlacement::NewLocation)
            .build()
            .unwrap();
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        assert!(min_angle_degrees(&mesh) >= 22.0 - 1e-9);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn attributes_are_interpolated_at_steiner_points() {
        let mut input = InputGeometry::from_points([[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]).with_closed_polygon(1);
        for vertex in &mut input.vertices {
            vertex.attributes = vec![vertex.point.x + 10.0 * vertex.point.y];
        }
        let behavior = BehaviorBuilder::default().quality(true).max_area(0.1).build().unwrap();
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        for vertex in mesh.vertices.values().filter(|v| v.kind().is_in_mesh()) {
            let p = vertex.point();
            assert_relative_eq!(vertex.attributes()[0], p.x + 10.0 * p.y, epsilon = 1e-9);
        }
    }
}

//! Segment recovery: turning input segments into chains of subsegments.
//!
//! Each segment is first "scouted" from one endpoint: if it already exists as
//! a mesh edge it is simply marked, if it runs through a collinear vertex it
//! is marked up to that vertex and scouting continues from there, and if it
//! crosses an earlier subsegment both are split at the intersection. Whatever
//! remains is forced into the triangulation by flipping away every edge that
//! crosses it, after which the Delaunay property is restored on both sides.
//!
//! # References
//!
//! - J. R. Shewchuk, "Triangle: Engineering a 2D Quality Mesh Generator and
//!   Delaunay Triangulator", Applied Computational Geometry, 1996.

use crate::core::collections::{FastHashSet, fast_hash_set_with_capacity};
use crate::core::input::InputGeometry;
use crate::core::mesh::{InsertVertexResult, Mesh, MeshError};
use crate::core::topology::{Osub, Otri, TriangleId};
use crate::core::vertex::{VertexKey, VertexKind, lerp_attributes};
use crate::geometry::point::Point;

/// Where a segment leaves a vertex, relative to the triangle found for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// The segment passes through the triangle's interior.
    Within,
    /// The segment runs along the triangle's left edge (org → apex).
    LeftCollinear,
    /// The segment runs along the triangle's right edge (org → dest).
    RightCollinear,
}

impl Mesh {
    /// Bonds a subsegment to the edge of `tri` (creating it if needed) and
    /// propagates `marker` onto the edge's endpoints that have none.
    ///
    /// The new subsegment runs `dest(tri) → org(tri)`, so `tri` lies on its
    /// right-hand side.
    pub(crate) fn insert_subseg(&mut self, tri: Otri, marker: i32) {
        let triorg = self.org(tri);
        let tridest = self.dest(tri);
        if self.marker(triorg) == 0 {
            self.set_marker(triorg, marker);
        }
        if self.marker(tridest) == 0 {
            self.set_marker(tridest, marker);
        }

        let existing = self.tspivot(tri);
        if existing.is_none() {
            let subseg = self.make_subseg();
            self.set_sorg(subseg, tridest);
            self.set_sdest(subseg, triorg);
            self.set_segorg(subseg, tridest);
            self.set_segdest(subseg, triorg);
            self.tsbond(tri, subseg);
            let oppo = self.sym(tri);
            self.tsbond(oppo, subseg.ssym());
            self.set_subseg_marker(subseg, marker);
        } else if self.subseg_marker(existing) == 0 {
            self.set_subseg_marker(existing, marker);
        }
    }

    /// Records, for every vertex, a triangle whose origin it is.
    pub(crate) fn make_vertex_map(&mut self) {
        let handles: Vec<(VertexKey, Otri)> = self
            .triangles
            .iter()
            .flat_map(|(index, t)| {
                (0..3_u8).map(move |orient| {
                    let o = Otri::new(TriangleId(index), orient);
                    (t.vertices[o.org_slot()], o)
                })
            })
            .collect();
        for (v, o) in handles {
            self.set_vertex_triangle(v, o);
        }
    }

    /// Wraps the hull in subsegments with marker 1.
    pub(crate) fn mark_hull(&mut self) -> Result<(), MeshError> {
        self.check_segments = true;
        let Some(start) = self.hull_handle() else {
            return Ok(());
        };
        let limit = 2 * self.triangles.high_water() + 8;
        let mut hulltri = start;
        for _ in 0..limit {
            self.insert_subseg(hulltri, 1);
            hulltri = hulltri.lnext();
            let mut next = self.oprev(hulltri);
            while !next.is_outer() {
                hulltri = next;
                next = self.oprev(hulltri);
            }
            if hulltri == start {
                return Ok(());
            }
        }
        Err(MeshError::topology("hull traversal did not return to its start"))
    }

    /// Inserts the input segments, and wraps the hull when there are none
    /// (or when the convex hull is to be kept).
    pub(crate) fn form_skeleton(&mut self, input: &InputGeometry, keys: &[VertexKey]) -> Result<(), MeshError> {
        self.check_segments = true;
        if !input.segments.is_empty() && !self.triangles.is_empty() {
            tracing::debug!(segments = input.segments.len(), "recovering segments");
            self.make_vertex_map();
            let mut inserted: FastHashSet<(VertexKey, VertexKey)> =
                fast_hash_set_with_capacity(input.segments.len());
            for (index, segment) in input.segments.iter().enumerate() {
                let [a, b] = segment.endpoints;
                let (end1, end2) = (keys[a], keys[b]);
                if self.point(end1) == self.point(end2) {
                    tracing::warn!(segment = index, a, b, "segment endpoints coincide; skipped");
                    continue;
                }
                // Duplicate input vertices resolve to the copy in the mesh.
                let first = self.find_vertex_handle(end1)?;
                let second = self.find_vertex_handle(end2)?;
                let (u, v) = (self.org(first), self.org(second));
                if !inserted.insert((u.min(v), u.max(v))) {
                    tracing::warn!(segment = index, a, b, "segment repeats an earlier segment; skipped");
                    continue;
                }
                self.insert_segment(end1, end2, segment.marker)?;
            }
        }
        if self.behavior.convex || input.segments.is_empty() {
            self.mark_hull()?;
        }
        Ok(())
    }

    /// Finds a handle whose origin sits at `v`'s location.
    fn find_vertex_handle(&mut self, v: VertexKey) -> Result<Otri, MeshError> {
        if let Some(o) = self.vertex_triangle(v) {
            return Ok(o);
        }
        let point = self.point(v);
        let hint = self.hull_handle().unwrap_or(Otri::OUTER);
        match self.locate_from(point, hint) {
            (crate::core::algorithms::locate::LocateResult::OnVertex, o) => Ok(o),
            _ => Err(MeshError::topology(format!(
                "unable to locate segment endpoint ({}, {})",
                point.x, point.y
            ))),
        }
    }

    /// Forces the segment `end1 → end2` into the triangulation.
    pub(crate) fn insert_segment(&mut self, end1: VertexKey, end2: VertexKey, marker: i32) -> Result<(), MeshError> {
        let mut searchtri1 = self.find_vertex_handle(end1)?;
        self.recent = searchtri1;
        let target2 = self.point(end2);
        if self.scout_segment(&mut searchtri1, target2, marker)? {
            return Ok(());
        }
        // A crossing may have moved the first endpoint.
        let end1 = self.org(searchtri1);
        let target1 = self.point(end1);

        let mut searchtri2 = self.find_vertex_handle(end2)?;
        self.recent = searchtri2;
        let start2 = self.org(searchtri2);
        if self.scout_segment(&mut searchtri2, target1, marker)? {
            return Ok(());
        }
        // Likewise for the second endpoint. Splitting a crossing subsegment
        // may also have flipped the triangle `searchtri1` names.
        let moved = self.org(searchtri2);
        if moved != start2 {
            let target2 = self.point(moved);
            let mut fresh = self.find_vertex_handle(end1)?;
            if self.scout_segment(&mut fresh, target2, marker)? {
                return Ok(());
            }
            return self.constrained_edge(fresh, target2, marker);
        }
        self.constrained_edge(searchtri1, target2, marker)
    }

    /// Rotates `search` about its origin until the ray toward `target`
    /// passes through the triangle (or along one of its two edges at the
    /// origin).
    pub(crate) fn find_direction(&self, search: &mut Otri, target: Point) -> Result<Direction, MeshError> {
        let start = self.point(self.org(*search));
        let mut right = self.point(self.dest(*search));
        let mut left = self.point(self.apex(*search));
        let mut left_ccw = self.predicates.orient2d(&target, &start, &left);
        let mut left_flag = left_ccw > 0.0;
        let mut right_ccw = self.predicates.orient2d(&start, &target, &right);
        let mut right_flag = right_ccw > 0.0;
        if left_flag && right_flag {
            // Facing directly away; turn toward whichever side has a triangle.
            if self.onext(*search).is_outer() {
                left_flag = false;
            } else {
                right_flag = false;
            }
        }

        let limit = self.triangles.high_water() + 3;
        let mut steps = 0;
        while left_flag {
            *search = self.onext(*search);
            steps += 1;
            if search.is_outer() || steps > limit {
                return Err(MeshError::topology("unable to find a direction around a segment endpoint"));
            }
            left = self.point(self.apex(*search));
            right_ccw = left_ccw;
            left_ccw = self.predicates.orient2d(&target, &start, &left);
            left_flag = left_ccw > 0.0;
        }
        while right_flag {
            *search = self.oprev(*search);
            steps += 1;
            if search.is_outer() || steps > limit {
                return Err(MeshError::topology("unable to find a direction around a segment endpoint"));
            }
            right = self.point(self.dest(*search));
            left_ccw = right_ccw;
            right_ccw = self.predicates.orient2d(&start, &target, &right);
            right_flag = right_ccw > 0.0;
        }

        Ok(if left_ccw == 0.0 {
            Direction::LeftCollinear
        } else if right_ccw == 0.0 {
            Direction::RightCollinear
        } else {
            Direction::Within
        })
    }

    /// Marks as much of the segment from `org(search)` to `target` as already
    /// exists in the mesh. Returns `true` if the whole segment is now present;
    /// otherwise `search` is left at the triangle the remainder enters.
    pub(crate) fn scout_segment(&mut self, search: &mut Otri, target: Point, marker: i32) -> Result<bool, MeshError> {
        loop {
            let collinear = self.find_direction(search, target)?;
            let right = self.point(self.dest(*search));
            let left = self.point(self.apex(*search));
            if left == target || right == target {
                if left == target {
                    *search = search.lprev();
                }
                self.insert_subseg(*search, marker);
                return Ok(true);
            }
            match collinear {
                Direction::LeftCollinear => {
                    // A vertex sits on the segment; continue from it.
                    *search = search.lprev();
                    self.insert_subseg(*search, marker);
                }
                Direction::RightCollinear => {
                    self.insert_subseg(*search, marker);
                    *search = search.lnext();
                }
                Direction::Within => {
                    let mut crosstri = search.lnext();
                    let mut crosssubseg = self.tspivot(crosstri);
                    if crosssubseg.is_none() {
                        return Ok(false);
                    }
                    self.segment_intersection(&mut crosstri, &mut crosssubseg, target)?;
                    *search = crosstri;
                    self.insert_subseg(*search, marker);
                }
            }
        }
    }

    /// Splits the subsegment on `splittri`'s edge where the segment from
    /// `apex(splittri)` toward `endpoint2` crosses it.
    ///
    /// On return `splittri` is a handle from the new vertex toward the
    /// segment's first endpoint.
    pub(crate) fn segment_intersection(
        &mut self,
        splittri: &mut Otri,
        splitsubseg: &mut Osub,
        endpoint2: Point,
    ) -> Result<(), MeshError> {
        let endpoint1_key = self.apex(*splittri);
        let endpoint1 = self.point(endpoint1_key);
        let torg_key = self.org(*splittri);
        let tdest_key = self.dest(*splittri);
        let torg = self.point(torg_key);
        let tdest = self.point(tdest_key);

        let tx = tdest.x - torg.x;
        let ty = tdest.y - torg.y;
        let ex = endpoint2.x - endpoint1.x;
        let ey = endpoint2.y - endpoint1.y;
        let etx = torg.x - endpoint2.x;
        let ety = torg.y - endpoint2.y;
        let denominator = ty * ex - tx * ey;
        if denominator == 0.0 {
            return Err(MeshError::topology("attempt to find the intersection of parallel segments"));
        }
        let split = (ey * etx - ex * ety) / denominator;
        let point = Point::new(torg.x + split * (tdest.x - torg.x), torg.y + split * (tdest.y - torg.y));
        let attributes = lerp_attributes(
            &self.vertices[torg_key].attributes,
            &self.vertices[tdest_key].attributes,
            split,
        );
        let marker = self.subseg_marker(*splitsubseg);
        let new_vertex = self.make_vertex(point, VertexKind::Input, marker, attributes);

        let result = self.insert_vertex(new_vertex, splittri, Some(splitsubseg), false, false);
        if result != InsertVertexResult::Successful {
            self.kill_vertex(new_vertex);
            return Err(MeshError::topology(format!(
                "failure to split a segment at ({}, {}): {result:?}",
                point.x, point.y
            )));
        }
        self.set_vertex_triangle(new_vertex, *splittri);
        self.consume_steiner();
        tracing::trace!(x = point.x, y = point.y, "split crossing segments");

        // The two halves now belong to different input segments.
        *splitsubseg = splitsubseg.ssym();
        let mut opposubseg = self.spivot(*splitsubseg);
        self.sdissolve(*splitsubseg);
        self.sdissolve(opposubseg);
        let mut cursor = *splitsubseg;
        while !cursor.is_none() {
            self.set_segorg(cursor, new_vertex);
            cursor = self.snext(cursor);
        }
        while !opposubseg.is_none() {
            self.set_segorg(opposubseg, new_vertex);
            opposubseg = self.snext(opposubseg);
        }

        // Flips may have moved things; rediscover the edge toward endpoint1.
        self.find_direction(splittri, endpoint1)?;
        let right = self.point(self.dest(*splittri));
        let left = self.point(self.apex(*splittri));
        if left == endpoint1 {
            *splittri = self.onext(*splittri);
        } else if right != endpoint1 {
            return Err(MeshError::topology("segment intersection lost its first endpoint"));
        }
        Ok(())
    }

    /// Flips edges to restore the Delaunay property inside the polygon being
    /// dug out beside a new segment.
    ///
    /// `fixuptri`'s origin is the polygon's far vertex; `left_side` says which
    /// side of the segment the polygon is on.
    pub(crate) fn delaunay_fixup(&mut self, fixuptri: &mut Otri, left_side: bool) {
        let neartri = fixuptri.lnext();
        let fartri = self.sym(neartri);
        if fartri.is_outer() || !self.tspivot(neartri).is_none() {
            return;
        }
        let near = self.point(self.apex(neartri));
        let left = self.point(self.org(neartri));
        let right = self.point(self.dest(neartri));
        let far = self.point(self.apex(fartri));

        // A reflex vertex blocks any flip until a convex section is found.
        if left_side {
            if self.predicates.orient2d(&near, &left, &far) <= 0.0 {
                return;
            }
        } else if self.predicates.orient2d(&far, &right, &near) <= 0.0 {
            return;
        }
        if self.predicates.orient2d(&right, &left, &far) > 0.0
            && self.predicates.incircle(&left, &far, &right, &near) <= 0.0
        {
            return;
        }
        // Either not locally Delaunay, or fartri is inverted.
        self.flip(neartri);
        *fixuptri = fixuptri.lprev();
        self.delaunay_fixup(fixuptri, left_side);
        let mut fartri = fartri;
        self.delaunay_fixup(&mut fartri, left_side);
    }

    /// Forces the segment from `org(starttri)` to `endpoint2` into the mesh by
    /// flipping away the edges that cross it. `starttri` must have been
    /// positioned by [`Mesh::scout_segment`].
    pub(crate) fn constrained_edge(&mut self, starttri: Otri, endpoint2: Point, marker: i32) -> Result<(), MeshError> {
        let endpoint1 = self.point(self.org(starttri));
        let mut fixuptri = starttri.lnext();
        self.flip(fixuptri);

        let mut collision = false;
        let limit = 2 * self.triangles.high_water() + 8;
        let mut done = false;
        for _ in 0..limit {
            let far = self.point(self.org(fixuptri));
            if far == endpoint2 {
                let mut fixuptri2 = self.oprev(fixuptri);
                self.delaunay_fixup(&mut fixuptri, false);
                self.delaunay_fixup(&mut fixuptri2, true);
                done = true;
                break;
            }
            let area = self.predicates.orient2d(&endpoint1, &endpoint2, &far);
            if area == 0.0 {
                // A vertex lies between the endpoints.
                collision = true;
                let mut fixuptri2 = self.oprev(fixuptri);
                self.delaunay_fixup(&mut fixuptri, false);
                self.delaunay_fixup(&mut fixuptri2, true);
                done = true;
                break;
            }
            if area > 0.0 {
                let mut fixuptri2 = self.oprev(fixuptri);
                self.delaunay_fixup(&mut fixuptri2, true);
                fixuptri = fixuptri.lprev();
            } else {
                self.delaunay_fixup(&mut fixuptri, false);
                fixuptri = self.oprev(fixuptri);
            }
            let mut crosssubseg = self.tspivot(fixuptri);
            if crosssubseg.is_none() {
                self.flip(fixuptri);
            } else {
                collision = true;
                self.segment_intersection(&mut fixuptri, &mut crosssubseg, endpoint2)?;
                done = true;
                break;
            }
        }
        if !done {
            return Err(MeshError::topology("segment recovery did not reach its endpoint"));
        }

        self.insert_subseg(fixuptri, marker);
        if collision && !self.scout_segment(&mut fixuptri, endpoint2, marker)? {
            self.constrained_edge(fixuptri, endpoint2, marker)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behavior::Behavior;
    use crate::core::input::InputSegment;

    fn subsegment_endpoints(mesh: &Mesh) -> Vec<[Point; 2]> {
        mesh.subsegs
            .iter()
            .map(|(_, s)| [mesh.point(s.vertices[0]), mesh.point(s.vertices[1])])
            .collect()
    }

    fn has_edge(segments: &[[Point; 2]], a: Point, b: Point) -> bool {
        segments
            .iter()
            .any(|&[p, q]| (p == a && q == b) || (p == b && q == a))
    }

    #[test]
    fn existing_edge_becomes_a_subsegment() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
            .with_segments([InputSegment::with_marker(0, 1, 5)]);
        let behavior = Behavior {
            convex: true,
            ..Behavior::default()
        };
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        assert_eq!(mesh.subsegment_count(), 3);
        let marked: Vec<i32> = mesh.subsegs.iter().map(|(_, s)| s.marker).collect();
        assert!(marked.contains(&5));
    }

    #[test]
    fn crossing_diagonal_is_forced_in() {
        // The Delaunay diagonal of this kite is 1-3; the segment asks for 0-2.
        let input = InputGeometry::from_points([[0.0, 0.0], [2.0, -0.5], [4.0, 0.0], [2.0, 0.5]])
            .with_segments([InputSegment::new(0, 2)]);
        let behavior = Behavior {
            convex: true,
            ..Behavior::default()
        };
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        let segments = subsegment_endpoints(&mesh);
        assert!(has_edge(&segments, Point::new(0.0, 0.0), Point::new(4.0, 0.0)));
    }

    #[test]
    fn segment_through_collinear_vertex_is_split() {
        let input = InputGeometry::from_points([
            [0.0, 0.0],
            [2.0, 0.0],
            [4.0, 0.0],
            [2.0, 2.0],
            [2.0, -2.0],
        ])
        .with_segments([InputSegment::new(0, 2)]);
        let behavior = Behavior {
            convex: true,
            ..Behavior::default()
        };
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        let segments = subsegment_endpoints(&mesh);
        assert!(has_edge(&segments, Point::new(0.0, 0.0), Point::new(2.0, 0.0)));
        assert!(has_edge(&segments, Point::new(2.0, 0.0), Point::new(4.0, 0.0)));
    }

    #[test]
    fn crossing_segments_meet_at_a_new_vertex() {
        let input = InputGeometry::from_points([[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]])
            .with_segments([InputSegment::new(0, 2), InputSegment::new(1, 3)]);
        let behavior = Behavior {
            convex: true,
            ..Behavior::default()
        };
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        assert_eq!(mesh.vertex_count(), 5);
        let centre = Point::new(2.0, 2.0);
        let segments = subsegment_endpoints(&mesh);
        for corner in [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]] {
            assert!(has_edge(&segments, centre, Point::from(corner)));
        }
        assert_eq!(mesh.triangle_count(), 4);
    }

    /// Five points whose two segments cross at a point that is not exactly
    /// representable.
    fn skewed_cross(segments: &[[usize; 2]]) -> InputGeometry {
        InputGeometry::from_points([[4.0, 4.0], [6.0, 4.0], [5.0, 10.0], [8.0, 9.0], [5.0, 9.0]])
            .with_segments(segments.iter().map(|&[a, b]| InputSegment::new(a, b)))
    }

    #[test]
    fn second_endpoint_moved_by_a_crossing_is_followed() {
        let behavior = Behavior {
            convex: true,
            ..Behavior::default()
        };
        for segments in [[[0, 3], [2, 1]], [[0, 3], [1, 2]], [[2, 1], [0, 3]]] {
            let mesh = Mesh::triangulate(&skewed_cross(&segments), behavior.clone()).unwrap();
            assert_eq!(mesh.validate(), Ok(()), "segments {segments:?}");
            assert_eq!(mesh.vertex_count(), 6);
            let crossing = mesh
                .vertices
                .iter()
                .filter(|(key, _)| mesh.subsegs.iter().filter(|(_, s)| s.vertices[..2].contains(key)).count() == 4)
                .count();
            assert_eq!(crossing, 1, "segments {segments:?}");
        }
    }

    #[test]
    fn repeated_segment_is_inserted_once() {
        let behavior = Behavior {
            convex: true,
            ..Behavior::default()
        };
        let once = Mesh::triangulate(&skewed_cross(&[[0, 3], [2, 1]]), behavior.clone()).unwrap();
        for segments in [
            vec![[0, 3], [2, 1], [2, 1]],
            vec![[0, 3], [2, 1], [1, 2]],
            vec![[0, 3], [0, 3], [2, 1]],
        ] {
            let mesh = Mesh::triangulate(&skewed_cross(&segments), behavior.clone()).unwrap();
            assert_eq!(mesh.validate(), Ok(()), "segments {segments:?}");
            assert_eq!(mesh.subsegment_count(), once.subsegment_count());
            assert_eq!(mesh.vertex_count(), once.vertex_count());
        }
    }

    #[test]
    fn coincident_endpoints_are_skipped() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]])
            .with_segments([InputSegment::new(1, 3)]);
        let behavior = Behavior {
            convex: true,
            ..Behavior::default()
        };
        let mesh = Mesh::triangulate(&input, behavior).unwrap();
        assert_eq!(mesh.subsegment_count(), 3);
    }
}

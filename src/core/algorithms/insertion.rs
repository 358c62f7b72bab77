//! Incremental vertex insertion with Lawson flips, and its undo.
//!
//! A vertex is inserted by splitting the triangle (or edge) that contains it
//! and then restoring the Delaunay property with edge flips that spiral
//! counterclockwise around the new vertex. Subsegments are never flipped;
//! when one is met the insertion can report that the new vertex encroaches
//! upon it.
//!
//! Every split and flip is pushed onto the mesh's flip stack, so the most
//! recent insertion can be retracted exactly. Refinement uses this to back
//! out a circumcenter that turned out to encroach a segment.

use crate::core::algorithms::locate::LocateResult;
use crate::core::behavior::SegmentSplitting;
use crate::core::mesh::{FlipRecord, InsertVertexResult, Mesh, MeshError};
use crate::core::topology::{Osub, Otri, TriangleId};
use crate::core::vertex::{Vertex, VertexKey, VertexKind};
use crate::geometry::point::Point;

impl Mesh {
    /// Inserts a free vertex at `point`.
    ///
    /// The vertex is kept only when the result is
    /// [`InsertVertexResult::Successful`] or [`InsertVertexResult::Encroaching`];
    /// otherwise no vertex is created and the key is `None`. Attributes are
    /// interpolated from the triangle that contains the point.
    ///
    /// The insertion can be retracted with [`Mesh::undo_last_insertion`]
    /// until the next mutation. A kept vertex counts as a Steiner point and
    /// is charged to the Steiner budget; undoing it refunds the charge.
    ///
    /// Points inside a hole or carved concavity, or beyond the hull, give
    /// [`InsertVertexResult::Outside`].
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NonFinitePoint`] for NaN or infinite coordinates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_mesh::prelude::*;
    ///
    /// let input = InputGeometry::from_points([[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]]);
    /// let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
    /// let (key, result) = mesh.insert_point(Point::new(1.0, 1.0)).unwrap();
    /// assert_eq!(result, InsertVertexResult::Successful);
    /// assert!(key.is_some());
    /// assert_eq!(mesh.triangle_count(), 3);
    /// ```
    pub fn insert_point(&mut self, point: Point) -> Result<(Option<VertexKey>, InsertVertexResult), MeshError> {
        if !point.is_finite() {
            return Err(MeshError::NonFinitePoint {
                x: point.x,
                y: point.y,
            });
        }
        let hint = self.any_triangle().unwrap_or(Otri::OUTER);
        let (location, mut search) = self.locate_in_domain(point, hint);
        match location {
            LocateResult::Outside => return Ok((None, InsertVertexResult::Outside)),
            LocateResult::OnVertex => {
                self.recent = search;
                return Ok((None, InsertVertexResult::Duplicate));
            }
            LocateResult::InTriangle | LocateResult::OnEdge => {}
        }

        let attributes = self.attributes_at(search, point);
        let vertex = self.make_vertex(point, VertexKind::Free, 0, attributes);
        let result = self.insert_vertex(vertex, &mut search, None, self.check_segments, self.check_quality);
        if result.is_inserted() {
            self.consume_steiner();
            tracing::debug!(x = point.x, y = point.y, ?result, "inserted point");
            Ok((Some(vertex), result))
        } else {
            self.kill_vertex(vertex);
            Ok((None, result))
        }
    }

    /// Retracts the most recent successful insertion, restoring the exact
    /// previous topology, and returns the removed vertex record.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NothingToUndo`] if no insertion has been recorded
    /// since the last mutation of another kind.
    pub fn undo_last_insertion(&mut self) -> Result<Vertex, MeshError> {
        let vertex = self.last_insertion.ok_or(MeshError::NothingToUndo)?;
        if self.flip_stack.is_empty() {
            return Err(MeshError::NothingToUndo);
        }
        self.undo_vertex();
        self.refund_steiner();
        self.kill_vertex(vertex).ok_or(MeshError::StaleVertex)
    }

    /// Linear attribute interpolation at `point` over the triangle `o`.
    pub(crate) fn attributes_at(&self, o: Otri, point: Point) -> Vec<f64> {
        let [a, b, c] = self.corners(o);
        let (va, vb, vc) = (&self.vertices[a], &self.vertices[b], &self.vertices[c]);
        if va.attributes.is_empty() {
            return Vec::new();
        }
        let (pa, pb, pc) = (va.point, vb.point, vc.point);
        let denominator = (pb.x - pa.x) * (pc.y - pa.y) - (pc.x - pa.x) * (pb.y - pa.y);
        if denominator == 0.0 {
            return va.attributes.clone();
        }
        let dx = point.x - pa.x;
        let dy = point.y - pa.y;
        let xi = (dx * (pc.y - pa.y) - (pc.x - pa.x) * dy) / denominator;
        let eta = ((pb.x - pa.x) * dy - dx * (pb.y - pa.y)) / denominator;
        crate::core::vertex::interpolate_attributes(&va.attributes, &vb.attributes, &vc.attributes, xi, eta)
    }

    /// Copies region label and area cap from `from` onto `to`.
    fn inherit_attributes(&mut self, to: TriangleId, from: TriangleId) {
        let (region, area_bound) = {
            let source = self.tri(from);
            (source.region, source.area_bound)
        };
        let target = self.tri_mut(to);
        target.region = region;
        target.area_bound = area_bound;
    }

    /// Moves the subsegment on `from`'s edge onto `to`'s edge.
    fn transfer_subseg(&mut self, from: Otri, to: Otri) {
        if !self.check_segments {
            return;
        }
        let s = self.tspivot(from);
        if !s.is_none() {
            self.tsdissolve(from);
            self.tsbond(to, s);
        }
    }

    /// Inserts the vertex `v` into the triangulation.
    ///
    /// `search` is a starting handle for the walk; on success it is left
    /// pointing at a triangle whose origin is `v`. When `split` is given the
    /// vertex is known to lie on that subsegment, which must be bonded to
    /// `search`'s edge; the subsegment is split in two and `split` is left
    /// naming the half that ends at `v`.
    ///
    /// With `segment_flaws`, subsegments the vertex encroaches upon (or lies
    /// on) are queued for splitting; with `triangle_flaws`, the triangles
    /// created by the insertion are quality-tested and queued.
    pub(crate) fn insert_vertex(
        &mut self,
        v: VertexKey,
        search: &mut Otri,
        split: Option<&mut Osub>,
        segment_flaws: bool,
        triangle_flaws: bool,
    ) -> InsertVertexResult {
        let point = self.point(v);
        let splitting = split.is_some();

        let (location, mut horiz) = if splitting {
            (LocateResult::OnEdge, *search)
        } else if search.is_outer() || !self.is_alive(search.tri) {
            let hint = self.hull_handle().unwrap_or(Otri::OUTER);
            self.locate_from(point, hint)
        } else {
            self.precise_locate(point, *search, true)
        };

        if location == LocateResult::OnVertex {
            *search = horiz;
            self.recent = horiz;
            return InsertVertexResult::Duplicate;
        }
        if horiz.is_outer() {
            return InsertVertexResult::Outside;
        }

        // Only insertions that did not split a subsegment can be retracted.
        let record = !splitting;

        if matches!(location, LocateResult::OnEdge | LocateResult::Outside) {
            if self.check_segments && !splitting {
                let broken = self.tspivot(horiz);
                if !broken.is_none() {
                    if segment_flaws {
                        let enqueue = match self.behavior.segment_splitting {
                            SegmentSplitting::NoSplits => false,
                            SegmentSplitting::NoBoundarySplits => !self.sym(horiz).is_outer(),
                            SegmentSplitting::Normal => true,
                        };
                        if enqueue {
                            let (org, dest) = (self.sorg(broken), self.sdest(broken));
                            self.queues.push_encroached(broken, org, dest);
                        }
                    }
                    self.recent = horiz;
                    return InsertVertexResult::Violating;
                }
            }
            if location == LocateResult::Outside {
                return InsertVertexResult::Outside;
            }
            self.begin_insertion(v, record);
            horiz = self.split_edge(v, horiz, split, record);
        } else {
            self.begin_insertion(v, record);
            self.split_triangle_at(v, horiz, record);
        }

        self.restore_delaunay(v, horiz, search, record, segment_flaws, triangle_flaws)
    }

    fn begin_insertion(&mut self, v: VertexKey, record: bool) {
        self.forget_insertion();
        if record {
            self.last_insertion = Some(v);
        }
    }

    /// Splits the edge of `horiz` at `v`. Returns the next edge to check.
    fn split_edge(&mut self, v: VertexKey, horiz: Otri, split: Option<&mut Osub>, record: bool) -> Otri {
        let botright = horiz.lprev();
        let botrcasing = self.sym(botright);
        let mut topright = self.sym(horiz);
        let mirror = !topright.is_outer();
        let mut toprcasing = Otri::OUTER;
        let mut newtopright = Otri::OUTER;
        if mirror {
            topright = topright.lnext();
            toprcasing = self.sym(topright);
            newtopright = self.make_triangle();
        } else {
            self.hull_size += 1;
        }
        let mut newbotright = self.make_triangle();

        let rightvertex = self.org(horiz);
        let leftvertex = self.dest(horiz);
        let botvertex = self.apex(horiz);
        self.set_org(newbotright, botvertex);
        self.set_dest(newbotright, rightvertex);
        self.set_apex(newbotright, v);
        self.set_org(horiz, v);
        self.inherit_attributes(newbotright.tri, botright.tri);
        if mirror {
            let topvertex = self.dest(topright);
            self.set_org(newtopright, rightvertex);
            self.set_dest(newtopright, topvertex);
            self.set_apex(newtopright, v);
            self.set_org(topright, v);
            self.inherit_attributes(newtopright.tri, topright.tri);
        }
        debug_assert_ne!(leftvertex, v);

        self.transfer_subseg(botright, newbotright);
        if mirror {
            self.transfer_subseg(topright, newtopright);
        }

        self.bond(newbotright, botrcasing);
        newbotright = newbotright.lprev();
        self.bond(newbotright, botright);
        newbotright = newbotright.lprev();
        if mirror {
            self.bond(newtopright, toprcasing);
            newtopright = newtopright.lnext();
            self.bond(newtopright, topright);
            newtopright = newtopright.lnext();
            self.bond(newtopright, newbotright);
        }

        if let Some(split) = split {
            self.set_sdest(*split, v);
            let segment_org = self.segorg(*split);
            let segment_dest = self.segdest(*split);
            *split = split.ssym();
            let right_subseg = self.spivot(*split);
            let marker = self.subseg_marker(*split);
            self.insert_subseg(newbotright, marker);
            let new_subseg = self.tspivot(newbotright);
            self.set_segorg(new_subseg, segment_org);
            self.set_segdest(new_subseg, segment_dest);
            self.sbond(*split, new_subseg);
            self.sbond(new_subseg.ssym(), right_subseg);
            *split = split.ssym();
            if self.marker(v) == 0 {
                self.set_marker(v, marker);
            }
        }

        if record {
            self.flip_stack.push(FlipRecord::EdgeSplit(horiz));
        }
        horiz.lnext()
    }

    /// Splits the triangle `horiz` into three around `v`.
    fn split_triangle_at(&mut self, v: VertexKey, horiz: Otri, record: bool) {
        let botleft = horiz.lnext();
        let botright = horiz.lprev();
        let botlcasing = self.sym(botleft);
        let botrcasing = self.sym(botright);
        let mut newbotleft = self.make_triangle();
        let mut newbotright = self.make_triangle();

        let rightvertex = self.org(horiz);
        let leftvertex = self.dest(horiz);
        let botvertex = self.apex(horiz);
        self.set_org(newbotleft, leftvertex);
        self.set_dest(newbotleft, botvertex);
        self.set_apex(newbotleft, v);
        self.set_org(newbotright, botvertex);
        self.set_dest(newbotright, rightvertex);
        self.set_apex(newbotright, v);
        self.set_apex(horiz, v);
        self.inherit_attributes(newbotleft.tri, horiz.tri);
        self.inherit_attributes(newbotright.tri, horiz.tri);

        self.transfer_subseg(botleft, newbotleft);
        self.transfer_subseg(botright, newbotright);

        self.bond(newbotleft, botlcasing);
        self.bond(newbotright, botrcasing);
        newbotleft = newbotleft.lnext();
        newbotright = newbotright.lprev();
        self.bond(newbotleft, newbotright);
        newbotleft = newbotleft.lnext();
        self.bond(botleft, newbotleft);
        newbotright = newbotright.lprev();
        self.bond(botright, newbotright);

        if record {
            self.flip_stack.push(FlipRecord::TriangleSplit(horiz));
        }
    }

    /// Flips edges around the new vertex until every edge opposite it is
    /// locally Delaunay (or constrained).
    fn restore_delaunay(
        &mut self,
        v: VertexKey,
        mut horiz: Otri,
        search: &mut Otri,
        record: bool,
        segment_flaws: bool,
        triangle_flaws: bool,
    ) -> InsertVertexResult {
        let mut result = InsertVertexResult::Successful;
        let new_point = self.point(v);
        let first = self.org(horiz);
        let mut rightvertex = first;
        let mut leftvertex = self.dest(horiz);

        loop {
            let mut do_flip = true;
            if self.check_segments {
                let subseg = self.tspivot(horiz);
                if !subseg.is_none() {
                    do_flip = false;
                    if segment_flaws && self.check_seg_encroach(subseg) {
                        result = InsertVertexResult::Encroaching;
                    }
                }
            }

            if do_flip {
                let top = self.sym(horiz);
                if top.is_outer() {
                    do_flip = false;
                } else {
                    let farvertex = self.apex(top);
                    let left = self.point(leftvertex);
                    let right = self.point(rightvertex);
                    let far = self.point(farvertex);
                    do_flip = if self.is_infinite(leftvertex) {
                        self.predicates.orient2d(&new_point, &right, &far) > 0.0
                    } else if self.is_infinite(rightvertex) {
                        self.predicates.orient2d(&far, &left, &new_point) > 0.0
                    } else if self.is_infinite(farvertex) {
                        false
                    } else {
                        self.predicates.incircle(&left, &new_point, &right, &far) > 0.0
                    };

                    if do_flip {
                        let area_bound = if self.behavior.variable_area {
                            let a = self.tri(top.tri).area_bound;
                            let b = self.tri(horiz.tri).area_bound;
                            Some(if a <= 0.0 || b <= 0.0 { -1.0 } else { 0.5 * (a + b) })
                        } else {
                            None
                        };
                        self.flip(horiz);
                        if let Some(bound) = area_bound {
                            self.tri_mut(top.tri).area_bound = bound;
                            self.tri_mut(horiz.tri).area_bound = bound;
                        }
                        if record {
                            self.flip_stack.push(FlipRecord::Flip(horiz));
                        }
                        horiz = horiz.lprev();
                        leftvertex = farvertex;
                    }
                }
            }

            if !do_flip {
                if triangle_flaws {
                    self.test_triangle(horiz);
                }
                horiz = horiz.lnext();
                let testtri = self.sym(horiz);
                if leftvertex == first || testtri.is_outer() {
                    let anchor = horiz.lnext();
                    *search = anchor;
                    self.recent = anchor;
                    self.set_vertex_triangle(v, anchor);
                    return result;
                }
                horiz = testtri.lnext();
                rightvertex = leftvertex;
                leftvertex = self.dest(horiz);
            }
        }
    }

    /// Flips the edge of `e` counterclockwise.
    ///
    /// With `e = (right, left, bot)` and `far` the apex across the edge,
    /// afterwards `e = (far, bot, right)` and its neighbor is `(bot, far, left)`.
    /// Subsegments on the four outer edges move with their edges; the flipped
    /// edge itself must not carry one.
    pub(crate) fn flip(&mut self, e: Otri) {
        let rightvertex = self.org(e);
        let leftvertex = self.dest(e);
        let botvertex = self.apex(e);
        let top = self.sym(e);
        let farvertex = self.apex(top);

        let topleft = top.lprev();
        let toplcasing = self.sym(topleft);
        let topright = top.lnext();
        let toprcasing = self.sym(topright);
        let botleft = e.lnext();
        let botlcasing = self.sym(botleft);
        let botright = e.lprev();
        let botrcasing = self.sym(botright);

        self.bond(topleft, botlcasing);
        self.bond(botleft, botrcasing);
        self.bond(botright, toprcasing);
        self.bond(topright, toplcasing);

        if self.check_segments {
            let topl = self.tspivot(topleft);
            let botl = self.tspivot(botleft);
            let botr = self.tspivot(botright);
            let topr = self.tspivot(topright);
            self.tsbond_or_dissolve(topright, topl);
            self.tsbond_or_dissolve(topleft, botl);
            self.tsbond_or_dissolve(botleft, botr);
            self.tsbond_or_dissolve(botright, topr);
        }

        self.set_org(e, farvertex);
        self.set_dest(e, botvertex);
        self.set_apex(e, rightvertex);
        self.set_org(top, botvertex);
        self.set_dest(top, farvertex);
        self.set_apex(top, leftvertex);
    }

    /// Reverses [`Mesh::flip`]: flips the edge of `e` clockwise.
    pub(crate) fn unflip(&mut self, e: Otri) {
        let rightvertex = self.org(e);
        let leftvertex = self.dest(e);
        let botvertex = self.apex(e);
        let top = self.sym(e);
        let farvertex = self.apex(top);

        let topleft = top.lprev();
        let toplcasing = self.sym(topleft);
        let topright = top.lnext();
        let toprcasing = self.sym(topright);
        let botleft = e.lnext();
        let botlcasing = self.sym(botleft);
        let botright = e.lprev();
        let botrcasing = self.sym(botright);

        self.bond(topleft, toprcasing);
        self.bond(botleft, toplcasing);
        self.bond(botright, botlcasing);
        self.bond(topright, botrcasing);

        if self.check_segments {
            let topl = self.tspivot(topleft);
            let botl = self.tspivot(botleft);
            let botr = self.tspivot(botright);
            let topr = self.tspivot(topright);
            self.tsbond_or_dissolve(botleft, topl);
            self.tsbond_or_dissolve(botright, botl);
            self.tsbond_or_dissolve(topright, botr);
            self.tsbond_or_dissolve(topleft, topr);
        }

        self.set_org(e, botvertex);
        self.set_dest(e, farvertex);
        self.set_apex(e, leftvertex);
        self.set_org(top, farvertex);
        self.set_dest(top, botvertex);
        self.set_apex(top, rightvertex);
    }

    /// Pops the flip stack, reversing every transformation of the last
    /// recorded insertion. The inserted vertex record is left to the caller.
    pub(crate) fn undo_vertex(&mut self) {
        while let Some(record) = self.flip_stack.pop() {
            match record {
                FlipRecord::Flip(e) => self.unflip(e),
                FlipRecord::TriangleSplit(f) => {
                    let botleft = self.dprev(f).lnext();
                    let botright = self.onext(f).lprev();
                    let botlcasing = self.sym(botleft);
                    let botrcasing = self.sym(botright);
                    let botvertex = self.dest(botleft);
                    self.set_apex(f, botvertex);

                    let f = f.lnext();
                    self.bond(f, botlcasing);
                    let s = self.tspivot(botleft);
                    self.tsbond_or_dissolve(f, s);
                    let f = f.lnext();
                    self.bond(f, botrcasing);
                    let s = self.tspivot(botright);
                    self.tsbond_or_dissolve(f, s);

                    self.kill_triangle(botleft.tri);
                    self.kill_triangle(botright.tri);
                }
                FlipRecord::EdgeSplit(f) => {
                    let glue = f.lprev();
                    let botright = self.sym(glue).lnext();
                    let botrcasing = self.sym(botright);
                    let rightvertex = self.dest(botright);

                    self.set_org(f, rightvertex);
                    self.bond(glue, botrcasing);
                    let s = self.tspivot(botright);
                    self.tsbond_or_dissolve(glue, s);
                    self.kill_triangle(botright.tri);

                    let glue = self.sym(f);
                    if glue.is_outer() {
                        self.hull_size -= 1;
                    } else {
                        let glue = glue.lnext();
                        let topright = self.dnext(glue);
                        let toprcasing = self.sym(topright);
                        self.set_org(glue, rightvertex);
                        self.bond(glue, toprcasing);
                        let s = self.tspivot(topright);
                        self.tsbond_or_dissolve(glue, s);
                        self.kill_triangle(topright.tri);
                    }
                }
            }
        }
        self.last_insertion = None;
        self.recent = Otri::OUTER;
    }
}

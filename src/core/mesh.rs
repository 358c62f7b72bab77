//! The mesh aggregate and its topology primitives.
//!
//! [`Mesh`] owns the vertex table, the triangle and subsegment pools, the
//! refinement queues, the point locator's state and the flip stack used to
//! retract speculative insertions. The algorithms in
//! [`core::algorithms`](crate::core::algorithms) are implemented as further
//! `impl Mesh` blocks on top of the primitives defined here.
//!
//! # Primitives
//!
//! Navigation follows the oriented-handle conventions documented in
//! [`core::topology`](crate::core::topology):
//!
//! | primitive | meaning |
//! |---|---|
//! | `sym` | the same edge seen from the neighboring triangle |
//! | `lnext` / `lprev` | next / previous edge of the same triangle |
//! | `onext` / `oprev` | next edge counterclockwise / clockwise about the origin |
//! | `dnext` / `dprev` | next edge counterclockwise / clockwise about the destination |
//! | `bond` | glue two handles to each other |
//! | `tspivot` / `tsbond` | read / bond the subsegment on a triangle edge |
//! | `stpivot` | the triangle bonded to a subsegment |
//! | `spivot` / `snext` | adjacent subsegment across the origin / destination |

use crate::core::behavior::{Behavior, BehaviorError, QualityBounds};
use crate::core::collections::StorageMap;
use crate::core::flaws::FlawQueues;
use crate::core::input::RegionSeed;
use crate::core::pool::Pool;
use crate::core::topology::{Osub, Otri, Subseg, SubsegId, Triangle, TriangleId};
use crate::core::vertex::{Vertex, VertexKey, VertexKind};
use crate::geometry::point::{BoundingBox, Point};
use crate::geometry::robust_predicates::RobustPredicates;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

// =============================================================================
// ERRORS AND RESULTS
// =============================================================================

/// Errors raised by mesh construction, refinement and editing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// At least three input vertices are needed.
    #[error("Need at least 3 input vertices, found {found}")]
    TooFewVertices {
        /// Number of vertices supplied
        found: usize,
    },
    /// A segment refers to a vertex index that does not exist.
    #[error("Segment {segment} refers to vertex {index}, but only {vertex_count} vertices exist")]
    SegmentEndpointOutOfRange {
        /// Segment index
        segment: usize,
        /// Offending vertex index
        index: usize,
        /// Number of input vertices
        vertex_count: usize,
    },
    /// An input vertex has a NaN or infinite coordinate.
    #[error("Input vertex {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Vertex index
        index: usize,
    },
    /// All input vertices lie on one line; no triangle can be formed.
    #[error("All input vertices are collinear")]
    AllCollinear,
    /// Floating-point precision ran out: a new vertex coincided with an
    /// existing one. Fatal for the current refinement run.
    #[error("Ran out of precision during {operation} at ({x}, {y})")]
    PrecisionExhausted {
        /// Operation that produced the coincident vertex
        operation: &'static str,
        /// x coordinate of the attempted vertex
        x: f64,
        /// y coordinate of the attempted vertex
        y: f64,
    },
    /// A topological invariant failed.
    #[error("Topology inconsistency: {context}")]
    Topology {
        /// What was being attempted
        context: String,
    },
    /// Only free (Steiner) vertices may be deleted.
    #[error("Vertex {id} is not a free vertex")]
    VertexNotFree {
        /// Vertex id
        id: usize,
    },
    /// Vertices on the mesh boundary cannot be deleted.
    #[error("Vertex {id} lies on the mesh boundary")]
    VertexOnBoundary {
        /// Vertex id
        id: usize,
    },
    /// A point to insert has a NaN or infinite coordinate.
    #[error("Point ({x}, {y}) is not finite")]
    NonFinitePoint {
        /// x coordinate
        x: f64,
        /// y coordinate
        y: f64,
    },
    /// The key does not name a vertex of the mesh.
    #[error("Vertex key does not refer to a live mesh vertex")]
    StaleVertex,
    /// No insertion is available to undo.
    #[error("No insertion to undo")]
    NothingToUndo,
    /// The behavior is invalid.
    #[error(transparent)]
    Behavior(#[from] BehaviorError),
}

impl MeshError {
    pub(crate) fn topology(context: impl Into<String>) -> Self {
        Self::Topology {
            context: context.into(),
        }
    }
}

/// Outcome of inserting a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InsertVertexResult {
    /// Inserted; the Delaunay property holds around it.
    Successful,
    /// Inserted, but it encroaches on at least one subsegment (now queued).
    Encroaching,
    /// Not inserted: it lies on a subsegment, which may have been queued.
    Violating,
    /// Not inserted: a vertex already exists at that location.
    Duplicate,
    /// Not inserted: the point lies outside every triangle of the mesh
    /// (beyond the hull, or inside a hole or carved concavity).
    Outside,
}

impl InsertVertexResult {
    /// Returns `true` if the vertex became part of the mesh.
    #[must_use]
    pub const fn is_inserted(self) -> bool {
        matches!(self, Self::Successful | Self::Encroaching)
    }
}

/// One transformation performed by the most recent insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlipRecord {
    /// A triangle was split in three; the handle is the original triangle.
    TriangleSplit(Otri),
    /// An edge was split; the handle's origin is the new vertex.
    EdgeSplit(Otri),
    /// An edge was flipped; the handle names the new edge.
    Flip(Otri),
}

// =============================================================================
// MESH
// =============================================================================

/// A constrained Delaunay triangulation with quality-refinement state.
///
/// Build one with [`Mesh::triangulate`], inspect it with the iterators in
/// [`core::output`](crate::core::output), and edit it with
/// [`Mesh::insert_point`], [`Mesh::delete_vertex`] and [`Mesh::refine`].
#[derive(Clone, Debug)]
pub struct Mesh {
    pub(crate) vertices: StorageMap<VertexKey, Vertex>,
    pub(crate) triangles: Pool<Triangle>,
    pub(crate) subsegs: Pool<Subseg>,
    pub(crate) behavior: Behavior,
    pub(crate) bounds: QualityBounds,
    pub(crate) predicates: RobustPredicates,
    pub(crate) queues: FlawQueues,
    pub(crate) flip_stack: Vec<FlipRecord>,
    /// Vertex whose insertion the flip stack describes.
    pub(crate) last_insertion: Option<VertexKey>,
    pub(crate) recent: Otri,
    pub(crate) samples: usize,
    pub(crate) rng: StdRng,
    /// Corners of the bounding triangle while incremental construction runs.
    pub(crate) infinite: Option<[VertexKey; 3]>,
    pub(crate) hull_size: usize,
    pub(crate) next_vertex_id: usize,
    pub(crate) input_vertex_count: usize,
    pub(crate) undead_count: usize,
    pub(crate) steiner_left: Option<usize>,
    pub(crate) steiner_inserted: usize,
    /// Subsegments exist and must be respected.
    pub(crate) check_segments: bool,
    /// A quality pass has started; insertions queue the triangles they create.
    pub(crate) check_quality: bool,
    pub(crate) holes: Vec<Point>,
    pub(crate) regions: Vec<RegionSeed>,
    pub(crate) bbox: BoundingBox,
}

impl Mesh {
    /// Creates an empty mesh adopting `behavior`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Behavior`] if the behavior is invalid.
    pub fn new(behavior: Behavior) -> Result<Self, MeshError> {
        behavior.validate()?;
        Ok(Self {
            vertices: StorageMap::with_key(),
            triangles: Pool::new(Triangle::default()),
            subsegs: Pool::new(Subseg::default()),
            bounds: behavior.bounds(),
            predicates: RobustPredicates::new(behavior.exact_arithmetic),
            queues: FlawQueues::default(),
            flip_stack: Vec::new(),
            last_insertion: None,
            recent: Otri::OUTER,
            samples: 1,
            rng: StdRng::seed_from_u64(behavior.sample_seed),
            infinite: None,
            hull_size: 0,
            next_vertex_id: 0,
            input_vertex_count: 0,
            undead_count: 0,
            steiner_left: behavior.steiner_limit,
            steiner_inserted: 0,
            check_segments: false,
            check_quality: false,
            holes: Vec::new(),
            regions: Vec::new(),
            bbox: BoundingBox::empty(),
            behavior,
        })
    }

    /// Replaces the behavior, recomputing derived bounds and the predicates.
    ///
    /// The Steiner budget is reset to the new behavior's limit.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Behavior`] if the behavior is invalid.
    pub fn set_behavior(&mut self, behavior: Behavior) -> Result<(), MeshError> {
        behavior.validate()?;
        self.bounds = behavior.bounds();
        self.predicates = RobustPredicates::new(behavior.exact_arithmetic);
        self.steiner_left = behavior.steiner_limit;
        self.behavior = behavior;
        Ok(())
    }

    /// Clears every pool, counter, queue and the flip stack.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.triangles.clear(Triangle::default());
        self.subsegs.clear(Subseg::default());
        self.queues.clear();
        self.forget_insertion();
        self.recent = Otri::OUTER;
        self.samples = 1;
        self.rng = StdRng::seed_from_u64(self.behavior.sample_seed);
        self.infinite = None;
        self.hull_size = 0;
        self.next_vertex_id = 0;
        self.input_vertex_count = 0;
        self.undead_count = 0;
        self.steiner_left = self.behavior.steiner_limit;
        self.steiner_inserted = 0;
        self.check_segments = false;
        self.check_quality = false;
        self.holes.clear();
        self.regions.clear();
        self.bbox = BoundingBox::empty();
    }

    // -------------------------------------------------------------------------
    // Counters and accessors
    // -------------------------------------------------------------------------

    /// The active behavior.
    #[must_use]
    pub const fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// The predicates used by this mesh.
    #[must_use]
    pub const fn predicates(&self) -> &RobustPredicates {
        &self.predicates
    }

    /// Number of live triangles.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of live subsegments.
    #[must_use]
    pub const fn subsegment_count(&self) -> usize {
        self.subsegs.len()
    }

    /// Number of vertices that are part of the triangulation.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.values().filter(|v| v.kind.is_in_mesh()).count()
    }

    /// Number of edges on the boundary of the triangulated domain.
    #[must_use]
    pub const fn hull_size(&self) -> usize {
        self.hull_size
    }

    /// Number of input vertices supplied to [`Mesh::triangulate`].
    #[must_use]
    pub const fn input_vertex_count(&self) -> usize {
        self.input_vertex_count
    }

    /// Number of stored vertices that are not in the triangulation.
    #[must_use]
    pub const fn undead_vertex_count(&self) -> usize {
        self.undead_count
    }

    /// Number of Steiner points inserted so far, by refinement, segment
    /// intersections and [`Mesh::insert_point`] alike.
    #[must_use]
    pub const fn steiner_points_inserted(&self) -> usize {
        self.steiner_inserted
    }

    /// Remaining Steiner budget; `None` means unlimited.
    ///
    /// Every Steiner point is charged to the budget, including those added
    /// with [`Mesh::insert_point`]. An exhausted budget only stops
    /// refinement; `insert_point` still inserts.
    #[must_use]
    pub const fn steiner_points_left(&self) -> Option<usize> {
        self.steiner_left
    }

    /// Bounding box of the input vertices.
    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Looks up a vertex, including undead ones.
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    pub(crate) fn budget_exhausted(&self) -> bool {
        self.steiner_left == Some(0)
    }

    /// Drops the undo record of the last insertion.
    pub(crate) fn forget_insertion(&mut self) {
        self.flip_stack.clear();
        self.last_insertion = None;
    }

    pub(crate) fn consume_steiner(&mut self) {
        if let Some(left) = self.steiner_left.as_mut() {
            *left = left.saturating_sub(1);
        }
        self.steiner_inserted += 1;
    }

    pub(crate) fn refund_steiner(&mut self) {
        if let Some(left) = self.steiner_left.as_mut() {
            *left += 1;
        }
        self.steiner_inserted = self.steiner_inserted.saturating_sub(1);
    }

    // -------------------------------------------------------------------------
    // Vertex records
    // -------------------------------------------------------------------------

    pub(crate) fn make_vertex(
        &mut self,
        point: Point,
        kind: VertexKind,
        marker: i32,
        attributes: Vec<f64>,
    ) -> VertexKey {
        let id = self.next_vertex_id;
        self.next_vertex_id += 1;
        self.vertices
            .insert(Vertex::new(point, id, kind, marker, attributes))
    }

    /// Removes a vertex record, returning it marked dead.
    pub(crate) fn kill_vertex(&mut self, v: VertexKey) -> Option<Vertex> {
        self.vertices.remove(v).map(|mut vertex| {
            vertex.kind = VertexKind::Dead;
            vertex
        })
    }

    #[inline]
    pub(crate) fn point(&self, v: VertexKey) -> Point {
        self.vertices[v].point
    }

    #[inline]
    pub(crate) fn kind(&self, v: VertexKey) -> VertexKind {
        self.vertices[v].kind
    }

    pub(crate) fn set_kind(&mut self, v: VertexKey, kind: VertexKind) {
        self.vertices[v].kind = kind;
    }

    pub(crate) fn marker(&self, v: VertexKey) -> i32 {
        self.vertices[v].marker
    }

    pub(crate) fn set_marker(&mut self, v: VertexKey, marker: i32) {
        self.vertices[v].marker = marker;
    }

    pub(crate) fn set_vertex_triangle(&mut self, v: VertexKey, o: Otri) {
        if let Some(vertex) = self.vertices.get_mut(v) {
            vertex.triangle = o;
        }
    }

    /// The recorded incident triangle of `v`, if it is still valid.
    pub(crate) fn vertex_triangle(&self, v: VertexKey) -> Option<Otri> {
        let o = self.vertices.get(v)?.triangle;
        (!o.is_outer() && self.is_alive(o.tri) && self.org(o) == v).then_some(o)
    }

    pub(crate) fn is_infinite(&self, v: VertexKey) -> bool {
        self.infinite.is_some_and(|corners| corners.contains(&v))
    }

    // -------------------------------------------------------------------------
    // Triangle records
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) fn tri(&self, t: TriangleId) -> &Triangle {
        &self.triangles[t.0]
    }

    #[inline]
    pub(crate) fn tri_mut(&mut self, t: TriangleId) -> &mut Triangle {
        &mut self.triangles[t.0]
    }

    #[inline]
    pub(crate) fn is_alive(&self, t: TriangleId) -> bool {
        self.triangles.is_alive(t.0)
    }

    /// Allocates a triangle bonded to the sentinels on all sides.
    pub(crate) fn make_triangle(&mut self) -> Otri {
        let index = self.triangles.alloc(Triangle::default());
        Otri::new(TriangleId(index), 0)
    }

    pub(crate) fn kill_triangle(&mut self, t: TriangleId) {
        self.triangles.dealloc(t.0);
    }

    #[inline]
    pub(crate) fn sym(&self, o: Otri) -> Otri {
        self.tri(o.tri).neighbors[o.orient as usize]
    }

    #[inline]
    pub(crate) fn onext(&self, o: Otri) -> Otri {
        self.sym(o.lprev())
    }

    #[inline]
    pub(crate) fn oprev(&self, o: Otri) -> Otri {
        self.sym(o).lnext()
    }

    #[inline]
    pub(crate) fn dnext(&self, o: Otri) -> Otri {
        self.sym(o).lprev()
    }

    #[inline]
    pub(crate) fn dprev(&self, o: Otri) -> Otri {
        self.sym(o.lnext())
    }

    #[inline]
    pub(crate) fn org(&self, o: Otri) -> VertexKey {
        self.tri(o.tri).vertices[o.org_slot()]
    }

    #[inline]
    pub(crate) fn dest(&self, o: Otri) -> VertexKey {
        self.tri(o.tri).vertices[o.dest_slot()]
    }

    #[inline]
    pub(crate) fn apex(&self, o: Otri) -> VertexKey {
        self.tri(o.tri).vertices[o.apex_slot()]
    }

    pub(crate) fn set_org(&mut self, o: Otri, v: VertexKey) {
        self.tri_mut(o.tri).vertices[o.org_slot()] = v;
    }

    pub(crate) fn set_dest(&mut self, o: Otri, v: VertexKey) {
        self.tri_mut(o.tri).vertices[o.dest_slot()] = v;
    }

    pub(crate) fn set_apex(&mut self, o: Otri, v: VertexKey) {
        self.tri_mut(o.tri).vertices[o.apex_slot()] = v;
    }

    /// Corner coordinates `(org, dest, apex)`.
    pub(crate) fn corner_points(&self, o: Otri) -> [Point; 3] {
        [
            self.point(self.org(o)),
            self.point(self.dest(o)),
            self.point(self.apex(o)),
        ]
    }

    pub(crate) fn corners(&self, o: Otri) -> [VertexKey; 3] {
        [self.org(o), self.dest(o), self.apex(o)]
    }

    /// Glues two handles together. Bonding to [`Otri::OUTER`] also records
    /// the live side in the sentinel, which keeps a hull triangle reachable.
    pub(crate) fn bond(&mut self, a: Otri, b: Otri) {
        self.tri_mut(a.tri).neighbors[a.orient as usize] = b;
        self.tri_mut(b.tri).neighbors[b.orient as usize] = a;
    }

    /// Points one side of a triangle at outer space, leaving the neighbor as is.
    pub(crate) fn dissolve(&mut self, o: Otri) {
        self.tri_mut(o.tri).neighbors[o.orient as usize] = Otri::OUTER;
    }

    // -------------------------------------------------------------------------
    // Subsegment records
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) fn seg(&self, s: SubsegId) -> &Subseg {
        &self.subsegs[s.0]
    }

    #[inline]
    pub(crate) fn seg_mut(&mut self, s: SubsegId) -> &mut Subseg {
        &mut self.subsegs[s.0]
    }

    pub(crate) fn make_subseg(&mut self) -> Osub {
        let index = self.subsegs.alloc(Subseg::default());
        Osub::new(SubsegId(index), 0)
    }

    pub(crate) fn kill_subseg(&mut self, s: SubsegId) {
        self.subsegs.dealloc(s.0);
    }

    pub(crate) fn is_subseg_alive(&self, s: SubsegId) -> bool {
        self.subsegs.is_alive(s.0)
    }

    #[inline]
    pub(crate) fn tspivot(&self, o: Otri) -> Osub {
        self.tri(o.tri).subsegs[o.orient as usize]
    }

    /// Bonds a triangle edge and a subsegment. The sentinel triangle's slots
    /// are never written.
    pub(crate) fn tsbond(&mut self, o: Otri, s: Osub) {
        if !o.is_outer() {
            self.tri_mut(o.tri).subsegs[o.orient as usize] = s;
        }
        if !s.is_none() {
            self.seg_mut(s.seg).triangles[s.orient as usize] = o;
        }
    }

    pub(crate) fn tsdissolve(&mut self, o: Otri) {
        if o.is_outer() {
            return;
        }
        self.tri_mut(o.tri).subsegs[o.orient as usize] = Osub::NONE;
    }

    /// Bonds `s` to `o` if `s` is a real subsegment, otherwise clears `o`'s slot.
    pub(crate) fn tsbond_or_dissolve(&mut self, o: Otri, s: Osub) {
        if s.is_none() {
            self.tsdissolve(o);
        } else {
            self.tsbond(o, s);
        }
    }

    #[inline]
    pub(crate) fn stpivot(&self, s: Osub) -> Otri {
        self.seg(s.seg).triangles[s.orient as usize]
    }

    pub(crate) fn stdissolve(&mut self, s: Osub) {
        self.seg_mut(s.seg).triangles[s.orient as usize] = Otri::OUTER;
    }

    #[inline]
    pub(crate) fn spivot(&self, s: Osub) -> Osub {
        self.seg(s.seg).adjacent[s.orient as usize]
    }

    #[inline]
    pub(crate) fn snext(&self, s: Osub) -> Osub {
        self.seg(s.seg).adjacent[1 - s.orient as usize]
    }

    pub(crate) fn sbond(&mut self, a: Osub, b: Osub) {
        if !a.is_none() {
            self.seg_mut(a.seg).adjacent[a.orient as usize] = b;
        }
        if !b.is_none() {
            self.seg_mut(b.seg).adjacent[b.orient as usize] = a;
        }
    }

    pub(crate) fn sdissolve(&mut self, s: Osub) {
        if !s.is_none() {
            self.seg_mut(s.seg).adjacent[s.orient as usize] = Osub::NONE;
        }
    }

    #[inline]
    pub(crate) fn sorg(&self, s: Osub) -> VertexKey {
        self.seg(s.seg).vertices[s.orient as usize]
    }

    #[inline]
    pub(crate) fn sdest(&self, s: Osub) -> VertexKey {
        self.seg(s.seg).vertices[1 - s.orient as usize]
    }

    pub(crate) fn segorg(&self, s: Osub) -> VertexKey {
        self.seg(s.seg).vertices[2 + s.orient as usize]
    }

    pub(crate) fn segdest(&self, s: Osub) -> VertexKey {
        self.seg(s.seg).vertices[3 - s.orient as usize]
    }

    pub(crate) fn set_sorg(&mut self, s: Osub, v: VertexKey) {
        self.seg_mut(s.seg).vertices[s.orient as usize] = v;
    }

    pub(crate) fn set_sdest(&mut self, s: Osub, v: VertexKey) {
        self.seg_mut(s.seg).vertices[1 - s.orient as usize] = v;
    }

    pub(crate) fn set_segorg(&mut self, s: Osub, v: VertexKey) {
        self.seg_mut(s.seg).vertices[2 + s.orient as usize] = v;
    }

    pub(crate) fn set_segdest(&mut self, s: Osub, v: VertexKey) {
        self.seg_mut(s.seg).vertices[3 - s.orient as usize] = v;
    }

    pub(crate) fn subseg_marker(&self, s: Osub) -> i32 {
        self.seg(s.seg).marker
    }

    pub(crate) fn set_subseg_marker(&mut self, s: Osub, marker: i32) {
        self.seg_mut(s.seg).marker = marker;
    }

    // -------------------------------------------------------------------------
    // Hull access
    // -------------------------------------------------------------------------

    /// A live handle whose edge lies on the hull (its neighbor is outer space).
    ///
    /// The sentinel normally remembers one; if that triangle has since died,
    /// the pool is scanned and the sentinel repaired.
    pub(crate) fn hull_handle(&mut self) -> Option<Otri> {
        let remembered = self.sym(Otri::OUTER);
        if !remembered.is_outer() && self.is_alive(remembered.tri) && self.sym(remembered).is_outer() {
            return Some(remembered);
        }
        let found = self.triangles.iter().find_map(|(index, t)| {
            (0..3_u8)
                .find(|&orient| t.neighbors[orient as usize].is_outer())
                .map(|orient| Otri::new(TriangleId(index), orient))
        })?;
        self.tri_mut(TriangleId::OUTER).neighbors[0] = found;
        Some(found)
    }

    /// Any live triangle to start a search from, preferring the recent one.
    pub(crate) fn any_triangle(&self) -> Option<Otri> {
        if !self.recent.is_outer() && self.is_alive(self.recent.tri) {
            return Some(self.recent);
        }
        self.triangles
            .iter()
            .next()
            .map(|(index, _)| Otri::new(TriangleId(index), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles sharing the edge b-c of the unit square a b d c.
    fn two_triangle_mesh() -> (Mesh, Otri, Otri) {
        let mut mesh = Mesh::new(Behavior::default()).unwrap();
        let a = mesh.make_vertex(Point::new(0.0, 0.0), VertexKind::Input, 0, vec![]);
        let b = mesh.make_vertex(Point::new(1.0, 0.0), VertexKind::Input, 0, vec![]);
        let c = mesh.make_vertex(Point::new(0.0, 1.0), VertexKind::Input, 0, vec![]);
        let d = mesh.make_vertex(Point::new(1.0, 1.0), VertexKind::Input, 0, vec![]);
        let lower = mesh.make_triangle();
        mesh.set_org(lower, b);
        mesh.set_dest(lower, c);
        mesh.set_apex(lower, a);
        let upper = mesh.make_triangle();
        mesh.set_org(upper, c);
        mesh.set_dest(upper, b);
        mesh.set_apex(upper, d);
        mesh.bond(lower, upper);
        (mesh, lower, upper)
    }

    #[test]
    fn bonding_is_symmetric() {
        let (mesh, lower, upper) = two_triangle_mesh();
        assert_eq!(mesh.sym(lower), upper);
        assert_eq!(mesh.sym(upper), lower);
        assert_eq!(mesh.org(lower), mesh.dest(upper));
        assert_eq!(mesh.dest(lower), mesh.org(upper));
        assert!(mesh.sym(lower.lnext()).is_outer());
    }

    #[test]
    fn rotation_about_origin() {
        let (mesh, lower, upper) = two_triangle_mesh();
        // Counterclockwise about b: from edge b→c (lower) onext reaches the
        // outer space beyond edge b→a; oprev crosses into the upper triangle.
        assert_eq!(mesh.oprev(lower), upper.lnext());
        assert_eq!(mesh.org(mesh.oprev(lower)), mesh.org(lower));
        assert!(mesh.onext(lower).is_outer());
        assert_eq!(mesh.dest(mesh.dnext(lower)), mesh.dest(lower));
    }

    #[test]
    fn subsegment_bonding() {
        let (mut mesh, lower, upper) = two_triangle_mesh();
        let s = mesh.make_subseg();
        mesh.set_sorg(s, mesh.dest(lower));
        mesh.set_sdest(s, mesh.org(lower));
        mesh.tsbond(lower, s);
        mesh.tsbond(upper, s.ssym());
        assert_eq!(mesh.tspivot(lower), s);
        assert_eq!(mesh.stpivot(s), lower);
        assert_eq!(mesh.stpivot(s.ssym()), upper);
        assert_eq!(mesh.sorg(s), mesh.dest(lower));
        mesh.tsbond_or_dissolve(lower, Osub::NONE);
        assert!(mesh.tspivot(lower).is_none());
    }

    #[test]
    fn hull_handle_repairs_sentinel() {
        let (mut mesh, lower, _) = two_triangle_mesh();
        let hull = mesh.hull_handle().unwrap();
        assert!(mesh.sym(hull).is_outer());
        assert!(mesh.is_alive(hull.tri));
        mesh.kill_triangle(lower.tri);
        let hull = mesh.hull_handle().unwrap();
        assert_ne!(hull.tri, lower.tri);
    }

    #[test]
    fn reset_clears_everything() {
        let (mut mesh, _, _) = two_triangle_mesh();
        mesh.reset();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.any_triangle().is_none());
    }
}

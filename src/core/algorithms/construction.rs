//! The triangulation driver and incremental Delaunay construction.
//!
//! Construction inserts every input vertex into a large bounding triangle
//! whose three corners are treated as points at infinity by the flip test,
//! then strips the bounding triangles away. Segment recovery, carving and
//! refinement follow, as configured.

use crate::core::behavior::Behavior;
use crate::core::input::InputGeometry;
use crate::core::mesh::{InsertVertexResult, Mesh, MeshError};
use crate::core::topology::{Otri, TriangleId};
use crate::core::vertex::{VertexKey, VertexKind};
use crate::geometry::point::{BoundingBox, Point};

impl Mesh {
    /// Builds a constrained Delaunay triangulation of `input` and, when
    /// `behavior.quality` is set, refines it.
    ///
    /// # Errors
    ///
    /// - Input validation errors ([`MeshError::TooFewVertices`],
    ///   [`MeshError::NonFiniteCoordinate`],
    ///   [`MeshError::SegmentEndpointOutOfRange`]).
    /// - [`MeshError::AllCollinear`] if no triangle can be formed.
    /// - [`MeshError::Behavior`] for an invalid behavior.
    /// - [`MeshError::PrecisionExhausted`] or [`MeshError::Topology`] from
    ///   segment recovery or refinement.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_mesh::prelude::*;
    ///
    /// let square = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
    ///     .with_closed_polygon(1);
    /// let behavior = BehaviorBuilder::default()
    ///     .quality(true)
    ///     .max_area(0.05)
    ///     .build()
    ///     .unwrap();
    /// let mesh = Mesh::triangulate(&square, behavior).unwrap();
    /// assert!(mesh.triangle_count() >= 20);
    /// assert!(mesh.validate().is_ok());
    /// ```
    pub fn triangulate(input: &InputGeometry, behavior: Behavior) -> Result<Self, MeshError> {
        let mut mesh = Self::new(behavior)?;
        mesh.build(input)?;
        Ok(mesh)
    }

    /// Discards the current contents and rebuilds from `input` with the
    /// active behavior.
    ///
    /// # Errors
    ///
    /// Same as [`Mesh::triangulate`].
    pub fn build(&mut self, input: &InputGeometry) -> Result<(), MeshError> {
        input.validate()?;
        self.reset();

        let points: Vec<Point> = input.vertices.iter().map(|v| v.point).collect();
        if all_collinear(&self.predicates, &points) {
            return Err(MeshError::AllCollinear);
        }
        self.bbox = BoundingBox::from_points(&points);

        let span = tracing::debug_span!(
            "triangulate",
            vertices = input.vertices.len(),
            segments = input.segments.len(),
            holes = input.holes.len(),
            regions = input.regions.len()
        );
        let _guard = span.enter();

        let keys: Vec<VertexKey> = input
            .vertices
            .iter()
            .map(|v| self.make_vertex(v.point, VertexKind::Input, v.marker, v.attributes.clone()))
            .collect();
        self.input_vertex_count = keys.len();

        self.incremental_delaunay(&keys)?;
        tracing::debug!(
            triangles = self.triangle_count(),
            hull = self.hull_size,
            duplicates = self.undead_count,
            "built Delaunay triangulation"
        );

        self.holes.clone_from(&input.holes);
        self.regions.clone_from(&input.regions);
        self.form_skeleton(input, &keys)?;

        if !input.segments.is_empty() || !self.holes.is_empty() || !self.regions.is_empty() {
            self.carve_holes();
        }

        if self.behavior.quality {
            self.refine()?;
        }
        Ok(())
    }

    /// Inserts `keys` one at a time into a bounding triangle, then removes it.
    fn incremental_delaunay(&mut self, keys: &[VertexKey]) -> Result<(), MeshError> {
        self.bounding_triangle();
        for &v in keys {
            let mut search = Otri::OUTER;
            match self.insert_vertex(v, &mut search, None, false, false) {
                InsertVertexResult::Successful | InsertVertexResult::Encroaching => {}
                InsertVertexResult::Duplicate => {
                    let vertex = &self.vertices[v];
                    tracing::warn!(
                        id = vertex.id,
                        x = vertex.point.x,
                        y = vertex.point.y,
                        "duplicate input vertex skipped"
                    );
                    self.set_kind(v, VertexKind::Undead);
                    self.undead_count += 1;
                }
                result @ (InsertVertexResult::Violating | InsertVertexResult::Outside) => {
                    return Err(MeshError::topology(format!(
                        "input vertex {} could not be inserted into the bounding triangle ({result:?})",
                        self.vertices[v].id
                    )));
                }
            }
        }
        self.forget_insertion();
        self.remove_box()
    }

    /// Creates the triangle enclosing every input vertex.
    fn bounding_triangle(&mut self) {
        let bbox = self.bbox;
        let mut width = bbox.width().max(bbox.height());
        if width == 0.0 {
            width = 1.0;
        }
        let corners = [
            Point::new(bbox.min.x - 50.0 * width, bbox.min.y - 40.0 * width),
            Point::new(bbox.max.x + 50.0 * width, bbox.min.y - 40.0 * width),
            Point::new(0.5 * (bbox.min.x + bbox.max.x), bbox.max.y + 60.0 * width),
        ];
        let next_id = self.next_vertex_id;
        let infinite = corners.map(|p| self.make_vertex(p, VertexKind::Undead, 0, Vec::new()));
        // Infinite corners do not consume vertex ids.
        self.next_vertex_id = next_id;

        let tri = self.make_triangle();
        self.set_org(tri, infinite[0]);
        self.set_dest(tri, infinite[1]);
        self.set_apex(tri, infinite[2]);
        self.tri_mut(TriangleId::OUTER).neighbors[0] = tri;
        self.infinite = Some(infinite);
        self.recent = tri;
    }

    /// Deletes the triangles touching the bounding triangle's corners and
    /// records the hull size.
    fn remove_box(&mut self) -> Result<(), MeshError> {
        let mut nextedge = self.sym(Otri::OUTER);
        let finaledge = nextedge.lprev();
        nextedge = self.sym(nextedge.lnext());

        // Find a boundary triangle of the vertex set that survives.
        let mut searchedge = self.sym(nextedge.lprev());
        let checkedge = self.sym(nextedge.lnext());
        if checkedge.is_outer() {
            searchedge = self.sym(searchedge.lprev());
        }
        self.tri_mut(TriangleId::OUTER).neighbors[0] = searchedge;

        let limit = self.triangles.high_water();
        let mut hull: isize = -2;
        let mut steps = 0;
        while nextedge != finaledge {
            steps += 1;
            if steps > limit || nextedge.is_outer() {
                return Err(MeshError::topology("bounding triangle removal lost the hull"));
            }
            hull += 1;
            let dissolveedge = self.sym(nextedge.lprev());
            if !dissolveedge.is_outer() {
                self.dissolve(dissolveedge);
            }
            let dead = nextedge.lnext();
            nextedge = self.sym(dead);
            self.kill_triangle(dead.tri);
            if nextedge.is_outer() {
                nextedge = dissolveedge;
            }
        }
        self.kill_triangle(finaledge.tri);

        if let Some(infinite) = self.infinite.take() {
            for v in infinite {
                self.kill_vertex(v);
            }
        }
        self.hull_size = usize::try_from(hull).unwrap_or(0);
        self.recent = Otri::OUTER;
        Ok(())
    }
}

/// Returns `true` if every point lies on a single line (or all coincide).
fn all_collinear(predicates: &crate::geometry::robust_predicates::RobustPredicates, points: &[Point]) -> bool {
    let Some(&first) = points.first() else {
        return true;
    };
    let Some(&second) = points.iter().find(|&&p| p != first) else {
        return true;
    };
    points
        .iter()
        .all(|p| predicates.orient2d(&first, &second, p) == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convex_quad_gives_two_triangles() {
        let input = InputGeometry::from_points([[0.0, 0.0], [2.0, 0.0], [2.2, 1.5], [0.1, 1.0]]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.hull_size(), 4);
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.infinite.is_none());
    }

    #[test]
    fn triangle_count_follows_euler() {
        // 3 hull vertices plus k interior ones give 2k + 1 triangles.
        let input = InputGeometry::from_points([
            [0.0, 0.0],
            [10.0, 0.0],
            [5.0, 9.0],
            [5.0, 3.0],
            [4.0, 2.0],
            [6.0, 4.0],
        ]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        assert_eq!(mesh.hull_size(), 3);
        assert_eq!(mesh.triangle_count(), 7);
    }

    #[test]
    fn duplicates_become_undead() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        assert_eq!(mesh.undead_vertex_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn collinear_input_is_rejected() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        assert_eq!(
            Mesh::triangulate(&input, Behavior::default()).unwrap_err(),
            MeshError::AllCollinear
        );
        let identical = InputGeometry::from_points([[1.0, 1.0]; 3]);
        assert_eq!(
            Mesh::triangulate(&identical, Behavior::default()).unwrap_err(),
            MeshError::AllCollinear
        );
    }

    #[test]
    fn hull_vertices_are_marked_without_segments() {
        let input = InputGeometry::from_points([[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [1.0, 1.0]]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        let markers: Vec<i32> = mesh.vertices.values().map(|v| v.marker).collect();
        assert_eq!(markers.iter().filter(|&&m| m == 1).count(), 3);
        assert_eq!(mesh.subsegment_count(), 3);
    }

    #[test]
    fn sentinel_points_at_hull_after_construction() {
        let input = InputGeometry::from_points([[0.0, 0.0], [3.0, 0.0], [3.0, 3.0], [0.0, 3.0], [1.0, 2.0]]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        let hull = mesh.sym(Otri::OUTER);
        assert_ne!(hull.tri, TriangleId::OUTER);
        assert!(mesh.is_alive(hull.tri));
    }
}

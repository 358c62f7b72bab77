//! Deletion of free vertices.
//!
//! The star of the vertex is re-triangulated by recursively picking, for the
//! base edge of each sub-polygon, the polygon vertex that no other candidate
//! lies inside the circumcircle of, and realizing the choice with edge flips
//! inside the star. The two triangles left next to the seed edge are then
//! spliced out.

use crate::core::collections::SmallBuffer;
use crate::core::mesh::{Mesh, MeshError};
use crate::core::topology::{Otri, TriangleId};
use crate::core::vertex::{Vertex, VertexKey, VertexKind};

/// Typical vertex degree in a quality mesh.
pub(crate) type Fan = SmallBuffer<Otri, 8>;

impl Mesh {
    /// Deletes a free (Steiner) vertex and re-triangulates the hole it leaves.
    ///
    /// # Errors
    ///
    /// - [`MeshError::StaleVertex`] if `key` is not a live vertex.
    /// - [`MeshError::VertexNotFree`] for input and segment vertices.
    /// - [`MeshError::VertexOnBoundary`] if the vertex lies on the mesh
    ///   boundary or on a subsegment.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_mesh::prelude::*;
    ///
    /// let input = InputGeometry::from_points([[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
    /// let mut mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
    /// let (key, _) = mesh.insert_point(Point::new(1.5, 2.0)).unwrap();
    /// assert_eq!(mesh.triangle_count(), 4);
    ///
    /// let removed = mesh.delete_vertex(key.unwrap()).unwrap();
    /// assert_eq!(removed.point(), Point::new(1.5, 2.0));
    /// assert_eq!(mesh.triangle_count(), 2);
    /// ```
    pub fn delete_vertex(&mut self, key: VertexKey) -> Result<Vertex, MeshError> {
        let vertex = self.vertices.get(key).ok_or(MeshError::StaleVertex)?;
        let id = vertex.id;
        if vertex.kind != VertexKind::Free {
            return Err(MeshError::VertexNotFree { id });
        }
        let handle = self
            .vertex_triangle(key)
            .or_else(|| self.find_vertex_triangle(key))
            .ok_or(MeshError::StaleVertex)?;
        if !self.remove_free_vertex(handle)? {
            return Err(MeshError::VertexOnBoundary { id });
        }
        self.recent = Otri::OUTER;
        tracing::trace!(id, "deleted vertex");
        self.kill_vertex(key).ok_or(MeshError::StaleVertex)
    }

    /// Scans for a triangle whose origin is `key`.
    fn find_vertex_triangle(&self, key: VertexKey) -> Option<Otri> {
        self.triangles.iter().find_map(|(index, t)| {
            (0..3_u8)
                .map(|orient| Otri::new(TriangleId(index), orient))
                .find(|o| t.vertices[o.org_slot()] == key)
        })
    }

    /// The triangles around the origin of `start`, counterclockwise from
    /// `start`, or `None` if the ring is open (the origin is on the
    /// boundary) or an incident edge carries a subsegment.
    pub(crate) fn vertex_fan(&self, start: Otri) -> Option<Fan> {
        let mut fan = Fan::new();
        let mut o = start;
        for _ in 0..=self.triangles.len() {
            if !self.tspivot(o).is_none() {
                return None;
            }
            fan.push(o);
            o = self.onext(o);
            if o.is_outer() {
                return None;
            }
            if o == start {
                return Some(fan);
            }
        }
        None
    }

    /// Removes the origin of `deltri` from the triangulation. The vertex
    /// record itself is left to the caller.
    ///
    /// Returns `Ok(false)`, without touching the mesh, if the vertex has an
    /// open ring or an incident subsegment.
    pub(crate) fn remove_free_vertex(&mut self, deltri: Otri) -> Result<bool, MeshError> {
        let Some(fan) = self.vertex_fan(deltri) else {
            return Ok(false);
        };
        if fan.len() < 3 {
            return Err(MeshError::topology(format!(
                "vertex with only {} incident triangles",
                fan.len()
            )));
        }
        self.forget_insertion();

        let triangle_flaws = self.check_quality;
        if fan.len() > 3 {
            let firstedge = self.onext(deltri);
            let lastedge = self.oprev(deltri);
            self.triangulate_polygon(firstedge, lastedge, fan.len(), false, triangle_flaws);
        }

        // Splice out the two triangles beside `deltri`.
        let deltriright = deltri.lprev();
        let lefttri = self.dnext(deltri);
        let leftcasing = self.sym(lefttri);
        let righttri = self.oprev(deltriright);
        let rightcasing = self.sym(righttri);
        self.bond(deltri, leftcasing);
        self.bond(deltriright, rightcasing);
        let leftsubseg = self.tspivot(lefttri);
        self.tsbond_or_dissolve(deltri, leftsubseg);
        let rightsubseg = self.tspivot(righttri);
        self.tsbond_or_dissolve(deltriright, rightsubseg);

        let neworg = self.org(lefttri);
        self.set_org(deltri, neworg);
        self.set_vertex_triangle(neworg, deltri);
        if triangle_flaws {
            self.test_triangle(deltri);
        }

        self.kill_triangle(lefttri.tri);
        self.kill_triangle(righttri.tri);
        Ok(true)
    }

    /// Triangulates the polygon between `firstedge` and `lastedge` (both
    /// leaving the vertex being deleted), `edgecount` edges in all.
    ///
    /// The polygon must be star-shaped from the deleted vertex; every
    /// connection is made by flipping an edge of the star.
    fn triangulate_polygon(
        &mut self,
        firstedge: Otri,
        lastedge: Otri,
        edgecount: usize,
        do_flip: bool,
        triangle_flaws: bool,
    ) {
        let leftbase = self.point(self.apex(lastedge));
        let rightbase = self.point(self.dest(firstedge));

        // Find the best vertex to connect the base to.
        let mut besttri = self.onext(firstedge);
        let mut bestvertex = self.point(self.dest(besttri));
        let mut testtri = besttri;
        let mut bestnumber = 1;
        for i in 2..=edgecount.saturating_sub(2) {
            testtri = self.onext(testtri);
            let testvertex = self.point(self.dest(testtri));
            if self
                .predicates
                .incircle(&leftbase, &rightbase, &bestvertex, &testvertex)
                > 0.0
            {
                besttri = testtri;
                bestvertex = testvertex;
                bestnumber = i;
            }
        }

        if bestnumber > 1 {
            let tempedge = self.oprev(besttri);
            self.triangulate_polygon(firstedge, tempedge, bestnumber + 1, true, triangle_flaws);
        }
        if bestnumber + 2 < edgecount {
            let tempedge = self.sym(besttri);
            self.triangulate_polygon(besttri, lastedge, edgecount - bestnumber, true, triangle_flaws);
            // The recursion's flips may have moved `besttri`.
            besttri = self.sym(tempedge);
        }
        if do_flip {
            self.flip(besttri);
            if triangle_flaws {
                let committed = self.sym(besttri);
                self.test_triangle(committed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behavior::Behavior;
    use crate::core::input::InputGeometry;
    use crate::geometry::point::Point;

    fn corner_set(mesh: &Mesh) -> Vec<[(i64, i64); 3]> {
        #[allow(clippy::cast_possible_truncation)]
        let scaled = |p: Point| ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64);
        let mut triangles: Vec<[(i64, i64); 3]> = mesh
            .triangles
            .iter()
            .map(|(index, _)| {
                let mut corners = mesh.corner_points(Otri::new(TriangleId(index), 0)).map(scaled);
                corners.sort_unstable();
                corners
            })
            .collect();
        triangles.sort_unstable();
        triangles
    }

    fn scattered() -> Mesh {
        let input = InputGeometry::from_points([
            [0.0, 0.0],
            [6.0, 0.3],
            [6.4, 5.1],
            [0.2, 6.0],
            [2.1, 2.9],
            [4.3, 1.7],
            [3.8, 4.2],
        ]);
        Mesh::triangulate(&input, Behavior::default()).unwrap()
    }

    #[test]
    fn deleting_an_inserted_point_restores_the_delaunay_triangulation() {
        let mut mesh = scattered();
        let before = corner_set(&mesh);
        let triangles = mesh.triangle_count();

        let (key, _) = mesh.insert_point(Point::new(3.3, 3.1)).unwrap();
        assert_eq!(mesh.triangle_count(), triangles + 2);
        mesh.delete_vertex(key.unwrap()).unwrap();

        assert_eq!(mesh.triangle_count(), triangles);
        assert_eq!(corner_set(&mesh), before);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn high_degree_vertex_is_removed() {
        let mut mesh = scattered();
        let mut keys = Vec::new();
        for p in [[1.0, 1.0], [5.0, 1.0], [5.0, 5.0], [1.0, 5.0], [3.0, 0.8], [3.0, 5.4]] {
            let (key, _) = mesh.insert_point(Point::new(p[0], p[1])).unwrap();
            keys.push(key.unwrap());
        }
        let (center, _) = mesh.insert_point(Point::new(3.0, 3.0)).unwrap();
        let center = center.unwrap();
        let before = mesh.triangle_count();
        mesh.delete_vertex(center).unwrap();
        assert_eq!(mesh.triangle_count(), before - 2);
        assert!(mesh.vertex(center).is_none());
        assert!(mesh.validate().is_ok());

        for key in keys {
            mesh.delete_vertex(key).unwrap();
        }
        assert_eq!(mesh.vertex_count(), 7);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn only_free_vertices_can_be_deleted() {
        let mut mesh = scattered();
        let input_vertex = mesh
            .vertices
            .iter()
            .find(|(_, v)| v.kind() == VertexKind::Input)
            .map(|(key, _)| key)
            .unwrap();
        assert!(matches!(
            mesh.delete_vertex(input_vertex),
            Err(MeshError::VertexNotFree { .. })
        ));

        let (key, _) = mesh.insert_point(Point::new(2.5, 2.0)).unwrap();
        let key = key.unwrap();
        mesh.delete_vertex(key).unwrap();
        assert_eq!(mesh.delete_vertex(key), Err(MeshError::StaleVertex));
    }

    #[test]
    fn fan_of_a_hull_vertex_is_open() {
        let mesh = scattered();
        let hull = mesh.sym(Otri::OUTER);
        assert!(mesh.vertex_fan(hull).is_none());
    }
}

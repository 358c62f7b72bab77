//! Read-only views of a mesh for export and inspection.
//!
//! The iterators here walk the live records of the pools and report them in
//! pool order. Derived edges are enumerated once each: an edge is reported
//! from the triangle with the smaller id, or from its only triangle on the
//! boundary.
//!
//! # Examples
//!
//! ```rust
//! use delaunay_mesh::prelude::*;
//!
//! let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
//! let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
//!
//! assert_eq!(mesh.triangles().count(), 2);
//! assert_eq!(mesh.vertices().count(), 4);
//! let edges = mesh.edges();
//! assert_eq!(edges.len(), 5);
//! assert_eq!(edges.iter().filter(|e| e.boundary).count(), 4);
//! ```

#![forbid(unsafe_code)]

use crate::core::mesh::Mesh;
use crate::core::topology::{Osub, Otri, SubsegId, TriangleId};
use crate::core::vertex::{Vertex, VertexKey};
use crate::geometry::point::Point;
use crate::geometry::quality::{edge_lengths_squared, interior_angles, radius_edge_ratio, signed_area};
use serde::{Deserialize, Serialize};

/// A live triangle, corners in counterclockwise order.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleView {
    /// Pool id of the triangle.
    pub id: TriangleId,
    /// Corner vertex keys.
    pub vertices: [VertexKey; 3],
    /// Corner coordinates.
    pub points: [Point; 3],
    /// Region label spread from a region seed, 0 if none.
    pub region: i32,
    /// Area cap inherited from a region seed.
    pub area_bound: Option<f64>,
}

/// A live subsegment: a piece of an input segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentView {
    /// Pool id of the subsegment.
    pub id: SubsegId,
    /// Current endpoints.
    pub endpoints: [VertexKey; 2],
    /// Endpoints of the input segment this piece descends from.
    pub segment: [VertexKey; 2],
    /// Boundary marker.
    pub marker: i32,
}

/// An edge of the triangulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeView {
    /// Endpoints; the edge's triangle lies to their left.
    pub endpoints: [VertexKey; 2],
    /// Subsegment marker, 1 for an unconstrained hull edge, otherwise 0.
    pub marker: i32,
    /// Whether a subsegment lies on the edge.
    pub constrained: bool,
    /// Whether the edge bounds the triangulated domain.
    pub boundary: bool,
}

/// Shape extremes over all live triangles. Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityStatistics {
    /// Number of triangles measured.
    pub triangles: usize,
    /// Smallest interior angle.
    pub min_angle: f64,
    /// Largest interior angle.
    pub max_angle: f64,
    /// Smallest triangle area.
    pub min_area: f64,
    /// Largest triangle area.
    pub max_area: f64,
    /// Length of the shortest edge.
    pub shortest_edge: f64,
    /// Length of the longest edge.
    pub longest_edge: f64,
    /// Largest circumradius to shortest edge ratio.
    pub worst_radius_edge_ratio: f64,
}

impl Mesh {
    /// Iterates over the live triangles.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleView> + '_ {
        self.triangles.iter().map(|(index, t)| {
            let id = TriangleId(index);
            TriangleView {
                id,
                vertices: t.vertices,
                points: t.vertices.map(|v| self.point(v)),
                region: t.region,
                area_bound: (t.area_bound > 0.0).then_some(t.area_bound),
            }
        })
    }

    /// Iterates over the vertices that are part of the triangulation.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> + '_ {
        self.vertices.iter().filter(|(_, v)| v.kind().is_in_mesh())
    }

    /// Iterates over the live subsegments.
    pub fn subsegments(&self) -> impl Iterator<Item = SegmentView> + '_ {
        self.subsegs.iter().map(|(index, s)| {
            let o = Osub::new(SubsegId(index), 0);
            SegmentView {
                id: o.seg,
                endpoints: [self.sorg(o), self.sdest(o)],
                segment: [self.segorg(o), self.segdest(o)],
                marker: s.marker,
            }
        })
    }

    /// Enumerates every edge once, with boundary markers.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeView> {
        let mut edges = Vec::with_capacity(self.triangles.len() * 3 / 2 + self.hull_size);
        for (index, _) in self.triangles.iter() {
            for orient in 0..3 {
                let o = Otri::new(TriangleId(index), orient);
                let across = self.sym(o);
                if !across.is_outer() && across.tri < o.tri {
                    continue;
                }
                let subseg = self.tspivot(o);
                let boundary = across.is_outer();
                let marker = if !subseg.is_none() {
                    self.subseg_marker(subseg)
                } else {
                    i32::from(boundary)
                };
                edges.push(EdgeView {
                    endpoints: [self.org(o), self.dest(o)],
                    marker,
                    constrained: !subseg.is_none(),
                    boundary,
                });
            }
        }
        edges
    }

    /// Angle, area and edge-length extremes over the live triangles, or
    /// `None` for an empty mesh.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_mesh::prelude::*;
    ///
    /// let input = InputGeometry::from_points([[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]]);
    /// let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
    /// let stats = mesh.quality_statistics().unwrap();
    /// assert!((stats.min_angle - 45.0).abs() < 1e-9);
    /// assert!((stats.max_angle - 90.0).abs() < 1e-9);
    /// assert!((stats.max_area - 2.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn quality_statistics(&self) -> Option<QualityStatistics> {
        if self.triangles.is_empty() {
            return None;
        }
        let mut stats = QualityStatistics {
            triangles: 0,
            min_angle: f64::INFINITY,
            max_angle: 0.0,
            min_area: f64::INFINITY,
            max_area: 0.0,
            shortest_edge: f64::INFINITY,
            longest_edge: 0.0,
            worst_radius_edge_ratio: 0.0,
        };
        for view in self.triangles() {
            let [a, b, c] = view.points;
            stats.triangles += 1;
            for angle in interior_angles(&a, &b, &c) {
                stats.min_angle = stats.min_angle.min(angle);
                stats.max_angle = stats.max_angle.max(angle);
            }
            let area = signed_area(&a, &b, &c);
            stats.min_area = stats.min_area.min(area);
            stats.max_area = stats.max_area.max(area);
            for length in edge_lengths_squared(&a, &b, &c).map(f64::sqrt) {
                stats.shortest_edge = stats.shortest_edge.min(length);
                stats.longest_edge = stats.longest_edge.max(length);
            }
            let ratio = radius_edge_ratio(&a, &b, &c).unwrap_or(f64::INFINITY);
            stats.worst_radius_edge_ratio = stats.worst_radius_edge_ratio.max(ratio);
        }
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::behavior::Behavior;
    use crate::core::input::InputGeometry;
    use approx::assert_relative_eq;

    #[test]
    fn triangles_are_counterclockwise() {
        let input = InputGeometry::from_points([[0.0, 0.0], [3.0, 0.0], [3.0, 2.0], [0.0, 2.0], [1.5, 1.0]]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        assert_eq!(mesh.triangles().count(), 4);
        for view in mesh.triangles() {
            let [a, b, c] = view.points;
            assert!(signed_area(&a, &b, &c) > 0.0);
            assert_eq!(view.region, 0);
            assert_eq!(view.area_bound, None);
        }
    }

    #[test]
    fn subsegments_report_their_segment() {
        let input = InputGeometry::from_points([[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]).with_closed_polygon(5);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        let segments: Vec<_> = mesh.subsegments().collect();
        assert_eq!(segments.len(), 4);
        for s in &segments {
            assert_eq!(s.marker, 5);
            assert_eq!(s.endpoints[0] == s.segment[0], s.endpoints[1] == s.segment[1]);
        }
        assert!(mesh.edges().iter().filter(|e| e.constrained).all(|e| e.marker == 5 && e.boundary));
    }

    #[test]
    fn hull_edges_without_segments_get_marker_one() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [0.5, 1.0], [0.5, 0.4]]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        let edges = mesh.edges();
        assert_eq!(edges.len(), 6);
        assert_eq!(edges.iter().filter(|e| e.marker == 1).count(), mesh.hull_size());
    }

    #[test]
    fn statistics_of_unit_square() {
        let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
        let stats = mesh.quality_statistics().unwrap();
        assert_eq!(stats.triangles, 2);
        assert_relative_eq!(stats.min_angle, 45.0, epsilon = 1e-9);
        assert_relative_eq!(stats.max_angle, 90.0, epsilon = 1e-9);
        assert_relative_eq!(stats.min_area, 0.5);
        assert_relative_eq!(stats.shortest_edge, 1.0);
        assert_relative_eq!(stats.longest_edge, 2.0_f64.sqrt());
        assert_relative_eq!(stats.worst_radius_edge_ratio, 2.0_f64.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_mesh_has_no_statistics() {
        let mesh = Mesh::new(Behavior::default()).unwrap();
        assert!(mesh.quality_statistics().is_none());
        assert!(mesh.edges().is_empty());
    }
}

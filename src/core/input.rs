//! Input geometry: a planar straight-line graph plus hole and region seeds.
//!
//! # Examples
//!
//! ```rust
//! use delaunay_mesh::core::input::InputGeometry;
//! use delaunay_mesh::vertex;
//!
//! // A unit square with its four sides as segments.
//! let square = InputGeometry::new(vec![
//!     vertex!([0.0, 0.0]),
//!     vertex!([1.0, 0.0]),
//!     vertex!([1.0, 1.0]),
//!     vertex!([0.0, 1.0]),
//! ])
//! .with_closed_polygon(1);
//!
//! assert_eq!(square.segments.len(), 4);
//! assert!(square.validate().is_ok());
//! ```

use crate::core::mesh::MeshError;
use crate::core::vertex::InputVertex;
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};

/// A constrained segment between two input vertices, by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSegment {
    /// Indices into [`InputGeometry::vertices`].
    pub endpoints: [usize; 2],
    /// Boundary marker copied onto every subsegment of the segment.
    pub marker: i32,
}

impl InputSegment {
    /// Creates a segment with marker 0.
    #[must_use]
    pub const fn new(a: usize, b: usize) -> Self {
        Self {
            endpoints: [a, b],
            marker: 0,
        }
    }

    /// Creates a segment with a boundary marker.
    #[must_use]
    pub const fn with_marker(a: usize, b: usize, marker: i32) -> Self {
        Self {
            endpoints: [a, b],
            marker,
        }
    }
}

/// A point identifying a region, with the label and optional area cap given
/// to every triangle reachable from it without crossing a segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionSeed {
    /// A point strictly inside the region.
    pub point: Point,
    /// Region label.
    pub region: i32,
    /// Area cap, honored when `Behavior::variable_area` is set; `None` or a
    /// non-positive value means no cap.
    pub area_bound: Option<f64>,
}

/// Everything the triangulation driver consumes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputGeometry {
    /// Input vertices; ids in the mesh follow this order.
    pub vertices: Vec<InputVertex>,
    /// Constrained segments.
    pub segments: Vec<InputSegment>,
    /// Hole seeds: the triangles containing them, and everything reachable
    /// from there without crossing a segment, are removed.
    pub holes: Vec<Point>,
    /// Region seeds.
    pub regions: Vec<RegionSeed>,
}

impl InputGeometry {
    /// Creates a point-set input without segments.
    #[must_use]
    pub fn new(vertices: Vec<InputVertex>) -> Self {
        Self {
            vertices,
            ..Self::default()
        }
    }

    /// Creates input from bare points.
    #[must_use]
    pub fn from_points<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        Self::new(
            points
                .into_iter()
                .map(|p| InputVertex::from(p.into()))
                .collect(),
        )
    }

    /// Adds segments.
    #[must_use]
    pub fn with_segments(mut self, segments: impl IntoIterator<Item = InputSegment>) -> Self {
        self.segments.extend(segments);
        self
    }

    /// Connects every vertex to the next one, closing the loop, with `marker`.
    #[must_use]
    pub fn with_closed_polygon(mut self, marker: i32) -> Self {
        let n = self.vertices.len();
        self.segments
            .extend((0..n).map(|i| InputSegment::with_marker(i, (i + 1) % n, marker)));
        self
    }

    /// Adds hole seeds.
    #[must_use]
    pub fn with_holes(mut self, holes: impl IntoIterator<Item = Point>) -> Self {
        self.holes.extend(holes);
        self
    }

    /// Adds region seeds.
    #[must_use]
    pub fn with_regions(mut self, regions: impl IntoIterator<Item = RegionSeed>) -> Self {
        self.regions.extend(regions);
        self
    }

    /// Checks vertex count, coordinate finiteness and segment indices.
    ///
    /// # Errors
    ///
    /// - [`MeshError::TooFewVertices`] with fewer than 3 vertices.
    /// - [`MeshError::NonFiniteCoordinate`] for NaN or infinite coordinates.
    /// - [`MeshError::SegmentEndpointOutOfRange`] for a bad segment index.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.vertices.len() < 3 {
            return Err(MeshError::TooFewVertices {
                found: self.vertices.len(),
            });
        }
        if let Some(index) = self.vertices.iter().position(|v| !v.point.is_finite()) {
            return Err(MeshError::NonFiniteCoordinate { index });
        }
        for (segment, s) in self.segments.iter().enumerate() {
            if let Some(&index) = s.endpoints.iter().find(|&&i| i >= self.vertices.len()) {
                return Err(MeshError::SegmentEndpointOutOfRange {
                    segment,
                    index,
                    vertex_count: self.vertices.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex;

    #[test]
    fn closed_polygon_wraps_around() {
        let g = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).with_closed_polygon(7);
        assert_eq!(g.segments[2].endpoints, [2, 0]);
        assert!(g.segments.iter().all(|s| s.marker == 7));
    }

    #[test]
    fn validation_catches_bad_input() {
        let two = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0]]);
        assert!(matches!(two.validate(), Err(MeshError::TooFewVertices { found: 2 })));

        let mut nan = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        nan.vertices[1].point.y = f64::NAN;
        assert!(matches!(nan.validate(), Err(MeshError::NonFiniteCoordinate { index: 1 })));

        let bad_segment = InputGeometry::new(vec![
            vertex!([0.0, 0.0]),
            vertex!([1.0, 0.0]),
            vertex!([0.0, 1.0]),
        ])
        .with_segments([InputSegment::new(0, 3)]);
        assert!(matches!(
            bad_segment.validate(),
            Err(MeshError::SegmentEndpointOutOfRange { segment: 0, index: 3, .. })
        ));
    }
}

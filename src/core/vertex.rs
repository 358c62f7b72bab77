//! Mesh vertices and the input vertex record.
//!
//! # Key Features
//!
//! - **Stable keys**: vertices live in a slot map addressed by [`VertexKey`];
//!   the mesh's triangles refer to vertices only through these keys.
//! - **Kinds**: each vertex records how it entered the mesh ([`VertexKind`]),
//!   which decides whether refinement may move or delete it.
//! - **Back-reference**: a non-owning handle to one incident triangle, used
//!   only to seed lookups and rebuilt lazily when stale.
//! - **Builder Pattern**: input vertices are built with `InputVertexBuilder`
//!   or the [`vertex!`](crate::vertex) macro.
//!
//! # Examples
//!
//! ```rust
//! use delaunay_mesh::core::vertex::InputVertex;
//! use delaunay_mesh::vertex;
//!
//! let v: InputVertex = vertex!([1.0, 2.0]);
//! let boundary: InputVertex = vertex!([0.0, 0.0], 3);
//! assert_eq!(boundary.marker, 3);
//! assert_eq!(v.point.x, 1.0);
//! ```

#![forbid(unsafe_code)]

use crate::core::topology::Otri;
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Key type for accessing vertices in the mesh's vertex storage.
    ///
    /// Triangles and subsegments hold `VertexKey`s in their corner slots; the
    /// null key (`VertexKey::default()`) marks an empty slot, as in the sentinel
    /// records.
    pub struct VertexKey;
}

// =============================================================================
// CONVENIENCE MACROS
// =============================================================================

/// Convenience macro for creating input vertices.
///
/// # Panics
///
/// Never in practice: every field the builder needs is supplied.
///
/// # Usage
///
/// ```rust
/// use delaunay_mesh::vertex;
/// use delaunay_mesh::core::vertex::InputVertex;
///
/// let plain: InputVertex = vertex!([0.5, 0.25]);
/// let marked: InputVertex = vertex!([1.0, 0.0], 2);
/// let with_attributes: InputVertex = vertex!([1.0, 1.0], 0, vec![10.0, -1.0]);
/// assert_eq!(with_attributes.attributes.len(), 2);
/// ```
#[macro_export]
macro_rules! vertex {
    ($coords:expr) => {
        $crate::core::vertex::InputVertexBuilder::default()
            .point($crate::geometry::point::Point::from($coords))
            .build()
            .expect("Failed to build input vertex: invalid coordinates")
    };
    ($coords:expr, $marker:expr) => {
        $crate::core::vertex::InputVertexBuilder::default()
            .point($crate::geometry::point::Point::from($coords))
            .marker($marker)
            .build()
            .expect("Failed to build input vertex: invalid coordinates")
    };
    ($coords:expr, $marker:expr, $attributes:expr) => {
        $crate::core::vertex::InputVertexBuilder::default()
            .point($crate::geometry::point::Point::from($coords))
            .marker($marker)
            .attributes($attributes)
            .build()
            .expect("Failed to build input vertex: invalid coordinates")
    };
}

// =============================================================================
// VERTEX KIND
// =============================================================================

/// How a vertex entered the mesh, which governs what refinement may do with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexKind {
    /// Supplied by the caller (or created where two input segments cross).
    #[default]
    Input,
    /// Created by splitting a subsegment; lies on a segment.
    Segment,
    /// A Steiner point in the interior; the only kind that may be deleted or relocated.
    Free,
    /// Removed from the mesh.
    Dead,
    /// Still stored but not part of the triangulation: a duplicate input point,
    /// or a vertex orphaned by hole carving.
    Undead,
}

impl VertexKind {
    /// Returns `true` for kinds that are part of the triangulation.
    #[must_use]
    pub const fn is_in_mesh(self) -> bool {
        matches!(self, Self::Input | Self::Segment | Self::Free)
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Segment => "segment",
            Self::Free => "free",
            Self::Dead => "dead",
            Self::Undead => "undead",
        };
        f.write_str(name)
    }
}

// =============================================================================
// INPUT VERTEX
// =============================================================================

/// A vertex as supplied by the caller.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct InputVertex {
    /// Location.
    pub point: Point,
    /// Boundary marker; 0 means "unmarked".
    #[builder(default)]
    pub marker: i32,
    /// Attributes interpolated onto Steiner points created nearby.
    #[builder(default)]
    pub attributes: Vec<f64>,
}

impl InputVertexBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.point {
            Some(p) if !p.is_finite() => Err(format!("non-finite coordinates {p}")),
            _ => Ok(()),
        }
    }
}

impl From<Point> for InputVertex {
    fn from(point: Point) -> Self {
        Self {
            point,
            marker: 0,
            attributes: Vec::new(),
        }
    }
}

// =============================================================================
// MESH VERTEX
// =============================================================================

/// A vertex stored in the mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub(crate) point: Point,
    pub(crate) id: usize,
    pub(crate) kind: VertexKind,
    pub(crate) marker: i32,
    pub(crate) attributes: Vec<f64>,
    /// One incident triangle with this vertex as origin; may be stale.
    #[serde(skip)]
    pub(crate) triangle: Otri,
}

impl Vertex {
    pub(crate) fn new(point: Point, id: usize, kind: VertexKind, marker: i32, attributes: Vec<f64>) -> Self {
        Self {
            point,
            id,
            kind,
            marker,
            attributes,
            triangle: Otri::OUTER,
        }
    }

    /// Location of the vertex.
    #[must_use]
    pub const fn point(&self) -> Point {
        self.point
    }

    /// Unique id: the input index for input vertices, a running counter otherwise.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// How the vertex entered the mesh.
    #[must_use]
    pub const fn kind(&self) -> VertexKind {
        self.kind
    }

    /// Boundary marker (0 for interior vertices unless the caller set one).
    #[must_use]
    pub const fn marker(&self) -> i32 {
        self.marker
    }

    /// Interpolated attributes.
    #[must_use]
    pub fn attributes(&self) -> &[f64] {
        &self.attributes
    }
}

/// Interpolates attribute vectors: `a + xi·(b − a) + eta·(c − a)`.
///
/// Vectors of unequal length are truncated to the shortest.
pub(crate) fn interpolate_attributes(a: &[f64], b: &[f64], c: &[f64], xi: f64, eta: f64) -> Vec<f64> {
    a.iter()
        .zip(b)
        .zip(c)
        .map(|((&va, &vb), &vc)| va + xi * (vb - va) + eta * (vc - va))
        .collect()
}

/// Interpolates along a segment: `a + t·(b − a)`.
pub(crate) fn lerp_attributes(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(&va, &vb)| va + t * (vb - va)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn builder_rejects_non_finite_points() {
        let err = InputVertexBuilder::default()
            .point(Point::new(f64::NAN, 0.0))
            .build();
        assert!(err.is_err());
        let ok = InputVertexBuilder::default().point(Point::new(1.0, 2.0)).build();
        assert!(ok.is_ok());
    }

    #[test]
    fn macro_sets_marker_and_attributes() {
        let v: InputVertex = crate::vertex!([1.0, 2.0], 5, vec![3.0]);
        assert_eq!(v.point, Point::new(1.0, 2.0));
        assert_eq!(v.marker, 5);
        assert_eq!(v.attributes, vec![3.0]);
    }

    #[test]
    fn kinds_in_mesh() {
        assert!(VertexKind::Free.is_in_mesh());
        assert!(!VertexKind::Undead.is_in_mesh());
        assert!(!VertexKind::Dead.is_in_mesh());
        assert_eq!(VertexKind::Segment.to_string(), "segment");
    }

    #[test]
    fn attribute_interpolation() {
        let mid = lerp_attributes(&[0.0, 10.0], &[2.0, 20.0], 0.5);
        assert_relative_eq!(mid[0], 1.0);
        assert_relative_eq!(mid[1], 15.0);
        let c = interpolate_attributes(&[0.0], &[1.0], &[2.0], 0.25, 0.5);
        assert_relative_eq!(c[0], 1.25);
    }
}

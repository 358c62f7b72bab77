//! Structural and geometric consistency checks.
//!
//! [`Mesh::validate`] walks every live triangle once and reports the first
//! problem found:
//!
//! | Check | Error |
//! |---|---|
//! | Corners are live mesh vertices | [`ValidationError::DeadVertex`] |
//! | Corners are in counterclockwise order | [`ValidationError::NotCounterclockwise`] |
//! | Neighbors are live and bonded back | [`ValidationError::DeadNeighbor`], [`ValidationError::AsymmetricNeighbor`] |
//! | Subsegments match their edge and bond back | [`ValidationError::SubsegmentMismatch`] |
//! | No vertex inside a circumcircle across an unconstrained edge | [`ValidationError::DelaunayViolation`] |
//! | Recorded hull size matches the boundary | [`ValidationError::HullSizeMismatch`] |
//!
//! The walk is linear in the number of triangles; it is meant for tests and
//! debugging rather than for every operation.

#![forbid(unsafe_code)]

use crate::core::mesh::Mesh;
use crate::core::topology::{Otri, TriangleId};
use thiserror::Error;

/// Errors reported by [`Mesh::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A triangle refers to a vertex that is not part of the mesh.
    #[error("Triangle {triangle} refers to a vertex that is not in the mesh")]
    DeadVertex {
        /// The offending triangle
        triangle: TriangleId,
    },
    /// A triangle is clockwise or degenerate.
    #[error("Triangle {triangle} is not counterclockwise")]
    NotCounterclockwise {
        /// The offending triangle
        triangle: TriangleId,
    },
    /// A neighbor slot points at a freed triangle.
    #[error("Triangle {triangle} edge {orient} is bonded to a dead triangle")]
    DeadNeighbor {
        /// The offending triangle
        triangle: TriangleId,
        /// The edge selector
        orient: u8,
    },
    /// Two triangles disagree about being neighbors, or about their shared edge.
    #[error("Triangle {triangle} edge {orient} is not bonded back by its neighbor")]
    AsymmetricNeighbor {
        /// The offending triangle
        triangle: TriangleId,
        /// The edge selector
        orient: u8,
    },
    /// A subsegment is dead, has other endpoints than its edge, or does not
    /// refer back to the triangle.
    #[error("Subsegment on triangle {triangle} edge {orient} is inconsistent")]
    SubsegmentMismatch {
        /// The offending triangle
        triangle: TriangleId,
        /// The edge selector
        orient: u8,
    },
    /// The apex across an unconstrained edge lies inside the circumcircle.
    #[error("Triangle {triangle} edge {orient} is not locally Delaunay")]
    DelaunayViolation {
        /// The offending triangle
        triangle: TriangleId,
        /// The edge selector
        orient: u8,
    },
    /// The hull size counter disagrees with the number of boundary edges.
    #[error("Hull size is recorded as {recorded} but {counted} boundary edges exist")]
    HullSizeMismatch {
        /// Counter value
        recorded: usize,
        /// Edges with outer space on the other side
        counted: usize,
    },
}

impl Mesh {
    /// Checks the topology and the constrained Delaunay property.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_mesh::prelude::*;
    ///
    /// let input = InputGeometry::from_points([[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 1.0], [1.0, 0.4]])
    ///     .with_closed_polygon(1);
    /// let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
    /// assert!(mesh.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut boundary_edges = 0;
        for (index, t) in self.triangles.iter() {
            let triangle = TriangleId(index);
            if !t
                .vertices
                .iter()
                .all(|&v| self.vertices.get(v).is_some_and(|vertex| vertex.kind().is_in_mesh()))
            {
                return Err(ValidationError::DeadVertex { triangle });
            }
            let [a, b, c] = self.corner_points(Otri::new(triangle, 0));
            if self.predicates.orient2d(&a, &b, &c) <= 0.0 {
                return Err(ValidationError::NotCounterclockwise { triangle });
            }
            for orient in 0..3 {
                let o = Otri::new(triangle, orient);
                let across = self.sym(o);
                if across.is_outer() {
                    boundary_edges += 1;
                } else {
                    self.check_neighbor(o, across)?;
                }
                self.check_subsegment(o)?;
            }
        }
        if boundary_edges != self.hull_size {
            return Err(ValidationError::HullSizeMismatch {
                recorded: self.hull_size,
                counted: boundary_edges,
            });
        }
        tracing::trace!(triangles = self.triangles.len(), "mesh validated");
        Ok(())
    }

    fn check_neighbor(&self, o: Otri, across: Otri) -> Result<(), ValidationError> {
        let (triangle, orient) = (o.tri, o.orient);
        if !self.is_alive(across.tri) {
            return Err(ValidationError::DeadNeighbor { triangle, orient });
        }
        if self.sym(across) != o || self.org(across) != self.dest(o) || self.dest(across) != self.org(o) {
            return Err(ValidationError::AsymmetricNeighbor { triangle, orient });
        }
        if self.tspivot(o).is_none() {
            let [a, b, c] = self.corner_points(o);
            let d = self.point(self.apex(across));
            if self.predicates.incircle(&a, &b, &c, &d) > 0.0 {
                return Err(ValidationError::DelaunayViolation { triangle, orient });
            }
        }
        Ok(())
    }

    fn check_subsegment(&self, o: Otri) -> Result<(), ValidationError> {
        let s = self.tspivot(o);
        if s.is_none() {
            return Ok(());
        }
        let mismatch = ValidationError::SubsegmentMismatch {
            triangle: o.tri,
            orient: o.orient,
        };
        if !self.is_subseg_alive(s.seg) {
            return Err(mismatch);
        }
        let mut edge = [self.org(o), self.dest(o)];
        let mut ends = [self.sorg(s), self.sdest(s)];
        edge.sort_unstable();
        ends.sort_unstable();
        if edge != ends || (self.stpivot(s) != o && self.stpivot(s.ssym()) != o) {
            return Err(mismatch);
        }
        Ok(())
    }
}

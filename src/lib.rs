//! # delaunay-mesh
//!
//! Two-dimensional constrained Delaunay triangulation and quality mesh
//! refinement.
//!
//! # Features
//!
//! - Delaunay triangulation of point sets with exact, adaptive-precision
//!   orientation and in-circle predicates
//! - Constrained Delaunay triangulation of planar straight-line graphs
//!   (segments, holes, concavities and region labels)
//! - Ruppert/Chew quality refinement with minimum and maximum angle bounds,
//!   fixed and per-region area bounds, and a Steiner point budget
//! - Incremental editing: point insertion with undo, deletion of Steiner
//!   points, on-demand splitting of encroached segments
//! - Serialization of configuration and reports with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use delaunay_mesh::prelude::*;
//!
//! // A unit square outline with its four sides as segments.
//! let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
//!     .with_closed_polygon(1);
//!
//! let mesh = Mesh::triangulate(&input, Behavior::default()).unwrap();
//! assert_eq!(mesh.triangle_count(), 2);
//! assert_eq!(mesh.hull_size(), 4);
//! assert!(mesh.validate().is_ok());
//! ```
//!
//! # Quality Refinement
//!
//! Refinement inserts Steiner points until no triangle has an angle below
//! the bound, no subsegment is encroached and every area constraint holds.
//!
//! ```rust
//! use delaunay_mesh::prelude::*;
//!
//! let input = InputGeometry::from_points([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
//!     .with_closed_polygon(1);
//! let behavior = BehaviorBuilder::default()
//!     .quality(true)
//!     .min_angle(25.0)
//!     .max_area(0.05)
//!     .build()
//!     .unwrap();
//!
//! let mesh = Mesh::triangulate(&input, behavior).unwrap();
//! let stats = mesh.quality_statistics().unwrap();
//! assert!(stats.min_angle >= 25.0 - 1e-9);
//! assert!(stats.max_area <= 0.05);
//! assert!(mesh.steiner_points_inserted() > 0);
//! ```
//!
//! # Mesh Invariants
//!
//! After every public operation returns:
//!
//! - **Bond symmetry**: if a triangle's edge is bonded to a neighbor, the
//!   neighbor's matching edge is bonded back.
//! - **Orientation**: every live triangle is counterclockwise.
//! - **Constrained Delaunay**: across every edge that does not carry a
//!   subsegment, the opposite apex lies on or outside the circumcircle.
//! - **Segments**: every input segment is represented by a chain of
//!   subsegments on triangle edges.
//!
//! [`Mesh::validate`](core::mesh::Mesh::validate) checks all of them.
//!
//! # References
//!
//! - J. R. Shewchuk, "Triangle: Engineering a 2D Quality Mesh Generator and
//!   Delaunay Triangulator", Applied Computational Geometry, 1996.
//! - J. R. Shewchuk, "Delaunay Refinement Algorithms for Triangular Mesh
//!   Generation", Computational Geometry: Theory and Applications 22, 2002.
//! - J. Ruppert, "A Delaunay Refinement Algorithm for Quality 2-Dimensional
//!   Mesh Generation", Journal of Algorithms 18(3), 1995.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the mesh, its records and the algorithms that
/// build, refine and edit it.
pub mod core {
    /// Construction, point location, refinement and editing algorithms
    pub mod algorithms {
        /// Hole and concavity carving, region spreading
        pub mod carving;
        /// Incremental Delaunay construction in a bounding triangle
        pub mod construction;
        /// Removal of free vertices
        pub mod deletion;
        /// Vertex insertion, edge flips and undo
        pub mod insertion;
        /// Point location by directed walking
        pub mod locate;
        /// Quality refinement
        pub mod refinement;
        /// Segment recovery
        pub mod segments;
        /// Alternative Steiner point placement
        pub mod steiner;
    }
    pub mod behavior;
    /// High-performance collection types
    pub mod collections;
    pub mod flaws;
    pub mod input;
    pub mod mesh;
    pub mod output;
    /// Geometric block allocator for triangles and subsegments
    pub mod pool;
    pub mod topology;
    pub mod validation;
    pub mod vertex;

    // Re-export the `core` modules.
    pub use algorithms::locate::LocateResult;
    pub use algorithms::refinement::RefinementReport;
    pub use behavior::*;
    pub use input::*;
    pub use mesh::*;
    pub use output::*;
    pub use topology::{Osub, Otri, SubsegId, TriangleId};
    pub use validation::*;
    pub use vertex::*;
}

/// Points, predicates and triangle quality measures.
pub mod geometry {
    /// Expansion arithmetic behind the exact predicates
    pub mod exact;
    pub mod point;
    pub mod predicates;
    /// Triangle quality measures
    pub mod quality;
    /// Adaptive-precision orientation and in-circle tests
    pub mod robust_predicates;

    pub use point::*;
    pub use predicates::*;
    pub use quality::*;
    pub use robust_predicates::*;
}

/// A prelude module that re-exports commonly used types and macros.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        algorithms::{locate::LocateResult, refinement::RefinementReport},
        behavior::{
            Behavior, BehaviorBuilder, BehaviorError, SegmentSplitting, SteinerPlacement, TriangleTest,
        },
        input::{InputGeometry, InputSegment, RegionSeed},
        mesh::{InsertVertexResult, Mesh, MeshError},
        output::{EdgeView, QualityStatistics, SegmentView, TriangleView},
        topology::{Otri, TriangleId},
        validation::ValidationError,
        vertex::{InputVertex, InputVertexBuilder, Vertex, VertexKey, VertexKind},
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity, fast_hash_set_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::{
        point::{BoundingBox, Point},
        predicates::{InCircle, Orientation},
        quality::*,
        robust_predicates::RobustPredicates,
    };

    // Convenience macros
    pub use crate::vertex;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

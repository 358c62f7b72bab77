//! Triangle and subsegment records and the oriented handles that navigate them.
//!
//! # Conventions
//!
//! A triangle stores three vertices `v[0..3]`, three neighbor handles and three
//! subsegment handles. An oriented triangle [`Otri`] `(t, o)` names one directed
//! edge of `t`:
//!
//! - `org  = v[(o + 1) % 3]`
//! - `dest = v[(o + 2) % 3]`
//! - `apex = v[o]`
//!
//! `neighbors[o]` is the triangle across the `org → dest` edge (seen from the
//! other side, i.e. with `org` and `dest` swapped) and `subsegs[o]` is the
//! subsegment bonded to that edge, if any. Triangles are kept in
//! counterclockwise order, so the interior lies to the left of every directed
//! edge.
//!
//! A subsegment stores its current endpoints `v[0], v[1]`, the endpoints of the
//! input segment it descends from `v[2], v[3]`, two adjacent-subsegment handles
//! and two triangle handles. An oriented subsegment [`Osub`] `(s, o)` with
//! `o ∈ {0, 1}` reads `sorg = v[o]`, `sdest = v[1 - o]`, `segorg = v[2 + o]`,
//! `segdest = v[3 - o]`. `triangles[o]` is the triangle bonded to the
//! subsegment from the side where it reads `sdest → sorg`, i.e. the triangle
//! lying to the right of `sorg → sdest`.
//!
//! Slot 0 of each pool is the sentinel: [`TriangleId::OUTER`] represents outer
//! space and [`SubsegId::NONE`] represents "no constraint".

use crate::core::vertex::VertexKey;
use serde::{Deserialize, Serialize};
use std::fmt;

const PLUS1MOD3: [u8; 3] = [1, 2, 0];
const MINUS1MOD3: [u8; 3] = [2, 0, 1];

// =============================================================================
// IDS
// =============================================================================

/// Slot index of a triangle in the triangle pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriangleId(pub(crate) usize);

impl TriangleId {
    /// The sentinel "outer space" triangle.
    pub const OUTER: Self = Self(0);

    /// Raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns `true` for the sentinel.
    #[must_use]
    pub const fn is_outer(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TriangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Slot index of a subsegment in the subsegment pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubsegId(pub(crate) usize);

impl SubsegId {
    /// The sentinel "no constraint" subsegment.
    pub const NONE: Self = Self(0);

    /// Raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns `true` for the sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SubsegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

// =============================================================================
// ORIENTED HANDLES
// =============================================================================

/// An oriented triangle: a triangle plus one of its three directed edges.
///
/// Handles are transient cursors; operations that need mesh data (`sym`,
/// `org`, ...) live on [`Mesh`](crate::core::mesh::Mesh).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Otri {
    /// The triangle.
    pub tri: TriangleId,
    /// Edge selector in `0..3`.
    pub orient: u8,
}

impl Otri {
    /// The sentinel triangle with orientation 0.
    pub const OUTER: Self = Self {
        tri: TriangleId::OUTER,
        orient: 0,
    };

    /// Creates a handle.
    #[must_use]
    pub const fn new(tri: TriangleId, orient: u8) -> Self {
        Self { tri, orient }
    }

    /// Next edge counterclockwise within the same triangle.
    #[must_use]
    pub const fn lnext(self) -> Self {
        Self {
            tri: self.tri,
            orient: PLUS1MOD3[self.orient as usize],
        }
    }

    /// Previous edge (clockwise) within the same triangle.
    #[must_use]
    pub const fn lprev(self) -> Self {
        Self {
            tri: self.tri,
            orient: MINUS1MOD3[self.orient as usize],
        }
    }

    /// Returns `true` if this handle points at the sentinel.
    #[must_use]
    pub const fn is_outer(self) -> bool {
        self.tri.is_outer()
    }

    #[inline]
    pub(crate) const fn org_slot(self) -> usize {
        PLUS1MOD3[self.orient as usize] as usize
    }

    #[inline]
    pub(crate) const fn dest_slot(self) -> usize {
        MINUS1MOD3[self.orient as usize] as usize
    }

    #[inline]
    pub(crate) const fn apex_slot(self) -> usize {
        self.orient as usize
    }
}

impl fmt::Display for Otri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tri, self.orient)
    }
}

/// An oriented subsegment: a subsegment plus one of its two directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Osub {
    /// The subsegment.
    pub seg: SubsegId,
    /// Direction selector, 0 or 1.
    pub orient: u8,
}

impl Osub {
    /// The sentinel subsegment with orientation 0.
    pub const NONE: Self = Self {
        seg: SubsegId::NONE,
        orient: 0,
    };

    /// Creates a handle.
    #[must_use]
    pub const fn new(seg: SubsegId, orient: u8) -> Self {
        Self { seg, orient }
    }

    /// The same subsegment traversed in the opposite direction.
    #[must_use]
    pub const fn ssym(self) -> Self {
        Self {
            seg: self.seg,
            orient: 1 - self.orient,
        }
    }

    /// Returns `true` if this handle points at the sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.seg.is_none()
    }
}

impl fmt::Display for Osub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.seg, self.orient)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A triangle record.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Triangle {
    pub(crate) vertices: [VertexKey; 3],
    pub(crate) neighbors: [Otri; 3],
    pub(crate) subsegs: [Osub; 3],
    pub(crate) region: i32,
    /// Per-triangle area cap; non-positive means "none".
    pub(crate) area_bound: f64,
    /// Scratch flag for hole carving and region spreading.
    pub(crate) infected: bool,
}

impl Default for Triangle {
    fn default() -> Self {
        Self {
            vertices: [VertexKey::default(); 3],
            neighbors: [Otri::OUTER; 3],
            subsegs: [Osub::NONE; 3],
            region: 0,
            area_bound: -1.0,
            infected: false,
        }
    }
}

/// A subsegment record.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Subseg {
    pub(crate) vertices: [VertexKey; 4],
    pub(crate) adjacent: [Osub; 2],
    pub(crate) triangles: [Otri; 2],
    pub(crate) marker: i32,
}

impl Default for Subseg {
    fn default() -> Self {
        Self {
            vertices: [VertexKey::default(); 4],
            adjacent: [Osub::NONE; 2],
            triangles: [Otri::OUTER; 2],
            marker: 0,
        }
    }
}

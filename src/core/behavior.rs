//! Meshing behavior: which constraints to honor and how hard to refine.
//!
//! A [`Behavior`] is a plain configuration record. It is built with
//! [`BehaviorBuilder`], validated on `build()`, serializable with serde, and
//! handed to the mesh at construction. Quantities derived from it (squared
//! cosine bounds, the off-center constant) are computed once when the mesh
//! adopts the behavior.
//!
//! # Examples
//!
//! ```rust
//! use delaunay_mesh::core::behavior::{BehaviorBuilder, SegmentSplitting};
//!
//! let behavior = BehaviorBuilder::default()
//!     .quality(true)
//!     .min_angle(25.0)
//!     .max_area(0.01)
//!     .segment_splitting(SegmentSplitting::NoBoundarySplits)
//!     .build()
//!     .unwrap();
//! assert_eq!(behavior.max_area, Some(0.01));
//!
//! assert!(BehaviorBuilder::default().min_angle(75.0).build().is_err());
//! ```

#![forbid(unsafe_code)]

use crate::geometry::point::Point;
use derive_builder::UninitializedFieldError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Default minimum angle (degrees) used when quality refinement is requested.
pub const DEFAULT_MIN_ANGLE: f64 = 20.0;

/// Default seed for the point locator's random sampler.
pub const DEFAULT_SAMPLE_SEED: u64 = 0x5EED_D1EA;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while building or validating a [`Behavior`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    /// The minimum angle must lie in `[0, 60]` degrees.
    #[error("Minimum angle {angle}° is outside [0, 60]")]
    MinAngleOutOfRange {
        /// The rejected angle
        angle: f64,
    },
    /// The maximum angle must be 0 (disabled) or lie in `[60, 180]` degrees.
    #[error("Maximum angle {angle}° must be 0 or within [60, 180]")]
    MaxAngleOutOfRange {
        /// The rejected angle
        angle: f64,
    },
    /// A fixed area bound must be positive.
    #[error("Maximum area {area} must be positive")]
    NonPositiveMaxArea {
        /// The rejected area
        area: f64,
    },
    /// A builder field was left unset and has no default.
    #[error("Behavior field `{field}` was not initialized")]
    UninitializedField {
        /// Name of the field
        field: &'static str,
    },
}

impl From<UninitializedFieldError> for BehaviorError {
    fn from(err: UninitializedFieldError) -> Self {
        Self::UninitializedField {
            field: err.field_name(),
        }
    }
}

// =============================================================================
// OPTION ENUMS
// =============================================================================

/// Restrictions on splitting subsegments during refinement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentSplitting {
    /// Any encroached subsegment may be split.
    #[default]
    Normal,
    /// Subsegments on the mesh boundary are never split; interior ones may be.
    NoBoundarySplits,
    /// No subsegment is ever split.
    NoSplits,
}

/// Where refinement places the Steiner point that eliminates a bad triangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SteinerPlacement {
    /// The circumcenter, or the off-center when it lies closer to the
    /// shortest edge.
    #[default]
    Circumcenter,
    /// Search between the off-center and the circumcenter for a point whose
    /// new triangles all satisfy the angle bound, falling back to
    /// [`SteinerPlacement::Circumcenter`].
    NewLocation,
}

// =============================================================================
// USER TEST
// =============================================================================

type TriangleTestFn = dyn Fn(&Point, &Point, &Point, f64) -> bool + Send + Sync;

/// A caller-supplied predicate deciding that a triangle is too large.
///
/// It receives the triangle's corners (counterclockwise) and its area and
/// returns `true` to request that the triangle be split.
#[derive(Clone)]
pub struct TriangleTest(Arc<TriangleTestFn>);

impl TriangleTest {
    /// Wraps a closure.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&Point, &Point, &Point, f64) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn is_unsuitable(&self, org: &Point, dest: &Point, apex: &Point, area: f64) -> bool {
        (self.0)(org, dest, apex, area)
    }
}

impl fmt::Debug for TriangleTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TriangleTest(..)")
    }
}

// =============================================================================
// BEHAVIOR
// =============================================================================

/// Configuration record for triangulation and refinement.
#[derive(Builder, Clone, Debug, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "BehaviorError"))]
pub struct Behavior {
    /// Run quality refinement after construction.
    #[builder(default)]
    pub quality: bool,
    /// Minimum angle bound in degrees, within `[0, 60]`.
    #[builder(default = "DEFAULT_MIN_ANGLE")]
    pub min_angle: f64,
    /// Maximum angle bound in degrees; 0 disables the bound.
    #[builder(default)]
    pub max_angle: f64,
    /// Fixed upper bound on triangle area.
    #[builder(default, setter(strip_option))]
    pub max_area: Option<f64>,
    /// Honor per-region area caps given with region seeds.
    #[builder(default)]
    pub variable_area: bool,
    /// Use diametral circles instead of lenses for encroachment, which makes
    /// the final mesh truly (conforming) Delaunay.
    #[builder(default)]
    pub conforming_delaunay: bool,
    /// Keep the convex hull: do not eat away unprotected hull triangles.
    #[builder(default)]
    pub convex: bool,
    /// Restrictions on splitting subsegments.
    #[builder(default)]
    pub segment_splitting: SegmentSplitting,
    /// Maximum number of Steiner points; `None` means unlimited.
    #[builder(default, setter(strip_option))]
    pub steiner_limit: Option<usize>,
    /// Use the adaptive exact-arithmetic fallback in the predicates.
    #[builder(default = "true")]
    pub exact_arithmetic: bool,
    /// Steiner point placement strategy for bad triangles.
    #[builder(default)]
    pub steiner_placement: SteinerPlacement,
    /// Allow moving a free vertex of a bad triangle instead of adding a point.
    #[builder(default)]
    pub relocate_free_vertices: bool,
    /// Seed of the point locator's sampler.
    #[builder(default = "DEFAULT_SAMPLE_SEED")]
    pub sample_seed: u64,
    /// Caller-supplied "triangle too large" predicate.
    #[serde(skip)]
    #[builder(default, setter(strip_option))]
    pub user_test: Option<TriangleTest>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            quality: false,
            min_angle: DEFAULT_MIN_ANGLE,
            max_angle: 0.0,
            max_area: None,
            variable_area: false,
            conforming_delaunay: false,
            convex: false,
            segment_splitting: SegmentSplitting::Normal,
            steiner_limit: None,
            exact_arithmetic: true,
            steiner_placement: SteinerPlacement::Circumcenter,
            relocate_free_vertices: false,
            sample_seed: DEFAULT_SAMPLE_SEED,
            user_test: None,
        }
    }
}

impl BehaviorBuilder {
    fn validate(&self) -> Result<(), BehaviorError> {
        if let Some(angle) = self.min_angle {
            check_min_angle(angle)?;
        }
        if let Some(angle) = self.max_angle {
            check_max_angle(angle)?;
        }
        if let Some(Some(area)) = self.max_area {
            check_max_area(area)?;
        }
        Ok(())
    }
}

fn check_min_angle(angle: f64) -> Result<(), BehaviorError> {
    if (0.0..=60.0).contains(&angle) {
        Ok(())
    } else {
        Err(BehaviorError::MinAngleOutOfRange { angle })
    }
}

fn check_max_angle(angle: f64) -> Result<(), BehaviorError> {
    if angle == 0.0 || (60.0..=180.0).contains(&angle) {
        Ok(())
    } else {
        Err(BehaviorError::MaxAngleOutOfRange { angle })
    }
}

fn check_max_area(area: f64) -> Result<(), BehaviorError> {
    if area > 0.0 {
        Ok(())
    } else {
        Err(BehaviorError::NonPositiveMaxArea { area })
    }
}

impl Behavior {
    /// Re-checks the invariants enforced by the builder.
    ///
    /// Useful for behaviors assembled by hand or deserialized.
    ///
    /// # Errors
    ///
    /// Returns the first [`BehaviorError`] found.
    pub fn validate(&self) -> Result<(), BehaviorError> {
        check_min_angle(self.min_angle)?;
        check_max_angle(self.max_angle)?;
        if let Some(area) = self.max_area {
            check_max_area(area)?;
        }
        Ok(())
    }

    /// Returns `true` if any criterion can make a triangle "bad".
    #[must_use]
    pub fn has_triangle_criteria(&self) -> bool {
        self.min_angle > 0.0
            || self.max_angle > 0.0
            || self.max_area.is_some()
            || self.variable_area
            || self.user_test.is_some()
    }

    /// Returns `true` if an area-type criterion is active.
    #[must_use]
    pub fn has_area_criteria(&self) -> bool {
        self.max_area.is_some() || self.variable_area || self.user_test.is_some()
    }

    pub(crate) fn bounds(&self) -> QualityBounds {
        QualityBounds::from_angles(self.min_angle, self.max_angle)
    }
}

/// Quantities derived from the angle bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct QualityBounds {
    /// `cos²(min_angle)`: a triangle whose smallest angle has a larger squared
    /// cosine is bad.
    pub(crate) good_angle: f64,
    /// `cos(max_angle)`: a triangle whose largest angle has a smaller cosine is bad.
    pub(crate) max_good_angle: f64,
    /// Off-center offset factor derived from the minimum angle.
    pub(crate) off_constant: f64,
}

impl QualityBounds {
    pub(crate) fn from_angles(min_angle: f64, max_angle: f64) -> Self {
        let cos_min = min_angle.to_radians().cos();
        let good_angle = cos_min * cos_min;
        let off_constant = if good_angle >= 1.0 {
            0.0
        } else {
            0.475 * ((1.0 + good_angle) / (1.0 - good_angle)).sqrt()
        };
        Self {
            good_angle,
            max_good_angle: max_angle.to_radians().cos(),
            off_constant,
        }
    }

    /// `(2·good_angle − 1)²`: the squared cosine of the diametral lens angle.
    pub(crate) fn lens_bound(&self) -> f64 {
        let c = 2.0 * self.good_angle - 1.0;
        c * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let built = BehaviorBuilder::default().build().unwrap();
        assert!(!built.quality);
        assert_relative_eq!(built.min_angle, DEFAULT_MIN_ANGLE);
        assert!(built.exact_arithmetic);
        assert!(built.validate().is_ok());
        assert!(Behavior::default().validate().is_ok());
    }

    #[test]
    fn builder_rejects_out_of_range_angles() {
        assert!(matches!(
            BehaviorBuilder::default().min_angle(-1.0).build(),
            Err(BehaviorError::MinAngleOutOfRange { .. })
        ));
        assert!(matches!(
            BehaviorBuilder::default().max_angle(45.0).build(),
            Err(BehaviorError::MaxAngleOutOfRange { .. })
        ));
        assert!(BehaviorBuilder::default().max_angle(120.0).build().is_ok());
        assert!(matches!(
            BehaviorBuilder::default().max_area(0.0).build(),
            Err(BehaviorError::NonPositiveMaxArea { .. })
        ));
    }

    #[test]
    fn derived_bounds() {
        let bounds = QualityBounds::from_angles(20.0, 0.0);
        let cos20 = 20.0_f64.to_radians().cos();
        assert_relative_eq!(bounds.good_angle, cos20 * cos20);
        // The lens opening at 20° is 140°, whose cosine is -cos(40°).
        let cos40 = 40.0_f64.to_radians().cos();
        assert_relative_eq!(bounds.lens_bound(), cos40 * cos40, epsilon = 1e-12);
        assert!(bounds.off_constant > 0.0);
        assert_relative_eq!(QualityBounds::from_angles(0.0, 0.0).off_constant, 0.0);
    }

    #[test]
    fn behavior_serializes_without_user_test() {
        let behavior = BehaviorBuilder::default()
            .quality(true)
            .steiner_limit(50)
            .user_test(TriangleTest::new(|_, _, _, area| area > 1.0))
            .build()
            .unwrap();
        let json = serde_json::to_string(&behavior).unwrap();
        let back: Behavior = serde_json::from_str(&json).unwrap();
        assert!(back.quality);
        assert_eq!(back.steiner_limit, Some(50));
        assert!(back.user_test.is_none());
        assert!(behavior.user_test.is_some());
    }

    #[test]
    fn user_test_is_called() {
        let test = TriangleTest::new(|_, _, _, area| area > 0.25);
        let o = Point::new(0.0, 0.0);
        assert!(test.is_unsuitable(&o, &o, &o, 0.5));
        assert!(!test.is_unsuitable(&o, &o, &o, 0.1));
        assert_eq!(format!("{test:?}"), "TriangleTest(..)");
    }
}

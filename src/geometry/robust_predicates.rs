//! Adaptive-precision orientation and in-circle predicates, and circumcenters.
//!
//! Each predicate first evaluates its determinant in ordinary floating point and
//! compares the magnitude against a conservative error bound derived from the
//! operand magnitudes. Only when the estimate is too close to zero does it
//! continue with progressively more exact stages built from the expansion
//! arithmetic in [`exact`](super::exact). The sign of the returned value is
//! therefore always correct, while the common case costs a handful of flops.
//!
//! # Algorithm
//!
//! - `orient2d`: stages A (floating point), B (exact product of rounded
//!   differences), C (first-order tail correction) and D (full exact expansion).
//! - `incircle`: stages A, B and C as above, then a fully exact expansion of the
//!   4x4 lifted determinant on the raw coordinates.
//!
//! The machine epsilon, splitter and error-bound constants are derived once when
//! a [`RobustPredicates`] value is constructed. No global state is involved.
//!
//! # References
//!
//! - Shewchuk, J. R. "Adaptive Precision Floating-Point Arithmetic and Fast Robust
//!   Geometric Predicates." *Discrete & Computational Geometry* 18 (1997): 305-363.
//! - Üngör, A. "Off-centers: A new type of Steiner points for computing size-optimal
//!   quality-guaranteed Delaunay triangulations." LATIN 2004.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use super::exact::{
    cross_product, estimate, fast_expansion_sum_zeroelim, most_significant,
    scale_expansion_zeroelim, two_diff_tail, two_two_diff, two_product,
};
use super::point::Point;
use super::predicates::{InCircle, Orientation};

/// Circumcenter (or off-center) of a triangle together with its position in the
/// triangle's local frame.
///
/// `xi` is measured along `org → dest` and `eta` along `org → apex`, so the point
/// equals `org + xi·(dest − org) + eta·(apex − org)`. These are the weights used
/// to interpolate vertex attributes at a new Steiner point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circumcenter {
    /// The computed location.
    pub point: Point,
    /// Coordinate along the `org → dest` axis.
    pub xi: f64,
    /// Coordinate along the `org → apex` axis.
    pub eta: f64,
}

/// Orientation and in-circle predicates with adaptive exact-arithmetic fallback.
///
/// Construct one per mesh; the error bounds are computed from the machine
/// epsilon at construction time.
///
/// # Examples
///
/// ```rust
/// use delaunay_mesh::geometry::point::Point;
/// use delaunay_mesh::geometry::predicates::Orientation;
/// use delaunay_mesh::geometry::robust_predicates::RobustPredicates;
///
/// let predicates = RobustPredicates::new(true);
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(1.0, 0.0);
/// let c = Point::new(0.0, 1.0);
/// assert_eq!(predicates.orientation(&a, &b, &c), Orientation::POSITIVE);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobustPredicates {
    epsilon: f64,
    splitter: f64,
    result_err_bound: f64,
    ccw_err_bound_a: f64,
    ccw_err_bound_b: f64,
    ccw_err_bound_c: f64,
    icc_err_bound_a: f64,
    icc_err_bound_b: f64,
    icc_err_bound_c: f64,
    exact: bool,
}

impl Default for RobustPredicates {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RobustPredicates {
    /// Builds the predicate set.
    ///
    /// When `exact` is `false` the adaptive stages are skipped and the
    /// predicates return plain floating-point determinants.
    #[must_use]
    pub fn new(exact: bool) -> Self {
        let mut every_other = true;
        let mut epsilon = 1.0_f64;
        let mut splitter = 1.0_f64;
        let mut check = 1.0_f64;
        // Halve epsilon until 1 + epsilon rounds to 1 (or stops changing).
        loop {
            let last_check = check;
            epsilon *= 0.5;
            if every_other {
                splitter *= 2.0;
            }
            every_other = !every_other;
            check = 1.0 + epsilon;
            if check == 1.0 || check == last_check {
                break;
            }
        }
        splitter += 1.0;

        Self {
            epsilon,
            splitter,
            result_err_bound: (3.0 + 8.0 * epsilon) * epsilon,
            ccw_err_bound_a: (3.0 + 16.0 * epsilon) * epsilon,
            ccw_err_bound_b: (2.0 + 12.0 * epsilon) * epsilon,
            ccw_err_bound_c: (9.0 + 64.0 * epsilon) * epsilon * epsilon,
            icc_err_bound_a: (10.0 + 96.0 * epsilon) * epsilon,
            icc_err_bound_b: (4.0 + 48.0 * epsilon) * epsilon,
            icc_err_bound_c: (44.0 + 576.0 * epsilon) * epsilon * epsilon,
            exact,
        }
    }

    /// Machine epsilon (half an ulp of 1.0) detected at construction.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Whether the exact-arithmetic fallback is enabled.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.exact
    }

    /// Twice the signed area of `(pa, pb, pc)`.
    ///
    /// Positive when the points are in counterclockwise order, negative when
    /// clockwise, and exactly zero when collinear (with exact arithmetic on).
    #[must_use]
    pub fn orient2d(&self, pa: &Point, pb: &Point, pc: &Point) -> f64 {
        let det_left = (pa.x - pc.x) * (pb.y - pc.y);
        let det_right = (pa.y - pc.y) * (pb.x - pc.x);
        let det = det_left - det_right;
        if !self.exact {
            return det;
        }

        let det_sum = if det_left > 0.0 {
            if det_right <= 0.0 {
                return det;
            }
            det_left + det_right
        } else if det_left < 0.0 {
            if det_right >= 0.0 {
                return det;
            }
            -det_left - det_right
        } else {
            return det;
        };

        let err_bound = self.ccw_err_bound_a * det_sum;
        if det >= err_bound || -det >= err_bound {
            return det;
        }
        self.orient2d_adapt(pa, pb, pc, det_sum)
    }

    fn orient2d_adapt(&self, pa: &Point, pb: &Point, pc: &Point, det_sum: f64) -> f64 {
        let s = self.splitter;
        let acx = pa.x - pc.x;
        let bcx = pb.x - pc.x;
        let acy = pa.y - pc.y;
        let bcy = pb.y - pc.y;

        let b = cross_product(acx, bcy, acy, bcx, s);
        let mut det = estimate(&b);
        let err_bound = self.ccw_err_bound_b * det_sum;
        if det >= err_bound || -det >= err_bound {
            return det;
        }

        let acx_tail = two_diff_tail(pa.x, pc.x, acx);
        let bcx_tail = two_diff_tail(pb.x, pc.x, bcx);
        let acy_tail = two_diff_tail(pa.y, pc.y, acy);
        let bcy_tail = two_diff_tail(pb.y, pc.y, bcy);
        if acx_tail == 0.0 && acy_tail == 0.0 && bcx_tail == 0.0 && bcy_tail == 0.0 {
            return det;
        }

        let err_bound = self.ccw_err_bound_c * det_sum + self.result_err_bound * det.abs();
        det += (acx * bcy_tail + bcy * acx_tail) - (acy * bcx_tail + bcx * acy_tail);
        if det >= err_bound || -det >= err_bound {
            return det;
        }

        let mut c1 = Vec::with_capacity(8);
        let mut c2 = Vec::with_capacity(12);
        let mut d = Vec::with_capacity(16);

        let u = cross_product(acx_tail, bcy, acy_tail, bcx, s);
        fast_expansion_sum_zeroelim(&b, &u, &mut c1);
        let u = cross_product(acx, bcy_tail, acy, bcx_tail, s);
        fast_expansion_sum_zeroelim(&c1, &u, &mut c2);
        let u = cross_product(acx_tail, bcy_tail, acy_tail, bcx_tail, s);
        fast_expansion_sum_zeroelim(&c2, &u, &mut d);

        most_significant(&d)
    }

    /// Positive if `pd` lies inside the circle through `pa`, `pb`, `pc`
    /// (which must be in counterclockwise order), negative if outside and zero
    /// if the four points are cocircular.
    #[must_use]
    pub fn incircle(&self, pa: &Point, pb: &Point, pc: &Point, pd: &Point) -> f64 {
        let adx = pa.x - pd.x;
        let bdx = pb.x - pd.x;
        let cdx = pc.x - pd.x;
        let ady = pa.y - pd.y;
        let bdy = pb.y - pd.y;
        let cdy = pc.y - pd.y;

        let bdxcdy = bdx * cdy;
        let cdxbdy = cdx * bdy;
        let alift = adx * adx + ady * ady;

        let cdxady = cdx * ady;
        let adxcdy = adx * cdy;
        let blift = bdx * bdx + bdy * bdy;

        let adxbdy = adx * bdy;
        let bdxady = bdx * ady;
        let clift = cdx * cdx + cdy * cdy;

        let det = alift * (bdxcdy - cdxbdy) + blift * (cdxady - adxcdy) + clift * (adxbdy - bdxady);
        if !self.exact {
            return det;
        }

        let permanent = (bdxcdy.abs() + cdxbdy.abs()) * alift
            + (cdxady.abs() + adxcdy.abs()) * blift
            + (adxbdy.abs() + bdxady.abs()) * clift;
        let err_bound = self.icc_err_bound_a * permanent;
        if det > err_bound || -det > err_bound {
            return det;
        }
        self.incircle_adapt(pa, pb, pc, pd, permanent)
    }

    fn incircle_adapt(&self, pa: &Point, pb: &Point, pc: &Point, pd: &Point, permanent: f64) -> f64 {
        let s = self.splitter;
        let adx = pa.x - pd.x;
        let bdx = pb.x - pd.x;
        let cdx = pc.x - pd.x;
        let ady = pa.y - pd.y;
        let bdy = pb.y - pd.y;
        let cdy = pc.y - pd.y;

        let bc = cross_product(bdx, cdy, cdx, bdy, s);
        let ca = cross_product(cdx, ady, adx, cdy, s);
        let ab = cross_product(adx, bdy, bdx, ady, s);

        let adet = self.lifted_term(&bc, adx, ady);
        let bdet = self.lifted_term(&ca, bdx, bdy);
        let cdet = self.lifted_term(&ab, cdx, cdy);

        let mut abdet = Vec::with_capacity(64);
        let mut fin = Vec::with_capacity(96);
        fast_expansion_sum_zeroelim(&adet, &bdet, &mut abdet);
        fast_expansion_sum_zeroelim(&abdet, &cdet, &mut fin);

        let mut det = estimate(&fin);
        let err_bound = self.icc_err_bound_b * permanent;
        if det >= err_bound || -det >= err_bound {
            return det;
        }

        let adx_tail = two_diff_tail(pa.x, pd.x, adx);
        let ady_tail = two_diff_tail(pa.y, pd.y, ady);
        let bdx_tail = two_diff_tail(pb.x, pd.x, bdx);
        let bdy_tail = two_diff_tail(pb.y, pd.y, bdy);
        let cdx_tail = two_diff_tail(pc.x, pd.x, cdx);
        let cdy_tail = two_diff_tail(pc.y, pd.y, cdy);
        if adx_tail == 0.0
            && bdx_tail == 0.0
            && cdx_tail == 0.0
            && ady_tail == 0.0
            && bdy_tail == 0.0
            && cdy_tail == 0.0
        {
            return det;
        }

        let err_bound = self.icc_err_bound_c * permanent + self.result_err_bound * det.abs();
        det += ((adx * adx + ady * ady)
            * ((bdx * cdy_tail + cdy * bdx_tail) - (bdy * cdx_tail + cdx * bdy_tail))
            + 2.0 * (adx * adx_tail + ady * ady_tail) * (bdx * cdy - bdy * cdx))
            + ((bdx * bdx + bdy * bdy)
                * ((cdx * ady_tail + ady * cdx_tail) - (cdy * adx_tail + adx * cdy_tail))
                + 2.0 * (bdx * bdx_tail + bdy * bdy_tail) * (cdx * ady - cdy * adx))
            + ((cdx * cdx + cdy * cdy)
                * ((adx * bdy_tail + bdy * adx_tail) - (ady * bdx_tail + bdx * ady_tail))
                + 2.0 * (cdx * cdx_tail + cdy * cdy_tail) * (adx * bdy - ady * bdx));
        if det >= err_bound || -det >= err_bound {
            return det;
        }

        self.incircle_exact(pa, pb, pc, pd)
    }

    /// `(dx² + dy²) · e` for a four-component expansion `e`.
    fn lifted_term(&self, e: &[f64; 4], dx: f64, dy: f64) -> Vec<f64> {
        let s = self.splitter;
        let mut xe = Vec::with_capacity(8);
        let mut xxe = Vec::with_capacity(16);
        let mut ye = Vec::with_capacity(8);
        let mut yye = Vec::with_capacity(16);
        let mut out = Vec::with_capacity(32);
        scale_expansion_zeroelim(e, dx, &mut xe, s);
        scale_expansion_zeroelim(&xe, dx, &mut xxe, s);
        scale_expansion_zeroelim(e, dy, &mut ye, s);
        scale_expansion_zeroelim(&ye, dy, &mut yye, s);
        fast_expansion_sum_zeroelim(&xxe, &yye, &mut out);
        out
    }

    /// Exact in-circle determinant evaluated on the raw coordinates.
    fn incircle_exact(&self, pa: &Point, pb: &Point, pc: &Point, pd: &Point) -> f64 {
        let s = self.splitter;
        let cross = |p: &Point, q: &Point| {
            let (l1, l0) = two_product(p.x, q.y, s);
            let (r1, r0) = two_product(q.x, p.y, s);
            two_two_diff(l1, l0, r1, r0)
        };

        let ab = cross(pa, pb);
        let bc = cross(pb, pc);
        let cd = cross(pc, pd);
        let da = cross(pd, pa);
        let mut ac = cross(pa, pc);
        let mut bd = cross(pb, pd);

        let mut temp = Vec::with_capacity(8);
        let mut cda = Vec::with_capacity(12);
        let mut dab = Vec::with_capacity(12);
        let mut abc = Vec::with_capacity(12);
        let mut bcd = Vec::with_capacity(12);

        fast_expansion_sum_zeroelim(&cd, &da, &mut temp);
        fast_expansion_sum_zeroelim(&temp, &ac, &mut cda);
        fast_expansion_sum_zeroelim(&da, &ab, &mut temp);
        fast_expansion_sum_zeroelim(&temp, &bd, &mut dab);
        for i in 0..4 {
            bd[i] = -bd[i];
            ac[i] = -ac[i];
        }
        fast_expansion_sum_zeroelim(&ab, &bc, &mut temp);
        fast_expansion_sum_zeroelim(&temp, &ac, &mut abc);
        fast_expansion_sum_zeroelim(&bc, &cd, &mut temp);
        fast_expansion_sum_zeroelim(&temp, &bd, &mut bcd);

        let adet = self.exact_lift(&bcd, pa, 1.0);
        let bdet = self.exact_lift(&cda, pb, -1.0);
        let cdet = self.exact_lift(&dab, pc, 1.0);
        let ddet = self.exact_lift(&abc, pd, -1.0);

        let mut abdet = Vec::with_capacity(adet.len() + bdet.len());
        let mut cddet = Vec::with_capacity(cdet.len() + ddet.len());
        let mut deter = Vec::with_capacity(abdet.capacity() + cddet.capacity());
        fast_expansion_sum_zeroelim(&adet, &bdet, &mut abdet);
        fast_expansion_sum_zeroelim(&cdet, &ddet, &mut cddet);
        fast_expansion_sum_zeroelim(&abdet, &cddet, &mut deter);

        most_significant(&deter)
    }

    /// `sign · (p.x² + p.y²) · e` computed exactly.
    fn exact_lift(&self, e: &[f64], p: &Point, sign: f64) -> Vec<f64> {
        let s = self.splitter;
        let mut x24 = Vec::with_capacity(e.len() * 2);
        let mut x48 = Vec::with_capacity(e.len() * 4);
        let mut y24 = Vec::with_capacity(e.len() * 2);
        let mut y48 = Vec::with_capacity(e.len() * 4);
        let mut out = Vec::with_capacity(e.len() * 8);
        scale_expansion_zeroelim(e, p.x, &mut x24, s);
        scale_expansion_zeroelim(&x24, sign * p.x, &mut x48, s);
        scale_expansion_zeroelim(e, p.y, &mut y24, s);
        scale_expansion_zeroelim(&y24, sign * p.y, &mut y48, s);
        fast_expansion_sum_zeroelim(&x48, &y48, &mut out);
        out
    }

    /// Classified orientation of `(a, b, c)`.
    #[must_use]
    pub fn orientation(&self, a: &Point, b: &Point, c: &Point) -> Orientation {
        Orientation::from_determinant(self.orient2d(a, b, c))
    }

    /// Classified position of `d` relative to the circumcircle of `(a, b, c)`.
    #[must_use]
    pub fn in_circle(&self, a: &Point, b: &Point, c: &Point, d: &Point) -> InCircle {
        InCircle::from_determinant(self.incircle(a, b, c, d))
    }

    /// Circumcenter of the triangle `(org, dest, apex)`, or its off-center.
    ///
    /// When `off_constant > 0` and the off-center along the bisector of the
    /// shortest edge lies closer to that edge than the circumcenter does, the
    /// off-center is returned instead. This keeps Steiner points from landing
    /// far away from skinny triangles and producing needles next to them.
    ///
    /// The triangle must not be degenerate; with exact arithmetic enabled the
    /// denominator uses the robust orientation so it is never zero for a valid
    /// (positively oriented) triangle.
    #[must_use]
    pub fn circumcenter(&self, org: &Point, dest: &Point, apex: &Point, off_constant: f64) -> Circumcenter {
        let xdo = dest.x - org.x;
        let ydo = dest.y - org.y;
        let xao = apex.x - org.x;
        let yao = apex.y - org.y;
        let dodist = xdo * xdo + ydo * ydo;
        let aodist = xao * xao + yao * yao;
        let dadist = (dest.x - apex.x) * (dest.x - apex.x) + (dest.y - apex.y) * (dest.y - apex.y);

        let denominator = if self.exact {
            0.5 / self.orient2d(dest, apex, org)
        } else {
            0.5 / (xdo * yao - xao * ydo)
        };

        let mut dx = (yao * dodist - ydo * aodist) * denominator;
        let mut dy = (xdo * aodist - xao * dodist) * denominator;

        if off_constant > 0.0 {
            if dodist < aodist && dodist < dadist {
                // Shortest edge is org-dest.
                let dxoff = 0.5 * xdo - off_constant * ydo;
                let dyoff = 0.5 * ydo + off_constant * xdo;
                if dxoff * dxoff + dyoff * dyoff < dx * dx + dy * dy {
                    dx = dxoff;
                    dy = dyoff;
                }
            } else if aodist < dadist {
                // Shortest edge is org-apex.
                let dxoff = 0.5 * xao + off_constant * yao;
                let dyoff = 0.5 * yao - off_constant * xao;
                if dxoff * dxoff + dyoff * dyoff < dx * dx + dy * dy {
                    dx = dxoff;
                    dy = dyoff;
                }
            } else {
                // Shortest edge is dest-apex; measure from dest.
                let dxoff = 0.5 * (apex.x - dest.x) - off_constant * (apex.y - dest.y);
                let dyoff = 0.5 * (apex.y - dest.y) + off_constant * (apex.x - dest.x);
                if dxoff * dxoff + dyoff * dyoff < (dx - xdo) * (dx - xdo) + (dy - ydo) * (dy - ydo) {
                    dx = xdo + dxoff;
                    dy = ydo + dyoff;
                }
            }
        }

        Circumcenter {
            point: Point::new(org.x + dx, org.y + dy),
            xi: (yao * dx - xao * dy) * (2.0 * denominator),
            eta: (xdo * dy - ydo * dx) * (2.0 * denominator),
        }
    }
}

//! Error-free floating-point transformations and expansion arithmetic.
//!
//! An *expansion* is a sequence of `f64` components, ordered by increasing
//! magnitude and mutually non-overlapping, whose exact sum is the represented
//! value. The largest component (the last one) carries the sign of the whole
//! expansion and approximates it to within one ulp.
//!
//! # Algorithm
//!
//! The building blocks (`two_sum`, `two_product`, ...) return the rounded result
//! together with its exact roundoff error. Expansions are combined with
//! `fast_expansion_sum_zeroelim` and `scale_expansion_zeroelim`, which drop zero
//! components so that the expansions stay short in the common case.
//!
//! All routines assume round-to-nearest binary arithmetic without extended
//! precision intermediates, which holds for `f64` on every target Rust supports.
//!
//! # References
//!
//! - Shewchuk, J. R. "Adaptive Precision Floating-Point Arithmetic and Fast Robust
//!   Geometric Predicates." *Discrete & Computational Geometry* 18 (1997): 305-363.

#![forbid(unsafe_code)]

/// Sum `a + b` where `|a| >= |b|`, returned as `(sum, roundoff)`.
#[inline]
#[must_use]
pub fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let bvirt = x - a;
    (x, b - bvirt)
}

/// Sum `a + b`, returned as `(sum, roundoff)`.
#[inline]
#[must_use]
pub fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let bvirt = x - a;
    let avirt = x - bvirt;
    let bround = b - bvirt;
    let around = a - avirt;
    (x, around + bround)
}

/// Roundoff error of the already-computed difference `x = a - b`.
#[inline]
#[must_use]
pub fn two_diff_tail(a: f64, b: f64, x: f64) -> f64 {
    let bvirt = a - x;
    let avirt = x + bvirt;
    let bround = bvirt - b;
    let around = a - avirt;
    around + bround
}

/// Difference `a - b`, returned as `(difference, roundoff)`.
#[inline]
#[must_use]
pub fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let x = a - b;
    (x, two_diff_tail(a, b, x))
}

/// Splits `a` into two non-overlapping halves of at most 26 significant bits.
#[inline]
#[must_use]
pub fn split(a: f64, splitter: f64) -> (f64, f64) {
    let c = splitter * a;
    let abig = c - a;
    let ahi = c - abig;
    (ahi, a - ahi)
}

/// Product `a * b`, returned as `(product, roundoff)`.
#[inline]
#[must_use]
pub fn two_product(a: f64, b: f64, splitter: f64) -> (f64, f64) {
    let (bhi, blo) = split(b, splitter);
    two_product_presplit(a, b, bhi, blo, splitter)
}

/// Product `a * b` where `b` has already been split into `(bhi, blo)`.
#[inline]
#[must_use]
pub fn two_product_presplit(a: f64, b: f64, bhi: f64, blo: f64, splitter: f64) -> (f64, f64) {
    let x = a * b;
    let (ahi, alo) = split(a, splitter);
    let err1 = x - ahi * bhi;
    let err2 = err1 - alo * bhi;
    let err3 = err2 - ahi * blo;
    (x, alo * blo - err3)
}

/// `(a1 + a0) - b` as a three-component expansion `[x0, x1, x2]`.
#[inline]
#[must_use]
pub fn two_one_diff(a1: f64, a0: f64, b: f64) -> [f64; 3] {
    let (i, x0) = two_diff(a0, b);
    let (x2, x1) = two_sum(a1, i);
    [x0, x1, x2]
}

/// `(a1 + a0) - (b1 + b0)` as a four-component expansion `[x0, x1, x2, x3]`.
#[inline]
#[must_use]
pub fn two_two_diff(a1: f64, a0: f64, b1: f64, b0: f64) -> [f64; 4] {
    let [x0, zero, j] = two_one_diff(a1, a0, b0);
    let [x1, x2, x3] = two_one_diff(j, zero, b1);
    [x0, x1, x2, x3]
}

/// Exact `a*d - b*c` as a four-component expansion.
#[inline]
#[must_use]
pub fn cross_product(a: f64, d: f64, b: f64, c: f64, splitter: f64) -> [f64; 4] {
    let (s1, s0) = two_product(a, d, splitter);
    let (t1, t0) = two_product(b, c, splitter);
    two_two_diff(s1, s0, t1, t0)
}

/// Sums two expansions into `h`, eliminating zero components.
///
/// `h` is cleared first. The result always holds at least one component.
pub fn fast_expansion_sum_zeroelim(e: &[f64], f: &[f64], h: &mut Vec<f64>) {
    h.clear();
    let elen = e.len();
    let flen = f.len();
    let at = |s: &[f64], i: usize| s.get(i).copied().unwrap_or(0.0);

    let mut eindex = 0;
    let mut findex = 0;
    let mut enow = at(e, 0);
    let mut fnow = at(f, 0);
    let mut q;
    if (fnow > enow) == (fnow > -enow) {
        q = enow;
        eindex += 1;
        enow = at(e, eindex);
    } else {
        q = fnow;
        findex += 1;
        fnow = at(f, findex);
    }

    if eindex < elen && findex < flen {
        let (qnew, hh) = if (fnow > enow) == (fnow > -enow) {
            let r = fast_two_sum(enow, q);
            eindex += 1;
            enow = at(e, eindex);
            r
        } else {
            let r = fast_two_sum(fnow, q);
            findex += 1;
            fnow = at(f, findex);
            r
        };
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
        while eindex < elen && findex < flen {
            let (qnew, hh) = if (fnow > enow) == (fnow > -enow) {
                let r = two_sum(q, enow);
                eindex += 1;
                enow = at(e, eindex);
                r
            } else {
                let r = two_sum(q, fnow);
                findex += 1;
                fnow = at(f, findex);
                r
            };
            q = qnew;
            if hh != 0.0 {
                h.push(hh);
            }
        }
    }
    while eindex < elen {
        let (qnew, hh) = two_sum(q, enow);
        eindex += 1;
        enow = at(e, eindex);
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
    }
    while findex < flen {
        let (qnew, hh) = two_sum(q, fnow);
        findex += 1;
        fnow = at(f, findex);
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
    }
    if q != 0.0 || h.is_empty() {
        h.push(q);
    }
}

/// Multiplies expansion `e` by the scalar `b` into `h`, eliminating zeros.
pub fn scale_expansion_zeroelim(e: &[f64], b: f64, h: &mut Vec<f64>, splitter: f64) {
    h.clear();
    let (bhi, blo) = split(b, splitter);
    let Some((&first, rest)) = e.split_first() else {
        h.push(0.0);
        return;
    };
    let (mut q, hh) = two_product_presplit(first, b, bhi, blo, splitter);
    if hh != 0.0 {
        h.push(hh);
    }
    for &enow in rest {
        let (product1, product0) = two_product_presplit(enow, b, bhi, blo, splitter);
        let (sum, hh) = two_sum(q, product0);
        if hh != 0.0 {
            h.push(hh);
        }
        let (qnew, hh) = fast_two_sum(product1, sum);
        q = qnew;
        if hh != 0.0 {
            h.push(hh);
        }
    }
    if q != 0.0 || h.is_empty() {
        h.push(q);
    }
}

/// One-word approximation of an expansion's value.
#[inline]
#[must_use]
pub fn estimate(e: &[f64]) -> f64 {
    e.iter().sum()
}

/// The most significant component of an expansion, which carries its sign.
#[inline]
#[must_use]
pub fn most_significant(e: &[f64]) -> f64 {
    e.last().copied().unwrap_or(0.0)
}

//! Mapping of infinite and reversed bounds onto a finite ordered box.

use super::VectorIntegrand;

#[derive(Clone, Copy, Debug, PartialEq)]
enum BoundMap {
    Finite,
    /// `[a, ∞)`: `x = a + t/(1-t)`, `t ∈ [0, 1)`
    Upper(f64),
    /// `(-∞, b]`: `x = b - t/(1-t)`, `t ∈ [0, 1)`
    Lower(f64),
    /// `(-∞, ∞)`: `x = t/(1-t²)`, `t ∈ (-1, 1)`
    Whole,
}

impl BoundMap {
    /// Point and Jacobian for `t`, or `None` at a singular endpoint.
    #[inline]
    fn apply(self, t: f64) -> Option<(f64, f64)> {
        match self {
            BoundMap::Finite => Some((t, 1.0)),
            BoundMap::Upper(a) | BoundMap::Lower(a) => {
                if t >= 1.0 {
                    return None;
                }
                let s = 1.0 - t;
                let dx = t / s;
                let x = if matches!(self, BoundMap::Upper(_)) {
                    a + dx
                } else {
                    a - dx
                };
                Some((x, 1.0 / (s * s)))
            }
            BoundMap::Whole => {
                let s = 1.0 - t * t;
                if s <= 0.0 {
                    return None;
                }
                Some((t / s, (1.0 + t * t) / (s * s)))
            }
        }
    }
}

/// Integrand seen by the rules: infinite bounds mapped to finite ones and
/// descending bounds swapped. Singular endpoints contribute zero.
pub(crate) struct Mapped<'a> {
    inner: &'a dyn VectorIntegrand,
    maps: Vec<BoundMap>,
    identity: bool,
    pub(crate) lower: Vec<f64>,
    pub(crate) upper: Vec<f64>,
    /// `-1` when an odd number of dimensions had descending bounds
    pub(crate) sign: f64,
}

impl<'a> Mapped<'a> {
    pub(crate) fn new(inner: &'a dyn VectorIntegrand, lower: &[f64], upper: &[f64]) -> Self {
        let dim = lower.len();
        let mut maps = Vec::with_capacity(dim);
        let mut lo = Vec::with_capacity(dim);
        let mut hi = Vec::with_capacity(dim);
        let mut sign = 1.0;
        for (&a0, &b0) in lower.iter().zip(upper) {
            let (a, b) = if a0 <= b0 {
                (a0, b0)
            } else {
                sign = -sign;
                (b0, a0)
            };
            let (map, l, h) = match (a.is_infinite(), b.is_infinite()) {
                (true, true) => (BoundMap::Whole, -1.0, 1.0),
                (true, false) => (BoundMap::Lower(b), 0.0, 1.0),
                (false, true) => (BoundMap::Upper(a), 0.0, 1.0),
                (false, false) => (BoundMap::Finite, a, b),
            };
            maps.push(map);
            lo.push(l);
            hi.push(h);
        }
        let identity = maps.iter().all(|m| *m == BoundMap::Finite);
        Self {
            inner,
            maps,
            identity,
            lower: lo,
            upper: hi,
            sign,
        }
    }
}

impl VectorIntegrand for Mapped<'_> {
    fn eval(&self, t: &[f64], fval: &mut [f64]) {
        if self.identity {
            self.inner.eval(t, fval);
            return;
        }
        let mut x = Vec::with_capacity(t.len());
        let mut jac = 1.0;
        for (&ti, map) in t.iter().zip(&self.maps) {
            match map.apply(ti) {
                Some((xi, ji)) => {
                    x.push(xi);
                    jac *= ji;
                }
                None => {
                    fval.iter_mut().for_each(|v| *v = 0.0);
                    return;
                }
            }
        }
        self.inner.eval(&x, fval);
        fval.iter_mut().for_each(|v| *v *= jac);
    }

    fn eval_batch(&self, dim: usize, pts: &[f64], fvals: &mut [f64]) {
        if self.identity {
            // keep user batching when no mapping is needed
            self.inner.eval_batch(dim, pts, fvals);
            return;
        }
        let npts = pts.len() / dim;
        let fdim = fvals.len() / npts.max(1);
        for i in 0..npts {
            self.eval(&pts[i * dim..(i + 1) * dim], &mut fvals[i * fdim..(i + 1) * fdim]);
        }
    }
}

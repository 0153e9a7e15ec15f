//! The one-dimensional integrator surface shared by all scalar rules.

use std::sync::Mutex;

use qs_core::{Scalar, cst};

use crate::error::{IntegError, IntegResult};

/// Outcome of an integration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegStatus {
    Converged,
    /// Subdivision limit hit before the tolerance was met
    MaxSubdivisions,
    /// Evaluation budget exhausted before the tolerance was met
    MaxEvalsReached,
    /// Interval became too narrow to bisect in the working precision
    RoundOff,
}

impl IntegStatus {
    pub fn is_converged(self) -> bool {
        self == IntegStatus::Converged
    }

    /// Numeric status code: `0` on success, non-zero otherwise.
    pub fn code(self) -> i32 {
        match self {
            IntegStatus::Converged => 0,
            IntegStatus::MaxSubdivisions => 1,
            IntegStatus::MaxEvalsReached => 2,
            IntegStatus::RoundOff => 3,
        }
    }
}

/// Value and error estimate of a definite integral.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate<T = f64> {
    pub value: T,
    pub error: T,
    pub status: IntegStatus,
}

/// One accepted interval of the last run.
///
/// For infinite domains `low`/`high` are in the transformed variable
/// `t ∈ (0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Subdivision<T = f64> {
    pub low: T,
    pub high: T,
    pub value: T,
    pub error: T,
}

/// Scalar integration strategy.
///
/// Engines hold a `&dyn Integrator` they do not own, so implementations take
/// `&self` and keep their per-run diagnostics behind interior mutability.
pub trait Integrator<T: Scalar = f64>: Send + Sync {
    /// Integrate `f` from `a` to `b`. Either bound may be infinite.
    fn integ_err(&self, f: &mut dyn FnMut(T) -> T, a: T, b: T) -> IntegResult<Estimate<T>>;

    fn integ(&self, f: &mut dyn FnMut(T) -> T, a: T, b: T) -> IntegResult<T> {
        Ok(self.integ_err(f, a, b)?.value)
    }

    /// Number of intervals the last run ended with.
    fn nsubdivisions(&self) -> usize;

    /// Interval records of the last run, ordered by `low`.
    fn subdivisions(&self) -> Vec<Subdivision<T>>;
}

/// Interval records of the most recent run.
#[derive(Debug)]
pub(crate) struct SubdivisionLog<T> {
    inner: Mutex<Vec<Subdivision<T>>>,
}

impl<T: Scalar> SubdivisionLog<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replace(&self, mut records: Vec<Subdivision<T>>) {
        records.sort_by(|a, b| a.low.partial_cmp(&b.low).unwrap_or(std::cmp::Ordering::Equal));
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = records;
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub(crate) fn snapshot(&self) -> Vec<Subdivision<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Integration domain after ordering the bounds.
///
/// Infinite ranges are mapped onto `t ∈ (0, 1]`:
/// - `[a, ∞)`: `x = a + (1-t)/t`
/// - `(-∞, b]`: `x = b - (1-t)/t`
/// - `(-∞, ∞)`: `x = (1-t)/t`, folding `f(x) + f(-x)`
///
/// each with Jacobian `1/t²`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Domain<T> {
    Finite { a: T, b: T },
    UpperInfinite { a: T },
    LowerInfinite { b: T },
    Whole,
}

impl<T: Scalar> Domain<T> {
    /// Classify `[a, b]`, returning the domain and the sign to apply when
    /// the bounds were given in descending order.
    pub(crate) fn classify(a: T, b: T) -> IntegResult<(Self, T)> {
        if a.is_nan() || b.is_nan() {
            return Err(IntegError::InvalidInput {
                what: "integration bound is NaN".to_string(),
            });
        }
        let (lo, hi, sign) = if a <= b {
            (a, b, T::one())
        } else {
            (b, a, -T::one())
        };
        let domain = match (lo.is_infinite(), hi.is_infinite()) {
            (true, true) if lo == hi => {
                return Err(IntegError::InvalidInput {
                    what: "both bounds at the same infinity".to_string(),
                });
            }
            (true, true) => Domain::Whole,
            (true, false) => Domain::LowerInfinite { b: hi },
            (false, true) => Domain::UpperInfinite { a: lo },
            (false, false) => Domain::Finite { a: lo, b: hi },
        };
        Ok((domain, sign))
    }

    /// Limits of the variable the rule actually sees.
    pub(crate) fn limits(&self) -> (T, T) {
        match *self {
            Domain::Finite { a, b } => (a, b),
            _ => (T::zero(), T::one()),
        }
    }

    /// Evaluate the (possibly transformed) integrand at `t`.
    #[inline]
    pub(crate) fn eval(&self, f: &mut dyn FnMut(T) -> T, t: T) -> T {
        match *self {
            Domain::Finite { .. } => f(t),
            Domain::UpperInfinite { a } => {
                let x = a + (T::one() - t) / t;
                f(x) / (t * t)
            }
            Domain::LowerInfinite { b } => {
                let x = b - (T::one() - t) / t;
                f(x) / (t * t)
            }
            Domain::Whole => {
                let x = (T::one() - t) / t;
                (f(x) + f(-x)) / (t * t)
            }
        }
    }
}

/// Evaluate and reject non-finite integrand values.
#[inline]
pub(crate) fn checked<T: Scalar>(
    domain: &Domain<T>,
    f: &mut dyn FnMut(T) -> T,
    t: T,
) -> IntegResult<T> {
    let v = domain.eval(f, t);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(IntegError::NonFinite {
            x: t.to_f64().unwrap_or(f64::NAN),
            value: v.to_f64().unwrap_or(f64::NAN),
        })
    }
}

/// Smallest interval width, relative to its midpoint, worth bisecting.
#[inline]
pub(crate) fn too_narrow<T: Scalar>(a: T, b: T) -> bool {
    let mid = (a + b) * cst::<T>(0.5);
    mid <= a || mid >= b || (b - a).abs() <= T::epsilon() * cst::<T>(100.0) * mid.abs()
}

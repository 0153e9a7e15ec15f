//! Bracket search for one-dimensional residuals.

use tracing::debug;

/// Symmetric bracket search about the origin.
///
/// Starts from `[-|x|, |x|]` (`[-1, 1]` when `x` is zero) and doubles the
/// half-width until the residual changes sign or the expansion budget is
/// spent.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BracketSearch {
    pub max_expansions: usize,
}

impl Default for BracketSearch {
    fn default() -> Self {
        Self { max_expansions: 10 }
    }
}

/// Returns `(lo, hi)` with `f(lo)·f(hi) ≤ 0`, or `None` if no sign change
/// was found. `lo` is the positive end.
pub fn expand_bracket(
    x: f64,
    f: &mut dyn FnMut(f64) -> f64,
    search: &BracketSearch,
) -> Option<(f64, f64)> {
    let mut lo = x.abs();
    if lo == 0.0 || !lo.is_finite() {
        lo = 1.0;
    }
    let mut hi = -lo;
    let mut f_lo = f(lo);
    let mut f_hi = f(hi);

    for j in 0..search.max_expansions {
        if f_lo * f_hi <= 0.0 {
            break;
        }
        let delta = lo.abs();
        lo += delta;
        hi -= delta;
        f_lo = f(lo);
        f_hi = f(hi);
        debug!(j, lo, hi, f_lo, f_hi, "widening bracket");
    }

    (f_lo * f_hi <= 0.0).then_some((lo, hi))
}

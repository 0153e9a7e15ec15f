//! Occupation numbers.

use qs_core::Real;

/// Cut-off on `|(E-μ)/T|` beyond which the occupations saturate.
pub const DEFAULT_LIMIT: Real = 40.0;

/// Fermi–Dirac occupation `1/(1+exp((E-μ)/T))`.
///
/// Returns exactly `0` above `limit` and exactly `1` below `-limit`, so the
/// exponential never overflows.
#[inline]
pub fn fermi_function(e: Real, mu: Real, t: Real, limit: Real) -> Real {
    let x = (e - mu) / t;
    if x > limit {
        0.0
    } else if x < -limit {
        1.0
    } else {
        1.0 / (1.0 + x.exp())
    }
}

/// Bose–Einstein occupation `1/(exp((E-μ)/T)-1)`.
///
/// Saturates to `0` above `limit` and to `-1` below `-limit`. Near the pole,
/// `|x| < 1e-3`, the Laurent series in `x` replaces the direct form.
#[inline]
pub fn bose_function(e: Real, mu: Real, t: Real, limit: Real) -> Real {
    let x = (e - mu) / t;
    if x > limit {
        0.0
    } else if x < -limit {
        -1.0
    } else if x.abs() < 1e-3 {
        let x2 = x * x;
        let x3 = x2 * x;
        let x5 = x3 * x2;
        let x7 = x5 * x2;
        let x9 = x7 * x2;
        1.0 / x - 0.5 + x / 12.0 - x3 / 720.0 + x5 / 30_240.0 - x7 / 1_209_600.0
            + x9 / 47_900_160.0
    } else {
        1.0 / x.exp_m1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fermi_saturates_exactly() {
        let eps = 1e-9;
        assert_eq!(fermi_function(DEFAULT_LIMIT + eps, 0.0, 1.0, DEFAULT_LIMIT), 0.0);
        assert_eq!(fermi_function(-DEFAULT_LIMIT - eps, 0.0, 1.0, DEFAULT_LIMIT), 1.0);
        // no visible jump across the cut-off
        let inside = fermi_function(DEFAULT_LIMIT - eps, 0.0, 1.0, DEFAULT_LIMIT);
        assert!(inside < 1e-17);
        let inside = fermi_function(-DEFAULT_LIMIT + eps, 0.0, 1.0, DEFAULT_LIMIT);
        assert!((1.0 - inside).abs() < 1e-16);
    }

    #[test]
    fn bose_series_matches_direct_form() {
        for x in [1e-4_f64, -1e-4, 9.9e-4, -9.9e-4] {
            let series = bose_function(x, 0.0, 1.0, DEFAULT_LIMIT);
            let direct = 1.0 / (x.exp() - 1.0);
            assert!(((series - direct) / direct).abs() < 1e-10, "x = {x}");
        }
    }

    #[test]
    fn bose_saturated_branches() {
        assert_eq!(bose_function(50.0, 0.0, 1.0, DEFAULT_LIMIT), 0.0);
        assert_eq!(bose_function(-50.0, 0.0, 1.0, DEFAULT_LIMIT), -1.0);
        // a tighter limit moves the cut-off
        assert_eq!(bose_function(6.0, 0.0, 1.0, 5.0), 0.0);
    }

    #[test]
    fn temperature_scales_the_argument() {
        let a = fermi_function(3.0, 1.0, 2.0, DEFAULT_LIMIT);
        let b = fermi_function(1.0, 0.0, 1.0, DEFAULT_LIMIT);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn fermi_is_a_probability(x in -1e3f64..1e3) {
            let f = fermi_function(x, 0.0, 1.0, DEFAULT_LIMIT);
            prop_assert!(f.is_finite());
            prop_assert!((0.0..=1.0).contains(&f));
        }

        #[test]
        fn fermi_particle_hole_symmetry(x in -39.0f64..39.0) {
            let f = fermi_function(x, 0.0, 1.0, DEFAULT_LIMIT);
            let g = fermi_function(-x, 0.0, 1.0, DEFAULT_LIMIT);
            prop_assert!((f + g - 1.0).abs() < 1e-14);
        }

        #[test]
        fn bose_is_finite_away_from_the_pole(x in prop_oneof![-1e3f64..-1e-8, 1e-8f64..1e3]) {
            let b = bose_function(x, 0.0, 1.0, DEFAULT_LIMIT);
            prop_assert!(b.is_finite());
            // n(x) + n(-x) = -1
            let c = bose_function(-x, 0.0, 1.0, DEFAULT_LIMIT);
            prop_assert!((b + c + 1.0).abs() <= 1e-9 * b.abs().max(1.0));
        }
    }
}

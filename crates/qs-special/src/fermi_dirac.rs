//! Complete Fermi–Dirac integrals
//!
//! `F_j(x) = 1/Γ(j+1) ∫₀^∞ t^j / (exp(t-x) + 1) dt`
//!
//! normalised so that `F_j(x) → eˣ` as `x → -∞` and `dF_j/dx = F_{j-1}`.

use std::f64::consts::PI;

use qs_core::Real;
use qs_inte::{AdaptiveConfig, AdaptiveIntegrator, IntegError, IntegResult, Integrator};
use tracing::warn;

use crate::occupation::{DEFAULT_LIMIT, fermi_function};

/// Below this argument the alternating series converges geometrically.
const SERIES_MAX: Real = -1.0;

/// Above this argument the Sommerfeld expansion is accurate to ~1e-12.
const SOMMERFELD_MIN: Real = 50.0;

/// Sommerfeld coefficients `2(1 - 2^{1-2n}) ζ(2n)` for n = 1..4.
const SOMMERFELD: [Real; 4] = [
    PI * PI / 6.0,
    7.0 * PI * PI * PI * PI / 360.0,
    31.0 * PI * PI * PI * PI * PI * PI / 15_120.0,
    127.0 * PI * PI * PI * PI * PI * PI * PI * PI / 604_800.0,
];

/// `F_{1/2}(x)`
pub fn fermi_dirac_half(x: Real) -> IntegResult<Real> {
    fermi_dirac(0.5, x)
}

/// `F_{3/2}(x)`
pub fn fermi_dirac_3half(x: Real) -> IntegResult<Real> {
    fermi_dirac(1.5, x)
}

/// `F_j(x)` for `j > -1`.
pub fn fermi_dirac(j: Real, x: Real) -> IntegResult<Real> {
    if j.is_nan() || j <= -1.0 {
        return Err(IntegError::InvalidInput {
            what: format!("Fermi-Dirac order must exceed -1, got {j}"),
        });
    }
    if x.is_nan() {
        return Err(IntegError::InvalidInput {
            what: "Fermi-Dirac argument is NaN".into(),
        });
    }
    if x == Real::NEG_INFINITY {
        return Ok(0.0);
    }
    if x <= SERIES_MAX {
        Ok(series(j, x))
    } else if x < SOMMERFELD_MIN {
        quadrature(j, x)
    } else {
        Ok(sommerfeld(j, x))
    }
}

/// `Σ (-1)^{k+1} e^{kx} / k^{j+1}`
fn series(j: Real, x: Real) -> Real {
    let ex = x.exp();
    let mut term = ex;
    let mut sum = 0.0;
    for k in 1..=200 {
        let kf = k as Real;
        let t = term / kf.powf(j + 1.0);
        sum += if k % 2 == 1 { t } else { -t };
        if t <= 1e-17 * sum.abs() {
            break;
        }
        term *= ex;
    }
    sum
}

/// Quadrature in `s = √t`, which removes the `t^j` branch point at zero.
fn quadrature(j: Real, x: Real) -> IntegResult<Real> {
    let integrator = AdaptiveIntegrator::<Real>::new(AdaptiveConfig {
        tol_abs: 0.0,
        tol_rel: 1e-12,
        max_subdivisions: 500,
    });
    let upper = (x.max(0.0) + DEFAULT_LIMIT + 10.0).sqrt();
    let power = 2.0 * j + 1.0;
    let est = integrator.integ_err(
        &mut |s: Real| {
            if s <= 0.0 {
                return 0.0;
            }
            2.0 * s.powf(power) * fermi_function(s * s, x, 1.0, DEFAULT_LIMIT)
        },
        0.0,
        upper,
    )?;
    if !est.status.is_converged() {
        warn!(j, x, status = ?est.status, "Fermi-Dirac quadrature did not converge");
    }
    Ok(est.value / libm::tgamma(j + 1.0))
}

/// `x^{j+1}/Γ(j+2) · [1 + Σ c_n (j+1)j…(j+2-2n) / x^{2n}]`
fn sommerfeld(j: Real, x: Real) -> Real {
    let mut sum = 1.0;
    let mut falling = 1.0;
    let mut xpow = 1.0;
    let inv_x2 = 1.0 / (x * x);
    for (n, c) in SOMMERFELD.iter().enumerate() {
        let k = 2 * n;
        falling *= (j + 1.0 - k as Real) * (j - k as Real);
        xpow *= inv_x2;
        sum += c * falling * xpow;
    }
    x.powf(j + 1.0) / libm::tgamma(j + 2.0) * sum
}

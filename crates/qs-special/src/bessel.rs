//! Modified Bessel functions of the second kind.

use qs_core::Real;
use qs_inte::{AdaptiveConfig, AdaptiveIntegrator, IntegError, IntegResult, Integrator};
use tracing::warn;

/// `K_ν(x)·eˣ` for `x > 0`, from
/// `∫₀^∞ exp(-x(cosh t - 1)) cosh(νt) dt`.
pub fn bessel_k_scaled(nu: Real, x: Real) -> IntegResult<Real> {
    if !x.is_finite() || x <= 0.0 {
        return Err(IntegError::InvalidInput {
            what: format!("Bessel K argument must be positive and finite, got {x}"),
        });
    }
    let nu = nu.abs();
    let integrator = AdaptiveIntegrator::<Real>::new(AdaptiveConfig {
        tol_abs: 0.0,
        tol_rel: 1e-12,
        max_subdivisions: 500,
    });
    let est = integrator.integ_err(
        &mut |t: Real| {
            // cosh(νt) split so that neither factor overflows before the product decays
            let decay = -x * (t.cosh() - 1.0) + nu * t;
            let v = decay.exp() * 0.5 * (1.0 + (-2.0 * nu * t).exp());
            if v.is_finite() { v } else { 0.0 }
        },
        0.0,
        Real::INFINITY,
    )?;
    if !est.status.is_converged() {
        warn!(nu, x, status = ?est.status, "Bessel K quadrature did not converge");
    }
    Ok(est.value)
}

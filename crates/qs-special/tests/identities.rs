use approx::assert_relative_eq;
use proptest::prelude::*;
use qs_special::{
    DEFAULT_LIMIT, bessel_k_scaled, fermi_dirac, fermi_dirac_3half, fermi_dirac_half,
    fermi_function,
};

#[test]
fn derivative_lowers_the_order() {
    // dF_{3/2}/dx = F_{1/2} in every branch
    for x in [-4.0_f64, -0.5, 2.0, 25.0, 75.0] {
        let h = 1e-4 * (1.0f64).max(x.abs());
        let d = (fermi_dirac_3half(x + h).unwrap() - fermi_dirac_3half(x - h).unwrap()) / (2.0 * h);
        assert_relative_eq!(d, fermi_dirac_half(x).unwrap(), max_relative = 1e-6);
    }
}

#[test]
fn nondegenerate_limit_is_boltzmann() {
    for x in [-20.0_f64, -40.0, -300.0] {
        assert_relative_eq!(fermi_dirac_half(x).unwrap(), x.exp(), max_relative = 1e-8);
    }
}

#[test]
fn degenerate_leading_term() {
    // F_{1/2}(x) ≈ x^{3/2}/Γ(5/2) = 4x^{3/2}/(3√π)
    let x: f64 = 1e4;
    let lead = 4.0 * x.powf(1.5) / (3.0 * std::f64::consts::PI.sqrt());
    assert_relative_eq!(fermi_dirac_half(x).unwrap(), lead, max_relative = 1e-7);
}

#[test]
fn quadrature_of_occupation_matches_order_zero() {
    // F_0(x) = ∫ f(t) dt with f the occupation function
    let x: f64 = 3.0;
    let mut sum = 0.0;
    let n = 200_000;
    let upper = x + DEFAULT_LIMIT;
    let h = upper / n as f64;
    for i in 0..n {
        let t = (i as f64 + 0.5) * h;
        sum += fermi_function(t, x, 1.0, DEFAULT_LIMIT) * h;
    }
    assert_relative_eq!(fermi_dirac(0.0, x).unwrap(), sum, max_relative = 1e-8);
}

#[test]
fn bessel_large_argument_asymptotics() {
    // K_ν(x)eˣ ≈ √(π/2x) (1 + (4ν²-1)/(8x))
    let x: f64 = 400.0;
    let nu: f64 = 2.0;
    let mu = 4.0 * nu * nu;
    let approx = (std::f64::consts::PI / (2.0 * x)).sqrt()
        * (1.0 + (mu - 1.0) / (8.0 * x) + (mu - 1.0) * (mu - 9.0) / (2.0 * (8.0 * x).powi(2)));
    assert_relative_eq!(bessel_k_scaled(nu, x).unwrap(), approx, max_relative = 1e-6);
}

proptest! {
    #[test]
    fn fermi_dirac_is_positive_and_increasing(x in -30.0f64..60.0) {
        let a = fermi_dirac_half(x).unwrap();
        let b = fermi_dirac_half(x + 0.5).unwrap();
        prop_assert!(a > 0.0);
        prop_assert!(b > a);
    }
}

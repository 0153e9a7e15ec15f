use approx::assert_relative_eq;
use proptest::prelude::*;
use qs_root::{
    BracketingSolver, BrentSolver, Convergence, NewtonSolver, RootError, RootSolver,
};

fn solvers() -> Vec<Box<dyn RootSolver>> {
    vec![Box::new(NewtonSolver::default()), Box::new(BrentSolver::default())]
}

#[test]
fn both_solvers_find_a_logarithmic_root() {
    for solver in solvers() {
        let mut x = 1.0;
        let c = solver
            .solve(&mut x, &mut |x: f64| x.exp() - 20.0, true)
            .unwrap();
        assert!(c.is_converged());
        assert_relative_eq!(x, 20f64.ln(), max_relative = 1e-9);
    }
}

#[test]
fn ratio_residual_like_density_inversion() {
    // n(x)/n_target - 1 with n growing exponentially
    let target = 3.5e-4;
    let mut f = |x: f64| (x.exp() * 1e-3) / target - 1.0;
    let mut x = -2.0;
    let c = NewtonSolver::default().solve(&mut x, &mut f, true).unwrap();
    assert!(c.is_converged());
    assert_relative_eq!(x, (target / 1e-3f64).ln(), epsilon = 1e-9);
}

#[test]
fn non_finite_start_is_reported() {
    let mut x = -1.0;
    let err = NewtonSolver::default()
        .solve(&mut x, &mut |x: f64| x.sqrt() - 1.0, true)
        .unwrap_err();
    assert!(matches!(err, RootError::NonFinite { .. }));

    let mut x = -1.0;
    let c = NewtonSolver::default()
        .solve(&mut x, &mut |x: f64| x.sqrt() - 1.0, false)
        .unwrap();
    assert!(matches!(c, Convergence::Failed { .. }));
}

#[test]
fn brent_handles_reversed_bracket() {
    let (x, c) = BrentSolver::default()
        .solve_bracket(4.0, -1.0, &mut |x: f64| x.cos() - x, true)
        .unwrap();
    assert!(c.is_converged());
    assert_relative_eq!(x, 0.739_085_133_215_160_6, epsilon = 1e-11);
}

#[test]
fn brent_without_sign_change_is_soft_failure() {
    let mut x = 2.0;
    let c = BrentSolver::default()
        .solve(&mut x, &mut |x: f64| x * x + 1.0, false)
        .unwrap();
    assert!(!c.is_converged());
    assert_eq!(x, 2.0);
}

proptest! {
    #[test]
    fn brent_solves_shifted_cubics(r in -50.0f64..50.0) {
        let (x, c) = BrentSolver::default()
            .solve_bracket(-100.0, 100.0, &mut |x: f64| (x - r).powi(3) + (x - r), true)
            .unwrap();
        prop_assert!(c.is_converged());
        prop_assert!((x - r).abs() < 1e-9);
    }

    #[test]
    fn newton_solves_monotone_exponentials(a in -5.0f64..5.0, x0 in -3.0f64..3.0) {
        let target = a.exp();
        let mut x = x0;
        let c = NewtonSolver::default()
            .solve(&mut x, &mut |x: f64| x.exp() / target - 1.0, true)
            .unwrap();
        prop_assert!(c.is_converged());
        prop_assert!((x - a).abs() < 1e-8);
    }
}

use std::f64::consts::PI;

use approx::assert_relative_eq;
use proptest::prelude::*;
use qs_interp::{
    Interpolator, KrigeConfig, KrigeInterp, KrigeOptim, MatrixMode, QualityMode, SquaredExp,
};

fn sine_data(n: usize) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = (0..n).map(|i| PI * i as f64 / (n - 1) as f64).collect();
    let y = x.iter().map(|v| v.sin()).collect();
    (x, y)
}

fn check_sine(k: &impl Interpolator) {
    for x0 in [0.4, 1.1, 1.9, 2.6] {
        assert_relative_eq!(k.eval(x0), x0.sin(), epsilon = 1e-3);
        assert_relative_eq!(k.deriv(x0).unwrap(), x0.cos(), epsilon = 1e-2);
        assert_relative_eq!(k.deriv2(x0).unwrap(), -x0.sin(), epsilon = 5e-2);
    }
    assert_relative_eq!(k.integ(0.0, PI).unwrap(), 2.0, epsilon = 1e-3);
    assert_relative_eq!(k.integ(PI, 0.0).unwrap(), -2.0, epsilon = 1e-3);
}

#[test]
fn optimised_sine_in_every_mode() {
    let (x, y) = sine_data(12);
    for mode in [QualityMode::LeaveOneOut, QualityMode::MaxLikelihood] {
        for matrix_mode in [MatrixMode::Cholesky, MatrixMode::Lu] {
            let config = KrigeConfig {
                mode,
                matrix_mode,
                ..KrigeConfig::default()
            };
            let k = KrigeOptim::set(&x, &y, &config).unwrap();
            assert!(k.quality().is_finite());
            check_sine(&k);
        }
    }
}

#[test]
fn fitted_length_beats_the_extremes() {
    let (x, y) = sine_data(10);
    let k = KrigeOptim::set(&x, &y, &KrigeConfig::default()).unwrap();
    let gap = x[1] - x[0];
    assert!(k.length_scale() > gap / 3.0);
    assert!(k.length_scale() < 3.0 * PI);
}

#[test]
fn fixed_length_matches_optimised_interp_type() {
    let (x, y) = sine_data(12);
    let k = KrigeOptim::set(&x, &y, &KrigeConfig::default()).unwrap();
    let noise = y.iter().map(|v| v.abs()).sum::<f64>() / y.len() as f64 / 1e8;
    let direct = KrigeInterp::with_noise(
        &x,
        &y,
        SquaredExp::new(k.length_scale()),
        noise,
        MatrixMode::Cholesky,
    )
    .unwrap();
    assert_relative_eq!(direct.eval(1.3), k.eval(1.3), epsilon = 1e-12);
}

proptest! {
    #[test]
    fn short_length_scale_interpolates_nodes(
        y in prop::collection::vec(-10.0f64..10.0, 3..12),
    ) {
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
        let k = KrigeInterp::new(&x, &y, SquaredExp::new(0.4), MatrixMode::Cholesky).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            prop_assert!((k.eval(*xi) - yi).abs() < 1e-9);
        }
    }
}

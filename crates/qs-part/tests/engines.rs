use std::f64::consts::PI;
use std::sync::Arc;

use approx::assert_relative_eq;
use qs_inte::{AdaptiveConfig, AdaptiveIntegrator, GaussCern, GaussConfig, Integrator};
use qs_part::{
    Boson, BosonRel, ClassicalThermo, Fermion, FermionNonrel, InversionStage, PartError, Regime,
};
use qs_root::{BrentSolver, RootSolver};

const HC: f64 = 197.33;

fn nucleon() -> Fermion {
    Fermion::new(939.0 / HC, 2.0)
}

fn pion() -> Boson {
    Boson::new(139.57 / HC, 1.0)
}

#[test]
fn fermion_round_trip_across_degeneracy() {
    let fr = FermionNonrel::new();
    let t = 10.0 / HC;
    for inc in [true, false] {
        for y in [-8.0, -0.3, 5.0, 40.0] {
            let mut f = nucleon();
            f.inc_rest_mass = inc;
            f.mu = y * t + if inc { f.m } else { 0.0 };
            fr.calc_mu(&mut f, t).unwrap();
            let expect = f.clone();

            f.mu = if inc { f.m } else { 0.0 };
            fr.calc_density(&mut f, t).unwrap();
            assert_relative_eq!(f.mu, expect.mu, epsilon = 1e-8 * t);
            assert_relative_eq!(f.pr, expect.pr, max_relative = 1e-7);
            assert_relative_eq!(f.en, expect.en, max_relative = 1e-6);
        }
    }
}

#[test]
fn electron_scenario_round_trip() {
    let fr = FermionNonrel::new();
    let t = 10.0 / HC;
    let mut e = Fermion::new(0.511 / HC, 2.0);
    e.n = 1e-4;
    fr.calc_density(&mut e, t).unwrap();
    let solved = e.clone();

    // strongly degenerate: μ = E_F [1 - π²/12 (T/E_F)²] up to (T/E_F)⁴
    let kf = (6.0 * PI * PI * e.n / e.g).cbrt();
    let e_fermi = kf * kf / (2.0 * e.ms);
    assert!(e_fermi / t > 50.0);
    let sommerfeld = e_fermi * (1.0 - PI * PI / 12.0 * (t / e_fermi).powi(2));
    assert_relative_eq!(solved.nu_kinetic(), sommerfeld, max_relative = 1e-6);

    fr.calc_mu(&mut e, t).unwrap();
    assert_relative_eq!(e.n, 1e-4, max_relative = 1e-8);
    assert_relative_eq!(e.pr, solved.pr, max_relative = 1e-8);
    assert!(e.pr > 0.0);
}

#[test]
fn extremely_degenerate_electrons_invert() {
    let fr = FermionNonrel::new();
    let t = 10.0 / HC;
    let mut e = Fermion::new(0.511 / HC, 2.0);
    e.n = 1e6;
    fr.calc_density(&mut e, t).unwrap();

    let kf = (6.0 * PI * PI * e.n / e.g).cbrt();
    let e_fermi = kf * kf / (2.0 * e.ms);
    assert_relative_eq!(e.nu_kinetic(), e_fermi, max_relative = 1e-9);

    let mut check = e.clone();
    fr.calc_mu(&mut check, t).unwrap();
    assert_relative_eq!(check.n, 1e6, max_relative = 1e-8);
}

#[test]
fn fermion_pressure_matches_classical_gas_when_dilute() {
    let t = 10.0 / HC;
    let mut f = nucleon();
    f.n = 1e-4;
    FermionNonrel::new().calc_density(&mut f, t).unwrap();

    let mut c = nucleon().part;
    c.n = 1e-4;
    ClassicalThermo::new().calc_density(&mut c, t).unwrap();

    assert_relative_eq!(f.pr, c.pr, max_relative = 1e-2);
    assert_relative_eq!(f.mu, c.mu, max_relative = 1e-3);
}

#[test]
fn fermion_entropy_is_the_temperature_derivative_of_pressure() {
    let fr = FermionNonrel::new();
    let t = 0.05;
    let h = 1e-5 * t;
    let mut f = nucleon();
    f.mu = f.m + 0.02;
    let pressure = |temp: f64| {
        let mut g = f.clone();
        fr.calc_mu(&mut g, temp).unwrap();
        g.pr
    };
    let dp_dt = (pressure(t + h) - pressure(t - h)) / (2.0 * h);
    fr.calc_mu(&mut f, t).unwrap();
    assert_relative_eq!(dp_dt, f.en, max_relative = 1e-6);
}

#[test]
fn fermion_density_with_injected_solver() {
    let t = 0.05;
    let mut reference = nucleon();
    reference.n = 0.01;
    FermionNonrel::new().calc_density(&mut reference, t).unwrap();

    let mut fr = FermionNonrel::new();
    fr.set_density_root(Arc::new(BrentSolver::default()) as Arc<dyn RootSolver>);
    let mut f = nucleon();
    f.n = 0.01;
    let stage = fr.calc_density(&mut f, t).unwrap();
    assert_eq!(stage, InversionStage::Primary);
    assert_relative_eq!(f.mu, reference.mu, epsilon = 1e-9);
}

#[test]
fn fermion_zero_temperature_is_analytic() {
    let mut f = nucleon();
    f.n = 0.16;
    let stage = FermionNonrel::new().calc_density(&mut f, 0.0).unwrap();
    assert_eq!(stage, InversionStage::Analytic);
    assert_eq!(f.en, 0.0);
}

#[test]
fn boson_round_trip_across_regimes() {
    let bre = BosonRel::new();
    let t = 0.6;
    for inc in [true, false] {
        for psi in [-0.1, -0.45, -2.0, -8.0] {
            let mut b = pion();
            b.inc_rest_mass = inc;
            b.mu = psi * t + if inc { b.m } else { 0.0 };
            bre.calc_mu(&mut b, t).unwrap();
            let expect = b.clone();

            b.mu = 0.0;
            bre.calc_density(&mut b, t).unwrap();
            assert_relative_eq!(b.mu, expect.mu, epsilon = 1e-7 * t);
            assert_relative_eq!(b.n, expect.n, max_relative = 1e-14);
            assert_relative_eq!(b.ed, expect.ed, max_relative = 1e-6);
            assert_relative_eq!(b.pr, expect.pr, max_relative = 1e-6);
        }
    }
}

#[test]
fn boson_psi_uses_the_chemical_potential_of_free_particles() {
    let t = 0.5;
    let mut b = pion();
    b.mu = b.m - 0.3 * t;
    // nu and ms are only synced by the engines
    assert_eq!(b.nu, 0.0);
    assert_relative_eq!(BosonRel::psi(&b, t), -0.3, epsilon = 1e-12);

    b.non_interacting = false;
    b.nu = b.m - 2.0 * t;
    assert_relative_eq!(BosonRel::psi(&b, t), -2.0, epsilon = 1e-12);
}

#[test]
fn boson_regimes_join_continuously() {
    let bre = BosonRel::new();
    for t in [0.5, 2.0] {
        let mut below = pion();
        below.mu = below.m + (-0.5 - 1e-9) * t;
        let mut above = pion();
        above.mu = above.m + (-0.5 + 1e-9) * t;
        assert_eq!(Regime::select(BosonRel::psi(&below, t)), Regime::NonDegenerate);
        assert_eq!(Regime::select(BosonRel::psi(&above, t)), Regime::Degenerate);

        bre.calc_mu(&mut below, t).unwrap();
        bre.calc_mu(&mut above, t).unwrap();
        // the degenerate momentum integrals stop at 20T above the chemical
        // potential, which leaves a jump of a few 1e-6
        assert_relative_eq!(below.n, above.n, max_relative = 5e-6);
        assert_relative_eq!(below.ed, above.ed, max_relative = 5e-6);
        // both entropy kernels are the same function of the occupation
        assert_relative_eq!(below.en, above.en, max_relative = 5e-6);
    }
}

#[test]
fn boson_density_is_the_chemical_potential_derivative_of_pressure() {
    let bre = BosonRel::new();
    let t = 0.5;
    for psi in [-0.2, -3.0] {
        let mut b = pion();
        b.mu = b.m + psi * t;
        let h = 1e-4 * t;
        let pressure = |mu: f64| {
            let mut c = pion();
            c.mu = mu;
            bre.calc_mu(&mut c, t).unwrap();
            c.pr
        };
        let dp_dmu = (pressure(b.mu + h) - pressure(b.mu - h)) / (2.0 * h);
        bre.calc_mu(&mut b, t).unwrap();
        assert_relative_eq!(dp_dmu, b.n, max_relative = 1e-5);
    }
}

#[test]
fn boson_matches_classical_gas_far_from_condensation() {
    let t = 0.3;
    let mut b = pion();
    b.mu = b.m - 12.0 * t;
    BosonRel::new().calc_mu(&mut b, t).unwrap();

    let mut c = pion().part;
    c.mu = b.mu;
    ClassicalThermo::new().calc_mu(&mut c, t).unwrap();

    assert_relative_eq!(b.n, c.n, max_relative = 1e-5);
    assert_relative_eq!(b.pr, c.pr, max_relative = 1e-5);
    assert_relative_eq!(b.en, c.en, max_relative = 1e-5);
}

#[test]
fn antiparticles_add_pressure_and_energy() {
    let bre = BosonRel::new();
    let t = 0.4;
    for mu_frac in [0.5, 0.0, -0.3] {
        let mut single = pion();
        single.mu = mu_frac * single.m;
        let mut pair = single.clone();
        bre.calc_mu(&mut single, t).unwrap();
        bre.pair_mu(&mut pair, t).unwrap();

        assert!(pair.pr + pair.ed - (single.pr + single.ed) > 0.0);
        assert!(pair.n <= single.n);
    }
    // equal and opposite at zero chemical potential
    let mut neutral = pion();
    bre.pair_mu(&mut neutral, t).unwrap();
    assert!(neutral.n.abs() < 1e-12);
}

#[test]
fn antiparticles_add_pressure_and_energy_at_fixed_density() {
    let bre = BosonRel::new();
    for (t, n) in [(0.4, 2e-3), (0.8, 3e-2)] {
        let mut single = pion();
        single.n = n;
        bre.calc_density(&mut single, t).unwrap();

        let mut pair = pion();
        pair.mu = single.mu;
        bre.pair_mu(&mut pair, t).unwrap();

        let mut anti = pion().anti();
        anti.mu = -single.mu;
        bre.calc_mu(&mut anti, t).unwrap();

        let gain = pair.pr + pair.ed - (single.pr + single.ed);
        assert!(gain > 0.0, "T = {t}");
        assert_relative_eq!(gain, anti.pr + anti.ed, max_relative = 1e-6);
        assert_relative_eq!(pair.n, n - anti.n, max_relative = 1e-6);
    }
}

#[test]
fn injected_integrators_are_used() {
    let nit = Arc::new(GaussCern::<f64>::new(GaussConfig::default()));
    let dit = Arc::new(AdaptiveIntegrator::<f64>::new(AdaptiveConfig {
        tol_rel: 1e-11,
        ..AdaptiveConfig::default()
    }));
    let mut bre = BosonRel::new();
    bre.set_inte(nit.clone(), dit.clone());

    let t = 0.5;
    let mut deg = pion();
    deg.mu = deg.m - 0.1 * t;
    bre.calc_mu(&mut deg, t).unwrap();
    assert!(dit.nsubdivisions() > 0);

    let mut nondeg = pion();
    nondeg.mu = nondeg.m - 3.0 * t;
    bre.calc_mu(&mut nondeg, t).unwrap();
    assert!(nit.nsubdivisions() > 0);

    let mut reference = pion();
    reference.mu = nondeg.mu;
    BosonRel::new().calc_mu(&mut reference, t).unwrap();
    assert_relative_eq!(nondeg.n, reference.n, max_relative = 1e-7);
}

#[test]
fn boson_input_errors() {
    let bre = BosonRel::new();
    let mut b = pion();
    b.n = 0.0;
    assert!(matches!(
        bre.calc_density(&mut b, 0.5),
        Err(PartError::InvalidInput { .. })
    ));
    b.n = 0.1;
    assert!(bre.calc_density(&mut b, -0.5).is_err());

    let mut heavy = pion();
    heavy.non_interacting = false;
    heavy.ms = -0.1;
    assert!(bre.calc_mu(&mut heavy, 0.5).is_err());
}

#[test]
fn boson_density_beyond_saturation_fails() {
    let bre = BosonRel::new();
    let t = 0.2;
    let mut edge = pion();
    edge.mu = edge.m;
    bre.calc_mu(&mut edge, t).unwrap();

    let mut b = pion();
    b.n = 10.0 * edge.n;
    assert!(matches!(
        bre.calc_density(&mut b, t),
        Err(PartError::InversionFailed { .. })
    ));
}

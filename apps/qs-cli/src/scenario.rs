//! Single-state cases and YAML scenarios.

use std::sync::Arc;

use clap::ValueEnum;
use qs_core::{HC_MEV_FM, energy_to_inv_fm, inv_fm_to_energy, mev};
use qs_inte::{AdaptiveConfig, AdaptiveIntegrator};
use qs_part::{
    Boson, BosonRel, ClassicalThermo, Fermion, FermionNonrel, InversionStage, Particle,
};
use qs_root::{BracketSearch, BrentConfig, BrentSolver, NewtonConfig, NewtonSolver};
use serde::{Deserialize, Serialize};
use tracing::info;
use uom::si::energy::megaelectronvolt;

use crate::error::{CliError, CliResult};

/// Units of masses, temperatures and chemical potentials on input and of
/// energies on output. Number densities are always in fm⁻³.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Mev,
    Fm,
}

impl UnitSystem {
    pub fn to_inv_fm(self, v: f64) -> f64 {
        match self {
            UnitSystem::Mev => energy_to_inv_fm(mev(v)),
            UnitSystem::Fm => v,
        }
    }

    pub fn from_inv_fm(self, v: f64) -> f64 {
        match self {
            UnitSystem::Mev => inv_fm_to_energy(v).get::<megaelectronvolt>(),
            UnitSystem::Fm => v,
        }
    }

    /// fm⁻⁴ to MeV·fm⁻³ or fm⁻⁴.
    pub fn energy_density(self, v: f64) -> f64 {
        match self {
            UnitSystem::Mev => v * HC_MEV_FM,
            UnitSystem::Fm => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Fermion,
    Boson,
    Classical,
}

fn default_true() -> bool {
    true
}

/// One thermodynamic state to evaluate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Case {
    pub name: String,
    pub kind: Kind,
    pub mass: f64,
    pub degeneracy: f64,
    pub temperature: f64,
    /// Chemical potential; exclusive with `density`
    #[serde(default)]
    pub mu: Option<f64>,
    #[serde(default)]
    pub density: Option<f64>,
    /// Makes the particle interacting with this effective mass
    #[serde(default)]
    pub effective_mass: Option<f64>,
    #[serde(default = "default_true")]
    pub inc_rest_mass: bool,
    /// Add the antiparticle contribution (bosons only)
    #[serde(default)]
    pub pair: bool,
}

/// Solver and integrator overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    pub newton: Option<NewtonConfig>,
    pub brent: Option<BrentConfig>,
    pub integrator: Option<AdaptiveConfig>,
    pub search: Option<BracketSearch>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default)]
    pub solvers: SolverSettings,
    pub cases: Vec<Case>,
}

/// Result of one case, in the scenario's units.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub name: String,
    pub kind: Kind,
    pub units: UnitSystem,
    pub mu: f64,
    pub nu: f64,
    pub n: f64,
    pub ed: f64,
    pub pr: f64,
    /// Entropy density, fm⁻³
    pub en: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<InversionStage>,
}

/// The three engines, configured once per scenario.
#[derive(Debug)]
pub struct Engines {
    fermion: FermionNonrel,
    boson: BosonRel,
    classical: ClassicalThermo,
}

impl Engines {
    pub fn new(settings: &SolverSettings) -> Self {
        let mut fermion = FermionNonrel::new();
        let mut boson = BosonRel::new();
        if let Some(cfg) = settings.newton {
            let solver = Arc::new(NewtonSolver::new(cfg));
            fermion.set_density_root(solver.clone());
            boson.set_density_root(solver);
        }
        if let Some(cfg) = settings.brent {
            let solver = Arc::new(BrentSolver::new(cfg));
            fermion.set_bracket_root(solver.clone());
            boson.set_bracket_root(solver);
        }
        if let Some(cfg) = settings.integrator {
            boson.set_inte(
                Arc::new(AdaptiveIntegrator::<f64>::new(cfg)),
                Arc::new(AdaptiveIntegrator::<f64>::new(cfg)),
            );
        }
        if let Some(search) = settings.search {
            fermion.search = search;
            boson.search = search;
        }
        Self {
            fermion,
            boson,
            classical: ClassicalThermo::new(),
        }
    }

    pub fn run(&self, case: &Case, units: UnitSystem) -> CliResult<Report> {
        let part = particle(case, units)?;
        let t = units.to_inv_fm(case.temperature);
        let by_density = case.density.is_some();
        if case.pair && (case.kind != Kind::Boson || by_density) {
            return Err(CliError::InvalidInput(format!(
                "case '{}': pair mode needs a boson and a chemical potential",
                case.name
            )));
        }

        let (part, stage) = match case.kind {
            Kind::Fermion => {
                let mut f = Fermion::new(part.m, part.g);
                f.part = part;
                let stage = if by_density {
                    Some(self.fermion.calc_density(&mut f, t)?)
                } else {
                    self.fermion.calc_mu(&mut f, t)?;
                    None
                };
                (f.part, stage)
            }
            Kind::Boson => {
                let mut b = Boson::new(part.m, part.g);
                b.part = part;
                let stage = if by_density {
                    Some(self.boson.calc_density(&mut b, t)?)
                } else if case.pair {
                    self.boson.pair_mu(&mut b, t)?;
                    None
                } else {
                    self.boson.calc_mu(&mut b, t)?;
                    None
                };
                (b.part, stage)
            }
            Kind::Classical => {
                let mut p = part;
                if by_density {
                    self.classical.calc_density(&mut p, t)?;
                } else {
                    self.classical.calc_mu(&mut p, t)?;
                }
                (p, None)
            }
        };
        info!(name = %case.name, ?stage, "case evaluated");

        Ok(Report {
            name: case.name.clone(),
            kind: case.kind,
            units,
            mu: units.from_inv_fm(part.mu),
            nu: units.from_inv_fm(part.nu),
            n: part.n,
            ed: units.energy_density(part.ed),
            pr: units.energy_density(part.pr),
            en: part.en,
            stage,
        })
    }

    pub fn run_scenario(&self, scenario: &Scenario) -> CliResult<Vec<Report>> {
        scenario
            .cases
            .iter()
            .map(|case| self.run(case, scenario.units))
            .collect()
    }
}

fn particle(case: &Case, units: UnitSystem) -> CliResult<Particle> {
    match (case.mu, case.density) {
        (Some(_), Some(_)) | (None, None) => {
            return Err(CliError::InvalidInput(format!(
                "case '{}': give exactly one of mu and density",
                case.name
            )));
        }
        _ => {}
    }
    let mut p = Particle::new(units.to_inv_fm(case.mass), case.degeneracy);
    p.inc_rest_mass = case.inc_rest_mass;
    if let Some(ms) = case.effective_mass {
        p.non_interacting = false;
        p.ms = units.to_inv_fm(ms);
    }
    if let Some(mu) = case.mu {
        p.mu = units.to_inv_fm(mu);
        p.nu = p.mu;
    }
    if let Some(n) = case.density {
        p.n = n;
    }
    Ok(p)
}

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

mod error;
mod krige;
mod scenario;

use error::{CliResult, load_yaml};
use krige::KrigeInput;
use scenario::{Case, Engines, Kind, Report, Scenario, SolverSettings, UnitSystem};

#[derive(Parser)]
#[command(name = "qs-cli")]
#[command(about = "Quantum statistics CLI - ideal Fermi, Bose and classical gas thermodynamics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StateArgs {
    /// Rest mass
    #[arg(long)]
    mass: f64,
    /// Spin degeneracy
    #[arg(short, long, default_value_t = 2.0)]
    degeneracy: f64,
    /// Temperature
    #[arg(short, long)]
    temperature: f64,
    /// Chemical potential
    #[arg(long, allow_negative_numbers = true, conflicts_with = "density", required_unless_present = "density")]
    mu: Option<f64>,
    /// Number density in fm⁻³
    #[arg(long)]
    density: Option<f64>,
    /// Effective mass; makes the particle interacting
    #[arg(long)]
    effective_mass: Option<f64>,
    /// Leave the rest mass out of the chemical potential and energy density
    #[arg(long)]
    no_rest_mass: bool,
    /// Units of masses, temperature and chemical potential
    #[arg(long, value_enum, default_value_t = UnitSystem::Mev)]
    units: UnitSystem,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Nonrelativistic Fermi gas
    Fermion(StateArgs),
    /// Relativistic Bose gas
    Boson {
        #[command(flatten)]
        state: StateArgs,
        /// Include the antiparticle
        #[arg(long)]
        pair: bool,
    },
    /// Relativistic Maxwell-Boltzmann gas
    Classical(StateArgs),
    /// Run every case of a YAML scenario
    Scenario {
        /// Path to the scenario YAML file
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Kriging interpolation of a YAML table
    Krige {
        /// Path to the table YAML file
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fermion(state) => cmd_state(Kind::Fermion, state, false),
        Commands::Boson { state, pair } => cmd_state(Kind::Boson, state, pair),
        Commands::Classical(state) => cmd_state(Kind::Classical, state, false),
        Commands::Scenario { path, json } => cmd_scenario(&path, json),
        Commands::Krige { path, json } => cmd_krige(&path, json),
    }
}

fn cmd_state(kind: Kind, args: StateArgs, pair: bool) -> CliResult<()> {
    let case = Case {
        name: format!("{kind:?}").to_lowercase(),
        kind,
        mass: args.mass,
        degeneracy: args.degeneracy,
        temperature: args.temperature,
        mu: args.mu,
        density: args.density,
        effective_mass: args.effective_mass,
        inc_rest_mass: !args.no_rest_mass,
        pair,
    };
    let report = Engines::new(&SolverSettings::default()).run(&case, args.units)?;
    if args.json {
        print_json(&report)
    } else {
        print_report(&report);
        Ok(())
    }
}

fn cmd_scenario(path: &Path, json: bool) -> CliResult<()> {
    let scenario: Scenario = load_yaml(path)?;
    let reports = Engines::new(&scenario.solvers).run_scenario(&scenario)?;
    if json {
        return print_json(&reports);
    }
    for report in &reports {
        print_report(report);
    }
    Ok(())
}

fn cmd_krige(path: &Path, json: bool) -> CliResult<()> {
    let input: KrigeInput = load_yaml(path)?;
    let report = krige::run(&input)?;
    if json {
        return print_json(&report);
    }
    println!(
        "Length scale: {:.6e} (quality {:.6e})",
        report.length_scale, report.quality
    );
    println!("  {:>14} {:>14} {:>14} {:>14}", "x", "y", "dy/dx", "d2y/dx2");
    for p in &report.points {
        println!("  {:>14.6e} {:>14.6e} {:>14.6e} {:>14.6e}", p.x, p.y, p.dy, p.d2y);
    }
    if let Some(integral) = report.integral {
        println!("Integral: {integral:.6e}");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(r: &Report) {
    let (energy, energy_density) = match r.units {
        UnitSystem::Mev => ("MeV", "MeV/fm^3"),
        UnitSystem::Fm => ("1/fm", "1/fm^4"),
    };
    println!("{} ({:?})", r.name, r.kind);
    println!("  mu = {:.8e} {energy}", r.mu);
    println!("  nu = {:.8e} {energy}", r.nu);
    println!("  n  = {:.8e} 1/fm^3", r.n);
    println!("  ed = {:.8e} {energy_density}", r.ed);
    println!("  pr = {:.8e} {energy_density}", r.pr);
    println!("  en = {:.8e} 1/fm^3", r.en);
    if let Some(stage) = r.stage {
        println!("  inversion: {stage:?}");
    }
}

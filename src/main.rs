//! Rabin - Transformer Leakage Inductance
//!
//! Builds the section inductance matrix of one transformer phase from a TOML
//! design file and reports leakage reactance.
//!
//! # Usage
//!
//! ```bash
//! rabin transformer.toml --base-va 3.333e6 --base-current 83.67 --print-matrix
//! rabin transformer.toml --base-va 3.333e6 --base-current 83.67 --sweep 1.5:3.0:0.25
//! ```

use std::path::PathBuf;

use clap::Parser;
use log::info;
use rabin_core::{error::Result, load_phase, Phase, RabinError};

/// Transformer leakage inductance by Rabin's method
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the design file (.toml)
    #[arg(value_name = "DESIGN_FILE")]
    design_file: PathBuf,

    /// Base power for per-unit reactance (VA)
    #[arg(long)]
    base_va: Option<f64>,

    /// Base current for leakage inductance (A); defaults to the first coil's rated current
    #[arg(long)]
    base_current: Option<f64>,

    /// Print the inductance matrix
    #[arg(long)]
    print_matrix: bool,

    /// Write the inductance matrix as JSON
    #[arg(long, value_name = "FILE")]
    save_matrix: Option<PathBuf>,

    /// Sweep the window multiplier, given as start:stop:step
    #[arg(long, value_name = "START:STOP:STEP", value_parser = parse_sweep)]
    sweep: Option<Sweep>,

    /// Worker threads for the harmonic sums (defaults to the CPU count)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

/// Window-multiplier range.
#[derive(Debug, Clone, Copy)]
struct Sweep {
    start: f64,
    stop: f64,
    step: f64,
}

impl Sweep {
    fn values(self) -> impl Iterator<Item = f64> {
        let count = ((self.stop - self.start) / self.step + 1e-9).floor() as usize + 1;
        (0..count).map(move |k| self.start + k as f64 * self.step)
    }
}

fn parse_sweep(arg: &str) -> std::result::Result<Sweep, String> {
    let parts: Vec<f64> = arg
        .split(':')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{}': {}", p, e)))
        .collect::<std::result::Result<_, _>>()?;
    match parts[..] {
        [start, stop, step] if step > 0.0 && stop >= start => Ok(Sweep { start, stop, step }),
        [_, _, _] => Err("need start <= stop and a positive step".to_string()),
        _ => Err("expected START:STOP:STEP".to_string()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| RabinError::settings(format!("cannot start {} threads: {}", threads, e)))?;
    }

    let mut phase = load_phase(&args.design_file)?;
    let base_current = match args.base_current {
        Some(current) => current,
        None => phase
            .coils()
            .first()
            .map(|c| c.rated_current())
            .ok_or(RabinError::EmptyPhase)?,
    };

    if let Some(sweep) = args.sweep {
        return run_sweep(&phase, sweep, args.base_va, base_current);
    }

    let matrix = phase.build_inductance_matrix()?;
    info!("{} sections", matrix.rows());
    if args.print_matrix {
        print!("{}", matrix);
    }
    if let Some(path) = &args.save_matrix {
        std::fs::write(path, matrix.encode()?).map_err(|e| RabinError::FileError {
            path: path.display().to_string(),
            source: e,
        })?;
    }

    report(&mut phase, args.base_va, base_current)?;
    println!("validation: {}", phase.wait_for_validation());
    Ok(())
}

fn report(phase: &mut Phase, base_va: Option<f64>, base_current: f64) -> Result<()> {
    println!("energy: {:.6e} J", phase.energy()?);
    println!("leakage inductance: {:.6e} H", phase.leakage_inductance(base_current)?);
    println!("leakage reactance: {:.6} ohm", phase.leakage_reactance(base_current)?);
    if let Some(base_va) = base_va {
        println!("leakage reactance: {:.5} pu", phase.leakage_reactance_pu(base_va, base_current)?);
    }
    Ok(())
}

fn run_sweep(phase: &Phase, sweep: Sweep, base_va: Option<f64>, base_current: f64) -> Result<()> {
    for multiplier in sweep.values() {
        let mut variant = phase.with_window_multiplier(multiplier)?;
        variant.build_inductance_matrix()?;
        let status = variant.wait_for_validation();
        match base_va {
            Some(base_va) => println!(
                "{:6.3}  {:.5} pu  {}",
                multiplier,
                variant.leakage_reactance_pu(base_va, base_current)?,
                status
            ),
            None => println!(
                "{:6.3}  {:.6} ohm  {}",
                multiplier,
                variant.leakage_reactance(base_current)?,
                status
            ),
        }
    }
    Ok(())
}

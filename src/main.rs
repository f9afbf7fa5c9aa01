//! Command-line front end for the venue choice simulation
//!
//! `run` executes a single run and writes the per-round CSV series plus a
//! final JSON snapshot; `batch` repeats a run across consecutive seeds and
//! prints one summary line per seed.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use barscene::core::error::Result;
use barscene::report::{ModelSnapshot, RunRecorder};
use barscene::{Model, ModelConfig};

#[derive(Parser)]
#[command(name = "barscene", about = "Agent-based simulation of nightlife venue choice")]
struct Cli {
    /// TOML config file; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one simulation and write its time series and final snapshot
    Run {
        /// Number of rounds to simulate
        #[arg(short, long, default_value_t = 200)]
        rounds: u64,
        /// Override the config seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Per-round CSV output path
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Final snapshot JSON output path ("-" for stdout)
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Sweep gamma values across seeded runs and emit one CSV row per run
    Batch {
        /// Number of rounds per run
        #[arg(short, long, default_value_t = 100)]
        rounds: u64,
        /// Gamma values to test
        #[arg(long, value_delimiter = ',', default_values_t = [0.3, 0.5, 0.7])]
        gammas: Vec<f64>,
        /// Number of seeded runs per gamma (seeds 0..runs)
        #[arg(short = 'n', long, default_value_t = 20)]
        runs: u64,
        /// CSV output path ("-" for stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ModelConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let cfg: ModelConfig = toml::from_str(&text)?;
            Ok(cfg)
        }
        None => Ok(ModelConfig::default()),
    }
}

fn run_single(
    cfg: ModelConfig,
    rounds: u64,
    csv: Option<&PathBuf>,
    json: Option<&PathBuf>,
) -> Result<()> {
    let mut model = Model::new(cfg)?;
    let mut recorder = RunRecorder::new(&model);

    for _ in 0..rounds {
        model.step();
        recorder.observe(&model);
    }

    if let Some(path) = csv {
        recorder.write_csv(File::create(path)?)?;
        tracing::info!(path = %path.display(), "wrote round series");
    }

    let snapshot = ModelSnapshot::capture(&model);
    match json {
        Some(path) if path.as_os_str() == "-" => {
            snapshot.write_json(io::stdout().lock())?;
            println!();
        }
        Some(path) => {
            snapshot.write_json(File::create(path)?)?;
            tracing::info!(path = %path.display(), "wrote final snapshot");
        }
        None => {
            snapshot.write_json(io::stdout().lock())?;
            println!();
        }
    }
    Ok(())
}

/// For every gamma x seed combination, run the model to completion and
/// report each venue's final effective affinity for the flag group and the
/// flag group's share of its last-round visitors
fn run_batch(
    cfg: ModelConfig,
    rounds: u64,
    gammas: &[f64],
    runs: u64,
    out: Option<&PathBuf>,
) -> Result<()> {
    let flag_group = cfg.flag_group;
    let label = flag_group.label().to_lowercase();

    let mut csv = String::from("gamma,seed");
    for venue in &cfg.venues {
        csv.push_str(&format!(
            ",{name}_{label}_effective_affinity,{name}_{label}_ratio",
            name = venue.name
        ));
    }
    csv.push('\n');

    for &gamma in gammas {
        tracing::info!(gamma, runs, rounds, "batch sweep point");
        for seed in 0..runs {
            let mut run_cfg = cfg.clone();
            run_cfg.gamma = gamma;
            run_cfg.seed = seed;
            let mut model = Model::new(run_cfg)?;
            model.run(rounds);

            csv.push_str(&format!("{gamma},{seed}"));
            for venue in model.venues() {
                let affinity = venue.effective_affinity()[flag_group];
                let ratio = venue.current_population_ratios()[flag_group];
                csv.push_str(&format!(",{affinity:.4},{ratio:.4}"));
            }
            csv.push('\n');
        }
    }

    match out {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::write(path, csv)?;
            tracing::info!(path = %path.display(), "wrote batch results");
        }
        _ => io::stdout().lock().write_all(csv.as_bytes())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barscene=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Run {
            rounds,
            seed,
            csv,
            json,
        } => {
            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            run_single(cfg, rounds, csv.as_ref(), json.as_ref())
        }
        Command::Batch {
            rounds,
            gammas,
            runs,
            out,
        } => run_batch(cfg, rounds, &gammas, runs, out.as_ref()),
    }
}

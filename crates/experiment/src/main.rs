//! Command-line driver for housing market experiments.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use experiment::{
    default_config_toml, render_summary, run_experiments, ExperimentConfig, ExperimentError,
    DEFAULT_EXPERIMENT_PATH,
};
use tracing_subscriber::EnvFilter;

/// Command line arguments for the experiment runner
#[derive(Parser, Debug)]
#[command(name = "stopping_sim")]
#[command(about = "Optimal stopping experiments in a competitive housing market")]
struct Args {
    /// Experiment configuration file
    #[arg(long, default_value = DEFAULT_EXPERIMENT_PATH)]
    config: PathBuf,

    /// Override the number of experiments
    #[arg(long)]
    experiments: Option<usize>,

    /// Override the base random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml());
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), ExperimentError> {
    let mut config = if args.config.exists() {
        ExperimentConfig::from_file(&args.config)?
    } else {
        tracing::warn!(
            "Config file {} not found, using default experiment",
            args.config.display()
        );
        ExperimentConfig::default()
    };

    if let Some(experiments) = args.experiments {
        config.experiment.num_experiments = experiments;
    }
    if let Some(seed) = args.seed {
        config.experiment.seed = seed;
    }

    let summary = run_experiments(&config)?;

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

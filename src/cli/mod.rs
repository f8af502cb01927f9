//! Command-line interface for inspecting and evaluating benchmark problems

use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;

use crate::benchmark::{BenchmarkConfig, MLTuning};
use crate::optimizer::HyperparameterConfig;

#[derive(Parser)]
#[command(name = "mltuning")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hyperparameter-tuning benchmark problems for black-box optimizers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the search space of a benchmark as JSON
    Space {
        #[command(flatten)]
        bench: BenchmarkArgs,
    },

    /// Evaluate one hyperparameter configuration
    Evaluate {
        #[command(flatten)]
        bench: BenchmarkArgs,

        /// Configuration as a JSON object, e.g. '{"depth": 5}'
        #[arg(short, long)]
        params: String,

        /// Use the report entry point instead of the objective
        #[arg(long)]
        report: bool,
    },

    /// Random search over the space, reporting the best configuration
    Search {
        #[command(flatten)]
        bench: BenchmarkArgs,

        /// Number of sampled configurations
        #[arg(short = 'n', long, default_value = "20")]
        trials: usize,

        /// Seed of the configuration sampler
        #[arg(long, default_value = "0")]
        search_seed: u64,
    },
}

/// Benchmark selection shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct BenchmarkArgs {
    /// JSON benchmark configuration; other benchmark flags are ignored when set
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Regressor family: decision_tree_depth, decision_tree, mlp, any
    #[arg(short, long, default_value = "decision_tree_depth")]
    pub regressor: String,

    /// Dataset: artificial, artificialcos, artificialsquare, diabetes, boston
    #[arg(short, long, default_value = "artificial")]
    pub dataset: String,

    /// Feature count of a synthetic dataset
    #[arg(long)]
    pub dimension: Option<usize>,

    #[arg(long)]
    pub overfitter: bool,

    /// Seed of the benchmark random source
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory holding the real-world CSV files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

impl BenchmarkArgs {
    pub fn to_config(&self) -> anyhow::Result<BenchmarkConfig> {
        if let Some(path) = &self.config {
            return Ok(BenchmarkConfig::from_json_file(path)?);
        }
        let mut config = BenchmarkConfig::new(&self.regressor)
            .with_dataset(&self.dataset)
            .with_overfitter(self.overfitter)
            .with_data_dir(&self.data_dir);
        config.data_dimension = self.dimension;
        config.random_state = self.seed;
        Ok(config)
    }

    pub fn build(&self) -> anyhow::Result<MLTuning> {
        Ok(MLTuning::new(self.to_config()?)?)
    }
}

pub fn cmd_space(bench: &BenchmarkArgs) -> anyhow::Result<()> {
    let problem = bench.build()?;
    let out = json!({
        "name": problem.name(),
        "descriptors": problem.descriptors(),
        "parameters": problem.search_space().parameters(),
        "fixed": problem.fixed_params(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn cmd_evaluate(bench: &BenchmarkArgs, params: &str, report: bool) -> anyhow::Result<()> {
    let problem = bench.build()?;
    let config: HyperparameterConfig = serde_json::from_str(params)?;

    let start = Instant::now();
    let loss = if report {
        problem.evaluation_function(&config)?
    } else {
        problem.objective(&config)?
    };

    let out = json!({
        "name": problem.name(),
        "entry_point": if report { "evaluation_function" } else { "objective" },
        "loss": loss,
        "elapsed_secs": start.elapsed().as_secs_f64(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn cmd_search(bench: &BenchmarkArgs, trials: usize, search_seed: u64) -> anyhow::Result<()> {
    anyhow::ensure!(trials > 0, "at least one trial is required");
    let problem = bench.build()?;
    let space = problem.search_space();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(search_seed);

    let start = Instant::now();
    let mut best: Option<(f64, HyperparameterConfig)> = None;
    for trial in 0..trials {
        let config = space.sample(&mut rng);
        let loss = problem.objective(&config)?;
        tracing::info!(trial, loss, "trial finished");
        if best.as_ref().map_or(true, |(b, _)| loss < *b) {
            best = Some((loss, config));
        }
    }

    let (best_loss, best_config) =
        best.ok_or_else(|| anyhow::anyhow!("search produced no trials"))?;
    let report = problem.evaluation_function(&best_config)?;

    let out = json!({
        "name": problem.name(),
        "trials": trials,
        "best_config": best_config,
        "best_objective": best_loss,
        "report": report,
        "elapsed_secs": start.elapsed().as_secs_f64(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
